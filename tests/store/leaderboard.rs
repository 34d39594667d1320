//! A chat leaderboard: composite keys with mixed orders.

use crate::*;

fn record(db: &ChatKv, score: u32, name: &str) {
    let mut board = db.tree_with_orders(BOARD, &leaderboard_orders());
    board
        .insert(&[score.to_string(), name.to_string()], name)
        .unwrap();
}

#[test]
fn test_top_players() {
    let db = ChatKv::ephemeral().unwrap();
    record(&db, 30, "carol");
    record(&db, 50, "alice");
    record(&db, 30, "bob");
    record(&db, 10, "dave");

    let board = db.tree_with_orders(BOARD, &leaderboard_orders());
    // The tree sorts the best score first, so the greatest keys are the worst.
    assert_eq!(board.top_n_descending(2).unwrap(), vec!["dave", "carol"]);

    let ranked: Vec<String> = board
        .entries_in_order()
        .unwrap()
        .into_iter()
        .map(|(_, name)| name)
        .collect();
    assert_eq!(ranked, vec!["alice", "bob", "carol", "dave"]);
}

#[test]
fn test_score_update_moves_player() {
    let db = ChatKv::ephemeral().unwrap();
    record(&db, 30, "carol");
    record(&db, 20, "bob");

    let mut board = db.tree_with_orders(BOARD, &leaderboard_orders());
    assert!(board.delete(&["20", "bob"]).unwrap());
    board.insert(&["40", "bob"], "bob").unwrap();

    assert_eq!(
        board.get_all_keys_in_order().unwrap(),
        vec!["40", "bob", "30", "carol"]
    );
    assert_eq!(board.size().unwrap(), 2);
}

#[test]
fn test_top_n_of_ascending_keys() {
    let db = ChatKv::ephemeral().unwrap();
    let mut tree = db.tree_with_orders(FileId(9), &[KeyOrder::Ascending]);
    for i in 1..=20 {
        tree.insert(&[i.to_string()], format!("p{}", i)).unwrap();
    }

    assert_eq!(tree.top_n_descending(3).unwrap(), vec!["p20", "p19", "p18"]);
    assert_eq!(tree.top_n_descending(50).unwrap().len(), 20);
}
