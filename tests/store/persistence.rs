//! State survives closing and reopening an on-disk database.

use crate::*;

#[test]
fn test_tree_survives_reopen() {
    let (dir, db) = open_temp();
    {
        let mut tree = db.tree_with_orders(FileId(1), &[KeyOrder::Ascending]);
        for i in [50, 20, 80, 10, 30, 70, 90] {
            tree.insert(&[i.to_string()], format!("n{}", i)).unwrap();
        }
        tree.delete(&["20"]).unwrap();
    }
    db.close().unwrap();

    let db = open_at(&dir);
    let mut tree = db.tree_with_orders(FileId(1), &[KeyOrder::Ascending]);
    assert_eq!(tree.size().unwrap(), 6);
    assert_eq!(
        tree.get_all_keys_in_order().unwrap(),
        vec!["10", "30", "50", "70", "80", "90"]
    );
    assert_eq!(tree.get(&["30"]).unwrap().as_deref(), Some("n30"));

    // Inserting after reopen reuses the freed node id.
    let free_before = db.allocator(FileId(1)).free_count().unwrap();
    assert_eq!(free_before, 1);
    tree.insert(&["60"], "n60").unwrap();
    assert_eq!(db.allocator(FileId(1)).free_count().unwrap(), 0);
    assert_eq!(db.allocator(FileId(1)).high_water_mark().unwrap(), 7);
}

#[test]
fn test_fields_survive_reopen() {
    let (dir, db) = open_temp();
    let fields = db.fields();
    fields.inc_counter(FileId(3), None).unwrap();
    fields.inc_counter(FileId(3), None).unwrap();
    fields.make_valid(FileId(3), "bob", None).unwrap();
    fields.add_to_list(FileId(3), None, 42).unwrap();
    fields.write_map("topic", "rust").unwrap();
    drop(fields);
    db.close().unwrap();

    let db = open_at(&dir);
    let fields = db.fields();
    assert_eq!(fields.get_counter(FileId(3), None).unwrap(), 2);
    assert!(fields.is_valid(FileId(3), "bob", None).unwrap());
    assert_eq!(fields.get_list(FileId(3), None).unwrap(), vec![42]);
    assert_eq!(fields.read_map("topic").unwrap().as_deref(), Some("rust"));
}

#[test]
fn test_compact_then_reopen() {
    let (dir, db) = open_temp();
    {
        let mut tree = db.tree_with_orders(FileId(2), &[KeyOrder::Lexicographic]);
        for round in 0..5 {
            for k in ["a", "b", "c", "d"] {
                tree.insert(&[k], format!("{}{}", k, round)).unwrap();
            }
        }
    }
    assert!(db.compact().unwrap() > 0);
    db.close().unwrap();

    let db = open_at(&dir);
    let tree = db.tree_with_orders(FileId(2), &[KeyOrder::Lexicographic]);
    assert_eq!(
        tree.entries_in_order().unwrap(),
        vec![
            (vec!["a".to_string()], "a4".to_string()),
            (vec!["b".to_string()], "b4".to_string()),
            (vec!["c".to_string()], "c4".to_string()),
            (vec!["d".to_string()], "d4".to_string()),
        ]
    );
}

#[test]
fn test_config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(chatkv::CONFIG_FILE_NAME),
        "[cache]\npolicy = \"lru\"\ncapacity = 32\n",
    )
    .unwrap();

    let db = open_at(&dir);
    assert_eq!(db.config().cache, chatkv::CacheConfig::Lru { capacity: 32 });
    assert_eq!(db.durability_mode(), Some(DurabilityMode::Strict));
}
