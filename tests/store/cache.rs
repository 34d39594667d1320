//! Cache policies never change what reads return.

use crate::*;

#[test]
fn test_lru_eviction_still_reads_through() {
    let db = ChatKv::builder().ephemeral().lru(2).open().unwrap();
    let fields = db.fields();

    fields.write_map("a", "1").unwrap();
    fields.write_map("b", "2").unwrap();
    fields.write_map("c", "3").unwrap();
    assert_eq!(db.cache_stats().entries, 2);

    // "a" was least recently used and is gone from the cache, not the store.
    let misses = db.cache_stats().misses;
    assert_eq!(fields.read_map("a").unwrap().as_deref(), Some("1"));
    assert_eq!(db.cache_stats().misses, misses + 1);
}

#[test]
fn test_threshold_clear_keeps_data() {
    let db = ChatKv::builder()
        .ephemeral()
        .cache_clear_threshold(16)
        .open()
        .unwrap();
    let fields = db.fields();

    for i in 0..100 {
        fields.set_counter(FileId(i), None, i as i64).unwrap();
    }
    assert!(db.cache_stats().threshold_clears > 0);
    assert!(db.cache_stats().entries <= 16);
    for i in 0..100 {
        assert_eq!(fields.get_counter(FileId(i), None).unwrap(), i as i64);
    }
}

#[test]
fn test_tree_under_small_lru() {
    let db = ChatKv::builder().ephemeral().lru(8).open().unwrap();
    let mut tree = db.tree_with_orders(FileId(1), &[KeyOrder::Ascending]);

    for i in (0..200).rev() {
        tree.insert(&[i.to_string()], format!("v{}", i)).unwrap();
    }
    for i in (0..200).filter(|i| i % 4 == 0) {
        assert!(tree.delete(&[i.to_string()]).unwrap());
    }

    assert_eq!(tree.size().unwrap(), 150);
    let keys = tree.get_all_keys_in_order().unwrap();
    let expected: Vec<String> = (0..200)
        .filter(|i| i % 4 != 0)
        .map(|i| i.to_string())
        .collect();
    assert_eq!(keys, expected);
}
