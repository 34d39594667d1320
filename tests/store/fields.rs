//! Counters, flags, lists and map entries through the database handle.

use crate::*;

#[test]
fn test_counter_increments_and_decrements() {
    let db = ChatKv::ephemeral().unwrap();
    let fields = db.fields();

    for _ in 0..3 {
        fields.inc_counter(FileId(7), None).unwrap();
    }
    assert_eq!(fields.dec_counter(FileId(7), None).unwrap(), 2);
    assert_eq!(fields.get_counter(FileId(7), None).unwrap(), 2);
}

#[test]
fn test_counter_extra_is_separate() {
    let db = ChatKv::ephemeral().unwrap();
    let fields = db.fields();

    fields.inc_counter(FileId(7), Some("unread")).unwrap();
    fields.inc_counter(FileId(7), Some("unread")).unwrap();
    assert_eq!(fields.get_counter(FileId(7), Some("unread")).unwrap(), 2);
    assert_eq!(fields.get_counter(FileId(7), None).unwrap(), 0);
}

#[test]
fn test_flags_default_to_invalid() {
    let db = ChatKv::ephemeral().unwrap();
    let fields = db.fields();

    assert!(!fields.is_valid(FileId(1), "alice", None).unwrap());
    fields.make_valid(FileId(1), "alice", None).unwrap();
    assert!(fields.is_valid(FileId(1), "alice", None).unwrap());
    assert!(!fields.is_valid(FileId(1), "alice", Some("admin")).unwrap());
    fields.invalidate(FileId(1), "alice", None).unwrap();
    assert!(!fields.is_valid(FileId(1), "alice", None).unwrap());
}

#[test]
fn test_list_membership() {
    let db = ChatKv::ephemeral().unwrap();
    let fields = db.fields();

    assert!(fields.get_list(FileId(4), Some("members")).unwrap().is_empty());
    for v in [10, 20, 30] {
        assert!(fields.add_to_list(FileId(4), Some("members"), v).unwrap());
    }
    assert!(!fields.add_to_list(FileId(4), Some("members"), 20).unwrap());
    assert!(fields.remove_from_list(FileId(4), Some("members"), 20).unwrap());
    assert!(!fields.remove_from_list(FileId(4), Some("members"), 99).unwrap());

    assert_eq!(fields.get_list(FileId(4), Some("members")).unwrap(), vec![10, 30]);
    assert!(fields.list_contains(FileId(4), Some("members"), 30).unwrap());
    assert!(fields.get_list(FileId(4), None).unwrap().is_empty());
}

#[test]
fn test_map_entries() {
    let db = ChatKv::ephemeral().unwrap();
    let fields = db.fields();

    assert_eq!(fields.read_map("motd").unwrap(), None);
    fields.write_map("motd", "hello, world").unwrap();
    assert_eq!(fields.read_map("motd").unwrap().as_deref(), Some("hello, world"));
}
