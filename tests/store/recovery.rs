//! Torn writes at the end of the log are discarded on reopen.

use crate::*;
use std::fs::OpenOptions;
use std::io::Write;

#[test]
fn test_torn_tail_is_discarded() {
    let (dir, db) = open_temp();
    db.fields().set_counter(FileId(1), None, 5).unwrap();
    db.fields().write_map("kept", "yes").unwrap();
    db.close().unwrap();

    let log = dir.path().join(chatkv::LOG_FILE_NAME);
    let good_len = std::fs::metadata(&log).unwrap().len();
    {
        // Header claiming a 9-byte key, followed by only part of it.
        let mut file = OpenOptions::new().append(true).open(&log).unwrap();
        file.write_all(&9u32.to_le_bytes()).unwrap();
        file.write_all(&3u32.to_le_bytes()).unwrap();
        file.write_all(b"torn").unwrap();
    }

    let db = open_at(&dir);
    assert_eq!(db.fields().get_counter(FileId(1), None).unwrap(), 5);
    assert_eq!(db.fields().read_map("kept").unwrap().as_deref(), Some("yes"));
    assert_eq!(std::fs::metadata(&log).unwrap().len(), good_len);

    // New writes land after the truncation point and survive another reopen.
    db.fields().set_counter(FileId(1), None, 6).unwrap();
    db.close().unwrap();
    let db = open_at(&dir);
    assert_eq!(db.fields().get_counter(FileId(1), None).unwrap(), 6);
}

#[test]
fn test_corrupt_checksum_drops_only_last_record() {
    let (dir, db) = open_temp();
    db.fields().write_map("first", "1").unwrap();
    db.fields().write_map("second", "2").unwrap();
    db.close().unwrap();

    let log = dir.path().join(chatkv::LOG_FILE_NAME);
    let mut bytes = std::fs::read(&log).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&log, &bytes).unwrap();

    let db = open_at(&dir);
    assert_eq!(db.fields().read_map("first").unwrap().as_deref(), Some("1"));
    assert_eq!(db.fields().read_map("second").unwrap(), None);
}

#[test]
fn test_oversized_value_does_not_poison_the_log() {
    let (dir, db) = open_temp();
    db.fields().write_map("before", "1").unwrap();

    let huge = "x".repeat(chatkv::MAX_RECORD_LEN as usize + 1);
    assert!(db.fields().write_map("huge", &huge).is_err());
    assert_eq!(db.fields().read_map("huge").unwrap(), None);

    db.fields().write_map("after", "2").unwrap();
    db.close().unwrap();

    let db = open_at(&dir);
    assert_eq!(db.fields().read_map("before").unwrap().as_deref(), Some("1"));
    assert_eq!(db.fields().read_map("after").unwrap().as_deref(), Some("2"));
}
