//! Hash files driven through the public API over real files

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use static_hash_file::{
    FileBlockStorage, HashFile, HashFileConfig, HashFileError, IndexDesc, Record,
};
use tempfile::TempDir;

fn person(id: i32) -> Record {
    Record::new(id, format!("N{id}"), format!("Surname{id}"), "Thessaloniki").unwrap()
}

fn sorted_scan(db: &HashFile<FileBlockStorage>, desc: IndexDesc) -> Vec<Record> {
    let mut records: Vec<Record> = db
        .all_entries(desc)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    records.sort_by_key(|record| record.id());
    records
}

#[test]
fn test_records_survive_close_and_reopen() {
    let dir = TempDir::new().unwrap();
    let mut db = HashFile::new(FileBlockStorage::with_root(dir.path()));

    // More buckets than one directory block holds
    db.create_index("wide.db", 200).unwrap();
    let desc = db.open_index("wide.db").unwrap();
    let expected: Vec<Record> = (-20..180).map(person).collect();
    for record in &expected {
        db.insert_entry(desc, record).unwrap();
    }
    db.close_file(desc).unwrap();
    assert_eq!(db.storage().open_files(), 0);

    let desc = db.open_index("wide.db").unwrap();
    assert_eq!(db.header(desc).unwrap().depth(), 200);
    assert_eq!(sorted_scan(&db, desc), expected);
    assert_eq!(db.find_entry(desc, -7).unwrap(), person(-7));
    assert!(matches!(
        db.find_entry(desc, 1000),
        Err(HashFileError::NotFound(1000))
    ));

    let stats = db.statistics(desc).unwrap();
    assert_eq!(stats.directory_blocks, 2);
    assert_eq!(stats.records, 200);
    assert_eq!(stats.unreachable_blocks(), 0);
    db.close_all().unwrap();
}

#[test]
fn test_several_indexes_share_the_table() {
    let dir = TempDir::new().unwrap();
    let config = HashFileConfig::default().with_max_open_files(2);
    let mut db = HashFile::with_config(FileBlockStorage::with_root(dir.path()), config);

    db.create_index("a.db", 3).unwrap();
    db.create_index("b.db", 5).unwrap();
    db.create_index("c.db", 7).unwrap();
    let a = db.open_index("a.db").unwrap();
    let b = db.open_index("b.db").unwrap();
    assert!(matches!(
        db.open_index("c.db"),
        Err(HashFileError::Capacity { capacity: 2 })
    ));
    assert!(matches!(
        db.open_index("a.db"),
        Err(HashFileError::AlreadyOpen(_))
    ));

    db.insert_entry(a, &person(1)).unwrap();
    db.insert_entry(b, &person(2)).unwrap();
    assert_eq!(sorted_scan(&db, a), vec![person(1)]);
    assert_eq!(sorted_scan(&db, b), vec![person(2)]);

    // The freed slot is handed out again
    db.close_file(a).unwrap();
    assert_eq!(db.open_index("a.db").unwrap(), a);
    db.close_all().unwrap();
}

#[test]
fn test_create_refuses_existing_file() {
    let dir = TempDir::new().unwrap();
    let db = HashFile::new(FileBlockStorage::with_root(dir.path()));
    db.create_index("twice.db", 4).unwrap();
    assert!(db.create_index("twice.db", 4).is_err());
}

fn text(max: usize) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[a-zA-Z ]{{0,{max}}}")).unwrap()
}

fn people() -> impl Strategy<Value = HashMap<i32, (String, String, String)>> {
    prop::collection::hash_map(any::<i32>(), (text(15), text(20), text(20)), 0..60)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn scan_returns_every_inserted_record(depth in 1u32..40, people in people()) {
        let dir = TempDir::new().unwrap();
        let mut db = HashFile::new(FileBlockStorage::with_root(dir.path()));
        db.create_index("prop.db", depth).unwrap();
        let desc = db.open_index("prop.db").unwrap();

        let mut expected = Vec::new();
        for (id, (name, surname, city)) in &people {
            let record = Record::new(*id, name.as_str(), surname.as_str(), city.as_str()).unwrap();
            db.insert_entry(desc, &record).unwrap();
            expected.push(record);
        }
        expected.sort_by_key(|record| record.id());

        prop_assert_eq!(sorted_scan(&db, desc), expected.clone());
        for record in &expected {
            prop_assert_eq!(&db.find_entry(desc, record.id()).unwrap(), record);
        }
        let stats = db.statistics(desc).unwrap();
        prop_assert_eq!(stats.records, expected.len() as u64);
        prop_assert_eq!(stats.chain_lengths.len(), depth as usize);
        db.close_all().unwrap();
    }
}
