mod test_utils;

use minirel::{
    plan::QueryData,
    query::Predicate,
    record::{FieldType, Schema},
    Database,
};
use test_utils::{db_path, setup};

#[test]
fn test_table_metadata_round_trip() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    let tx = db.new_tx().unwrap();

    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_string_field("b", 9);
    db.metadata().create_table("mytable", &schema, &tx).unwrap();

    let layout = db.metadata().get_layout("mytable", &tx).unwrap();
    // slot: 4-byte flag, then a, then b
    assert_eq!(layout.slot_size(), 4 + 4 + (4 + 18));
    let schema = layout.schema();
    assert_eq!(schema.fields().to_vec(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(schema.field_type("a"), FieldType::Integer);
    assert_eq!(schema.field_type("b"), FieldType::Varchar);
    assert_eq!(schema.length("b"), 9);
    tx.commit().unwrap();
}

#[test]
fn test_missing_table_is_an_error() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    let tx = db.new_tx().unwrap();
    assert!(db.metadata().get_layout("nosuch", &tx).is_err());
    tx.commit().unwrap();
}

#[test]
fn test_view_metadata_round_trip() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    let tx = db.new_tx().unwrap();

    let query = QueryData::new(
        vec!["a".to_string()],
        vec!["mytable".to_string()],
        Predicate::new(),
    );
    let view_def = serde_json::to_string(&query).unwrap();
    db.metadata()
        .create_view("myview", &view_def, &tx)
        .unwrap();

    let stored = db.metadata().get_view_def("myview", &tx).unwrap().unwrap();
    let parsed: QueryData = serde_json::from_str(&stored).unwrap();
    assert_eq!(parsed.fields, vec!["a".to_string()]);
    assert_eq!(parsed.tables, vec!["mytable".to_string()]);

    assert!(db.metadata().get_view_def("nosuch", &tx).unwrap().is_none());
    tx.commit().unwrap();
}

#[test]
fn test_statistics_reflect_table_size() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    test_utils::create_single_table(&db, 100);

    let tx = db.new_tx().unwrap();
    let layout = db.metadata().get_layout("t", &tx).unwrap();
    let si = db.metadata().get_stat_info("t", &layout, &tx).unwrap();
    assert_eq!(si.records_output(), 100);
    assert!(si.blocks_accessed() > 0);
    assert!(si.distinct_values("a") >= 1);
    tx.commit().unwrap();
}

#[test]
fn test_index_metadata() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    test_utils::create_single_table(&db, 20);

    let tx = db.new_tx().unwrap();
    db.metadata()
        .create_index("idxa", "t", "a", &tx)
        .unwrap();

    let indexes = db.metadata().get_index_info("t", &tx).unwrap();
    let ii = indexes.get("a").expect("index on a");
    assert_eq!(ii.field_name(), "a");
    // the index can be opened and probed right away
    let mut idx = ii.open().unwrap();
    idx.before_first(&minirel::query::Constant::Int(3)).unwrap();
    assert!(!idx.next().unwrap(), "nothing was inserted yet");
    idx.close();
    tx.commit().unwrap();
}
