#![allow(dead_code)]

use std::path::PathBuf;

use minirel::{
    plan::{CreateTableData, InsertData, UpdateCommand},
    query::Constant,
    record::Schema,
    utils, Database,
};
use tempfile::TempDir;

/// Set up log configuration and hand out a scratch directory. The database
/// itself goes into a subdirectory so the engine sees a directory that does
/// not exist yet.
pub fn setup() -> TempDir {
    utils::init_log();
    TempDir::new().unwrap()
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("testdb")
}

/// A kernel-only database: storage managers, no catalog or planner.
pub fn kernel_db(dir: &TempDir) -> Database {
    Database::with_config(db_path(dir), minirel::BLOCK_SIZE, minirel::BUFFER_SIZE).unwrap()
}

/// Create table `T(A int, B varchar(9))` and fill it with rows
/// `(i, "rec" + i)` for i in 0..n.
pub fn create_single_table(db: &Database, n: i32) {
    let tx = db.new_tx().unwrap();

    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_string_field("b", 9);
    db.planner()
        .execute_update(
            &UpdateCommand::CreateTable(CreateTableData::new("t", schema)),
            &tx,
        )
        .unwrap();

    for i in 0..n {
        let cmd = UpdateCommand::Insert(InsertData::new(
            "t",
            vec!["a".to_string(), "b".to_string()],
            vec![Constant::Int(i), Constant::Str(format!("rec{}", i))],
        ));
        db.planner().execute_update(&cmd, &tx).unwrap();
    }
    tx.commit().unwrap();
}

/// Create tables `t1(a, b)` and `t2(c, d)` with n rows each, where
/// `a = i`, `b = "bbb" + i`, `c = n - 1 - i`, `d = "bbb" + c`. Every t1 row
/// joins exactly one t2 row on a = c, and the joined b and d strings match
/// character for character.
pub fn create_join_tables(db: &Database, n: i32) {
    let tx = db.new_tx().unwrap();

    let mut schema1 = Schema::new();
    schema1.add_int_field("a");
    schema1.add_string_field("b", 9);
    db.planner()
        .execute_update(
            &UpdateCommand::CreateTable(CreateTableData::new("t1", schema1)),
            &tx,
        )
        .unwrap();

    let mut schema2 = Schema::new();
    schema2.add_int_field("c");
    schema2.add_string_field("d", 9);
    db.planner()
        .execute_update(
            &UpdateCommand::CreateTable(CreateTableData::new("t2", schema2)),
            &tx,
        )
        .unwrap();

    for i in 0..n {
        let cmd = UpdateCommand::Insert(InsertData::new(
            "t1",
            vec!["a".to_string(), "b".to_string()],
            vec![Constant::Int(i), Constant::Str(format!("bbb{}", i))],
        ));
        db.planner().execute_update(&cmd, &tx).unwrap();

        let c = n - 1 - i;
        let cmd = UpdateCommand::Insert(InsertData::new(
            "t2",
            vec!["c".to_string(), "d".to_string()],
            vec![Constant::Int(c), Constant::Str(format!("bbb{}", c))],
        ));
        db.planner().execute_update(&cmd, &tx).unwrap();
    }
    tx.commit().unwrap();
}
