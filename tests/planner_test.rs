mod test_utils;

use std::sync::Arc;

use minirel::{
    plan::{
        CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
        QueryData, UpdateCommand,
    },
    query::{Constant, Expression, Predicate, Scan, Term, UpdateScan},
    record::{Schema, TableScan},
    Database,
};
use test_utils::{create_join_tables, create_single_table, db_path, setup};

fn field_equals_int(field: &str, val: i32) -> Predicate {
    Predicate::from_term(Term::new(
        Expression::Field(field.to_string()),
        Expression::Constant(Constant::Int(val)),
    ))
}

#[test]
fn test_single_table_query() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    create_single_table(&db, 200);

    // select b from t where a = 10
    let tx = db.new_tx().unwrap();
    let query = QueryData::new(
        vec!["b".to_string()],
        vec!["t".to_string()],
        field_equals_int("a", 10),
    );
    let plan = db.planner().create_query_plan(&query, &tx).unwrap();

    let mut scan = plan.open().unwrap();
    let mut rows = Vec::new();
    while scan.next().unwrap() {
        rows.push(scan.get_string("b").unwrap());
    }
    scan.close();
    assert_eq!(rows, vec!["rec10".to_string()]);
    tx.commit().unwrap();
}

#[test]
fn test_join_query() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    create_join_tables(&db, 100);

    // select b, d from t1, t2 where a = c
    let tx = db.new_tx().unwrap();
    let query = QueryData::new(
        vec!["b".to_string(), "d".to_string()],
        vec!["t1".to_string(), "t2".to_string()],
        Predicate::from_term(Term::new(
            Expression::Field("a".to_string()),
            Expression::Field("c".to_string()),
        )),
    );
    let plan = db.planner().create_query_plan(&query, &tx).unwrap();

    let mut scan = plan.open().unwrap();
    let mut count = 0;
    while scan.next().unwrap() {
        assert_eq!(
            scan.get_string("b").unwrap(),
            scan.get_string("d").unwrap()
        );
        count += 1;
    }
    scan.close();
    assert_eq!(count, 100);
    tx.commit().unwrap();
}

#[test]
fn test_delete_and_modify_commands() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    create_single_table(&db, 50);

    let tx = db.new_tx().unwrap();

    // delete from t where a = 7
    let deleted = db
        .planner()
        .execute_update(
            &UpdateCommand::Delete(DeleteData::new("t", field_equals_int("a", 7))),
            &tx,
        )
        .unwrap();
    assert_eq!(deleted, 1);

    // update t set b = 'changed' where a = 8
    let modified = db
        .planner()
        .execute_update(
            &UpdateCommand::Modify(ModifyData::new(
                "t",
                "b",
                Expression::Constant(Constant::Str("changed".to_string())),
                field_equals_int("a", 8),
            )),
            &tx,
        )
        .unwrap();
    assert_eq!(modified, 1);

    // check both effects in one scan
    let query = QueryData::new(
        vec!["a".to_string(), "b".to_string()],
        vec!["t".to_string()],
        Predicate::new(),
    );
    let plan = db.planner().create_query_plan(&query, &tx).unwrap();
    let mut scan = plan.open().unwrap();
    let mut count = 0;
    while scan.next().unwrap() {
        let a = scan.get_int("a").unwrap();
        assert_ne!(a, 7);
        if a == 8 {
            assert_eq!(scan.get_string("b").unwrap(), "changed");
        }
        count += 1;
    }
    scan.close();
    assert_eq!(count, 49);
    tx.commit().unwrap();
}

#[test]
fn test_view_expands_transparently() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    create_single_table(&db, 30);

    let tx = db.new_tx().unwrap();

    // create view v as select b from t where a = 3
    let view_query = QueryData::new(
        vec!["b".to_string()],
        vec!["t".to_string()],
        field_equals_int("a", 3),
    );
    db.planner()
        .execute_update(
            &UpdateCommand::CreateView(CreateViewData::new("v", view_query)),
            &tx,
        )
        .unwrap();

    // select b from v
    let query = QueryData::new(
        vec!["b".to_string()],
        vec!["v".to_string()],
        Predicate::new(),
    );
    let plan = db.planner().create_query_plan(&query, &tx).unwrap();
    let mut scan = plan.open().unwrap();
    let mut rows = Vec::new();
    while scan.next().unwrap() {
        rows.push(scan.get_string("b").unwrap());
    }
    scan.close();
    assert_eq!(rows, vec!["rec3".to_string()]);
    tx.commit().unwrap();
}

#[test]
fn test_index_is_maintained_by_updates() {
    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();

    let tx = db.new_tx().unwrap();

    // create table t3(c int, s varchar(9)) with an index on c
    let mut schema = Schema::new();
    schema.add_int_field("c");
    schema.add_string_field("s", 9);
    db.planner()
        .execute_update(
            &UpdateCommand::CreateTable(CreateTableData::new("t3", schema)),
            &tx,
        )
        .unwrap();
    db.planner()
        .execute_update(
            &UpdateCommand::CreateIndex(CreateIndexData::new("idxc", "t3", "c")),
            &tx,
        )
        .unwrap();

    // 100 rows with c = i mod 10; each insert also feeds the index
    for i in 0..100 {
        db.planner()
            .execute_update(
                &UpdateCommand::Insert(InsertData::new(
                    "t3",
                    vec!["c".to_string(), "s".to_string()],
                    vec![Constant::Int(i % 10), Constant::Str(format!("rec{}", i))],
                )),
                &tx,
            )
            .unwrap();
    }

    // probing the index for 3 yields exactly the ten matching records
    let indexes = db.metadata().get_index_info("t3", &tx).unwrap();
    let ii = indexes.get("c").expect("index on c");
    let mut idx = ii.open().unwrap();
    idx.before_first(&Constant::Int(3)).unwrap();

    let layout = db.metadata().get_layout("t3", &tx).unwrap();
    let mut ts = TableScan::new(Arc::clone(&tx), "t3", layout).unwrap();
    let mut count = 0;
    while idx.next().unwrap() {
        let rid = idx.get_data_rid().unwrap();
        ts.move_to_rid(rid).unwrap();
        assert_eq!(ts.get_int("c").unwrap(), 3);
        count += 1;
    }
    assert_eq!(count, 10);
    ts.close();
    idx.close();

    // deleting the rows with c = 3 empties that key in the index
    db.planner()
        .execute_update(
            &UpdateCommand::Delete(DeleteData::new("t3", field_equals_int("c", 3))),
            &tx,
        )
        .unwrap();
    let mut idx = ii.open().unwrap();
    idx.before_first(&Constant::Int(3)).unwrap();
    assert!(!idx.next().unwrap());
    idx.close();
    tx.commit().unwrap();
}

#[test]
fn test_index_select_plan() {
    use minirel::plan::{IndexSelectPlan, Plan, TablePlan};

    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();

    let tx = db.new_tx().unwrap();
    let mut schema = Schema::new();
    schema.add_int_field("c");
    schema.add_string_field("s", 9);
    db.planner()
        .execute_update(
            &UpdateCommand::CreateTable(CreateTableData::new("t4", schema)),
            &tx,
        )
        .unwrap();
    db.planner()
        .execute_update(
            &UpdateCommand::CreateIndex(CreateIndexData::new("idxs", "t4", "c")),
            &tx,
        )
        .unwrap();
    for i in 0..60 {
        db.planner()
            .execute_update(
                &UpdateCommand::Insert(InsertData::new(
                    "t4",
                    vec!["c".to_string(), "s".to_string()],
                    vec![Constant::Int(i % 6), Constant::Str(format!("rec{}", i))],
                )),
                &tx,
            )
            .unwrap();
    }

    let mut indexes = db.metadata().get_index_info("t4", &tx).unwrap();
    let ii = indexes.remove("c").expect("index on c");
    let table_plan = Arc::new(TablePlan::new(Arc::clone(&tx), "t4", db.metadata()).unwrap());
    let plan = IndexSelectPlan::new(table_plan, ii, Constant::Int(2));

    let mut scan = plan.open().unwrap();
    let mut count = 0;
    while scan.next().unwrap() {
        assert_eq!(scan.get_int("c").unwrap(), 2);
        count += 1;
    }
    scan.close();
    assert_eq!(count, 10);
    tx.commit().unwrap();
}

#[test]
fn test_index_join_plan() {
    use minirel::plan::{IndexJoinPlan, Plan, TablePlan};

    let dir = setup();
    let db = Database::new(db_path(&dir)).unwrap();
    create_join_tables(&db, 40);

    // index t2 on c after the fact, then fill it from the table
    let tx = db.new_tx().unwrap();
    db.planner()
        .execute_update(
            &UpdateCommand::CreateIndex(CreateIndexData::new("idxj", "t2", "c")),
            &tx,
        )
        .unwrap();
    {
        let mut indexes = db.metadata().get_index_info("t2", &tx).unwrap();
        let ii = indexes.remove("c").unwrap();
        let mut idx = ii.open().unwrap();
        let layout = db.metadata().get_layout("t2", &tx).unwrap();
        let mut ts = TableScan::new(Arc::clone(&tx), "t2", layout).unwrap();
        while ts.next().unwrap() {
            let val = ts.get_val("c").unwrap();
            let rid = ts.get_rid().unwrap();
            idx.insert(&val, rid).unwrap();
        }
        ts.close();
        idx.close();
    }

    let p1: Arc<dyn Plan> = Arc::new(TablePlan::new(Arc::clone(&tx), "t1", db.metadata()).unwrap());
    let p2 = Arc::new(TablePlan::new(Arc::clone(&tx), "t2", db.metadata()).unwrap());
    let mut indexes = db.metadata().get_index_info("t2", &tx).unwrap();
    let ii = indexes.remove("c").unwrap();
    let plan = IndexJoinPlan::new(p1, p2, ii, "a");

    let mut scan = plan.open().unwrap();
    let mut count = 0;
    while scan.next().unwrap() {
        assert_eq!(scan.get_int("a").unwrap(), scan.get_int("c").unwrap());
        assert_eq!(
            scan.get_string("b").unwrap(),
            scan.get_string("d").unwrap()
        );
        count += 1;
    }
    scan.close();
    assert_eq!(count, 40);
    tx.commit().unwrap();
}

#[test]
fn test_query_results_survive_restart() {
    let dir = setup();
    {
        let db = Database::new(db_path(&dir)).unwrap();
        create_single_table(&db, 20);
    }

    // a fresh instance recovers and sees the committed table
    let db = Database::new(db_path(&dir)).unwrap();
    let tx = db.new_tx().unwrap();
    let query = QueryData::new(
        vec!["b".to_string()],
        vec!["t".to_string()],
        field_equals_int("a", 19),
    );
    let plan = db.planner().create_query_plan(&query, &tx).unwrap();
    let mut scan = plan.open().unwrap();
    assert!(scan.next().unwrap());
    assert_eq!(scan.get_string("b").unwrap(), "rec19");
    assert!(!scan.next().unwrap());
    scan.close();
    tx.commit().unwrap();
}
