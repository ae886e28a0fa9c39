mod test_utils;

use std::sync::Arc;

use minirel::{
    materialize::{CountFn, GroupByPlan, MaterializePlan, MergeJoinPlan, MaxFn, OneBufferSortPlan, SortPlan},
    multibuffer::{HashJoinPlan, MultiBufferSortPlan, MultibufferProductPlan},
    plan::{Plan, TablePlan},
    query::Scan,
    Database,
};
use rand::prelude::*;
use test_utils::{create_join_tables, create_single_table, db_path, setup};

fn open_db(dir: &tempfile::TempDir) -> Database {
    Database::new(db_path(dir)).unwrap()
}

/// A table `r(k, v)` with n rows whose k values are shuffled.
fn create_shuffled_table(db: &Database, n: i32) {
    use minirel::plan::{CreateTableData, InsertData, UpdateCommand};
    use minirel::query::Constant;
    use minirel::record::Schema;

    let tx = db.new_tx().unwrap();
    let mut schema = Schema::new();
    schema.add_int_field("k");
    schema.add_string_field("v", 9);
    db.planner()
        .execute_update(
            &UpdateCommand::CreateTable(CreateTableData::new("r", schema)),
            &tx,
        )
        .unwrap();

    let mut keys: Vec<i32> = (0..n).collect();
    keys.shuffle(&mut rand::thread_rng());
    for k in keys {
        let cmd = UpdateCommand::Insert(InsertData::new(
            "r",
            vec!["k".to_string(), "v".to_string()],
            vec![Constant::Int(k), Constant::Str(format!("rec{}", k))],
        ));
        db.planner().execute_update(&cmd, &tx).unwrap();
    }
    tx.commit().unwrap();
}

fn assert_sorted_output(plan: &dyn Plan, n: i32) {
    let mut scan = plan.open().unwrap();
    let mut previous = None;
    let mut count = 0;
    while scan.next().unwrap() {
        let k = scan.get_int("k").unwrap();
        if let Some(prev) = previous {
            assert!(k >= prev, "{} sorted before {}", prev, k);
        }
        previous = Some(k);
        count += 1;
    }
    scan.close();
    assert_eq!(count, n);
}

#[test]
fn test_materialize_preserves_rows() {
    let dir = setup();
    let db = open_db(&dir);
    create_single_table(&db, 50);

    let tx = db.new_tx().unwrap();
    let table_plan: Arc<dyn Plan> =
        Arc::new(TablePlan::new(Arc::clone(&tx), "t", db.metadata()).unwrap());
    let plan = MaterializePlan::new(Arc::clone(&tx), table_plan);

    let mut scan = plan.open().unwrap();
    let mut count = 0;
    while scan.next().unwrap() {
        let a = scan.get_int("a").unwrap();
        assert_eq!(scan.get_string("b").unwrap(), format!("rec{}", a));
        count += 1;
    }
    scan.close();
    assert_eq!(count, 50);
    tx.commit().unwrap();
}

#[test]
fn test_sort_plan_orders_rows() {
    let dir = setup();
    let db = open_db(&dir);
    create_shuffled_table(&db, 100);

    let tx = db.new_tx().unwrap();
    let table_plan: Arc<dyn Plan> =
        Arc::new(TablePlan::new(Arc::clone(&tx), "r", db.metadata()).unwrap());
    let plan = SortPlan::new(Arc::clone(&tx), table_plan, vec!["k".to_string()]);
    assert_sorted_output(&plan, 100);
    tx.commit().unwrap();
}

#[test]
fn test_one_buffer_sort_plan_orders_rows() {
    let dir = setup();
    let db = open_db(&dir);
    create_shuffled_table(&db, 100);

    let tx = db.new_tx().unwrap();
    let table_plan: Arc<dyn Plan> =
        Arc::new(TablePlan::new(Arc::clone(&tx), "r", db.metadata()).unwrap());
    let plan = OneBufferSortPlan::new(Arc::clone(&tx), table_plan, vec!["k".to_string()]);
    assert_sorted_output(&plan, 100);
    tx.commit().unwrap();
}

#[test]
fn test_multibuffer_sort_plan_orders_rows() {
    let dir = setup();
    let db = open_db(&dir);
    create_shuffled_table(&db, 100);

    let tx = db.new_tx().unwrap();
    let table_plan: Arc<dyn Plan> =
        Arc::new(TablePlan::new(Arc::clone(&tx), "r", db.metadata()).unwrap());
    let plan = MultiBufferSortPlan::new(Arc::clone(&tx), table_plan, vec!["k".to_string()]);
    assert_sorted_output(&plan, 100);
    tx.commit().unwrap();
}

#[test]
fn test_merge_join_matches_every_row() {
    let dir = setup();
    let db = open_db(&dir);
    create_join_tables(&db, 100);

    let tx = db.new_tx().unwrap();
    let p1: Arc<dyn Plan> = Arc::new(TablePlan::new(Arc::clone(&tx), "t1", db.metadata()).unwrap());
    let p2: Arc<dyn Plan> = Arc::new(TablePlan::new(Arc::clone(&tx), "t2", db.metadata()).unwrap());
    let plan = MergeJoinPlan::new(Arc::clone(&tx), p1, p2, "a", "c");

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
    assert_eq!(count, 100);
    tx.commit().unwrap();
}

#[test]
fn test_merge_join_replays_duplicate_groups() {
    use minirel::plan::{CreateTableData, InsertData, UpdateCommand};
    use minirel::query::Constant;
    use minirel::record::Schema;

    let dir = setup();
    let db = open_db(&dir);

    // both sides carry duplicate join keys: 3 of each key left, 2 right
    let tx = db.new_tx().unwrap();
    let mut schema1 = Schema::new();
    schema1.add_int_field("a");
    db.planner()
        .execute_update(
            &UpdateCommand::CreateTable(CreateTableData::new("l", schema1)),
            &tx,
        )
        .unwrap();
    let mut schema2 = Schema::new();
    schema2.add_int_field("c");
    db.planner()
        .execute_update(
            &UpdateCommand::CreateTable(CreateTableData::new("r", schema2)),
            &tx,
        )
        .unwrap();
    for key in 0..5 {
        for _ in 0..3 {
            db.planner()
                .execute_update(
                    &UpdateCommand::Insert(InsertData::new(
                        "l",
                        vec!["a".to_string()],
                        vec![Constant::Int(key)],
                    )),
                    &tx,
                )
                .unwrap();
        }
        for _ in 0..2 {
            db.planner()
                .execute_update(
                    &UpdateCommand::Insert(InsertData::new(
                        "r",
                        vec!["c".to_string()],
                        vec![Constant::Int(key)],
                    )),
                    &tx,
                )
                .unwrap();
        }
    }

    let p1: Arc<dyn Plan> = Arc::new(TablePlan::new(Arc::clone(&tx), "l", db.metadata()).unwrap());
    let p2: Arc<dyn Plan> = Arc::new(TablePlan::new(Arc::clone(&tx), "r", db.metadata()).unwrap());
    let plan = MergeJoinPlan::new(Arc::clone(&tx), p1, p2, "a", "c");

    let mut scan = plan.open().unwrap();
    let mut count = 0;
    while scan.next().unwrap() {
        assert_eq!(scan.get_int("a").unwrap(), scan.get_int("c").unwrap());
        count += 1;
    }
    scan.close();
    // every 3-row group joins every 2-row group with the same key
    assert_eq!(count, 5 * 3 * 2);
    tx.commit().unwrap();
}

#[test]
fn test_group_by_counts_and_maxima() {
    use minirel::plan::{CreateTableData, InsertData, UpdateCommand};
    use minirel::query::Constant;
    use minirel::record::Schema;

    let dir = setup();
    let db = open_db(&dir);

    // 100 rows with a = i / 10 and b = i
    let tx = db.new_tx().unwrap();
    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_int_field("b");
    db.planner()
        .execute_update(
            &UpdateCommand::CreateTable(CreateTableData::new("g", schema)),
            &tx,
        )
        .unwrap();
    for i in 0..100 {
        db.planner()
            .execute_update(
                &UpdateCommand::Insert(InsertData::new(
                    "g",
                    vec!["a".to_string(), "b".to_string()],
                    vec![Constant::Int(i / 10), Constant::Int(i)],
                )),
                &tx,
            )
            .unwrap();
    }

    let table_plan: Arc<dyn Plan> =
        Arc::new(TablePlan::new(Arc::clone(&tx), "g", db.metadata()).unwrap());
    let plan = GroupByPlan::new(
        Arc::clone(&tx),
        table_plan,
        vec!["a".to_string()],
        vec![Box::new(CountFn::new("b")), Box::new(MaxFn::new("b"))],
    );

    let mut scan = plan.open().unwrap();
    let mut groups = 0;
    while scan.next().unwrap() {
        let a = scan.get_int("a").unwrap();
        assert_eq!(scan.get_int("countofb").unwrap(), 10);
        assert_eq!(scan.get_int("maxofb").unwrap(), 10 * a + 9);
        groups += 1;
    }
    scan.close();
    assert_eq!(groups, 10);
    tx.commit().unwrap();
}

#[test]
fn test_multibuffer_product_counts_all_pairs() {
    let dir = setup();
    let db = open_db(&dir);
    create_join_tables(&db, 30);

    let tx = db.new_tx().unwrap();
    let p1: Arc<dyn Plan> = Arc::new(TablePlan::new(Arc::clone(&tx), "t1", db.metadata()).unwrap());
    let p2: Arc<dyn Plan> = Arc::new(TablePlan::new(Arc::clone(&tx), "t2", db.metadata()).unwrap());
    let plan = MultibufferProductPlan::new(Arc::clone(&tx), p1, p2);

    let mut scan = plan.open().unwrap();
    let mut count = 0;
    while scan.next().unwrap() {
        scan.get_int("a").unwrap();
        scan.get_int("c").unwrap();
        count += 1;
    }
    scan.close();
    assert_eq!(count, 30 * 30);
    tx.commit().unwrap();
}

#[test]
fn test_hash_join_matches_every_row() {
    let dir = setup();
    let db = open_db(&dir);
    create_join_tables(&db, 60);

    let tx = db.new_tx().unwrap();
    let p1: Arc<dyn Plan> = Arc::new(TablePlan::new(Arc::clone(&tx), "t1", db.metadata()).unwrap());
    let p2: Arc<dyn Plan> = Arc::new(TablePlan::new(Arc::clone(&tx), "t2", db.metadata()).unwrap());
    let plan = HashJoinPlan::new(Arc::clone(&tx), p1, p2, "a", "c");

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
    assert_eq!(count, 60);
    tx.commit().unwrap();
}
