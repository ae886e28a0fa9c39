mod test_utils;

use std::sync::Arc;

use minirel::{
    query::{
        Constant, Expression, Predicate, ProductScan, ProjectScan, Scan, SelectScan, Term,
        UpdateScan,
    },
    record::{Layout, Schema, TableScan},
    DbError,
};
use test_utils::{kernel_db, setup};

fn fill_table(
    tx: &Arc<minirel::tx::Transaction>,
    name: &str,
    key_field: &str,
    str_field: &str,
    n: i32,
) -> Arc<Layout> {
    let mut schema = Schema::new();
    schema.add_int_field(key_field);
    schema.add_string_field(str_field, 9);
    let layout = Arc::new(Layout::new(schema));

    let mut ts = TableScan::new(Arc::clone(tx), name, Arc::clone(&layout)).unwrap();
    for i in 0..n {
        ts.insert().unwrap();
        ts.set_int(key_field, i).unwrap();
        ts.set_string(str_field, &format!("rec{}", i)).unwrap();
    }
    ts.close();
    layout
}

#[test]
fn test_select_scan_filters_by_constant() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();
    let layout = fill_table(&tx, "t", "a", "b", 200);

    let ts = TableScan::new(Arc::clone(&tx), "t", layout).unwrap();
    let term = Term::new(
        Expression::Field("a".to_string()),
        Expression::Constant(Constant::Int(10)),
    );
    let mut scan = SelectScan::new(Box::new(ts), Predicate::from_term(term));

    let mut rows = Vec::new();
    while scan.next().unwrap() {
        rows.push(scan.get_string("b").unwrap());
    }
    scan.close();
    assert_eq!(rows, vec!["rec10".to_string()]);
    tx.commit().unwrap();
}

#[test]
fn test_select_scan_supports_updates() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();
    let layout = fill_table(&tx, "t", "a", "b", 20);

    // delete the row with a = 5 through a select scan
    let ts = TableScan::new(Arc::clone(&tx), "t", Arc::clone(&layout)).unwrap();
    let term = Term::new(
        Expression::Field("a".to_string()),
        Expression::Constant(Constant::Int(5)),
    );
    let mut scan = SelectScan::new(Box::new(ts), Predicate::from_term(term));
    while scan.next().unwrap() {
        scan.delete().unwrap();
    }
    scan.close();

    let mut ts = TableScan::new(Arc::clone(&tx), "t", layout).unwrap();
    let mut count = 0;
    while ts.next().unwrap() {
        assert_ne!(ts.get_int("a").unwrap(), 5);
        count += 1;
    }
    ts.close();
    assert_eq!(count, 19);
    tx.commit().unwrap();
}

#[test]
fn test_project_scan_hides_fields() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();
    let layout = fill_table(&tx, "t", "a", "b", 5);

    let ts = TableScan::new(Arc::clone(&tx), "t", layout).unwrap();
    let mut scan = ProjectScan::new(Box::new(ts), vec!["b".to_string()]);
    assert!(scan.has_field("b"));
    assert!(!scan.has_field("a"));

    assert!(scan.next().unwrap());
    assert_eq!(scan.get_string("b").unwrap(), "rec0");
    let err = scan.get_int("a").unwrap_err();
    assert!(matches!(err, DbError::FieldNotFound(_)));
    scan.close();
    tx.commit().unwrap();
}

#[test]
fn test_product_scan_pairs_every_row() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();
    let layout1 = fill_table(&tx, "t1", "a", "b", 4);
    let layout2 = fill_table(&tx, "t2", "c", "d", 3);

    let s1 = TableScan::new(Arc::clone(&tx), "t1", layout1).unwrap();
    let s2 = TableScan::new(Arc::clone(&tx), "t2", layout2).unwrap();
    let mut scan = ProductScan::new(Box::new(s1), Box::new(s2)).unwrap();

    let mut count = 0;
    while scan.next().unwrap() {
        // both sides are visible in each output row
        scan.get_int("a").unwrap();
        scan.get_int("c").unwrap();
        count += 1;
    }
    scan.close();
    assert_eq!(count, 12);
    tx.commit().unwrap();
}

#[test]
fn test_join_through_product_and_select() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();
    let layout1 = fill_table(&tx, "t1", "a", "b", 25);

    // t2 rows run in reverse so the join has to do real matching
    let mut schema = Schema::new();
    schema.add_int_field("c");
    schema.add_string_field("d", 9);
    let layout2 = Arc::new(Layout::new(schema));
    let mut ts = TableScan::new(Arc::clone(&tx), "t2", Arc::clone(&layout2)).unwrap();
    for i in 0..25 {
        let c = 24 - i;
        ts.insert().unwrap();
        ts.set_int("c", c).unwrap();
        ts.set_string("d", &format!("rec{}", c)).unwrap();
    }
    ts.close();

    let s1 = TableScan::new(Arc::clone(&tx), "t1", layout1).unwrap();
    let s2 = TableScan::new(Arc::clone(&tx), "t2", layout2).unwrap();
    let product = ProductScan::new(Box::new(s1), Box::new(s2)).unwrap();
    let term = Term::new(
        Expression::Field("a".to_string()),
        Expression::Field("c".to_string()),
    );
    let mut scan = SelectScan::new(Box::new(product), Predicate::from_term(term));

    let mut count = 0;
    while scan.next().unwrap() {
        assert_eq!(
            scan.get_string("b").unwrap(),
            scan.get_string("d").unwrap()
        );
        count += 1;
    }
    scan.close();
    assert_eq!(count, 25);
    tx.commit().unwrap();
}
