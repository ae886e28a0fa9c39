mod test_utils;

use std::sync::Arc;

use minirel::{
    query::{Scan, UpdateScan},
    record::{Layout, RecordPage, Schema, TableScan},
};
use test_utils::{kernel_db, setup};

fn test_layout() -> Arc<Layout> {
    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_string_field("b", 9);
    Arc::new(Layout::new(schema))
}

#[test]
fn test_record_page_insert_and_delete() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();
    let layout = test_layout();

    let block = tx.append("testfile").unwrap();
    let rp = RecordPage::new(Arc::clone(&tx), block.clone(), layout).unwrap();
    rp.format().unwrap();

    // step 1: fill the page
    let mut count = 0;
    let mut slot = rp.insert_after(-1).unwrap();
    while slot >= 0 {
        rp.set_int(slot, "a", count).unwrap();
        rp.set_string(slot, "b", &format!("rec{}", count)).unwrap();
        count += 1;
        slot = rp.insert_after(slot).unwrap();
    }
    // slot = 4-byte flag + int + (4 + 18) string = 30 bytes
    assert_eq!(count, 13);

    // step 2: delete the records with even keys
    let mut deleted = 0;
    let mut slot = rp.next_after(-1).unwrap();
    while slot >= 0 {
        if rp.get_int(slot, "a").unwrap() % 2 == 0 {
            rp.delete(slot).unwrap();
            deleted += 1;
        }
        slot = rp.next_after(slot).unwrap();
    }
    assert_eq!(deleted, 7);

    // step 3: only odd keys remain
    let mut slot = rp.next_after(-1).unwrap();
    while slot >= 0 {
        let a = rp.get_int(slot, "a").unwrap();
        assert_eq!(a % 2, 1);
        assert_eq!(rp.get_string(slot, "b").unwrap(), format!("rec{}", a));
        slot = rp.next_after(slot).unwrap();
    }

    // step 4: deleted slots are reused before the page reports full
    let slot = rp.insert_after(-1).unwrap();
    assert!(slot >= 0);

    tx.unpin(&block);
    tx.commit().unwrap();
}

#[test]
fn test_table_scan_spans_blocks() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();
    let layout = test_layout();

    // 50 records do not fit in one 400-byte block
    let mut ts = TableScan::new(Arc::clone(&tx), "t", Arc::clone(&layout)).unwrap();
    for i in 0..50 {
        ts.insert().unwrap();
        ts.set_int("a", i).unwrap();
        ts.set_string("b", &format!("rec{}", i)).unwrap();
    }

    ts.before_first().unwrap();
    let mut expected = 0;
    while ts.next().unwrap() {
        assert_eq!(ts.get_int("a").unwrap(), expected);
        assert_eq!(ts.get_string("b").unwrap(), format!("rec{}", expected));
        expected += 1;
    }
    assert_eq!(expected, 50);
    ts.close();

    assert!(tx.size("t.tbl").unwrap() > 1);
    tx.commit().unwrap();
}

#[test]
fn test_table_scan_rid_positioning() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();
    let layout = test_layout();

    let mut ts = TableScan::new(Arc::clone(&tx), "t", Arc::clone(&layout)).unwrap();
    let mut rids = Vec::new();
    for i in 0..30 {
        ts.insert().unwrap();
        ts.set_int("a", i).unwrap();
        ts.set_string("b", &format!("rec{}", i)).unwrap();
        rids.push(ts.get_rid().unwrap());
    }

    // jump straight back to record 17
    ts.move_to_rid(rids[17]).unwrap();
    assert_eq!(ts.get_int("a").unwrap(), 17);

    // delete it and rescan: 29 records remain
    ts.delete().unwrap();
    ts.before_first().unwrap();
    let mut count = 0;
    while ts.next().unwrap() {
        assert_ne!(ts.get_int("a").unwrap(), 17);
        count += 1;
    }
    assert_eq!(count, 29);
    ts.close();
    tx.commit().unwrap();
}
