mod test_utils;

use std::sync::Arc;

use minirel::{
    index::{BTreeIndex, HashIndex, Index},
    query::Constant,
    record::{Layout, Rid, Schema},
};
use test_utils::{kernel_db, setup};

/// The layout of index records: the location of the data record plus the
/// indexed value.
fn index_layout() -> Arc<Layout> {
    let mut schema = Schema::new();
    schema.add_int_field("block");
    schema.add_int_field("id");
    schema.add_int_field("dataval");
    Arc::new(Layout::new(schema))
}

#[test]
fn test_btree_duplicate_keys() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();

    // 100 entries with keys i mod 10, pointing at synthetic records
    let mut idx = BTreeIndex::new(Arc::clone(&tx), "idxc", index_layout()).unwrap();
    for i in 0..100 {
        idx.insert(&Constant::Int(i % 10), Rid::new(i / 50, i % 50))
            .unwrap();
    }

    // every key yields exactly its ten rids
    for key in 0..10 {
        idx.before_first(&Constant::Int(key)).unwrap();
        let mut rids = Vec::new();
        while idx.next().unwrap() {
            rids.push(idx.get_data_rid().unwrap());
        }
        assert_eq!(rids.len(), 10, "key {}", key);
        for rid in rids {
            let i = rid.block_number() * 50 + rid.slot();
            assert_eq!(i % 10, key);
        }
    }
    idx.close();
    tx.commit().unwrap();
}

#[test]
fn test_btree_splits_under_load() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();

    // distinct ascending keys force leaf and directory splits
    let n = 600;
    let mut idx = BTreeIndex::new(Arc::clone(&tx), "idxa", index_layout()).unwrap();
    for i in 0..n {
        idx.insert(&Constant::Int(i), Rid::new(i / 20, i % 20)).unwrap();
    }

    // the leaf file grew well past one block
    assert!(tx.size("idxaleaf.tbl").unwrap() > 1);

    for key in [0, 1, 299, n - 1] {
        idx.before_first(&Constant::Int(key)).unwrap();
        assert!(idx.next().unwrap(), "key {} not found", key);
        let rid = idx.get_data_rid().unwrap();
        assert_eq!(rid.block_number(), key / 20);
        assert_eq!(rid.slot(), key % 20);
        assert!(!idx.next().unwrap(), "key {} is unique", key);
    }
    idx.close();
    tx.commit().unwrap();
}

#[test]
fn test_btree_overflow_chain_for_one_key() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();

    // far more duplicates of one key than a single leaf can hold
    let mut idx = BTreeIndex::new(Arc::clone(&tx), "idxd", index_layout()).unwrap();
    for i in 0..80 {
        idx.insert(&Constant::Int(7), Rid::new(0, i)).unwrap();
    }
    idx.insert(&Constant::Int(3), Rid::new(1, 0)).unwrap();
    idx.insert(&Constant::Int(9), Rid::new(2, 0)).unwrap();

    idx.before_first(&Constant::Int(7)).unwrap();
    let mut count = 0;
    while idx.next().unwrap() {
        count += 1;
    }
    assert_eq!(count, 80);

    // the neighbours are still reachable
    idx.before_first(&Constant::Int(3)).unwrap();
    assert!(idx.next().unwrap());
    idx.before_first(&Constant::Int(9)).unwrap();
    assert!(idx.next().unwrap());
    idx.close();
    tx.commit().unwrap();
}

#[test]
fn test_btree_delete() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();

    let mut idx = BTreeIndex::new(Arc::clone(&tx), "idxe", index_layout()).unwrap();
    for i in 0..10 {
        idx.insert(&Constant::Int(4), Rid::new(0, i)).unwrap();
    }
    idx.delete(&Constant::Int(4), Rid::new(0, 3)).unwrap();

    idx.before_first(&Constant::Int(4)).unwrap();
    let mut rids = Vec::new();
    while idx.next().unwrap() {
        rids.push(idx.get_data_rid().unwrap());
    }
    assert_eq!(rids.len(), 9);
    assert!(!rids.contains(&Rid::new(0, 3)));
    idx.close();
    tx.commit().unwrap();
}

#[test]
fn test_hash_index_membership() {
    let dir = setup();
    let db = kernel_db(&dir);
    let tx = db.new_tx().unwrap();

    let mut idx = HashIndex::new(Arc::clone(&tx), "idxh", index_layout());
    for i in 0..100 {
        idx.insert(&Constant::Int(i % 10), Rid::new(i / 50, i % 50))
            .unwrap();
    }

    idx.before_first(&Constant::Int(3)).unwrap();
    let mut count = 0;
    while idx.next().unwrap() {
        let rid = idx.get_data_rid().unwrap();
        let i = rid.block_number() * 50 + rid.slot();
        assert_eq!(i % 10, 3);
        count += 1;
    }
    assert_eq!(count, 10);

    // deleting one entry leaves the other nine
    idx.delete(&Constant::Int(3), Rid::new(0, 3)).unwrap();
    idx.before_first(&Constant::Int(3)).unwrap();
    let mut count = 0;
    while idx.next().unwrap() {
        count += 1;
    }
    assert_eq!(count, 9);
    idx.close();
    tx.commit().unwrap();
}
