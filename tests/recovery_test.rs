mod test_utils;

use minirel::{file::BlockId, Database};
use test_utils::{db_path, kernel_db, setup};

const BLOCK_SIZE: usize = minirel::BLOCK_SIZE;
const BUFFER_SIZE: usize = minirel::BUFFER_SIZE;

fn blocks() -> (BlockId, BlockId) {
    (
        BlockId::new("testfile", 0),
        BlockId::new("testfile", 1),
    )
}

/// Two blocks, each holding six ints (values 0..6 at offsets 0, 4, ..) and
/// one string at offset 200.
fn initialize(db: &Database) {
    let tx1 = db.new_tx().unwrap();
    let tx2 = db.new_tx().unwrap();
    tx1.append("testfile").unwrap();
    tx1.append("testfile").unwrap();
    let (blk0, blk1) = blocks();
    tx1.pin(&blk0).unwrap();
    tx2.pin(&blk1).unwrap();
    for i in 0..6 {
        tx1.set_int(&blk0, 4 * i, i as i32, false).unwrap();
        tx2.set_int(&blk1, 4 * i, i as i32, false).unwrap();
    }
    tx1.set_string(&blk0, 200, "abc", false).unwrap();
    tx2.set_string(&blk1, 200, "def", false).unwrap();
    tx1.commit().unwrap();
    tx2.commit().unwrap();
}

fn assert_initial_values(db: &Database) {
    let tx = db.new_tx().unwrap();
    let (blk0, blk1) = blocks();
    tx.pin(&blk0).unwrap();
    tx.pin(&blk1).unwrap();
    for i in 0..6 {
        assert_eq!(tx.get_int(&blk0, 4 * i).unwrap(), i as i32);
        assert_eq!(tx.get_int(&blk1, 4 * i).unwrap(), i as i32);
    }
    assert_eq!(tx.get_string(&blk0, 200).unwrap(), "abc");
    assert_eq!(tx.get_string(&blk1, 200).unwrap(), "def");
    tx.commit().unwrap();
}

#[test]
fn test_rollback_restores_old_values() {
    let dir = setup();
    let db = kernel_db(&dir);
    initialize(&db);

    let (blk0, _) = blocks();
    let tx = db.new_tx().unwrap();
    tx.pin(&blk0).unwrap();
    for i in 0..6 {
        tx.set_int(&blk0, 4 * i, 100 + i as i32, true).unwrap();
    }
    tx.set_string(&blk0, 200, "uvw", true).unwrap();
    tx.rollback().unwrap();

    assert_initial_values(&db);
}

#[test]
fn test_recover_after_crash_undoes_unfinished_transactions() {
    let dir = setup();
    {
        let db = kernel_db(&dir);
        initialize(&db);

        // two transactions modify both blocks but never commit
        let tx3 = db.new_tx().unwrap();
        let tx4 = db.new_tx().unwrap();
        let (blk0, blk1) = blocks();
        tx3.pin(&blk0).unwrap();
        tx4.pin(&blk1).unwrap();
        for i in 0..6 {
            tx3.set_int(&blk0, 4 * i, 100 + i as i32, true).unwrap();
            tx4.set_int(&blk1, 4 * i, 100 + i as i32, true).unwrap();
        }
        tx3.set_string(&blk0, 200, "uvw", true).unwrap();
        tx4.set_string(&blk1, 200, "xyz", true).unwrap();

        // push the modified pages to disk, then "crash": tx3 rolls back,
        // tx4 simply disappears
        db.buffer_manager().flush_all(tx3.tx_number()).unwrap();
        db.buffer_manager().flush_all(tx4.tx_number()).unwrap();
        tx3.rollback().unwrap();
    }

    // restart: recovery undoes tx4 and leaves the committed state
    let db = Database::with_config(db_path(&dir), BLOCK_SIZE, BUFFER_SIZE).unwrap();
    let tx = db.new_tx().unwrap();
    tx.recover().unwrap();
    tx.commit().unwrap();

    assert_initial_values(&db);
}

#[test]
fn test_committed_transactions_survive_crash() {
    let dir = setup();
    {
        let db = kernel_db(&dir);
        initialize(&db);

        let (blk0, _) = blocks();
        let tx = db.new_tx().unwrap();
        tx.pin(&blk0).unwrap();
        tx.set_int(&blk0, 0, 7777, true).unwrap();
        tx.commit().unwrap();
        // crash without any further flushing
    }

    let db = Database::with_config(db_path(&dir), BLOCK_SIZE, BUFFER_SIZE).unwrap();
    let tx = db.new_tx().unwrap();
    tx.recover().unwrap();

    let (blk0, _) = blocks();
    tx.pin(&blk0).unwrap();
    assert_eq!(tx.get_int(&blk0, 0).unwrap(), 7777);
    tx.commit().unwrap();
}
