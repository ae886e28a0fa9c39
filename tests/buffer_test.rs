mod test_utils;

use std::{sync::Arc, time::Duration};

use minirel::{
    buffer::BufferManager,
    file::{BlockId, FileManager},
    log::LogManager,
    utils::HandyRwLock,
    DbError,
};
use test_utils::{db_path, setup};

fn managers(dir: &tempfile::TempDir) -> (Arc<FileManager>, Arc<LogManager>) {
    let fm = Arc::new(FileManager::new(db_path(dir), 400).unwrap());
    let lm = Arc::new(LogManager::new(Arc::clone(&fm), "testlog").unwrap());
    // a few blocks to pin
    for _ in 0..6 {
        fm.append("testfile").unwrap();
    }
    (fm, lm)
}

#[test]
fn test_available_tracks_pins() {
    let dir = setup();
    let (fm, lm) = managers(&dir);
    let bm = BufferManager::new(fm, lm, 3);

    assert_eq!(bm.available(), 3);
    let b0 = bm.pin(&BlockId::new("testfile", 0)).unwrap();
    let _b1 = bm.pin(&BlockId::new("testfile", 1)).unwrap();
    assert_eq!(bm.available(), 1);

    // a second pin of a resident block costs nothing
    let b0_again = bm.pin(&BlockId::new("testfile", 0)).unwrap();
    assert_eq!(bm.available(), 1);

    bm.unpin(&b0);
    assert_eq!(bm.available(), 1);
    bm.unpin(&b0_again);
    assert_eq!(bm.available(), 2);
}

#[test]
fn test_pin_times_out_when_pool_is_full() {
    let dir = setup();
    let (fm, lm) = managers(&dir);
    let bm = BufferManager::with_wait_time(fm, lm, 3, Duration::from_millis(50));

    let _b0 = bm.pin(&BlockId::new("testfile", 0)).unwrap();
    let _b1 = bm.pin(&BlockId::new("testfile", 1)).unwrap();
    let _b2 = bm.pin(&BlockId::new("testfile", 2)).unwrap();

    let err = bm.pin(&BlockId::new("testfile", 3)).unwrap_err();
    assert!(matches!(err, DbError::BufferAbort));
}

#[test]
fn test_modified_page_survives_eviction() {
    let dir = setup();
    let (fm, lm) = managers(&dir);
    let bm = BufferManager::new(fm, lm, 3);

    let block = BlockId::new("testfile", 1);

    // step 1: modify the page and mark the buffer dirty
    let buffer = bm.pin(&block).unwrap();
    {
        let mut b = buffer.wl();
        let n = b.contents().get_int(80);
        b.contents_mut().set_int(80, n + 1);
        b.set_modified(1, 0);
    }
    bm.unpin(&buffer);
    drop(buffer);

    // step 2: force the buffer out by pinning other blocks
    for i in 2..5 {
        let b = bm.pin(&BlockId::new("testfile", i)).unwrap();
        bm.unpin(&b);
    }

    // step 3: the write must have reached disk
    let buffer = bm.pin(&block).unwrap();
    assert_eq!(buffer.rl().contents().get_int(80), 1);
    bm.unpin(&buffer);
}
