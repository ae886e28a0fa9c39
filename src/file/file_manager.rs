use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use log::debug;

use crate::{
    error::DbResult,
    file::{BlockId, Page},
};

/// Reads and writes fixed-size blocks against append-extendable files in the
/// database directory. File handles are opened lazily and cached; all four
/// operations exclude each other through a single mutex.
#[derive(Debug)]
pub struct FileManager {
    db_directory: PathBuf,
    block_size: usize,
    is_new: bool,
    open_files: Mutex<HashMap<String, File>>,
}

impl FileManager {
    pub fn new<P: AsRef<Path>>(dirname: P, block_size: usize) -> DbResult<Self> {
        let db_directory = dirname.as_ref().to_path_buf();
        let is_new = !db_directory.exists();
        if is_new {
            fs::create_dir_all(&db_directory)?;
        }

        Ok(Self {
            db_directory,
            block_size,
            is_new,
            open_files: Mutex::new(HashMap::new()),
        })
    }

    pub fn read(&self, block: &BlockId, page: &mut Page) -> DbResult<()> {
        let mut files = self.open_files.lock().unwrap();
        let file = self.get_file(&mut files, block.filename())?;

        file.seek(SeekFrom::Start(
            block.number() as u64 * self.block_size as u64,
        ))?;

        // A block at the end of a fresh file may be shorter than block_size
        // on disk; the missing tail reads as zeroes.
        let buf = page.contents_mut();
        for b in buf.iter_mut() {
            *b = 0;
        }
        let mut pos = 0;
        while pos < buf.len() {
            let n = file.read(&mut buf[pos..])?;
            if n == 0 {
                break;
            }
            pos += n;
        }
        Ok(())
    }

    pub fn write(&self, block: &BlockId, page: &Page) -> DbResult<()> {
        let mut files = self.open_files.lock().unwrap();
        let file = self.get_file(&mut files, block.filename())?;

        file.seek(SeekFrom::Start(
            block.number() as u64 * self.block_size as u64,
        ))?;
        file.write_all(page.contents())?;
        Ok(())
    }

    /// Extend the file by one zero-filled block and return its id.
    pub fn append(&self, filename: &str) -> DbResult<BlockId> {
        let mut files = self.open_files.lock().unwrap();

        let new_blknum = {
            let file = self.get_file(&mut files, filename)?;
            (file.metadata()?.len() / self.block_size as u64) as i32
        };
        let block = BlockId::new(filename, new_blknum);
        debug!("appending {}", block);

        let zeroes = vec![0u8; self.block_size];
        let file = self.get_file(&mut files, filename)?;
        file.seek(SeekFrom::Start(
            block.number() as u64 * self.block_size as u64,
        ))?;
        file.write_all(&zeroes)?;

        Ok(block)
    }

    /// The current length of the file, in blocks.
    pub fn length(&self, filename: &str) -> DbResult<i32> {
        let mut files = self.open_files.lock().unwrap();
        let file = self.get_file(&mut files, filename)?;
        Ok((file.metadata()?.len() / self.block_size as u64) as i32)
    }

    /// Whether the database directory had to be created. Consulted by higher
    /// layers to decide on first-time initialization.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn get_file<'a>(
        &self,
        files: &'a mut MutexGuard<HashMap<String, File>>,
        filename: &str,
    ) -> DbResult<&'a mut File> {
        if !files.contains_key(filename) {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(self.db_directory.join(filename))?;
            files.insert(filename.to_string(), file);
        }
        Ok(files.get_mut(filename).unwrap())
    }
}
