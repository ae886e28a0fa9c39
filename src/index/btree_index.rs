use std::sync::Arc;

use log::debug;

use crate::{
    error::DbResult,
    file::BlockId,
    index::{BTreeDir, BTreeLeaf, BTPage, Index},
    query::Constant,
    record::{FieldType, Layout, Rid, Schema},
    tx::Transaction,
};

/// A B-tree index over two files: `<name>leaf.tbl` holds the (dataval,
/// block, id) entries, `<name>dir.tbl` the directory levels above them.
/// The root is always directory block 0.
pub struct BTreeIndex {
    tx: Arc<Transaction>,
    dir_layout: Arc<Layout>,
    leaf_layout: Arc<Layout>,
    leaf_table: String,
    leaf: Option<BTreeLeaf>,
    root_block: BlockId,
}

impl BTreeIndex {
    pub fn new(tx: Arc<Transaction>, index_name: &str, leaf_layout: Arc<Layout>) -> DbResult<Self> {
        // deal with the leaves
        let leaf_table = format!("{}leaf.tbl", index_name);
        if tx.size(&leaf_table)? == 0 {
            let block = tx.append(&leaf_table)?;
            let node = BTPage::new(Arc::clone(&tx), block.clone(), Arc::clone(&leaf_layout))?;
            node.format(&block, -1)?;
        }

        // deal with the directory
        let mut dir_schema = Schema::new();
        dir_schema.add("block", leaf_layout.schema());
        dir_schema.add("dataval", leaf_layout.schema());
        let dir_table = format!("{}dir.tbl", index_name);
        let dir_layout = Arc::new(Layout::new(dir_schema.clone()));
        let root_block = BlockId::new(&dir_table, 0);
        if tx.size(&dir_table)? == 0 {
            // create a new root block
            tx.append(&dir_table)?;
            let node = BTPage::new(Arc::clone(&tx), root_block.clone(), Arc::clone(&dir_layout))?;
            node.format(&root_block, 0)?;

            // insert the sentinel entry pointing at leaf block 0
            let minval = match dir_schema.field_type("dataval") {
                FieldType::Integer => Constant::Int(i32::MIN),
                FieldType::Varchar => Constant::Str(String::new()),
            };
            node.insert_dir(0, &minval, 0)?;
        }

        Ok(Self {
            tx,
            dir_layout,
            leaf_layout,
            leaf_table,
            leaf: None,
            root_block,
        })
    }

    /// The expected block accesses of one traversal, given the directory
    /// size and the entries per block.
    pub fn search_cost(num_blocks: i32, rpb: i32) -> i32 {
        if num_blocks <= 1 || rpb <= 1 {
            return 1;
        }
        1 + ((num_blocks as f64).ln() / (rpb as f64).ln()) as i32
    }

    fn leaf_mut(&mut self) -> &mut BTreeLeaf {
        self.leaf.as_mut().expect("index is not positioned")
    }
}

impl Index for BTreeIndex {
    fn before_first(&mut self, search_key: &Constant) -> DbResult<()> {
        self.close();

        let mut root = BTreeDir::new(
            Arc::clone(&self.tx),
            self.root_block.clone(),
            Arc::clone(&self.dir_layout),
        )?;
        let blknum = root.search(search_key)?;
        root.close();

        let leaf_block = BlockId::new(&self.leaf_table, blknum);
        self.leaf = Some(BTreeLeaf::new(
            Arc::clone(&self.tx),
            leaf_block,
            Arc::clone(&self.leaf_layout),
            search_key.clone(),
        )?);
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        self.leaf_mut().next()
    }

    fn get_data_rid(&mut self) -> DbResult<Rid> {
        self.leaf_mut().get_data_rid()
    }

    fn insert(&mut self, dataval: &Constant, datarid: Rid) -> DbResult<()> {
        self.before_first(dataval)?;
        let entry = self.leaf_mut().insert(datarid)?;
        self.close();
        let entry = match entry {
            Some(e) => e,
            None => return Ok(()),
        };
        debug!("leaf split produced entry for block {}", entry.block_number());

        let mut root = BTreeDir::new(
            Arc::clone(&self.tx),
            self.root_block.clone(),
            Arc::clone(&self.dir_layout),
        )?;
        let entry2 = root.insert(&entry)?;
        if let Some(e2) = entry2 {
            root.make_new_root(&e2)?;
        }
        root.close();
        Ok(())
    }

    fn delete(&mut self, dataval: &Constant, datarid: Rid) -> DbResult<()> {
        self.before_first(dataval)?;
        self.leaf_mut().delete(datarid)?;
        self.close();
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut leaf) = self.leaf.take() {
            leaf.close();
        }
    }
}
