use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use log::debug;

use crate::{
    error::DbResult,
    metadata::TableManager,
    query::{Scan, UpdateScan},
    record::{Layout, TableScan},
    tx::Transaction,
};

/// Size statistics for one table, used by the planner's cost estimates.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatInfo {
    num_blocks: i32,
    num_records: i32,
}

impl StatInfo {
    pub fn new(num_blocks: i32, num_records: i32) -> Self {
        Self {
            num_blocks,
            num_records,
        }
    }

    pub fn blocks_accessed(&self) -> i32 {
        self.num_blocks
    }

    pub fn records_output(&self) -> i32 {
        self.num_records
    }

    /// A crude guess; the engine does not keep per-field histograms.
    pub fn distinct_values(&self, _field_name: &str) -> i32 {
        1 + self.num_records / 3
    }
}

struct StatCache {
    table_stats: HashMap<String, StatInfo>,
    num_calls: i32,
}

/// Computes table statistics by scanning, caches them, and refreshes the
/// whole cache every hundred lookups. Estimates may therefore be stale, but
/// they are cheap.
pub struct StatManager {
    tm: Arc<TableManager>,
    cache: Mutex<StatCache>,
}

impl StatManager {
    pub fn new(tm: Arc<TableManager>, tx: &Arc<Transaction>) -> DbResult<Self> {
        let sm = Self {
            tm,
            cache: Mutex::new(StatCache {
                table_stats: HashMap::new(),
                num_calls: 0,
            }),
        };
        sm.refresh_statistics(tx)?;
        Ok(sm)
    }

    pub fn get_stat_info(
        &self,
        table_name: &str,
        layout: &Arc<Layout>,
        tx: &Arc<Transaction>,
    ) -> DbResult<StatInfo> {
        let needs_refresh = {
            let mut cache = self.cache.lock().unwrap();
            cache.num_calls += 1;
            cache.num_calls > 100
        };
        if needs_refresh {
            self.refresh_statistics(tx)?;
        }

        if let Some(si) = self.cache.lock().unwrap().table_stats.get(table_name) {
            return Ok(*si);
        }

        let si = self.calc_table_stats(table_name, layout, tx)?;
        self.cache
            .lock()
            .unwrap()
            .table_stats
            .insert(table_name.to_string(), si);
        Ok(si)
    }

    fn refresh_statistics(&self, tx: &Arc<Transaction>) -> DbResult<()> {
        debug!("refreshing table statistics");
        let mut stats = HashMap::new();

        let tcat_layout = self.tm.get_layout("tblcat", tx)?;
        let mut tcat = TableScan::new(Arc::clone(tx), "tblcat", tcat_layout)?;
        while tcat.next()? {
            let table_name = tcat.get_string("tblname")?;
            let layout = self.tm.get_layout(&table_name, tx)?;
            let si = self.calc_table_stats(&table_name, &layout, tx)?;
            stats.insert(table_name, si);
        }
        tcat.close();

        let mut cache = self.cache.lock().unwrap();
        cache.table_stats = stats;
        cache.num_calls = 0;
        Ok(())
    }

    fn calc_table_stats(
        &self,
        table_name: &str,
        layout: &Arc<Layout>,
        tx: &Arc<Transaction>,
    ) -> DbResult<StatInfo> {
        let mut num_records = 0;
        let mut num_blocks = 0;
        let mut ts = TableScan::new(Arc::clone(tx), table_name, Arc::clone(layout))?;
        while ts.next()? {
            num_records += 1;
            num_blocks = ts.get_rid()?.block_number() + 1;
        }
        ts.close();
        Ok(StatInfo::new(num_blocks, num_records))
    }
}
