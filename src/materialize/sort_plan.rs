use std::{cmp::Ordering, sync::Arc};

use log::debug;

use crate::{
    error::DbResult,
    materialize::{MaterializePlan, RecordComparator, SortScan, TempTable},
    plan::Plan,
    query::{Scan, UpdateScan},
    record::{Schema, TableScan},
    tx::Transaction,
};

/// Copy the source's current row into the destination and advance the
/// source.
pub(crate) fn copy_row(schema: &Schema, src: &mut dyn Scan, dest: &mut TableScan) -> DbResult<bool> {
    dest.insert()?;
    for field_name in schema.fields() {
        let val = src.get_val(field_name)?;
        dest.set_val(field_name, &val)?;
    }
    src.next()
}

pub(crate) fn merge_two_runs(
    tx: &Arc<Transaction>,
    schema: &Schema,
    comp: &RecordComparator,
    p1: &TempTable,
    p2: &TempTable,
) -> DbResult<TempTable> {
    let mut src1 = p1.open()?;
    let mut src2 = p2.open()?;

    let result = TempTable::new(Arc::clone(tx), schema);
    let mut dest = result.open()?;

    let mut has_more1 = src1.next()?;
    let mut has_more2 = src2.next()?;
    while has_more1 && has_more2 {
        if comp.compare(&mut src1, &mut src2)? == Ordering::Less {
            has_more1 = copy_row(schema, &mut src1, &mut dest)?;
        } else {
            has_more2 = copy_row(schema, &mut src2, &mut dest)?;
        }
    }
    while has_more1 {
        has_more1 = copy_row(schema, &mut src1, &mut dest)?;
    }
    while has_more2 {
        has_more2 = copy_row(schema, &mut src2, &mut dest)?;
    }

    src1.close();
    src2.close();
    dest.close();
    Ok(result)
}

/// One round of pairwise merging, halving the number of runs.
pub(crate) fn merge_iteration(
    tx: &Arc<Transaction>,
    schema: &Schema,
    comp: &RecordComparator,
    mut runs: Vec<TempTable>,
) -> DbResult<Vec<TempTable>> {
    let mut result = Vec::new();
    while runs.len() > 1 {
        let p1 = runs.remove(0);
        let p2 = runs.remove(0);
        result.push(merge_two_runs(tx, schema, comp, &p1, &p2)?);
    }
    if let Some(last) = runs.pop() {
        result.push(last);
    }
    Ok(result)
}

/// External merge sort. The input is split into runs at every point where it
/// dips below the previously written row, then runs are merged pairwise
/// until at most two remain; the scan merges those lazily.
pub struct SortPlan {
    tx: Arc<Transaction>,
    p: Arc<dyn Plan>,
    schema: Schema,
    comp: RecordComparator,
}

impl SortPlan {
    pub fn new(tx: Arc<Transaction>, p: Arc<dyn Plan>, sort_fields: Vec<String>) -> Self {
        let schema = p.schema().clone();
        Self {
            tx,
            p,
            schema,
            comp: RecordComparator::new(sort_fields),
        }
    }

    /// The concrete sort scan, for callers that need position save/restore.
    pub fn open_sort_scan(&self) -> DbResult<SortScan> {
        let mut src = self.p.open()?;
        let mut runs = self.split_into_runs(src.as_mut())?;
        src.close();
        debug!("sort produced {} initial runs", runs.len());

        if runs.is_empty() {
            // sorting nothing still needs a run to scan
            runs.push(TempTable::new(Arc::clone(&self.tx), &self.schema));
        }
        while runs.len() > 2 {
            runs = merge_iteration(&self.tx, &self.schema, &self.comp, runs)?;
        }
        SortScan::new(&runs, self.comp.clone())
    }

    fn split_into_runs(&self, src: &mut dyn Scan) -> DbResult<Vec<TempTable>> {
        let mut temps = Vec::new();
        src.before_first()?;
        if !src.next()? {
            return Ok(temps);
        }

        let mut current_temp = TempTable::new(Arc::clone(&self.tx), &self.schema);
        let mut current_scan = current_temp.open()?;
        temps.push(current_temp);
        loop {
            let more = copy_row(&self.schema, src, &mut current_scan)?;
            if !more {
                break;
            }
            if self.comp.compare(src, &mut current_scan)? == Ordering::Less {
                // the next row sorts before the one just written, so a new
                // run starts here
                current_scan.close();
                let temp = TempTable::new(Arc::clone(&self.tx), &self.schema);
                current_scan = temp.open()?;
                temps.push(temp);
            }
        }
        current_scan.close();
        Ok(temps)
    }
}

impl Plan for SortPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        Ok(Box::new(self.open_sort_scan()?))
    }

    fn blocks_accessed(&self) -> i32 {
        // the cost of scanning the sorted result; the sort itself is a
        // one-time preprocessing step
        let mp = MaterializePlan::new(Arc::clone(&self.tx), Arc::clone(&self.p));
        mp.blocks_accessed()
    }

    fn records_output(&self) -> i32 {
        self.p.records_output()
    }

    fn distinct_values(&self, field_name: &str) -> i32 {
        self.p.distinct_values(field_name)
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
