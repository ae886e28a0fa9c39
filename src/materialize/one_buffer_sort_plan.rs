use std::{cmp::Ordering, sync::Arc};

use super::sort_plan::merge_iteration;
use crate::{
    error::DbResult,
    materialize::{MaterializePlan, RecordComparator, SortScan, TempTable},
    plan::Plan,
    query::{Constant, Scan, UpdateScan},
    record::{FieldType, RecordPage, Schema, TableScan},
    tx::Transaction,
};

/// A sort that produces its initial runs by loading one record page at a
/// time and quicksorting it in place, so every run is a full sorted block.
/// Worth it when the input arrives in no useful order; ideal when the whole
/// input fits in one block.
pub struct OneBufferSortPlan {
    tx: Arc<Transaction>,
    p: Arc<dyn Plan>,
    schema: Schema,
    comp: RecordComparator,
}

impl OneBufferSortPlan {
    pub fn new(tx: Arc<Transaction>, p: Arc<dyn Plan>, sort_fields: Vec<String>) -> Self {
        let schema = p.schema().clone();
        Self {
            tx,
            p,
            schema,
            comp: RecordComparator::new(sort_fields),
        }
    }

    fn split_into_runs(&self, src: &mut dyn Scan) -> DbResult<Vec<TempTable>> {
        let mut temps = Vec::new();
        let mut current_temp = TempTable::new(Arc::clone(&self.tx), &self.schema);
        let mut current_scan = current_temp.open()?;
        temps.push(current_temp);

        // the staging page lives in its own throwaway table
        let staging = TempTable::new(Arc::clone(&self.tx), &self.schema);
        let block = self.tx.append(&format!("{}.tbl", staging.table_name()))?;
        let rp = RecordPage::new(Arc::clone(&self.tx), block.clone(), staging.layout())?;
        rp.format()?;

        src.before_first()?;
        let mut slot = -1;
        while src.next()? {
            let mut next_slot = rp.insert_after(slot)?;
            if next_slot < 0 {
                // page full: sort it, flush it as a run, start over
                self.sort_in_memory(&rp, slot + 1)?;
                self.copy_page_to_run(&rp, &mut current_scan)?;
                rp.format()?;
                next_slot = rp.insert_after(-1)?;

                current_scan.close();
                let temp = TempTable::new(Arc::clone(&self.tx), &self.schema);
                current_scan = temp.open()?;
                temps.push(temp);
            }

            for field_name in self.schema.fields() {
                match src.get_val(field_name)? {
                    Constant::Int(v) => rp.set_int(next_slot, field_name, v)?,
                    Constant::Str(v) => rp.set_string(next_slot, field_name, &v)?,
                }
            }
            slot = next_slot;
        }

        self.sort_in_memory(&rp, slot + 1)?;
        self.copy_page_to_run(&rp, &mut current_scan)?;
        current_scan.close();
        self.tx.unpin(&block);
        Ok(temps)
    }

    fn sort_in_memory(&self, rp: &RecordPage, slots: i32) -> DbResult<()> {
        self.quick_sort(rp, 0, slots - 1)
    }

    fn quick_sort(&self, rp: &RecordPage, low: i32, high: i32) -> DbResult<()> {
        if low < high {
            let pivot = self.partition(rp, low, high)?;
            self.quick_sort(rp, low, pivot - 1)?;
            self.quick_sort(rp, pivot + 1, high)?;
        }
        Ok(())
    }

    fn partition(&self, rp: &RecordPage, low: i32, high: i32) -> DbResult<i32> {
        let pivot_slot = high;
        let mut i = low - 1;
        for j in low..high {
            if rp.compare(j, pivot_slot, self.comp.fields())? == Ordering::Less {
                i += 1;
                rp.swap(i, j)?;
            }
        }
        rp.swap(i + 1, pivot_slot)?;
        Ok(i + 1)
    }

    fn copy_page_to_run(&self, rp: &RecordPage, dest: &mut TableScan) -> DbResult<()> {
        let mut slot = rp.next_after(-1)?;
        while slot >= 0 {
            dest.insert()?;
            for field_name in self.schema.fields() {
                match self.schema.field_type(field_name) {
                    FieldType::Integer => dest.set_int(field_name, rp.get_int(slot, field_name)?)?,
                    FieldType::Varchar => {
                        dest.set_string(field_name, &rp.get_string(slot, field_name)?)?
                    }
                }
            }
            slot = rp.next_after(slot)?;
        }
        Ok(())
    }
}

impl Plan for OneBufferSortPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let mut src = self.p.open()?;
        let mut runs = self.split_into_runs(src.as_mut())?;
        src.close();

        while runs.len() > 2 {
            runs = merge_iteration(&self.tx, &self.schema, &self.comp, runs)?;
        }
        Ok(Box::new(SortScan::new(&runs, self.comp.clone())?))
    }

    fn blocks_accessed(&self) -> i32 {
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
