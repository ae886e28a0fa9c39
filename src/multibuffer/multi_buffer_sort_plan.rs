use std::{cmp::Ordering, sync::Arc};

use log::debug;

use crate::{
    error::DbResult,
    materialize::{MaterializePlan, RecordComparator, TempTable},
    multibuffer::{best_root, MultiBufferSortScan},
    plan::Plan,
    query::{Constant, Scan, UpdateScan},
    record::{FieldType, RecordPage, Schema, TableScan},
    tx::Transaction,
};

/// External sort that stages k record pages at once: fill all k, quicksort
/// the staged rows across the pages, emit them as one run, and finally merge
/// the runs k at a time. k is chosen by `best_root` so the merge fits in the
/// available buffers.
pub struct MultiBufferSortPlan {
    tx: Arc<Transaction>,
    p: Arc<dyn Plan>,
    schema: Schema,
    comp: RecordComparator,
}

impl MultiBufferSortPlan {
    pub fn new(tx: Arc<Transaction>, p: Arc<dyn Plan>, sort_fields: Vec<String>) -> Self {
        let schema = p.schema().clone();
        Self {
            tx,
            p,
            schema,
            comp: RecordComparator::new(sort_fields),
        }
    }

    fn split_into_runs(&self, src: &mut dyn Scan, k: i32) -> DbResult<Vec<TempTable>> {
        let mut temps = Vec::new();
        let mut current_temp = TempTable::new(Arc::clone(&self.tx), &self.schema);
        let mut current_scan = current_temp.open()?;
        temps.push(current_temp);

        // k staging pages, all appended to one throwaway table
        let staging = TempTable::new(Arc::clone(&self.tx), &self.schema);
        let staging_file = format!("{}.tbl", staging.table_name());
        let mut buffers = Vec::with_capacity(k as usize);
        for _ in 0..k {
            let block = self.tx.append(&staging_file)?;
            let rp = RecordPage::new(Arc::clone(&self.tx), block, staging.layout())?;
            rp.format()?;
            buffers.push(rp);
        }

        src.before_first()?;
        let mut current_buffer = 0usize;
        let mut total_slots = 0;
        let mut slot_counts = vec![0i32; k as usize];
        let mut slot = -1;
        while src.next()? {
            let mut next_slot = buffers[current_buffer].insert_after(slot)?;
            if next_slot < 0 {
                slot_counts[current_buffer] = slot + 1;

                if current_buffer < k as usize - 1 {
                    // move on to the next staging page
                    current_buffer += 1;
                    next_slot = buffers[current_buffer].insert_after(-1)?;
                } else {
                    // every page is full: sort the staged rows and write
                    // them out as one run
                    self.sort_in_memory(&buffers, &slot_counts, total_slots)?;
                    self.copy_buffers_to_run(&buffers, &mut current_scan)?;
                    for rp in &buffers {
                        rp.format()?;
                    }
                    current_buffer = 0;
                    total_slots = 0;
                    slot_counts = vec![0i32; k as usize];
                    next_slot = buffers[current_buffer].insert_after(-1)?;

                    current_scan.close();
                    let temp = TempTable::new(Arc::clone(&self.tx), &self.schema);
                    current_scan = temp.open()?;
                    temps.push(temp);
                }
            }

            let rp = &buffers[current_buffer];
            for field_name in self.schema.fields() {
                match src.get_val(field_name)? {
                    Constant::Int(v) => rp.set_int(next_slot, field_name, v)?,
                    Constant::Str(v) => rp.set_string(next_slot, field_name, &v)?,
                }
            }
            slot = next_slot;
            total_slots += 1;
        }

        slot_counts[current_buffer] = slot + 1;
        self.sort_in_memory(&buffers, &slot_counts, total_slots)?;
        self.copy_buffers_to_run(&buffers, &mut current_scan)?;
        current_scan.close();
        for rp in &buffers {
            self.tx.unpin(rp.block());
        }
        Ok(temps)
    }

    fn sort_in_memory(
        &self,
        buffers: &[RecordPage],
        slot_counts: &[i32],
        slots: i32,
    ) -> DbResult<()> {
        self.quick_sort(buffers, slot_counts, 0, slots - 1)
    }

    fn quick_sort(
        &self,
        buffers: &[RecordPage],
        slot_counts: &[i32],
        low: i32,
        high: i32,
    ) -> DbResult<()> {
        if low < high {
            let pivot = self.partition(buffers, slot_counts, low, high)?;
            self.quick_sort(buffers, slot_counts, low, pivot - 1)?;
            self.quick_sort(buffers, slot_counts, pivot + 1, high)?;
        }
        Ok(())
    }

    fn partition(
        &self,
        buffers: &[RecordPage],
        slot_counts: &[i32],
        low: i32,
        high: i32,
    ) -> DbResult<i32> {
        let pivot_slot = high;
        let mut i = low - 1;
        for j in low..high {
            if self.compare_across(buffers, slot_counts, j, pivot_slot)? == Ordering::Less {
                i += 1;
                self.swap_across(buffers, slot_counts, i, j)?;
            }
        }
        self.swap_across(buffers, slot_counts, i + 1, pivot_slot)?;
        Ok(i + 1)
    }

    /// Resolve a global slot index to its staging page and local slot.
    fn locate<'a>(
        buffers: &'a [RecordPage],
        slot_counts: &[i32],
        slot: i32,
    ) -> (&'a RecordPage, i32) {
        let mut total = 0;
        for (rp, count) in buffers.iter().zip(slot_counts) {
            if total + count > slot {
                return (rp, slot - total);
            }
            total += count;
        }
        panic!("slot {} is not staged", slot)
    }

    fn compare_across(
        &self,
        buffers: &[RecordPage],
        slot_counts: &[i32],
        slot1: i32,
        slot2: i32,
    ) -> DbResult<Ordering> {
        let (rp1, local1) = Self::locate(buffers, slot_counts, slot1);
        let (rp2, local2) = Self::locate(buffers, slot_counts, slot2);
        for field_name in self.comp.fields() {
            let ord = match self.schema.field_type(field_name) {
                FieldType::Integer => rp1
                    .get_int(local1, field_name)?
                    .cmp(&rp2.get_int(local2, field_name)?),
                FieldType::Varchar => rp1
                    .get_string(local1, field_name)?
                    .cmp(&rp2.get_string(local2, field_name)?),
            };
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }

    fn swap_across(
        &self,
        buffers: &[RecordPage],
        slot_counts: &[i32],
        slot1: i32,
        slot2: i32,
    ) -> DbResult<()> {
        let (rp1, local1) = Self::locate(buffers, slot_counts, slot1);
        let (rp2, local2) = Self::locate(buffers, slot_counts, slot2);
        for field_name in self.schema.fields() {
            match self.schema.field_type(field_name) {
                FieldType::Integer => {
                    let v1 = rp1.get_int(local1, field_name)?;
                    let v2 = rp2.get_int(local2, field_name)?;
                    rp1.set_int(local1, field_name, v2)?;
                    rp2.set_int(local2, field_name, v1)?;
                }
                FieldType::Varchar => {
                    let v1 = rp1.get_string(local1, field_name)?;
                    let v2 = rp2.get_string(local2, field_name)?;
                    rp1.set_string(local1, field_name, &v2)?;
                    rp2.set_string(local2, field_name, &v1)?;
                }
            }
        }
        Ok(())
    }

    fn copy_buffers_to_run(&self, buffers: &[RecordPage], dest: &mut TableScan) -> DbResult<()> {
        for rp in buffers {
            let mut slot = rp.next_after(-1)?;
            while slot >= 0 {
                dest.insert()?;
                for field_name in self.schema.fields() {
                    match self.schema.field_type(field_name) {
                        FieldType::Integer => {
                            dest.set_int(field_name, rp.get_int(slot, field_name)?)?
                        }
                        FieldType::Varchar => {
                            dest.set_string(field_name, &rp.get_string(slot, field_name)?)?
                        }
                    }
                }
                slot = rp.next_after(slot)?;
            }
        }
        Ok(())
    }

    fn merge_several_runs(&self, runs: Vec<TempTable>) -> DbResult<TempTable> {
        let mut srcs = Vec::with_capacity(runs.len());
        let mut has_mores = Vec::with_capacity(runs.len());
        for run in &runs {
            let mut src = run.open()?;
            has_mores.push(src.next()?);
            srcs.push(src);
        }

        let result = TempTable::new(Arc::clone(&self.tx), &self.schema);
        let mut dest = result.open()?;
        loop {
            let mut min: Option<usize> = None;
            for i in 0..srcs.len() {
                if !has_mores[i] {
                    continue;
                }
                match min {
                    None => min = Some(i),
                    Some(m) => {
                        let (left, right) = srcs.split_at_mut(i);
                        if self.comp.compare(&mut left[m], &mut right[0])? == Ordering::Greater {
                            min = Some(i);
                        }
                    }
                }
            }
            let min = match min {
                Some(m) => m,
                None => break,
            };

            dest.insert()?;
            for field_name in self.schema.fields() {
                let val = srcs[min].get_val(field_name)?;
                dest.set_val(field_name, &val)?;
            }
            has_mores[min] = srcs[min].next()?;
        }

        for src in &mut srcs {
            src.close();
        }
        dest.close();
        Ok(result)
    }
}

impl Plan for MultiBufferSortPlan {
    fn open(&self) -> DbResult<Box<dyn Scan>> {
        let size = self.p.blocks_accessed();
        let available = self.tx.available_buffs() as i32;
        let k = best_root(available, size);
        debug!("multibuffer sort of {} blocks with {} buffers", size, k);

        let mut src = self.p.open()?;
        let mut runs = self.split_into_runs(src.as_mut(), k)?;
        src.close();

        // merging one run at a time would never converge
        let fanin = k.max(2) as usize;
        while runs.len() > fanin {
            let mut merged = Vec::new();
            while runs.len() > 1 {
                let take = fanin.min(runs.len());
                let chunk: Vec<TempTable> = runs.drain(..take).collect();
                merged.push(self.merge_several_runs(chunk)?);
            }
            merged.extend(runs.drain(..));
            runs = merged;
        }
        Ok(Box::new(MultiBufferSortScan::new(&runs, self.comp.clone())?))
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
