use std::cmp::Ordering;

use crate::{
    error::DbResult,
    materialize::{RecordComparator, TempTable},
    query::{Constant, Scan, UpdateScan},
    record::{Rid, TableScan},
};

/// Merges up to k final runs of a multibuffer sort by always yielding the
/// smallest current row.
pub struct MultiBufferSortScan {
    srcs: Vec<TableScan>,
    current: Option<usize>,
    comp: RecordComparator,
    has_mores: Vec<bool>,
    saved_position: Vec<Rid>,
    saved_current: Option<usize>,
}

impl MultiBufferSortScan {
    pub fn new(runs: &[TempTable], comp: RecordComparator) -> DbResult<Self> {
        let mut srcs = Vec::with_capacity(runs.len());
        let mut has_mores = Vec::with_capacity(runs.len());
        for run in runs {
            let mut src = run.open()?;
            has_mores.push(src.next()?);
            srcs.push(src);
        }
        Ok(Self {
            srcs,
            current: None,
            comp,
            has_mores,
            saved_position: Vec::new(),
            saved_current: None,
        })
    }

    pub fn save_position(&mut self) -> DbResult<()> {
        let mut rids = Vec::with_capacity(self.srcs.len());
        for src in &mut self.srcs {
            rids.push(src.get_rid()?);
        }
        self.saved_position = rids;
        self.saved_current = self.current;
        Ok(())
    }

    pub fn restore_position(&mut self) -> DbResult<()> {
        for (src, rid) in self.srcs.iter_mut().zip(&self.saved_position) {
            src.move_to_rid(*rid)?;
        }
        self.current = self.saved_current;
        Ok(())
    }
}

impl Scan for MultiBufferSortScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.current = None;
        for (i, src) in self.srcs.iter_mut().enumerate() {
            src.before_first()?;
            self.has_mores[i] = src.next()?;
        }
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        if let Some(current) = self.current {
            self.has_mores[current] = self.srcs[current].next()?;
        }

        // pick the run whose current row sorts first
        let mut min: Option<usize> = None;
        for i in 0..self.srcs.len() {
            if !self.has_mores[i] {
                continue;
            }
            match min {
                None => min = Some(i),
                Some(m) => {
                    let (left, right) = self.srcs.split_at_mut(i);
                    if self.comp.compare(&mut left[m], &mut right[0])? == Ordering::Greater {
                        min = Some(i);
                    }
                }
            }
        }
        self.current = min;
        Ok(min.is_some())
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        let current = self.current.expect("scan is not positioned");
        self.srcs[current].get_int(field_name)
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        let current = self.current.expect("scan is not positioned");
        self.srcs[current].get_string(field_name)
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        let current = self.current.expect("scan is not positioned");
        self.srcs[current].get_val(field_name)
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.srcs[0].has_field(field_name)
    }

    fn close(&mut self) {
        for src in &mut self.srcs {
            src.close();
        }
    }
}
