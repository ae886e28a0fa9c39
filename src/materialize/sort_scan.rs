use std::cmp::Ordering;

use crate::{
    error::DbResult,
    materialize::{RecordComparator, TempTable},
    query::{Constant, Scan, UpdateScan},
    record::{Rid, TableScan},
};

#[derive(Clone, Copy, PartialEq)]
enum Current {
    Neither,
    S1,
    S2,
}

struct SavedPosition {
    rid1: Rid,
    rid2: Option<Rid>,
    current: Current,
}

/// Merges the final (at most two) runs of a sort. The position over both
/// runs can be saved and restored, which the merge join uses to replay
/// duplicate groups on its right side.
pub struct SortScan {
    s1: TableScan,
    s2: Option<TableScan>,
    current: Current,
    comp: RecordComparator,
    has_more1: bool,
    has_more2: bool,
    saved: Option<SavedPosition>,
}

impl SortScan {
    pub fn new(runs: &[TempTable], comp: RecordComparator) -> DbResult<Self> {
        let mut s1 = runs[0].open()?;
        let has_more1 = s1.next()?;

        let mut s2 = None;
        let mut has_more2 = false;
        if runs.len() > 1 {
            let mut scan = runs[1].open()?;
            has_more2 = scan.next()?;
            s2 = Some(scan);
        }

        Ok(Self {
            s1,
            s2,
            current: Current::Neither,
            comp,
            has_more1,
            has_more2,
            saved: None,
        })
    }

    pub fn save_position(&mut self) -> DbResult<()> {
        let rid1 = self.s1.get_rid()?;
        let rid2 = match self.s2.as_mut() {
            Some(s2) => Some(s2.get_rid()?),
            None => None,
        };
        self.saved = Some(SavedPosition {
            rid1,
            rid2,
            current: self.current,
        });
        Ok(())
    }

    pub fn restore_position(&mut self) -> DbResult<()> {
        let saved = self.saved.take().expect("no saved position");
        self.s1.move_to_rid(saved.rid1)?;
        if let (Some(s2), Some(rid2)) = (self.s2.as_mut(), saved.rid2) {
            s2.move_to_rid(rid2)?;
        }
        self.current = saved.current;
        self.has_more1 = true;
        self.has_more2 = saved.rid2.is_some();
        self.saved = Some(saved);
        Ok(())
    }

    fn current_scan(&mut self) -> &mut TableScan {
        match self.current {
            Current::S1 => &mut self.s1,
            Current::S2 => self.s2.as_mut().expect("no second run"),
            Current::Neither => panic!("scan is not positioned"),
        }
    }
}

impl Scan for SortScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.current = Current::Neither;
        self.s1.before_first()?;
        self.has_more1 = self.s1.next()?;
        if let Some(s2) = self.s2.as_mut() {
            s2.before_first()?;
            self.has_more2 = s2.next()?;
        }
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        match self.current {
            Current::S1 => self.has_more1 = self.s1.next()?,
            Current::S2 => {
                if let Some(s2) = self.s2.as_mut() {
                    self.has_more2 = s2.next()?;
                }
            }
            Current::Neither => {}
        }

        if !self.has_more1 && !self.has_more2 {
            return Ok(false);
        }
        if self.has_more1 && self.has_more2 {
            let s2 = self.s2.as_mut().expect("no second run");
            if self.comp.compare(&mut self.s1, s2)? == Ordering::Less {
                self.current = Current::S1;
            } else {
                self.current = Current::S2;
            }
        } else if self.has_more1 {
            self.current = Current::S1;
        } else {
            self.current = Current::S2;
        }
        Ok(true)
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        self.current_scan().get_int(field_name)
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        self.current_scan().get_string(field_name)
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        self.current_scan().get_val(field_name)
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.s1.has_field(field_name)
    }

    fn close(&mut self) {
        self.s1.close();
        if let Some(s2) = self.s2.as_mut() {
            s2.close();
        }
    }
}
