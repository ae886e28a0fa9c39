use crate::{
    error::DbResult,
    query::{Constant, Scan},
};

/// Folds the rows of one group into a single value. `process_first` sees the
/// group's first row, `process_next` every following one.
pub trait AggregationFn {
    fn process_first(&mut self, scan: &mut dyn Scan) -> DbResult<()>;
    fn process_next(&mut self, scan: &mut dyn Scan) -> DbResult<()>;
    fn field_name(&self) -> String;
    fn value(&self) -> Constant;
    fn clone_box(&self) -> Box<dyn AggregationFn>;
}

/// Counts the rows of the group.
#[derive(Clone)]
pub struct CountFn {
    field_name: String,
    count: i32,
}

impl CountFn {
    pub fn new(field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            count: 0,
        }
    }
}

impl AggregationFn for CountFn {
    fn process_first(&mut self, _scan: &mut dyn Scan) -> DbResult<()> {
        self.count = 1;
        Ok(())
    }

    fn process_next(&mut self, _scan: &mut dyn Scan) -> DbResult<()> {
        self.count += 1;
        Ok(())
    }

    fn field_name(&self) -> String {
        format!("countof{}", self.field_name)
    }

    fn value(&self) -> Constant {
        Constant::Int(self.count)
    }

    fn clone_box(&self) -> Box<dyn AggregationFn> {
        Box::new(self.clone())
    }
}

/// Tracks the greatest value of one field across the group.
#[derive(Clone)]
pub struct MaxFn {
    field_name: String,
    val: Option<Constant>,
}

impl MaxFn {
    pub fn new(field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            val: None,
        }
    }
}

impl AggregationFn for MaxFn {
    fn process_first(&mut self, scan: &mut dyn Scan) -> DbResult<()> {
        self.val = Some(scan.get_val(&self.field_name)?);
        Ok(())
    }

    fn process_next(&mut self, scan: &mut dyn Scan) -> DbResult<()> {
        let new_val = scan.get_val(&self.field_name)?;
        if let Some(val) = &self.val {
            if new_val > *val {
                self.val = Some(new_val);
            }
        }
        Ok(())
    }

    fn field_name(&self) -> String {
        format!("maxof{}", self.field_name)
    }

    fn value(&self) -> Constant {
        self.val.clone().expect("aggregation saw no rows")
    }

    fn clone_box(&self) -> Box<dyn AggregationFn> {
        Box::new(self.clone())
    }
}
