use std::collections::HashMap;

use crate::{
    error::{DbError, DbResult},
    materialize::AggregationFn,
    query::{Constant, Scan},
};

/// The values of the grouping fields for one group.
#[derive(Clone, PartialEq)]
struct GroupValue {
    vals: HashMap<String, Constant>,
}

impl GroupValue {
    fn new(scan: &mut dyn Scan, fields: &[String]) -> DbResult<Self> {
        let mut vals = HashMap::new();
        for field in fields {
            vals.insert(field.clone(), scan.get_val(field)?);
        }
        Ok(Self { vals })
    }

    fn get_val(&self, field_name: &str) -> Constant {
        self.vals[field_name].clone()
    }
}

/// Folds consecutive equal-key rows of a sorted scan through the
/// aggregation functions. Each `next` consumes one whole group.
pub struct GroupByScan {
    scan: Box<dyn Scan>,
    group_fields: Vec<String>,
    agg_fns: Vec<Box<dyn AggregationFn>>,
    group_val: Option<GroupValue>,
    more_groups: bool,
}

impl GroupByScan {
    pub fn new(
        scan: Box<dyn Scan>,
        group_fields: Vec<String>,
        agg_fns: Vec<Box<dyn AggregationFn>>,
    ) -> DbResult<Self> {
        let mut gs = Self {
            scan,
            group_fields,
            agg_fns,
            group_val: None,
            more_groups: false,
        };
        gs.before_first()?;
        Ok(gs)
    }
}

impl Scan for GroupByScan {
    fn before_first(&mut self) -> DbResult<()> {
        self.scan.before_first()?;
        self.more_groups = self.scan.next()?;
        Ok(())
    }

    fn next(&mut self) -> DbResult<bool> {
        if !self.more_groups {
            return Ok(false);
        }
        for agg_fn in &mut self.agg_fns {
            agg_fn.process_first(self.scan.as_mut())?;
        }
        let group_val = GroupValue::new(self.scan.as_mut(), &self.group_fields)?;
        loop {
            self.more_groups = self.scan.next()?;
            if !self.more_groups {
                break;
            }
            let gv = GroupValue::new(self.scan.as_mut(), &self.group_fields)?;
            if gv != group_val {
                break;
            }
            for agg_fn in &mut self.agg_fns {
                agg_fn.process_next(self.scan.as_mut())?;
            }
        }
        self.group_val = Some(group_val);
        Ok(true)
    }

    fn get_int(&mut self, field_name: &str) -> DbResult<i32> {
        Ok(self.get_val(field_name)?.as_int())
    }

    fn get_string(&mut self, field_name: &str) -> DbResult<String> {
        Ok(self.get_val(field_name)?.as_str().to_string())
    }

    fn get_val(&mut self, field_name: &str) -> DbResult<Constant> {
        if self.group_fields.iter().any(|f| f == field_name) {
            let group_val = self.group_val.as_ref().expect("scan is not positioned");
            return Ok(group_val.get_val(field_name));
        }
        for agg_fn in &self.agg_fns {
            if agg_fn.field_name() == field_name {
                return Ok(agg_fn.value());
            }
        }
        Err(DbError::FieldNotFound(field_name.to_string()))
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.group_fields.iter().any(|f| f == field_name)
            || self.agg_fns.iter().any(|f| f.field_name() == field_name)
    }

    fn close(&mut self) {
        self.scan.close();
    }
}
