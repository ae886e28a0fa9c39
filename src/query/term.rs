use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::DbResult,
    plan::Plan,
    query::{Constant, Expression, Scan},
    record::Schema,
};

/// An equality comparison between two expressions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Term {
    lhs: Expression,
    rhs: Expression,
}

impl Term {
    pub fn new(lhs: Expression, rhs: Expression) -> Self {
        Self { lhs, rhs }
    }

    pub fn is_satisfied(&self, scan: &mut dyn Scan) -> DbResult<bool> {
        let lhs_val = self.lhs.evaluate(scan)?;
        let rhs_val = self.rhs.evaluate(scan)?;
        Ok(lhs_val == rhs_val)
    }

    /// How much this term is expected to shrink the plan's output, measured
    /// in distinct values of the fields involved.
    pub fn reduction_factor(&self, plan: &dyn Plan) -> i32 {
        match (self.lhs.as_field_name(), self.rhs.as_field_name()) {
            (Some(lhs_name), Some(rhs_name)) => plan
                .distinct_values(lhs_name)
                .max(plan.distinct_values(rhs_name)),
            (Some(lhs_name), None) => plan.distinct_values(lhs_name),
            (None, Some(rhs_name)) => plan.distinct_values(rhs_name),
            (None, None) => {
                if self.lhs.as_constant() == self.rhs.as_constant() {
                    1
                } else {
                    i32::MAX
                }
            }
        }
    }

    /// If this term equates the field with a constant, return the constant.
    pub fn equates_with_constant(&self, field_name: &str) -> Option<&Constant> {
        if self.lhs.as_field_name() == Some(field_name) && !self.rhs.is_field_name() {
            self.rhs.as_constant()
        } else if self.rhs.as_field_name() == Some(field_name) && !self.lhs.is_field_name() {
            self.lhs.as_constant()
        } else {
            None
        }
    }

    /// If this term equates the field with another field, return its name.
    pub fn equates_with_field(&self, field_name: &str) -> Option<&str> {
        if self.lhs.as_field_name() == Some(field_name) && self.rhs.is_field_name() {
            self.rhs.as_field_name()
        } else if self.rhs.as_field_name() == Some(field_name) && self.lhs.is_field_name() {
            self.lhs.as_field_name()
        } else {
            None
        }
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        self.lhs.applies_to(schema) && self.rhs.applies_to(schema)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}
