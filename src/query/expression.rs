use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::DbResult,
    query::{Constant, Scan},
    record::Schema,
};

/// Either a constant or a field reference; the operand of a term.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Expression {
    Constant(Constant),
    Field(String),
}

impl Expression {
    pub fn evaluate(&self, scan: &mut dyn Scan) -> DbResult<Constant> {
        match self {
            Expression::Constant(val) => Ok(val.clone()),
            Expression::Field(field_name) => scan.get_val(field_name),
        }
    }

    pub fn is_field_name(&self) -> bool {
        matches!(self, Expression::Field(_))
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Constant(val) => Some(val),
            Expression::Field(_) => None,
        }
    }

    pub fn as_field_name(&self) -> Option<&str> {
        match self {
            Expression::Field(field_name) => Some(field_name),
            Expression::Constant(_) => None,
        }
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        match self {
            Expression::Constant(_) => true,
            Expression::Field(field_name) => schema.has_field(field_name),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Constant(val) => write!(f, "{}", val),
            Expression::Field(field_name) => write!(f, "{}", field_name),
        }
    }
}
