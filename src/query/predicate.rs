use core::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::DbResult,
    plan::Plan,
    query::{Constant, Scan, Term},
};

/// A conjunction of terms. The empty predicate is always satisfied.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_term(term: Term) -> Self {
        Self { terms: vec![term] }
    }

    pub fn conjoin_with(&mut self, other: Predicate) {
        self.terms.extend(other.terms);
    }

    pub fn is_satisfied(&self, scan: &mut dyn Scan) -> DbResult<bool> {
        for term in &self.terms {
            if !term.is_satisfied(scan)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn reduction_factor(&self, plan: &dyn Plan) -> i32 {
        let mut factor: i32 = 1;
        for term in &self.terms {
            factor = factor.saturating_mul(term.reduction_factor(plan));
        }
        factor
    }

    pub fn equates_with_constant(&self, field_name: &str) -> Option<&Constant> {
        self.terms
            .iter()
            .find_map(|term| term.equates_with_constant(field_name))
    }

    pub fn equates_with_field(&self, field_name: &str) -> Option<&str> {
        self.terms
            .iter()
            .find_map(|term| term.equates_with_field(field_name))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.terms.iter().join(" and "))
    }
}
