use core::fmt;
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

/// The atomic data element of queries: a tagged integer-or-string value.
///
/// Ordering compares values of the same type; values of different types
/// never meet in a well-typed plan.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Constant {
    Int(i32),
    Str(String),
}

impl Constant {
    pub fn as_int(&self) -> i32 {
        match self {
            Constant::Int(v) => *v,
            Constant::Str(_) => panic!("constant is not an int"),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Constant::Str(v) => v,
            Constant::Int(_) => panic!("constant is not a string"),
        }
    }

    /// A hash that is stable across processes, so hash buckets computed from
    /// it can live in files.
    pub fn hash_code(&self) -> u32 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish() as u32
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Str(v) => write!(f, "'{}'", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Constant::Int(1) < Constant::Int(2));
        assert!(Constant::Str("a".to_string()) < Constant::Str("b".to_string()));
        assert_eq!(Constant::Int(7), Constant::Int(7));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = Constant::Str("rec10".to_string());
        let b = Constant::Str("rec10".to_string());
        assert_eq!(a.hash_code(), b.hash_code());
    }
}
