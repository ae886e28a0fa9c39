use std::collections::HashMap;

use crate::error::{DbError, DbResult};

/// The two column types of the engine: 32-bit signed integers and strings
/// with a declared maximum length in characters.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldType {
    Integer,
    Varchar,
}

impl FieldType {
    pub fn to_i32(self) -> i32 {
        match self {
            FieldType::Integer => 0,
            FieldType::Varchar => 1,
        }
    }

    pub fn from_i32(v: i32) -> DbResult<FieldType> {
        match v {
            0 => Ok(FieldType::Integer),
            1 => Ok(FieldType::Varchar),
            other => Err(DbError::InvalidCommand(format!(
                "unknown field type {}",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct FieldInfo {
    field_type: FieldType,
    length: usize,
}

/// An ordered list of field names with their types. The record and index
/// layers derive byte layouts from it deterministically.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: Vec<String>,
    info: HashMap<String, FieldInfo>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field_name: &str, field_type: FieldType, length: usize) {
        self.fields.push(field_name.to_string());
        self.info
            .insert(field_name.to_string(), FieldInfo { field_type, length });
    }

    pub fn add_int_field(&mut self, field_name: &str) {
        self.add_field(field_name, FieldType::Integer, 0);
    }

    pub fn add_string_field(&mut self, field_name: &str, length: usize) {
        self.add_field(field_name, FieldType::Varchar, length);
    }

    /// Copy one field definition from another schema.
    pub fn add(&mut self, field_name: &str, other: &Schema) {
        self.add_field(field_name, other.field_type(field_name), other.length(field_name));
    }

    pub fn add_all(&mut self, other: &Schema) {
        for field_name in other.fields() {
            self.add(field_name, other);
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field_name: &str) -> bool {
        self.info.contains_key(field_name)
    }

    pub fn field_type(&self, field_name: &str) -> FieldType {
        self.info
            .get(field_name)
            .expect("field not in schema")
            .field_type
    }

    pub fn length(&self, field_name: &str) -> usize {
        self.info.get(field_name).expect("field not in schema").length
    }
}
