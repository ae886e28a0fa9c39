use core::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    query::{Constant, Expression, Predicate},
    record::Schema,
};

/// A validated query: the field list, the tables to join, and the selection
/// predicate. This is what an external parser hands the kernel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryData {
    pub fields: Vec<String>,
    pub tables: Vec<String>,
    pub pred: Predicate,
}

impl QueryData {
    pub fn new(fields: Vec<String>, tables: Vec<String>, pred: Predicate) -> Self {
        Self {
            fields,
            tables,
            pred,
        }
    }
}

impl fmt::Display for QueryData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "select {} from {}",
            self.fields.iter().join(", "),
            self.tables.iter().join(", ")
        )?;
        if !self.pred.is_empty() {
            write!(f, " where {}", self.pred)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct InsertData {
    pub table_name: String,
    pub fields: Vec<String>,
    pub values: Vec<Constant>,
}

impl InsertData {
    pub fn new(table_name: &str, fields: Vec<String>, values: Vec<Constant>) -> Self {
        Self {
            table_name: table_name.to_string(),
            fields,
            values,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DeleteData {
    pub table_name: String,
    pub pred: Predicate,
}

impl DeleteData {
    pub fn new(table_name: &str, pred: Predicate) -> Self {
        Self {
            table_name: table_name.to_string(),
            pred,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModifyData {
    pub table_name: String,
    pub field_name: String,
    pub new_value: Expression,
    pub pred: Predicate,
}

impl ModifyData {
    pub fn new(table_name: &str, field_name: &str, new_value: Expression, pred: Predicate) -> Self {
        Self {
            table_name: table_name.to_string(),
            field_name: field_name.to_string(),
            new_value,
            pred,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CreateTableData {
    pub table_name: String,
    pub schema: Schema,
}

impl CreateTableData {
    pub fn new(table_name: &str, schema: Schema) -> Self {
        Self {
            table_name: table_name.to_string(),
            schema,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CreateViewData {
    pub view_name: String,
    pub view_def: QueryData,
}

impl CreateViewData {
    pub fn new(view_name: &str, view_def: QueryData) -> Self {
        Self {
            view_name: view_name.to_string(),
            view_def,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CreateIndexData {
    pub index_name: String,
    pub table_name: String,
    pub field_name: String,
}

impl CreateIndexData {
    pub fn new(index_name: &str, table_name: &str, field_name: &str) -> Self {
        Self {
            index_name: index_name.to_string(),
            table_name: table_name.to_string(),
            field_name: field_name.to_string(),
        }
    }
}

/// The structured update commands the kernel consumes.
#[derive(Clone, Debug)]
pub enum UpdateCommand {
    Insert(InsertData),
    Delete(DeleteData),
    Modify(ModifyData),
    CreateTable(CreateTableData),
    CreateView(CreateViewData),
    CreateIndex(CreateIndexData),
}
