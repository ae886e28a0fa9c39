use std::collections::HashMap;

use crate::{
    file::{self, INT_BYTES},
    record::{FieldType, Schema},
};

/// Fixes each field's byte offset within a slot. The first four bytes of a
/// slot hold the EMPTY/USED flag; fields follow in schema order.
#[derive(Clone, Debug)]
pub struct Layout {
    schema: Schema,
    offsets: HashMap<String, usize>,
    slot_size: usize,
}

impl Layout {
    /// Derive offsets and slot size from the schema.
    pub fn new(schema: Schema) -> Self {
        let mut offsets = HashMap::new();
        let mut pos = INT_BYTES;
        for field_name in schema.fields() {
            offsets.insert(field_name.clone(), pos);
            pos += Self::length_in_bytes(&schema, field_name);
        }
        Self {
            schema,
            offsets,
            slot_size: pos,
        }
    }

    /// Rebuild a layout from catalog data, where the offsets were computed
    /// when the table was created.
    pub fn from_metadata(schema: Schema, offsets: HashMap<String, usize>, slot_size: usize) -> Self {
        Self {
            schema,
            offsets,
            slot_size,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn offset(&self, field_name: &str) -> usize {
        *self.offsets.get(field_name).expect("field not in layout")
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    fn length_in_bytes(schema: &Schema, field_name: &str) -> usize {
        match schema.field_type(field_name) {
            FieldType::Integer => INT_BYTES,
            FieldType::Varchar => file::max_length(schema.length(field_name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_schema_order() {
        let mut schema = Schema::new();
        schema.add_int_field("a");
        schema.add_string_field("b", 9);
        schema.add_int_field("c");
        let layout = Layout::new(schema);

        assert_eq!(layout.offset("a"), 4);
        assert_eq!(layout.offset("b"), 8);
        assert_eq!(layout.offset("c"), 8 + 4 + 18);
        assert_eq!(layout.slot_size(), 8 + 4 + 18 + 4);
    }
}
