pub mod field_types;
pub mod index_lookup;

pub use field_types::{
    FieldTypeEntry, FieldTypesLookup, IndexFieldTypes, IndexFieldTypesProvider,
    MemoryFieldTypesProvider,
};
pub use index_lookup::{IndexLookup, IndexRangeEntry, MemoryIndexLookup};
