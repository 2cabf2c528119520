//! Types shared by the mapper and the upsert engine

mod lookup;
mod profile;
mod record;
mod value;

pub use lookup::LookupTable;
pub use profile::{
    ExternalIdRule, Fallback, FieldMapping, ImportProfile, RelationMapping, Substitution, Transform,
};
pub use record::{MappedRecord, RelationCommand, RelationField};
pub use value::{LookupRef, Value};
