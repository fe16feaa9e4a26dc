mod mapping;
pub use mapping::{LabelMappingEntry, MappingRequest};
