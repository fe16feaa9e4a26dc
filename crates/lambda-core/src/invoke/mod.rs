//! Payload assembly for function calls.
mod payload;
pub use payload::Payload;

mod builder;
pub use builder::{InvocationBuilder, to_values};

mod decode;
pub use decode::{decode_annotations, decode_matching};
