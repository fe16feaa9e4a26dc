//! Label and attribute mapping between function and task vocabularies.
mod compat;
pub use compat::is_compatible;

mod mapper;
pub use mapper::ResolvedMapping;
