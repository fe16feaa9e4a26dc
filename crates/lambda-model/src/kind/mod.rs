mod function;
pub use function::FunctionKind;

mod status;
pub use status::JobStatus;
