//! Track assembly from pairwise box matching.
mod assembler;
pub use assembler::TrackAssembler;

mod paths;
