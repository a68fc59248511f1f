mod macros;
pub mod options;
pub mod trace;

pub use options::Options;
