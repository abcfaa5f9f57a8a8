pub mod error;
pub mod result;
pub mod security;

pub use error::{ExitCode, SbomError};
pub use result::Result;
