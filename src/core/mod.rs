pub mod error;

pub use error::{MetaError, Result};
