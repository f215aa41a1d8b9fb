pub mod builtin_types;
pub mod cache;
pub mod catalog_error;
pub mod snapshot;

pub use builtin_types::*;
pub use cache::*;
pub use catalog_error::*;
pub use snapshot::*;
