pub mod insert_validator;
pub mod non_nullable_resolver;
pub mod relation_resolver;
pub mod source_resolver;

pub use insert_validator::*;
pub use non_nullable_resolver::*;
pub use relation_resolver::*;
pub use source_resolver::*;
