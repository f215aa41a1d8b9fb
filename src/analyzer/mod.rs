pub mod column_namer;
pub mod described_column;
pub mod described_type;
pub mod describer;
pub mod pg_functions;
pub mod resolvers;
pub mod type_mapper;

pub(crate) mod _fixtures;

pub use column_namer::*;
pub use described_column::*;
pub use described_type::*;
pub use describer::*;
pub use pg_functions::{NullBehavior, PgFunction, ReturnRule};
pub use resolvers::*;
pub use type_mapper::*;
