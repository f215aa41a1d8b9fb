pub mod generator;
pub mod resolved_statement;

pub use generator::*;
pub use resolved_statement::*;
