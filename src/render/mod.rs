pub mod comparator;
pub mod parse_error;
pub mod type_parser;
pub mod type_renderer;

pub use comparator::*;
pub use parse_error::*;
pub use type_parser::*;
pub use type_renderer::*;
