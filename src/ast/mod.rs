pub mod expr;
pub mod node;
pub mod range;
pub mod statement;

pub use expr::*;
pub use node::*;
pub use range::*;
pub use statement::*;
