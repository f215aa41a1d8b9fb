pub mod ast;
pub mod catalog;
pub mod config;
pub mod error;

pub mod analyzer;
pub use analyzer::{AstDescriber, DescribedColumn, DescribedType};

pub mod render;
pub use render::{Comparison, TypeComparator, render_row, render_type};

pub mod generate;
pub use generate::{GenerateParams, GenerateResult, Generator, ResolvedStatement, generate};
pub use error::{DuplicateColumnsError, GenerateError, InvalidQueryError, PostgresConstraintError};
