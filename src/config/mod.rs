pub mod options;
pub mod overrides;

pub use options::*;
pub use overrides::*;
