pub mod http_path_resolution;
pub mod parser;
pub mod query;

pub use http_path_resolution::*;
pub use parser::*;
pub use query::*;
