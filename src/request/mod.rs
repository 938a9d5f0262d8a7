// Re-exports
pub mod http1_1;
pub use http1_1::parse_request;
mod reader;
pub use reader::*;
mod types;
pub use types::*;
mod validate;
pub use validate::*;
