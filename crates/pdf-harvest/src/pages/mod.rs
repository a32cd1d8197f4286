//! Page selection: range expressions and fixed-size batching.
pub mod chunk;
pub mod range;

pub use chunk::chunk;
pub use range::{parse_page_range, resolve_pages};
