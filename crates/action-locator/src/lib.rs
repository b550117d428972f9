//! Table cell addressing
//!
//! Locates a `(row, column)` cell inside a dynamically rendered data table:
//! - the header section is found by a fixed marker label
//! - the paired body section is the header's next sibling
//! - rows are addressed 1-based in insertion order, columns by fixed offset

pub mod errors;
pub mod resolver;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use types::*;
