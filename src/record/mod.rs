//! Raw rows and assembled documents

pub mod assembler;
mod value;

pub use assembler::{assemble, assemble_external, Document};
pub use value::{FieldValue, Row, RowError, Scalar};
