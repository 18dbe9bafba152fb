//! whiteflag - clean, assemble and validate white flag relief records
//!
//! Loosely structured spreadsheet rows become nested four-section JSON
//! documents (`meta`, `contact`, `location`, `resource`) checked against a
//! formal schema.

pub mod cli;
pub mod observability;
pub mod phone;
pub mod pipeline;
pub mod record;
pub mod schema;
