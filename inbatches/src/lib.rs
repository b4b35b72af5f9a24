//! Fetches large query results in smaller batches.
//!
//! Databases usually wait until they have collected the entire result set
//! before streaming it to the client, which delays the first row. Splitting
//! the query into `OFFSET .. LIMIT ..` batches mitigates this: [`Rows`] issues
//! the batch requests one after the other and exposes them as a single row
//! sequence.

pub mod error;

pub mod config;

mod batch;
pub use batch::*;

mod params;
pub use params::*;

mod rows;
pub use rows::*;
