//! Query Runner & Result Comparator
//!
//! - `runner`: execute a statement, capture columns and rows
//! - `result`: result sets and their canonical text form
//! - `compare`: grade a user query against a reference query

pub mod compare;
pub mod result;
pub mod runner;

pub use compare::{compare, Comparison, Verdict};
pub use result::{display_cell, Cell, ResultSet, CANONICAL_SEPARATOR, NULL_TOKEN};
pub use runner::run_query;
