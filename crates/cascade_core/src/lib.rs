//! Lazy frames and their materialization on top of a partitioned columnar
//! store.
//!
//! Frames are described as trees of [`frame::LazyFrame`] nodes. Nothing is
//! computed until the tree is handed to
//! [`materialize`](execution::materialize::materialize), which runs the tree
//! once per store partition and commits the produced columns as a new
//! [`MaterializedFrame`](frame::materialized::MaterializedFrame).

pub mod config;
pub mod datatype;
pub mod engine;
pub mod execution;
pub mod frame;
pub mod functions;
pub mod storage;
pub mod value;

#[cfg(test)]
pub(crate) mod testutil;
