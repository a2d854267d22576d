//! Functional core of the microposts service.
//!
//! Domain types, request validation, the single-table key scheme and the
//! storage contracts live here. Nothing in this crate performs I/O.

pub mod model;
pub mod storage;
