//! End-to-end scenarios for the HNSW index.
//!
//! Each submodule drives the public API the way an embedding pipeline
//! would: build incrementally, query, export, reload, back vectors in.

mod helpers;

mod bulk;
mod failing_store;
mod insert;
mod persistence;
mod query;
