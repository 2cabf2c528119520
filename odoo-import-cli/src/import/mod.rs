//! Spreadsheet to record import
//!
//! reader -> mapper -> upsert engine, driven row by row by [`ImportRun`].

pub mod cache;
pub mod driver;
pub mod mapper;
pub mod profiles;
pub mod reader;
pub mod types;
pub mod upsert;

pub use cache::LookupCache;
pub use driver::ImportRun;
pub use mapper::FieldMapper;
pub use upsert::UpsertEngine;
