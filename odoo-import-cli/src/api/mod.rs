//! Odoo remote record API
//!
//! A thin JSON-RPC client over the platform's `execute_kw` endpoint, the
//! [`RecordClient`] trait the importer is written against, and the wrappers
//! layered on top of it (dry-run, in-memory test double).

pub mod client;
pub mod domain;
pub mod dry_run;
pub mod external_id;
pub mod odoo;
pub mod operation;

#[cfg(test)]
pub mod memory;

pub use client::{FieldInfo, RecordClient, RecordId, RecordValues, RemoteCallError};
pub use domain::{Domain, Filter, Operator};
pub use dry_run::DryRunClient;
pub use external_id::ExternalId;
pub use odoo::{Credentials, OdooClient};
