//! Domain types and payload validation for the labor marketplace.
//!
//! This crate is free of storage and HTTP concerns: it defines the
//! laborer and job records, the create/update payloads accepted at the
//! API boundary, and the schema-level checks applied to them.

pub mod types;
pub mod validate;
