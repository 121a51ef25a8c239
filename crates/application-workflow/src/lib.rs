//! Approval workflow for submitted applications.
//!
//! Applications move through a fixed lifecycle (created, verified, accepted, then
//! published or rejected) and every write is mirrored into an append-only revision log.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
