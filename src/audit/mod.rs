//! Audit pipeline
//!
//! One pass per domain:
//!
//! ```text
//! TenantSource::fetch -> Engine::classify (per record) -> Aggregator -> DomainReport
//! ```
//!
//! Domain reports are collected into an [`AuditReport`] whose overall verdict
//! is the worst domain verdict.

mod pipeline;
mod profile;

pub use pipeline::{run_audit, run_domain, AuditReport, DomainReport};
pub use profile::DomainProfile;
