//! Readiness Audit - AI assistant rollout readiness scoring
//!
//! Classifies exported tenant records with ordered rule sets and reduces
//! each audit domain to a readiness verdict.
//!
//! ```rust,ignore
//! use readiness_audit::audit::{run_domain, DomainProfile};
//! use readiness_audit::models::{AuditDomain, AuditableRecord};
//! use readiness_audit::source::SourceBatch;
//!
//! let profile = DomainProfile::builtin(AuditDomain::AccessPolicies)?;
//! let batch = SourceBatch::from_records(
//!     AuditDomain::AccessPolicies,
//!     vec![AuditableRecord::new("ca-1").with_attr("requiresMFA", false)],
//! );
//! let report = run_domain(&profile, batch);
//! println!("{}", report.summary.verdict);
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod engine;
pub mod models;
pub mod reporters;
pub mod rules;
pub mod scoring;
pub mod source;
