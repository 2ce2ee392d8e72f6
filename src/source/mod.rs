//! Tenant data sources
//!
//! A source hands the audit pipeline fully-resolved records for one domain.
//! Failures are isolated per object (file or site): a failing object
//! contributes zero records and shows up as a [`CoverageGap`] instead of
//! aborting the audit.

mod snapshot;

pub use snapshot::{
    parse_timestamp, read_snapshot, resolve_activity, Snapshot, SnapshotSite, SnapshotSource,
};

use crate::models::{AuditDomain, AuditableRecord};
use crate::scoring::round2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading tenant data
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No snapshot inputs given")]
    NoInputs,

    #[error("No snapshot files found in {0}")]
    EmptyDirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Anything that can supply records for an audit domain
pub trait TenantSource {
    /// Short description for logs and report metadata
    fn describe(&self) -> String;

    /// Collect every record for `domain`, isolating per-object failures
    fn fetch(&self, domain: AuditDomain) -> SourceBatch;
}

/// A record plus the site it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedRecord {
    pub site: Option<String>,
    pub record: AuditableRecord,
}

/// An object that could not be scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub object: String,
    pub reason: String,
}

/// How much of the tenant a domain audit actually saw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub objects_scanned: usize,
    pub objects_failed: usize,
    pub gaps: Vec<CoverageGap>,
    pub coverage_percent: f64,
}

impl Coverage {
    pub fn new(objects_scanned: usize, gaps: Vec<CoverageGap>) -> Self {
        let objects_failed = gaps.len();
        let total = objects_scanned + objects_failed;
        let coverage_percent = if total == 0 {
            0.0
        } else {
            round2(objects_scanned as f64 * 100.0 / total as f64)
        };
        Self {
            objects_scanned,
            objects_failed,
            gaps,
            coverage_percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.objects_failed == 0 && self.objects_scanned > 0
    }
}

impl Default for Coverage {
    fn default() -> Self {
        Self::new(0, Vec::new())
    }
}

/// Records collected for one domain
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    pub domain: AuditDomain,
    pub records: Vec<SourcedRecord>,
    pub coverage: Coverage,
}

impl SourceBatch {
    pub fn new(domain: AuditDomain, records: Vec<SourcedRecord>, coverage: Coverage) -> Self {
        Self {
            domain,
            records,
            coverage,
        }
    }

    /// Records only, for callers that don't track sites
    pub fn from_records(domain: AuditDomain, records: Vec<AuditableRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| SourcedRecord { site: None, record })
            .collect();
        Self::new(domain, records, Coverage::new(1, Vec::new()))
    }
}
