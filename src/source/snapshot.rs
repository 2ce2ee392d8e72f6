//! JSON snapshot source
//!
//! Snapshots are exports of tenant data taken by an admin script:
//!
//! ```json
//! {
//!   "domain": "external-sharing",
//!   "collected_at": "2026-10-01T00:00:00Z",
//!   "records": [ { "subject_id": "...", "attributes": { } } ],
//!   "sites": [
//!     { "name": "hr", "records": [] },
//!     { "name": "legal", "error": "403 Forbidden" }
//!   ]
//! }
//! ```

use super::{Coverage, CoverageGap, SourceBatch, SourceError, SourceResult, SourcedRecord, TenantSource};
use crate::models::{AttributeValue, AuditDomain, AuditableRecord};
use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Attribute holding the last sign-in or modification timestamp
const LAST_ACTIVITY: &str = "lastActivity";
/// Attribute the classifier reads, derived from `lastActivity`
const DAYS_SINCE_ACTIVITY: &str = "daysSinceActivity";

/// One snapshot file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub domain: Option<AuditDomain>,
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub records: Vec<AuditableRecord>,
    #[serde(default)]
    pub sites: Vec<SnapshotSite>,
}

/// Records gathered from one site, or the error that stopped collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSite {
    pub name: String,
    #[serde(default)]
    pub records: Vec<AuditableRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Read and parse a single snapshot file
pub fn read_snapshot(path: &Path) -> SourceResult<Snapshot> {
    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Derive `daysSinceActivity` from `lastActivity` relative to `now`
///
/// Records that already carry `daysSinceActivity`, or whose timestamp does
/// not parse, are returned unchanged. Future timestamps count as 0 days.
pub fn resolve_activity(mut record: AuditableRecord, now: DateTime<Utc>) -> AuditableRecord {
    if record.attr(DAYS_SINCE_ACTIVITY).is_some() {
        return record;
    }
    let Some(raw) = record.attr(LAST_ACTIVITY).and_then(|v| v.as_str()).map(str::to_owned) else {
        return record;
    };
    match parse_timestamp(&raw) {
        Some(at) => {
            let days = (now - at).num_days().max(0);
            record
                .attributes
                .insert(DAYS_SINCE_ACTIVITY.to_string(), AttributeValue::Integer(days));
        }
        None => debug!("Unparseable {} on {}: {}", LAST_ACTIVITY, record.subject_id, raw),
    }
    record
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Expand directories into their `*.json` files, sorted for stable output
fn expand_inputs(inputs: &[PathBuf]) -> SourceResult<Vec<PathBuf>> {
    if inputs.is_empty() {
        return Err(SourceError::NoInputs);
    }

    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let entries = std::fs::read_dir(input).map_err(|source| SourceError::Io {
            path: input.clone(),
            source,
        })?;
        let mut found: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        if found.is_empty() {
            return Err(SourceError::EmptyDirectory(input.clone()));
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// Tenant data loaded from snapshot files
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    files: Vec<(PathBuf, Result<Snapshot, String>)>,
    as_of: Option<DateTime<Utc>>,
    require_domain: bool,
}

impl SnapshotSource {
    /// Load every input in parallel; unreadable files are kept as failures
    pub fn load(inputs: &[PathBuf]) -> SourceResult<Self> {
        let paths = expand_inputs(inputs)?;

        let files: Vec<(PathBuf, Result<Snapshot, String>)> = paths
            .par_iter()
            .map(|path| {
                let loaded = read_snapshot(path).map_err(|e| {
                    warn!("Skipping snapshot: {}", e);
                    e.to_string()
                });
                (path.clone(), loaded)
            })
            .collect();

        let failed = files.iter().filter(|(_, r)| r.is_err()).count();
        info!("Loaded {} snapshot files ({} failed)", files.len() - failed, failed);

        Ok(Self {
            files,
            as_of: None,
            require_domain: false,
        })
    }

    /// Reference time for snapshots without `collected_at`
    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Skip snapshots that don't declare a domain
    pub fn require_domain(mut self, require: bool) -> Self {
        self.require_domain = require;
        self
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Domains declared by the loaded snapshots
    pub fn domains(&self) -> BTreeSet<AuditDomain> {
        self.files
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .filter_map(|s| s.domain)
            .collect()
    }

    fn accepts(&self, snapshot: &Snapshot, domain: AuditDomain) -> bool {
        match snapshot.domain {
            Some(d) => d == domain,
            None => !self.require_domain,
        }
    }
}

impl TenantSource for SnapshotSource {
    fn describe(&self) -> String {
        format!("{} snapshot file(s)", self.files.len())
    }

    fn fetch(&self, domain: AuditDomain) -> SourceBatch {
        let mut records = Vec::new();
        let mut gaps = Vec::new();
        let mut scanned = 0;

        for (path, loaded) in &self.files {
            let snapshot = match loaded {
                Ok(snapshot) => snapshot,
                Err(reason) => {
                    gaps.push(CoverageGap {
                        object: path.display().to_string(),
                        reason: reason.clone(),
                    });
                    continue;
                }
            };
            if !self.accepts(snapshot, domain) {
                debug!("{} does not hold {} data, skipping", path.display(), domain);
                continue;
            }

            let now = snapshot.collected_at.or(self.as_of).unwrap_or_else(Utc::now);
            let resolve = |site: Option<&str>, r: &AuditableRecord| SourcedRecord {
                site: site.map(str::to_string),
                record: resolve_activity(r.clone(), now),
            };

            if !snapshot.records.is_empty() || snapshot.sites.is_empty() {
                scanned += 1;
                records.extend(snapshot.records.iter().map(|r| resolve(None, r)));
            }

            for site in &snapshot.sites {
                if let Some(error) = &site.error {
                    warn!("Site '{}' failed during collection: {}", site.name, error);
                    gaps.push(CoverageGap {
                        object: site.name.clone(),
                        reason: error.clone(),
                    });
                    continue;
                }
                scanned += 1;
                records.extend(site.records.iter().map(|r| resolve(Some(site.name.as_str()), r)));
            }
        }

        debug!(
            "{}: {} records from {} objects, {} gaps",
            domain,
            records.len(),
            scanned,
            gaps.len()
        );
        SourceBatch::new(domain, records, Coverage::new(scanned, gaps))
    }
}
