//! Score aggregation and readiness verdicts
//!
//! Reduces a set of classification results into counts, percentages and a
//! single readiness verdict.
//!
//! # Verdict Derivation
//!
//! ```text
//! evaluated < min_records        => Not Ready
//! first VerdictRule whose thresholds all hold => its verdict
//! no rule holds                  => Not Ready
//! ```
//!
//! # Default Policies
//!
//! - access-policies: Ready needs 0 Critical, average >= 80 and at least one
//!   `mfa-enforced` hit; Nearly Ready needs <= 2 Critical and average >= 60;
//!   Requires Work needs average >= 40
//! - external-sharing / oversharing: Ready needs 0 Critical and 0 High;
//!   Nearly Ready needs 0 Critical and <= 5 High; Requires Work needs <= 2 Critical
//! - label-coverage: average (= labeled percentage) >= 80 / 60 / 40
//!
//! Percentages are rounded to two decimal places.

mod aggregator;

pub use aggregator::{
    aggregate, round2, AggregateSummary, Aggregator, LabelCoverage, Threshold, VerdictPolicy,
    VerdictRule,
};
