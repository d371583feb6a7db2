//! Scenario files and the step runner.
//!
//! A scenario declares buckets and a list of steps. Steps are applied in
//! order through the [`BucketApi`]; `expect_*` steps record failures instead
//! of aborting, so a single run reports every broken expectation.
//!
//! ```toml
//! name = "no slashes"
//!
//! [[steps]]
//! op = "warp"
//! delta = 1209600
//!
//! [[steps]]
//! op = "expect_finalized"
//! expected = true
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bucket_finality::{BucketApi, BucketError, BucketId, Nonce, Timestamp};
use bucket_telemetry::log_bucket_event;
use serde::{Deserialize, Serialize};

/// A bucket created before the first step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDecl {
    pub id: u64,
    #[serde(default)]
    pub origin_nonce: Nonce,
}

/// One scripted action. `bucket` defaults to the first declared bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Warp {
        #[serde(default)]
        bucket: Option<u64>,
        delta: i64,
    },
    Slash {
        #[serde(default)]
        bucket: Option<u64>,
    },
    Push {
        #[serde(default)]
        bucket: Option<u64>,
        value: u64,
    },
    Query {
        #[serde(default)]
        bucket: Option<u64>,
    },
    ExpectFinalized {
        #[serde(default)]
        bucket: Option<u64>,
        expected: bool,
    },
    ExpectWindow {
        #[serde(default)]
        bucket: Option<u64>,
        start: Timestamp,
        #[serde(default)]
        finalization: Option<Timestamp>,
    },
}

impl Step {
    fn bucket(&self) -> Option<u64> {
        match self {
            Step::Warp { bucket, .. }
            | Step::Slash { bucket }
            | Step::Push { bucket, .. }
            | Step::Query { bucket }
            | Step::ExpectFinalized { bucket, .. }
            | Step::ExpectWindow { bucket, .. } => *bucket,
        }
    }
}

fn default_buckets() -> Vec<BucketDecl> {
    vec![BucketDecl {
        id: 0,
        origin_nonce: 0,
    }]
}

/// A complete scenario file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_buckets")]
    pub buckets: Vec<BucketDecl>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a TOML scenario.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid TOML scenario")
    }

    /// Parse a JSON scenario.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("invalid JSON scenario")
    }

    /// Load a scenario, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let scenario = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => bail!(
                "unsupported scenario extension {:?} for {}",
                other,
                path.display()
            ),
        }
        .with_context(|| format!("failed to load scenario {}", path.display()))?;
        if scenario.buckets.is_empty() {
            bail!("scenario {} declares no buckets", path.display());
        }
        Ok(scenario)
    }
}

/// Outcome of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Steps executed.
    pub steps: usize,
    /// Reports refused by the submission window.
    pub rejected_reports: usize,
    /// Broken expectations, one message each.
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Create the declared buckets and apply every step.
///
/// Submission-window rejections are counted, not fatal. Any other bucket
/// error aborts the run.
pub fn run_scenario<A: BucketApi<u64>>(scenario: &Scenario, api: &A) -> Result<RunReport> {
    let default_bucket = scenario
        .buckets
        .first()
        .map(|b| b.id)
        .context("scenario declares no buckets")?;

    for decl in &scenario.buckets {
        api.create_bucket(BucketId::new(decl.id), decl.origin_nonce)
            .with_context(|| format!("failed to create bucket {}", decl.id))?;
    }

    let mut report = RunReport::default();
    for (index, step) in scenario.steps.iter().enumerate() {
        let id = BucketId::new(step.bucket().unwrap_or(default_bucket));
        apply_step(api, id, step, &mut report)
            .with_context(|| format!("step {} ({:?}) failed", index, step))?;
        report.steps += 1;
    }
    Ok(report)
}

fn apply_step<A: BucketApi<u64>>(
    api: &A,
    id: BucketId,
    step: &Step,
    report: &mut RunReport,
) -> Result<()> {
    match step {
        Step::Warp { delta, .. } => {
            api.warp_forward(id, *delta)?;
        }
        Step::Slash { .. } => {
            api.execute_slash_event(id)?;
        }
        Step::Push { value, .. } => match api.push_report(id, *value) {
            Ok(_) => {}
            Err(BucketError::SubmissionWindowViolation { .. }) => report.rejected_reports += 1,
            Err(e) => return Err(e.into()),
        },
        Step::Query { .. } => {
            let window_start = api.calculate_submission_start(id)?;
            let snapshot = api.snapshot(id)?;
            log_bucket_event!(
                info,
                "Bucket state",
                id,
                window_start,
                timestamp = snapshot.current_timestamp,
                finalization = snapshot.finalization_timestamp,
                global_nonce = snapshot.global_nonce,
                last_updated_nonce = snapshot.last_updated_nonce,
                reports = snapshot.report_count,
                status = %snapshot.status
            );
        }
        Step::ExpectFinalized { expected, .. } => {
            let actual = api.is_finalized(id)?;
            if actual != *expected {
                let message = format!(
                    "{}: expected finalized={}, got {}",
                    id, expected, actual
                );
                log_bucket_event!(warn, "Expectation failed", id, detail = %message);
                report.failures.push(message);
            }
        }
        Step::ExpectWindow {
            start,
            finalization,
            ..
        } => {
            let actual_start = api.calculate_submission_start(id)?;
            if actual_start != *start {
                let message = format!(
                    "{}: expected window start {}, got {}",
                    id, start, actual_start
                );
                log_bucket_event!(warn, "Expectation failed", id, detail = %message);
                report.failures.push(message);
            }
            if let Some(expected) = finalization {
                let actual = api.snapshot(id)?.finalization_timestamp;
                if actual != *expected {
                    let message = format!(
                        "{}: expected finalization {}, got {}",
                        id, expected, actual
                    );
                    log_bucket_event!(warn, "Expectation failed", id, detail = %message);
                    report.failures.push(message);
                }
            }
        }
    }
    Ok(())
}
