use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::algorithm::AlgorithmKind;
use crate::backend::BackendId;
use crate::device::{DeviceId, Vendor};
use crate::version::Version;

/// One version-gated improvement rule: benchmarks of `kind` on `vendor`
/// recorded before the `changed_in` release series are stale once that
/// series (or newer) is installed.
#[derive(Debug, Clone, Copy)]
pub struct RebenchRule {
    pub changed_in: Version,
    pub vendor: Vendor,
    pub kind: AlgorithmKind,
}

/// Stored benchmark result, produced and owned by the benchmarking
/// collaborator. Only read here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub device_id: DeviceId,
    pub backend_id: BackendId,
    pub kind: AlgorithmKind,
    pub throughput_hps: f64,
    pub backend_version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub force: bool,
    pub diagnostic: Option<String>,
}

impl Decision {
    fn keep() -> Self {
        Self {
            force: false,
            diagnostic: None,
        }
    }

    fn keep_with_diagnostic(diagnostic: String) -> Self {
        Self {
            force: false,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Decides whether a stored benchmark must be discarded. Rules are
/// evaluated independently; any match forces a rebenchmark. Without a
/// match the prior benchmark stays valid indefinitely. Version series
/// compare on (major, minor) only. Malformed version strings never
/// escalate: the decision is "keep" with a diagnostic for the caller to
/// log.
pub fn must_rebenchmark(
    rules: &[RebenchRule],
    benchmarked_version: &str,
    installed_version: &str,
    vendor: Vendor,
    kind: AlgorithmKind,
) -> Decision {
    let Some(installed) = Version::parse(installed_version) else {
        return Decision::keep_with_diagnostic(format!(
            "unparseable installed version '{installed_version}'; keeping prior benchmark"
        ));
    };
    let Some(benchmarked) = Version::parse(benchmarked_version) else {
        return Decision::keep_with_diagnostic(format!(
            "unparseable benchmarked version '{benchmarked_version}'; keeping prior benchmark"
        ));
    };

    let force = rules.iter().any(|rule| {
        rule.vendor == vendor
            && rule.kind == kind
            && benchmarked.series() < rule.changed_in.series()
            && installed.series() >= rule.changed_in.series()
    });

    if force {
        return Decision {
            force: true,
            diagnostic: None,
        };
    }
    Decision::keep()
}

pub fn load_records(path: &Path) -> Result<Vec<BenchmarkRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read benchmark records {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse benchmark records {}", path.display()))
}
