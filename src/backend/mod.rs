use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::algorithm::AlgorithmEntry;
use crate::crossref::EnumerationDialect;
use crate::device::{DeviceDescriptor, Vendor};
use crate::gates::{InstalledDrivers, VendorGate};
use crate::rebench::RebenchRule;

pub mod ccminer_mtp;
pub mod claymore_dual;
pub mod crypto_dredge;
pub mod ewbf;
pub mod gminer;
pub mod miniz;
pub mod nano_miner;
pub mod sgminer_gm;
pub mod team_red;
pub mod wild_rig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    Gminer,
    ClaymoreDual,
    Miniz,
    NanoMiner,
    WildRig,
    TeamRedMiner,
    CryptoDredge,
    Ewbf,
    CcminerMtp,
    SgminerGm,
}

impl BackendId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gminer => "gminer",
            Self::ClaymoreDual => "claymore-dual",
            Self::Miniz => "miniz",
            Self::NanoMiner => "nanominer",
            Self::WildRig => "wildrig",
            Self::TeamRedMiner => "teamredminer",
            Self::CryptoDredge => "cryptodredge",
            Self::Ewbf => "ewbf",
            Self::CcminerMtp => "ccminer-mtp",
            Self::SgminerGm => "sgminer-gm",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let spec = registry()
            .into_iter()
            .find(|spec| spec.id.as_str() == raw.trim().to_lowercase());
        match spec {
            Some(spec) => Ok(spec.id),
            None => bail!(
                "unknown backend '{raw}'; known backends: {}",
                backend_names()
            ),
        }
    }
}

impl<'de> serde::Deserialize<'de> for BackendId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// How the backend enumerates devices when indices must be rebuilt
/// without usable enumeration text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackGrouping {
    /// Ascending PCIe bus id across all eligible devices.
    Interleaved,
    /// All devices of the named vendor first (ascending bus id), then the
    /// rest. Declared per backend, never assumed.
    VendorGrouped(Vendor),
}

/// Invocation recipe for the backend's device-enumeration probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbeCommand {
    pub args: &'static [&'static str],
    /// Capture stops once any of these substrings appears in a line.
    pub termination_markers: &'static [&'static str],
    pub max_lines: usize,
}

/// Whether and how the backend's command line addresses devices by index.
#[derive(Debug, Clone, Copy)]
pub enum DeviceIndexing {
    /// The backend takes no per-device index arguments; no mapping is
    /// ever built for it.
    NotRequired,
    Indexed {
        dialect: EnumerationDialect,
        grouping: FallbackGrouping,
        probe: ProbeCommand,
    },
}

/// Catalog restriction applied after vendor selection, keyed on silicon
/// generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogNarrowing {
    None,
    /// Dual entries are dropped on AMD Navi-family silicon.
    SingleOnlyOnNaviAmd,
}

/// A backend integration as a plain data record: admission gates, the
/// static algorithm catalog, the device-indexing convention, and the
/// version-gated rebenchmark rules.
pub struct BackendSpec {
    pub id: BackendId,
    pub name: &'static str,
    pub gates: Vec<VendorGate>,
    pub narrowing: CatalogNarrowing,
    pub catalog_nvidia: Vec<AlgorithmEntry>,
    pub catalog_amd: Vec<AlgorithmEntry>,
    pub indexing: DeviceIndexing,
    pub rebench_rules: Vec<RebenchRule>,
}

impl BackendSpec {
    pub fn catalog(&self, vendor: Vendor) -> &[AlgorithmEntry] {
        match vendor {
            Vendor::Nvidia => &self.catalog_nvidia,
            Vendor::Amd => &self.catalog_amd,
        }
    }

    /// True when the device passes any of the backend's vendor gates.
    /// Failing here excludes the device from the backend entirely, as
    /// opposed to the per-algorithm memory filter.
    pub fn admits(&self, dev: &DeviceDescriptor, drivers: &InstalledDrivers) -> bool {
        self.gates.iter().any(|gate| gate.admits(dev, drivers))
    }
}

/// Every registered backend, in stable declaration order.
pub fn registry() -> Vec<BackendSpec> {
    vec![
        gminer::spec(),
        claymore_dual::spec(),
        miniz::spec(),
        nano_miner::spec(),
        wild_rig::spec(),
        team_red::spec(),
        crypto_dredge::spec(),
        ewbf::spec(),
        ccminer_mtp::spec(),
        sgminer_gm::spec(),
    ]
}

pub fn find(id: BackendId) -> BackendSpec {
    registry()
        .into_iter()
        .find(|spec| spec.id == id)
        .expect("registry covers every backend id")
}

pub fn backend_names() -> String {
    registry()
        .iter()
        .map(|spec| spec.id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn registry_ids_are_unique_and_parseable() {
        let mut seen = BTreeSet::new();
        for spec in registry() {
            assert!(seen.insert(spec.id), "duplicate backend id {:?}", spec.id);
            assert_eq!(BackendId::parse(spec.id.as_str()).unwrap(), spec.id);
        }
    }

    #[test]
    fn parse_rejects_unknown_backend() {
        assert!(BackendId::parse("phoenix").is_err());
    }

    #[test]
    fn catalogs_have_unique_kinds_per_vendor() {
        for spec in registry() {
            for vendor in [Vendor::Nvidia, Vendor::Amd] {
                let mut seen = BTreeSet::new();
                for entry in spec.catalog(vendor) {
                    assert!(
                        seen.insert(entry.kind),
                        "backend {} declares {} twice for {}",
                        spec.id.as_str(),
                        entry.kind.label(),
                        vendor.as_str()
                    );
                }
            }
        }
    }

    #[test]
    fn vendor_catalogs_match_declared_gates() {
        for spec in registry() {
            for vendor in [Vendor::Nvidia, Vendor::Amd] {
                let gated = spec.gates.iter().any(|gate| gate.vendor == vendor);
                if !gated {
                    assert!(
                        spec.catalog(vendor).is_empty(),
                        "backend {} has a {} catalog but no {} gate",
                        spec.id.as_str(),
                        vendor.as_str(),
                        vendor.as_str()
                    );
                }
            }
        }
    }
}
