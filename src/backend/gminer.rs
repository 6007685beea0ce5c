//! High-performance AMD/Nvidia miner.
//!
//! Requirements observed for the shipped builds:
//!   - Nvidia: CUDA compute capability 5.0+, CUDA 9.0 runtime
//!     (drivers 384.xx or newer)
//!   - AMD: GCN generation 4+
//!   - Cuckarood29 / CuckooCycle ~5.6 GB VRAM, Cuckatoo31 ~7.4 GB,
//!     ZHash ~1.75 GB, BeamV2 ~2.9 GB

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmKind::Single;
use crate::algorithm::AlgorithmTag::{BeamV2, CuckooCycle, GrinCuckarood29, GrinCuckatoo31, ZHash};
use crate::backend::{
    BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing, FallbackGrouping, ProbeCommand,
};
use crate::crossref::EnumerationDialect;
use crate::device::Vendor;
use crate::gates::{DriverRequirement, VendorGate};
use crate::rebench::RebenchRule;
use crate::version::Version;

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::Gminer,
        name: "GMiner",
        gates: vec![
            VendorGate::for_vendor(Vendor::Nvidia)
                .with_min_compute(5, 0)
                .with_driver(DriverRequirement::MinimumDriver(Version::new(384, 0))),
            VendorGate::for_vendor(Vendor::Amd).with_min_gcn_generation(4),
        ],
        narrowing: CatalogNarrowing::None,
        catalog_nvidia: vec![
            AlgorithmEntry::single(ZHash),
            AlgorithmEntry::single(GrinCuckatoo31),
            // ~5% invalid nonce shares
            AlgorithmEntry::single(CuckooCycle).disabled(),
            AlgorithmEntry::single(GrinCuckarood29),
            AlgorithmEntry::single(BeamV2),
        ],
        catalog_amd: vec![
            // ~5% invalid nonce shares
            AlgorithmEntry::single(CuckooCycle).disabled(),
            AlgorithmEntry::single(BeamV2),
        ],
        indexing: DeviceIndexing::Indexed {
            dialect: EnumerationDialect::GpuPcieLines,
            grouping: FallbackGrouping::Interleaved,
            probe: ProbeCommand {
                args: &["--list_devices"],
                termination_markers: &[],
                max_lines: 64,
            },
        },
        rebench_rules: vec![
            // 2.8 improved Cuckarood29 on Nvidia cards.
            RebenchRule {
                changed_in: Version::new(2, 8),
                vendor: Vendor::Nvidia,
                kind: Single(GrinCuckarood29),
            },
            // 2.7 improved ZHash on Nvidia cards.
            RebenchRule {
                changed_in: Version::new(2, 7),
                vendor: Vendor::Nvidia,
                kind: Single(ZHash),
            },
            // 2.6 improved BeamV2 on Nvidia cards.
            RebenchRule {
                changed_in: Version::new(2, 6),
                vendor: Vendor::Nvidia,
                kind: Single(BeamV2),
            },
        ],
    }
}
