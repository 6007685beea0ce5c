//! Equihash-family miner for Nvidia cards, CUDA 10 builds
//! (drivers 411.31 or newer). Its `-ci` listing names cards without
//! bus ids, so cross-referencing matches on device names.

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmTag::{Beam, BeamV2, ZHash};
use crate::backend::{
    BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing, FallbackGrouping, ProbeCommand,
};
use crate::crossref::EnumerationDialect;
use crate::device::Vendor;
use crate::gates::{DriverRequirement, VendorGate};
use crate::version::Version;

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::Miniz,
        name: "MiniZ",
        gates: vec![VendorGate::for_vendor(Vendor::Nvidia)
            .with_driver(DriverRequirement::MinimumDriver(Version::new(411, 31)))],
        narrowing: CatalogNarrowing::None,
        catalog_nvidia: vec![
            AlgorithmEntry::single(ZHash),
            AlgorithmEntry::single(Beam),
            AlgorithmEntry::single(BeamV2),
        ],
        catalog_amd: Vec::new(),
        indexing: DeviceIndexing::Indexed {
            dialect: EnumerationDialect::DeviceOrdinalLines,
            grouping: FallbackGrouping::Interleaved,
            probe: ProbeCommand {
                args: &["-ci"],
                termination_markers: &[],
                max_lines: 64,
            },
        },
        rebench_rules: Vec::new(),
    }
}
