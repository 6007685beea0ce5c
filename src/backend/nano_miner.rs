//! Multi-algorithm miner for AMD and Nvidia cards. Nvidia builds need
//! drivers 411.31 or newer; AMD cards are accepted as-is.

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmTag::{CryptoNightR, GrinCuckarood29};
use crate::backend::{
    BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing, FallbackGrouping, ProbeCommand,
};
use crate::crossref::EnumerationDialect;
use crate::device::Vendor;
use crate::gates::{DriverRequirement, VendorGate};
use crate::version::Version;

fn catalog() -> Vec<AlgorithmEntry> {
    vec![
        AlgorithmEntry::single(GrinCuckarood29),
        AlgorithmEntry::single(CryptoNightR),
    ]
}

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::NanoMiner,
        name: "NanoMiner",
        gates: vec![
            VendorGate::for_vendor(Vendor::Amd),
            VendorGate::for_vendor(Vendor::Nvidia)
                .with_driver(DriverRequirement::MinimumDriver(Version::new(411, 31))),
        ],
        narrowing: CatalogNarrowing::None,
        catalog_nvidia: catalog(),
        catalog_amd: catalog(),
        indexing: DeviceIndexing::Indexed {
            dialect: EnumerationDialect::PciSlotLines,
            grouping: FallbackGrouping::Interleaved,
            probe: ProbeCommand {
                args: &["-d"],
                termination_markers: &[],
                max_lines: 64,
            },
        },
        rebench_rules: Vec::new(),
    }
}
