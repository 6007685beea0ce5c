//! Dual-mining Ethash miner for AMD and Nvidia cards.
//!
//! Nvidia cards need compute capability 3.0+ and drivers 411.31 or newer.
//! Navi-family AMD silicon runs the single Ethash kernel only; dual
//! combinations are not offered there. The miner's own enumeration lists
//! all AMD devices before the Nvidia ones regardless of slot order.

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmTag::{Blake2s, DaggerHashimoto, Decred, Keccak};
use crate::backend::{
    BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing, FallbackGrouping, ProbeCommand,
};
use crate::crossref::EnumerationDialect;
use crate::device::Vendor;
use crate::gates::{DriverRequirement, VendorGate};
use crate::version::Version;

fn catalog() -> Vec<AlgorithmEntry> {
    vec![
        AlgorithmEntry::single(DaggerHashimoto),
        // Duals disabled by default.
        AlgorithmEntry::dual(DaggerHashimoto, Decred).disabled(),
        AlgorithmEntry::dual(DaggerHashimoto, Blake2s).disabled(),
        AlgorithmEntry::dual(DaggerHashimoto, Keccak).disabled(),
    ]
}

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::ClaymoreDual,
        name: "ClaymoreDual",
        gates: vec![
            VendorGate::for_vendor(Vendor::Amd),
            VendorGate::for_vendor(Vendor::Nvidia)
                .with_min_compute(3, 0)
                .with_driver(DriverRequirement::MinimumDriver(Version::new(411, 31))),
        ],
        narrowing: CatalogNarrowing::SingleOnlyOnNaviAmd,
        catalog_nvidia: catalog(),
        catalog_amd: catalog(),
        indexing: DeviceIndexing::Indexed {
            dialect: EnumerationDialect::HashIndexBusLines,
            grouping: FallbackGrouping::VendorGrouped(Vendor::Amd),
            // No listing flag; a short benchmark dry-run is scanned until
            // the card summary appears.
            probe: ProbeCommand {
                args: &["-benchmark", "1", "-wd", "0", "-colors", "0", "-dbg", "1"],
                termination_markers: &["Total cards", "Stratum - connecting to"],
                max_lines: 200,
            },
        },
        rebench_rules: Vec::new(),
    }
}
