//! Multi-algorithm miner for AMD cards, GCN generation 2 or newer.

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmTag::{Lyra2Rev3, X16R};
use crate::backend::{
    BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing, FallbackGrouping, ProbeCommand,
};
use crate::crossref::EnumerationDialect;
use crate::device::Vendor;
use crate::gates::VendorGate;

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::WildRig,
        name: "WildRig",
        gates: vec![VendorGate::for_vendor(Vendor::Amd).with_min_gcn_generation(2)],
        narrowing: CatalogNarrowing::None,
        catalog_nvidia: Vec::new(),
        catalog_amd: vec![
            AlgorithmEntry::single(Lyra2Rev3),
            AlgorithmEntry::single(X16R),
        ],
        indexing: DeviceIndexing::Indexed {
            dialect: EnumerationDialect::IndexedBusLines,
            grouping: FallbackGrouping::Interleaved,
            probe: ProbeCommand {
                args: &["--print-devices"],
                termination_markers: &[],
                max_lines: 64,
            },
        },
        rebench_rules: Vec::new(),
    }
}
