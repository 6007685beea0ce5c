//! Equihash miner for Nvidia cards, compute capability 5.0+ and
//! CUDA 9.1 drivers (391.29 or newer).

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmTag::ZHash;
use crate::backend::{BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing};
use crate::device::Vendor;
use crate::gates::{DriverRequirement, VendorGate};
use crate::version::Version;

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::Ewbf,
        name: "Ewbf",
        gates: vec![VendorGate::for_vendor(Vendor::Nvidia)
            .with_min_compute(5, 0)
            .with_driver(DriverRequirement::MinimumDriver(Version::new(391, 29)))],
        narrowing: CatalogNarrowing::None,
        catalog_nvidia: vec![AlgorithmEntry::single(ZHash)],
        catalog_amd: Vec::new(),
        indexing: DeviceIndexing::NotRequired,
        rebench_rules: Vec::new(),
    }
}
