//! Nvidia miner built against CUDA 10.1; needs compute capability 5.0+
//! and a driver new enough for that toolkit.

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmTag::{Lyra2Rev3, Mtp, X16R};
use crate::backend::{BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing};
use crate::device::Vendor;
use crate::gates::{CudaToolkit, DriverRequirement, VendorGate};

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::CryptoDredge,
        name: "CryptoDredge",
        gates: vec![VendorGate::for_vendor(Vendor::Nvidia)
            .with_min_compute(5, 0)
            .with_driver(DriverRequirement::Toolkit(CudaToolkit::Cuda10_1))],
        narrowing: CatalogNarrowing::None,
        catalog_nvidia: vec![
            AlgorithmEntry::single(Lyra2Rev3),
            AlgorithmEntry::single(X16R),
            AlgorithmEntry::single(Mtp).disabled(),
        ],
        catalog_amd: Vec::new(),
        indexing: DeviceIndexing::NotRequired,
        rebench_rules: Vec::new(),
    }
}
