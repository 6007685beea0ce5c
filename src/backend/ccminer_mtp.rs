//! Nvidia MTP miner; needs compute capability 6.0+ and a CUDA 10.0
//! capable driver.

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmTag::Mtp;
use crate::backend::{BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing};
use crate::device::Vendor;
use crate::gates::{CudaToolkit, DriverRequirement, VendorGate};

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::CcminerMtp,
        name: "CCMinerMTP",
        gates: vec![VendorGate::for_vendor(Vendor::Nvidia)
            .with_min_compute(6, 0)
            .with_driver(DriverRequirement::Toolkit(CudaToolkit::Cuda10_0))],
        narrowing: CatalogNarrowing::None,
        catalog_nvidia: vec![AlgorithmEntry::single(Mtp).disabled()],
        catalog_amd: Vec::new(),
        indexing: DeviceIndexing::NotRequired,
        rebench_rules: Vec::new(),
    }
}
