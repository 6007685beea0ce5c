//! Multi-pool OpenCL miner for AMD cards, Ethash only. The tuned launch
//! parameters ride along as opaque extra arguments.

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmTag::DaggerHashimoto;
use crate::backend::{BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing};
use crate::device::Vendor;
use crate::gates::VendorGate;

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::SgminerGm,
        name: "SGminerGM",
        gates: vec![VendorGate::for_vendor(Vendor::Amd)],
        narrowing: CatalogNarrowing::None,
        catalog_nvidia: Vec::new(),
        catalog_amd: vec![AlgorithmEntry::single(DaggerHashimoto)
            .with_extra_parameters("--remove-disabled --xintensity 512 -w 192 -g 1")],
        indexing: DeviceIndexing::NotRequired,
        rebench_rules: Vec::new(),
    }
}
