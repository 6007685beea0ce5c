//! Optimized AMD miner, GCN generation 4 or newer. Takes no per-device
//! index arguments, so no cross-reference mapping is ever built.

use crate::algorithm::AlgorithmEntry;
use crate::algorithm::AlgorithmTag::{
    CryptoNightR, GrinCuckarood29, GrinCuckatoo31, Lyra2Rev3, Lyra2Z, Mtp, X16R, X16Rv2,
};
use crate::backend::{BackendId, BackendSpec, CatalogNarrowing, DeviceIndexing};
use crate::device::Vendor;
use crate::gates::VendorGate;

pub fn spec() -> BackendSpec {
    BackendSpec {
        id: BackendId::TeamRedMiner,
        name: "TeamRedMiner",
        gates: vec![VendorGate::for_vendor(Vendor::Amd).with_min_gcn_generation(4)],
        narrowing: CatalogNarrowing::None,
        catalog_nvidia: Vec::new(),
        catalog_amd: vec![
            AlgorithmEntry::single(CryptoNightR),
            AlgorithmEntry::single(Lyra2Rev3),
            AlgorithmEntry::single(Lyra2Z),
            AlgorithmEntry::single(X16R),
            AlgorithmEntry::single(GrinCuckatoo31),
            AlgorithmEntry::single(Mtp).disabled(),
            AlgorithmEntry::single(GrinCuckarood29),
            AlgorithmEntry::single(X16Rv2),
        ],
        indexing: DeviceIndexing::NotRequired,
        rebench_rules: Vec::new(),
    }
}
