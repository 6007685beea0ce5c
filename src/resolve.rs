use std::collections::BTreeMap;

use crate::algorithm::AlgorithmEntry;
use crate::backend::{BackendSpec, CatalogNarrowing};
use crate::device::{DeviceDescriptor, DeviceId, Vendor};
use crate::gates::{is_navi_family, InstalledDrivers};
use crate::memory::filter_insufficient_memory;

/// Eligible algorithms per device for one backend, in catalog declaration
/// order. The order determines default selection priority downstream; no
/// sorting is applied.
pub type CapabilityMap = BTreeMap<DeviceId, Vec<AlgorithmEntry>>;

/// Resolves which devices a backend may drive and which algorithms each
/// of them is offered. Devices failing an admission gate are absent from
/// the result, as are devices whose filtered algorithm list comes out
/// empty. Pure function of its inputs and the backend's static record.
pub fn resolve(
    devices: &[DeviceDescriptor],
    spec: &BackendSpec,
    drivers: &InstalledDrivers,
) -> CapabilityMap {
    let mut supported = CapabilityMap::new();

    for dev in devices {
        if !spec.admits(dev, drivers) {
            continue;
        }

        let entries = eligible_algorithms(dev, spec);
        if entries.is_empty() {
            continue;
        }
        supported.insert(dev.id, entries);
    }

    supported
}

fn eligible_algorithms(dev: &DeviceDescriptor, spec: &BackendSpec) -> Vec<AlgorithmEntry> {
    let mut entries = spec.catalog(dev.vendor).to_vec();

    if spec.narrowing == CatalogNarrowing::SingleOnlyOnNaviAmd
        && dev.vendor == Vendor::Amd
        && is_navi_family(dev)
    {
        entries.retain(|entry| !entry.kind.is_dual());
    }

    filter_insufficient_memory(dev.memory_bytes, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{AlgorithmKind, AlgorithmTag};
    use crate::backend::{self, BackendId};
    use crate::device::test_support::{amd, nvidia};
    use crate::version::Version;

    const GIB: u64 = 1 << 30;

    fn current_drivers() -> InstalledDrivers {
        InstalledDrivers {
            nvidia: Some(Version::new(441, 22)),
            amd: None,
        }
    }

    fn kinds(entries: &[AlgorithmEntry]) -> Vec<AlgorithmKind> {
        entries.iter().map(|entry| entry.kind).collect()
    }

    #[test]
    fn gated_out_devices_are_absent_not_empty() {
        let spec = backend::find(BackendId::TeamRedMiner);
        let too_old = amd(1, "Radeon R9 290", "Hawaii", 4 * GIB);
        let polaris = amd(2, "Radeon RX 580", "Ellesmere", 8 * GIB);
        let devices = vec![too_old.clone(), polaris.clone()];

        let resolved = resolve(&devices, &spec, &InstalledDrivers::default());
        assert!(!resolved.contains_key(&too_old.id));
        assert!(resolved.contains_key(&polaris.id));
    }

    #[test]
    fn generation_gate_and_memory_filter_compose() {
        // One gen-2 card with 8 GB against a gen>=2 backend whose only
        // algorithm needs 3 GB, one gen-1 card with 2 GB: only the former
        // survives, and it keeps the algorithm.
        let mut spec = backend::find(BackendId::WildRig);
        spec.catalog_amd = vec![AlgorithmEntry::single(AlgorithmTag::DaggerHashimoto)];
        let gen2 = amd(1, "Radeon R9 290", "Hawaii", 8 * GIB);
        let gen1 = amd(2, "Radeon HD 7970", "Tahiti", 2 * GIB);
        let devices = vec![gen2.clone(), gen1.clone()];

        let resolved = resolve(&devices, &spec, &InstalledDrivers::default());
        assert_eq!(resolved.len(), 1);
        let entries = resolved.get(&gen2.id).expect("gen-2 card resolved");
        assert_eq!(
            kinds(entries),
            vec![AlgorithmKind::Single(AlgorithmTag::DaggerHashimoto)]
        );
    }

    #[test]
    fn driver_below_minimum_empties_the_result() {
        let spec = backend::find(BackendId::Ewbf);
        let devices = vec![nvidia(1, "GeForce RTX 2080 Ti", (7, 5), 11 * GIB)];

        let stale = InstalledDrivers {
            nvidia: Some(Version::new(388, 0)),
            amd: None,
        };
        assert!(resolve(&devices, &spec, &stale).is_empty());
        assert_eq!(resolve(&devices, &spec, &current_drivers()).len(), 1);
    }

    #[test]
    fn memory_starved_device_is_dropped_entirely() {
        // Every Ewbf entry needs more than 1 GB, so the device vanishes
        // from the map rather than appearing with an empty list.
        let spec = backend::find(BackendId::Ewbf);
        let devices = vec![nvidia(1, "GeForce GT 1030", (6, 1), 1 * GIB)];
        assert!(resolve(&devices, &spec, &current_drivers()).is_empty());
    }

    #[test]
    fn navi_narrowing_drops_dual_entries_only_there() {
        let spec = backend::find(BackendId::ClaymoreDual);
        let navi = amd(1, "Radeon RX 5700 XT", "gfx1010", 8 * GIB);
        let polaris = amd(2, "Radeon RX 580", "Ellesmere", 8 * GIB);
        let devices = vec![navi.clone(), polaris.clone()];

        let resolved = resolve(&devices, &spec, &InstalledDrivers::default());
        let navi_kinds = kinds(resolved.get(&navi.id).expect("navi resolved"));
        assert!(navi_kinds.iter().all(|kind| !kind.is_dual()));

        let polaris_kinds = kinds(resolved.get(&polaris.id).expect("polaris resolved"));
        assert!(polaris_kinds.iter().any(|kind| kind.is_dual()));
    }

    #[test]
    fn catalog_order_is_preserved() {
        let spec = backend::find(BackendId::TeamRedMiner);
        let dev = amd(1, "Radeon RX Vega 64", "Vega 10", 8 * GIB);
        let resolved = resolve(
            &[dev.clone()],
            &spec,
            &InstalledDrivers::default(),
        );

        let declared: Vec<AlgorithmKind> = spec
            .catalog(Vendor::Amd)
            .iter()
            .filter(|entry| entry.min_memory_bytes <= dev.memory_bytes)
            .map(|entry| entry.kind)
            .collect();
        assert_eq!(kinds(resolved.get(&dev.id).unwrap()), declared);
    }
}
