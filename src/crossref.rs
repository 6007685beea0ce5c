use std::collections::BTreeMap;

use serde::Serialize;

use crate::backend::FallbackGrouping;
use crate::device::{DeviceDescriptor, DeviceId};

/// Mapping from stable device id to the backend's own device index,
/// scoped to one backend and one process launch. Rebuilt on every
/// restart; never persisted.
pub type CrossRefMapping = BTreeMap<DeviceId, u32>;

/// The enumeration text formats observed across the registered backends.
/// One variant per dialect, dispatched by value; unrecognized lines are
/// skipped, so every parser tolerates banners and log noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationDialect {
    /// `GPU0: GeForce GTX 1070 8GB (pcie bus 5)`
    GpuPcieLines,
    /// `GPU #2: Ellesmere, PCI bus 7` with a trailing card summary
    HashIndexBusLines,
    /// `Device #0: GeForce GTX 1660 Ti` — no bus id in this format, so
    /// devices are matched by name substring instead
    DeviceOrdinalLines,
    /// `GPU 0 PCI 0000:07:00.0 GeForce GTX 1070 8 GB`
    PciSlotLines,
    /// `#0 Ellesmere 8GB (bus 3)`
    IndexedBusLines,
}

impl EnumerationDialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GpuPcieLines => "gpu-pcie-lines",
            Self::HashIndexBusLines => "hash-index-bus-lines",
            Self::DeviceOrdinalLines => "device-ordinal-lines",
            Self::PciSlotLines => "pci-slot-lines",
            Self::IndexedBusLines => "indexed-bus-lines",
        }
    }
}

/// Deterministic mapping by ascending PCIe bus id, starting at 0.
/// `VendorGrouped` backends number one vendor's devices before the
/// other's, each group in bus order.
pub fn fallback_mapping(
    devices: &[DeviceDescriptor],
    grouping: FallbackGrouping,
) -> CrossRefMapping {
    let mut ordered: Vec<&DeviceDescriptor> = devices.iter().collect();
    match grouping {
        FallbackGrouping::Interleaved => ordered.sort_by_key(|dev| dev.pcie_bus_id),
        FallbackGrouping::VendorGrouped(first) => {
            ordered.sort_by_key(|dev| (dev.vendor != first, dev.pcie_bus_id));
        }
    }

    ordered
        .iter()
        .enumerate()
        .map(|(index, dev)| (dev.id, index as u32))
        .collect()
}

/// Parses backend enumeration output into a (possibly partial) mapping.
/// Devices absent from the text keep no entry; the caller merges the
/// fallback for them. Pure and idempotent.
pub fn resolve_mapping(
    dialect: EnumerationDialect,
    text: &str,
    devices: &[DeviceDescriptor],
) -> CrossRefMapping {
    if devices.is_empty() {
        return CrossRefMapping::new();
    }

    match dialect {
        EnumerationDialect::GpuPcieLines => parse_gpu_pcie_lines(text, devices),
        EnumerationDialect::HashIndexBusLines => parse_hash_index_bus_lines(text, devices),
        EnumerationDialect::DeviceOrdinalLines => parse_device_ordinal_lines(text, devices),
        EnumerationDialect::PciSlotLines => parse_pci_slot_lines(text, devices),
        EnumerationDialect::IndexedBusLines => parse_indexed_bus_lines(text, devices),
    }
}

/// Completes a parsed mapping: every device gets its PCIe-fallback index
/// first, then parsed entries overwrite. Parsed indices are authoritative
/// for the devices the backend reported.
pub fn merge_with_fallback(
    parsed: CrossRefMapping,
    devices: &[DeviceDescriptor],
    grouping: FallbackGrouping,
) -> CrossRefMapping {
    let mut mapping = fallback_mapping(devices, grouping);
    for (id, index) in parsed {
        mapping.insert(id, index);
    }
    mapping
}

fn parse_gpu_pcie_lines(text: &str, devices: &[DeviceDescriptor]) -> CrossRefMapping {
    let mut mapping = CrossRefMapping::new();

    for line in text.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("GPU") else {
            continue;
        };
        let Some((index, rest)) = leading_number(rest) else {
            continue;
        };
        if !rest.starts_with(':') {
            continue;
        }
        let Some(bus) = number_after(rest, "pcie bus") else {
            continue;
        };
        insert_by_bus(&mut mapping, devices, bus, index);
    }

    mapping
}

fn parse_hash_index_bus_lines(text: &str, devices: &[DeviceDescriptor]) -> CrossRefMapping {
    let mut mapping = CrossRefMapping::new();

    for line in text.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("GPU #") else {
            continue;
        };
        let Some((index, rest)) = leading_number(rest) else {
            continue;
        };
        if !rest.starts_with(':') {
            continue;
        }
        let Some(bus) = number_after(rest, "PCI bus") else {
            continue;
        };
        insert_by_bus(&mut mapping, devices, bus, index);
    }

    mapping
}

/// The one dialect without bus ids: each reported line claims the first
/// still-unmapped device whose name appears in it.
fn parse_device_ordinal_lines(text: &str, devices: &[DeviceDescriptor]) -> CrossRefMapping {
    let mut mapping = CrossRefMapping::new();

    for line in text.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("Device #") else {
            continue;
        };
        let Some((index, rest)) = leading_number(rest) else {
            continue;
        };
        let Some(reported) = rest.strip_prefix(':') else {
            continue;
        };
        let reported = reported.trim().to_lowercase();
        if reported.is_empty() {
            continue;
        }

        let matched = devices.iter().find(|dev| {
            !mapping.contains_key(&dev.id) && reported.contains(&dev.name.to_lowercase())
        });
        if let Some(dev) = matched {
            mapping.insert(dev.id, index);
        }
    }

    mapping
}

fn parse_pci_slot_lines(text: &str, devices: &[DeviceDescriptor]) -> CrossRefMapping {
    let mut mapping = CrossRefMapping::new();

    for line in text.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("GPU ") else {
            continue;
        };
        let Some((index, rest)) = leading_number(rest) else {
            continue;
        };
        let Some(slot_start) = rest.find("PCI ") else {
            continue;
        };
        let slot = rest[slot_start + 4..]
            .split_whitespace()
            .next()
            .unwrap_or_default();
        let Some(bus) = bus_from_slot(slot) else {
            continue;
        };
        insert_by_bus(&mut mapping, devices, bus, index);
    }

    mapping
}

fn parse_indexed_bus_lines(text: &str, devices: &[DeviceDescriptor]) -> CrossRefMapping {
    let mut mapping = CrossRefMapping::new();

    for line in text.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('#') else {
            continue;
        };
        let Some((index, rest)) = leading_number(rest) else {
            continue;
        };
        let Some(bus) = number_after(rest, "(bus") else {
            continue;
        };
        insert_by_bus(&mut mapping, devices, bus, index);
    }

    mapping
}

fn insert_by_bus(
    mapping: &mut CrossRefMapping,
    devices: &[DeviceDescriptor],
    bus: u32,
    index: u32,
) {
    if let Some(dev) = devices.iter().find(|dev| dev.pcie_bus_id == bus) {
        mapping.insert(dev.id, index);
    }
}

/// Splits a leading decimal number off `s`.
fn leading_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// The first decimal number following `key`, skipping spaces and colons.
fn number_after(line: &str, key: &str) -> Option<u32> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start_matches([' ', ':']);
    leading_number(rest).map(|(value, _)| value)
}

/// Bus component of a PCI slot string, `bb:dd.f` or `dddd:bb:dd.f`,
/// hex as in sysfs.
fn bus_from_slot(slot: &str) -> Option<u32> {
    let mut parts: Vec<&str> = slot.split(':').collect();
    if parts.len() < 2 {
        return None;
    }
    parts.pop(); // dd.f
    let bus = parts.pop()?;
    u32::from_str_radix(bus, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::test_support::{amd, nvidia};
    use crate::device::Vendor;

    const GIB: u64 = 1 << 30;

    #[test]
    fn fallback_is_gapless_in_bus_order() {
        let devices = vec![
            nvidia(9, "GeForce GTX 1070", (6, 1), 8 * GIB),
            nvidia(2, "GeForce GTX 1080", (6, 1), 8 * GIB),
            nvidia(5, "GeForce GTX 1060", (6, 1), 6 * GIB),
        ];
        let mapping = fallback_mapping(&devices, FallbackGrouping::Interleaved);

        assert_eq!(mapping[&devices[1].id], 0); // bus 2
        assert_eq!(mapping[&devices[2].id], 1); // bus 5
        assert_eq!(mapping[&devices[0].id], 2); // bus 9

        let mut indices: Vec<u32> = mapping.values().copied().collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn vendor_grouped_fallback_numbers_one_vendor_first() {
        // AMD on buses 4 and 8, Nvidia on buses 2 and 6: AMD-first
        // grouping ignores the interleaved slot order.
        let devices = vec![
            nvidia(2, "GeForce GTX 1070", (6, 1), 8 * GIB),
            amd(4, "Radeon RX 580", "Ellesmere", 8 * GIB),
            nvidia(6, "GeForce GTX 1080", (6, 1), 8 * GIB),
            amd(8, "Radeon RX Vega 56", "Vega 10", 8 * GIB),
        ];
        let mapping = fallback_mapping(&devices, FallbackGrouping::VendorGrouped(Vendor::Amd));

        assert_eq!(mapping[&devices[1].id], 0);
        assert_eq!(mapping[&devices[3].id], 1);
        assert_eq!(mapping[&devices[0].id], 2);
        assert_eq!(mapping[&devices[2].id], 3);
    }

    #[test]
    fn gpu_pcie_lines_match_by_bus_and_skip_noise() {
        let devices = vec![
            nvidia(5, "GeForce GTX 1070", (6, 1), 8 * GIB),
            nvidia(7, "GeForce GTX 1080", (6, 1), 8 * GIB),
        ];
        let text = "\
miner 1.66
GPU0: GeForce GTX 1080 8GB (pcie bus 7)
intensity: auto
GPU1: GeForce GTX 1070 8GB (pcie bus 5)
";
        let mapping = resolve_mapping(EnumerationDialect::GpuPcieLines, text, &devices);
        assert_eq!(mapping[&devices[1].id], 0);
        assert_eq!(mapping[&devices[0].id], 1);
    }

    #[test]
    fn hash_index_bus_lines_ignore_summary() {
        let devices = vec![
            amd(3, "Radeon RX 580", "Ellesmere", 8 * GIB),
            nvidia(7, "GeForce GTX 1070", (6, 1), 8 * GIB),
        ];
        let text = "\
GPU #0: Ellesmere, PCI bus 3, 8192 MB available
GPU #1: GeForce GTX 1070, PCI bus 7, 8192 MB available
Total cards: 2
";
        let mapping = resolve_mapping(EnumerationDialect::HashIndexBusLines, text, &devices);
        assert_eq!(mapping[&devices[0].id], 0);
        assert_eq!(mapping[&devices[1].id], 1);
    }

    #[test]
    fn device_ordinal_lines_match_by_name_once_each() {
        let devices = vec![
            nvidia(2, "GeForce GTX 1660 Ti", (7, 5), 6 * GIB),
            nvidia(4, "GeForce GTX 1660 Ti", (7, 5), 6 * GIB),
        ];
        let text = "\
Checking CUDA devices...
Device #0: GeForce GTX 1660 Ti 6GB
Device #1: GeForce GTX 1660 Ti 6GB
";
        let mapping = resolve_mapping(EnumerationDialect::DeviceOrdinalLines, text, &devices);
        // Identical names resolve positionally: one entry per card.
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[&devices[0].id], 0);
        assert_eq!(mapping[&devices[1].id], 1);
    }

    #[test]
    fn pci_slot_lines_parse_hex_bus() {
        let devices = vec![nvidia(0x0b, "GeForce GTX 1070", (6, 1), 8 * GIB)];
        let text = "GPU 0 PCI 0000:0b:00.0 GeForce GTX 1070 8 GB\n";
        let mapping = resolve_mapping(EnumerationDialect::PciSlotLines, text, &devices);
        assert_eq!(mapping[&devices[0].id], 0);
    }

    #[test]
    fn indexed_bus_lines_parse() {
        let devices = vec![
            amd(3, "Radeon RX 580", "Ellesmere", 8 * GIB),
            amd(6, "Radeon RX 570", "Ellesmere", 4 * GIB),
        ];
        let text = "\
wildrig-multi 0.18
#0 Ellesmere 8GB (bus 3)
#1 Ellesmere 4GB (bus 6)
";
        let mapping = resolve_mapping(EnumerationDialect::IndexedBusLines, text, &devices);
        assert_eq!(mapping[&devices[0].id], 0);
        assert_eq!(mapping[&devices[1].id], 1);
    }

    #[test]
    fn resolve_mapping_is_idempotent() {
        let devices = vec![
            nvidia(5, "GeForce GTX 1070", (6, 1), 8 * GIB),
            nvidia(7, "GeForce GTX 1080", (6, 1), 8 * GIB),
        ];
        let text = "GPU0: GeForce GTX 1080 8GB (pcie bus 7)\n";
        let first = resolve_mapping(EnumerationDialect::GpuPcieLines, text, &devices);
        let second = resolve_mapping(EnumerationDialect::GpuPcieLines, text, &devices);
        assert_eq!(first, second);
    }

    #[test]
    fn partial_parse_plus_fallback_covers_every_device() {
        let devices = vec![
            nvidia(5, "GeForce GTX 1070", (6, 1), 8 * GIB),
            nvidia(7, "GeForce GTX 1080", (6, 1), 8 * GIB),
        ];
        // Only one of two devices appears in the captured text.
        let text = "GPU0: GeForce GTX 1070 8GB (pcie bus 5)\n";
        let parsed = resolve_mapping(EnumerationDialect::GpuPcieLines, text, &devices);
        assert_eq!(parsed.len(), 1);

        let merged = merge_with_fallback(parsed, &devices, FallbackGrouping::Interleaved);
        assert_eq!(merged.len(), 2);

        let mut indices: Vec<u32> = merged.values().copied().collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 2, "indices must not collide");
    }

    #[test]
    fn empty_device_set_resolves_to_nothing() {
        let text = "GPU0: GeForce GTX 1070 8GB (pcie bus 5)\n";
        let mapping = resolve_mapping(EnumerationDialect::GpuPcieLines, text, &[]);
        assert!(mapping.is_empty());
    }
}
