use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable device identity, assigned once per physical card for the
/// lifetime of the host process. Never reused.
pub type DeviceId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    Nvidia,
    Amd,
}

impl Vendor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nvidia => "nvidia",
            Self::Amd => "amd",
        }
    }
}

/// CUDA compute capability as reported by the driver, ordered
/// lexicographically on (major, minor). Zero for non-CUDA devices.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ComputeTier {
    pub major: u32,
    pub minor: u32,
}

impl ComputeTier {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

/// Vendor-neutral view of one physical GPU as supplied by the
/// device-discovery collaborator at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub vendor: Vendor,
    pub name: String,
    /// Architecture codename (e.g. `Ellesmere`, `gfx1010`). Free text,
    /// consumed only by generation pattern-matching.
    #[serde(default)]
    pub codename: String,
    #[serde(default)]
    pub compute_tier: ComputeTier,
    pub pcie_bus_id: u32,
    pub memory_bytes: u64,
}

/// Loads a device inventory from a JSON array and validates its
/// identity invariants.
pub fn load_inventory(path: &Path) -> Result<Vec<DeviceDescriptor>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read device inventory {}", path.display()))?;
    let devices: Vec<DeviceDescriptor> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse device inventory {}", path.display()))?;
    validate_inventory(&devices)?;
    Ok(devices)
}

/// Device ids must be unique across the set; PCIe bus ids must be unique
/// across devices of any vendor at a point in time.
pub fn validate_inventory(devices: &[DeviceDescriptor]) -> Result<()> {
    let mut seen_ids = BTreeSet::new();
    let mut seen_buses = BTreeSet::new();

    for dev in devices {
        if !seen_ids.insert(dev.id) {
            bail!("duplicate device id {} in inventory", dev.id);
        }
        if !seen_buses.insert(dev.pcie_bus_id) {
            bail!(
                "duplicate PCIe bus id {} in inventory (device {})",
                dev.pcie_bus_id,
                dev.id
            );
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn nvidia(bus: u32, name: &str, tier: (u32, u32), memory_bytes: u64) -> DeviceDescriptor {
        DeviceDescriptor {
            id: Uuid::new_v4(),
            vendor: Vendor::Nvidia,
            name: name.to_string(),
            codename: String::new(),
            compute_tier: ComputeTier::new(tier.0, tier.1),
            pcie_bus_id: bus,
            memory_bytes,
        }
    }

    pub fn amd(bus: u32, name: &str, codename: &str, memory_bytes: u64) -> DeviceDescriptor {
        DeviceDescriptor {
            id: Uuid::new_v4(),
            vendor: Vendor::Amd,
            name: name.to_string(),
            codename: codename.to_string(),
            compute_tier: ComputeTier::default(),
            pcie_bus_id: bus,
            memory_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{amd, nvidia};
    use super::*;

    const GIB: u64 = 1 << 30;

    #[test]
    fn accepts_distinct_devices() {
        let devices = vec![
            nvidia(1, "GeForce GTX 1070", (6, 1), 8 * GIB),
            amd(3, "Radeon RX 580", "Ellesmere", 8 * GIB),
        ];
        assert!(validate_inventory(&devices).is_ok());
    }

    #[test]
    fn rejects_duplicate_device_id() {
        let mut devices = vec![nvidia(1, "GeForce GTX 1070", (6, 1), 8 * GIB)];
        let mut dup = devices[0].clone();
        dup.pcie_bus_id = 2;
        devices.push(dup);
        assert!(validate_inventory(&devices).is_err());
    }

    #[test]
    fn rejects_duplicate_bus_id_across_vendors() {
        let devices = vec![
            nvidia(5, "GeForce GTX 1070", (6, 1), 8 * GIB),
            amd(5, "Radeon RX 580", "Ellesmere", 8 * GIB),
        ];
        assert!(validate_inventory(&devices).is_err());
    }
}
