use crate::device::{ComputeTier, DeviceDescriptor, Vendor};
use crate::version::Version;

/// Installed driver versions, one global value per vendor. All devices of
/// a vendor share one driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstalledDrivers {
    pub nvidia: Option<Version>,
    pub amd: Option<Version>,
}

impl InstalledDrivers {
    fn for_vendor(&self, vendor: Vendor) -> Option<Version> {
        match vendor {
            Vendor::Nvidia => self.nvidia,
            Vendor::Amd => self.amd,
        }
    }
}

/// CUDA toolkit releases a backend may be linked against. Each release
/// carries the minimum driver version that can load it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CudaToolkit {
    Cuda10_0,
    Cuda10_1,
}

impl CudaToolkit {
    pub fn min_driver(self) -> Version {
        match self {
            Self::Cuda10_0 => Version::new(411, 31),
            Self::Cuda10_1 => Version::new(418, 96),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverRequirement {
    None,
    MinimumDriver(Version),
    Toolkit(CudaToolkit),
}

impl DriverRequirement {
    pub fn satisfied_by(self, installed: Option<Version>) -> bool {
        let floor = match self {
            Self::None => return true,
            Self::MinimumDriver(floor) => floor,
            Self::Toolkit(toolkit) => toolkit.min_driver(),
        };
        match installed {
            Some(installed) => installed >= floor,
            // Unknown driver version cannot prove the floor is met.
            None => false,
        }
    }
}

/// One admission rule for a vendor's devices. A backend declares one gate
/// per vendor it supports; a device passes if the gate for its vendor
/// passes in full.
#[derive(Debug, Clone, Copy)]
pub struct VendorGate {
    pub vendor: Vendor,
    pub min_compute: Option<ComputeTier>,
    pub min_gcn_generation: Option<u32>,
    pub driver: DriverRequirement,
}

impl VendorGate {
    pub const fn for_vendor(vendor: Vendor) -> Self {
        Self {
            vendor,
            min_compute: None,
            min_gcn_generation: None,
            driver: DriverRequirement::None,
        }
    }

    pub const fn with_min_compute(mut self, major: u32, minor: u32) -> Self {
        self.min_compute = Some(ComputeTier::new(major, minor));
        self
    }

    pub const fn with_min_gcn_generation(mut self, generation: u32) -> Self {
        self.min_gcn_generation = Some(generation);
        self
    }

    pub const fn with_driver(mut self, driver: DriverRequirement) -> Self {
        self.driver = driver;
        self
    }

    pub fn admits(&self, dev: &DeviceDescriptor, drivers: &InstalledDrivers) -> bool {
        if dev.vendor != self.vendor {
            return false;
        }
        if let Some(floor) = self.min_compute {
            if dev.compute_tier < floor {
                return false;
            }
        }
        if let Some(floor) = self.min_gcn_generation {
            if gcn_generation(dev) < floor {
                return false;
            }
        }
        self.driver.satisfied_by(drivers.for_vendor(self.vendor))
    }
}

/// Silicon families per GCN generation, matched as lowercase substrings
/// against the device codename and marketing name.
///
/// Substring matching is a known precision gap: silicon with an
/// unanticipated identifier classifies as generation 0 and fails every
/// minimum-generation gate.
const GENERATION_FAMILIES: &[(&[&str], u32)] = &[
    (&["navi", "gfx10"], 6),
    (&["vega", "gfx9"], 5),
    // gfx803/gfx804 must match before the generic gfx8 family below.
    (&["polaris", "ellesmere", "baffin", "lexa", "gfx803", "gfx804"], 4),
    (&["tonga", "fiji", "gfx8"], 3),
    (&["hawaii", "bonaire", "gfx7"], 2),
    (&["tahiti", "pitcairn", "cape verde", "oland", "gfx6"], 1),
];

/// Derives a coarse GCN generation number from the device's reported
/// architecture identifiers. Unrecognized identifiers return 0.
pub fn gcn_generation(dev: &DeviceDescriptor) -> u32 {
    let codename = dev.codename.to_lowercase();
    let name = dev.name.to_lowercase();

    for (patterns, generation) in GENERATION_FAMILIES {
        for pattern in *patterns {
            if codename.contains(pattern) || name.contains(pattern) {
                return *generation;
            }
        }
    }
    0
}

/// True for the RDNA family the dual-catalog narrowing keys on.
pub fn is_navi_family(dev: &DeviceDescriptor) -> bool {
    dev.codename.to_lowercase().contains("gfx10") || dev.name.to_lowercase().contains("navi")
}
