use serde::{Deserialize, Serialize};

const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;

/// Hashing algorithms appearing in at least one backend catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmTag {
    DaggerHashimoto,
    Decred,
    Blake2s,
    Keccak,
    ZHash,
    Beam,
    BeamV2,
    CuckooCycle,
    GrinCuckarood29,
    GrinCuckatoo31,
    CryptoNightR,
    Lyra2Rev3,
    Lyra2Z,
    X16R,
    X16Rv2,
    Mtp,
}

impl AlgorithmTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DaggerHashimoto => "daggerhashimoto",
            Self::Decred => "decred",
            Self::Blake2s => "blake2s",
            Self::Keccak => "keccak",
            Self::ZHash => "zhash",
            Self::Beam => "beam",
            Self::BeamV2 => "beamv2",
            Self::CuckooCycle => "cuckoocycle",
            Self::GrinCuckarood29 => "grincuckarood29",
            Self::GrinCuckatoo31 => "grincuckatoo31",
            Self::CryptoNightR => "cryptonightr",
            Self::Lyra2Rev3 => "lyra2rev3",
            Self::Lyra2Z => "lyra2z",
            Self::X16R => "x16r",
            Self::X16Rv2 => "x16rv2",
            Self::Mtp => "mtp",
        }
    }

    /// Estimated working-set footprint on the device. Core-bound
    /// algorithms with negligible buffers are listed as zero.
    pub fn min_memory_bytes(self) -> u64 {
        match self {
            Self::DaggerHashimoto => 3 * GIB,
            Self::ZHash => 1792 * MIB,
            Self::Beam | Self::BeamV2 => 2970 * MIB,
            Self::CuckooCycle | Self::GrinCuckarood29 => 5734 * MIB,
            Self::GrinCuckatoo31 => 7578 * MIB,
            Self::CryptoNightR => 2 * GIB,
            Self::Mtp => 4403 * MIB,
            Self::Decred
            | Self::Blake2s
            | Self::Keccak
            | Self::Lyra2Rev3
            | Self::Lyra2Z
            | Self::X16R
            | Self::X16Rv2 => 0,
        }
    }
}

/// A single algorithm, or an ordered dual-mining pair run simultaneously
/// on one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    Single(AlgorithmTag),
    Dual(AlgorithmTag, AlgorithmTag),
}

impl AlgorithmKind {
    pub fn is_dual(self) -> bool {
        matches!(self, Self::Dual(..))
    }

    /// A dual job keeps both working sets resident, so it is charged the
    /// sum of its components.
    pub fn min_memory_bytes(self) -> u64 {
        match self {
            Self::Single(tag) => tag.min_memory_bytes(),
            Self::Dual(primary, secondary) => {
                primary.min_memory_bytes() + secondary.min_memory_bytes()
            }
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Single(tag) => tag.as_str().to_string(),
            Self::Dual(primary, secondary) => {
                format!("{}+{}", primary.as_str(), secondary.as_str())
            }
        }
    }
}

/// One catalog entry of a backend: what to run, whether it is offered by
/// default, and the opaque launch parameters handed through to the
/// external process.
#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmEntry {
    pub kind: AlgorithmKind,
    pub enabled_by_default: bool,
    pub extra_parameters: &'static str,
    pub min_memory_bytes: u64,
}

impl AlgorithmEntry {
    pub fn new(kind: AlgorithmKind) -> Self {
        Self {
            kind,
            enabled_by_default: true,
            extra_parameters: "",
            min_memory_bytes: kind.min_memory_bytes(),
        }
    }

    pub fn single(tag: AlgorithmTag) -> Self {
        Self::new(AlgorithmKind::Single(tag))
    }

    pub fn dual(primary: AlgorithmTag, secondary: AlgorithmTag) -> Self {
        Self::new(AlgorithmKind::Dual(primary, secondary))
    }

    pub fn disabled(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    pub fn with_extra_parameters(mut self, extra_parameters: &'static str) -> Self {
        self.extra_parameters = extra_parameters;
        self
    }
}
