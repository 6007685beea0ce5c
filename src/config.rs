use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

use crate::backend::{backend_names, BackendId};
use crate::version::Version;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Resolve device/algorithm capabilities across backends.
    Resolve,
    /// Build the device-id to backend-index cross-reference for one backend.
    Map,
    /// Evaluate the rebenchmark policy over stored benchmark records.
    Rebench,
    /// List the registered backend specifications.
    Backends,
    Help,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Map => "map",
            Self::Rebench => "rebench",
            Self::Backends => "backends",
            Self::Help => "help",
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub action: Action,
    pub devices_path: Option<PathBuf>,
    pub backend: Option<BackendId>,
    pub nvidia_driver: Option<Version>,
    pub amd_driver: Option<Version>,
    pub capture_path: Option<PathBuf>,
    pub probe_exe: Option<PathBuf>,
    pub probe_timeout: Duration,
    pub records_path: Option<PathBuf>,
    pub installed_version: Option<String>,
    pub json_path: Option<PathBuf>,
}

impl Config {
    pub fn parse() -> Result<Self> {
        Self::parse_from(std::env::args().skip(1).collect())
    }

    fn parse_from(args: Vec<String>) -> Result<Self> {
        let mut action = None;
        let mut devices_path = None;
        let mut backend = None;
        let mut nvidia_driver = None;
        let mut amd_driver = None;
        let mut capture_path = None;
        let mut probe_exe = None;
        let mut probe_timeout = DEFAULT_PROBE_TIMEOUT;
        let mut records_path = None;
        let mut installed_version = None;
        let mut json_path = None;

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "resolve" if action.is_none() => action = Some(Action::Resolve),
                "map" if action.is_none() => action = Some(Action::Map),
                "rebench" if action.is_none() => action = Some(Action::Rebench),
                "backends" if action.is_none() => action = Some(Action::Backends),
                "help" | "--help" | "-h" => return Ok(Self::help()),
                "--devices" => {
                    devices_path = Some(PathBuf::from(required_value(&arg, &mut iter)?));
                }
                "--backend" => {
                    backend = Some(BackendId::parse(&required_value(&arg, &mut iter)?)?);
                }
                "--nvidia-driver" => {
                    nvidia_driver = Some(parse_version(&arg, &required_value(&arg, &mut iter)?)?);
                }
                "--amd-driver" => {
                    amd_driver = Some(parse_version(&arg, &required_value(&arg, &mut iter)?)?);
                }
                "--capture" => {
                    capture_path = Some(PathBuf::from(required_value(&arg, &mut iter)?));
                }
                "--exec" => {
                    probe_exe = Some(PathBuf::from(required_value(&arg, &mut iter)?));
                }
                "--probe-timeout" => {
                    let raw = required_value(&arg, &mut iter)?;
                    let secs: u64 = raw
                        .parse()
                        .map_err(|_| anyhow!("invalid {arg} value '{raw}': expected seconds"))?;
                    probe_timeout = Duration::from_secs(secs.max(1));
                }
                "--records" => {
                    records_path = Some(PathBuf::from(required_value(&arg, &mut iter)?));
                }
                "--installed" => {
                    installed_version = Some(required_value(&arg, &mut iter)?);
                }
                "--json" => {
                    json_path = Some(PathBuf::from(required_value(&arg, &mut iter)?));
                }
                other => bail!("unknown argument '{other}'; run 'flotilla help' for usage"),
            }
        }

        let Some(action) = action else {
            return Ok(Self::help());
        };

        let cfg = Self {
            action,
            devices_path,
            backend,
            nvidia_driver,
            amd_driver,
            capture_path,
            probe_exe,
            probe_timeout,
            records_path,
            installed_version,
            json_path,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn help() -> Self {
        Self {
            action: Action::Help,
            devices_path: None,
            backend: None,
            nvidia_driver: None,
            amd_driver: None,
            capture_path: None,
            probe_exe: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            records_path: None,
            installed_version: None,
            json_path: None,
        }
    }

    fn validate(&self) -> Result<()> {
        match self.action {
            Action::Resolve => {
                if self.devices_path.is_none() {
                    bail!("resolve requires --devices <inventory.json>");
                }
            }
            Action::Map => {
                if self.devices_path.is_none() {
                    bail!("map requires --devices <inventory.json>");
                }
                if self.backend.is_none() {
                    bail!("map requires --backend <name> ({})", backend_names());
                }
                if self.capture_path.is_some() && self.probe_exe.is_some() {
                    bail!("--capture and --exec are mutually exclusive");
                }
            }
            Action::Rebench => {
                if self.devices_path.is_none() {
                    bail!("rebench requires --devices <inventory.json>");
                }
                if self.backend.is_none() {
                    bail!("rebench requires --backend <name> ({})", backend_names());
                }
                if self.records_path.is_none() {
                    bail!("rebench requires --records <records.json>");
                }
                if self.installed_version.is_none() {
                    bail!("rebench requires --installed <version>");
                }
            }
            Action::Backends | Action::Help => {}
        }
        Ok(())
    }
}

fn required_value(flag: &str, iter: &mut impl Iterator<Item = String>) -> Result<String> {
    iter.next()
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn parse_version(flag: &str, raw: &str) -> Result<Version> {
    Version::parse(raw)
        .ok_or_else(|| anyhow!("invalid {flag} value '{raw}': expected a dotted version"))
}

pub fn print_usage() {
    println!("usage: flotilla <action> [options]");
    println!();
    println!("actions:");
    println!("  resolve    resolve device/algorithm capabilities per backend");
    println!("  map        build a device-id to backend-index mapping");
    println!("  rebench    evaluate the rebenchmark policy over stored records");
    println!("  backends   list registered backend specifications");
    println!("  help       print this message");
    println!();
    println!("options:");
    println!("  --devices <path>         device inventory JSON (resolve, map, rebench)");
    println!("  --backend <name>         backend to operate on ({})", backend_names());
    println!("  --nvidia-driver <ver>    installed Nvidia driver version, e.g. 441.22");
    println!("  --amd-driver <ver>       installed AMD driver version");
    println!("  --capture <path>         previously captured enumeration text (map)");
    println!("  --exec <path>            backend executable to probe for enumeration (map)");
    println!("  --probe-timeout <secs>   probe capture timeout, default 30");
    println!("  --records <path>         benchmark records JSON (rebench)");
    println!("  --installed <ver>        installed backend version (rebench)");
    println!("  --json <path>            also write the report as JSON");
}
