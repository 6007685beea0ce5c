mod algorithm;
mod backend;
mod config;
mod crossref;
mod device;
mod gates;
mod memory;
mod probe;
mod rebench;
mod resolve;
mod ui;
mod version;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use algorithm::AlgorithmEntry;
use backend::{BackendId, BackendSpec, DeviceIndexing};
use config::{Action, Config};
use crossref::EnumerationDialect;
use device::{DeviceDescriptor, DeviceId};
use gates::InstalledDrivers;
use ui::{info, success, warn};

fn main() {
    if let Err(err) = run() {
        ui::error("FATAL", format!("{err:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cfg = Config::parse()?;
    if cfg.action == Action::Help {
        config::print_usage();
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })?;
    }

    ui::startup_banner(
        "flotilla",
        "fleet capability & cross-reference resolver",
        &[
            ("action", cfg.action.as_str().to_string()),
            ("backends", backend::backend_names()),
        ],
    );

    match cfg.action {
        Action::Resolve => run_resolve(&cfg),
        Action::Map => run_map(&cfg, &shutdown),
        Action::Rebench => run_rebench(&cfg),
        Action::Backends => run_backends(),
        Action::Help => Ok(()),
    }
}

fn load_devices(cfg: &Config) -> Result<Vec<DeviceDescriptor>> {
    let path = cfg
        .devices_path
        .as_deref()
        .context("missing device inventory path")?;
    let devices = device::load_inventory(path)?;
    info(
        "FLEET",
        format!("{} device(s) in inventory {}", devices.len(), path.display()),
    );
    Ok(devices)
}

fn installed_drivers(cfg: &Config) -> InstalledDrivers {
    InstalledDrivers {
        nvidia: cfg.nvidia_driver,
        amd: cfg.amd_driver,
    }
}

fn selected_backends(cfg: &Config) -> Vec<BackendSpec> {
    match cfg.backend {
        Some(id) => vec![backend::find(id)],
        None => backend::registry(),
    }
}

#[derive(Serialize)]
struct ResolveReport {
    nvidia_driver: Option<String>,
    amd_driver: Option<String>,
    backends: Vec<BackendResolution>,
}

#[derive(Serialize)]
struct BackendResolution {
    backend: BackendId,
    devices: Vec<DeviceResolution>,
}

#[derive(Serialize)]
struct DeviceResolution {
    device_id: DeviceId,
    device_name: String,
    pcie_bus_id: u32,
    algorithms: Vec<AlgorithmEntry>,
}

fn run_resolve(cfg: &Config) -> Result<()> {
    let devices = load_devices(cfg)?;
    let drivers = installed_drivers(cfg);
    let mut report = ResolveReport {
        nvidia_driver: drivers.nvidia.map(|v| v.to_string()),
        amd_driver: drivers.amd.map(|v| v.to_string()),
        backends: Vec::new(),
    };

    for spec in selected_backends(cfg) {
        let resolved = resolve::resolve(&devices, &spec, &drivers);
        if resolved.is_empty() {
            info(
                "RESOLVE",
                format!("{}: no eligible devices", spec.id.as_str()),
            );
        }

        let mut rows = Vec::new();
        for dev in &devices {
            let Some(entries) = resolved.get(&dev.id) else {
                continue;
            };
            info(
                "RESOLVE",
                format!(
                    "{}: {} (bus {}, {}) -> {}",
                    spec.id.as_str(),
                    dev.name,
                    dev.pcie_bus_id,
                    format_memory(dev.memory_bytes),
                    describe_entries(entries),
                ),
            );
            rows.push(DeviceResolution {
                device_id: dev.id,
                device_name: dev.name.clone(),
                pcie_bus_id: dev.pcie_bus_id,
                algorithms: entries.clone(),
            });
        }
        report.backends.push(BackendResolution {
            backend: spec.id,
            devices: rows,
        });
    }

    write_json(cfg.json_path.as_deref(), &report)
}

#[derive(Serialize)]
struct MapReport {
    backend: BackendId,
    dialect: EnumerationDialect,
    source: &'static str,
    entries: Vec<MapEntry>,
}

#[derive(Serialize)]
struct MapEntry {
    device_id: DeviceId,
    device_name: String,
    pcie_bus_id: u32,
    index: u32,
    from_enumeration: bool,
}

fn run_map(cfg: &Config, shutdown: &AtomicBool) -> Result<()> {
    let devices = load_devices(cfg)?;
    let drivers = installed_drivers(cfg);
    let backend_id = cfg.backend.context("missing backend")?;
    let spec = backend::find(backend_id);

    let DeviceIndexing::Indexed {
        dialect,
        grouping,
        probe,
    } = spec.indexing
    else {
        info(
            "XREF",
            format!(
                "{} takes no device index arguments; nothing to map",
                spec.id.as_str()
            ),
        );
        return Ok(());
    };

    // Only devices the backend will actually drive need an index.
    let resolved = resolve::resolve(&devices, &spec, &drivers);
    let mapped_devices: Vec<DeviceDescriptor> = devices
        .iter()
        .filter(|dev| resolved.contains_key(&dev.id))
        .cloned()
        .collect();
    if mapped_devices.is_empty() {
        info("XREF", "no eligible devices require mapping");
        return Ok(());
    }

    let (text, source) = if let Some(path) = &cfg.capture_path {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read captured enumeration {}", path.display()))?;
        (text, "capture-file")
    } else if let Some(exe) = &cfg.probe_exe {
        info(
            "PROBE",
            format!("running {} {}", exe.display(), probe.args.join(" ")),
        );
        match probe::capture_enumeration(exe, &probe, cfg.probe_timeout, shutdown) {
            Ok(text) if !text.trim().is_empty() => (text, "probe"),
            Ok(_) => {
                warn(
                    "PROBE",
                    "enumeration produced no output; using PCIe-order fallback",
                );
                (String::new(), "fallback")
            }
            Err(err) => {
                warn(
                    "PROBE",
                    format!("enumeration failed: {err:#}; using PCIe-order fallback"),
                );
                (String::new(), "fallback")
            }
        }
    } else {
        info(
            "XREF",
            "no enumeration text supplied; using PCIe-order fallback",
        );
        (String::new(), "fallback")
    };

    let parsed = crossref::resolve_mapping(dialect, &text, &mapped_devices);
    if !text.is_empty() {
        let missing = mapped_devices.len() - parsed.len();
        if missing > 0 {
            warn(
                "XREF",
                format!(
                    "{missing} device(s) absent from enumeration output; PCIe-order fallback applies to them"
                ),
            );
        }
    }

    let mapping = crossref::merge_with_fallback(parsed.clone(), &mapped_devices, grouping);

    let mut entries: Vec<MapEntry> = mapped_devices
        .iter()
        .map(|dev| MapEntry {
            device_id: dev.id,
            device_name: dev.name.clone(),
            pcie_bus_id: dev.pcie_bus_id,
            index: mapping[&dev.id],
            from_enumeration: parsed.contains_key(&dev.id),
        })
        .collect();
    entries.sort_by_key(|entry| entry.index);

    for entry in &entries {
        let origin = if entry.from_enumeration {
            "enumeration"
        } else {
            "pcie-fallback"
        };
        success(
            "XREF",
            format!(
                "index {:>2} -> {} (bus {}, {origin})",
                entry.index, entry.device_name, entry.pcie_bus_id
            ),
        );
    }

    let report = MapReport {
        backend: spec.id,
        dialect,
        source,
        entries,
    };
    write_json(cfg.json_path.as_deref(), &report)
}

#[derive(Serialize)]
struct RebenchReport {
    backend: BackendId,
    installed_version: String,
    decisions: Vec<RebenchEntry>,
}

#[derive(Serialize)]
struct RebenchEntry {
    device_id: DeviceId,
    device_name: String,
    algorithm: String,
    benchmarked_version: String,
    throughput_hps: f64,
    force_rebenchmark: bool,
}

fn run_rebench(cfg: &Config) -> Result<()> {
    let devices = load_devices(cfg)?;
    let backend_id = cfg.backend.context("missing backend")?;
    let spec = backend::find(backend_id);
    let records_path = cfg.records_path.as_deref().context("missing records path")?;
    let installed = cfg
        .installed_version
        .as_deref()
        .context("missing installed version")?;

    let records = rebench::load_records(records_path)?;
    let by_id: BTreeMap<DeviceId, &DeviceDescriptor> =
        devices.iter().map(|dev| (dev.id, dev)).collect();

    let mut decisions = Vec::new();
    let mut forced = 0usize;

    for record in records.iter().filter(|r| r.backend_id == spec.id) {
        let Some(dev) = by_id.get(&record.device_id) else {
            warn(
                "BENCH",
                format!("record for unknown device {}; skipping", record.device_id),
            );
            continue;
        };

        let decision = rebench::must_rebenchmark(
            &spec.rebench_rules,
            &record.backend_version,
            installed,
            dev.vendor,
            record.kind,
        );
        if let Some(diagnostic) = &decision.diagnostic {
            warn("BENCH", diagnostic);
        }

        let verdict = if decision.force { "rebenchmark" } else { "keep" };
        info(
            "BENCH",
            format!(
                "{} at {} on {} (measured on {}) -> {verdict}",
                record.kind.label(),
                format_hashrate(record.throughput_hps),
                dev.name,
                record.backend_version,
            ),
        );

        if decision.force {
            forced += 1;
        }
        decisions.push(RebenchEntry {
            device_id: record.device_id,
            device_name: dev.name.clone(),
            algorithm: record.kind.label(),
            benchmarked_version: record.backend_version.clone(),
            throughput_hps: record.throughput_hps,
            force_rebenchmark: decision.force,
        });
    }

    success(
        "BENCH",
        format!(
            "{forced} of {} record(s) need rebenchmarking on {}",
            decisions.len(),
            installed
        ),
    );

    let report = RebenchReport {
        backend: spec.id,
        installed_version: installed.to_string(),
        decisions,
    };
    write_json(cfg.json_path.as_deref(), &report)
}

fn run_backends() -> Result<()> {
    for spec in backend::registry() {
        let vendors = spec
            .gates
            .iter()
            .map(|gate| gate.vendor.as_str())
            .collect::<Vec<_>>()
            .join("+");
        let enumeration = match spec.indexing {
            DeviceIndexing::NotRequired => "none",
            DeviceIndexing::Indexed { dialect, .. } => dialect.as_str(),
        };
        let algorithms = spec.catalog_nvidia.len() + spec.catalog_amd.len();
        info(
            "BACKEND",
            format!(
                "{:<14} vendors={:<13} algorithms={:<2} enumeration={}",
                spec.id.as_str(),
                vendors,
                algorithms,
                enumeration
            ),
        );
    }
    Ok(())
}

fn describe_entries(entries: &[AlgorithmEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            if entry.enabled_by_default {
                entry.kind.label()
            } else {
                format!("{}(off)", entry.kind.label())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_json<T: Serialize>(path: Option<&Path>, report: &T) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))?;
    success("REPORT", format!("wrote report to {}", path.display()));
    Ok(())
}

fn format_memory(bytes: u64) -> String {
    const GIB: f64 = (1u64 << 30) as f64;
    const MIB: f64 = (1u64 << 20) as f64;
    let bytes = bytes as f64;
    if bytes >= GIB {
        format!("{:.1} GiB", bytes / GIB)
    } else {
        format!("{:.0} MiB", bytes / MIB)
    }
}

fn format_hashrate(hps: f64) -> String {
    if hps >= 1_000_000_000.0 {
        return format!("{:.3} GH/s", hps / 1_000_000_000.0);
    }
    if hps >= 1_000_000.0 {
        return format!("{:.3} MH/s", hps / 1_000_000.0);
    }
    if hps >= 1_000.0 {
        return format!("{:.3} KH/s", hps / 1_000.0);
    }
    format!("{hps:.3} H/s")
}
