use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};

use crate::backend::ProbeCommand;

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Runs a backend executable with its enumeration arguments and captures
/// output line by line until a termination marker appears, the line cap
/// is reached, the timeout expires, or shutdown is requested. The child
/// is killed on every exit path.
///
/// A timeout or shutdown is not an error: whatever text was captured so
/// far is returned, and an empty capture simply means the caller falls
/// back to PCIe-order mapping.
pub fn capture_enumeration(
    program: &Path,
    probe: &ProbeCommand,
    timeout: Duration,
    shutdown: &AtomicBool,
) -> Result<String> {
    let mut child = Command::new(program)
        .args(probe.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn {} for enumeration", program.display()))?;

    let (line_tx, line_rx) = unbounded::<String>();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader(stdout, line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader(stderr, line_tx.clone()));
    }
    drop(line_tx);

    let deadline = Instant::now() + timeout;
    let mut captured = String::new();
    let mut lines = 0usize;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let wait_for = deadline.saturating_duration_since(now).min(SHUTDOWN_POLL);

        match line_rx.recv_timeout(wait_for) {
            Ok(line) => {
                let hit_marker = probe
                    .termination_markers
                    .iter()
                    .any(|marker| line.contains(marker));
                captured.push_str(&line);
                captured.push('\n');
                lines += 1;

                if hit_marker || lines >= probe.max_lines {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = child.kill();
    let _ = child.wait();
    for reader in readers {
        let _ = reader.join();
    }

    Ok(captured)
}

fn spawn_line_reader<R: Read + Send + 'static>(
    stream: R,
    tx: Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

    fn shell() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    fn probe_with(markers: &'static [&'static str], max_lines: usize) -> ProbeCommand {
        ProbeCommand {
            args: &[],
            termination_markers: markers,
            max_lines,
        }
    }

    fn run_script(script: &'static str, probe: &ProbeCommand, timeout: Duration) -> String {
        let shutdown = AtomicBool::new(false);
        let mut child_probe = *probe;
        // Leak the argv so the test can reuse the static-slice shape of
        // real probe commands.
        let args: &'static [&'static str] = Box::leak(Box::new(["-c", script]));
        child_probe.args = args;
        capture_enumeration(&shell(), &child_probe, timeout, &shutdown)
            .expect("capture should succeed")
    }

    #[test]
    fn captures_all_lines_until_exit() {
        let text = run_script(
            "printf 'GPU0: a\\nGPU1: b\\n'",
            &probe_with(&[], 64),
            PROBE_TIMEOUT,
        );
        assert!(text.contains("GPU0: a"));
        assert!(text.contains("GPU1: b"));
    }

    #[test]
    fn stops_at_termination_marker() {
        let text = run_script(
            "printf 'GPU0: a\\nTotal cards: 1\\nGPU1: late\\n'",
            &probe_with(&["Total cards"], 64),
            PROBE_TIMEOUT,
        );
        assert!(text.contains("Total cards"));
        assert!(!text.contains("late"));
    }

    #[test]
    fn stops_at_line_cap() {
        let text = run_script(
            "printf '1\\n2\\n3\\n4\\n5\\n'",
            &probe_with(&[], 2),
            PROBE_TIMEOUT,
        );
        assert_eq!(text, "1\n2\n");
    }

    #[test]
    fn timeout_returns_partial_capture() {
        let started = Instant::now();
        let text = run_script(
            "printf 'early\\n'; sleep 30",
            &probe_with(&[], 64),
            Duration::from_millis(300),
        );
        assert!(text.contains("early"));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn shutdown_aborts_capture() {
        let shutdown = AtomicBool::new(true);
        let probe = ProbeCommand {
            args: &["-c", "sleep 30"],
            termination_markers: &[],
            max_lines: 64,
        };
        let started = Instant::now();
        let text = capture_enumeration(&shell(), &probe, PROBE_TIMEOUT, &shutdown)
            .expect("cancelled capture still succeeds");
        assert!(text.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn missing_executable_is_an_error() {
        let shutdown = AtomicBool::new(false);
        let probe = probe_with(&[], 64);
        let result = capture_enumeration(
            Path::new("/nonexistent/miner"),
            &probe,
            PROBE_TIMEOUT,
            &shutdown,
        );
        assert!(result.is_err());
    }
}
