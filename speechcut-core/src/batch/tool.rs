//! Running external command-line tools with a deadline.

use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// How often a running tool is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured output of a tool that exited successfully.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` with `args`, killing it after `timeout`.
///
/// Returns a human-readable reason on launch failure, timeout, or a
/// non-zero exit status.
pub fn run_tool<I, S>(
    program: &str,
    args: I,
    timeout: Duration,
) -> std::result::Result<ToolOutput, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // Own process group, so a timeout also reaches helpers the tool spawned
    // (yt-dlp runs ffmpeg as a postprocessor).
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let mut child = command
        .spawn()
        .map_err(|e| format!("failed to launch {program}: {e}"))?;

    // Drain pipes on helper threads so a chatty tool cannot block on a full pipe.
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_reader = thread::spawn(move || drain(stdout));
    let err_reader = thread::spawn(move || drain(stderr));

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                warn!(program, timeout_s = timeout.as_secs_f64(), "tool timed out, killing");
                kill_tree(&mut child);
                return Err(format!(
                    "{program} timed out after {:.1}s",
                    timeout.as_secs_f64()
                ));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(format!("failed waiting for {program}: {e}")),
        }
    };

    let output = ToolOutput {
        stdout: out_reader.join().unwrap_or_default(),
        stderr: err_reader.join().unwrap_or_default(),
    };
    debug!(program, %status, elapsed_ms = started.elapsed().as_millis() as u64, "tool finished");

    if !status.success() {
        let detail = output
            .stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("no diagnostic output");
        return Err(format!("{program} exited with {status}: {}", detail.trim()));
    }
    Ok(output)
}

/// Kill `child` and, on Unix, every process in its group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let killed = Command::new("kill")
            .args(["-KILL", "--", &group])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = killed {
            warn!(pgid = child.id(), "failed to signal process group: {e}");
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = run_tool("sh", ["-c", "echo hello"], Duration::from_secs(5)).unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn non_zero_exit_reports_last_stderr_line() {
        let err = run_tool(
            "sh",
            ["-c", "echo first >&2; echo boom >&2; exit 3"],
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(err.contains("boom"), "{err}");
    }

    #[test]
    fn slow_tool_is_killed() {
        let started = Instant::now();
        let err = run_tool("sh", ["-c", "sleep 5"], Duration::from_millis(200)).unwrap_err();
        assert!(err.contains("timed out"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn timeout_also_kills_spawned_helpers() {
        let pid_file =
            std::env::temp_dir().join(format!("speechcut-tool-{}.pid", std::process::id()));
        let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());
        let err = run_tool("sh", ["-c", script.as_str()], Duration::from_millis(300)).unwrap_err();
        assert!(err.contains("timed out"), "{err}");

        let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
        let _ = std::fs::remove_file(&pid_file);
        let deadline = Instant::now() + Duration::from_secs(3);
        loop {
            // Gone, or a zombie waiting to be reaped.
            let alive = std::fs::read_to_string(format!("/proc/{pid}/stat"))
                .map(|stat| {
                    let state = stat.rsplit(')').next().unwrap_or("").trim_start();
                    !state.starts_with('Z')
                })
                .unwrap_or(false);
            if !alive {
                break;
            }
            assert!(Instant::now() < deadline, "helper {pid} outlived the timeout");
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let err = run_tool(
            "speechcut-definitely-not-installed",
            Vec::<&str>::new(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.contains("failed to launch"), "{err}");
    }
}
