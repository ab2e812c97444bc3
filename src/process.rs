//! Subprocess execution with a wall-clock ceiling.
//!
//! The child runs in its own process group so that a timeout kills
//! everything it spawned, not just the shell.

use std::io::{self, Read};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a bounded run ended.
#[derive(Debug)]
pub enum Completion {
    Exited {
        code: i32,
        stdout: String,
        stderr: String,
    },
    TimedOut,
    Failed(io::Error),
}

/// Run `command` through `sh -c`, capturing stdout and stderr separately.
pub fn run_shell(command: &str, timeout: Duration) -> Completion {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    run_bounded(cmd, timeout)
}

/// Run a prepared command, killing its process group once `timeout` elapses.
///
/// The ceiling covers draining the output too, so a child backgrounded by
/// the shell can't hold the run open past it. Timed-out output is dropped
/// without joining the drain threads.
pub fn run_bounded(mut cmd: Command, timeout: Duration) -> Completion {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return Completion::Failed(e),
    };
    debug!(pid = child.id(), "spawned child process");

    // Drain both pipes concurrently so a chatty child can't fill one and stall.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                warn!(pid = child.id(), ?timeout, "child exceeded its time limit");
                kill_group(&mut child);
                return Completion::TimedOut;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                kill_group(&mut child);
                return Completion::Failed(e);
            }
        }
    };

    // Anything the shell left running still holds the pipes; it shares the deadline.
    while !drained(stdout.as_ref()) || !drained(stderr.as_ref()) {
        if Instant::now() >= deadline {
            warn!(
                pid = child.id(),
                ?timeout,
                "output still open after the shell exited, killing its process group"
            );
            kill_group(&mut child);
            return Completion::TimedOut;
        }
        thread::sleep(POLL_INTERVAL);
    }

    Completion::Exited {
        code: exit_code(status),
        stdout: collect(stdout),
        stderr: collect(stderr),
    }
}

/// A real exit code, or `128 + signal` for a signal death (the shell convention).
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(128)
}

fn kill_group(child: &mut Child) {
    if let Ok(pid) = i32::try_from(child.id()) {
        let _ = signal::kill(Pid::from_raw(-pid), Signal::SIGKILL);
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn drained(handle: Option<&JoinHandle<Vec<u8>>>) -> bool {
    handle.is_none_or(JoinHandle::is_finished)
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_stderr_and_code() {
        let Completion::Exited {
            code,
            stdout,
            stderr,
        } = run_shell("echo out; echo err >&2; exit 3", Duration::from_secs(10))
        else {
            panic!("expected Exited");
        };

        assert_eq!(code, 3);
        assert_eq!(stdout, "out\n");
        assert_eq!(stderr, "err\n");
    }

    #[test]
    fn times_out_and_kills_the_group() {
        let started = Instant::now();
        let result = run_shell("sleep 30; echo late", Duration::from_millis(300));

        assert!(matches!(result, Completion::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn background_child_holding_output_shares_the_deadline() {
        let started = Instant::now();
        let result = run_shell("sleep 30 & echo started", Duration::from_millis(500));

        assert!(matches!(result, Completion::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn missing_program_is_a_launch_failure() {
        let cmd = Command::new("/nonexistent/lookout-test-binary");
        assert!(matches!(
            run_bounded(cmd, Duration::from_secs(1)),
            Completion::Failed(_)
        ));
    }

    #[test]
    fn signal_death_maps_above_128() {
        let Completion::Exited { code, .. } = run_shell("kill -9 $$", Duration::from_secs(10))
        else {
            panic!("expected Exited");
        };
        assert_eq!(code, 128 + 9);
    }
}
