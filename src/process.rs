use crate::config::Config;
use crate::error::{MetadataError, Result};
use crate::tool::Tool;
use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(5);
/// How long output may keep arriving after a tool exits near its deadline.
const OUTPUT_GRACE: Duration = Duration::from_millis(200);
const FILE_NOT_FOUND_PREFIX: &str = "Error: File not found - ";

/// Captured result of a tool run that exited successfully.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub stdout: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_string(self) -> Result<String> {
        Ok(String::from_utf8(self.stdout)?)
    }

    /// Stdout as text, replacing invalid UTF-8. Tag listings may contain
    /// values in legacy encodings.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// One invocation of an external tool.
///
/// The process is spawned, both output streams are drained on background
/// threads, and the child is killed along with anything it started if it
/// outlives the configured timeout.
pub(crate) struct ToolCommand<'a> {
    config: &'a Config,
    tool: Tool,
    args: Vec<OsString>,
}

impl<'a> ToolCommand<'a> {
    pub fn new(config: &'a Config, tool: Tool) -> Self {
        Self {
            config,
            tool,
            args: config.leading_args(tool).iter().map(OsString::from).collect(),
        }
    }

    /// A command without the tool's leading arguments, for version probes.
    pub fn bare(config: &'a Config, tool: Tool) -> Self {
        Self {
            config,
            tool,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    fn command_line(&self) -> String {
        let mut parts = vec![self.config.executable(self.tool).to_string_lossy()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy()));
        parts.join(" ")
    }

    /// Spawns the tool only to see whether it starts. Used by availability probes.
    pub fn probe(self) -> Result<()> {
        self.run().map(|_| ())
    }

    pub fn run(self) -> Result<ToolOutput> {
        let command_line = self.command_line();
        let timeout = self.config.timeout();
        log::debug!("running {}", command_line);
        let started = Instant::now();
        let deadline = started + timeout;

        let mut command = Command::new(self.config.executable(self.tool));
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        own_process_group(&mut command);
        let mut child = command.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                MetadataError::ToolUnavailable {
                    tool: self.tool,
                    reason: e.to_string(),
                }
            }
            _ => MetadataError::Io(e),
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("Failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("Failed to capture stderr"))?;
        let stdout_reader = spawn_reader(stdout);
        let stderr_reader = spawn_reader(stderr);

        let timed_out = |command: String| MetadataError::Timeout {
            tool: self.tool,
            command,
            timeout,
        };

        let Some(status) = wait_with_deadline(&mut child, deadline)? else {
            // The readers are left behind; they end once the last holder of
            // the pipes is gone.
            kill_tree(&mut child);
            child.wait()?;
            log::warn!("{} timed out after {:?}, killed", command_line, timeout);
            return Err(timed_out(command_line));
        };

        let stdout = read_until(&stdout_reader, deadline + OUTPUT_GRACE)?;
        let stderr = read_until(&stderr_reader, deadline + OUTPUT_GRACE)?;
        let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
            // The tool exited but something it started still holds the pipes.
            kill_tree(&mut child);
            log::warn!("{} left a process running past {:?}, killed", command_line, timeout);
            return Err(timed_out(command_line));
        };
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        log::debug!(
            "{} exited with {} in {:?}",
            self.tool,
            status,
            started.elapsed()
        );
        log::trace!("{} bytes on stdout, {} on stderr", stdout.len(), stderr.len());

        check_stderr(self.tool, &stderr, &command_line)?;
        if !status.success() {
            return Err(MetadataError::ExternalToolFailure {
                tool: self.tool,
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
                command: command_line,
            });
        }

        Ok(ToolOutput { stdout })
    }
}

type Reader = Receiver<io::Result<Vec<u8>>>;

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> Reader {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::with_capacity(4096);
        let result = stream.read_to_end(&mut buffer).map(|_| buffer);
        // The receiver is gone when the run already gave up on this stream.
        let _ = sender.send(result);
    });
    receiver
}

/// Everything the stream produced, or `None` if it is still open at `deadline`.
fn read_until(reader: &Reader, deadline: Instant) -> io::Result<Option<Vec<u8>>> {
    match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(result) => result.map(Some),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => {
            Err(io::Error::other("output reader thread panicked"))
        }
    }
}

/// Waits for the child to exit. Returns `None` if the deadline passed first;
/// the child is then still running.
fn wait_with_deadline(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}

/// Starts the tool as leader of a new process group, so that delegates it
/// spawns (`gs` for PDF input, for instance) can be killed along with it.
#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

/// Kills the child and every process left in its group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        // The shell's own `kill` is present even where `/bin/kill` is not.
        let killed = Command::new("sh")
            .arg("-c")
            .arg(format!("kill -KILL {}", group))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match killed {
            Ok(status) if status.success() => {}
            Ok(status) => log::debug!("kill of process group {} exited with {}", group, status),
            Err(e) => log::warn!("could not kill process group {}: {}", group, e),
        }
    }
    // Already gone when the group kill worked.
    let _ = child.kill();
}

fn check_stderr(tool: Tool, stderr: &str, command_line: &str) -> Result<()> {
    for line in stderr.lines() {
        if let Some(path) = line.strip_prefix(FILE_NOT_FOUND_PREFIX) {
            return Err(MetadataError::FileNotFound {
                path: PathBuf::from(path.trim()),
                command: command_line.to_string(),
            });
        } else if line.contains("Warning:") {
            log::warn!("{} {}", tool, line);
        } else if !line.trim().is_empty() {
            log::debug!("{} stderr: {}", tool, line);
        }
    }
    Ok(())
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Writes an executable `sh` script standing in for a tool.
    pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write fake tool");
        let mut perms = fs::metadata(&path).expect("stat fake tool").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod fake tool");
        path
    }
}
