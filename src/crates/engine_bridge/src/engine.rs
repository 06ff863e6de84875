use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{BridgeError, BridgeResult};

/// Lifecycle states of one engine process, in order.
///
/// `Terminated` is terminal; every handle ends there and no transition skips
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Process launched, configuration not yet written.
    Spawned,
    /// Configuration delivered, frames may be read.
    Streaming,
    /// The output stream has ended; the process may still be exiting.
    Draining,
    /// Process gone and reaped.
    Terminated,
}

/// One blocking read from the engine's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineRead {
    /// A raw frame line, not yet decoded.
    Line(String),
    /// The engine closed its output, either by finishing or by dying; the two
    /// are indistinguishable on purpose.
    EndOfStream,
}

/// Owner of exactly one live simulator process and its stdio streams.
///
/// The handle is the only holder of the child's stdin and stdout. Frames are
/// pulled through a bounded channel fed by a reader thread, so at most one
/// line sits decoded beyond the OS pipe and emission order is preserved.
pub struct EngineHandle {
    child: Child,
    stdin: Option<ChildStdin>,
    frames: Option<mpsc::Receiver<String>>,
    reader: Option<thread::JoinHandle<()>>,
    state: EngineState,
    generation: u64,
    read_timeout: Option<Duration>,
    shutdown_grace: Duration,
}

impl EngineHandle {
    /// Launch the engine executable with captured stdin/stdout.
    ///
    /// Stderr is left inherited; it is not part of the engine contract.
    pub fn spawn(config: &EngineConfig, generation: u64) -> BridgeResult<Self> {
        let mut cmd = Command::new(&config.binary_path);
        if let Some(dir) = &config.working_directory {
            cmd.current_dir(dir);
        }
        cmd.envs(&config.env);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());

        let mut child = cmd.spawn().map_err(|err| {
            BridgeError::launch(format!("{}: {err}", config.binary_path.display()))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::launch("failed to capture engine stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::launch("failed to capture engine stdout"))?;

        let (frames, reader) = spawn_frame_reader(stdout);
        debug!(
            path = %config.binary_path.display(),
            generation,
            "engine spawned"
        );

        Ok(Self {
            child,
            stdin: Some(stdin),
            frames: Some(frames),
            reader: Some(reader),
            state: EngineState::Spawned,
            generation,
            read_timeout: config.read_timeout,
            shutdown_grace: config.shutdown_grace,
        })
    }

    /// Epoch tag assigned at spawn time, used to fence off stale frames.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Write the encoded configuration lines, then close the engine's stdin.
    ///
    /// Callable exactly once per handle; the closed pipe tells the engine the
    /// configuration is complete.
    pub fn write_config(&mut self, lines: &[String]) -> BridgeResult<()> {
        if self.state != EngineState::Spawned {
            return Err(BridgeError::invalid_state(format!(
                "configuration can only be written once, engine is {:?}",
                self.state
            )));
        }
        let mut stdin = self
            .stdin
            .take()
            .ok_or_else(|| BridgeError::invalid_state("engine stdin already closed"))?;
        for line in lines {
            stdin.write_all(line.as_bytes())?;
            stdin.write_all(b"\n")?;
        }
        stdin.flush()?;
        drop(stdin);
        self.state = EngineState::Streaming;
        Ok(())
    }

    /// Block until the engine emits one line or closes its output.
    ///
    /// Without a configured read timeout this waits as long as the engine
    /// takes to compute; silence means the next frame is still being worked
    /// out. With a timeout, a silent engine turns into `BridgeError::Timeout`.
    pub fn read_frame(&mut self) -> BridgeResult<EngineRead> {
        match self.state {
            EngineState::Spawned => Err(BridgeError::invalid_state(
                "frames cannot be read before the configuration is written",
            )),
            EngineState::Draining | EngineState::Terminated => Ok(EngineRead::EndOfStream),
            EngineState::Streaming => {
                let Some(frames) = &self.frames else {
                    self.state = EngineState::Draining;
                    return Ok(EngineRead::EndOfStream);
                };
                let line = match self.read_timeout {
                    Some(timeout) => match frames.recv_timeout(timeout) {
                        Ok(line) => Some(line),
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            return Err(BridgeError::Timeout(timeout))
                        }
                        Err(mpsc::RecvTimeoutError::Disconnected) => None,
                    },
                    None => frames.recv().ok(),
                };
                match line {
                    Some(line) => Ok(EngineRead::Line(line)),
                    None => {
                        self.state = EngineState::Draining;
                        Ok(EngineRead::EndOfStream)
                    }
                }
            }
        }
    }

    /// Tear the process down and release every OS resource.
    ///
    /// Grants the engine a bounded grace period to exit on its own (a finished
    /// engine usually already has), then kills it; the process is reaped on
    /// both paths and the reader thread is joined. Safe to call from any
    /// state, any number of times. Also the cancellation primitive: killing
    /// the process forces a pending read to observe end-of-stream.
    pub fn terminate(&mut self) {
        if self.state == EngineState::Terminated {
            return;
        }
        self.shutdown();
        self.state = EngineState::Terminated;
    }

    fn shutdown(&mut self) {
        // Close the write side in case the configuration was never sent.
        self.stdin.take();

        let start = Instant::now();
        while start.elapsed() < self.shutdown_grace {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(generation = self.generation, %status, "engine exited");
                    self.join_reader();
                    return;
                }
                Ok(None) => thread::sleep(Duration::from_millis(10)),
                Err(err) => {
                    warn!(
                        generation = self.generation,
                        ?err,
                        "could not poll engine exit"
                    );
                    break;
                }
            }
        }

        warn!(
            generation = self.generation,
            "engine still running after grace period, killing"
        );
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.join_reader();
    }

    fn join_reader(&mut self) {
        // Dropping the receiver unblocks a reader stuck handing over a line.
        self.frames.take();
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Read lines off the engine's stdout on a dedicated thread.
///
/// The channel is bounded at one line: frame order is emission order and the
/// consumer never lags more than a single staged line behind the pipe. A read
/// error ends the stream the same way a closed pipe does.
fn spawn_frame_reader(stdout: ChildStdout) -> (mpsc::Receiver<String>, thread::JoinHandle<()>) {
    let (tx, rx) = mpsc::sync_channel(1);
    let handle = thread::spawn(move || {
        let reader = BufReader::new(stdout);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    (rx, handle)
}
