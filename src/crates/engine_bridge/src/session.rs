use tracing::{info, warn};

use crate::config::{DisplayMode, EngineConfig, SimulationConfig};
use crate::display::{DisplaySink, DisplayState};
use crate::engine::EngineHandle;
use crate::error::{BridgeError, BridgeResult};
use crate::protocol;
use crate::scheduler::{FrameScheduler, TickReport};

/// Lifecycle states of a [`SessionController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No engine running; a session can be started.
    Idle,
    /// An engine run is live (possibly already finished streaming).
    Active,
    /// Mid-swap: the old engine is being torn down, the new one comes up.
    Restarting,
    /// Shut down for good.
    Closed,
}

/// Requests a configuration source hands to the controller.
#[derive(Debug, Clone)]
pub enum ControlEvent {
    /// Tear the current engine down (if any) and run with new settings.
    Restart {
        config: SimulationConfig,
        mode: DisplayMode,
    },
    /// End the session for good.
    Close,
}

/// Everything owned by one engine run, replaced wholesale on restart.
struct ActiveSession {
    config: SimulationConfig,
    mode: DisplayMode,
    engine: EngineHandle,
    scheduler: FrameScheduler,
    display: DisplayState,
    finish_notified: bool,
}

/// Orchestrates engine runs for one front-end session.
///
/// Owns the engine handle, the scheduler, the display state, and the sink,
/// and moves them together through start, per-tick streaming, restarts, and
/// close. Each run gets a fresh generation; a superseded engine's frames can
/// never reach the display state of its successor because the whole
/// engine/scheduler/display triple is replaced at once.
pub struct SessionController {
    engine_config: EngineConfig,
    sink: Box<dyn DisplaySink>,
    state: ControllerState,
    session: Option<ActiveSession>,
    generation: u64,
}

impl SessionController {
    /// Create an idle controller that will launch the given engine binary.
    pub fn new(engine_config: EngineConfig, sink: Box<dyn DisplaySink>) -> Self {
        Self {
            engine_config,
            sink,
            state: ControllerState::Idle,
            session: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Generation of the most recent engine run, 0 before the first.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Display state of the current run, if one exists.
    pub fn display(&self) -> Option<&DisplayState> {
        self.session.as_ref().map(|session| &session.display)
    }

    /// Mode of the current run, if one exists.
    pub fn mode(&self) -> Option<&DisplayMode> {
        self.session.as_ref().map(|session| &session.mode)
    }

    /// Simulation configuration of the current run, if one exists.
    pub fn config(&self) -> Option<&SimulationConfig> {
        self.session.as_ref().map(|session| &session.config)
    }

    /// Launch the first engine run. Legal only while idle.
    ///
    /// On any launch failure the controller stays idle and a later `start`
    /// with corrected settings is fine.
    pub fn start(&mut self, config: SimulationConfig, mode: DisplayMode) -> BridgeResult<()> {
        if self.state != ControllerState::Idle {
            return Err(BridgeError::invalid_state(format!(
                "start is only legal while Idle, controller is {:?}",
                self.state
            )));
        }
        self.launch(config, mode)?;
        self.state = ControllerState::Active;
        Ok(())
    }

    /// Drive one animation tick through the current run.
    ///
    /// Forwards per-object updates and a redraw to the sink; on the tick that
    /// ends the stream the engine is reaped and the sink told exactly once.
    /// A stream error tears the session down, returns the controller to
    /// `Idle`, and surfaces the error.
    pub fn tick(&mut self) -> BridgeResult<TickReport> {
        if self.state != ControllerState::Active {
            return Err(BridgeError::invalid_state(format!(
                "tick is only legal while Active, controller is {:?}",
                self.state
            )));
        }
        let Some(session) = self.session.as_mut() else {
            return Err(BridgeError::invalid_state("active controller has no session"));
        };

        match session.scheduler.tick(&mut session.engine, &mut session.display) {
            Ok(report) => {
                for &index in &report.changed {
                    if let Some(track) = session.display.track(index) {
                        self.sink.object_updated(track);
                    }
                }
                if report.applied {
                    self.sink.redraw(&session.display, &report.changed);
                }
                if report.finished && !session.finish_notified {
                    session.finish_notified = true;
                    // Nothing more will arrive; reap the process now. The
                    // run stays current so its final frame keeps rendering.
                    session.engine.terminate();
                    info!(generation = self.generation, "stream finished");
                    self.sink.stream_finished(&session.display);
                }
                Ok(report)
            }
            Err(err) => {
                warn!(
                    generation = self.generation,
                    error = %err,
                    "stream failed, tearing session down"
                );
                self.teardown();
                self.state = ControllerState::Idle;
                Err(err)
            }
        }
    }

    /// Replace the current run with a fresh engine under new settings.
    ///
    /// Legal only while active. The old engine is terminated and its display
    /// state discarded before the new engine spawns; if the new launch fails
    /// the controller is left idle.
    pub fn request_restart(
        &mut self,
        config: SimulationConfig,
        mode: DisplayMode,
    ) -> BridgeResult<()> {
        match self.state {
            ControllerState::Active => {}
            ControllerState::Restarting => {
                return Err(BridgeError::invalid_state(
                    "a restart is already in flight, request rejected",
                ));
            }
            other => {
                return Err(BridgeError::invalid_state(format!(
                    "restart is only legal while Active, controller is {other:?}"
                )));
            }
        }

        self.state = ControllerState::Restarting;
        info!(
            generation = self.generation,
            mode = mode.name(),
            "restarting with new settings"
        );
        self.teardown();
        match self.launch(config, mode) {
            Ok(()) => {
                self.state = ControllerState::Active;
                Ok(())
            }
            Err(err) => {
                self.state = ControllerState::Idle;
                Err(err)
            }
        }
    }

    /// Route a configuration-source request to the right transition.
    ///
    /// A restart request doubles as the initial start when the controller is
    /// still idle, mirroring a front-end whose one button reads "apply".
    pub fn handle_event(&mut self, event: ControlEvent) -> BridgeResult<()> {
        match event {
            ControlEvent::Restart { config, mode } => {
                if self.state == ControllerState::Idle {
                    self.start(config, mode)
                } else {
                    self.request_restart(config, mode)
                }
            }
            ControlEvent::Close => {
                self.close();
                Ok(())
            }
        }
    }

    /// Terminate everything and refuse further work. Idempotent.
    pub fn close(&mut self) {
        if self.state == ControllerState::Closed {
            return;
        }
        self.teardown();
        info!(generation = self.generation, "session closed");
        self.state = ControllerState::Closed;
    }

    /// Spawn, configure, and wire up one engine run under a new generation.
    fn launch(&mut self, config: SimulationConfig, mode: DisplayMode) -> BridgeResult<()> {
        let lines = protocol::encode_config(&config)?;
        self.generation += 1;
        let generation = self.generation;

        let display = DisplayState::for_session(&config, &mode, generation)?;
        let mut engine = EngineHandle::spawn(&self.engine_config, generation)?;
        if let Err(err) = engine.write_config(&lines) {
            engine.terminate();
            return Err(err);
        }
        let scheduler = FrameScheduler::new(&config, generation);

        info!(
            generation,
            family = ?config.family,
            mode = mode.name(),
            objects = config.object_count(),
            "engine run started"
        );
        self.session = Some(ActiveSession {
            config,
            mode,
            engine,
            scheduler,
            display,
            finish_notified: false,
        });
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.engine.terminate();
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.close();
    }
}
