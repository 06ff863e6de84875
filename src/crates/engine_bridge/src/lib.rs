//! Streaming bridge between plotting front-ends and external physics engines.
//!
//! An engine is an opaque executable that reads its initial conditions from
//! stdin and prints one line of values per computed step until it is done.
//! This crate owns everything between a front-end and that process: spawning
//! and terminating the engine, the line protocol, the per-tick frame pump,
//! and the session state machine that swaps engines when the user applies new
//! parameters or switches display modes.
//!
//! Typical usage:
//! ```no_run
//! use engine_bridge::{presets, EngineConfig, NullDisplay, SessionController};
//!
//! let engine = EngineConfig::new("/path/to/orbital_engine");
//! let mut controller = SessionController::new(engine, Box::new(NullDisplay));
//!
//! let (config, mode) = presets::inner_planets();
//! controller.start(config, mode).expect("engine should launch");
//! while !controller.tick().expect("stream should stay healthy").finished {}
//!
//! let (config, mode) = presets::outer_planets();
//! controller
//!     .request_restart(config, mode)
//!     .expect("engine should relaunch");
//! controller.close();
//! ```

mod config;
mod display;
mod engine;
mod error;
pub mod presets;
pub mod protocol;
mod scheduler;
mod session;

pub use config::{
    DisplayMode, EngineConfig, EngineFamily, ObjectInit, ObjectSpec, Scenario, SimulationConfig,
};
pub use display::{DisplaySink, DisplayState, NullDisplay, ObjectTrack};
pub use engine::{EngineHandle, EngineRead, EngineState};
pub use error::{BridgeError, BridgeResult};
pub use protocol::{Decoded, Frame, FrameLayout, Sample};
pub use scheduler::{FrameScheduler, TickReport};
pub use session::{ControlEvent, ControllerState, SessionController};
