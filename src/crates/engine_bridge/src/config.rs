use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Simulation families, one per external engine executable.
///
/// The family decides the record layout written to the engine, the number of
/// coordinates per object in every output frame, and which display rules
/// apply while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineFamily {
    /// Planar n-body engine: records `x y vx vy mass`, frames of `2k` floats.
    Orbital2d,
    /// Spatial n-body engine: records `x y z vx vy vz mass`, frames of `3k` floats.
    Orbital3d,
    /// Projectile drag engine: records `height speed angle mass area drag`,
    /// frames of `2k` floats.
    Projectile,
    /// Decay Monte Carlo engine: header-only configuration, frames of one
    /// remaining-count value.
    Decay,
}

impl EngineFamily {
    /// Coordinates transmitted per object in every frame.
    pub fn frame_dims(self) -> usize {
        match self {
            EngineFamily::Orbital2d | EngineFamily::Projectile => 2,
            EngineFamily::Orbital3d => 3,
            EngineFamily::Decay => 1,
        }
    }

    /// Whether an unchanged y-coordinate marks an object's motion as ended.
    ///
    /// Projectile engines keep echoing the resting position of landed objects
    /// while the others fly, so the consumer must freeze finished tracks
    /// itself.
    pub fn stall_rule(self) -> bool {
        matches!(self, EngineFamily::Projectile)
    }

    /// Whether tracks start from the object's launch point instead of empty.
    pub fn seeds_initial_sample(self) -> bool {
        matches!(self, EngineFamily::Projectile)
    }
}

/// Kind-specific numeric fields handed to the engine for one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectInit {
    /// Orbital body state vector. The z components are ignored by the 2-D
    /// family.
    Body {
        position: [f64; 3],
        velocity: [f64; 3],
        mass: f64,
    },
    /// Projectile launch parameters; the angle is in degrees.
    Projectile {
        height: f64,
        speed: f64,
        launch_angle_deg: f64,
        mass: f64,
        area: f64,
        drag_coeff: f64,
    },
    /// Particle population for the decay family.
    Population { initial_count: u32, decay_rate: f64 },
}

impl ObjectInit {
    /// Whether this record kind belongs to the given family.
    pub fn matches_family(&self, family: EngineFamily) -> bool {
        matches!(
            (self, family),
            (
                ObjectInit::Body { .. },
                EngineFamily::Orbital2d | EngineFamily::Orbital3d
            ) | (ObjectInit::Projectile { .. }, EngineFamily::Projectile)
                | (ObjectInit::Population { .. }, EngineFamily::Decay)
        )
    }

    /// Launch point for families whose tracks are seeded before the first
    /// frame. Projectiles start at `(0, height)`.
    pub fn seed_position(&self) -> Option<[f64; 2]> {
        match self {
            ObjectInit::Projectile { height, .. } => Some([0.0, *height]),
            _ => None,
        }
    }
}

fn default_displayed() -> bool {
    true
}

fn default_trail_length() -> usize {
    1024
}

/// One configured object: engine-facing numeric fields plus the display-only
/// attributes the consumer needs.
///
/// Objects that influence the simulation without being drawn carry
/// `is_displayed = false` instead of living in a separate type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Human-readable name, surfaced unchanged to the display.
    pub label: String,
    /// Baseline visibility; a mode can only narrow this further.
    #[serde(default = "default_displayed")]
    pub is_displayed: bool,
    /// Bound on the retained trail history for this object.
    #[serde(default = "default_trail_length")]
    pub trail_length: usize,
    /// Kind-specific fields written to the engine.
    pub init: ObjectInit,
}

impl ObjectSpec {
    /// Create a visible object with the default trail bound.
    pub fn new(label: impl Into<String>, init: ObjectInit) -> Self {
        Self {
            label: label.into(),
            is_displayed: true,
            trail_length: default_trail_length(),
            init,
        }
    }

    /// Override the retained trail length.
    pub fn with_trail_length(mut self, trail_length: usize) -> Self {
        self.trail_length = trail_length;
        self
    }

    /// Override whether the object is drawn at all.
    pub fn with_displayed(mut self, is_displayed: bool) -> Self {
        self.is_displayed = is_displayed;
        self
    }
}

/// Immutable initial conditions for one engine run.
///
/// A changed configuration never mutates a live engine; the session spawns a
/// fresh process instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Engine family this configuration targets.
    pub family: EngineFamily,
    /// Global integration step in seconds, also the per-frame time increment.
    pub time_step: f64,
    /// Configured objects in wire order.
    pub objects: Vec<ObjectSpec>,
}

impl SimulationConfig {
    /// Create an empty configuration for a family.
    pub fn new(family: EngineFamily, time_step: f64) -> Self {
        Self {
            family,
            time_step,
            objects: Vec::new(),
        }
    }

    /// Append an object record.
    pub fn with_object(mut self, object: ObjectSpec) -> Self {
        self.objects.push(object);
        self
    }

    /// Number of configured objects, visible or not.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Check family/record coherence before the configuration is submitted.
    pub fn validate(&self) -> BridgeResult<()> {
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(BridgeError::invalid_state(format!(
                "time step must be positive and finite, got {}",
                self.time_step
            )));
        }
        if self.objects.is_empty() {
            return Err(BridgeError::invalid_state(
                "configuration carries no objects",
            ));
        }
        for object in &self.objects {
            if !object.init.matches_family(self.family) {
                return Err(BridgeError::invalid_state(format!(
                    "object {:?} does not belong to family {:?}",
                    object.label, self.family
                )));
            }
        }
        if self.family == EngineFamily::Decay && self.objects.len() != 1 {
            return Err(BridgeError::invalid_state(format!(
                "decay configurations carry exactly one population, got {}",
                self.objects.len()
            )));
        }
        Ok(())
    }
}

/// Named selection of configured objects to render.
///
/// The engine always simulates and emits the full configured list; a mode only
/// narrows what the display tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMode {
    name: String,
    /// `None` renders every displayed object.
    visible: Option<Vec<usize>>,
}

impl DisplayMode {
    /// Render everything the configuration marks as displayed.
    pub fn all() -> Self {
        Self {
            name: "all".to_string(),
            visible: None,
        }
    }

    /// Render only the objects at the given configuration indices.
    pub fn subset(name: impl Into<String>, indices: impl Into<Vec<usize>>) -> Self {
        Self {
            name: name.into(),
            visible: Some(indices.into()),
        }
    }

    /// Mode name, surfaced in logs and scenario files.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the object at `index` is part of this mode's subset.
    pub fn selects(&self, index: usize) -> bool {
        match &self.visible {
            Some(indices) => indices.contains(&index),
            None => true,
        }
    }

    /// Largest configuration index this mode references, if any.
    pub fn max_index(&self) -> Option<usize> {
        self.visible
            .as_ref()
            .and_then(|indices| indices.iter().copied().max())
    }
}

/// Process-level description of how to launch an engine executable.
///
/// Engines take no arguments; everything they need arrives on stdin.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the engine binary to spawn.
    pub binary_path: PathBuf,
    /// Extra environment variables applied to the child process.
    pub env: BTreeMap<String, String>,
    /// Optional working directory override for the child process.
    pub working_directory: Option<PathBuf>,
    /// Upper bound on a single frame read. `None` blocks indefinitely, which
    /// treats engine silence as computation still in progress.
    pub read_timeout: Option<Duration>,
    /// How long terminate waits for a voluntary exit before killing.
    pub shutdown_grace: Duration,
}

impl EngineConfig {
    /// Create a launch description for a specific engine binary.
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            env: BTreeMap::new(),
            working_directory: None,
            read_timeout: None,
            shutdown_grace: Duration::from_millis(500),
        }
    }

    /// Add an environment variable override.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Override the working directory for the spawned process.
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Bound every frame read, turning a silent engine into an error.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Override the grace period terminate grants before the forced kill.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

/// On-disk bundle of one configuration plus the mode to display it in.
///
/// This is the interchange format a front-end or configuration source feeds
/// into a session restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Display label for menus and logs.
    pub label: String,
    /// Initial conditions to submit to the engine.
    pub config: SimulationConfig,
    /// Object subset to render.
    pub mode: DisplayMode,
}

impl Scenario {
    /// Bundle a configuration and mode under a label.
    pub fn new(label: impl Into<String>, config: SimulationConfig, mode: DisplayMode) -> Self {
        Self {
            label: label.into(),
            config,
            mode,
        }
    }

    /// Serialize to pretty-printed JSON at `path`.
    pub fn write_json_file(&self, path: &Path) -> BridgeResult<()> {
        let file = File::create(path)
            .map_err(|err| BridgeError::scenario(format!("create {}: {err}", path.display())))?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|err| BridgeError::scenario(format!("serialize {}: {err}", path.display())))
    }

    /// Load and validate a scenario from a JSON file.
    pub fn from_json_file(path: &Path) -> BridgeResult<Self> {
        let file = File::open(path)
            .map_err(|err| BridgeError::scenario(format!("open {}: {err}", path.display())))?;
        let scenario: Scenario = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| BridgeError::scenario(format!("parse {}: {err}", path.display())))?;
        scenario.config.validate()?;
        Ok(scenario)
    }
}
