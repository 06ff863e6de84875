//! Pure (de)serialization for the engine line protocol.
//!
//! Configuration travels to the engine as newline-terminated records of
//! space-separated decimal floats; frames come back the same way, one line per
//! computed step. Nothing in here performs I/O.

use crate::config::{EngineFamily, ObjectInit, SimulationConfig};
use crate::error::{BridgeError, BridgeResult};

/// One decoded coordinate group: up to three floats, depending on the family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    coords: [f64; 3],
    dims: u8,
}

impl Sample {
    /// Build a sample from up to three values; extra values are ignored.
    pub fn from_slice(values: &[f64]) -> Self {
        let mut coords = [0.0; 3];
        let dims = values.len().min(3);
        coords[..dims].copy_from_slice(&values[..dims]);
        Self {
            coords,
            dims: dims as u8,
        }
    }

    /// Number of live coordinates.
    pub fn dims(&self) -> usize {
        self.dims as usize
    }

    /// First coordinate, or 0.0 when absent.
    pub fn x(&self) -> f64 {
        self.coords[0]
    }

    /// Second coordinate, or 0.0 when absent.
    pub fn y(&self) -> f64 {
        self.coords[1]
    }

    /// Third coordinate, or 0.0 when absent.
    pub fn z(&self) -> f64 {
        self.coords[2]
    }

    /// Live coordinates as a slice.
    pub fn coords(&self) -> &[f64] {
        &self.coords[..self.dims as usize]
    }
}

/// One decoded engine line: a coordinate group per configured object, in
/// configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    samples: Vec<Sample>,
}

impl Frame {
    /// All coordinate groups in configuration order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Coordinate group for the object at a configuration index.
    pub fn sample(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Number of coordinate groups, equal to the configured object count.
    pub fn object_count(&self) -> usize {
        self.samples.len()
    }
}

/// Expected shape of every frame for one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Coordinates per object.
    pub dims: usize,
    /// Configured objects, visible or not.
    pub objects: usize,
}

impl FrameLayout {
    /// Layout derived from a configuration: the engine emits one group per
    /// configured object regardless of what the display renders.
    pub fn for_config(config: &SimulationConfig) -> Self {
        Self {
            dims: config.family.frame_dims(),
            objects: config.object_count(),
        }
    }

    /// Total float fields per frame line.
    pub fn field_count(&self) -> usize {
        self.dims * self.objects
    }
}

/// Result of decoding one read from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A well-formed frame.
    Frame(Frame),
    /// The stream is over: the read was empty or whitespace-only.
    EndOfStream,
}

/// Encode a configuration into the ordered lines written to engine stdin.
///
/// Orbital and projectile families send the time step first and one record
/// per object after it. The decay family sends a single header carrying
/// population, rate, and step; its engine reads with whitespace-insensitive
/// extraction, so the one-line header stays wire-compatible.
pub fn encode_config(config: &SimulationConfig) -> BridgeResult<Vec<String>> {
    config.validate()?;

    let mut lines = Vec::with_capacity(config.objects.len() + 1);
    match config.family {
        EngineFamily::Decay => {
            // validate() guarantees exactly one population record.
            if let Some(object) = config.objects.first() {
                if let ObjectInit::Population {
                    initial_count,
                    decay_rate,
                } = object.init
                {
                    lines.push(format!(
                        "{initial_count} {decay_rate} {}",
                        config.time_step
                    ));
                }
            }
        }
        _ => {
            lines.push(format!("{}", config.time_step));
            for object in &config.objects {
                lines.push(encode_record(config.family, &object.init)?);
            }
        }
    }
    Ok(lines)
}

fn encode_record(family: EngineFamily, init: &ObjectInit) -> BridgeResult<String> {
    match (family, init) {
        (
            EngineFamily::Orbital2d,
            ObjectInit::Body {
                position,
                velocity,
                mass,
            },
        ) => Ok(format!(
            "{} {} {} {} {}",
            position[0], position[1], velocity[0], velocity[1], mass
        )),
        (
            EngineFamily::Orbital3d,
            ObjectInit::Body {
                position,
                velocity,
                mass,
            },
        ) => Ok(format!(
            "{} {} {} {} {} {} {}",
            position[0], position[1], position[2], velocity[0], velocity[1], velocity[2], mass
        )),
        (
            EngineFamily::Projectile,
            ObjectInit::Projectile {
                height,
                speed,
                launch_angle_deg,
                mass,
                area,
                drag_coeff,
            },
        ) => Ok(format!(
            "{height} {speed} {launch_angle_deg} {mass} {area} {drag_coeff}"
        )),
        (family, init) => Err(BridgeError::invalid_state(format!(
            "record {init:?} cannot be encoded for family {family:?}"
        ))),
    }
}

/// Decode one engine line against the expected layout.
///
/// An empty or whitespace-only line means the stream is over, matching how
/// the engines signal completion by closing stdout.
pub fn decode_frame(line: &str, layout: FrameLayout) -> BridgeResult<Decoded> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Decoded::EndOfStream);
    }

    let mut values = Vec::with_capacity(layout.field_count());
    for token in trimmed.split_whitespace() {
        let value: f64 = token.parse().map_err(|_| BridgeError::Protocol {
            line: trimmed.to_string(),
            token: token.to_string(),
        })?;
        values.push(value);
    }

    if values.len() != layout.field_count() {
        return Err(BridgeError::Arity {
            expected: layout.field_count(),
            actual: values.len(),
        });
    }

    let samples = values
        .chunks_exact(layout.dims)
        .map(Sample::from_slice)
        .collect();
    Ok(Decoded::Frame(Frame { samples }))
}
