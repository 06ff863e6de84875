use std::collections::VecDeque;

use crate::config::{DisplayMode, SimulationConfig};
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::Sample;

/// Live record of one rendered object: its latest sample plus a bounded trail
/// of recent history.
#[derive(Debug, Clone)]
pub struct ObjectTrack {
    label: String,
    source_index: usize,
    trail_length: usize,
    current: Option<Sample>,
    trail: VecDeque<Sample>,
    stalled: bool,
}

impl ObjectTrack {
    fn new(label: String, source_index: usize, trail_length: usize, seed: Option<Sample>) -> Self {
        let mut track = Self {
            label,
            source_index,
            trail_length,
            current: None,
            trail: VecDeque::new(),
            stalled: false,
        };
        if let Some(sample) = seed {
            track.current = Some(sample);
            track.push_trail(sample);
        }
        track
    }

    /// Human-readable name from the configuration.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Position of this object within the engine's full frame.
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Most recent sample, if any frame (or launch seed) reached this track.
    pub fn current(&self) -> Option<Sample> {
        self.current
    }

    /// Recent history, oldest first, never longer than the configured trail
    /// length.
    pub fn trail(&self) -> &VecDeque<Sample> {
        &self.trail
    }

    /// Whether this object stopped moving and no longer takes updates.
    pub fn stalled(&self) -> bool {
        self.stalled
    }

    /// Fold one sample in. Returns whether the track visually changed.
    ///
    /// With the stall rule on, a sample repeating the previous vertical
    /// coordinate freezes the track instead of updating it; the repeated
    /// sample is dropped so the trail keeps only real motion.
    pub(crate) fn apply(&mut self, sample: Sample, stall_rule: bool) -> bool {
        if self.stalled {
            return false;
        }
        if stall_rule {
            if let Some(previous) = self.current {
                if previous.y() == sample.y() {
                    self.stalled = true;
                    return false;
                }
            }
        }
        self.current = Some(sample);
        self.push_trail(sample);
        true
    }

    fn push_trail(&mut self, sample: Sample) {
        if self.trail_length == 0 {
            return;
        }
        self.trail.push_back(sample);
        while self.trail.len() > self.trail_length {
            self.trail.pop_front();
        }
    }
}

/// Everything a front-end needs to draw one engine run.
///
/// Holds a track per displayed object and the frame count that anchors
/// elapsed simulated time. Tagged with the generation of the engine run it
/// belongs to; a restart builds a fresh state rather than mutating this one.
#[derive(Debug, Clone)]
pub struct DisplayState {
    tracks: Vec<ObjectTrack>,
    generation: u64,
    time_step: f64,
    frames_applied: u64,
    finished: bool,
}

impl DisplayState {
    /// Build the blank state for one engine run.
    ///
    /// A track is created per object that is both marked displayable and
    /// selected by the mode; undisplayed objects stay in the frame layout but
    /// get no track. Projectile-family objects start tracked at their launch
    /// point so the first engine frame already draws a segment.
    pub fn for_session(
        config: &SimulationConfig,
        mode: &DisplayMode,
        generation: u64,
    ) -> BridgeResult<Self> {
        if let Some(max) = mode.max_index() {
            if max >= config.object_count() {
                return Err(BridgeError::invalid_state(format!(
                    "mode {:?} selects object {max} but the configuration has {}",
                    mode.name(),
                    config.object_count()
                )));
            }
        }

        let seeds = config.family.seeds_initial_sample();
        let mut tracks = Vec::new();
        for (index, object) in config.objects.iter().enumerate() {
            if !object.is_displayed || !mode.selects(index) {
                continue;
            }
            let seed = if seeds {
                object.init.seed_position().map(|xy| Sample::from_slice(&xy))
            } else {
                None
            };
            tracks.push(ObjectTrack::new(
                object.label.clone(),
                index,
                object.trail_length,
                seed,
            ));
        }

        Ok(Self {
            tracks,
            generation,
            time_step: config.time_step,
            frames_applied: 0,
            finished: false,
        })
    }

    /// Tracks in configuration order.
    pub fn tracks(&self) -> &[ObjectTrack] {
        &self.tracks
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut [ObjectTrack] {
        &mut self.tracks
    }

    /// Track by display index, if in range.
    pub fn track(&self, index: usize) -> Option<&ObjectTrack> {
        self.tracks.get(index)
    }

    /// Generation of the engine run this state belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of frames folded in so far.
    pub fn frames_applied(&self) -> u64 {
        self.frames_applied
    }

    /// Configured simulated seconds per frame.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Simulated time covered: applied frames times the time step.
    pub fn elapsed(&self) -> f64 {
        self.frames_applied as f64 * self.time_step
    }

    /// Whether the stream behind this state has ended.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Whether every track has stalled. False when nothing is tracked.
    pub fn all_stalled(&self) -> bool {
        !self.tracks.is_empty() && self.tracks.iter().all(|track| track.stalled)
    }

    pub(crate) fn record_frame(&mut self) {
        self.frames_applied += 1;
    }

    pub(crate) fn mark_finished(&mut self) {
        self.finished = true;
    }
}

/// Boundary to the rendering side.
///
/// Sinks only ever see coherent state: decoded samples, bounded trails, and a
/// single end-of-stream notification. Stream errors never cross this
/// boundary. Every method defaults to a no-op so a sink implements only what
/// it draws.
pub trait DisplaySink {
    /// One tracked object took a new sample this tick.
    fn object_updated(&mut self, track: &ObjectTrack) {
        let _ = track;
    }

    /// A frame was applied; `changed` indexes into `state.tracks()`.
    fn redraw(&mut self, state: &DisplayState, changed: &[usize]) {
        let _ = (state, changed);
    }

    /// No further frames will arrive for this state.
    fn stream_finished(&mut self, state: &DisplayState) {
        let _ = state;
    }
}

/// Sink that ignores every notification, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {}
