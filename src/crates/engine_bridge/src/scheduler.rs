use tracing::debug;

use crate::config::SimulationConfig;
use crate::display::DisplayState;
use crate::engine::{EngineHandle, EngineRead};
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::{self, Decoded, FrameLayout};

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Whether a frame was consumed and folded into the display state.
    pub applied: bool,
    /// Whether the stream is over; further ticks are no-ops.
    pub finished: bool,
    /// Display indices whose tracks changed, a redraw hint.
    pub changed: Vec<usize>,
}

/// Pulls at most one frame per tick and applies it to a display state.
///
/// The host's animation timer decides when ticks happen; the scheduler only
/// does the read/decode/apply work, so display update rate equals frame
/// arrival rate up to the tick rate. One scheduler serves exactly one engine
/// run and refuses handles or states from another generation.
pub struct FrameScheduler {
    layout: FrameLayout,
    stall_rule: bool,
    finished: bool,
    generation: u64,
}

impl FrameScheduler {
    pub fn new(config: &SimulationConfig, generation: u64) -> Self {
        Self {
            layout: FrameLayout::for_config(config),
            stall_rule: config.family.stall_rule(),
            finished: false,
            generation,
        }
    }

    /// Whether the stream has ended; once true, ticks do nothing.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Generation of the engine run this scheduler drives.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run one tick: read a line, decode it, fold it into the display.
    ///
    /// Decode failures propagate without touching the display, leaving the
    /// last consistent frame on screen for the caller's teardown.
    pub fn tick(
        &mut self,
        engine: &mut EngineHandle,
        display: &mut DisplayState,
    ) -> BridgeResult<TickReport> {
        if self.finished {
            return Ok(TickReport {
                applied: false,
                finished: true,
                changed: Vec::new(),
            });
        }
        if engine.generation() != self.generation || display.generation() != self.generation {
            return Err(BridgeError::invalid_state(format!(
                "scheduler generation {} fed engine generation {} and display generation {}",
                self.generation,
                engine.generation(),
                display.generation()
            )));
        }

        let line = match engine.read_frame()? {
            EngineRead::EndOfStream => return Ok(self.finish(display, "engine closed its stream")),
            EngineRead::Line(line) => line,
        };
        let frame = match protocol::decode_frame(&line, self.layout)? {
            Decoded::EndOfStream => return Ok(self.finish(display, "engine sent a blank line")),
            Decoded::Frame(frame) => frame,
        };

        display.record_frame();
        let mut changed = Vec::new();
        for (index, track) in display.tracks_mut().iter_mut().enumerate() {
            let Some(sample) = frame.sample(track.source_index()) else {
                continue;
            };
            if track.apply(*sample, self.stall_rule) {
                changed.push(index);
            }
        }

        if self.stall_rule && display.all_stalled() {
            // The last motion is already on screen; nothing changed this tick.
            let mut report = self.finish(display, "every tracked object stalled");
            report.applied = true;
            return Ok(report);
        }

        Ok(TickReport {
            applied: true,
            finished: false,
            changed,
        })
    }

    fn finish(&mut self, display: &mut DisplayState, reason: &str) -> TickReport {
        debug!(generation = self.generation, reason, "frame stream finished");
        self.finished = true;
        display.mark_finished();
        TickReport {
            applied: false,
            finished: true,
            changed: Vec::new(),
        }
    }
}
