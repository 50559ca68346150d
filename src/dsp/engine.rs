//! # Engine
//!
//! The signal chain behind the host calls:
//!
//! ```text
//! in ──► [StereoDelay] ──► [Chorus] ──► out
//! ```
//!
//! `prepare()` is the only call that allocates or can fail. `update()` and
//! `process_block()` run on the audio thread and never allocate, lock, or
//! log.

use anyhow::ensure;

use super::chorus::Chorus;
use super::controls::ControlValues;
use super::stereo_delay::StereoDelay;

/// The engine only handles stereo.
pub const CHANNELS: usize = 2;

/// Stream format handed to `prepare()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSetup {
    pub sample_rate: f32,
    /// Most frames the host promises per call. A sizing hint only:
    /// `process_block` handles any length.
    pub max_block_size: usize,
    pub channels: usize,
}

impl EngineSetup {
    pub fn stereo(sample_rate: f32, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            channels: CHANNELS,
        }
    }
}

/// A mutable view of one block of stereo audio.
///
/// Both channels always have the same length; if they are handed in with
/// different lengths, the longer one is cut down.
pub struct StereoBuffer<'a> {
    left: &'a mut [f32],
    right: &'a mut [f32],
}

impl<'a> StereoBuffer<'a> {
    pub fn new(left: &'a mut [f32], right: &'a mut [f32]) -> Self {
        let len = left.len().min(right.len());
        let (left, _) = left.split_at_mut(len);
        let (right, _) = right.split_at_mut(len);
        Self { left, right }
    }

    /// Borrow the first two channels of a host buffer. `None` unless there
    /// are exactly two.
    pub fn from_channels<'b: 'a>(channels: &'a mut [&'b mut [f32]]) -> Option<Self> {
        match channels {
            [left, right] => Some(Self::new(left, right)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn left(&self) -> &[f32] {
        self.left
    }

    pub fn right(&self) -> &[f32] {
        self.right
    }

    /// Walk the block one `(left, right)` frame at a time.
    #[inline]
    pub fn frames_mut(&mut self) -> impl Iterator<Item = (&mut f32, &mut f32)> + '_ {
        self.left.iter_mut().zip(self.right.iter_mut())
    }
}

#[derive(Default)]
pub struct Engine {
    setup: Option<EngineSetup>,
    delay: StereoDelay,
    chorus: Chorus,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the stream format, allocate every buffer and settle every
    /// parameter on `controls`.
    pub fn prepare(&mut self, setup: EngineSetup, controls: &ControlValues) -> anyhow::Result<()> {
        ensure!(
            setup.sample_rate.is_finite() && setup.sample_rate > 0.0,
            "sample rate must be positive, got {}",
            setup.sample_rate
        );
        ensure!(setup.max_block_size > 0, "maximum block size must be at least 1");
        ensure!(
            setup.channels == CHANNELS,
            "only stereo is supported, got {} channels",
            setup.channels
        );

        self.delay.prepare(&setup, &controls.delay);
        self.chorus.prepare(&setup, &controls.chorus);
        self.setup = Some(setup);

        log::info!(
            "engine prepared at {} Hz, blocks up to {} frames",
            setup.sample_rate,
            setup.max_block_size
        );
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.setup.is_some()
    }

    pub fn setup(&self) -> Option<&EngineSetup> {
        self.setup.as_ref()
    }

    /// Adopt a new control snapshot. Call between blocks.
    pub fn update(&mut self, controls: &ControlValues) {
        self.delay.update(&controls.delay);
        self.chorus.update(&controls.chorus);
    }

    /// Process one block in place. Silently does nothing before a
    /// successful `prepare()`.
    pub fn process_block(&mut self, mut buffer: StereoBuffer<'_>) {
        if self.setup.is_none() {
            return;
        }

        self.delay.process_block(&mut buffer);
        self.chorus.process_block(&mut buffer);
    }

    /// Clear all audio history. Keeps the current settings.
    pub fn reset(&mut self) {
        self.delay.reset();
        self.chorus.reset();
    }

    /// Samples of output left after the input goes silent.
    pub fn tail_samples(&self) -> u32 {
        let chorus_tail = match (&self.setup, self.chorus.is_active()) {
            (Some(setup), true) => super::ms_to_samples(
                super::chorus::MIN_MOD_DELAY_MS + super::chorus::SWING_MS,
                setup.sample_rate,
            )
            .ceil() as u32,
            _ => 0,
        };
        self.delay.tail_samples() + chorus_tail
    }

    pub fn delay(&self) -> &StereoDelay {
        &self.delay
    }

    pub fn chorus(&self) -> &Chorus {
        &self.chorus
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
