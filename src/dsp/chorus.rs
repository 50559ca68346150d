//! # Chorus
//!
//! One short modulated delay per channel. The read position sweeps around
//! a 20 ms midpoint, which bends the pitch of the delayed copy up and down;
//! blended with the dry signal that gives the familiar shimmer.
//!
//! ```text
//! offset_ms = 20 + lfo * depth * 10        (10..30 ms at full depth)
//! ```
//!
//! The two channels decorrelate in two ways: the right LFO starts a quarter
//! cycle ahead of the left, and it runs 2% faster. The rate difference makes
//! the phase relationship drift slowly, so the stereo image keeps moving
//! instead of locking into a fixed pattern.
//!
//! Switching the chorus on or off goes through a [`LogarithmicFader`].
//! Once it has faded out completely, `process_block` returns immediately and
//! leaves the buffer untouched.

use super::controls::ChorusConfig;
use super::engine::{EngineSetup, StereoBuffer};
use super::fader::{LogarithmicFader, DEFAULT_FADE_MS};
use super::lfo::Lfo;
use super::ms_to_samples;
use super::ring_buffer::RingBuffer;
use super::smoothing::{FilteredParameter, DEFAULT_SMOOTHING_HZ};

/// Shortest modulated delay. Not to be confused with the echo delay's
/// lower limit in `controls`.
pub const MIN_MOD_DELAY_MS: f32 = 10.0;

/// Full peak-to-peak sweep at depth 1.
pub const SWING_MS: f32 = 20.0;

/// The right LFO runs this much faster than the left.
pub const RIGHT_DETUNE: f32 = 1.02;

/// Right LFO start phase, in cycles.
pub const RIGHT_PHASE_OFFSET: f32 = 0.25;

const MIDPOINT_MS: f32 = MIN_MOD_DELAY_MS + SWING_MS * 0.5;
const HALF_SWING_MS: f32 = SWING_MS * 0.5;

pub struct Chorus {
    sample_rate: f32,
    rings: [RingBuffer; 2],
    lfos: [Lfo; 2],
    rate: FilteredParameter,
    depth: FilteredParameter,
    mix: FilteredParameter,
    feedback: f32,
    fader: LogarithmicFader,
}

impl Default for Chorus {
    fn default() -> Self {
        Self::new()
    }
}

impl Chorus {
    pub fn new() -> Self {
        let config = ChorusConfig::default();
        Self {
            sample_rate: 44100.0,
            rings: [RingBuffer::new(2), RingBuffer::new(2)],
            lfos: [Lfo::new(0.0), Lfo::new(RIGHT_PHASE_OFFSET)],
            rate: FilteredParameter::new(config.rate_hz),
            depth: FilteredParameter::new(config.depth),
            mix: FilteredParameter::new(config.mix),
            feedback: config.feedback,
            fader: LogarithmicFader::default(),
        }
    }

    /// Allocate the voice buffers and settle on `config`. Not real-time
    /// safe.
    pub fn prepare(&mut self, setup: &EngineSetup, config: &ChorusConfig) {
        let sample_rate = setup.sample_rate;
        let config = config.validated();
        self.sample_rate = sample_rate;

        let min_capacity = ms_to_samples(MIN_MOD_DELAY_MS + SWING_MS, sample_rate).ceil() as usize + 2;
        self.rings = [RingBuffer::new(min_capacity), RingBuffer::new(min_capacity)];
        self.lfos = [Lfo::new(0.0), Lfo::new(RIGHT_PHASE_OFFSET)];

        self.rate.prepare(sample_rate, DEFAULT_SMOOTHING_HZ, config.rate_hz);
        self.depth.prepare(sample_rate, DEFAULT_SMOOTHING_HZ, config.depth);
        self.mix.prepare(sample_rate, DEFAULT_SMOOTHING_HZ, config.mix);
        self.feedback = config.feedback;
        self.fader.prepare(sample_rate, DEFAULT_FADE_MS, config.enabled);

        log::debug!(
            "chorus prepared: {} samples per voice, {}",
            self.rings[0].capacity(),
            if config.enabled { "on" } else { "off" }
        );
    }

    pub fn update(&mut self, config: &ChorusConfig) {
        let config = config.validated();

        self.rate.set_value(config.rate_hz);
        self.depth.set_value(config.depth);
        self.mix.set_value(config.mix);
        self.feedback = config.feedback;

        // Coming back from silence: whatever sat in the voices is stale.
        if config.enabled && self.fader.is_silent() {
            for ring in &mut self.rings {
                ring.clear();
            }
            for lfo in &mut self.lfos {
                lfo.reset();
            }
        }
        self.fader.set_on(config.enabled);
    }

    /// Process a block in place.
    ///
    /// # The Algorithm
    ///
    /// Once the fader has gone fully silent the buffer is left untouched.
    /// Otherwise, for each frame:
    ///
    /// 1. **Advance** the smoothed rate, depth and mix, and the fader
    /// 2. **Tune** both LFOs: left at `rate / fs` cycles per sample, right
    ///    at exactly 1.02 times that
    /// 3. **Sweep** each voice's read offset around the midpoint
    /// 4. **Write** the input (plus a little of the voice, if chorus
    ///    feedback is up) into the voice
    /// 5. **Mix** dry and voice by `mix * fader`
    pub fn process_block(&mut self, buffer: &mut StereoBuffer<'_>) {
        if self.fader.is_silent() {
            return;
        }

        for (left, right) in buffer.frames_mut() {
            // Step 1: the fader scales the mix, so switching the chorus
            // in or out is a glide rather than a step.
            let rate = self.rate.next();
            let depth = self.depth.next();
            let amount = self.mix.next() * self.fader.next();

            // Step 2: set both increments from the same smoothed rate so
            // the 2% ratio holds on every sample, even mid-glide.
            let increment = rate / self.sample_rate;
            self.lfos[0].set_increment(increment);
            self.lfos[1].set_increment(increment * RIGHT_DETUNE);

            for (ch, sample) in [left, right].into_iter().enumerate() {
                // Step 3: lfo in -1..1 maps to 20 ms ± depth * 10 ms.
                //
                //   depth = 0.0 → fixed 20 ms (a plain doubler)
                //   depth = 1.0 → 10 ms .. 30 ms
                let modulation = self.lfos[ch].next_sample();
                let offset_ms = MIDPOINT_MS + modulation * depth * HALF_SWING_MS;
                let wet = self.rings[ch].read(ms_to_samples(offset_ms, self.sample_rate));

                // Step 4: read before write, as in the delay lines.
                let dry = *sample;
                self.rings[ch].write(dry + wet * self.feedback);

                // Step 5: linear blend.
                *sample = dry * (1.0 - amount) + wet * amount;
            }
        }
    }

    pub fn reset(&mut self) {
        for ring in &mut self.rings {
            ring.clear();
        }
        for lfo in &mut self.lfos {
            lfo.reset();
        }
        self.rate.snap_to_target();
        self.depth.snap_to_target();
        self.mix.snap_to_target();
        self.fader.reset();
    }

    /// On, or still fading out.
    pub fn is_active(&self) -> bool {
        !self.fader.is_silent()
    }

    /// Current LFO increments, left then right, in cycles per sample.
    pub fn lfo_increments(&self) -> [f32; 2] {
        [self.lfos[0].increment(), self.lfos[1].increment()]
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
