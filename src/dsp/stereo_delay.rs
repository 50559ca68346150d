//! # Stereo Delay
//!
//! Two feedback delay lines (left and right) with tone shaping on the
//! echoes, ducking against the dry signal, optional ping-pong routing, and
//! click-free delay time changes.
//!
//! ## Signal Flow (one channel, normal routing)
//!
//! ```text
//! in ──┬─────────────────────────────────────────────── × (1 - mix) ──┐
//!      │                                                              │
//!      ├──► [EnvFollower] ──► duck gain ─────────┐                    │
//!      │                                          ▼                    │
//!      └──►(+)──► [Ring Buffer] ──┬──► [LP] ──► [- LP(hp)] ──► (×) ── × mix ──►(+)──► out
//!           ▲                     │     tone shaping           ducking
//!           │                     │
//!           └──── × feedback ◄────┘
//! ```
//!
//! The tone filters sit on the *output* of the ring buffer, not inside the
//! loop: they color what you hear without changing what gets fed back.
//!
//! ## Ping-Pong
//!
//! With ping-pong on, both inputs are summed into the left line and the
//! right line is fed only by the left line's output:
//!
//! ```text
//! left  line  <-  inL + inR + readR * feedback
//! right line  <-  readL * feedback
//! ```
//!
//! Energy crosses sides on every trip, so the echoes alternate left,
//! right, left, ... each one `feedback` quieter than the last.
//!
//! ## Changing the delay time
//!
//! Jumping the read head to a new position is a discontinuity (a click);
//! sliding it there is a pitch bend. Instead, when a new length is
//! requested, the engine reads *both* the old and the new tap and
//! crossfades between them over 50 ms:
//!
//! ```text
//! crossfade == 0          stable: one tap per channel
//! 0 < crossfade <= 1      retargeting: old * (1 - x) + new * x, x += inc
//! crossfade > 1           done: old <- new, crossfade <- 0
//! ```
//!
//! Only one crossfade runs at a time. A length change requested while one
//! is in flight is dropped; the host's next change after the crossfade
//! completes is picked up normally.

use super::controls::{DelayConfig, MAX_DELAY_MS};
use super::engine::{EngineSetup, StereoBuffer};
use super::envelope::EnvFollower;
use super::filter::OnePoleFilter;
use super::ms_to_samples;
use super::ring_buffer::RingBuffer;
use super::smoothing::{FilteredParameter, DEFAULT_SMOOTHING_HZ};

/// Length of a delay-time crossfade.
pub const CROSSFADE_SECONDS: f32 = 0.05;

/// Ducking detector attack and release.
pub const DUCK_ATTACK_MS: f32 = 20.0;
pub const DUCK_RELEASE_MS: f32 = 20.0;

const LEFT: usize = 0;
const RIGHT: usize = 1;

pub struct StereoDelay {
    sample_rate: f32,

    /// One delay line per channel.
    rings: [RingBuffer; 2],

    /// Tone lowpass, per channel.
    low_pass: [OnePoleFilter; 2],

    /// One-pole lowpass at the highpass cutoff. Its output is subtracted
    /// from the lowpassed signal, which leaves the highpassed part.
    high_pass: [OnePoleFilter; 2],

    /// Dry-signal envelope per channel, for ducking.
    followers: [EnvFollower; 2],

    feedback: FilteredParameter,
    mix: FilteredParameter,
    ducking: FilteredParameter,
    low_pass_hz: FilteredParameter,
    high_pass_hz: FilteredParameter,

    /// Active delay length per channel, in samples.
    delay_sizes: [f32; 2],

    /// Length being crossfaded toward.
    target_sizes: [f32; 2],

    /// 0 when stable; otherwise the weight of the target tap.
    crossfade: f32,

    /// Per-sample crossfade step, `1 / (0.05 s * sample_rate)`.
    crossfade_inc: f32,

    /// Largest length the rings can hold.
    max_size: f32,

    ping_pong: bool,
    enabled: bool,
}

impl Default for StereoDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoDelay {
    /// An unprepared delay. Call [`prepare`](Self::prepare) before
    /// streaming; until then the rings are too small to be useful.
    pub fn new() -> Self {
        let config = DelayConfig::default();
        Self {
            sample_rate: 44100.0,
            rings: [RingBuffer::new(2), RingBuffer::new(2)],
            low_pass: [OnePoleFilter::new(), OnePoleFilter::new()],
            high_pass: [OnePoleFilter::new(), OnePoleFilter::new()],
            followers: [EnvFollower::default(), EnvFollower::default()],
            feedback: FilteredParameter::new(config.feedback),
            mix: FilteredParameter::new(config.mix),
            ducking: FilteredParameter::new(config.ducking),
            low_pass_hz: FilteredParameter::new(config.low_pass_hz),
            high_pass_hz: FilteredParameter::new(config.high_pass_hz),
            delay_sizes: [1.0; 2],
            target_sizes: [1.0; 2],
            crossfade: 0.0,
            crossfade_inc: 1.0,
            max_size: 1.0,
            ping_pong: config.ping_pong,
            enabled: config.enabled,
        }
    }

    /// Allocate the delay lines for the longest supported delay and settle
    /// every parameter on `config`. Not real-time safe.
    pub fn prepare(&mut self, setup: &EngineSetup, config: &DelayConfig) {
        let sample_rate = setup.sample_rate;
        let config = config.validated(sample_rate);
        self.sample_rate = sample_rate;

        // Two extra slots: one because a length of L reads offset L - 1
        // plus its interpolation neighbour, one for rounding.
        let min_capacity = ms_to_samples(MAX_DELAY_MS, sample_rate).ceil() as usize + 2;
        self.rings = [RingBuffer::new(min_capacity), RingBuffer::new(min_capacity)];
        self.max_size = (self.rings[LEFT].capacity() - 1) as f32;

        for ch in [LEFT, RIGHT] {
            self.low_pass[ch].set_sample_rate(sample_rate);
            self.low_pass[ch].set_frequency(config.low_pass_hz);
            self.low_pass[ch].reset();
            self.high_pass[ch].set_sample_rate(sample_rate);
            self.high_pass[ch].set_frequency(config.high_pass_hz);
            self.high_pass[ch].reset();
            self.followers[ch].prepare(sample_rate, DUCK_ATTACK_MS, DUCK_RELEASE_MS);
        }

        self.feedback.prepare(sample_rate, DEFAULT_SMOOTHING_HZ, config.feedback);
        self.mix.prepare(sample_rate, DEFAULT_SMOOTHING_HZ, config.mix);
        self.ducking.prepare(sample_rate, DEFAULT_SMOOTHING_HZ, config.ducking);
        self.low_pass_hz.prepare(sample_rate, DEFAULT_SMOOTHING_HZ, config.low_pass_hz);
        self.high_pass_hz.prepare(sample_rate, DEFAULT_SMOOTHING_HZ, config.high_pass_hz);

        let sizes = self.sizes_for(&config);
        self.delay_sizes = sizes;
        self.target_sizes = sizes;
        self.crossfade = 0.0;
        self.crossfade_inc = 1.0 / (CROSSFADE_SECONDS * sample_rate);

        self.ping_pong = config.ping_pong;
        self.enabled = config.enabled;

        log::debug!(
            "stereo delay prepared: {} samples per line, lengths {:?}",
            self.rings[LEFT].capacity(),
            self.delay_sizes
        );
    }

    /// Adopt a new control snapshot. Called at block boundaries.
    ///
    /// Smoothed values glide to their new targets. A new delay length
    /// starts a crossfade, unless one is already running, in which case the
    /// request is dropped.
    pub fn update(&mut self, config: &DelayConfig) {
        let config = config.validated(self.sample_rate);

        self.enabled = config.enabled;
        self.ping_pong = config.ping_pong;

        self.feedback.set_value(config.feedback);
        self.mix.set_value(config.mix);
        self.ducking.set_value(config.ducking);
        self.low_pass_hz.set_value(config.low_pass_hz);
        self.high_pass_hz.set_value(config.high_pass_hz);

        if self.crossfade == 0.0 {
            let targets = self.sizes_for(&config);
            if targets != self.delay_sizes {
                self.target_sizes = targets;
                self.crossfade = self.crossfade_inc;
            }
        }
    }

    fn sizes_for(&self, config: &DelayConfig) -> [f32; 2] {
        [config.left_ms, config.right_ms]
            .map(|ms| ms_to_samples(ms, self.sample_rate).clamp(1.0, self.max_size))
    }

    /// Process a block in place. Does nothing while bypassed.
    ///
    /// # The Algorithm
    ///
    /// For each frame:
    ///
    /// 1. **Advance** every smoothed control by one sample
    /// 2. **Read** both lines at the active length (blending toward the
    ///    target length while a crossfade runs)
    /// 3. **Write** the input plus `read * feedback` back into the lines,
    ///    crossed over when ping-pong is on
    /// 4. **Shape** the delayed signal: tone filters, then ducking
    /// 5. **Mix** dry and wet
    ///
    /// The write in step 3 uses the *unfiltered* read, so the tone
    /// controls color the echoes without compounding on every trip.
    pub fn process_block(&mut self, buffer: &mut StereoBuffer<'_>) {
        if !self.enabled {
            return;
        }

        for (left, right) in buffer.frames_mut() {
            // Step 1: each smoothed value advances exactly once per
            // sample. Calling next() twice would glide twice as fast.
            let feedback = self.feedback.next();
            let mix = self.mix.next();
            let ducking = self.ducking.next();
            let low_pass_hz = self.low_pass_hz.next();
            let high_pass_hz = self.high_pass_hz.next();
            self.set_tone(low_pass_hz, high_pass_hz);

            // Step 2: read before writing, so a length of L samples
            // really is L samples late.
            let dry = [*left, *right];
            let read = self.read_taps();

            // Step 3: feed back. In ping-pong mode the left line takes
            // both inputs plus the right line's echo, and the right line
            // only ever hears the left line's echo:
            //
            //   impulse → left (D) → right (2D) → left (3D) → ...
            let (write_l, write_r) = if self.ping_pong {
                (dry[LEFT] + dry[RIGHT] + read[RIGHT] * feedback, read[LEFT] * feedback)
            } else {
                (dry[LEFT] + read[LEFT] * feedback, dry[RIGHT] + read[RIGHT] * feedback)
            };
            self.rings[LEFT].write(write_l);
            self.rings[RIGHT].write(write_r);

            // Step 4: tone and ducking on the way out.
            let wet_l = self.shape(LEFT, read[LEFT], dry[LEFT], ducking);
            let wet_r = self.shape(RIGHT, read[RIGHT], dry[RIGHT], ducking);

            // Step 5: linear dry/wet blend.
            //   mix = 0.0 → input only
            //   mix = 1.0 → echoes only
            *left = dry[LEFT] * (1.0 - mix) + wet_l * mix;
            *right = dry[RIGHT] * (1.0 - mix) + wet_r * mix;
        }
    }

    /// Read both lines at the active length, crossfading toward the target
    /// length while a retarget is in flight.
    #[inline]
    fn read_taps(&mut self) -> [f32; 2] {
        // The read comes before this sample's write, so a length of L
        // samples is offset L - 1 from the newest stored sample.
        let mut read = [
            self.rings[LEFT].read(self.delay_sizes[LEFT] - 1.0),
            self.rings[RIGHT].read(self.delay_sizes[RIGHT] - 1.0),
        ];

        if self.crossfade > 0.0 {
            let x = self.crossfade;
            for (ch, value) in read.iter_mut().enumerate() {
                let next = self.rings[ch].read(self.target_sizes[ch] - 1.0);
                *value = *value * (1.0 - x) + next * x;
            }

            self.crossfade += self.crossfade_inc;
            if self.crossfade > 1.0 {
                self.delay_sizes = self.target_sizes;
                self.crossfade = 0.0;
            }
        }

        read
    }

    /// Recompute tone coefficients only when a cutoff actually moved.
    #[inline]
    fn set_tone(&mut self, low_pass_hz: f32, high_pass_hz: f32) {
        if low_pass_hz != self.low_pass[LEFT].frequency() {
            for filter in &mut self.low_pass {
                filter.set_frequency(low_pass_hz);
            }
        }
        if high_pass_hz != self.high_pass[LEFT].frequency() {
            for filter in &mut self.high_pass {
                filter.set_frequency(high_pass_hz);
            }
        }
    }

    /// Tone-shape and duck one channel's delayed signal.
    ///
    /// ```text
    /// lp   = lowpass(read)
    /// wet  = lp - onepole_hp(lp)          (keeps what is above hp)
    /// wet *= max(0, 1 - envelope * ducking)
    /// ```
    ///
    /// With the highpass at 0 Hz its filter outputs silence and `wet` is
    /// just `lp`.
    #[inline]
    fn shape(&mut self, ch: usize, read: f32, dry: f32, ducking: f32) -> f32 {
        let low_passed = self.low_pass[ch].process(read);
        let mut wet = low_passed - self.high_pass[ch].process(low_passed);

        // Track the dry envelope continuously so turning ducking up starts
        // from the current level rather than from silence.
        let envelope = self.followers[ch].process(dry);
        if ducking > 0.0 {
            wet *= (1.0 - envelope * ducking).max(0.0);
        }
        wet
    }

    /// Clear the delay lines and filter memories, and finish any crossfade.
    pub fn reset(&mut self) {
        for ring in &mut self.rings {
            ring.clear();
        }
        for filter in self.low_pass.iter_mut().chain(self.high_pass.iter_mut()) {
            filter.reset();
        }
        for follower in &mut self.followers {
            follower.reset();
        }
        for param in [
            &mut self.feedback,
            &mut self.mix,
            &mut self.ducking,
            &mut self.low_pass_hz,
            &mut self.high_pass_hz,
        ] {
            param.snap_to_target();
        }
        self.delay_sizes = self.target_sizes;
        self.crossfade = 0.0;
    }

    /// How long the echoes ring on after the input stops, in samples.
    ///
    /// Each trip through the loop scales the signal by `feedback`, so the
    /// tail has fallen 60 dB after `log(0.001) / log(feedback)` trips.
    pub fn tail_samples(&self) -> u32 {
        if !self.enabled {
            return 0;
        }

        let longest = self
            .delay_sizes
            .iter()
            .chain(self.target_sizes.iter())
            .fold(0.0_f32, |acc, &size| acc.max(size));
        let feedback = self.feedback.target();

        if feedback > 0.001 {
            let trips = (-3.0 / feedback.log10()).ceil();
            (trips * longest) as u32
        } else {
            longest as u32
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_ping_pong(&self) -> bool {
        self.ping_pong
    }

    /// Active delay length per channel, in samples.
    pub fn delay_sizes(&self) -> [f32; 2] {
        self.delay_sizes
    }

    pub fn target_sizes(&self) -> [f32; 2] {
        self.target_sizes
    }

    /// 0 when stable, otherwise progress of the running crossfade.
    pub fn crossfade(&self) -> f32 {
        self.crossfade
    }

    pub fn crossfade_increment(&self) -> f32 {
        self.crossfade_inc
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
