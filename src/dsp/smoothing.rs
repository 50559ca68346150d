//! Per-sample parameter smoothing.
//!
//! Knob values arrive once per block, as steps. Fed straight into the
//! audio math, a step in gain or cutoff is an audible click ("zipper
//! noise"). A [`FilteredParameter`] runs the raw value through a very slow
//! one-pole lowpass so the audio loop sees a smooth exponential glide
//! instead.
//!
//! `next()` advances the smoother by one sample. Call it exactly once per
//! sample and keep the result in a local if the value is needed twice:
//! calling it twice in the same sample advances the glide twice as fast.

use super::filter::OnePoleFilter;

/// Default smoothing cutoff. Around 50 ms to reach 63% of a step.
pub const DEFAULT_SMOOTHING_HZ: f32 = 3.0;

/// Relative distance from the target below which the glide snaps to it.
const SETTLE_TOLERANCE: f32 = 1e-6;

/// A control value smoothed by a one-pole lowpass.
pub struct FilteredParameter {
    filter: OnePoleFilter,

    /// The raw, unsmoothed target.
    value: f32,

    /// The last smoothed value handed out by `next()`.
    current: f32,
}

impl Default for FilteredParameter {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl FilteredParameter {
    /// A parameter already settled on `initial`, smoothing at the default
    /// cutoff and 44.1 kHz until `prepare()` says otherwise.
    pub fn new(initial: f32) -> Self {
        let mut param = Self {
            filter: OnePoleFilter::new(),
            value: initial,
            current: initial,
        };
        param.prepare(44100.0, DEFAULT_SMOOTHING_HZ, initial);
        param
    }

    /// Set the sample rate and smoothing cutoff, and settle on `initial`.
    ///
    /// The smoother starts *at* the initial value rather than gliding up
    /// from zero, so nothing ramps when playback starts.
    pub fn prepare(&mut self, sample_rate: f32, cutoff_hz: f32, initial: f32) {
        self.filter.set_sample_rate(sample_rate);
        self.filter.set_frequency(cutoff_hz);
        self.value = initial;
        self.snap_to_target();
    }

    /// Set a new target. Takes effect gradually over the following
    /// `next()` calls.
    #[inline]
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let smoothed = self.filter.process(self.value);
        let tolerance = SETTLE_TOLERANCE * self.value.abs().max(1.0);

        self.current = if (smoothed - self.value).abs() <= tolerance {
            self.filter.reset_to(self.value);
            self.value
        } else {
            smoothed
        };
        self.current
    }

    /// The value most recently returned by `next()`.
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// The raw target.
    #[inline]
    pub fn target(&self) -> f32 {
        self.value
    }

    pub fn is_smoothing(&self) -> bool {
        self.current != self.value
    }

    /// Jump straight to the target.
    pub fn snap_to_target(&mut self) {
        self.filter.reset_to(self.value);
        self.current = self.value;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
