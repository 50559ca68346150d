//! # One-Pole Filter
//!
//! The simplest IIR (Infinite Impulse Response) filter: one multiply-add of
//! the new input and one of the previous output.
//!
//! ```text
//! z1 = in * a0 + z1 * b1
//! ```
//!
//! with coefficients derived from a cutoff `fc` and sample rate `fs`:
//!
//! ```text
//! b1 = e^(-2π * fc / fs)
//! a0 = 1 - b1
//! ```
//!
//! As written it is a 6 dB/octave lowpass. This crate uses it three ways:
//!
//! - as the delay's tone lowpass,
//! - as the "highpass" half of the tone stage, where its lowpassed output is
//!   *subtracted* from the signal (input minus lowpass is a highpass),
//! - as the smoother inside [`FilteredParameter`](super::smoothing::FilteredParameter),
//!   where it runs at a few Hz on a control value instead of audio.
//!
//! ## Edge cutoffs
//!
//! A cutoff of 0 Hz or below closes the filter completely (`a0 = 0`,
//! `b1 = 0`, state cleared): the output is silence, so subtracting it
//! removes nothing. A cutoff at or above Nyquist opens
//! it completely (`a0 = 1`, `b1 = 0`): the output is the input, bit for bit.
//! Together these give the tone stage an exact bypass at its extremes.
//!
//! ## Precision
//!
//! Coefficients and state are kept in `f64`. At a 3 Hz smoothing cutoff and
//! 48 kHz, `a0` is about 4e-4; in `f32` the per-sample step toward the
//! target drops below one ulp long before the output reaches it, and the
//! filter stalls short of its input.

use std::f64::consts::TAU;

use super::DENORMAL_THRESHOLD;

/// A one-pole (6 dB/octave) lowpass filter.
pub struct OnePoleFilter {
    /// Input gain, `1 - b1`.
    a0: f64,

    /// Feedback gain applied to the previous output.
    b1: f64,

    /// Previous output: the filter's only state.
    z1: f64,

    frequency: f32,
    sample_rate: f32,
}

impl Default for OnePoleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl OnePoleFilter {
    /// A filter initialized to passthrough.
    pub fn new() -> Self {
        Self {
            a0: 1.0,
            b1: 0.0,
            z1: 0.0,
            frequency: f32::INFINITY,
            sample_rate: 44100.0,
        }
    }

    /// Set the sample rate, keeping the cutoff in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    /// Set the cutoff frequency in Hz.
    ///
    /// O(1), but it costs one `exp()`. Callers driving this from a smoothed
    /// value skip the call when the cutoff has not moved.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.update_coefficients();
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// # The Math
    ///
    /// ```text
    /// b1 = e^(-2π * fc / fs)
    /// a0 = 1 - b1
    /// ```
    ///
    /// Higher cutoff: smaller exponent, `b1` closer to 0, less filtering.
    /// Lower cutoff: `b1` closer to 1, more filtering. At 48000 Hz:
    ///
    /// - fc = 12000 Hz → b1 ≈ 0.21
    /// - fc = 1000 Hz  → b1 ≈ 0.88
    /// - fc = 3 Hz     → b1 ≈ 0.9996 (the parameter smoother)
    ///
    /// A closed filter must not keep its old state: a highpass gliding
    /// down to 0 Hz would otherwise subtract a frozen value forever.
    fn update_coefficients(&mut self) {
        let nyquist = self.sample_rate * 0.5;
        if self.frequency <= 0.0 {
            self.a0 = 0.0;
            self.b1 = 0.0;
            self.z1 = 0.0;
            return;
        }

        self.b1 = if self.frequency >= nyquist {
            0.0
        } else {
            (-TAU * f64::from(self.frequency) / f64::from(self.sample_rate)).exp()
        };
        self.a0 = 1.0 - self.b1;
    }

    /// Run one sample through the filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let z1 = f64::from(input) * self.a0 + self.z1 * self.b1;
        self.z1 = if z1.abs() < f64::from(DENORMAL_THRESHOLD) { 0.0 } else { z1 };
        self.z1 as f32
    }

    /// Forget the filter's memory.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
    }

    /// Jump the filter's memory to `value`, as if it had settled there.
    pub fn reset_to(&mut self, value: f32) {
        self.z1 = f64::from(value);
    }

    /// The last output.
    pub fn state(&self) -> f32 {
        self.z1 as f32
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lowpass(frequency: f32, sample_rate: f32) -> OnePoleFilter {
        let mut filter = OnePoleFilter::new();
        filter.set_sample_rate(sample_rate);
        filter.set_frequency(frequency);
        filter
    }

    #[test]
    fn test_passthrough_by_default() {
        let mut filter = OnePoleFilter::new();

        assert_eq!(filter.process(1.0), 1.0);
        assert_eq!(filter.process(-0.3), -0.3);
    }

    #[test]
    fn test_coefficients_match_formula() {
        let filter = lowpass(1000.0, 48000.0);
        let expected_b1 = (-std::f32::consts::TAU * 1000.0 / 48000.0).exp();

        assert!((filter.b1 as f32 - expected_b1).abs() < 1e-6);
        assert!((filter.a0 + filter.b1 - 1.0).abs() < 1e-12);
    }

    /// The first output from a cold filter is just the input scaled by a0.
    #[test]
    fn test_first_output_is_input_times_a0() {
        let mut filter = lowpass(500.0, 44100.0);
        let a0 = filter.a0 as f32;

        let out = filter.process(0.8);
        assert!((out - 0.8 * a0).abs() < 1e-7, "expected {}, got {out}", 0.8 * a0);
    }

    /// Constant input: the output rises monotonically and settles on the
    /// input within a few time constants.
    #[test]
    fn test_converges_monotonically_to_dc() {
        let sample_rate = 48000.0;
        let cutoff = 100.0;
        let mut filter = lowpass(cutoff, sample_rate);

        // One time constant is fs / (2π fc) samples; ten of them is far
        // past -60 dB.
        let bound = (10.0 * sample_rate / (std::f32::consts::TAU * cutoff)) as usize;
        let mut prev = 0.0;
        for _ in 0..bound {
            let out = filter.process(0.5);
            // Allow one ulp of rounding once the output has settled.
            assert!(out >= prev - 1e-7, "output went backwards: {prev} -> {out}");
            assert!(out <= 0.5 + 1e-7, "output overshot: {out}");
            prev = out;
        }
        assert!((prev - 0.5).abs() < 1e-4, "expected ~0.5, got {prev}");
    }

    #[test]
    fn test_attenuates_nyquist() {
        let mut filter = lowpass(100.0, 44100.0);

        let mut max_output = 0.0_f32;
        for i in 0..1000 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            max_output = max_output.max(filter.process(input).abs());
        }

        assert!(max_output < 0.05, "expected heavy attenuation, got {max_output}");
    }

    #[test]
    fn test_edge_cutoffs() {
        let mut open = lowpass(24000.0, 48000.0);
        assert_eq!(open.process(0.37), 0.37);

        let mut closed = lowpass(0.0, 48000.0);
        assert_eq!(closed.process(1.0), 0.0);
        closed.reset_to(0.5);
        assert_eq!(closed.process(1.0), 0.0);
    }

    /// Closing a filter that has been running drops its state, so nothing
    /// stale leaks out afterwards.
    #[test]
    fn test_closing_clears_state() {
        let mut filter = lowpass(200.0, 48000.0);
        for _ in 0..48000 {
            filter.process(1.0);
        }
        assert!(filter.state() > 0.99);

        filter.set_frequency(0.0);
        assert_eq!(filter.state(), 0.0);
        assert_eq!(filter.process(1.0), 0.0);
    }

    #[test]
    fn test_sample_rate_change_recomputes() {
        let mut filter = lowpass(1000.0, 48000.0);
        let b1_48k = filter.b1;
        filter.set_sample_rate(96000.0);

        assert!(filter.b1 > b1_48k, "same cutoff at a higher rate needs a larger b1");
    }

    #[test]
    fn test_decay_flushes_to_zero() {
        let mut filter = lowpass(5000.0, 48000.0);
        filter.process(1.0);
        for _ in 0..100_000 {
            filter.process(0.0);
        }

        assert_eq!(filter.state(), 0.0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = lowpass(1000.0, 44100.0);
        filter.process(1.0);
        assert!(filter.state() > 0.0);

        filter.reset();
        assert_eq!(filter.state(), 0.0);
    }
}
