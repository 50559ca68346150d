//! Sine LFO (low-frequency oscillator) for the chorus.
//!
//! A phase accumulator in cycles (`0.0..1.0`) advanced by a per-sample
//! increment of `rate / sample_rate`. The chorus sets the increment directly
//! every sample so that two LFOs can be held at an exact rate ratio.

use std::f32::consts::TAU;

pub struct Lfo {
    /// Position within the cycle, `0.0..1.0`.
    phase: f32,

    /// Where `reset()` puts the phase back to.
    phase_offset: f32,

    /// Cycles advanced per sample.
    increment: f32,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Lfo {
    /// An LFO starting `phase_offset` cycles into its waveform.
    pub fn new(phase_offset: f32) -> Self {
        let phase_offset = phase_offset.rem_euclid(1.0);
        Self {
            phase: phase_offset,
            phase_offset,
            increment: 0.0,
        }
    }

    /// Set the rate in Hz.
    pub fn set_frequency(&mut self, frequency: f32, sample_rate: f32) {
        self.increment = frequency / sample_rate;
    }

    #[inline]
    pub fn set_increment(&mut self, increment: f32) {
        self.increment = increment;
    }

    #[inline]
    pub fn increment(&self) -> f32 {
        self.increment
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Emit the current value (-1..1) and advance one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let value = (TAU * self.phase).sin();
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }

    pub fn reset(&mut self) {
        self.phase = self.phase_offset;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_offset_starts_at_peak() {
        let mut lfo = Lfo::new(0.25);
        assert!((lfo.next_sample() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_one_cycle_returns_to_start() {
        let sample_rate = 1000.0;
        let mut lfo = Lfo::new(0.0);
        lfo.set_frequency(10.0, sample_rate);

        for _ in 0..100 {
            lfo.next_sample();
        }
        let phase = lfo.phase();
        assert!(phase < 1e-4 || phase > 1.0 - 1e-4, "phase drifted to {phase}");
    }

    #[test]
    fn test_output_bounded() {
        let mut lfo = Lfo::new(0.1);
        lfo.set_frequency(7.0, 48000.0);
        for _ in 0..48000 {
            let v = lfo.next_sample();
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_reset_restores_offset() {
        let mut lfo = Lfo::new(0.25);
        lfo.set_frequency(3.0, 48000.0);
        for _ in 0..1234 {
            lfo.next_sample();
        }
        lfo.reset();

        assert_eq!(lfo.phase(), 0.25);
    }
}
