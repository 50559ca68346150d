//! # DSP (Digital Signal Processing) Core
//!
//! Everything that touches audio lives here. The plugin shell in `lib.rs`
//! only talks to [`engine::Engine`] through three calls: `prepare()` once
//! before streaming, `update()` when controls change, and `process_block()`
//! once per audio block.
//!
//! Leaves first:
//!
//! - **`ring_buffer`**: power-of-two circular sample store with fractional
//!   (interpolated) reads. The memory behind every delay and chorus voice.
//! - **`filter`**: one-pole IIR filter, used for tone shaping and inside the
//!   parameter smoother.
//! - **`smoothing`**: [`smoothing::FilteredParameter`], a one-pole smoothed
//!   control value that removes zipper noise from knob moves.
//! - **`envelope`**: attack/release envelope follower driving the ducker.
//! - **`lfo`**: sine LFO for the chorus.
//! - **`fader`**: exponential on/off gain ramp for the chorus.
//! - **`controls`**: typed per-component configuration and the flat named
//!   control snapshot the host layer hands to the engine.
//! - **`stereo_delay`**: feedback delay with ping-pong, tone, ducking and
//!   crossfaded delay-time changes.
//! - **`chorus`**: two detuned, phase-offset modulated delay voices.
//! - **`engine`**: StereoDelay followed by Chorus, behind the host calls.

pub mod chorus;
pub mod controls;
pub mod engine;
pub mod envelope;
pub mod fader;
pub mod filter;
pub mod lfo;
pub mod ring_buffer;
pub mod smoothing;
pub mod stereo_delay;

/// Magnitudes below this are flushed to zero by the recursive filters.
///
/// One-pole recursions decaying toward silence eventually produce subnormal
/// floats, which are an order of magnitude slower on some CPUs.
pub const DENORMAL_THRESHOLD: f32 = 1e-15;

/// Flush a subnormal-bound value to exactly zero.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        x
    }
}

/// Convert a time in milliseconds to a (fractional) number of samples.
///
/// ```text
/// samples = ms * sample_rate / 1000
/// ```
///
/// At 48000 Hz, 100 ms is exactly 4800 samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-20), 0.0);
        assert_eq!(flush_denormal(-1e-20), 0.0);
        assert_eq!(flush_denormal(0.25), 0.25);
        assert_eq!(flush_denormal(-0.25), -0.25);
    }

    #[test]
    fn test_ms_to_samples() {
        assert_eq!(ms_to_samples(100.0, 48000.0), 4800.0);
        assert_eq!(ms_to_samples(50.0, 44100.0), 2205.0);
    }
}
