//! # Control Values
//!
//! The host layer talks to the DSP core through one flat snapshot of named
//! values: delay times in ms, gains as 0..1 fractions, cutoffs in Hz, and
//! switches as 0.0/1.0. This module gives that snapshot a type.
//!
//! Each component gets its own config struct ([`DelayConfig`],
//! [`ChorusConfig`]) with sensible defaults and a `validated()` method that
//! clamps every field into its legal range. Components call `validated()`
//! in `prepare()`/`update()`, so out-of-range values are dealt with once per
//! change, never inside the per-sample loop.
//!
//! [`ControlValues`] bundles both configs and implements the by-name
//! contract:
//!
//! - an unknown name is ignored,
//! - a missing name keeps its previous value,
//! - a non-finite value (NaN, ±inf) is ignored.
//!
//! There is no "return 1.0 if the key is missing" fallback: a value that
//! was never set is the documented default below, not a magic number.

/// Longest delay time the engine accepts, in milliseconds.
pub const MAX_DELAY_MS: f32 = 2500.0;

/// Shortest delay time, in milliseconds.
pub const MIN_DELAY_MS: f32 = 1.0;

/// Feedback is capped below unity so the loop always decays.
pub const MAX_FEEDBACK: f32 = 0.98;

pub const MIN_LOW_PASS_HZ: f32 = 20.0;

pub const MIN_CHORUS_RATE_HZ: f32 = 0.05;
pub const MAX_CHORUS_RATE_HZ: f32 = 10.0;
pub const MAX_CHORUS_FEEDBACK: f32 = 0.9;

/// Names accepted by [`ControlValues::set`].
pub mod names {
    pub const DELAY_L: &str = "delay_l";
    pub const DELAY_R: &str = "delay_r";
    pub const FEEDBACK: &str = "feedback";
    pub const MIX: &str = "mix";
    pub const DUCKING: &str = "ducking";
    pub const LOW_PASS: &str = "low_pass";
    pub const HIGH_PASS: &str = "high_pass";
    pub const PING_PONG: &str = "ping_pong";
    pub const DELAY_ON: &str = "delay_on";
    pub const CHORUS_ON: &str = "chorus_on";
    pub const CHORUS_RATE: &str = "chorus_rate";
    pub const CHORUS_DEPTH: &str = "chorus_depth";
    pub const CHORUS_MIX: &str = "chorus_mix";
    pub const CHORUS_FEEDBACK: &str = "chorus_fdbk";
}

/// Settings for [`StereoDelay`](super::stereo_delay::StereoDelay).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayConfig {
    /// Left delay time in ms.
    pub left_ms: f32,
    /// Right delay time in ms.
    pub right_ms: f32,
    /// Fraction of the delayed signal fed back, 0..0.98.
    pub feedback: f32,
    /// Dry/wet balance, 0 (dry) to 1 (wet).
    pub mix: f32,
    /// How far the dry signal's envelope pushes the echoes down, 0..1.
    pub ducking: f32,
    /// Tone lowpass cutoff in Hz. Nyquist or above leaves the echoes open.
    pub low_pass_hz: f32,
    /// Tone highpass cutoff in Hz. 0 removes no lows.
    pub high_pass_hz: f32,
    pub ping_pong: bool,
    pub enabled: bool,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            left_ms: 100.0,
            right_ms: 100.0,
            feedback: 0.35 * MAX_FEEDBACK,
            mix: 0.35,
            ducking: 0.0,
            low_pass_hz: 12000.0,
            high_pass_hz: 80.0,
            ping_pong: false,
            enabled: true,
        }
    }
}

impl DelayConfig {
    /// Every field clamped into range for the given sample rate.
    ///
    /// Below 40 Hz Nyquist drops under the lowpass floor; the floor wins
    /// and the lowpass is simply open.
    pub fn validated(&self, sample_rate: f32) -> Self {
        let nyquist = sample_rate * 0.5;
        Self {
            left_ms: self.left_ms.clamp(MIN_DELAY_MS, MAX_DELAY_MS),
            right_ms: self.right_ms.clamp(MIN_DELAY_MS, MAX_DELAY_MS),
            feedback: self.feedback.clamp(0.0, MAX_FEEDBACK),
            mix: self.mix.clamp(0.0, 1.0),
            ducking: self.ducking.clamp(0.0, 1.0),
            low_pass_hz: self.low_pass_hz.clamp(MIN_LOW_PASS_HZ, nyquist.max(MIN_LOW_PASS_HZ)),
            high_pass_hz: self.high_pass_hz.clamp(0.0, nyquist),
            ping_pong: self.ping_pong,
            enabled: self.enabled,
        }
    }
}

/// Settings for [`Chorus`](super::chorus::Chorus).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusConfig {
    pub enabled: bool,
    /// LFO rate in Hz (the right channel runs slightly faster).
    pub rate_hz: f32,
    /// Modulation depth, 0..1 of the full swing.
    pub depth: f32,
    pub mix: f32,
    pub feedback: f32,
}

impl Default for ChorusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_hz: 1.0,
            depth: 0.5,
            mix: 0.35,
            feedback: 0.0,
        }
    }
}

impl ChorusConfig {
    pub fn validated(&self) -> Self {
        Self {
            enabled: self.enabled,
            rate_hz: self.rate_hz.clamp(MIN_CHORUS_RATE_HZ, MAX_CHORUS_RATE_HZ),
            depth: self.depth.clamp(0.0, 1.0),
            mix: self.mix.clamp(0.0, 1.0),
            feedback: self.feedback.clamp(0.0, MAX_CHORUS_FEEDBACK),
        }
    }
}

/// One snapshot of every control the engine understands.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlValues {
    pub delay: DelayConfig,
    pub chorus: ChorusConfig,
}

impl ControlValues {
    /// Apply one named value. Returns `false` (and changes nothing) for an
    /// unknown name or a non-finite value.
    ///
    /// Switches read as on when `value >= 0.5`.
    pub fn set(&mut self, name: &str, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        let flag = value >= 0.5;

        match name {
            names::DELAY_L => self.delay.left_ms = value,
            names::DELAY_R => self.delay.right_ms = value,
            names::FEEDBACK => self.delay.feedback = value,
            names::MIX => self.delay.mix = value,
            names::DUCKING => self.delay.ducking = value,
            names::LOW_PASS => self.delay.low_pass_hz = value,
            names::HIGH_PASS => self.delay.high_pass_hz = value,
            names::PING_PONG => self.delay.ping_pong = flag,
            names::DELAY_ON => self.delay.enabled = flag,
            names::CHORUS_ON => self.chorus.enabled = flag,
            names::CHORUS_RATE => self.chorus.rate_hz = value,
            names::CHORUS_DEPTH => self.chorus.depth = value,
            names::CHORUS_MIX => self.chorus.mix = value,
            names::CHORUS_FEEDBACK => self.chorus.feedback = value,
            _ => return false,
        }
        true
    }

    /// Apply a batch of named values on top of this snapshot. Names not in
    /// the batch keep their current value. Returns how many were applied.
    pub fn merge<'a, I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut applied = 0;
        for (name, value) in values {
            if self.set(name, value) {
                applied += 1;
            } else {
                log::trace!("ignoring control {name:?} = {value}");
            }
        }
        applied
    }

    /// Builder-style [`merge`](Self::merge) starting from the defaults.
    pub fn from_named<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut controls = Self::default();
        controls.merge(values);
        controls
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_known_names() {
        let mut controls = ControlValues::default();

        assert!(controls.set(names::DELAY_L, 250.0));
        assert!(controls.set(names::FEEDBACK, 0.6));
        assert!(controls.set(names::CHORUS_RATE, 2.5));

        assert_eq!(controls.delay.left_ms, 250.0);
        assert_eq!(controls.delay.feedback, 0.6);
        assert_eq!(controls.chorus.rate_hz, 2.5);
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let mut controls = ControlValues::default();
        let before = controls;

        assert!(!controls.set("sampleRate", 96000.0));
        assert!(!controls.set("Feedback", 0.9));
        assert_eq!(controls, before);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let mut controls = ControlValues::default();
        let before = controls;

        assert!(!controls.set(names::MIX, f32::NAN));
        assert!(!controls.set(names::DELAY_R, f32::INFINITY));
        assert_eq!(controls, before);
    }

    #[test]
    fn test_missing_names_keep_prior_value() {
        let mut controls = ControlValues::from_named([(names::DELAY_L, 300.0), (names::MIX, 0.8)]);
        let applied = controls.merge([(names::MIX, 0.2), ("bogus", 1.0)]);

        assert_eq!(applied, 1);
        assert_eq!(controls.delay.left_ms, 300.0);
        assert_eq!(controls.delay.mix, 0.2);
    }

    #[test]
    fn test_switches_threshold_at_half() {
        let mut controls = ControlValues::default();

        controls.set(names::PING_PONG, 1.0);
        controls.set(names::DELAY_ON, 0.0);
        controls.set(names::CHORUS_ON, 0.49);
        assert!(controls.delay.ping_pong);
        assert!(!controls.delay.enabled);
        assert!(!controls.chorus.enabled);

        controls.set(names::CHORUS_ON, 0.5);
        assert!(controls.chorus.enabled);
    }

    #[test]
    fn test_delay_validation_clamps() {
        let wild = DelayConfig {
            left_ms: 10_000.0,
            right_ms: -5.0,
            feedback: 5.0,
            mix: 1.5,
            ducking: -1.0,
            low_pass_hz: 90_000.0,
            high_pass_hz: -20.0,
            ping_pong: true,
            enabled: true,
        };
        let v = wild.validated(48000.0);

        assert_eq!(v.left_ms, MAX_DELAY_MS);
        assert_eq!(v.right_ms, MIN_DELAY_MS);
        assert_eq!(v.feedback, MAX_FEEDBACK);
        assert_eq!(v.mix, 1.0);
        assert_eq!(v.ducking, 0.0);
        assert_eq!(v.low_pass_hz, 24000.0);
        assert_eq!(v.high_pass_hz, 0.0);
        assert!(v.ping_pong);
    }

    #[test]
    fn test_delay_validation_at_tiny_sample_rate() {
        let config = DelayConfig {
            low_pass_hz: 5000.0,
            ..DelayConfig::default()
        };
        let v = config.validated(30.0);

        assert_eq!(v.low_pass_hz, MIN_LOW_PASS_HZ);
        assert_eq!(v.high_pass_hz, 15.0);
    }

    #[test]
    fn test_chorus_validation_clamps() {
        let wild = ChorusConfig {
            enabled: true,
            rate_hz: 100.0,
            depth: 2.0,
            mix: -0.5,
            feedback: 1.0,
        };
        let v = wild.validated();

        assert_eq!(v.rate_hz, MAX_CHORUS_RATE_HZ);
        assert_eq!(v.depth, 1.0);
        assert_eq!(v.mix, 0.0);
        assert_eq!(v.feedback, MAX_CHORUS_FEEDBACK);
    }

    #[test]
    fn test_defaults_are_already_valid() {
        let controls = ControlValues::default();

        assert_eq!(controls.delay.validated(44100.0), controls.delay);
        assert_eq!(controls.chorus.validated(), controls.chorus);
    }
}
