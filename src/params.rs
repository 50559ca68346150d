//! # Plugin Parameters
//!
//! The knobs and switches the host shows for the plugin. Each parameter
//! has a **unique string ID** (`#[id = "..."]`) that the host uses to save
//! and recall sessions. Once published, never change these IDs or saved
//! sessions will lose their settings.
//!
//! ## No host-side smoothing
//!
//! The DSP core smooths every continuous value itself, per sample, with
//! its own one-pole smoothers. The delay *time* is never smoothed at all:
//! a changed time triggers a crossfade between the old and new read
//! positions instead. So none of these parameters use `with_smoother`.
//!
//! ## Publishing changes
//!
//! Every parameter carries a callback that raises a shared dirty flag.
//! The audio thread swaps the flag at the top of each block and, if it
//! was set, rebuilds one [`ControlValues`] snapshot and hands it to the
//! engine. Parameter reads never happen per sample.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nih_plug::prelude::*;

use crate::dsp::controls::{
    names, ControlValues, MAX_CHORUS_FEEDBACK, MAX_CHORUS_RATE_HZ, MAX_DELAY_MS, MAX_FEEDBACK,
    MIN_CHORUS_RATE_HZ, MIN_DELAY_MS, MIN_LOW_PASS_HZ,
};

#[derive(Params)]
pub struct StereoDelayParams {
    /// Raised by every parameter callback, cleared by the audio thread.
    dirty: Arc<AtomicBool>,

    /// **Left Delay**: time until the left echo, 1 ms to 2.5 s.
    #[id = "delay_l"]
    pub delay_left: FloatParam,

    /// **Right Delay**: ignored while **Link** is on.
    #[id = "delay_r"]
    pub delay_right: FloatParam,

    /// **Link**: the right side follows the left delay time.
    #[id = "link"]
    pub link: BoolParam,

    /// **R/L Ratio**: multiplies the right delay time. With link on, 1.5
    /// puts the right echo at a dotted interval of the left.
    #[id = "ratio"]
    pub ratio: FloatParam,

    /// **Feedback**: 0-100% of the knob maps to 0-0.98 of actual loop gain,
    /// so even a maxed knob decays.
    #[id = "feedback"]
    pub feedback: FloatParam,

    #[id = "mix"]
    pub mix: FloatParam,

    /// **Ducking**: how hard the dry signal pushes the echoes down.
    #[id = "ducking"]
    pub ducking: FloatParam,

    /// **Low Pass**: darkens the echoes.
    #[id = "low_pass"]
    pub low_pass: FloatParam,

    /// **High Pass**: thins the echoes.
    #[id = "high_pass"]
    pub high_pass: FloatParam,

    #[id = "ping_pong"]
    pub ping_pong: BoolParam,

    #[id = "delay_on"]
    pub delay_on: BoolParam,

    #[id = "chorus_on"]
    pub chorus_on: BoolParam,

    #[id = "chorus_rate"]
    pub chorus_rate: FloatParam,

    #[id = "chorus_depth"]
    pub chorus_depth: FloatParam,

    #[id = "chorus_mix"]
    pub chorus_mix: FloatParam,

    #[id = "chorus_fdbk"]
    pub chorus_feedback: FloatParam,
}

/// A parameter callback that raises `dirty`.
fn mark_dirty<T: 'static>(dirty: &Arc<AtomicBool>) -> Arc<dyn Fn(T) + Send + Sync> {
    let dirty = dirty.clone();
    Arc::new(move |_| dirty.store(true, Ordering::Release))
}

fn percentage(name: &str, default: f32, max: f32, dirty: &Arc<AtomicBool>) -> FloatParam {
    FloatParam::new(name, default, FloatRange::Linear { min: 0.0, max })
        .with_unit("%")
        .with_value_to_string(formatters::v2s_f32_percentage(1))
        .with_string_to_value(formatters::s2v_f32_percentage())
        .with_callback(mark_dirty(dirty))
}

fn delay_time(name: &str, dirty: &Arc<AtomicBool>) -> FloatParam {
    FloatParam::new(
        name,
        100.0,
        FloatRange::Skewed {
            min: MIN_DELAY_MS,
            max: MAX_DELAY_MS,
            // More knob travel for the short times, where small changes
            // are audible.
            factor: FloatRange::skew_factor(-1.5),
        },
    )
    .with_unit(" ms")
    .with_step_size(0.1)
    .with_callback(mark_dirty(dirty))
}

fn frequency(name: &str, default: f32, min: f32, max: f32, dirty: &Arc<AtomicBool>) -> FloatParam {
    FloatParam::new(
        name,
        default,
        FloatRange::Skewed {
            min,
            max,
            factor: FloatRange::skew_factor(-2.0),
        },
    )
    .with_value_to_string(formatters::v2s_f32_hz_then_khz(1))
    .with_string_to_value(formatters::s2v_f32_hz_then_khz())
    .with_callback(mark_dirty(dirty))
}

fn switch(name: &str, default: bool, dirty: &Arc<AtomicBool>) -> BoolParam {
    BoolParam::new(name, default).with_callback(mark_dirty(dirty))
}

impl Default for StereoDelayParams {
    fn default() -> Self {
        // Raised from the start so the first block adopts whatever the
        // host restored.
        let dirty = Arc::new(AtomicBool::new(true));

        Self {
            delay_left: delay_time("Left Delay", &dirty),
            delay_right: delay_time("Right Delay", &dirty),
            link: switch("Link", true, &dirty),
            ratio: FloatParam::new(
                "R/L Ratio",
                1.0,
                FloatRange::Skewed {
                    min: 0.5,
                    max: 2.0,
                    // Centers 1.0 on the knob.
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit("x")
            .with_step_size(0.01)
            .with_callback(mark_dirty(&dirty)),

            feedback: percentage("Feedback", 0.35, 1.0, &dirty),
            mix: percentage("Mix", 0.35, 1.0, &dirty),
            ducking: percentage("Ducking", 0.0, 1.0, &dirty),
            low_pass: frequency("Low Pass", 12000.0, MIN_LOW_PASS_HZ, 20000.0, &dirty),
            high_pass: frequency("High Pass", 80.0, 0.0, 2000.0, &dirty),
            ping_pong: switch("Ping-Pong", false, &dirty),
            delay_on: switch("Delay", true, &dirty),

            chorus_on: switch("Chorus", false, &dirty),
            chorus_rate: FloatParam::new(
                "Chorus Rate",
                1.0,
                FloatRange::Skewed {
                    min: MIN_CHORUS_RATE_HZ,
                    max: MAX_CHORUS_RATE_HZ,
                    factor: FloatRange::skew_factor(-1.5),
                },
            )
            .with_unit(" Hz")
            .with_step_size(0.01)
            .with_callback(mark_dirty(&dirty)),
            chorus_depth: percentage("Chorus Depth", 0.5, 1.0, &dirty),
            chorus_mix: percentage("Chorus Mix", 0.35, 1.0, &dirty),
            chorus_feedback: percentage("Chorus Feedback", 0.0, MAX_CHORUS_FEEDBACK, &dirty),

            dirty,
        }
    }
}

impl StereoDelayParams {
    /// Clear the dirty flag, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::Acquire)
    }

    /// The current settings as the flat named values the engine
    /// understands.
    ///
    /// Host-only controls are folded in here: link copies the left time
    /// to the right, the ratio scales the right, and the feedback knob is
    /// scaled into the engine's 0..0.98 range.
    pub fn named_values(&self) -> [(&'static str, f32); 14] {
        let left_ms = self.delay_left.value();
        let right_base = if self.link.value() {
            left_ms
        } else {
            self.delay_right.value()
        };
        let right_ms = right_base * self.ratio.value();
        let flag = |p: &BoolParam| if p.value() { 1.0 } else { 0.0 };

        [
            (names::DELAY_L, left_ms),
            (names::DELAY_R, right_ms),
            (names::FEEDBACK, self.feedback.value() * MAX_FEEDBACK),
            (names::MIX, self.mix.value()),
            (names::DUCKING, self.ducking.value()),
            (names::LOW_PASS, self.low_pass.value()),
            (names::HIGH_PASS, self.high_pass.value()),
            (names::PING_PONG, flag(&self.ping_pong)),
            (names::DELAY_ON, flag(&self.delay_on)),
            (names::CHORUS_ON, flag(&self.chorus_on)),
            (names::CHORUS_RATE, self.chorus_rate.value()),
            (names::CHORUS_DEPTH, self.chorus_depth.value()),
            (names::CHORUS_MIX, self.chorus_mix.value()),
            (names::CHORUS_FEEDBACK, self.chorus_feedback.value()),
        ]
    }

    pub fn control_values(&self) -> ControlValues {
        ControlValues::from_named(self.named_values())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_dirty_then_clears() {
        let params = StereoDelayParams::default();

        assert!(params.take_dirty());
        assert!(!params.take_dirty());
    }

    #[test]
    fn test_defaults_match_engine_defaults() {
        let params = StereoDelayParams::default();
        let controls = params.control_values();
        let defaults = ControlValues::default();

        assert_eq!(controls.delay.left_ms, defaults.delay.left_ms);
        assert_eq!(controls.delay.right_ms, defaults.delay.right_ms);
        assert!((controls.delay.feedback - defaults.delay.feedback).abs() < 1e-6);
        assert_eq!(controls.delay.mix, defaults.delay.mix);
        assert_eq!(controls.delay.low_pass_hz, defaults.delay.low_pass_hz);
        assert_eq!(controls.delay.high_pass_hz, defaults.delay.high_pass_hz);
        assert_eq!(controls.delay.enabled, defaults.delay.enabled);
        assert_eq!(controls.chorus, defaults.chorus);
    }

    #[test]
    fn test_every_named_value_is_understood() {
        let params = StereoDelayParams::default();
        let mut controls = ControlValues::default();

        assert_eq!(controls.merge(params.named_values()), 14);
    }
}
