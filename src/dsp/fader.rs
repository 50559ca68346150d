//! On/off gain with an exponential ramp.
//!
//! Switching an effect in or out by flipping its output between 0 and 1
//! produces a step, and a step is a click. The fader instead glides
//! exponentially toward its target, the same curve a one-pole gives, and
//! snaps the last sliver so "off" ends at exactly 0.0.

/// Distance from the target at which the ramp snaps to it.
const SNAP_DISTANCE: f32 = 1e-4;

/// Default ramp time constant.
pub const DEFAULT_FADE_MS: f32 = 20.0;

pub struct LogarithmicFader {
    gain: f32,
    target: f32,
    coeff: f32,
}

impl Default for LogarithmicFader {
    fn default() -> Self {
        Self::new(44100.0, DEFAULT_FADE_MS, false)
    }
}

impl LogarithmicFader {
    pub fn new(sample_rate: f32, fade_ms: f32, on: bool) -> Self {
        let mut fader = Self {
            gain: 0.0,
            target: 0.0,
            coeff: 0.0,
        };
        fader.prepare(sample_rate, fade_ms, on);
        fader
    }

    /// Set the ramp speed and jump straight to the on/off state.
    pub fn prepare(&mut self, sample_rate: f32, fade_ms: f32, on: bool) {
        let samples = fade_ms / 1000.0 * sample_rate;
        self.coeff = if samples <= 0.0 { 0.0 } else { (-1.0 / samples).exp() };
        self.target = if on { 1.0 } else { 0.0 };
        self.gain = self.target;
    }

    /// Start ramping in or out.
    pub fn set_on(&mut self, on: bool) {
        self.target = if on { 1.0 } else { 0.0 };
    }

    pub fn is_on(&self) -> bool {
        self.target > 0.0
    }

    /// Off and fully faded out.
    pub fn is_silent(&self) -> bool {
        self.target == 0.0 && self.gain == 0.0
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Advance one sample and return the gain.
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.gain != self.target {
            self.gain = self.target + (self.gain - self.target) * self.coeff;
            if (self.gain - self.target).abs() < SNAP_DISTANCE {
                self.gain = self.target;
            }
        }
        self.gain
    }

    /// Jump to the target.
    pub fn reset(&mut self) {
        self.gain = self.target;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
