//! # Loveless Stereo Delay
//!
//! A stereo delay with ping-pong, tone shaping, ducking and a chorus,
//! built with [nih-plug](https://github.com/robbert-vdh/nih-plug). Outputs
//! Audio Unit (AUv2), VST3 and CLAP from a single codebase.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──► [StereoDelay] ──► [Chorus] ──► Output
//!            │                 │
//!            │ two feedback    │ two LFO-swept short delays,
//!            │ lines, tone,    │ right LFO a quarter cycle ahead
//!            │ ducking,        │ and 2% faster
//!            │ ping-pong       │
//! ```
//!
//! All the audio work lives in [`dsp`]. This file is only the host
//! binding: it owns the parameters, turns them into one control snapshot
//! when something changes, and forwards audio blocks to the
//! [`Engine`](dsp::engine::Engine).

pub mod dsp;
pub mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::engine::{Engine, EngineSetup, StereoBuffer};
use nih_plug::prelude::*;
use params::StereoDelayParams;

struct LovelessStereoDelay {
    /// Shared with the host, which may read and write it from any thread.
    params: Arc<StereoDelayParams>,

    /// Owned by the audio thread.
    engine: Engine,
}

impl Default for LovelessStereoDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(StereoDelayParams::default()),
            // Empty until initialize() tells us the sample rate.
            engine: Engine::new(),
        }
    }
}

impl Plugin for LovelessStereoDelay {
    const NAME: &'static str = "Loveless Stereo Delay";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo only. Ping-pong and the detuned chorus have no meaning in
    // mono.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    }];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Controls are adopted once per block, so splitting blocks at
    // automation points would only add overhead.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the delay lines for this sample rate.
    ///
    /// Returning `false` tells the host the configuration is unusable.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let setup = EngineSetup {
            sample_rate: buffer_config.sample_rate,
            max_block_size: buffer_config.max_buffer_size as usize,
            channels: audio_io_layout
                .main_output_channels
                .map(|c| c.get() as usize)
                .unwrap_or(0),
        };

        // prepare() settles everything on the current values, so there is
        // nothing left for the first block to adopt.
        self.params.take_dirty();
        let controls = self.params.control_values();

        match self.engine.prepare(setup, &controls) {
            Ok(()) => {
                nih_log!(
                    "initialized at {} Hz, max block {}",
                    setup.sample_rate,
                    setup.max_block_size
                );
                true
            }
            Err(err) => {
                nih_error!("failed to initialize: {err:#}");
                false
            }
        }
    }

    /// Called when playback stops or the plugin is bypassed. Stale echoes
    /// must not bleed into the next playback.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        if self.params.take_dirty() {
            self.engine.update(&self.params.control_values());
        }

        let Some(stereo) = StereoBuffer::from_channels(buffer.as_slice()) else {
            return ProcessStatus::Normal;
        };
        self.engine.process_block(stereo);

        // Keep the host calling process() until the echoes have died
        // away (-60 dB), or the delay would be cut off when a region ends.
        ProcessStatus::Tail(self.engine.tail_samples())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessStereoDelay {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-stereo-delay-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Stereo delay with ping-pong, tone, ducking and chorus");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
        ClapFeature::Chorus,
    ];
}

impl Vst3Plugin for LovelessStereoDelay {
    // `*b"..."` turns a 16-character ASCII literal into `[u8; 16]`.
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssStDelay_v01";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Delay,
        Vst3SubCategory::Stereo,
    ];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports `clap_entry` for CLAP hosts and
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper re-exports the CLAP entry as an AUv2 component so Logic
// Pro can load it.

nih_export_clap!(LovelessStereoDelay);
nih_export_vst3!(LovelessStereoDelay);

clap_wrapper::export_auv2!();
