//! The reverb engine: lifecycle, buffers and the ordered wet chain
//!
//! Audio flows saturation → predelay → warp → reverb core → dynamics →
//! tone shaper, is blended with the dry input, and finally passes the limiter.
//! Everything the audio path touches is allocated in `prepare`.

pub mod lfo;

use crate::dynamics::{DynamicsProcessor, DynamicsSettings, EnvelopeState};
use crate::effects::{
    BrickWallLimiter, Effect, Predelay, ReverbCore, Saturation, ToneShaper, Warp,
};
use crate::error::EngineError;
use crate::modes::EffectiveParameters;
use crate::params::ReverbParameters;
use crate::utils::smoother::{SmoothedParam, DEFAULT_SMOOTH_TIME_MS};

/// Largest channel count the engine accepts
pub const MAX_CHANNELS: usize = 2;

/// Preparation-time configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f64,
    pub max_block_size: usize,
    pub num_channels: usize,
}

impl ProcessSpec {
    pub fn new(sample_rate: f64, max_block_size: usize, num_channels: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            num_channels,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(EngineError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 {
            return Err(EngineError::InvalidBlockSize(self.max_block_size));
        }
        if self.num_channels == 0 || self.num_channels > MAX_CHANNELS {
            return Err(EngineError::UnsupportedChannelCount(self.num_channels));
        }
        Ok(())
    }
}

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, no sample rate known
    Unprepared,
    /// Buffers sized and stages built
    Prepared,
    /// At least one block processed since the last prepare
    Processing,
    /// Clearing memory; only observable from inside `reset`
    Resetting,
}

/// Stages and scratch buffers built for one `ProcessSpec`
struct Chain {
    saturation: Saturation,
    predelay: Predelay,
    warp: Warp,
    reverb: ReverbCore,
    dynamics: DynamicsProcessor,
    tone: ToneShaper,
    limiter: BrickWallLimiter,
    mix: SmoothedParam,
    dry: Vec<Vec<f32>>,
    wet: Vec<Vec<f32>>,
}

impl Chain {
    fn new(spec: &ProcessSpec) -> Self {
        let sr = spec.sample_rate as f32;
        let ch = spec.num_channels;
        Self {
            saturation: Saturation::new(),
            predelay: Predelay::new(sr, ch),
            warp: Warp::new(sr, ch),
            reverb: ReverbCore::new(sr, ch),
            dynamics: DynamicsProcessor::new(sr, ch),
            tone: ToneShaper::new(sr, ch),
            limiter: BrickWallLimiter::new(sr, 1.0),
            mix: SmoothedParam::new(0.5, 0.0, 1.0, sr, DEFAULT_SMOOTH_TIME_MS),
            dry: vec![vec![0.0; spec.max_block_size]; ch],
            wet: vec![vec![0.0; spec.max_block_size]; ch],
        }
    }

    /// Push one snapshot's worth of block-rate values into every stage
    fn configure(&mut self, params: &ReverbParameters, effective: &EffectiveParameters) {
        self.saturation.set_amount(params.saturation);

        // Tempo-synced time is musical and ignores the mode multiplier
        let predelay_ms = params
            .predelay_sync
            .note_ms(params.bpm)
            .unwrap_or(effective.predelay_ms);
        self.predelay.set_delay_ms(predelay_ms);

        self.warp.set_rate(effective.mod_rate_hz);
        self.warp.set_depth(effective.mod_depth);
        self.warp.set_feedback(effective.warp_feedback);
        self.warp.set_mix(effective.warp_mix);

        self.reverb.set_parameters(
            effective.room_size,
            effective.damping,
            effective.width,
            effective.wet_level,
        );
        self.reverb.set_diffusion(params.diffusion);

        self.dynamics.set_settings(DynamicsSettings::from_params(params));

        self.tone.set_low_cut(effective.low_cut_hz);
        self.tone.set_eq(params.eq3_low_db, params.eq3_mid_db, params.eq3_high_db);
        self.tone.set_ms_balance(params.ms_balance);

        self.limiter.set_enabled(params.limiter_on);
        let mix = if params.mix.is_finite() { params.mix } else { 50.0 };
        self.mix.set_target(mix / 100.0);
    }

    fn snap(&mut self) {
        self.predelay.snap();
        self.warp.snap();
        self.reverb.snap();
        self.mix.snap_to_target();
    }

    /// Render `n` samples from `dry` into `wet`
    fn render(&mut self, n: usize, envelopes: &mut EnvelopeState) {
        for (wet, dry) in self.wet.iter_mut().zip(&self.dry) {
            wet[..n].copy_from_slice(&dry[..n]);
        }

        self.saturation.process(&mut self.wet, n);
        self.predelay.process(&mut self.wet, n);
        self.warp.process(&mut self.wet, n);
        self.reverb.process(&mut self.wet, n);
        self.dynamics.process(&mut self.wet, &self.dry, n, envelopes);
        self.tone.process(&mut self.wet, n);

        for i in 0..n {
            let m = self.mix.tick();
            for (wet, dry) in self.wet.iter_mut().zip(&self.dry) {
                wet[i] = wet[i].mul_add(m, dry[i] * (1.0 - m));
            }
        }

        self.limiter.process(&mut self.wet, n);
    }

    fn reset(&mut self) {
        self.saturation.reset();
        self.predelay.reset();
        self.warp.reset();
        self.reverb.reset();
        self.dynamics.reset();
        self.tone.reset();
        self.limiter.reset();
        for buffer in self.dry.iter_mut().chain(self.wet.iter_mut()) {
            buffer.fill(0.0);
        }
    }
}

/// Real-time reverb engine
///
/// Owned by the audio thread. Control values arrive as a fresh
/// `ReverbParameters` snapshot with every `process` call.
pub struct ReverbEngine {
    state: EngineState,
    spec: Option<ProcessSpec>,
    chain: Option<Chain>,
    envelopes: EnvelopeState,
    needs_snap: bool,
    rejection_logged: bool,
}

impl ReverbEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::Unprepared,
            spec: None,
            chain: None,
            envelopes: EnvelopeState::default(),
            needs_snap: true,
            rejection_logged: false,
        }
    }

    /// Size buffers and build every stage for `spec`
    ///
    /// May be called again with a new spec; all memory is rebuilt.
    pub fn prepare(&mut self, spec: ProcessSpec) -> Result<(), EngineError> {
        spec.validate()?;

        log::info!(
            "Preparing reverb engine: {} Hz, {} channel(s), max block {}",
            spec.sample_rate,
            spec.num_channels,
            spec.max_block_size
        );

        self.chain = Some(Chain::new(&spec));
        self.spec = Some(spec);
        self.envelopes.reset();
        self.needs_snap = true;
        self.rejection_logged = false;
        self.state = EngineState::Prepared;
        Ok(())
    }

    /// Zero all envelopes, delay lines and filter memory, keeping buffers
    pub fn reset(&mut self) {
        let previous = self.state;
        self.state = EngineState::Resetting;

        if let Some(chain) = self.chain.as_mut() {
            chain.reset();
        }
        self.envelopes.reset();
        self.needs_snap = true;

        self.state = match previous {
            EngineState::Resetting => EngineState::Prepared,
            other => other,
        };
    }

    /// Process per-channel buffers in place
    ///
    /// Before `prepare`, or with a layout that does not match the prepared
    /// spec, the audio is left untouched and an error is returned.
    pub fn process(
        &mut self,
        channels: &mut [&mut [f32]],
        params: &ReverbParameters,
    ) -> Result<(), EngineError> {
        let spec = self.check_prepared()?;
        if channels.len() != spec.num_channels {
            return self.reject(EngineError::ChannelMismatch {
                expected: spec.num_channels,
                got: channels.len(),
            });
        }
        let n = channels.iter().map(|ch| ch.len()).min().unwrap_or(0);
        if n > spec.max_block_size {
            return self.reject(EngineError::BlockTooLarge {
                len: n,
                max: spec.max_block_size,
            });
        }
        if n == 0 {
            return Ok(());
        }

        let Some(chain) = self.chain.as_mut() else {
            return Err(EngineError::NotPrepared);
        };
        for (dry, input) in chain.dry.iter_mut().zip(channels.iter()) {
            dry[..n].copy_from_slice(&input[..n]);
        }

        self.render(n, params);

        if let Some(chain) = self.chain.as_ref() {
            for (output, wet) in channels.iter_mut().zip(&chain.wet) {
                output[..n].copy_from_slice(&wet[..n]);
            }
        }
        Ok(())
    }

    /// Process an interleaved buffer in place
    pub fn process_interleaved(
        &mut self,
        data: &mut [f32],
        params: &ReverbParameters,
    ) -> Result<(), EngineError> {
        let spec = self.check_prepared()?;
        let num_channels = spec.num_channels;
        if data.len() % num_channels != 0 {
            return self.reject(EngineError::PartialFrame {
                len: data.len(),
                channels: num_channels,
            });
        }
        let n = data.len() / num_channels;
        if n > spec.max_block_size {
            return self.reject(EngineError::BlockTooLarge {
                len: n,
                max: spec.max_block_size,
            });
        }
        if n == 0 {
            return Ok(());
        }

        let Some(chain) = self.chain.as_mut() else {
            return Err(EngineError::NotPrepared);
        };
        for (i, frame) in data.chunks_exact(num_channels).enumerate() {
            for (dry, &sample) in chain.dry.iter_mut().zip(frame) {
                dry[i] = sample;
            }
        }

        self.render(n, params);

        if let Some(chain) = self.chain.as_ref() {
            for (i, frame) in data.chunks_exact_mut(num_channels).enumerate() {
                for (sample, wet) in frame.iter_mut().zip(&chain.wet) {
                    *sample = wet[i];
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, n: usize, params: &ReverbParameters) {
        let Some(chain) = self.chain.as_mut() else {
            return;
        };
        let effective = EffectiveParameters::derive(params);
        chain.configure(params, &effective);
        if self.needs_snap {
            chain.snap();
            self.needs_snap = false;
        }
        chain.render(n, &mut self.envelopes);

        self.state = EngineState::Processing;
    }

    fn check_prepared(&mut self) -> Result<ProcessSpec, EngineError> {
        match self.spec {
            Some(spec) if self.chain.is_some() => Ok(spec),
            _ => self.reject(EngineError::NotPrepared),
        }
    }

    fn reject<T>(&mut self, error: EngineError) -> Result<T, EngineError> {
        if !self.rejection_logged {
            log::warn!("Rejecting audio block, passing through dry: {}", error);
            self.rejection_logged = true;
        }
        Err(error)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Envelope levels after the last processed block
    pub fn envelopes(&self) -> &EnvelopeState {
        &self.envelopes
    }

    /// Length of the predelay currently targeted, in samples
    pub fn predelay_samples(&self) -> Option<f32> {
        self.chain.as_ref().map(|c| c.predelay.target_samples())
    }
}

impl Default for ReverbEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ProcessSpec {
        ProcessSpec::new(48000.0, 512, 2)
    }

    fn quiet_params() -> ReverbParameters {
        ReverbParameters {
            limiter_on: false,
            ..ReverbParameters::default()
        }
    }

    #[test]
    fn test_process_before_prepare_passes_through() {
        let mut engine = ReverbEngine::new();
        let mut left = vec![0.25; 64];
        let mut right = vec![-0.25; 64];
        let result = engine.process(&mut [&mut left[..], &mut right[..]], &quiet_params());
        assert_eq!(result, Err(EngineError::NotPrepared));
        assert!(left.iter().all(|s| *s == 0.25));
        assert!(right.iter().all(|s| *s == -0.25));
        assert_eq!(engine.state(), EngineState::Unprepared);
    }

    #[test]
    fn test_spec_validation() {
        let mut engine = ReverbEngine::new();
        assert_eq!(
            engine.prepare(ProcessSpec::new(48000.0, 512, 6)),
            Err(EngineError::UnsupportedChannelCount(6))
        );
        assert!(matches!(
            engine.prepare(ProcessSpec::new(f64::NAN, 512, 2)),
            Err(EngineError::InvalidSampleRate(_))
        ));
        assert_eq!(
            engine.prepare(ProcessSpec::new(48000.0, 0, 2)),
            Err(EngineError::InvalidBlockSize(0))
        );
        assert_eq!(engine.state(), EngineState::Unprepared);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut engine = ReverbEngine::new();
        engine.reset();
        assert_eq!(engine.state(), EngineState::Unprepared);

        engine.prepare(spec()).unwrap();
        assert_eq!(engine.state(), EngineState::Prepared);

        let mut left = vec![0.0; 128];
        let mut right = vec![0.0; 128];
        engine.process(&mut [&mut left[..], &mut right[..]], &quiet_params()).unwrap();
        assert_eq!(engine.state(), EngineState::Processing);

        engine.reset();
        assert_eq!(engine.state(), EngineState::Processing);

        engine.prepare(ProcessSpec::new(44100.0, 256, 1)).unwrap();
        assert_eq!(engine.state(), EngineState::Prepared);
    }

    #[test]
    fn test_rejects_mismatched_layouts() {
        let mut engine = ReverbEngine::new();
        engine.prepare(spec()).unwrap();

        let mut mono = vec![0.5; 64];
        assert_eq!(
            engine.process(&mut [&mut mono[..]], &quiet_params()),
            Err(EngineError::ChannelMismatch { expected: 2, got: 1 })
        );
        assert!(mono.iter().all(|s| *s == 0.5));

        let mut left = vec![0.0; 1024];
        let mut right = vec![0.0; 1024];
        assert_eq!(
            engine.process(&mut [&mut left[..], &mut right[..]], &quiet_params()),
            Err(EngineError::BlockTooLarge { len: 1024, max: 512 })
        );

        let mut odd = vec![0.25; 7];
        assert_eq!(
            engine.process_interleaved(&mut odd, &quiet_params()),
            Err(EngineError::PartialFrame { len: 7, channels: 2 })
        );
        assert!(odd.iter().all(|s| *s == 0.25));
    }

    #[test]
    fn test_interleaved_matches_planar() {
        let params = ReverbParameters {
            mix: 70.0,
            ..quiet_params()
        };
        let left: Vec<f32> = (0..256).map(|i| ((i as f32) * 0.05).sin() * 0.5).collect();
        let right: Vec<f32> = (0..256).map(|i| ((i as f32) * 0.031).cos() * 0.4).collect();

        let mut planar = ReverbEngine::new();
        planar.prepare(spec()).unwrap();
        let (mut l, mut r) = (left.clone(), right.clone());
        planar.process(&mut [&mut l[..], &mut r[..]], &params).unwrap();

        let mut interleaved = ReverbEngine::new();
        interleaved.prepare(spec()).unwrap();
        let mut data: Vec<f32> = left.iter().zip(&right).flat_map(|(a, b)| [*a, *b]).collect();
        interleaved.process_interleaved(&mut data, &params).unwrap();

        for i in 0..256 {
            assert_eq!(data[2 * i], l[i]);
            assert_eq!(data[2 * i + 1], r[i]);
        }
    }

    #[test]
    fn test_tempo_sync_overrides_free_time() {
        let mut engine = ReverbEngine::new();
        engine.prepare(spec()).unwrap();
        let mut params = quiet_params();
        params.predelay_sync = crate::params::SyncDivision::Eighth;
        params.bpm = Some(120.0);
        params.mode = crate::modes::Mode::Triangle.index() as i32;

        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        engine.process(&mut [&mut left[..], &mut right[..]], &params).unwrap();
        // 1/8 at 120 BPM is 250ms, regardless of the mode's 2x delay
        assert_eq!(engine.predelay_samples(), Some(12000.0));

        params.bpm = None;
        engine.process(&mut [&mut left[..], &mut right[..]], &params).unwrap();
        // free time 100ms x 2
        assert_eq!(engine.predelay_samples(), Some(9600.0));
    }

    #[test]
    fn test_mono_engine_runs() {
        let mut engine = ReverbEngine::new();
        engine.prepare(ProcessSpec::new(44100.0, 256, 1)).unwrap();
        let mut mono: Vec<f32> = (0..256).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect();
        engine.process(&mut [&mut mono[..]], &quiet_params()).unwrap();
        assert!(mono.iter().all(|s| s.is_finite()));
    }
}
