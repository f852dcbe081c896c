//! Parameter schema and the per-block parameter snapshot.
//!
//! `PARAM_SPECS` holds the identifier, range, default, skew and step of
//! every parameter, indexed by `ParamId`.

use serde::{Deserialize, Serialize};

/// Number of parameters in the schema
pub const PARAM_COUNT: usize = 24;

/// One denormalized value per `ParamId`, indexed by `ParamId::index`
pub type ParameterValues = [f32; PARAM_COUNT];

/// Host-visible parameter identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    Mix,
    Width,
    Delay,
    Warp,
    Feedback,
    Density,
    ModRate,
    ModDepth,
    DynFreq,
    DynQ,
    DynGain,
    DynDepth,
    DynThresh,
    Ducking,
    PredelaySync,
    Saturation,
    Diffusion,
    GateThresh,
    Eq3Low,
    Eq3Mid,
    Eq3High,
    MsBalance,
    Limiter,
    Mode,
}

/// How a parameter's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    /// Integer index into a list of named choices
    Choice(&'static [&'static str]),
    Bool,
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub id: ParamId,
    /// Identifier used for persistence
    pub key: &'static str,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// Skew exponent for normalized mapping (1.0 = linear)
    pub skew: f32,
    /// Snapping interval in denormalized units (0.0 = continuous)
    pub step: f32,
    pub kind: ParamKind,
}

pub const SYNC_NAMES: &[&str] = &["Free", "1/4", "1/8", "1/16"];

const fn float(
    id: ParamId,
    key: &'static str,
    name: &'static str,
    min: f32,
    max: f32,
    default: f32,
) -> ParamSpec {
    ParamSpec {
        id,
        key,
        name,
        min,
        max,
        default,
        skew: 1.0,
        step: 0.0,
        kind: ParamKind::Float,
    }
}

/// The full schema, indexed by `ParamId as usize`.
pub static PARAM_SPECS: [ParamSpec; PARAM_COUNT] = [
    float(ParamId::Mix, "MIX", "Mix", 0.0, 100.0, 50.0),
    float(ParamId::Width, "WIDTH", "Width", 0.0, 100.0, 100.0),
    float(ParamId::Delay, "DELAY", "Delay", 0.0, 1000.0, 100.0),
    float(ParamId::Warp, "WARP", "Warp", 0.0, 100.0, 0.0),
    float(ParamId::Feedback, "FEEDBACK", "Feedback", 0.0, 100.0, 50.0),
    float(ParamId::Density, "DENSITY", "Density", 0.0, 100.0, 0.0),
    float(ParamId::ModRate, "MODRATE", "Mod Rate", 0.0, 5.0, 0.5),
    float(ParamId::ModDepth, "MODDEPTH", "Mod Depth", 0.0, 100.0, 50.0),
    ParamSpec {
        id: ParamId::DynFreq,
        key: "DYNFREQ",
        name: "Dyn Freq",
        min: 20.0,
        max: 20000.0,
        default: 1000.0,
        skew: 0.3,
        step: 1.0,
        kind: ParamKind::Float,
    },
    float(ParamId::DynQ, "DYNQ", "Dyn Q", 0.1, 10.0, 1.0),
    float(ParamId::DynGain, "DYNGAIN", "Dyn Gain", -18.0, 18.0, 0.0),
    float(ParamId::DynDepth, "DYNDEPTH", "Dyn Depth", -18.0, 18.0, 0.0),
    float(ParamId::DynThresh, "DYNTHRESH", "Dyn Thresh", -60.0, 0.0, -20.0),
    float(ParamId::Ducking, "DUCKING", "Ducking", 0.0, 100.0, 0.0),
    ParamSpec {
        id: ParamId::PredelaySync,
        key: "PREDELAY_SYNC",
        name: "Sync",
        min: 0.0,
        max: 3.0,
        default: 0.0,
        skew: 1.0,
        step: 1.0,
        kind: ParamKind::Choice(SYNC_NAMES),
    },
    float(ParamId::Saturation, "SATURATION", "Saturation", 0.0, 100.0, 0.0),
    float(ParamId::Diffusion, "DIFFUSION", "Diffusion", 0.0, 100.0, 100.0),
    float(ParamId::GateThresh, "GATE_THRESH", "Gate Thresh", -100.0, 0.0, -100.0),
    float(ParamId::Eq3Low, "EQ3_LOW", "Low Gain", -12.0, 12.0, 0.0),
    float(ParamId::Eq3Mid, "EQ3_MID", "Mid Gain", -12.0, 12.0, 0.0),
    float(ParamId::Eq3High, "EQ3_HIGH", "High Gain", -12.0, 12.0, 0.0),
    float(ParamId::MsBalance, "MS_BALANCE", "M/S Bal", 0.0, 100.0, 50.0),
    ParamSpec {
        id: ParamId::Limiter,
        key: "LIMITER",
        name: "Limiter",
        min: 0.0,
        max: 1.0,
        default: 1.0,
        skew: 1.0,
        step: 1.0,
        kind: ParamKind::Bool,
    },
    ParamSpec {
        id: ParamId::Mode,
        key: "MODE",
        name: "Mode",
        min: 0.0,
        max: 20.0,
        default: 0.0,
        skew: 1.0,
        step: 1.0,
        kind: ParamKind::Choice(crate::modes::MODE_NAMES),
    },
];

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Mix,
        ParamId::Width,
        ParamId::Delay,
        ParamId::Warp,
        ParamId::Feedback,
        ParamId::Density,
        ParamId::ModRate,
        ParamId::ModDepth,
        ParamId::DynFreq,
        ParamId::DynQ,
        ParamId::DynGain,
        ParamId::DynDepth,
        ParamId::DynThresh,
        ParamId::Ducking,
        ParamId::PredelaySync,
        ParamId::Saturation,
        ParamId::Diffusion,
        ParamId::GateThresh,
        ParamId::Eq3Low,
        ParamId::Eq3Mid,
        ParamId::Eq3High,
        ParamId::MsBalance,
        ParamId::Limiter,
        ParamId::Mode,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static ParamSpec {
        &PARAM_SPECS[self.index()]
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    /// Look up an identifier by its persistence key (case-sensitive).
    pub fn from_key(key: &str) -> Option<ParamId> {
        PARAM_SPECS.iter().find(|spec| spec.key == key).map(|spec| spec.id)
    }
}

impl ParamSpec {
    /// Clamp into range and snap to the step. Non-finite input gives the default.
    pub fn sanitize(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        match self.kind {
            ParamKind::Bool => {
                if clamped >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            _ if self.step > 0.0 => {
                let snapped = self.min + ((clamped - self.min) / self.step).round() * self.step;
                snapped.clamp(self.min, self.max)
            }
            _ => clamped,
        }
    }

    /// Map a denormalized value to 0..1, honouring the skew.
    pub fn normalize(&self, value: f32) -> f32 {
        let proportion = ((self.sanitize(value) - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if self.skew != 1.0 && proportion > 0.0 {
            proportion.powf(self.skew)
        } else {
            proportion
        }
    }

    /// Map 0..1 back to the parameter range.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let mut proportion = normalized.clamp(0.0, 1.0);
        if self.skew != 1.0 && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew).exp();
        }
        self.sanitize(self.min + (self.max - self.min) * proportion)
    }
}

/// Predelay tempo division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncDivision {
    #[default]
    Free,
    Quarter,
    Eighth,
    Sixteenth,
}

impl SyncDivision {
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => SyncDivision::Quarter,
            2 => SyncDivision::Eighth,
            3 => SyncDivision::Sixteenth,
            _ => SyncDivision::Free,
        }
    }

    pub fn index(self) -> i32 {
        match self {
            SyncDivision::Free => 0,
            SyncDivision::Quarter => 1,
            SyncDivision::Eighth => 2,
            SyncDivision::Sixteenth => 3,
        }
    }

    /// Note length in milliseconds at `bpm`, or `None` in free mode or
    /// without a usable tempo.
    pub fn note_ms(self, bpm: Option<f64>) -> Option<f32> {
        let bpm = bpm.filter(|b| b.is_finite() && *b > 0.0)?;
        let quarter_ms = 60_000.0 / bpm;
        let ms = match self {
            SyncDivision::Free => return None,
            SyncDivision::Quarter => quarter_ms,
            SyncDivision::Eighth => quarter_ms / 2.0,
            SyncDivision::Sixteenth => quarter_ms / 4.0,
        };
        Some(ms as f32)
    }
}

/// Immutable set of control values handed to the engine once per block.
///
/// Values are the denormalized knob positions of the schema, plus the
/// host tempo (`None` when the host reports none).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverbParameters {
    pub mix: f32,
    pub width: f32,
    pub delay_ms: f32,
    pub warp: f32,
    pub feedback: f32,
    pub density: f32,
    pub mod_rate: f32,
    pub mod_depth: f32,
    pub dyn_freq: f32,
    pub dyn_q: f32,
    pub dyn_gain_db: f32,
    pub dyn_depth_db: f32,
    pub dyn_thresh_db: f32,
    pub ducking: f32,
    pub predelay_sync: SyncDivision,
    pub saturation: f32,
    pub diffusion: f32,
    pub gate_thresh_db: f32,
    pub eq3_low_db: f32,
    pub eq3_mid_db: f32,
    pub eq3_high_db: f32,
    pub ms_balance: f32,
    pub limiter_on: bool,
    /// Raw mode index; out-of-range values fall back to the identity rule
    pub mode: i32,
    pub bpm: Option<f64>,
}

impl Default for ReverbParameters {
    fn default() -> Self {
        let values: [f32; PARAM_COUNT] = std::array::from_fn(|i| PARAM_SPECS[i].default);
        Self::from_values(&values, None)
    }
}

impl ReverbParameters {
    /// Build a snapshot from a full value vector indexed by `ParamId`.
    pub fn from_values(values: &[f32; PARAM_COUNT], bpm: Option<f64>) -> Self {
        let v = |id: ParamId| values[id.index()];
        Self {
            mix: v(ParamId::Mix),
            width: v(ParamId::Width),
            delay_ms: v(ParamId::Delay),
            warp: v(ParamId::Warp),
            feedback: v(ParamId::Feedback),
            density: v(ParamId::Density),
            mod_rate: v(ParamId::ModRate),
            mod_depth: v(ParamId::ModDepth),
            dyn_freq: v(ParamId::DynFreq),
            dyn_q: v(ParamId::DynQ),
            dyn_gain_db: v(ParamId::DynGain),
            dyn_depth_db: v(ParamId::DynDepth),
            dyn_thresh_db: v(ParamId::DynThresh),
            ducking: v(ParamId::Ducking),
            predelay_sync: SyncDivision::from_index(v(ParamId::PredelaySync).round() as i32),
            saturation: v(ParamId::Saturation),
            diffusion: v(ParamId::Diffusion),
            gate_thresh_db: v(ParamId::GateThresh),
            eq3_low_db: v(ParamId::Eq3Low),
            eq3_mid_db: v(ParamId::Eq3Mid),
            eq3_high_db: v(ParamId::Eq3High),
            ms_balance: v(ParamId::MsBalance),
            limiter_on: v(ParamId::Limiter) > 0.5,
            mode: v(ParamId::Mode).round() as i32,
            bpm,
        }
    }

    /// Value of one parameter in schema units.
    pub fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::Mix => self.mix,
            ParamId::Width => self.width,
            ParamId::Delay => self.delay_ms,
            ParamId::Warp => self.warp,
            ParamId::Feedback => self.feedback,
            ParamId::Density => self.density,
            ParamId::ModRate => self.mod_rate,
            ParamId::ModDepth => self.mod_depth,
            ParamId::DynFreq => self.dyn_freq,
            ParamId::DynQ => self.dyn_q,
            ParamId::DynGain => self.dyn_gain_db,
            ParamId::DynDepth => self.dyn_depth_db,
            ParamId::DynThresh => self.dyn_thresh_db,
            ParamId::Ducking => self.ducking,
            ParamId::PredelaySync => self.predelay_sync.index() as f32,
            ParamId::Saturation => self.saturation,
            ParamId::Diffusion => self.diffusion,
            ParamId::GateThresh => self.gate_thresh_db,
            ParamId::Eq3Low => self.eq3_low_db,
            ParamId::Eq3Mid => self.eq3_mid_db,
            ParamId::Eq3High => self.eq3_high_db,
            ParamId::MsBalance => self.ms_balance,
            ParamId::Limiter => {
                if self.limiter_on {
                    1.0
                } else {
                    0.0
                }
            }
            ParamId::Mode => self.mode as f32,
        }
    }

    /// Set one parameter in schema units, unclamped.
    pub fn set(&mut self, id: ParamId, value: f32) {
        match id {
            ParamId::Mix => self.mix = value,
            ParamId::Width => self.width = value,
            ParamId::Delay => self.delay_ms = value,
            ParamId::Warp => self.warp = value,
            ParamId::Feedback => self.feedback = value,
            ParamId::Density => self.density = value,
            ParamId::ModRate => self.mod_rate = value,
            ParamId::ModDepth => self.mod_depth = value,
            ParamId::DynFreq => self.dyn_freq = value,
            ParamId::DynQ => self.dyn_q = value,
            ParamId::DynGain => self.dyn_gain_db = value,
            ParamId::DynDepth => self.dyn_depth_db = value,
            ParamId::DynThresh => self.dyn_thresh_db = value,
            ParamId::Ducking => self.ducking = value,
            ParamId::PredelaySync => {
                self.predelay_sync = SyncDivision::from_index(value.round() as i32)
            }
            ParamId::Saturation => self.saturation = value,
            ParamId::Diffusion => self.diffusion = value,
            ParamId::GateThresh => self.gate_thresh_db = value,
            ParamId::Eq3Low => self.eq3_low_db = value,
            ParamId::Eq3Mid => self.eq3_mid_db = value,
            ParamId::Eq3High => self.eq3_high_db = value,
            ParamId::MsBalance => self.ms_balance = value,
            ParamId::Limiter => self.limiter_on = value > 0.5,
            ParamId::Mode => self.mode = value.round() as i32,
        }
    }

    /// All values in schema order.
    pub fn values(&self) -> [f32; PARAM_COUNT] {
        std::array::from_fn(|i| self.get(ParamId::ALL[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_indexed_by_id() {
        for (i, spec) in PARAM_SPECS.iter().enumerate() {
            assert_eq!(spec.id.index(), i, "{} out of order", spec.key);
            assert_eq!(ParamId::ALL[i], spec.id);
            assert!(spec.min <= spec.default && spec.default <= spec.max, "{}", spec.key);
        }
    }

    #[test]
    fn test_from_key() {
        assert_eq!(ParamId::from_key("GATE_THRESH"), Some(ParamId::GateThresh));
        assert_eq!(ParamId::from_key("AB_SWITCH"), None);
        assert_eq!(ParamId::from_key("mix"), None);
    }

    #[test]
    fn test_defaults() {
        let p = ReverbParameters::default();
        assert_eq!(p.mix, 50.0);
        assert_eq!(p.delay_ms, 100.0);
        assert_eq!(p.gate_thresh_db, -100.0);
        assert_eq!(p.predelay_sync, SyncDivision::Free);
        assert!(p.limiter_on);
        assert_eq!(p.mode, 0);
        assert_eq!(p.bpm, None);
    }

    #[test]
    fn test_get_set_cover_every_id() {
        let mut p = ReverbParameters::default();
        for id in ParamId::ALL {
            let spec = id.spec();
            p.set(id, spec.max);
            assert_eq!(p.get(id), spec.max, "{}", spec.key);
        }
    }

    #[test]
    fn test_sanitize() {
        let limiter = ParamId::Limiter.spec();
        assert_eq!(limiter.sanitize(0.7), 1.0);
        assert_eq!(limiter.sanitize(0.2), 0.0);

        let mode = ParamId::Mode.spec();
        assert_eq!(mode.sanitize(999.0), 20.0);
        assert_eq!(mode.sanitize(-3.0), 0.0);
        assert_eq!(mode.sanitize(f32::NAN), 0.0);

        let mix = ParamId::Mix.spec();
        assert_eq!(mix.sanitize(42.5), 42.5);
    }

    #[test]
    fn test_skewed_normalization() {
        let freq = ParamId::DynFreq.spec();
        assert_eq!(freq.normalize(20.0), 0.0);
        assert_eq!(freq.normalize(20000.0), 1.0);
        // Skew 0.3 puts 1 kHz well above the linear midpoint
        let n = freq.normalize(1000.0);
        assert!(n > 0.25 && n < 0.5, "normalized 1 kHz = {n}");
        assert!((freq.denormalize(n) - 1000.0).abs() <= 1.0);
    }

    #[test]
    fn test_sync_note_lengths() {
        assert_eq!(SyncDivision::Quarter.note_ms(Some(120.0)), Some(500.0));
        assert_eq!(SyncDivision::Eighth.note_ms(Some(120.0)), Some(250.0));
        assert_eq!(SyncDivision::Sixteenth.note_ms(Some(120.0)), Some(125.0));
        assert_eq!(SyncDivision::Quarter.note_ms(None), None);
        assert_eq!(SyncDivision::Quarter.note_ms(Some(0.0)), None);
        assert_eq!(SyncDivision::Free.note_ms(Some(120.0)), None);
    }
}
