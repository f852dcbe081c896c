//! The 21 named modes and the knob → effective-parameter translation.
//!
//! Each mode is a row of override rules applied to values derived from the
//! raw knobs. The table is pure data and `EffectiveParameters::derive` is a
//! pure function of the snapshot.

use crate::params::{ParamId, ReverbParameters};

/// Number of modes in the table
pub const MODE_COUNT: usize = 21;

/// Highest room size the reverb core accepts
pub const MAX_ROOM_SIZE: f32 = 0.99;

/// Warp feedback is kept inside this magnitude
pub const MAX_WARP_FEEDBACK: f32 = 0.95;

/// Display names, indexed by mode.
pub const MODE_NAMES: &[&str] = &[
    "Twin Star",
    "Sea Serpent",
    "Horse Man",
    "Archer",
    "Void Maker",
    "Galaxy Spiral",
    "Harp String",
    "Goat Horn",
    "Nebula Cloud",
    "Triangle",
    "Cloud Major",
    "Cloud Minor",
    "Queen Chair",
    "Hunter Belt",
    "Water Bearer",
    "Two Fish",
    "Scorpion Tail",
    "Balance Scale",
    "Lion Heart",
    "Maiden",
    "Seven Sisters",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    TwinStar,
    SeaSerpent,
    HorseMan,
    Archer,
    VoidMaker,
    GalaxySpiral,
    HarpString,
    GoatHorn,
    NebulaCloud,
    Triangle,
    CloudMajor,
    CloudMinor,
    QueenChair,
    HunterBelt,
    WaterBearer,
    TwoFish,
    ScorpionTail,
    BalanceScale,
    LionHeart,
    Maiden,
    SevenSisters,
}

impl Mode {
    pub const ALL: [Mode; MODE_COUNT] = [
        Mode::TwinStar,
        Mode::SeaSerpent,
        Mode::HorseMan,
        Mode::Archer,
        Mode::VoidMaker,
        Mode::GalaxySpiral,
        Mode::HarpString,
        Mode::GoatHorn,
        Mode::NebulaCloud,
        Mode::Triangle,
        Mode::CloudMajor,
        Mode::CloudMinor,
        Mode::QueenChair,
        Mode::HunterBelt,
        Mode::WaterBearer,
        Mode::TwoFish,
        Mode::ScorpionTail,
        Mode::BalanceScale,
        Mode::LionHeart,
        Mode::Maiden,
        Mode::SevenSisters,
    ];

    pub fn from_index(index: i32) -> Option<Mode> {
        usize::try_from(index).ok().and_then(|i| Mode::ALL.get(i).copied())
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        MODE_NAMES[self.index()]
    }

    /// Parse a display name (case and whitespace insensitive) or a numeric index.
    pub fn parse(text: &str) -> Option<Mode> {
        if let Ok(index) = text.trim().parse::<i32>() {
            return Mode::from_index(index);
        }
        let wanted: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        Mode::ALL.iter().copied().find(|mode| {
            let name: String = mode.name().chars().filter(|c| !c.is_whitespace()).collect();
            name.eq_ignore_ascii_case(&wanted)
        })
    }

    pub fn definition(self) -> &'static ModeDefinition {
        &MODE_TABLE[self.index()]
    }
}

/// One override rule applied to a knob-derived base value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Use the base value unchanged
    Keep,
    /// Multiply the base value
    Scale(f32),
    /// Replace the base value outright
    Fixed(f32),
    /// `offset + scale * base`
    Affine { offset: f32, scale: f32 },
}

impl Rule {
    #[inline]
    pub fn apply(self, base: f32) -> f32 {
        match self {
            Rule::Keep => base,
            Rule::Scale(factor) => base * factor,
            Rule::Fixed(value) => value,
            Rule::Affine { offset, scale } => offset + scale * base,
        }
    }
}

/// Override rules for one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeDefinition {
    pub room_size: Rule,
    pub damping: Rule,
    pub width: Rule,
    pub predelay: Rule,
    pub mod_rate: Rule,
    pub mod_depth: Rule,
    pub warp_feedback: Rule,
    pub warp_mix: Rule,
    /// Reverb core wet level (1.0 = full)
    pub wet_level: f32,
    /// Extra high-pass on the wet signal, in Hz
    pub low_cut_hz: Option<f32>,
}

/// Rules that leave every base value alone.
pub const IDENTITY: ModeDefinition = ModeDefinition {
    room_size: Rule::Keep,
    damping: Rule::Keep,
    width: Rule::Keep,
    predelay: Rule::Keep,
    mod_rate: Rule::Keep,
    mod_depth: Rule::Keep,
    warp_feedback: Rule::Keep,
    warp_mix: Rule::Keep,
    wet_level: 1.0,
    low_cut_hz: None,
};

const fn room(scale: f32) -> ModeDefinition {
    ModeDefinition {
        room_size: Rule::Scale(scale),
        ..IDENTITY
    }
}

const fn fixed_room(value: f32) -> ModeDefinition {
    ModeDefinition {
        room_size: Rule::Fixed(value),
        ..IDENTITY
    }
}

pub static MODE_TABLE: [ModeDefinition; MODE_COUNT] = [
    // Twin Star: fast attack, short decay
    ModeDefinition {
        damping: Rule::Scale(0.5),
        ..room(0.7)
    },
    // Sea Serpent
    ModeDefinition {
        mod_depth: Rule::Fixed(0.8),
        ..room(0.8)
    },
    // Horse Man
    IDENTITY,
    // Archer
    ModeDefinition {
        damping: Rule::Scale(1.2),
        ..IDENTITY
    },
    // Void Maker: very long decay
    ModeDefinition {
        room_size: Rule::Affine {
            offset: 0.95,
            scale: 0.04,
        },
        damping: Rule::Fixed(0.1),
        ..IDENTITY
    },
    // Galaxy Spiral
    ModeDefinition {
        mod_rate: Rule::Fixed(0.2),
        ..fixed_room(0.98)
    },
    // Harp String
    ModeDefinition {
        damping: Rule::Scale(0.6),
        ..room(0.6)
    },
    // Goat Horn
    ModeDefinition {
        width: Rule::Scale(0.8),
        ..room(0.75)
    },
    // Nebula Cloud
    ModeDefinition {
        predelay: Rule::Scale(1.5),
        ..fixed_room(0.9)
    },
    // Triangle
    ModeDefinition {
        predelay: Rule::Scale(2.0),
        ..fixed_room(0.92)
    },
    // Cloud Major
    ModeDefinition {
        damping: Rule::Fixed(0.2),
        warp_feedback: Rule::Fixed(0.7),
        ..room(0.8)
    },
    // Cloud Minor
    ModeDefinition {
        damping: Rule::Fixed(0.2),
        warp_feedback: Rule::Fixed(0.6),
        ..room(0.6)
    },
    // Queen Chair
    ModeDefinition {
        damping: Rule::Fixed(0.8),
        ..fixed_room(0.95)
    },
    // Hunter Belt
    ModeDefinition {
        mod_depth: Rule::Fixed(0.9),
        low_cut_hz: Some(120.0),
        ..fixed_room(0.99)
    },
    // Water Bearer: EchoVerb
    ModeDefinition {
        wet_level: 0.5,
        ..room(0.4)
    },
    // Two Fish
    ModeDefinition {
        wet_level: 0.6,
        ..room(0.6)
    },
    // Scorpion Tail
    room(0.7),
    // Balance Scale
    ModeDefinition {
        mod_rate: Rule::Scale(1.5),
        mod_depth: Rule::Fixed(0.7),
        ..fixed_room(0.9)
    },
    // Lion Heart
    ModeDefinition {
        damping: Rule::Fixed(0.05),
        ..fixed_room(0.99)
    },
    // Maiden
    ModeDefinition {
        predelay: Rule::Scale(0.8),
        low_cut_hz: Some(80.0),
        ..room(0.5)
    },
    // Seven Sisters
    ModeDefinition {
        width: Rule::Fixed(1.0),
        damping: Rule::Fixed(0.5),
        warp_mix: Rule::Fixed(0.2),
        ..room(0.8)
    },
];

impl ModeDefinition {
    /// Rules for a raw mode index. Unknown indices get `IDENTITY`.
    pub fn lookup(index: i32) -> &'static ModeDefinition {
        Mode::from_index(index).map_or(&IDENTITY, Mode::definition)
    }
}

/// Per-stage values for one block, after mode rules and safety clamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveParameters {
    pub room_size: f32,
    pub damping: f32,
    pub width: f32,
    /// Free-running predelay in ms; tempo sync is resolved by the engine
    pub predelay_ms: f32,
    pub mod_rate_hz: f32,
    /// 0..1
    pub mod_depth: f32,
    pub warp_feedback: f32,
    pub warp_mix: f32,
    pub wet_level: f32,
    pub low_cut_hz: Option<f32>,
}

impl EffectiveParameters {
    pub fn derive(params: &ReverbParameters) -> Self {
        let rules = ModeDefinition::lookup(params.mode);

        let base_room = params.feedback / 100.0;
        let base_damping = 1.0 - params.density / 100.0;
        let base_width = params.width / 100.0;
        let base_feedback = (params.warp / 100.0) * 0.8 - 0.4;

        Self {
            room_size: rules.room_size.apply(base_room).clamp(0.0, MAX_ROOM_SIZE),
            damping: rules.damping.apply(base_damping).clamp(0.0, 1.0),
            width: rules.width.apply(base_width).clamp(0.0, 1.0),
            predelay_ms: rules.predelay.apply(params.delay_ms).max(0.0),
            mod_rate_hz: rules.mod_rate.apply(params.mod_rate).clamp(0.0, 10.0),
            mod_depth: rules.mod_depth.apply(params.mod_depth / 100.0).clamp(0.0, 1.0),
            warp_feedback: rules
                .warp_feedback
                .apply(base_feedback)
                .clamp(-MAX_WARP_FEEDBACK, MAX_WARP_FEEDBACK),
            warp_mix: rules.warp_mix.apply(0.5).clamp(0.0, 1.0),
            wet_level: rules.wet_level,
            low_cut_hz: rules.low_cut_hz,
        }
    }
}

/// Knob values a mode loads when picked from the control surface.
///
/// Applied on top of `MODIFIER_RESETS`. Only ids listed here change.
pub fn character_preset(mode: Mode) -> &'static [(ParamId, f32)] {
    use ParamId::*;
    use crate::modes::Mode;
    match mode {
        Mode::TwinStar => &[
            (Mix, 40.0), (Delay, 350.0), (Feedback, 55.0), (Width, 100.0),
            (Density, 60.0), (Diffusion, 80.0), (ModRate, 0.6), (ModDepth, 25.0),
            (Eq3Low, 0.0), (Eq3Mid, 0.0), (Eq3High, 0.0),
        ],
        Mode::SeaSerpent => &[
            (Mix, 55.0), (Delay, 850.0), (Feedback, 88.0), (Width, 90.0),
            (Density, 85.0), (Diffusion, 50.0), (ModRate, 0.25), (ModDepth, 75.0),
            (Eq3Low, 4.0), (Eq3High, -6.0), (Warp, 20.0),
        ],
        Mode::HorseMan => &[
            (Mix, 35.0), (Delay, 180.0), (Feedback, 40.0), (Width, 75.0),
            (Density, 95.0), (Diffusion, 100.0), (ModRate, 1.2), (ModDepth, 10.0),
            (Eq3Low, -1.0), (Eq3Mid, 2.0), (Eq3High, -2.0),
        ],
        Mode::Archer => &[
            (Mix, 45.0), (Delay, 550.0), (Feedback, 65.0), (Width, 100.0),
            (Density, 30.0), (Diffusion, 40.0), (ModRate, 0.8), (ModDepth, 35.0),
            (Eq3High, 4.0), (Saturation, 10.0),
        ],
        Mode::VoidMaker => &[
            (Mix, 100.0), (Delay, 1000.0), (Feedback, 98.0), (Width, 100.0),
            (Density, 100.0), (Diffusion, 100.0), (ModRate, 0.15), (ModDepth, 60.0),
            (Eq3Low, 8.0), (Eq3High, -12.0), (Saturation, 45.0),
        ],
        Mode::GalaxySpiral => &[
            (Mix, 50.0), (Delay, 600.0), (Feedback, 80.0), (Width, 100.0),
            (Density, 50.0), (Diffusion, 70.0), (ModRate, 2.8), (ModDepth, 65.0),
            (Warp, 30.0),
        ],
        Mode::HarpString => &[
            (Mix, 40.0), (Delay, 60.0), (Feedback, 90.0), (Width, 60.0),
            (Density, 0.0), (Diffusion, 0.0), (ModRate, 0.4), (ModDepth, 15.0),
            (Eq3High, 6.0),
        ],
        Mode::GoatHorn => &[
            (Mix, 30.0), (Delay, 220.0), (Feedback, 45.0), (Width, 80.0),
            (Density, 80.0), (Diffusion, 90.0), (ModRate, 0.9), (ModDepth, 20.0),
            (Saturation, 35.0), (Eq3Low, 2.0), (Eq3Mid, 3.0), (Eq3High, -4.0),
        ],
        Mode::NebulaCloud => &[
            (Mix, 65.0), (Delay, 900.0), (Feedback, 82.0), (Width, 100.0),
            (Density, 100.0), (Diffusion, 100.0), (ModRate, 0.3), (ModDepth, 40.0),
            (Eq3High, -3.0),
        ],
        Mode::Triangle => &[
            (Mix, 40.0), (Delay, 450.0), (Feedback, 50.0), (Width, 100.0),
            (Density, 10.0), (Diffusion, 20.0), (ModRate, 0.0), (ModDepth, 0.0),
        ],
        Mode::CloudMajor => &[
            (Mix, 50.0), (Delay, 700.0), (Feedback, 75.0), (Width, 100.0),
            (Density, 90.0), (Diffusion, 95.0), (ModRate, 0.7), (ModDepth, 30.0),
            (Eq3Low, -5.0), (Eq3High, 6.0),
        ],
        Mode::CloudMinor => &[
            (Mix, 55.0), (Delay, 750.0), (Feedback, 78.0), (Width, 90.0),
            (Density, 90.0), (Diffusion, 95.0), (ModRate, 0.5), (ModDepth, 45.0),
            (Eq3Low, 3.0), (Eq3High, -8.0),
        ],
        Mode::QueenChair => &[
            (Mix, 60.0), (Delay, 650.0), (Feedback, 72.0), (Width, 100.0),
            (Density, 85.0), (Diffusion, 85.0), (ModRate, 1.5), (ModDepth, 55.0),
            (Eq3Mid, 2.0),
        ],
        Mode::HunterBelt => &[
            (Mix, 35.0), (Delay, 150.0), (Feedback, 25.0), (Width, 60.0),
            (Density, 100.0), (Diffusion, 100.0), (ModRate, 0.0), (ModDepth, 0.0),
            (GateThresh, -30.0),
        ],
        Mode::WaterBearer => &[
            (Mix, 70.0), (Delay, 500.0), (Feedback, 65.0), (Width, 100.0),
            (Density, 70.0), (Diffusion, 60.0), (ModRate, 3.0), (ModDepth, 85.0),
            (Warp, 15.0),
        ],
        Mode::TwoFish => &[
            (Mix, 50.0), (Delay, 600.0), (Feedback, 60.0), (Width, 100.0),
            (Density, 40.0), (Diffusion, 50.0), (ModRate, 0.4), (ModDepth, 60.0),
            (Eq3Low, 5.0), (Eq3High, -10.0),
        ],
        Mode::ScorpionTail => &[
            (Mix, 45.0), (Delay, 300.0), (Feedback, 55.0), (Width, 80.0),
            (Density, 80.0), (Diffusion, 80.0), (ModRate, 4.0), (ModDepth, 30.0),
            (Saturation, 80.0), (Eq3High, 5.0),
        ],
        Mode::BalanceScale => &[
            (Mix, 50.0), (Delay, 400.0), (Feedback, 50.0), (Width, 100.0),
            (Density, 50.0), (Diffusion, 50.0), (ModRate, 0.5), (ModDepth, 20.0),
            (Eq3Low, 0.0), (Eq3Mid, 0.0), (Eq3High, 0.0),
        ],
        Mode::LionHeart => &[
            (Mix, 55.0), (Delay, 500.0), (Feedback, 65.0), (Width, 90.0),
            (Density, 75.0), (Diffusion, 85.0), (ModRate, 0.8), (ModDepth, 25.0),
            (Saturation, 25.0), (Eq3Mid, 4.0), (Eq3High, -2.0),
        ],
        Mode::Maiden => &[
            (Mix, 40.0), (Delay, 350.0), (Feedback, 45.0), (Width, 100.0),
            (Density, 80.0), (Diffusion, 90.0), (ModRate, 0.3), (ModDepth, 10.0),
            (Saturation, 0.0), (Eq3Low, -2.0),
        ],
        Mode::SevenSisters => &[
            (Mix, 60.0), (Delay, 777.0), (Feedback, 77.0), (Width, 100.0),
            (Density, 30.0), (Diffusion, 60.0), (ModRate, 2.0), (ModDepth, 50.0),
            (Eq3High, 8.0),
        ],
    }
}

/// Modifiers cleared before a character preset is applied.
pub const MODIFIER_RESETS: &[(ParamId, f32)] = &[
    (ParamId::Warp, 0.0),
    (ParamId::Saturation, 0.0),
    (ParamId::Ducking, 0.0),
    (ParamId::GateThresh, -100.0),
    (ParamId::DynFreq, 1000.0),
    (ParamId::DynGain, 0.0),
];
