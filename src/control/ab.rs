//! A/B comparison snapshots

use crate::params::{ParameterValues, PARAM_SPECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbSlot {
    A,
    B,
}

impl AbSlot {
    pub fn other(self) -> Self {
        match self {
            AbSlot::A => AbSlot::B,
            AbSlot::B => AbSlot::A,
        }
    }
}

/// Two complete parameter sets; one is live, the other is held
#[derive(Debug, Clone, PartialEq)]
pub struct AbSnapshots {
    a: ParameterValues,
    b: ParameterValues,
    active: AbSlot,
}

impl AbSnapshots {
    /// Both slots start at the defaults, with A active
    pub fn new() -> Self {
        let defaults: ParameterValues = std::array::from_fn(|i| PARAM_SPECS[i].default);
        Self {
            a: defaults,
            b: defaults,
            active: AbSlot::A,
        }
    }

    /// Save `current` into the active slot, make the other slot active and
    /// return its values for publication
    pub fn toggle(&mut self, current: &ParameterValues) -> ParameterValues {
        *self.slot_mut(self.active) = *current;
        self.active = self.active.other();
        *self.slot(self.active)
    }

    pub fn active(&self) -> AbSlot {
        self.active
    }

    pub fn slot(&self, slot: AbSlot) -> &ParameterValues {
        match slot {
            AbSlot::A => &self.a,
            AbSlot::B => &self.b,
        }
    }

    fn slot_mut(&mut self, slot: AbSlot) -> &mut ParameterValues {
        match slot {
            AbSlot::A => &mut self.a,
            AbSlot::B => &mut self.b,
        }
    }
}

impl Default for AbSnapshots {
    fn default() -> Self {
        Self::new()
    }
}
