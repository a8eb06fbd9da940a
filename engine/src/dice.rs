use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dice(pub u8, pub u8);

impl Dice {
    /// Rolls indexed 0..36 in row major order of the two dice.
    pub fn from_index(index: usize) -> Self {
        Dice((index / 6) as u8 + 1, (index % 6) as u8 + 1)
    }

    pub fn is_double(&self) -> bool {
        self.0 == self.1
    }

    /// The complementary roll, each die `d` replaced by `7 - d`.
    pub fn mirror(&self) -> Self {
        Dice(7 - self.0, 7 - self.1)
    }

    pub fn is_valid(&self) -> bool {
        (1..=6).contains(&self.0) && (1..=6).contains(&self.1)
    }

    /// The 21 distinct rolls paired with how many of the 36 outcomes produce them.
    pub fn distinct_rolls() -> impl Iterator<Item = (Dice, u32)> {
        (1..=6u8).flat_map(|a| (a..=6u8).map(move |b| (Dice(a, b), if a == b { 1 } else { 2 })))
    }
}

pub trait DiceSource {
    fn next_roll(&mut self) -> Result<Dice>;
}

/// Hands out an independent dice stream for each rollout trial so trials can run on any thread.
pub trait DiceSourceFactory {
    type Source: DiceSource;

    fn for_trial(&self, trial: usize) -> Self::Source;
}
