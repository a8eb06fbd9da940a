use std::sync::Arc;

use anyhow::Result;
use common::create_rng_from_seed;
use engine::{Dice, DiceSource, DiceSourceFactory};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

const GENERATIONS: usize = 6;
const ROTATED_TURNS: usize = 128;
const ROLLS: usize = 36;

type Permutations = [[[u8; ROLLS]; ROTATED_TURNS]; GENERATIONS];

/// Seeded dice for rollout trials.
///
/// With rotation the first turns of consecutive trials are stratified over the 36 rolls: turn `t`
/// of trial `g` walks `min(t + 1, 6)` generations of seeded permutations, so every block of 36
/// trials sees each roll once on the first turn, every block of 1296 sees each pair of rolls once
/// over the first two, and so on. Later turns are plain pseudo-random. With antithetic pairing
/// trial `2k + 1` replays trial `2k` with every die `d` turned to `7 - d`.
#[derive(Clone, Debug)]
pub struct RolloutDice {
    seed: u64,
    rotate: bool,
    antithetic: bool,
    initial_position: bool,
    permutations: Arc<Permutations>,
}

impl RolloutDice {
    pub fn new(seed: u64, rotate: bool, antithetic: bool, initial_position: bool) -> Self {
        let mut rng = create_rng_from_seed(seed, u64::MAX);
        let mut permutations = Box::new([[[0u8; ROLLS]; ROTATED_TURNS]; GENERATIONS]);

        for generation in permutations.iter_mut() {
            for permutation in generation.iter_mut() {
                for (k, roll) in permutation.iter_mut().enumerate() {
                    *roll = k as u8;
                }
                permutation.shuffle(&mut rng);
            }
        }

        Self {
            seed,
            rotate,
            antithetic,
            initial_position,
            permutations: Arc::from(permutations),
        }
    }
}

impl DiceSourceFactory for RolloutDice {
    type Source = RolloutDiceSource;

    fn for_trial(&self, trial: usize) -> Self::Source {
        let (game, mirror) = if self.antithetic {
            (trial / 2, trial % 2 == 1)
        } else {
            (trial, false)
        };

        RolloutDiceSource {
            rng: create_rng_from_seed(self.seed, game as u64),
            game,
            turn: 0,
            mirror,
            rotate: self.rotate,
            initial_position: self.initial_position,
            permutations: self.permutations.clone(),
        }
    }
}

pub struct RolloutDiceSource {
    rng: StdRng,
    game: usize,
    turn: usize,
    mirror: bool,
    rotate: bool,
    initial_position: bool,
    permutations: Arc<Permutations>,
}

impl RolloutDiceSource {
    fn roll_index(&mut self) -> usize {
        let turn = self.turn;

        if self.initial_position && turn == 0 {
            if self.rotate {
                let non_doubles = self.permutations[0][0]
                    .iter()
                    .map(|&j| j as usize)
                    .filter(|&j| !Dice::from_index(j).is_double());

                return non_doubles.cycle().nth(self.game % 30).unwrap_or(1);
            }

            loop {
                let j = self.rng.gen_range(0..ROLLS);
                if !Dice::from_index(j).is_double() {
                    return j;
                }
            }
        }

        if self.rotate && turn < ROTATED_TURNS {
            let mut j = 0;
            let mut k = 1;
            for generation in 0..GENERATIONS.min(turn + 1) {
                j = self.permutations[generation][turn][(self.game / k + j) % ROLLS] as usize;
                k *= ROLLS;
            }
            return j;
        }

        self.rng.gen_range(0..ROLLS)
    }
}

impl DiceSource for RolloutDiceSource {
    fn next_roll(&mut self) -> Result<Dice> {
        let dice = Dice::from_index(self.roll_index());
        self.turn += 1;

        Ok(if self.mirror { dice.mirror() } else { dice })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn rolls(factory: &RolloutDice, trial: usize, turns: usize) -> Vec<Dice> {
        let mut source = factory.for_trial(trial);
        (0..turns).map(|_| source.next_roll().unwrap()).collect()
    }

    #[test]
    fn test_seeded_trials_are_reproducible() {
        let a = RolloutDice::new(11, false, false, false);
        let b = RolloutDice::new(11, false, false, false);

        assert_eq!(rolls(&a, 3, 20), rolls(&b, 3, 20));
        assert_ne!(rolls(&a, 3, 20), rolls(&a, 4, 20));
    }

    #[test]
    fn test_rotation_stratifies_first_turns() {
        let dice = RolloutDice::new(5, true, false, false);

        let first: HashSet<_> = (0..36).map(|g| rolls(&dice, g, 1)[0]).collect();
        assert_eq!(first.len(), 36);

        let pairs: HashSet<_> = (0..1296).map(|g| {
            let r = rolls(&dice, g, 2);
            (r[0], r[1])
        }).collect();
        assert_eq!(pairs.len(), 1296);
    }

    #[test]
    fn test_antithetic_trials_mirror() {
        let dice = RolloutDice::new(9, true, true, false);

        let even = rolls(&dice, 6, 200);
        let odd = rolls(&dice, 7, 200);

        assert!(even.iter().zip(&odd).all(|(a, b)| a.mirror() == *b));
        assert_ne!(rolls(&dice, 8, 5), even[..5].to_vec());
    }

    #[test]
    fn test_initial_position_has_no_opening_doubles() {
        for rotate in [false, true] {
            let dice = RolloutDice::new(3, rotate, true, true);

            for trial in 0..100 {
                assert!(!rolls(&dice, trial, 1)[0].is_double());
            }
        }

        let rotated = RolloutDice::new(3, true, false, true);
        let openings: HashSet<_> = (0..30).map(|g| rolls(&rotated, g, 1)[0]).collect();
        assert_eq!(openings.len(), 30);
    }
}
