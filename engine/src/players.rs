use std::ops::{Add, AddAssign, Index, IndexMut};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Zero,
    One,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::Zero, Player::One];

    pub fn opponent(&self) -> Player {
        match self {
            Player::Zero => Player::One,
            Player::One => Player::Zero,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Player::Zero => 0,
            Player::One => 1,
        }
    }
}

/// A value held for each of the two players.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPlayer<T>(pub [T; 2]);

impl<T> PerPlayer<T> {
    pub fn new(zero: T, one: T) -> Self {
        Self([zero, one])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Player, &T)> {
        Player::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, mut f: F) -> PerPlayer<U> {
        PerPlayer([f(&self.0[0]), f(&self.0[1])])
    }

    pub fn zip_with<U, V, F: FnMut(&T, &U) -> V>(
        &self,
        other: &PerPlayer<U>,
        mut f: F,
    ) -> PerPlayer<V> {
        PerPlayer([f(&self.0[0], &other.0[0]), f(&self.0[1], &other.0[1])])
    }
}

impl<T: Clone> PerPlayer<T> {
    pub fn splat(value: T) -> Self {
        Self([value.clone(), value])
    }
}

impl<T> Index<Player> for PerPlayer<T> {
    type Output = T;

    fn index(&self, player: Player) -> &T {
        &self.0[player.index()]
    }
}

impl<T> IndexMut<Player> for PerPlayer<T> {
    fn index_mut(&mut self, player: Player) -> &mut T {
        &mut self.0[player.index()]
    }
}

impl<T: AddAssign + Copy> Add for PerPlayer<T> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        for p in Player::ALL {
            self[p] += rhs[p];
        }
        self
    }
}
