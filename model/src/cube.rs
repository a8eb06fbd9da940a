use engine::{PerPlayer, Player};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CubeOwner {
    Centered,
    Player(Player),
}

/// Snapshot of the cube and match state for one decision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeInfo {
    pub cube: u32,
    pub owner: CubeOwner,
    pub on_roll: Player,
    /// Zero for money play.
    pub match_to: u32,
    pub score: PerPlayer<u32>,
    pub crawford: bool,
    pub post_crawford: bool,
    pub jacoby: bool,
    pub beavers: bool,
}

impl CubeInfo {
    pub fn money(on_roll: Player) -> Self {
        Self {
            cube: 1,
            owner: CubeOwner::Centered,
            on_roll,
            match_to: 0,
            score: PerPlayer::default(),
            crawford: false,
            post_crawford: false,
            jacoby: true,
            beavers: true,
        }
    }

    pub fn match_play(match_to: u32, score: [u32; 2], on_roll: Player) -> Self {
        Self {
            match_to,
            score: PerPlayer(score),
            jacoby: false,
            beavers: false,
            ..Self::money(on_roll)
        }
    }

    pub fn is_money(&self) -> bool {
        self.match_to == 0
    }

    pub fn is_centered(&self) -> bool {
        self.owner == CubeOwner::Centered
    }

    /// Points still needed by `player`. Only meaningful in match play.
    pub fn away(&self, player: Player) -> i64 {
        self.match_to as i64 - self.score[player] as i64
    }

    /// Whether the player on roll may double now.
    pub fn cube_available(&self) -> bool {
        let has_access = match self.owner {
            CubeOwner::Centered => true,
            CubeOwner::Player(owner) => owner == self.on_roll,
        };

        if self.is_money() {
            return has_access;
        }

        has_access
            && !self.crawford
            && self.away(self.on_roll) > self.cube as i64
            && !(self.post_crawford && self.away(self.on_roll) == 1)
    }

    /// Whether gammons and backgammons count in this game.
    pub fn gammons_count(&self) -> bool {
        if self.is_money() {
            return !(self.jacoby && self.is_centered());
        }

        true
    }

    /// The same state with the other player on roll.
    pub fn swap_turn(&self) -> Self {
        Self {
            on_roll: self.on_roll.opponent(),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_cube_access() {
        let mut ci = CubeInfo::money(Player::Zero);
        assert!(ci.cube_available());

        ci.owner = CubeOwner::Player(Player::One);
        assert!(!ci.cube_available());

        ci.owner = CubeOwner::Player(Player::Zero);
        assert!(ci.cube_available());
    }

    #[test]
    fn test_match_cube_access() {
        let ci = CubeInfo::match_play(7, [0, 0], Player::Zero);
        assert!(ci.cube_available());

        let crawford = CubeInfo {
            crawford: true,
            ..CubeInfo::match_play(7, [6, 3], Player::One)
        };
        assert!(!crawford.cube_available());

        let post = CubeInfo {
            post_crawford: true,
            ..CubeInfo::match_play(7, [6, 3], Player::Zero)
        };
        assert!(!post.cube_available());
        assert!(post.swap_turn().cube_available());

        let cube_too_big = CubeInfo {
            cube: 2,
            ..CubeInfo::match_play(7, [5, 0], Player::Zero)
        };
        assert!(!cube_too_big.cube_available());
    }

    #[test]
    fn test_jacoby() {
        let mut ci = CubeInfo::money(Player::Zero);
        assert!(!ci.gammons_count());

        ci.owner = CubeOwner::Player(Player::One);
        assert!(ci.gammons_count());
        assert!(CubeInfo::match_play(5, [0, 0], Player::Zero).gammons_count());
    }
}
