use anyhow::Result;
use common::{Config, ConfigError, ConfigLoader};
use serde::{Deserialize, Serialize};

use super::cube::CubeInfo;
use super::equity::EquityVector;

pub const MAX_PLIES: u8 = 7;

/// How a set of equities was obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalType {
    /// Not evaluated yet.
    #[default]
    None,
    Evaluated,
    Rollout,
}

/// Settings handed to the evaluator for one call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvalContext {
    pub plies: u8,
    pub cubeful: bool,
    pub deterministic: bool,
    pub noise: f64,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            plies: 0,
            cubeful: true,
            deterministic: true,
            noise: 0.0,
        }
    }
}

impl EvalContext {
    pub fn with_plies(plies: u8) -> Self {
        Self {
            plies,
            ..Self::default()
        }
    }

    /// Reads `<prefix>_plies`, `<prefix>_cubeful`, `<prefix>_deterministic` and `<prefix>_noise`,
    /// falling back to `default`.
    pub fn load_with_prefix(
        config: &ConfigLoader,
        prefix: &str,
        default: EvalContext,
    ) -> Result<Self> {
        let key = |name: &str| format!("{}_{}", prefix, name);

        let ctx = Self {
            plies: config
                .get(&key("plies"))
                .and_then(|v| v.as_usize())
                .map(|p| p.min(u8::MAX as usize) as u8)
                .unwrap_or(default.plies),
            cubeful: config
                .get(&key("cubeful"))
                .and_then(|v| v.as_bool())
                .unwrap_or(default.cubeful),
            deterministic: config
                .get(&key("deterministic"))
                .and_then(|v| v.as_bool())
                .unwrap_or(default.deterministic),
            noise: config
                .get(&key("noise"))
                .and_then(|v| v.as_f64())
                .unwrap_or(default.noise),
        };

        ctx.validate()?;
        Ok(ctx)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("plies", self.plies as f64, 0.0, MAX_PLIES as f64)?;
        ConfigError::check_range("noise", self.noise, 0.0, 1.0)?;
        Ok(())
    }
}

impl Config for EvalContext {
    fn load(config: &ConfigLoader) -> Result<Self> {
        Self::load_with_prefix(config, "eval", Self::default())
    }
}

/// A static evaluator or lookup database.
///
/// Returns the equities of `board` from the side of the player on roll. For match play the cubeful
/// equity is a match winning chance; for money play it is an equity normalised to the cube.
pub trait Evaluator {
    type Board;

    fn evaluate(
        &self,
        board: &Self::Board,
        cube_info: &CubeInfo,
        eval_context: &EvalContext,
    ) -> Result<EquityVector>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_with_prefix() {
        let config = ConfigLoader::from_string(
            "rollout { chequer_plies = 2, chequer_noise = 0.05 }",
            "rollout".to_string(),
        )
        .unwrap();

        let ctx =
            EvalContext::load_with_prefix(&config, "chequer", EvalContext::default()).unwrap();

        assert_eq!(ctx.plies, 2);
        assert_eq!(ctx.noise, 0.05);
        assert!(ctx.cubeful);
    }

    #[test]
    fn test_rejects_deep_plies() {
        let config = ConfigLoader::from_string("late_plies = 9", "rollout".to_string()).unwrap();

        assert!(EvalContext::load_with_prefix(&config, "late", EvalContext::default()).is_err());
        assert!(EvalContext::with_plies(7).validate().is_ok());
    }
}
