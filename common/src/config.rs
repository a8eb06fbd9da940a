use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use hocon::{Hocon, HoconLoader};
use thiserror::Error;

#[derive(Debug)]
pub struct ConfigLoader {
    hocon: Hocon,
    env: HashMap<String, String>,
    scope: String,
}

impl ConfigLoader {
    pub fn new(path: impl AsRef<Path>, scope: String) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("The config file {:?} was not found", path);
        }

        let hocon = HoconLoader::new()
            .load_file(path)
            .with_context(|| format!("Failed to find or load config file at: {:?}", path))?
            .hocon()?;

        Ok(Self::from_hocon(hocon, scope))
    }

    pub fn from_string(contents: &str, scope: String) -> Result<Self> {
        let hocon = HoconLoader::new()
            .load_str(contents)
            .context("Failed to parse config")?
            .hocon()?;

        Ok(Self::from_hocon(hocon, scope))
    }

    fn from_hocon(hocon: Hocon, scope: String) -> Self {
        let env = std::env::vars().collect::<HashMap<_, _>>();

        Self { hocon, env, scope }
    }

    /// Looks up `name` in the environment, then within the scope, then at the root.
    /// Dotted names walk nested objects.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.env.get(name) {
            return Some(Value::String(value.clone()));
        }

        let scope = &self.hocon[self.scope.as_str()];
        if matches!(scope, Hocon::Hash(_)) {
            if let Some(value) = Self::map_hocon(scope, name) {
                return Some(value);
            }
        }

        Self::map_hocon(&self.hocon, name)
    }

    pub fn load<T: Config>(&self) -> Result<T> {
        let res = T::load(self)?;
        Ok(res)
    }

    fn map_hocon(hocon: &Hocon, name: &str) -> Option<Value> {
        let node = name.split('.').fold(hocon, |node, key| &node[key]);

        match node {
            Hocon::Real(f64) => Some(Value::Float(*f64)),
            Hocon::Integer(i64) => Some(Value::Integer(*i64)),
            Hocon::String(string) => Some(Value::String(string.clone())),
            Hocon::Boolean(bool) => Some(Value::Boolean(*bool)),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(val) => Some(*val),
            Value::String(val) => Hocon::String(val.clone()).as_bool(),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Value::Integer(val) => usize::try_from(*val).ok(),
            Value::String(val) => val.parse::<usize>().ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Integer(val) => u64::try_from(*val).ok(),
            Value::String(val) => val.parse::<u64>().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(val) => Some(*val),
            Value::Integer(val) => Some(*val as f64),
            Value::String(val) => val.parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::String(val) => Some(val.clone()),
            Value::Boolean(true) => Some("true".to_string()),
            Value::Boolean(false) => Some("false".to_string()),
            Value::Float(val) => Some(val.to_string()),
            Value::Integer(val) => Some(val.to_string()),
        }
    }
}

pub trait Config {
    fn load(config: &ConfigLoader) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for `{name}`: {reason}")]
    InvalidValue {
        name: &'static str,
        reason: String,
    },
    #[error("`{name}` = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ConfigError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            name,
            reason: reason.into(),
        }
    }

    /// Checks `min <= value <= max`.
    pub fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if value.is_nan() || value < min || value > max {
            return Err(ConfigError::OutOfRange {
                name,
                value,
                min,
                max,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CONFIG: &str = r#"
        trials = 1296
        rollout {
            std_limit = 0.01
            player_0 { chequer_plies = 2 }
            rotate_dice = true
        }
    "#;

    #[test]
    fn test_scope_then_root() {
        let config = ConfigLoader::from_string(CONFIG, "rollout".to_string()).unwrap();

        assert_eq!(config.get("trials").and_then(|v| v.as_usize()), Some(1296));
        assert_eq!(config.get("std_limit").and_then(|v| v.as_f64()), Some(0.01));
        assert_eq!(config.get("rotate_dice").and_then(|v| v.as_bool()), Some(true));
        assert!(config.get("missing_key").is_none());
    }

    #[test]
    fn test_dotted_path() {
        let config = ConfigLoader::from_string(CONFIG, "rollout".to_string()).unwrap();

        assert_eq!(
            config.get("player_0.chequer_plies").and_then(|v| v.as_usize()),
            Some(2)
        );
        assert!(config.get("player_1.chequer_plies").is_none());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".conf").tempfile().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = ConfigLoader::new(file.path(), "rollout".to_string()).unwrap();

        assert_eq!(config.get("trials").and_then(|v| v.as_u64()), Some(1296));
    }

    #[test]
    fn test_missing_file_is_error() {
        let res = ConfigLoader::new("/does/not/exist.conf", "rollout".to_string());

        assert!(res.is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(ConfigError::check_range("plies", 2.0, 0.0, 7.0).is_ok());
        assert!(ConfigError::check_range("plies", 8.0, 0.0, 7.0).is_err());
        assert!(ConfigError::check_range("limit", f64::NAN, 0.0, 1.0).is_err());
    }
}
