use felt_ai::DecisionConfig;
use felt_engine::table::TableConfig;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;

/// Everything a session needs to run a table.
///
/// Loaded once from TOML or built in code. Changes requested while a hand is
/// running are held back until the next hand starts.
///
/// ```
/// use felt_session::SessionSettings;
///
/// let settings = SessionSettings::from_toml_str(
///     r#"
///     starting_stack = 500
///     bot_think_delay_ms = 0
///
///     [table]
///     max_seats = 2
///     small_blind = 1
///     big_blind = 2
///
///     [decision]
///     bluffing = false
///     "#,
/// )
/// .unwrap();
/// assert_eq!(settings.table.big_blind, 2);
/// assert!(!settings.decision.bluffing);
/// assert!(settings.decision.postflop_heuristics);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub table: TableConfig,
    /// Chips handed to a player seated without an explicit stack
    pub starting_stack: u32,
    /// Pause before each bot decision
    pub bot_think_delay_ms: u64,
    /// Upper bound on one remote round-trip before falling back
    pub remote_timeout_ms: u64,
    /// Bot factory name, see [`felt_ai::create_ai`]
    pub bot_strategy: String,
    pub decision: DecisionConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            table: TableConfig::default(),
            starting_stack: 1000,
            bot_think_delay_ms: 800,
            remote_timeout_ms: 5000,
            bot_strategy: "range".to_string(),
            decision: DecisionConfig::default(),
        }
    }
}

impl SessionSettings {
    pub fn from_toml_str(input: &str) -> Result<Self, SettingsError> {
        let settings: SessionSettings =
            toml::from_str(input).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings values
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.table
            .validate()
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;
        self.decision
            .validate()
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;

        if self.starting_stack == 0 {
            return Err(SettingsError::InvalidValue(
                "starting_stack must be greater than 0".to_string(),
            ));
        }

        if self.remote_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "remote_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.bot_strategy.is_empty() {
            return Err(SettingsError::InvalidValue(
                "bot_strategy cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Seat count and deck seed are fixed for the lifetime of a table.
    pub fn check_compatible(&self, next: &SessionSettings) -> Result<(), SettingsError> {
        if self.table.max_seats != next.table.max_seats {
            return Err(SettingsError::InvalidValue(
                "max_seats cannot change on an existing table".to_string(),
            ));
        }
        if self.table.seed != next.table.seed {
            return Err(SettingsError::InvalidValue(
                "seed cannot change on an existing table".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bot_think_delay(&self) -> Duration {
        Duration::from_millis(self.bot_think_delay_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

/// Settings requested for the session, validated on every write.
#[derive(Debug)]
pub struct SettingsStore {
    settings: RwLock<SessionSettings>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(SessionSettings::default()),
        }
    }

    pub fn with_settings(settings: SessionSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings: RwLock::new(settings),
        })
    }

    /// Get current settings
    pub fn get(&self) -> Result<SessionSettings, SettingsError> {
        self.settings
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| SettingsError::StoragePoisoned)
    }

    /// Update settings with validation
    pub fn update(&self, new_settings: SessionSettings) -> Result<SessionSettings, SettingsError> {
        new_settings.validate()?;

        let mut guard = self
            .settings
            .write()
            .map_err(|_| SettingsError::StoragePoisoned)?;
        *guard = new_settings.clone();
        Ok(new_settings)
    }

    /// Update one top-level field from a loosely typed value.
    pub fn update_field(
        &self,
        field: &str,
        value: serde_json::Value,
    ) -> Result<SessionSettings, SettingsError> {
        let mut current = self.get()?;
        let number = |name: &str| {
            value
                .as_u64()
                .ok_or_else(|| SettingsError::InvalidValue(format!("{name} must be a number")))
        };
        let chips = |name: &str| {
            number(name).and_then(|n| {
                u32::try_from(n)
                    .map_err(|_| SettingsError::InvalidValue(format!("{name} is out of range")))
            })
        };

        match field {
            "small_blind" => current.table.small_blind = chips(field)?,
            "big_blind" => current.table.big_blind = chips(field)?,
            "starting_stack" => current.starting_stack = chips(field)?,
            "bot_think_delay_ms" => current.bot_think_delay_ms = number(field)?,
            "remote_timeout_ms" => current.remote_timeout_ms = number(field)?,
            "bot_strategy" => {
                let strategy = value.as_str().ok_or_else(|| {
                    SettingsError::InvalidValue("bot_strategy must be a string".to_string())
                })?;
                current.bot_strategy = strategy.to_string();
            }
            _ => {
                return Err(SettingsError::InvalidValue(format!(
                    "unknown field: {}",
                    field
                )))
            }
        }

        self.update(current)
    }

    /// Reset to default settings
    pub fn reset(&self) -> Result<SessionSettings, SettingsError> {
        self.update(SessionSettings::default())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
    #[error("Settings could not be parsed: {0}")]
    Parse(String),
    #[error("Settings storage poisoned")]
    StoragePoisoned,
}
