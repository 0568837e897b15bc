//! Feature toggles and their configuration.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Prefix for environment variables read by [`TraceConfig::from_env()`].
pub const ENV_PREFIX: &str = "LANETRACE";

/// Default indentation rendered once per lane index.
pub const DEFAULT_INDENT_UNIT: &str = "\t";

/// Boolean flag that is read on every call and written rarely.
#[derive(Debug)]
pub struct Toggle(RwLock<bool>);
impl Default for Toggle {
    fn default() -> Self {
        Self::new(true)
    }
}
impl Toggle {
    /// Constructs a toggle with an initial value.
    pub fn new(value: bool) -> Self {
        Self(RwLock::new(value))
    }
    /// Returns the current value.
    pub fn get(&self) -> bool {
        *self.0.read()
    }
    /// Sets the value, effective for every subsequent [`Toggle::get()`].
    pub fn set(&self, value: bool) {
        *self.0.write() = value;
    }
}

/// Settings for a [`crate::Tracer`].
///
/// When loaded from the environment, each field maps to a variable such as
/// `LANETRACE_DEBUG_STATEMENTS=false` or `LANETRACE_INDENT_UNIT="  "`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Whether `emit_debug` produces any output.
    pub debug_statements: bool,
    /// Whether lines are indented by lane and new lanes are announced.
    pub lane_marking: bool,
    /// String repeated once per lane index to build the indentation.
    pub indent_unit: String,
}
impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            debug_statements: true,
            lane_marking: true,
            indent_unit: DEFAULT_INDENT_UNIT.to_owned(),
        }
    }
}
impl TraceConfig {
    /// Loads configuration from `LANETRACE_*` environment variables, using
    /// defaults for any that are unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads configuration from an arbitrary source layered over the
    /// defaults.
    pub fn from_source(
        source: impl config::Source + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        let ret: Self = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        ret.validate()?;
        Ok(ret)
    }

    /// Returns an error if the settings cannot produce well-formed output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indent_unit.contains(['\n', '\r']) {
            return Err(ConfigError::MultilineIndent(self.indent_unit.clone()));
        }
        Ok(())
    }
}
