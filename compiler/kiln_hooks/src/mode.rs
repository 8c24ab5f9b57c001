//! Injection strategy selection.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Environment variable selecting the injection strategy.
pub const INJECTION_ENV: &str = "KILN_INJECTION";

/// Where injected text lands in the unit under construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InjectionMode {
    /// Right after the last consumed token.
    #[default]
    Precise,
    /// At the start of the next source line. Text left on the current line
    /// is parsed before the injected fragment, which draws a warning.
    Line,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown injection mode `{0}` (expected `precise` or `line`)")]
pub struct ParseInjectionModeError(String);

impl FromStr for InjectionMode {
    type Err = ParseInjectionModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "precise" => Ok(InjectionMode::Precise),
            // `filter` names the source-filter implementation of line mode.
            "line" | "filter" => Ok(InjectionMode::Line),
            other => Err(ParseInjectionModeError(other.to_owned())),
        }
    }
}

impl fmt::Display for InjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectionMode::Precise => write!(f, "precise"),
            InjectionMode::Line => write!(f, "line"),
        }
    }
}

impl InjectionMode {
    /// Read [`INJECTION_ENV`], falling back to [`InjectionMode::Precise`].
    ///
    /// An unrecognized value is logged and ignored.
    pub fn from_env() -> Self {
        match std::env::var(INJECTION_ENV) {
            Ok(value) => Self::from_env_value(&value),
            Err(_) => InjectionMode::default(),
        }
    }

    fn from_env_value(value: &str) -> Self {
        value.parse().unwrap_or_else(|err: ParseInjectionModeError| {
            tracing::warn!(%err, "ignoring {INJECTION_ENV}");
            InjectionMode::default()
        })
    }
}
