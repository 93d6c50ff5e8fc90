//! Options the dispatcher consults.
//!
//! These mirror the host's option store; the dispatcher reads them through
//! an immutable borrow on every batch, so the host can change them between
//! batches without telling anyone.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::level::TermLevel;

/// Option parsing errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionsError {
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(&'static str, String),
}

/// The `extended-keys` option: whether applications may switch on
/// extended key reporting, and whether it is forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtendedKeys {
    #[default]
    Off,
    On,
    Always,
}

impl FromStr for ExtendedKeys {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ExtendedKeys::Off),
            "on" => Ok(ExtendedKeys::On),
            "always" => Ok(ExtendedKeys::Always),
            _ => Err(OptionsError::InvalidValue("extended-keys", s.to_string())),
        }
    }
}

/// The `allow-passthrough` option. `All` also permits passthrough writes
/// to wrap at the screen edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowPassthrough {
    #[default]
    Off,
    On,
    All,
}

impl FromStr for AllowPassthrough {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(AllowPassthrough::Off),
            "on" => Ok(AllowPassthrough::On),
            "all" => Ok(AllowPassthrough::All),
            _ => Err(OptionsError::InvalidValue(
                "allow-passthrough",
                s.to_string(),
            )),
        }
    }
}

/// The `set-clipboard` option; OSC 52 only works when `External`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetClipboard {
    Off,
    Internal,
    #[default]
    External,
}

impl FromStr for SetClipboard {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(SetClipboard::Off),
            "internal" => Ok(SetClipboard::Internal),
            "external" => Ok(SetClipboard::External),
            _ => Err(OptionsError::InvalidValue("set-clipboard", s.to_string())),
        }
    }
}

/// All options the dispatcher reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Highest conformance level the attachment may negotiate.
    pub default_emulation_level: TermLevel,
    pub extended_keys: ExtendedKeys,
    pub allow_passthrough: AllowPassthrough,
    pub allow_set_title: bool,
    pub allow_rename: bool,
    pub automatic_rename: bool,
    /// DECSCUSR fallback style, 0..=6.
    pub cursor_style: u8,
    pub set_clipboard: SetClipboard,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            default_emulation_level: TermLevel::Vt220,
            extended_keys: ExtendedKeys::Off,
            allow_passthrough: AllowPassthrough::Off,
            allow_set_title: true,
            allow_rename: false,
            automatic_rename: true,
            cursor_style: 0,
            set_clipboard: SetClipboard::External,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.default_emulation_level, TermLevel::Vt220);
        assert_eq!(options.extended_keys, ExtendedKeys::Off);
        assert!(options.allow_set_title);
        assert!(!options.allow_rename);
        assert_eq!(options.set_clipboard, SetClipboard::External);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("always".parse::<ExtendedKeys>(), Ok(ExtendedKeys::Always));
        assert_eq!("all".parse::<AllowPassthrough>(), Ok(AllowPassthrough::All));
        assert_eq!("internal".parse::<SetClipboard>(), Ok(SetClipboard::Internal));
        assert!("maybe".parse::<ExtendedKeys>().is_err());
    }
}
