//! Terminal conformance levels.
//!
//! The emulation negotiates between VT100-family levels; DECSCL switches
//! within the bounds of the configured maximum. Functions marked VT220+
//! in the dispatcher are no-ops below that level.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::options::OptionsError;

/// VT conformance level. Ordering follows capability: anything below
/// `Vt220` is a level-1 terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TermLevel {
    Vt100,
    Vt101,
    Vt102,
    /// VT100-level terminal with graphics (sixel) support.
    Vt125,
    #[default]
    Vt220,
    /// VT220-level terminal with graphics (sixel) support.
    Vt241,
}

impl TermLevel {
    /// Whether this level includes the VT220 feature set.
    pub fn has_vt220(self) -> bool {
        self >= TermLevel::Vt220
    }

    /// Whether this is a graphics-capable (sixel) terminal type.
    pub fn is_graphics(self) -> bool {
        matches!(self, TermLevel::Vt125 | TermLevel::Vt241)
    }

    /// The DECSCL conformance-level number reported for this level.
    pub fn conformance(self) -> u32 {
        if self.has_vt220() {
            62
        } else {
            61
        }
    }
}

impl fmt::Display for TermLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TermLevel::Vt100 => "vt100",
            TermLevel::Vt101 => "vt101",
            TermLevel::Vt102 => "vt102",
            TermLevel::Vt125 => "vt125",
            TermLevel::Vt220 => "vt220",
            TermLevel::Vt241 => "vt241",
        };
        f.write_str(name)
    }
}

impl FromStr for TermLevel {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vt100" => Ok(TermLevel::Vt100),
            "vt101" => Ok(TermLevel::Vt101),
            "vt102" => Ok(TermLevel::Vt102),
            "vt125" => Ok(TermLevel::Vt125),
            "vt220" => Ok(TermLevel::Vt220),
            "vt241" => Ok(TermLevel::Vt241),
            _ => Err(OptionsError::InvalidValue(
                "default-emulation-level",
                s.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(TermLevel::Vt100 < TermLevel::Vt220);
        assert!(TermLevel::Vt125 < TermLevel::Vt220);
        assert!(TermLevel::Vt220 < TermLevel::Vt241);
        assert!(!TermLevel::Vt125.has_vt220());
        assert!(TermLevel::Vt241.has_vt220());
    }

    #[test]
    fn test_graphics_levels() {
        assert!(TermLevel::Vt125.is_graphics());
        assert!(TermLevel::Vt241.is_graphics());
        assert!(!TermLevel::Vt220.is_graphics());
    }

    #[test]
    fn test_conformance_numbers() {
        assert_eq!(TermLevel::Vt100.conformance(), 61);
        assert_eq!(TermLevel::Vt125.conformance(), 61);
        assert_eq!(TermLevel::Vt220.conformance(), 62);
        assert_eq!(TermLevel::Vt241.conformance(), 62);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("vt220".parse::<TermLevel>().unwrap(), TermLevel::Vt220);
        assert_eq!("VT125".parse::<TermLevel>().unwrap(), TermLevel::Vt125);
        assert!("vt52".parse::<TermLevel>().is_err());
    }
}
