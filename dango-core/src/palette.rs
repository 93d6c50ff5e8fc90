//! Per-pane color palette.
//!
//! OSC 4/104 and DECCTR override entries of the 256-color table; OSC
//! 10/11/110/111 override the default foreground and background. Entries
//! that have not been overridden resolve through the built-in table.

use serde::{Deserialize, Serialize};

use crate::color::{default_256_palette, Color, Rgb};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorPalette {
    /// Overridden default foreground, `Color::Default` when unset.
    pub fg: Color,
    /// Overridden default background, `Color::Default` when unset.
    pub bg: Color,
    entries: Vec<Option<Color>>,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorPalette {
    pub fn new() -> Self {
        ColorPalette {
            fg: Color::Default,
            bg: Color::Default,
            entries: vec![None; 256],
        }
    }

    /// The override for entry `index`, if any.
    pub fn get(&self, index: u8) -> Option<Color> {
        self.entries[index as usize]
    }

    /// The effective RGB value of entry `index`: the override when set,
    /// the built-in table otherwise.
    pub fn resolve(&self, index: u8) -> Rgb {
        match self.entries[index as usize].and_then(Color::to_rgb) {
            Some(rgb) => rgb,
            None => default_256_palette()[index as usize],
        }
    }

    /// Override an entry; returns whether anything changed.
    pub fn set(&mut self, index: u8, color: Color) -> bool {
        let slot = &mut self.entries[index as usize];
        if *slot == Some(color) {
            false
        } else {
            *slot = Some(color);
            true
        }
    }

    /// Remove one override; returns whether anything changed.
    pub fn unset(&mut self, index: u8) -> bool {
        self.entries[index as usize].take().is_some()
    }

    /// Remove every override, including foreground and background.
    pub fn clear(&mut self) {
        self.fg = Color::Default;
        self.bg = Color::Default;
        self.entries.iter_mut().for_each(|e| *e = None);
    }

    /// Replace all entry overrides at once (DECCTR restore).
    pub fn replace(&mut self, entries: Vec<Option<Color>>) {
        debug_assert_eq!(entries.len(), 256);
        self.entries = entries;
    }

    /// Snapshot of the entry overrides (DECCTR restore works on a copy so
    /// a parse error can leave the palette untouched).
    pub fn snapshot(&self) -> Vec<Option<Color>> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_builtin() {
        let palette = ColorPalette::new();
        assert_eq!(palette.resolve(1), Rgb::new(205, 0, 0));
    }

    #[test]
    fn test_set_and_unset() {
        let mut palette = ColorPalette::new();
        assert!(palette.set(1, Color::Rgb(Rgb::new(9, 9, 9))));
        assert!(!palette.set(1, Color::Rgb(Rgb::new(9, 9, 9))));
        assert_eq!(palette.resolve(1), Rgb::new(9, 9, 9));
        assert!(palette.unset(1));
        assert!(!palette.unset(1));
        assert_eq!(palette.resolve(1), Rgb::new(205, 0, 0));
    }

    #[test]
    fn test_clear_resets_fg_bg() {
        let mut palette = ColorPalette::new();
        palette.fg = Color::Rgb(Rgb::new(1, 2, 3));
        palette.set(0, Color::Rgb(Rgb::new(4, 5, 6)));
        palette.clear();
        assert_eq!(palette.fg, Color::Default);
        assert_eq!(palette.get(0), None);
    }
}
