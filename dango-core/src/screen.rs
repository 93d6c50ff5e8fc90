//! Screen mode flags and the screen-writer interface.
//!
//! The grid lives outside this workspace: the dispatcher drives it through
//! [`ScreenWrite`]. The trait mirrors the write operations a multiplexer's
//! screen layer offers, plus the read access the dispatcher needs to answer
//! queries (cursor position, margins, tab stops, modes).

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::color::Color;
use crate::host::SixelImage;

/// Screen/terminal mode flags, toggled by SM/RM and DEC private modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenMode {
    bits: u32,
}

impl ScreenMode {
    pub const NONE: u32 = 0;
    /// DECTCEM: text cursor visible.
    pub const CURSOR: u32 = 1 << 0;
    /// IRM: insert mode.
    pub const INSERT: u32 = 1 << 1;
    /// DECCKM: application cursor keys.
    pub const KCURSOR: u32 = 1 << 2;
    /// DECKPAM/DECNKM: application keypad.
    pub const KKEYPAD: u32 = 1 << 3;
    /// DECAWM: auto-wrap.
    pub const WRAP: u32 = 1 << 4;
    /// Mouse mode 1000: clicks.
    pub const MOUSE_STANDARD: u32 = 1 << 5;
    /// Mouse mode 1002: clicks and drag.
    pub const MOUSE_BUTTON: u32 = 1 << 6;
    /// Mouse mode 1003: all movement.
    pub const MOUSE_ALL: u32 = 1 << 7;
    /// Mouse mode 1005: UTF-8 coordinate encoding.
    pub const MOUSE_UTF8: u32 = 1 << 8;
    /// Mouse mode 1006: SGR coordinate encoding.
    pub const MOUSE_SGR: u32 = 1 << 9;
    /// Mode 2004: bracketed paste.
    pub const BRACKET_PASTE: u32 = 1 << 10;
    /// Mode 1004: focus reporting.
    pub const FOCUS_ON: u32 = 1 << 11;
    /// LNM: linefeed implies carriage return.
    pub const CRLF: u32 = 1 << 12;
    /// DECOM: origin mode.
    pub const ORIGIN: u32 = 1 << 13;
    /// Cursor blinking.
    pub const CURSOR_BLINKING: u32 = 1 << 14;
    /// A sequence has explicitly chosen the blinking state.
    pub const CURSOR_BLINKING_SET: u32 = 1 << 15;
    /// SCSTCURM: very visible cursor.
    pub const CURSOR_VERY_VISIBLE: u32 = 1 << 16;
    /// Mode 2031: theme change reports.
    pub const THEME_UPDATES: u32 = 1 << 17;
    /// Extended key reporting (modifyOtherKeys 1).
    pub const KEYS_EXTENDED: u32 = 1 << 18;
    /// Extended key reporting (modifyOtherKeys 2).
    pub const KEYS_EXTENDED_2: u32 = 1 << 19;
    /// DECLRMM: left/right margin mode.
    pub const LR_MARGINS: u32 = 1 << 20;

    pub const ALL_MOUSE_MODES: u32 = Self::MOUSE_STANDARD | Self::MOUSE_BUTTON | Self::MOUSE_ALL;
    pub const EXTENDED_KEY_MODES: u32 = Self::KEYS_EXTENDED | Self::KEYS_EXTENDED_2;

    pub const fn empty() -> Self {
        ScreenMode { bits: Self::NONE }
    }

    pub const fn new(bits: u32) -> Self {
        ScreenMode { bits }
    }

    pub fn contains(&self, flag: u32) -> bool {
        self.bits & flag != 0
    }

    pub fn insert(&mut self, flag: u32) {
        self.bits |= flag;
    }

    pub fn remove(&mut self, flag: u32) {
        self.bits &= !flag;
    }

    pub fn set(&mut self, flag: u32, value: bool) {
        if value {
            self.bits |= flag;
        } else {
            self.bits &= !flag;
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }
}

/// Cursor shape as set by DECSCUSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorStyle {
    #[default]
    Default,
    Block,
    Underline,
    Bar,
}

impl CursorStyle {
    /// The DECSCUSR style group number (0 for default, 1 block, 2
    /// underline, 3 bar); blinking halves are derived from the mode.
    pub fn group(self) -> u32 {
        match self {
            CursorStyle::Default => 0,
            CursorStyle::Block => 1,
            CursorStyle::Underline => 2,
            CursorStyle::Bar => 3,
        }
    }
}

/// Shell-integration marks set on the current grid line (OSC 133).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineMark {
    PromptStart,
    OutputStart,
}

/// The screen writer: everything the dispatcher does to a pane's grid, and
/// the state it reads back for replies. One implementation per pane; tests
/// use a recording mock.
pub trait ScreenWrite {
    // ── state reads ────────────────────────────────────────────────

    fn size_x(&self) -> usize;
    fn size_y(&self) -> usize;
    fn cursor_x(&self) -> usize;
    fn cursor_y(&self) -> usize;
    fn mode(&self) -> ScreenMode;
    /// Top row of the scroll region (0-based, inclusive).
    fn region_upper(&self) -> usize;
    /// Bottom row of the scroll region (0-based, inclusive).
    fn region_lower(&self) -> usize;
    /// Left column of the scroll margin (0-based, inclusive).
    fn margin_left(&self) -> usize;
    /// Right column of the scroll margin (0-based, inclusive).
    fn margin_right(&self) -> usize;
    fn is_tab(&self, x: usize) -> bool;
    fn cursor_style(&self) -> CursorStyle;
    fn cursor_color(&self) -> Option<Color>;
    fn default_cursor_color(&self) -> Option<Color>;
    /// Whether the alternate screen is active.
    fn alternate_active(&self) -> bool;

    // ── printing ───────────────────────────────────────────────────

    /// Add a printed cell to the current collection run.
    fn collect_add(&mut self, cell: &Cell);
    /// Flush the current collection run before a non-print operation.
    fn collect_end(&mut self);

    // ── cursor motion ──────────────────────────────────────────────

    fn backspace(&mut self);
    fn carriage_return(&mut self);
    fn linefeed(&mut self, bg: Color);
    fn cursor_up(&mut self, n: usize);
    fn cursor_down(&mut self, n: usize);
    fn cursor_left(&mut self, n: usize);
    fn cursor_right(&mut self, n: usize);
    /// Move the cursor; `None` keeps that axis. `origin` honours DECOM.
    fn cursor_move(&mut self, cx: Option<usize>, cy: Option<usize>, origin: bool);
    fn reverse_index(&mut self, bg: Color);
    fn back_index(&mut self, bg: Color);
    fn forward_index(&mut self, bg: Color);

    // ── erase ──────────────────────────────────────────────────────

    fn clear_end_of_screen(&mut self, bg: Color, selective: bool);
    fn clear_start_of_screen(&mut self, bg: Color, selective: bool);
    fn clear_screen(&mut self, bg: Color, selective: bool);
    fn clear_end_of_line(&mut self, bg: Color, selective: bool);
    fn clear_start_of_line(&mut self, bg: Color, selective: bool);
    fn clear_line(&mut self, bg: Color, selective: bool);
    fn clear_history(&mut self);
    fn clear_character(&mut self, n: usize, bg: Color);

    // ── insert / delete ────────────────────────────────────────────

    fn insert_character(&mut self, n: usize, bg: Color);
    fn delete_character(&mut self, n: usize, bg: Color);
    fn insert_line(&mut self, n: usize, bg: Color);
    fn delete_line(&mut self, n: usize, bg: Color);
    fn insert_column(&mut self, n: usize, bg: Color);
    fn delete_column(&mut self, n: usize, bg: Color);

    // ── scrolling and margins ──────────────────────────────────────

    fn scroll_up(&mut self, n: usize, bg: Color);
    fn scroll_down(&mut self, n: usize, bg: Color);
    fn scroll_left(&mut self, n: usize, bg: Color);
    fn scroll_right(&mut self, n: usize, bg: Color);
    /// DECSTBM, 0-based inclusive rows.
    fn scroll_region(&mut self, top: usize, bottom: usize);
    /// DECSLRM, 0-based inclusive columns.
    fn scroll_margin(&mut self, left: usize, right: usize);

    // ── modes and screens ──────────────────────────────────────────

    fn mode_set(&mut self, flags: u32);
    fn mode_clear(&mut self, flags: u32);
    fn alternate_on(&mut self, cell: &Cell, with_cursor: bool);
    fn alternate_off(&mut self, cell: &Cell, with_cursor: bool);

    // ── tabs ───────────────────────────────────────────────────────

    fn set_tab(&mut self, x: usize);
    fn clear_tab(&mut self, x: usize);
    fn clear_all_tabs(&mut self);
    /// Replace the whole tab map with the given 0-based stops.
    fn replace_tabs(&mut self, stops: &[usize]);

    // ── titles, path, cursor appearance ────────────────────────────

    /// Set the title; returns whether it changed.
    fn set_title(&mut self, title: &str) -> bool;
    fn push_title(&mut self);
    fn pop_title(&mut self);
    fn set_path(&mut self, path: &str);
    fn set_cursor_style(&mut self, style: CursorStyle);
    fn set_cursor_color(&mut self, color: Option<Color>);

    // ── everything else ────────────────────────────────────────────

    fn alignment_test(&mut self);
    fn set_selection(&mut self, flags: &str, data: &[u8]);
    fn mark_line(&mut self, mark: LineMark);
    fn sixel_image(&mut self, image: &SixelImage, bg: Color);
    /// RIS: reset the screen completely.
    fn reset(&mut self);
    /// DECSTR: reset modes and margins but keep the grid contents.
    fn soft_reset(&mut self);
    fn full_redraw(&mut self);
    /// Write bytes straight through to the outer terminal (passthrough).
    fn raw_string(&mut self, data: &[u8], allow_wrap: bool);
}
