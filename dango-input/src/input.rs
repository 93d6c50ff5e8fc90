//! The input context: parser actions to screen writes.
//!
//! One [`InputContext`] per pane/attachment, driven from its event loop.
//! Nothing here is re-entrant: screen-writer calls never call back into
//! the context, and a batch runs to completion before the next one.

use std::time::Instant;

use log::{debug, trace};

use dango_core::{
    Cell, CellFlags, ColorPalette, CursorStyle, ExtendedKeys, HostEvents, Hyperlinks, Options,
    PasteStore, ReplySink, ScreenMode, ScreenWrite, SixelDecoder, TermLevel, Theme,
};
use dango_parser::{action::c0, Action, Params, Parser};

use crate::reply::reply;

/// Sixel colour registers reported by `CSI ? 1 ; ... S`.
const SIXEL_COLOR_REGISTERS: u32 = 1024;

/// Everything the dispatcher borrows from the host for one batch of input.
pub struct Host<'a> {
    pub screen: &'a mut dyn ScreenWrite,
    pub replies: &'a mut dyn ReplySink,
    pub palette: &'a mut ColorPalette,
    pub hyperlinks: &'a mut Hyperlinks,
    pub paste: &'a mut dyn PasteStore,
    pub options: &'a Options,
    pub events: &'a mut dyn HostEvents,
    /// Present when the host can decode sixel graphics; its presence also
    /// switches DA replies to the graphics terminal types.
    pub sixel: Option<&'a mut dyn SixelDecoder>,
}

/// The working cell: grid cell plus charset selection state.
#[derive(Debug, Clone, Default)]
pub(crate) struct InputCell {
    pub cell: Cell,
    /// Which of G0/G1 is mapped into GL (SO/SI).
    pub set: usize,
    /// G0 designates the ACS line-drawing set.
    pub g0_acs: bool,
    /// G1 designates the ACS line-drawing set.
    pub g1_acs: bool,
}

#[derive(Debug, Clone, Default)]
struct SavedState {
    cell: InputCell,
    cx: usize,
    cy: usize,
    origin: bool,
}

pub struct InputContext {
    parser: Parser,
    pub(crate) cell: InputCell,
    saved: SavedState,
    pub(crate) term_level: TermLevel,
    pub(crate) max_level: TermLevel,
    /// Last printed grapheme, replayed by REP.
    last: String,
    /// Set while the previous action was a print.
    last_valid: bool,
}

impl InputContext {
    pub fn new(options: &Options) -> Self {
        let max_level = options.default_emulation_level;
        InputContext {
            parser: Parser::new(),
            cell: InputCell::default(),
            saved: SavedState::default(),
            term_level: max_level,
            max_level,
            last: String::new(),
            last_valid: false,
        }
    }

    /// The conformance level currently negotiated (DECSCL).
    pub fn term_level(&self) -> TermLevel {
        self.term_level
    }

    pub fn max_level(&self) -> TermLevel {
        self.max_level
    }

    /// The working cell attributes, as SGR has left them.
    pub fn cell(&self) -> &Cell {
        &self.cell.cell
    }

    /// Change the hard cap on collected string payloads.
    pub fn set_buffer_size(&mut self, size: usize) {
        self.parser.set_buffer_size(size);
    }

    /// Bytes consumed since the parser last saw ground state; replayed to
    /// control clients that attach mid-sequence.
    pub fn pending(&self) -> &[u8] {
        self.parser.pending()
    }

    /// Drive the watchdog; a string state stuck past its deadline is
    /// discarded and the parser returns to ground.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        let expired = self.parser.check_timeout(now);
        if expired {
            debug!("string state timed out, back to ground");
        }
        expired
    }

    /// Reset to the initial state; with `clear` the screen is reset too.
    pub fn reset(&mut self, clear: bool, host: &mut Host<'_>) {
        self.reset_cell();
        if clear {
            host.screen.reset();
        }
        self.parser.reset();
        self.last_valid = false;
    }

    /// Feed one batch of pty output.
    pub fn parse(&mut self, input: &[u8], host: &mut Host<'_>) {
        let mut actions = Vec::new();
        self.parser.parse(input, |action| actions.push(action));
        for action in actions {
            self.dispatch(action, host);
        }
        host.screen.collect_end();
    }

    fn dispatch(&mut self, action: Action, host: &mut Host<'_>) {
        if !action.is_print() {
            host.screen.collect_end();
        }
        match action {
            Action::Print(c) => self.print(c, host),
            Action::Execute(ch) => self.c0_dispatch(ch, host),
            Action::EscDispatch { intermediates, ch } => {
                self.esc_dispatch(&intermediates, ch, host)
            }
            Action::CsiDispatch {
                params,
                intermediates,
                ch,
            } => self.csi_dispatch(&params, &intermediates, ch, host),
            Action::DcsDispatch {
                params,
                intermediates,
                data,
            } => {
                self.dcs_dispatch(&params, &intermediates, &data, host);
                self.last_valid = false;
            }
            Action::OscDispatch {
                data,
                bel_terminated,
            } => {
                self.osc_dispatch(&data, bel_terminated, host);
                self.last_valid = false;
            }
            Action::ApcDispatch { data } => {
                self.apc_dispatch(&data, host);
                self.last_valid = false;
            }
            Action::RenameDispatch { data } => {
                self.rename_dispatch(&data, host);
                self.last_valid = false;
            }
        }
    }

    // ── printing ───────────────────────────────────────────────────

    fn print(&mut self, c: char, host: &mut Host<'_>) {
        let acs = if self.cell.set == 0 {
            self.cell.g0_acs
        } else {
            self.cell.g1_acs
        };
        self.cell.cell.flags.set(CellFlags::CHARSET, acs);
        self.cell.cell.c = c.to_string();
        host.screen.collect_add(&self.cell.cell);

        self.last = self.cell.cell.c.clone();
        self.last_valid = true;
        self.cell.cell.flags.remove(CellFlags::CHARSET);
    }

    // ── C0 ─────────────────────────────────────────────────────────

    fn c0_dispatch(&mut self, ch: u8, host: &mut Host<'_>) {
        trace!("c0: {:#04x}", ch);
        let screen = &mut *host.screen;
        match ch {
            c0::NUL => {}
            c0::BEL => host.events.bell(),
            c0::BS => screen.backspace(),
            c0::HT => self.horizontal_tab(screen),
            c0::LF | c0::VT | c0::FF => {
                screen.linefeed(self.cell.cell.bg);
                if screen.mode().contains(ScreenMode::CRLF) {
                    screen.carriage_return();
                }
            }
            c0::CR => screen.carriage_return(),
            c0::SO => self.cell.set = 1,
            c0::SI => self.cell.set = 0,
            _ => trace!("unknown c0: {:#04x}", ch),
        }
        self.last_valid = false;
    }

    /// Advance to the next tab stop, bounded by the right margin (or the
    /// last column when the cursor is already outside the margin).
    fn horizontal_tab(&mut self, screen: &mut dyn ScreenWrite) {
        let mut cx = screen.cursor_x();
        if cx >= screen.size_x() - 1 || cx == screen.margin_right() {
            return;
        }
        let bx = if cx > screen.margin_right() {
            screen.size_x() - 1
        } else {
            screen.margin_right()
        };
        while cx < bx {
            cx += 1;
            if screen.is_tab(cx) {
                break;
            }
        }
        screen.cursor_move(Some(cx), None, false);
    }

    // ── ESC ────────────────────────────────────────────────────────

    fn esc_dispatch(&mut self, intermediates: &[u8], ch: u8, host: &mut Host<'_>) {
        trace!("esc: '{}' {:?}", ch as char, intermediates);
        let screen = &mut *host.screen;
        match (ch, intermediates) {
            (b'c', b"") => {
                // RIS
                host.palette.clear();
                self.reset_cell();
                screen.reset();
                screen.full_redraw();
            }
            (b'D', b"") => screen.linefeed(self.cell.cell.bg),
            (b'E', b"") => {
                screen.carriage_return();
                screen.linefeed(self.cell.cell.bg);
            }
            (b'H', b"") => {
                let cx = screen.cursor_x();
                if cx < screen.size_x() {
                    screen.set_tab(cx);
                }
            }
            (b'M', b"") => screen.reverse_index(self.cell.cell.bg),
            (b'6', b"") => {
                // DECBI
                if self.term_level.has_vt220() {
                    screen.back_index(self.cell.cell.bg);
                }
            }
            (b'9', b"") => {
                // DECFI
                if self.term_level.has_vt220() {
                    screen.forward_index(self.cell.cell.bg);
                }
            }
            (b'=', b"") => screen.mode_set(ScreenMode::KKEYPAD),
            (b'>', b"") => screen.mode_clear(ScreenMode::KKEYPAD),
            (b'7', b"") => self.save_state(screen),
            (b'8', b"") => self.restore_state(screen),
            (b'8', b"#") => screen.alignment_test(),
            (b'0', b"(") => self.cell.g0_acs = true,
            (b'B', b"(") => self.cell.g0_acs = false,
            (b'0', b")") => self.cell.g1_acs = true,
            (b'B', b")") => self.cell.g1_acs = false,
            (b'\\', b"") => {
                // ST terminates a string; the state machine already did.
            }
            _ => debug!("unknown esc: '{}' {:?}", ch as char, intermediates),
        }
        self.last_valid = false;
    }

    pub(crate) fn reset_cell(&mut self) {
        self.cell = InputCell::default();
        self.saved = SavedState {
            cell: self.cell.clone(),
            cx: 0,
            cy: 0,
            origin: false,
        };
    }

    pub(crate) fn soft_reset(&mut self, screen: &mut dyn ScreenWrite) {
        self.reset_cell();
        screen.soft_reset();
    }

    fn save_state(&mut self, screen: &mut dyn ScreenWrite) {
        self.saved = SavedState {
            cell: self.cell.clone(),
            cx: screen.cursor_x(),
            cy: screen.cursor_y(),
            origin: screen.mode().contains(ScreenMode::ORIGIN),
        };
    }

    fn restore_state(&mut self, screen: &mut dyn ScreenWrite) {
        self.cell = self.saved.cell.clone();
        if self.saved.origin {
            screen.mode_set(ScreenMode::ORIGIN);
        } else {
            screen.mode_clear(ScreenMode::ORIGIN);
        }
        screen.cursor_move(Some(self.saved.cx), Some(self.saved.cy), false);
    }

    // ── CSI ────────────────────────────────────────────────────────

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ch: u8, host: &mut Host<'_>) {
        trace!("csi: '{}' {:?} {:?}", ch as char, intermediates, params);
        let bg = self.cell.cell.bg;
        match (ch, intermediates) {
            (b'A', b"") | (b'k', b"") => {
                // CUU
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.cursor_up(n as usize);
                }
            }
            (b'B', b"") | (b'e', b"") => {
                // CUD
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.cursor_down(n as usize);
                }
            }
            (b'C', b"") | (b'a', b"") => {
                // CUF
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.cursor_right(n as usize);
                }
            }
            (b'D', b"") | (b'j', b"") => {
                // CUB
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.cursor_left(n as usize);
                }
            }
            (b'E', b"") => {
                // CNL
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.carriage_return();
                    host.screen.cursor_down(n as usize);
                }
            }
            (b'F', b"") => {
                // CPL
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.carriage_return();
                    host.screen.cursor_up(n as usize);
                }
            }
            (b'G', b"") | (b'`', b"") => {
                // HPA
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.cursor_move(Some(n as usize - 1), None, true);
                }
            }
            (b'H', b"") | (b'f', b"") => {
                // CUP
                let n = params.get(0, 1, 1);
                let m = params.get(1, 1, 1);
                if n != -1 && m != -1 {
                    host.screen
                        .cursor_move(Some(m as usize - 1), Some(n as usize - 1), true);
                }
            }
            (b'd', b"") => {
                // VPA
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.cursor_move(None, Some(n as usize - 1), true);
                }
            }
            (b'I', b"") => self.cursor_tab_forward(params, host.screen),
            (b'Z', b"") => self.cursor_tab_back(params, host.screen),
            (b'J', b"") => self.erase_display(params, false, host),
            (b'J', b"?") => self.erase_display(params, true, host),
            (b'K', b"") => self.erase_line(params, false, host),
            (b'K', b"?") => self.erase_line(params, true, host),
            (b'L', b"") => {
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.insert_line(n as usize, bg);
                }
            }
            (b'M', b"") => {
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.delete_line(n as usize, bg);
                }
            }
            (b'@', b"") => {
                // ICH
                if self.term_level.has_vt220() {
                    let n = params.get(0, 1, 1);
                    if n != -1 {
                        host.screen.insert_character(n as usize, bg);
                    }
                }
            }
            (b'P', b"") => {
                // DCH
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.delete_character(n as usize, bg);
                }
            }
            (b'X', b"") => {
                // ECH
                if self.term_level.has_vt220() {
                    let n = params.get(0, 1, 1);
                    if n != -1 {
                        host.screen.clear_character(n as usize, bg);
                    }
                }
            }
            (b'}', b"'") => {
                // DECIC
                if self.term_level.has_vt220() {
                    let n = params.get(0, 1, 1);
                    if n != -1 {
                        host.screen.insert_column(n as usize, bg);
                    }
                }
            }
            (b'~', b"'") => {
                // DECDC
                if self.term_level.has_vt220() {
                    let n = params.get(0, 1, 1);
                    if n != -1 {
                        host.screen.delete_column(n as usize, bg);
                    }
                }
            }
            (b'S', b"") => {
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.scroll_up(n as usize, bg);
                }
            }
            (b'T', b"") => {
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.scroll_down(n as usize, bg);
                }
            }
            (b'@', b" ") => {
                // SL
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.scroll_left(n as usize, bg);
                }
            }
            (b'A', b" ") => {
                // SR
                let n = params.get(0, 1, 1);
                if n != -1 {
                    host.screen.scroll_right(n as usize, bg);
                }
            }
            (b'r', b"") => {
                // DECSTBM
                let n = params.get(0, 1, 1);
                let m = params.get(1, 1, host.screen.size_y() as i32);
                if n != -1 && m != -1 {
                    host.screen.scroll_region(n as usize - 1, m as usize - 1);
                }
            }
            (b's', b"") => {
                // DECSLRM when margins are on, otherwise save cursor.
                if host.screen.mode().contains(ScreenMode::LR_MARGINS) {
                    let n = params.get(0, 1, 1);
                    let m = params.get(1, 1, host.screen.size_x() as i32);
                    if n != -1 && m != -1 {
                        host.screen.scroll_margin(n as usize - 1, m as usize - 1);
                    }
                } else {
                    self.save_state(host.screen);
                }
            }
            (b'u', b"") => self.restore_state(host.screen),
            (b'b', b"") => self.repeat(params, host),
            (b'g', b"") => self.tab_clear(params, host.screen),
            (b'm', b"") => self.csi_dispatch_sgr(params),
            (b'm', b">") => self.modset(params, host),
            (b'n', b">") => self.modoff(params, host),
            (b'h', b"") => self.csi_sm(params, host, true),
            (b'l', b"") => self.csi_sm(params, host, false),
            (b'h', b"?") => self.csi_sm_private(params, host, true),
            (b'l', b"?") => self.csi_sm_private(params, host, false),
            (b'S', b"?") => self.csi_sm_graphics(params, host),
            (b'c', b"") => self.device_attributes(params, host),
            (b'c', b">") => self.device_attributes_2(params, host),
            (b'q', b">") => self.extended_device_attributes(params, host),
            (b'n', b"") => self.device_status(params, host),
            (b'n', b"?") => self.device_status_private(params, host),
            (b'p', b"!") => {
                // DECSTR
                if self.term_level.has_vt220() {
                    self.soft_reset(host.screen);
                }
            }
            (b'p', b"\"") => self.conformance_level(params, host),
            (b'p', b"$") => {
                if self.term_level.has_vt220() {
                    self.mode_report(params, host);
                }
            }
            (b'p', b"?$") => {
                if self.term_level.has_vt220() {
                    self.mode_report_private(params, host);
                }
            }
            (b'q', b" ") => self.cursor_style(params, host),
            (b'q', b"\"") => self.character_protection(params),
            (b'w', b"$") => {
                if self.term_level.has_vt220() {
                    self.presentation_state_report(params, host);
                }
            }
            (b'u', b"$") => {
                if self.term_level.has_vt220() {
                    self.terminal_state_report(params, host);
                }
            }
            (b't', b"") => self.window_ops(params, host),
            _ => debug!("unknown csi: '{}' {:?}", ch as char, intermediates),
        }
        self.last_valid = false;
    }

    /// CHT: forward to the next tab stop, n times.
    fn cursor_tab_forward(&mut self, params: &Params, screen: &mut dyn ScreenWrite) {
        let mut cx = screen.cursor_x();
        if cx >= screen.size_x() - 1 || cx == screen.margin_right() {
            return;
        }
        let bx = if cx > screen.margin_right() {
            screen.size_x() - 1
        } else {
            screen.margin_right()
        };
        let mut n = params.get(0, 1, 1);
        if n == -1 {
            return;
        }
        while cx < bx && n > 0 {
            loop {
                cx += 1;
                if cx >= bx || screen.is_tab(cx) {
                    break;
                }
            }
            n -= 1;
        }
        screen.cursor_move(Some(cx), None, false);
    }

    /// CBT: back to the previous tab stop, n times.
    fn cursor_tab_back(&mut self, params: &Params, screen: &mut dyn ScreenWrite) {
        let mut cx = screen.cursor_x().min(screen.size_x() - 1);
        let bx = if cx < screen.margin_left() {
            0
        } else {
            screen.margin_left()
        };
        let mut n = params.get(0, 1, 1);
        if n == -1 {
            return;
        }
        while cx > bx && n > 0 {
            loop {
                cx -= 1;
                if cx <= bx || screen.is_tab(cx) {
                    break;
                }
            }
            n -= 1;
        }
        screen.cursor_move(Some(cx), None, false);
    }

    fn erase_display(&mut self, params: &Params, selective: bool, host: &mut Host<'_>) {
        if selective && !self.term_level.has_vt220() {
            return;
        }
        let bg = self.cell.cell.bg;
        match params.get(0, 0, 0) {
            -1 => {}
            0 => host.screen.clear_end_of_screen(bg, selective),
            1 => host.screen.clear_start_of_screen(bg, selective),
            2 => host.screen.clear_screen(bg, selective),
            3 => {
                // Console extension to clear history, for example before
                // locking the screen.
                if params.get(1, 0, 0) == 0 {
                    host.screen.clear_history();
                }
            }
            n => debug!("unknown erase display {}", n),
        }
    }

    fn erase_line(&mut self, params: &Params, selective: bool, host: &mut Host<'_>) {
        if selective && !self.term_level.has_vt220() {
            return;
        }
        let bg = self.cell.cell.bg;
        match params.get(0, 0, 0) {
            -1 => {}
            0 => host.screen.clear_end_of_line(bg, selective),
            1 => host.screen.clear_start_of_line(bg, selective),
            2 => host.screen.clear_line(bg, selective),
            n => debug!("unknown erase line {}", n),
        }
    }

    /// REP: repeat the last printed grapheme, capped to the line.
    fn repeat(&mut self, params: &Params, host: &mut Host<'_>) {
        let n = params.get(0, 1, 1);
        if n == -1 {
            return;
        }
        let room = host.screen.size_x().saturating_sub(host.screen.cursor_x());
        let n = (n as usize).min(room);
        if !self.last_valid {
            return;
        }

        let acs = if self.cell.set == 0 {
            self.cell.g0_acs
        } else {
            self.cell.g1_acs
        };
        self.cell.cell.flags.set(CellFlags::CHARSET, acs);
        self.cell.cell.c = self.last.clone();
        for _ in 0..n {
            host.screen.collect_add(&self.cell.cell);
        }
        self.cell.cell.flags.remove(CellFlags::CHARSET);
    }

    fn tab_clear(&mut self, params: &Params, screen: &mut dyn ScreenWrite) {
        match params.get(0, 0, 0) {
            -1 => {}
            0 => {
                let cx = screen.cursor_x();
                if cx < screen.size_x() {
                    screen.clear_tab(cx);
                }
            }
            3 => screen.clear_all_tabs(),
            n => debug!("unknown tab clear {}", n),
        }
    }

    /// `CSI > 4 ; m m`: extended key reporting on, honouring the
    /// `extended-keys` option.
    fn modset(&mut self, params: &Params, host: &mut Host<'_>) {
        if params.get(0, 0, 0) != 4 {
            return;
        }
        let m = params.get(1, 0, 0);
        let ek = host.options.extended_keys;
        if ek == ExtendedKeys::Off {
            return;
        }
        host.screen.mode_clear(ScreenMode::EXTENDED_KEY_MODES);
        if m == 2 {
            host.screen.mode_set(ScreenMode::KEYS_EXTENDED_2);
        } else if m == 1 || ek == ExtendedKeys::Always {
            host.screen.mode_set(ScreenMode::KEYS_EXTENDED);
        }
    }

    /// `CSI > 4 n`: extended key reporting off, unless forced always-on.
    fn modoff(&mut self, params: &Params, host: &mut Host<'_>) {
        if params.get(0, 0, 0) != 4 {
            return;
        }
        host.screen.mode_clear(ScreenMode::EXTENDED_KEY_MODES);
        if host.options.extended_keys == ExtendedKeys::Always {
            host.screen.mode_set(ScreenMode::KEYS_EXTENDED);
        }
    }

    // ── SM/RM ──────────────────────────────────────────────────────

    fn csi_sm(&mut self, params: &Params, host: &mut Host<'_>, set: bool) {
        for i in 0..params.len() {
            match params.get(i, 0, -1) {
                -1 => {}
                4 => {
                    // IRM
                    if set {
                        host.screen.mode_set(ScreenMode::INSERT);
                    } else {
                        host.screen.mode_clear(ScreenMode::INSERT);
                    }
                }
                20 => {
                    // LNM
                    if set {
                        host.screen.mode_set(ScreenMode::CRLF);
                    } else {
                        host.screen.mode_clear(ScreenMode::CRLF);
                    }
                }
                34 => {
                    // SCSTCURM: set means normal cursor, reset very visible.
                    if set {
                        host.screen.mode_clear(ScreenMode::CURSOR_VERY_VISIBLE);
                    } else {
                        host.screen.mode_set(ScreenMode::CURSOR_VERY_VISIBLE);
                    }
                }
                n => debug!("unknown ansi mode {}", n),
            }
        }
    }

    fn csi_sm_private(&mut self, params: &Params, host: &mut Host<'_>, set: bool) {
        let screen = &mut *host.screen;
        let cell = self.cell.cell.clone();
        for i in 0..params.len() {
            let n = params.get(i, 0, -1);
            match n {
                -1 => {}
                1 => {
                    // DECCKM
                    if set {
                        screen.mode_set(ScreenMode::KCURSOR);
                    } else {
                        screen.mode_clear(ScreenMode::KCURSOR);
                    }
                }
                3 => {
                    // DECCOLM: no column switching, just home and clear.
                    screen.cursor_move(Some(0), Some(0), true);
                    screen.clear_screen(cell.bg, false);
                }
                6 => {
                    // DECOM
                    if set {
                        screen.mode_set(ScreenMode::ORIGIN);
                    } else {
                        screen.mode_clear(ScreenMode::ORIGIN);
                    }
                    screen.cursor_move(Some(0), Some(0), true);
                }
                7 => {
                    // DECAWM
                    if set {
                        screen.mode_set(ScreenMode::WRAP);
                    } else {
                        screen.mode_clear(ScreenMode::WRAP);
                    }
                }
                12 => {
                    // ATTCUBL
                    if set {
                        screen.mode_set(ScreenMode::CURSOR_BLINKING);
                    } else {
                        screen.mode_clear(ScreenMode::CURSOR_BLINKING);
                    }
                    screen.mode_set(ScreenMode::CURSOR_BLINKING_SET);
                }
                25 => {
                    // DECTCEM
                    if !self.term_level.has_vt220() {
                        debug!("DECTCEM ignored at level 1");
                        continue;
                    }
                    if set {
                        screen.mode_set(ScreenMode::CURSOR);
                    } else {
                        screen.mode_clear(ScreenMode::CURSOR);
                    }
                }
                66 => {
                    // DECNKM
                    if !self.term_level.has_vt220() {
                        debug!("DECNKM ignored at level 1");
                        continue;
                    }
                    if set {
                        screen.mode_set(ScreenMode::KKEYPAD);
                    } else {
                        screen.mode_clear(ScreenMode::KKEYPAD);
                    }
                }
                69 => {
                    // DECLRMM
                    if !self.term_level.has_vt220() {
                        debug!("DECLRMM ignored at level 1");
                        continue;
                    }
                    if set {
                        screen.mode_set(ScreenMode::LR_MARGINS);
                    } else {
                        screen.mode_clear(ScreenMode::LR_MARGINS);
                        let right = screen.size_x() - 1;
                        screen.scroll_margin(0, right);
                    }
                }
                1000 => {
                    screen.mode_clear(ScreenMode::ALL_MOUSE_MODES);
                    if set {
                        screen.mode_set(ScreenMode::MOUSE_STANDARD);
                    }
                }
                1002 => {
                    screen.mode_clear(ScreenMode::ALL_MOUSE_MODES);
                    if set {
                        screen.mode_set(ScreenMode::MOUSE_BUTTON);
                    }
                }
                1003 => {
                    screen.mode_clear(ScreenMode::ALL_MOUSE_MODES);
                    if set {
                        screen.mode_set(ScreenMode::MOUSE_ALL);
                    }
                }
                1001 if !set => {
                    // Highlight tracking is never set, clearing is a no-op
                    // beyond dropping the other modes.
                    screen.mode_clear(ScreenMode::ALL_MOUSE_MODES);
                }
                1004 => {
                    if set {
                        screen.mode_set(ScreenMode::FOCUS_ON);
                    } else {
                        screen.mode_clear(ScreenMode::FOCUS_ON);
                    }
                }
                1005 => {
                    if set {
                        screen.mode_set(ScreenMode::MOUSE_UTF8);
                    } else {
                        screen.mode_clear(ScreenMode::MOUSE_UTF8);
                    }
                }
                1006 => {
                    if set {
                        screen.mode_set(ScreenMode::MOUSE_SGR);
                    } else {
                        screen.mode_clear(ScreenMode::MOUSE_SGR);
                    }
                }
                47 | 1047 => {
                    if set {
                        screen.alternate_on(&cell, false);
                    } else {
                        screen.alternate_off(&cell, false);
                    }
                }
                1049 => {
                    if set {
                        screen.alternate_on(&cell, true);
                    } else {
                        screen.alternate_off(&cell, true);
                    }
                }
                2004 => {
                    if set {
                        screen.mode_set(ScreenMode::BRACKET_PASTE);
                    } else {
                        screen.mode_clear(ScreenMode::BRACKET_PASTE);
                    }
                }
                2031 => {
                    if set {
                        screen.mode_set(ScreenMode::THEME_UPDATES);
                    } else {
                        screen.mode_clear(ScreenMode::THEME_UPDATES);
                    }
                }
                n => debug!("unknown private mode {}", n),
            }
        }
    }

    /// `CSI ? Pm S`: sixel graphics attribute negotiation.
    fn csi_sm_graphics(&mut self, params: &Params, host: &mut Host<'_>) {
        if host.sixel.is_none() || !self.term_level.is_graphics() {
            return;
        }
        if params.len() > 3 {
            return;
        }
        let n = params.get(0, 0, 0);
        let m = params.get(1, 0, 0);
        let o = params.get(2, 0, 0);
        if n == 1 && (m == 1 || m == 2 || m == 4) {
            reply!(host, "\x1b[?{};0;{}S", n, SIXEL_COLOR_REGISTERS);
        } else {
            reply!(host, "\x1b[?{};3;{}S", n, o);
        }
    }

    // ── queries ────────────────────────────────────────────────────

    fn device_attributes(&mut self, params: &Params, host: &mut Host<'_>) {
        let graphics = host.sixel.is_some();
        match params.get(0, 0, 0) {
            -1 => {}
            0 => match self.max_level {
                TermLevel::Vt125 if graphics => reply!(host, "\x1b[?12;7;0;1c"),
                TermLevel::Vt100 | TermLevel::Vt125 => reply!(host, "\x1b[?1;2c"),
                TermLevel::Vt101 => reply!(host, "\x1b[?1;0c"),
                TermLevel::Vt102 => reply!(host, "\x1b[?6c"),
                TermLevel::Vt241 if graphics => {
                    reply!(host, "\x1b[?62;1;2;4;6;16;17;21;22c")
                }
                TermLevel::Vt220 | TermLevel::Vt241 => {
                    reply!(host, "\x1b[?62;1;2;6;16;17;21;22c")
                }
            },
            n => debug!("unknown da {}", n),
        }
    }

    fn device_attributes_2(&mut self, params: &Params, host: &mut Host<'_>) {
        match params.get(0, 0, 0) {
            -1 => {}
            0 => reply!(host, "\x1b[>84;0;0c"),
            n => debug!("unknown da2 {}", n),
        }
    }

    fn extended_device_attributes(&mut self, params: &Params, host: &mut Host<'_>) {
        if params.get(0, 0, 0) == 0 {
            reply!(host, "\x1bP>|dango {}\x1b\\", env!("CARGO_PKG_VERSION"));
        }
    }

    fn device_status(&mut self, params: &Params, host: &mut Host<'_>) {
        let screen = &*host.screen;
        match params.get(0, 0, 0) {
            -1 => {}
            5 => reply!(host, "\x1b[0n"),
            6 => {
                let origin = screen.mode().contains(ScreenMode::ORIGIN);
                let cy = screen.cursor_y() + 1 - if origin { screen.region_upper() } else { 0 };
                let cx = screen.cursor_x() + 1 - if origin { screen.margin_left() } else { 0 };
                reply!(host, "\x1b[{};{}R", cy, cx);
            }
            n => debug!("unknown dsr {}", n),
        }
    }

    fn device_status_private(&mut self, params: &Params, host: &mut Host<'_>) {
        if params.get(0, 0, 0) == 996 {
            match host.events.theme() {
                Theme::Dark => reply!(host, "\x1b[?997;1n"),
                Theme::Light => reply!(host, "\x1b[?997;2n"),
                Theme::Unknown => {}
            }
        }
    }

    /// DECRQM for ANSI modes.
    fn mode_report(&mut self, params: &Params, host: &mut Host<'_>) {
        let m = params.get(0, 0, -1);
        let mode = host.screen.mode();
        let v = match m {
            -1 => return,
            // Permanently reset: the presentation modes nobody implements.
            1 | 5 | 6 | 7 | 8 | 9 | 10 | 11 | 13 | 14 | 15 | 16 | 17 | 18 | 19 | 21 | 22 | 2
            | 3 | 12 => 4,
            4 => {
                if mode.contains(ScreenMode::INSERT) {
                    1
                } else {
                    2
                }
            }
            20 => {
                if mode.contains(ScreenMode::CRLF) {
                    1
                } else {
                    2
                }
            }
            34 => {
                if mode.contains(ScreenMode::CURSOR_VERY_VISIBLE) {
                    2
                } else {
                    1
                }
            }
            n => {
                debug!("unknown ansi mode report {}", n);
                0
            }
        };
        reply!(host, "\x1b[{};{}$y", m, v);
    }

    /// DECRQM for DEC private modes.
    fn mode_report_private(&mut self, params: &Params, host: &mut Host<'_>) {
        let m = params.get(0, 0, -1);
        if m == -1 {
            return;
        }
        let screen = &*host.screen;
        let mode = screen.mode();
        let on = |flag: u32| if mode.contains(flag) { 1 } else { 2 };
        let v = match m {
            1 => on(ScreenMode::KCURSOR),
            2 => 3,      // DECANM: no VT52 here
            3 | 4 | 5 => 4,
            6 => on(ScreenMode::ORIGIN),
            7 => on(ScreenMode::WRAP),
            8 => 3,      // DECARM: depends on the client
            12 | 13 => {
                // Cursor blink: 1 = blink, 2 = steady.
                if screen.cursor_style() != CursorStyle::Default
                    || mode.contains(ScreenMode::CURSOR_BLINKING_SET)
                {
                    on(ScreenMode::CURSOR_BLINKING)
                } else {
                    // Nothing explicit: blend in the configured style,
                    // which blinks for 1, 3 and 5.
                    let p = host.options.cursor_style;
                    if p % 2 == 1 {
                        1
                    } else {
                        2
                    }
                }
            }
            14 | 18 | 19 => 4,
            25 => on(ScreenMode::CURSOR),
            66 => on(ScreenMode::KKEYPAD),
            69 => on(ScreenMode::LR_MARGINS),
            1000 => on(ScreenMode::MOUSE_STANDARD),
            1001 => 4,
            1002 => on(ScreenMode::MOUSE_BUTTON),
            1003 => on(ScreenMode::MOUSE_ALL),
            1004 => on(ScreenMode::FOCUS_ON),
            1005 => on(ScreenMode::MOUSE_UTF8),
            1006 => on(ScreenMode::MOUSE_SGR),
            47 | 1047 | 1049 => {
                if screen.alternate_active() {
                    1
                } else {
                    2
                }
            }
            2004 => on(ScreenMode::BRACKET_PASTE),
            2031 => on(ScreenMode::THEME_UPDATES),
            n => {
                debug!("unknown private mode report {}", n);
                0
            }
        };
        reply!(host, "\x1b[?{};{}$y", m, v);
    }

    /// DECSCL: switch conformance level.
    fn conformance_level(&mut self, params: &Params, host: &mut Host<'_>) {
        if !self.max_level.has_vt220() {
            return;
        }
        let graphics = host.sixel.is_some();
        let m = params.get(1, 0, 0);
        match params.get(0, 61, 0) {
            -1 => {}
            61 => {
                self.term_level = if graphics && self.max_level.is_graphics() {
                    TermLevel::Vt125
                } else {
                    TermLevel::Vt100
                };
                debug!("switching to level 1 ({})", self.term_level);
                self.soft_reset(host.screen);
            }
            62 => {
                if m != 1 {
                    debug!("8-bit mode is not supported");
                    return;
                }
                self.term_level = if graphics && self.max_level.is_graphics() {
                    TermLevel::Vt241
                } else {
                    TermLevel::Vt220
                };
                debug!("switching to level 2 ({})", self.term_level);
                self.soft_reset(host.screen);
            }
            n => debug!("unhandled conformance level {}", n),
        }
    }

    /// DECSCUSR.
    fn cursor_style(&mut self, params: &Params, host: &mut Host<'_>) {
        let n = params.get(0, 0, 0);
        let screen = &mut *host.screen;
        match n {
            -1 => {}
            0 => {
                screen.set_cursor_style(CursorStyle::Default);
                // Back to the default blinking state.
                screen.mode_clear(ScreenMode::CURSOR_BLINKING_SET);
            }
            1..=6 => {
                let style = match n {
                    1 | 2 => CursorStyle::Block,
                    3 | 4 => CursorStyle::Underline,
                    _ => CursorStyle::Bar,
                };
                screen.set_cursor_style(style);
                if n % 2 == 1 {
                    screen.mode_set(ScreenMode::CURSOR_BLINKING);
                } else {
                    screen.mode_clear(ScreenMode::CURSOR_BLINKING);
                }
                screen.mode_set(ScreenMode::CURSOR_BLINKING_SET);
            }
            n => debug!("unknown cursor style {}", n),
        }
    }

    /// DECSCA.
    fn character_protection(&mut self, params: &Params) {
        if !self.term_level.has_vt220() {
            return;
        }
        match params.get(0, 0, 0) {
            -1 => {}
            0 | 2 => self.cell.cell.flags.remove(CellFlags::PROTECTED),
            1 => self.cell.cell.flags.insert(CellFlags::PROTECTED),
            n => debug!("unknown protection {}", n),
        }
    }

    /// DECRQPSR.
    fn presentation_state_report(&mut self, params: &Params, host: &mut Host<'_>) {
        match params.get(0, 0, 0) {
            -1 => {}
            1 => self.reply_cursor_information(host),
            2 => self.reply_tab_stops(host),
            n => debug!("unknown presentation state report {}", n),
        }
    }

    /// DECRQTSR.
    fn terminal_state_report(&mut self, params: &Params, host: &mut Host<'_>) {
        match params.get(0, 0, 0) {
            -1 => {}
            1 => reply!(host, "\x1bP1$s\x1b\\"),
            2 => self.reply_color_table(params, host),
            n => debug!("unknown terminal state report {}", n),
        }
    }

    /// Window operations: a parameter-variable sub-language.
    fn window_ops(&mut self, params: &Params, host: &mut Host<'_>) {
        let x = host.screen.size_x();
        let y = host.screen.size_y();
        let mut m = 0;
        loop {
            let n = params.get(m, 0, -1);
            if n == -1 {
                break;
            }
            match n {
                1 | 2 | 5 | 6 | 7 | 11 | 13 | 20 | 21 | 24 => {}
                3 | 4 | 8 => {
                    // Two extra arguments.
                    m += 1;
                    if params.get(m, 0, -1) == -1 {
                        return;
                    }
                    m += 1;
                    if params.get(m, 0, -1) == -1 {
                        return;
                    }
                }
                9 | 10 => {
                    // One extra argument.
                    m += 1;
                    if params.get(m, 0, -1) == -1 {
                        return;
                    }
                }
                14 => {
                    if let Some((xp, yp)) = host.events.pixel_cell() {
                        reply!(host, "\x1b[4;{};{}t", y * yp, x * xp);
                    }
                }
                15 => {
                    if let Some((xp, yp)) = host.events.pixel_cell() {
                        reply!(host, "\x1b[5;{};{}t", y * yp, x * xp);
                    }
                }
                16 => {
                    if let Some((xp, yp)) = host.events.pixel_cell() {
                        reply!(host, "\x1b[6;{};{}t", yp, xp);
                    }
                }
                18 => reply!(host, "\x1b[8;{};{}t", y, x),
                19 => reply!(host, "\x1b[9;{};{}t", y, x),
                22 => {
                    m += 1;
                    match params.get(m, 0, -1) {
                        -1 => return,
                        0 | 2 => host.screen.push_title(),
                        _ => {}
                    }
                }
                23 => {
                    m += 1;
                    match params.get(m, 0, -1) {
                        -1 => return,
                        0 | 2 => {
                            host.screen.pop_title();
                            host.events.title_changed();
                        }
                        _ => {}
                    }
                }
                n => debug!("unknown window op {}", n),
            }
            m += 1;
        }
    }
}
