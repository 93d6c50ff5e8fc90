//! VT control-sequence state machine.
//!
//! One instance of [`Parser`] belongs to one terminal attachment and is
//! driven byte-by-byte on its owning event loop. No input is ever rejected:
//! unknown sequences complete their state-machine path and are dropped by
//! the dispatcher.
//!
//! Differences from the stock DEC ANSI parser, deliberately:
//! - 7-bit only; 0x80..=0xFF feed the UTF-8 decoder in ground state and are
//!   ignored while a sequence is collecting
//! - OSC strings may end with BEL as well as ST
//! - APC and `ESC k` rename strings are collected like OSC
//! - In the DCS payload, ESC escapes the following byte (so `ESC ESC`
//!   embeds a literal ESC and only `ESC \` terminates)

use std::time::{Duration, Instant};

use crate::action::{c0, Action};
use crate::params::Params;

/// Initial capacity of the string collector; also what it shrinks back to
/// when the parser returns to ground.
pub const STRING_BUF_START: usize = 32;

/// Default hard cap on the string collector. Beyond this the sequence is
/// consumed but discarded.
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// How long a string state may sit without a terminator before the
/// watchdog abandons it.
pub const STRING_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_INTERMEDIATES: usize = 3;
const MAX_PARAM_BYTES: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Ground,
    EscEnter,
    EscIntermediate,
    CsiEnter,
    CsiParameter,
    CsiIntermediate,
    CsiIgnore,
    DcsEnter,
    DcsParameter,
    DcsIntermediate,
    DcsHandler,
    DcsEscape,
    DcsIgnore,
    OscString,
    ApcString,
    RenameString,
    ConsumeSt,
}

impl State {
    pub fn name(self) -> &'static str {
        match self {
            State::Ground => "ground",
            State::EscEnter => "esc_enter",
            State::EscIntermediate => "esc_intermediate",
            State::CsiEnter => "csi_enter",
            State::CsiParameter => "csi_parameter",
            State::CsiIntermediate => "csi_intermediate",
            State::CsiIgnore => "csi_ignore",
            State::DcsEnter => "dcs_enter",
            State::DcsParameter => "dcs_parameter",
            State::DcsIntermediate => "dcs_intermediate",
            State::DcsHandler => "dcs_handler",
            State::DcsEscape => "dcs_escape",
            State::DcsIgnore => "dcs_ignore",
            State::OscString => "osc_string",
            State::ApcString => "apc_string",
            State::RenameString => "rename_string",
            State::ConsumeSt => "consume_st",
        }
    }

}

pub struct Parser {
    state: State,

    intermediates: Vec<u8>,
    param_buf: Vec<u8>,
    string_buf: Vec<u8>,
    buffer_size: usize,
    bel_terminated: bool,
    discard: bool,

    utf8_buf: [u8; 4],
    utf8_len: usize,
    utf8_need: usize,
    utf8_started: bool,

    since_ground: Vec<u8>,
    deadline: Option<Instant>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            state: State::Ground,
            intermediates: Vec::with_capacity(MAX_INTERMEDIATES),
            param_buf: Vec::with_capacity(MAX_PARAM_BYTES),
            string_buf: Vec::with_capacity(STRING_BUF_START),
            buffer_size: DEFAULT_BUFFER_SIZE,
            bel_terminated: false,
            discard: false,
            utf8_buf: [0; 4],
            utf8_len: 0,
            utf8_need: 0,
            utf8_started: false,
            since_ground: Vec::new(),
            deadline: None,
        }
    }

    /// Change the hard cap on collected string payloads.
    pub fn set_buffer_size(&mut self, size: usize) {
        self.buffer_size = size.max(STRING_BUF_START);
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// All bytes consumed since the parser last left ground state. Control
    /// clients that attach mid-sequence are replayed this buffer.
    pub fn pending(&self) -> &[u8] {
        &self.since_ground
    }

    /// Abort a string state whose terminator has not arrived in time.
    ///
    /// Returns true when the in-flight sequence was discarded. The pending
    /// payload is dropped without dispatching.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Reset to ground state, dropping any in-flight sequence.
    pub fn reset(&mut self) {
        self.clear();
        self.state = State::Ground;
        self.utf8_started = false;
        self.utf8_len = 0;
        self.utf8_need = 0;
        self.since_ground.clear();
        self.shrink_string_buf();
    }

    /// Feed a chunk of bytes, invoking `callback` for every completed
    /// action. Never fails; unknown input is consumed and dropped.
    pub fn parse<F>(&mut self, input: &[u8], mut callback: F)
    where
        F: FnMut(Action),
    {
        for &byte in input {
            self.advance(byte, &mut callback);
            if self.state != State::Ground {
                self.since_ground.push(byte);
            }
        }
    }

    fn advance<F>(&mut self, ch: u8, callback: &mut F)
    where
        F: FnMut(Action),
    {
        // Transitions shared by every state except the DCS payload pair,
        // where ESC is part of the payload framing.
        if !matches!(self.state, State::DcsHandler | State::DcsEscape) {
            match ch {
                c0::CAN | c0::SUB => {
                    self.execute(ch, callback);
                    self.set_state(State::Ground, callback);
                    return;
                }
                c0::ESC => {
                    self.stop_utf8(callback);
                    self.set_state(State::EscEnter, callback);
                    return;
                }
                _ => {}
            }
        }

        match self.state {
            State::Ground => self.ground(ch, callback),
            State::EscEnter => self.esc_enter(ch, callback),
            State::EscIntermediate => self.esc_intermediate(ch, callback),
            State::CsiEnter => self.csi_enter(ch, callback),
            State::CsiParameter => self.csi_parameter(ch, callback),
            State::CsiIntermediate => self.csi_intermediate(ch, callback),
            State::CsiIgnore => self.csi_ignore(ch, callback),
            State::DcsEnter => self.dcs_enter(ch, callback),
            State::DcsParameter => self.dcs_parameter(ch, callback),
            State::DcsIntermediate => self.dcs_intermediate(ch, callback),
            State::DcsHandler => self.dcs_handler(ch, callback),
            State::DcsEscape => self.dcs_escape(ch, callback),
            State::DcsIgnore => self.dcs_ignore(ch),
            State::OscString => self.osc_string(ch, callback),
            State::ApcString => self.apc_string(ch),
            State::RenameString => self.rename_string(ch),
            State::ConsumeSt => self.consume_st(ch),
        }
    }

    // ── state handlers ─────────────────────────────────────────────

    fn ground<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => self.execute(ch, callback),
            0x20..=0x7E => {
                self.stop_utf8(callback);
                callback(Action::Print(ch as char));
            }
            c0::DEL => {}
            0x80..=0xFF => self.top_bit_set(ch, callback),
            _ => unreachable!("anywhere transitions consumed 0x18/0x1a/0x1b"),
        }
    }

    fn esc_enter<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => self.execute(ch, callback),
            0x20..=0x2F => {
                self.collect_intermediate(ch);
                self.set_state(State::EscIntermediate, callback);
            }
            b'P' => self.set_state(State::DcsEnter, callback),
            b'X' | b'^' => self.set_state(State::ConsumeSt, callback),
            b'[' => self.set_state(State::CsiEnter, callback),
            b']' => self.set_state(State::OscString, callback),
            b'_' => self.set_state(State::ApcString, callback),
            b'k' => self.set_state(State::RenameString, callback),
            0x30..=0x7E => {
                self.esc_dispatch(ch, callback);
                self.set_state(State::Ground, callback);
            }
            _ => {}
        }
    }

    fn esc_intermediate<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => self.execute(ch, callback),
            0x20..=0x2F => self.collect_intermediate(ch),
            0x30..=0x7E => {
                self.esc_dispatch(ch, callback);
                self.set_state(State::Ground, callback);
            }
            _ => {}
        }
    }

    fn csi_enter<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => self.execute(ch, callback),
            0x20..=0x2F => {
                self.collect_intermediate(ch);
                self.set_state(State::CsiIntermediate, callback);
            }
            0x30..=0x3B => {
                self.collect_parameter(ch);
                self.set_state(State::CsiParameter, callback);
            }
            0x3C..=0x3F => {
                self.collect_intermediate(ch);
                self.set_state(State::CsiParameter, callback);
            }
            0x40..=0x7E => {
                self.csi_dispatch(ch, callback);
                self.set_state(State::Ground, callback);
            }
            _ => {}
        }
    }

    fn csi_parameter<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => self.execute(ch, callback),
            0x20..=0x2F => {
                self.collect_intermediate(ch);
                self.set_state(State::CsiIntermediate, callback);
            }
            0x30..=0x3B => self.collect_parameter(ch),
            0x3C..=0x3F => self.set_state(State::CsiIgnore, callback),
            0x40..=0x7E => {
                self.csi_dispatch(ch, callback);
                self.set_state(State::Ground, callback);
            }
            _ => {}
        }
    }

    fn csi_intermediate<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => self.execute(ch, callback),
            0x20..=0x2F => self.collect_intermediate(ch),
            0x30..=0x3F => self.set_state(State::CsiIgnore, callback),
            0x40..=0x7E => {
                self.csi_dispatch(ch, callback);
                self.set_state(State::Ground, callback);
            }
            _ => {}
        }
    }

    fn csi_ignore<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x00..=0x17 | 0x19 | 0x1C..=0x1F => self.execute(ch, callback),
            0x40..=0x7E => self.set_state(State::Ground, callback),
            _ => {}
        }
    }

    fn dcs_enter<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x20..=0x2F => {
                self.collect_intermediate(ch);
                self.set_state(State::DcsIntermediate, callback);
            }
            0x30..=0x39 | 0x3B => {
                self.collect_parameter(ch);
                self.set_state(State::DcsParameter, callback);
            }
            0x3A => self.set_state(State::DcsIgnore, callback),
            0x3C..=0x3F => {
                self.collect_intermediate(ch);
                self.set_state(State::DcsParameter, callback);
            }
            0x40..=0x7E => {
                // The DCS command byte leads the payload.
                self.collect_string(ch);
                self.set_state(State::DcsHandler, callback);
            }
            _ => {}
        }
    }

    fn dcs_parameter<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x20..=0x2F => {
                self.collect_intermediate(ch);
                self.set_state(State::DcsIntermediate, callback);
            }
            0x30..=0x39 | 0x3B => self.collect_parameter(ch),
            0x3A | 0x3C..=0x3F => self.set_state(State::DcsIgnore, callback),
            0x40..=0x7E => {
                self.collect_string(ch);
                self.set_state(State::DcsHandler, callback);
            }
            _ => {}
        }
    }

    fn dcs_intermediate<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            0x20..=0x2F => self.collect_intermediate(ch),
            0x30..=0x3F => self.set_state(State::DcsIgnore, callback),
            0x40..=0x7E => {
                self.collect_string(ch);
                self.set_state(State::DcsHandler, callback);
            }
            _ => {}
        }
    }

    fn dcs_handler<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            c0::ESC => self.set_state(State::DcsEscape, callback),
            _ => self.collect_string(ch),
        }
    }

    fn dcs_escape<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            b'\\' => {
                self.dcs_dispatch(callback);
                self.set_state(State::Ground, callback);
            }
            _ => {
                // The byte after ESC is taken raw, so ESC ESC embeds a
                // literal ESC in the payload.
                self.collect_string(ch);
                self.set_state(State::DcsHandler, callback);
            }
        }
    }

    fn dcs_ignore(&mut self, _ch: u8) {}

    fn osc_string<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        match ch {
            c0::BEL => {
                self.bel_terminated = true;
                self.set_state(State::Ground, callback);
            }
            0x20..=0xFF => self.collect_string(ch),
            _ => {}
        }
    }

    fn apc_string(&mut self, ch: u8) {
        if (0x20..=0xFF).contains(&ch) {
            self.collect_string(ch);
        }
    }

    fn rename_string(&mut self, ch: u8) {
        if (0x20..=0xFF).contains(&ch) {
            self.collect_string(ch);
        }
    }

    fn consume_st(&mut self, _ch: u8) {}

    // ── transitions ────────────────────────────────────────────────

    fn set_state<F: FnMut(Action)>(&mut self, next: State, callback: &mut F) {
        // Exit actions: leaving a string state dispatches what was
        // collected, however the state is left (ST, BEL, or cancel).
        match self.state {
            State::OscString if next != State::OscString => self.osc_dispatch(callback),
            State::ApcString if next != State::ApcString => self.apc_dispatch(callback),
            State::RenameString if next != State::RenameString => self.rename_dispatch(callback),
            _ => {}
        }

        self.state = next;

        // Entry actions.
        match next {
            State::Ground => {
                self.deadline = None;
                self.since_ground.clear();
                self.shrink_string_buf();
            }
            State::EscEnter | State::CsiEnter => self.clear(),
            State::DcsEnter
            | State::OscString
            | State::ApcString
            | State::RenameString
            | State::ConsumeSt => {
                self.clear();
                self.deadline = Some(Instant::now() + STRING_TIMEOUT);
            }
            _ => {}
        }
    }

    /// Clear the collectors for a new sequence.
    fn clear(&mut self) {
        self.deadline = None;
        self.intermediates.clear();
        self.param_buf.clear();
        self.string_buf.clear();
        self.bel_terminated = false;
        self.discard = false;
    }

    fn shrink_string_buf(&mut self) {
        if self.string_buf.capacity() > STRING_BUF_START {
            self.string_buf = Vec::with_capacity(STRING_BUF_START);
        } else {
            self.string_buf.clear();
        }
    }

    // ── collectors ─────────────────────────────────────────────────

    fn collect_intermediate(&mut self, ch: u8) {
        if self.intermediates.len() == MAX_INTERMEDIATES {
            self.discard = true;
        } else {
            self.intermediates.push(ch);
        }
    }

    fn collect_parameter(&mut self, ch: u8) {
        if self.param_buf.len() == MAX_PARAM_BYTES {
            self.discard = true;
        } else {
            self.param_buf.push(ch);
        }
    }

    fn collect_string(&mut self, ch: u8) {
        if self.string_buf.len() >= self.buffer_size {
            self.discard = true;
        } else {
            self.string_buf.push(ch);
        }
    }

    // ── dispatch ───────────────────────────────────────────────────

    fn execute<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        self.stop_utf8(callback);
        callback(Action::Execute(ch));
    }

    fn esc_dispatch<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        if self.discard {
            return;
        }
        callback(Action::EscDispatch {
            intermediates: self.intermediates.clone(),
            ch,
        });
    }

    fn csi_dispatch<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        if self.discard {
            return;
        }
        let Some(params) = Params::split(&self.param_buf) else {
            return;
        };
        callback(Action::CsiDispatch {
            params,
            intermediates: self.intermediates.clone(),
            ch,
        });
    }

    fn dcs_dispatch<F: FnMut(Action)>(&mut self, callback: &mut F) {
        if self.discard || self.string_buf.is_empty() {
            return;
        }
        let Some(params) = Params::split(&self.param_buf) else {
            return;
        };
        callback(Action::DcsDispatch {
            params,
            intermediates: self.intermediates.clone(),
            data: self.string_buf.clone(),
        });
    }

    fn osc_dispatch<F: FnMut(Action)>(&mut self, callback: &mut F) {
        if self.discard {
            return;
        }
        callback(Action::OscDispatch {
            data: self.string_buf.clone(),
            bel_terminated: self.bel_terminated,
        });
    }

    fn apc_dispatch<F: FnMut(Action)>(&mut self, callback: &mut F) {
        if self.discard {
            return;
        }
        callback(Action::ApcDispatch {
            data: self.string_buf.clone(),
        });
    }

    fn rename_dispatch<F: FnMut(Action)>(&mut self, callback: &mut F) {
        if self.discard {
            return;
        }
        callback(Action::RenameDispatch {
            data: self.string_buf.clone(),
        });
    }

    // ── UTF-8 ──────────────────────────────────────────────────────

    /// End UTF-8 assembly; an incomplete character becomes U+FFFD.
    fn stop_utf8<F: FnMut(Action)>(&mut self, callback: &mut F) {
        if self.utf8_started {
            callback(Action::Print(char::REPLACEMENT_CHARACTER));
        }
        self.utf8_started = false;
        self.utf8_len = 0;
        self.utf8_need = 0;
    }

    fn top_bit_set<F: FnMut(Action)>(&mut self, ch: u8, callback: &mut F) {
        if !self.utf8_started {
            let need = match ch {
                0xC2..=0xDF => 1,
                0xE0..=0xEF => 2,
                0xF0..=0xF4 => 3,
                _ => {
                    // Stray continuation or invalid start byte.
                    callback(Action::Print(char::REPLACEMENT_CHARACTER));
                    return;
                }
            };
            self.utf8_started = true;
            self.utf8_buf[0] = ch;
            self.utf8_len = 1;
            self.utf8_need = need;
            return;
        }

        if ch & 0xC0 != 0x80 {
            self.stop_utf8(callback);
            return;
        }
        self.utf8_buf[self.utf8_len] = ch;
        self.utf8_len += 1;
        self.utf8_need -= 1;
        if self.utf8_need > 0 {
            return;
        }

        self.utf8_started = false;
        let decoded = std::str::from_utf8(&self.utf8_buf[..self.utf8_len])
            .ok()
            .and_then(|s| s.chars().next());
        self.utf8_len = 0;
        match decoded {
            // Overlong encodings and surrogates fail the decode above.
            Some(c) => callback(Action::Print(c)),
            None => callback(Action::Print(char::REPLACEMENT_CHARACTER)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &[u8]) -> Vec<Action> {
        let mut parser = Parser::new();
        let mut actions = Vec::new();
        parser.parse(input, |action| actions.push(action));
        actions
    }

    fn prints(actions: &[Action]) -> String {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Print(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_print_ascii() {
        let actions = parse_all(b"Hello");
        assert_eq!(actions.len(), 5);
        assert!(matches!(actions[0], Action::Print('H')));
        assert!(matches!(actions[4], Action::Print('o')));
    }

    #[test]
    fn test_control_characters() {
        let actions = parse_all(b"\x07\x08\x09\x0A\x0D");
        assert_eq!(actions.len(), 5);
        assert!(matches!(actions[0], Action::Execute(0x07)));
        assert!(matches!(actions[4], Action::Execute(0x0D)));
    }

    #[test]
    fn test_csi_basic() {
        let actions = parse_all(b"\x1b[5A");
        assert_eq!(actions.len(), 1);
        let Action::CsiDispatch { params, intermediates, ch } = &actions[0] else {
            panic!("expected CsiDispatch");
        };
        assert_eq!(*ch, b'A');
        assert!(intermediates.is_empty());
        assert_eq!(params.get(0, 1, 1), 5);
    }

    #[test]
    fn test_csi_private_prefix_is_intermediate() {
        let actions = parse_all(b"\x1b[?25h");
        assert_eq!(actions.len(), 1);
        let Action::CsiDispatch { params, intermediates, ch } = &actions[0] else {
            panic!("expected CsiDispatch");
        };
        assert_eq!(*ch, b'h');
        assert_eq!(intermediates, b"?");
        assert_eq!(params.get(0, 0, 0), 25);
    }

    #[test]
    fn test_csi_intermediate_after_params() {
        let actions = parse_all(b"\x1b[?1049$p");
        let Action::CsiDispatch { intermediates, ch, .. } = &actions[0] else {
            panic!("expected CsiDispatch");
        };
        assert_eq!(*ch, b'p');
        assert_eq!(intermediates, b"?$");
    }

    #[test]
    fn test_csi_colon_parameter() {
        let actions = parse_all(b"\x1b[4:3m");
        let Action::CsiDispatch { params, .. } = &actions[0] else {
            panic!("expected CsiDispatch");
        };
        assert_eq!(params.str_at(0), Some("4:3"));
    }

    #[test]
    fn test_esc_dispatch() {
        let actions = parse_all(b"\x1b7\x1b(0");
        assert_eq!(actions.len(), 2);
        assert!(matches!(
            &actions[0],
            Action::EscDispatch { ch: b'7', intermediates } if intermediates.is_empty()
        ));
        assert!(matches!(
            &actions[1],
            Action::EscDispatch { ch: b'0', intermediates } if intermediates == b"("
        ));
    }

    #[test]
    fn test_osc_bel_terminated() {
        let actions = parse_all(b"\x1b]0;My Title\x07");
        assert_eq!(actions.len(), 1);
        let Action::OscDispatch { data, bel_terminated } = &actions[0] else {
            panic!("expected OscDispatch");
        };
        assert_eq!(data, b"0;My Title");
        assert!(bel_terminated);
    }

    #[test]
    fn test_osc_st_terminated() {
        let actions = parse_all(b"\x1b]2;Window Title\x1b\\");
        // The ESC of the terminator dispatches the string; the trailing
        // ESC \ is a no-op escape dispatch.
        assert_eq!(actions.len(), 2);
        let Action::OscDispatch { data, bel_terminated } = &actions[0] else {
            panic!("expected OscDispatch");
        };
        assert_eq!(data, b"2;Window Title");
        assert!(!bel_terminated);
        assert!(matches!(&actions[1], Action::EscDispatch { ch: b'\\', .. }));
    }

    #[test]
    fn test_dcs_payload_keeps_command_byte() {
        let actions = parse_all(b"\x1bP1$tdata\x1b\\");
        assert_eq!(actions.len(), 1);
        let Action::DcsDispatch { params, intermediates, data } = &actions[0] else {
            panic!("expected DcsDispatch");
        };
        assert_eq!(params.get(0, 0, 0), 1);
        assert_eq!(intermediates, b"$");
        assert_eq!(data, b"tdata");
    }

    #[test]
    fn test_dcs_embedded_escape() {
        // ESC ESC embeds a literal ESC; ESC \ terminates.
        let actions = parse_all(b"\x1bPqAB\x1b\x1bCD\x1b\\");
        assert_eq!(actions.len(), 1);
        let Action::DcsDispatch { data, .. } = &actions[0] else {
            panic!("expected DcsDispatch");
        };
        assert_eq!(data, b"qAB\x1bCD");
    }

    #[test]
    fn test_apc_sets_title() {
        let actions = parse_all(b"\x1b_hello\x1b\\");
        assert_eq!(actions.len(), 2);
        assert!(matches!(
            &actions[0],
            Action::ApcDispatch { data } if data == b"hello"
        ));
    }

    #[test]
    fn test_rename_string() {
        let actions = parse_all(b"\x1bkwin\x1b\\");
        assert!(matches!(
            &actions[0],
            Action::RenameDispatch { data } if data == b"win"
        ));
    }

    #[test]
    fn test_consume_st_drops_payload() {
        // SOS (ESC X) content is consumed without any dispatch.
        let actions = parse_all(b"\x1bXjunk\x1b\\A");
        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], Action::EscDispatch { ch: b'\\', .. }));
        assert!(matches!(&actions[1], Action::Print('A')));
    }

    #[test]
    fn test_utf8_basic() {
        let actions = parse_all("中文".as_bytes());
        assert_eq!(prints(&actions), "中文");
    }

    #[test]
    fn test_utf8_interrupted_by_control() {
        // A CSI arriving mid-character forces U+FFFD out first.
        let actions = parse_all(b"\xE4\xB8\x1b[m");
        assert!(matches!(actions[0], Action::Print('\u{FFFD}')));
        assert!(matches!(actions[1], Action::CsiDispatch { ch: b'm', .. }));
    }

    #[test]
    fn test_utf8_invalid_bytes() {
        // Stray continuation, invalid start, and C0/C1 range starts.
        let actions = parse_all(b"\x80\xC0\xFF");
        assert_eq!(prints(&actions), "\u{FFFD}\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_chunk_boundaries() {
        let mut parser = Parser::new();
        let mut actions = Vec::new();
        parser.parse(b"\x1b[", |a| actions.push(a));
        parser.parse(b"5", |a| actions.push(a));
        assert!(actions.is_empty());
        parser.parse(b"A", |a| actions.push(a));
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_cancel_aborts_sequence() {
        let actions = parse_all(b"\x1b[12\x18Hi");
        // CAN executes as a control and drops the sequence.
        assert!(matches!(actions[0], Action::Execute(0x18)));
        assert_eq!(prints(&actions), "Hi");
    }

    #[test]
    fn test_since_ground_tracks_sequence_bytes() {
        let mut parser = Parser::new();
        parser.parse(b"\x1b]0;abc", |_| {});
        assert_eq!(parser.pending(), b"\x1b]0;abc");
        parser.parse(b"\x07", |_| {});
        assert!(parser.pending().is_empty());
    }

    #[test]
    fn test_since_ground_empty_iff_ground() {
        let mut parser = Parser::new();
        parser.parse(b"plain text", |_| {});
        assert_eq!(parser.state(), State::Ground);
        assert!(parser.pending().is_empty());
        parser.parse(b"\x1bP", |_| {});
        assert_ne!(parser.state(), State::Ground);
        assert!(!parser.pending().is_empty());
    }

    #[test]
    fn test_string_overflow_discards() {
        let mut parser = Parser::new();
        parser.set_buffer_size(64);
        let mut actions = Vec::new();
        let mut input = b"\x1b]0;".to_vec();
        input.extend(std::iter::repeat(b'x').take(100));
        input.push(0x07);
        parser.parse(&input, |a| actions.push(a));
        assert!(actions.is_empty());
        assert_eq!(parser.state(), State::Ground);
    }

    #[test]
    fn test_param_overflow_discards() {
        let mut input = b"\x1b[".to_vec();
        input.extend(std::iter::repeat(b'1').take(100));
        input.push(b'm');
        let actions = parse_all(&input);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_intermediate_overflow_discards() {
        let actions = parse_all(b"\x1b[!!!!p");
        assert!(actions.is_empty());
    }

    #[test]
    fn test_too_many_params_aborts_dispatch() {
        let mut input = b"\x1b[".to_vec();
        for _ in 0..30 {
            input.extend_from_slice(b"1;");
        }
        input.push(b'm');
        let actions = parse_all(&input);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_timeout_discards_string_state() {
        let mut parser = Parser::new();
        let mut actions = Vec::new();
        parser.parse(b"\x1b]0;stuck", |a| actions.push(a));
        assert_eq!(parser.state(), State::OscString);

        assert!(!parser.check_timeout(Instant::now()));
        assert!(parser.check_timeout(Instant::now() + Duration::from_secs(6)));
        assert_eq!(parser.state(), State::Ground);
        assert!(parser.pending().is_empty());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_every_state_covers_every_byte() {
        // Drive the parser into each state, then feed the full byte range;
        // the parser must stay well-formed and never panic.
        let prefixes: &[&[u8]] = &[
            b"",
            b"\x1b",
            b"\x1b ",
            b"\x1b[",
            b"\x1b[1",
            b"\x1b[ ",
            b"\x1b[1<",
            b"\x1bP",
            b"\x1bP1",
            b"\x1bP ",
            b"\x1bPq",
            b"\x1bPq\x1b",
            b"\x1bP:",
            b"\x1b]",
            b"\x1b_",
            b"\x1bk",
            b"\x1bX",
        ];
        for prefix in prefixes {
            for byte in 0..=255u8 {
                let mut parser = Parser::new();
                parser.parse(prefix, |_| {});
                parser.parse(&[byte], |_| {});
                assert_eq!(
                    parser.pending().is_empty(),
                    parser.state() == State::Ground,
                    "since-ground invariant broken for prefix {:?} byte {:#x}",
                    prefix,
                    byte
                );
            }
        }
    }
}
