//! Dango Terminal Parser
//!
//! This crate implements the byte-level control-sequence parser that sits
//! between a pseudoterminal and the virtual screen. It converts a stream of
//! bytes into semantic terminal actions.
//!
//! The parser is:
//! - Stateful: maintains parsing state across chunk boundaries
//! - Streaming: can accept arbitrary chunk sizes
//! - Deterministic: same input always produces same output
//! - 7-bit: no C1 controls; bytes above 0x7F are UTF-8 text in ground state
//!
//! It follows the DEC ANSI parser described by Paul Williams, with the
//! amendments a terminal multiplexer needs:
//! - UTF-8 decoding integrated with the ground state
//! - OSC may be terminated by BEL as well as ST
//! - An APC string state (some programs use APC to set the title)
//! - A string state for the `ESC k ... ESC \` window rename sequence
//! - ESC inside a DCS payload is passed through so raw byte sequences can
//!   reach an underlying terminal

pub mod action;
pub mod params;
pub mod parser;

pub use action::Action;
pub use params::{Param, Params};
pub use parser::{Parser, State};
