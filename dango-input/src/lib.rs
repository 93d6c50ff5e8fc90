//! Dango Terminal Input Dispatcher
//!
//! This crate turns the parser's actions into screen writes and replies.
//! It owns the working cell (the attributes applied to printed text), the
//! negotiated conformance level, and the DECSC/DECRC saved state; the grid,
//! palette, hyperlink table, paste store, options and notification targets
//! all belong to the host and are borrowed per batch through [`Host`].
//!
//! Layering:
//! - `dango-parser` recognises sequences and produces [`dango_parser::Action`]s
//! - this crate executes them: C0/ESC/CSI/SGR dispatch, DCS payloads
//!   (DECRQSS and friends), OSC/APC/rename strings, and reply generation

mod dcs;
mod input;
mod osc;
mod reply;
mod sgr;

pub use input::{Host, InputContext};
