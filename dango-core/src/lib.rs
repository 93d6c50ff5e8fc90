//! Dango Terminal Core
//!
//! Shared model types for the control-sequence parser and dispatcher:
//! - Cell representation with character, colours and attributes
//! - Colour handling (named, indexed, RGB, X11 parsing, HLS)
//! - Conformance levels (VT100 .. VT241)
//! - Screen mode flags and the screen-writer interface
//! - Colour palette, hyperlink store, options, host hooks
//!
//! This crate has NO GUI dependencies and can be used headlessly for
//! testing. The grid itself is not here: the dispatcher drives it through
//! the [`ScreenWrite`] trait and the owner of the pane implements it.

pub mod cell;
pub mod color;
pub mod host;
pub mod hyperlinks;
pub mod level;
pub mod options;
pub mod palette;
pub mod screen;

pub use cell::{Cell, CellFlags};
pub use color::{Color, NamedColor, Rgb};
pub use host::{
    HostEvents, MemoryPasteStore, NullHostEvents, PasteStore, ReplySink, SixelDecoder, SixelImage,
    Theme,
};
pub use hyperlinks::Hyperlinks;
pub use level::TermLevel;
pub use options::{AllowPassthrough, ExtendedKeys, Options, OptionsError, SetClipboard};
pub use palette::ColorPalette;
pub use screen::{CursorStyle, LineMark, ScreenMode, ScreenWrite};
