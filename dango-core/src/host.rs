//! Host-side collaborator interfaces.
//!
//! The dispatcher owns none of these: replies go to an outbound byte sink,
//! clipboard data to the paste store, notifications to the window/pane
//! bookkeeping, and sixel payloads to an optional decoder. Tests mock them.

use crate::color::Color;

/// Outbound byte sink for terminal replies (DA, DSR, DECRPSS, ...).
pub trait ReplySink {
    fn push(&mut self, bytes: &[u8]);
}

impl ReplySink for Vec<u8> {
    fn push(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// The paste/clipboard store shared with the rest of the program.
pub trait PasteStore {
    /// The most recent buffer, if any.
    fn top(&self) -> Option<&[u8]>;
    /// Store a new buffer.
    fn add(&mut self, data: &[u8]);
}

/// A trivial in-memory paste store, enough for tests and simple hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryPasteStore {
    buffers: Vec<Vec<u8>>,
}

impl PasteStore for MemoryPasteStore {
    fn top(&self) -> Option<&[u8]> {
        self.buffers.last().map(|b| b.as_slice())
    }

    fn add(&mut self, data: &[u8]) {
        self.buffers.push(data.to_vec());
    }
}

/// Light or dark, for theme reports (DSR ? 996).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Unknown,
    Light,
    Dark,
}

/// Window/pane bookkeeping the dispatcher pokes. Every method has a
/// default no-op so hosts only implement what they surface.
pub trait HostEvents {
    /// BEL was received.
    fn bell(&mut self) {}

    /// The pane title changed (OSC 0/2, APC, title stack pop).
    fn title_changed(&mut self) {}

    /// `ESC k ... ST`: rename the window, or `None` to drop the override
    /// and return to automatic naming.
    fn rename_window(&mut self, name: Option<&str>) {
        let _ = name;
    }

    /// The clipboard was set from OSC 52.
    fn clipboard_updated(&mut self) {}

    /// Current theme for DSR ? 996 reports.
    fn theme(&self) -> Theme {
        Theme::Unknown
    }

    /// Size of one cell in pixels, when the window knows it.
    fn pixel_cell(&self) -> Option<(usize, usize)> {
        None
    }

    /// Effective default foreground for OSC 10 queries.
    fn foreground(&self) -> Color {
        Color::Default
    }

    /// Effective default background for OSC 11 queries.
    fn background(&self) -> Color {
        Color::Default
    }
}

/// A host with nothing to report; useful in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHostEvents;

impl HostEvents for NullHostEvents {}

/// A decoded sixel image ready for the screen writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SixelImage {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// RGBA pixels, row-major.
    pub pixels: Vec<u32>,
}

/// An out-of-core sixel decoder. The dispatcher frames the DCS payload and
/// hands it over together with the P2 (background handling) parameter.
pub trait SixelDecoder {
    fn decode(
        &mut self,
        data: &[u8],
        p2: u32,
        xpixel: usize,
        ypixel: usize,
    ) -> Option<SixelImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_reply_sink() {
        let mut sink: Vec<u8> = Vec::new();
        sink.extend_from_slice(b"\x1b[0n");
        sink.extend_from_slice(b"!");
        assert_eq!(sink, b"\x1b[0n!");
    }

    #[test]
    fn test_memory_paste_store() {
        let mut store = MemoryPasteStore::default();
        assert!(store.top().is_none());
        store.add(b"one");
        store.add(b"two");
        assert_eq!(store.top(), Some(&b"two"[..]));
    }
}
