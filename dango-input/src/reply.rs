//! Reply encoding.
//!
//! Everything the terminal sends back travels through the host's reply
//! sink, in dispatch order. The formats here are wire-exact: DCS envelopes
//! are `ESC P ... ESC \`, OSC colour replies use `rgb:RRRR/GGGG/BBBB` with
//! doubled components, and OSC replies reuse the requester's terminator.

use log::debug;

use dango_core::{CellFlags, Color, ReplySink, ScreenMode};
use dango_parser::Params;

use crate::input::{Host, InputContext};

/// Format a reply and push it onto the host's sink.
macro_rules! reply {
    ($host:expr, $($arg:tt)*) => {{
        let s = format!($($arg)*);
        log::debug!("reply: {:?}", s);
        $host.replies.push(s.as_bytes());
    }};
}
pub(crate) use reply;

/// The OSC terminator matching how the request ended.
pub(crate) fn osc_end(bel_terminated: bool) -> &'static str {
    if bel_terminated {
        "\x07"
    } else {
        "\x1b\\"
    }
}

/// Reply to an OSC colour query (`OSC 4/10/11/12 ... ?`).
pub(crate) fn color_reply(
    host: &mut Host<'_>,
    option: u32,
    index: Option<u8>,
    color: Color,
    bel_terminated: bool,
) {
    let Some(rgb) = color.to_rgb() else {
        return;
    };
    let end = osc_end(bel_terminated);
    match index {
        Some(i) => reply!(
            host,
            "\x1b]{};{};rgb:{:02x}{:02x}/{:02x}{:02x}/{:02x}{:02x}{}",
            option, i, rgb.r, rgb.r, rgb.g, rgb.g, rgb.b, rgb.b, end
        ),
        None => reply!(
            host,
            "\x1b]{};rgb:{:02x}{:02x}/{:02x}{:02x}/{:02x}{:02x}{}",
            option, rgb.r, rgb.r, rgb.g, rgb.g, rgb.b, rgb.b, end
        ),
    }
}

/// Reply to an OSC 52 clipboard query with the base64 of `data`.
pub(crate) fn clipboard_reply(
    replies: &mut dyn ReplySink,
    data: Option<&[u8]>,
    bel_terminated: bool,
) {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    let mut out = String::from("\x1b]52;;");
    if let Some(data) = data {
        out.push_str(&STANDARD.encode(data));
    }
    out.push_str(osc_end(bel_terminated));
    debug!("clipboard reply: {} bytes", out.len());
    replies.push(out.as_bytes());
}

impl InputContext {
    /// DECRQPSR 1: cursor information report (DECCIR).
    pub(crate) fn reply_cursor_information(&mut self, host: &mut Host<'_>) {
        let screen = &*host.screen;
        let gc = &self.cell.cell;
        let origin = screen.mode().contains(ScreenMode::ORIGIN);

        let mut cx = screen.cursor_x() + 1;
        if origin {
            cx -= screen.margin_left();
        }
        let mut cy = screen.cursor_y() + 1;
        if origin {
            cy -= screen.region_upper();
        }

        let mut sgr = b'@';
        if gc.flags.contains(CellFlags::BOLD) {
            sgr |= 0x01;
        }
        if gc.flags.contains(CellFlags::ALL_UNDERLINE) {
            sgr |= 0x02;
        }
        if gc.flags.contains(CellFlags::BLINK) {
            sgr |= 0x04;
        }
        if gc.flags.contains(CellFlags::INVERSE) {
            sgr |= 0x08;
        }
        let mut sca = b'@';
        if gc.flags.contains(CellFlags::PROTECTED) {
            sca |= 0x01;
        }
        let mut flags = b'@';
        if origin {
            flags |= 0x01;
        }
        if screen.cursor_x() == screen.margin_right() + 1 {
            // Last-column flag: the cursor sits past the margin pending a
            // wrap.
            flags |= 0x08;
            cx -= 1;
        }
        let g0 = if self.cell.g0_acs { "0" } else { "B" };
        let g1 = if self.cell.g1_acs { "0" } else { "B" };

        reply!(
            host,
            "\x1bP1$u{};{};1;{};{};{};{};0;@;{}{}BB\x1b\\",
            cy, cx, sgr as char, sca as char, flags as char, self.cell.set, g0, g1
        );
    }

    /// DECRQPSR 2: tab stop report (DECTABSR).
    pub(crate) fn reply_tab_stops(&mut self, host: &mut Host<'_>) {
        let screen = &*host.screen;
        let mut stops = Vec::new();
        for x in 0..screen.size_x() {
            if screen.is_tab(x) {
                stops.push((x + 1).to_string());
            }
        }
        reply!(host, "\x1bP2$u{}\x1b\\", stops.join("/"));
    }

    /// DECRQTSR 2: colour table report (DECCTR).
    pub(crate) fn reply_color_table(&mut self, params: &Params, host: &mut Host<'_>) {
        let cs = params.get(1, 0, 2);
        if cs == -1 {
            return;
        }
        if cs > 2 {
            debug!("unknown color space {}", cs);
            return;
        }
        let cs = if cs == 0 { 2 } else { cs };

        let mut out = String::from("\x1bP2$s");
        for i in 0..=255u8 {
            let rgb = host.palette.resolve(i);
            if i > 0 {
                out.push('/');
            }
            if cs == 1 {
                let (h, l, s) = rgb.to_hls();
                out.push_str(&format!("{};1;{};{};{}", i, h, l, s));
            } else {
                // DECCTR reports RGB colours from 0-100 instead of 0-255.
                let r = u32::from(rgb.r) * 100 / 255;
                let g = u32::from(rgb.g) * 100 / 255;
                let b = u32::from(rgb.b) * 100 / 255;
                out.push_str(&format!("{};2;{};{};{}", i, r, g, b));
            }
        }
        out.push_str("\x1b\\");
        host.replies.push(out.as_bytes());
    }

    /// DECRQSS for SGR: rebuild the current cell as SGR parameters.
    pub(crate) fn reply_status_sgr(&mut self, host: &mut Host<'_>) {
        let gc = &self.cell.cell;
        let mut out = String::from("\x1bP1$r0");

        if gc.flags.contains(CellFlags::BOLD) {
            out.push_str(";1");
        }
        if gc.flags.contains(CellFlags::FAINT) {
            out.push_str(";2");
        }
        if gc.flags.contains(CellFlags::ITALIC) {
            out.push_str(";3");
        }
        if gc.flags.contains(CellFlags::UNDERLINE) {
            out.push_str(";4:1");
        } else if gc.flags.contains(CellFlags::DOUBLE_UNDERLINE) {
            out.push_str(";21");
        } else if gc.flags.contains(CellFlags::CURLY_UNDERLINE) {
            out.push_str(";4:3");
        } else if gc.flags.contains(CellFlags::DOTTED_UNDERLINE) {
            out.push_str(";4:4");
        } else if gc.flags.contains(CellFlags::DASHED_UNDERLINE) {
            out.push_str(";4:5");
        }
        if gc.flags.contains(CellFlags::BLINK) {
            out.push_str(";5");
        }
        if gc.flags.contains(CellFlags::INVERSE) {
            out.push_str(";7");
        }
        if gc.flags.contains(CellFlags::HIDDEN) {
            out.push_str(";8");
        }
        if gc.flags.contains(CellFlags::STRIKETHROUGH) {
            out.push_str(";9");
        }
        if gc.flags.contains(CellFlags::OVERLINE) {
            out.push_str(";53");
        }
        push_sgr_color(&mut out, 38, gc.fg, true);
        push_sgr_color(&mut out, 48, gc.bg, false);
        if matches!(gc.underline_color, Color::Indexed(_) | Color::Rgb(_)) {
            push_sgr_color(&mut out, 58, gc.underline_color, true);
        }

        out.push_str("m\x1b\\");
        debug!("sgr status: {:?}", out);
        host.replies.push(out.as_bytes());
    }
}

fn push_sgr_color(out: &mut String, base: u32, color: Color, foreground: bool) {
    match color {
        Color::Default => {}
        Color::Rgb(rgb) => {
            out.push_str(&format!(";{}:2:0:{}:{}:{}", base, rgb.r, rgb.g, rgb.b));
        }
        Color::Indexed(i) => {
            out.push_str(&format!(";{}:5:{}", base, i));
        }
        Color::Named(named) => {
            let i = u32::from(named.to_index());
            let code = if foreground {
                if named.is_bright() {
                    90 + i - 8
                } else {
                    30 + i
                }
            } else if named.is_bright() {
                100 + i - 8
            } else {
                40 + i
            };
            out.push_str(&format!(";{}", code));
        }
    }
}
