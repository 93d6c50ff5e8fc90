//! OSC, APC and rename string dispatch.
//!
//! OSC strings carry `Ps ; Pt`; the option number selects the handler.
//! APC sets the title like OSC 2 does. The rename string comes from
//! `ESC k ... ST` and drives the window name.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::debug;

use dango_core::{Color, LineMark, SetClipboard};

use crate::input::{Host, InputContext};
use crate::reply::{clipboard_reply, color_reply};

/// Characters allowed in an OSC 52 clipboard-selection flag list.
const CLIPBOARD_FLAGS: &str = "cpqs01234567";

impl InputContext {
    pub(crate) fn osc_dispatch(&mut self, data: &[u8], bel_terminated: bool, host: &mut Host<'_>) {
        // The option number must lead the string.
        if data.first().map_or(true, |b| !b.is_ascii_digit()) {
            return;
        }
        let mut option: u32 = 0;
        let mut pos = 0;
        while pos < data.len() && data[pos].is_ascii_digit() {
            option = option.saturating_mul(10) + u32::from(data[pos] - b'0');
            pos += 1;
        }
        if pos < data.len() && data[pos] != b';' {
            return;
        }
        let payload = if pos < data.len() { &data[pos + 1..] } else { &[] };
        debug!(
            "osc {} ({}): {} bytes",
            option,
            if bel_terminated { "BEL" } else { "ST" },
            payload.len()
        );

        match option {
            0 | 2 => self.osc_set_title(payload, host),
            4 => self.osc_palette(payload, bel_terminated, host),
            7 => self.osc_set_path(payload, host),
            8 => self.osc_hyperlink(payload, host),
            10 => self.osc_foreground(payload, bel_terminated, host),
            11 => self.osc_background(payload, bel_terminated, host),
            12 => self.osc_cursor_color(payload, bel_terminated, host),
            52 => self.osc_clipboard(payload, bel_terminated, host),
            104 => self.osc_palette_reset(payload, host),
            110 => self.osc_reset_foreground(payload, host),
            111 => self.osc_reset_background(payload, host),
            112 => self.osc_reset_cursor_color(payload, host),
            133 => self.osc_shell_integration(payload, host),
            n => debug!("unknown osc {}", n),
        }
    }

    /// APC: the whole payload becomes the title.
    pub(crate) fn apc_dispatch(&mut self, data: &[u8], host: &mut Host<'_>) {
        let Ok(title) = std::str::from_utf8(data) else {
            return;
        };
        if host.screen.set_title(title) {
            host.events.title_changed();
        }
    }

    /// `ESC k ... ST`: rename the window; an empty name restores
    /// automatic naming.
    pub(crate) fn rename_dispatch(&mut self, data: &[u8], host: &mut Host<'_>) {
        if !host.options.allow_rename {
            return;
        }
        let Ok(name) = std::str::from_utf8(data) else {
            return;
        };
        debug!("rename to {:?}", name);
        if name.is_empty() {
            // Drop the rename override; without automatic naming the
            // window name simply clears.
            if host.options.automatic_rename {
                host.events.rename_window(None);
            } else {
                host.events.rename_window(Some(""));
            }
        } else {
            host.events.rename_window(Some(name));
        }
    }

    fn osc_set_title(&mut self, payload: &[u8], host: &mut Host<'_>) {
        if !host.options.allow_set_title {
            return;
        }
        let Ok(title) = std::str::from_utf8(payload) else {
            return;
        };
        if host.screen.set_title(title) {
            host.events.title_changed();
        }
    }

    /// OSC 4: set or query palette entries, `index;spec` pairs.
    fn osc_palette(&mut self, payload: &[u8], bel_terminated: bool, host: &mut Host<'_>) {
        let Ok(text) = std::str::from_utf8(payload) else {
            debug!("bad osc 4");
            return;
        };
        let mut fields = text.split(';');
        let mut redraw = false;
        let mut bad = false;
        loop {
            let Some(index) = fields.next() else {
                break;
            };
            if index.is_empty() && fields.clone().next().is_none() {
                break;
            }
            let Ok(index) = index.parse::<u32>() else {
                bad = true;
                break;
            };
            if index > 255 {
                bad = true;
                break;
            }
            let Some(spec) = fields.next() else {
                bad = true;
                break;
            };
            if spec == "?" {
                let resolved = Color::Rgb(host.palette.resolve(index as u8));
                color_reply(host, 4, Some(index as u8), resolved, bel_terminated);
                continue;
            }
            match Color::parse_x11(spec) {
                Some(color) => {
                    if host.palette.set(index as u8, color) {
                        redraw = true;
                    }
                }
                None => continue,
            }
        }
        if bad {
            debug!("bad osc 4: {:?}", text);
        }
        if redraw {
            host.screen.full_redraw();
        }
    }

    /// OSC 104: reset palette entries, all of them or a `;` list.
    fn osc_palette_reset(&mut self, payload: &[u8], host: &mut Host<'_>) {
        if payload.is_empty() {
            host.palette.clear();
            host.screen.full_redraw();
            return;
        }
        let Ok(text) = std::str::from_utf8(payload) else {
            debug!("bad osc 104");
            return;
        };
        let mut redraw = false;
        for field in text.split(';') {
            let Ok(index) = field.parse::<u32>() else {
                debug!("bad osc 104: {:?}", text);
                break;
            };
            if index > 255 {
                debug!("bad osc 104: {:?}", text);
                break;
            }
            if host.palette.unset(index as u8) {
                redraw = true;
            }
        }
        if redraw {
            host.screen.full_redraw();
        }
    }

    fn osc_set_path(&mut self, payload: &[u8], host: &mut Host<'_>) {
        let Ok(path) = std::str::from_utf8(payload) else {
            return;
        };
        host.screen.set_path(path);
    }

    /// OSC 8: hyperlink open/close; `id=` is the only parameter used.
    fn osc_hyperlink(&mut self, payload: &[u8], host: &mut Host<'_>) {
        let Ok(text) = std::str::from_utf8(payload) else {
            debug!("bad osc 8");
            return;
        };
        let Some((params, uri)) = text.split_once(';') else {
            debug!("bad osc 8: {:?}", text);
            return;
        };
        let mut id = None;
        for param in params.split(':') {
            if let Some(value) = param.strip_prefix("id=") {
                if value.is_empty() {
                    continue;
                }
                if id.is_some() {
                    debug!("bad osc 8: {:?}", text);
                    return;
                }
                id = Some(value);
            }
        }
        if uri.is_empty() {
            self.cell.cell.hyperlink_id = 0;
            return;
        }
        self.cell.cell.hyperlink_id = host.hyperlinks.put(uri, id);
        debug!(
            "hyperlink ({}) {} = {}",
            id.unwrap_or("anonymous"),
            uri,
            self.cell.cell.hyperlink_id
        );
    }

    /// OSC 10: set or query the default foreground.
    fn osc_foreground(&mut self, payload: &[u8], bel_terminated: bool, host: &mut Host<'_>) {
        if payload == b"?" {
            let color = if host.palette.fg != Color::Default {
                host.palette.fg
            } else {
                host.events.foreground()
            };
            color_reply(host, 10, None, color, bel_terminated);
            return;
        }
        let Some(color) = parse_color(payload) else {
            debug!("bad osc 10");
            return;
        };
        host.palette.fg = color;
        host.screen.full_redraw();
    }

    fn osc_reset_foreground(&mut self, payload: &[u8], host: &mut Host<'_>) {
        if !payload.is_empty() {
            return;
        }
        host.palette.fg = Color::Default;
        host.screen.full_redraw();
    }

    /// OSC 11: set or query the default background.
    fn osc_background(&mut self, payload: &[u8], bel_terminated: bool, host: &mut Host<'_>) {
        if payload == b"?" {
            let color = if host.palette.bg != Color::Default {
                host.palette.bg
            } else {
                host.events.background()
            };
            color_reply(host, 11, None, color, bel_terminated);
            return;
        }
        let Some(color) = parse_color(payload) else {
            debug!("bad osc 11");
            return;
        };
        host.palette.bg = color;
        host.screen.full_redraw();
    }

    fn osc_reset_background(&mut self, payload: &[u8], host: &mut Host<'_>) {
        if !payload.is_empty() {
            return;
        }
        host.palette.bg = Color::Default;
        host.screen.full_redraw();
    }

    /// OSC 12: set or query the cursor colour.
    fn osc_cursor_color(&mut self, payload: &[u8], bel_terminated: bool, host: &mut Host<'_>) {
        if payload == b"?" {
            let color = host
                .screen
                .cursor_color()
                .or_else(|| host.screen.default_cursor_color());
            if let Some(color) = color {
                color_reply(host, 12, None, color, bel_terminated);
            }
            return;
        }
        let Some(color) = parse_color(payload) else {
            debug!("bad osc 12");
            return;
        };
        host.screen.set_cursor_color(Some(color));
    }

    fn osc_reset_cursor_color(&mut self, payload: &[u8], host: &mut Host<'_>) {
        // No arguments accepted.
        if payload.is_empty() {
            host.screen.set_cursor_color(None);
        }
    }

    /// OSC 52: clipboard access, `flags;data`.
    fn osc_clipboard(&mut self, payload: &[u8], bel_terminated: bool, host: &mut Host<'_>) {
        if host.options.set_clipboard != SetClipboard::External {
            return;
        }
        let Some(at) = payload.iter().position(|&b| b == b';') else {
            return;
        };
        let (flag_part, data) = (&payload[..at], &payload[at + 1..]);
        if data.is_empty() {
            return;
        }

        let mut flags = String::new();
        for &b in flag_part {
            let c = b as char;
            if CLIPBOARD_FLAGS.contains(c) && !flags.contains(c) {
                flags.push(c);
            }
        }

        if data == b"?" {
            let top = host.paste.top().map(|b| b.to_vec());
            clipboard_reply(host.replies, top.as_deref(), bel_terminated);
            return;
        }

        let Ok(text) = std::str::from_utf8(data) else {
            return;
        };
        let Ok(decoded) = BASE64.decode(text) else {
            debug!("bad osc 52 data");
            return;
        };
        if decoded.is_empty() {
            return;
        }
        host.screen.set_selection(&flags, &decoded);
        host.events.clipboard_updated();
        host.paste.add(&decoded);
    }

    /// OSC 133: shell integration marks on the current line.
    fn osc_shell_integration(&mut self, payload: &[u8], host: &mut Host<'_>) {
        match payload.first() {
            Some(b'A') => host.screen.mark_line(LineMark::PromptStart),
            Some(b'C') => host.screen.mark_line(LineMark::OutputStart),
            _ => {}
        }
    }
}

fn parse_color(payload: &[u8]) -> Option<Color> {
    let text = std::str::from_utf8(payload).ok()?;
    Color::parse_x11(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert!(parse_color(b"#ff0000").is_some());
        assert!(parse_color(b"rgb:ff/00/00").is_some());
        assert!(parse_color(b"\xff\xfe").is_none());
    }
}
