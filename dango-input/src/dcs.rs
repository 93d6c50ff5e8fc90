//! DCS payload dispatch.
//!
//! The parser delivers a complete device-control string with its command
//! byte first. Handled here: DECRQSS settings queries, DECRSPS cursor/tab
//! restores, DECRSTS colour-table restores, the `tmux;` passthrough
//! convention, and sixel framing for an out-of-core decoder.

use log::debug;

use dango_core::{AllowPassthrough, CellFlags, Color, CursorStyle, Rgb, ScreenMode};
use dango_parser::Params;

use crate::input::{Host, InputContext};
use crate::reply::reply;

/// Passthrough prefix: the rest of the payload goes to the outer terminal.
const PASSTHROUGH_PREFIX: &[u8] = b"tmux;";

impl InputContext {
    pub(crate) fn dcs_dispatch(
        &mut self,
        params: &Params,
        intermediates: &[u8],
        data: &[u8],
        host: &mut Host<'_>,
    ) {
        let allow = host.options.allow_passthrough;
        if allow != AllowPassthrough::Off && data.starts_with(PASSTHROUGH_PREFIX) {
            host.screen.raw_string(
                &data[PASSTHROUGH_PREFIX.len()..],
                allow == AllowPassthrough::All,
            );
            return;
        }

        let command = data[0];
        match (command, intermediates) {
            (b'q', b"$") => {
                if self.term_level.has_vt220() {
                    self.dcs_status_request(&data[1..], host);
                }
            }
            (b't', b"$") => {
                if self.term_level.has_vt220() {
                    self.dcs_restore_presentation(params, &data[1..], host);
                }
            }
            (b'p', b"$") => {
                if self.term_level.has_vt220() {
                    self.dcs_restore_terminal(params, &data[1..], host);
                }
            }
            (b'q', b"") => self.dcs_sixel(params, &data[1..], host),
            _ => debug!("unknown dcs: {:?} '{}'", intermediates, command as char),
        }
    }

    /// DECRQSS: the payload names a setting in CSI form (intermediates
    /// then final, no parameters); answer with a DECRPSS.
    fn dcs_status_request(&mut self, payload: &[u8], host: &mut Host<'_>) {
        let Some((final_byte, intermediates)) = scan_setting(payload) else {
            debug!("bad status request: {:?}", payload);
            reply!(host, "\x1bP0$r\x1b\\");
            return;
        };

        let screen = &*host.screen;
        match (final_byte, intermediates.as_slice()) {
            (b'q', b"\"") => {
                // DECSCA
                let n = if self.cell.cell.flags.contains(CellFlags::PROTECTED) {
                    2
                } else {
                    1
                };
                reply!(host, "\x1bP1$r0;{}\"q\x1b\\", n);
            }
            (b'p', b"\"") => {
                // DECSCL
                reply!(host, "\x1bP1$r{}\"p\x1b\\", self.term_level.conformance());
            }
            (b'q', b" ") => {
                // DECSCUSR
                let style = screen.cursor_style();
                let n = if style != CursorStyle::Default {
                    let blink = screen.mode().contains(ScreenMode::CURSOR_BLINKING);
                    style.group() * 2 - u32::from(blink)
                } else {
                    // No explicit runtime style: fall back to the
                    // configured cursor-style option.
                    u32::from(host.options.cursor_style.min(6))
                };
                reply!(host, "\x1bP1$r{} q\x1b\\", n);
            }
            (b's', b"") => {
                // DECSLRM
                reply!(
                    host,
                    "\x1bP1$r{};{}s\x1b\\",
                    screen.margin_left() + 1,
                    screen.margin_right() + 1
                );
            }
            (b'r', b"") => {
                // DECSTBM
                reply!(
                    host,
                    "\x1bP1$r{};{}r\x1b\\",
                    screen.region_upper() + 1,
                    screen.region_lower() + 1
                );
            }
            (b'm', b"") => self.reply_status_sgr(host),
            _ => {
                debug!(
                    "unhandled status request: {:?} '{}'",
                    intermediates, final_byte as char
                );
                reply!(host, "\x1bP0$r\x1b\\");
            }
        }
    }

    /// DECRSPS: restore presentation state (DECCIR or DECTABSR).
    fn dcs_restore_presentation(&mut self, params: &Params, payload: &[u8], host: &mut Host<'_>) {
        match params.get(0, 0, 0) {
            -1 => {}
            1 => self.restore_cursor_information(payload, host),
            2 => self.restore_tab_stops(payload, host),
            n => debug!("unknown presentation restore {}", n),
        }
    }

    /// DECCIR restore: fixed numeric and flag fields, then the four
    /// charset designations.
    fn restore_cursor_information(&mut self, payload: &[u8], host: &mut Host<'_>) {
        let Ok(text) = std::str::from_utf8(payload) else {
            debug!("bad cursor information payload");
            return;
        };
        let screen = &mut *host.screen;
        let mut fields = FieldParser::new(text);

        let Some(cy) = fields.num(1, screen.size_y() as i64) else {
            return;
        };
        let Some(cx) = fields.num(1, screen.size_x() as i64) else {
            return;
        };
        // Page number, ignored.
        if fields.num(1, i64::MAX).is_none() {
            return;
        }
        let Some(sgr) = fields.data() else {
            return;
        };
        let Some(sca) = fields.data() else {
            return;
        };
        let Some(flags) = fields.data() else {
            return;
        };
        let Some(gl) = fields.num(0, 1) else {
            return;
        };
        // GR charset, ignored.
        if fields.num(0, 1).is_none() {
            return;
        }
        // Charset size flags, ignored.
        if fields.data().is_none() {
            return;
        }
        let Some(designations) = fields.designations() else {
            return;
        };

        let cell = &mut self.cell;
        cell.cell.flags.set(CellFlags::BOLD, sgr & 0x01 != 0);
        if sgr & 0x02 != 0 {
            if !cell.cell.flags.contains(CellFlags::ALL_UNDERLINE) {
                cell.cell.flags.insert(CellFlags::UNDERLINE);
            }
        } else {
            cell.cell.flags.remove(CellFlags::ALL_UNDERLINE);
        }
        cell.cell.flags.set(CellFlags::BLINK, sgr & 0x04 != 0);
        cell.cell.flags.set(CellFlags::INVERSE, sgr & 0x08 != 0);
        cell.cell.flags.set(CellFlags::PROTECTED, sca & 0x01 != 0);
        cell.set = gl as usize;
        cell.g0_acs = designations[0] == "0";
        cell.g1_acs = designations[1] == "0";

        if flags & 0x01 != 0 {
            screen.mode_set(ScreenMode::ORIGIN);
        } else {
            screen.mode_clear(ScreenMode::ORIGIN);
        }
        let cx = if flags & 0x08 != 0 {
            // Last-column flag: park past the right margin.
            screen.margin_right() + 1
        } else {
            cx as usize
        };
        screen.cursor_move(Some(cx - 1), Some(cy as usize - 1), true);
    }

    /// DECTABSR restore: `/`-separated 1-based tab stops replace the map.
    fn restore_tab_stops(&mut self, payload: &[u8], host: &mut Host<'_>) {
        let Ok(text) = std::str::from_utf8(payload) else {
            debug!("bad tab stop payload");
            return;
        };
        let size_x = host.screen.size_x();
        let mut stops = Vec::new();
        for field in text.split('/') {
            let Ok(stop) = field.parse::<usize>() else {
                debug!("invalid tab stop {:?}", field);
                return;
            };
            if stop < 1 || stop > size_x {
                debug!("tab stop {} out of range", stop);
                return;
            }
            stops.push(stop - 1);
        }
        host.screen.replace_tabs(&stops);
    }

    /// DECRSTS: restore terminal state; only the colour table (2) does
    /// anything.
    fn dcs_restore_terminal(&mut self, params: &Params, payload: &[u8], host: &mut Host<'_>) {
        match params.get(0, 0, 0) {
            -1 => {}
            1 => debug!("terminal state restore ignored"),
            2 => self.restore_color_table(payload, host),
            n => debug!("unknown terminal restore {}", n),
        }
    }

    /// DECCTR restore: `/`-separated `index;space;x;y;z` colour specs.
    /// Any parse error leaves the palette untouched.
    fn restore_color_table(&mut self, payload: &[u8], host: &mut Host<'_>) {
        let Ok(text) = std::str::from_utf8(payload) else {
            debug!("bad color table payload");
            return;
        };
        let mut entries = host.palette.snapshot();
        for spec in text.split('/') {
            let mut fields = FieldParser::new(spec);
            let Some(i) = fields.num(0, 255) else {
                return;
            };
            let Some(cs) = fields.num(1, 2) else {
                return;
            };
            let max_x = if cs == 1 { 360 } else { 100 };
            let Some(x) = fields.num(0, max_x) else {
                return;
            };
            let Some(y) = fields.num(0, 100) else {
                return;
            };
            let Some(z) = fields.rest_num(0, 100) else {
                return;
            };

            let color = if cs == 1 {
                Color::Rgb(Rgb::from_hls(x as u16, y as u8, z as u8))
            } else {
                Color::Rgb(Rgb::new(
                    (x * 255 / 100) as u8,
                    (y * 255 / 100) as u8,
                    (z * 255 / 100) as u8,
                ))
            };
            entries[i as usize] = Some(color);
        }
        host.palette.replace(entries);
    }

    /// Sixel: frame the payload for the host's decoder, if any.
    fn dcs_sixel(&mut self, params: &Params, payload: &[u8], host: &mut Host<'_>) {
        if !self.term_level.is_graphics() {
            return;
        }
        let (xpixel, ypixel) = host.events.pixel_cell().unwrap_or((0, 0));
        let p2 = match params.get(1, 0, 0) {
            -1 => 0,
            n => n as u32,
        };
        if let Some(decoder) = host.sixel.as_deref_mut() {
            if let Some(image) = decoder.decode(payload, p2, xpixel, ypixel) {
                host.screen.sixel_image(&image, self.cell.cell.bg);
            }
        }
    }
}

/// Identify the setting a DECRQSS payload asks about: optional
/// intermediates, then a final byte, nothing else.
fn scan_setting(payload: &[u8]) -> Option<(u8, Vec<u8>)> {
    let mut intermediates = Vec::new();
    let mut bytes = payload.iter();
    loop {
        let &b = bytes.next()?;
        match b {
            0x20..=0x2F | 0x3C..=0x3F => {
                if intermediates.len() == 3 {
                    return None;
                }
                intermediates.push(b);
            }
            0x40..=0x7E => {
                if bytes.next().is_some() {
                    return None;
                }
                return Some((b, intermediates));
            }
            _ => return None,
        }
    }
}

/// Cursor over `;`-separated DECCIR/DECCTR fields.
struct FieldParser<'a> {
    rest: &'a str,
}

impl<'a> FieldParser<'a> {
    fn new(text: &'a str) -> Self {
        FieldParser { rest: text }
    }

    fn next_field(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        match self.rest.find(';') {
            Some(at) => {
                let field = &self.rest[..at];
                self.rest = &self.rest[at + 1..];
                Some(field)
            }
            None => {
                let field = self.rest;
                self.rest = "";
                Some(field)
            }
        }
    }

    /// A bounded numeric field.
    fn num(&mut self, min: i64, max: i64) -> Option<i64> {
        let field = self.next_field()?;
        let v = field.parse::<i64>().ok()?;
        if v < min || v > max {
            debug!("field {:?} out of range", field);
            return None;
        }
        Some(v)
    }

    /// The remainder as one bounded numeric field (no separator).
    fn rest_num(&mut self, min: i64, max: i64) -> Option<i64> {
        let field = std::mem::take(&mut self.rest);
        if field.is_empty() {
            return None;
        }
        let v = field.parse::<i64>().ok()?;
        if v < min || v > max {
            return None;
        }
        Some(v)
    }

    /// A graphic-encoded flags field: one byte in `@ .. ?`+0x40 space.
    fn data(&mut self) -> Option<u8> {
        let field = self.next_field()?;
        let &b = field.as_bytes().first()?;
        if b & 0xE0 != 0x40 {
            debug!("invalid flags field {:?}", field);
            return None;
        }
        Some(b)
    }

    /// The four trailing charset designations: each zero or more
    /// intermediates then one final character.
    fn designations(&mut self) -> Option<[&'a str; 4]> {
        let mut out = [""; 4];
        let bytes = self.rest.as_bytes();
        let mut pos = 0;
        for slot in out.iter_mut() {
            let start = pos;
            while pos < bytes.len() && (0x20..=0x2F).contains(&bytes[pos]) {
                pos += 1;
            }
            if pos >= bytes.len() || !(0x30..0x7F).contains(&bytes[pos]) {
                debug!("invalid charset designation");
                return None;
            }
            pos += 1;
            *slot = &self.rest[start..pos];
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_setting() {
        assert_eq!(scan_setting(b" q"), Some((b'q', b" ".to_vec())));
        assert_eq!(scan_setting(b"m"), Some((b'm', vec![])));
        assert_eq!(scan_setting(b"\"p"), Some((b'p', b"\"".to_vec())));
        // Parameters are not accepted in a settings name.
        assert_eq!(scan_setting(b"1m"), None);
        assert_eq!(scan_setting(b"m1"), None);
        assert_eq!(scan_setting(b""), None);
    }

    #[test]
    fn test_field_parser_numbers() {
        let mut fields = FieldParser::new("5;10;x");
        assert_eq!(fields.num(1, 24), Some(5));
        assert_eq!(fields.num(1, 80), Some(10));
        assert_eq!(fields.num(0, 9), None);
    }

    #[test]
    fn test_field_parser_data() {
        let mut fields = FieldParser::new("A;@;z");
        assert_eq!(fields.data(), Some(b'A'));
        assert_eq!(fields.data(), Some(b'@'));
        assert_eq!(fields.data(), None);
    }

    #[test]
    fn test_field_parser_designations() {
        let mut fields = FieldParser::new("0B%5B");
        let d = fields.designations().unwrap();
        assert_eq!(d, ["0", "B", "%5", "B"]);

        let mut fields = FieldParser::new("0B");
        assert!(fields.designations().is_none());
    }
}
