//! SGR (Select Graphic Rendition) dispatch.
//!
//! Walks the parameter list mutating the working cell. Colour arguments
//! come in the `38;2;R;G;B` / `38;5;N` forms and in the colon-separated
//! ISO form, which arrives here as a string parameter.

use log::trace;

use dango_core::{Cell, CellFlags, Color, NamedColor, Rgb};
use dango_parser::{Param, Params};

use crate::input::InputContext;

impl InputContext {
    pub(crate) fn csi_dispatch_sgr(&mut self, params: &Params) {
        let gc = &mut self.cell.cell;
        if params.is_empty() {
            let link = gc.hyperlink_id;
            gc.reset();
            gc.hyperlink_id = link;
            return;
        }

        let mut i = 0;
        while i < params.len() {
            if let Some(Param::Str(s)) = params.raw(i) {
                let s = s.clone();
                sgr_colon(gc, &s);
                i += 1;
                continue;
            }
            let n = params.get(i, 0, 0);
            if n == -1 {
                i += 1;
                continue;
            }

            if n == 38 || n == 48 || n == 58 {
                i += 1;
                match params.get(i, 0, -1) {
                    2 => {
                        let r = params.get(i + 1, 0, -1);
                        let g = params.get(i + 2, 0, -1);
                        let b = params.get(i + 3, 0, -1);
                        if sgr_rgb(gc, n, r, g, b) {
                            i += 3;
                        }
                    }
                    5 => {
                        let c = params.get(i + 1, 0, -1);
                        sgr_256(gc, n, c);
                        i += 1;
                    }
                    _ => {}
                }
                i += 1;
                continue;
            }

            match n {
                0 => {
                    // Reset everything but keep the hyperlink open.
                    let link = gc.hyperlink_id;
                    gc.reset();
                    gc.hyperlink_id = link;
                }
                1 => gc.flags.insert(CellFlags::BOLD),
                2 => gc.flags.insert(CellFlags::FAINT),
                3 => gc.flags.insert(CellFlags::ITALIC),
                4 => {
                    gc.flags.remove(CellFlags::ALL_UNDERLINE);
                    gc.flags.insert(CellFlags::UNDERLINE);
                }
                5 | 6 => gc.flags.insert(CellFlags::BLINK),
                7 => gc.flags.insert(CellFlags::INVERSE),
                8 => gc.flags.insert(CellFlags::HIDDEN),
                9 => gc.flags.insert(CellFlags::STRIKETHROUGH),
                21 => {
                    gc.flags.remove(CellFlags::ALL_UNDERLINE);
                    gc.flags.insert(CellFlags::DOUBLE_UNDERLINE);
                }
                22 => gc.flags.remove(CellFlags::BOLD | CellFlags::FAINT),
                23 => gc.flags.remove(CellFlags::ITALIC),
                24 => gc.flags.remove(CellFlags::ALL_UNDERLINE),
                25 => gc.flags.remove(CellFlags::BLINK),
                27 => gc.flags.remove(CellFlags::INVERSE),
                28 => gc.flags.remove(CellFlags::HIDDEN),
                29 => gc.flags.remove(CellFlags::STRIKETHROUGH),
                30..=37 => {
                    if let Some(c) = NamedColor::from_sgr_normal((n - 30) as u8) {
                        gc.fg = Color::Named(c);
                    }
                }
                39 => gc.fg = Color::Default,
                40..=47 => {
                    if let Some(c) = NamedColor::from_sgr_normal((n - 40) as u8) {
                        gc.bg = Color::Named(c);
                    }
                }
                49 => gc.bg = Color::Default,
                53 => gc.flags.insert(CellFlags::OVERLINE),
                55 => gc.flags.remove(CellFlags::OVERLINE),
                59 => gc.underline_color = Color::Default,
                90..=97 => {
                    if let Some(c) = NamedColor::from_sgr_bright((n - 90) as u8) {
                        gc.fg = Color::Named(c);
                    }
                }
                100..=107 => {
                    if let Some(c) = NamedColor::from_sgr_bright((n - 100) as u8) {
                        gc.bg = Color::Named(c);
                    }
                }
                n => trace!("unhandled sgr {}", n),
            }
            i += 1;
        }
    }
}

/// Apply an indexed colour; out-of-range indexes fall back to default
/// for foreground and background.
fn sgr_256(gc: &mut Cell, fgbg: i32, c: i32) {
    if !(0..=255).contains(&c) {
        if fgbg == 38 {
            gc.fg = Color::Default;
        } else if fgbg == 48 {
            gc.bg = Color::Default;
        }
    } else {
        let color = Color::Indexed(c as u8);
        if fgbg == 38 {
            gc.fg = color;
        } else if fgbg == 48 {
            gc.bg = color;
        } else if fgbg == 58 {
            gc.underline_color = color;
        }
    }
}

/// Apply an RGB colour; returns whether the arguments were consumed.
fn sgr_rgb(gc: &mut Cell, fgbg: i32, r: i32, g: i32, b: i32) -> bool {
    for v in [r, g, b] {
        if !(0..=255).contains(&v) {
            return false;
        }
    }
    let color = Color::Rgb(Rgb::new(r as u8, g as u8, b as u8));
    if fgbg == 38 {
        gc.fg = color;
    } else if fgbg == 48 {
        gc.bg = color;
    } else if fgbg == 58 {
        gc.underline_color = color;
    }
    true
}

/// Handle one colon-separated SGR parameter (`4:3`, `38:2:0:R:G:B`, ...).
fn sgr_colon(gc: &mut Cell, s: &str) {
    let mut p = [-1i32; 8];
    let mut n = 0;
    for field in s.split(':') {
        if n == p.len() {
            return;
        }
        if !field.is_empty() {
            match field.parse::<i32>() {
                Ok(v) if v >= 0 => p[n] = v,
                _ => return,
            }
        }
        n += 1;
    }
    if n == 0 {
        return;
    }

    if p[0] == 4 {
        // Underline styles.
        if n != 2 {
            return;
        }
        gc.flags.remove(CellFlags::ALL_UNDERLINE);
        match p[1] {
            0 => {}
            1 => gc.flags.insert(CellFlags::UNDERLINE),
            2 => gc.flags.insert(CellFlags::DOUBLE_UNDERLINE),
            3 => gc.flags.insert(CellFlags::CURLY_UNDERLINE),
            4 => gc.flags.insert(CellFlags::DOTTED_UNDERLINE),
            5 => gc.flags.insert(CellFlags::DASHED_UNDERLINE),
            _ => {}
        }
        return;
    }
    if n < 2 || (p[0] != 38 && p[0] != 48 && p[0] != 58) {
        return;
    }
    match p[1] {
        2 => {
            if n < 3 {
                return;
            }
            // Both 38:2:R:G:B and 38:2:<colourspace>:R:G:B are accepted.
            let i = if n == 5 { 2 } else { 3 };
            if n < i + 3 {
                return;
            }
            sgr_rgb(gc, p[0], p[i], p[i + 1], p[i + 2]);
        }
        5 => {
            if n < 3 {
                return;
            }
            sgr_256(gc, p[0], p[2]);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_after(spec: &[u8]) -> Cell {
        let params = Params::split(spec).unwrap();
        let options = dango_core::Options::default();
        let mut ctx = InputContext::new(&options);
        ctx.csi_dispatch_sgr(&params);
        ctx.cell().clone()
    }

    #[test]
    fn test_sgr_basic_attributes() {
        let gc = cell_after(b"1;4;7");
        assert!(gc.flags.contains(CellFlags::BOLD));
        assert!(gc.flags.contains(CellFlags::UNDERLINE));
        assert!(gc.flags.contains(CellFlags::INVERSE));
    }

    #[test]
    fn test_sgr_basic_colors() {
        let gc = cell_after(b"31;42");
        assert_eq!(gc.fg, Color::Named(NamedColor::Red));
        assert_eq!(gc.bg, Color::Named(NamedColor::Green));
        let gc = cell_after(b"94");
        assert_eq!(gc.fg, Color::Named(NamedColor::BrightBlue));
    }

    #[test]
    fn test_sgr_rgb_colors() {
        let gc = cell_after(b"38;2;255;128;0");
        assert_eq!(gc.fg, Color::Rgb(Rgb::new(255, 128, 0)));
        let gc = cell_after(b"48;2;1;2;3");
        assert_eq!(gc.bg, Color::Rgb(Rgb::new(1, 2, 3)));
        let gc = cell_after(b"58;2;9;9;9");
        assert_eq!(gc.underline_color, Color::Rgb(Rgb::new(9, 9, 9)));
    }

    #[test]
    fn test_sgr_indexed_colors() {
        let gc = cell_after(b"38;5;123");
        assert_eq!(gc.fg, Color::Indexed(123));
        let gc = cell_after(b"48;5;300");
        assert_eq!(gc.bg, Color::Default);
    }

    #[test]
    fn test_sgr_colon_forms() {
        let gc = cell_after(b"38:2:0:255:128:0");
        assert_eq!(gc.fg, Color::Rgb(Rgb::new(255, 128, 0)));
        let gc = cell_after(b"38:2:255:128:0");
        assert_eq!(gc.fg, Color::Rgb(Rgb::new(255, 128, 0)));
        let gc = cell_after(b"38:5:200");
        assert_eq!(gc.fg, Color::Indexed(200));
    }

    #[test]
    fn test_sgr_underline_styles() {
        let gc = cell_after(b"4:3");
        assert!(gc.flags.contains(CellFlags::CURLY_UNDERLINE));
        let gc = cell_after(b"4:3;4:0");
        assert!(!gc.flags.contains(CellFlags::ALL_UNDERLINE));
        let gc = cell_after(b"21");
        assert!(gc.flags.contains(CellFlags::DOUBLE_UNDERLINE));
    }

    #[test]
    fn test_sgr_reset_keeps_hyperlink() {
        let options = dango_core::Options::default();
        let mut ctx = InputContext::new(&options);
        ctx.csi_dispatch_sgr(&Params::split(b"1;31").unwrap());
        ctx.cell.cell.hyperlink_id = 7;
        ctx.csi_dispatch_sgr(&Params::split(b"0").unwrap());
        assert_eq!(ctx.cell().hyperlink_id, 7);
        assert!(ctx.cell().flags.is_empty());
        assert_eq!(ctx.cell().fg, Color::Default);
    }

    #[test]
    fn test_sgr_attribute_removal() {
        let gc = cell_after(b"1;2;22");
        assert!(!gc.flags.contains(CellFlags::BOLD));
        assert!(!gc.flags.contains(CellFlags::FAINT));
        let gc = cell_after(b"53;55");
        assert!(!gc.flags.contains(CellFlags::OVERLINE));
    }
}
