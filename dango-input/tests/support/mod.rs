//! Test support: a recording screen writer and a fixture wiring every
//! collaborator together.

// Each integration test binary compiles this module separately and uses
// a different subset of it.
#![allow(dead_code)]

use std::collections::BTreeSet;

use dango_core::{
    Cell, Color, ColorPalette, CursorStyle, HostEvents, Hyperlinks, LineMark, MemoryPasteStore,
    Options, ScreenMode, SixelDecoder, SixelImage, Theme,
};
use dango_input::{Host, InputContext};

/// A screen writer that keeps just enough state for the dispatcher's
/// read-backs and records every write for assertions.
pub struct MockScreen {
    pub size_x: usize,
    pub size_y: usize,
    pub cx: usize,
    pub cy: usize,
    pub mode: ScreenMode,
    pub rupper: usize,
    pub rlower: usize,
    pub rleft: usize,
    pub rright: usize,
    pub tabs: BTreeSet<usize>,
    pub style: CursorStyle,
    pub cursor_color: Option<Color>,
    pub alternate: bool,
    pub title: String,
    pub title_stack: Vec<String>,
    pub path: String,
    /// Cells given to `collect_add`, in order.
    pub cells: Vec<Cell>,
    /// Every non-print operation, formatted.
    pub calls: Vec<String>,
}

impl MockScreen {
    pub fn new(size_x: usize, size_y: usize) -> Self {
        let mut mode = ScreenMode::empty();
        mode.insert(ScreenMode::CURSOR | ScreenMode::WRAP);
        MockScreen {
            size_x,
            size_y,
            cx: 0,
            cy: 0,
            mode,
            rupper: 0,
            rlower: size_y - 1,
            rleft: 0,
            rright: size_x - 1,
            tabs: (0..size_x).step_by(8).collect(),
            style: CursorStyle::Default,
            cursor_color: None,
            alternate: false,
            title: String::new(),
            title_stack: Vec::new(),
            path: String::new(),
            cells: Vec::new(),
            calls: Vec::new(),
        }
    }

    fn log(&mut self, call: String) {
        self.calls.push(call);
    }

    /// The printed text, ignoring attributes.
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.c.as_str()).collect()
    }

    pub fn has_call(&self, needle: &str) -> bool {
        self.calls.iter().any(|c| c.contains(needle))
    }

    pub fn last_call(&self) -> &str {
        self.calls.last().map(|s| s.as_str()).unwrap_or("")
    }
}

impl dango_core::ScreenWrite for MockScreen {
    fn size_x(&self) -> usize {
        self.size_x
    }
    fn size_y(&self) -> usize {
        self.size_y
    }
    fn cursor_x(&self) -> usize {
        self.cx
    }
    fn cursor_y(&self) -> usize {
        self.cy
    }
    fn mode(&self) -> ScreenMode {
        self.mode
    }
    fn region_upper(&self) -> usize {
        self.rupper
    }
    fn region_lower(&self) -> usize {
        self.rlower
    }
    fn margin_left(&self) -> usize {
        self.rleft
    }
    fn margin_right(&self) -> usize {
        self.rright
    }
    fn is_tab(&self, x: usize) -> bool {
        self.tabs.contains(&x)
    }
    fn cursor_style(&self) -> CursorStyle {
        self.style
    }
    fn cursor_color(&self) -> Option<Color> {
        self.cursor_color
    }
    fn default_cursor_color(&self) -> Option<Color> {
        None
    }
    fn alternate_active(&self) -> bool {
        self.alternate
    }

    fn collect_add(&mut self, cell: &Cell) {
        self.cells.push(cell.clone());
        self.cx = (self.cx + cell.width()).min(self.size_x);
    }
    fn collect_end(&mut self) {}

    fn backspace(&mut self) {
        self.cx = self.cx.saturating_sub(1);
        self.log("backspace".into());
    }
    fn carriage_return(&mut self) {
        self.cx = 0;
        self.log("carriage_return".into());
    }
    fn linefeed(&mut self, bg: Color) {
        self.cy = (self.cy + 1).min(self.rlower);
        self.log(format!("linefeed({:?})", bg));
    }
    fn cursor_up(&mut self, n: usize) {
        self.cy = self.cy.saturating_sub(n);
        self.log(format!("cursor_up({})", n));
    }
    fn cursor_down(&mut self, n: usize) {
        self.cy = (self.cy + n).min(self.size_y - 1);
        self.log(format!("cursor_down({})", n));
    }
    fn cursor_left(&mut self, n: usize) {
        self.cx = self.cx.saturating_sub(n);
        self.log(format!("cursor_left({})", n));
    }
    fn cursor_right(&mut self, n: usize) {
        self.cx = (self.cx + n).min(self.size_x - 1);
        self.log(format!("cursor_right({})", n));
    }
    fn cursor_move(&mut self, cx: Option<usize>, cy: Option<usize>, origin: bool) {
        let relative = origin && self.mode.contains(ScreenMode::ORIGIN);
        if let Some(x) = cx {
            let x = if relative { self.rleft + x } else { x };
            self.cx = x.min(self.size_x - 1);
        }
        if let Some(y) = cy {
            let y = if relative { self.rupper + y } else { y };
            self.cy = y.min(self.size_y - 1);
        }
        self.log(format!("cursor_move({:?},{:?},{})", cx, cy, origin));
    }
    fn reverse_index(&mut self, bg: Color) {
        self.cy = self.cy.saturating_sub(1);
        self.log(format!("reverse_index({:?})", bg));
    }
    fn back_index(&mut self, bg: Color) {
        self.log(format!("back_index({:?})", bg));
    }
    fn forward_index(&mut self, bg: Color) {
        self.log(format!("forward_index({:?})", bg));
    }

    fn clear_end_of_screen(&mut self, bg: Color, selective: bool) {
        self.log(format!("clear_end_of_screen({:?},{})", bg, selective));
    }
    fn clear_start_of_screen(&mut self, bg: Color, selective: bool) {
        self.log(format!("clear_start_of_screen({:?},{})", bg, selective));
    }
    fn clear_screen(&mut self, bg: Color, selective: bool) {
        self.log(format!("clear_screen({:?},{})", bg, selective));
    }
    fn clear_end_of_line(&mut self, bg: Color, selective: bool) {
        self.log(format!("clear_end_of_line({:?},{})", bg, selective));
    }
    fn clear_start_of_line(&mut self, bg: Color, selective: bool) {
        self.log(format!("clear_start_of_line({:?},{})", bg, selective));
    }
    fn clear_line(&mut self, bg: Color, selective: bool) {
        self.log(format!("clear_line({:?},{})", bg, selective));
    }
    fn clear_history(&mut self) {
        self.log("clear_history".into());
    }
    fn clear_character(&mut self, n: usize, bg: Color) {
        self.log(format!("clear_character({},{:?})", n, bg));
    }

    fn insert_character(&mut self, n: usize, bg: Color) {
        self.log(format!("insert_character({},{:?})", n, bg));
    }
    fn delete_character(&mut self, n: usize, bg: Color) {
        self.log(format!("delete_character({},{:?})", n, bg));
    }
    fn insert_line(&mut self, n: usize, bg: Color) {
        self.log(format!("insert_line({},{:?})", n, bg));
    }
    fn delete_line(&mut self, n: usize, bg: Color) {
        self.log(format!("delete_line({},{:?})", n, bg));
    }
    fn insert_column(&mut self, n: usize, bg: Color) {
        self.log(format!("insert_column({},{:?})", n, bg));
    }
    fn delete_column(&mut self, n: usize, bg: Color) {
        self.log(format!("delete_column({},{:?})", n, bg));
    }

    fn scroll_up(&mut self, n: usize, bg: Color) {
        self.log(format!("scroll_up({},{:?})", n, bg));
    }
    fn scroll_down(&mut self, n: usize, bg: Color) {
        self.log(format!("scroll_down({},{:?})", n, bg));
    }
    fn scroll_left(&mut self, n: usize, bg: Color) {
        self.log(format!("scroll_left({},{:?})", n, bg));
    }
    fn scroll_right(&mut self, n: usize, bg: Color) {
        self.log(format!("scroll_right({},{:?})", n, bg));
    }
    fn scroll_region(&mut self, top: usize, bottom: usize) {
        self.rupper = top;
        self.rlower = bottom;
        self.log(format!("scroll_region({},{})", top, bottom));
    }
    fn scroll_margin(&mut self, left: usize, right: usize) {
        self.rleft = left;
        self.rright = right;
        self.log(format!("scroll_margin({},{})", left, right));
    }

    fn mode_set(&mut self, flags: u32) {
        self.mode.insert(flags);
        self.log(format!("mode_set({:#x})", flags));
    }
    fn mode_clear(&mut self, flags: u32) {
        self.mode.remove(flags);
        self.log(format!("mode_clear({:#x})", flags));
    }
    fn alternate_on(&mut self, _cell: &Cell, with_cursor: bool) {
        self.alternate = true;
        self.log(format!("alternate_on({})", with_cursor));
    }
    fn alternate_off(&mut self, _cell: &Cell, with_cursor: bool) {
        self.alternate = false;
        self.log(format!("alternate_off({})", with_cursor));
    }

    fn set_tab(&mut self, x: usize) {
        self.tabs.insert(x);
        self.log(format!("set_tab({})", x));
    }
    fn clear_tab(&mut self, x: usize) {
        self.tabs.remove(&x);
        self.log(format!("clear_tab({})", x));
    }
    fn clear_all_tabs(&mut self) {
        self.tabs.clear();
        self.log("clear_all_tabs".into());
    }
    fn replace_tabs(&mut self, stops: &[usize]) {
        self.tabs = stops.iter().copied().collect();
        self.log(format!("replace_tabs({:?})", stops));
    }

    fn set_title(&mut self, title: &str) -> bool {
        if self.title == title {
            return false;
        }
        self.title = title.to_string();
        true
    }
    fn push_title(&mut self) {
        self.title_stack.push(self.title.clone());
        self.log("push_title".into());
    }
    fn pop_title(&mut self) {
        if let Some(title) = self.title_stack.pop() {
            self.title = title;
        }
        self.log("pop_title".into());
    }
    fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
    }
    fn set_cursor_style(&mut self, style: CursorStyle) {
        self.style = style;
        self.log(format!("set_cursor_style({:?})", style));
    }
    fn set_cursor_color(&mut self, color: Option<Color>) {
        self.cursor_color = color;
        self.log(format!("set_cursor_color({:?})", color));
    }

    fn alignment_test(&mut self) {
        self.log("alignment_test".into());
    }
    fn set_selection(&mut self, flags: &str, data: &[u8]) {
        self.log(format!(
            "set_selection({},{})",
            flags,
            String::from_utf8_lossy(data)
        ));
    }
    fn mark_line(&mut self, mark: LineMark) {
        self.log(format!("mark_line({:?})", mark));
    }
    fn sixel_image(&mut self, image: &SixelImage, bg: Color) {
        self.log(format!(
            "sixel_image({}x{},{:?})",
            image.width, image.height, bg
        ));
    }
    fn reset(&mut self) {
        let mut mode = ScreenMode::empty();
        mode.insert(ScreenMode::CURSOR | ScreenMode::WRAP);
        self.mode = mode;
        self.alternate = false;
        self.log("reset".into());
    }
    fn soft_reset(&mut self) {
        self.log("soft_reset".into());
    }
    fn full_redraw(&mut self) {
        self.log("full_redraw".into());
    }
    fn raw_string(&mut self, data: &[u8], allow_wrap: bool) {
        self.log(format!(
            "raw_string({},{})",
            String::from_utf8_lossy(data),
            allow_wrap
        ));
    }
}

/// Recording host events.
#[derive(Default)]
pub struct MockEvents {
    pub bells: usize,
    pub titles_changed: usize,
    pub renames: Vec<Option<String>>,
    pub clipboard_updates: usize,
    pub theme: Theme,
    pub pixel_cell: Option<(usize, usize)>,
    pub foreground: Color,
    pub background: Color,
}

impl HostEvents for MockEvents {
    fn bell(&mut self) {
        self.bells += 1;
    }
    fn title_changed(&mut self) {
        self.titles_changed += 1;
    }
    fn rename_window(&mut self, name: Option<&str>) {
        self.renames.push(name.map(str::to_string));
    }
    fn clipboard_updated(&mut self) {
        self.clipboard_updates += 1;
    }
    fn theme(&self) -> Theme {
        self.theme
    }
    fn pixel_cell(&self) -> Option<(usize, usize)> {
        self.pixel_cell
    }
    fn foreground(&self) -> Color {
        self.foreground
    }
    fn background(&self) -> Color {
        self.background
    }
}

/// A decoder that accepts every payload as a 1x1 image.
pub struct MockSixel {
    pub payloads: Vec<Vec<u8>>,
}

impl SixelDecoder for MockSixel {
    fn decode(
        &mut self,
        data: &[u8],
        _p2: u32,
        _xpixel: usize,
        _ypixel: usize,
    ) -> Option<SixelImage> {
        self.payloads.push(data.to_vec());
        Some(SixelImage {
            width: 1,
            height: 1,
            pixels: vec![0],
        })
    }
}

/// All collaborators plus the context under test.
pub struct Fixture {
    pub screen: MockScreen,
    pub replies: Vec<u8>,
    pub palette: ColorPalette,
    pub hyperlinks: Hyperlinks,
    pub paste: MemoryPasteStore,
    pub options: Options,
    pub events: MockEvents,
    pub ctx: InputContext,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        let ctx = InputContext::new(&options);
        Fixture {
            screen: MockScreen::new(80, 24),
            replies: Vec::new(),
            palette: ColorPalette::new(),
            hyperlinks: Hyperlinks::new(),
            paste: MemoryPasteStore::default(),
            options,
            events: MockEvents::default(),
            ctx,
        }
    }

    pub fn feed(&mut self, input: &[u8]) {
        let mut host = Host {
            screen: &mut self.screen,
            replies: &mut self.replies,
            palette: &mut self.palette,
            hyperlinks: &mut self.hyperlinks,
            paste: &mut self.paste,
            options: &self.options,
            events: &mut self.events,
            sixel: None,
        };
        self.ctx.parse(input, &mut host);
    }

    pub fn feed_with_sixel(&mut self, input: &[u8], sixel: &mut dyn SixelDecoder) {
        let mut host = Host {
            screen: &mut self.screen,
            replies: &mut self.replies,
            palette: &mut self.palette,
            hyperlinks: &mut self.hyperlinks,
            paste: &mut self.paste,
            options: &self.options,
            events: &mut self.events,
            sixel: Some(sixel),
        };
        self.ctx.parse(input, &mut host);
    }

    pub fn replies_str(&self) -> String {
        String::from_utf8_lossy(&self.replies).into_owned()
    }

    pub fn take_replies(&mut self) -> String {
        let out = self.replies_str();
        self.replies.clear();
        out
    }
}
