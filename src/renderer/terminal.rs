//! Terminal backend
//!
//! Rasterizes draw commands onto a grid of colored character cells and
//! flushes the grid with crossterm. The logical screen is stretched over
//! the whole terminal, so one cell covers `width / cols` by `height / rows`
//! screen units.

use std::io::Write;

use crossterm::{
    QueueableCommand, cursor,
    style::{self, Color, Print},
};
use glam::Vec2;

use super::palette::BLACK;
use super::{DrawCommand, Rgba, Sprite, lerp_color};
use crate::sim::{Bounds, Circle, Rect};

/// Fills fainter than this leave the cell background alone
const MIN_FILL_ALPHA: f32 = 0.02;
/// Outlines and glyphs fainter than this are skipped
const MIN_INK_ALPHA: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgba,
    pub bg: Rgba,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: BLACK,
            bg: BLACK,
        }
    }
}

/// Character-cell render target
pub struct TerminalCanvas {
    cols: u16,
    rows: u16,
    bounds: Bounds,
    cells: Vec<Cell>,
}

impl TerminalCanvas {
    pub fn new(cols: u16, rows: u16, bounds: Bounds) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            bounds,
            cells: vec![Cell::default(); cols as usize * rows as usize],
        }
    }

    /// Match a resized terminal
    pub fn resize(&mut self, cols: u16, rows: u16) {
        *self = Self::new(cols, rows, self.bounds);
    }

    fn cell_size(&self) -> Vec2 {
        Vec2::new(
            self.bounds.width / self.cols as f32,
            self.bounds.height / self.rows as f32,
        )
    }

    /// Screen position of a cell's center (used to map the mouse back)
    pub fn to_logical(&self, col: u16, row: u16) -> Vec2 {
        (Vec2::new(col as f32, row as f32) + 0.5) * self.cell_size()
    }

    /// Cell containing a screen position, if it is on the grid
    pub fn to_cell(&self, pos: Vec2) -> Option<(u16, u16)> {
        let cell = pos / self.cell_size();
        if cell.x < 0.0 || cell.y < 0.0 {
            return None;
        }
        let (col, row) = (cell.x as u32, cell.y as u32);
        if col >= self.cols as u32 || row >= self.rows as u32 {
            return None;
        }
        Some((col as u16, row as u16))
    }

    pub fn cell(&self, col: u16, row: u16) -> Option<&Cell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells.get(row as usize * self.cols as usize + col as usize)
    }

    fn cell_mut(&mut self, col: u16, row: u16) -> Option<&mut Cell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells.get_mut(row as usize * self.cols as usize + col as usize)
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    fn put(&mut self, col: u16, row: u16, ch: char, color: Rgba) {
        if color[3] < MIN_INK_ALPHA {
            return;
        }
        if let Some(cell) = self.cell_mut(col, row) {
            cell.ch = ch;
            cell.fg = color;
        }
    }

    fn put_at(&mut self, pos: Vec2, ch: char, color: Rgba) {
        if let Some((col, row)) = self.to_cell(pos) {
            self.put(col, row, ch, color);
        }
    }

    fn tint(&mut self, col: u16, row: u16, color: Rgba) {
        if color[3] < MIN_FILL_ALPHA {
            return;
        }
        if let Some(cell) = self.cell_mut(col, row) {
            cell.bg = lerp_color(cell.bg, [color[0], color[1], color[2], 1.0], color[3]);
        }
    }

    /// Cells whose centers fall inside `rect`
    fn cells_in(&self, rect: &Rect) -> impl Iterator<Item = (u16, u16)> + use<> {
        let size = self.cell_size();
        let col0 = (rect.min.x / size.x).floor().max(0.0) as u16;
        let row0 = (rect.min.y / size.y).floor().max(0.0) as u16;
        let col1 = ((rect.max.x / size.x).ceil().max(0.0) as u16).min(self.cols);
        let row1 = ((rect.max.y / size.y).ceil().max(0.0) as u16).min(self.rows);
        (row0..row1).flat_map(move |row| (col0..col1).map(move |col| (col, row)))
    }

    /// Rasterize a whole frame
    pub fn draw(&mut self, frame: &[DrawCommand]) {
        self.clear();
        for command in frame {
            self.draw_command(command);
        }
    }

    pub fn draw_command(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::Gradient { rect, top, bottom } => {
                let cells: Vec<_> = self.cells_in(rect).collect();
                for (col, row) in cells {
                    let y = self.to_logical(col, row).y;
                    let t = ((y - rect.min.y) / rect.height().max(1.0)).clamp(0.0, 1.0);
                    self.tint(col, row, lerp_color(*top, *bottom, t));
                }
            }
            DrawCommand::FillRect { rect, color } => {
                let cells: Vec<_> = self.cells_in(rect).collect();
                for (col, row) in cells {
                    self.tint(col, row, *color);
                }
            }
            DrawCommand::Circle {
                circle,
                fill,
                outline,
            } => self.draw_circle(circle, *fill, *outline),
            DrawCommand::Sprite {
                sprite,
                center,
                size,
                tint,
                ..
            } => self.draw_sprite(*sprite, *center, *size, *tint),
            DrawCommand::Square { center, fill, .. } => self.put_at(*center, '.', *fill),
            DrawCommand::Star {
                center,
                radius,
                color,
            } => {
                let ch = if *radius > 6.0 { '+' } else { '.' };
                self.put_at(*center, ch, *color);
            }
            DrawCommand::Text {
                text, center, color, ..
            } => self.draw_text(text, *center, *color),
        }
    }

    fn draw_circle(&mut self, circle: &Circle, fill: Option<Rgba>, outline: Option<(f32, Rgba)>) {
        let half_cell = self.cell_size().max_element() / 2.0;
        let area = Rect {
            min: circle.center - Vec2::splat(circle.radius + half_cell),
            max: circle.center + Vec2::splat(circle.radius + half_cell),
        };
        let cells: Vec<_> = self.cells_in(&area).collect();
        for (col, row) in cells {
            let d = self.to_logical(col, row).distance(circle.center);
            if let Some(color) = fill {
                if d <= circle.radius {
                    self.tint(col, row, color);
                }
            }
            if let Some((_, color)) = outline {
                if (d - circle.radius).abs() <= half_cell {
                    self.put(col, row, '.', color);
                }
            }
        }
    }

    fn draw_sprite(&mut self, sprite: Sprite, center: Vec2, size: f32, tint: Rgba) {
        let ch = match sprite {
            Sprite::Meteorite => '@',
            Sprite::ReturnBullet => '%',
            Sprite::Player => '>',
        };
        // Sprites are drawn larger than their hitbox; fill the hitbox only
        let radius = size / 2.5;
        let area = Rect {
            min: center - Vec2::splat(radius),
            max: center + Vec2::splat(radius),
        };
        let cells: Vec<_> = self.cells_in(&area).collect();
        for (col, row) in cells {
            if self.to_logical(col, row).distance(center) <= radius {
                self.put(col, row, ch, tint);
            }
        }
        self.put_at(center, ch, tint);
    }

    fn draw_text(&mut self, text: &str, center: Vec2, color: Rgba) {
        let Some((col, row)) = self.to_cell(center) else {
            return;
        };
        let len = text.chars().count() as i32;
        let start = col as i32 - len / 2;
        for (i, ch) in text.chars().enumerate() {
            let c = start + i as i32;
            if (0..self.cols as i32).contains(&c) {
                self.put(c as u16, row, ch, color);
            }
        }
    }

    /// Write the grid to the terminal
    pub fn flush<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let mut last: Option<(Color, Color)> = None;
        for row in 0..self.rows {
            out.queue(cursor::MoveTo(0, row))?;
            for col in 0..self.cols {
                let Some(cell) = self.cell(col, row) else {
                    continue;
                };
                let colors = (to_terminal_color(cell.fg), to_terminal_color(cell.bg));
                if last != Some(colors) {
                    out.queue(style::SetForegroundColor(colors.0))?;
                    out.queue(style::SetBackgroundColor(colors.1))?;
                    last = Some(colors);
                }
                out.queue(Print(cell.ch))?;
            }
        }
        out.queue(style::ResetColor)?;
        out.flush()
    }
}

/// Premultiply against black and quantize
fn to_terminal_color(color: Rgba) -> Color {
    let channel = |c: f32| ((c * color[3]).clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: channel(color[0]),
        g: channel(color[1]),
        b: channel(color[2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::palette::{LIME, RED, WHITE};

    fn canvas() -> TerminalCanvas {
        // 10x10 screen units per cell
        TerminalCanvas::new(80, 60, Bounds::new(800.0, 600.0))
    }

    #[test]
    fn test_coordinate_mapping() {
        let canvas = canvas();
        assert_eq!(canvas.to_logical(0, 0), Vec2::new(5.0, 5.0));
        assert_eq!(canvas.to_cell(Vec2::new(799.0, 599.0)), Some((79, 59)));
        assert_eq!(canvas.to_cell(Vec2::new(800.0, 10.0)), None);
        assert_eq!(canvas.to_cell(Vec2::new(-1.0, 10.0)), None);
    }

    #[test]
    fn test_text_is_centered() {
        let mut canvas = canvas();
        canvas.draw(&[DrawCommand::Text {
            text: "ABCD".into(),
            center: Vec2::new(400.0, 300.0),
            size: 16.0,
            color: WHITE,
            outlined: false,
        }]);
        assert_eq!(canvas.cell(38, 30).map(|c| c.ch), Some('A'));
        assert_eq!(canvas.cell(41, 30).map(|c| c.ch), Some('D'));
        assert_eq!(canvas.cell(42, 30).map(|c| c.ch), Some(' '));
    }

    #[test]
    fn test_circle_outline() {
        let mut canvas = canvas();
        canvas.draw(&[DrawCommand::Circle {
            circle: Circle::new(Vec2::new(405.0, 305.0), 50.0),
            fill: None,
            outline: Some((2.0, LIME)),
        }]);
        // On the rim
        assert_eq!(canvas.cell(45, 30).map(|c| c.ch), Some('.'));
        // Center untouched
        assert_eq!(canvas.cell(40, 30).map(|c| c.ch), Some(' '));
    }

    #[test]
    fn test_faint_ink_is_skipped() {
        let mut canvas = canvas();
        canvas.draw(&[DrawCommand::Star {
            center: Vec2::new(15.0, 15.0),
            radius: 3.0,
            color: [1.0, 1.0, 1.0, 0.05],
        }]);
        assert_eq!(canvas.cell(1, 1).map(|c| c.ch), Some(' '));
    }

    #[test]
    fn test_fill_tints_background() {
        let mut canvas = canvas();
        canvas.draw(&[DrawCommand::FillRect {
            rect: Rect::new(0.0, 0.0, 800.0, 600.0),
            color: [1.0, 0.0, 0.0, 0.4],
        }]);
        let cell = canvas.cell(10, 10).copied().unwrap_or_default();
        assert!((cell.bg[0] - 0.4).abs() < 1e-5);
        assert_eq!(cell.bg[1], 0.0);
        assert_eq!(to_terminal_color(RED), Color::Rgb { r: 255, g: 0, b: 0 });
    }

    #[test]
    fn test_sprite_covers_hitbox() {
        let mut canvas = canvas();
        canvas.draw(&[DrawCommand::Sprite {
            sprite: Sprite::Meteorite,
            center: Vec2::new(405.0, 305.0),
            size: 50.0,
            rotation: 0.0,
            tint: WHITE,
        }]);
        assert_eq!(canvas.cell(40, 30).map(|c| c.ch), Some('@'));
        assert_eq!(canvas.cell(42, 30).map(|c| c.ch), Some('@'));
        assert_eq!(canvas.cell(43, 30).map(|c| c.ch), Some(' '));
    }

    #[test]
    fn test_flush_writes_every_cell() {
        let mut canvas = TerminalCanvas::new(4, 2, Bounds::new(40.0, 20.0));
        canvas.draw(&[DrawCommand::Text {
            text: "hi".into(),
            center: Vec2::new(20.0, 5.0),
            size: 12.0,
            color: WHITE,
            outlined: false,
        }]);
        let mut out = Vec::new();
        canvas.flush(&mut out).unwrap();
        let written = String::from_utf8_lossy(&out);
        assert!(written.contains('h') && written.contains('i'));
    }
}
