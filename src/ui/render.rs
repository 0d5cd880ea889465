use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::simulation::geometry::{Bounds, Position};

/// Maps a world position to `(row, col)` of a `rows × cols` character grid.
///
/// Returns `None` outside the workspace.
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[must_use]
pub fn world_to_grid_coords(
    pos: &Position,
    bounds: &Bounds,
    rows: usize,
    cols: usize,
) -> Option<(usize, usize)> {
    if rows == 0 || cols == 0 || !bounds.contains(pos) {
        return None;
    }
    let r = ((pos.y - bounds.y_min) / bounds.height() * rows as f64) as usize;
    let c = ((pos.x - bounds.x_min) / bounds.width() * cols as f64) as usize;
    Some((r.min(rows - 1), c.min(cols - 1)))
}

/// Writes `marker` into the grid cell covering `pos`, if visible.
pub fn overlay(grid: &mut [String], pos: &Position, bounds: &Bounds, cols: usize, marker: char) {
    let rows = grid.len();
    let Some((r, c)) = world_to_grid_coords(pos, bounds, rows, cols) else {
        return;
    };
    if let Some(line) = grid.get_mut(r) {
        if c < line.len() && line.is_char_boundary(c) && line.is_char_boundary(c + 1) {
            let mut buf = [0u8; 4];
            line.replace_range(c..=c, marker.encode_utf8(&mut buf));
        }
    }
}

pub fn draw_ui(f: &mut Frame, grid_lines: Vec<String>, hud_info: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // HUD
            Constraint::Min(0),    // Field
        ])
        .split(f.area());

    let hud = Paragraph::new(Span::styled(
        hud_info,
        Style::default().add_modifier(Modifier::REVERSED),
    ));
    f.render_widget(hud, chunks[0]);

    let text: Vec<Line> = grid_lines
        .into_iter()
        .map(|s| Line::from(Span::raw(s)))
        .collect();

    let field = Paragraph::new(text)
        .block(Block::default().borders(Borders::NONE))
        .style(Style::default().fg(Color::White).bg(Color::Black));

    f.render_widget(field, chunks[1]);
}
