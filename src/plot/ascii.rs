//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid with deterministic output (golden-tested).
//!
//! Plot elements:
//! - train observations: `o`
//! - test observations: `x`
//! - forecast: `-` line
//! - horizontal grid lines: `.`

use crate::plot::{CHART_TITLE, ChartData, FORECAST_LABEL, TEST_LABEL, TRAIN_LABEL, fmt_value, fmt_year};

const LABEL_WIDTH: usize = 9;
const GRID: char = '.';

/// Render the chart as text, `width` x `height` plot cells plus axes.
pub fn render_ascii_chart(data: &ChartData, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let [x0, x1] = data.x_bounds;
    let [y0, y1] = data.y_bounds;

    let mut grid = vec![vec![' '; width]; height];
    let rows = grid_rows(height);
    for &r in &rows {
        for c in (0..width).step_by(2) {
            grid[r][c] = GRID;
        }
    }

    // Forecast first so observations overlay it.
    let mut prev = None;
    for &(x, y) in &data.forecast {
        let cell = (map_x(x, x0, x1, width), map_y(y, y0, y1, height));
        match prev {
            Some(from) => draw_line(&mut grid, from, cell, '-'),
            None => grid[cell.1][cell.0] = '-',
        }
        prev = Some(cell);
    }
    for (series, ch) in [(&data.train, 'o'), (&data.test, 'x')] {
        for &(x, y) in series.iter() {
            grid[map_y(y, y0, y1, height)][map_x(x, x0, x1, width)] = ch;
        }
    }

    let mut out = String::new();
    out.push_str(CHART_TITLE);
    out.push('\n');
    out.push_str(&format!("Legend: o {TRAIN_LABEL}  x {TEST_LABEL}  - {FORECAST_LABEL}\n"));

    for (r, row) in grid.into_iter().enumerate() {
        let label = if rows.contains(&r) {
            let value = y1 - (r as f64 / (height as f64 - 1.0)) * (y1 - y0);
            fmt_value(value)
        } else {
            String::new()
        };
        let line = format!("{label:>LABEL_WIDTH$} |{}", row.into_iter().collect::<String>());
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out.push_str(&format!("{:>LABEL_WIDTH$} +{}\n", "", "-".repeat(width)));
    let (left, right) = (fmt_year(x0), fmt_year(x1));
    let gap = width.saturating_sub(left.len() + right.len()).max(1);
    out.push_str(&format!("{:>LABEL_WIDTH$}  {left}{}{right}\n", "", " ".repeat(gap)));

    out
}

/// Rows holding a horizontal grid line (top, quarters, bottom).
fn grid_rows(height: usize) -> Vec<usize> {
    let mut rows: Vec<usize> = (0..=4)
        .map(|i| ((i as f64) * (height as f64 - 1.0) / 4.0).round() as usize)
        .collect();
    rows.dedup();
    rows
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (max value).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only blank or grid cells are overwritten.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize))
            && (*cell == ' ' || *cell == GRID)
        {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
