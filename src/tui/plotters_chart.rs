//! Plotters-powered forecast chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`, which gives axis and mesh rendering for free.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::{ChartData, fmt_value, fmt_year};

/// Terminal palette, shared with the legend line drawn by the viewer.
pub const TRAIN_RGB: (u8, u8, u8) = (0, 170, 255);
pub const TEST_RGB: (u8, u8, u8) = (0, 255, 0);
pub const FORECAST_RGB: (u8, u8, u8) = (255, 80, 80);

/// Render-only chart over precomputed series and bounds.
pub struct ForecastChart<'a> {
    pub data: &'a ChartData,
    pub show_grid: bool,
}

impl Widget for ForecastChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters cannot lay out a chart this small.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.data.x_bounds;
        let [y0, y1] = self.data.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let data = self.data;
        let show_grid = self.show_grid;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            let mut mesh = chart.configure_mesh();
            if !show_grid {
                mesh.disable_x_mesh().disable_y_mesh();
            }
            mesh.x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_year(*v))
                .y_label_formatter(&|v| fmt_value(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(WHITE)
                .bold_line_style(RGBColor(90, 90, 90))
                .light_line_style(TRANSPARENT)
                .draw()?;

            let rgb = |(r, g, b): (u8, u8, u8)| RGBColor(r, g, b);
            chart.draw_series(LineSeries::new(data.forecast.iter().copied(), rgb(FORECAST_RGB)))?;
            chart.draw_series(LineSeries::new(data.train.iter().copied(), rgb(TRAIN_RGB)))?;
            chart.draw_series(LineSeries::new(data.test.iter().copied(), rgb(TEST_RGB)))?;

            // `Circle` radii are mis-scaled by the ratatui backend; pixels are reliable.
            for (points, color) in [(&data.train, rgb(TRAIN_RGB)), (&data.test, rgb(TEST_RGB))] {
                chart.draw_series(points.iter().map(|&p| Pixel::new(p, color)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> ChartData {
        ChartData {
            train: (0..12).map(|i| (2023.0 + i as f64 / 12.0, 100.0 + i as f64)).collect(),
            test: vec![(2024.0, 113.0), (2024.0833, 114.0)],
            forecast: (0..16).map(|i| (2023.0 + i as f64 / 12.0, 100.5 + i as f64)).collect(),
            x_bounds: [2023.0, 2024.25],
            y_bounds: [95.0, 120.0],
        }
    }

    #[test]
    fn small_area_shows_hint() {
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        ForecastChart { data: &data(), show_grid: true }.render(area, &mut buf);

        let first_row: String = (0..area.width).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(first_row.starts_with("Chart area too small"));
    }

    #[test]
    fn draws_into_a_normal_sized_buffer() {
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        ForecastChart { data: &data(), show_grid: false }.render(area, &mut buf);

        let drawn = buf.content().iter().filter(|cell| cell.symbol() != " ").count();
        assert!(drawn > 0);
    }
}
