//! SVG chart output via Plotters' SVG backend.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::error::AppError;
use crate::plot::{CHART_TITLE, ChartData, FORECAST_LABEL, TEST_LABEL, TRAIN_LABEL, fmt_value, fmt_year};

pub const SVG_SIZE: (u32, u32) = (1200, 600);

const TRAIN_COLOR: RGBColor = RGBColor(31, 119, 180);
const TEST_COLOR: RGBColor = RGBColor(44, 160, 44);
const FORECAST_COLOR: RGBColor = RGBColor(214, 39, 40);

/// Write the chart to an SVG file.
pub fn write_svg_chart(path: &Path, data: &ChartData) -> Result<(), AppError> {
    draw(path, data).map_err(|e| AppError::render(format!("Failed to render SVG '{}': {e}", path.display())))?;
    info!(path = %path.display(), "wrote SVG chart");
    Ok(())
}

fn draw(path: &Path, data: &ChartData) -> Result<(), Box<dyn Error>> {
    let [x0, x1] = data.x_bounds;
    let [y0, y1] = data.y_bounds;

    let root = SVGBackend::new(path, SVG_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 28).into_font())
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(70)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_labels(10)
        .y_labels(8)
        .x_label_formatter(&|v| fmt_year(*v))
        .y_label_formatter(&|v| fmt_value(*v))
        .x_desc("Date")
        .y_desc("Budget")
        .light_line_style(BLACK.mix(0.08))
        .draw()?;

    for (label, points, color) in [
        (TRAIN_LABEL, &data.train, TRAIN_COLOR),
        (TEST_LABEL, &data.test, TEST_COLOR),
        (FORECAST_LABEL, &data.forecast, FORECAST_COLOR),
    ] {
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    // Observations get markers so gaps between train and test stay visible.
    for (points, color) in [(&data.train, TRAIN_COLOR), (&data.test, TEST_COLOR)] {
        chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}
