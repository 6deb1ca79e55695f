//! Ratatui-based forecast viewer.
//!
//! Shows the run header (backend, split, hold-out metrics), a legend, and the
//! Plotters chart in the alternate screen until the user quits.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::debug;

use crate::domain::RunOutput;
use crate::error::AppError;
use crate::plot::{CHART_TITLE, ChartData, FORECAST_LABEL, TEST_LABEL, TRAIN_LABEL};
use crate::report::format_metrics;

mod plotters_chart;

use plotters_chart::{FORECAST_RGB, ForecastChart, TEST_RGB, TRAIN_RGB};

/// Open the chart in the terminal and block until `q`/`Esc`.
pub fn show(run: &RunOutput) -> Result<(), AppError> {
    let data = ChartData::from_run(run)?;
    let mut viewer = Viewer::new(run, data);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::render(format!("Failed to initialize terminal: {e}")))?;

    viewer.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::render(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::render(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct Viewer<'a> {
    run: &'a RunOutput,
    data: ChartData,
    show_grid: bool,
}

impl<'a> Viewer<'a> {
    fn new(run: &'a RunOutput, data: ChartData) -> Self {
        Self {
            run,
            data,
            show_grid: true,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::render(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::render(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::render(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        debug!("viewer closed");
        Ok(())
    }

    /// Returns `true` when the viewer should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('g') => self.show_grid = !self.show_grid,
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let run = self.run;
        let title = Line::from(Span::styled(
            format!("{CHART_TITLE} ({})", run.forecast.backend),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let stats = Line::from(Span::styled(
            format!(
                "train n={} | test n={} | forecast n={} | {}",
                run.split.train.len(),
                run.split.test.len(),
                run.forecast.len(),
                format_metrics(run.metrics.as_ref()).trim_end(),
            ),
            Style::default().fg(Color::Gray),
        ));

        let p = Paragraph::new(Text::from(vec![title, stats])).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(legend_line()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        frame.render_widget(
            ForecastChart {
                data: &self.data,
                show_grid: self.show_grid,
            },
            inner,
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let grid = if self.show_grid { "on" } else { "off" };
        let help = format!("g grid ({grid})  q/Esc quit");
        let p = Paragraph::new(Line::from(Span::styled(help, Style::default().fg(Color::Gray))))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn legend_line() -> Line<'static> {
    let swatch = |label: &'static str, (r, g, b): (u8, u8, u8)| {
        Span::styled(format!(" ━ {label} "), Style::default().fg(Color::Rgb(r, g, b)))
    };
    Line::from(vec![
        swatch(TRAIN_LABEL, TRAIN_RGB),
        swatch(TEST_LABEL, TEST_RGB),
        swatch(FORECAST_LABEL, FORECAST_RGB),
    ])
}
