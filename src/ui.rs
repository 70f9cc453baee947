use crate::app::App;
use crate::display::{body_wireframe, format_readout};
use crate::motors::percent;
use crate::surface::{Control, ControlSurface, Readout};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::canvas::{Canvas, Line as CanvasLine},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
};

// Rows plus borders and the table header.
fn history_height(capacity: usize) -> u16 {
    u16::try_from(capacity).unwrap_or(u16::MAX).saturating_add(3)
}

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(18),   // Attitude + motors
            Constraint::Length(history_height(app.state.log().capacity())),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled("Quad Dashboard", Style::default().fg(Color::Cyan)),
        Span::raw(format!(
            " | {} | samples {} | commands {} | ",
            app.device_url, app.samples_received, app.commands_sent
        )),
        Span::styled(
            "Tab/arrows adjust, Space stop, c recalibrate, q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_attitude(frame, body[0], app);
    draw_motors(frame, body[1], app);
    draw_history(frame, chunks[2], app);
}

fn draw_attitude(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(area);

    // Terminal cells are roughly twice as tall as they are wide.
    let aspect = if chunks[0].height > 0 {
        chunks[0].width as f64 / (chunks[0].height as f64 * 2.0)
    } else {
        1.0
    };
    let edges = body_wireframe(app.state.attitude(), aspect);

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title("Attitude"))
        .paint(move |ctx| {
            for &((x1, y1), (x2, y2)) in &edges {
                ctx.draw(&CanvasLine {
                    x1,
                    y1,
                    x2,
                    y2,
                    color: Color::LightBlue,
                });
            }
        })
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0]);
    frame.render_widget(canvas, chunks[0]);

    let readouts = Paragraph::new(Line::from(vec![
        Span::raw("Pitch: "),
        Span::styled(
            format!("{}°", app.state.readout(Readout::Pitch)),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("   Roll: "),
        Span::styled(
            format!("{}°", app.state.readout(Readout::Roll)),
            Style::default().fg(Color::Yellow),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(readouts, chunks[1]);
}

fn draw_motors(frame: &mut Frame, area: Rect, app: &App) {
    let mut constraints = vec![Constraint::Length(3); Control::ALL.len()];
    constraints.push(Constraint::Length(3));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, control) in Control::ALL.into_iter().enumerate() {
        let value = app.state.read_channel(control);
        let focused = control == app.focused();
        let color = match control {
            Control::Master => Color::Magenta,
            Control::Motor(_) => Color::Green,
        };
        let title_style = if focused {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if focused { "> " } else { "  " };

        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(format!("{}{}", marker, control.name()), title_style)),
            )
            .gauge_style(Style::default().fg(color))
            .percent(percent(value) as u16)
            .label(format!("{} ({})", app.state.label(control), value));
        frame.render_widget(gauge, chunks[i]);
    }

    let button_style = if app.recalibrate.is_calibrating() {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let buttons = Paragraph::new(Line::from(vec![
        Span::styled(format!("[c] {}", app.recalibrate.label()), button_style),
        Span::raw("   "),
        Span::styled(
            "[Space] EMERGENCY STOP",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Actions"));
    frame.render_widget(buttons, chunks[Control::ALL.len()]);
}

fn draw_history(frame: &mut Frame, area: Rect, app: &App) {
    let log = app.state.log();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("History {}/{}", log.len(), log.capacity()));

    if log.is_empty() {
        let waiting = Paragraph::new("Waiting for telemetry...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(waiting, area);
        return;
    }

    let rows: Vec<Row> = log
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.time.clone()),
                Cell::from(format_readout(row.pitch)),
                Cell::from(format_readout(row.roll)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec!["Time", "Pitch", "Roll"]).style(Style::default().fg(Color::Cyan)),
    )
    .block(block);
    frame.render_widget(table, area);
}
