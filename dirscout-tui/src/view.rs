use crate::{
    input::InputField,
    styles,
    tui::{Focus, TuiState},
};
use anyhow::Result;
use dirscout_scraper::ListingRecord;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io::Stdout;
use unicode_width::UnicodeWidthStr;

const STATUS_LOG_HEIGHT: u16 = 10;

pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, state: &TuiState) -> Result<()> {
    term.draw(|frame| {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(STATUS_LOG_HEIGHT),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let header = Paragraph::new(Line::from(Span::styled(
            " dirscout: business directory scraper ",
            styles::title(),
        )));
        frame.render_widget(header, layout[0]);

        let inputs = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[1]);
        draw_input(frame, inputs[0], &state.term, state.focus == Focus::Term);
        draw_input(frame, inputs[1], &state.location, state.focus == Focus::Location);

        draw_listings(frame, layout[2], &state.listings);

        let log_area = layout[3];
        let rows = state.log.visible(
            log_area.width.saturating_sub(2) as usize,
            log_area.height.saturating_sub(2) as usize,
        );
        let items: Vec<ListItem> = rows
            .into_iter()
            .map(|(text, style)| ListItem::new(Line::from(Span::styled(text, style))))
            .collect();
        let log = List::new(items).block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(log, log_area);

        let status_line = Line::from(vec![
            Span::raw(" "),
            Span::styled(state.spinner(), styles::title()),
            Span::raw(" "),
            if state.running {
                Span::styled("Running", styles::title())
            } else {
                Span::styled("Idle", styles::saved())
            },
            Span::styled(format!(" • records: {}", state.listings.len()), styles::value()),
            Span::styled(
                if state.running {
                    "  Esc cancel • Ctrl-Q quit"
                } else {
                    "  Enter start • Tab switch field • Ctrl-Q quit"
                },
                styles::dim(),
            ),
        ]);
        let status = Paragraph::new(status_line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(status, layout[4]);
    })?;

    Ok(())
}

fn draw_input(frame: &mut Frame, area: Rect, field: &InputField, focused: bool) {
    let border = if focused { styles::focused() } else { styles::dim() };
    let widget = Paragraph::new(field.text().to_string()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!(" {} ", field.label())),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(widget, area);

    if focused {
        let caret = UnicodeWidthStr::width(&field.text()[..field.cursor()]) as u16;
        frame.set_cursor_position(Position {
            x: area.x + 1 + caret.min(area.width.saturating_sub(3)),
            y: area.y + 1,
        });
    }
}

/// Newest rows stay in view: the table shows the tail that fits.
fn draw_listings(frame: &mut Frame, area: Rect, listings: &[ListingRecord]) {
    let capacity = area.height.saturating_sub(3) as usize;
    let start = listings.len().saturating_sub(capacity);

    let rows = listings[start..].iter().enumerate().map(|(offset, record)| {
        Row::new(vec![
            Cell::from((start + offset + 1).to_string()),
            Cell::from(record.business_name.clone()),
            Cell::from(record.address.clone()),
            Cell::from(record.phone.clone()),
            Cell::from(record.website.clone()),
        ])
        .style(styles::value())
    });

    let header = Row::new(["No.", "Business Name", "Address", "Phone", "Website"])
        .style(styles::table_header());
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Length(16),
            Constraint::Fill(1),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Listings ({}) ", listings.len())),
    )
    .style(Style::default());
    frame.render_widget(table, area);
}
