use ratatui::style::{Color, Modifier, Style};

pub fn title() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub fn focused() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub fn value() -> Style {
    Style::default().fg(Color::White)
}

pub fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn status() -> Style {
    Style::default().fg(Color::Gray)
}

pub fn saved() -> Style {
    Style::default().fg(Color::LightGreen)
}

pub fn error() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}
