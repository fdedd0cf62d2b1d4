use ratatui::style::Style;
use textwrap::wrap;

#[derive(Debug, Clone)]
pub struct LogLine {
    pub text: String,
    pub style: Style,
}

/// Status messages, newest last, scrolled by an offset from the bottom.
#[derive(Debug, Default)]
pub struct StatusLog {
    lines: Vec<LogLine>,
    scroll: usize,
}

impl StatusLog {
    pub fn push(&mut self, text: impl Into<String>, style: Style) {
        self.lines.push(LogLine {
            text: text.into(),
            style,
        });
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn scroll_up(&mut self, by: usize) {
        self.scroll = self.scroll.saturating_add(by).min(self.lines.len());
    }

    pub fn scroll_down(&mut self, by: usize) {
        self.scroll = self.scroll.saturating_sub(by);
    }

    /// The rows that fit in `height` x `width` after wrapping, honouring the
    /// scroll offset.
    pub fn visible(&self, width: usize, height: usize) -> Vec<(String, Style)> {
        let wrapped = wrap_lines(&self.lines, width);
        let end = wrapped.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        wrapped[start..end].to_vec()
    }
}

fn wrap_lines(lines: &[LogLine], width: usize) -> Vec<(String, Style)> {
    let width = width.max(1);
    let mut out = Vec::new();
    for entry in lines {
        for raw in entry.text.split('\n') {
            let segments = wrap(raw, width);
            if segments.is_empty() {
                out.push((String::new(), entry.style));
            } else {
                out.extend(segments.into_iter().map(|seg| (seg.into_owned(), entry.style)));
            }
        }
    }
    out
}
