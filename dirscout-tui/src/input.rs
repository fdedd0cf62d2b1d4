/// Single-line text field with a byte-offset caret that always sits on a
/// char boundary.
#[derive(Debug, Clone)]
pub struct InputField {
    label: &'static str,
    text: String,
    cursor: usize,
}

impl InputField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            text: String::new(),
            cursor: 0,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        while self.cursor > 0 && !self.text.is_char_boundary(self.cursor) {
            self.cursor -= 1;
        }
    }

    pub fn right(&mut self) {
        if self.cursor >= self.text.len() {
            return;
        }
        self.cursor += 1;
        while self.cursor < self.text.len() && !self.text.is_char_boundary(self.cursor) {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let end = self.cursor;
        self.left();
        self.text.drain(self.cursor..end);
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.text.len() {
            return;
        }
        let start = self.cursor;
        self.right();
        self.text.drain(start..self.cursor);
        self.cursor = start;
    }
}
