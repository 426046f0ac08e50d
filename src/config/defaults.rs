use console::style;

use super::types::Configuration;

/// Terminal color used for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Color {
    /// No styling. What a configuration carries before defaults are applied.
    #[default]
    Plain,
    Green,
    Red,
}

impl Color {
    /// Raw ANSI escape sequence that switches the terminal to this color.
    pub fn ansi(self) -> &'static str {
        match self {
            Color::Plain => "",
            Color::Green => "\x1b[32m",
            Color::Red => "\x1b[31m",
        }
    }

    fn console(self) -> Option<console::Color> {
        match self {
            Color::Plain => None,
            Color::Green => Some(console::Color::Green),
            Color::Red => Some(console::Color::Red),
        }
    }
}

/// What a diagnostic line is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Colors {
    pub success: Color,
    pub failure: Color,
}

impl Colors {
    pub fn get(&self, tone: Tone) -> Color {
        match tone {
            Tone::Success => self.success,
            Tone::Failure => self.failure,
        }
    }

    /// Style `text` for the terminal. `console` only emits the escape codes
    /// (`\x1b[32m`, `\x1b[31m`) when stdout is a tty; piped output is plain.
    pub fn paint(&self, tone: Tone, text: &str) -> String {
        match self.get(tone).console() {
            Some(color) => style(text).fg(color).to_string(),
            None => text.to_string(),
        }
    }
}

/// Fill in the presentation defaults. Only the color fields are touched.
pub fn apply_defaults(config: &mut Configuration) {
    config.colors = Colors {
        success: Color::Green,
        failure: Color::Red,
    };
}
