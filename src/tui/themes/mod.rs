//! Theme definitions for the selection widget
//!
//! Semantic colors shared by the widget and its modal overlay. Two presets
//! are provided; hosts may build their own.

use ratatui::style::{Color, Modifier, Style};

/// Theme represents a complete visual style configuration
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub is_dark: bool,

    pub primary: Color,
    pub accent: Color,

    pub bg_base: Color,
    pub bg_overlay: Color,

    pub fg_base: Color,
    pub fg_muted: Color,
    pub fg_selected: Color,

    pub border: Color,
    pub border_focus: Color,

    pub error: Color,
}

impl Theme {
    /// Dark preset
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            is_dark: true,
            primary: Color::Rgb(0x8A, 0x67, 0xFF),
            accent: Color::Rgb(0xFF, 0xA5, 0x00),
            bg_base: Color::Rgb(0x2D, 0x2D, 0x2D),
            bg_overlay: Color::Rgb(0x3A, 0x3A, 0x3A),
            fg_base: Color::Rgb(0xD0, 0xD0, 0xD0),
            fg_muted: Color::Rgb(0xA0, 0xA0, 0xA0),
            fg_selected: Color::Rgb(0xF5, 0xF5, 0xF5),
            border: Color::Rgb(0x4A, 0x4A, 0x4A),
            border_focus: Color::Rgb(0x8A, 0x67, 0xFF),
            error: Color::Rgb(0xF4, 0x43, 0x36),
        }
    }

    /// Light preset
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            is_dark: false,
            primary: Color::Rgb(0x67, 0x3A, 0xB7),
            accent: Color::Rgb(0xD3, 0x2F, 0x2F),
            bg_base: Color::Rgb(0xFD, 0xFD, 0xFD),
            bg_overlay: Color::Rgb(0xE8, 0xEA, 0xED),
            fg_base: Color::Rgb(0x20, 0x20, 0x20),
            fg_muted: Color::Rgb(0x5F, 0x63, 0x68),
            fg_selected: Color::Rgb(0xFF, 0xFF, 0xFF),
            border: Color::Rgb(0xDA, 0xDD, 0xE1),
            border_focus: Color::Rgb(0x67, 0x3A, 0xB7),
            error: Color::Rgb(0xC6, 0x28, 0x28),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.fg_base)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.fg_muted)
    }

    pub fn highlighted(&self) -> Style {
        Style::default()
            .fg(self.fg_selected)
            .bg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focus)
        } else {
            Style::default().fg(self.border)
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
