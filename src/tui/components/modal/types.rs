//! Core modal types
//!
//! Visibility states, configuration, style overrides, and layout
//! calculation for the modal overlay.

use ratatui::layout::Rect;
use ratatui::style::Color;
use std::collections::HashMap;
use std::str::FromStr;

/// Visibility of a modal overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalVisibility {
    #[default]
    Hidden,
    Visible,
}

/// Modal size relative to the mounted area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalSize {
    /// Percentage of available area (width_pct, height_pct)
    Percentage(u16, u16),
    /// Fixed size in characters (width, height)
    Fixed(u16, u16),
    FullScreen,
}

impl Default for ModalSize {
    fn default() -> Self {
        Self::Percentage(80, 70)
    }
}

/// Modal configuration options
#[derive(Debug, Clone)]
pub struct ModalConfig {
    /// Whether a close hint is drawn in the title bar
    pub show_close_button: bool,
    /// Whether the dialog-close affordance (Esc) hides the modal
    pub closable: bool,
    pub has_border: bool,
    pub size: ModalSize,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            show_close_button: false,
            closable: true,
            has_border: true,
            size: ModalSize::default(),
        }
    }
}

impl ModalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_close_button(mut self, show: bool) -> Self {
        self.show_close_button = show;
        self
    }

    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = closable;
        self
    }

    pub fn with_border(mut self, has_border: bool) -> Self {
        self.has_border = has_border;
        self
    }

    pub fn with_size(mut self, size: ModalSize) -> Self {
        self.size = size;
        self
    }
}

/// Style overrides for the modal content container
///
/// Accepts CSS-like `key: value;` declarations. Keys are lowercased; values
/// are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalStyles {
    raw: String,
    properties: HashMap<String, String>,
}

impl ModalStyles {
    pub fn parse(css: &str) -> Self {
        let properties = css
            .split(';')
            .filter_map(|declaration| {
                let (key, value) = declaration.split_once(':')?;
                let key = key.trim().to_lowercase();
                let value = value.trim();
                if key.is_empty() || value.is_empty() {
                    None
                } else {
                    Some((key, value.to_string()))
                }
            })
            .collect();

        Self {
            raw: css.to_string(),
            properties,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn border_color(&self) -> Option<Color> {
        self.color("border-color")
    }

    pub fn foreground(&self) -> Option<Color> {
        self.color("color")
    }

    pub fn background(&self) -> Option<Color> {
        self.color("background").or_else(|| self.color("background-color"))
    }

    fn color(&self, key: &str) -> Option<Color> {
        self.get(key).and_then(|value| Color::from_str(value).ok())
    }
}

/// Areas of a mounted, visible modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalLayout {
    /// Modal area including border
    pub container: Rect,
    /// Slotted header region, present once revealed
    pub tagline: Option<Rect>,
    pub content: Rect,
    /// Slotted footer region, present once revealed
    pub footer: Option<Rect>,
}

impl ModalLayout {
    pub fn calculate(
        config: &ModalConfig,
        available_area: Rect,
        tagline_revealed: bool,
        footer_revealed: bool,
    ) -> Self {
        let (width, height) = Self::calculate_size(config, available_area);
        let container = Rect {
            x: available_area.x + available_area.width.saturating_sub(width) / 2,
            y: available_area.y + available_area.height.saturating_sub(height) / 2,
            width,
            height,
        };

        let mut inner = if config.has_border {
            Rect {
                x: container.x + 1,
                y: container.y + 1,
                width: container.width.saturating_sub(2),
                height: container.height.saturating_sub(2),
            }
        } else {
            container
        };

        let tagline = if tagline_revealed && inner.height > 0 {
            let row = Rect { height: 1, ..inner };
            inner.y += 1;
            inner.height -= 1;
            Some(row)
        } else {
            None
        };

        let footer = if footer_revealed && inner.height > 0 {
            inner.height -= 1;
            Some(Rect {
                y: inner.y + inner.height,
                height: 1,
                ..inner
            })
        } else {
            None
        };

        Self {
            container,
            tagline,
            content: inner,
            footer,
        }
    }

    fn calculate_size(config: &ModalConfig, available_area: Rect) -> (u16, u16) {
        match config.size {
            ModalSize::Percentage(w_pct, h_pct) => (
                (available_area.width as u32 * w_pct.min(100) as u32 / 100) as u16,
                (available_area.height as u32 * h_pct.min(100) as u32 / 100) as u16,
            ),
            ModalSize::Fixed(w, h) => (w.min(available_area.width), h.min(available_area.height)),
            ModalSize::FullScreen => (available_area.width, available_area.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_parse_declarations() {
        let styles = ModalStyles::parse("Border-Color: red; background: #202020;; color:");

        assert_eq!(styles.get("border-color"), Some("red"));
        assert_eq!(styles.border_color(), Some(Color::Red));
        assert_eq!(styles.background(), Some(Color::Rgb(0x20, 0x20, 0x20)));
        assert_eq!(styles.foreground(), None);
        assert_eq!(styles.raw(), "Border-Color: red; background: #202020;; color:");
    }

    #[test]
    fn test_unknown_color_is_ignored() {
        let styles = ModalStyles::parse("border-color: not-a-color");
        assert_eq!(styles.get("border-color"), Some("not-a-color"));
        assert_eq!(styles.border_color(), None);
    }

    #[test]
    fn test_layout_centers_and_reserves_slots() {
        let config = ModalConfig::new().with_size(ModalSize::Fixed(40, 12));
        let area = Rect::new(0, 0, 100, 30);

        let bare = ModalLayout::calculate(&config, area, false, false);
        assert_eq!(bare.container, Rect::new(30, 9, 40, 12));
        assert_eq!(bare.content, Rect::new(31, 10, 38, 10));
        assert!(bare.tagline.is_none() && bare.footer.is_none());

        let slotted = ModalLayout::calculate(&config, area, true, true);
        assert_eq!(slotted.tagline, Some(Rect::new(31, 10, 38, 1)));
        assert_eq!(slotted.content, Rect::new(31, 11, 38, 8));
        assert_eq!(slotted.footer, Some(Rect::new(31, 19, 38, 1)));
    }

    #[test]
    fn test_percentage_size() {
        let config = ModalConfig::new().with_size(ModalSize::Percentage(50, 50));
        let layout = ModalLayout::calculate(&config, Rect::new(0, 0, 80, 20), false, false);
        assert_eq!((layout.container.width, layout.container.height), (40, 10));
    }
}
