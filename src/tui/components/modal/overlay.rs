//! Modal overlay
//!
//! A reusable visibility controller for confirmation dialogs. The overlay
//! knows nothing about what it hosts: it shows and hides, carries an
//! optional header string, and reveals its slotted tagline and footer
//! regions once the host reports that content arrived.
//!
//! Transitions act on a mounted frame. Until the host mounts the overlay
//! (first render, or an explicit [`ModalOverlay::mount`]), they are no-ops.

use super::types::{ModalConfig, ModalLayout, ModalStyles, ModalVisibility};
use crate::tui::{themes::Theme, Frame};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    widgets::{block::Title, Block, Borders, Clear},
};
use tracing::debug;

/// Structural handle acquired at mount time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MountedFrame {
    area: Rect,
    tagline_revealed: bool,
    footer_revealed: bool,
}

impl MountedFrame {
    fn is_usable(&self) -> bool {
        self.area.width > 0 && self.area.height > 0
    }
}

#[derive(Debug, Clone)]
pub struct ModalOverlay {
    config: ModalConfig,
    visibility: ModalVisibility,
    header: Option<String>,
    has_header_string: bool,
    styles: ModalStyles,
    frame: Option<MountedFrame>,
}

impl ModalOverlay {
    pub fn new(config: ModalConfig) -> Self {
        Self {
            config,
            visibility: ModalVisibility::Hidden,
            header: None,
            has_header_string: false,
            styles: ModalStyles::default(),
            frame: None,
        }
    }

    pub fn config(&self) -> &ModalConfig {
        &self.config
    }

    /// Attach the overlay to the area it may cover. Remounting keeps the
    /// reveal state of the slotted regions.
    pub fn mount(&mut self, area: Rect) {
        match &mut self.frame {
            Some(frame) => frame.area = area,
            None => {
                debug!("Modal mounted at {:?}", area);
                self.frame = Some(MountedFrame {
                    area,
                    tagline_revealed: false,
                    footer_revealed: false,
                });
            }
        }
    }

    pub fn unmount(&mut self) {
        self.frame = None;
        self.visibility = ModalVisibility::Hidden;
    }

    pub fn is_mounted(&self) -> bool {
        self.frame.as_ref().is_some_and(MountedFrame::is_usable)
    }

    fn mounted_frame(&mut self) -> Option<&mut MountedFrame> {
        self.frame.as_mut().filter(|frame| frame.is_usable())
    }

    /// Show the modal. Returns false when nothing is mounted yet.
    pub fn show(&mut self) -> bool {
        if self.mounted_frame().is_none() {
            debug!("Modal show requested before mount");
            return false;
        }
        self.visibility = ModalVisibility::Visible;
        true
    }

    /// Hide the modal. Returns false when nothing is mounted yet.
    pub fn hide(&mut self) -> bool {
        if self.mounted_frame().is_none() {
            debug!("Modal hide requested before mount");
            return false;
        }
        self.visibility = ModalVisibility::Hidden;
        true
    }

    /// The dialog's own close affordance
    pub fn handle_dialog_close(&mut self) -> bool {
        if !self.config.closable {
            return false;
        }
        self.hide()
    }

    pub fn visibility(&self) -> ModalVisibility {
        self.visibility
    }

    pub fn is_shown(&self) -> bool {
        self.visibility == ModalVisibility::Visible
    }

    /// Set the header text. An empty string removes the header row.
    pub fn set_header(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.has_header_string = !text.is_empty();
        self.header = Some(text);
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn has_header_string(&self) -> bool {
        self.has_header_string
    }

    /// Host signal: content arrived in the header slot
    pub fn on_tagline_slot_changed(&mut self) -> bool {
        match self.mounted_frame() {
            Some(frame) => {
                frame.tagline_revealed = true;
                true
            }
            None => false,
        }
    }

    /// Host signal: content arrived in the footer slot
    pub fn on_footer_slot_changed(&mut self) -> bool {
        match self.mounted_frame() {
            Some(frame) => {
                frame.footer_revealed = true;
                true
            }
            None => false,
        }
    }

    pub fn is_tagline_revealed(&self) -> bool {
        self.frame.is_some_and(|frame| frame.tagline_revealed)
    }

    pub fn is_footer_revealed(&self) -> bool {
        self.frame.is_some_and(|frame| frame.footer_revealed)
    }

    pub fn override_styles(&mut self, css: &str) {
        self.styles = ModalStyles::parse(css);
    }

    pub fn styles(&self) -> &ModalStyles {
        &self.styles
    }

    /// Layout of the visible modal, if mounted and shown
    pub fn layout(&self) -> Option<ModalLayout> {
        let frame = self.frame.filter(MountedFrame::is_usable)?;
        if !self.is_shown() {
            return None;
        }
        Some(ModalLayout::calculate(
            &self.config,
            frame.area,
            frame.tagline_revealed,
            frame.footer_revealed,
        ))
    }

    /// Draw the modal chrome and return the regions the host fills in
    pub fn render(&self, frame: &mut Frame, theme: &Theme) -> Option<ModalLayout> {
        let layout = self.layout()?;

        let mut style = Style::default().bg(theme.bg_overlay).fg(theme.fg_base);
        if let Some(bg) = self.styles.background() {
            style = style.bg(bg);
        }
        if let Some(fg) = self.styles.foreground() {
            style = style.fg(fg);
        }

        frame.render_widget(Clear, layout.container);

        let mut block = Block::default().style(style);
        if self.config.has_border {
            let border = self.styles.border_color().unwrap_or(theme.border_focus);
            block = block
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border));
        }
        if self.has_header_string {
            if let Some(header) = &self.header {
                block = block.title(Title::from(format!(" {} ", header)));
            }
        }
        if self.config.show_close_button && self.config.closable {
            block = block.title(Title::from(" [Esc] ").alignment(Alignment::Right));
        }

        frame.render_widget(block, layout.container);
        Some(layout)
    }
}

impl Default for ModalOverlay {
    fn default() -> Self {
        Self::new(ModalConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted() -> ModalOverlay {
        let mut modal = ModalOverlay::default();
        modal.mount(Rect::new(0, 0, 80, 24));
        modal
    }

    #[test]
    fn test_starts_hidden() {
        let modal = ModalOverlay::default();
        assert_eq!(modal.visibility(), ModalVisibility::Hidden);
        assert!(!modal.is_mounted());
        assert!(modal.layout().is_none());
    }

    #[test]
    fn test_transitions_before_mount_are_noops() {
        let mut modal = ModalOverlay::default();

        assert!(!modal.show());
        assert_eq!(modal.visibility(), ModalVisibility::Hidden);
        assert!(!modal.on_footer_slot_changed());
        assert!(!modal.is_footer_revealed());

        // A zero-sized area is not a usable mount either
        modal.mount(Rect::default());
        assert!(!modal.show());

        modal.mount(Rect::new(0, 0, 80, 24));
        assert!(modal.show());
        assert!(modal.is_shown());
    }

    #[test]
    fn test_show_hide_and_dialog_close() {
        let mut modal = mounted();

        assert!(modal.show());
        assert!(modal.layout().is_some());
        assert!(modal.hide());
        assert_eq!(modal.visibility(), ModalVisibility::Hidden);

        modal.show();
        assert!(modal.handle_dialog_close());
        assert!(!modal.is_shown());
    }

    #[test]
    fn test_non_closable_ignores_dialog_close() {
        let mut modal = ModalOverlay::new(ModalConfig::new().closable(false));
        modal.mount(Rect::new(0, 0, 80, 24));
        modal.show();

        assert!(!modal.handle_dialog_close());
        assert!(modal.is_shown());
    }

    #[test]
    fn test_header_string_flag() {
        let mut modal = ModalOverlay::default();
        assert!(!modal.has_header_string());

        modal.set_header("Select industries");
        assert!(modal.has_header_string());
        assert_eq!(modal.header(), Some("Select industries"));

        modal.set_header("");
        assert!(!modal.has_header_string());
        assert_eq!(modal.header(), Some(""));
    }

    #[test]
    fn test_slot_reveal_is_one_directional() {
        let mut modal = mounted();
        assert!(!modal.is_tagline_revealed());

        assert!(modal.on_tagline_slot_changed());
        assert!(modal.on_footer_slot_changed());

        // Further changes, hiding, and remounting never hide a revealed region
        modal.on_tagline_slot_changed();
        modal.hide();
        modal.mount(Rect::new(0, 0, 100, 30));
        assert!(modal.is_tagline_revealed());
        assert!(modal.is_footer_revealed());

        modal.show();
        let layout = modal.layout().unwrap();
        assert!(layout.tagline.is_some());
        assert!(layout.footer.is_some());
    }

    #[test]
    fn test_override_styles_is_not_a_transition() {
        let mut modal = mounted();
        modal.override_styles("border-color: yellow");

        assert_eq!(modal.visibility(), ModalVisibility::Hidden);
        assert_eq!(modal.styles().border_color(), Some(ratatui::style::Color::Yellow));
    }
}
