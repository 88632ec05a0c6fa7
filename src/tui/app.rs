use crate::tui::components::dual_list::DualListWidget;
use crate::tui::components::Component;
use crate::tui::{events::Event, themes::Theme, Frame};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::Paragraph;
use tokio::sync::mpsc;
use tracing::debug;

/// Host application for a single selection widget
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    /// Current application dimensions
    pub size: Rect,

    /// Current theme for styling
    pub theme: Theme,

    /// Status message to display
    pub status_message: Option<String>,

    widget: DualListWidget,
}

impl App {
    /// Create the application around `widget`. Change notifications are
    /// forwarded to `event_sender`.
    pub fn new(mut widget: DualListWidget, theme: Theme, event_sender: mpsc::UnboundedSender<Event>) -> Self {
        widget.set_focus(true);
        widget.add_change_listener(move |event| {
            // The loop may already have stopped
            let _ = event_sender.send(Event::Changed(event.name.clone()));
        });

        Self {
            should_quit: false,
            size: Rect::default(),
            theme,
            status_message: None,
            widget,
        }
    }

    pub fn widget(&self) -> &DualListWidget {
        &self.widget
    }

    pub fn into_widget(self) -> DualListWidget {
        self.widget
    }

    fn is_quit_key(&self, key: &KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        !self.widget.is_open() && matches!(key.code, KeyCode::Char('q'))
    }

    /// Handle incoming events. Returns whether the application should exit.
    pub async fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key_event) => {
                if self.is_quit_key(&key_event) {
                    self.should_quit = true;
                    return Ok(true);
                }
                self.widget.handle_key_event(key_event).await?;
            }

            Event::Resize(width, height) => {
                self.size = Rect::new(0, 0, width, height);
            }

            Event::Tick => {
                self.widget.tick().await?;
            }

            Event::Changed(name) => {
                debug!("Change notification from '{}'", name);
                self.status_message = Some(format!("{} = {}", name, self.widget.value()));
            }

            Event::StatusMessage(message) => {
                self.status_message = Some(message);
            }
        }

        Ok(self.should_quit)
    }

    /// Render the application UI
    pub fn render(&mut self, frame: &mut Frame) {
        self.size = frame.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Widget input
                Constraint::Min(0),    // Help
                Constraint::Length(1), // Status bar
            ])
            .split(frame.size());

        self.widget.render(frame, chunks[0], &self.theme);

        if !self.widget.is_open() {
            let help = Paragraph::new("Enter open · Backspace clear · q quit").style(self.theme.muted());
            frame.render_widget(help, chunks[1]);
        }

        self.render_status_bar(frame, chunks[2]);
    }

    /// Render the status bar
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = match (&self.status_message, self.widget.last_error()) {
            (_, Some(error)) => (
                format!("Options unavailable: {}", error),
                self.theme.text().fg(self.theme.error),
            ),
            (Some(message), None) => (message.clone(), self.theme.text()),
            (None, None) => (format!("{} options", self.widget.options().len()), self.theme.muted()),
        };
        frame.render_widget(Paragraph::new(text).style(style), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WidgetConfig;
    use crate::sources::SelectOption;

    async fn app() -> (App, mpsc::UnboundedReceiver<Event>) {
        let config = WidgetConfig {
            name: "fruit".to_string(),
            options: vec![
                SelectOption::new("a", "Apple"),
                SelectOption::new("b", "Banana"),
            ],
            ..Default::default()
        };
        let mut widget = DualListWidget::new(&config);
        widget.connect().await;
        widget.mount(Rect::new(0, 0, 80, 24));

        let (sender, receiver) = mpsc::unbounded_channel();
        (App::new(widget, Theme::default(), sender), receiver)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_quit_only_while_closed() {
        let (mut app, _events) = app().await;

        assert!(!app.handle_event(key(KeyCode::Enter)).await.unwrap());
        assert!(app.widget().is_open());
        // 'q' is search text while the modal is open
        assert!(!app.handle_event(key(KeyCode::Char('q'))).await.unwrap());

        app.handle_event(key(KeyCode::Esc)).await.unwrap();
        assert!(app.handle_event(key(KeyCode::Char('q'))).await.unwrap());
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_save_forwards_change_notification() {
        let (mut app, mut events) = app().await;

        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        app.handle_event(key(KeyCode::Tab)).await.unwrap();
        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)))
            .await
            .unwrap();

        let event = events.try_recv().unwrap();
        assert!(matches!(&event, Event::Changed(name) if name == "fruit"));
        app.handle_event(event).await.unwrap();
        assert_eq!(app.status_message.as_deref(), Some("fruit = a"));
    }
}
