//! Two-column rendering and key mapping for the open modal
//!
//! The view owns only focus and cursor positions. Keys are translated into
//! [`ViewAction`]s that the widget applies to its own state.

use crate::sources::SelectOption;
use crate::tui::{themes::Theme, Frame};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Search,
    Available,
    Selected,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Search => Pane::Available,
            Pane::Available => Pane::Selected,
            Pane::Selected => Pane::Search,
        }
    }

    fn previous(self) -> Self {
        match self {
            Pane::Search => Pane::Selected,
            Pane::Available => Pane::Search,
            Pane::Selected => Pane::Available,
        }
    }
}

/// What a key press asks the widget to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    None,
    /// New search text
    Search(String),
    /// New staged selection, in order
    Select(Vec<String>),
    Save,
    Cancel,
}

/// Displayed options not yet staged
pub fn available_options<'a>(displayed: &'a [SelectOption], staged: &[String]) -> Vec<&'a SelectOption> {
    displayed
        .iter()
        .filter(|option| !staged.contains(&option.value))
        .collect()
}

#[derive(Debug, Default)]
pub struct DualListView {
    focus: Pane,
    available_cursor: usize,
    selected_cursor: usize,
}

impl DualListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Pane {
        self.focus
    }

    pub fn set_focus(&mut self, pane: Pane) {
        self.focus = pane;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        search_text: &str,
        available: &[&SelectOption],
        staged: &[String],
    ) -> ViewAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            return ViewAction::Save;
        }

        match key.code {
            KeyCode::Esc => return ViewAction::Cancel,
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return ViewAction::None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous();
                return ViewAction::None;
            }
            _ => {}
        }

        match self.focus {
            Pane::Search => match key.code {
                KeyCode::Char(c) => {
                    let mut text = search_text.to_string();
                    text.push(c);
                    ViewAction::Search(text)
                }
                KeyCode::Backspace => {
                    let mut text = search_text.to_string();
                    if text.pop().is_none() {
                        return ViewAction::None;
                    }
                    ViewAction::Search(text)
                }
                KeyCode::Down => {
                    self.focus = Pane::Available;
                    ViewAction::None
                }
                _ => ViewAction::None,
            },
            Pane::Available => {
                self.available_cursor = clamp(self.available_cursor, available.len());
                match key.code {
                    KeyCode::Up => {
                        self.available_cursor = self.available_cursor.saturating_sub(1);
                        ViewAction::None
                    }
                    KeyCode::Down => {
                        self.available_cursor = clamp(self.available_cursor + 1, available.len());
                        ViewAction::None
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        let Some(option) = available.get(self.available_cursor) else {
                            return ViewAction::None;
                        };
                        let mut values = staged.to_vec();
                        values.push(option.value.clone());
                        ViewAction::Select(values)
                    }
                    KeyCode::Right => {
                        self.focus = Pane::Selected;
                        ViewAction::None
                    }
                    _ => ViewAction::None,
                }
            }
            Pane::Selected => {
                self.selected_cursor = clamp(self.selected_cursor, staged.len());
                match key.code {
                    KeyCode::Up => {
                        self.selected_cursor = self.selected_cursor.saturating_sub(1);
                        ViewAction::None
                    }
                    KeyCode::Down => {
                        self.selected_cursor = clamp(self.selected_cursor + 1, staged.len());
                        ViewAction::None
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        if self.selected_cursor >= staged.len() {
                            return ViewAction::None;
                        }
                        let mut values = staged.to_vec();
                        values.remove(self.selected_cursor);
                        ViewAction::Select(values)
                    }
                    KeyCode::Left => {
                        self.focus = Pane::Available;
                        ViewAction::None
                    }
                    _ => ViewAction::None,
                }
            }
        }
    }

    /// Render search line and both columns into `area`.
    /// `selected` pairs each staged value with its label when one is known.
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        search_text: &str,
        available: &[&SelectOption],
        selected: &[(String, Option<String>)],
    ) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let search = if search_text.is_empty() {
            Paragraph::new("Type to search...").style(theme.muted())
        } else {
            Paragraph::new(search_text.to_string()).style(theme.text())
        };
        frame.render_widget(
            search.block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style(self.focus == Pane::Search))
                    .title("Search"),
            ),
            rows[0],
        );

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let available_items: Vec<ListItem> = available
            .iter()
            .map(|option| ListItem::new(option.label.clone()))
            .collect();
        self.render_column(
            frame,
            columns[0],
            theme,
            format!("Available ({})", available.len()),
            available_items,
            Pane::Available,
            self.available_cursor,
        );

        let selected_items: Vec<ListItem> = selected
            .iter()
            .map(|(value, label)| match label {
                Some(label) => ListItem::new(label.clone()),
                None => ListItem::new(Line::from(Span::styled(value.clone(), theme.muted()))),
            })
            .collect();
        self.render_column(
            frame,
            columns[1],
            theme,
            format!("Selected ({})", selected.len()),
            selected_items,
            Pane::Selected,
            self.selected_cursor,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn render_column(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        title: String,
        items: Vec<ListItem>,
        pane: Pane,
        cursor: usize,
    ) {
        let focused = self.focus == pane;
        let mut state = ListState::default();
        if focused && !items.is_empty() {
            state.select(Some(clamp(cursor, items.len())));
        }

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style(focused))
                    .title(title),
            )
            .style(theme.text())
            .highlight_style(theme.highlighted())
            .highlight_symbol("► ");

        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn clamp(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn options() -> Vec<SelectOption> {
        vec![
            SelectOption::new("a", "Apple"),
            SelectOption::new("b", "Banana"),
            SelectOption::new("c", "Cherry"),
        ]
    }

    #[test]
    fn test_available_excludes_staged() {
        let options = options();
        let staged = vec!["b".to_string()];
        let available = available_options(&options, &staged);
        let labels: Vec<_> = available.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Apple", "Cherry"]);
    }

    #[test]
    fn test_typing_produces_search_text() {
        let mut view = DualListView::new();
        assert_eq!(
            view.handle_key(key(KeyCode::Char('p')), "ap", &[], &[]),
            ViewAction::Search("app".to_string())
        );
        assert_eq!(
            view.handle_key(key(KeyCode::Backspace), "app", &[], &[]),
            ViewAction::Search("ap".to_string())
        );
        assert_eq!(view.handle_key(key(KeyCode::Backspace), "", &[], &[]), ViewAction::None);
    }

    #[test]
    fn test_select_and_deselect() {
        let options = options();
        let mut view = DualListView::new();
        view.set_focus(Pane::Available);

        let staged: Vec<String> = Vec::new();
        let available = available_options(&options, &staged);
        view.handle_key(key(KeyCode::Down), "", &available, &staged);
        assert_eq!(
            view.handle_key(key(KeyCode::Enter), "", &available, &staged),
            ViewAction::Select(vec!["b".to_string()])
        );

        let staged = vec!["b".to_string(), "c".to_string()];
        view.handle_key(key(KeyCode::Tab), "", &[], &staged);
        assert_eq!(view.focus(), Pane::Selected);
        assert_eq!(
            view.handle_key(key(KeyCode::Char(' ')), "", &[], &staged),
            ViewAction::Select(vec!["c".to_string()])
        );
    }

    #[test]
    fn test_save_and_cancel_keys() {
        let mut view = DualListView::new();
        let save = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(view.handle_key(save, "", &[], &[]), ViewAction::Save);
        assert_eq!(view.handle_key(key(KeyCode::Esc), "", &[], &[]), ViewAction::Cancel);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let options = options();
        let available: Vec<&SelectOption> = options.iter().collect();
        let mut view = DualListView::new();
        view.set_focus(Pane::Available);

        for _ in 0..10 {
            view.handle_key(key(KeyCode::Down), "", &available, &[]);
        }
        assert_eq!(
            view.handle_key(key(KeyCode::Enter), "", &available, &[]),
            ViewAction::Select(vec!["c".to_string()])
        );
        assert_eq!(view.handle_key(key(KeyCode::Enter), "", &[], &[]), ViewAction::None);
    }
}
