use crate::error::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::ui::centered_rect;

// One selectable list screen per section. All entity lists share this
// state machine; exports are only offered where `exportable` is set.
pub struct ListScreen<T> {
    pub items: Vec<T>,
    list_state: ListState,
    show_delete_confirmation: bool,
    pub exportable: bool,
    pub status: Option<String>,
}

impl<T> ListScreen<T> {
    pub fn new(items: Vec<T>) -> Self {
        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            items,
            list_state,
            show_delete_confirmation: false,
            exportable: false,
            status: None,
        }
    }

    pub fn exportable(mut self) -> Self {
        self.exportable = true;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i >= self.items.len() - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn selected(&self) -> Option<&T> {
        self.list_state.selected().and_then(|i| self.items.get(i))
    }
}

pub enum ListAction {
    Back,
    New,
    Edit,
    Delete,
    ExportXlsx,
    ExportPdf,
}

pub fn render_list<B: Backend, T>(
    frame: &mut Frame<B>,
    state: &mut ListScreen<T>,
    title: &str,
    row: impl Fn(&T) -> String,
) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(size);

    let items: Vec<ListItem> = state
        .items
        .iter()
        .map(|item| ListItem::new(Spans::from(vec![Span::raw(row(item))])))
        .collect();

    let list = List::new(items)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(list, chunks[0], &mut state.list_state);

    let footer = if let Some(status) = &state.status {
        status.clone()
    } else if state.selected().is_some() {
        if state.exportable {
            "<N> Nuevo | <E> Editar | <D> Borrar | <X> Exportar xlsx | <P> Exportar PDF | <Esc> Volver".to_string()
        } else {
            "<N> Nuevo | <E> Editar | <D> Borrar | <Esc> Volver".to_string()
        }
    } else {
        "<N> Nuevo | <Esc> Volver".to_string()
    };

    let footer_style = if state.status.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::White)
    };

    let buttons = Paragraph::new(footer)
        .block(Block::default().borders(Borders::TOP))
        .style(footer_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(buttons, chunks[1]);

    if state.show_delete_confirmation {
        render_delete_confirmation(frame, size);
    }
}

fn render_delete_confirmation<B: Backend>(frame: &mut Frame<B>, size: Rect) {
    let popup_area = centered_rect(50, 20, size);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from("¿Seguro que quieres borrar este elemento?"),
        Spans::from(""),
        Spans::from("<Y> Sí  <N> No"),
    ])
    .block(Block::default().title("Confirmar borrado").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(popup, popup_area);
}

pub fn handle_input<T>(state: &mut ListScreen<T>) -> Result<Option<ListAction>> {
    if let Event::Key(key) = event::read()? {
        // Any key clears a lingering status message.
        state.status = None;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if state.show_delete_confirmation {
                    state.toggle_delete_confirmation();
                } else {
                    return Ok(Some(ListAction::Back));
                }
            }
            KeyCode::Char('n') => {
                if state.show_delete_confirmation {
                    state.toggle_delete_confirmation();
                } else {
                    return Ok(Some(ListAction::New));
                }
            }
            KeyCode::Char('e') => {
                if !state.show_delete_confirmation && state.selected().is_some() {
                    return Ok(Some(ListAction::Edit));
                }
            }
            KeyCode::Char('d') => {
                if !state.show_delete_confirmation && state.selected().is_some() {
                    state.toggle_delete_confirmation();
                }
            }
            KeyCode::Char('y') => {
                if state.show_delete_confirmation && state.selected().is_some() {
                    state.toggle_delete_confirmation();
                    return Ok(Some(ListAction::Delete));
                }
            }
            KeyCode::Char('x') => {
                if !state.show_delete_confirmation && state.exportable && state.selected().is_some() {
                    return Ok(Some(ListAction::ExportXlsx));
                }
            }
            KeyCode::Char('p') => {
                if !state.show_delete_confirmation && state.exportable && state.selected().is_some() {
                    return Ok(Some(ListAction::ExportPdf));
                }
            }
            KeyCode::Down => {
                if !state.show_delete_confirmation {
                    state.next();
                }
            }
            KeyCode::Up => {
                if !state.show_delete_confirmation {
                    state.previous();
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_wraps_both_ways() {
        let mut screen = ListScreen::new(vec!["a", "b", "c"]);
        assert_eq!(screen.selected(), Some(&"a"));
        screen.previous();
        assert_eq!(screen.selected(), Some(&"c"));
        screen.next();
        assert_eq!(screen.selected(), Some(&"a"));
    }

    #[test]
    fn empty_list_has_no_selection() {
        let mut screen: ListScreen<&str> = ListScreen::new(vec![]);
        screen.next();
        screen.previous();
        assert!(screen.selected().is_none());
    }
}
