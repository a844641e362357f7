use crate::error::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::ui::centered_rect;

// A plain text form. The simple sections (empresas, constructoras,
// trabajadores, actividades) all edit through this one state machine;
// field meaning lives with the caller, which converts to and from its
// model and runs the model validation on save.
pub struct FormState {
    pub title: String,
    pub labels: Vec<&'static str>,
    pub values: Vec<String>,
    current: usize,
    editing: bool,
    pub error: Option<String>,
}

pub enum FormAction {
    Cancel,
    Submit,
}

impl FormState {
    pub fn new(title: impl Into<String>, labels: Vec<&'static str>) -> Self {
        let values = vec![String::new(); labels.len()];
        Self {
            title: title.into(),
            labels,
            values,
            current: 0,
            editing: false,
            error: None,
        }
    }

    pub fn with_values(
        title: impl Into<String>,
        fields: Vec<(&'static str, String)>,
    ) -> Self {
        let (labels, values) = fields.into_iter().unzip();
        Self {
            title: title.into(),
            labels,
            values,
            current: 0,
            editing: false,
            error: None,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    fn next_field(&mut self) {
        self.current = (self.current + 1) % self.labels.len();
    }

    fn previous_field(&mut self) {
        self.current = if self.current == 0 {
            self.labels.len() - 1
        } else {
            self.current - 1
        };
    }

    fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }
        let value = &mut self.values[self.current];
        match key {
            KeyCode::Char(c) => {
                value.push(c);
            }
            KeyCode::Backspace => {
                value.pop();
            }
            _ => {}
        }
    }
}

pub fn render_form<B: Backend>(frame: &mut Frame<B>, state: &mut FormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    let title = Paragraph::new(state.title.clone())
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    render_fields(frame, state, chunks[1]);

    let help_text = if state.editing {
        "Enter - Guardar campo | Esc - Cancelar edición"
    } else {
        "Enter - Editar campo | Arriba/Abajo - Navegar | S - Guardar | Esc - Cancelar"
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[2]);

    if let Some(error) = &state.error {
        render_error(frame, frame.size(), error);
    }
}

fn render_fields<B: Backend>(frame: &mut Frame<B>, state: &FormState, area: Rect) {
    let items: Vec<ListItem> = state
        .labels
        .iter()
        .zip(state.values.iter())
        .enumerate()
        .map(|(i, (label, value))| {
            let content = if i == state.current && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", label), Style::default().fg(Color::Yellow)),
                    Span::styled(
                        format!("{}|", value),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                let style = if i == state.current {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Spans::from(vec![
                    Span::styled(format!("{}: ", label), style),
                    Span::raw(value.as_str()),
                ])
            };
            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Datos"))
        .highlight_style(Style::default().fg(Color::Yellow));

    frame.render_widget(form_list, area);
}

fn render_error<B: Backend>(frame: &mut Frame<B>, size: Rect, error: &str) {
    let popup_area = centered_rect(60, 20, size);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(error.to_string()),
        Spans::from(""),
        Spans::from("Pulsa cualquier tecla para continuar"),
    ])
    .block(Block::default().title("Error").borders(Borders::ALL))
    .style(Style::default().fg(Color::Red));

    frame.render_widget(popup, popup_area);
}

pub fn handle_input(state: &mut FormState) -> Result<Option<FormAction>> {
    if let Event::Key(key) = event::read()? {
        if state.error.is_some() {
            state.error = None;
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => {
                if state.editing {
                    state.toggle_editing();
                } else {
                    return Ok(Some(FormAction::Cancel));
                }
            }
            KeyCode::Enter => {
                state.toggle_editing();
            }
            KeyCode::Up if !state.editing => {
                state.previous_field();
            }
            KeyCode::Down if !state.editing => {
                state.next_field();
            }
            KeyCode::Char('s') if !state.editing => {
                return Ok(Some(FormAction::Submit));
            }
            _ if state.editing => {
                state.edit_current_field(key.code);
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
    fn with_values_preserves_order() {
        let form = FormState::with_values(
            "Editar empresa",
            vec![
                ("Nombre", "Ladrillos SA".to_string()),
                ("Email", "ventas@ladrillos.es".to_string()),
            ],
        );
        assert_eq!(form.value(0), "Ladrillos SA");
        assert_eq!(form.value(1), "ventas@ladrillos.es");
        assert_eq!(form.labels, vec!["Nombre", "Email"]);
    }

    #[test]
    fn editing_appends_and_deletes_characters() {
        let mut form = FormState::new("Nueva empresa", vec!["Nombre"]);
        form.toggle_editing();
        form.edit_current_field(KeyCode::Char('S'));
        form.edit_current_field(KeyCode::Char('L'));
        form.edit_current_field(KeyCode::Backspace);
        assert_eq!(form.value(0), "S");
    }
}
