use std::collections::HashSet;

use crate::error::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::models::{Company, Site};
use crate::ui::centered_rect;

const FIELD_LABELS: [&str; 11] = [
    "Nombre",
    "Constructora",
    "Encargado",
    "Teléfono encargado",
    "Jefe de obra",
    "Teléfono jefe de obra",
    "Dirección",
    "Población",
    "Estado",
    "Fecha de inicio",
    "Referencia de pedido",
];

#[derive(Clone, Copy, PartialEq)]
enum Panel {
    Fields,
    Companies,
}

// Obra form plus the empresas that work on it. The empresa panel is a
// checkbox list over every known empresa, toggled with Space.
pub struct SiteWizardState {
    pub site: Site,
    companies: Vec<Company>,
    selected_companies: HashSet<i32>,
    panel: Panel,
    current_field: usize,
    editing: bool,
    companies_list_state: ListState,
    pub error: Option<String>,
}

pub enum SiteWizardAction {
    Cancel,
    Save(Site, Vec<i32>),
}

impl SiteWizardState {
    pub fn new(site: Site, companies: Vec<Company>, selected: Vec<i32>) -> Self {
        let mut companies_list_state = ListState::default();
        if !companies.is_empty() {
            companies_list_state.select(Some(0));
        }

        Self {
            site,
            companies,
            selected_companies: selected.into_iter().collect(),
            panel: Panel::Fields,
            current_field: 0,
            editing: false,
            companies_list_state,
            error: None,
        }
    }

    fn field_value(&mut self, index: usize) -> &mut String {
        match index {
            0 => &mut self.site.name,
            1 => &mut self.site.contractor,
            2 => &mut self.site.foreman,
            3 => &mut self.site.foreman_phone,
            4 => &mut self.site.site_manager,
            5 => &mut self.site.site_manager_phone,
            6 => &mut self.site.address,
            7 => &mut self.site.town,
            8 => &mut self.site.status,
            9 => &mut self.site.start_date,
            _ => &mut self.site.request_ref,
        }
    }

    fn field_display(&self, index: usize) -> &str {
        match index {
            0 => &self.site.name,
            1 => &self.site.contractor,
            2 => &self.site.foreman,
            3 => &self.site.foreman_phone,
            4 => &self.site.site_manager,
            5 => &self.site.site_manager_phone,
            6 => &self.site.address,
            7 => &self.site.town,
            8 => &self.site.status,
            9 => &self.site.start_date,
            _ => &self.site.request_ref,
        }
    }

    fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_LABELS.len();
    }

    fn previous_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            FIELD_LABELS.len() - 1
        } else {
            self.current_field - 1
        };
    }

    fn next_company(&mut self) {
        if self.companies.is_empty() {
            return;
        }
        let i = match self.companies_list_state.selected() {
            Some(i) if i >= self.companies.len() - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.companies_list_state.select(Some(i));
    }

    fn previous_company(&mut self) {
        if self.companies.is_empty() {
            return;
        }
        let i = match self.companies_list_state.selected() {
            Some(0) | None => self.companies.len() - 1,
            Some(i) => i - 1,
        };
        self.companies_list_state.select(Some(i));
    }

    fn toggle_selected_company(&mut self) {
        if let Some(i) = self.companies_list_state.selected() {
            if let Some(company) = self.companies.get(i) {
                if !self.selected_companies.remove(&company.id) {
                    self.selected_companies.insert(company.id);
                }
            }
        }
    }

    fn company_ids(&self) -> Vec<i32> {
        // Keep the stable list order, not hash order.
        self.companies
            .iter()
            .filter(|c| self.selected_companies.contains(&c.id))
            .map(|c| c.id)
            .collect()
    }
}

pub fn render_site_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut SiteWizardState) {
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

    let title_text = if state.site.id == 0 {
        "Nueva obra"
    } else {
        "Editar obra"
    };
    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(chunks[1]);

    render_fields(frame, state, panels[0]);
    render_companies(frame, state, panels[1]);

    let help_text = match (state.panel, state.editing) {
        (Panel::Fields, true) => "Enter - Guardar campo | Esc - Cancelar edición",
        (Panel::Fields, false) => {
            "Enter - Editar campo | Tab - Panel empresas | S - Guardar | Esc - Cancelar"
        }
        (Panel::Companies, _) => {
            "Espacio - Marcar empresa | Tab - Panel datos | S - Guardar | Esc - Cancelar"
        }
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[2]);

    if let Some(error) = &state.error {
        render_error(frame, frame.size(), error);
    }
}

fn render_fields<B: Backend>(frame: &mut Frame<B>, state: &SiteWizardState, area: Rect) {
    let items: Vec<ListItem> = FIELD_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let value = state.field_display(i);
            let active = state.panel == Panel::Fields && i == state.current_field;
            let content = if active && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", label), Style::default().fg(Color::Yellow)),
                    Span::styled(
                        format!("{}|", value),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                let style = if active {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Spans::from(vec![
                    Span::styled(format!("{}: ", label), style),
                    Span::raw(value),
                ])
            };
            ListItem::new(content)
        })
        .collect();

    let block_style = if state.panel == Panel::Fields {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Datos de la obra")
            .border_style(block_style),
    );
    frame.render_widget(list, area);
}

fn render_companies<B: Backend>(frame: &mut Frame<B>, state: &mut SiteWizardState, area: Rect) {
    let items: Vec<ListItem> = state
        .companies
        .iter()
        .map(|company| {
            let mark = if state.selected_companies.contains(&company.id) {
                "[x]"
            } else {
                "[ ]"
            };
            ListItem::new(format!("{} {}", mark, company.name))
        })
        .collect();

    let block_style = if state.panel == Panel::Companies {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Empresas")
                .border_style(block_style),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

    frame.render_stateful_widget(list, area, &mut state.companies_list_state);
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

pub fn handle_input(state: &mut SiteWizardState) -> Result<Option<SiteWizardAction>> {
    if let Event::Key(key) = event::read()? {
        if state.error.is_some() {
            state.error = None;
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => {
                if state.editing {
                    state.editing = false;
                } else {
                    return Ok(Some(SiteWizardAction::Cancel));
                }
            }
            KeyCode::Tab if !state.editing => {
                state.panel = match state.panel {
                    Panel::Fields => Panel::Companies,
                    Panel::Companies => Panel::Fields,
                };
            }
            KeyCode::Char('s') if !state.editing => {
                return Ok(Some(SiteWizardAction::Save(
                    state.site.clone(),
                    state.company_ids(),
                )));
            }
            KeyCode::Enter if state.panel == Panel::Fields => {
                state.editing = !state.editing;
            }
            KeyCode::Char(' ') if state.panel == Panel::Companies => {
                state.toggle_selected_company();
            }
            KeyCode::Up if !state.editing => match state.panel {
                Panel::Fields => state.previous_field(),
                Panel::Companies => state.previous_company(),
            },
            KeyCode::Down if !state.editing => match state.panel {
                Panel::Fields => state.next_field(),
                Panel::Companies => state.next_company(),
            },
            other if state.editing => {
                let field = state.field_value(state.current_field);
                match other {
                    KeyCode::Char(c) => field.push(c),
                    KeyCode::Backspace => {
                        field.pop();
                    }
                    _ => {}
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

    fn company(id: i32, name: &str) -> Company {
        let mut c = Company::new();
        c.id = id;
        c.name = name.to_string();
        c
    }

    #[test]
    fn toggling_a_company_adds_and_removes_it() {
        let companies = vec![company(1, "Ladrillos SA"), company(2, "Cementos SL")];
        let mut state = SiteWizardState::new(Site::new(), companies, vec![2]);
        assert_eq!(state.company_ids(), vec![2]);

        state.toggle_selected_company();
        assert_eq!(state.company_ids(), vec![1, 2]);

        state.toggle_selected_company();
        assert_eq!(state.company_ids(), vec![2]);
    }

    #[test]
    fn company_ids_follow_list_order() {
        let companies = vec![company(7, "A"), company(3, "B"), company(5, "C")];
        let state = SiteWizardState::new(Site::new(), companies, vec![5, 7]);
        assert_eq!(state.company_ids(), vec![7, 5]);
    }
}
