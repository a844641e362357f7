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

use crate::models::PurchaseOrder;
use crate::ui::centered_rect;
use crate::ui::components::date_input::DateInputState;

// Field 0 is the date, the rest are free text.
const FIELD_LABELS: [&str; 9] = [
    "Fecha",
    "Descripción",
    "Cantidad",
    "Constructora",
    "Obra",
    "Empresa",
    "Proveedor",
    "Trabajador",
    "Costo",
];

pub struct OrderWizardState {
    pub order: PurchaseOrder,
    date_state: DateInputState,
    current_field: usize,
    editing: bool,
    pub error: Option<String>,
}

pub enum OrderWizardAction {
    Cancel,
    Save(PurchaseOrder),
}

impl OrderWizardState {
    pub fn new(order: PurchaseOrder) -> Self {
        let date_state = DateInputState::new(order.order_date);
        Self {
            order,
            date_state,
            current_field: 0,
            editing: false,
            error: None,
        }
    }

    fn text_field(&mut self, index: usize) -> Option<&mut String> {
        match index {
            1 => Some(&mut self.order.description),
            2 => Some(&mut self.order.quantity),
            3 => Some(&mut self.order.contractor),
            4 => Some(&mut self.order.site),
            5 => Some(&mut self.order.company),
            6 => Some(&mut self.order.supplier),
            7 => Some(&mut self.order.worker),
            8 => Some(&mut self.order.cost),
            _ => None,
        }
    }

    fn field_display(&self, index: usize) -> String {
        match index {
            0 => {
                if self.editing && self.current_field == 0 {
                    self.date_state.display_string()
                } else {
                    self.order.order_date.format("%d/%m/%Y").to_string()
                }
            }
            1 => self.order.description.clone(),
            2 => self.order.quantity.clone(),
            3 => self.order.contractor.clone(),
            4 => self.order.site.clone(),
            5 => self.order.company.clone(),
            6 => self.order.supplier.clone(),
            7 => self.order.worker.clone(),
            _ => self.order.cost.clone(),
        }
    }

    fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        if self.current_field == 0 {
            if self.editing {
                self.date_state = DateInputState::new(self.order.order_date);
                self.date_state.toggle_editing();
            } else {
                self.date_state.editing = false;
                self.order.order_date = self.date_state.date;
            }
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

    fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }
        if self.current_field == 0 {
            self.date_state.handle_input(key);
            self.order.order_date = self.date_state.date;
            return;
        }
        if let Some(value) = self.text_field(self.current_field) {
            match key {
                KeyCode::Char(c) => value.push(c),
                KeyCode::Backspace => {
                    value.pop();
                }
                _ => {}
            }
        }
    }
}

pub fn render_order_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut OrderWizardState) {
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

    let title_text = if state.order.id == 0 {
        "Nueva hoja de pedidos"
    } else {
        "Editar hoja de pedidos"
    };
    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    let items: Vec<ListItem> = FIELD_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let value = state.field_display(i);
            let content = if i == state.current_field && state.editing {
                let shown = if i == 0 { value } else { format!("{}|", value) };
                Spans::from(vec![
                    Span::styled(format!("{}: ", label), Style::default().fg(Color::Yellow)),
                    Span::styled(shown, Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                let style = if i == state.current_field {
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

    let form = List::new(items).block(Block::default().borders(Borders::ALL).title("Pedido"));
    frame.render_widget(form, chunks[1]);

    let help_text = if state.editing && state.current_field == 0 {
        "Enter - Guardar campo | Izquierda/Derecha - Parte de la fecha | Esc - Cancelar edición"
    } else if state.editing {
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

pub fn handle_input(state: &mut OrderWizardState) -> Result<Option<OrderWizardAction>> {
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
                    return Ok(Some(OrderWizardAction::Cancel));
                }
            }
            KeyCode::Enter => {
                state.toggle_editing();
            }
            KeyCode::Up if !state.editing => state.previous_field(),
            KeyCode::Down if !state.editing => state.next_field(),
            KeyCode::Char('s') if !state.editing => {
                return Ok(Some(OrderWizardAction::Save(state.order.clone())));
            }
            _ if state.editing => {
                state.edit_current_field(key.code);
            }
            _ => {}
        }
    }

    Ok(None)
}
