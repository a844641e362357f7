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

use crate::models::{MeasurementSheet, SheetLine};
use crate::ui::centered_rect;
use crate::ui::components::date_input::DateInputState;

#[derive(Clone, Copy, PartialEq)]
pub enum SheetField {
    ClientName,
    ClientEmail,
    ClientPhone1,
    ClientPhone2,
    Contractor,
    Sites,
    Date,
    Lines,
}

const FIELD_ORDER: [SheetField; 8] = [
    SheetField::ClientName,
    SheetField::ClientEmail,
    SheetField::ClientPhone1,
    SheetField::ClientPhone2,
    SheetField::Contractor,
    SheetField::Sites,
    SheetField::Date,
    SheetField::Lines,
];

fn field_label(field: SheetField) -> &'static str {
    match field {
        SheetField::ClientName => "Cliente",
        SheetField::ClientEmail => "Email",
        SheetField::ClientPhone1 => "Teléfono 1",
        SheetField::ClientPhone2 => "Teléfono 2",
        SheetField::Contractor => "Constructora",
        SheetField::Sites => "Obras (separadas por comas)",
        SheetField::Date => "Fecha",
        SheetField::Lines => "Líneas",
    }
}

// The per-line editing walks these in order; the priced variant appends
// the four price fields.
#[derive(Clone, Copy, Debug, PartialEq)]
enum LineField {
    Activity,
    Description,
    Length,
    Height,
    Quantity,
    Notes,
    WorkerPrice,
    WorkerValue,
    ContractorPrice,
    ContractorValue,
}

impl LineField {
    fn label(&self) -> &'static str {
        match self {
            LineField::Activity => "Actividad",
            LineField::Description => "Concepto",
            LineField::Length => "Largo (L)",
            LineField::Height => "Alto (H)",
            LineField::Quantity => "Cantidad (N)",
            LineField::Notes => "Notas",
            LineField::WorkerPrice => "Precio trabajador",
            LineField::WorkerValue => "Valor trabajador",
            LineField::ContractorPrice => "Precio constructora",
            LineField::ContractorValue => "Valor constructora",
        }
    }

    fn sequence(priced: bool) -> &'static [LineField] {
        if priced {
            &[
                LineField::Activity,
                LineField::Description,
                LineField::Length,
                LineField::Height,
                LineField::Quantity,
                LineField::Notes,
                LineField::WorkerPrice,
                LineField::WorkerValue,
                LineField::ContractorPrice,
                LineField::ContractorValue,
            ]
        } else {
            &[
                LineField::Activity,
                LineField::Description,
                LineField::Length,
                LineField::Height,
                LineField::Quantity,
                LineField::Notes,
            ]
        }
    }
}

pub struct SheetWizardState {
    pub sheet: MeasurementSheet,
    activities: Vec<String>,
    sites_input: String,
    date_state: DateInputState,
    current_field: usize,
    editing: bool,
    lines_list_state: ListState,
    editing_line: Option<(usize, usize)>, // (line index, position in field sequence)
    pub error: Option<String>,
}

pub enum SheetWizardAction {
    Cancel,
    Save(MeasurementSheet),
}

impl SheetWizardState {
    pub fn new(sheet: MeasurementSheet, activities: Vec<String>) -> Self {
        let sites_input = sheet.site_names.join(", ");
        let date_state = DateInputState::new(sheet.sheet_date);
        let mut lines_list_state = ListState::default();
        if !sheet.lines.is_empty() {
            lines_list_state.select(Some(0));
        }

        Self {
            sheet,
            activities,
            sites_input,
            date_state,
            current_field: 0,
            editing: false,
            lines_list_state,
            editing_line: None,
            error: None,
        }
    }

    fn field(&self) -> SheetField {
        FIELD_ORDER[self.current_field]
    }

    fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_ORDER.len();
    }

    fn previous_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            FIELD_ORDER.len() - 1
        } else {
            self.current_field - 1
        };
    }

    fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        if self.field() == SheetField::Date {
            if self.editing {
                self.date_state = DateInputState::new(self.sheet.sheet_date);
                self.date_state.toggle_editing();
            } else {
                self.date_state.editing = false;
                self.sheet.sheet_date = self.date_state.date;
            }
        }
        if !self.editing {
            self.editing_line = None;
        }
    }

    fn text_field(&mut self, field: SheetField) -> Option<&mut String> {
        match field {
            SheetField::ClientName => Some(&mut self.sheet.client_name),
            SheetField::ClientEmail => Some(&mut self.sheet.client_email),
            SheetField::ClientPhone1 => Some(&mut self.sheet.client_phone1),
            SheetField::ClientPhone2 => Some(&mut self.sheet.client_phone2),
            SheetField::Contractor => Some(&mut self.sheet.contractor),
            SheetField::Sites => Some(&mut self.sites_input),
            _ => None,
        }
    }

    fn field_display(&self, field: SheetField) -> String {
        match field {
            SheetField::ClientName => self.sheet.client_name.clone(),
            SheetField::ClientEmail => self.sheet.client_email.clone(),
            SheetField::ClientPhone1 => self.sheet.client_phone1.clone(),
            SheetField::ClientPhone2 => self.sheet.client_phone2.clone(),
            SheetField::Contractor => self.sheet.contractor.clone(),
            SheetField::Sites => self.sites_input.clone(),
            SheetField::Date => {
                if self.editing && self.field() == SheetField::Date {
                    self.date_state.display_string()
                } else {
                    self.sheet.sheet_date.format("%d/%m/%Y").to_string()
                }
            }
            SheetField::Lines => format!("{} líneas", self.sheet.lines.len()),
        }
    }

    fn add_line(&mut self) {
        self.sheet.lines.push(SheetLine::new());
        let index = self.sheet.lines.len() - 1;
        self.lines_list_state.select(Some(index));
        self.editing_line = Some((index, 0));
    }

    fn edit_selected_line(&mut self) {
        if let Some(index) = self.lines_list_state.selected() {
            if index < self.sheet.lines.len() {
                self.editing_line = Some((index, 0));
            }
        }
    }

    fn delete_selected_line(&mut self) {
        if let Some(index) = self.lines_list_state.selected() {
            if index < self.sheet.lines.len() {
                self.sheet.lines.remove(index);
                if self.sheet.lines.is_empty() {
                    self.lines_list_state.select(None);
                } else {
                    self.lines_list_state
                        .select(Some(index.min(self.sheet.lines.len() - 1)));
                }
                self.editing_line = None;
            }
        }
    }

    fn line_field_value(&mut self, index: usize, field: LineField) -> &mut String {
        let line = &mut self.sheet.lines[index];
        match field {
            LineField::Activity => &mut line.activity,
            LineField::Description => &mut line.description,
            LineField::Length => &mut line.length,
            LineField::Height => &mut line.height,
            LineField::Quantity => &mut line.quantity,
            LineField::Notes => &mut line.notes,
            LineField::WorkerPrice => line.worker_price.get_or_insert_with(String::new),
            LineField::WorkerValue => line.worker_value.get_or_insert_with(String::new),
            LineField::ContractorPrice => line.contractor_price.get_or_insert_with(String::new),
            LineField::ContractorValue => line.contractor_value.get_or_insert_with(String::new),
        }
    }

    fn line_field_display(&self, index: usize, field: LineField) -> String {
        let line = &self.sheet.lines[index];
        match field {
            LineField::Activity => line.activity.clone(),
            LineField::Description => line.description.clone(),
            LineField::Length => line.length.clone(),
            LineField::Height => line.height.clone(),
            LineField::Quantity => line.quantity.clone(),
            LineField::Notes => line.notes.clone(),
            LineField::WorkerPrice => line.worker_price.clone().unwrap_or_default(),
            LineField::WorkerValue => line.worker_value.clone().unwrap_or_default(),
            LineField::ContractorPrice => line.contractor_price.clone().unwrap_or_default(),
            LineField::ContractorValue => line.contractor_value.clone().unwrap_or_default(),
        }
    }

    fn on_activity_field(&self) -> bool {
        match self.editing_line {
            Some((_, pos)) => LineField::sequence(self.sheet.priced)[pos] == LineField::Activity,
            None => false,
        }
    }

    /// Step the line's activity through the catalogue. A value typed by hand
    /// starts the cycle from the beginning; the label stays editable text.
    fn cycle_activity(&mut self, forward: bool) {
        let Some((index, _)) = self.editing_line else {
            return;
        };
        if self.activities.is_empty() {
            return;
        }
        let len = self.activities.len();
        let current = self
            .activities
            .iter()
            .position(|a| *a == self.sheet.lines[index].activity);
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        self.sheet.lines[index].activity = self.activities[next].clone();
    }

    fn advance_line_field(&mut self) {
        if let Some((index, pos)) = self.editing_line {
            let sequence = LineField::sequence(self.sheet.priced);
            if pos + 1 < sequence.len() {
                self.editing_line = Some((index, pos + 1));
            } else {
                self.editing_line = None;
            }
        }
    }

    fn edit_line_field(&mut self, key: KeyCode) {
        if let Some((index, pos)) = self.editing_line {
            let field = LineField::sequence(self.sheet.priced)[pos];
            let value = self.line_field_value(index, field);
            match key {
                KeyCode::Char(c) => value.push(c),
                KeyCode::Backspace => {
                    value.pop();
                }
                _ => return,
            }
            // The total follows every dimension edit immediately.
            if matches!(
                field,
                LineField::Length | LineField::Height | LineField::Quantity
            ) {
                self.sheet.lines[index].recompute_total();
            }
        }
    }

    fn select_previous_line(&mut self) {
        let len = self.sheet.lines.len();
        if len == 0 {
            return;
        }
        let i = match self.lines_list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.lines_list_state.select(Some(i));
    }

    fn select_next_line(&mut self) {
        let len = self.sheet.lines.len();
        if len == 0 {
            return;
        }
        let i = match self.lines_list_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.lines_list_state.select(Some(i));
    }

    fn to_sheet(&self) -> MeasurementSheet {
        let mut sheet = self.sheet.clone();
        sheet.site_names = self
            .sites_input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        sheet.sheet_date = self.date_state.date;
        sheet
    }

    fn total_sum(&self) -> f64 {
        self.sheet
            .lines
            .iter()
            .filter_map(|line| line.total.parse::<f64>().ok())
            .sum()
    }
}

pub fn render_sheet_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut SheetWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(9),
                Constraint::Min(8),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    let kind = if state.sheet.priced {
        "hoja de mediciones precio"
    } else {
        "hoja de mediciones"
    };
    let title_text = if state.sheet.id == 0 {
        format!("Nueva {}", kind)
    } else {
        format!("Editar {}", kind)
    };
    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    render_header_fields(frame, state, chunks[1]);
    render_lines(frame, state, chunks[2]);

    let help_text = match (state.editing, state.field(), state.editing_line.is_some()) {
        (false, _, _) => "Enter - Editar campo | Arriba/Abajo - Navegar | S - Guardar | Esc - Cancelar",
        (true, SheetField::Date, _) => {
            "Enter - Guardar campo | Izquierda/Derecha - Parte de la fecha | Esc - Cancelar edición"
        }
        (true, SheetField::Lines, true) => {
            if state.on_activity_field() && !state.activities.is_empty() {
                "Arriba/Abajo - Elegir actividad | Enter/Tab - Siguiente campo | Esc - Terminar línea"
            } else {
                "Enter/Tab - Siguiente campo | Esc - Terminar línea"
            }
        }
        (true, SheetField::Lines, false) => {
            "A - Añadir línea | E - Editar | D - Borrar | Enter - Terminar | Esc - Cancelar"
        }
        (true, _, _) => "Enter - Guardar campo | Esc - Cancelar edición",
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[3]);

    if let Some(error) = &state.error {
        render_error(frame, frame.size(), error);
    }
}

fn render_header_fields<B: Backend>(frame: &mut Frame<B>, state: &SheetWizardState, area: Rect) {
    let items: Vec<ListItem> = FIELD_ORDER[..FIELD_ORDER.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let value = state.field_display(*field);
            let active = i == state.current_field;
            let content = if active && state.editing {
                let shown = if *field == SheetField::Date {
                    value
                } else {
                    format!("{}|", value)
                };
                Spans::from(vec![
                    Span::styled(
                        format!("{}: ", field_label(*field)),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(shown, Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                let style = if active {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Spans::from(vec![
                    Span::styled(format!("{}: ", field_label(*field)), style),
                    Span::raw(value),
                ])
            };
            ListItem::new(content)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Cabecera"));
    frame.render_widget(list, area);
}

fn render_lines<B: Backend>(frame: &mut Frame<B>, state: &mut SheetWizardState, area: Rect) {
    let lines_active = state.field() == SheetField::Lines;
    let block = Block::default()
        .title(format!(
            "Líneas (total {:.2})",
            state.total_sum()
        ))
        .borders(Borders::ALL)
        .border_style(if lines_active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });

    if let (true, Some((index, pos))) = (lines_active && state.editing, state.editing_line) {
        // Field-by-field editor for one line.
        let sequence = LineField::sequence(state.sheet.priced);
        let items: Vec<ListItem> = sequence
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let value = state.line_field_display(index, *field);
                let content = if i == pos {
                    Spans::from(vec![
                        Span::styled(
                            format!("{}: ", field.label()),
                            Style::default().fg(Color::Yellow),
                        ),
                        Span::styled(
                            format!("{}|", value),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ])
                } else {
                    Spans::from(vec![
                        Span::raw(format!("{}: ", field.label())),
                        Span::raw(value),
                    ])
                };
                ListItem::new(content)
            })
            .collect();

        let editor = List::new(items).block(block);
        frame.render_widget(editor, area);
    } else {
        let items: Vec<ListItem> = state
            .sheet
            .lines
            .iter()
            .map(|line| {
                ListItem::new(format!(
                    "{} | {} | L:{} H:{} N:{} = {}",
                    line.activity,
                    line.description,
                    line.length,
                    line.height,
                    line.quantity,
                    line.total
                ))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_stateful_widget(list, area, &mut state.lines_list_state);
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

pub fn handle_input(state: &mut SheetWizardState) -> Result<Option<SheetWizardAction>> {
    if let Event::Key(key) = event::read()? {
        if state.error.is_some() {
            state.error = None;
            return Ok(None);
        }

        let in_lines = state.field() == SheetField::Lines;

        match key.code {
            KeyCode::Esc => {
                if state.editing_line.is_some() {
                    state.editing_line = None;
                } else if state.editing {
                    state.toggle_editing();
                } else {
                    return Ok(Some(SheetWizardAction::Cancel));
                }
            }
            KeyCode::Enter => {
                if in_lines && state.editing {
                    if state.editing_line.is_some() {
                        state.advance_line_field();
                    } else {
                        state.toggle_editing();
                    }
                } else {
                    state.toggle_editing();
                }
            }
            KeyCode::Tab if in_lines && state.editing && state.editing_line.is_some() => {
                state.advance_line_field();
            }
            KeyCode::Char('s') if !state.editing => {
                let sheet = state.to_sheet();
                match sheet.validate() {
                    Ok(()) => return Ok(Some(SheetWizardAction::Save(sheet))),
                    Err(err) => state.error = Some(err.to_string()),
                }
            }
            KeyCode::Char('a')
                if in_lines && state.editing && state.editing_line.is_none() =>
            {
                state.add_line();
            }
            KeyCode::Char('e')
                if in_lines && state.editing && state.editing_line.is_none() =>
            {
                state.edit_selected_line();
            }
            KeyCode::Char('d')
                if in_lines && state.editing && state.editing_line.is_none() =>
            {
                state.delete_selected_line();
            }
            KeyCode::Up if !state.editing => state.previous_field(),
            KeyCode::Down if !state.editing => state.next_field(),
            KeyCode::Up if in_lines && state.editing && state.editing_line.is_none() => {
                state.select_previous_line();
            }
            KeyCode::Down if in_lines && state.editing && state.editing_line.is_none() => {
                state.select_next_line();
            }
            KeyCode::Up if state.editing && state.on_activity_field() => {
                state.cycle_activity(false);
            }
            KeyCode::Down if state.editing && state.on_activity_field() => {
                state.cycle_activity(true);
            }
            other if state.editing => {
                if state.editing_line.is_some() {
                    state.edit_line_field(other);
                } else if state.field() == SheetField::Date {
                    state.date_state.handle_input(other);
                    state.sheet.sheet_date = state.date_state.date;
                } else if let Some(value) = state.text_field(state.field()) {
                    match other {
                        KeyCode::Char(c) => value.push(c),
                        KeyCode::Backspace => {
                            value.pop();
                        }
                        _ => {}
                    }
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

    fn wizard() -> SheetWizardState {
        SheetWizardState::new(MeasurementSheet::new(false), Vec::new())
    }

    #[test]
    fn editing_dimensions_recomputes_the_total() {
        let mut state = wizard();
        state.add_line();
        // Move to the length field (activity, description, then length).
        state.advance_line_field();
        state.advance_line_field();
        state.edit_line_field(KeyCode::Char('2'));
        state.advance_line_field();
        state.edit_line_field(KeyCode::Char('3'));
        state.edit_line_field(KeyCode::Char('.'));
        state.edit_line_field(KeyCode::Char('5'));
        state.advance_line_field();
        // The quantity starts at "1", clear it before typing.
        state.edit_line_field(KeyCode::Backspace);
        state.edit_line_field(KeyCode::Char('4'));

        assert_eq!(state.sheet.lines[0].total, "28.00");
    }

    #[test]
    fn sites_input_splits_on_commas() {
        let mut state = wizard();
        state.sites_input = "Torre Sur, Fase 2, ".to_string();
        let sheet = state.to_sheet();
        assert_eq!(sheet.site_names, vec!["Torre Sur", "Fase 2"]);
    }

    #[test]
    fn deleting_the_last_line_clears_the_selection() {
        let mut state = wizard();
        state.add_line();
        state.editing_line = None;
        state.delete_selected_line();
        assert!(state.sheet.lines.is_empty());
        assert!(state.lines_list_state.selected().is_none());
    }

    #[test]
    fn priced_sequence_includes_price_fields() {
        let state = SheetWizardState::new(MeasurementSheet::new(true), Vec::new());
        let sequence = LineField::sequence(state.sheet.priced);
        assert_eq!(sequence.len(), 10);
        assert_eq!(sequence[6], LineField::WorkerPrice);
    }

    #[test]
    fn activity_field_cycles_through_the_catalogue() {
        let mut state = SheetWizardState::new(
            MeasurementSheet::new(false),
            vec!["Alicatado".to_string(), "Enfoscado".to_string()],
        );
        state.add_line();
        assert!(state.on_activity_field());

        state.cycle_activity(true);
        assert_eq!(state.sheet.lines[0].activity, "Alicatado");
        state.cycle_activity(true);
        assert_eq!(state.sheet.lines[0].activity, "Enfoscado");
        state.cycle_activity(true);
        assert_eq!(state.sheet.lines[0].activity, "Alicatado");
        state.cycle_activity(false);
        assert_eq!(state.sheet.lines[0].activity, "Enfoscado");

        // Free text stays allowed on top of a picked value.
        state.edit_line_field(KeyCode::Char('s'));
        assert_eq!(state.sheet.lines[0].activity, "Enfoscados");
    }

    #[test]
    fn empty_catalogue_leaves_the_activity_untouched() {
        let mut state = wizard();
        state.add_line();
        state.cycle_activity(true);
        assert_eq!(state.sheet.lines[0].activity, "");
    }
}
