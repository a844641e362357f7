use crate::error::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

#[derive(Clone, Copy, PartialEq)]
pub enum Section {
    Companies,
    Contractors,
    Workers,
    Sites,
    Activities,
    PurchaseOrders,
    Sheets,
    PricedSheets,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Companies,
        Section::Contractors,
        Section::Workers,
        Section::Sites,
        Section::Activities,
        Section::PurchaseOrders,
        Section::Sheets,
        Section::PricedSheets,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Companies => "Empresas",
            Section::Contractors => "Constructoras",
            Section::Workers => "Trabajadores",
            Section::Sites => "Obras",
            Section::Activities => "Actividades",
            Section::PurchaseOrders => "Hojas de Pedidos",
            Section::Sheets => "Hojas de Mediciones",
            Section::PricedSheets => "Hojas de Mediciones Precio",
        }
    }
}

pub struct MenuState {
    site_title: String,
    list_state: ListState,
}

pub enum MenuAction {
    Open(Section),
    Logout,
    Exit,
}

impl MenuState {
    pub fn new(site_title: &str) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            site_title: site_title.to_string(),
            list_state,
        }
    }

    fn next(&mut self) {
        let i = match self.list_state.selected() {
            Some(i) if i >= Section::ALL.len() - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous(&mut self) {
        let i = match self.list_state.selected() {
            Some(0) | None => Section::ALL.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn selected(&self) -> Option<Section> {
        self.list_state.selected().map(|i| Section::ALL[i])
    }
}

pub fn render_menu<B: Backend>(frame: &mut Frame<B>, state: &mut MenuState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(frame.size());

    let items: Vec<ListItem> = Section::ALL
        .iter()
        .map(|section| ListItem::new(Spans::from(vec![Span::raw(section.label())])))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(state.site_title.clone())
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(list, chunks[0], &mut state.list_state);

    let buttons = Paragraph::new("<Enter> Abrir | <L> Cerrar sesión | <Esc> Salir")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[1]);
}

pub fn handle_input(state: &mut MenuState) -> Result<Option<MenuAction>> {
    if let Event::Key(key) = event::read()? {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(MenuAction::Exit)),
            KeyCode::Char('l') => return Ok(Some(MenuAction::Logout)),
            KeyCode::Down => state.next(),
            KeyCode::Up => state.previous(),
            KeyCode::Enter => {
                if let Some(section) = state.selected() {
                    return Ok(Some(MenuAction::Open(section)));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}
