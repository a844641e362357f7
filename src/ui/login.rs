use crate::error::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::centered_rect;

#[derive(Clone, Copy, PartialEq)]
enum LoginField {
    Username,
    Password,
}

pub struct LoginState {
    site_title: String,
    username: String,
    password: String,
    field: LoginField,
    pub error: Option<String>,
}

pub enum LoginAction {
    Exit,
    Submit { username: String, password: String },
}

impl LoginState {
    pub fn new(site_title: &str) -> Self {
        Self {
            site_title: site_title.to_string(),
            username: String::new(),
            password: String::new(),
            field: LoginField::Username,
            error: None,
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    fn edit(&mut self, key: KeyCode) {
        let value = match self.field {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        };
        match key {
            KeyCode::Char(c) => value.push(c),
            KeyCode::Backspace => {
                value.pop();
            }
            _ => {}
        }
    }
}

pub fn render_login<B: Backend>(frame: &mut Frame<B>, state: &mut LoginState) {
    let area = centered_rect(50, 50, frame.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Min(1),
            ]
            .as_ref(),
        )
        .split(area);

    let outer = Block::default()
        .title("Iniciar sesión")
        .borders(Borders::ALL);
    frame.render_widget(outer, area);

    let title = Paragraph::new(state.site_title.clone())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let username_style = if state.field == LoginField::Username {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let username = Paragraph::new(Spans::from(vec![
        Span::styled("Usuario: ", username_style),
        Span::raw(state.username.as_str()),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(username, chunks[1]);

    let password_style = if state.field == LoginField::Password {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let masked = "*".repeat(state.password.chars().count());
    let password = Paragraph::new(Spans::from(vec![
        Span::styled("Contraseña: ", password_style),
        Span::raw(masked),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(password, chunks[2]);

    let footer = if let Some(error) = &state.error {
        Paragraph::new(error.clone()).style(Style::default().fg(Color::Red))
    } else {
        Paragraph::new("Tab - Cambiar campo | Enter - Entrar | Esc - Salir")
            .style(Style::default().fg(Color::Gray))
    };
    frame.render_widget(footer.alignment(Alignment::Center), chunks[3]);
}

pub fn handle_input(state: &mut LoginState) -> Result<Option<LoginAction>> {
    if let Event::Key(key) = event::read()? {
        state.error = None;
        match key.code {
            KeyCode::Esc => return Ok(Some(LoginAction::Exit)),
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => state.toggle_field(),
            KeyCode::Enter => {
                return Ok(Some(LoginAction::Submit {
                    username: state.username.clone(),
                    password: state.password.clone(),
                }));
            }
            other => state.edit(other),
        }
    }
    Ok(None)
}
