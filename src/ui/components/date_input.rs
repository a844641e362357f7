use chrono::{Datelike, NaiveDate};
use crossterm::event::KeyCode;

// Dates are entered and shown as DD/MM/YYYY, European order.
#[derive(Clone, Copy, PartialEq)]
pub enum DatePart {
    Day,
    Month,
    Year,
}

pub struct DateInputState {
    pub date: NaiveDate,
    pub editing: bool,
    pub date_part: DatePart,
    pub pending: String,
}

impl DateInputState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            editing: false,
            date_part: DatePart::Day,
            pending: String::new(),
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        if self.editing {
            self.date_part = DatePart::Day;
            self.pending.clear();
        }
    }

    pub fn next_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Day => DatePart::Month,
            DatePart::Month => DatePart::Year,
            DatePart::Year => DatePart::Day,
        };
        self.pending.clear();
    }

    pub fn previous_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Day => DatePart::Year,
            DatePart::Month => DatePart::Day,
            DatePart::Year => DatePart::Month,
        };
        self.pending.clear();
    }

    pub fn handle_input(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.pending.push(c);
                let done = match self.date_part {
                    DatePart::Year => self.pending.len() == 4,
                    _ => self.pending.len() == 2,
                };
                if done {
                    self.apply_pending();
                    self.pending.clear();
                }
            }
            KeyCode::Backspace => {
                self.pending.pop();
            }
            KeyCode::Right => self.next_date_part(),
            KeyCode::Left => self.previous_date_part(),
            _ => {}
        }
    }

    fn apply_pending(&mut self) {
        let year = self.date.year();
        let month = self.date.month();
        let day = self.date.day();

        let candidate = match self.date_part {
            DatePart::Day => self
                .pending
                .parse::<u32>()
                .ok()
                .and_then(|d| NaiveDate::from_ymd_opt(year, month, d)),
            DatePart::Month => self
                .pending
                .parse::<u32>()
                .ok()
                .and_then(|m| NaiveDate::from_ymd_opt(year, m, day)),
            DatePart::Year => self
                .pending
                .parse::<i32>()
                .ok()
                .filter(|y| (1900..=2100).contains(y))
                .and_then(|y| NaiveDate::from_ymd_opt(y, month, day)),
        };

        // Invalid combinations (31/02, month 13) are dropped silently.
        if let Some(date) = candidate {
            self.date = date;
        }
    }

    pub fn display_string(&self) -> String {
        if !self.editing {
            return self.date.format("%d/%m/%Y").to_string();
        }

        let marker = if self.pending.is_empty() {
            match self.date_part {
                DatePart::Day => "[DD]".to_string(),
                DatePart::Month => "[MM]".to_string(),
                DatePart::Year => "[AAAA]".to_string(),
            }
        } else {
            format!("[{}]", self.pending)
        };

        let day = self.date.format("%d");
        let month = self.date.format("%m");
        let year = self.date.format("%Y");
        match self.date_part {
            DatePart::Day => format!("{}{}/{}/{}", day, marker, month, year),
            DatePart::Month => format!("{}/{}{}/{}", day, month, marker, year),
            DatePart::Year => format!("{}/{}/{}{}", day, month, year, marker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> DateInputState {
        let mut s = DateInputState::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        s.toggle_editing();
        s
    }

    #[test]
    fn typing_two_digits_sets_the_day() {
        let mut s = state();
        s.handle_input(KeyCode::Char('2'));
        s.handle_input(KeyCode::Char('8'));
        assert_eq!(s.date, NaiveDate::from_ymd_opt(2024, 3, 28).unwrap());
    }

    #[test]
    fn impossible_day_is_ignored() {
        let mut s = state();
        s.next_date_part();
        s.handle_input(KeyCode::Char('0'));
        s.handle_input(KeyCode::Char('2'));
        s.previous_date_part();
        s.handle_input(KeyCode::Char('3'));
        s.handle_input(KeyCode::Char('1'));
        // 31/02 is rejected, the date keeps its previous day.
        assert_eq!(s.date, NaiveDate::from_ymd_opt(2024, 2, 5).unwrap());
    }

    #[test]
    fn display_uses_day_month_year() {
        let mut s = state();
        s.editing = false;
        assert_eq!(s.display_string(), "05/03/2024");
    }
}
