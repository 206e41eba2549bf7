use std::fmt::Display;

use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar date in `YYYY-MM-DD` form that lies strictly in the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateOfBirth(NaiveDate);

impl DateOfBirth {
    /// Parses `s` and checks it against `today`, the registering host's local date.
    pub fn parse(s: &str, today: NaiveDate) -> Result<Self, String> {
        let s = s.trim();
        if !is_fixed_format(s) {
            return Err(format!("{} is not a date in YYYY-MM-DD format", s));
        }

        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|_| format!("{} is not a valid calendar date", s))?;

        if date >= today {
            return Err("Date of birth must be in the past".to_string());
        }

        Ok(Self(date))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

fn is_fixed_format(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

impl Display for DateOfBirth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}
