use std::fmt::Display;

use unicode_segmentation::UnicodeSegmentation;

const MIN_LENGTH: usize = 2;
const MAX_LENGTH: usize = 50;
const FORBIDDEN_CHARACTERS: [char; 9] = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];

/// Display name used as the salutation of birthday emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    pub fn parse(s: String) -> Result<Self, String> {
        let s = s.trim().to_string();
        let length = s.graphemes(true).count();

        if length < MIN_LENGTH || length > MAX_LENGTH {
            return Err(format!(
                "Username must be between {} and {} characters",
                MIN_LENGTH, MAX_LENGTH
            ));
        }

        if s.chars().any(|c| FORBIDDEN_CHARACTERS.contains(&c)) {
            return Err(format!("{} contains forbidden characters", s));
        }

        Ok(Self(s))
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
