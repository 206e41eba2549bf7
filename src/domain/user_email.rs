use std::fmt::Display;

use validator::validate_email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEmail(String);

impl UserEmail {
    /// Addresses are stored lowercased, so uniqueness ignores case.
    pub fn parse(s: String) -> Result<Self, String> {
        let s = s.trim().to_lowercase();
        match validate_email(&s) {
            true => Ok(Self(s)),
            false => Err(format!("{} is not a valid email address", s)),
        }
    }
}

impl Display for UserEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
