mod birthday_campaigns;
mod health_check;
mod users;

pub use birthday_campaigns::*;
pub use health_check::*;
pub use users::*;

use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody {
    message: String,
}

impl ErrorBody {
    pub fn new(error: &impl std::error::Error) -> Self {
        Self {
            message: error.to_string(),
        }
    }
}
