pub mod birthdays;
pub mod campaign;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod notifications;
pub mod routes;
pub mod scheduler;
pub mod startup;
pub mod telemetry;
mod utils;
