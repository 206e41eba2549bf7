use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::UserEmail;

/// Opaque token the transport hands back for an accepted message.
pub type DeliveryId = String;

pub struct EmailClient {
    http_client: Client,
    access_url: String,
    sender: UserEmail,
    authorization_token: Secret<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    #[serde(rename = "MessageID")]
    message_id: DeliveryId,
}

impl EmailClient {
    pub fn new(
        access_url: String,
        sender: UserEmail,
        authorization_token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            access_url,
            sender,
            authorization_token,
        })
    }

    /// Hands one message to the transport. Called once per message, never retried.
    pub async fn send_email(
        &self,
        recipient: &UserEmail,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<DeliveryId, reqwest::Error> {
        let url = format!("{}/email", self.access_url);
        let request_body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient.as_ref(),
            subject,
            html_body,
            text_body,
        };

        let response = self
            .http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?
            .json::<SendEmailResponse>()
            .await?;

        Ok(response.message_id)
    }
}
