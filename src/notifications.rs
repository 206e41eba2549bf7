//! Delivery of a single birthday greeting.

use crate::domain::UserEmail;
use crate::email_client::{DeliveryId, EmailClient};

/// Result of one delivery attempt. Failures are values, not errors, so one
/// bad recipient never aborts the others in the same campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent { delivery_id: DeliveryId },
    Failed { error: String },
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }
}

pub struct BirthdayMessage {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl BirthdayMessage {
    pub fn new(display_name: &str) -> Self {
        Self {
            subject: format!("🎉 Happy Birthday {}! 🎂", display_name),
            html_body: BIRTHDAY_HTML_TEMPLATE.replace("{name}", &html_escape(display_name)),
            text_body: BIRTHDAY_TEXT_TEMPLATE.replace("{name}", display_name),
        }
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[tracing::instrument(
    name = "Sending a birthday notification",
    skip(email_client, email_address, display_name),
    fields(recipient = %email_address)
)]
pub async fn send_birthday_notification(
    email_client: &EmailClient,
    email_address: &str,
    display_name: &str,
) -> DispatchOutcome {
    let recipient = match UserEmail::parse(email_address.to_string()) {
        Ok(recipient) => recipient,
        Err(error) => {
            tracing::warn!(%error, "Skipping a birthday user. Their stored email is invalid");
            return DispatchOutcome::Failed { error };
        }
    };

    let message = BirthdayMessage::new(display_name);
    match email_client
        .send_email(
            &recipient,
            &message.subject,
            &message.html_body,
            &message.text_body,
        )
        .await
    {
        Ok(delivery_id) => {
            tracing::info!(%delivery_id, "Birthday email sent");
            DispatchOutcome::Sent { delivery_id }
        }
        Err(error) => {
            let error = anyhow::Error::from(error);
            tracing::warn!(error.cause_chain = ?error, "Failed to send birthday email");
            DispatchOutcome::Failed {
                error: format!("{:#}", error),
            }
        }
    }
}

const BIRTHDAY_TEXT_TEMPLATE: &str = "Dear {name},

Happy Birthday!

On this special day, we want to take a moment to celebrate YOU!
May your birthday be filled with joy, laughter, and wonderful memories.
Wishing you a fantastic year ahead filled with success, happiness, and all the things you love!

Have an amazing birthday celebration!

With warm wishes,
The Birthday Reminder Team";

const BIRTHDAY_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
    body { font-family: Arial, sans-serif; background-color: #f4f4f4; margin: 0; padding: 0; }
    .container { max-width: 600px; margin: 50px auto; background: #ffffff; border-radius: 10px; overflow: hidden; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); }
    .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #ffffff; text-align: center; padding: 40px 20px; }
    .header h1 { margin: 0; font-size: 32px; }
    .content { padding: 40px 30px; text-align: center; }
    .content h2 { color: #333333; font-size: 24px; margin-bottom: 20px; }
    .content p { color: #666666; font-size: 16px; line-height: 1.6; margin-bottom: 15px; }
    .cake { font-size: 64px; margin: 20px 0; }
    .footer { background: #f8f8f8; text-align: center; padding: 20px; font-size: 14px; color: #999999; }
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>🎉 Happy Birthday! 🎉</h1>
    </div>
    <div class="content">
      <h2>Dear {name},</h2>
      <div class="cake">🎂</div>
      <p>On this special day, we want to take a moment to celebrate YOU!</p>
      <p>May your birthday be filled with joy, laughter, and wonderful memories.</p>
      <p>Wishing you a fantastic year ahead filled with success, happiness, and all the things you love!</p>
      <p><strong>Have an amazing birthday celebration!</strong></p>
    </div>
    <div class="footer">
      <p>With warm wishes,<br>The Birthday Reminder Team</p>
    </div>
  </div>
</body>
</html>"#;
