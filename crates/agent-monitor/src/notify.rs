//! Report notification channels.

use agent_core::error::NotifyError;
use agent_core::traits::Notifier;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

/// Writes the report to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(subject, "{}", body);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Longest body Twilio accepts for one message.
const MAX_SMS_CHARS: usize = 1600;

/// Twilio account and phone numbers.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
    pub api_base: String,
}

impl TwilioConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
        to_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            to_number: to_number.into(),
            api_base: "https://api.twilio.com".to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
}

/// Sends the report body as an SMS through the Twilio Messages API.
///
/// The subject is not transmitted; bodies over 1600 characters are cut.
pub struct TwilioSmsNotifier {
    config: TwilioConfig,
    client: Client,
}

impl TwilioSmsNotifier {
    pub fn new(config: TwilioConfig) -> Result<Self, NotifyError> {
        if config.account_sid.is_empty() || config.auth_token.is_empty() {
            return Err(NotifyError::Configuration(
                "Twilio account SID and auth token are required".into(),
            ));
        }
        if config.from_number.is_empty() || config.to_number.is_empty() {
            return Err(NotifyError::Configuration(
                "Twilio sender and recipient numbers are required".into(),
            ));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| NotifyError::Configuration(e.to_string()))?;
        Ok(Self { config, client })
    }
}

fn sms_body(body: &str) -> String {
    body.chars().take(MAX_SMS_CHARS).collect()
}

#[async_trait]
impl Notifier for TwilioSmsNotifier {
    async fn send(&self, _subject: &str, body: &str) -> Result<(), NotifyError> {
        let text = sms_body(body);
        let form = [
            ("To", self.config.to_number.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Body", text.as_str()),
        ];

        let resp = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Delivery(format!("{}: {}", status, text)));
        }

        let message: TwilioMessage = resp
            .json()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        debug!(chars = text.chars().count(), "SMS body sent");
        info!(sid = %message.sid, "Daily report SMS sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "twilio-sms"
    }
}

/// SMTP relay and mailbox settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender address, also the SMTP login
    pub from_address: String,
    pub password: String,
    pub to_address: String,
}

impl EmailConfig {
    pub fn new(
        smtp_host: impl Into<String>,
        smtp_port: u16,
        from_address: impl Into<String>,
        password: impl Into<String>,
        to_address: impl Into<String>,
    ) -> Self {
        Self {
            smtp_host: smtp_host.into(),
            smtp_port,
            from_address: from_address.into(),
            password: password.into(),
            to_address: to_address.into(),
        }
    }
}

/// Sends the report as a plain-text email over SMTP with STARTTLS and login.
pub struct EmailNotifier {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Result<Self, NotifyError> {
        if config.smtp_host.trim().is_empty() {
            return Err(NotifyError::Configuration("SMTP host is required".into()));
        }
        let from = parse_mailbox("sender", &config.from_address)?;
        let to = parse_mailbox("recipient", &config.to_address)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| NotifyError::Configuration(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.from_address, config.password))
            .build();

        Ok(Self {
            from,
            to,
            transport,
        })
    }

    fn message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

fn parse_mailbox(role: &str, address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e| {
        NotifyError::Configuration(format!("invalid {} address {:?}: {}", role, address, e))
    })
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.message(subject, body)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        info!(code = %response.code(), to = %self.to, "Daily report email sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_accepts_anything() {
        assert!(LogNotifier.send("Daily Trading Report", "").await.is_ok());
        assert_eq!(LogNotifier.name(), "log");
    }

    #[test]
    fn test_twilio_requires_credentials() {
        let missing = TwilioConfig::new("", "token", "+1555", "+1666");
        assert!(matches!(
            TwilioSmsNotifier::new(missing),
            Err(NotifyError::Configuration(_))
        ));
        let no_recipient = TwilioConfig::new("AC1", "token", "+1555", "");
        assert!(TwilioSmsNotifier::new(no_recipient).is_err());
    }

    #[test]
    fn test_messages_url() {
        let config = TwilioConfig::new("AC123", "t", "+1", "+2");
        assert_eq!(
            config.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    fn email_config() -> EmailConfig {
        EmailConfig::new(
            "smtp.example.com",
            587,
            "agent@example.com",
            "secret",
            "ops@example.com",
        )
    }

    #[test]
    fn test_email_message_carries_subject_and_body() {
        let notifier = EmailNotifier::new(email_config()).unwrap();
        let message = notifier
            .message("Daily Trading Report", "Daily Trading Report:\nTickers: AAPL\n")
            .unwrap();
        let text = String::from_utf8(message.formatted()).unwrap();

        assert!(text.contains("Subject: Daily Trading Report"));
        assert!(text.contains("From: agent@example.com"));
        assert!(text.contains("To: ops@example.com"));
        assert!(text.contains("Tickers: AAPL"));
        assert_eq!(notifier.name(), "email");
    }

    #[test]
    fn test_email_rejects_bad_settings() {
        let mut config = email_config();
        config.to_address = "not an address".into();
        assert!(matches!(
            EmailNotifier::new(config),
            Err(NotifyError::Configuration(_))
        ));

        let mut config = email_config();
        config.smtp_host = " ".into();
        assert!(EmailNotifier::new(config).is_err());
    }

    #[test]
    fn test_long_bodies_are_cut() {
        let body = "x".repeat(2000);
        assert_eq!(sms_body(&body).len(), MAX_SMS_CHARS);
        assert_eq!(sms_body("short"), "short");
    }
}
