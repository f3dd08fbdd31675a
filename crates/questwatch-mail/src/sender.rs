//! SMTP delivery using lettre.

use questwatch_core::MailConfig;
use thiserror::Error;

/// Errors raised while building or sending a mail.
#[derive(Debug, Error)]
pub enum MailError {
    /// A configured address does not parse
    #[error("bad {which} address: {reason}")]
    Address {
        /// Which address field was bad (`from` or `to`)
        which: &'static str,
        /// Parser's explanation
        reason: String,
    },

    /// The message could not be assembled
    #[error("failed to build message: {0}")]
    Build(String),

    /// The SMTP transport rejected the send
    #[error("SMTP send failed: {0}")]
    Transport(String),
}

/// Send one mail via the configured SMTP relay.
///
/// The from header is rendered as `WQ Tracker <address>`, the way the
/// original deployment signed its alerts.
pub fn send_smtp(config: &MailConfig, subject: &str, body: &str) -> Result<(), MailError> {
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{Message, SmtpTransport, Transport};

    let from = format!("WQ Tracker <{}>", config.from);
    let msg = Message::builder()
        .from(from.parse().map_err(|e| MailError::Address {
            which: "from",
            reason: format!("{e}"),
        })?)
        .to(config.to.parse().map_err(|e| MailError::Address {
            which: "to",
            reason: format!("{e}"),
        })?)
        .subject(subject)
        .body(body.to_string())
        .map_err(|e| MailError::Build(format!("{e}")))?;

    let creds = Credentials::new(config.username.clone(), config.password.clone());
    let transport = SmtpTransport::relay(&config.smtp_host)
        .map_err(|e| MailError::Transport(format!("{e}")))?
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    transport
        .send(&msg)
        .map_err(|e| MailError::Transport(format!("{e}")))?;

    tracing::info!("Sent alert mail: {}", subject);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_from_address_is_rejected() {
        let config = MailConfig {
            enabled: true,
            from: "not an address".to_string(),
            to: "tracker@example.com".to_string(),
            ..MailConfig::default()
        };
        let result = send_smtp(&config, "subject", "body");
        assert!(matches!(
            result,
            Err(MailError::Address { which: "from", .. })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = MailError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "SMTP send failed: connection refused");
    }
}
