//! Twilio SMS client.
//!
//! Each store carries its own Twilio sub-account credentials in its
//! document, so the client takes credentials per call instead of holding
//! them. The sender number is whichever number is provisioned first on
//! the sub-account.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use shopdesk_store::SmsAccount;

/// Twilio REST API base URL.
const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Errors that can occur when sending a text message.
#[derive(Debug, Error)]
pub enum SmsError {
    /// The HTTP request could not be performed.
    #[error("SMS request failed: {0}")]
    Request(String),

    /// The provider response could not be decoded.
    #[error("SMS response invalid: {0}")]
    Response(String),

    /// The provider rejected the message.
    #[error("SMS provider error: {0}")]
    Api(String),

    /// The sub-account has no provisioned phone number to send from.
    #[error("no provisioned sender number on sub-account")]
    NoSenderNumber,
}

/// Outbound SMS provider.
#[allow(async_fn_in_trait)]
pub trait SmsGateway {
    /// Send `body` to `to_phone` (ten digits, no country code) using the
    /// store's sub-account credentials. Returns the body as accepted by
    /// the provider.
    async fn send(&self, account: &SmsAccount, to_phone: &str, body: &str)
    -> Result<String, SmsError>;
}

/// Twilio implementation of [`SmsGateway`].
#[derive(Debug, Clone, Default)]
pub struct TwilioSmsClient {
    client: Client,
}

#[derive(Deserialize)]
struct IncomingPhoneNumbersPage {
    incoming_phone_numbers: Vec<IncomingPhoneNumber>,
}

#[derive(Deserialize)]
struct IncomingPhoneNumber {
    phone_number: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    body: Option<String>,
    message: Option<String>,
}

impl TwilioSmsClient {
    /// Create a new client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First phone number provisioned on the sub-account.
    async fn sender_number(&self, account: &SmsAccount) -> Result<String, SmsError> {
        let response = self
            .client
            .get(format!(
                "{TWILIO_API_BASE}/Accounts/{}/IncomingPhoneNumbers.json?PageSize=20",
                account.sid
            ))
            .basic_auth(&account.sid, Some(&account.auth_token))
            .send()
            .await
            .map_err(|e| SmsError::Request(e.to_string()))?;

        let page: IncomingPhoneNumbersPage = response
            .json()
            .await
            .map_err(|e| SmsError::Response(e.to_string()))?;

        page.incoming_phone_numbers
            .into_iter()
            .next()
            .map(|n| n.phone_number)
            .ok_or(SmsError::NoSenderNumber)
    }
}

impl SmsGateway for TwilioSmsClient {
    #[instrument(skip(self, account, body), fields(to = %to_phone))]
    async fn send(
        &self,
        account: &SmsAccount,
        to_phone: &str,
        body: &str,
    ) -> Result<String, SmsError> {
        let from = self.sender_number(account).await?;

        let response = self
            .client
            .post(format!(
                "{TWILIO_API_BASE}/Accounts/{}/Messages.json",
                account.sid
            ))
            .basic_auth(&account.sid, Some(&account.auth_token))
            .form(&[
                ("From", from.as_str()),
                ("To", &format!("1{to_phone}")),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| SmsError::Request(e.to_string()))?;

        let status = response.status();
        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| SmsError::Response(e.to_string()))?;

        if !status.is_success() {
            return Err(SmsError::Api(
                message
                    .message
                    .unwrap_or_else(|| format!("Twilio returned {status}")),
            ));
        }

        let sent = message
            .body
            .ok_or_else(|| SmsError::Response("message body missing".to_string()))?;

        debug!(from = %from, "SMS accepted by provider");

        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_phone_numbers_page_decodes() {
        let json = r#"{
            "incoming_phone_numbers": [
                {"phone_number": "+15550001111", "sid": "PN1"},
                {"phone_number": "+15550002222", "sid": "PN2"}
            ],
            "page_size": 20
        }"#;
        let page: IncomingPhoneNumbersPage = serde_json::from_str(json).expect("valid page");
        assert_eq!(page.incoming_phone_numbers.len(), 2);
        assert_eq!(page.incoming_phone_numbers[0].phone_number, "+15550001111");
    }

    #[test]
    fn test_message_response_decodes_success_and_error_shapes() {
        let ok: MessageResponse =
            serde_json::from_str(r#"{"body": "hi there", "sid": "SM1"}"#).expect("valid message");
        assert_eq!(ok.body.as_deref(), Some("hi there"));
        assert!(ok.message.is_none());

        let err: MessageResponse =
            serde_json::from_str(r#"{"code": 21211, "message": "Invalid 'To' number"}"#)
                .expect("valid error");
        assert!(err.body.is_none());
        assert_eq!(err.message.as_deref(), Some("Invalid 'To' number"));
    }
}
