pub mod error;
pub mod types;

pub use error::{ExpoPushError, Result};
pub use types::{PushErrorCode, PushMessage, PushResponse, PushTicket, TicketDetails, TicketStatus};

use std::time::Duration;

use tracing::{debug, warn};

pub struct ExpoPushClient {
    client: reqwest::Client,
    url: String,
    access_token: Option<String>,
}

impl ExpoPushClient {
    pub fn new(url: &str, access_token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            access_token: access_token.map(String::from),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one push message. An `error` ticket from Expo becomes `Ticket`.
    pub async fn send(&self, message: &PushMessage) -> Result<PushTicket> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(message);
        if let Some(ref token) = self.access_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Expo push request failed");
            return Err(ExpoPushError::Gateway {
                status: status.as_u16(),
                body: message,
            });
        }

        let body = resp.text().await?;
        let ticket = parse_ticket(&body)?;
        debug!(to = %message.to, ticket = ?ticket.id, "Push accepted");
        Ok(ticket)
    }
}

fn parse_ticket(body: &str) -> Result<PushTicket> {
    let response: PushResponse = serde_json::from_str(body)?;
    let ticket = response
        .data
        .into_first()
        .ok_or(ExpoPushError::NoTicket)?;

    match ticket.status {
        TicketStatus::Ok => Ok(ticket),
        TicketStatus::Error => Err(ExpoPushError::Ticket {
            code: ticket.details.and_then(|d| d.error),
            message: ticket.message.unwrap_or_else(|| "unknown error".into()),
        }),
    }
}
