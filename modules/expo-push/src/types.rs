use serde::{Deserialize, Serialize};

/// A single push message for the Expo `/push/send` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl PushMessage {
    pub fn new(to: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            title: title.into(),
            body: body.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Per-message result returned by Expo.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PushTicket {
    pub status: TicketStatus,
    pub id: Option<String>,
    pub message: Option<String>,
    pub details: Option<TicketDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TicketDetails {
    pub error: Option<PushErrorCode>,
}

/// `details.error` on an error ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PushErrorCode {
    DeviceNotRegistered,
    MessageTooBig,
    MessageRateExceeded,
    MismatchSenderId,
    InvalidCredentials,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Ok,
    Error,
}

/// Wrapper for Expo API responses. A single message yields a single ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct PushResponse {
    pub data: PushResponseData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PushResponseData {
    One(PushTicket),
    Many(Vec<PushTicket>),
}

impl PushResponseData {
    pub fn into_first(self) -> Option<PushTicket> {
        match self {
            PushResponseData::One(ticket) => Some(ticket),
            PushResponseData::Many(tickets) => tickets.into_iter().next(),
        }
    }
}
