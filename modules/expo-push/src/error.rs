use thiserror::Error;

use crate::types::PushErrorCode;

pub type Result<T> = std::result::Result<T, ExpoPushError>;

#[derive(Debug, Error)]
pub enum ExpoPushError {
    /// The request never got an HTTP response.
    #[error("Push gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Expo refused the whole request (bad auth, oversized batch, outage).
    #[error("Push gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },

    #[error("Unreadable push gateway response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Push gateway returned no tickets")]
    NoTicket,

    /// The request was accepted but the message was not, per its ticket.
    #[error("Push ticket rejected ({code:?}): {message}")]
    Ticket {
        code: Option<PushErrorCode>,
        message: String,
    },
}

impl ExpoPushError {
    /// The token is dead and further sends to it will fail the same way.
    pub fn is_device_not_registered(&self) -> bool {
        matches!(
            self,
            ExpoPushError::Ticket {
                code: Some(PushErrorCode::DeviceNotRegistered),
                ..
            }
        )
    }
}
