//! miIO adapter error types.

use daylight_domain::error::DaylightError;

/// Errors raised while talking to a miIO device.
#[derive(Debug, thiserror::Error)]
pub enum MiioError {
    /// The device token is not 32 hex characters.
    #[error("invalid device token")]
    InvalidToken,

    /// The model needs a vendor device id but the record has none.
    #[error("device record is missing the vendor did")]
    MissingDid,

    /// Socket I/O failed.
    #[error("UDP I/O error")]
    Io(#[from] std::io::Error),

    /// The device did not answer in time.
    #[error("device did not answer within {0:?}")]
    Timeout(std::time::Duration),

    /// A datagram did not follow the wire format.
    #[error("malformed packet: {0}")]
    Malformed(&'static str),

    /// The packet checksum does not match its content.
    #[error("packet checksum mismatch")]
    Checksum,

    /// The payload could not be decrypted with the device token.
    #[error("failed to decrypt payload")]
    Decrypt,

    /// The decrypted payload is not the expected JSON.
    #[error("invalid JSON payload")]
    Json(#[from] serde_json::Error),

    /// The device answered with an error object.
    #[error("device error {code}: {message}")]
    Device { code: i64, message: String },

    /// The device answered with a result of an unexpected shape.
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),
}

impl MiioError {
    /// Convert into a [`DaylightError::Transport`] for propagation across
    /// port boundaries.
    pub fn into_domain(self) -> DaylightError {
        DaylightError::Transport(Box::new(self))
    }
}

impl From<MiioError> for DaylightError {
    fn from(err: MiioError) -> Self {
        err.into_domain()
    }
}
