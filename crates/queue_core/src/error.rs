use thiserror::Error;

/// Shown whenever the server could not be reached at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Open API server is unavailable";

/// Why a remote call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// No response reached us: connect, DNS, timeout.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with an error body.
    #[error("rejected by server: {0}")]
    Rejected(String),
}

impl RemoteError {
    /// Text for the notification area. Server text is passed through verbatim.
    pub fn user_message(&self) -> &str {
        match self {
            RemoteError::Transport(_) => NETWORK_ERROR_MESSAGE,
            RemoteError::Rejected(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_details_stay_out_of_user_message() {
        let err = RemoteError::Transport("dns error: no such host".into());
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
        assert!(err.to_string().contains("no such host"));
    }

    #[test]
    fn rejection_text_is_verbatim() {
        let err = RemoteError::Rejected("Queue item not found".into());
        assert_eq!(err.user_message(), "Queue item not found");
    }
}
