#[derive(Debug)]
pub enum ClientError {
    /// Transport-level failure talking to the push server.
    Network(String),
    /// The server answered with a status code outside 200/201.
    UnexpectedStatus { code: u16, body: String },
    /// The response body was missing or could not be parsed.
    MalformedResponse(String),
    /// The operation requires a registration that does not exist.
    InvalidState(&'static str),
    /// The local registration store could not be written.
    Storage(std::io::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Network(message) => write!(f, "network error: {message}"),
            ClientError::UnexpectedStatus { code, body } => {
                write!(f, "unexpected HTTP response code: {code}, response text: {body}")
            }
            ClientError::MalformedResponse(message) => {
                write!(f, "malformed server response: {message}")
            }
            ClientError::InvalidState(message) => f.write_str(message),
            ClientError::Storage(err) => write!(f, "failed to write registration store: {err}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Storage(err) => Some(err),
            _ => None,
        }
    }
}
