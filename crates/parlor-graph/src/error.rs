use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Messaging error code Meta returns when the 24-hour reply window has
/// closed for the recipient.
pub const MESSAGING_WINDOW_CODE: i64 = 10;

/// Messaging error code Meta returns when the app lacks permission to
/// message the recipient.
pub const PERMISSION_CODE: i64 = 3;

const MESSAGING_WINDOW_ADVICE: &str = "The 24-hour messaging window has expired. \
     The user must message you again to open a new window, or the message needs \
     an approved messaging tag.";

const PERMISSION_ADVICE: &str = "The application does not have permission to \
     message this user. Check the Meta app permissions and access token.";

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Graph API rejected the call ({status}): {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        error_type: Option<String>,
        message: String,
    },

    #[error("Invalid Graph client configuration: {0}")]
    Config(String),
}

impl GraphError {
    /// Operator-facing rewording of the send rejections Meta reports most
    /// often. Matches on the numeric code, falling back to the `(#N)`
    /// marker Meta embeds in its message text.
    pub fn send_advice(&self) -> Option<&'static str> {
        match self {
            GraphError::Api { code, message, .. } => {
                if *code == Some(MESSAGING_WINDOW_CODE) || message.contains("(#10)") {
                    Some(MESSAGING_WINDOW_ADVICE)
                } else if *code == Some(PERMISSION_CODE) || message.contains("(#3)") {
                    Some(PERMISSION_ADVICE)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
