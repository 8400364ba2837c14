//! Wire format of the surface command channel.
//!
//! Commands travel host -> surface as small script calls such as
//! `surface.setContent(3, "line\n")`. String arguments are encoded as JSON
//! string literals, which every script host accepts as string literals too,
//! so arbitrary text (quotes, backslashes, newlines, other control
//! characters) survives the trip unchanged.
//!
//! Notifications travel surface -> host as JSON objects tagged by `type`.

use serde::{Deserialize, Serialize};

/// Object every command is addressed to on the surface side
const RECEIVER: &str = "surface";

/// Errors decoding channel traffic
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("malformed notification: {0}")]
    MalformedNotification(#[from] serde_json::Error),
}

/// Command sent from the host into a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCommand {
    /// Start the surface; it answers with `ready` at some later point
    Initialize,
    /// Replace the whole buffer, tagged with the push generation
    SetContent { generation: u64, text: String },
    /// Ask for the current buffer; answered with `content`
    GetContent { request_id: u64 },
    /// Release the surface
    Dispose,
}

impl SurfaceCommand {
    /// Render the command as a script call
    pub fn encode(&self) -> String {
        match self {
            SurfaceCommand::Initialize => format!("{RECEIVER}.initialize()"),
            SurfaceCommand::SetContent { generation, text } => {
                format!("{RECEIVER}.setContent({generation}, {})", encode_str(text))
            }
            SurfaceCommand::GetContent { request_id } => {
                format!("{RECEIVER}.getContent({request_id})")
            }
            SurfaceCommand::Dispose => format!("{RECEIVER}.dispose()"),
        }
    }

    /// Parse a script call produced by [`SurfaceCommand::encode`]
    pub fn decode(script: &str) -> Result<Self, ProtocolError> {
        let malformed = || ProtocolError::MalformedCommand(script.to_string());

        let call = script
            .trim()
            .strip_prefix(RECEIVER)
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or_else(malformed)?;
        let open = call.find('(').ok_or_else(malformed)?;
        let name = &call[..open];
        let args = call[open + 1..].strip_suffix(')').ok_or_else(malformed)?;

        match name {
            "initialize" if args.trim().is_empty() => Ok(SurfaceCommand::Initialize),
            "dispose" if args.trim().is_empty() => Ok(SurfaceCommand::Dispose),
            "getContent" => {
                let request_id = args.trim().parse().map_err(|_| malformed())?;
                Ok(SurfaceCommand::GetContent { request_id })
            }
            "setContent" => {
                // The generation never contains a comma, the literal may
                let (generation, literal) = args.split_once(',').ok_or_else(malformed)?;
                let generation = generation.trim().parse().map_err(|_| malformed())?;
                let text = decode_str(literal.trim()).ok_or_else(malformed)?;
                Ok(SurfaceCommand::SetContent { generation, text })
            }
            "initialize" | "dispose" => Err(malformed()),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

/// Notification raised by a surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceNotification {
    /// Initialization finished, the command channel is live
    Ready,
    /// The surface buffer changed.
    ///
    /// `generation` is set when the change came from a host `setContent`
    /// and is `None` for direct user interaction.
    Changed {
        generation: Option<u64>,
        text: String,
    },
    /// A `setContent` round trip finished
    Applied { generation: u64 },
    /// Reply to `getContent`
    Content { request_id: u64, text: String },
}

impl SurfaceNotification {
    pub fn encode(&self) -> String {
        // Serializing a plain enum of strings and integers cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Encode text as a string literal safe to splice into a script call
pub fn encode_str(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Decode a string literal produced by [`encode_str`]
pub fn decode_str(literal: &str) -> Option<String> {
    serde_json::from_str::<String>(literal).ok()
}
