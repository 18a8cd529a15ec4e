//! Codec for encoding and decoding text control frames.
//!
//! A control frame is an action name followed by zero or more arguments,
//! all joined by [`SEPARATOR`]. Decoding splits off the action at the first
//! separator and keeps the remainder as one data field; handlers that need
//! positional arguments split that field again with
//! [`ControlMessage::split_args`].

/// Separator between the action and each argument.
pub const SEPARATOR: &str = "$/$";

/// Error type for codec operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Fewer arguments than the action requires
    #[error("Expected {expected} arguments, found {found}")]
    MissingArguments {
        /// Number of arguments required
        expected: usize,
        /// Number of arguments present
        found: usize,
    },

    /// An argument could not be parsed
    #[error("Invalid argument {name}: {value}")]
    InvalidArgument {
        /// Argument name
        name: &'static str,
        /// Raw argument value
        value: String,
    },
}

/// A decoded text control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    /// Action name, e.g. `ROOM.JOIN`
    pub action: String,
    /// Everything after the first separator, empty when absent
    pub data: String,
}

impl ControlMessage {
    /// Create a control message from an action and its joined data.
    pub fn new(action: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            data: data.into(),
        }
    }

    /// Split the data field into exactly `count` arguments.
    ///
    /// The last argument receives the unsplit remainder, so an opaque
    /// trailing payload may itself contain the separator.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingArguments`] when fewer than `count`
    /// arguments are present.
    pub fn split_args(&self, count: usize) -> Result<Vec<&str>, CodecError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if self.data.is_empty() {
            return Err(CodecError::MissingArguments {
                expected: count,
                found: 0,
            });
        }

        let args: Vec<&str> = self.data.splitn(count, SEPARATOR).collect();
        if args.len() < count {
            return Err(CodecError::MissingArguments {
                expected: count,
                found: args.len(),
            });
        }
        Ok(args)
    }
}

/// Decode a text frame into a control message.
///
/// Never fails: an unknown or empty action is left for the dispatcher to
/// reject so the sender still gets a `.FAILURE` response.
#[must_use]
pub fn decode_control(text: &str) -> ControlMessage {
    match text.split_once(SEPARATOR) {
        Some((action, data)) => ControlMessage::new(action, data),
        None => ControlMessage::new(text, ""),
    }
}

/// Encode an action and its arguments into a text frame.
pub fn encode_control<I, S>(action: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from(action);
    for arg in args {
        out.push_str(SEPARATOR);
        out.push_str(arg.as_ref());
    }
    out
}

/// Parse an integer argument, naming it in the error.
///
/// # Errors
///
/// Returns [`CodecError::InvalidArgument`] when `value` is not an integer.
pub fn parse_int_arg(name: &'static str, value: &str) -> Result<i32, CodecError> {
    value
        .trim()
        .parse()
        .map_err(|_| CodecError::InvalidArgument {
            name,
            value: value.to_string(),
        })
}
