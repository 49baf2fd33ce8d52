use std::error::Error;

pub mod component;
pub mod registry;

/// Flattens an error and its sources into one line, e.g.
/// `error sending request for url (...): operation timed out`.
pub fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
