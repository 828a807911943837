use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{
    errors::DeliveryError,
    models::{Message, message::FROM_ADDRESS_OPTION},
};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Sender address for an email: the message option first, then the
/// configured default.
pub fn from_address(message: &Message, default: Option<&str>) -> Result<String, DeliveryError> {
    message
        .option_str(FROM_ADDRESS_OPTION)
        .or(default)
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            DeliveryError::fatal(
                "from_address must be included in message options or configured as DEFAULT_FROM_EMAIL",
            )
        })
}

/// Collapses runs of whitespace (including newlines) so templates can be
/// authored over several lines.
pub fn compress_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

pub fn simple_html_document(head_html: &str, body_html: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n  <head>\n    {head_html}\n  </head>\n  <body>\n    {body_html}\n  </body>\n</html>"
    )
}
