//! Local argument checks run before any request is sent.

use super::ClientError;

/// Shortest accepted phone number, in digits.
pub const MIN_PHONE_DIGITS: usize = 7;

/// Longest accepted phone number, in digits (E.164).
pub const MAX_PHONE_DIGITS: usize = 15;

/// Longest accepted text message body, in characters.
pub const MAX_TEXT_LENGTH: usize = 4096;

/// Longest accepted media caption, in characters.
pub const MAX_CAPTION_LENGTH: usize = 1024;

/// Strips everything but digits and checks the remaining length.
///
/// ```
/// use wa_cloud::client::normalize_phone_number;
///
/// assert_eq!(normalize_phone_number("+1 (555) 123-4567").unwrap(), "15551234567");
/// assert!(normalize_phone_number("12345").is_err());
/// ```
///
/// # Errors
///
/// Returns [`ClientError::Validation`] if fewer than 7 or more than 15
/// digits remain.
pub fn normalize_phone_number(phone: &str) -> Result<String, ClientError> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();

    if (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        Ok(digits)
    } else {
        Err(ClientError::validation(
            "phone number",
            format!(
                "'{phone}' must contain {MIN_PHONE_DIGITS} to {MAX_PHONE_DIGITS} digits, found {}",
                digits.len()
            ),
        ))
    }
}

pub(super) fn text_body(body: &str) -> Result<(), ClientError> {
    if body.trim().is_empty() {
        return Err(ClientError::validation("message body", "must not be empty"));
    }
    max_chars("message body", body, MAX_TEXT_LENGTH)
}

pub(super) fn caption(caption: Option<&str>) -> Result<(), ClientError> {
    caption.map_or(Ok(()), |c| max_chars("caption", c, MAX_CAPTION_LENGTH))
}

pub(super) fn coordinates(latitude: f64, longitude: f64) -> Result<(), ClientError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ClientError::validation(
            "latitude",
            format!("{latitude} is outside [-90, 90]"),
        ));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ClientError::validation(
            "longitude",
            format!("{longitude} is outside [-180, 180]"),
        ));
    }
    Ok(())
}

pub(super) fn identifier(field: &'static str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        Err(ClientError::validation(field, "must not be empty"))
    } else {
        Ok(())
    }
}

fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ClientError> {
    let len = value.chars().count();
    if len > max {
        Err(ClientError::validation(
            field,
            format!("{len} characters exceeds the limit of {max}"),
        ))
    } else {
        Ok(())
    }
}
