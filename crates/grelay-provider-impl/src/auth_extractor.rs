use grelay_provider_core::{Headers, header_set};

pub fn set_bearer(headers: &mut Headers, access_token: &str) {
    header_set(headers, "Authorization", format!("Bearer {access_token}"));
}

pub fn set_content_type_json(headers: &mut Headers) {
    header_set(headers, "Content-Type", "application/json");
}

/// `Accept` matching the body the caller expects back.
pub fn set_accept(headers: &mut Headers, is_stream: bool) {
    let value = if is_stream {
        "text/event-stream"
    } else {
        "application/json"
    };
    header_set(headers, "Accept", value);
}

pub fn set_header(headers: &mut Headers, name: &str, value: &str) {
    header_set(headers, name, value);
}
