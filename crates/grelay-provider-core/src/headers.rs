/// Ordered header list; names compare case-insensitively.
pub type Headers = Vec<(String, String)>;

/// Replaces the first header named `name`, or appends it.
pub fn header_set(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    match headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
    {
        Some((_, slot)) => *slot = value,
        None => headers.push((name, value)),
    }
}

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

pub fn header_remove(headers: &mut Headers, name: &str) -> Option<String> {
    let idx = headers
        .iter()
        .position(|(existing, _)| existing.eq_ignore_ascii_case(name))?;
    Some(headers.remove(idx).1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_case_insensitively() {
        let mut headers = Headers::new();
        header_set(&mut headers, "Authorization", "Bearer a");
        header_set(&mut headers, "authorization", "Bearer b");
        assert_eq!(headers.len(), 1);
        assert_eq!(header_get(&headers, "AUTHORIZATION"), Some("Bearer b"));
        assert_eq!(header_remove(&mut headers, "Authorization").as_deref(), Some("Bearer b"));
        assert!(headers.is_empty());
    }
}
