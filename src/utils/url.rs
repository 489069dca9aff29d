use std::collections::HashMap;

/// Percent-decodes a string, returning the input unchanged when the
/// escape sequences are malformed.
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Percent-encodes a string for use in a link fragment or query value.
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Parses a raw query string (`a=1&b=2`, no leading `?`) into a map.
/// Values are percent-decoded; keys are kept as-is. Later duplicates win.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if !key.is_empty() {
                params.insert(key.to_string(), url_decode(value));
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("Hong%20Kong%2001"), "Hong Kong 01");
        assert_eq!(url_decode("no-escapes"), "no-escapes");
        assert_eq!(url_decode("bad%zz"), "bad%zz");
    }

    #[test]
    fn test_parse_query() {
        let params = parse_query("sni=example.com&insecure=true&path=%2Fws");
        assert_eq!(params.get("sni").unwrap(), "example.com");
        assert_eq!(params.get("insecure").unwrap(), "true");
        assert_eq!(params.get("path").unwrap(), "/ws");
    }

    #[test]
    fn test_parse_query_ignores_flags_without_value() {
        let params = parse_query("lone&k=v");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("k").unwrap(), "v");
    }
}
