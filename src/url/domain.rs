use url::Url;

/// Extracts the rate-limiting key for a URL
///
/// This is the lowercase host, with the port appended when the URL carries a
/// non-default one. Unparseable input falls back to the lowercased raw string
/// so that callers always get some stable key.
///
/// # Examples
///
/// ```
/// use fieldscrape::url::domain_key;
///
/// assert_eq!(domain_key("https://EXAMPLE.com/path"), "example.com");
/// assert_eq!(domain_key("http://127.0.0.1:8080/a"), "127.0.0.1:8080");
/// ```
pub fn domain_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host.to_lowercase(), port),
            (Some(host), None) => host.to_lowercase(),
            (None, _) => url.to_lowercase(),
        },
        Err(_) => url.to_lowercase(),
    }
}
