use url::Url;

/// Schemes left untouched when resolving extracted values
const OPAQUE_PREFIXES: &[&str] = &["http://", "https://", "data:", "javascript:"];

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None if the link should not be followed:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - hrefs that do not resolve to an http(s) URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fieldscrape::url::resolve_link;
///
/// let base = Url::parse("https://example.com/list?page=1").unwrap();
/// assert_eq!(
///     resolve_link("?page=2", &base),
///     Some("https://example.com/list?page=2".to_string())
/// );
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Resolves an extracted value against a base URL
///
/// Values that are already absolute, or use the data:/javascript: schemes,
/// are returned unchanged, as is anything the base cannot join.
pub fn resolve_against(value: &str, base_url: Option<&Url>) -> String {
    let lower = value.to_ascii_lowercase();
    if value.is_empty() || OPAQUE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return value.to_string();
    }

    match base_url.and_then(|base| base.join(value).ok()) {
        Some(joined) => joined.to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/a/page").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        assert_eq!(
            resolve_link("/other", &base_url()),
            Some("https://example.com/other".to_string())
        );
        assert_eq!(
            resolve_link("next", &base_url()),
            Some("https://example.com/a/next".to_string())
        );
    }

    #[test]
    fn test_resolve_absolute_link() {
        assert_eq!(
            resolve_link("https://other.com/p", &base_url()),
            Some("https://other.com/p".to_string())
        );
    }

    #[test]
    fn test_skip_special_links() {
        for href in ["", "  ", "#top", "javascript:void(0)", "mailto:a@b.c", "tel:+1", "data:,x"] {
            assert_eq!(resolve_link(href, &base_url()), None, "href {:?}", href);
        }
    }

    #[test]
    fn test_resolve_against_relative() {
        let base = Url::parse("https://x.com/a/").unwrap();
        assert_eq!(resolve_against("/p.png", Some(&base)), "https://x.com/p.png");
        assert_eq!(resolve_against("q.png", Some(&base)), "https://x.com/a/q.png");
    }

    #[test]
    fn test_resolve_against_leaves_absolute_and_opaque() {
        let base = Url::parse("https://x.com/a/").unwrap();
        for value in ["https://y.com/q.png", "http://y.com/", "data:image/png;base64,AA", "javascript:go()"] {
            assert_eq!(resolve_against(value, Some(&base)), value);
        }
    }

    #[test]
    fn test_resolve_against_without_base() {
        assert_eq!(resolve_against("/p.png", None), "/p.png");
    }
}
