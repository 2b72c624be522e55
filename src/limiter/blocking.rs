/// Status codes that signal rate limiting or bot protection
const BLOCKING_STATUS_CODES: &[u16] = &[403, 429, 503, 520, 521, 522, 523, 524];

/// Body phrases that signal a block or challenge page, matched case-insensitively
const BLOCKING_KEYWORDS: &[&str] = &[
    "captcha",
    "access denied",
    "rate limit",
    "too many requests",
    "cloudflare",
    "are you a robot",
    "request blocked",
];

/// Classifies a response as a block signal
///
/// A response is blocked if its status is one of the known blocking codes
/// or its body contains one of the known challenge phrases.
///
/// # Examples
///
/// ```
/// use fieldscrape::is_blocked_response;
///
/// assert!(is_blocked_response(429, ""));
/// assert!(is_blocked_response(200, "Please complete the CAPTCHA"));
/// assert!(!is_blocked_response(200, "<h1>Welcome</h1>"));
/// ```
pub fn is_blocked_response(status: u16, body: &str) -> bool {
    if BLOCKING_STATUS_CODES.contains(&status) {
        return true;
    }

    blocking_keyword(body).is_some()
}

/// Returns the first blocking phrase found in the body
pub fn blocking_keyword(body: &str) -> Option<&'static str> {
    if body.is_empty() {
        return None;
    }

    let body = body.to_lowercase();
    BLOCKING_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| body.contains(keyword))
}
