//! Translation of a practical XPath subset into CSS selectors
//!
//! Supported:
//! - location paths starting with `//`, `/`, `./`, `.//` or a bare name,
//!   all evaluated as a descendant search from the scope
//! - `/` (child) and `//` (descendant) between steps
//! - name tests and `*`
//! - predicates `[@a]`, `[@a='v']`, `[contains(@a,'v')]` and `[n]`
//! - a trailing `/@attr` or `/text()` step
//! - `.` on its own, meaning the scope element
//!
//! Anything else (axes, functions over text, `..`, unions) is rejected.

use super::SelectorError;

/// What a translated expression yields for each matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XPathTarget {
    /// The element itself; the field's attribute setting applies
    Element,
    /// The named attribute
    Attribute(String),
    /// The element's own text nodes
    Text,
}

/// A translated XPath expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathQuery {
    /// CSS selector, or None when the expression names the scope element
    pub css: Option<String>,
    pub target: XPathTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Child,
    Descendant,
}

impl Combinator {
    fn css(self) -> &'static str {
        match self {
            Combinator::Child => " > ",
            Combinator::Descendant => " ",
        }
    }
}

/// Translates an XPath expression into a CSS query
///
/// # Examples
///
/// ```
/// use fieldscrape::extract::xpath::{translate, XPathTarget};
///
/// let query = translate("//div[@class='item']/a/@href").unwrap();
/// assert_eq!(query.css.as_deref(), Some("div[class=\"item\"] > a"));
/// assert_eq!(query.target, XPathTarget::Attribute("href".to_string()));
/// ```
pub fn translate(expr: &str) -> Result<XPathQuery, SelectorError> {
    let unsupported = |reason: &str| SelectorError::UnsupportedXPath {
        expr: expr.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(unsupported("empty expression"));
    }
    if trimmed == "." {
        return Ok(XPathQuery {
            css: None,
            target: XPathTarget::Element,
        });
    }

    let (path, relative) = if let Some(rest) = trimmed.strip_prefix(".//") {
        (rest, true)
    } else if let Some(rest) = trimmed.strip_prefix("./") {
        (rest, true)
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        (rest, false)
    } else if let Some(rest) = trimmed.strip_prefix('/') {
        (rest, false)
    } else {
        (trimmed, true)
    };

    let mut steps = split_steps(path).map_err(|reason| unsupported(reason.as_str()))?;

    let target = match steps.last().map(|(_, step)| *step) {
        Some("text()") => {
            steps.pop();
            XPathTarget::Text
        }
        Some(step) if step.starts_with('@') => {
            let name = &step[1..];
            if !is_name(name) {
                return Err(unsupported("invalid attribute step"));
            }
            steps.pop();
            XPathTarget::Attribute(name.to_string())
        }
        _ => XPathTarget::Element,
    };

    if steps.is_empty() {
        if relative {
            return Ok(XPathQuery { css: None, target });
        }
        return Err(unsupported("no element step"));
    }

    let mut css = String::new();
    for (index, (combinator, step)) in steps.iter().enumerate() {
        if index > 0 {
            css.push_str(combinator.css());
        }
        css.push_str(&translate_step(step).map_err(|reason| unsupported(reason.as_str()))?);
    }

    Ok(XPathQuery {
        css: Some(css),
        target,
    })
}

/// Splits a path on `/` and `//` outside of predicates and quotes
fn split_steps(path: &str) -> Result<Vec<(Combinator, &str)>, String> {
    let mut steps = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut combinator = Combinator::Descendant;
    let mut chars = path.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth.checked_sub(1).ok_or("unbalanced brackets")?;
            }
            (None, '/') if depth == 0 => {
                steps.push((combinator, &path[start..i]));
                combinator = if chars.peek().map(|(_, next)| *next) == Some('/') {
                    chars.next();
                    Combinator::Descendant
                } else {
                    Combinator::Child
                };
                start = i + 1;
                if combinator == Combinator::Descendant {
                    start += 1;
                }
            }
            _ => {}
        }
    }

    if quote.is_some() || depth != 0 {
        return Err("unbalanced quotes or brackets".to_string());
    }
    steps.push((combinator, &path[start..]));

    if steps.iter().any(|(_, step)| step.trim().is_empty()) {
        return Err("empty step".to_string());
    }
    Ok(steps.into_iter().map(|(c, s)| (c, s.trim())).collect())
}

fn translate_step(step: &str) -> Result<String, String> {
    let name_end = step.find('[').unwrap_or(step.len());
    let name = step[..name_end].trim();

    if name != "*" && !is_name(name) {
        return Err(format!("unsupported step '{}'", step));
    }

    let mut css = name.to_string();
    let mut rest = &step[name_end..];

    while !rest.is_empty() {
        let close = predicate_end(rest).ok_or_else(|| format!("malformed predicate in '{}'", step))?;
        css.push_str(&translate_predicate(rest[1..close].trim())?);
        rest = rest[close + 1..].trim_start();
    }

    Ok(css)
}

/// Index of the `]` closing the predicate that opens at the start of `s`
fn predicate_end(s: &str) -> Option<usize> {
    if !s.starts_with('[') {
        return None;
    }
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn translate_predicate(predicate: &str) -> Result<String, String> {
    if !predicate.is_empty() && predicate.chars().all(|c| c.is_ascii_digit()) {
        let position: u32 = predicate
            .parse()
            .map_err(|_| format!("invalid position '{}'", predicate))?;
        if position == 0 {
            return Err("positions start at 1".to_string());
        }
        return Ok(format!(":nth-of-type({})", position));
    }

    if let Some(args) = predicate
        .strip_prefix("contains(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let (attr, literal) = args
            .split_once(',')
            .ok_or_else(|| format!("contains() needs two arguments: '{}'", predicate))?;
        let attr = attr
            .trim()
            .strip_prefix('@')
            .filter(|name| is_name(name))
            .ok_or_else(|| format!("contains() only supports attributes: '{}'", predicate))?;
        let value = unquote(literal.trim())?;
        return Ok(format!("[{}*=\"{}\"]", attr, escape_css(value)));
    }

    if let Some(attr) = predicate.strip_prefix('@') {
        return match attr.split_once('=') {
            Some((name, literal)) => {
                let name = name.trim();
                if !is_name(name) {
                    return Err(format!("invalid attribute name '{}'", name));
                }
                let value = unquote(literal.trim())?;
                Ok(format!("[{}=\"{}\"]", name, escape_css(value)))
            }
            None if is_name(attr.trim()) => Ok(format!("[{}]", attr.trim())),
            None => Err(format!("invalid attribute name '{}'", attr)),
        };
    }

    Err(format!("unsupported predicate '[{}]'", predicate))
}

fn unquote(literal: &str) -> Result<&str, String> {
    let mut chars = literal.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && (open == '\'' || open == '"') => {
            Ok(&literal[1..literal.len() - 1])
        }
        _ => Err(format!("expected a quoted string, found '{}'", literal)),
    }
}

fn escape_css(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
