//! Node selection and value reading over `scraper`

use super::SelectorError;
use scraper::{ElementRef, Html, Selector};

/// Where a selector is evaluated
#[derive(Clone, Copy)]
pub enum Scope<'a> {
    /// The whole document
    Document(&'a Html),
    /// Descendants of one element
    Element(ElementRef<'a>),
}

impl<'a> Scope<'a> {
    /// The element a `.` selector refers to
    pub fn element(&self) -> ElementRef<'a> {
        match self {
            Scope::Document(document) => document.root_element(),
            Scope::Element(element) => *element,
        }
    }
}

/// True for selectors that refer to the scope element itself
pub fn is_self_selector(selector: &str) -> bool {
    matches!(selector.trim(), "." | ":scope")
}

pub fn compile(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError::InvalidCss {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// All elements matching the selector, in document order
pub fn select_all<'a>(scope: Scope<'a>, selector: &str) -> Result<Vec<ElementRef<'a>>, SelectorError> {
    if is_self_selector(selector) {
        return Ok(vec![scope.element()]);
    }

    let selector = compile(selector)?;
    Ok(match scope {
        Scope::Document(document) => document.select(&selector).collect(),
        Scope::Element(element) => element.select(&selector).collect(),
    })
}

/// First element matching the selector
pub fn select_first<'a>(scope: Scope<'a>, selector: &str) -> Result<Option<ElementRef<'a>>, SelectorError> {
    if is_self_selector(selector) {
        return Ok(Some(scope.element()));
    }

    let selector = compile(selector)?;
    Ok(match scope {
        Scope::Document(document) => document.select(&selector).next(),
        Scope::Element(element) => element.select(&selector).next(),
    })
}

/// Attribute value, or None if absent or empty
pub fn attribute(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// All descendant text, whitespace-collapsed; None if nothing remains
pub fn text(element: ElementRef<'_>) -> Option<String> {
    collapse_whitespace(element.text())
}

/// Text of the element's direct text children only
pub fn own_text(element: ElementRef<'_>) -> Option<String> {
    collapse_whitespace(
        element
            .children()
            .filter_map(|child| child.value().as_text().map(|text| &**text)),
    )
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined: String = parts.collect();
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
