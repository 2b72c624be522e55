//! Schema-driven record extraction
//!
//! Applies a list of `FieldSpec`s to an HTML document. With a container
//! selector every matching container yields one record, evaluated with
//! selectors scoped to that container; without one the whole document
//! yields exactly one record.
//!
//! A field that fails to evaluate (bad selector, unsupported XPath) or
//! yields no scalar value takes its default. One failing field never
//! affects the others.

pub mod query;
pub mod xpath;

use crate::model::{FieldSpec, Record, SelectorKind, Value};
use query::Scope;
use scraper::{ElementRef, Html};
use thiserror::Error;
use xpath::XPathTarget;

/// Errors evaluating a single selector
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectorError {
    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidCss { selector: String, message: String },

    #[error("Unsupported XPath expression '{expr}': {reason}")]
    UnsupportedXPath { expr: String, reason: String },
}

/// Records and pagination link read from one page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub records: Vec<Record>,
    /// Raw `href` of the next-page link, if a selector was given and matched
    pub next_href: Option<String>,
}

/// Parses the page once and reads both records and the next-page link
pub fn extract_page(
    html: &str,
    fields: &[FieldSpec],
    container_selector: Option<&str>,
    next_page_selector: Option<&str>,
) -> Result<ExtractedPage, SelectorError> {
    let document = Html::parse_document(html);

    let records = extract_from_document(&document, fields, container_selector)?;
    let next_href = match next_page_selector {
        Some(selector) => query::select_first(Scope::Document(&document), selector)?
            .and_then(|link| query::attribute(link, "href")),
        None => None,
    };

    Ok(ExtractedPage { records, next_href })
}

/// Extracts records from raw HTML
///
/// Only an invalid container selector is an error; field-level failures
/// fall back to the field default.
pub fn extract(
    html: &str,
    fields: &[FieldSpec],
    container_selector: Option<&str>,
) -> Result<Vec<Record>, SelectorError> {
    let document = Html::parse_document(html);
    extract_from_document(&document, fields, container_selector)
}

pub fn extract_from_document(
    document: &Html,
    fields: &[FieldSpec],
    container_selector: Option<&str>,
) -> Result<Vec<Record>, SelectorError> {
    let Some(container_selector) = container_selector else {
        return Ok(vec![extract_record(Scope::Document(document), fields)]);
    };

    let containers = query::select_all(Scope::Document(document), container_selector)?;
    let total = containers.len();

    let records: Vec<Record> = containers
        .into_iter()
        .map(|container| extract_record(Scope::Element(container), fields))
        .filter(|record| !record.has_no_signal())
        .collect();

    tracing::debug!(
        "Extracted {} records from {} containers matching '{}'",
        records.len(),
        total,
        container_selector
    );

    Ok(records)
}

fn extract_record(scope: Scope<'_>, fields: &[FieldSpec]) -> Record {
    fields
        .iter()
        .map(|field| (field.name.as_str(), extract_field(scope, field)))
        .collect()
}

fn extract_field(scope: Scope<'_>, field: &FieldSpec) -> Value {
    let result = match field.selector_kind {
        SelectorKind::Css => extract_css(scope, field),
        SelectorKind::Xpath => extract_xpath(scope, field),
    };

    match result {
        Ok(Value::Null) => Value::from(field.default.clone()),
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Field '{}' failed: {}", field.name, e);
            Value::from(field.default.clone())
        }
    }
}

fn extract_css(scope: Scope<'_>, field: &FieldSpec) -> Result<Value, SelectorError> {
    let attribute = field.attribute.as_deref();

    if field.multiple {
        let values = query::select_all(scope, &field.selector)?
            .into_iter()
            .map(|element| element_value(element, attribute))
            .collect();
        return Ok(Value::List(values));
    }

    Ok(query::select_first(scope, &field.selector)?
        .and_then(|element| element_value(element, attribute))
        .into())
}

fn extract_xpath(scope: Scope<'_>, field: &FieldSpec) -> Result<Value, SelectorError> {
    let translated = xpath::translate(&field.selector)?;

    let elements = match &translated.css {
        Some(css) => query::select_all(scope, css)?,
        None => vec![scope.element()],
    };

    let read = |element: ElementRef<'_>| match &translated.target {
        XPathTarget::Element => element_value(element, field.attribute.as_deref()),
        XPathTarget::Attribute(name) => query::attribute(element, name),
        XPathTarget::Text => query::own_text(element),
    };

    if field.multiple {
        return Ok(Value::List(elements.into_iter().map(read).collect()));
    }

    Ok(elements.into_iter().next().and_then(read).into())
}

fn element_value(element: ElementRef<'_>, attribute: Option<&str>) -> Option<String> {
    match attribute {
        Some(name) => query::attribute(element, name),
        None => query::text(element),
    }
}
