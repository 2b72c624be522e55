use serde::{Deserialize, Serialize};

/// How a field's selector is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    #[default]
    Css,
    Xpath,
}

/// Which fetch strategy to use for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMode {
    /// Let the page type detector pick the primary strategy
    #[default]
    Auto,
    /// Plain HTTP first, rendered browser as fallback
    Static,
    /// Rendered browser first, plain HTTP as fallback
    Dynamic,
}

/// One named value to extract per record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldSpec {
    /// Record key; unique within a schema
    pub name: String,

    /// CSS selector or XPath expression
    pub selector: String,

    #[serde(default)]
    pub selector_kind: SelectorKind,

    /// Attribute to read instead of the text content
    #[serde(default)]
    pub attribute: Option<String>,

    /// Collect every match instead of the first one
    #[serde(default)]
    pub multiple: bool,

    /// Substituted when extraction yields nothing or fails
    #[serde(default)]
    pub default: Option<String>,
}

impl FieldSpec {
    /// Creates a CSS text field with no attribute, default or multiplicity
    pub fn css(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            selector_kind: SelectorKind::Css,
            attribute: None,
            multiple: false,
            default: None,
        }
    }

    /// Creates an XPath text field
    pub fn xpath(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            selector_kind: SelectorKind::Xpath,
            ..Self::css(name, selector)
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// Pagination behaviour for a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PaginationConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Selector for the "next page" link; its `href` is followed
    #[serde(default)]
    pub next_page_selector: Option<String>,

    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_max_pages() -> u32 {
    5
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            next_page_selector: None,
            max_pages: default_max_pages(),
        }
    }
}

impl PaginationConfig {
    /// Number of loop iterations the engine may run
    pub fn page_budget(&self) -> u32 {
        if self.enabled {
            self.max_pages
        } else {
            1
        }
    }
}

/// A complete scrape request. Immutable for the duration of one scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScrapeRequest {
    pub url: String,

    #[serde(default)]
    pub mode: ScrapeMode,

    pub fields: Vec<FieldSpec>,

    /// Repeating element; one record per match when set
    #[serde(default)]
    pub container_selector: Option<String>,

    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Selector the dynamic strategy waits for before capturing the page
    #[serde(default)]
    pub wait_for_selector: Option<String>,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Pause between consecutive pages of one request
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: f64,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_delay_seconds() -> f64 {
    1.0
}

impl ScrapeRequest {
    /// Creates a request with default mode, pagination and timing
    pub fn new(url: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            url: url.into(),
            mode: ScrapeMode::default(),
            fields,
            container_selector: None,
            pagination: PaginationConfig::default(),
            wait_for_selector: None,
            timeout_seconds: default_timeout_seconds(),
            delay_seconds: default_delay_seconds(),
        }
    }

    pub fn with_mode(mut self, mode: ScrapeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_container(mut self, selector: impl Into<String>) -> Self {
        self.container_selector = Some(selector.into());
        self
    }

    pub fn with_pagination(mut self, next_page_selector: impl Into<String>, max_pages: u32) -> Self {
        self.pagination = PaginationConfig {
            enabled: true,
            next_page_selector: Some(next_page_selector.into()),
            max_pages,
        };
        self
    }
}
