use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Markup signals of script-rendered pages, in reporting order
const DYNAMIC_PATTERNS: &[(&str, &str)] = &[
    (r"__NEXT_DATA__", "Next.js detected"),
    (r"__NUXT__", "Nuxt.js detected"),
    (r"ng-app|ng-controller", "AngularJS detected"),
    (r"data-reactroot|data-react", "React detected"),
    (r"data-v-[a-f0-9]", "Vue.js detected"),
    (r"ember-view", "Ember.js detected"),
    (r"<noscript>.*enable javascript", "NoScript JavaScript warning"),
    (r#"loading["\s>]|spinner"#, "Loading indicator present"),
    (r#"<div id="(app|root|main)">\s*</div>"#, "Empty app container"),
    (r"<main[^>]*>\s*</main>", "Empty main container"),
    (r"window\.__INITIAL_STATE__", "Initial state injection"),
    (r"window\.__DATA__", "Data injection"),
];

/// Markup signals of server-rendered pages, in reporting order
const STATIC_PATTERNS: &[(&str, &str)] = &[
    (r"<article", "Article element present"),
    (r"<p>[\w\s]{50,}", "Paragraph with substantial content"),
    (r"<table[\s\S]*?<td", "Table with data"),
    (r"<ul[\s\S]*?<li[\s\S]*?<li", "List with multiple items"),
    (r#"class=".*content.*"[\s\S]{100,}"#, "Content class with data"),
];

/// A compiled, case-insensitive signal with its description
pub struct Signal {
    pub regex: Regex,
    pub description: &'static str,
}

fn compile(table: &[(&str, &'static str)]) -> Vec<Signal> {
    table
        .iter()
        .filter_map(|&(pattern, description)| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => Some(Signal { regex, description }),
                Err(e) => {
                    tracing::error!("Skipping invalid detector pattern {}: {}", pattern, e);
                    None
                }
            }
        })
        .collect()
}

pub fn dynamic_signals() -> &'static [Signal] {
    static SIGNALS: OnceLock<Vec<Signal>> = OnceLock::new();
    SIGNALS.get_or_init(|| compile(DYNAMIC_PATTERNS))
}

pub fn static_signals() -> &'static [Signal] {
    static SIGNALS: OnceLock<Vec<Signal>> = OnceLock::new();
    SIGNALS.get_or_init(|| compile(STATIC_PATTERNS))
}
