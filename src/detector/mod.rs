//! Page type detection
//!
//! Decides whether a page needs a script-executing browser by fetching its
//! raw HTML once and scoring it against two tables of markup signals plus
//! a content density check. Detection never fails outward: any fetch error
//! produces a low-confidence recommendation to render.

mod patterns;

use crate::fetch::Transport;
use crate::model::{DetectionResult, ScrapeMode};
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;

/// User agent for the preliminary fetch
const DETECTOR_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Below this many visible characters a page looks like an empty shell
const LOW_DENSITY_CHARS: usize = 500;

/// Above this many visible characters a page looks server-rendered
const HIGH_DENSITY_CHARS: usize = 2000;

/// Elements whose text is never visible
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Classifies pages as static or dynamic
pub struct PageTypeDetector {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl PageTypeDetector {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Detects the page type using the configured timeout
    pub async fn detect(&self, url: &str) -> DetectionResult {
        self.detect_with_timeout(url, self.timeout).await
    }

    pub async fn detect_with_timeout(&self, url: &str, timeout: Duration) -> DetectionResult {
        let headers = [("User-Agent", DETECTOR_USER_AGENT.to_string())];

        match self.transport.get(url, &headers, timeout).await {
            Ok(response) => {
                let result = analyze_html(&response.body);
                tracing::debug!(
                    "Detected {} as {} (confidence {:.2})",
                    url,
                    if result.is_dynamic { "dynamic" } else { "static" },
                    result.confidence
                );
                result
            }
            Err(e) => {
                tracing::warn!("Page type detection failed for {}: {}", url, e);
                DetectionResult {
                    is_dynamic: true,
                    confidence: 0.5,
                    indicators: vec![format!("Detection failed: {}", e), "Defaulting to dynamic".to_string()],
                    recommended_mode: ScrapeMode::Dynamic,
                }
            }
        }
    }
}

/// Scores raw HTML and turns the scores into a recommendation
///
/// Every matching signal adds one point to its side. Pages with little
/// visible text add two points to the dynamic side; text-heavy pages add
/// one to the static side. With no points at all the page is treated as
/// static.
pub fn analyze_html(html: &str) -> DetectionResult {
    let mut indicators = Vec::new();
    let mut dynamic_score = 0u32;
    let mut static_score = 0u32;

    for signal in patterns::dynamic_signals() {
        if signal.regex.is_match(html) {
            indicators.push(format!("dynamic: {}", signal.description));
            dynamic_score += 1;
        }
    }

    for signal in patterns::static_signals() {
        if signal.regex.is_match(html) {
            indicators.push(format!("static: {}", signal.description));
            static_score += 1;
        }
    }

    let text_len = visible_text_len(html);
    if text_len < LOW_DENSITY_CHARS {
        indicators.push("dynamic: Low content density".to_string());
        dynamic_score += 2;
    } else if text_len > HIGH_DENSITY_CHARS {
        indicators.push("static: High content density".to_string());
        static_score += 1;
    }

    let total = dynamic_score + static_score;
    if total == 0 {
        return DetectionResult {
            is_dynamic: false,
            confidence: 0.5,
            indicators: vec!["No clear indicators found".to_string()],
            recommended_mode: ScrapeMode::Static,
        };
    }

    let is_dynamic = dynamic_score > static_score;
    let margin = f64::from(dynamic_score.abs_diff(static_score)) / f64::from(total);
    let confidence = (margin + 0.3).min(0.95);

    DetectionResult {
        is_dynamic,
        confidence,
        indicators,
        recommended_mode: if is_dynamic {
            ScrapeMode::Dynamic
        } else {
            ScrapeMode::Static
        },
    }
}

/// Number of characters of trimmed, visible text in the document
fn visible_text_len(html: &str) -> usize {
    let document = Html::parse_document(html);

    document
        .root_element()
        .descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
            })
        })
        .map(|(_, text)| text.trim().chars().count())
        .sum()
}
