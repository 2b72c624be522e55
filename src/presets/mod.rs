//! Preset catalogue
//!
//! Presets are ready-made field schemas for common kinds of pages (news
//! listings, product grids, job boards...). The built-in catalogue is
//! compiled into the binary from `catalog.toml`; an optional directory of
//! extra TOML files can add presets or replace built-in ones by id.

use crate::model::{FieldSpec, ScrapeRequest};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("catalog.toml");

/// Most suggestions returned for one URL
const MAX_SUGGESTIONS: usize = 5;

/// URL keywords hinting at each category, in suggestion order
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("news", &["news", "article", "journal", "press"]),
    ("ecommerce", &["shop", "store", "buy", "product", "cart", "checkout"]),
    ("blog", &["blog", "post", "article"]),
    ("jobs", &["job", "career", "hiring", "recruit"]),
    ("real_estate", &["property", "realty", "house", "home", "rent", "sale"]),
    ("social", &["social", "twitter", "facebook", "reddit", "instagram"]),
    ("forum", &["forum", "discussion", "board", "community"]),
    ("directory", &["directory", "listing", "yellow", "business"]),
    ("video", &["video", "youtube", "vimeo", "watch"]),
];

/// A named field schema for one kind of page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Preset {
    /// Unique key; custom preset files default it to their file stem
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub category: String,

    #[serde(default)]
    pub container_selector: Option<String>,

    pub fields: Vec<FieldSpec>,

    /// Kinds of sites the preset was written for
    #[serde(default)]
    pub suitable_for: Vec<String>,
}

impl Preset {
    /// Builds a scrape request for `url` using this preset's schema
    pub fn request_for(&self, url: impl Into<String>) -> ScrapeRequest {
        let mut request = ScrapeRequest::new(url, self.fields.clone());
        request.container_selector = self.container_selector.clone();
        request
    }

    pub fn summary(&self) -> PresetSummary {
        PresetSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
        }
    }
}

/// Listing entry for a preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
}

/// A preset category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(rename = "category", default)]
    categories: Vec<Category>,
    #[serde(rename = "preset", default)]
    presets: Vec<Preset>,
}

/// Read-only preset catalogue
#[derive(Debug, Clone)]
pub struct PresetStore {
    presets: Vec<Preset>,
    categories: Vec<Category>,
}

impl PresetStore {
    /// Loads the built-in catalogue
    pub fn builtin() -> ConfigResult<Self> {
        let catalog: Catalog = toml::from_str(BUILTIN_CATALOG)?;
        Ok(Self {
            presets: catalog.presets,
            categories: catalog.categories,
        })
    }

    /// Loads the built-in catalogue and layers the presets in `dir` over it
    ///
    /// Every `*.toml` file holds one preset. Files that fail to parse or lack
    /// a category are skipped with a warning. A custom preset replaces the
    /// built-in one with the same id.
    pub fn with_custom_dir(dir: &Path) -> ConfigResult<Self> {
        let mut store = Self::builtin()?;

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        for path in paths {
            match load_custom_preset(&path) {
                Ok(preset) => store.insert(preset),
                Err(e) => tracing::warn!("Skipping custom preset {}: {}", path.display(), e),
            }
        }

        Ok(store)
    }

    fn insert(&mut self, preset: Preset) {
        tracing::debug!("Loaded custom preset '{}'", preset.id);
        match self.presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn lookup(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Summaries of all presets, or only those in `category`
    pub fn list(&self, category: Option<&str>) -> Vec<PresetSummary> {
        self.presets
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .map(Preset::summary)
            .collect()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Presets whose category keywords appear in the URL
    ///
    /// Falls back to the whole catalogue when nothing matches; at most five
    /// are returned either way.
    pub fn suggest_for_url(&self, url: &str) -> Vec<PresetSummary> {
        let url = url.to_lowercase();

        let matched: Vec<&str> = CATEGORY_KEYWORDS
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| url.contains(k)))
            .map(|(category, _)| *category)
            .collect();

        let mut suggestions: Vec<PresetSummary> = matched
            .iter()
            .flat_map(|category| self.presets.iter().filter(move |p| p.category == *category))
            .map(Preset::summary)
            .collect();

        if suggestions.is_empty() {
            suggestions = self.list(None);
        }
        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }
}

fn load_custom_preset(path: &Path) -> ConfigResult<Preset> {
    let content = std::fs::read_to_string(path)?;
    let mut preset: Preset = toml::from_str(&content)?;

    if preset.category.trim().is_empty() {
        return Err(ConfigError::Validation("preset has no category".to_string()));
    }
    if preset.id.is_empty() {
        preset.id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| ConfigError::Validation("preset has no id".to_string()))?;
    }
    Ok(preset)
}
