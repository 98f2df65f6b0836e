//! Installed-application catalog and fuzzy application name resolution.
//!
//! The catalog is captured once when the assistant starts. Applications
//! installed or removed afterwards are not visible until the next start.

use crate::similarity::similarity;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum similarity a fuzzy match must exceed to be accepted.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.5;

/// Spoken names that should be resolved as a different label.
const LABEL_ALIASES: &[(&str, &str)] = &[("advanced settings", "settings")];

/// One installed application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCatalogEntry {
    /// Lower-cased display name.
    pub label: String,
    /// Platform package identifier used to launch the application.
    pub package_id: String,
}

impl AppCatalogEntry {
    /// Create an entry, lower-casing the label.
    pub fn new(label: impl Into<String>, package_id: impl Into<String>) -> Self {
        Self {
            label: label.into().to_lowercase(),
            package_id: package_id.into(),
        }
    }
}

/// Provider of the installed-application inventory.
pub trait ApplicationCatalog: Send + Sync + 'static {
    /// Point-in-time list of launchable applications.
    fn list_installed(&self) -> Vec<AppCatalogEntry>;
}

/// Fixed catalog, handy for hosts that know their applications up front.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<AppCatalogEntry>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<AppCatalogEntry>) -> Self {
        Self { entries }
    }
}

impl ApplicationCatalog for StaticCatalog {
    fn list_installed(&self) -> Vec<AppCatalogEntry> {
        self.entries.clone()
    }
}

/// Read-only snapshot of the installed applications.
#[derive(Debug, Clone, Default)]
pub struct AppCatalog {
    entries: Vec<AppCatalogEntry>,
}

impl AppCatalog {
    /// Capture the current inventory of `source`.
    pub fn snapshot(source: &dyn ApplicationCatalog) -> Self {
        let entries: Vec<AppCatalogEntry> = source
            .list_installed()
            .into_iter()
            .map(|e| AppCatalogEntry {
                label: e.label.to_lowercase(),
                package_id: e.package_id,
            })
            .collect();
        debug!(apps = entries.len(), "captured application catalog");
        Self { entries }
    }

    pub fn entries(&self) -> &[AppCatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a spoken fragment to a catalog entry.
    ///
    /// Applies the label aliases first, then [`resolve`].
    pub fn resolve(&self, fragment: &str) -> Option<&AppCatalogEntry> {
        let fragment = fragment.trim().to_lowercase();
        let fragment = LABEL_ALIASES
            .iter()
            .find(|(spoken, _)| *spoken == fragment)
            .map_or(fragment.as_str(), |(_, label)| *label);
        let label = resolve(fragment, &self.entries)?;
        self.entries.iter().find(|e| e.label == label)
    }
}

/// Resolve `fragment` to the label of an installed application.
///
/// The first entry (in catalog order) whose label contains the fragment wins
/// outright. Without a containment hit, the entry with the strictly highest
/// [`similarity`] is returned when that score exceeds
/// [`FUZZY_MATCH_THRESHOLD`]. An empty fragment or catalog resolves to
/// nothing.
///
/// # Examples
///
/// ```
/// use risa::catalog::{AppCatalogEntry, resolve};
///
/// let catalog = vec![AppCatalogEntry::new("chrome", "com.android.chrome")];
/// assert_eq!(resolve("chroem", &catalog), Some("chrome"));
/// assert_eq!(resolve("zzz", &catalog), None);
/// ```
pub fn resolve<'a>(fragment: &str, catalog: &'a [AppCatalogEntry]) -> Option<&'a str> {
    let fragment = fragment.trim().to_lowercase();
    if fragment.is_empty() || catalog.is_empty() {
        return None;
    }

    if let Some(hit) = catalog.iter().find(|e| e.label.contains(&fragment)) {
        return Some(&hit.label);
    }

    let mut best: Option<(&AppCatalogEntry, f64)> = None;
    for entry in catalog {
        let score = similarity(&fragment, &entry.label);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((entry, score));
        }
    }

    match best {
        Some((entry, score)) if score > FUZZY_MATCH_THRESHOLD => {
            debug!(%fragment, label = %entry.label, score, "fuzzy app match");
            Some(&entry.label)
        }
        _ => None,
    }
}
