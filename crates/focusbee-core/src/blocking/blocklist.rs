//! Blocked domains and the blocking switch.
//!
//! Entries have set semantics on the normalized domain: `https://www.YouTube.com/`
//! and `youtube.com` are the same entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::storage::{self, keys, Store};

/// Sites seeded on first use.
pub const DEFAULT_BLOCKED: [&str; 3] = ["youtube.com", "facebook.com", "tiktok.com"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedUrlEntry {
    pub id: Uuid,
    /// Normalized domain, optionally followed by a path.
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl BlockedUrlEntry {
    fn new(url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            created_at: Utc::now(),
        }
    }
}

/// Strip scheme, leading `www.` and one trailing slash, then lowercase.
pub fn normalize(input: &str) -> String {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www
        .strip_suffix('/')
        .unwrap_or(without_www)
        .to_string()
}

fn valid_host(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| (2..=6).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_lowercase()));
    labels_ok && tld_ok
}

fn valid_path(path: &str) -> bool {
    path.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '.' | '-' | '/'))
}

/// True when a normalized value looks like `domain.tld[/path]`.
pub fn is_valid(normalized: &str) -> bool {
    let (host, path) = match normalized.split_once('/') {
        Some((host, path)) => (host, path),
        None => (normalized, ""),
    };
    valid_host(host) && valid_path(path)
}

/// Blocked domains plus the global on/off switch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocklist {
    entries: Vec<BlockedUrlEntry>,
    enabled: bool,
}

impl Blocklist {
    pub fn new(entries: Vec<BlockedUrlEntry>, enabled: bool) -> Self {
        Self { entries, enabled }
    }

    /// Seeded list with blocking switched off.
    pub fn with_defaults() -> Self {
        let entries = DEFAULT_BLOCKED
            .iter()
            .map(|d| BlockedUrlEntry::new((*d).to_string()))
            .collect();
        Self::new(entries, false)
    }

    /// Load from `store`. A missing list is created on first use (seeded when
    /// `seed_defaults`) and written back; a missing flag means disabled.
    pub fn load(store: &impl Store, seed_defaults: bool) -> Self {
        let enabled = storage::load::<bool>(store, keys::IS_BLOCKING).unwrap_or(false);
        match storage::load::<Vec<BlockedUrlEntry>>(store, keys::BLOCKED_URLS) {
            Some(entries) => Self::new(entries, enabled),
            None => {
                let list = if seed_defaults {
                    Self::with_defaults()
                } else {
                    Self::default()
                };
                storage::persist(store, keys::BLOCKED_URLS, &list.entries);
                Self::new(list.entries, enabled)
            }
        }
    }

    pub fn save_entries(&self, store: &impl Store) {
        storage::persist(store, keys::BLOCKED_URLS, &self.entries);
    }

    pub fn save_enabled(&self, store: &impl Store) {
        storage::persist(store, keys::IS_BLOCKING, &self.enabled);
    }

    pub fn entries(&self) -> &[BlockedUrlEntry] {
        &self.entries
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.url.as_str())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when blocking is on and there is something to block.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.entries.is_empty()
    }

    pub fn contains(&self, input: &str) -> bool {
        let wanted = normalize(input);
        self.entries.iter().any(|e| normalize(&e.url) == wanted)
    }

    /// Normalize, validate and prepend `input`.
    ///
    /// # Errors
    /// `InvalidDomain` for malformed input, `DuplicateDomain` when the
    /// normalized domain is already listed.
    pub fn add(&mut self, input: &str) -> Result<&BlockedUrlEntry, ValidationError> {
        let cleaned = normalize(input);
        if !is_valid(&cleaned) {
            return Err(ValidationError::InvalidDomain(input.trim().to_string()));
        }
        if self.contains(&cleaned) {
            return Err(ValidationError::DuplicateDomain(cleaned));
        }
        self.entries.insert(0, BlockedUrlEntry::new(cleaned));
        self.entries
            .first()
            .ok_or_else(|| ValidationError::InvalidDomain(input.to_string()))
    }

    /// Remove by entry id or by (normalized) domain.
    pub fn remove(&mut self, id_or_domain: &str) -> Result<BlockedUrlEntry, ValidationError> {
        let wanted = normalize(id_or_domain);
        let position = self
            .entries
            .iter()
            .position(|e| e.id.to_string() == id_or_domain.trim() || normalize(&e.url) == wanted)
            .ok_or_else(|| ValidationError::NotFound {
                kind: "blocked site",
                id: id_or_domain.to_string(),
            })?;
        Ok(self.entries.remove(position))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }
}
