//! Builder Directory
//!
//! Maps builder pubkeys to human-readable names and assigns each builder a
//! stable display color. Names come from a CSV file with `builder` and
//! `builder_pubkey` columns, loaded once at startup.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::cache::LruTracker;
use crate::error::{AppError, Result};
use crate::models::BuilderInfo;

/// Display colors handed out to builders in order of first appearance.
pub const BUILDER_COLORS: [&str; 15] = [
    "#38bdf8", "#f472b6", "#34d399", "#fbbf24", "#a78bfa", "#fb7185", "#2dd4bf", "#f97316",
    "#818cf8", "#4ade80", "#f43f5e", "#22d3ee", "#c084fc", "#facc15", "#94a3b8",
];

/// Most builders remembered by the color assignment.
pub const MAX_BUILDER_COLORS: usize = 500;

/// Length of the pubkey prefix used as a label for unknown builders.
const LABEL_PREFIX_LEN: usize = 10;

// == Builder Directory ==
#[derive(Debug, Default)]
pub struct BuilderDirectory {
    /// Known builders in file order
    known: Vec<(String, String)>,
    names: HashMap<String, String>,
    colors: Mutex<ColorAssignments>,
}

impl BuilderDirectory {
    /// Builds a directory from `(pubkey, name)` pairs. Later pairs win.
    pub fn new<I>(builders: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut known: Vec<(String, String)> = Vec::new();
        let mut names = HashMap::new();

        for (pubkey, name) in builders {
            match names.insert(pubkey.clone(), name.clone()) {
                Some(_) => {
                    if let Some(entry) = known.iter_mut().find(|(key, _)| *key == pubkey) {
                        entry.1 = name;
                    }
                }
                None => known.push((pubkey, name)),
            }
        }

        Self {
            known,
            names,
            colors: Mutex::new(ColorAssignments::default()),
        }
    }

    /// Loads the mapping CSV at `path`.
    ///
    /// A missing or malformed file is not fatal: the server still works with
    /// abbreviated pubkeys as labels, so an empty directory is returned.
    pub fn load(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| AppError::InvalidConfig(format!("{}: {}", path.display(), e)))
            .and_then(|content| parse_mapping(&content));

        match parsed {
            Ok(builders) => {
                info!(path = %path.display(), count = builders.len(), "Loaded builder mapping");
                Self::new(builders)
            }
            Err(error) => {
                warn!(%error, "Builder mapping unavailable, using abbreviated pubkeys");
                Self::default()
            }
        }
    }

    /// Known name for `pubkey`, or its first ten characters followed by "...".
    pub fn label(&self, pubkey: &str) -> String {
        match self.names.get(pubkey) {
            Some(name) => name.clone(),
            None => {
                let prefix: String = pubkey.chars().take(LABEL_PREFIX_LEN).collect();
                format!("{}...", prefix)
            }
        }
    }

    /// Display color for `pubkey`, stable while the builder stays remembered.
    pub fn color(&self, pubkey: &str) -> &'static str {
        self.colors.lock().color_for(pubkey)
    }

    /// Every known builder with its name and color.
    pub fn builders(&self) -> Vec<BuilderInfo> {
        self.known
            .iter()
            .map(|(pubkey, name)| BuilderInfo {
                pubkey: pubkey.clone(),
                name: name.clone(),
                color: self.color(pubkey).to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

// == Color Assignments ==
/// Bounded LRU of pubkey to palette color, no expiry.
#[derive(Debug, Default)]
struct ColorAssignments {
    assigned: HashMap<String, &'static str>,
    lru: LruTracker<String>,
}

impl ColorAssignments {
    fn color_for(&mut self, pubkey: &str) -> &'static str {
        let key = pubkey.to_string();
        if let Some(color) = self.assigned.get(pubkey).copied() {
            self.lru.touch(key);
            return color;
        }

        let color = BUILDER_COLORS[self.assigned.len() % BUILDER_COLORS.len()];
        self.assigned.insert(key.clone(), color);
        self.lru.touch(key);

        while self.assigned.len() > MAX_BUILDER_COLORS {
            match self.lru.evict_oldest() {
                Some(oldest) => {
                    self.assigned.remove(&oldest);
                }
                None => break,
            }
        }

        color
    }
}

// == CSV Parsing ==
/// Extracts `(builder_pubkey, builder)` pairs from the mapping file.
///
/// Columns are found by header name. Records that fail to parse or have no
/// pubkey are skipped.
fn parse_mapping(content: &str) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::InvalidConfig(format!("builder mapping header: {}", e)))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|field| field.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| AppError::InvalidConfig(format!("builder mapping lacks `{}`", name)))
    };
    let name_col = column("builder")?;
    let pubkey_col = column("builder_pubkey")?;

    let builders = reader
        .records()
        .filter_map(|record| match record {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(%error, "Skipping malformed builder mapping record");
                None
            }
        })
        .filter_map(|record| {
            let pubkey = record.get(pubkey_col)?.to_string();
            let name = record.get(name_col)?.to_string();
            (!pubkey.is_empty()).then_some((pubkey, name))
        })
        .collect();

    Ok(builders)
}
