//! Heuristic matching of source headers onto target fields.
//!
//! A [`FieldMatcher`] runs an ordered pipeline of [`MatchStage`]s and returns
//! the first hit. Within a stage, ties resolve to the earliest field in
//! catalog order. Matching is pure: the same header, catalog and alias table
//! always produce the same answer.
//!
//! ## Stages
//!
//! 1. [`MatchStage::ExactKey`]: the normalized header equals a field key.
//! 2. [`MatchStage::ExactLabel`]: case-insensitive equality with a label.
//! 3. [`MatchStage::LabelSubstring`]: label contains header or header contains label.
//! 4. [`MatchStage::Alias`]: a known alternate phrasing for the field key occurs
//!    in the normalized header.

use std::{collections::BTreeMap, fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{catalog::TargetField, normalize::normalize_header};

const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    ("first_name", &["first name", "firstname", "fname", "given name"]),
    (
        "last_name",
        &["last name", "lastname", "lname", "surname", "family name"],
    ),
    ("email", &["email", "e mail", "mail", "email address"]),
    ("phone", &["phone", "telephone", "tel", "phone number"]),
    ("mobile_phone", &["mobile", "cell", "cellphone"]),
    (
        "account_name",
        &["company", "organization", "organisation", "account", "business"],
    ),
    ("title", &["title", "job title", "position", "role"]),
    ("mailing_street", &["street", "address", "address line"]),
    ("mailing_city", &["city", "town"]),
    ("mailing_state", &["state", "province", "region"]),
    (
        "mailing_zip",
        &["zip", "zip code", "postal code", "postcode", "postal"],
    ),
    ("mailing_country", &["country", "nation"]),
    ("website", &["website", "web site", "url", "homepage"]),
    ("description", &["description", "notes", "comments"]),
    ("lead_source", &["source", "lead source", "origin"]),
];

/// Alternate phrasings keyed by target field key.
///
/// Injected into [`FieldMatcher`] rather than read from a global so callers can
/// substitute or extend it per target schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let entries = DEFAULT_ALIASES
            .iter()
            .map(|(key, aliases)| {
                (
                    key.to_string(),
                    aliases.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect();
        Self { entries }
    }
}

impl AliasTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn from_entries<I, K, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<A>)>,
        K: Into<String>,
        A: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, aliases)| (key.into(), aliases.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening alias file {path:?}"))?;
        serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing alias YAML {path:?}"))
    }

    /// Returns a new table with `other`'s aliases appended after this table's.
    pub fn extended_with(&self, other: &AliasTable) -> Self {
        let mut entries = self.entries.clone();
        for (key, aliases) in &other.entries {
            let slot = entries.entry(key.clone()).or_default();
            for alias in aliases {
                if !slot.contains(alias) {
                    slot.push(alias.clone());
                }
            }
        }
        Self { entries }
    }

    pub fn aliases_for(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStage {
    ExactKey,
    ExactLabel,
    LabelSubstring,
    Alias,
}

impl MatchStage {
    pub const PIPELINE: [MatchStage; 4] = [
        MatchStage::ExactKey,
        MatchStage::ExactLabel,
        MatchStage::LabelSubstring,
        MatchStage::Alias,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStage::ExactKey => "key",
            MatchStage::ExactLabel => "label",
            MatchStage::LabelSubstring => "label-substring",
            MatchStage::Alias => "alias",
        }
    }

    pub fn apply<'a>(
        &self,
        header: &str,
        catalog: &'a [TargetField],
        aliases: &AliasTable,
    ) -> Option<&'a TargetField> {
        match self {
            MatchStage::ExactKey => {
                let normalized = normalize_header(header);
                catalog.iter().find(|field| field.key == normalized)
            }
            MatchStage::ExactLabel => {
                let lowered = header.to_lowercase();
                catalog
                    .iter()
                    .find(|field| field.label.to_lowercase() == lowered)
            }
            MatchStage::LabelSubstring => {
                let lowered = header.to_lowercase();
                catalog.iter().find(|field| {
                    let label = field.label.to_lowercase();
                    !label.is_empty() && (label.contains(&lowered) || lowered.contains(&label))
                })
            }
            MatchStage::Alias => {
                let normalized = normalize_header(header);
                catalog.iter().find(|field| {
                    aliases
                        .aliases_for(&field.key)
                        .iter()
                        .map(|alias| alias.to_lowercase().replace(' ', "_"))
                        .any(|token| !token.is_empty() && normalized.contains(&token))
                })
            }
        }
    }
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FieldMatcher {
    aliases: AliasTable,
    stages: Vec<MatchStage>,
}

impl Default for FieldMatcher {
    fn default() -> Self {
        Self::new(AliasTable::default())
    }
}

impl FieldMatcher {
    pub fn new(aliases: AliasTable) -> Self {
        Self {
            aliases,
            stages: MatchStage::PIPELINE.to_vec(),
        }
    }

    /// Replaces the stage pipeline; stages run in the given order.
    pub fn with_stages(mut self, stages: Vec<MatchStage>) -> Self {
        self.stages = stages;
        self
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn stages(&self) -> &[MatchStage] {
        &self.stages
    }

    pub fn resolve<'a>(&self, header: &str, catalog: &'a [TargetField]) -> Option<&'a TargetField> {
        self.resolve_with_stage(header, catalog)
            .map(|(field, _)| field)
    }

    pub fn resolve_with_stage<'a>(
        &self,
        header: &str,
        catalog: &'a [TargetField],
    ) -> Option<(&'a TargetField, MatchStage)> {
        if header.trim().is_empty() {
            return None;
        }
        self.stages.iter().find_map(|stage| {
            stage
                .apply(header, catalog, &self.aliases)
                .map(|field| (field, *stage))
        })
    }
}
