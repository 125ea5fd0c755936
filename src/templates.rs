//! Named mapping templates persisted as YAML for reuse on later uploads.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTemplate {
    pub name: String,
    pub module_id: String,
    /// Source column -> field key. An empty key records an explicit skip.
    pub columns: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl MappingTemplate {
    pub fn new(name: &str, module_id: &str, columns: BTreeMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            module_id: module_id.to_string(),
            columns,
            saved_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateStore {
    #[serde(default)]
    pub templates: Vec<MappingTemplate>,
}

impl TemplateStore {
    /// Loads the store, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading template file {path:?}"))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing template YAML {path:?}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_yaml::to_string(self).context("Serializing templates to YAML")?;
        fs::write(path, serialized).with_context(|| format!("Writing template file {path:?}"))
    }

    pub fn find(&self, module_id: &str, name: &str) -> Option<&MappingTemplate> {
        self.templates
            .iter()
            .find(|t| t.module_id == module_id && t.name == name)
    }

    /// Inserts `template`, replacing any template with the same module and name.
    pub fn upsert(&mut self, mut template: MappingTemplate) {
        template.saved_at = Some(Utc::now());
        match self
            .templates
            .iter_mut()
            .find(|t| t.module_id == template.module_id && t.name == template.name)
        {
            Some(existing) => {
                info!(
                    "Replacing mapping template '{}' for module '{}'",
                    template.name, template.module_id
                );
                *existing = template;
            }
            None => self.templates.push(template),
        }
    }
}
