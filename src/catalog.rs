//! Target field catalogs.
//!
//! The catalog service is an external collaborator; [`FieldCatalog`] is the
//! seam, and [`YamlFieldCatalog`] is the file-backed implementation used by
//! the command line.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// One attribute of the destination schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetField {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
}

impl TargetField {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            required: false,
            unique: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

pub fn find_field<'a>(catalog: &'a [TargetField], key: &str) -> Option<&'a TargetField> {
    catalog.iter().find(|field| field.key == key)
}

pub trait FieldCatalog {
    /// Fields of `module_id`, in catalog order. Keys are stable within a module.
    fn fields(&self, module_id: &str) -> Result<Vec<TargetField>, ImportError>;
}

impl<C: FieldCatalog + ?Sized> FieldCatalog for &C {
    fn fields(&self, module_id: &str) -> Result<Vec<TargetField>, ImportError> {
        (**self).fields(module_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<TargetField>,
}

impl ModuleDefinition {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YamlFieldCatalog {
    pub modules: Vec<ModuleDefinition>,
}

impl YamlFieldCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening catalog file {path:?}"))?;
        let catalog: YamlFieldCatalog = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing catalog YAML {path:?}"))?;
        Ok(catalog)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Parsing catalog YAML")
    }

    pub fn module(&self, module_id: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.id == module_id)
    }
}

impl FieldCatalog for YamlFieldCatalog {
    fn fields(&self, module_id: &str) -> Result<Vec<TargetField>, ImportError> {
        self.module(module_id)
            .map(|module| module.fields.clone())
            .ok_or_else(|| ImportError::UnknownModule(module_id.to_string()))
    }
}
