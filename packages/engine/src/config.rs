use crate::errors::{ConfigError, ConfigResult};
use crate::exclusion::{
    AttrMatch, ExclusionMarker, ExclusionPolicy, EDITABLE_ATTRIBUTE, EDITABLE_VALUES,
    FORBIDDEN_TAGS, OPT_OUT_CLASSES,
};
use raqam_dom::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "raqam.config.json";

/// Engine configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Classes that opt an element's subtree out of conversion
    #[serde(default = "default_opt_out_classes")]
    pub opt_out_classes: Vec<String>,

    /// Element kinds that are never converted
    #[serde(default = "default_forbidden_tags")]
    pub forbidden_tags: Vec<String>,

    /// Attributes that mark editable regions
    #[serde(default = "default_editable_attributes")]
    pub editable_attributes: Vec<AttributeRule>,

    /// Where the initial pass and the watcher start
    #[serde(default)]
    pub root: RootSelector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRule {
    pub name: String,

    /// Matching values; absent means any value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootSelector {
    #[default]
    Body,
    Document,
}

impl RootSelector {
    pub fn resolve(self, doc: &Document) -> NodeId {
        match self {
            RootSelector::Body => doc.body(),
            RootSelector::Document => doc.root(),
        }
    }
}

fn default_opt_out_classes() -> Vec<String> {
    OPT_OUT_CLASSES.iter().map(|c| c.to_string()).collect()
}

fn default_forbidden_tags() -> Vec<String> {
    FORBIDDEN_TAGS.iter().map(|t| t.to_string()).collect()
}

fn default_editable_attributes() -> Vec<AttributeRule> {
    vec![AttributeRule {
        name: EDITABLE_ATTRIBUTE.to_string(),
        values: Some(EDITABLE_VALUES.iter().map(|v| v.to_string()).collect()),
    }]
}

impl EngineConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            Self::from_file(config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json { path, source })
    }

    /// Build the exclusion policy these settings describe
    pub fn policy(&self) -> ExclusionPolicy {
        let classes = self.opt_out_classes.iter().map(ExclusionMarker::class);
        let tags = self.forbidden_tags.iter().map(ExclusionMarker::tag);
        let attributes = self.editable_attributes.iter().map(|rule| {
            let values = match &rule.values {
                Some(values) => AttrMatch::OneOf(values.clone()),
                None => AttrMatch::Any,
            };
            ExclusionMarker::attribute(rule.name.as_str(), values)
        });

        ExclusionPolicy::new(classes.chain(tags).chain(attributes).collect())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            opt_out_classes: default_opt_out_classes(),
            forbidden_tags: default_forbidden_tags(),
            editable_attributes: default_editable_attributes(),
            root: RootSelector::default(),
        }
    }
}
