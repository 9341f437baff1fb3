//! Scenario file types
//!
//! A scenario is a literal list of driver actions in YAML, run once from
//! launch to quit.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::common::{Error, Result};
use crate::driver::{FieldEdit, SaveTarget};
use crate::locator::keys;

/// One test case loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario checks
    pub description: Option<String>,
    /// Extra command-line flags for the target, after the configured ones
    #[serde(default)]
    pub launch_flags: Vec<String>,
    /// The actions to perform, in order
    pub steps: Vec<Step>,
}

/// A single driver action
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Switch to a named editing mode
    EnterMode { mode: String },
    /// Choose the element type created by clicks
    SelectShapeType {
        #[serde(rename = "type")]
        type_name: String,
    },
    /// Open the dialog at `field`, pick entry `selector`, confirm
    ChangeAttributeUsingDialog {
        field: usize,
        selector: usize,
        /// Expected verdict; a rejection without this is recorded, not fatal
        expect: Option<FieldEdit>,
    },
    /// Left click at an offset from the launch anchor
    Click { dx: i32, dy: i32 },
    /// Drag between two offsets from the launch anchor
    Drag { from: (i32, i32), to: (i32, i32) },
    /// Type a value into the field at `field`
    SetField {
        field: usize,
        value: String,
        expect: Option<FieldEdit>,
    },
    /// Flip the checkbox at `field`
    ModifyBoolAttribute { field: usize },
    /// Set the view's zoom and center
    SetZoom { zoom: f64, x: f64, y: f64 },
    Undo { count: usize },
    Redo { count: usize },
    SaveShapes,
    SaveNetwork,
    SaveAdditionals,
}

impl Step {
    /// Action name as written in the scenario file
    pub fn action(&self) -> &'static str {
        match self {
            Self::EnterMode { .. } => "enter_mode",
            Self::SelectShapeType { .. } => "select_shape_type",
            Self::ChangeAttributeUsingDialog { .. } => "change_attribute_using_dialog",
            Self::Click { .. } => "click",
            Self::Drag { .. } => "drag",
            Self::SetField { .. } => "set_field",
            Self::ModifyBoolAttribute { .. } => "modify_bool_attribute",
            Self::SetZoom { .. } => "set_zoom",
            Self::Undo { .. } => "undo",
            Self::Redo { .. } => "redo",
            Self::SaveShapes => "save_shapes",
            Self::SaveNetwork => "save_network",
            Self::SaveAdditionals => "save_additionals",
        }
    }

    /// Short human-readable form for progress output
    pub fn summary(&self) -> String {
        match self {
            Self::EnterMode { mode } => format!("enter_mode {}", mode),
            Self::SelectShapeType { type_name } => format!("select_shape_type {}", type_name),
            Self::ChangeAttributeUsingDialog {
                field, selector, ..
            } => format!("change_attribute_using_dialog field={} selector={}", field, selector),
            Self::Click { dx, dy } => format!("click ({}, {})", dx, dy),
            Self::Drag { from, to } => {
                format!("drag ({}, {}) -> ({}, {})", from.0, from.1, to.0, to.1)
            }
            Self::SetField { field, value, .. } => format!("set_field {} = {:?}", field, value),
            Self::ModifyBoolAttribute { field } => format!("modify_bool_attribute {}", field),
            Self::SetZoom { zoom, x, y } => format!("set_zoom {} at ({}, {})", zoom, x, y),
            Self::Undo { count } => format!("undo {}", count),
            Self::Redo { count } => format!("redo {}", count),
            _ => self.action().to_string(),
        }
    }

    /// Reference images this step may wait for
    fn reference_keys(&self) -> Vec<String> {
        match self {
            Self::EnterMode { mode } => vec![keys::mode(mode)],
            Self::SelectShapeType { type_name } => {
                vec![keys::SHAPE_SELECTOR.to_string(), keys::shape_type(type_name)]
            }
            Self::ChangeAttributeUsingDialog { .. } => vec![
                keys::ATTRIBUTE_DIALOG.to_string(),
                keys::DIALOG_REJECTED.to_string(),
            ],
            Self::SetField { .. } => vec![
                keys::FIELD_VALID.to_string(),
                keys::FIELD_INVALID.to_string(),
            ],
            Self::SetZoom { .. } => vec![keys::VIEWPORT_DIALOG.to_string()],
            Self::SaveShapes => vec![keys::saved(SaveTarget::Shapes.name())],
            Self::SaveNetwork => vec![keys::saved(SaveTarget::Network.name())],
            Self::SaveAdditionals => vec![keys::saved(SaveTarget::Additionals.name())],
            _ => Vec::new(),
        }
    }
}

impl Scenario {
    /// Load a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(content)?;
        if scenario.steps.is_empty() {
            return Err(Error::Config(format!(
                "Scenario '{}' has no steps",
                scenario.name
            )));
        }
        Ok(scenario)
    }

    /// Every reference key a run of this scenario can need, sorted
    pub fn reference_keys(&self) -> Vec<String> {
        let mut wanted: BTreeSet<String> = BTreeSet::new();
        wanted.insert(keys::READY.to_string());
        for step in &self.steps {
            wanted.extend(step.reference_keys());
        }
        wanted.into_iter().collect()
    }
}
