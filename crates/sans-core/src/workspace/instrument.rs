use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAIN_DETECTOR: &str = "detector";

const DEFAULT_PIXEL_SIZE: f64 = 0.008;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub position: [f64; 3],
}

/// Instrument description: named detector components plus the parameter file values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
    #[serde(default = "default_pixel_size")]
    pub pixel_width: f64,
    #[serde(default = "default_pixel_size")]
    pub pixel_height: f64,
}

fn default_pixel_size() -> f64 {
    DEFAULT_PIXEL_SIZE
}

impl Instrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            parameters: BTreeMap::new(),
            pixel_width: DEFAULT_PIXEL_SIZE,
            pixel_height: DEFAULT_PIXEL_SIZE,
        }
    }

    pub fn with_component(mut self, name: impl Into<String>, position: [f64; 3]) -> Self {
        self.components.push(Component {
            name: name.into(),
            position,
        });
        self
    }

    pub fn with_number_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters
            .insert(name.into(), ParameterValue::Number(value));
        self
    }

    pub fn with_string_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.parameters
            .insert(name.into(), ParameterValue::Text(value.into()));
        self
    }

    pub fn with_pixel_size(mut self, width: f64, height: f64) -> Self {
        self.pixel_width = width;
        self.pixel_height = height;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number_parameter(&self, name: &str) -> Option<f64> {
        match self.parameters.get(name)? {
            ParameterValue::Number(value) => Some(*value),
            ParameterValue::Text(text) => text.trim().parse().ok(),
        }
    }

    pub fn string_parameter(&self, name: &str) -> Option<&str> {
        match self.parameters.get(name)? {
            ParameterValue::Text(text) => Some(text.as_str()),
            ParameterValue::Number(_) => None,
        }
    }

    /// Comma separated `detector_panels` parameter of multi-panel instruments.
    pub fn detector_panels(&self) -> Option<Vec<String>> {
        self.string_parameter("detector_panels").map(|panels| {
            panels
                .split(',')
                .map(str::trim)
                .filter(|panel| !panel.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|component| component.name == name)
    }

    pub(crate) fn component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components
            .iter_mut()
            .find(|component| component.name == name)
    }
}
