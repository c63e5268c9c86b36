//! Control-surface message types
//!
//! These mirror the surface's RPC vocabulary. The transport wraps them in
//! whatever framing it speaks; serialized, a message is
//! `{"method": "setValues", "params": {"values": {"nested.bar": [0.5]}}}`.
//!
//! Values always travel normalized to `[0, 1]`, one array per control
//! (faders carry one element, xy pads two).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Normalized control values by control id (a dotted leaf path)
pub type SurfaceValues = IndexMap<String, Vec<f64>>;

/// Widget type on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Xy,
    Fader,
    Btn,
    Col,
    Row,
}

/// One widget in a surface layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDef {
    pub type_name: WidgetType,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Only meaningful for `col` and `row`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<WidgetDef>,
}

impl WidgetDef {
    pub fn new(type_name: WidgetType, id: impl Into<String>) -> Self {
        Self {
            type_name,
            id: id.into(),
            weight: None,
            color: None,
            children: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_children(mut self, children: Vec<WidgetDef>) -> Self {
        self.children = children;
        self
    }
}

/// Complete surface layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDef {
    pub root: WidgetDef,
}

/// Bridge → surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Outbound {
    /// Replace the surface layout and all control values
    SetLayout { layout: LayoutDef, values: SurfaceValues },
    /// Update some control values
    SetValues { values: SurfaceValues },
}

/// Surface → bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Inbound {
    /// The user moved one or more controls
    ValuesChanged { values: SurfaceValues },
    /// The user tapped a button (page buttons carry the page id)
    ButtonTap {
        #[serde(rename = "buttonId")]
        button_id: String,
    },
    /// The surface device connected or disconnected
    ConnectionStatusChanged {
        #[serde(rename = "isConnected")]
        is_connected: bool,
    },
    /// The surface reports the layout it is showing
    LayoutChanged { layout: LayoutDef, values: SurfaceValues },
}
