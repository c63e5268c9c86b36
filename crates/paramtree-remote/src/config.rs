//! Remote bridge options

use std::path::Path;

use paramtree_core::config::load_config;
use serde::{Deserialize, Serialize};

/// Options for [`RemoteBridge`](crate::RemoteBridge)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Provenance tag of writes made on behalf of the surface
    pub origin: String,
    /// Capacity of each direction of the surface channel
    pub channel_capacity: usize,
    /// Build an "all params" page when the bridge is attached
    pub add_all_on_attach: bool,
    /// Id (and button label) of the "all params" page
    pub all_page_id: String,
    /// Layout weight of the page button row
    pub page_button_weight: f64,
    /// Button color of the current page
    pub active_color: String,
    /// Button color of the other pages
    pub inactive_color: String,
    /// Storage key of the saved current page
    pub page_key: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            origin: "remote".to_string(),
            channel_capacity: 256,
            add_all_on_attach: true,
            all_page_id: "All Params".to_string(),
            page_button_weight: 0.2,
            active_color: "#66aa33".to_string(),
            inactive_color: "#333333".to_string(),
            page_key: "remote-layout".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn load(path: &Path) -> Self {
        load_config(path)
    }
}
