//! Paramtree Remote - drive a tree from a touch control surface
//!
//! The bridge owns no transport. A host wires the [`SurfaceLink`] to
//! whatever carries surface messages and calls [`RemoteBridge::poll`] from
//! its main loop:
//!
//! ```ignore
//! let (bridge, link) = RemoteBridge::new(RemoteConfig::default());
//! tree.register(Box::new(bridge.with_page_store(FileStorage::default_location())))?;
//!
//! loop {
//!     for msg in link.drain() {
//!         transport.send(serde_json::to_string(&msg)?)?;
//!     }
//!     while let Some(msg) = transport.try_recv_inbound()? {
//!         link.send(msg);
//!     }
//!     RemoteBridge::poll_registered(&tree);
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod layout;
pub mod messages;

pub use bridge::{surface_values, RemoteBridge, SurfaceLink, REMOTE_NAME};
pub use config::RemoteConfig;
pub use layout::{Layout, LayoutPage, PageStyle};
pub use messages::{Inbound, LayoutDef, Outbound, SurfaceValues, WidgetDef, WidgetType};
