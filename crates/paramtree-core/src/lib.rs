//! Paramtree Core - reactive, hierarchical parameter trees
//!
//! A tree is a [`ParamGroup`] holding typed leaves ([`NumberParam`],
//! [`ColorParam`]) and nested groups. Every node is observable: a change to a
//! leaf is delivered to the leaf's listeners, then to each enclosing group's
//! listeners with the key qualified by the path from that group
//! (`"nested.bar"` at the root).
//!
//! ```ignore
//! use paramtree_core::{listener, ColorParam, NumberParam, ParamGroup};
//!
//! let tree = ParamGroup::builder()
//!     .number("foo", NumberParam::new(1.0))
//!     .group(
//!         "nested",
//!         ParamGroup::builder()
//!             .color("bgColor", ColorParam::new("#fff"))
//!             .number("bar", NumberParam::new(2.0).with_range(0.0, 10.0))
//!             .build()?,
//!     )
//!     .build()?;
//!
//! tree.on_change(&listener(|e| println!("{} = {} ({})", e.key, e.value, e.origin)));
//! tree.set("nested.bar", 3.0);
//! ```
//!
//! Collaborators (control panels, storage sync, remote surfaces) plug in as
//! [`Extension`]s and tag their own writes with an origin so they can skip
//! the resulting echo.

pub mod config;
pub mod controls;
pub mod error;
pub mod event;
pub mod extension;
pub mod group;
pub mod history;
pub mod param;
pub mod path;
pub mod schema;
pub mod value;

pub use controls::{controls, Control, ControlKind};
pub use error::{TreeError, TreeResult};
pub use event::{listener, ChangeEvent, Listener};
pub use extension::Extension;
pub use group::{Entry, GroupBuilder, GroupState, ParamGroup, HISTORY_ORIGIN};
pub use history::UndoHistory;
pub use param::{ColorParam, NumberParam, Param, ParamKind};
pub use path::Node;
pub use schema::{load_schema, EntrySchema, TreeSchema};
pub use value::{Value, ValueNode, ValueTree};
