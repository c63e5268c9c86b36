//! Configuration file helpers shared by the extension crates and hosts
//!
//! ```ignore
//! use paramtree_core::config::{load_config, save_config};
//!
//! let opts: RemoteConfig = load_config(&path);
//! save_config(&opts, &path)?;
//! ```

mod io;

pub use io::{load_config, save_config};
