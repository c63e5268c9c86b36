//! Remote control-surface bridge
//!
//! Connects a tree to a touch surface through a pair of bounded channels.
//! The transport (WebSocket, OSC, a test harness) holds the [`SurfaceLink`]
//! end; the bridge is registered on the tree as an extension.
//!
//! ```text
//! tree change ──listener──► Outbound::SetValues ──► SurfaceLink::drain()
//! SurfaceLink::send(Inbound) ──► RemoteBridge::poll(&tree) ──► set_normalized(v, origin)
//! ```
//!
//! Inbound writes carry the bridge origin; the listener skips events with
//! that origin, so the surface never receives an echo of its own gesture.
//!
//! With a page store, the page picked on the surface is saved on every tap
//! and restored when the bridge is attached.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context;
use flume::{Receiver, Sender, TrySendError};
use indexmap::IndexMap;
use paramtree_core::{listener, ChangeEvent, Extension, Listener, Param, ParamGroup, Value};
use paramtree_persist::Storage;
use serde::{Deserialize, Serialize};

use crate::config::RemoteConfig;
use crate::layout::{Layout, PageStyle};
use crate::messages::{Inbound, Outbound, SurfaceValues};

/// Registry name of the remote bridge extension
pub const REMOTE_NAME: &str = "remote";

/// Transport end of the surface channel pair
pub struct SurfaceLink {
    outbound_rx: Receiver<Outbound>,
    inbound_tx: Sender<Inbound>,
}

impl SurfaceLink {
    /// Next message for the surface, if any (non-blocking)
    pub fn try_recv(&self) -> Option<Outbound> {
        self.outbound_rx.try_recv().ok()
    }

    /// Drain every pending message for the surface
    pub fn drain(&self) -> impl Iterator<Item = Outbound> + '_ {
        std::iter::from_fn(|| self.try_recv())
    }

    /// Hand a surface message to the bridge; false if it was dropped
    pub fn send(&self, message: Inbound) -> bool {
        match self.inbound_tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("remote: inbound channel full, dropping surface message");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Sending half shared with the tree listener
struct Outlet {
    tx: Sender<Outbound>,
    origin: String,
    /// `(min, max)` of every numeric leaf, by path
    ranges: IndexMap<String, (f64, f64)>,
    active: Cell<bool>,
}

impl Outlet {
    fn send(&self, message: Outbound) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("remote: outbound channel full, dropping message");
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("remote: surface link closed");
            }
        }
    }

    fn on_change(&self, event: &ChangeEvent) {
        if !self.active.get() || event.origin == self.origin {
            return;
        }
        let Value::Number(v) = event.value else {
            return;
        };
        let Some(&(min, max)) = self.ranges.get(&event.key) else {
            return;
        };
        let span = max - min;
        let normalized = if span == 0.0 { 0.0 } else { (v - min) / span };

        let mut values = SurfaceValues::new();
        values.insert(event.key.clone(), vec![normalized]);
        self.send(Outbound::SetValues { values });
    }
}

/// Saved page selection
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedPage {
    current_page_id: Option<String>,
}

/// Extension syncing numeric leaves with a remote surface
pub struct RemoteBridge {
    config: RemoteConfig,
    layout: Layout,
    inbound_rx: Receiver<Inbound>,
    outlet: Rc<Outlet>,
    listener: Option<Listener>,
    page_store: Option<Box<dyn Storage>>,
}

impl RemoteBridge {
    /// Create a bridge and the transport end of its channels
    pub fn new(config: RemoteConfig) -> (Self, SurfaceLink) {
        let capacity = config.channel_capacity.max(1);
        let (outbound_tx, outbound_rx) = flume::bounded(capacity);
        let (inbound_tx, inbound_rx) = flume::bounded(capacity);

        let outlet = Outlet {
            tx: outbound_tx,
            origin: config.origin.clone(),
            ranges: IndexMap::new(),
            active: Cell::new(false),
        };
        let bridge = Self {
            config,
            layout: Layout::new(),
            inbound_rx,
            outlet: Rc::new(outlet),
            listener: None,
            page_store: None,
        };
        let link = SurfaceLink {
            outbound_rx,
            inbound_tx,
        };
        (bridge, link)
    }

    /// Save the current page to `storage` and restore it on attach
    pub fn with_page_store(mut self, storage: impl Storage + 'static) -> Self {
        self.page_store = Some(Box::new(storage));
        self
    }

    pub fn origin(&self) -> &str {
        &self.config.origin
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Apply every pending surface message to `tree`
    ///
    /// Returns the number of messages handled. Surface values are written to
    /// the tree, so a bridge registered on `tree` should be polled through
    /// [`poll_registered`](Self::poll_registered) rather than an
    /// `extension_mut` guard.
    pub fn poll(&mut self, tree: &ParamGroup) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.inbound_rx.try_recv() {
            self.handle(tree, message);
            handled += 1;
        }
        handled
    }

    /// Poll the bridge registered on `tree`, with the registry released
    ///
    /// Returns 0 if no bridge is registered.
    pub fn poll_registered(tree: &ParamGroup) -> usize {
        tree.with_extension_mut::<RemoteBridge, _>(REMOTE_NAME, |bridge| bridge.poll(tree))
            .unwrap_or(0)
    }

    fn handle(&mut self, tree: &ParamGroup, message: Inbound) {
        match message {
            Inbound::ValuesChanged { values } => {
                for (path, value) in &values {
                    self.apply_value(tree, path, value);
                }
            }
            Inbound::ButtonTap { button_id } => {
                if self.layout.set_current_page(&button_id) {
                    log::debug!("remote: switched to page '{}'", button_id);
                    self.save_page();
                }
                self.send_layout(tree);
            }
            Inbound::ConnectionStatusChanged { is_connected } => {
                log::info!(
                    "remote: surface {}",
                    if is_connected { "connected" } else { "disconnected" }
                );
                if is_connected {
                    self.send_layout(tree);
                }
            }
            Inbound::LayoutChanged { layout, .. } => {
                log::debug!("remote: surface shows layout rooted at '{}'", layout.root.id);
            }
        }
    }

    fn apply_value(&self, tree: &ParamGroup, path: &str, value: &[f64]) {
        let Some(&normalized) = value.first() else {
            log::debug!("remote: empty value for '{}'", path);
            return;
        };
        match tree.param(path) {
            Some(Param::Number(p)) => {
                p.set_normalized(normalized, &self.config.origin);
            }
            Some(Param::Color(_)) => {
                log::debug!("remote: '{}' is not numeric, ignored", path);
            }
            None => {
                log::debug!("remote: unknown control '{}'", path);
            }
        }
    }

    /// Replace the layout with one page holding every numeric leaf
    pub fn add_all(&mut self, tree: &ParamGroup) {
        let ids: Vec<String> = tree
            .leaves()
            .into_iter()
            .filter(|(_, param)| param.as_number().is_some())
            .map(|(path, _)| path)
            .collect();

        self.layout.clear();
        let page_id = self.config.all_page_id.clone();
        self.layout.create_page(page_id.clone(), ids);
        self.layout.set_current_page(&page_id);
        self.send_layout(tree);
    }

    /// Write the current page id to the page store, if there is one
    pub fn save_page(&self) {
        let Some(store) = &self.page_store else {
            return;
        };
        let saved = SavedPage {
            current_page_id: self.layout.current_page_id().map(str::to_string),
        };
        let result = serde_json::to_string(&saved)
            .context("Failed to encode page selection")
            .and_then(|data| store.write(&self.config.page_key, &data));
        if let Err(e) = result {
            log::warn!("remote: could not save current page: {:#}", e);
        }
    }

    /// Switch to the page saved in the page store
    ///
    /// A saved page that does not exist yet becomes current once it is
    /// added. Returns true if the layout switched now.
    pub fn restore_page(&mut self, tree: &ParamGroup) -> bool {
        let Some(store) = &self.page_store else {
            return false;
        };
        let saved = store.read(&self.config.page_key).and_then(|data| match data {
            Some(data) => serde_json::from_str::<SavedPage>(&data)
                .context("Failed to parse saved page selection"),
            None => Ok(SavedPage::default()),
        });
        let id = match saved {
            Ok(SavedPage {
                current_page_id: Some(id),
            }) => id,
            Ok(_) => return false,
            Err(e) => {
                log::warn!("remote: could not restore current page: {:#}", e);
                return false;
            }
        };

        let switched = self.layout.restore_page(&id);
        if switched {
            log::debug!("remote: restored page '{}'", id);
            self.send_layout(tree);
        }
        switched
    }

    /// Add a page of controls and resend the layout
    pub fn add_page(&mut self, tree: &ParamGroup, id: &str, control_ids: Vec<String>) {
        self.layout.create_page(id, control_ids);
        self.send_layout(tree);
    }

    /// Switch to page `id` and resend the layout
    pub fn set_page(&mut self, tree: &ParamGroup, id: &str) -> bool {
        let switched = self.layout.set_current_page(id);
        if switched {
            self.save_page();
            self.send_layout(tree);
        }
        switched
    }

    /// Remove every page and resend the (empty) layout
    pub fn clear(&mut self, tree: &ParamGroup) {
        self.layout.clear();
        self.send_layout(tree);
    }

    /// Send the rendered layout with every normalized value
    pub fn send_layout(&self, tree: &ParamGroup) {
        let style = PageStyle {
            button_weight: self.config.page_button_weight,
            active_color: self.config.active_color.clone(),
            inactive_color: self.config.inactive_color.clone(),
        };
        let layout = self.layout.render(tree, &style);
        let values = surface_values(tree);
        self.outlet.send(Outbound::SetLayout { layout, values });
    }
}

/// Every numeric leaf's normalized value, keyed by path
pub fn surface_values(tree: &ParamGroup) -> SurfaceValues {
    tree.values_normalized()
        .flatten()
        .into_iter()
        .filter_map(|(path, value)| value.as_number().map(|n| (path, vec![n])))
        .collect()
}

impl Extension for RemoteBridge {
    fn name(&self) -> &str {
        REMOTE_NAME
    }

    fn attach(&mut self, tree: &ParamGroup) -> anyhow::Result<()> {
        let ranges = tree
            .leaves()
            .into_iter()
            .filter_map(|(path, param)| param.as_number().map(|p| (path, (p.min(), p.max()))))
            .collect();

        let outlet = Rc::get_mut(&mut self.outlet)
            .ok_or_else(|| anyhow::anyhow!("remote bridge is already attached"))?;
        outlet.ranges = ranges;
        outlet.active.set(true);

        let shared = Rc::clone(&self.outlet);
        let subscription = listener(move |event| shared.on_change(event));
        tree.on_change(&subscription);
        self.listener = Some(subscription);

        log::info!(
            "remote: attached with {} numeric controls (origin '{}')",
            self.outlet.ranges.len(),
            self.config.origin
        );

        if self.config.add_all_on_attach {
            self.add_all(tree);
        } else {
            self.send_layout(tree);
        }
        self.restore_page(tree);
        Ok(())
    }

    fn detach(&mut self, tree: &ParamGroup) {
        if let Some(subscription) = self.listener.take() {
            tree.off_change(&subscription);
        }
        self.outlet.active.set(false);
        log::info!("remote: detached");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramtree_core::{ColorParam, NumberParam};
    use paramtree_persist::MemoryStorage;

    use crate::messages::WidgetType;

    fn tree() -> ParamGroup {
        ParamGroup::builder()
            .number("foo", NumberParam::new(1.0))
            .group(
                "nested",
                ParamGroup::builder()
                    .color("bgColor", ColorParam::new("#fff"))
                    .number("bar", NumberParam::new(2.0).with_range(0.0, 10.0))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn attached(config: RemoteConfig) -> (ParamGroup, SurfaceLink) {
        let t = tree();
        let (bridge, link) = RemoteBridge::new(config);
        t.register(Box::new(bridge)).unwrap();
        (t, link)
    }

    fn poll(t: &ParamGroup) -> usize {
        RemoteBridge::poll_registered(t)
    }

    fn values(pairs: &[(&str, f64)]) -> SurfaceValues {
        pairs.iter().map(|(k, v)| (k.to_string(), vec![*v])).collect()
    }

    #[test]
    fn test_attach_sends_all_params_layout() {
        let (_t, link) = attached(RemoteConfig::default());
        let sent: Vec<Outbound> = link.drain().collect();
        assert_eq!(sent.len(), 1);

        let Outbound::SetLayout { layout, values: v } = &sent[0] else {
            panic!("expected setLayout");
        };
        assert_eq!(*v, values(&[("foo", 1.0), ("nested.bar", 0.2)]));

        let page = &layout.root.children[0];
        assert_eq!(page.id, "All Params");
        let ids: Vec<&str> = page.children.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["foo", "nested.bar"]);
    }

    #[test]
    fn test_local_changes_are_sent_normalized() {
        let (t, link) = attached(RemoteConfig::default());
        link.drain().count();

        t.set("nested.bar", 5.0);
        t.set("nested.bgColor", "#000");
        let sent: Vec<Outbound> = link.drain().collect();
        assert_eq!(
            sent,
            vec![Outbound::SetValues {
                values: values(&[("nested.bar", 0.5)])
            }]
        );
    }

    #[test]
    fn test_surface_writes_are_not_echoed() {
        let (t, link) = attached(RemoteConfig::default());
        link.drain().count();

        let origins = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = Rc::clone(&origins);
        t.on_change(&listener(move |e| sink.borrow_mut().push(e.origin.clone())));

        assert!(link.send(Inbound::ValuesChanged {
            values: values(&[("nested.bar", 0.5), ("missing", 0.1)])
        }));
        assert_eq!(poll(&t), 1);

        assert_eq!(t.number("nested.bar").unwrap().value(), 5.0);
        assert_eq!(*origins.borrow(), vec!["remote".to_string()]);
        assert!(link.try_recv().is_none());
    }

    #[test]
    fn test_inbound_ignores_colors_and_empty_values() {
        let (t, link) = attached(RemoteConfig::default());
        let mut v = values(&[("nested.bgColor", 0.5)]);
        v.insert("foo".to_string(), vec![]);
        link.send(Inbound::ValuesChanged { values: v });
        poll(&t);
        assert_eq!(t.color("nested.bgColor").unwrap().value(), "#fff");
        assert_eq!(t.number("foo").unwrap().value(), 1.0);
    }

    #[test]
    fn test_button_tap_switches_page() {
        let (t, link) = attached(RemoteConfig::default());
        t.extension_mut::<RemoteBridge>(REMOTE_NAME)
            .unwrap()
            .add_page(&t, "Nested", vec!["nested.bar".to_string()]);
        link.drain().count();

        link.send(Inbound::ButtonTap {
            button_id: "Nested".to_string(),
        });
        poll(&t);

        let Some(Outbound::SetLayout { layout, .. }) = link.try_recv() else {
            panic!("expected setLayout");
        };
        let page = &layout.root.children[0];
        assert_eq!(page.id, "Nested");
        assert_eq!(page.children[0].type_name, WidgetType::Fader);
        assert_eq!(page.children[0].id, "nested.bar");

        let buttons = &layout.root.children[1];
        assert_eq!(buttons.children[1].color.as_deref(), Some("#66aa33"));
        assert_eq!(
            t.extension::<RemoteBridge>(REMOTE_NAME)
                .unwrap()
                .layout()
                .current_page_id(),
            Some("Nested")
        );
    }

    #[test]
    fn test_connection_resends_layout() {
        let config = RemoteConfig {
            add_all_on_attach: false,
            ..Default::default()
        };
        let (t, link) = attached(config);
        let Some(Outbound::SetLayout { layout, .. }) = link.try_recv() else {
            panic!("expected setLayout");
        };
        // No pages: only the (empty) button row
        assert_eq!(layout.root.children.len(), 1);

        link.send(Inbound::ConnectionStatusChanged { is_connected: false });
        link.send(Inbound::ConnectionStatusChanged { is_connected: true });
        assert_eq!(poll(&t), 2);
        assert_eq!(link.drain().count(), 1);
    }

    #[test]
    fn test_detached_bridge_stops_sending() {
        let (t, link) = attached(RemoteConfig::default());
        assert_eq!(t.listener_count(), 1);
        link.drain().count();
        t.destroy();
        assert_eq!(t.listener_count(), 0);
        t.set("foo", 0.3);
        assert!(link.try_recv().is_none());
    }

    #[test]
    fn test_poll_with_listener_reading_registry() {
        let t = Rc::new(tree());
        let (bridge, link) = RemoteBridge::new(RemoteConfig::default());
        t.register(Box::new(bridge)).unwrap();

        let names = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = Rc::clone(&names);
        let weak = Rc::downgrade(&t);
        t.on_change(&listener(move |_| {
            if let Some(t) = weak.upgrade() {
                sink.borrow_mut().push(t.extension_names());
            }
        }));

        link.send(Inbound::ValuesChanged {
            values: values(&[("foo", 0.5)]),
        });
        assert_eq!(RemoteBridge::poll_registered(&t), 1);
        assert_eq!(t.number("foo").unwrap().value(), 0.5);
        assert_eq!(names.borrow().len(), 1);
        assert_eq!(t.extension_names(), vec![REMOTE_NAME.to_string()]);
    }

    #[test]
    fn test_poll_without_bridge() {
        assert_eq!(RemoteBridge::poll_registered(&tree()), 0);
    }

    #[test]
    fn test_page_selection_is_saved_and_restored() {
        let store = MemoryStorage::new();
        let t = tree();
        let (bridge, link) = RemoteBridge::new(RemoteConfig::default());
        t.register(Box::new(bridge.with_page_store(store.clone()))).unwrap();
        t.extension_mut::<RemoteBridge>(REMOTE_NAME)
            .unwrap()
            .add_page(&t, "Nested", vec!["nested.bar".to_string()]);

        link.send(Inbound::ButtonTap {
            button_id: "Nested".to_string(),
        });
        poll(&t);
        assert_eq!(
            store.read("remote-layout").unwrap().as_deref(),
            Some(r#"{"currentPageId":"Nested"}"#)
        );

        // A new bridge picks the page up once it is added again
        let other = tree();
        let (bridge, _link) = RemoteBridge::new(RemoteConfig::default());
        other.register(Box::new(bridge.with_page_store(store.clone()))).unwrap();
        let mut bridge = other.extension_mut::<RemoteBridge>(REMOTE_NAME).unwrap();
        assert_eq!(bridge.layout().current_page_id(), Some("All Params"));
        bridge.add_page(&other, "Nested", vec!["nested.bar".to_string()]);
        assert_eq!(bridge.layout().current_page_id(), Some("Nested"));
    }

    #[test]
    fn test_page_restored_on_attach_when_present() {
        let store = MemoryStorage::new();
        store
            .write("remote-layout", r#"{"currentPageId":"All Params"}"#)
            .unwrap();
        let config = RemoteConfig {
            add_all_on_attach: true,
            ..Default::default()
        };
        let t = tree();
        let (bridge, link) = RemoteBridge::new(config);
        t.register(Box::new(bridge.with_page_store(store))).unwrap();
        assert_eq!(
            t.extension::<RemoteBridge>(REMOTE_NAME)
                .unwrap()
                .layout()
                .current_page_id(),
            Some("All Params")
        );
        assert!(link.drain().count() >= 1);
    }

    #[test]
    fn test_full_channel_drops_messages() {
        let config = RemoteConfig {
            channel_capacity: 1,
            ..Default::default()
        };
        let (t, link) = attached(config);
        // The initial layout fills the channel
        t.set("foo", 0.3);
        assert_eq!(link.drain().count(), 1);
    }
}
