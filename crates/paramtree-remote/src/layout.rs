//! Paged surface layouts
//!
//! A layout is an ordered list of pages, each listing the leaf paths it
//! shows, plus the id of the page on screen. Rendered, it becomes:
//!
//! ```text
//! col "root"
//! ├── col <current page>   (one fader per numeric leaf on the page)
//! └── row "pages"          (one button per page, current one highlighted)
//! ```

use paramtree_core::ParamGroup;

use crate::messages::{LayoutDef, WidgetDef, WidgetType};

/// One page of controls
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPage {
    pub id: String,
    /// Dotted leaf paths, in display order
    pub control_ids: Vec<String>,
}

/// Colors and sizing of the page button row
#[derive(Debug, Clone, PartialEq)]
pub struct PageStyle {
    pub button_weight: f64,
    pub active_color: String,
    pub inactive_color: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pages: Vec<LayoutPage>,
    current_page: Option<String>,
    /// Restored page id waiting for its page to be created
    pending_page: Option<String>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[LayoutPage] {
        &self.pages
    }

    pub fn page(&self, id: &str) -> Option<&LayoutPage> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn current_page_id(&self) -> Option<&str> {
        self.current_page.as_deref()
    }

    pub fn current_page(&self) -> Option<&LayoutPage> {
        self.current_page_id().and_then(|id| self.page(id))
    }

    /// Add a page; a page with the same id is replaced in place
    pub fn create_page(&mut self, id: impl Into<String>, control_ids: Vec<String>) {
        let page = LayoutPage {
            id: id.into(),
            control_ids,
        };
        let id = page.id.clone();
        match self.pages.iter_mut().find(|p| p.id == page.id) {
            Some(existing) => *existing = page,
            None => self.pages.push(page),
        }
        if self.pending_page.as_deref() == Some(id.as_str()) {
            self.pending_page = None;
            self.current_page = Some(id);
        }
    }

    /// Switch pages. Unknown ids are ignored; returns true if `id` exists.
    pub fn set_current_page(&mut self, id: &str) -> bool {
        if self.page(id).is_none() {
            log::debug!("remote: ignoring switch to unknown page '{}'", id);
            return false;
        }
        self.current_page = Some(id.to_string());
        self.pending_page = None;
        true
    }

    /// Switch to a previously saved page
    ///
    /// Unlike [`set_current_page`](Self::set_current_page), an id with no page
    /// yet is remembered and becomes current once that page is created.
    /// Returns true if the switch happened now.
    pub fn restore_page(&mut self, id: &str) -> bool {
        if self.page(id).is_some() {
            return self.set_current_page(id);
        }
        self.pending_page = Some(id.to_string());
        false
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.current_page = None;
        self.pending_page = None;
    }

    /// Render the layout against `tree`
    ///
    /// Control ids that do not resolve to a numeric leaf are skipped.
    pub fn render(&self, tree: &ParamGroup, style: &PageStyle) -> LayoutDef {
        let buttons = self
            .pages
            .iter()
            .map(|page| {
                let color = if self.current_page.as_deref() == Some(page.id.as_str()) {
                    &style.active_color
                } else {
                    &style.inactive_color
                };
                WidgetDef::new(WidgetType::Btn, page.id.clone()).with_color(color.clone())
            })
            .collect();
        let page_row = WidgetDef::new(WidgetType::Row, "pages")
            .with_weight(style.button_weight)
            .with_children(buttons);

        let mut children = Vec::with_capacity(2);
        if let Some(page) = self.current_page() {
            let faders = page
                .control_ids
                .iter()
                .filter(|id| tree.number(id).is_some())
                .map(|id| WidgetDef::new(WidgetType::Fader, id.clone()))
                .collect();
            children.push(WidgetDef::new(WidgetType::Col, page.id.clone()).with_children(faders));
        }
        children.push(page_row);

        LayoutDef {
            root: WidgetDef::new(WidgetType::Col, "root").with_children(children),
        }
    }
}
