//! Leaf parameters
//!
//! A leaf holds one typed, observable value. Leaves come in a closed set of
//! kinds ([`Param::Number`], [`Param::Color`]); every consumer matches on the
//! kind exhaustively.
//!
//! There are two ways to write a leaf, and they notify differently:
//!
//! - `assign(v)` is the plain property-style write used by widgets that report
//!   on every interaction. It always notifies, even if `v` equals the current
//!   value, and carries an empty provenance tag.
//! - `set_value(v, origin)` is the controller write. It notifies only when the
//!   value actually changes, and carries `origin` as the provenance tag.
//!
//! Range and step on numeric leaves are presentation metadata. Values outside
//! `[min, max]` are stored as given.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::event::{ChangeEvent, Listener, Notifier};
use crate::value::Value;

/// Default lower bound of a numeric leaf
pub const DEFAULT_MIN: f64 = 0.0;
/// Default upper bound of a numeric leaf
pub const DEFAULT_MAX: f64 = 1.0;
/// Default step of a numeric leaf
pub const DEFAULT_STEP: f64 = 0.001;

/// Numeric leaf with range metadata
pub struct NumberParam {
    name: String,
    value: Cell<f64>,
    min: f64,
    max: f64,
    step: f64,
    notifier: Rc<Notifier>,
}

impl NumberParam {
    /// Create a numeric leaf with the default `[0, 1]` range
    pub fn new(value: f64) -> Self {
        Self {
            name: String::new(),
            value: Cell::new(value),
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
            step: DEFAULT_STEP,
            notifier: Notifier::new(),
        }
    }

    /// Set the value range
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the step size
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Key under which the owning group holds this leaf (empty until attached)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value.get()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Property-style write: stores `v` and always notifies
    pub fn assign(&self, v: f64) {
        self.value.set(v);
        self.notifier.emit(&ChangeEvent::new(Value::Number(v), ""));
    }

    /// Controller write: stores `v` and notifies only if it differs
    ///
    /// Returns true if the value changed. `NaN` never compares equal, so
    /// writing `NaN` always notifies.
    pub fn set_value(&self, v: f64, origin: &str) -> bool {
        if v == self.value.get() {
            return false;
        }
        self.value.set(v);
        self.notifier.emit(&ChangeEvent::new(Value::Number(v), origin));
        true
    }

    /// Value rescaled linearly from `[min, max]` into `[0, 1]`
    ///
    /// A degenerate range (`min == max`) reads as `0.0`.
    pub fn normalized(&self) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        (self.value.get() - self.min) / span
    }

    /// Controller write of a normalized value, mapped back into `[min, max]`
    ///
    /// With a degenerate range every input maps to `min`. The input is not
    /// clamped.
    pub fn set_normalized(&self, n: f64, origin: &str) -> bool {
        self.set_value(self.min + n * (self.max - self.min), origin)
    }

    pub fn on_change(&self, listener: &Listener) {
        self.notifier.subscribe(listener);
    }

    /// Remove a listener by identity. Returns true if it was registered.
    pub fn off_change(&self, listener: &Listener) -> bool {
        self.notifier.unsubscribe(listener)
    }
}

impl std::fmt::Debug for NumberParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumberParam")
            .field("name", &self.name)
            .field("value", &self.value.get())
            .field("min", &self.min)
            .field("max", &self.max)
            .field("step", &self.step)
            .finish()
    }
}

/// Color leaf holding a string-encoded color
pub struct ColorParam {
    name: String,
    value: RefCell<String>,
    notifier: Rc<Notifier>,
}

impl ColorParam {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            value: RefCell::new(value.into()),
            notifier: Notifier::new(),
        }
    }

    /// Key under which the owning group holds this leaf (empty until attached)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    /// Decode `#rgb` or `#rrggbb` into components
    ///
    /// Returns `None` for any other encoding.
    pub fn rgb(&self) -> Option<[u8; 3]> {
        parse_hex_color(&self.value.borrow())
    }

    /// Property-style write: stores `v` and always notifies
    pub fn assign(&self, v: impl Into<String>) {
        let v = v.into();
        *self.value.borrow_mut() = v.clone();
        self.notifier.emit(&ChangeEvent::new(Value::Color(v), ""));
    }

    /// Controller write: stores `v` and notifies only if it differs
    pub fn set_value(&self, v: impl Into<String>, origin: &str) -> bool {
        let v = v.into();
        if *self.value.borrow() == v {
            return false;
        }
        *self.value.borrow_mut() = v.clone();
        self.notifier.emit(&ChangeEvent::new(Value::Color(v), origin));
        true
    }

    pub fn on_change(&self, listener: &Listener) {
        self.notifier.subscribe(listener);
    }

    /// Remove a listener by identity. Returns true if it was registered.
    pub fn off_change(&self, listener: &Listener) -> bool {
        self.notifier.unsubscribe(listener)
    }
}

impl std::fmt::Debug for ColorParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorParam")
            .field("name", &self.name)
            .field("value", &*self.value.borrow())
            .finish()
    }
}

fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        6 => {
            let mut out = [0u8; 3];
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
            }
            Some(out)
        }
        _ => None,
    }
}

/// Leaf kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Number,
    Color,
}

/// A leaf parameter of any kind
#[derive(Debug)]
pub enum Param {
    Number(NumberParam),
    Color(ColorParam),
}

impl Param {
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Number(_) => ParamKind::Number,
            Self::Color(_) => ParamKind::Color,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Number(p) => p.name(),
            Self::Color(p) => p.name(),
        }
    }

    pub fn value(&self) -> Value {
        match self {
            Self::Number(p) => Value::Number(p.value()),
            Self::Color(p) => Value::Color(p.value()),
        }
    }

    /// Normalized reading; `None` for non-numeric leaves
    pub fn normalized(&self) -> Option<f64> {
        match self {
            Self::Number(p) => Some(p.normalized()),
            Self::Color(_) => None,
        }
    }

    /// Property-style write of a plain value
    ///
    /// Writing a value of the wrong kind is a precondition violation: it is
    /// logged and ignored, and `false` is returned.
    pub fn assign(&self, value: Value) -> bool {
        match (self, value) {
            (Self::Number(p), Value::Number(v)) => {
                p.assign(v);
                true
            }
            (Self::Color(p), Value::Color(v)) => {
                p.assign(v);
                true
            }
            (_, value) => {
                self.warn_kind_mismatch(&value);
                false
            }
        }
    }

    /// Controller write of a plain value; returns true if the value changed
    ///
    /// Kind mismatches are logged and ignored.
    pub fn set_value(&self, value: Value, origin: &str) -> bool {
        match (self, value) {
            (Self::Number(p), Value::Number(v)) => p.set_value(v, origin),
            (Self::Color(p), Value::Color(v)) => p.set_value(v, origin),
            (_, value) => {
                self.warn_kind_mismatch(&value);
                false
            }
        }
    }

    pub fn on_change(&self, listener: &Listener) {
        match self {
            Self::Number(p) => p.on_change(listener),
            Self::Color(p) => p.on_change(listener),
        }
    }

    pub fn off_change(&self, listener: &Listener) -> bool {
        match self {
            Self::Number(p) => p.off_change(listener),
            Self::Color(p) => p.off_change(listener),
        }
    }

    pub fn as_number(&self) -> Option<&NumberParam> {
        match self {
            Self::Number(p) => Some(p),
            Self::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<&ColorParam> {
        match self {
            Self::Number(_) => None,
            Self::Color(p) => Some(p),
        }
    }

    /// Take the key assigned by the owning group and forward events to it
    pub(crate) fn attach(&mut self, key: &str, parent: &Rc<Notifier>) {
        let (name, notifier) = match self {
            Self::Number(p) => (&mut p.name, &p.notifier),
            Self::Color(p) => (&mut p.name, &p.notifier),
        };
        *name = key.to_string();
        notifier.attach(parent, key);
    }

    fn warn_kind_mismatch(&self, value: &Value) {
        log::warn!(
            "param: ignoring write of {:?} to {:?} leaf '{}'",
            value,
            self.kind(),
            self.name()
        );
    }
}

impl From<NumberParam> for Param {
    fn from(p: NumberParam) -> Self {
        Self::Number(p)
    }
}

impl From<ColorParam> for Param {
    fn from(p: ColorParam) -> Self {
        Self::Color(p)
    }
}
