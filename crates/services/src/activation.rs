//! Accessible activation: pointer clicks and Enter/Space on a focused target
//! both resolve to the single action bound to that target.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPress {
    Enter,
    Space,
    Other(String),
}

impl KeyPress {
    /// Map a DOM-style key name (`"Enter"`, `" "`, ...) onto a key press.
    #[must_use]
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "Enter" => Self::Enter,
            " " | "Spacebar" => Self::Space,
            other => Self::Other(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Click,
    /// Key went down while the target had focus.
    KeyDown(KeyPress),
}

impl InputEvent {
    #[must_use]
    pub fn activates(&self) -> bool {
        matches!(
            self,
            InputEvent::Click | InputEvent::KeyDown(KeyPress::Enter | KeyPress::Space)
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindOptions {
    /// Drop the binding after its first activation.
    pub once: bool,
}

impl BindOptions {
    #[must_use]
    pub fn once() -> Self {
        Self { once: true }
    }
}

#[derive(Debug, Clone)]
struct Binding<A> {
    action: A,
    once: bool,
}

/// Target → action bindings with a per-target "already bound" marker.
///
/// The marker outlives a one-shot binding, so a consumed target cannot be
/// re-armed by a later `bind`; only `unbind` (the target leaving the
/// document) clears it.
#[derive(Debug)]
pub struct ActivationRegistry<T, A> {
    bindings: HashMap<T, Binding<A>>,
    bound: HashSet<T>,
}

impl<T, A> Default for ActivationRegistry<T, A> {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
            bound: HashSet::new(),
        }
    }
}

impl<T, A> ActivationRegistry<T, A>
where
    T: Clone + Eq + Hash,
    A: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `action` to `target`. Returns `false` (and changes nothing) if the
    /// target was bound before.
    pub fn bind(&mut self, target: T, action: A, options: BindOptions) -> bool {
        if !self.bound.insert(target.clone()) {
            return false;
        }
        self.bindings.insert(
            target,
            Binding {
                action,
                once: options.once,
            },
        );
        true
    }

    /// Forget `target` entirely, marker included.
    pub fn unbind(&mut self, target: &T) {
        self.bindings.remove(target);
        self.bound.remove(target);
    }

    /// Whether `target` carries the bound marker (renders as a button).
    #[must_use]
    pub fn is_bound(&self, target: &T) -> bool {
        self.bound.contains(target)
    }

    /// Whether an activation of `target` would still fire.
    #[must_use]
    pub fn is_live(&self, target: &T) -> bool {
        self.bindings.contains_key(target)
    }

    /// Resolve `event` on `target`. `Some` means the event was consumed: the
    /// host must suppress its default action before running the returned action.
    pub fn dispatch(&mut self, target: &T, event: &InputEvent) -> Option<A> {
        if !event.activates() {
            return None;
        }
        let binding = self.bindings.get(target)?;
        let action = binding.action.clone();
        if binding.once {
            self.bindings.remove(target);
        }
        Some(action)
    }
}
