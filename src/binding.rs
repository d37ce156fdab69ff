//! # Binding Context
//!
//! The key→value structure handed to the template renderer. A binding is
//! either a scalar (rendered as text), a list of per-iteration sub-contexts
//! (rendered by cloning a loop body), or an image token (rendered by binary
//! substitution into the archive's media folder).
//!
//! Lookup tolerance is the core contract: a missing key resolves to an
//! empty scalar and a loop over a missing key iterates zero times. A
//! partially filled record must always produce a document, never a panic.

use std::collections::BTreeMap;

use crate::image::ImageToken;

/// A single bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Scalar(String),
    List(Vec<BindingContext>),
    Image(ImageToken),
}

/// An ordered map of bindings. Loop iterations carry their own context,
/// resolved in front of the outer one (inner keys shadow outer keys).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingContext {
    entries: BTreeMap<String, Binding>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_scalar(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), Binding::Scalar(value.into()));
    }

    pub fn set_list(&mut self, key: &str, items: Vec<BindingContext>) {
        self.entries.insert(key.to_string(), Binding::List(items));
    }

    pub fn set_image(&mut self, key: &str, token: ImageToken) {
        self.entries.insert(key.to_string(), Binding::Image(token));
    }

    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.entries.get(key)
    }

    /// Scalar form of a key: the scalar itself, or `""` when the key is
    /// absent or bound to a non-scalar.
    pub fn scalar(&self, key: &str) -> &str {
        match self.entries.get(key) {
            Some(Binding::Scalar(s)) => s,
            _ => "",
        }
    }

    /// List form of a key: the bound list, or an empty slice when the key
    /// is absent or bound to a non-list.
    pub fn list(&self, key: &str) -> &[BindingContext] {
        match self.entries.get(key) {
            Some(Binding::List(items)) => items,
            _ => &[],
        }
    }

    /// Image form of a key, if bound to an image token.
    pub fn image(&self, key: &str) -> Option<&ImageToken> {
        match self.entries.get(key) {
            Some(Binding::Image(token)) => Some(token),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// A scope chain for loop rendering: the innermost context wins.
///
/// Resolution borrows from the contexts, not from the frame slice, so a
/// caller can keep growing its frame stack with values it resolved.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'s, 'a> {
    frames: &'s [&'a BindingContext],
}

impl<'s, 'a> Scope<'s, 'a> {
    pub fn new(frames: &'s [&'a BindingContext]) -> Self {
        Scope { frames }
    }

    pub fn resolve(&self, key: &str) -> Option<&'a Binding> {
        self.frames.iter().rev().find_map(|ctx| ctx.get(key))
    }

    pub fn scalar(&self, key: &str) -> &'a str {
        match self.resolve(key) {
            Some(Binding::Scalar(s)) => s,
            _ => "",
        }
    }

    pub fn list(&self, key: &str) -> &'a [BindingContext] {
        match self.resolve(key) {
            Some(Binding::List(items)) => items,
            _ => &[],
        }
    }

    pub fn image(&self, key: &str) -> Option<&'a ImageToken> {
        match self.resolve(key) {
            Some(Binding::Image(token)) => Some(token),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_resolve_empty() {
        let ctx = BindingContext::new();
        assert_eq!(ctx.scalar("absent"), "");
        assert!(ctx.list("absent").is_empty());
        assert!(ctx.image("absent").is_none());
    }

    #[test]
    fn wrong_kind_resolves_empty() {
        let mut ctx = BindingContext::new();
        ctx.set_list("items", vec![]);
        assert_eq!(ctx.scalar("items"), "");
        ctx.set_scalar("name", "x");
        assert!(ctx.list("name").is_empty());
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let mut outer = BindingContext::new();
        outer.set_scalar("name", "outer");
        outer.set_scalar("site", "Tower A");
        let mut inner = BindingContext::new();
        inner.set_scalar("name", "inner");

        let frames = [&outer, &inner];
        let scope = Scope::new(&frames);
        assert_eq!(scope.scalar("name"), "inner");
        assert_eq!(scope.scalar("site"), "Tower A");
        assert_eq!(scope.scalar("absent"), "");
    }
}
