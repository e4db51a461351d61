//! Per-request state handed to middleware and handlers.
//!
//! Everything a handler needs arrives in its [`Request`]: the proxy event,
//! the invocation context, the path arguments extracted by the matched rule,
//! and a snapshot of the resolver's additional context. Nothing about the
//! request is stored on the long-lived [`Resolver`](crate::Resolver).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::event::{InvocationContext, ProxyEvent};

/// Named path arguments, e.g. `{"id": "1234"}` for `/items/<id>`.
pub type Args = HashMap<String, String>;

/// An incoming request, as seen by middleware and handlers.
#[derive(Clone, Debug)]
pub struct Request {
    event: Arc<ProxyEvent>,
    invocation: Arc<InvocationContext>,
    args: Args,
    context: Arc<Context>,
}

impl Request {
    pub fn new(
        event: Arc<ProxyEvent>,
        invocation: Arc<InvocationContext>,
        args: Args,
        context: Arc<Context>,
    ) -> Self {
        Self { event, invocation, args, context }
    }

    pub fn event(&self) -> &ProxyEvent { &self.event }
    pub fn invocation(&self) -> &InvocationContext { &self.invocation }
    pub fn args(&self) -> &Args { &self.args }
    pub fn context(&self) -> &Context { &self.context }

    pub fn method(&self) -> &str { &self.event.http_method }
    pub fn path(&self) -> &str { &self.event.path }
    pub fn body(&self) -> Option<&str> { self.event.body.as_deref() }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.event.header(name)
    }

    /// Returns a named path argument.
    ///
    /// For a route `/users/<id>`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }

    /// Mutable access to the path arguments, so a middleware can rewrite
    /// them before calling the rest of the chain.
    pub fn args_mut(&mut self) -> &mut Args {
        &mut self.args
    }
}

/// The resolver's additional context: an insertion-ordered key → value bag
/// shared with every handler.
///
/// Later values for an existing key replace the earlier value in place; new
/// keys are appended.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    entries: Vec<(String, Value)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Merges `other` into `self`, `other` winning on conflicts.
    pub fn extend(&mut self, other: Context) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Context {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_values_override_in_place() {
        let mut ctx = Context::from([("a", 1), ("b", 2)]);
        ctx.extend(Context::from([("a", 3), ("c", 4)]));
        assert_eq!(ctx.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(ctx.get("a"), Some(&Value::from(3)));
    }
}
