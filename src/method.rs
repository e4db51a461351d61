//! HTTP method as a typed enum.
//!
//! Proxy events carry the verb as free text. It is upper-cased before
//! parsing, so `"get"` and `"GET"` name the same route. A verb outside
//! RFC 9110 never matches a route and falls through to the not-found path.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// An RFC 9110 HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }
}

/// Parses a method name, ignoring ASCII case.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            other     => Err(Error::InvalidEvent(format!("unknown HTTP method `{other}`"))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordered, non-empty set of verbs a route answers to.
///
/// Built from a single [`Method`], an array, or a `Vec`, so registration
/// calls read naturally either way:
///
/// ```rust
/// use proxy_router::{Method, Methods};
///
/// let one: Methods = Method::Get.into();
/// let two: Methods = [Method::Get, Method::Post].into();
/// assert!(two.contains(Method::Post));
/// assert_eq!(one.len(), 1);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Methods(Vec<Method>);

impl Methods {
    pub fn contains(&self, method: Method) -> bool {
        self.0.contains(&method)
    }

    pub fn iter(&self) -> impl Iterator<Item = Method> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Method> for Methods {
    fn from(method: Method) -> Self {
        Self(vec![method])
    }
}

impl<const N: usize> From<[Method; N]> for Methods {
    fn from(methods: [Method; N]) -> Self {
        Self::from(methods.to_vec())
    }
}

impl From<Vec<Method>> for Methods {
    fn from(mut methods: Vec<Method>) -> Self {
        // Keep first-seen order, drop repeats.
        let mut seen = Vec::with_capacity(methods.len());
        methods.retain(|m| {
            let fresh = !seen.contains(m);
            seen.push(*m);
            fresh
        });
        Self(methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_any_case() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Options".parse::<Method>().unwrap(), Method::Options);
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn method_set_drops_repeats_in_order() {
        let set = Methods::from(vec![Method::Post, Method::Get, Method::Post]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Method::Post, Method::Get]);
    }
}
