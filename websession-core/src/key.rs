//! Request key derivation.
//!
//! A [`RequestKey`] is the deterministic identity of a logical HTTP request,
//! used both for cache lookups and for in-flight request coalescing. Two
//! requests with the same method, URL, and parameter set always derive equal
//! keys regardless of parameter ordering; any differing field yields a
//! different key.
//!
//! ```
//! use http::Method;
//! use url::Url;
//! use websession_core::RequestKey;
//!
//! let url = Url::parse("https://api.example.com/search").unwrap();
//! let a = RequestKey::derive(&Method::GET, &url, &[("q", "rust"), ("page", "2")], None);
//! let b = RequestKey::derive(&Method::GET, &url, &[("page", "2"), ("q", "rust")], None);
//! assert_eq!(a, b);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use http::Method;
use sha2::{Digest, Sha256};
use smol_str::SmolStr;
use url::Url;

/// A single named component of a [`RequestKey`].
///
/// Both key and value use [`SmolStr`], which stores strings up to 23 bytes
/// inline without heap allocation, which covers typical components like
/// `method`, `GET`, or short query values.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct KeyPart {
    name: SmolStr,
    value: SmolStr,
}

impl KeyPart {
    /// Creates a new key part.
    pub fn new(name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        KeyPart {
            name: SmolStr::new(name),
            value: SmolStr::new(value),
        }
    }

    /// Returns the part name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the part value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

#[derive(Debug, Eq, PartialEq, Hash)]
struct RequestKeyInner {
    parts: Vec<KeyPart>,
}

/// The deterministic identity of a logical HTTP request.
///
/// Derived from the method, the URL, the canonically ordered parameter set,
/// and (when a body is present) a SHA-256 body fingerprint. Request headers
/// never participate: two requests differing only in headers are the same
/// logical request for caching and coalescing purposes.
///
/// # Cheap cloning
///
/// `RequestKey` wraps its parts in [`Arc`], so `clone()` only bumps a
/// reference count. Keys are cloned on every cache lookup and registry
/// operation, which makes this worthwhile.
#[derive(Clone, Debug)]
pub struct RequestKey {
    inner: Arc<RequestKeyInner>,
}

impl PartialEq for RequestKey {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for RequestKey {}

impl Hash for RequestKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.inner.parts.iter().enumerate() {
            if i > 0 {
                write!(f, "&")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl RequestKey {
    /// Derives the key for a logical request.
    ///
    /// Parameters are treated as an unordered mapping: they are sorted by
    /// (name, value) before combining, so presentation order never affects
    /// the key. A body, when present, contributes a SHA-256 fingerprint
    /// rather than its raw bytes, so two byte-identical concurrent POSTs
    /// coalesce while differing bodies keep distinct keys.
    ///
    /// This is a total function: the URL has already been parsed by the
    /// caller, and every other input is well-formed by construction.
    pub fn derive(
        method: &Method,
        url: &Url,
        params: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> Self {
        let mut sorted: Vec<(&str, &str)> = params.to_vec();
        sorted.sort_unstable();

        let mut parts = Vec::with_capacity(2 + sorted.len() + body.is_some() as usize);
        parts.push(KeyPart::new("method", method.as_str()));
        parts.push(KeyPart::new("url", url.as_str()));
        for (name, value) in sorted {
            // Query parts live in their own namespace so a parameter named
            // "method" or "body" can never alias the fixed parts.
            parts.push(KeyPart::new(format!("q:{name}"), value));
        }
        if let Some(body) = body {
            parts.push(KeyPart::new("body", fingerprint(body)));
        }

        RequestKey {
            inner: Arc::new(RequestKeyInner { parts }),
        }
    }

    /// Returns an iterator over the key parts.
    pub fn parts(&self) -> impl Iterator<Item = &KeyPart> {
        self.inner.parts.iter()
    }
}

/// Hex-encoded SHA-256 digest of a request body.
fn fingerprint(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}
