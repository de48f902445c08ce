//! Position keys: identity of one product slot in one resolution tree
//!
//! A key is rendered as the parent key, a `/`, then `product@depth`. The
//! root has no parent and no leading `/`. Catalog ids never contain `/` or
//! `@`, so the rendering can be split back into its parts unambiguously and
//! two different `(product, depth, parent)` triples never share a key.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::is_valid_id;
use crate::error::{ChainError, ChainResult};

const SEGMENT_SEP: char = '/';
const DEPTH_SEP: char = '@';

/// Build the key for `product_id` at `depth` below `parent_key`.
///
/// Fails if `product_id` is not a valid catalog id, since an id holding a
/// separator could make two slots render to the same key.
pub fn build_key(product_id: &str, depth: u32, parent_key: Option<&str>) -> ChainResult<String> {
    if !is_valid_id(product_id) {
        return Err(ChainError::invalid_request(format!(
            "product id {product_id:?} cannot be used in a position key"
        )));
    }
    Ok(match parent_key {
        Some(parent) => format!("{parent}{SEGMENT_SEP}{product_id}{DEPTH_SEP}{depth}"),
        None => format!("{product_id}{DEPTH_SEP}{depth}"),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn new(product_id: &str, depth: u32, parent: Option<&PositionKey>) -> ChainResult<Self> {
        build_key(product_id, depth, parent.map(PositionKey::as_str)).map(PositionKey)
    }

    /// Parse a rendered key, e.g. one supplied as an override.
    ///
    /// Every segment must be `id@depth` with a valid catalog id.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        for segment in text.split(SEGMENT_SEP) {
            let (id, depth) = segment.rsplit_once(DEPTH_SEP)?;
            if !is_valid_id(id) || depth.is_empty() || !depth.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            depth.parse::<u32>().ok()?;
        }
        Some(PositionKey(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `other` lies strictly beneath this key.
    pub fn is_ancestor_of(&self, other: &str) -> bool {
        other.len() > self.0.len()
            && other.starts_with(self.0.as_str())
            && other[self.0.len()..].starts_with(SEGMENT_SEP)
    }
}

impl Borrow<str> for PositionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PositionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PositionKey> for String {
    fn from(key: PositionKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_and_child_rendering() {
        assert_eq!(build_key("44", 0, None).unwrap(), "44@0");
        assert_eq!(build_key("32", 1, Some("44@0")).unwrap(), "44@0/32@1");

        let root = PositionKey::new("44", 0, None).unwrap();
        let child = PositionKey::new("32", 1, Some(&root)).unwrap();
        assert_eq!(child.as_str(), "44@0/32@1");
        assert!(root.is_ancestor_of(child.as_str()));
    }

    #[test]
    fn ids_holding_separators_are_rejected() {
        // "a/b@1" under "x@0" would otherwise render like "b" at depth 1 under "x@0/a"
        for bad in ["a/b", "b@1", "", "a b"] {
            assert!(matches!(
                build_key(bad, 1, Some("x@0")),
                Err(ChainError::InvalidRequest { .. })
            ));
            assert!(PositionKey::new(bad, 0, None).is_err());
        }
    }

    #[test]
    fn ancestry() {
        let root = PositionKey::new("4", 0, None).unwrap();
        assert!(root.is_ancestor_of("4@0/1@1"));
        assert!(root.is_ancestor_of("4@0/1@1/11@2"));
        assert!(!root.is_ancestor_of("4@0"));
        assert!(!root.is_ancestor_of("4@01/1@1"));
        assert!(!root.is_ancestor_of("44@0/1@1"));
    }

    #[test]
    fn parse_accepts_only_well_formed_keys() {
        assert!(PositionKey::parse("44@0").is_some());
        assert!(PositionKey::parse("44@0/32@1/11@2").is_some());
        assert!(PositionKey::parse("").is_none());
        assert!(PositionKey::parse("44").is_none());
        assert!(PositionKey::parse("44@").is_none());
        assert!(PositionKey::parse("44@x").is_none());
        assert!(PositionKey::parse("44@0/").is_none());
        assert!(PositionKey::parse("/44@0").is_none());
        assert!(PositionKey::parse("4 4@0").is_none());
        assert!(PositionKey::parse("44@-1").is_none());
    }

    #[test]
    fn same_product_at_different_slots_gets_different_keys() {
        let root = PositionKey::new("44", 0, None).unwrap();
        let a = PositionKey::new("1", 1, Some(&root)).unwrap();
        let other_parent = PositionKey::new("32", 1, Some(&root)).unwrap();
        let b = PositionKey::new("1", 2, Some(&other_parent)).unwrap();
        assert_ne!(a, b);
    }

    fn id() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_.-]{1,6}"
    }

    proptest! {
        #[test]
        fn key_is_deterministic(p in id(), depth in 0u32..50, parent in proptest::option::of("[a-z0-9@/]{0,12}")) {
            prop_assert_eq!(
                build_key(&p, depth, parent.as_deref()).unwrap(),
                build_key(&p, depth, parent.as_deref()).unwrap()
            );
        }

        #[test]
        fn key_is_injective(
            p1 in id(), d1 in 0u32..5, k1 in proptest::option::of("[a-z0-9@/]{0,8}"),
            p2 in id(), d2 in 0u32..5, k2 in proptest::option::of("[a-z0-9@/]{0,8}")
        ) {
            let same_inputs = p1 == p2 && d1 == d2 && k1 == k2;
            let same_key =
                build_key(&p1, d1, k1.as_deref()).unwrap() == build_key(&p2, d2, k2.as_deref()).unwrap();
            prop_assert_eq!(same_inputs, same_key);
        }
    }
}
