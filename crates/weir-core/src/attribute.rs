//! Attribute bags for vertices and edges.
//!
//! Attributes are execution-placement and partitioning hints attached to
//! IR entities. They are carried verbatim through unrolling: every edge
//! synthesized from a template receives a copy of the template's bag and
//! is never mutated afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Keys of the attribute bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKey {
    /// Desired degree of parallelism for a vertex.
    Parallelism,
    /// Where the entity should be placed (e.g. a resource class name).
    Placement,
    /// Backing store for the channel an edge represents.
    ChannelStore,
    /// Partitioning function applied to an edge's payload.
    Partitioner,
}

/// Values of the attribute bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// A numeric knob (parallelism degree, partition count).
    Count(u32),
    /// A symbolic name (resource class, partitioner identifier).
    Name(String),
    /// A boolean switch.
    Flag(bool),
}

/// An insertion-ordered attribute bag.
///
/// Iteration order is the order of first insertion, which keeps unrolled
/// graphs reproducible across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMap {
    entries: IndexMap<AttributeKey, AttributeValue>,
}

impl AttributeMap {
    /// Creates an empty attribute bag.
    pub fn new() -> Self {
        AttributeMap::default()
    }

    /// Sets an attribute, replacing any previous value for the key.
    pub fn insert(&mut self, key: AttributeKey, value: AttributeValue) {
        self.entries.insert(key, value);
    }

    /// Looks up an attribute value by key.
    pub fn get(&self, key: AttributeKey) -> Option<&AttributeValue> {
        self.entries.get(&key)
    }

    /// Copies every entry of `other` into this bag, overwriting existing
    /// values for the same keys. This is the verbatim attribute-copy used
    /// when deriving an edge from a template.
    pub fn copy_from(&mut self, other: &AttributeMap) {
        for (key, value) in &other.entries {
            self.entries.insert(*key, value.clone());
        }
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &AttributeValue)> {
        self.entries.iter()
    }

    /// Number of entries in the bag.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut attrs = AttributeMap::new();
        attrs.insert(AttributeKey::Parallelism, AttributeValue::Count(4));

        assert_eq!(
            attrs.get(AttributeKey::Parallelism),
            Some(&AttributeValue::Count(4))
        );
        assert_eq!(attrs.get(AttributeKey::Placement), None);
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn insert_replaces_previous_value() {
        let mut attrs = AttributeMap::new();
        attrs.insert(AttributeKey::Parallelism, AttributeValue::Count(4));
        attrs.insert(AttributeKey::Parallelism, AttributeValue::Count(8));

        assert_eq!(
            attrs.get(AttributeKey::Parallelism),
            Some(&AttributeValue::Count(8))
        );
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn copy_from_produces_equal_bag() {
        let mut source = AttributeMap::new();
        source.insert(AttributeKey::Placement, AttributeValue::Name("reserved".into()));
        source.insert(AttributeKey::Parallelism, AttributeValue::Count(2));

        let mut target = AttributeMap::new();
        target.copy_from(&source);

        assert_eq!(target, source);
    }

    #[test]
    fn copy_from_overwrites_existing_keys() {
        let mut source = AttributeMap::new();
        source.insert(AttributeKey::Parallelism, AttributeValue::Count(2));

        let mut target = AttributeMap::new();
        target.insert(AttributeKey::Parallelism, AttributeValue::Count(16));
        target.insert(AttributeKey::Partitioner, AttributeValue::Name("hash".into()));
        target.copy_from(&source);

        assert_eq!(
            target.get(AttributeKey::Parallelism),
            Some(&AttributeValue::Count(2))
        );
        // Keys absent from the source are left alone.
        assert_eq!(
            target.get(AttributeKey::Partitioner),
            Some(&AttributeValue::Name("hash".into()))
        );
    }

    #[test]
    fn iteration_is_insertion_ordered() {
        let mut attrs = AttributeMap::new();
        attrs.insert(AttributeKey::Partitioner, AttributeValue::Name("hash".into()));
        attrs.insert(AttributeKey::Parallelism, AttributeValue::Count(1));
        attrs.insert(AttributeKey::Placement, AttributeValue::Flag(true));

        let keys: Vec<AttributeKey> = attrs.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                AttributeKey::Partitioner,
                AttributeKey::Parallelism,
                AttributeKey::Placement,
            ]
        );
    }

    #[test]
    fn serde_roundtrip() {
        let mut attrs = AttributeMap::new();
        attrs.insert(AttributeKey::ChannelStore, AttributeValue::Name("memory".into()));
        attrs.insert(AttributeKey::Parallelism, AttributeValue::Count(3));

        let json = serde_json::to_string(&attrs).unwrap();
        let back: AttributeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
    }
}
