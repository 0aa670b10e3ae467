//! Content hashing for persistable entities
//!
//! Each entity declares the fields that participate in its content hash and
//! feeds them into a [`FieldDigest`]. The digest sorts fields by name,
//! serialises every value through a stable type-tagged binary encoding and
//! returns the hex SHA-256 of the result. Two entities hash equal exactly
//! when their declared fields are value-equal, which is what the storage
//! cache uses to skip unchanged rows.

use sha2::{Digest, Sha256};

const TAG_I64: u8 = 0x01;
const TAG_U32: u8 = 0x02;
const TAG_STR: u8 = 0x03;
const TAG_BOOL: u8 = 0x04;
const TAG_BYTES: u8 = 0x05;
const TAG_NONE: u8 = 0x06;

/// Accumulates `(field name, encoded value)` pairs for one entity.
#[derive(Debug, Default)]
pub struct FieldDigest {
    fields: Vec<(&'static str, Vec<u8>)>,
}

impl FieldDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_i64(&mut self, name: &'static str, value: i64) {
        let mut buf = Vec::with_capacity(9);
        buf.push(TAG_I64);
        buf.extend_from_slice(&value.to_le_bytes());
        self.fields.push((name, buf));
    }

    pub fn push_u32(&mut self, name: &'static str, value: u32) {
        let mut buf = Vec::with_capacity(5);
        buf.push(TAG_U32);
        buf.extend_from_slice(&value.to_le_bytes());
        self.fields.push((name, buf));
    }

    pub fn push_str(&mut self, name: &'static str, value: &str) {
        let mut buf = Vec::with_capacity(9 + value.len());
        buf.push(TAG_STR);
        buf.extend_from_slice(&(value.len() as u64).to_le_bytes());
        buf.extend_from_slice(value.as_bytes());
        self.fields.push((name, buf));
    }

    pub fn push_bool(&mut self, name: &'static str, value: bool) {
        self.fields.push((name, vec![TAG_BOOL, u8::from(value)]));
    }

    pub fn push_bytes(&mut self, name: &'static str, value: &[u8]) {
        let mut buf = Vec::with_capacity(9 + value.len());
        buf.push(TAG_BYTES);
        buf.extend_from_slice(&(value.len() as u64).to_le_bytes());
        buf.extend_from_slice(value);
        self.fields.push((name, buf));
    }

    pub fn push_opt_i64(&mut self, name: &'static str, value: Option<i64>) {
        match value {
            Some(v) => self.push_i64(name, v),
            None => self.fields.push((name, vec![TAG_NONE])),
        }
    }

    /// Hex SHA-256 over the name-sorted, type-tagged field encoding.
    pub fn finish(mut self) -> String {
        self.fields.sort_by_key(|(name, _)| *name);

        let mut hasher = Sha256::new();
        for (name, encoded) in &self.fields {
            hasher.update((name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
            hasher.update(encoded);
        }

        hex::encode(hasher.finalize())
    }
}

/// Implemented by every entity that participates in the write-through cache.
pub trait ContentHash {
    /// Feed the declared hashable fields into the digest.
    fn digest_fields(&self, digest: &mut FieldDigest);

    fn content_hash(&self) -> String {
        let mut digest = FieldDigest::new();
        self.digest_fields(&mut digest);
        digest.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        let build = || {
            let mut d = FieldDigest::new();
            d.push_i64("id", 42);
            d.push_str("name", "warden");
            d.push_bool("is_bot", false);
            d.finish()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let mut a = FieldDigest::new();
        a.push_i64("id", 1);
        a.push_str("title", "general");

        let mut b = FieldDigest::new();
        b.push_str("title", "general");
        b.push_i64("id", 1);

        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_value_changes_the_hash() {
        let mut a = FieldDigest::new();
        a.push_str("title", "general");

        let mut b = FieldDigest::new();
        b.push_str("title", "offtopic");

        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_types_are_distinguished() {
        let mut a = FieldDigest::new();
        a.push_i64("v", 1);

        let mut b = FieldDigest::new();
        b.push_str("v", "1");

        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_none_differs_from_zero() {
        let mut a = FieldDigest::new();
        a.push_opt_i64("last_seen", None);

        let mut b = FieldDigest::new();
        b.push_opt_i64("last_seen", Some(0));

        assert_ne!(a.finish(), b.finish());
    }
}
