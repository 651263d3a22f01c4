use std::collections::{HashSet, VecDeque};

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

use crate::DuplicateCode;

/// The ordered list of codes that have not been dispensed yet.
///
/// The head of the pool is the earliest inserted code and the next one to be
/// dispensed. On the wire the pool is a plain JSON array of strings:
///
/// ```
/// use codepool::CodePool;
///
/// let pool = CodePool::new(["A".to_string(), "B".to_string()]).unwrap();
/// assert_eq!(pool.to_json().unwrap(), &b"[\"A\",\"B\"]"[..]);
/// ```
///
/// A pool never contains the same code twice, whether it was built through
/// [`CodePool::new`] or decoded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CodePool {
    codes: VecDeque<String>,
}

impl CodePool {
    /// Builds a pool in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateCode`] naming the first code seen twice.
    pub fn new<I>(codes: I) -> Result<Self, DuplicateCode>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let mut pool = VecDeque::new();
        for code in codes {
            if !seen.insert(code.clone()) {
                return Err(DuplicateCode(code));
            }
            pool.push_back(code);
        }
        Ok(Self { codes: pool })
    }

    /// Splits the pool into its head and the remainder, preserving the order
    /// of the remaining codes. Returns `None` for an empty pool.
    pub fn split_head(mut self) -> Option<(String, Self)> {
        let head = self.codes.pop_front()?;
        Some((head, self))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// The code that the next pop would dispense.
    pub fn head(&self) -> Option<&str> {
        self.codes.front().map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    /// Encodes the pool as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<Bytes> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    /// Decodes a pool from a JSON array of strings. An array that repeats a
    /// code is rejected.
    pub fn from_json(raw: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(raw)
    }
}

impl<'de> Deserialize<'de> for CodePool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let codes = Vec::<String>::deserialize(deserializer)?;
        Self::new(codes).map_err(serde::de::Error::custom)
    }
}

impl IntoIterator for CodePool {
    type Item = String;
    type IntoIter = std::collections::vec_deque::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.codes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(codes: &[&str]) -> CodePool {
        CodePool::new(codes.iter().map(|c| (*c).to_string())).unwrap()
    }

    #[test]
    fn rejects_duplicates() {
        let err = CodePool::new(["A", "B", "A"].map(String::from)).unwrap_err();
        assert_eq!(err, DuplicateCode("A".to_string()));
    }

    #[test]
    fn split_head_preserves_remainder_order() {
        let (head, rest) = pool(&["A", "B", "C"]).split_head().unwrap();
        assert_eq!(head, "A");
        assert_eq!(rest, pool(&["B", "C"]));
        assert_eq!(rest.head(), Some("B"));
    }

    #[test]
    fn split_head_on_empty_pool() {
        assert!(CodePool::default().split_head().is_none());
    }

    #[test]
    fn decodes_stored_array() {
        let decoded = CodePool::from_json(br#"["X","Y"]"#).unwrap();
        assert_eq!(decoded.iter().collect::<Vec<_>>(), ["X", "Y"]);
        assert!(decoded.contains("Y"));
    }

    #[test]
    fn rejects_non_string_arrays() {
        assert!(CodePool::from_json(br#"[1, 2]"#).is_err());
        assert!(CodePool::from_json(br#"{"codes": []}"#).is_err());
        assert!(CodePool::from_json(b"not json").is_err());
    }

    #[test]
    fn rejects_repeated_codes_when_decoding() {
        let err = CodePool::from_json(br#"["A","A","B"]"#).unwrap_err();
        assert!(err.to_string().contains("`A`"));
    }

    #[test]
    fn empty_pool_encodes_as_empty_array() {
        assert_eq!(CodePool::default().to_json().unwrap(), &b"[]"[..]);
    }
}
