use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    map::Getter,
};

/// In-memory [`Getter`] for tests that want fixtures without writing a file.
///
/// Missing keys produce [`Error::NotFound`], exactly like [`crate::Map`].
#[derive(Debug, Default, Clone)]
pub struct MockGetter {
    entries: HashMap<String, Vec<u8>>,
}

impl MockGetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }
}

impl Getter for MockGetter {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.entries.get(key).cloned().ok_or(Error::NotFound)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K, V> FromIterator<(K, V)> for MockGetter
where
    K: Into<String>,
    V: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mock = Self::new();
        for (key, value) in iter {
            mock.insert(key, value);
        }
        mock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_len() {
        let mock: MockGetter = [("a", "apple"), ("b", "banana")].into_iter().collect();

        assert_eq!(mock.len(), 2);
        assert_eq!(mock.get("a").unwrap(), b"apple");
        assert!(mock.get("c").unwrap_err().is_not_found());
        assert!(mock.get("").unwrap_err().is_not_found());
    }

    #[test]
    fn test_empty() {
        let mock = MockGetter::new();
        assert!(mock.is_empty());
        assert!(mock.get("anything").unwrap_err().is_not_found());
    }
}
