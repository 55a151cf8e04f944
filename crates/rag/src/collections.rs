//! Book → collection mapping
//!
//! Built once at startup and shared read-only between requests.

use std::collections::BTreeMap;

use claritas_config::RagConfig;

/// Static mapping from logical book name to physical collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionMap {
    books: BTreeMap<String, String>,
}

impl CollectionMap {
    pub fn new<I, B, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (B, C)>,
        B: Into<String>,
        C: Into<String>,
    {
        Self {
            books: entries
                .into_iter()
                .map(|(book, collection)| (book.into(), collection.into()))
                .collect(),
        }
    }

    /// Collection for `book`, or `None` when the book is unrecognized.
    ///
    /// Matching is exact; router output is expected to use the canonical
    /// book titles.
    pub fn resolve(&self, book: &str) -> Option<&str> {
        self.books.get(book).map(String::as_str)
    }

    pub fn books(&self) -> impl Iterator<Item = &str> {
        self.books.keys().map(String::as_str)
    }

    /// `(book, collection)` pairs in book order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.books
            .iter()
            .map(|(book, collection)| (book.as_str(), collection.as_str()))
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl From<&RagConfig> for CollectionMap {
    fn from(config: &RagConfig) -> Self {
        Self::new(config.collections.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_books_resolve() {
        let map = CollectionMap::from(&RagConfig::default());
        assert_eq!(map.resolve("God Speaks"), Some("god_speaks_collection"));
        assert_eq!(map.resolve("Life Eternal"), Some("life_eternal_collection"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_unrecognized_book() {
        let map = CollectionMap::new([("Life Eternal", "le")]);
        assert_eq!(map.resolve("Discourses"), None);
        assert_eq!(map.resolve("life eternal"), None);
        assert_eq!(map.resolve(""), None);
    }
}
