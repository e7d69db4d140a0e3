//! Data models for Loom
//!
//! Defines the records kept in persisted collections: favorite books and
//! reading diary entries. Field names serialize in camelCase, matching the
//! stored shapes `{id, title, author, imageUrl, description}` and
//! `{id, timestamp, bookTitle, author, thoughts, rating}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collection::Record;

/// Highest diary rating
pub const MAX_RATING: u8 = 5;

/// A book summary from the catalog, kept in favorites
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Catalog volume id
    pub id: String,
    pub title: String,
    /// First listed author
    #[serde(default)]
    pub author: String,
    /// Cover thumbnail
    #[serde(default)]
    pub image_url: Option<String>,
    /// Catalog description, may contain HTML markup
    #[serde(default)]
    pub description: String,
}

impl Book {
    /// Create a book with the given id and title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            image_url: None,
            description: String::new(),
        }
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the cover image
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Description with markup tags removed, as it would be read aloud
    pub fn plain_description(&self) -> String {
        strip_tags(&self.description).trim().to_string()
    }
}

impl Record for Book {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A reading diary entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    /// Generated when the entry is added
    pub id: String,
    /// When the entry was added
    pub timestamp: DateTime<Utc>,
    pub book_title: String,
    #[serde(default)]
    pub author: String,
    pub thoughts: String,
    /// 0 to 5, 0 meaning no rating
    #[serde(default)]
    pub rating: u8,
}

impl DiaryEntry {
    /// Rating if one was given
    pub fn rating(&self) -> Option<u8> {
        (self.rating > 0).then_some(self.rating)
    }
}

impl Record for DiaryEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Diary entry fields supplied by the user; id and timestamp are generated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDiaryEntry {
    pub book_title: String,
    pub author: String,
    pub thoughts: String,
    pub rating: u8,
}

impl NewDiaryEntry {
    /// Create an entry with the required fields
    pub fn new(book_title: impl Into<String>, thoughts: impl Into<String>) -> Self {
        Self {
            book_title: book_title.into(),
            thoughts: thoughts.into(),
            ..Self::default()
        }
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the rating
    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = rating;
        self
    }
}

/// Drop everything between `<` and the next `>`
///
/// A `<` with no closing `>` is kept along with the text after it.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_book_builder() {
        let book = Book::new("b1", "Dune")
            .with_author("Frank Herbert")
            .with_image_url("http://img/1")
            .with_description("Spice");
        assert_eq!(book.id(), "b1");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.image_url.as_deref(), Some("http://img/1"));
    }

    #[test]
    fn test_book_serializes_camel_case() {
        let book = Book::new("b1", "Dune").with_image_url("http://img/1");
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["imageUrl"], "http://img/1");
        assert!(json.get("image_url").is_none());
    }

    #[test]
    fn test_book_tolerates_missing_optional_fields() {
        let book: Book = serde_json::from_str(r#"{"id":"b1","title":"Dune"}"#).unwrap();
        assert_eq!(book, Book::new("b1", "Dune"));
    }

    #[test]
    fn test_plain_description() {
        let book = Book::new("b1", "Dune").with_description("<p>A <b>desert</b> planet.</p>");
        assert_eq!(book.plain_description(), "A desert planet.");
    }

    #[test]
    fn test_strip_tags_keeps_lone_gt() {
        assert_eq!(strip_tags("5 > 3"), "5 > 3");
    }

    #[test]
    fn test_strip_tags_keeps_unclosed_lt() {
        let book = Book::new("b1", "Dune").with_description("Rated 3 < 5 by readers.");
        assert_eq!(book.plain_description(), "Rated 3 < 5 by readers.");
        assert_eq!(strip_tags("<b>x</b> 3 < 5"), "x 3 < 5");
        assert_eq!(strip_tags("a <<b> c"), "a  c");
    }

    #[test]
    fn test_diary_entry_shape() {
        let entry = DiaryEntry {
            id: "1700000000000".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            book_title: "Foo".to_string(),
            author: String::new(),
            thoughts: "Great".to_string(),
            rating: 4,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["bookTitle"], "Foo");
        assert_eq!(json["timestamp"], "2024-01-02T03:04:05Z");
        assert_eq!(json["rating"], 4);
    }

    #[test]
    fn test_diary_entry_reads_js_timestamps() {
        let entry: DiaryEntry = serde_json::from_str(
            r#"{"id":"1","timestamp":"2024-01-02T03:04:05.000Z","bookTitle":"Foo","author":"","thoughts":"ok","rating":0}"#,
        )
        .unwrap();
        assert_eq!(entry.timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(entry.rating(), None);
    }

    #[test]
    fn test_new_diary_entry_builder() {
        let entry = NewDiaryEntry::new("Foo", "Great")
            .with_author("Someone")
            .with_rating(3);
        assert_eq!(entry.book_title, "Foo");
        assert_eq!(entry.author, "Someone");
        assert_eq!(entry.rating, 3);
    }
}
