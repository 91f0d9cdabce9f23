use serde::{Deserialize, Serialize};

/// Server-assigned book identifier.
pub type BookId = u64;

/// A stored book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    #[serde(flatten)]
    pub info: BookInfo,
}

/// Everything about a book except its id. Sent as-is on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInfo {
    pub title: String,
    pub author: String,
    pub author_id: u64,
    pub category_id: u64,
    pub price: f64,
    pub original_price: f64,
    pub isbn: String,
    pub publisher: String,
    pub publish_date: String,
    pub pages: u32,
    pub language: String,
    pub description: String,
    pub cover_image: String,
    pub stock: u32,
    pub rating: f64,
    pub reviews: u32,
    pub is_recommended: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A partial update. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recommended: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl BookPatch {
    #[must_use]
    pub fn stock(stock: u32) -> Self {
        Self {
            stock: Some(stock),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn recommended(is_recommended: bool) -> Self {
        Self {
            is_recommended: Some(is_recommended),
            ..Self::default()
        }
    }

    /// Whether the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A patch that sets every field. `PUT` replaces the whole record on
/// servers such as json-server, so edits start from the full record.
impl From<BookInfo> for BookPatch {
    fn from(info: BookInfo) -> Self {
        Self {
            title: Some(info.title),
            author: Some(info.author),
            author_id: Some(info.author_id),
            category_id: Some(info.category_id),
            price: Some(info.price),
            original_price: Some(info.original_price),
            isbn: Some(info.isbn),
            publisher: Some(info.publisher),
            publish_date: Some(info.publish_date),
            pages: Some(info.pages),
            language: Some(info.language),
            description: Some(info.description),
            cover_image: Some(info.cover_image),
            stock: Some(info.stock),
            rating: Some(info.rating),
            reviews: Some(info.reviews),
            is_recommended: Some(info.is_recommended),
            tags: Some(info.tags),
        }
    }
}
