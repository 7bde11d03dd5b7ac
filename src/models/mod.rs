use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Fixed set of catalog categories. Serialized through the label shown on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Fiction,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
    #[serde(rename = "Mystery & Thriller")]
    MysteryThriller,
    #[serde(rename = "Science Fiction")]
    ScienceFiction,
    Fantasy,
    Romance,
    Biography,
    History,
    #[serde(rename = "Self-Help")]
    SelfHelp,
    Science,
    Philosophy,
    Poetry,
    Business,
    Children,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Fiction,
        Category::NonFiction,
        Category::MysteryThriller,
        Category::ScienceFiction,
        Category::Fantasy,
        Category::Romance,
        Category::Biography,
        Category::History,
        Category::SelfHelp,
        Category::Science,
        Category::Philosophy,
        Category::Poetry,
        Category::Business,
        Category::Children,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Fiction => "Fiction",
            Category::NonFiction => "Non-Fiction",
            Category::MysteryThriller => "Mystery & Thriller",
            Category::ScienceFiction => "Science Fiction",
            Category::Fantasy => "Fantasy",
            Category::Romance => "Romance",
            Category::Biography => "Biography",
            Category::History => "History",
            Category::SelfHelp => "Self-Help",
            Category::Science => "Science",
            Category::Philosophy => "Philosophy",
            Category::Poetry => "Poetry",
            Category::Business => "Business",
            Category::Children => "Children",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u32,
    pub title: String,
    pub author: String,
    pub category: Category,
    pub rating: f32,
    /// Negative years are BC.
    pub year: i32,
    pub pages: u32,
    pub format: BTreeSet<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub gradient: Vec<String>,
    #[serde(default)]
    pub badge: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl Serialize for CategoryFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CategoryFilter::All => serializer.serialize_str("all"),
            CategoryFilter::Only(category) => serializer.serialize_str(category.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    Popular,
    Newest,
    TitleAsc,
    TitleDesc,
    Rating,
}

impl SortMode {
    /// Unknown tokens fall back to the default ordering.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "newest" => SortMode::Newest,
            "title-asc" => SortMode::TitleAsc,
            "title-desc" => SortMode::TitleDesc,
            "rating" => SortMode::Rating,
            _ => SortMode::Popular,
        }
    }
}

/// The filter/sort/page selection driving the catalog view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    pub category: CategoryFilter,
    pub search_text: String,
    pub sort_mode: SortMode,
    pub min_rating: f32,
    pub formats: BTreeSet<String>,
    pub page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        QueryState {
            category: CategoryFilter::All,
            search_text: String::new(),
            sort_mode: SortMode::Popular,
            min_rating: 0.0,
            formats: BTreeSet::new(),
            page: 1,
        }
    }
}

/// Catalog URL parameters. Values are parsed leniently; bad input falls back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogParams {
    pub cat: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub min_rating: Option<String>,
    /// Comma separated, e.g. `eBook,Audio`.
    pub format: Option<String>,
    pub page: Option<String>,
}

/// One UI event against the catalog view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QueryEvent {
    Search { text: String },
    Category { value: String },
    Sort { value: String },
    MinRating { value: f32 },
    Formats { values: Vec<String> },
    Page { page: u32 },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub page_items: Vec<Book>,
    pub total_matched: usize,
    pub total_pages: u32,
    /// Effective page, after any reset.
    pub page: u32,
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: Category,
    pub count: usize,
    pub average_rating: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Heading,
    Subheading,
    Quote,
    ListItem,
    Separator,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub section_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub section_id: String,
    pub title: String,
    pub page_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPosition {
    pub book_id: u32,
    pub current_page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingTime {
    pub words: usize,
    pub minutes: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBlock {
    pub kind: BlockKind,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocItem {
    pub number: usize,
    pub section_id: String,
    pub title: String,
    pub page_number: u32,
    pub active: bool,
}

/// Everything the reader screen needs to draw the current page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderView {
    pub session_id: uuid::Uuid,
    pub book_id: u32,
    pub title: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub page_label: String,
    pub progress: u32,
    pub end_of_book: bool,
    pub blocks: Vec<RenderedBlock>,
    pub toc: Vec<TocItem>,
    pub reading_time: ReadingTime,
}
