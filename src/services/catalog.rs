use crate::models::{
    Book, CatalogPage, CatalogParams, Category, CategoryFilter, CategorySummary, QueryEvent,
    QueryState, SortMode,
};
use crate::utils::text::parse_page;
use anyhow::{Context, Result, bail};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

pub const PAGE_SIZE: usize = 12;

/// Canonical alias table. URL slugs, sidebar labels and short names all resolve here.
const CATEGORY_ALIASES: &[(&str, Category)] = &[
    ("fiction", Category::Fiction),
    ("non-fiction", Category::NonFiction),
    ("nonfiction", Category::NonFiction),
    ("mystery", Category::MysteryThriller),
    ("thriller", Category::MysteryThriller),
    ("mystery & thriller", Category::MysteryThriller),
    ("mystery-thriller", Category::MysteryThriller),
    ("science fiction", Category::ScienceFiction),
    ("science-fiction", Category::ScienceFiction),
    ("sci-fi", Category::ScienceFiction),
    ("scifi", Category::ScienceFiction),
    ("fantasy", Category::Fantasy),
    ("romance", Category::Romance),
    ("biography", Category::Biography),
    ("history", Category::History),
    ("self-help", Category::SelfHelp),
    ("self help", Category::SelfHelp),
    ("selfhelp", Category::SelfHelp),
    ("science", Category::Science),
    ("philosophy", Category::Philosophy),
    ("poetry", Category::Poetry),
    ("business", Category::Business),
    ("children", Category::Children),
    ("kids", Category::Children),
];

pub fn resolve_category(raw: &str) -> Option<Category> {
    let key = raw.trim().to_lowercase();
    CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, category)| *category)
}

impl CategoryFilter {
    /// "all", empty and unknown values select everything.
    pub fn from_param(raw: &str) -> Self {
        match resolve_category(raw) {
            Some(category) => CategoryFilter::Only(category),
            None => CategoryFilter::All,
        }
    }

    fn matches(self, book: &Book) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => book.category == category,
        }
    }
}

impl QueryState {
    /// Initial state from the catalog URL (`cat`, `q`).
    pub fn from_url(cat: Option<&str>, q: Option<&str>) -> Self {
        QueryState {
            category: cat.map(CategoryFilter::from_param).unwrap_or_default(),
            search_text: q.unwrap_or_default().to_string(),
            ..QueryState::default()
        }
    }

    /// Full state from the catalog URL. Unparsable values keep their defaults.
    pub fn from_params(params: &CatalogParams) -> Self {
        let mut state = Self::from_url(params.cat.as_deref(), params.q.as_deref());
        if let Some(sort) = &params.sort {
            state.sort_mode = SortMode::from_token(sort);
        }
        if let Some(rating) = params.min_rating.as_deref().and_then(|r| r.trim().parse().ok()) {
            state.set_min_rating(rating);
        }
        if let Some(formats) = &params.format {
            state.formats = formats
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(page) = params.page.as_deref().and_then(parse_page) {
            state.set_page(page);
        }
        state
    }

    /// Applies a UI event. Any filter change sends the view back to page 1.
    pub fn apply_event(&mut self, event: QueryEvent) {
        match event {
            QueryEvent::Search { text } => self.search_text = text,
            QueryEvent::Category { value } => self.category = CategoryFilter::from_param(&value),
            QueryEvent::Sort { value } => self.sort_mode = SortMode::from_token(&value),
            QueryEvent::MinRating { value } => self.set_min_rating(value),
            QueryEvent::Formats { values } => self.formats = values.into_iter().collect(),
            QueryEvent::Page { page } => {
                self.set_page(page);
                return;
            }
        }
        self.page = 1;
    }

    pub fn set_min_rating(&mut self, value: f32) {
        self.min_rating = clamp_rating(value);
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Runs the query and writes the effective page back.
    pub fn apply(&mut self, store: &BookStore) -> CatalogPage {
        let result = query(store, self);
        self.page = result.page;
        result
    }
}

fn clamp_rating(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 5.0)
    }
}

/// Read-only, ordered table of books. Insertion order is catalog order.
#[derive(Debug, Default)]
pub struct BookStore {
    books: Vec<Book>,
}

impl BookStore {
    pub fn new(books: Vec<Book>) -> Result<Self> {
        let mut seen = HashSet::new();
        for book in &books {
            if book.id == 0 {
                bail!("book \"{}\" has id 0", book.title);
            }
            if !seen.insert(book.id) {
                bail!("duplicate book id {}", book.id);
            }
            if !(0.0..=5.0).contains(&book.rating) {
                bail!("book {} has rating {} outside 0-5", book.id, book.rating);
            }
            if book.pages == 0 {
                bail!("book {} has no pages", book.id);
            }
        }
        Ok(BookStore { books })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let books: Vec<Book> = serde_json::from_str(json).context("parsing book catalog")?;
        Self::new(books)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading book catalog {}", path.display()))?;
        let store = Self::from_json(&json)?;
        tracing::info!("Loaded {} books from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn get(&self, id: u32) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

fn matches_search(book: &Book, needle: &str) -> bool {
    [&book.title, &book.author, &book.isbn, &book.publisher]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn matches_formats(book: &Book, formats: &std::collections::BTreeSet<String>) -> bool {
    formats.is_empty() || book.format.iter().any(|f| formats.contains(f))
}

fn compare_titles(a: &Book, b: &Book) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}

fn sort_books(books: &mut [&Book], mode: SortMode) {
    // slice::sort_by is stable, ties keep their filtered order.
    match mode {
        SortMode::Popular | SortMode::Rating => books.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortMode::Newest => books.sort_by(|a, b| b.year.cmp(&a.year)),
        SortMode::TitleAsc => books.sort_by(|a, b| compare_titles(a, b)),
        SortMode::TitleDesc => books.sort_by(|a, b| compare_titles(b, a)),
    }
}

/// Filter, search, sort and paginate the store for one query state.
pub fn query(store: &BookStore, state: &QueryState) -> CatalogPage {
    let needle = state.search_text.trim().to_lowercase();
    let min_rating = clamp_rating(state.min_rating);

    let mut matched: Vec<&Book> = store
        .books()
        .iter()
        .filter(|book| state.category.matches(book))
        .filter(|book| needle.is_empty() || matches_search(book, &needle))
        .filter(|book| min_rating <= 0.0 || book.rating >= min_rating)
        .filter(|book| matches_formats(book, &state.formats))
        .collect();

    sort_books(&mut matched, state.sort_mode);

    let total_matched = matched.len();
    let total_pages = total_matched.div_ceil(PAGE_SIZE).max(1) as u32;
    let page = if state.page == 0 || state.page > total_pages {
        1
    } else {
        state.page
    };

    let start = (page as usize - 1) * PAGE_SIZE;
    let page_items = matched
        .into_iter()
        .skip(start)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    tracing::debug!(
        "catalog query {:?} matched {} books, page {}/{}",
        state.category,
        total_matched,
        page,
        total_pages
    );

    CatalogPage {
        page_items,
        total_matched,
        total_pages,
        page,
        page_size: PAGE_SIZE,
    }
}

pub fn category_counts(store: &BookStore) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for book in store.books() {
        *counts.entry(book.category).or_insert(0) += 1;
    }
    counts
}

pub fn category_average_ratings(store: &BookStore) -> BTreeMap<Category, f32> {
    let mut sums: BTreeMap<Category, (f32, usize)> = BTreeMap::new();
    for book in store.books() {
        let entry = sums.entry(book.category).or_insert((0.0, 0));
        entry.0 += book.rating;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(category, (sum, n))| (category, sum / n as f32))
        .collect()
}

/// One row per category in the fixed category order, including empty ones.
pub fn category_summaries(store: &BookStore) -> Vec<CategorySummary> {
    let counts = category_counts(store);
    let averages = category_average_ratings(store);
    Category::ALL
        .iter()
        .map(|category| CategorySummary {
            category: *category,
            count: counts.get(category).copied().unwrap_or(0),
            average_rating: averages.get(category).copied(),
        })
        .collect()
}
