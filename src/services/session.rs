use crate::models::{ReadingPosition, TocEntry};
use crate::services::paginator::Pagination;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Where reading positions are remembered between sessions.
///
/// `set` may block on I/O; async callers run it through `spawn_blocking`.
pub trait PositionStore: Send + Sync {
    fn get(&self, book_id: u32) -> Option<u32>;
    fn set(&self, book_id: u32, page: u32) -> Result<()>;
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryPositionStore {
    pages: Mutex<HashMap<u32, u32>>,
}

#[cfg(test)]
impl PositionStore for MemoryPositionStore {
    fn get(&self, book_id: u32) -> Option<u32> {
        self.pages.lock().ok()?.get(&book_id).copied()
    }

    fn set(&self, book_id: u32, page: u32) -> Result<()> {
        self.pages
            .lock()
            .map_err(|_| anyhow::anyhow!("position store lock poisoned"))?
            .insert(book_id, page);
        Ok(())
    }
}

/// Positions kept in a JSON file, rewritten on every change.
#[derive(Debug)]
pub struct JsonPositionStore {
    path: PathBuf,
    pages: Mutex<HashMap<u32, u32>>,
}

impl JsonPositionStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let pages = match std::fs::read_to_string(&path) {
            Ok(json) => {
                let positions: Vec<ReadingPosition> = serde_json::from_str(&json)
                    .with_context(|| format!("parsing positions file {}", path.display()))?;
                positions
                    .into_iter()
                    .map(|p| (p.book_id, p.current_page))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading positions file {}", path.display()));
            }
        };
        Ok(JsonPositionStore {
            path,
            pages: Mutex::new(pages),
        })
    }

    fn write(&self, pages: &HashMap<u32, u32>) -> Result<()> {
        let mut positions: Vec<ReadingPosition> = pages
            .iter()
            .map(|(book_id, page)| ReadingPosition {
                book_id: *book_id,
                current_page: *page,
            })
            .collect();
        positions.sort_by_key(|p| p.book_id);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&positions)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing positions file {}", self.path.display()))
    }
}

impl PositionStore for JsonPositionStore {
    fn get(&self, book_id: u32) -> Option<u32> {
        self.pages.lock().ok()?.get(&book_id).copied()
    }

    fn set(&self, book_id: u32, page: u32) -> Result<()> {
        let mut pages = self
            .pages
            .lock()
            .map_err(|_| anyhow::anyhow!("position store lock poisoned"))?;
        pages.insert(book_id, page);
        self.write(&pages)
    }
}

/// Page-by-page navigation through one paginated book.
///
/// The session only tracks the page; saving it after a move is up to the owner.
#[derive(Debug)]
pub struct ReadingSession {
    book_id: u32,
    pagination: Arc<Pagination>,
    current_page: u32,
}

impl ReadingSession {
    /// Starts on page 1, or on the saved page when it is still in range.
    pub fn open(book_id: u32, pagination: Arc<Pagination>, saved_page: Option<u32>) -> Self {
        let total_pages = pagination.total_pages();
        let current_page = saved_page
            .filter(|page| (1..=total_pages).contains(page))
            .unwrap_or(1);
        if current_page > 1 {
            tracing::info!("Restored book {} at page {}/{}", book_id, current_page, total_pages);
        }
        ReadingSession {
            book_id,
            pagination,
            current_page,
        }
    }

    /// Moves to `page`. Out-of-range pages are ignored; returns whether the page was accepted.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page < 1 || page > self.total_pages() {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        match self.current_page.checked_add(1) {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    pub fn prev(&mut self) -> bool {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    pub fn book_id(&self) -> u32 {
        self.book_id
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.pagination.total_pages()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn position(&self) -> ReadingPosition {
        ReadingPosition {
            book_id: self.book_id,
            current_page: self.current_page,
        }
    }

    pub fn progress(&self) -> u32 {
        (100.0 * self.current_page as f64 / self.total_pages() as f64).round() as u32
    }

    pub fn active_entry(&self) -> Option<&TocEntry> {
        self.pagination.active_entry(self.current_page)
    }

    pub fn is_at_end(&self) -> bool {
        self.current_page == self.total_pages()
    }
}
