use crate::error::ReaderError;
use crate::models::{ReaderView, ReadingPosition, RenderedBlock, TocItem};
use crate::services::catalog::BookStore;
use crate::services::content::ContentSource;
use crate::services::paginator::Pagination;
use crate::services::session::{PositionStore, ReadingSession};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Sessions untouched for this long are dropped the next time a book is opened.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Prev,
    Page(u32),
}

struct SessionEntry {
    session: ReadingSession,
    last_used: Instant,
}

/// Opens books for reading and keeps their sessions.
pub struct ReaderService {
    books: Arc<BookStore>,
    source: ContentSource,
    positions: Arc<dyn PositionStore>,
    pagination_cache: Mutex<HashMap<u32, Arc<Pagination>>>,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
    session_ttl: Duration,
}

/// Reader URLs carry the book as `?id=`; anything but a positive integer selects nothing.
pub fn parse_book_id(raw: Option<&str>) -> Result<u32, ReaderError> {
    raw.and_then(|id| id.trim().parse::<u32>().ok())
        .filter(|id| *id > 0)
        .ok_or(ReaderError::NoBookSelected)
}

impl ReaderService {
    pub fn new(
        books: Arc<BookStore>,
        source: ContentSource,
        positions: Arc<dyn PositionStore>,
    ) -> Self {
        ReaderService {
            books,
            source,
            positions,
            pagination_cache: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            session_ttl: SESSION_IDLE_TTL,
        }
    }

    async fn pagination(&self, book_id: u32) -> Result<Arc<Pagination>, ReaderError> {
        let cached = self.lock_cache()?.get(&book_id).cloned();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let text = self.source.fetch(book_id).await?;
        let pagination = Arc::new(Pagination::from_text(&text));
        tracing::info!(
            "Classified book {} into {} blocks, {} pages ({} sections)",
            book_id,
            pagination.block_count(),
            pagination.total_pages(),
            pagination.toc().len()
        );

        Ok(self
            .lock_cache()?
            .entry(book_id)
            .or_insert(pagination)
            .clone())
    }

    pub async fn open(&self, raw_id: Option<&str>) -> Result<ReaderView, ReaderError> {
        let book_id = parse_book_id(raw_id)?;
        let pagination = self.pagination(book_id).await?;
        let session = ReadingSession::open(book_id, pagination, self.positions.get(book_id));
        let session_id = Uuid::new_v4();
        let view = self.view(session_id, &session);

        let now = Instant::now();
        let mut sessions = self.lock_sessions()?;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_used) < self.session_ttl);
        if sessions.len() < before {
            tracing::debug!("Evicted {} idle reading sessions", before - sessions.len());
        }
        sessions.insert(
            session_id,
            SessionEntry {
                session,
                last_used: now,
            },
        );
        drop(sessions);

        tracing::info!("Opened reading session {} for book {}", session_id, book_id);
        Ok(view)
    }

    pub fn current(&self, session_id: Uuid) -> Result<ReaderView, ReaderError> {
        let mut sessions = self.lock_sessions()?;
        let entry = sessions
            .get_mut(&session_id)
            .ok_or(ReaderError::SessionNotFound)?;
        entry.last_used = Instant::now();
        Ok(self.view(session_id, &entry.session))
    }

    /// Turns the page, then saves the new position once the session table is released.
    pub async fn navigate(
        &self,
        session_id: Uuid,
        nav: Navigation,
    ) -> Result<ReaderView, ReaderError> {
        let (view, moved_to) = {
            let mut sessions = self.lock_sessions()?;
            let entry = sessions
                .get_mut(&session_id)
                .ok_or(ReaderError::SessionNotFound)?;
            entry.last_used = Instant::now();
            let session = &mut entry.session;
            let moved = match nav {
                Navigation::Next => session.next(),
                Navigation::Prev => session.prev(),
                Navigation::Page(page) => session.go_to_page(page),
            };
            tracing::debug!(
                "Session {} {:?} -> page {} (moved: {})",
                session_id,
                nav,
                session.current_page(),
                moved
            );
            let view = self.view(session_id, session);
            (view, moved.then(|| session.position()))
        };

        if let Some(position) = moved_to {
            self.save_position(position).await;
        }
        Ok(view)
    }

    /// Failures are logged, not returned.
    async fn save_position(&self, position: ReadingPosition) {
        let positions = self.positions.clone();
        let ReadingPosition {
            book_id,
            current_page,
        } = position;
        match tokio::task::spawn_blocking(move || positions.set(book_id, current_page)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Failed to save reading position for book {}: {:#}", book_id, e)
            }
            Err(e) => tracing::warn!("Position save task for book {} failed: {}", book_id, e),
        }
    }

    pub fn close(&self, session_id: Uuid) -> Result<(), ReaderError> {
        let entry = self
            .lock_sessions()?
            .remove(&session_id)
            .ok_or(ReaderError::SessionNotFound)?;
        tracing::info!(
            "Closed reading session {} at {:?}",
            session_id,
            entry.session.position()
        );
        Ok(())
    }

    fn view(&self, session_id: Uuid, session: &ReadingSession) -> ReaderView {
        let pagination = session.pagination();
        let active_id = session.active_entry().map(|entry| entry.section_id.as_str());
        let title = self
            .books
            .get(session.book_id())
            .map(|book| book.title.clone())
            .unwrap_or_else(|| format!("Book #{}", session.book_id()));

        ReaderView {
            session_id,
            book_id: session.book_id(),
            title,
            current_page: session.current_page(),
            total_pages: session.total_pages(),
            page_label: format!("Page {} / {}", session.current_page(), session.total_pages()),
            progress: session.progress(),
            end_of_book: session.is_at_end(),
            blocks: pagination
                .page(session.current_page())
                .iter()
                .map(|block| RenderedBlock {
                    kind: block.kind,
                    html: block.to_html(),
                })
                .collect(),
            toc: pagination
                .toc()
                .iter()
                .enumerate()
                .map(|(i, entry)| TocItem {
                    number: i + 1,
                    section_id: entry.section_id.clone(),
                    title: entry.title.clone(),
                    page_number: entry.page_number,
                    active: Some(entry.section_id.as_str()) == active_id,
                })
                .collect(),
            reading_time: pagination.reading_time(),
        }
    }

    fn lock_cache(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<u32, Arc<Pagination>>>, ReaderError> {
        self.pagination_cache
            .lock()
            .map_err(|_| ReaderError::LoadFailed("pagination cache poisoned".into()))
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SessionEntry>>, ReaderError> {
        self.sessions
            .lock()
            .map_err(|_| ReaderError::LoadFailed("session table poisoned".into()))
    }
}
