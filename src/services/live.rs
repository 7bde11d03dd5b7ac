use crate::models::{CatalogPage, QueryEvent, QueryState};
use crate::services::catalog::BookStore;
use crate::services::debounce::{SEARCH_DEBOUNCE, debounce};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drives one live catalog view: answers every event with a fresh page.
///
/// Filter, sort and page events re-query at once; search text waits for typing to settle.
/// The first page is sent before any event arrives. Returns when either side hangs up.
pub async fn live_query(
    books: Arc<BookStore>,
    mut events: mpsc::UnboundedReceiver<QueryEvent>,
    pages: mpsc::UnboundedSender<CatalogPage>,
) {
    let mut query = QueryState::default();
    let (search, mut settled) = debounce::<String>(SEARCH_DEBOUNCE);

    if pages.send(query.apply(&books)).is_err() {
        return;
    }

    loop {
        let page = tokio::select! {
            event = events.recv() => match event {
                Some(QueryEvent::Search { text }) => {
                    search.push(text);
                    continue;
                }
                Some(event) => {
                    query.apply_event(event);
                    query.apply(&books)
                }
                None => break,
            },
            Some(text) = settled.recv() => {
                query.apply_event(QueryEvent::Search { text });
                query.apply(&books)
            }
        };
        if pages.send(page).is_err() {
            break;
        }
    }
    tracing::debug!("Live catalog query finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::services::catalog::tests::book;
    use std::time::Duration;
    use tokio::time::Instant;

    fn store() -> Arc<BookStore> {
        let mut books: Vec<_> = (1..=20)
            .map(|id| book(id, &format!("Volume {id:02}"), Category::History, 3.5, 1900 + id as i32))
            .collect();
        books.push(book(21, "Dune", Category::ScienceFiction, 4.5, 1965));
        Arc::new(BookStore::new(books).unwrap())
    }

    fn start() -> (
        mpsc::UnboundedSender<QueryEvent>,
        mpsc::UnboundedReceiver<CatalogPage>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (pages_tx, pages_rx) = mpsc::unbounded_channel();
        tokio::spawn(live_query(store(), events_rx, pages_tx));
        (events_tx, pages_rx)
    }

    #[tokio::test(start_paused = true)]
    async fn typing_burst_yields_one_page() {
        let (events, mut pages) = start();
        assert_eq!(pages.recv().await.unwrap().total_matched, 21);

        for text in ["d", "du", "dun", "dune"] {
            events
                .send(QueryEvent::Search {
                    text: text.to_string(),
                })
                .unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let started = Instant::now();
        let page = pages.recv().await.unwrap();
        assert_eq!(page.total_matched, 1);
        assert_eq!(page.page_items[0].title, "Dune");
        assert!(started.elapsed() >= Duration::from_millis(200));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(pages.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn sort_and_page_events_answer_immediately() {
        let (events, mut pages) = start();
        pages.recv().await.unwrap();

        let started = Instant::now();
        events
            .send(QueryEvent::Sort {
                value: "newest".to_string(),
            })
            .unwrap();
        let page = pages.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(page.page_items[0].id, 21);

        events.send(QueryEvent::Page { page: 2 }).unwrap();
        let page = pages.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_items.len(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_the_event_side_ends_the_query() {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (pages_tx, mut pages_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(live_query(store(), events_rx, pages_tx));
        pages_rx.recv().await.unwrap();
        drop(events_tx);
        task.await.unwrap();
        assert!(pages_rx.recv().await.is_none());
    }
}
