use std::time::Duration;
use tokio::sync::mpsc;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Input side of a debounced channel.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Debouncer<T> {
    /// Queues a value. Returns false once the output side is gone.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Coalesces bursts: a value is forwarded only after `delay` passes with no newer value.
/// Dropping every `Debouncer` flushes whatever is still pending.
pub fn debounce<T: Send + 'static>(delay: Duration) -> (Debouncer<T>, mpsc::UnboundedReceiver<T>) {
    let (tx, mut input) = mpsc::unbounded_channel::<T>();
    let (output, rx) = mpsc::unbounded_channel::<T>();

    tokio::spawn(async move {
        while let Some(mut pending) = input.recv().await {
            loop {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(value) => pending = value,
                        None => {
                            let _ = output.send(pending);
                            return;
                        }
                    },
                    _ = tokio::time::sleep(delay) => {
                        if output.send(pending).is_err() {
                            return;
                        }
                        break;
                    }
                }
            }
        }
    });

    (Debouncer { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, advance};

    #[tokio::test(start_paused = true)]
    async fn keystrokes_within_the_window_collapse() {
        let (input, mut settled) = debounce::<String>(SEARCH_DEBOUNCE);
        let start = Instant::now();
        for text in ["d", "du", "dun", "dune"] {
            input.push(text.to_string());
            advance(Duration::from_millis(100)).await;
        }
        assert_eq!(settled.recv().await.as_deref(), Some("dune"));
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn separated_values_all_arrive() {
        let (input, mut settled) = debounce::<u32>(SEARCH_DEBOUNCE);
        input.push(1);
        assert_eq!(settled.recv().await, Some(1));
        input.push(2);
        assert_eq!(settled.recv().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn closing_flushes_pending_value() {
        let (input, mut settled) = debounce::<u32>(Duration::from_secs(60));
        input.push(7);
        input.push(8);
        drop(input);
        assert_eq!(settled.recv().await, Some(8));
        assert_eq!(settled.recv().await, None);
    }
}
