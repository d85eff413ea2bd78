// Debounced input stage
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::UiConfig;

/// A value that only publishes after its input has been stable for `delay`.
///
/// Every new input restarts the timer; intermediate values are dropped.
/// Must be created inside a tokio runtime.
pub struct Debounced<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, mut input_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);

        let task = tokio::spawn(async move {
            while input_rx.changed().await.is_ok() {
                loop {
                    tokio::select! {
                        changed = input_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = tokio::time::sleep(delay) => break,
                    }
                }

                let settled = input_rx.borrow_and_update().clone();
                output_tx.send_if_modified(|current| {
                    if *current == settled {
                        return false;
                    }
                    *current = settled;
                    true
                });
            }
        });

        Self { input, output, task }
    }

    /// Debounce with the configured delay (`REGISTRY_DEBOUNCE_MS`)
    pub fn from_config(initial: T, ui: &UiConfig) -> Self {
        Self::new(initial, ui.debounce())
    }

    /// Record a new input; identical consecutive values do not restart the timer
    pub fn set(&self, value: T) {
        self.input.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Latest debounced value
    pub fn get(&self) -> T {
        self.output.borrow().clone()
    }

    /// Latest raw input, possibly not yet published
    pub fn pending(&self) -> T {
        self.input.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    async fn type_in(input: &Debounced<String>, text: &str) {
        input.set(text.to_string());
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn burst_publishes_once_with_final_value() {
        let input = Debounced::new(String::new(), Duration::from_millis(300));
        let mut rx = input.subscribe();

        for text in ["m", "mo", "mos"] {
            type_in(&input, text).await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        assert_eq!(input.get(), "");
        assert_eq!(input.pending(), "mos");
        assert!(!rx.has_changed().unwrap());

        let start = Instant::now();
        rx.changed().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(*rx.borrow_and_update(), "mos");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn configured_delay_is_used() {
        let input = Debounced::from_config(String::new(), &UiConfig { debounce_ms: 50 });
        let mut rx = input.subscribe();

        type_in(&input, "north").await;
        let start = Instant::now();
        rx.changed().await.unwrap();
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(50) && waited < Duration::from_millis(300));
        assert_eq!(input.get(), "north");
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_published_value_publishes_nothing() {
        let input = Debounced::new("a".to_string(), Duration::from_millis(300));
        let rx = input.subscribe();

        type_in(&input, "ab").await;
        tokio::time::advance(Duration::from_millis(100)).await;
        type_in(&input, "a").await;
        tokio::time::advance(Duration::from_secs(1)).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(input.get(), "a");
    }
}
