use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Holds back a rapidly changing value until it has stopped changing for
/// `delay`.
///
/// Every [`push`](Debouncer::push) restarts the timer, so only the value
/// that survives a full quiet period comes out of
/// [`recv`](Debouncer::recv). The background timer task is aborted when the
/// debouncer is dropped and nothing fires after that point.
pub struct Debouncer<T> {
    input: watch::Sender<Option<T>>,
    output: mpsc::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn new(delay: Duration) -> Self {
        let (input, input_rx) = watch::channel(None);
        let (output_tx, output) = mpsc::channel(16);
        let task = tokio::spawn(run(delay, input_rx, output_tx));
        log::trace!("debounce: started with {:?} delay", delay);
        Self {
            input,
            output,
            task,
        }
    }

    pub fn push(&self, value: T) {
        self.input.send_replace(Some(value));
    }

    /// Drop whatever value is waiting for the timer.
    pub fn cancel(&self) {
        self.input.send_replace(None);
    }

    /// Wait for the next settled value.
    pub async fn recv(&mut self) -> Option<T> {
        self.output.recv().await
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T: Clone>(
    delay: Duration,
    mut input: watch::Receiver<Option<T>>,
    output: mpsc::Sender<T>,
) {
    loop {
        if input.changed().await.is_err() {
            return;
        }
        loop {
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(delay) => break,
            }
        }
        let settled = input.borrow_and_update().clone();
        if let Some(value) = settled {
            if output.send(value).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    const DELAY: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn only_the_last_value_of_a_burst_comes_out() {
        let mut debouncer = Debouncer::new(DELAY);
        for value in ["a", "ab", "abc", "abcd"] {
            debouncer.push(value);
            sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(debouncer.recv().await, Some("abcd"));
        assert!(timeout(Duration::from_secs(5), debouncer.recv())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn every_push_restarts_the_timer() {
        let mut debouncer = Debouncer::new(DELAY);
        let started = tokio::time::Instant::now();
        debouncer.push(1);
        sleep(Duration::from_millis(250)).await;
        debouncer.push(2);

        assert_eq!(debouncer.recv().await, Some(2));
        assert!(started.elapsed() >= Duration::from_millis(550));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_values_never_fire() {
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push("abc");
        sleep(Duration::from_millis(100)).await;
        debouncer.cancel();

        assert!(timeout(Duration::from_secs(5), debouncer.recv())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_working_after_a_value_settles() {
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push("first");
        assert_eq!(debouncer.recv().await, Some("first"));
        debouncer.push("second");
        assert_eq!(debouncer.recv().await, Some("second"));
    }
}
