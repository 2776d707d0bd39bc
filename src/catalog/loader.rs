// Background catalog fetch
// One fetch on a worker thread, result handed back through a ring buffer

use std::thread::{self, JoinHandle};

use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer, Split};

use super::provider::{CatalogError, SequenceProvider};
use super::{CatalogState, Sequence};

type FetchResult = Result<Vec<Sequence>, CatalogError>;

pub struct CatalogLoader {
    result_rx: ringbuf::HeapCons<FetchResult>,
    worker: Option<JoinHandle<()>>,
}

impl CatalogLoader {
    /// Start fetching from `provider` on a worker thread
    pub fn spawn<P>(provider: P) -> Self
    where
        P: SequenceProvider + Send + 'static,
    {
        let (mut result_tx, result_rx) = HeapRb::<FetchResult>::new(1).split();

        let worker = thread::Builder::new()
            .name("catalog-fetch".to_string())
            .spawn(move || {
                let result = provider.fetch_all();
                let _ = result_tx.try_push(result);
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Could not start catalog fetch: {}", e);
                None
            }
        };

        Self { result_rx, worker }
    }

    /// Non-blocking check for the fetch result
    /// Returns the new catalog state once, then `None`.
    pub fn poll(&mut self) -> Option<CatalogState> {
        if let Some(result) = self.result_rx.try_pop() {
            if let Some(worker) = self.worker.take() {
                let _ = worker.join();
            }
            return Some(match result {
                Ok(sequences) => CatalogState::Ready(sequences),
                Err(e) => CatalogState::Failed(e.to_string()),
            });
        }

        // Worker gone without a result (spawn failure or panic)
        let finished = self.worker.as_ref().map(|w| w.is_finished()).unwrap_or(true);
        if finished && self.result_rx.is_empty() {
            if let Some(worker) = self.worker.take() {
                let _ = worker.join();
                return Some(CatalogState::Failed("catalog fetch aborted".to_string()));
            }
        }

        None
    }

    /// Block until the fetch is done (used by the CLI and tests)
    pub fn wait(mut self) -> CatalogState {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        match self.result_rx.try_pop() {
            Some(Ok(sequences)) => CatalogState::Ready(sequences),
            Some(Err(e)) => CatalogState::Failed(e.to_string()),
            None => CatalogState::Failed("catalog fetch aborted".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::provider::StaticProvider;

    struct Offline;

    impl SequenceProvider for Offline {
        fn fetch_all(&self) -> Result<Vec<Sequence>, CatalogError> {
            Err(CatalogError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "offline",
            )))
        }
    }

    #[test]
    fn test_loader_delivers_sequences() {
        let provider = StaticProvider::new(vec![Sequence::new("Oceans_D", "a", "wav")]);
        let state = CatalogLoader::spawn(provider).wait();
        assert_eq!(state.sequences().len(), 1);
    }

    #[test]
    fn test_loader_reports_failure_as_empty_state() {
        let state = CatalogLoader::spawn(Offline).wait();
        assert!(state.sequences().is_empty());
        assert!(state.error().unwrap().contains("offline"));
    }

    #[test]
    fn test_poll_returns_result_once() {
        let mut loader = CatalogLoader::spawn(StaticProvider::default());

        let mut state = None;
        for _ in 0..1000 {
            if let Some(s) = loader.poll() {
                state = Some(s);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        assert!(matches!(state, Some(CatalogState::Ready(ref v)) if v.is_empty()));
        assert!(loader.poll().is_none());
    }
}
