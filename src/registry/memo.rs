use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use crate::core::Result;

/// Compute-once cache keyed by string.
///
/// Each key owns a `OnceLock` cell: the first caller computes the value
/// while concurrent callers for the same key block on the cell, then
/// everybody reads the published result. Failures are cached as well.
pub(crate) struct Memo<T> {
    cells: RwLock<HashMap<String, Arc<OnceLock<Result<T>>>>>,
}

impl<T: Clone> Memo<T> {
    pub(crate) fn new() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get_or_compute<F>(&self, key: &str, compute: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let cell = self.cell(key)?;
        cell.get_or_init(compute).clone()
    }

    /// The published result for `key`, without computing it.
    pub(crate) fn peek(&self, key: &str) -> Option<Result<T>> {
        let cells = self.cells.read().ok()?;
        cells.get(key)?.get().cloned()
    }

    /// Number of keys with a published result.
    pub(crate) fn len(&self) -> usize {
        self.cells
            .read()
            .map(|cells| cells.values().filter(|c| c.get().is_some()).count())
            .unwrap_or(0)
    }

    fn cell(&self, key: &str) -> Result<Arc<OnceLock<Result<T>>>> {
        if let Some(cell) = self.cells.read()?.get(key) {
            return Ok(Arc::clone(cell));
        }
        let mut cells = self.cells.write()?;
        Ok(Arc::clone(cells.entry(key.to_string()).or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ModelError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_computes_once_per_key() {
        let memo: Memo<usize> = Memo::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = memo
                .get_or_compute("a", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_failures_are_cached() {
        let memo: Memo<usize> = Memo::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let err = memo
                .get_or_compute("bad", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ModelError::UnknownModel("bad".into()))
                })
                .unwrap_err();
            assert!(matches!(err, ModelError::UnknownModel(_)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(memo.peek("bad").is_some());
        assert!(memo.peek("other").is_none());
    }

    #[test]
    fn test_concurrent_first_access_computes_once() {
        let memo: Arc<Memo<usize>> = Arc::new(Memo::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = Arc::clone(&memo);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    memo.get_or_compute("shared", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(10));
                        Ok(42)
                    })
                    .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
