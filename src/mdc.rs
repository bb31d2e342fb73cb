//! The diagnostic context: a per-request key/value store read by logging code.
//!
//! # Where entries live
//!
//! Async code has no stable "current thread" (a task can resume on any
//! worker), so entries are kept in a **task-local** map whenever the caller
//! runs inside [`scope`]. The server opens one scope per request, which gives
//! every request its own map and makes concurrent requests invisible to each
//! other.
//!
//! Outside a scope the store falls back to a **thread-local** map, the classic
//! per-thread MDC for synchronous callers. Async code never lands there:
//! [`ContextInjector::handle`] opens a scope of its own when none is active,
//! so a request whose task hops threads cannot leave entries behind on the
//! thread that first polled it. Code that writes to [`Mdc`] directly from
//! async code should do the same.
//!
//! [`ContextInjector::handle`]: crate::middleware::ContextInjector::handle
//!
//! ```text
//! Mdc.put("req_method", "GET")
//!        ↓
//! inside mdc::scope?  ── yes ──▶ task-local map (one per request)
//!        │ no
//!        ↓
//! thread-local map
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;

type Entries = HashMap<String, String>;

tokio::task_local! {
    static TASK_ENTRIES: RefCell<Entries>;
}

thread_local! {
    static THREAD_ENTRIES: RefCell<Entries> = RefCell::new(HashMap::new());
}

/// A string key/value store scoped to the current unit of work.
///
/// Implementations must make every method infallible: `remove` of a key that
/// was never written is a no-op, and nothing here may panic during cleanup.
pub trait DiagnosticContext {
    fn put(&self, key: &str, value: &str);

    fn remove(&self, key: &str);

    fn get(&self, key: &str) -> Option<String>;

    /// Whether writes made right now are private to the current async task.
    ///
    /// When `false`, async callers wrap their work in [`scope`] first.
    fn is_task_scoped(&self) -> bool {
        true
    }
}

/// Handle to the process-wide diagnostic context.
///
/// Zero-sized: every copy refers to the same task-local / thread-local
/// storage described in the [module docs](self).
#[derive(Clone, Copy, Debug, Default)]
pub struct Mdc;

impl Mdc {
    /// All entries visible to the caller, sorted by key.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = with_entries(|entries| {
            entries.iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();
        entries.sort();
        entries
    }
}

impl DiagnosticContext for Mdc {
    fn put(&self, key: &str, value: &str) {
        with_entries(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        });
    }

    fn remove(&self, key: &str) {
        with_entries(|entries| {
            entries.remove(key);
        });
    }

    fn get(&self, key: &str) -> Option<String> {
        with_entries(|entries| entries.get(key).cloned()).flatten()
    }

    fn is_task_scoped(&self) -> bool {
        TASK_ENTRIES.try_with(|_| ()).is_ok()
    }
}

/// Runs `future` with its own task-local diagnostic context.
///
/// The new map starts as a copy of the enclosing scope's entries (empty at
/// top level). Writes made inside never escape; the map is dropped when
/// `future` completes or is dropped.
pub async fn scope<F: Future>(future: F) -> F::Output {
    let inherited = TASK_ENTRIES
        .try_with(|cell| cell.borrow().clone())
        .unwrap_or_default();
    TASK_ENTRIES.scope(RefCell::new(inherited), future).await
}

/// Applies `f` to the innermost map: the task scope if one is active,
/// otherwise this thread's map. `None` only while the thread is shutting down.
fn with_entries<R>(mut f: impl FnMut(&mut Entries) -> R) -> Option<R> {
    if let Ok(r) = TASK_ENTRIES.try_with(|cell| f(&mut *cell.borrow_mut())) {
        return Some(r);
    }
    THREAD_ENTRIES.try_with(|cell| f(&mut *cell.borrow_mut())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove_on_the_thread_map() {
        Mdc.put("mdc_test_key", "value");
        assert_eq!(Mdc.get("mdc_test_key").as_deref(), Some("value"));

        Mdc.remove("mdc_test_key");
        assert_eq!(Mdc.get("mdc_test_key"), None);

        // Removing again is a no-op.
        Mdc.remove("mdc_test_key");
        assert_eq!(Mdc.get("mdc_test_key"), None);
    }

    #[tokio::test]
    async fn scope_entries_disappear_when_the_scope_ends() {
        scope(async {
            Mdc.put("scoped", "1");
            tokio::task::yield_now().await;
            assert_eq!(Mdc.get("scoped").as_deref(), Some("1"));
        })
        .await;

        assert_eq!(Mdc.get("scoped"), None);
    }

    #[tokio::test]
    async fn nested_scope_inherits_but_does_not_leak() {
        scope(async {
            Mdc.put("outer", "a");

            scope(async {
                assert_eq!(Mdc.get("outer").as_deref(), Some("a"));
                Mdc.put("inner", "b");
                Mdc.remove("outer");
            })
            .await;

            assert_eq!(Mdc.get("outer").as_deref(), Some("a"));
            assert_eq!(Mdc.get("inner"), None);
        })
        .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_scopes_are_isolated() {
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                tokio::spawn(scope(async move {
                    let value = i.to_string();
                    Mdc.put("req_id", &value);
                    for _ in 0..10 {
                        tokio::task::yield_now().await;
                        assert_eq!(Mdc.get("req_id").as_deref(), Some(value.as_str()));
                    }
                    Mdc.snapshot()
                }))
            })
            .collect();

        for (i, task) in tasks.into_iter().enumerate() {
            let snapshot = task.await.unwrap();
            assert_eq!(snapshot, vec![("req_id".to_owned(), i.to_string())]);
        }
    }

    #[tokio::test]
    async fn task_scoped_only_inside_a_scope() {
        assert!(!Mdc.is_task_scoped());
        assert!(scope(async { Mdc.is_task_scoped() }).await);
    }

    #[tokio::test]
    async fn snapshot_is_sorted_by_key() {
        scope(async {
            Mdc.put("b", "2");
            Mdc.put("a", "1");
            assert_eq!(
                Mdc.snapshot(),
                vec![("a".to_owned(), "1".to_owned()), ("b".to_owned(), "2".to_owned())],
            );
        })
        .await;
    }
}
