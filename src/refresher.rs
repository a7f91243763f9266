// 🔄 Refresher - Keeps the mapping cache up to date
// Fetch → swap on success; on failure keep the stale table and offer a retry
//
// Overlapping refreshes are neither deduplicated nor cancelled: whichever
// fetch settles last replaces the snapshot.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::cache::MappingCache;
use crate::errors::MappingFetchError;
use crate::fetch::MappingFetcher;
use crate::labels::{
    translate_or, Translator, FETCH_AGAIN_KEY, FETCH_ERROR_DESCRIPTION_KEY, FETCH_ERROR_TITLE_KEY,
};
use crate::notify::{Notification, NotificationAction, Notifier};

pub const RETRY_ICON: &str = "refresh-line";

pub struct Refresher {
    cache: MappingCache,
    fetcher: Arc<dyn MappingFetcher>,
    notifier: Arc<dyn Notifier>,
    translator: Arc<dyn Translator>,
    started: AtomicBool,
}

impl Refresher {
    pub fn new(
        cache: MappingCache,
        fetcher: Arc<dyn MappingFetcher>,
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translator>,
    ) -> Arc<Self> {
        Arc::new(Refresher {
            cache,
            fetcher,
            notifier,
            translator,
            started: AtomicBool::new(false),
        })
    }

    /// Fetch a new table and swap it into the cache
    ///
    /// On failure the cache is left untouched, one notification with a retry
    /// action is emitted, and the error is returned for callers that care.
    pub fn refresh(self: &Arc<Self>) -> BoxFuture<'static, Result<(), MappingFetchError>> {
        let this = Arc::clone(self);
        async move { this.run_refresh().await }.boxed()
    }

    /// Kick off the initial refresh in the background, once per refresher
    ///
    /// Later calls return `None`; use [`Refresher::refresh`] for manual retries.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<Result<(), MappingFetchError>>> {
        if self.started.swap(true, Ordering::AcqRel) {
            return None;
        }

        Some(tokio::spawn(self.refresh()))
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    async fn run_refresh(self: Arc<Self>) -> Result<(), MappingFetchError> {
        tracing::debug!("Fetching history event mappings");

        match self.fetcher.fetch_mapping_table().await {
            Ok(table) => {
                let pairs = table.mapping_count();
                let categories = table.event_category_details.len();
                let generation = self.cache.replace(table);
                tracing::debug!(generation, pairs, categories, "History event mappings updated");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to fetch history event mappings");
                self.notifier.notify(self.failure_notification(&err));
                Err(err)
            }
        }
    }

    fn failure_notification(self: &Arc<Self>, err: &MappingFetchError) -> Notification {
        let translator = self.translator.as_ref();
        let message = err.message();

        let title = translate_or(translator, FETCH_ERROR_TITLE_KEY, &[], || {
            "History event mappings".to_string()
        });
        let params = [("message", message.as_str())];
        let description = translate_or(translator, FETCH_ERROR_DESCRIPTION_KEY, &params, || {
            format!("Failed to fetch the history event mappings: {}", message)
        });
        let retry_label = translate_or(translator, FETCH_AGAIN_KEY, &[], || "Fetch again".to_string());

        // Weak: stored notifications must not keep the refresher alive
        let this = Arc::downgrade(self);
        let retry = NotificationAction::new(retry_label, RETRY_ICON, move || match this.upgrade() {
            Some(refresher) => {
                let refresh = refresher.refresh();
                async move {
                    // A failed retry reports itself through a new notification
                    let _ = refresh.await;
                }
                .boxed()
            }
            None => async {}.boxed(),
        });

        Notification::new(title, description).with_action(retry)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{Catalog, NoTranslations};
    use crate::mapping::MappingTable;
    use crate::notify::NotificationLog;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Answers with a queue of scripted outcomes; errors once the queue runs dry
    struct ScriptedFetcher {
        outcomes: Mutex<VecDeque<Result<MappingTable, MappingFetchError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedFetcher {
        fn new(outcomes: Vec<Result<MappingTable, MappingFetchError>>) -> Arc<Self> {
            Arc::new(ScriptedFetcher {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl MappingFetcher for ScriptedFetcher {
        async fn fetch_mapping_table(&self) -> Result<MappingTable, MappingFetchError> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MappingFetchError::Backend("script exhausted".to_string())))
        }
    }

    fn table(event_type: &str, subtype: &str, key: &str) -> MappingTable {
        let mut table = MappingTable::default();
        let mut by_subtype = HashMap::new();
        by_subtype.insert(subtype.to_string(), key.to_string());
        table.global_mappings.insert(event_type.to_string(), by_subtype);
        table
    }

    fn offline() -> MappingFetchError {
        MappingFetchError::Http {
            url: "http://127.0.0.1:4242/api/1/history/events/type_mappings".to_string(),
            message: "connection refused".to_string(),
        }
    }

    fn refresher_with(
        cache: MappingCache,
        fetcher: Arc<ScriptedFetcher>,
        log: &NotificationLog,
    ) -> Arc<Refresher> {
        Refresher::new(cache, fetcher, Arc::new(log.clone()), Arc::new(NoTranslations))
    }

    #[tokio::test]
    async fn test_refresh_success_replaces_snapshot() {
        let cache = MappingCache::new();
        let log = NotificationLog::new();
        let fetcher = ScriptedFetcher::new(vec![Ok(table("trade", "spend", "trade_spend"))]);
        let refresher = refresher_with(cache.clone(), fetcher, &log);

        refresher.refresh().await.unwrap();

        assert_eq!(cache.snapshot().global_mappings["trade"]["spend"], "trade_spend");
        assert_eq!(cache.generation(), 1);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_stale_snapshot_and_notifies_once() {
        let cache = MappingCache::with_table(table("trade", "spend", "trade_spend"));
        let log = NotificationLog::new();
        let fetcher = ScriptedFetcher::new(vec![Err(offline())]);
        let refresher = refresher_with(cache.clone(), fetcher, &log);

        let err = refresher.refresh().await.unwrap_err();
        assert!(matches!(err, MappingFetchError::Http { .. }));

        assert_eq!(cache.snapshot().global_mappings["trade"]["spend"], "trade_spend");
        assert_eq!(cache.generation(), 1);

        assert_eq!(log.len(), 1);
        let notification = log.latest().unwrap();
        assert_eq!(notification.title, "History event mappings");
        assert!(notification.message.contains("connection refused"));
        assert_eq!(notification.actions.len(), 1);
        assert_eq!(notification.actions[0].label, "Fetch again");
        assert_eq!(notification.actions[0].icon, RETRY_ICON);
    }

    #[tokio::test]
    async fn test_retry_action_refetches() {
        let cache = MappingCache::new();
        let log = NotificationLog::new();
        let fetcher = ScriptedFetcher::new(vec![Err(offline()), Ok(table("receive", "none", "receive"))]);
        let refresher = refresher_with(cache.clone(), Arc::clone(&fetcher), &log);

        assert!(refresher.refresh().await.is_err());
        assert!(cache.is_empty());

        let notification = log.latest().unwrap();
        assert!(log.trigger(&notification.id).await);

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.snapshot().global_mappings["receive"]["none"], "receive");
        // The retried notification is gone and the success adds none
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_stored_notification_does_not_keep_refresher_alive() {
        let cache = MappingCache::new();
        let log = NotificationLog::new();
        let fetcher = ScriptedFetcher::new(vec![Err(offline())]);
        let refresher = refresher_with(cache.clone(), Arc::clone(&fetcher), &log);

        let _ = refresher.refresh().await;
        let weak = Arc::downgrade(&refresher);
        drop(refresher);

        assert!(weak.upgrade().is_none());
        let notification = log.latest().unwrap();
        assert!(log.trigger(&notification.id).await);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_retry_notifies_again() {
        let cache = MappingCache::new();
        let log = NotificationLog::new();
        let fetcher = ScriptedFetcher::new(vec![Err(offline()), Err(offline())]);
        let refresher = refresher_with(cache.clone(), fetcher, &log);

        let _ = refresher.refresh().await;
        let first = log.latest().unwrap();
        first.actions[0].run().await;

        assert_eq!(log.len(), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_notification_is_translated() {
        let mut catalog = Catalog::new();
        catalog.insert(FETCH_ERROR_TITLE_KEY, "Asignaciones de eventos");
        catalog.insert(FETCH_ERROR_DESCRIPTION_KEY, "Error: {message}");
        catalog.insert(FETCH_AGAIN_KEY, "Reintentar");

        let log = NotificationLog::new();
        let fetcher = ScriptedFetcher::new(vec![Err(MappingFetchError::Backend("sin sesión".to_string()))]);
        let refresher = Refresher::new(MappingCache::new(), fetcher, Arc::new(log.clone()), Arc::new(catalog));

        let _ = refresher.refresh().await;

        let notification = log.latest().unwrap();
        assert_eq!(notification.title, "Asignaciones de eventos");
        assert_eq!(notification.message, "Error: Backend returned no mappings: sin sesión");
        assert_eq!(notification.actions[0].label, "Reintentar");
    }

    #[tokio::test]
    async fn test_start_runs_once() {
        let cache = MappingCache::new();
        let log = NotificationLog::new();
        let fetcher = ScriptedFetcher::new(vec![Ok(table("trade", "spend", "trade_spend"))]);
        let refresher = refresher_with(cache.clone(), Arc::clone(&fetcher), &log);

        assert!(!refresher.has_started());
        let handle = refresher.start().unwrap();
        assert!(refresher.start().is_none());

        handle.await.unwrap().unwrap();
        assert!(refresher.has_started());
        assert_eq!(fetcher.calls(), 1);
        assert!(!cache.is_empty());
    }

    /// Holds the first fetch until released so a second one can overtake it
    struct GatedFetcher {
        gate: Notify,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl MappingFetcher for GatedFetcher {
        async fn fetch_mapping_table(&self) -> Result<MappingTable, MappingFetchError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if call == 1 {
                self.gate.notified().await;
                Ok(table("first", "slow", "first"))
            } else {
                Ok(table("second", "fast", "second"))
            }
        }
    }

    #[tokio::test]
    async fn test_last_settled_refresh_wins() {
        let cache = MappingCache::new();
        let fetcher = Arc::new(GatedFetcher {
            gate: Notify::new(),
            calls: Mutex::new(0),
        });
        let refresher = Refresher::new(
            cache.clone(),
            Arc::clone(&fetcher) as Arc<dyn MappingFetcher>,
            Arc::new(NotificationLog::new()),
            Arc::new(NoTranslations),
        );

        let slow = tokio::spawn(refresher.refresh());
        tokio::task::yield_now().await;
        while *fetcher.calls.lock().unwrap() == 0 {
            tokio::task::yield_now().await;
        }

        refresher.refresh().await.unwrap();
        assert!(cache.snapshot().global_mappings.contains_key("second"));

        fetcher.gate.notify_one();
        slow.await.unwrap().unwrap();

        let snapshot = cache.snapshot();
        assert!(snapshot.global_mappings.contains_key("first"));
        assert!(!snapshot.global_mappings.contains_key("second"));
        assert_eq!(cache.generation(), 2);
    }
}
