use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;
use wardbook_domain::SurveyId;

type RecordMutex = Arc<tokio::sync::Mutex<()>>;

/// One async mutex per survey id, created on demand and dropped once idle.
#[derive(Default)]
pub(crate) struct RecordLocks {
    entries: Mutex<HashMap<SurveyId, RecordMutex>>,
}

impl RecordLocks {
    /// Waits until the caller holds the lock for `survey_id`.
    pub(crate) async fn acquire(&self, survey_id: SurveyId) -> RecordLockGuard<'_> {
        let record_mutex = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.entry(survey_id).or_default().clone()
        };

        let guard = record_mutex.lock_owned().await;

        RecordLockGuard {
            owner: self,
            survey_id,
            guard: Some(guard),
        }
    }

    /// Number of records with a live lock entry.
    pub(crate) fn tracked(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, survey_id: SurveyId) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(record_mutex) = entries.get(&survey_id)
            && Arc::strong_count(record_mutex) == 1
        {
            entries.remove(&survey_id);
        }
    }
}

/// Holds one record lock until dropped.
pub(crate) struct RecordLockGuard<'a> {
    owner: &'a RecordLocks,
    survey_id: SurveyId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordLockGuard<'_> {
    fn drop(&mut self) {
        // The owned guard keeps its own Arc, so release it before counting.
        drop(self.guard.take());
        self.owner.release(self.survey_id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use wardbook_domain::SurveyId;

    use super::RecordLocks;

    #[tokio::test]
    async fn idle_entries_are_removed() {
        let locks = RecordLocks::default();
        let survey_id = SurveyId::new();

        {
            let _guard = locks.acquire(survey_id).await;
            assert_eq!(locks.tracked(), 1);
        }

        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn distinct_records_do_not_block_each_other() {
        let locks = RecordLocks::default();

        let _first = locks.acquire(SurveyId::new()).await;
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(SurveyId::new()),
        )
        .await;

        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn same_record_waits_for_holder() {
        let locks = Arc::new(RecordLocks::default());
        let survey_id = SurveyId::new();

        let guard = locks.acquire(survey_id).await;
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(survey_id)).await;
        assert!(blocked.is_err());

        drop(guard);
        let acquired =
            tokio::time::timeout(Duration::from_millis(100), locks.acquire(survey_id)).await;
        assert!(acquired.is_ok());
    }
}
