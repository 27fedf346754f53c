//! 작업 제출
//!
//! 수신 루프는 데이터그램마다 작업 하나를 제출하고 즉시 다음 수신으로 돌아갑니다.
//! 기본은 무제한 spawn이며, `listener.max_in_flight > 0`이면 세마포어 허가를 먼저 얻은
//! 작업만 spawn합니다. 허가가 없으면 작업을 버리고 `false`를 돌려줍니다.

use std::sync::Arc;

use tokio::sync::Semaphore;

use mibtrap_core::pipeline::BoxFuture;

/// 비동기 작업 제출
///
/// `submit`은 절대 블록하지 않아야 합니다.
pub trait WorkSubmitter: Send + Sync {
    /// 작업을 실행 대기열에 넣습니다. 거절하면 `false`를 반환하고 작업은 버려집니다.
    #[must_use]
    fn submit(&self, work: BoxFuture<'static, ()>) -> bool;
}

/// 작업마다 독립 태스크를 spawn (상한 없음)
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnSubmitter;

impl WorkSubmitter for SpawnSubmitter {
    fn submit(&self, work: BoxFuture<'static, ()>) -> bool {
        tokio::spawn(work);
        true
    }
}

/// 동시 실행 수를 제한하는 제출기
///
/// 살아 있는 태스크 수는 `limit`을 넘지 않습니다.
#[derive(Debug, Clone)]
pub struct BoundedSubmitter {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl BoundedSubmitter {
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 현재 남은 허가 수
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl WorkSubmitter for BoundedSubmitter {
    fn submit(&self, work: BoxFuture<'static, ()>) -> bool {
        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            return false;
        };
        tokio::spawn(async move {
            work.await;
            drop(permit);
        });
        true
    }
}

/// 설정값으로 제출기를 고릅니다 (0 = 무제한).
pub fn for_limit(max_in_flight: usize) -> Arc<dyn WorkSubmitter> {
    if max_in_flight == 0 {
        Arc::new(SpawnSubmitter)
    } else {
        Arc::new(BoundedSubmitter::new(max_in_flight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Notify;

    #[tokio::test]
    async fn spawn_submitter_runs_work() {
        let done = Arc::new(AtomicUsize::new(0));
        let submitter = SpawnSubmitter;
        for _ in 0..10 {
            let done = done.clone();
            assert!(submitter.submit(Box::pin(async move {
                done.fetch_add(1, Ordering::SeqCst);
            })));
        }
        tokio::time::timeout(Duration::from_secs(2), async {
            while done.load(Ordering::SeqCst) < 10 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn bounded_submitter_rejects_beyond_limit() {
        let submitter = BoundedSubmitter::new(2);
        let release = Arc::new(Notify::new());
        let started = Arc::new(AtomicUsize::new(0));

        let mut accepted = 0;
        for _ in 0..200 {
            let (release, started) = (release.clone(), started.clone());
            if submitter.submit(Box::pin(async move {
                started.fetch_add(1, Ordering::SeqCst);
                release.notified().await;
            })) {
                accepted += 1;
            }
        }

        // 허가를 얻은 작업만 태스크가 됨
        assert_eq!(accepted, 2);
        assert_eq!(submitter.available(), 0);
        tokio::time::timeout(Duration::from_secs(2), async {
            while started.load(Ordering::SeqCst) < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        release.notify_waiters();
        tokio::time::timeout(Duration::from_secs(2), async {
            while submitter.available() < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn bounded_submitter_caps_concurrency() {
        let submitter = BoundedSubmitter::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        let mut submitted = 0;
        while submitted < 8 {
            let (active, peak, done) = (active.clone(), peak.clone(), done.clone());
            let accepted = submitter.submit(Box::pin(async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                done.fetch_add(1, Ordering::SeqCst);
            }));
            if accepted {
                submitted += 1;
            } else {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }

        tokio::time::timeout(Duration::from_secs(5), async {
            while done.load(Ordering::SeqCst) < 8 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(submitter.available(), 2);
    }

    #[test]
    fn for_limit_picks_implementation() {
        // trait object만 반환하므로 생성 여부만 확인
        let _unbounded = for_limit(0);
        let bounded = BoundedSubmitter::new(4);
        assert_eq!(bounded.limit(), 4);
    }
}
