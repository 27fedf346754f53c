//! 메모리 싱크

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;

use mibtrap_core::pipeline::BoxFuture;

use super::EventSink;
use crate::error::TrapError;
use crate::event::TrapEvent;

/// 기록된 이벤트를 메모리에 보관하는 싱크
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TrapEvent>>,
    notify: Notify,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 보관 중인 이벤트 복사본
    pub fn events(&self) -> Vec<TrapEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 이벤트가 `count`개 이상 쌓일 때까지 기다립니다.
    ///
    /// 시간 안에 도달하면 `true`를 반환합니다.
    pub async fn wait_for_len(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TrapEvent>> {
        // 보관만 하므로 poison 상태여도 데이터는 유효
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl EventSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write<'a>(&'a self, event: &'a TrapEvent) -> BoxFuture<'a, Result<(), TrapError>> {
        Box::pin(async move {
            self.lock().push(event.clone());
            self.notify.notify_waiters();
            Ok(())
        })
    }
}
