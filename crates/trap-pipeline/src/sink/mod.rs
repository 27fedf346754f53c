//! 이벤트 싱크
//!
//! 포맷된 [`TrapEvent`]를 영속화합니다. 파이프라인은 싱크의 성공을 가정하지 않으며
//! 실패는 로그와 카운터로만 남기고 재시도하지 않습니다.
//!
//! - [`FileSink`]: 서비스 시작 시각으로 이름 붙인 로그 파일
//! - [`TracingSink`]: `tracing` 이벤트 로그 (target `mibtrap::events`)
//! - [`MemorySink`]: 메모리 보관 (테스트/임베딩용)
//! - [`SinkSet`]: 여러 싱크로 fan-out

mod event_log;
mod file;
mod memory;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::error;

use mibtrap_core::metrics as m;
use mibtrap_core::pipeline::BoxFuture;

use crate::error::TrapError;
use crate::event::TrapEvent;

pub use event_log::{EVENT_TARGET, TracingSink};
pub use file::FileSink;
pub use memory::MemorySink;

/// 이벤트 싱크
///
/// 여러 워커가 동시에 호출합니다. 쓰기 직렬화는 구현체의 책임입니다.
pub trait EventSink: Send + Sync {
    /// 로그/메트릭 레이블용 싱크 이름
    fn name(&self) -> &str;

    /// 이벤트 하나를 기록합니다.
    fn write<'a>(&'a self, event: &'a TrapEvent) -> BoxFuture<'a, Result<(), TrapError>>;
}

/// 싱크 fan-out
///
/// 한 싱크의 실패가 다른 싱크 기록을 막지 않습니다.
#[derive(Clone, Default)]
pub struct SinkSet {
    sinks: Vec<Arc<dyn EventSink>>,
    failures: Arc<AtomicU64>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 싱크를 추가합니다 (빌더 형태).
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.push(sink);
        self
    }

    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// 등록된 싱크 이름 목록
    pub fn names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// 누적 싱크 실패 횟수
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// 모든 싱크에 기록하고 실패한 싱크 수를 반환합니다.
    pub async fn write(&self, event: &TrapEvent) -> usize {
        let mut failed = 0;
        for sink in &self.sinks {
            if let Err(e) = sink.write(event).await {
                failed += 1;
                self.failures.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::TRAP_PIPELINE_SINK_FAILURES_TOTAL, m::LABEL_SINK => sink.name().to_owned())
                    .increment(1);
                error!(
                    sink = sink.name(),
                    trace_id = %event.trace_id,
                    severity = %event.severity,
                    error = %e,
                    "sink write failed"
                );
            }
        }
        failed
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet")
            .field("sinks", &self.names())
            .field("failures", &self.failures())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mibtrap_core::types::Severity;

    struct FailingSink;

    impl EventSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn write<'a>(&'a self, _event: &'a TrapEvent) -> BoxFuture<'a, Result<(), TrapError>> {
            Box::pin(async {
                Err(TrapError::Sink {
                    sink: "failing".to_owned(),
                    reason: "disk full".to_owned(),
                })
            })
        }
    }

    #[tokio::test]
    async fn failing_sink_does_not_block_others() {
        let memory = Arc::new(MemorySink::new());
        let sinks = SinkSet::new()
            .with_sink(Arc::new(FailingSink))
            .with_sink(memory.clone());

        let event = TrapEvent::notice(Severity::Information, "Service started");
        assert_eq!(sinks.write(&event).await, 1);
        assert_eq!(sinks.write(&event).await, 1);

        assert_eq!(memory.len(), 2);
        assert_eq!(sinks.failures(), 2);
    }

    #[tokio::test]
    async fn clones_share_failure_counter() {
        let sinks = SinkSet::new().with_sink(Arc::new(FailingSink));
        let clone = sinks.clone();
        clone
            .write(&TrapEvent::notice(Severity::Error, "boom"))
            .await;
        assert_eq!(sinks.failures(), 1);
        assert_eq!(sinks.names(), vec!["failing"]);
    }

    #[tokio::test]
    async fn empty_set_writes_nothing() {
        let sinks = SinkSet::new();
        assert!(sinks.is_empty());
        assert_eq!(
            sinks
                .write(&TrapEvent::notice(Severity::Warning, "x"))
                .await,
            0
        );
    }
}
