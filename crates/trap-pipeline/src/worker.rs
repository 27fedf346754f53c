//! 데이터그램 단위 작업
//!
//! 버전 판별, 디코딩, 카탈로그 대조, 이름 조회, 메시지 포맷, 싱크 전달을 수행합니다.
//! [`handle_datagram`]은 실패하지 않습니다. 모든 에러는 여기서 로그와 Error 이벤트로 바뀝니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error};

use mibtrap_core::metrics as m;
use mibtrap_mib_catalog::MibCatalog;

use crate::decoder::{PduType, TrapDecoder, VERSION_V1, VERSION_V2C};
use crate::error::TrapError;
use crate::event::{TrapEvent, format_v1, format_v2};
use crate::resolver::{HostDisplay, HostResolver};
use crate::sink::SinkSet;

/// 이름으로 표시할 수 없는 발신자
pub const UNKNOWN_HOST: &str = "Unknown";

/// 워커가 공유하는 실행 컨텍스트
///
/// 파이프라인 생성 시 한 번 만들어지고 모든 워커가 `Arc`로 공유합니다.
#[derive(Clone)]
pub struct TrapContext {
    pub catalog: Arc<MibCatalog>,
    pub decoder: Arc<dyn TrapDecoder>,
    pub resolver: Arc<dyn HostResolver>,
    pub sinks: SinkSet,
    pub stats: Arc<PipelineStats>,
}

/// 파이프라인 카운터
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    empty: AtomicU64,
    dropped: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
}

/// 카운터 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub datagrams_received: u64,
    pub empty_datagrams: u64,
    /// 동시 실행 상한에 걸려 버린 데이터그램
    pub datagrams_dropped: u64,
    pub traps_processed: u64,
    pub worker_failures: u64,
    pub sink_failures: u64,
}

impl PipelineStats {
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::TRAP_PIPELINE_DATAGRAMS_RECEIVED_TOTAL).increment(1);
    }

    pub(crate) fn record_empty(&self) {
        self.empty.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::TRAP_PIPELINE_EMPTY_DATAGRAMS_TOTAL).increment(1);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::TRAP_PIPELINE_DATAGRAMS_DROPPED_TOTAL).increment(1);
    }

    fn record_processed(&self, version: &'static str) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::TRAP_PIPELINE_TRAPS_PROCESSED_TOTAL, m::LABEL_VERSION => version)
            .increment(1);
    }

    fn record_failed(&self, kind: &'static str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::TRAP_PIPELINE_WORKER_FAILURES_TOTAL, m::LABEL_KIND => kind)
            .increment(1);
    }

    pub fn snapshot(&self, sink_failures: u64) -> StatsSnapshot {
        StatsSnapshot {
            datagrams_received: self.received.load(Ordering::Relaxed),
            empty_datagrams: self.empty.load(Ordering::Relaxed),
            datagrams_dropped: self.dropped.load(Ordering::Relaxed),
            traps_processed: self.processed.load(Ordering::Relaxed),
            worker_failures: self.failed.load(Ordering::Relaxed),
            sink_failures,
        }
    }
}

impl TrapContext {
    /// 현재 카운터 값
    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot(self.sinks.failures())
    }
}

/// 디코딩된 트랩과 버전 레이블
struct Processed {
    version: &'static str,
    event: TrapEvent,
}

/// 데이터그램 하나를 처리해 이벤트로 만듭니다.
pub async fn process_datagram(
    ctx: &TrapContext,
    datagram: Bytes,
    source: SocketAddr,
) -> Result<TrapEvent, TrapError> {
    process(ctx, datagram, source).await.map(|p| p.event)
}

async fn process(
    ctx: &TrapContext,
    datagram: Bytes,
    source: SocketAddr,
) -> Result<Processed, TrapError> {
    match ctx.decoder.protocol_version(&datagram)? {
        VERSION_V1 => {
            let trap = ctx.decoder.decode_v1(&datagram)?;
            let record = u32::try_from(trap.specific)
                .ok()
                .and_then(|id| ctx.catalog.get(id));
            if record.is_none() {
                debug!(specific = trap.specific, "no catalog record for specific-trap code");
            }

            let agent = display_sender(ctx.resolver.as_ref(), source).await;
            let message = format_v1(&trap, record, &agent);
            Ok(Processed {
                version: "v1",
                event: TrapEvent::trap(message, trap.specific, trap.generic, datagram, source),
            })
        }
        VERSION_V2C => {
            let trap = ctx.decoder.decode_v2(&datagram)?;
            if trap.pdu_type != PduType::V2Trap {
                return Err(TrapError::UnexpectedPdu {
                    expected: "V2Trap",
                    found: trap.pdu_type.to_string(),
                });
            }

            let agent = display_sender(ctx.resolver.as_ref(), source).await;
            let message = format_v2(&trap, &agent);
            Ok(Processed {
                version: "v2c",
                event: TrapEvent::trap(
                    message,
                    trap.error_index,
                    trap.error_status,
                    datagram,
                    source,
                ),
            })
        }
        other => Err(TrapError::UnsupportedVersion(other)),
    }
}

/// 발신자 표시값. 조회 실패 시 주소, 주소가 없으면 `Unknown`.
async fn display_sender(resolver: &dyn HostResolver, source: SocketAddr) -> HostDisplay {
    let ip = source.ip().to_canonical();
    let shown = if ip.is_unspecified() {
        UNKNOWN_HOST.to_owned()
    } else {
        ip.to_string()
    };
    HostDisplay::resolve(resolver, ip, shown).await
}

/// 워커 진입점
///
/// 성공하면 Warning 이벤트를, 실패하면 에러를 로그로 남기고 Error 이벤트를 싱크에 기록합니다.
pub async fn handle_datagram(ctx: Arc<TrapContext>, datagram: Bytes, source: SocketAddr) {
    let started = Instant::now();
    metrics::gauge!(m::TRAP_PIPELINE_IN_FLIGHT).increment(1.0);

    match process(&ctx, datagram.clone(), source).await {
        Ok(Processed { version, event }) => {
            debug!(
                source = %source,
                version,
                event_id = event.event_id,
                trace_id = %event.trace_id,
                "trap received"
            );
            ctx.stats.record_processed(version);
            ctx.sinks.write(&event).await;
        }
        Err(e) => {
            error!(
                source = %source,
                kind = e.kind(),
                payload_len = datagram.len(),
                error = %e,
                "trap processing failed"
            );
            ctx.stats.record_failed(e.kind());
            let event = TrapEvent::failure(
                format!("Failed to process trap from {source}: {e}"),
                datagram,
                source,
            );
            ctx.sinks.write(&event).await;
        }
    }

    metrics::gauge!(m::TRAP_PIPELINE_IN_FLIGHT).decrement(1.0);
    metrics::histogram!(m::TRAP_PIPELINE_PROCESSING_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());
}
