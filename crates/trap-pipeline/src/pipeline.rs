//! 트랩 파이프라인 오케스트레이터
//!
//! [`TrapPipeline`]은 core의 [`Pipeline`] trait을 구현하여
//! `mibtrap-daemon`에서 start/stop/health_check 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! UDP :162 ──> ReceiveLoop ──submit──> worker (datagram 당 1개)
//!                                        ├─ TrapDecoder (버전 판별, v1/v2 디코딩)
//!                                        ├─ MibCatalog (v1 specific-trap 대조)
//!                                        ├─ HostResolver (역방향 이름 조회)
//!                                        └─ SinkSet ──> FileSink / TracingSink / ...
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mibtrap_core::error::{MibtrapError, PipelineError};
use mibtrap_core::pipeline::{HealthStatus, Pipeline};
use mibtrap_mib_catalog::MibCatalog;

use crate::config::PipelineConfig;
use crate::decoder::{SnmpDecoder, TrapDecoder};
use crate::error::TrapError;
use crate::receiver::{DatagramSource, LoopExit, ReceiveLoop};
use crate::resolver::{DnsResolver, HostResolver, NoopResolver};
use crate::sink::SinkSet;
use crate::submit::{self, WorkSubmitter};
use crate::worker::{PipelineStats, StatsSnapshot, TrapContext};

/// 파이프라인 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 수신 루프 상태 (watch 채널로 공유)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStatus {
    /// 시작 전
    Idle,
    /// 수신 중
    Running,
    /// 종료됨
    Exited(LoopExit),
}

/// 정지 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownKind {
    /// 정지 요청에 의한 정상 종료
    Graceful,
    /// 수신 루프가 먼저 실패함
    Abnormal(String),
}

/// SNMP 트랩 수신 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use mibtrap_trap_pipeline::{TrapPipelineBuilder, SinkSet, TracingSink};
///
/// let mut pipeline = TrapPipelineBuilder::new()
///     .config(config)
///     .catalog(catalog)
///     .sinks(SinkSet::new().with_sink(Arc::new(TracingSink::new())))
///     .build()?;
///
/// pipeline.start().await?;
/// ```
pub struct TrapPipeline {
    config: PipelineConfig,
    state: PipelineState,
    context: Arc<TrapContext>,
    submitter: Arc<dyn WorkSubmitter>,
    /// 주입된 수신원 (없으면 시작할 때 UDP 소켓을 바인드)
    source: Option<Arc<dyn DatagramSource>>,
    /// 수신 루프가 계속 돌아야 하는지 여부
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: Option<JoinHandle<LoopExit>>,
    status_tx: watch::Sender<LoopStatus>,
    local_addr: Option<SocketAddr>,
}

impl TrapPipeline {
    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 실제 바인드된 주소 (시작 후)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &MibCatalog {
        &self.context.catalog
    }

    /// 싱크 집합 (생명주기 알림 기록용)
    pub fn sinks(&self) -> &SinkSet {
        &self.context.sinks
    }

    /// 수신된 데이터그램 수를 반환합니다 (길이 0 포함).
    pub fn datagrams_received(&self) -> u64 {
        self.stats().datagrams_received
    }

    /// 처리된 트랩 수를 반환합니다.
    pub fn traps_processed(&self) -> u64 {
        self.stats().traps_processed
    }

    /// 워커 실패 수를 반환합니다.
    pub fn worker_failures(&self) -> u64 {
        self.stats().worker_failures
    }

    /// 싱크 실패 수를 반환합니다.
    pub fn sink_failures(&self) -> u64 {
        self.context.sinks.failures()
    }

    /// 전체 카운터 스냅샷
    pub fn stats(&self) -> StatsSnapshot {
        self.context.snapshot()
    }

    /// 수신 루프 상태 구독
    ///
    /// 데몬은 이 채널로 루프의 비정상 종료를 감지합니다.
    pub fn subscribe_status(&self) -> watch::Receiver<LoopStatus> {
        self.status_tx.subscribe()
    }

    /// 수신 루프를 멈추고 종료 사유를 돌려줍니다.
    ///
    /// 진행 중인 워커는 취소하지 않습니다.
    pub async fn shutdown(&mut self) -> Result<ShutdownKind, TrapError> {
        if self.state != PipelineState::Running {
            return Err(TrapError::Receive("pipeline is not running".to_owned()));
        }

        info!("stopping trap pipeline");
        // 플래그를 먼저 내려야 취소 중 발생한 소켓 에러를 정상 종료로 본다
        self.running.store(false, Ordering::SeqCst);
        self.cancel.cancel();

        let exit = match self.task.take() {
            Some(task) => task
                .await
                .unwrap_or_else(|e| LoopExit::Failed(format!("receive task panicked: {e}"))),
            None => LoopExit::Cancelled,
        };

        self.state = PipelineState::Stopped;
        self.local_addr = None;

        let kind = match exit {
            LoopExit::Cancelled => ShutdownKind::Graceful,
            LoopExit::Failed(reason) => ShutdownKind::Abnormal(reason),
        };
        match &kind {
            ShutdownKind::Graceful => info!("trap pipeline stopped"),
            ShutdownKind::Abnormal(reason) => warn!(reason = %reason, "trap pipeline stopped abnormally"),
        }
        Ok(kind)
    }

    fn loop_failed(&self) -> Option<String> {
        match &*self.status_tx.borrow() {
            LoopStatus::Exited(LoopExit::Failed(reason)) => Some(reason.clone()),
            _ => None,
        }
    }
}

impl Pipeline for TrapPipeline {
    async fn start(&mut self) -> Result<(), MibtrapError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let source = match &self.source {
            Some(source) => Arc::clone(source),
            None => {
                let addr = self.config.socket_addr()?;
                let socket = UdpSocket::bind(addr).await.map_err(|e| TrapError::Bind {
                    addr: addr.to_string(),
                    reason: e.to_string(),
                })?;
                Arc::new(socket) as Arc<dyn DatagramSource>
            }
        };
        let local_addr = source.local_addr()?;

        // 재시작마다 새 토큰
        self.cancel = CancellationToken::new();
        self.running.store(true, Ordering::SeqCst);
        self.status_tx.send_replace(LoopStatus::Running);

        let receive_loop = ReceiveLoop {
            source,
            context: Arc::clone(&self.context),
            submitter: Arc::clone(&self.submitter),
            running: Arc::clone(&self.running),
            cancel: self.cancel.clone(),
            max_datagram_size: self.config.max_datagram_size,
        };
        let status_tx = self.status_tx.clone();
        self.task = Some(tokio::spawn(async move {
            let exit = receive_loop.run().await;
            status_tx.send_replace(LoopStatus::Exited(exit.clone()));
            exit
        }));

        self.local_addr = Some(local_addr);
        self.state = PipelineState::Running;
        info!(
            addr = %local_addr,
            records = self.context.catalog.len(),
            sinks = self.context.sinks.len(),
            max_in_flight = self.config.max_in_flight,
            "trap pipeline started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), MibtrapError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }
        match self.shutdown().await? {
            ShutdownKind::Graceful => Ok(()),
            ShutdownKind::Abnormal(reason) => Err(PipelineError::Aborted(reason).into()),
        }
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                if let Some(reason) = self.loop_failed() {
                    return HealthStatus::Unhealthy(format!("receive loop failed: {reason}"));
                }
                let sink_failures = self.sink_failures();
                if sink_failures > 0 {
                    HealthStatus::Degraded(format!("{sink_failures} sink write failures"))
                } else {
                    HealthStatus::Healthy
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 트랩 파이프라인 빌더
///
/// 카탈로그는 필수입니다. 디코더, 리졸버, 제출기는 설정에 맞는 기본값을 사용합니다.
pub struct TrapPipelineBuilder {
    config: PipelineConfig,
    catalog: Option<Arc<MibCatalog>>,
    decoder: Option<Arc<dyn TrapDecoder>>,
    resolver: Option<Arc<dyn HostResolver>>,
    submitter: Option<Arc<dyn WorkSubmitter>>,
    source: Option<Arc<dyn DatagramSource>>,
    sinks: SinkSet,
}

impl TrapPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            catalog: None,
            decoder: None,
            resolver: None,
            submitter: None,
            source: None,
            sinks: SinkSet::new(),
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// MIB 카탈로그를 지정합니다.
    pub fn catalog(mut self, catalog: impl Into<Arc<MibCatalog>>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// 디코더를 교체합니다.
    pub fn decoder(mut self, decoder: Arc<dyn TrapDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// 리졸버를 교체합니다.
    pub fn resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// 작업 제출기를 교체합니다.
    pub fn submitter(mut self, submitter: Arc<dyn WorkSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// 바인드 대신 사용할 수신원을 지정합니다. `listener` 주소 설정은 무시됩니다.
    pub fn source(mut self, source: Arc<dyn DatagramSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// 이벤트 싱크 집합을 지정합니다.
    pub fn sinks(mut self, sinks: SinkSet) -> Self {
        self.sinks = sinks;
        self
    }

    /// 파이프라인을 생성합니다.
    pub fn build(self) -> Result<TrapPipeline, TrapError> {
        self.config.validate()?;

        let catalog = self.catalog.ok_or_else(|| TrapError::Config {
            field: "catalog".to_owned(),
            reason: "MIB catalog must be provided".to_owned(),
        })?;

        if self.sinks.is_empty() {
            warn!("trap pipeline built without sinks, events will only reach tracing");
        }

        let resolver = self.resolver.unwrap_or_else(|| {
            if self.config.resolver_enabled {
                Arc::new(DnsResolver::new(self.config.resolver_timeout()))
            } else {
                Arc::new(NoopResolver)
            }
        });
        let submitter = self
            .submitter
            .unwrap_or_else(|| submit::for_limit(self.config.max_in_flight));

        let context = Arc::new(TrapContext {
            catalog,
            decoder: self.decoder.unwrap_or_else(|| Arc::new(SnmpDecoder::new())),
            resolver,
            sinks: self.sinks,
            stats: Arc::new(PipelineStats::default()),
        });

        let (status_tx, _) = watch::channel(LoopStatus::Idle);

        Ok(TrapPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            context,
            submitter,
            source: self.source,
            running: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            task: None,
            status_tx,
            local_addr: None,
        })
    }
}

impl Default for TrapPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
