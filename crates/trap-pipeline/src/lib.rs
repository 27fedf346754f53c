#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`decoder`]: SNMP v1/v2c 디코더와 인코더 (async-snmp 어댑터)
//! - [`resolver`]: 발신자 역방향 이름 조회
//! - [`event`]: 트랩 이벤트와 메시지 포맷
//! - [`sink`]: 이벤트 싱크 (파일, tracing, 메모리)
//! - [`worker`]: 데이터그램 단위 처리
//! - [`submit`]: 작업 제출 (무제한 spawn / 세마포어 제한)
//! - [`receiver`]: UDP 수신 루프
//! - [`pipeline`]: 전체 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! UDP -> ReceiveLoop -> WorkSubmitter -> worker -> SinkSet
//!                                          |
//!                          TrapDecoder, MibCatalog, HostResolver
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod receiver;
pub mod resolver;
pub mod sink;
pub mod submit;
pub mod worker;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LoopStatus, ShutdownKind, TrapPipeline, TrapPipelineBuilder};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::TrapError;

// 디코더
pub use decoder::{DecodedTrap, Oid, PduType, SnmpDecoder, TrapDecoder, V1Trap, V2Trap, Value, VarBind};

// 이벤트와 싱크
pub use event::TrapEvent;
pub use sink::{EventSink, FileSink, MemorySink, SinkSet, TracingSink};

// 리졸버
pub use resolver::{DnsResolver, HostDisplay, HostResolver, NoopResolver};

// 워커
pub use receiver::{DatagramSource, LoopExit};
pub use submit::{BoundedSubmitter, SpawnSubmitter, WorkSubmitter};
pub use worker::{StatsSnapshot, TrapContext};
