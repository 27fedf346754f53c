//! 트랩 이벤트와 메시지 포맷
//!
//! [`TrapEvent`]는 데이터그램 하나(또는 생명주기 알림 하나)에 대응하며
//! 생성 후 변경되지 않고 싱크로 전달됩니다.

use std::fmt::Write as _;
use std::net::SocketAddr;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use mibtrap_core::types::Severity;
use mibtrap_mib_catalog::TrapRecord;

use crate::decoder::{V1Trap, V2Trap, VarBind};
use crate::resolver::HostDisplay;

/// 싱크로 전달되는 이벤트
#[derive(Debug, Clone)]
pub struct TrapEvent {
    /// 추적 ID (UUID v4)
    pub trace_id: String,
    pub severity: Severity,
    /// 싱크 이벤트 ID (v1: specific, v2: error-index)
    pub event_id: u16,
    /// 싱크 카테고리 (v1: generic, v2: error-status)
    pub category: i16,
    /// 여러 줄 메시지
    pub message: String,
    /// 원본 데이터그램 (알림은 빈 값)
    pub raw: Bytes,
    /// 발신자
    pub source: Option<SocketAddr>,
    pub received_at: DateTime<Utc>,
}

impl TrapEvent {
    fn new(severity: Severity, message: String) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            severity,
            event_id: 0,
            category: 0,
            message,
            raw: Bytes::new(),
            source: None,
            received_at: Utc::now(),
        }
    }

    /// 생명주기/경고 알림
    pub fn notice(severity: Severity, message: impl Into<String>) -> Self {
        Self::new(severity, message.into())
    }

    /// 디코딩된 트랩 이벤트 (`Warning`)
    ///
    /// `event_id`는 16비트 부호 없는 범위로 축소되고, `category`는 i16으로 포화됩니다.
    pub fn trap(
        message: String,
        event_id: i32,
        category: i32,
        raw: Bytes,
        source: SocketAddr,
    ) -> Self {
        Self {
            event_id: reduce_event_id(event_id),
            category: saturate_category(category),
            raw,
            source: Some(source),
            ..Self::new(Severity::Warning, message)
        }
    }

    /// 처리 실패 이벤트 (`Error`)
    pub fn failure(message: impl Into<String>, raw: Bytes, source: SocketAddr) -> Self {
        Self {
            raw,
            source: Some(source),
            ..Self::new(Severity::Error, message.into())
        }
    }

    /// 여러 줄 메시지 여부
    pub fn is_multiline(&self) -> bool {
        self.message.contains('\n')
    }
}

/// 이벤트 ID를 0..=65535 범위로 축소합니다 (음수는 유클리드 나머지).
pub fn reduce_event_id(id: i32) -> u16 {
    id.rem_euclid(1 << 16) as u16
}

/// 카테고리를 i16 범위로 포화시킵니다.
pub fn saturate_category(category: i32) -> i16 {
    category.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// SNMPv1 트랩 메시지
///
/// 카탈로그에 레코드가 있으면 설명과 트랩 유형을 앞에 붙이고, 없으면 생략합니다.
pub fn format_v1(trap: &V1Trap, record: Option<&TrapRecord>, agent: &HostDisplay) -> String {
    let mut out = String::from("SNMP v1\n");
    if let Some(record) = record {
        let _ = writeln!(out, "{}", record.description);
        let _ = writeln!(out, "Trap type: {}", record.trap_type);
    }
    let _ = writeln!(out, "Agent address: {agent}");
    push_bindings(&mut out, &trap.varbinds);
    out
}

/// SNMPv2c 트랩 메시지
pub fn format_v2(trap: &V2Trap, agent: &HostDisplay) -> String {
    let mut out = String::from("SNMP v2\n");
    let _ = writeln!(out, "Agent address: {agent}");
    let _ = writeln!(out, "Community: {}", trap.community);
    push_bindings(&mut out, &trap.varbinds);
    out
}

fn push_bindings(out: &mut String, varbinds: &[VarBind]) {
    let _ = writeln!(out, "Binding count: {}", varbinds.len());
    out.push_str("---");
    for vb in varbinds {
        let _ = write!(out, "\n{vb}");
    }
}
