//! tracing 이벤트 로그 싱크

use tracing::{error, info, warn};

use mibtrap_core::pipeline::BoxFuture;
use mibtrap_core::types::Severity;

use super::EventSink;
use crate::error::TrapError;
use crate::event::TrapEvent;

/// 이벤트 로그 target
pub const EVENT_TARGET: &str = "mibtrap::events";

/// 이벤트를 `tracing`으로 내보내는 싱크
///
/// 심각도에 맞는 레벨(info/warn/error)로 기록하며, 구독자 설정(JSON 등)을 그대로 따릅니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn name(&self) -> &str {
        "event_log"
    }

    fn write<'a>(&'a self, event: &'a TrapEvent) -> BoxFuture<'a, Result<(), TrapError>> {
        Box::pin(async move {
            let source = event
                .source
                .map_or_else(|| "-".to_owned(), |addr| addr.to_string());
            match event.severity {
                Severity::Information => info!(
                    target: EVENT_TARGET,
                    trace_id = %event.trace_id,
                    event_id = event.event_id,
                    category = event.category,
                    payload_len = event.raw.len(),
                    source = %source,
                    "{}", event.message
                ),
                Severity::Warning => warn!(
                    target: EVENT_TARGET,
                    trace_id = %event.trace_id,
                    event_id = event.event_id,
                    category = event.category,
                    payload_len = event.raw.len(),
                    source = %source,
                    "{}", event.message
                ),
                Severity::Error => error!(
                    target: EVENT_TARGET,
                    trace_id = %event.trace_id,
                    event_id = event.event_id,
                    category = event.category,
                    payload_len = event.raw.len(),
                    source = %source,
                    "{}", event.message
                ),
            }
            Ok(())
        })
    }
}
