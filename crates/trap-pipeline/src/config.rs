//! 트랩 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 `[listener]`, `[resolver]` 섹션을 합쳐
//! 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use mibtrap_core::config::MibtrapConfig;
//! use mibtrap_trap_pipeline::config::PipelineConfig;
//!
//! let core_config = MibtrapConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mibtrap_core::config::{MAX_DATAGRAM_SIZE, MibtrapConfig};

use crate::error::TrapError;

/// 동시 처리 상한 최대값
const MAX_IN_FLIGHT_LIMIT: usize = 100_000;

/// 트랩 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// UDP 바인드 주소
    pub bind_addr: String,
    /// 수신 버퍼 크기 (바이트)
    pub max_datagram_size: usize,
    /// 동시 처리 데이터그램 상한 (0 = 무제한)
    pub max_in_flight: usize,
    /// 역방향 DNS 조회 사용 여부
    pub resolver_enabled: bool,
    /// 역방향 DNS 조회 타임아웃 (밀리초)
    pub resolver_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:162".to_owned(),
            max_datagram_size: MAX_DATAGRAM_SIZE,
            max_in_flight: 0,
            resolver_enabled: true,
            resolver_timeout_ms: 2_000,
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &MibtrapConfig) -> Self {
        Self {
            bind_addr: core.listener.bind_addr.clone(),
            max_datagram_size: core.listener.max_datagram_size,
            max_in_flight: core.listener.max_in_flight,
            resolver_enabled: core.resolver.enabled,
            resolver_timeout_ms: core.resolver.timeout_ms,
        }
    }

    /// 설정값을 검증합니다.
    pub fn validate(&self) -> Result<(), TrapError> {
        self.socket_addr()?;

        if self.max_datagram_size == 0 || self.max_datagram_size > MAX_DATAGRAM_SIZE {
            return Err(TrapError::Config {
                field: "max_datagram_size".to_owned(),
                reason: format!("must be 1-{MAX_DATAGRAM_SIZE}"),
            });
        }

        if self.max_in_flight > MAX_IN_FLIGHT_LIMIT {
            return Err(TrapError::Config {
                field: "max_in_flight".to_owned(),
                reason: format!("must be 0 (unbounded) or at most {MAX_IN_FLIGHT_LIMIT}"),
            });
        }

        if self.resolver_enabled && self.resolver_timeout_ms == 0 {
            return Err(TrapError::Config {
                field: "resolver_timeout_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }

    /// 바인드 주소를 파싱합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, TrapError> {
        self.bind_addr.parse().map_err(|_| TrapError::Config {
            field: "bind_addr".to_owned(),
            reason: format!("'{}' is not a socket address", self.bind_addr),
        })
    }

    /// 역방향 조회 타임아웃
    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 바인드 주소를 설정합니다.
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    /// 수신 버퍼 크기를 설정합니다.
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.config.max_datagram_size = size;
        self
    }

    /// 동시 처리 상한을 설정합니다 (0 = 무제한).
    pub fn max_in_flight(mut self, limit: usize) -> Self {
        self.config.max_in_flight = limit;
        self
    }

    /// 역방향 DNS 조회 사용 여부를 설정합니다.
    pub fn resolver_enabled(mut self, enabled: bool) -> Self {
        self.config.resolver_enabled = enabled;
        self
    }

    /// 역방향 DNS 조회 타임아웃(밀리초)을 설정합니다.
    pub fn resolver_timeout_ms(mut self, ms: u64) -> Self {
        self.config.resolver_timeout_ms = ms;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, TrapError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let mut core = MibtrapConfig::default();
        core.listener.bind_addr = "127.0.0.1:1162".to_owned();
        core.listener.max_in_flight = 16;
        core.resolver.enabled = false;

        let config = PipelineConfig::from_core(&core);
        assert_eq!(config.bind_addr, "127.0.0.1:1162");
        assert_eq!(config.max_in_flight, 16);
        assert!(!config.resolver_enabled);
    }

    #[test]
    fn validate_rejects_bad_bind_addr() {
        let config = PipelineConfig {
            bind_addr: "port 162".to_owned(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bind_addr"));
    }

    #[test]
    fn validate_rejects_oversized_datagram_buffer() {
        let config = PipelineConfig {
            max_datagram_size: 70_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = PipelineConfigBuilder::new()
            .bind_addr("127.0.0.1:0")
            .max_in_flight(8)
            .resolver_enabled(false)
            .build()
            .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:0");
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.socket_addr().unwrap().port(), 0);
    }

    #[test]
    fn builder_rejects_zero_timeout_with_resolver() {
        let result = PipelineConfigBuilder::new().resolver_timeout_ms(0).build();
        assert!(result.is_err());
    }
}
