//! 설정 관리: mibtrap.toml 파싱 및 런타임 설정
//!
//! [`MibtrapConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`MIBTRAP_LISTENER_BIND_ADDR=0.0.0.0:1162` 형식)
//! 3. 설정 파일 (`mibtrap.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), mibtrap_core::error::MibtrapError> {
//! use mibtrap_core::config::MibtrapConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = MibtrapConfig::load("mibtrap.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = MibtrapConfig::parse("[listener]\nbind_addr = \"127.0.0.1:1162\"")?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, MibtrapError};

/// SNMP 트랩 표준 포트
pub const DEFAULT_TRAP_PORT: u16 = 162;

/// UDP 데이터그램 최대 크기
pub const MAX_DATAGRAM_SIZE: usize = 65_535;

/// mibtrap 통합 설정
///
/// `mibtrap.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MibtrapConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// UDP 수신 설정
    #[serde(default)]
    pub listener: ListenerConfig,
    /// MIB 카탈로그 및 장비 매핑 설정
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// 역방향 DNS 조회 설정
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// 이벤트 싱크 설정
    #[serde(default)]
    pub sink: SinkConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl MibtrapConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, MibtrapError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MibtrapError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MibtrapError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                MibtrapError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, MibtrapError> {
        toml::from_str(toml_str).map_err(|e| {
            MibtrapError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `MIBTRAP_{SECTION}_{FIELD}`
    /// 예: `MIBTRAP_CATALOG_MAPPING_PATH=/etc/mibtrap/devicemapping.json`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "MIBTRAP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "MIBTRAP_GENERAL_LOG_FORMAT");

        // Listener
        override_string(&mut self.listener.bind_addr, "MIBTRAP_LISTENER_BIND_ADDR");
        override_usize(
            &mut self.listener.max_datagram_size,
            "MIBTRAP_LISTENER_MAX_DATAGRAM_SIZE",
        );
        override_usize(
            &mut self.listener.max_in_flight,
            "MIBTRAP_LISTENER_MAX_IN_FLIGHT",
        );

        // Catalog
        override_string(
            &mut self.catalog.mapping_path,
            "MIBTRAP_CATALOG_MAPPING_PATH",
        );
        override_optional_string(
            &mut self.catalog.manufacturer,
            "MIBTRAP_CATALOG_MANUFACTURER",
        );
        override_string(
            &mut self.catalog.identity_dir,
            "MIBTRAP_CATALOG_IDENTITY_DIR",
        );

        // Resolver
        override_bool(&mut self.resolver.enabled, "MIBTRAP_RESOLVER_ENABLED");
        override_u64(&mut self.resolver.timeout_ms, "MIBTRAP_RESOLVER_TIMEOUT_MS");

        // Sink
        override_string(&mut self.sink.log_dir, "MIBTRAP_SINK_LOG_DIR");
        override_bool(&mut self.sink.file_log, "MIBTRAP_SINK_FILE_LOG");
        override_bool(&mut self.sink.event_log, "MIBTRAP_SINK_EVENT_LOG");

        // Metrics
        override_bool(&mut self.metrics.enabled, "MIBTRAP_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "MIBTRAP_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "MIBTRAP_METRICS_PORT");
        override_string(&mut self.metrics.endpoint, "MIBTRAP_METRICS_ENDPOINT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), MibtrapError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // listener 검증
        if self.listener.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "listener.bind_addr",
                format!("'{}' is not a socket address", self.listener.bind_addr),
            ));
        }
        if self.listener.max_datagram_size == 0
            || self.listener.max_datagram_size > MAX_DATAGRAM_SIZE
        {
            return Err(invalid(
                "listener.max_datagram_size",
                format!("must be between 1 and {MAX_DATAGRAM_SIZE}"),
            ));
        }

        // catalog 검증
        if self.catalog.mapping_path.trim().is_empty() {
            return Err(invalid(
                "catalog.mapping_path",
                "mapping path must not be empty".to_owned(),
            ));
        }
        if matches!(&self.catalog.manufacturer, Some(m) if m.trim().is_empty()) {
            return Err(invalid(
                "catalog.manufacturer",
                "manufacturer must not be blank when set".to_owned(),
            ));
        }

        // resolver 검증
        if self.resolver.enabled && self.resolver.timeout_ms == 0 {
            return Err(invalid(
                "resolver.timeout_ms",
                "timeout must be greater than 0 when the resolver is enabled".to_owned(),
            ));
        }

        // sink 검증
        if self.sink.file_log && self.sink.log_dir.trim().is_empty() {
            return Err(invalid(
                "sink.log_dir",
                "log directory must not be empty when file_log is enabled".to_owned(),
            ));
        }

        // metrics 검증
        if self.metrics.enabled {
            if self.metrics.listen_addr.parse::<std::net::IpAddr>().is_err() {
                return Err(invalid(
                    "metrics.listen_addr",
                    format!("'{}' is not an IP address", self.metrics.listen_addr),
                ));
            }
            if self.metrics.port == 0 {
                return Err(invalid(
                    "metrics.port",
                    "port must be greater than 0".to_owned(),
                ));
            }
            if !self.metrics.endpoint.starts_with('/') {
                return Err(invalid(
                    "metrics.endpoint",
                    "endpoint must start with '/'".to_owned(),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> MibtrapError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// UDP 트랩 수신 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// 바인드 주소 (기본 `0.0.0.0:162`)
    pub bind_addr: String,
    /// 수신 버퍼 크기 (바이트)
    pub max_datagram_size: usize,
    /// 동시에 처리 중인 데이터그램 상한 (0 = 무제한)
    pub max_in_flight: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_TRAP_PORT}"),
            max_datagram_size: MAX_DATAGRAM_SIZE,
            max_in_flight: 0,
        }
    }
}

/// MIB 카탈로그 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// 장비-MIB 매핑 JSON 파일 경로
    pub mapping_path: String,
    /// 제조사 이름 고정값. 없으면 DMI 정보에서 읽습니다.
    pub manufacturer: Option<String>,
    /// DMI 식별 정보 디렉토리
    pub identity_dir: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            mapping_path: "devicemapping.json".to_owned(),
            manufacturer: None,
            identity_dir: "/sys/class/dmi/id".to_owned(),
        }
    }
}

/// 역방향 DNS 조회 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// 활성화 여부 (비활성화 시 주소 문자열을 그대로 사용)
    pub enabled: bool,
    /// 조회 타임아웃 (밀리초)
    pub timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 2_000,
        }
    }
}

/// 이벤트 싱크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// 파일 로그 디렉토리
    pub log_dir: String,
    /// 파일 로그 싱크 사용 여부
    pub file_log: bool,
    /// tracing 이벤트 로그 싱크 사용 여부
    pub event_log: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_owned(),
            file_log: true,
            event_log: true,
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 메트릭 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 리스닝 주소
    pub listen_addr: String,
    /// 리스닝 포트
    pub port: u16,
    /// 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_optional_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.trim().is_empty() {
            None
        } else {
            Some(val)
        };
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = MibtrapConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.listener.bind_addr, "0.0.0.0:162");
        assert_eq!(config.listener.max_datagram_size, 65_535);
        assert_eq!(config.listener.max_in_flight, 0);
        assert_eq!(config.catalog.mapping_path, "devicemapping.json");
        assert!(config.catalog.manufacturer.is_none());
        assert!(config.resolver.enabled);
        assert!(config.sink.file_log);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = MibtrapConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = MibtrapConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.listener.bind_addr, "0.0.0.0:162");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[listener]
bind_addr = "127.0.0.1:1162"
"#;
        let config = MibtrapConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.listener.bind_addr, "127.0.0.1:1162");
        assert_eq!(config.listener.max_datagram_size, 65_535);
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"

[listener]
bind_addr = "0.0.0.0:10162"
max_datagram_size = 8192
max_in_flight = 64

[catalog]
mapping_path = "/etc/mibtrap/devicemapping.json"
manufacturer = "Contoso Ltd."
identity_dir = "/tmp/dmi"

[resolver]
enabled = false
timeout_ms = 500

[sink]
log_dir = "/var/log/mibtrap"
file_log = true
event_log = false

[metrics]
enabled = true
listen_addr = "0.0.0.0"
port = 9200
endpoint = "/prom"
"#;
        let config = MibtrapConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.listener.max_datagram_size, 8192);
        assert_eq!(config.listener.max_in_flight, 64);
        assert_eq!(config.catalog.manufacturer.as_deref(), Some("Contoso Ltd."));
        assert!(!config.resolver.enabled);
        assert_eq!(config.resolver.timeout_ms, 500);
        assert!(!config.sink.event_log);
        assert_eq!(config.metrics.port, 9200);
        config.validate().unwrap();
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = MibtrapConfig::parse("invalid = [[[toml");
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            MibtrapError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = MibtrapConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = MibtrapConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_unparsable_bind_addr() {
        let mut config = MibtrapConfig::default();
        config.listener.bind_addr = "localhost".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("listener.bind_addr"));
    }

    #[test]
    fn validate_rejects_zero_datagram_size() {
        let mut config = MibtrapConfig::default();
        config.listener.max_datagram_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_datagram_size"));
    }

    #[test]
    fn validate_rejects_empty_mapping_path() {
        let mut config = MibtrapConfig::default();
        config.catalog.mapping_path = "  ".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mapping_path"));
    }

    #[test]
    fn validate_rejects_zero_timeout_only_when_enabled() {
        let mut config = MibtrapConfig::default();
        config.resolver.timeout_ms = 0;
        assert!(config.validate().is_err());

        config.resolver.enabled = false;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_log_dir_with_file_log() {
        let mut config = MibtrapConfig::default();
        config.sink.log_dir = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_dir"));
    }

    #[test]
    fn validate_rejects_bad_metrics_endpoint_when_enabled() {
        let mut config = MibtrapConfig::default();
        config.metrics.endpoint = "metrics".to_owned();
        // 비활성화 상태면 검증을 건너뜀
        config.validate().unwrap();

        config.metrics.enabled = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("metrics.endpoint"));
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트이므로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_MIBTRAP_STR", "overridden") };
        override_string(&mut val, "TEST_MIBTRAP_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_MIBTRAP_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: serial 테스트이므로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_MIBTRAP_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_MIBTRAP_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_MIBTRAP_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_blank_manufacturer_clears_it() {
        let mut val = Some("Contoso".to_owned());
        // SAFETY: serial 테스트이므로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_MIBTRAP_OPT", "") };
        override_optional_string(&mut val, "TEST_MIBTRAP_OPT");
        assert!(val.is_none());
        unsafe { std::env::remove_var("TEST_MIBTRAP_OPT") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = 8080u16;
        override_u16(&mut val, "TEST_MIBTRAP_NONEXISTENT_12345");
        assert_eq!(val, 8080);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let mut config = MibtrapConfig::default();
        config.catalog.manufacturer = Some("Fabrikam".to_owned());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = MibtrapConfig::parse(&toml_str).unwrap();
        assert_eq!(config.listener.bind_addr, parsed.listener.bind_addr);
        assert_eq!(parsed.catalog.manufacturer.as_deref(), Some("Fabrikam"));
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = MibtrapConfig::from_file("/nonexistent/path/mibtrap.toml").await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            MibtrapError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
