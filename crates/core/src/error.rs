//! 에러 타입: 도메인별 에러 정의

/// mibtrap 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum MibtrapError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// MIB 카탈로그 로딩 에러
    #[error("catalog error: {0}")]
    Catalog(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 로컬 장비 식별자에 대응하는 MIB 매핑이 없음
    #[error("no MIB mapping matches manufacturer \"{manufacturer}\"")]
    NoDeviceMapping { manufacturer: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 수신 루프가 운영자 요청 없이 종료됨
    #[error("receive loop terminated abnormally: {0}")]
    Aborted(String),
}
