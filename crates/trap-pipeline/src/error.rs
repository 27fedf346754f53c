//! 트랩 파이프라인 에러 타입
//!
//! [`TrapError`]는 트랩 수신부터 싱크 기록까지 파이프라인 내부의 모든 에러를 표현합니다.
//! `From<TrapError> for MibtrapError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use mibtrap_core::error::{MibtrapError, PipelineError};

/// 트랩 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum TrapError {
    /// BER 디코딩 실패 (SNMP 코덱 에러 메시지)
    #[error("decode error: {0}")]
    Decode(String),

    /// 지원하지 않는 SNMP 버전 (v3 포함)
    #[error("unsupported SNMP version: {0}")]
    UnsupportedVersion(i64),

    /// 기대한 PDU 유형이 아님
    #[error("unexpected PDU type: expected {expected}, found {found}")]
    UnexpectedPdu {
        /// 기대한 PDU
        expected: &'static str,
        /// 실제 PDU
        found: String,
    },

    /// 역방향 이름 조회 실패 (항상 주소 문자열로 대체됨)
    #[error("reverse lookup for {addr} failed: {reason}")]
    Resolution {
        /// 조회 대상 주소
        addr: String,
        /// 실패 사유
        reason: String,
    },

    /// 이벤트 싱크 기록 실패
    #[error("sink '{sink}' write failed: {reason}")]
    Sink {
        /// 싱크 이름
        sink: String,
        /// 실패 사유
        reason: String,
    },

    /// UDP 소켓 바인드 실패
    #[error("failed to bind {addr}: {reason}")]
    Bind {
        /// 바인드 주소
        addr: String,
        /// 실패 사유
        reason: String,
    },

    /// 수신 루프 에러
    #[error("receive error: {0}")]
    Receive(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrapError {
    /// 메트릭 레이블용 에러 분류
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::UnsupportedVersion(_) | Self::UnexpectedPdu { .. } => "protocol",
            Self::Resolution { .. } => "resolution",
            Self::Sink { .. } => "sink",
            Self::Bind { .. } | Self::Receive(_) | Self::Io(_) => "io",
            Self::Config { .. } => "config",
        }
    }
}

impl From<TrapError> for MibtrapError {
    fn from(err: TrapError) -> Self {
        MibtrapError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display() {
        let err = TrapError::Decode("length exceeds input".to_owned());
        assert_eq!(err.to_string(), "decode error: length exceeds input");
    }

    #[test]
    fn unsupported_version_names_version() {
        assert_eq!(
            TrapError::UnsupportedVersion(3).to_string(),
            "unsupported SNMP version: 3"
        );
    }

    #[test]
    fn kinds_group_protocol_errors() {
        assert_eq!(TrapError::UnsupportedVersion(3).kind(), "protocol");
        let err = TrapError::UnexpectedPdu {
            expected: "V2Trap",
            found: "Get".to_owned(),
        };
        assert_eq!(err.kind(), "protocol");
        assert_eq!(TrapError::Decode("x".to_owned()).kind(), "decode");
    }

    #[test]
    fn converts_to_mibtrap_error() {
        let err: MibtrapError = TrapError::Receive("socket closed".to_owned()).into();
        assert!(matches!(err, MibtrapError::Pipeline(_)));
    }
}
