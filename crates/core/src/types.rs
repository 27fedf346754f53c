//! 도메인 타입: 모듈 간 공유되는 기본 타입

use std::fmt;

use serde::{Deserialize, Serialize};

/// 이벤트 심각도
///
/// 이벤트 싱크가 받아들이는 세 가지 수준입니다.
/// - 트랩 디코딩 성공: `Warning`
/// - 서비스 생명주기 알림: `Information`
/// - 처리 실패: `Error`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 정보성 이벤트
    #[default]
    Information,
    /// 경고: 장비가 보낸 트랩
    Warning,
    /// 에러
    Error,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "information" | "informational" => Some(Self::Information),
            "warn" | "warning" => Some(Self::Warning),
            "error" | "err" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Information => write!(f, "Information"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
        }
    }
}
