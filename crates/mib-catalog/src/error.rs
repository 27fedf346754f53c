//! MIB 카탈로그 에러 타입
//!
//! [`CatalogError`]는 MIB 모듈 파싱과 장비 매핑에서 발생하는 에러를 표현합니다.
//! 모두 기동 단계의 치명적 에러이며 `MibtrapError`로 변환되어 전파됩니다.

use mibtrap_core::error::{ConfigError, MibtrapError};

/// MIB 카탈로그 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// `::=` 레코드 구분자가 두 개 미만
    #[error("MIB module has {found} record marker(s), at least 2 are required")]
    MissingMarker {
        /// 발견된 구분자 수
        found: usize,
    },

    /// 구분자는 있지만 숫자 id를 가진 레코드가 하나도 없음
    #[error("MIB module contains no trap record with a numeric id")]
    NoRecords,

    /// MIB 모듈 또는 매핑 파일 읽기 실패
    #[error("failed to read {path}: {reason}")]
    Read {
        /// 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 매핑 JSON 형식 오류
    #[error("invalid device mapping {path}: {reason}")]
    Mapping {
        /// 매핑 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 매핑 파일에 로컬 제조사와 일치하는 항목이 없음
    #[error("failed to match MIB file for manufacturer \"{manufacturer}\"")]
    UnmatchedManufacturer {
        /// 로컬 장비 제조사
        manufacturer: String,
    },

    /// 로컬 장비 제조사를 확인할 수 없음
    #[error("could not determine local manufacturer: {0}")]
    Identity(String),
}

impl From<CatalogError> for MibtrapError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnmatchedManufacturer { manufacturer } => {
                MibtrapError::Config(ConfigError::NoDeviceMapping { manufacturer })
            }
            CatalogError::Mapping { path, reason } => {
                MibtrapError::Config(ConfigError::InvalidValue {
                    field: "catalog.mapping_path".to_owned(),
                    reason: format!("{path}: {reason}"),
                })
            }
            other => MibtrapError::Catalog(other.to_string()),
        }
    }
}
