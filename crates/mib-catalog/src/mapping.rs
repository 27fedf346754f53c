//! 장비-MIB 매핑
//!
//! 로컬 장비 제조사에 맞는 MIB 모듈 파일을 `devicemapping.json`에서 찾습니다.
//!
//! ```json
//! {
//!   "ByManufacturer": [
//!     { "Manufacturer": "Contoso Ltd.", "File": "mibs/contoso.mib" }
//!   ]
//! }
//! ```
//!
//! 상대 경로 `File`은 매핑 파일이 있는 디렉토리 기준으로 해석합니다.
//! 일치하는 항목이 여러 개면 첫 번째 항목을 사용합니다.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use mibtrap_core::config::CatalogConfig;

use crate::error::CatalogError;

/// DMI 제조사 정보 파일 (우선순위 순)
const IDENTITY_FILES: [&str; 2] = ["board_vendor", "sys_vendor"];

/// 매핑 파일 최대 크기
const MAX_MAPPING_FILE_SIZE: u64 = 1024 * 1024; // 1MB

/// `devicemapping.json` 전체 구조
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceMapping {
    /// 제조사별 MIB 파일 목록
    #[serde(rename = "ByManufacturer", default)]
    pub by_manufacturer: Vec<ManufacturerEntry>,

    /// 상대 경로 해석 기준 디렉토리
    #[serde(skip)]
    base_dir: PathBuf,
}

/// 제조사 하나에 대한 매핑 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManufacturerEntry {
    /// DMI 제조사 문자열과 정확히 일치해야 하는 이름
    pub manufacturer: String,
    /// MIB 모듈 파일 경로
    pub file: String,
}

/// 매핑 결과: 파이프라인 기동에 필요한 `{manufacturer, path}` 쌍
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMib {
    /// 로컬 장비 제조사
    pub manufacturer: String,
    /// MIB 모듈 파일 경로
    pub path: PathBuf,
}

impl DeviceMapping {
    /// 매핑 파일을 읽습니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let read_err = |reason: String| CatalogError::Read {
            path: path.display().to_string(),
            reason,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| read_err(e.to_string()))?;
        if metadata.len() > MAX_MAPPING_FILE_SIZE {
            return Err(read_err(format!(
                "file too large: {} bytes (max: {MAX_MAPPING_FILE_SIZE})",
                metadata.len()
            )));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| read_err(e.to_string()))?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_json(&content, base_dir).map_err(|e| match e {
            CatalogError::Mapping { reason, .. } => CatalogError::Mapping {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// JSON 문자열을 파싱합니다. 상대 경로는 `base_dir` 기준으로 해석합니다.
    pub fn from_json(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let mut mapping: Self = serde_json::from_str(json).map_err(|e| CatalogError::Mapping {
            path: "<inline>".to_owned(),
            reason: e.to_string(),
        })?;
        mapping.base_dir = base_dir.into();
        Ok(mapping)
    }

    /// 제조사에 해당하는 MIB 파일 경로를 찾습니다.
    ///
    /// # Errors
    /// 일치하는 항목이 없으면 [`CatalogError::UnmatchedManufacturer`]
    pub fn resolve(&self, manufacturer: &str) -> Result<ResolvedMib, CatalogError> {
        let wanted = manufacturer.trim();
        let entry = self
            .by_manufacturer
            .iter()
            .find(|entry| entry.manufacturer.trim() == wanted)
            .ok_or_else(|| CatalogError::UnmatchedManufacturer {
                manufacturer: wanted.to_owned(),
            })?;

        let file = Path::new(&entry.file);
        let path = if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.base_dir.join(file)
        };

        tracing::debug!(
            manufacturer = wanted,
            path = %path.display(),
            "resolved MIB module from device mapping"
        );

        Ok(ResolvedMib {
            manufacturer: wanted.to_owned(),
            path,
        })
    }
}

/// 로컬 장비 제조사를 결정합니다.
///
/// 설정값이 있으면 그대로 사용하고, 없으면 `identity_dir` 아래의
/// `board_vendor`, `sys_vendor` 순으로 읽어 비어 있지 않은 첫 값을 사용합니다.
pub async fn detect_manufacturer(
    configured: Option<&str>,
    identity_dir: impl AsRef<Path>,
) -> Result<String, CatalogError> {
    if let Some(name) = configured.map(str::trim).filter(|n| !n.is_empty()) {
        return Ok(name.to_owned());
    }

    let identity_dir = identity_dir.as_ref();
    for file in IDENTITY_FILES {
        let path = identity_dir.join(file);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let name = content.trim();
                if !name.is_empty() {
                    tracing::debug!(
                        source = %path.display(),
                        manufacturer = name,
                        "detected local manufacturer"
                    );
                    return Ok(name.to_owned());
                }
            }
            Err(e) => {
                tracing::debug!(source = %path.display(), error = %e, "identity file unavailable");
            }
        }
    }

    Err(CatalogError::Identity(format!(
        "none of {} found or non-empty under {}",
        IDENTITY_FILES.join(", "),
        identity_dir.display()
    )))
}

/// 설정의 `[catalog]` 섹션으로 MIB 모듈 경로를 결정합니다.
///
/// 제조사 식별, 매핑 파일 로딩, 항목 조회를 차례로 수행합니다.
pub async fn resolve_configured(config: &CatalogConfig) -> Result<ResolvedMib, CatalogError> {
    let manufacturer =
        detect_manufacturer(config.manufacturer.as_deref(), &config.identity_dir).await?;
    let mapping = DeviceMapping::load(&config.mapping_path).await?;
    mapping.resolve(&manufacturer)
}
