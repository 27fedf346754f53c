//! MIB 카탈로그: specific-trap 코드로 조회하는 읽기 전용 테이블

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::CatalogError;
use crate::parser;
use crate::record::TrapRecord;

/// 트랩 레코드 테이블
///
/// 모듈을 한 번 파싱해 만들고 이후에는 변경하지 않습니다.
/// 파이프라인은 `Arc<MibCatalog>`로 워커들과 공유합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MibCatalog {
    records: BTreeMap<u32, TrapRecord>,
}

impl MibCatalog {
    pub(crate) fn from_records(records: BTreeMap<u32, TrapRecord>) -> Self {
        Self { records }
    }

    /// MIB 모듈 텍스트를 파싱합니다.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        parser::parse(text)
    }

    /// MIB 모듈 파일을 읽어 파싱합니다.
    ///
    /// UTF-8이 아닌 바이트는 대체 문자로 바꾸고 경고를 남깁니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CatalogError::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    offset = e.utf8_error().valid_up_to(),
                    "MIB module is not valid UTF-8, replacing invalid bytes"
                );
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        let catalog = parser::parse(&text)?;
        tracing::info!(
            path = %path.display(),
            records = catalog.len(),
            "MIB catalog loaded"
        );
        Ok(catalog)
    }

    /// specific-trap 코드로 레코드를 조회합니다.
    pub fn get(&self, id: u32) -> Option<&TrapRecord> {
        self.records.get(&id)
    }

    /// 레코드 수
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 레코드가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// id 오름차순으로 레코드를 순회합니다.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TrapRecord> + ExactSizeIterator {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODULE: &str = "M ::= BEGIN\n\
        b TRAP-TYPE\n DESCRIPTION \"b\"\n ::= 20\n\
        a TRAP-TYPE\n DESCRIPTION \"a\"\n ::= 10\n";

    #[test]
    fn iter_is_sorted_by_id() {
        let catalog = MibCatalog::parse(MODULE).unwrap();
        let ids: Vec<u32> = catalog.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn iter_is_exact_size_and_ordered() {
        let module: String = (0..50u32)
            .rev()
            .map(|id| format!("t{id} TRAP-TYPE\n DESCRIPTION \"{id}\"\n ::= {id}\n"))
            .collect();
        let catalog = MibCatalog::parse(&format!("M ::= BEGIN\n{module}")).unwrap();

        let iter = catalog.iter();
        assert_eq!(iter.len(), 50);
        let ids: Vec<u32> = iter.map(|r| r.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(catalog.iter().next_back().map(|r| r.id), Some(49));
    }

    #[test]
    fn get_unknown_id_is_none() {
        let catalog = MibCatalog::parse(MODULE).unwrap();
        assert!(catalog.get(99).is_none());
        assert!(!catalog.is_empty());
    }

    #[tokio::test]
    async fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODULE.as_bytes()).unwrap();

        let catalog = MibCatalog::load(file.path()).await.unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn load_replaces_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"M ::= BEGIN\nt TRAP-TYPE\n DESCRIPTION \"caf\xE9\"\n ::= 1\n")
            .unwrap();

        let catalog = MibCatalog::load(file.path()).await.unwrap();
        assert_eq!(catalog.get(1).unwrap().description, "caf\u{FFFD}");
    }

    #[tokio::test]
    async fn load_missing_file_is_read_error() {
        let err = MibCatalog::load("/nonexistent/mibtrap/module.mib")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
