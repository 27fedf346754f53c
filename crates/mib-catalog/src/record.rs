//! 트랩 레코드: MIB 모듈에서 추출한 TRAP-TYPE 정의 하나

use serde::Serialize;

/// MIB 모듈의 트랩 정의
///
/// `id`는 선언 줄 끝의 숫자(specific-trap 코드)이며 카탈로그 내 키입니다.
/// `index`는 파서가 발견한 순서(1부터)입니다. 파서는 파일 끝에서부터
/// 역방향으로 진행하므로 파일의 마지막 레코드가 가장 작은 `index`를 가집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrapRecord {
    /// specific-trap 코드
    pub id: u32,
    /// ENTERPRISE 값 (OID 이름)
    pub enterprise: String,
    /// TRAP-TYPE 앞의 트랩 이름
    pub trap_type: String,
    /// DESCRIPTION 따옴표 안의 텍스트
    pub description: String,
    /// VARIABLES 목록 (선언 순서 유지)
    pub variables: Vec<String>,
    /// 발견 순서 (1부터)
    pub index: usize,
}

impl TrapRecord {
    /// 쉼표로 구분된 VARIABLES 원문을 항목 목록으로 나눕니다.
    ///
    /// 각 항목의 앞뒤 공백을 제거하고 빈 항목은 버립니다.
    pub fn split_variables(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .collect()
    }
}
