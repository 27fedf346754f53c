//! 경량 MIB 모듈 파서
//!
//! SMIv1 `TRAP-TYPE` 매크로만 대상으로 하며 전체 문법은 해석하지 않습니다.
//! 레코드는 `::=` 구분자로 끝나고, 구분자 줄 끝의 정수가 레코드 id입니다.
//!
//! # 알고리즘
//!
//! ```text
//! ... ::= 3          <- 이전 구분자 (범위 시작)
//!
//! fooTrap TRAP-TYPE
//!     ENTERPRISE foo
//!     VARIABLES { a, b }
//!     DESCRIPTION "..."
//!     ::= 4          <- 현재 구분자 (범위 끝, id = 4)
//! ```
//!
//! 파일 끝의 구분자부터 역방향으로 진행하며 `[이전 구분자, 현재 구분자)` 범위
//! 안에서만 키워드를 찾습니다. 구분자 줄이 정수로 끝나지 않으면 거기서 멈춥니다.
//! 가장 앞의 구분자는 파일 시작을 범위 시작으로 사용합니다.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::catalog::MibCatalog;
use crate::error::CatalogError;
use crate::record::TrapRecord;

/// 레코드 구분자
pub const RECORD_MARKER: &str = "::=";

const KW_DESCRIPTION: &str = "DESCRIPTION";
const KW_ENTERPRISE: &str = "ENTERPRISE";
const KW_TRAP_TYPE: &str = "TRAP-TYPE";
const KW_VARIABLES: &str = "VARIABLES";

/// MIB 모듈 텍스트를 파싱하여 카탈로그를 만듭니다.
///
/// # Errors
/// - 구분자가 두 개 미만이면 [`CatalogError::MissingMarker`]
/// - 숫자 id를 가진 레코드가 없으면 [`CatalogError::NoRecords`]
pub fn parse(text: &str) -> Result<MibCatalog, CatalogError> {
    let markers: Vec<usize> = text.match_indices(RECORD_MARKER).map(|(pos, _)| pos).collect();
    if markers.len() < 2 {
        return Err(CatalogError::MissingMarker {
            found: markers.len(),
        });
    }

    let mut records: BTreeMap<u32, TrapRecord> = BTreeMap::new();
    let mut index = 0usize;

    for (nth, &end) in markers.iter().enumerate().rev() {
        let Some(id) = declaration_id(text, end) else {
            debug!(offset = end, "declaration line has no trailing id, stopping");
            break;
        };

        let start = if nth == 0 { 0 } else { markers[nth - 1] };
        let section = &text[start..end];

        index += 1;
        let record = TrapRecord {
            id,
            enterprise: enterprise(section),
            trap_type: trap_type(section),
            description: description(section),
            variables: variables(section),
            index,
        };

        if let Some(previous) = records.insert(id, record) {
            warn!(
                id,
                previous_index = previous.index,
                index,
                "duplicate trap id in MIB module, keeping the later definition"
            );
        }
    }

    if records.is_empty() {
        return Err(CatalogError::NoRecords);
    }

    Ok(MibCatalog::from_records(records))
}

/// 구분자 위치에서 줄 끝까지 읽어 마지막 정수를 id로 반환합니다.
fn declaration_id(text: &str, marker: usize) -> Option<u32> {
    let rest = &text[marker..];
    let line = rest.find('\n').map_or(rest, |eol| &rest[..eol]).trim_end();
    let digits_at = line
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .len();
    let digits = &line[digits_at..];
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// `DESCRIPTION` 뒤 첫 번째와 두 번째 `"` 사이의 텍스트
///
/// 닫는 따옴표가 없으면 범위 끝까지 사용합니다.
fn description(section: &str) -> String {
    let Some(after) = after_keyword(section, KW_DESCRIPTION) else {
        return String::new();
    };
    let Some(open) = after.find('"') else {
        return String::new();
    };
    let body = &after[open + 1..];
    let close = body.find('"').unwrap_or(body.len());
    body[..close].to_owned()
}

/// `ENTERPRISE` 뒤 첫 공백부터 줄 끝까지의 토큰
fn enterprise(section: &str) -> String {
    let Some(after) = after_keyword(section, KW_ENTERPRISE) else {
        return String::new();
    };
    let Some(space) = after.find(' ') else {
        return String::new();
    };
    let value = &after[space + 1..];
    let eol = value.find('\n').unwrap_or(value.len());
    value[..eol].trim().to_owned()
}

/// `TRAP-TYPE`가 있는 줄의 시작부터 키워드 앞까지의 이름
fn trap_type(section: &str) -> String {
    let Some(kw) = section.find(KW_TRAP_TYPE) else {
        return String::new();
    };
    let line_start = section[..kw].rfind('\n').map_or(0, |nl| nl + 1);
    section[line_start..kw].trim().to_owned()
}

/// `VARIABLES` 뒤 `{`와 `}` 사이의 쉼표 구분 목록
fn variables(section: &str) -> Vec<String> {
    let Some(after) = after_keyword(section, KW_VARIABLES) else {
        return Vec::new();
    };
    let Some(open) = after.find('{') else {
        return Vec::new();
    };
    let body = &after[open + 1..];
    let close = body.find('}').unwrap_or(body.len());
    TrapRecord::split_variables(&body[..close])
}

fn after_keyword<'a>(section: &'a str, keyword: &str) -> Option<&'a str> {
    section
        .find(keyword)
        .map(|pos| &section[pos + keyword.len()..])
}
