#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`parser`]: `::=` 구분자 기반 역방향 파서
//! - [`catalog`]: specific-trap 코드 조회 테이블
//! - [`record`]: 트랩 레코드 타입
//! - [`mapping`]: 장비-MIB 매핑과 제조사 식별
//! - [`error`]: 도메인 에러 타입

pub mod catalog;
pub mod error;
pub mod mapping;
pub mod parser;
pub mod record;

// --- 주요 타입 re-export ---

pub use catalog::MibCatalog;
pub use error::CatalogError;
pub use mapping::{
    DeviceMapping, ManufacturerEntry, ResolvedMib, detect_manufacturer, resolve_configured,
};
pub use record::TrapRecord;
