//! SNMP 트랩 디코더
//!
//! 원시 데이터그램을 버전별 트랩 구조로 변환합니다.
//!
//! - [`TrapDecoder`]: 디코더 trait (버전 판별, v1/v2 디코딩)
//! - [`SnmpDecoder`]: 기본 구현 (async-snmp BER 코덱 어댑터)
//! - [`encode`]: 역방향 인코더 (테스트 트랩 전송용)
//!
//! SNMPv3는 지원하지 않습니다. 버전 필드가 0(v1), 1(v2c)이 아니면
//! [`TrapError::UnsupportedVersion`]을 반환합니다.

pub mod encode;
mod snmp;

use std::fmt;
use std::net::Ipv4Addr;

use bytes::Bytes;
use serde::Serialize;

use crate::error::TrapError;

pub use snmp::SnmpDecoder;

/// SNMPv1 메시지 버전 값
pub const VERSION_V1: i64 = 0;
/// SNMPv2c 메시지 버전 값
pub const VERSION_V2C: i64 = 1;

/// 트랩 디코더
///
/// 워커는 먼저 [`protocol_version`](TrapDecoder::protocol_version)으로 버전만 확인한 뒤
/// 해당 버전의 디코딩 함수를 호출합니다.
pub trait TrapDecoder: Send + Sync {
    /// 메시지 앞부분만 읽어 버전 필드를 반환합니다.
    fn protocol_version(&self, datagram: &[u8]) -> Result<i64, TrapError>;

    /// SNMPv1 Trap-PDU를 디코딩합니다.
    fn decode_v1(&self, datagram: &[u8]) -> Result<V1Trap, TrapError>;

    /// SNMPv2c 메시지를 디코딩합니다. PDU 유형은 호출자가 확인합니다.
    fn decode_v2(&self, datagram: &[u8]) -> Result<V2Trap, TrapError>;
}

/// OBJECT IDENTIFIER
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    /// arc 목록으로 OID를 생성합니다.
    pub fn new(arcs: Vec<u32>) -> Self {
        Self(arcs)
    }

    /// arc 목록
    pub fn arcs(&self) -> &[u32] {
        &self.0
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self(arcs.to_vec())
    }
}

impl std::str::FromStr for Oid {
    type Err = TrapError;

    /// `1.3.6.1.4.1` 형식을 파싱합니다. 앞의 `.`은 허용합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(TrapError::Decode("empty OID".to_owned()));
        }
        trimmed
            .split('.')
            .map(|arc| {
                arc.parse::<u32>()
                    .map_err(|_| TrapError::Decode(format!("invalid OID arc '{arc}'")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for Oid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 변수 바인딩 값
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer32(i32),
    OctetString(Bytes),
    Null,
    ObjectId(Oid),
    IpAddress(Ipv4Addr),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Bytes),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// 디코더가 도메인 타입으로 옮기지 못한 값 (디버그 표현)
    Unknown(String),
}

impl Value {
    /// 메시지에 표시하는 타입 이름
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer32(_) => "Integer32",
            Self::OctetString(_) => "OctetString",
            Self::Null => "Null",
            Self::ObjectId(_) => "ObjectId",
            Self::IpAddress(_) => "IPAddress",
            Self::Counter32(_) => "Counter32",
            Self::Gauge32(_) => "Gauge32",
            Self::TimeTicks(_) => "TimeTicks",
            Self::Opaque(_) => "Opaque",
            Self::Counter64(_) => "Counter64",
            Self::NoSuchObject => "NoSuchObject",
            Self::NoSuchInstance => "NoSuchInstance",
            Self::EndOfMibView => "EndOfMibView",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer32(v) => write!(f, "{v}"),
            Self::OctetString(bytes) => fmt_octets(bytes, f),
            Self::Null => f.write_str("Null"),
            Self::ObjectId(oid) => write!(f, "{oid}"),
            Self::IpAddress(addr) => write!(f, "{addr}"),
            Self::Counter32(v) | Self::Gauge32(v) => write!(f, "{v}"),
            Self::TimeTicks(ticks) => fmt_ticks(*ticks, f),
            Self::Opaque(bytes) => fmt_hex(bytes, f),
            Self::Counter64(v) => write!(f, "{v}"),
            Self::NoSuchObject => f.write_str("noSuchObject"),
            Self::NoSuchInstance => f.write_str("noSuchInstance"),
            Self::EndOfMibView => f.write_str("endOfMibView"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// 출력 가능한 텍스트면 문자열로, 아니면 16진수로 표시합니다.
fn fmt_octets(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
            f.write_str(text)
        }
        _ => fmt_hex(bytes, f),
    }
}

fn fmt_hex(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{byte:02X}")?;
    }
    Ok(())
}

/// 1/100초 단위 TimeTicks를 `1d 2h 3m 4s 50ms` 형식으로 표시합니다.
fn fmt_ticks(ticks: u32, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let total_ms = u64::from(ticks) * 10;
    let days = total_ms / 86_400_000;
    let hours = total_ms / 3_600_000 % 24;
    let minutes = total_ms / 60_000 % 60;
    let seconds = total_ms / 1_000 % 60;
    let millis = total_ms % 1_000;
    write!(f, "{days}d {hours}h {minutes}m {seconds}s {millis}ms")
}

/// 변수 바인딩 (OID + 값)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }
}

impl fmt::Display for VarBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} : {}", self.oid, self.value.type_name(), self.value)
    }
}

/// SNMP PDU 유형 (context-specific 태그 0xA0..0xA8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PduType {
    Get,
    GetNext,
    Response,
    Set,
    Trap,
    GetBulk,
    Inform,
    V2Trap,
    Report,
}

impl PduType {
    /// BER 태그에서 PDU 유형을 얻습니다.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0xA0 => Self::Get,
            0xA1 => Self::GetNext,
            0xA2 => Self::Response,
            0xA3 => Self::Set,
            0xA4 => Self::Trap,
            0xA5 => Self::GetBulk,
            0xA6 => Self::Inform,
            0xA7 => Self::V2Trap,
            0xA8 => Self::Report,
            _ => return None,
        })
    }

    /// BER 태그
    pub fn tag(self) -> u8 {
        match self {
            Self::Get => 0xA0,
            Self::GetNext => 0xA1,
            Self::Response => 0xA2,
            Self::Set => 0xA3,
            Self::Trap => 0xA4,
            Self::GetBulk => 0xA5,
            Self::Inform => 0xA6,
            Self::V2Trap => 0xA7,
            Self::Report => 0xA8,
        }
    }
}

impl fmt::Display for PduType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// SNMPv1 트랩
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V1Trap {
    pub community: String,
    pub enterprise: Oid,
    pub agent_addr: Ipv4Addr,
    /// generic-trap 코드 (0..=6, 6 = enterpriseSpecific)
    pub generic: i32,
    /// specific-trap 코드 (MIB 카탈로그 키)
    pub specific: i32,
    pub timestamp: u32,
    pub varbinds: Vec<VarBind>,
}

/// SNMPv2c PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V2Trap {
    pub community: String,
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: i32,
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

/// 버전별 디코딩 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedTrap {
    V1(V1Trap),
    V2(V2Trap),
}
