//! async-snmp 기반 디코더
//!
//! BER 파싱은 `async_snmp::ber`와 PDU 타입에 맡기고, 여기서는 메시지 헤더 확인과
//! 도메인 타입 변환만 합니다. 라이브러리 에러는 [`TrapError::Decode`]로 옮깁니다.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

use async_snmp::ber::Decoder;
use bytes::Bytes;

use super::{
    DecodedTrap, Oid, PduType, TrapDecoder, V1Trap, V2Trap, VERSION_V1, VERSION_V2C, Value,
    VarBind,
};
use crate::error::TrapError;

/// 디코더 에러 메시지에 쓰는 대상 주소 (발신자는 워커가 따로 기록함)
const UNKNOWN_SOURCE: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

/// 기본 트랩 디코더
#[derive(Debug, Clone, Copy, Default)]
pub struct SnmpDecoder;

impl SnmpDecoder {
    pub fn new() -> Self {
        Self
    }

    /// 버전을 판별해 해당 버전으로 디코딩합니다.
    ///
    /// v2c 메시지는 PDU 유형과 관계없이 반환하므로 호출자가 유형을 확인해야 합니다.
    pub fn decode(&self, datagram: &[u8]) -> Result<DecodedTrap, TrapError> {
        match self.protocol_version(datagram)? {
            VERSION_V1 => self.decode_v1(datagram).map(DecodedTrap::V1),
            VERSION_V2C => self.decode_v2(datagram).map(DecodedTrap::V2),
            other => Err(TrapError::UnsupportedVersion(other)),
        }
    }
}

impl TrapDecoder for SnmpDecoder {
    fn protocol_version(&self, datagram: &[u8]) -> Result<i64, TrapError> {
        let mut top = decoder(datagram);
        let mut message = top.read_sequence().map_err(decode_error)?;
        message.read_integer().map(i64::from).map_err(decode_error)
    }

    fn decode_v1(&self, datagram: &[u8]) -> Result<V1Trap, TrapError> {
        let mut header = MessageHeader::read(datagram, VERSION_V1)?;
        if header.pdu_tag != PduType::Trap.tag() {
            return Err(TrapError::UnexpectedPdu {
                expected: "Trap",
                found: describe_tag(header.pdu_tag),
            });
        }

        let pdu = async_snmp::TrapV1Pdu::decode(&mut header.body).map_err(decode_error)?;
        header.finish()?;

        Ok(V1Trap {
            community: header.community,
            enterprise: oid_from(&pdu.enterprise),
            agent_addr: Ipv4Addr::from(pdu.agent_addr),
            generic: pdu.generic_trap,
            specific: pdu.specific_trap,
            timestamp: pdu.time_stamp,
            varbinds: pdu.varbinds.iter().map(varbind_from).collect(),
        })
    }

    fn decode_v2(&self, datagram: &[u8]) -> Result<V2Trap, TrapError> {
        let mut header = MessageHeader::read(datagram, VERSION_V2C)?;
        let pdu_type = match PduType::from_tag(header.pdu_tag) {
            Some(PduType::Trap) | None => {
                return Err(TrapError::UnexpectedPdu {
                    expected: "SNMPv2 PDU",
                    found: describe_tag(header.pdu_tag),
                });
            }
            Some(pdu_type) => pdu_type,
        };

        let pdu = async_snmp::Pdu::decode(&mut header.body).map_err(decode_error)?;
        header.finish()?;

        Ok(V2Trap {
            community: header.community,
            pdu_type,
            request_id: pdu.request_id,
            error_status: pdu.error_status,
            error_index: pdu.error_index,
            varbinds: pdu.varbinds.iter().map(varbind_from).collect(),
        })
    }
}

/// 메시지 공통 헤더 (version, community)와 PDU 디코더
struct MessageHeader {
    community: String,
    pdu_tag: u8,
    body: Decoder,
    top: Decoder,
}

impl MessageHeader {
    fn read(datagram: &[u8], expected_version: i64) -> Result<Self, TrapError> {
        let mut top = decoder(datagram);
        let mut body = top.read_sequence().map_err(decode_error)?;

        let version = body.read_integer().map(i64::from).map_err(decode_error)?;
        if version != expected_version {
            return Err(TrapError::Decode(format!(
                "expected version {expected_version}, found {version}"
            )));
        }

        let community = body.read_octet_string().map_err(decode_error)?;
        let community = String::from_utf8_lossy(&community).into_owned();
        let pdu_tag = body
            .peek_tag()
            .ok_or_else(|| TrapError::Decode("missing PDU".to_owned()))?;

        Ok(Self {
            community,
            pdu_tag,
            body,
            top,
        })
    }

    /// PDU 뒤나 메시지 뒤에 남은 바이트를 거부합니다.
    fn finish(&self) -> Result<(), TrapError> {
        if !self.body.is_empty() {
            return Err(TrapError::Decode(
                "trailing bytes after PDU in SNMP message".to_owned(),
            ));
        }
        if !self.top.is_empty() {
            return Err(TrapError::Decode(
                "trailing bytes after SNMP message".to_owned(),
            ));
        }
        Ok(())
    }
}

fn decoder(datagram: &[u8]) -> Decoder {
    Decoder::with_target(Bytes::copy_from_slice(datagram), UNKNOWN_SOURCE)
}

fn decode_error(err: impl fmt::Display) -> TrapError {
    TrapError::Decode(err.to_string())
}

fn describe_tag(tag: u8) -> String {
    PduType::from_tag(tag).map_or_else(|| format!("tag 0x{tag:02X}"), |pdu| pdu.to_string())
}

pub(super) fn oid_from(oid: &async_snmp::Oid) -> Oid {
    Oid::from(oid.arcs())
}

fn varbind_from(vb: &async_snmp::VarBind) -> VarBind {
    VarBind::new(oid_from(&vb.oid), value_from(&vb.value))
}

#[allow(unreachable_patterns)]
fn value_from(value: &async_snmp::Value) -> Value {
    use async_snmp::Value as Snmp;

    match value {
        Snmp::Integer(v) => Value::Integer32(*v),
        Snmp::OctetString(bytes) => Value::OctetString(bytes.clone()),
        Snmp::Null => Value::Null,
        Snmp::ObjectIdentifier(oid) => Value::ObjectId(oid_from(oid)),
        Snmp::IpAddress(octets) => Value::IpAddress(Ipv4Addr::from(*octets)),
        Snmp::Counter32(v) => Value::Counter32(*v),
        Snmp::Gauge32(v) => Value::Gauge32(*v),
        Snmp::TimeTicks(v) => Value::TimeTicks(*v),
        Snmp::Opaque(bytes) => Value::Opaque(bytes.clone()),
        Snmp::Counter64(v) => Value::Counter64(*v),
        Snmp::NoSuchObject => Value::NoSuchObject,
        Snmp::NoSuchInstance => Value::NoSuchInstance,
        Snmp::EndOfMibView => Value::EndOfMibView,
        // 라이브러리가 새 타입을 추가해도 트랩 처리는 계속됨
        other => Value::Unknown(format!("{other:?}")),
    }
}
