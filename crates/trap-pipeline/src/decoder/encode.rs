//! SNMP 트랩 인코더
//!
//! [`SnmpDecoder`](super::SnmpDecoder)의 역방향 변환입니다. BER 인코딩은 async-snmp가 합니다.
//! `mibtrap trap send`, 통합 테스트, 벤치마크에서 테스트 트랩을 만들 때 사용합니다.

use async_snmp::ber::EncodeBuf;

use super::{Oid, PduType, V1Trap, V2Trap, VERSION_V1, VERSION_V2C, Value, VarBind};

/// SNMPv1 Trap-PDU 메시지를 인코딩합니다.
pub fn v1_trap(trap: &V1Trap) -> Vec<u8> {
    trap_with_version(VERSION_V1 as i32, trap)
}

/// SNMPv2c 메시지를 인코딩합니다. PDU 태그는 `trap.pdu_type`을 따릅니다.
pub fn v2_pdu(trap: &V2Trap) -> Vec<u8> {
    pdu_with_version(VERSION_V2C as i32, trap)
}

/// Trap-PDU를 임의 버전 필드로 감쌉니다.
pub fn trap_with_version(version: i32, trap: &V1Trap) -> Vec<u8> {
    let pdu = async_snmp::TrapV1Pdu {
        enterprise: oid_to(&trap.enterprise),
        agent_addr: trap.agent_addr.octets(),
        generic_trap: trap.generic,
        specific_trap: trap.specific,
        time_stamp: trap.timestamp,
        varbinds: trap.varbinds.iter().filter_map(varbind_to).collect(),
    };
    message(version, &trap.community, |buf| pdu.encode(buf))
}

/// v2 형식 PDU를 임의 버전 필드로 감쌉니다.
///
/// `PduType::Trap`은 v2 형식으로 표현할 수 없어 SNMPv2-Trap으로 인코딩합니다.
pub fn pdu_with_version(version: i32, trap: &V2Trap) -> Vec<u8> {
    let pdu = async_snmp::Pdu {
        pdu_type: pdu_type_to(trap.pdu_type),
        request_id: trap.request_id,
        error_status: trap.error_status,
        error_index: trap.error_index,
        varbinds: trap.varbinds.iter().filter_map(varbind_to).collect(),
    };
    message(version, &trap.community, |buf| pdu.encode(buf))
}

/// SEQUENCE { version, community, PDU }
///
/// `EncodeBuf`는 뒤에서부터 쌓으므로 PDU를 먼저 넣습니다.
fn message(version: i32, community: &str, pdu: impl FnOnce(&mut EncodeBuf)) -> Vec<u8> {
    let mut buf = EncodeBuf::new();
    buf.push_sequence(|buf| {
        pdu(buf);
        buf.push_octet_string(community.as_bytes());
        buf.push_integer(version);
    });
    buf.finish().to_vec()
}

fn oid_to(oid: &Oid) -> async_snmp::Oid {
    async_snmp::Oid::from_slice(oid.arcs())
}

fn pdu_type_to(pdu_type: PduType) -> async_snmp::PduType {
    use async_snmp::PduType as Snmp;

    match pdu_type {
        PduType::Get => Snmp::GetRequest,
        PduType::GetNext => Snmp::GetNextRequest,
        PduType::Response => Snmp::Response,
        PduType::Set => Snmp::SetRequest,
        PduType::GetBulk => Snmp::GetBulkRequest,
        PduType::Inform => Snmp::InformRequest,
        PduType::Trap | PduType::V2Trap => Snmp::TrapV2,
        PduType::Report => Snmp::Report,
    }
}

/// 라이브러리에 대응 타입이 없는 값(`Value::Unknown`)은 건너뜁니다.
fn varbind_to(vb: &VarBind) -> Option<async_snmp::VarBind> {
    use async_snmp::Value as Snmp;

    let value = match &vb.value {
        Value::Integer32(v) => Snmp::Integer(*v),
        Value::OctetString(bytes) => Snmp::OctetString(bytes.clone()),
        Value::Null => Snmp::Null,
        Value::ObjectId(oid) => Snmp::ObjectIdentifier(oid_to(oid)),
        Value::IpAddress(addr) => Snmp::IpAddress(addr.octets()),
        Value::Counter32(v) => Snmp::Counter32(*v),
        Value::Gauge32(v) => Snmp::Gauge32(*v),
        Value::TimeTicks(v) => Snmp::TimeTicks(*v),
        Value::Opaque(bytes) => Snmp::Opaque(bytes.clone()),
        Value::Counter64(v) => Snmp::Counter64(*v),
        Value::NoSuchObject => Snmp::NoSuchObject,
        Value::NoSuchInstance => Snmp::NoSuchInstance,
        Value::EndOfMibView => Snmp::EndOfMibView,
        Value::Unknown(_) => return None,
    };
    Some(async_snmp::VarBind::new(oid_to(&vb.oid), value))
}
