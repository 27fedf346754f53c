//! `mibtrap trap` command handler
//!
//! Encodes a test trap through `decoder::encode` (async-snmp's BER encoder,
//! the same library the daemon decodes with) and sends it as a single UDP datagram. There is no acknowledgement; a
//! successful send only means the datagram left the socket.

use std::io::Write;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use bytes::Bytes;
use serde::Serialize;
use tokio::net::UdpSocket;
use tracing::info;

use mibtrap_core::config::DEFAULT_TRAP_PORT;
use mibtrap_trap_pipeline::decoder::encode;
use mibtrap_trap_pipeline::{Oid, PduType, V1Trap, V2Trap, Value, VarBind};

use crate::cli::{SendArgs, TrapAction, TrapArgs, TrapVersion};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// sysUpTime.0
const SYS_UPTIME_OID: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 3, 0];
/// snmpTrapOID.0
const SNMP_TRAP_OID: &[u32] = &[1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0];

/// Execute the `trap` command.
pub async fn execute(args: TrapArgs, writer: &OutputWriter) -> Result<(), CliError> {
    match args.action {
        TrapAction::Send(send_args) => {
            let report = send(&send_args).await?;
            writer.render(&report)
        }
    }
}

async fn send(args: &SendArgs) -> Result<SendReport, CliError> {
    let datagram = build_datagram(args)?;
    let target = resolve_target(&args.target).await?;

    let bind: SocketAddr = if target.is_ipv4() {
        ([0, 0, 0, 0], 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(bind).await?;
    let sent = socket.send_to(&datagram, target).await?;
    info!(target = %target, bytes = sent, "test trap sent");

    Ok(SendReport {
        target: target.to_string(),
        version: match args.version {
            TrapVersion::V1 => "1",
            TrapVersion::V2c => "2c",
        },
        bytes: sent,
        varbinds: args.vars.len(),
    })
}

/// Accepts `host:port`, `[v6]:port`, or a bare host on the standard trap port.
async fn resolve_target(target: &str) -> Result<SocketAddr, CliError> {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let host = target.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_TRAP_PORT));
    }
    let with_port = if target.contains(':') {
        target.to_owned()
    } else {
        format!("{target}:{DEFAULT_TRAP_PORT}")
    };

    tokio::net::lookup_host(&with_port)
        .await?
        .next()
        .ok_or_else(|| CliError::Command(format!("could not resolve target '{target}'")))
}

fn build_datagram(args: &SendArgs) -> Result<Vec<u8>, CliError> {
    let enterprise: Oid = args.enterprise.parse()?;
    let mut varbinds = Vec::new();

    if args.version == TrapVersion::V2c {
        let specific = u32::try_from(args.specific).map_err(|_| {
            CliError::Command(format!("specific trap code {} must not be negative", args.specific))
        })?;
        let mut trap_oid = enterprise.arcs().to_vec();
        trap_oid.extend([0, specific]);
        varbinds.push(VarBind::new(SYS_UPTIME_OID.into(), Value::TimeTicks(0)));
        varbinds.push(VarBind::new(
            SNMP_TRAP_OID.into(),
            Value::ObjectId(Oid::new(trap_oid)),
        ));
    }
    for var in &args.vars {
        varbinds.push(parse_var(var)?);
    }

    Ok(match args.version {
        TrapVersion::V1 => encode::v1_trap(&V1Trap {
            community: args.community.clone(),
            enterprise,
            agent_addr: args.agent,
            generic: args.generic,
            specific: args.specific,
            timestamp: 0,
            varbinds,
        }),
        TrapVersion::V2c => encode::v2_pdu(&V2Trap {
            community: args.community.clone(),
            pdu_type: PduType::V2Trap,
            request_id: 1,
            error_status: 0,
            error_index: 0,
            varbinds,
        }),
    })
}

/// `OID=TEXT` as an OctetString binding.
fn parse_var(raw: &str) -> Result<VarBind, CliError> {
    let (oid, text) = raw
        .split_once('=')
        .ok_or_else(|| CliError::Command(format!("invalid --var '{raw}': expected OID=TEXT")))?;
    let oid: Oid = oid
        .parse()
        .map_err(|e| CliError::Command(format!("invalid --var '{raw}': {e}")))?;
    Ok(VarBind::new(
        oid,
        Value::OctetString(Bytes::copy_from_slice(text.as_bytes())),
    ))
}

/// Result of `trap send`.
#[derive(Serialize)]
pub struct SendReport {
    pub target: String,
    pub version: &'static str,
    pub bytes: usize,
    pub varbinds: usize,
}

impl Render for SendReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "{} SNMP v{} trap to {} ({} bytes, {} bindings)",
            "Sent".green().bold(),
            self.version,
            self.target,
            self.bytes,
            self.varbinds
        )
    }
}
