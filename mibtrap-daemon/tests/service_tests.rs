//! Service bootstrap and lifecycle tests.
//!
//! Each test builds a temporary mapping file and MIB module, then drives
//! `TrapService` with an in-memory sink.

use std::io;
use std::net::{SocketAddr, UdpSocket as StdUdpSocket};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tempfile::TempDir;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

use mibtrap_core::config::{MibtrapConfig, SinkConfig};
use mibtrap_core::pipeline::BoxFuture;
use mibtrap_core::types::Severity;
use mibtrap_daemon::service::{build_sinks, load_catalog};
use mibtrap_daemon::{ServiceExit, TrapService};
use mibtrap_trap_pipeline::decoder::encode;
use mibtrap_trap_pipeline::{DatagramSource, MemorySink, Oid, SinkSet, V1Trap, Value, VarBind};

const MIB: &str = include_str!("../../crates/mib-catalog/tests/fixtures/contoso-board.mib");
const WAIT: Duration = Duration::from_secs(5);

fn write_fixture(dir: &Path) {
    std::fs::write(dir.join("contoso-board.mib"), MIB).unwrap();
    std::fs::write(
        dir.join("devicemapping.json"),
        r#"{ "ByManufacturer": [ { "Manufacturer": "Contoso Ltd.", "File": "contoso-board.mib" } ] }"#,
    )
    .unwrap();
}

fn config(dir: &Path, manufacturer: &str, bind_addr: &str) -> MibtrapConfig {
    let mut config = MibtrapConfig::default();
    config.listener.bind_addr = bind_addr.to_owned();
    config.catalog.mapping_path = dir.join("devicemapping.json").display().to_string();
    config.catalog.manufacturer = Some(manufacturer.to_owned());
    config.resolver.enabled = false;
    config.sink.log_dir = dir.join("logs").display().to_string();
    config
}

fn free_port() -> u16 {
    let socket = StdUdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

fn memory_sinks() -> (Arc<MemorySink>, SinkSet) {
    let memory = Arc::new(MemorySink::new());
    let sinks = SinkSet::new().with_sink(memory.clone());
    (memory, sinks)
}

fn fan_failure() -> Vec<u8> {
    encode::v1_trap(&V1Trap {
        community: "public".to_owned(),
        enterprise: "1.3.6.1.4.1.55011.2".parse().unwrap(),
        agent_addr: "10.0.0.7".parse().unwrap(),
        generic: 6,
        specific: 10,
        timestamp: 4242,
        varbinds: vec![VarBind::new(
            Oid::new(vec![1, 3, 6, 1, 4, 1, 55011, 1, 1, 0]),
            Value::OctetString(Bytes::from_static(b"FAN2")),
        )],
    })
}

#[tokio::test]
async fn bootstrap_writes_catalog_notice() {
    // Given: a mapping that matches the configured manufacturer
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let (memory, sinks) = memory_sinks();

    // When: bootstrapping the service
    let service = TrapService::bootstrap_with_sinks(
        &config(dir.path(), "Contoso Ltd.", "127.0.0.1:0"),
        sinks,
    )
    .await
    .unwrap();

    // Then: the catalog is loaded and announced
    assert_eq!(service.pipeline().catalog().len(), 4);
    assert_eq!(service.mib().manufacturer, "Contoso Ltd.");
    let events = memory.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Information);
    assert!(events[0].message.starts_with("MIB catalog loaded from "));
    assert!(events[0].message.ends_with("(4 records)"));
}

#[tokio::test]
async fn unmatched_manufacturer_aborts_startup() {
    // Given: a manufacturer missing from the mapping file
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let (memory, sinks) = memory_sinks();

    // When: bootstrapping the service
    let result =
        TrapService::bootstrap_with_sinks(&config(dir.path(), "Fabrikam", "127.0.0.1:0"), sinks)
            .await;

    // Then: startup fails and the failure reaches the sinks
    let err = result.err().expect("bootstrap should fail");
    assert!(err.to_string().contains("Fabrikam"));
    let events = memory.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Error);
    assert!(events[0].message.starts_with("Service failed to start"));
}

#[tokio::test]
async fn run_until_processes_traps_and_stops_gracefully() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let port = free_port();
    let (memory, sinks) = memory_sinks();
    let mut service = TrapService::bootstrap_with_sinks(
        &config(dir.path(), "Contoso Ltd.", &format!("127.0.0.1:{port}")),
        sinks,
    )
    .await
    .unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(async move {
        service
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await
    });

    // catalog notice + "Service started"
    assert!(memory.wait_for_len(2, WAIT).await);
    assert_eq!(memory.events()[1].message, "Service started");

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .send_to(&fan_failure(), ("127.0.0.1", port))
        .await
        .unwrap();
    assert!(memory.wait_for_len(3, WAIT).await);

    let trap = &memory.events()[2];
    assert_eq!(trap.severity, Severity::Warning);
    assert_eq!(trap.event_id, 10);
    assert!(trap.message.contains("A fan stopped spinning"));

    stop_tx.send(()).unwrap();
    let exit = run.await.unwrap().unwrap();
    assert_eq!(exit, ServiceExit::Graceful);

    let events = memory.events();
    let last = events.last().unwrap();
    assert_eq!(last.severity, Severity::Information);
    assert_eq!(last.message, "Service has stopped");
}

/// Receive source whose first receive fails, like a socket torn down under the service.
struct TornDownSource;

impl DatagramSource for TornDownSource {
    fn recv_from<'a>(&'a self, _buf: &'a mut [u8]) -> BoxFuture<'a, io::Result<(usize, SocketAddr)>> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(io::Error::new(io::ErrorKind::NotConnected, "socket closed"))
        })
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok("127.0.0.1:10162".parse().unwrap())
    }
}

#[tokio::test]
async fn receive_failure_ends_run_abnormally() {
    // Given: a service whose receive source fails while running
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let (memory, sinks) = memory_sinks();
    let mut service = TrapService::bootstrap_with(
        &config(dir.path(), "Contoso Ltd.", "127.0.0.1:0"),
        sinks,
        |builder| builder.source(Arc::new(TornDownSource)),
    )
    .await
    .unwrap();

    // When: running with no shutdown request
    let exit = tokio::time::timeout(WAIT, service.run_until(std::future::pending()))
        .await
        .expect("run_until should return after the receive failure")
        .unwrap();

    // Then: the exit is abnormal and the error notice is the last event
    assert_eq!(exit, ServiceExit::Abnormal("socket closed".to_owned()));
    let events = memory.events();
    assert_eq!(events[1].message, "Service started");
    let last = events.last().unwrap();
    assert_eq!(last.severity, Severity::Error);
    assert_eq!(last.message, "Service stopped abnormally: socket closed");
    assert!(!events.iter().any(|e| e.message == "Service has stopped"));
}

#[tokio::test]
async fn bind_conflict_is_reported_as_startup_failure() {
    // Given: the trap port is already taken
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let occupied = StdUdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = occupied.local_addr().unwrap().to_string();
    let (memory, sinks) = memory_sinks();
    let mut service =
        TrapService::bootstrap_with_sinks(&config(dir.path(), "Contoso Ltd.", &addr), sinks)
            .await
            .unwrap();

    // When: running the service
    let result = service.run_until(std::future::pending()).await;

    // Then: run fails before "Service started" is written
    assert!(result.is_err());
    let events = memory.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].severity, Severity::Error);
    assert!(events[1].message.starts_with("Service failed to start"));
}

#[tokio::test]
async fn build_sinks_follows_sink_section() {
    let dir = TempDir::new().unwrap();
    let config = SinkConfig {
        log_dir: dir.path().join("logs").display().to_string(),
        file_log: true,
        event_log: true,
    };

    let sinks = build_sinks(&config).await.unwrap();

    assert_eq!(sinks.names(), vec!["event_log", "file"]);
    let files = std::fs::read_dir(dir.path().join("logs")).unwrap().count();
    assert_eq!(files, 1);
}

#[tokio::test]
async fn build_sinks_can_disable_everything() {
    let config = SinkConfig {
        log_dir: "unused".to_owned(),
        file_log: false,
        event_log: false,
    };
    assert!(build_sinks(&config).await.unwrap().is_empty());
}

#[tokio::test]
async fn load_catalog_reports_missing_module() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("devicemapping.json"),
        r#"{ "ByManufacturer": [ { "Manufacturer": "Contoso Ltd.", "File": "missing.mib" } ] }"#,
    )
    .unwrap();
    let config = config(dir.path(), "Contoso Ltd.", "127.0.0.1:0");

    let err = load_catalog(&config.catalog).await.unwrap_err();
    assert!(err.to_string().contains("missing.mib"));
}
