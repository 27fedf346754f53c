//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `mibtrap_`
//! - 모듈명: `catalog_`, `trap_pipeline_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(mibtrap_core::metrics::TRAP_PIPELINE_TRAPS_PROCESSED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// SNMP 버전 레이블 키 (v1, v2c)
pub const LABEL_VERSION: &str = "version";

/// 싱크 이름 레이블 키
pub const LABEL_SINK: &str = "sink";

/// 실패 종류 레이블 키 (decode, protocol, sink)
pub const LABEL_KIND: &str = "kind";

// ─── MIB Catalog 메트릭 ────────────────────────────────────────────

/// Catalog: 로드된 트랩 레코드 수 (gauge)
pub const CATALOG_RECORDS_LOADED: &str = "mibtrap_catalog_records_loaded";

// ─── Trap Pipeline 메트릭 ──────────────────────────────────────────

/// Trap Pipeline: 수신한 데이터그램 수 (counter)
pub const TRAP_PIPELINE_DATAGRAMS_RECEIVED_TOTAL: &str =
    "mibtrap_trap_pipeline_datagrams_received_total";

/// Trap Pipeline: 길이 0 데이터그램 수 (counter)
pub const TRAP_PIPELINE_EMPTY_DATAGRAMS_TOTAL: &str =
    "mibtrap_trap_pipeline_empty_datagrams_total";

/// Trap Pipeline: 동시 실행 상한 초과로 버린 데이터그램 수 (counter)
pub const TRAP_PIPELINE_DATAGRAMS_DROPPED_TOTAL: &str =
    "mibtrap_trap_pipeline_datagrams_dropped_total";

/// Trap Pipeline: 이벤트로 변환된 트랩 수 (counter, label: version)
pub const TRAP_PIPELINE_TRAPS_PROCESSED_TOTAL: &str =
    "mibtrap_trap_pipeline_traps_processed_total";

/// Trap Pipeline: 워커 실패 수 (counter, label: kind)
pub const TRAP_PIPELINE_WORKER_FAILURES_TOTAL: &str =
    "mibtrap_trap_pipeline_worker_failures_total";

/// Trap Pipeline: 싱크 쓰기 실패 수 (counter, label: sink)
pub const TRAP_PIPELINE_SINK_FAILURES_TOTAL: &str = "mibtrap_trap_pipeline_sink_failures_total";

/// Trap Pipeline: 처리 중인 데이터그램 수 (gauge)
pub const TRAP_PIPELINE_IN_FLIGHT: &str = "mibtrap_trap_pipeline_in_flight";

/// Trap Pipeline: 데이터그램 하나의 처리 시간 (histogram, 초)
pub const TRAP_PIPELINE_PROCESSING_DURATION_SECONDS: &str =
    "mibtrap_trap_pipeline_processing_duration_seconds";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "mibtrap_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "mibtrap_daemon_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 트랩 처리 지연 시간 히스토그램 버킷 (초)
///
/// 100us ~ 10s 범위. 역방향 DNS 조회가 지연의 대부분을 차지합니다.
pub const PROCESSING_DURATION_BUCKETS: [f64; 10] = [
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `mibtrap-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // MIB Catalog
    describe_gauge!(
        CATALOG_RECORDS_LOADED,
        "Number of trap records in the loaded MIB catalog"
    );

    // Trap Pipeline
    describe_counter!(
        TRAP_PIPELINE_DATAGRAMS_RECEIVED_TOTAL,
        "Total number of UDP datagrams received on the trap port"
    );
    describe_counter!(
        TRAP_PIPELINE_EMPTY_DATAGRAMS_TOTAL,
        "Total number of zero-length datagrams skipped"
    );
    describe_counter!(
        TRAP_PIPELINE_DATAGRAMS_DROPPED_TOTAL,
        "Total number of datagrams dropped because the worker limit was reached"
    );
    describe_counter!(
        TRAP_PIPELINE_TRAPS_PROCESSED_TOTAL,
        "Total number of traps decoded and handed to the sinks"
    );
    describe_counter!(
        TRAP_PIPELINE_WORKER_FAILURES_TOTAL,
        "Total number of datagrams whose processing failed"
    );
    describe_counter!(
        TRAP_PIPELINE_SINK_FAILURES_TOTAL,
        "Total number of failed sink writes"
    );
    describe_gauge!(
        TRAP_PIPELINE_IN_FLIGHT,
        "Number of datagrams currently being processed"
    );
    describe_histogram!(
        TRAP_PIPELINE_PROCESSING_DURATION_SECONDS,
        "Time to process a single datagram in seconds"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "mibtrap daemon uptime in seconds");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        CATALOG_RECORDS_LOADED,
        TRAP_PIPELINE_DATAGRAMS_RECEIVED_TOTAL,
        TRAP_PIPELINE_EMPTY_DATAGRAMS_TOTAL,
        TRAP_PIPELINE_DATAGRAMS_DROPPED_TOTAL,
        TRAP_PIPELINE_TRAPS_PROCESSED_TOTAL,
        TRAP_PIPELINE_WORKER_FAILURES_TOTAL,
        TRAP_PIPELINE_SINK_FAILURES_TOTAL,
        TRAP_PIPELINE_IN_FLIGHT,
        TRAP_PIPELINE_PROCESSING_DURATION_SECONDS,
        DAEMON_UPTIME_SECONDS,
        DAEMON_BUILD_INFO,
    ];

    #[test]
    fn all_metrics_start_with_mibtrap_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("mibtrap_"),
                "Metric '{}' does not start with 'mibtrap_' prefix",
                name
            );
        }
    }

    #[test]
    fn counters_end_with_total() {
        let counters = [
            TRAP_PIPELINE_DATAGRAMS_RECEIVED_TOTAL,
            TRAP_PIPELINE_EMPTY_DATAGRAMS_TOTAL,
            TRAP_PIPELINE_DATAGRAMS_DROPPED_TOTAL,
            TRAP_PIPELINE_TRAPS_PROCESSED_TOTAL,
            TRAP_PIPELINE_WORKER_FAILURES_TOTAL,
            TRAP_PIPELINE_SINK_FAILURES_TOTAL,
        ];
        for name in counters {
            assert!(name.ends_with("_total"), "counter '{name}' must end with _total");
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더가 설치되지 않아도 panic하지 않아야 함
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_VERSION, LABEL_SINK, LABEL_KIND] {
            assert_eq!(label.to_lowercase(), label);
        }
    }

    #[test]
    fn processing_duration_buckets_are_sorted() {
        let buckets = PROCESSING_DURATION_BUCKETS;
        for i in 1..buckets.len() {
            assert!(
                buckets[i] > buckets[i - 1],
                "Bucket values must be in ascending order"
            );
        }
    }
}
