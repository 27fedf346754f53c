//! 발신 에이전트 역방향 이름 조회
//!
//! 조회 실패는 메시지 생성을 막지 않습니다. 호스트명 없이 주소만 표시합니다.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::debug;

use mibtrap_core::pipeline::BoxFuture;

use crate::error::TrapError;

/// 역방향 이름 조회
///
/// trait object(`Arc<dyn HostResolver>`)로 사용되므로 `BoxFuture`를 반환합니다.
pub trait HostResolver: Send + Sync {
    /// 주소의 호스트명을 조회합니다.
    fn reverse_lookup(&self, addr: IpAddr) -> BoxFuture<'_, Result<String, TrapError>>;
}

/// 블로킹 풀에 동시에 걸어 둘 수 있는 조회 수 기본값
pub const DEFAULT_MAX_PENDING_LOOKUPS: usize = 64;

/// 시스템 리졸버(getnameinfo) 기반 조회
///
/// getnameinfo는 취소할 수 없습니다. 타임아웃이 나면 호출자는 바로 주소로 대체하지만
/// `spawn_blocking` 스레드의 조회는 리졸버가 포기할 때까지 계속 돌고, 그동안 허가 하나를
/// 쥐고 있습니다. 허가가 모두 쓰이면 새 조회는 기다리지 않고 실패하므로, 응답 없는 DNS 서버가
/// 블로킹 풀을 `max_pending`개 넘게 점유하지 않습니다.
#[derive(Debug, Clone)]
pub struct DnsResolver {
    timeout: Duration,
    pending: Arc<Semaphore>,
}

impl DnsResolver {
    pub fn new(timeout: Duration) -> Self {
        Self::with_max_pending(timeout, DEFAULT_MAX_PENDING_LOOKUPS)
    }

    /// 동시 블로킹 조회 수 상한을 지정합니다.
    pub fn with_max_pending(timeout: Duration, max_pending: usize) -> Self {
        Self {
            timeout,
            pending: Arc::new(Semaphore::new(max_pending)),
        }
    }
}

impl HostResolver for DnsResolver {
    fn reverse_lookup(&self, addr: IpAddr) -> BoxFuture<'_, Result<String, TrapError>> {
        let timeout = self.timeout;
        let pending = Arc::clone(&self.pending);
        Box::pin(async move {
            let failed = |reason: String| TrapError::Resolution {
                addr: addr.to_string(),
                reason,
            };

            let permit = pending
                .try_acquire_owned()
                .map_err(|_| failed("too many pending lookups".to_owned()))?;

            // 허가는 타임아웃 이후에도 블로킹 조회가 끝날 때 반납됨
            let lookup = tokio::task::spawn_blocking(move || {
                let result = dns_lookup::lookup_addr(&addr);
                drop(permit);
                result
            });
            let name = tokio::time::timeout(timeout, lookup)
                .await
                .map_err(|_| failed(format!("timed out after {}ms", timeout.as_millis())))?
                .map_err(|e| failed(format!("lookup task failed: {e}")))?
                .map_err(|e| failed(e.to_string()))?;

            // 이름이 없으면 getnameinfo는 숫자 주소를 돌려줌
            if name.is_empty() || name == addr.to_string() {
                return Err(failed("no PTR record".to_owned()));
            }
            Ok(name)
        })
    }
}

/// 조회를 하지 않는 리졸버 (resolver.enabled = false)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl HostResolver for NoopResolver {
    fn reverse_lookup(&self, addr: IpAddr) -> BoxFuture<'_, Result<String, TrapError>> {
        Box::pin(async move {
            Err(TrapError::Resolution {
                addr: addr.to_string(),
                reason: "reverse lookup disabled".to_owned(),
            })
        })
    }
}

/// 메시지에 표시하는 에이전트 주소
///
/// `10.0.0.1 (switch01.example)` 또는 `10.0.0.1` 형식으로 표시합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDisplay {
    pub address: String,
    pub hostname: Option<String>,
}

impl HostDisplay {
    /// 주소만 있는 표시값
    pub fn address_only(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            hostname: None,
        }
    }

    /// 조회 결과로 표시값을 만듭니다. 실패는 debug 로그만 남깁니다.
    pub async fn resolve(resolver: &dyn HostResolver, addr: IpAddr, shown: String) -> Self {
        if addr.is_unspecified() {
            return Self::address_only(shown);
        }
        match resolver.reverse_lookup(addr).await {
            Ok(name) => Self {
                address: shown,
                hostname: Some(name),
            },
            Err(e) => {
                debug!(addr = %addr, error = %e, "reverse lookup failed");
                Self::address_only(shown)
            }
        }
    }
}

impl fmt::Display for HostDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hostname {
            Some(name) => write!(f, "{} ({name})", self.address),
            None => f.write_str(&self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    struct FixedResolver(&'static str);

    impl HostResolver for FixedResolver {
        fn reverse_lookup(&self, _addr: IpAddr) -> BoxFuture<'_, Result<String, TrapError>> {
            let name = self.0.to_owned();
            Box::pin(async move { Ok(name) })
        }
    }

    #[test]
    fn display_with_and_without_hostname() {
        let with = HostDisplay {
            address: "10.0.0.1".to_owned(),
            hostname: Some("switch01".to_owned()),
        };
        assert_eq!(with.to_string(), "10.0.0.1 (switch01)");
        assert_eq!(HostDisplay::address_only("10.0.0.1").to_string(), "10.0.0.1");
    }

    #[tokio::test]
    async fn noop_resolver_falls_back_to_address() {
        let addr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7));
        let shown = HostDisplay::resolve(&NoopResolver, addr, addr.to_string()).await;
        assert_eq!(shown.to_string(), "192.0.2.7");
    }

    #[tokio::test]
    async fn resolved_name_is_shown() {
        let addr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7));
        let shown =
            HostDisplay::resolve(&FixedResolver("core-sw"), addr, addr.to_string()).await;
        assert_eq!(shown.hostname.as_deref(), Some("core-sw"));
    }

    #[tokio::test]
    async fn unspecified_address_skips_lookup() {
        let shown = HostDisplay::resolve(
            &FixedResolver("never"),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            "Unknown".to_owned(),
        )
        .await;
        assert_eq!(shown.to_string(), "Unknown");
    }

    #[tokio::test]
    async fn dns_resolver_loopback_never_panics() {
        let resolver = DnsResolver::new(Duration::from_millis(500));
        // 환경에 따라 성공/실패 모두 가능, 실패는 Resolution 에러여야 함
        match resolver.reverse_lookup(IpAddr::V4(Ipv4Addr::LOCALHOST)).await {
            Ok(name) => assert!(!name.is_empty()),
            Err(e) => assert_eq!(e.kind(), "resolution"),
        }
    }

    #[tokio::test]
    async fn dns_resolver_fails_fast_when_lookups_are_saturated() {
        let resolver = DnsResolver::with_max_pending(Duration::from_secs(30), 0);
        let started = std::time::Instant::now();

        let err = resolver
            .reverse_lookup(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7)))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("too many pending lookups"));
        assert!(started.elapsed() < Duration::from_secs(1));
        let addr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7));
        let shown = HostDisplay::resolve(&resolver, addr, addr.to_string()).await;
        assert_eq!(shown.to_string(), "192.0.2.7");
    }
}
