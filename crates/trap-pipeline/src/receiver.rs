//! UDP 수신 루프
//!
//! 루프는 수신에서만 대기합니다. 디코딩은 하지 않고 데이터그램마다 작업을 제출합니다.
//! 취소 토큰이 발동하면 대기 중인 수신을 버리고 정상 종료합니다.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use mibtrap_core::pipeline::BoxFuture;

use crate::sink::EVENT_TARGET;
use crate::submit::WorkSubmitter;
use crate::worker::{self, TrapContext};

/// 수신 루프 종료 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// 정지 요청에 의한 종료
    Cancelled,
    /// 실행 중 수신 실패
    Failed(String),
}

/// 데이터그램 수신원
///
/// 기본은 바인드된 [`UdpSocket`]입니다. 테스트는 수신 실패를 흉내 내는 구현을 넣을 수 있습니다.
pub trait DatagramSource: Send + Sync {
    /// 데이터그램 하나를 `buf`에 받아 길이와 발신자를 반환합니다.
    fn recv_from<'a>(&'a self, buf: &'a mut [u8]) -> BoxFuture<'a, io::Result<(usize, SocketAddr)>>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl DatagramSource for UdpSocket {
    fn recv_from<'a>(&'a self, buf: &'a mut [u8]) -> BoxFuture<'a, io::Result<(usize, SocketAddr)>> {
        Box::pin(UdpSocket::recv_from(self, buf))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}

pub(crate) struct ReceiveLoop {
    pub source: Arc<dyn DatagramSource>,
    pub context: Arc<TrapContext>,
    pub submitter: Arc<dyn WorkSubmitter>,
    pub running: Arc<AtomicBool>,
    pub cancel: CancellationToken,
    pub max_datagram_size: usize,
}

impl ReceiveLoop {
    pub(crate) async fn run(self) -> LoopExit {
        let local = self
            .source
            .local_addr()
            .map_or_else(|_| "unknown".to_owned(), |a| a.to_string());
        info!(addr = %local, "trap receive loop started");

        let mut buf = vec![0u8; self.max_datagram_size];
        let exit = loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break LoopExit::Cancelled,
                result = self.source.recv_from(&mut buf) => match result {
                    Ok((len, source)) => self.dispatch(&buf[..len], source),
                    Err(e) => {
                        // 정지 중 소켓 에러는 정상 종료
                        if !self.running.load(Ordering::SeqCst) {
                            break LoopExit::Cancelled;
                        }
                        error!(addr = %local, error = %e, "trap receive failed");
                        break LoopExit::Failed(e.to_string());
                    }
                },
            }
        };

        info!(addr = %local, exit = ?exit, "trap receive loop exited");
        exit
    }

    fn dispatch(&self, datagram: &[u8], source: SocketAddr) {
        let stats = &self.context.stats;
        stats.record_received();

        // 워커 없이 이벤트 로그에 경고 한 줄만 남김
        if datagram.is_empty() {
            stats.record_empty();
            warn!(target: EVENT_TARGET, source = %source, "Zero length trap received from {source}");
            return;
        }

        let work = worker::handle_datagram(
            Arc::clone(&self.context),
            Bytes::copy_from_slice(datagram),
            source,
        );
        if !self.submitter.submit(Box::pin(work)) {
            stats.record_dropped();
            warn!(
                target: EVENT_TARGET,
                source = %source,
                len = datagram.len(),
                "Trap from {source} dropped: worker limit reached"
            );
        }
    }
}
