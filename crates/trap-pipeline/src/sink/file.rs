//! 파일 싱크
//!
//! 서비스 시작마다 새 로그 파일을 만들고 이벤트를 추가 기록합니다.
//! 파일명은 시작 시각 기준 `Mon_19_Oct_2026_14_03_05.log` 형식입니다.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use mibtrap_core::pipeline::BoxFuture;

use super::EventSink;
use crate::error::TrapError;
use crate::event::TrapEvent;

const FILE_NAME_FORMAT: &str = "%a_%d_%b_%Y_%H_%M_%S.log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 추가 전용 로그 파일 싱크
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// `log_dir`에 시작 시각으로 이름 붙인 로그 파일을 만듭니다.
    pub async fn create(log_dir: impl AsRef<Path>) -> Result<Self, TrapError> {
        let log_dir = log_dir.as_ref();
        tokio::fs::create_dir_all(log_dir)
            .await
            .map_err(|e| sink_error(format!("create {}: {e}", log_dir.display())))?;

        let name = Local::now().format(FILE_NAME_FORMAT).to_string();
        Self::open(log_dir.join(name)).await
    }

    /// 지정한 파일을 추가 모드로 엽니다.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TrapError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| sink_error(format!("open {}: {e}", path.display())))?;

        info!(path = %path.display(), "file sink opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// 로그 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(event: &TrapEvent) -> String {
        let ts = event.received_at.with_timezone(&Local).format(TIMESTAMP_FORMAT);
        let mut entry = format!("[{ts}|{}] {}\n", event.severity, event.message);
        if event.is_multiline() {
            entry.push_str("---\n");
        }
        entry
    }
}

fn sink_error(reason: String) -> TrapError {
    TrapError::Sink {
        sink: "file".to_owned(),
        reason,
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn write<'a>(&'a self, event: &'a TrapEvent) -> BoxFuture<'a, Result<(), TrapError>> {
        Box::pin(async move {
            let entry = Self::render(event);
            let mut file = self.file.lock().await;
            file.write_all(entry.as_bytes())
                .await
                .map_err(|e| sink_error(e.to_string()))?;
            file.flush().await.map_err(|e| sink_error(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mibtrap_core::types::Severity;
    use std::sync::Arc;

    #[tokio::test]
    async fn creates_timestamped_file_in_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let sink = FileSink::create(&log_dir).await.unwrap();

        assert!(sink.path().starts_with(&log_dir));
        let name = sink.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(".log"));
        assert_eq!(name.matches('_').count(), 6);
    }

    #[tokio::test]
    async fn entries_have_timestamp_and_severity() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::open(dir.path().join("trap.log")).await.unwrap();

        sink.write(&TrapEvent::notice(Severity::Information, "Service started"))
            .await
            .unwrap();
        sink.write(&TrapEvent::notice(Severity::Warning, "SNMP v1\n---"))
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(sink.path()).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("|Information] Service started"));
        assert!(lines[1].ends_with("|Warning] SNMP v1"));
        assert_eq!(lines[2], "---");
        assert_eq!(lines[3], "---");
    }

    #[tokio::test]
    async fn concurrent_writes_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FileSink::open(dir.path().join("trap.log")).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..50 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                let event = TrapEvent::notice(Severity::Warning, format!("trap {i}\nline two"));
                sink.write(&event).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let content = tokio::fs::read_to_string(sink.path()).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 150);
        for chunk in lines.chunks(3) {
            assert!(chunk[0].contains("|Warning] trap "));
            assert_eq!(chunk[1], "line two");
            assert_eq!(chunk[2], "---");
        }
    }

    #[tokio::test]
    async fn open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSink::open(dir.path().join("missing").join("trap.log"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "sink");
    }
}
