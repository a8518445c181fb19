// Per-core report discovery and concurrent collection.
// One collect() call is one poll cycle: fan out a read+parse per report file,
// join, merge. A hard read failure in any one file fails the cycle; dropping
// a core's contribution would corrupt the multi-core sums.

mod parser;

pub use parser::parse_report;

use crate::aggregate;
use crate::models::Snapshot;
use crate::vhosts::VhostRegistry;
use futures_util::future::try_join_all;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fixed per-core naming convention: the base file plus `.N` suffixes for
/// additional cores.
pub const REPORT_BASE_NAME: &str = ".rtreport";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("extapp {app} references unknown vhost {vhost:?}")]
    UnknownExtAppHost { vhost: String, app: String },
}

/// Reads and merges the per-core report files of one poll cycle.
pub struct ReportCollector {
    files: Vec<PathBuf>,
}

impl ReportCollector {
    /// Probes `dir` for `.rtreport` and `.rtreport.N` (N = 1 up to the core
    /// count) and keeps the files that exist. The directory is never listed,
    /// only known candidate paths are checked.
    pub fn discover(dir: &Path, cpu_count: usize) -> Self {
        let mut files = Vec::new();
        let base = dir.join(REPORT_BASE_NAME);
        if base.exists() {
            files.push(base);
        }
        for n in 1..cpu_count.max(1) {
            let candidate = dir.join(format!("{REPORT_BASE_NAME}.{n}"));
            if candidate.exists() {
                files.push(candidate);
            }
        }
        Self { files }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// One poll cycle: read every report concurrently, parse, merge.
    pub async fn collect(&self, registry: &VhostRegistry) -> Result<Snapshot, ReportError> {
        let reads = self.files.iter().map(|path| read_report(path, registry));
        let snapshots = try_join_all(reads).await?;
        Ok(aggregate::merge_snapshots(snapshots))
    }
}

/// Reads and parses one core's report. A missing file, an empty file, and
/// invalid UTF-8 (a racing writer mid-rewrite) contribute an empty snapshot;
/// any other I/O error fails the cycle.
async fn read_report(path: &Path, registry: &VhostRegistry) -> Result<Snapshot, ReportError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::default()),
        Err(e) => {
            return Err(ReportError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let Ok(text) = String::from_utf8(bytes) else {
        tracing::debug!(
            path = %path.display(),
            "report is not valid UTF-8; treating as in-flight rewrite"
        );
        return Ok(Snapshot::default());
    };
    parse_report(&text, registry)
}
