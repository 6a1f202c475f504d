use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{FusionError, FusionResult};
use crate::trace::trace::TraceEvent;

/// JSONL audit trail of fusion runs, one `TraceEvent` per line.
///
/// A trace that cannot be opened or written is reported through `tracing`
/// and otherwise ignored; a run never fails because of its trace.
pub struct TraceLogger {
    sink: Option<TraceSink>,
}

struct TraceSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl TraceSink {
    fn append(&self, event: &TraceEvent) -> FusionResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| FusionError::Io(std::io::Error::other("trace writer lock poisoned")))?;
        serde_json::to_writer(&mut *writer, event)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl TraceLogger {
    /// Append to `path`, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                sink: Some(TraceSink {
                    path: path.to_path_buf(),
                    writer: Mutex::new(BufWriter::new(file)),
                }),
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "trace disabled, cannot open file");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn record(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.append(event) {
            tracing::warn!(path = %sink.path.display(), error = %e, "trace event dropped");
        }
    }
}
