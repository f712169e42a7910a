// Recording fake for `BlobStore`, shared by the integration tests.

#![allow(dead_code)]

use blobshift::error::{Result, TransferError};
use blobshift::progress::LineProgress;
use blobshift::storage::{
    BlobDirectoryRef, BlobRef, BlobStore, ContainerRef, TransferContext, TransferOptions,
    TransferStatus,
};
use blobshift::ui::{LinePrompter, Session};
use reqwest::Url;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    EnsureContainer(String),
    UploadFile {
        source: PathBuf,
        destination: BlobRef,
        parallel: usize,
    },
    UploadDirectory {
        source: PathBuf,
        destination: BlobDirectoryRef,
        recursive: bool,
        parallel: usize,
    },
    CopyFromUrl {
        source: String,
        destination: BlobRef,
        overwrite: bool,
    },
    CopyBlob {
        source: BlobRef,
        destination: BlobRef,
        overwrite: bool,
    },
}

#[derive(Default)]
pub struct FakeStore {
    pub calls: Mutex<Vec<Call>>,
    /// Byte counts reported through the context on every transfer.
    pub progress: Vec<u64>,
    pub delay: Duration,
    pub fail_transfers: bool,
    pub reject_containers: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn transfer_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::EnsureContainer(_)))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn finish(&self, context: &TransferContext) -> Result<TransferStatus> {
        for bytes in &self.progress {
            context.report(TransferStatus {
                bytes_transferred: *bytes,
                files_transferred: 0,
            });
        }
        std::thread::sleep(self.delay);
        if self.fail_transfers {
            return Err(TransferError::Transfer("simulated outage".into()));
        }
        Ok(TransferStatus {
            bytes_transferred: self.progress.iter().copied().max().unwrap_or(0),
            files_transferred: 1,
        })
    }
}

impl BlobStore for FakeStore {
    fn ensure_container(&self, name: &str) -> Result<ContainerRef> {
        self.record(Call::EnsureContainer(name.to_string()));
        if self.reject_containers {
            return Err(TransferError::resolution(
                name,
                TransferError::Service {
                    status: 403,
                    code: Some("AuthenticationFailed".into()),
                    message: "bad key".into(),
                },
            ));
        }
        Ok(ContainerRef {
            name: name.to_string(),
        })
    }

    fn upload_file(
        &self,
        source: &Path,
        destination: &BlobRef,
        options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus> {
        self.record(Call::UploadFile {
            source: source.to_path_buf(),
            destination: destination.clone(),
            parallel: options.parallel_operations.get(),
        });
        self.finish(context)
    }

    fn upload_directory(
        &self,
        source: &Path,
        destination: &BlobDirectoryRef,
        recursive: bool,
        options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus> {
        self.record(Call::UploadDirectory {
            source: source.to_path_buf(),
            destination: destination.clone(),
            recursive,
            parallel: options.parallel_operations.get(),
        });
        self.finish(context)
    }

    fn copy_from_url(
        &self,
        source: &Url,
        destination: &BlobRef,
        overwrite: bool,
        _options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus> {
        self.record(Call::CopyFromUrl {
            source: source.to_string(),
            destination: destination.clone(),
            overwrite,
        });
        self.finish(context)
    }

    fn copy_blob(
        &self,
        source: &BlobRef,
        destination: &BlobRef,
        overwrite: bool,
        _options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus> {
        self.record(Call::CopyBlob {
            source: source.clone(),
            destination: destination.clone(),
            overwrite,
        });
        self.finish(context)
    }
}

pub fn blob(container: &str, name: &str) -> BlobRef {
    BlobRef {
        container: container.into(),
        name: name.into(),
    }
}

pub type ScriptedSession =
    Session<LinePrompter<Cursor<Vec<u8>>, Vec<u8>>, FakeStore, LineProgress<Vec<u8>>>;

/// A session fed by `script`, one answer per line.
pub fn scripted(script: &str, store: FakeStore) -> ScriptedSession {
    let prompter = LinePrompter::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
    Session::new(prompter, store, LineProgress::new(Vec::new()))
}

pub fn console_output(session: &ScriptedSession) -> String {
    String::from_utf8(session.prompter().output().clone()).unwrap()
}

pub fn progress_output(session: &ScriptedSession) -> String {
    String::from_utf8(session.reporter().writer().lock().unwrap().clone()).unwrap()
}
