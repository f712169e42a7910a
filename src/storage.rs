// Storage capability interface. The dispatcher and the transfer invoker
// only ever talk to a `BlobStore`; `azure::AzureBlobClient` is the real
// implementation and the tests plug in a recording fake.

use crate::error::Result;
use reqwest::Url;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

/// A container that is known to exist (it was created if absent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    pub name: String,
}

impl ContainerRef {
    pub fn blob(&self, name: &str) -> BlobRef {
        BlobRef {
            container: self.name.clone(),
            name: name.to_string(),
        }
    }

    /// A virtual directory inside the container. An empty prefix is the
    /// container root.
    pub fn directory(&self, prefix: &str) -> BlobDirectoryRef {
        BlobDirectoryRef {
            container: self.name.clone(),
            prefix: prefix.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub container: String,
    pub name: String,
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

/// Blobs sharing a name prefix, standing in for a filesystem directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobDirectoryRef {
    pub container: String,
    pub prefix: String,
}

impl BlobDirectoryRef {
    /// Blob name for a file at `relative` (forward-slash separated) below
    /// the directory.
    pub fn blob_name(&self, relative: &str) -> String {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            relative.to_string()
        } else {
            format!("{prefix}/{relative}")
        }
    }
}

/// Cumulative progress of one transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStatus {
    pub bytes_transferred: u64,
    pub files_transferred: u64,
}

pub type ProgressHandler = Arc<dyn Fn(TransferStatus) + Send + Sync>;

/// Per-operation settings handed to the store along with the request.
#[derive(Clone, Default)]
pub struct TransferContext {
    pub progress: Option<ProgressHandler>,
}

impl TransferContext {
    pub fn with_progress(handler: ProgressHandler) -> Self {
        TransferContext {
            progress: Some(handler),
        }
    }

    pub fn report(&self, status: TransferStatus) {
        if let Some(handler) = &self.progress {
            handler(status);
        }
    }
}

impl fmt::Debug for TransferContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferContext")
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    pub parallel_operations: NonZeroUsize,
}

impl TransferOptions {
    pub fn new(parallel_operations: NonZeroUsize) -> Self {
        TransferOptions {
            parallel_operations,
        }
    }
}

impl Default for TransferOptions {
    /// Eight operations per available core.
    fn default() -> Self {
        let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let parallel = NonZeroUsize::new(cores.saturating_mul(8)).unwrap_or(NonZeroUsize::MIN);
        TransferOptions::new(parallel)
    }
}

/// Everything the console flows need from a blob service.
///
/// Each transfer method blocks until the service reports completion and
/// returns the final status.
pub trait BlobStore {
    /// Create the container if it does not exist yet. Always issues the
    /// create call, so it is safe to call repeatedly.
    fn ensure_container(&self, name: &str) -> Result<ContainerRef>;

    fn upload_file(
        &self,
        source: &Path,
        destination: &BlobRef,
        options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus>;

    fn upload_directory(
        &self,
        source: &Path,
        destination: &BlobDirectoryRef,
        recursive: bool,
        options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus>;

    /// Server-side copy from an arbitrary URL.
    fn copy_from_url(
        &self,
        source: &Url,
        destination: &BlobRef,
        overwrite: bool,
        options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus>;

    /// Server-side copy between two blobs of this account.
    fn copy_blob(
        &self,
        source: &BlobRef,
        destination: &BlobRef,
        overwrite: bool,
        options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus>;
}
