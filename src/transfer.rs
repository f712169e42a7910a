// Transfer invoker: one request in, exactly one `BlobStore` call out,
// timed from just before the call until it has returned.

use crate::error::Result;
use crate::storage::{
    BlobDirectoryRef, BlobRef, BlobStore, TransferContext, TransferOptions, TransferStatus,
};
use reqwest::Url;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// The four transfer shapes the console offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRequest {
    File {
        source: PathBuf,
        destination: BlobRef,
    },
    Directory {
        source: PathBuf,
        destination: BlobDirectoryRef,
        recursive: bool,
    },
    Url {
        source: Url,
        destination: BlobRef,
        overwrite: bool,
    },
    Blob {
        source: BlobRef,
        destination: BlobRef,
        overwrite: bool,
    },
}

impl TransferRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            TransferRequest::File { .. } => "file upload",
            TransferRequest::Directory { .. } => "directory upload",
            TransferRequest::Url { .. } => "url copy",
            TransferRequest::Blob { .. } => "blob copy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub elapsed: Duration,
    pub status: TransferStatus,
}

impl TransferOutcome {
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Run `request` against `store`, blocking until the store returns.
pub fn execute<S: BlobStore + ?Sized>(
    store: &S,
    request: &TransferRequest,
    options: &TransferOptions,
    context: &TransferContext,
) -> Result<TransferOutcome> {
    let started = Instant::now();
    let status = match request {
        TransferRequest::File {
            source,
            destination,
        } => store.upload_file(source, destination, options, context)?,
        TransferRequest::Directory {
            source,
            destination,
            recursive,
        } => store.upload_directory(source, destination, *recursive, options, context)?,
        TransferRequest::Url {
            source,
            destination,
            overwrite,
        } => store.copy_from_url(source, destination, *overwrite, options, context)?,
        TransferRequest::Blob {
            source,
            destination,
            overwrite,
        } => store.copy_blob(source, destination, *overwrite, options, context)?,
    };
    let elapsed = started.elapsed();
    info!(
        kind = request.kind(),
        bytes = status.bytes_transferred,
        files = status.files_transferred,
        secs = elapsed.as_secs_f64(),
        "transfer finished"
    );
    Ok(TransferOutcome { elapsed, status })
}
