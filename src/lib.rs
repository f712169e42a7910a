// Library root
// -----------
// This crate exposes the pieces of the interactive blob transfer console.
// The binary (`main.rs`) wires them together.
//
// Module responsibilities:
// - `ui`: console prompts and the transfer menu loop (`Session`).
// - `transfer`: runs one transfer request against a `BlobStore` and times it.
// - `storage`: the `BlobStore` capability trait and the blob handle types.
// - `azure`: `BlobStore` implementation for the Azure Blob REST API.
// - `progress`: the single-line byte counter shown while a transfer runs.
// - `config`: account credentials and connection strings.
// - `error`, `logging`: shared error type and tracing setup.
//
// The menu loop only sees the `BlobStore` trait, so the tests can drive it
// with a fake store instead of a real storage account.
pub mod azure;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod storage;
pub mod transfer;
pub mod ui;

pub use error::{Result, TransferError};
