// Azure Blob Storage client. Implements `BlobStore` on top of the Blob
// REST API with a blocking reqwest client and Shared Key signing.
//
// Each blob is moved with a single request; block-list uploads, retries
// and throttling are left to the service defaults.

use crate::config::StorageAccount;
use crate::error::{Result, TransferError};
use crate::storage::{
    BlobDirectoryRef, BlobRef, BlobStore, ContainerRef, TransferContext, TransferOptions,
    TransferStatus,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::blocking::{Body, Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, IF_NONE_MATCH};
use reqwest::{Method, Url};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

type HmacSha256 = Hmac<Sha256>;

pub const API_VERSION: &str = "2021-08-06";

/// How often a pending server-side copy is polled.
pub const COPY_POLL_INTERVAL: Duration = Duration::from_millis(500);

const X_MS_DATE: &str = "x-ms-date";
const X_MS_VERSION: &str = "x-ms-version";
const X_MS_BLOB_TYPE: &str = "x-ms-blob-type";
const X_MS_COPY_SOURCE: &str = "x-ms-copy-source";
const X_MS_COPY_STATUS: &str = "x-ms-copy-status";
const X_MS_COPY_PROGRESS: &str = "x-ms-copy-progress";
const X_MS_COPY_STATUS_DESCRIPTION: &str = "x-ms-copy-status-description";
const X_MS_ERROR_CODE: &str = "x-ms-error-code";

/// Blocking client for one storage account.
#[derive(Clone)]
pub struct AzureBlobClient {
    http: Client,
    account: StorageAccount,
    poll_interval: Duration,
}

impl AzureBlobClient {
    pub fn new(account: StorageAccount) -> Result<Self> {
        // Uploads can take far longer than reqwest's default 30s.
        let http = Client::builder()
            .timeout(Option::<Duration>::None)
            .user_agent(concat!("blobshift/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http_client(account, http))
    }

    /// Use a preconfigured reqwest client (proxy settings, timeouts).
    pub fn with_http_client(account: StorageAccount, http: Client) -> Self {
        AzureBlobClient {
            http,
            account,
            poll_interval: COPY_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn account(&self) -> &StorageAccount {
        &self.account
    }

    pub fn container_url(&self, container: &str) -> Url {
        let mut url = self.account.blob_endpoint.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/{}", urlencoding::encode(container)));
        url
    }

    pub fn blob_url(&self, blob: &BlobRef) -> Url {
        let mut url = self.container_url(&blob.container);
        let path = format!("{}/{}", url.path(), encode_blob_path(&blob.name));
        url.set_path(&path);
        url
    }

    /// Sign and send a request, turning non-success statuses into
    /// `TransferError::Service`.
    fn send(
        &self,
        method: Method,
        url: Url,
        mut headers: HeaderMap,
        body: Option<(Body, u64)>,
    ) -> Result<Response> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        headers.insert(HeaderName::from_static(X_MS_DATE), header_value(&date)?);
        headers.insert(HeaderName::from_static(X_MS_VERSION), HeaderValue::from_static(API_VERSION));

        let content_length = body.as_ref().map_or(0, |(_, len)| *len);
        let to_sign = string_to_sign(&self.account.name, &method, &url, &headers, content_length);
        let signature = sign(&self.account.key, &to_sign)?;
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("SharedKey {}:{}", self.account.name, signature))?,
        );

        debug!(%method, %url, "sending request");
        let mut request = self.http.request(method.clone(), url).headers(headers);
        request = match body {
            Some((body, _)) => request.body(body),
            None if method == Method::HEAD || method == Method::GET => request,
            None => request.body(Vec::<u8>::new()),
        };
        let response = request.send()?;
        check_status(response)
    }

    fn blob_properties(&self, blob: &BlobRef) -> Result<HeaderMap> {
        let response = self.send(Method::HEAD, self.blob_url(blob), HeaderMap::new(), None)?;
        Ok(response.headers().clone())
    }

    /// PUT one file as a block blob, streaming it through `progress`.
    fn put_file(&self, source: &Path, destination: &BlobRef, progress: &Arc<SharedProgress>) -> Result<u64> {
        validate_blob_name(&destination.name)?;
        let metadata = std::fs::metadata(source)?;
        if !metadata.is_file() {
            return Err(TransferError::Transfer(format!(
                "{} is not a regular file",
                source.display()
            )));
        }
        let len = metadata.len();
        let reader = CountingReader {
            inner: File::open(source)?,
            progress: progress.clone(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(X_MS_BLOB_TYPE), HeaderValue::from_static("BlockBlob"));
        self.send(
            Method::PUT,
            self.blob_url(destination),
            headers,
            Some((Body::sized(reader, len), len)),
        )?;
        debug!(source = %source.display(), blob = %destination, bytes = len, "uploaded file");
        Ok(len)
    }

    /// Start a server-side copy into `destination` and wait for it.
    fn copy_into(
        &self,
        source: &str,
        destination: &BlobRef,
        overwrite: bool,
        context: &TransferContext,
    ) -> Result<TransferStatus> {
        validate_blob_name(&destination.name)?;
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(X_MS_COPY_SOURCE), header_value(source)?);
        if !overwrite {
            headers.insert(IF_NONE_MATCH, HeaderValue::from_static("*"));
        }
        let response = self.send(Method::PUT, self.blob_url(destination), headers, None)?;
        let mut headers = response.headers().clone();

        loop {
            let state = CopyState::from_headers(&headers)?;
            match state.status {
                CopyStatus::Pending => {
                    if let Some((copied, _)) = state.progress {
                        context.report(TransferStatus {
                            bytes_transferred: copied,
                            files_transferred: 0,
                        });
                    }
                    std::thread::sleep(self.poll_interval);
                    headers = self.blob_properties(destination)?;
                }
                CopyStatus::Success => {
                    // The initial PUT response carries no size; ask once.
                    let copied = match state.progress {
                        Some((copied, _)) => copied,
                        None => {
                            let props = self.blob_properties(destination)?;
                            CopyState::from_headers(&props)
                                .ok()
                                .and_then(|s| s.progress)
                                .map(|(copied, _)| copied)
                                .or_else(|| header_u64(&props, CONTENT_LENGTH.as_str()))
                                .unwrap_or(0)
                        }
                    };
                    let status = TransferStatus {
                        bytes_transferred: copied,
                        files_transferred: 1,
                    };
                    context.report(status);
                    return Ok(status);
                }
                CopyStatus::Aborted | CopyStatus::Failed => {
                    let description = header_str(&headers, X_MS_COPY_STATUS_DESCRIPTION)
                        .unwrap_or("no description")
                        .to_string();
                    return Err(TransferError::Transfer(format!(
                        "copy to {destination} {}: {description}",
                        state.status.as_str()
                    )));
                }
            }
        }
    }
}

impl BlobStore for AzureBlobClient {
    fn ensure_container(&self, name: &str) -> Result<ContainerRef> {
        validate_container_name(name).map_err(|e| TransferError::resolution(name, e))?;
        let mut url = self.container_url(name);
        url.set_query(Some("restype=container"));
        match self.send(Method::PUT, url, HeaderMap::new(), None) {
            Ok(_) => info!(container = name, "created container"),
            Err(e) if e.service_code() == Some("ContainerAlreadyExists") => {
                debug!(container = name, "container already exists")
            }
            Err(e) => return Err(TransferError::resolution(name, e)),
        }
        Ok(ContainerRef {
            name: name.to_string(),
        })
    }

    fn upload_file(
        &self,
        source: &Path,
        destination: &BlobRef,
        _options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus> {
        let progress = Arc::new(SharedProgress::new(context.clone()));
        self.put_file(source, destination, &progress)?;
        Ok(progress.file_done())
    }

    fn upload_directory(
        &self,
        source: &Path,
        destination: &BlobDirectoryRef,
        recursive: bool,
        options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus> {
        if !source.is_dir() {
            return Err(TransferError::Transfer(format!(
                "{} is not a directory",
                source.display()
            )));
        }
        let files = collect_files(source, recursive)?;
        let progress = Arc::new(SharedProgress::new(context.clone()));
        let workers = options.parallel_operations.get().min(files.len());
        info!(files = files.len(), workers, "uploading directory");

        let next = AtomicUsize::new(0);
        let failures: Mutex<Vec<(PathBuf, TransferError)>> = Mutex::new(Vec::new());
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some((path, relative)) = files.get(index) else {
                        break;
                    };
                    let blob = BlobRef {
                        container: destination.container.clone(),
                        name: destination.blob_name(relative),
                    };
                    match self.put_file(path, &blob, &progress) {
                        Ok(_) => {
                            progress.file_done();
                        }
                        Err(e) => {
                            warn!(file = %path.display(), error = %e, "file upload failed");
                            if let Ok(mut failures) = failures.lock() {
                                failures.push((path.clone(), e));
                            }
                        }
                    }
                });
            }
        });

        let mut failures = failures.into_inner().unwrap_or_else(|e| e.into_inner());
        if failures.is_empty() {
            return Ok(progress.snapshot());
        }
        let failed = failures.len();
        let (path, first) = failures.swap_remove(0);
        Err(TransferError::Transfer(format!(
            "{failed} of {} files failed; first failure {}: {first}",
            files.len(),
            path.display()
        )))
    }

    fn copy_from_url(
        &self,
        source: &Url,
        destination: &BlobRef,
        overwrite: bool,
        _options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus> {
        self.copy_into(source.as_str(), destination, overwrite, context)
    }

    fn copy_blob(
        &self,
        source: &BlobRef,
        destination: &BlobRef,
        overwrite: bool,
        _options: &TransferOptions,
        context: &TransferContext,
    ) -> Result<TransferStatus> {
        validate_blob_name(&source.name)?;
        let source = self.blob_url(source);
        self.copy_into(source.as_str(), destination, overwrite, context)
    }
}

/// Byte and file counters shared by every file of one transfer.
struct SharedProgress {
    bytes: AtomicU64,
    files: AtomicU64,
    context: TransferContext,
}

impl SharedProgress {
    fn new(context: TransferContext) -> Self {
        SharedProgress {
            bytes: AtomicU64::new(0),
            files: AtomicU64::new(0),
            context,
        }
    }

    fn add_bytes(&self, n: u64) {
        let bytes = self.bytes.fetch_add(n, Ordering::SeqCst) + n;
        self.context.report(TransferStatus {
            bytes_transferred: bytes,
            files_transferred: self.files.load(Ordering::SeqCst),
        });
    }

    fn file_done(&self) -> TransferStatus {
        self.files.fetch_add(1, Ordering::SeqCst);
        let status = self.snapshot();
        self.context.report(status);
        status
    }

    fn snapshot(&self) -> TransferStatus {
        TransferStatus {
            bytes_transferred: self.bytes.load(Ordering::SeqCst),
            files_transferred: self.files.load(Ordering::SeqCst),
        }
    }
}

/// Reader that reports every chunk reqwest pulls from the file.
struct CountingReader<R> {
    inner: R,
    progress: Arc<SharedProgress>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.progress.add_bytes(n as u64);
        }
        Ok(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CopyStatus {
    Pending,
    Success,
    Aborted,
    Failed,
}

impl CopyStatus {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CopyStatus::Pending),
            "success" => Some(CopyStatus::Success),
            "aborted" => Some(CopyStatus::Aborted),
            "failed" => Some(CopyStatus::Failed),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Pending => "pending",
            CopyStatus::Success => "success",
            CopyStatus::Aborted => "aborted",
            CopyStatus::Failed => "failed",
        }
    }
}

#[derive(Debug)]
struct CopyState {
    status: CopyStatus,
    progress: Option<(u64, u64)>,
}

impl CopyState {
    fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let raw = header_str(headers, X_MS_COPY_STATUS)
            .ok_or_else(|| TransferError::Transfer("copy response has no x-ms-copy-status".into()))?;
        let status = CopyStatus::parse(raw)
            .ok_or_else(|| TransferError::Transfer(format!("unknown copy status `{raw}`")))?;
        let progress = header_str(headers, X_MS_COPY_PROGRESS).and_then(parse_copy_progress);
        Ok(CopyState { status, progress })
    }
}

/// `x-ms-copy-progress` is `<bytes copied>/<total bytes>`.
fn parse_copy_progress(value: &str) -> Option<(u64, u64)> {
    let (copied, total) = value.split_once('/')?;
    Some((copied.trim().parse().ok()?, total.trim().parse().ok()?))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name).and_then(|v| v.trim().parse().ok())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| TransferError::Input(format!("`{value}` cannot be sent as a header: {e}")))
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let header_code = header_str(response.headers(), X_MS_ERROR_CODE).map(str::to_string);
    let body = response.text().unwrap_or_default();
    let code = header_code.or_else(|| xml_element(&body, "Code"));
    let message = xml_element(&body, "Message")
        .map(|m| m.lines().next().unwrap_or_default().to_string())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();
    Err(TransferError::Service {
        status: status.as_u16(),
        code,
        message,
    })
}

/// Text of the first `<tag>...</tag>` in an error body.
fn xml_element(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].trim().to_string())
}

/// Percent-encode each segment of a blob name, keeping `/` separators.
fn encode_blob_path(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// 3-63 characters of lowercase letters, digits and single hyphens,
/// starting and ending with a letter or digit.
fn validate_container_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let ok = (3..=63).contains(&name.len())
        && valid_chars
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--");
    if ok {
        Ok(())
    } else {
        Err(TransferError::Input(format!(
            "`{name}` is not a valid container name (3-63 lowercase letters, digits or hyphens)"
        )))
    }
}

fn validate_blob_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 1024 {
        return Err(TransferError::Input(format!(
            "blob name must be 1-1024 characters, got {}",
            name.len()
        )));
    }
    Ok(())
}

/// Files below `root` with their `/`-separated path relative to it.
fn collect_files(root: &Path, recursive: bool) -> Result<Vec<(PathBuf, String)>> {
    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }
    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| TransferError::Transfer(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push((entry.into_path(), relative));
    }
    Ok(files)
}

/// Shared Key string-to-sign for the Blob service.
fn string_to_sign(
    account: &str,
    method: &Method,
    url: &Url,
    headers: &HeaderMap,
    content_length: u64,
) -> String {
    let standard = |name: &str| header_str(headers, name).unwrap_or("").to_string();
    let content_length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    let mut ms_headers: Vec<(String, String)> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-ms-"))
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("").trim().to_string(),
            )
        })
        .collect();
    ms_headers.sort();
    let canonical_headers: String = ms_headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    let mut resource = format!("/{}{}", account, url.path());
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in url.query_pairs() {
        params
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into_owned());
    }
    for (name, mut values) in params {
        values.sort();
        resource.push_str(&format!("\n{}:{}", name, values.join(",")));
    }

    [
        method.as_str().to_string(),
        standard("content-encoding"),
        standard("content-language"),
        content_length,
        standard("content-md5"),
        standard("content-type"),
        String::new(), // Date: x-ms-date is used instead
        standard("if-modified-since"),
        standard("if-match"),
        standard("if-none-match"),
        standard("if-unmodified-since"),
        standard("range"),
        format!("{canonical_headers}{resource}"),
    ]
    .join("\n")
}

fn sign(key: &[u8], string_to_sign: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| TransferError::Credentials(format!("unusable account key: {e}")))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> AzureBlobClient {
        let account = StorageAccount::parse(&format!(
            "AccountName=devstoreaccount1;AccountKey=c2VjcmV0a2V5;BlobEndpoint={endpoint}"
        ))
        .unwrap();
        AzureBlobClient::new(account).unwrap()
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(HeaderName::from_static(name), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn blob_urls_encode_segments() {
        let c = client("https://acct.blob.core.windows.net");
        let blob = BlobRef {
            container: "docs".into(),
            name: "reports/q1 summary#1.txt".into(),
        };
        assert_eq!(
            c.blob_url(&blob).as_str(),
            "https://acct.blob.core.windows.net/docs/reports/q1%20summary%231.txt"
        );

        let emulator = client("http://127.0.0.1:10000/devstoreaccount1");
        assert_eq!(
            emulator.container_url("docs").as_str(),
            "http://127.0.0.1:10000/devstoreaccount1/docs"
        );
    }

    #[test]
    fn string_to_sign_for_container_create() {
        let url = Url::parse("http://127.0.0.1:10000/devstoreaccount1/docs?restype=container").unwrap();
        let h = headers(&[
            ("x-ms-version", API_VERSION),
            ("x-ms-date", "Fri, 16 Oct 2026 10:00:00 GMT"),
        ]);
        let expected = "PUT\n\n\n\n\n\n\n\n\n\n\n\n\
                        x-ms-date:Fri, 16 Oct 2026 10:00:00 GMT\n\
                        x-ms-version:2021-08-06\n\
                        /devstoreaccount1/devstoreaccount1/docs\nrestype:container";
        assert_eq!(string_to_sign("devstoreaccount1", &Method::PUT, &url, &h, 0), expected);
    }

    #[test]
    fn string_to_sign_includes_length_and_conditions() {
        let url = Url::parse("https://acct.blob.core.windows.net/docs/a.txt").unwrap();
        let h = headers(&[
            ("x-ms-blob-type", "BlockBlob"),
            ("if-none-match", "*"),
        ]);
        let signed = string_to_sign("acct", &Method::PUT, &url, &h, 11);
        let lines: Vec<&str> = signed.split('\n').collect();
        assert_eq!(lines[0], "PUT");
        assert_eq!(lines[3], "11");
        assert_eq!(lines[9], "*");
        assert_eq!(lines[12], "x-ms-blob-type:BlockBlob");
        assert_eq!(lines[13], "/acct/docs/a.txt");
    }

    #[test]
    fn signature_matches_known_hmac() {
        // HMAC-SHA256("secretkey", "hello") in base64
        assert_eq!(
            sign(b"secretkey", "hello").unwrap(),
            "EiuZ5o3ZyrvUZMlDVQOZytFQeQvNPZT1Jrkvop+3Yrw="
        );
    }

    #[test]
    fn parses_copy_headers() {
        let state = CopyState::from_headers(&headers(&[
            ("x-ms-copy-status", "pending"),
            ("x-ms-copy-progress", "1024/4096"),
        ]))
        .unwrap();
        assert_eq!(state.status, CopyStatus::Pending);
        assert_eq!(state.progress, Some((1024, 4096)));

        assert!(CopyState::from_headers(&HeaderMap::new()).is_err());
        assert!(CopyState::from_headers(&headers(&[("x-ms-copy-status", "weird")])).is_err());
        assert_eq!(parse_copy_progress("abc/10"), None);
    }

    #[test]
    fn extracts_error_fields_from_xml() {
        let body = "<?xml version=\"1.0\"?><Error><Code>AuthenticationFailed</Code>\
                    <Message>Server failed to authenticate the request.\nRequestId:1</Message></Error>";
        assert_eq!(xml_element(body, "Code").as_deref(), Some("AuthenticationFailed"));
        assert!(xml_element(body, "Message").unwrap().starts_with("Server failed"));
        assert_eq!(xml_element(body, "Missing"), None);
    }

    #[test]
    fn container_name_rules() {
        assert!(validate_container_name("mycontainer").is_ok());
        assert!(validate_container_name("my-container-01").is_ok());
        assert!(validate_container_name("ab").is_err());
        assert!(validate_container_name("MyContainer").is_err());
        assert!(validate_container_name("my--container").is_err());
        assert!(validate_container_name("-container").is_err());
    }

    #[test]
    fn collects_files_with_relative_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top.txt"), b"a").unwrap();
        std::fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        std::fs::write(dir.path().join("nested/deeper/leaf.bin"), b"b").unwrap();

        let all: Vec<String> = collect_files(dir.path(), true)
            .unwrap()
            .into_iter()
            .map(|(_, rel)| rel)
            .collect();
        assert_eq!(all, vec!["nested/deeper/leaf.bin", "top.txt"]);

        let shallow: Vec<String> = collect_files(dir.path(), false)
            .unwrap()
            .into_iter()
            .map(|(_, rel)| rel)
            .collect();
        assert_eq!(shallow, vec!["top.txt"]);
    }

    #[test]
    fn counting_reader_reports_cumulative_bytes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let ctx = TransferContext::with_progress(Arc::new(move |s: TransferStatus| {
            sink.lock().unwrap().push(s.bytes_transferred)
        }));
        let mut reader = CountingReader {
            inner: std::io::Cursor::new(vec![0u8; 10]),
            progress: Arc::new(SharedProgress::new(ctx)),
        };
        let mut buf = [0u8; 4];
        while reader.read(&mut buf).unwrap() > 0 {}
        assert_eq!(*seen.lock().unwrap(), vec![4, 8, 10]);
    }
}
