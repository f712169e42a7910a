// Account configuration: turns the account name and key typed at the
// prompt into a connection string, and parses connection strings into a
// `StorageAccount` that the Azure client can sign requests with.

use crate::error::{Result, TransferError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Url;
use std::fmt;

/// Environment variable that replaces the computed blob endpoint, e.g.
/// `http://127.0.0.1:10000/devstoreaccount1` when running against Azurite.
pub const BLOB_ENDPOINT_ENV: &str = "BLOBSHIFT_BLOB_ENDPOINT";

/// Environment variable that replaces the default endpoint suffix.
pub const ENDPOINT_SUFFIX_ENV: &str = "BLOBSHIFT_ENDPOINT_SUFFIX";

pub const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// A parsed storage account: name, decoded key and the blob service URL.
#[derive(Clone)]
pub struct StorageAccount {
    pub name: String,
    pub key: Vec<u8>,
    pub blob_endpoint: Url,
}

// Keep the key out of logs.
impl fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint.as_str())
            .finish()
    }
}

impl StorageAccount {
    /// Build the account from the values typed at the prompt, honouring
    /// the endpoint overrides from the environment.
    pub fn from_credentials(account_name: &str, account_key: &str) -> Result<Self> {
        Self::with_overrides(
            account_name,
            account_key,
            std::env::var(BLOB_ENDPOINT_ENV).ok().as_deref(),
            std::env::var(ENDPOINT_SUFFIX_ENV).ok().as_deref(),
        )
    }

    /// An explicit blob endpoint wins over an endpoint suffix.
    pub fn with_overrides(
        account_name: &str,
        account_key: &str,
        blob_endpoint: Option<&str>,
        endpoint_suffix: Option<&str>,
    ) -> Result<Self> {
        let mut conn = connection_string(account_name, account_key);
        if let Some(endpoint) = blob_endpoint {
            conn.push_str(&format!(";BlobEndpoint={}", endpoint.trim()));
        } else if let Some(suffix) = endpoint_suffix {
            conn.push_str(&format!(";EndpointSuffix={}", suffix.trim()));
        }
        Self::parse(&conn)
    }

    /// Parse a `Key=Value;Key=Value` connection string. Unknown keys are
    /// ignored, keys are matched case-insensitively.
    pub fn parse(connection_string: &str) -> Result<Self> {
        let mut protocol = "https".to_string();
        let mut name = None;
        let mut key = None;
        let mut suffix = DEFAULT_ENDPOINT_SUFFIX.to_string();
        let mut blob_endpoint = None;

        for pair in connection_string.split(';').filter(|p| !p.trim().is_empty()) {
            // Account keys are base64 and may end in '=', so split once.
            let (k, v) = pair.split_once('=').ok_or_else(|| {
                TransferError::Credentials(format!("malformed connection string segment `{pair}`"))
            })?;
            let v = v.trim();
            match k.trim().to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => protocol = v.to_ascii_lowercase(),
                "accountname" => name = Some(v.to_string()),
                "accountkey" => key = Some(v.to_string()),
                "endpointsuffix" => suffix = v.to_string(),
                "blobendpoint" => blob_endpoint = Some(v.to_string()),
                _ => {}
            }
        }

        let name = name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| TransferError::Credentials("account name is empty".into()))?;
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !valid_chars || !(3..=24).contains(&name.len()) {
            return Err(TransferError::Credentials(format!(
                "account name `{name}` must be 3-24 lowercase letters and digits"
            )));
        }
        let key = key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TransferError::Credentials("account key is empty".into()))?;
        let key = STANDARD
            .decode(key.as_bytes())
            .map_err(|e| TransferError::Credentials(format!("account key is not valid base64: {e}")))?;

        if protocol != "https" && protocol != "http" {
            return Err(TransferError::Credentials(format!(
                "unsupported endpoint protocol `{protocol}`"
            )));
        }

        let endpoint = blob_endpoint.unwrap_or_else(|| format!("{protocol}://{name}.blob.{suffix}"));
        let blob_endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|e| TransferError::Credentials(format!("invalid blob endpoint `{endpoint}`: {e}")))?;

        Ok(StorageAccount {
            name,
            key,
            blob_endpoint,
        })
    }
}

/// The connection string the sample builds from the two prompt answers.
pub fn connection_string(account_name: &str, account_key: &str) -> String {
    format!(
        "DefaultEndpointsProtocol=https;AccountName={};AccountKey={}",
        account_name.trim(),
        account_key.trim()
    )
}
