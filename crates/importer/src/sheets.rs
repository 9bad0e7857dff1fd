//! Read-only spreadsheet source.
//!
//! Authenticates with a service-account key file, opens a spreadsheet by id,
//! picks a worksheet by index or title, and returns every data row keyed by
//! the header row. Every remote call is bounded by the configured timeout and
//! reports whether it timed out, failed, or found nothing.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figures_core::coercion::RawRow;
use figures_db::ConfigError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use url::Url;

/// Read-only scopes requested for the access token.
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
];

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Lifetime requested for the signed assertion.
const ASSERTION_TTL_SECS: i64 = 3600;

/// Errors from the spreadsheet reader.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Failed to load credentials from {}: {message}", path.display())]
    Credentials { path: PathBuf, message: String },

    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },

    #[error("{operation} failed: {message}")]
    Failed {
        operation: &'static str,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),
}

/// Spreadsheet reader settings.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Service-account key file.
    pub credentials_path: PathBuf,
    /// Upper bound for each remote call.
    pub timeout: Duration,
}

impl SheetsConfig {
    /// Load settings from the process environment.
    ///
    /// | Env Var           | Default              |
    /// |-------------------|----------------------|
    /// | `GOOGLE_CREDS`    | `./credentials.json` |
    /// | `GSPREAD_TIMEOUT` | `15` (seconds)       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials_path = lookup("GOOGLE_CREDS")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".").join(DEFAULT_CREDENTIALS_PATH));

        let secs = match lookup("GSPREAD_TIMEOUT") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "GSPREAD_TIMEOUT",
                expected: "number of seconds",
                value,
            })?,
        };

        Ok(Self {
            credentials_path,
            timeout: Duration::from_secs(secs),
        })
    }
}

/// Worksheet selector: zero-based position or exact title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorksheetRef {
    Index(usize),
    Title(String),
}

impl std::str::FromStr for WorksheetRef {
    type Err = std::convert::Infallible;

    /// A purely numeric argument is an index; anything else is a title.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Title(s.to_string()),
        })
    }
}

impl std::fmt::Display for WorksheetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Title(t) => f.write_str(t),
        }
    }
}

/// The fields of a service-account key file this reader needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> Result<Self, SheetError> {
        let credentials_error = |message: String| SheetError::Credentials {
            path: path.to_path_buf(),
            message,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| credentials_error(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| credentials_error(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Metadata for one worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetInfo {
    #[serde(default)]
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: usize,
}

/// An opened spreadsheet and its worksheet list.
#[derive(Debug, Clone)]
pub struct Spreadsheet {
    pub id: String,
    pub worksheets: Vec<WorksheetInfo>,
}

impl Spreadsheet {
    /// Pick a worksheet by position or title.
    pub fn worksheet(&self, selector: &WorksheetRef) -> Result<&WorksheetInfo, SheetError> {
        let found = match selector {
            WorksheetRef::Index(i) => self.worksheets.iter().find(|w| w.index == *i),
            WorksheetRef::Title(t) => self.worksheets.iter().find(|w| &w.title == t),
        };
        found.ok_or_else(|| SheetError::NotFound(format!("Worksheet '{selector}'")))
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: WorksheetInfo,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// An authorized, read-only spreadsheet client.
pub struct SheetsClient {
    http: reqwest::Client,
    access_token: String,
    api_base: String,
    timeout: Duration,
}

impl SheetsClient {
    /// Exchange the service-account key for an access token.
    pub async fn authorize(config: &SheetsConfig) -> Result<Self, SheetError> {
        let key = ServiceAccountKey::load(&config.credentials_path)?;
        let assertion = sign_assertion(&key, &config.credentials_path)?;
        let http = reqwest::Client::new();

        let access_token = bounded(config.timeout, "Authorization", async {
            let response = http
                .post(&key.token_uri)
                .form(&[
                    ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                    ("assertion", assertion.as_str()),
                ])
                .send()
                .await
                .map_err(|e| failed("Authorization", e))?;
            let token: TokenResponse = checked(response, "Authorization", "Token endpoint")
                .await?
                .json()
                .await
                .map_err(|e| failed("Authorization", e))?;
            Ok::<_, SheetError>(token.access_token)
        })
        .await?;

        tracing::debug!(client_email = %key.client_email, "Authorized spreadsheet client");

        Ok(Self {
            http,
            access_token,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: config.timeout,
        })
    }

    /// Point the client at a different API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Open a spreadsheet and list its worksheets.
    pub async fn open(&self, spreadsheet_id: &str) -> Result<Spreadsheet, SheetError> {
        const OP: &str = "Opening spreadsheet";
        let mut url = self.url(&["v4", "spreadsheets", spreadsheet_id], OP)?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title,index)");

        let metadata: SpreadsheetMetadata = bounded(self.timeout, OP, async {
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await
                .map_err(|e| failed(OP, e))?;
            checked(response, OP, &format!("Spreadsheet '{spreadsheet_id}'"))
                .await?
                .json()
                .await
                .map_err(|e| failed(OP, e))
        })
        .await?;

        Ok(Spreadsheet {
            id: spreadsheet_id.to_string(),
            worksheets: metadata.sheets.into_iter().map(|s| s.properties).collect(),
        })
    }

    /// Fetch every row of a worksheet as header-keyed records.
    pub async fn fetch_records(
        &self,
        spreadsheet: &Spreadsheet,
        worksheet: &WorksheetInfo,
    ) -> Result<Vec<RawRow>, SheetError> {
        const OP: &str = "Retrieving worksheet data";
        let range = format!("'{}'", worksheet.title.replace('\'', "''"));
        let url = self.url(&["v4", "spreadsheets", &spreadsheet.id, "values", &range], OP)?;

        let values: ValueRange = bounded(self.timeout, OP, async {
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await
                .map_err(|e| failed(OP, e))?;
            checked(response, OP, &format!("Worksheet '{}'", worksheet.title))
                .await?
                .json()
                .await
                .map_err(|e| failed(OP, e))
        })
        .await?;

        Ok(records_from_values(values.values))
    }

    /// Open, select, and fetch in one call.
    pub async fn read_sheet(
        &self,
        spreadsheet_id: &str,
        selector: &WorksheetRef,
    ) -> Result<Vec<RawRow>, SheetError> {
        let spreadsheet = self.open(spreadsheet_id).await?;
        let worksheet = spreadsheet.worksheet(selector)?;
        let records = self.fetch_records(&spreadsheet, worksheet).await?;
        tracing::info!(
            spreadsheet_id,
            worksheet = %worksheet.title,
            rows = records.len(),
            "Fetched worksheet"
        );
        Ok(records)
    }

    fn url(&self, segments: &[&str], operation: &'static str) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| failed(operation, e))?;
        url.path_segments_mut()
            .map_err(|()| SheetError::Failed {
                operation,
                message: format!("API base '{}' cannot carry a path", self.api_base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turn a raw value grid into header-keyed records.
///
/// The first row is the header. Cells missing from the end of a short row
/// read as empty strings; rows with no non-empty cell are dropped.
pub fn records_from_values(values: Vec<Vec<serde_json::Value>>) -> Vec<RawRow> {
    let mut rows = values.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(cell_text).collect();

    rows.filter_map(|row| {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            return None;
        }
        let record: RawRow = header
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(i, name)| (name.clone(), Some(cells.get(i).cloned().unwrap_or_default())))
            .collect();
        Some(record)
    })
    .collect()
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn sign_assertion(key: &ServiceAccountKey, path: &Path) -> Result<String, SheetError> {
    let credentials_error = |message: String| SheetError::Credentials {
        path: path.to_path_buf(),
        message,
    };
    let now = chrono::Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: SCOPES.join(" "),
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_TTL_SECS,
    };
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| credentials_error(format!("invalid private key: {e}")))?;
    encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| credentials_error(format!("cannot sign assertion: {e}")))
}

/// Run `fut`, converting an elapsed deadline into [`SheetError::Timeout`].
async fn bounded<T, F>(timeout: Duration, operation: &'static str, fut: F) -> Result<T, SheetError>
where
    F: Future<Output = Result<T, SheetError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or(Err(SheetError::Timeout {
            operation,
            limit: timeout,
        }))
}

/// Map 404 to [`SheetError::NotFound`] and other non-2xx codes to
/// [`SheetError::Failed`].
async fn checked(
    response: reqwest::Response,
    operation: &'static str,
    what: &str,
) -> Result<reqwest::Response, SheetError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(SheetError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SheetError::Failed {
            operation,
            message: format!("HTTP {}: {body}", status.as_u16()),
        });
    }
    Ok(response)
}

fn failed(operation: &'static str, err: impl std::fmt::Display) -> SheetError {
    SheetError::Failed {
        operation,
        message: err.to_string(),
    }
}
