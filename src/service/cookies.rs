use std::{collections::HashMap, path::Path, sync::LazyLock};

use regex::Regex;

use crate::platform::instagram::COOKIE_DOMAIN;

const SESSION_COOKIE: &str = "sessionid";
const CSRF_COOKIE: &str = "csrftoken";
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

static MAGIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#( Netscape)? HTTP Cookie File").expect("magic regex is valid"));

/// The two cookies that make up an authenticated browser session.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub session_id: String,
    pub csrf_token: String,
}

impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSet")
            .field("session_id", &"<redacted>")
            .field("csrf_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Failed to read cookies file: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} does not look like a Mozilla/Netscape format cookies file")]
    MissingHeader(String),
    #[error("invalid Netscape format cookies file at line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Kept as written; expiry is never enforced.
    pub expires: Option<String>,
    pub name: String,
    pub value: String,
}

/// Reads the session cookies from a Netscape cookie file.
///
/// Never fails: unreadable or malformed files, and files without both cookies
/// scoped to `.instagram.com`, all come back as `None`.
pub fn load_credentials(path: &Path) -> Option<CredentialSet> {
    let records = match std::fs::read_to_string(path)
        .map_err(CookieError::from)
        .and_then(|content| parse_cookie_file(&content, &path.display().to_string()))
    {
        Ok(records) => records,
        Err(e) => {
            warn!("Failed to parse cookies file: {}", e);
            return None;
        }
    };

    let credentials = extract_credentials(&records);
    if credentials.is_none() {
        warn!("Missing required cookies ({}, {}) in {}", SESSION_COOKIE, CSRF_COOKIE, path.display());
    }
    credentials
}

pub fn extract_credentials(records: &[CookieRecord]) -> Option<CredentialSet> {
    let mut found: HashMap<&str, &str> = HashMap::new();
    for record in records {
        if record.domain == COOKIE_DOMAIN && (record.name == SESSION_COOKIE || record.name == CSRF_COOKIE) {
            found.insert(record.name.as_str(), record.value.as_str());
        }
    }

    match (found.get(SESSION_COOKIE), found.get(CSRF_COOKIE)) {
        (Some(session_id), Some(csrf_token)) if !session_id.is_empty() && !csrf_token.is_empty() => {
            Some(CredentialSet {
                session_id: session_id.to_string(),
                csrf_token: csrf_token.to_string(),
            })
        }
        _ => None,
    }
}

/// Parses the tab-separated Netscape cookie jar format.
///
/// `source` only appears in error messages.
pub fn parse_cookie_file(content: &str, source: &str) -> Result<Vec<CookieRecord>, CookieError> {
    let mut lines = content.lines();

    let magic = lines.next().unwrap_or_default();
    if !MAGIC_REGEX.is_match(magic) {
        return Err(CookieError::MissingHeader(source.to_string()));
    }

    let mut records = Vec::new();
    for (index, raw) in lines.enumerate() {
        let line_number = index + 2;
        let line = raw.strip_prefix(HTTP_ONLY_PREFIX).unwrap_or(raw);

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('$') {
            continue;
        }

        records.push(parse_record(line).map_err(|reason| CookieError::InvalidLine {
            line: line_number,
            reason,
        })?);
    }

    Ok(records)
}

fn parse_record(line: &str) -> Result<CookieRecord, String> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
    let [domain, include_subdomains, path, secure, expires, name, value] = fields.as_slice() else {
        return Err(format!("expected 7 tab-separated fields, found {}", fields.len()));
    };

    let include_subdomains = *include_subdomains == "TRUE";
    if include_subdomains != domain.starts_with('.') {
        return Err(format!(
            "domain flag does not match domain {}",
            domain
        ));
    }

    let expires = match *expires {
        "" => None,
        value => Some(value.to_string()),
    };

    // A record without a name stores the whole pair in the value column.
    let (name, value) = if name.is_empty() {
        (value.to_string(), String::new())
    } else {
        (name.to_string(), value.to_string())
    };

    Ok(CookieRecord {
        domain: domain.to_string(),
        include_subdomains,
        path: path.to_string(),
        secure: *secure == "TRUE",
        expires,
        name,
        value,
    })
}
