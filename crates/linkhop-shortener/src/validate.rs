//! Acceptance rules for URLs submitted for shortening.

use crate::LinkError;
use url::Url;

/// Shortest URL worth shortening, in bytes.
pub const MIN_URL_LENGTH: usize = 15;

const DENIED_SCHEMES: [&str; 5] = ["javascript:", "data:", "file:", "vbscript:", "about:"];

/// Extracts the lowercased host of the public base URL a deployment is served
/// under. A bare host such as `sho.rt` is read as `https://sho.rt`.
///
/// Returns `None` when no host can be found.
pub fn public_host(base_url: &str) -> Option<String> {
    let base_url = base_url.trim();
    let parsed = if base_url.contains("://") {
        Url::parse(base_url)
    } else {
        Url::parse(&format!("https://{base_url}"))
    };
    parsed
        .ok()?
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Checks `candidate` in order: non-empty, long enough, absolute with a host,
/// no script-like scheme, not pointing back at `public_host`.
pub fn validate_url(candidate: &str, public_host: Option<&str>) -> Result<(), LinkError> {
    if candidate.is_empty() {
        return Err(LinkError::validation("URL cannot be empty"));
    }

    if candidate.len() < MIN_URL_LENGTH {
        return Err(LinkError::validation(format!(
            "URL must be at least {MIN_URL_LENGTH} characters long"
        )));
    }

    let parsed = Url::parse(candidate).map_err(|_| LinkError::validation("Invalid URL format"))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(LinkError::validation("Invalid URL format"));
    }

    let lowered = candidate.trim_start().to_ascii_lowercase();
    if DENIED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return Err(LinkError::validation("URL contains malicious patterns"));
    }

    if let (Some(own), Some(target)) = (public_host, parsed.host_str()) {
        if target.eq_ignore_ascii_case(own) {
            return Err(LinkError::validation(
                "URL cannot point back to this shortener",
            ));
        }
    }

    Ok(())
}
