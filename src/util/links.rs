use url::Url;

/// Check an item link before handing it to the system opener.
///
/// Only absolute http(s) URLs with a host pass. Anything else could launch
/// a local handler (`file:`, `javascript:`, custom schemes).
pub fn validate_url_for_open(raw: &str) -> Result<Url, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Item has no URL");
    }
    if trimmed.chars().any(char::is_control) {
        return Err("URL contains control characters");
    }

    let url = Url::parse(trimmed).map_err(|_| "Invalid URL")?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err("Only http and https links can be opened");
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("URL has no host");
    }
    Ok(url)
}
