use crate::model::ScrapeRequest;
use crate::ValidationError;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Validates a scrape request before any network I/O
pub fn validate_request(request: &ScrapeRequest) -> Result<(), ValidationError> {
    validate_url(&request.url)?;
    validate_fields(request)?;
    validate_pagination(request)?;
    validate_timing(request)?;
    Ok(())
}

/// Accepts only absolute http(s) URLs with a host
fn validate_url(raw: &str) -> Result<(), ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|_| ValidationError::InvalidUrl(raw.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(raw.to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl(raw.to_string()));
    }

    Ok(())
}

fn validate_fields(request: &ScrapeRequest) -> Result<(), ValidationError> {
    if request.fields.is_empty() {
        return Err(ValidationError::NoFields);
    }

    let mut seen = HashSet::new();
    for (i, field) in request.fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            return Err(ValidationError::EmptyFieldName(i + 1));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(ValidationError::DuplicateField(field.name.clone()));
        }
    }

    Ok(())
}

fn validate_pagination(request: &ScrapeRequest) -> Result<(), ValidationError> {
    if request.pagination.enabled && request.pagination.max_pages < 1 {
        return Err(ValidationError::InvalidPagination(format!(
            "max_pages must be >= 1, got {}",
            request.pagination.max_pages
        )));
    }
    Ok(())
}

fn validate_timing(request: &ScrapeRequest) -> Result<(), ValidationError> {
    if request.timeout_seconds == 0 {
        return Err(ValidationError::InvalidTiming(
            "timeout_seconds must be > 0".to_string(),
        ));
    }

    page_delay(request)?;
    Ok(())
}

/// The pause between two pages of a request
///
/// Fails for negative or non-finite delays and for delays too large to
/// represent as a `Duration`.
pub fn page_delay(request: &ScrapeRequest) -> Result<Duration, ValidationError> {
    if request.delay_seconds < 0.0 {
        return Err(ValidationError::InvalidTiming(format!(
            "delay_seconds must be a non-negative number, got {}",
            request.delay_seconds
        )));
    }

    Duration::try_from_secs_f64(request.delay_seconds).map_err(|_| {
        ValidationError::InvalidTiming(format!(
            "delay_seconds is out of range, got {}",
            request.delay_seconds
        ))
    })
}
