use url::Url;

use crate::errors::{FloorbError, Result};

/// Parse an actor or object identifier into an absolute URI.
///
/// Relative references and anything without a scheme are rejected with
/// `InvalidIri`. The returned `Url` is the normalized form used as the
/// membership key of the follow graph.
pub fn parse_iri(iri: &str) -> Result<Url> {
    if iri.trim().is_empty() {
        return Err(FloorbError::invalid_iri(iri, "empty identifier"));
    }

    let parsed = Url::parse(iri).map_err(|e| FloorbError::invalid_iri(iri, e))?;
    if parsed.scheme().is_empty() {
        return Err(FloorbError::invalid_iri(iri, "missing scheme"));
    }
    if parsed.has_authority() && parsed.host_str().map_or(true, str::is_empty) {
        return Err(FloorbError::invalid_iri(iri, "missing host"));
    }

    Ok(parsed)
}
