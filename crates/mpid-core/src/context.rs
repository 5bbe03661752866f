use url::Url;

use crate::CoreError;

/// Per-request view of the incoming URL. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RequestContext {
    url: Url,
}

impl RequestContext {
    /// Reassemble the absolute request URL from the pieces a server sees:
    /// scheme (`X-Forwarded-Proto` or the listener's), authority (`Host`),
    /// and the request target's path and query.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequestUrl`] if the pieces do not form a
    /// URL with a host.
    pub fn from_parts(
        scheme: &str,
        authority: &str,
        path_and_query: &str,
    ) -> Result<Self, CoreError> {
        let raw = format!("{scheme}://{authority}{path_and_query}");
        if authority.trim().is_empty() {
            return Err(CoreError::InvalidRequestUrl {
                url: raw,
                reason: "missing host".to_string(),
            });
        }
        let url = Url::parse(&raw).map_err(|e| CoreError::InvalidRequestUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if url.host_str().is_none() {
            return Err(CoreError::InvalidRequestUrl {
                url: raw,
                reason: "missing host".to_string(),
            });
        }
        Ok(Self { url })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host with the port, if any, as a browser's `location.host` shows it.
    #[must_use]
    pub fn host(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}
