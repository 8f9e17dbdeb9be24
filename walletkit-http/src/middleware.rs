//! Request logging middleware that never prints a secret.
//!
//! [`RedactedLogging`] sits in the `reqwest-middleware` stack of every
//! [`ResilientClient`](crate::ResilientClient) and emits one `debug` event
//! per attempt before sending and one after the response (or transport
//! error) arrives. Header values pass through
//! [`redact_headers`] first.

use std::time::Instant;

use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
use tracing::debug;
use walletkit::redact_headers;

use crate::response::header_list;

/// Logs each outgoing attempt with redacted headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedactedLogging;

#[async_trait::async_trait]
impl rqm::Middleware for RedactedLogging {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        debug!(
            %method,
            %url,
            headers = ?redact_headers(&header_list(req.headers())),
            "Sending request"
        );

        let started = Instant::now();
        let result = next.run(req, extensions).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(response) => debug!(
                %method,
                %url,
                status = response.status().as_u16(),
                ?elapsed,
                "Received response"
            ),
            Err(err) => debug!(%method, %url, error = %err, ?elapsed, "Request failed"),
        }
        result
    }
}
