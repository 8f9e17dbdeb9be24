//! Test helpers shared by the client and wallet API tests.

use std::net::TcpListener;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
use walletkit::Sleeper;

/// Records requested delays and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

/// A local port that nothing listens on.
pub fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// A base URL on a local port that nothing listens on.
pub fn refused_base_url() -> String {
    format!("http://127.0.0.1:{}", refused_port())
}

/// Redirects the listed attempts (1-based) to a refused port, so a single
/// call can mix connection failures with real responses.
#[derive(Debug)]
pub struct RefuseAttempts {
    refused: Vec<u32>,
    port: u16,
    calls: AtomicU32,
}

impl RefuseAttempts {
    pub fn new(refused: &[u32]) -> Self {
        Self {
            refused: refused.to_vec(),
            port: refused_port(),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait::async_trait]
impl rqm::Middleware for RefuseAttempts {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.refused.contains(&attempt) {
            req.url_mut().set_port(Some(self.port)).unwrap();
        }
        next.run(req, extensions).await
    }
}
