//! Health probe capability.
//!
//! Issues a single HTTP GET against the monitored server and folds every
//! transport failure into a [`ProbeOutcome`]; probing never returns an error.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use webmon_core::ProbeOutcome;

/// Something that can be asked for one probe outcome.
pub trait Probe {
    fn probe(&self) -> impl Future<Output = ProbeOutcome> + Send;
}

/// HTTP/1.1 probe of `http://{address}{path}`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    address: String,
    path: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(address: impl Into<String>, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            path: path.into(),
            timeout,
        }
    }

    /// Probe a server listening on the loopback interface.
    pub fn local(port: u16, path: impl Into<String>, timeout: Duration) -> Self {
        Self::new(format!("127.0.0.1:{port}"), path, timeout)
    }

    pub fn uri(&self) -> String {
        format!("http://{}{}", self.address, self.path)
    }
}

impl Probe for HttpProbe {
    async fn probe(&self) -> ProbeOutcome {
        http_probe(&self.address, &self.path, self.timeout).await
    }
}

/// Perform an HTTP probe and report the raw status code.
///
/// Any response maps to `Status(code)`, including non-2xx. The whole
/// exchange is bounded by `timeout`; connection and protocol failures
/// map to `Error`. The request target is sent in origin form (`/path`).
pub async fn http_probe(address: &str, path: &str, timeout: Duration) -> ProbeOutcome {
    let uri = format!("http://{address}{path}");
    let target = if path.is_empty() { "/" } else { path };

    let result = tokio::time::timeout(timeout, async {
        let stream = match tokio::net::TcpStream::connect(address).await {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, %uri, "probe connection failed");
                return ProbeOutcome::Error;
            }
        };

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, %uri, "probe handshake failed");
                return ProbeOutcome::Error;
            }
        };

        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = match http::Request::builder()
            .method("GET")
            .uri(target)
            .header("host", address)
            .header("user-agent", "webmon/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
        {
            Ok(req) => req,
            Err(e) => {
                debug!(error = %e, %uri, "invalid probe request");
                return ProbeOutcome::Error;
            }
        };

        match sender.send_request(req).await {
            Ok(resp) => {
                debug!(status = %resp.status(), %uri, "probe response");
                ProbeOutcome::Status(resp.status().as_u16())
            }
            Err(e) => {
                debug!(error = %e, %uri, "probe request failed");
                ProbeOutcome::Error
            }
        }
    })
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(_) => {
            debug!(%uri, ?timeout, "probe timed out");
            ProbeOutcome::Timeout
        }
    }
}
