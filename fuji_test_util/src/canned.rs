//! A local HTTP server answering every request with a response computed by a closure, used to
//! test the HTTP and JSON-RPC clients without a node or a factory.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tiny_http::{Header, Response, Server};

/// A request received by the [`CannedServer`]
#[derive(Debug, Clone)]
pub struct CannedRequest {
    pub method: String,
    /// Path and query, eg `/preview?amount=1`
    pub url: String,
    pub body: String,
    pub authorization: Option<String>,
}

impl CannedRequest {
    /// The body parsed as json, `Null` if it isn't json
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
}

impl CannedResponse {
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        CannedResponse {
            status,
            body: value.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        CannedResponse {
            status,
            body: body.to_string(),
        }
    }
}

pub struct CannedServer {
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<CannedRequest>>>,
}

impl CannedServer {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&CannedRequest) -> CannedResponse + Send + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(Mutex::new(vec![]));

        let handle = {
            let server = server.clone();
            let running = running.clone();
            let requests = requests.clone();
            thread::spawn(move || loop {
                let mut http_request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(request)) => request,
                    Ok(None) => {
                        if running.load(Ordering::SeqCst) {
                            continue;
                        } else {
                            break;
                        }
                    }
                    Err(err) => {
                        log::error!("recv error: {err}");
                        continue;
                    }
                };

                let mut body = String::new();
                if let Err(e) = http_request.as_reader().read_to_string(&mut body) {
                    log::error!("cannot read request body: {e}");
                }
                let authorization = http_request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_string());
                let request = CannedRequest {
                    method: http_request.method().to_string().to_uppercase(),
                    url: http_request.url().to_string(),
                    body,
                    authorization,
                };
                log::debug!("canned server received {} {}", request.method, request.url);

                let canned = func(&request);
                requests.lock().unwrap().push(request);

                let content_type =
                    Header::from_str("Content-Type: application/json").expect("valid header");
                let response = Response::from_string(canned.body)
                    .with_status_code(canned.status)
                    .with_header(content_type);
                if let Err(e) = http_request.respond(response) {
                    log::error!("cannot respond: {e}");
                }
            })
        };

        CannedServer {
            server,
            handle: Some(handle),
            running,
            requests,
        }
    }

    /// Base url of the server, without trailing slash
    pub fn url(&self) -> String {
        let port = self
            .server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap();
        format!("http://127.0.0.1:{port}")
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<CannedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path() == path).count()
    }
}

impl Drop for CannedServer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("canned server thread panicked");
                // a second panic while unwinding would abort the test binary
                if !thread::panicking() {
                    panic!("canned server thread panicked");
                }
            }
        }
    }
}
