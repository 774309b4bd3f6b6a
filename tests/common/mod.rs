//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use conf_builder::apply::{CommandOutput, CommandRunner};

pub const GLOBAL_B64: &str = "CWxvZyAvZGV2L2xvZwlsb2NhbDAKCWxvZyAvZGV2L2xvZwlsb2NhbDEgbm90aWNlCgljaHJvb3QgL3Zhci9saWIvaGFwcm94eQoJc3RhdHMgc29ja2V0IC92YXIvbGliL2hhcHJveHkvc3RhdHMgbW9kZSA3NzcgbGV2ZWwgb3BlcmF0b3IKCXN0YXRzIHRpbWVvdXQgMzBzCgl1c2VyIGhhcHJveHkKCWdyb3VwIGhhcHJveHkKCWRhZW1vbgogICAgICAgIGxvZyAxMC4xMDAuMTMyLjIyMyBsb2NhbDIKICAgICAgICBsb2ctc2VuZC1ob3N0bmFtZQoKCSMgRGVmYXVsdCBTU0wgbWF0ZXJpYWwgbG9jYXRpb25zCgljYS1iYXNlIC9ldGMvc3NsL2NlcnRzCgljcnQtYmFzZSAvZXRjL3NzbC9wcml2YXRlCgoJIyBEZWZhdWx0IGNpcGhlcnMgdG8gdXNlIG9uIFNTTC1lbmFibGVkIGxpc3RlbmluZyBzb2NrZXRzLgoJIyBGb3IgbW9yZSBpbmZvcm1hdGlvbiwgc2VlIGNpcGhlcnMoMVNTTCkuCglzc2wtZGVmYXVsdC1iaW5kLWNpcGhlcnMga0VFQ0RIK2FSU0ErQUVTOmtSU0ErQUVTOitBRVMyNTY6UkM0LVNIQToha0VESDohTE9XOiFFWFA6IU1ENTohYU5VTEw6IWVOVUxM";

pub const DEFAULTS_B64: &str = "bG9nCWdsb2JhbAp0aW1lb3V0IGNvbm5lY3QgNTAwMAp0aW1lb3V0IGNsaWVudCAgNTAwMDAKdGltZW91dCBzZXJ2ZXIgIDUwMDAw";

pub const FRONTEND_STATIC: &str = r#"    option forwardfor
    option http-server-close
        log     global
        mode    http
        option  httplog
        option  dontlognull
        errorfile 400 /etc/haproxy/errors/400.http
        errorfile 403 /etc/haproxy/errors/403.http
        errorfile 408 /etc/haproxy/errors/408.http
        errorfile 500 /etc/haproxy/errors/500.http
        errorfile 502 /etc/haproxy/errors/502.http
        errorfile 503 /etc/haproxy/errors/503.http
        errorfile 504 /etc/haproxy/errors/504.http
    acl network_allowed src -f /etc/haproxy/pingdom.ip
    acl restricted_page path_beg /systemHealth
    acl host_s3_docs hdr(host) -i docs-admin.layered.com
    acl host_apiary_docs hdr(host) -i docs.layered.com
    http-request deny if restricted_page !network_allowed
    reqadd X-Forwarded-Proto:\ https
    use_backend s3_docs_http if host_s3_docs
    use_backend apiary_docs_http if host_apiary_docs
    default_backend backend_api"#;

pub const BACKEND_STATIC: &str = r#"    option httpchk GET /systemHealth
    http-check expect string "success":true"#;

pub const NODE_A: &str = "f52104961dc6726a65b4b100e9c3f57c3b0060f97a4654b2eee9b2b8ceb00e1d";
pub const NODE_B: &str = "22c8fe2e391327e0380474c608841783863160cdad50ddc174490688f588537d";

/// One canned reply.
#[derive(Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub index: Option<u64>,
    pub delay: Duration,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into(), index: None, delay: Duration::ZERO }
    }

    pub fn status(status: u16) -> Self {
        Self { status, body: String::new(), index: None, delay: Duration::ZERO }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Registry stand-in keyed by request path. Unknown paths answer 404.
#[derive(Clone, Default)]
pub struct MockRegistry {
    routes: Arc<Mutex<HashMap<String, MockResponse>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockRegistry {
    pub fn set(&self, path: &str, response: MockResponse) {
        self.routes.lock().unwrap().insert(path.to_string(), response);
    }

    pub fn remove(&self, path: &str) {
        self.routes.lock().unwrap().remove(path);
    }

    /// Every request seen so far, as path plus query.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.split('?').next() == Some(path))
            .collect()
    }

    /// Serve on an ephemeral port and return its base URL.
    pub async fn start(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(self.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        format!("http://{}", addr)
    }
}

async fn handle(State(mock): State<MockRegistry>, uri: Uri) -> Response {
    let full = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    mock.requests.lock().unwrap().push(full);

    let reply = mock.routes.lock().unwrap().get(uri.path()).cloned();
    let Some(reply) = reply else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    if let Some(index) = reply.index {
        headers.insert("x-consul-index", HeaderValue::from(index));
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, headers, reply.body).into_response()
}

fn kv_json(key: &str, b64: &str) -> String {
    format!(
        r#"[{{"CreateIndex":115762,"ModifyIndex":115762,"LockIndex":0,"Key":"{}","Flags":0,"Value":"{}"}}]"#,
        key, b64
    )
}

/// Registry content for VIPs `test` and `test2`, both dynamic and mapped to
/// the `test-staging` service with two instances.
pub fn staging_registry() -> MockRegistry {
    let mock = MockRegistry::default();
    mock.set("/v1/kv/apps/haproxy/global", MockResponse::ok(kv_json("apps/haproxy/global", GLOBAL_B64)));
    mock.set("/v1/kv/apps/haproxy/defaults", MockResponse::ok(kv_json("apps/haproxy/defaults", DEFAULTS_B64)));
    mock.set(
        "/v1/kv/apps/haproxy/backend/",
        MockResponse::ok(r#"["apps/haproxy/backend/test/","apps/haproxy/backend/test2/"]"#),
    );

    for vip in ["test", "test2"] {
        let front = format!("/v1/kv/apps/haproxy/frontend/{}", vip);
        mock.set(&format!("{}/bindOptions", front), MockResponse::ok("ssl crt /etc/ssl/private/layered.com.pem no-sslv3"));
        mock.set(&format!("{}/listenPort", front), MockResponse::ok("443"));
        mock.set(&format!("{}/mode", front), MockResponse::ok("http"));
        mock.set(&format!("{}/staticConf", front), MockResponse::ok(FRONTEND_STATIC));

        let back = format!("/v1/kv/apps/haproxy/backend/{}", vip);
        mock.set(&format!("{}/balance", back), MockResponse::ok("roundrobin"));
        mock.set(&format!("{}/catalogMapping", back), MockResponse::ok("test-staging"));
        mock.set(&format!("{}/mode", back), MockResponse::ok("http"));
        mock.set(&format!("{}/staticConf", back), MockResponse::ok(BACKEND_STATIC));
        mock.set(&format!("{}/type", back), MockResponse::ok("dynamic"));
    }

    mock.set(
        "/v1/catalog/service/test-staging",
        MockResponse::ok(format!(
            r#"[
  {{"Node": "{a}", "Address": "10.109.192.82", "ServiceID": "{a}", "ServiceName": "test-staging", "ServiceTags": [], "ServiceAddress": "10.109.192.82", "ServicePort": 8080}},
  {{"Node": "{b}", "Address": "10.109.192.76", "ServiceID": "{b}", "ServiceName": "test-staging", "ServiceTags": [], "ServiceAddress": "10.109.192.76", "ServicePort": 8080}}
]"#,
            a = NODE_A,
            b = NODE_B
        )),
    );
    mock.set(
        "/v1/catalog/services",
        MockResponse::ok(r#"{"consul":[],"test-staging":["v1"]}"#).with_index(42),
    );

    mock
}

/// Answers `diff` by comparing the files in-process, anything else with
/// `reload_status`. Counts reloads.
pub struct CountingRunner {
    reload_status: Option<i32>,
    reloads: Mutex<usize>,
}

impl CountingRunner {
    pub fn new(reload_status: Option<i32>) -> Arc<Self> {
        Arc::new(Self { reload_status, reloads: Mutex::new(0) })
    }

    pub fn reloads(&self) -> usize {
        *self.reloads.lock().unwrap()
    }
}

#[async_trait]
impl CommandRunner for CountingRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        if program == "diff" {
            let same = std::fs::read(&args[0])? == std::fs::read(&args[1])?;
            return Ok(CommandOutput { status: Some(if same { 0 } else { 1 }), output: String::new() });
        }
        *self.reloads.lock().unwrap() += 1;
        Ok(CommandOutput { status: self.reload_status, output: String::new() })
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
