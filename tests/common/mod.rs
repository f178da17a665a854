#![allow(dead_code)]

pub mod test_server {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::Once;
    use std::time::Duration;

    use webapi_router::{HttpServer, ServerHandle, WebApi};

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// Serve `api` on an ephemeral localhost port
    pub fn start_api(api: WebApi) -> ServerHandle {
        setup_may_runtime();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let handle = HttpServer::new(api).start(addr).unwrap();
        handle.wait_ready().unwrap();
        handle
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Parsed raw HTTP response
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap_or_default()
        }
    }

    pub fn parse_response(resp: &str) -> RawResponse {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        RawResponse {
            status,
            headers,
            body: body.to_string(),
        }
    }

    pub fn request(addr: &SocketAddr, method: &str, path: &str, body: Option<&str>) -> RawResponse {
        let req = match body {
            Some(b) => format!(
                "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{b}",
                b.len()
            ),
            None => format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
        };
        parse_response(&send_request(addr, &req))
    }
}

pub mod resources {
    use std::sync::Arc;

    use webapi_router::{
        Capabilities, Reply, RequestContext, Resource, SupportsDelete, SupportsGet, SupportsPost,
        SupportsPut,
    };

    /// Answers every method with its name and the `id` parameter
    pub struct Echo;

    fn echo(method: &str, ctx: &RequestContext) -> Reply {
        Reply::ok(serde_json::json!({
            "method": method,
            "id": ctx.parameter("id"),
        }))
    }

    impl SupportsGet for Echo {
        fn get(&self, ctx: &RequestContext) -> Reply {
            echo("GET", ctx)
        }
    }

    impl SupportsPost for Echo {
        fn post(&self, ctx: &RequestContext) -> Reply {
            echo("POST", ctx)
        }
    }

    impl SupportsPut for Echo {
        fn put(&self, ctx: &RequestContext) -> Reply {
            echo("PUT", ctx)
        }
    }

    impl SupportsDelete for Echo {
        fn delete(&self, ctx: &RequestContext) -> Reply {
            echo("DELETE", ctx)
        }
    }

    impl Resource for Echo {
        fn capabilities(self: Arc<Self>) -> Capabilities {
            Capabilities::new()
                .get(&self)
                .post(&self)
                .put(&self)
                .delete(&self)
        }
    }

    /// Serves GET only
    pub struct ReadOnly(pub &'static str);

    impl SupportsGet for ReadOnly {
        fn get(&self, _ctx: &RequestContext) -> Reply {
            Reply::ok(self.0)
        }
    }

    impl Resource for ReadOnly {
        fn capabilities(self: Arc<Self>) -> Capabilities {
            Capabilities::new().get(&self)
        }
    }
}
