#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use brrtchannels::channels::{ChannelResolver, ResolverOptions, Selector};
use brrtchannels::pipeline::{handler_fn, Handler, Next, Pipeline, Request, Response};
use futures::executor::block_on;

/// Selector reading the `x-channel` header
pub fn header_selector() -> Selector {
    Selector::from_fn(|req| req.get_header("x-channel").map(str::to_string))
}

pub fn resolver(channels: &[&str], selector: impl Into<Selector>) -> ChannelResolver {
    ChannelResolver::new(ResolverOptions::new(channels.iter().copied()).selector(selector)).unwrap()
}

/// A pipeline answering `GET path` with `body`
pub fn text_route(path: &str, body: &'static str) -> Pipeline {
    Pipeline::new().get(path, move |_req| Response::text(body))
}

pub fn get(app: &Pipeline, path: &str) -> Response {
    block_on(app.handle(Request::get(path)))
}

/// Plain-text body, or the message of a JSON error body
pub fn message(res: &Response) -> String {
    res.body_text()
        .or_else(|| res.body.get("error").and_then(|v| v.as_str()))
        .unwrap_or_default()
        .to_string()
}

static MAY_INIT: Once = Once::new();

/// Configure the coroutine runtime once per test binary.
///
/// A single worker means every connection shares one thread, so a request that
/// blocks the thread stalls all the others.
pub fn setup_may_runtime() {
    MAY_INIT.call_once(|| {
        may::config().set_stack_size(0x10000);
        may::config().set_workers(1);
    });
}

/// Shared log of which stages saw a request
#[derive(Clone, Default)]
pub struct Trail(Arc<Mutex<Vec<String>>>);

impl Trail {
    /// A stage that records `label` and the path it saw, then continues
    pub fn stage(&self, label: &'static str) -> impl Handler {
        let trail = self.clone();
        handler_fn(move |req: Request, next: Next| {
            trail.0.lock().unwrap().push(format!("{label}:{}", req.path));
            next.run(req)
        })
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|e| e.split(':').next().unwrap_or_default().to_string())
            .collect()
    }
}

pub mod logs {
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    /// Captures events emitted on the current thread while alive
    pub struct CapturedLogs {
        events: Arc<Mutex<Vec<(Level, String)>>>,
        _guard: tracing::subscriber::DefaultGuard,
    }

    struct CaptureLayer(Arc<Mutex<Vec<(Level, String)>>>);

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for CaptureLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), visitor.0));
        }
    }

    impl CapturedLogs {
        pub fn init() -> Self {
            let events = Arc::new(Mutex::new(Vec::new()));
            let subscriber = Registry::default().with(CaptureLayer(Arc::clone(&events)));
            let guard = tracing::subscriber::set_default(subscriber);
            Self {
                events,
                _guard: guard,
            }
        }

        pub fn contains(&self, level: Level, message: &str) -> bool {
            self.events
                .lock()
                .unwrap()
                .iter()
                .any(|(l, m)| *l == level && m.contains(message))
        }
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw request and read one response: `(status, body)`
    pub fn send_request(addr: &SocketAddr, path: &str) -> (u16, String) {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = match stream.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);
            if let Some((head, body)) = split_response(&buf) {
                if body.len() >= content_length(&head) {
                    break;
                }
            }
        }

        let (head, body) = split_response(&buf).expect("complete response head");
        let status = head
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    fn split_response(buf: &[u8]) -> Option<(String, Vec<u8>)> {
        let pos = buf.windows(4).position(|w| w == b"\r\n\r\n")?;
        Some((
            String::from_utf8_lossy(&buf[..pos]).into_owned(),
            buf[pos + 4..].to_vec(),
        ))
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }
}

pub mod server {
    use std::net::{SocketAddr, TcpListener};

    use brrtchannels::pipeline::Pipeline;
    use brrtchannels::server::{ChannelService, HttpServer, ServerHandle};

    /// Serves `app` on a free local port until dropped
    pub struct TestServer {
        handle: Option<ServerHandle>,
    }

    impl TestServer {
        pub fn start(app: Pipeline) -> Self {
            super::setup_may_runtime();
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);
            let handle = HttpServer(ChannelService::new(app)).start(addr).unwrap();
            handle.wait_ready().unwrap();
            Self {
                handle: Some(handle),
            }
        }

        pub fn addr(&self) -> SocketAddr {
            self.handle.as_ref().map(ServerHandle::addr).unwrap()
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }
}
