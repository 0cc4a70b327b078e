use crate::request::RequestEnv;
use may_minihttp::Request;
use std::io::Read;
use tracing::{debug, warn};

/// Translate a raw request into the dispatcher's environment snapshot.
///
/// Headers are read before the body, which consumes the request.
pub fn request_env(req: Request) -> RequestEnv {
    let mut builder = RequestEnv::builder(req.method(), req.path());
    let mut header_count = 0usize;
    for header in req.headers() {
        builder = builder.header(header.name, String::from_utf8_lossy(header.value));
        header_count += 1;
    }

    let mut body = Vec::new();
    if let Err(err) = req.body().read_to_end(&mut body) {
        warn!(error = %err, "Request body read failed");
        body.clear();
    }
    debug!(
        header_count,
        body_size_bytes = body.len(),
        "HTTP request parsed"
    );
    builder.body(body).build()
}
