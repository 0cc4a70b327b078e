//! # HTTP adapter
//!
//! Serves a [`Dispatcher`](crate::dispatcher::Dispatcher) over
//! `may_minihttp`. Each request becomes a
//! [`RequestEnv`](crate::request::RequestEnv), runs through
//! [`Dispatcher::run`](crate::dispatcher::Dispatcher::run) on the
//! connection's coroutine, and the resulting status, headers and body are
//! written back.
//!
//! ## Memory
//!
//! `may_minihttp` only accepts `'static` header lines. Repeated lines are
//! interned in a table of at most [`MAX_INTERNED_HEADER_LINES`] entries.
//! `Set-Cookie` and `Location` lines are leaked per response, at most
//! [`MAX_LEAKED_HEADER_BYTES`] in total; past either bound the header is
//! dropped with a warning. `X-Request-Id` changes with every request and
//! stays off the wire; it is in the logs and on the dispatcher's
//! [`Response`](crate::dispatcher::Response).
//!
//! Bodies are buffered: the writer only takes a complete `Vec<u8>`, so a
//! [`Body::File`](crate::dispatcher::Body::File) is read whole into memory
//! before it is sent, and peak memory per request is the size of the file.
//! Chunked streaming with bounded memory holds for
//! [`copy_chunked`](crate::static_files::copy_chunked) into any other
//! writer.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle, READY_TIMEOUT};
pub use request::request_env;
pub use response::{
    intern_header_line, leak_header_line, write_response, MAX_INTERNED_HEADER_LINES,
    MAX_LEAKED_HEADER_BYTES,
};
pub use service::AppService;
