use super::request::request_env;
use super::response::write_response;
use crate::dispatcher::Dispatcher;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;

/// `HttpService` running every request through one shared [`Dispatcher`].
#[derive(Clone)]
pub struct AppService {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let env = request_env(req);
        let response = self.dispatcher.run(env);
        write_response(res, &response);
        Ok(())
    }
}
