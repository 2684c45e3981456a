use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request as HttpRequest, Response as HttpResponse};
use tracing::warn;

use super::executor::block_on;
use super::request::parse_request;
use super::response::write_response;
use crate::pipeline::{Pipeline, Response};

/// Serves a [`Pipeline`] over `may_minihttp`.
///
/// Each request is driven to completion on the connection's coroutine. A request
/// waiting on a pending future parks only its own coroutine.
#[derive(Clone)]
pub struct ChannelService {
    app: Arc<Pipeline>,
}

impl ChannelService {
    pub fn new(app: Pipeline) -> Self {
        Self { app: Arc::new(app) }
    }

    pub fn app(&self) -> &Pipeline {
        &self.app
    }
}

impl HttpService for ChannelService {
    fn call(&mut self, req: HttpRequest, res: &mut HttpResponse) -> io::Result<()> {
        let response = match parse_request(req) {
            Ok(request) => block_on(self.app.handle(request)),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Rejected malformed request");
                Response::error(400, &format!("{err:#}"))
            }
        };
        write_response(res, &response);
        Ok(())
    }
}
