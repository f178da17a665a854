use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use tracing::info;

use super::request::parse_request;
use super::response::write_api_response;
use crate::dispatcher::WebApi;

/// `may_minihttp` service that runs every request through a [`WebApi`].
///
/// The API is shared read-only between all connections; cloning the service
/// clones the `Arc`.
#[derive(Clone)]
pub struct ApiService {
    api: Arc<WebApi>,
}

impl ApiService {
    pub fn new(api: Arc<WebApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &WebApi {
        &self.api
    }
}

impl From<WebApi> for ApiService {
    fn from(api: WebApi) -> Self {
        Self::new(Arc::new(api))
    }
}

impl HttpService for ApiService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let incoming = parse_request(req);
        let method = incoming.method.clone();
        let path = incoming.path.clone();

        let api_response = self.api.handle(incoming);

        info!(
            method = %method,
            path = %path,
            status = api_response.status,
            size_bytes = api_response.body.len(),
            "Response sent"
        );
        write_api_response(res, api_response);
        Ok(())
    }
}
