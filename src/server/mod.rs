//! HTTP front end for a [`Pipeline`](crate::pipeline::Pipeline), built on `may_minihttp`.

pub mod executor;
pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use executor::block_on;
pub use http_server::{HttpServer, ServerHandle};
pub use request::parse_request;
pub use response::write_response;
pub use service::ChannelService;
