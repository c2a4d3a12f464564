//! Network transports: AJAX module connector, raw page fetch, XML-RPC.

mod ajax;
mod raw;
mod rpc;
pub mod xmlrpc;

pub use ajax::AjaxConnector;
pub use raw::RawPageFetcher;
pub use rpc::RpcGateway;
