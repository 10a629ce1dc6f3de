pub mod api;
pub mod relay;

use crate::cli::ServeArgs;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use self::api::AppState;
use self::relay::Relay;

pub struct Server {
    addr: String,
    relay: Arc<Relay>,
    args: ServeArgs,
}

impl Server {
    pub fn new(
        addr: String,
        relay: Arc<Relay>,
        args: ServeArgs,
    ) -> Self {
        Self {
            addr,
            relay,
            args,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid server address '{}': {}", self.addr, e))?;
        api::start_http_server(addr, AppState::new(self.relay.clone()), &self.args).await
    }
}
