//! CLI command implementations.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use color_eyre::eyre::{eyre, Result};

use outlay_server::{ExpenseStore, MemoryStore, MongoStore, Server, ServerConfig};

use crate::config::Config;

/// Starts the expense API server.
///
/// A failed initial store connection propagates out and exits the process
/// non-zero.
pub async fn serve(
    cfg: &Config,
    host: Option<String>,
    port: Option<u16>,
    mongo_uri: Option<String>,
    database: Option<String>,
    origins: Vec<String>,
    memory: bool,
) -> Result<()> {
    let host = host.unwrap_or_else(|| cfg.server_host.clone());
    let port = port.unwrap_or(cfg.server_port);
    let addr = resolve_addr(&host, port)?;

    let origins = if origins.is_empty() {
        cfg.allowed_origins.clone()
    } else {
        origins
    };

    let store: Arc<dyn ExpenseStore> = if memory {
        tracing::warn!("Using in-memory store; data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let uri = mongo_uri.unwrap_or_else(|| cfg.mongo_uri.clone());
        let database = database.unwrap_or_else(|| cfg.database.clone());
        Arc::new(MongoStore::connect(&uri, &database).await?)
    };

    let server_config = ServerConfig::builder()
        .addr(addr)
        .allowed_origins(origins)
        .build();

    Server::new(server_config, store).run().await?;
    Ok(())
}

/// Resolves a listen address from a host (IP address or hostname) and port.
fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| eyre!("Cannot resolve listen address {host}:{port}: {e}"))?
        .next()
        .ok_or_else(|| eyre!("Cannot resolve listen address {host}:{port}"))
}

/// Prints version and build info.
pub fn version() {
    println!("outlay {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ip_address() {
        let addr = resolve_addr("127.0.0.1", 5000).unwrap();
        assert_eq!(addr, "127.0.0.1:5000".parse().unwrap());
    }

    #[test]
    fn test_resolve_hostname() {
        let addr = resolve_addr("localhost", 5000).unwrap();
        assert_eq!(addr.port(), 5000);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_resolve_bad_host() {
        assert!(resolve_addr("not a host name", 5000).is_err());
    }
}
