//! Serve command implementation

use anyhow::Result;

use howtobase::config::Config;
use howtobase::server::run_http_server;

/// Run the progression API, with optional host/port overrides
pub fn serve_command(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    run_http_server(&config)
}
