//! Environment-sourced gateway configuration.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORT` | `4000` | TCP port to listen on. |
//! | `ARNS_ROOT_HOST` | *(none)* | Root host for sandboxing and ArNS. Unset disables both. |
//! | `SANDBOX_PROTOCOL` | *(none)* | Forces the sandbox-redirect scheme (`http`/`https`). |
//! | `ADMIN_API_KEY` | *(generated)* | Bearer secret for `/ar-io/admin/*`. |
//! | `AR_IO_WALLET` | *(empty)* | Operator wallet reported by `/ar-io/info`. |

use tracing::warn;
use uuid::Uuid;

/// Runtime configuration for [`GatewayServer`](crate::server::GatewayServer).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Root host below which sandbox subdomains and ArNS names live.
    /// `None` disables sandboxing and name resolution.
    pub arns_root_host: Option<String>,
    /// Explicit protocol for sandbox redirects; derived from the request
    /// when unset.
    pub sandbox_protocol: Option<String>,
    /// Shared secret for the admin control plane.
    pub admin_api_key: String,
    /// Operator wallet identifier.
    pub ar_io_wallet: String,
}

impl GatewayConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4000);

        let arns_root_host = non_empty(std::env::var("ARNS_ROOT_HOST").ok());
        let sandbox_protocol = non_empty(std::env::var("SANDBOX_PROTOCOL").ok());

        let admin_api_key = match non_empty(std::env::var("ADMIN_API_KEY").ok()) {
            Some(key) => key,
            None => {
                let key = Uuid::new_v4().to_string();
                warn!(
                    admin_api_key = %key,
                    "ADMIN_API_KEY is not set — generated a random key for this run"
                );
                key
            }
        };

        let ar_io_wallet = std::env::var("AR_IO_WALLET").unwrap_or_default();

        Self {
            port,
            arns_root_host,
            sandbox_protocol,
            admin_api_key,
            ar_io_wallet,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
