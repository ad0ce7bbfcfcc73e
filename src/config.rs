use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Peer-to-peer call signaling server
#[derive(Parser, Serialize, Debug, Default)]
#[command(name = "meshcall", version, about)]
pub struct Cli {
    /// Path to TOML config file
    #[arg(long, env = "MESHCALL_CONFIG", default_value = "./meshcall.toml")]
    #[serde(skip)]
    pub config: PathBuf,

    /// Bind address
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<IpAddr>,

    /// Port to listen on
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Directory with the browser client
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    /// Structured JSON logs
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub json_logs: bool,

    /// Print a commented TOML config template and exit
    #[arg(long)]
    #[serde(skip)]
    pub generate_config: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub bind_address: IpAddr,
    pub port: u16,
    pub static_dir: PathBuf,
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            static_dir: PathBuf::from("public"),
            json_logs: false,
        }
    }
}

impl Config {
    /// built-in defaults < TOML file < MESHCALL_* env vars < CLI flags
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        Self::figment(cli).extract()
    }

    pub fn figment(cli: &Cli) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            .merge(Env::prefixed("MESHCALL_").ignore(&["config"]))
            .merge(Serialized::defaults(cli))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// Commented TOML template for `--generate-config`.
pub fn generate_config_template() -> String {
    r#"# meshcall configuration
# Every key can also be set through MESHCALL_<KEY> or --<key> on the command line.

# Address to bind (default: 127.0.0.1)
# bind_address = "127.0.0.1"

# Port for HTTP and the /ws signaling socket (default: 3000)
# port = 3000

# Directory served at / (default: "public")
# static_dir = "public"

# Structured JSON logs instead of human readable output (default: false)
# json_logs = false
"#
    .to_string()
}
