use clap::Parser;
use imalive_monitor::LogFormat;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "imalive",
    about = "Health-check agent publishing monitor results as Prometheus metrics",
    version = env!("CARGO_PKG_VERSION"),
    author = "imalive Project Team"
)]
pub struct Cli {
    /// Monitor definitions (YAML)
    #[arg(short, long, value_name = "FILE", env = "IMALIVE_CONFIG", default_value = "imalive.yml")]
    pub config: PathBuf,

    /// Seconds to wait between two polling cycles
    #[arg(short, long, value_name = "SECONDS", env = "IMALIVE_WAIT_TIME", default_value_t = 30)]
    pub wait_time: u64,

    /// Address of the /metrics and /health endpoints
    #[arg(short, long, env = "IMALIVE_LISTEN", default_value = "0.0.0.0:8081")]
    pub listen: SocketAddr,

    /// Log output format (json, pretty)
    #[arg(long, env = "IMALIVE_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_time)
    }
}
