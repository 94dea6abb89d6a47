pub mod cli;
pub mod error;
pub mod netutils;
pub mod probes;
pub mod scan;
pub mod types;

pub use error::{DecodeError, DetectError};
pub use probes::{decode, detect_mysql, HandshakeRecord, MysqlProbe};
pub use scan::run;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "mysql_detect=warn",
        1 => "mysql_detect=info",
        _ => "mysql_detect=debug",
    };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
