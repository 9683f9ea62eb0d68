#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use tracing_subscriber::filter;
use tracing_subscriber::util::TryInitError;

mod builder;
mod fmt;

pub use builder::TracingBuilder;
pub use fmt::LogFormat;

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str =
    "pipeline=info,stage=info,kate=info,sampling=info,node=info,rpc=info,jsonrpsee=off,\
     jsonrpsee_server=off,jsonrpsee_client=off,soketto=off,hyper=off,info";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse environment filter: {0}")]
    EnvFilterParse(#[from] filter::ParseError),

    #[error("failed to set global dispatcher: {0}")]
    Init(#[from] TryInitError),
}

/// Installs the global tracing subscriber.
///
/// The filter is taken from `RUST_LOG` when set, otherwise [`DEFAULT_LOG_FILTER`] is used.
pub fn init(format: LogFormat) -> Result<(), Error> {
    TracingBuilder::new().with_log_format(format).with_env_filter_or_default()?.build()
}
