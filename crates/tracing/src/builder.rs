use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::{Error, LogFormat, DEFAULT_LOG_FILTER};

#[derive(Debug)]
pub struct TracingBuilder {
    log_format: LogFormat,
    filter: Option<EnvFilter>,
}

impl TracingBuilder {
    pub fn new() -> Self {
        Self { log_format: LogFormat::Full, filter: None }
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Set a custom filter from a directive string, eg `stage=debug,info`.
    pub fn with_filter(mut self, filter: &str) -> Result<Self, Error> {
        self.filter = Some(EnvFilter::try_new(filter)?);
        Ok(self)
    }

    /// Use the filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`] when it is unset.
    pub fn with_env_filter_or_default(mut self) -> Result<Self, Error> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(DEFAULT_LOG_FILTER)?,
        };
        self.filter = Some(filter);
        Ok(self)
    }

    /// Returns the filter that [`build`](Self::build) would install.
    pub fn filter(&self) -> Option<&EnvFilter> {
        self.filter.as_ref()
    }

    pub fn build(self) -> Result<(), Error> {
        let filter = match self.filter {
            Some(filter) => filter,
            None => EnvFilter::try_new(DEFAULT_LOG_FILTER)?,
        };

        let fmt = match self.log_format {
            LogFormat::Full => tracing_subscriber::fmt::layer().boxed(),
            LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        };

        tracing_subscriber::registry().with(filter).with(fmt).try_init()?;
        Ok(())
    }
}

impl Default for TracingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn custom_filter() {
        let builder = TracingBuilder::new().with_filter("stage=debug,info").unwrap();
        assert!(builder.filter().is_some());
        assert!(TracingBuilder::new().with_filter("stage=notalevel").is_err());
    }
}
