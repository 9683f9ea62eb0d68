use jsonrpsee::core::RegisterMethodError;
use jsonrpsee::server::middleware::http::ProxyGetRequestLayer;
use jsonrpsee::RpcModule;
use serde_json::json;

use crate::Error;

/// Liveness probe, served as the `health` method and proxied from `GET /health`.
#[derive(Debug, Clone, Copy)]
pub struct HealthCheck;

impl HealthCheck {
    const METHOD: &'static str = "health";

    pub fn module() -> Result<RpcModule<()>, RegisterMethodError> {
        let mut module = RpcModule::new(());
        module.register_method(Self::METHOD, |_, _, _| json!({ "health": true }))?;
        Ok(module)
    }

    pub fn proxy() -> Result<ProxyGetRequestLayer, Error> {
        ProxyGetRequestLayer::new([("/health", Self::METHOD)])
            .map_err(|error| Error::HealthCheck(error.to_string()))
    }
}
