//! # Configuration Management
//!
//! Configuration for the Setu control plane core: artifact ingestion paths,
//! default gateway placement and observability settings.

mod settings;

pub use settings::{
    AppConfig, ArtifactsConfig, GatewayConfig, ObservabilityConfig, ServerConfig,
};
