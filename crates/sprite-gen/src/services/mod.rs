//! Service registry
//!
//! Maps service identifiers to concrete implementations.

pub mod liblib;
pub mod tripo;

use crate::config::SpriteConfig;
use crate::service::{Service, TaskService};
use sprite_core::Result;

/// Create a service with configuration. Fails with `ConfigurationError` when
/// its credentials are missing, before any network call.
pub fn create_service(service: Service, config: &SpriteConfig) -> Result<Box<dyn TaskService>> {
    match service {
        Service::Image => Ok(Box::new(liblib::LiblibService::from_config(config)?)),
        Service::Model => Ok(Box::new(tripo::TripoService::from_config(config)?)),
    }
}
