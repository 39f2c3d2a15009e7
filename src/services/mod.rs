//! Business logic services for the commit server.

pub mod provider_service;

// Re-export commonly used types
pub use provider_service::ProviderService;
