//! Adapter implementations for the provisioning gateway port.

mod daytona;
mod memory;

pub use daytona::{DaytonaGateway, DaytonaGatewayConfig};
pub use memory::InMemoryProvisioningGateway;
