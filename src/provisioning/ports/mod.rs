//! Port contract for the external provisioning service.

pub mod gateway;

pub use gateway::{
    ProvisioningGateway, ProvisioningGatewayError, ProvisioningGatewayResult, bounded,
};
