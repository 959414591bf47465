//! Network interface address table

use async_trait::async_trait;
use ddns_core::traits::{Address, AddressSource};
use ddns_core::{Error, RecordType, Result};
use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};

/// Reads the first address of the requested family from one interface
#[derive(Debug, Clone)]
pub struct InterfaceSource {
    interface: String,
}

impl InterfaceSource {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

/// First address of `record_type`'s family on `name`
fn first_address(
    interfaces: &[NetworkInterface],
    name: &str,
    record_type: RecordType,
) -> Option<Address> {
    interfaces
        .iter()
        .filter(|interface| interface.name == name)
        .flat_map(|interface| interface.addr.iter())
        .find_map(|addr| match (record_type, addr) {
            (RecordType::A, Addr::V4(v4)) => Some(Address::new(v4.ip.to_string())),
            (RecordType::Aaaa, Addr::V6(v6)) => Some(Address::new(v6.ip.to_string())),
            _ => None,
        })
}

#[async_trait]
impl AddressSource for InterfaceSource {
    async fn resolve(&self, record_type: RecordType) -> Result<Address> {
        let interfaces = NetworkInterface::show()
            .map_err(|e| Error::detection(format!("Failed to get network interfaces: {}", e)))?;

        if !interfaces.iter().any(|i| i.name == self.interface) {
            return Err(Error::detection(format!(
                "Interface {} not found",
                self.interface
            )));
        }

        let address = first_address(&interfaces, &self.interface, record_type).ok_or_else(|| {
            Error::detection(format!(
                "Interface {} has no {} address",
                self.interface, record_type
            ))
        })?;

        tracing::info!("Got IP from interface {}: {}", self.interface, address);
        Ok(address)
    }

    fn name(&self) -> &str {
        &self.interface
    }
}
