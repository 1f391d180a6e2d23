//! Packet filters: a non-empty set of services with a derived identifier.

use crate::canonical;
use crate::error::{ModelError, Result};
use crate::namer::generate_identifier;
use crate::service::NetworkService;
use crate::types::{Identified, Identifier};

/// A set of services referenced by rules.
///
/// Services are kept deduplicated in canonical order, so two filters built
/// from the same services in any order are equal and share an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PacketFilter {
    services: Vec<NetworkService>,
    identifier: Identifier,
}

impl PacketFilter {
    /// Build a filter; rejects an empty service set.
    pub fn new(services: impl IntoIterator<Item = NetworkService>) -> Result<Self> {
        let mut keyed: Vec<(String, NetworkService)> = services
            .into_iter()
            .map(|service| (canonical::service_text(&service), service))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.dedup_by(|a, b| a.0 == b.0);

        if keyed.is_empty() {
            return Err(ModelError::EmptyServices);
        }

        let services: Vec<NetworkService> = keyed.into_iter().map(|(_, service)| service).collect();
        let identifier = generate_identifier(&canonical::filter_text(&services));
        Ok(Self {
            services,
            identifier,
        })
    }

    /// Services in canonical order.
    pub fn services(&self) -> &[NetworkService] {
        &self.services
    }

    pub fn contains(&self, service: &NetworkService) -> bool {
        self.services.contains(service)
    }
}

impl Identified for PacketFilter {
    fn identifier(&self) -> &Identifier {
        &self.identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identifier_known_values() {
        let cases = [
            (
                vec![NetworkService::tcp(443)],
                "X-050935040a509710b340d494fdfa7731ac5003bd",
            ),
            (
                vec![NetworkService::udp(514), NetworkService::udp_range(3000, 3009).unwrap()],
                "X-0a4d107b26cdb5a36d8fca3dbb8acdb697385281",
            ),
            (
                vec![NetworkService::icmp()],
                "X-4183ca61d4fe56bb913ec7cc344eff1123648f52",
            ),
            (
                vec![NetworkService::icmp(), NetworkService::tcp(80)],
                "X-88f468b855e771f0073ec71af6d973db8faefd1e",
            ),
        ];

        for (services, expected) in cases {
            let filter = PacketFilter::new(services).unwrap();
            assert_eq!(filter.identifier(), &expected);
        }
    }

    #[test]
    fn test_order_and_duplicates_ignored() {
        let a = PacketFilter::new([NetworkService::tcp(80), NetworkService::icmp()]).unwrap();
        let b = PacketFilter::new([
            NetworkService::icmp(),
            NetworkService::tcp(80),
            NetworkService::icmp(),
        ])
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.identifier(), b.identifier());
        assert_eq!(b.services().len(), 2);
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(
            PacketFilter::new(Vec::new()).unwrap_err(),
            ModelError::EmptyServices
        );
    }

    #[test]
    fn test_contains() {
        let filter = PacketFilter::new([NetworkService::tcp(22)]).unwrap();
        assert!(filter.contains(&NetworkService::tcp(22)));
        assert!(!filter.contains(&NetworkService::udp(22)));
    }

    proptest! {
        #[test]
        fn prop_identifier_ignores_order(ports in prop::collection::vec(1u16..=u16::MAX, 1..8)) {
            let services: Vec<_> = ports.iter().map(|p| NetworkService::tcp(*p)).collect();
            let forward = PacketFilter::new(services.clone()).unwrap();
            let backward = PacketFilter::new(services.into_iter().rev()).unwrap();
            prop_assert_eq!(forward.identifier(), backward.identifier());
        }
    }
}
