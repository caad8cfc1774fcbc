//! Typed handlers for CloudStack API categories
//!
//! Each handler wraps a cloned [`CloudStackClient`](crate::CloudStackClient)
//! and exposes one method per command plus a few lookup helpers.

pub mod addresses;
pub mod capabilities;
pub mod firewall;
pub mod load_balancers;
pub mod networks;
pub mod offerings;
pub mod security_groups;
pub mod snapshots;
pub mod ssh_keys;
pub mod tags;
pub mod templates;
pub mod virtual_machines;
pub mod volumes;
pub mod zones;

pub use addresses::AddressHandler;
pub use capabilities::CapabilitiesHandler;
pub use firewall::FirewallHandler;
pub use load_balancers::LoadBalancerHandler;
pub use networks::NetworkHandler;
pub use offerings::{DiskOfferingHandler, ServiceOfferingHandler};
pub use security_groups::SecurityGroupHandler;
pub use snapshots::SnapshotHandler;
pub use ssh_keys::SshKeyPairHandler;
pub use tags::TagHandler;
pub use templates::TemplateHandler;
pub use virtual_machines::VirtualMachineHandler;
pub use volumes::VolumeHandler;
pub use zones::ZoneHandler;

use crate::error::{CloudStackError, Result};

/// Pick the single item whose name matches exactly
///
/// CloudStack's `name` and `keyword` filters match substrings, so results are
/// narrowed client-side before deciding.
pub(crate) fn exactly_one<T>(
    kind: &'static str,
    name: &str,
    items: impl IntoIterator<Item = T>,
    name_of: impl Fn(&T) -> &str,
) -> Result<T> {
    let mut matches: Vec<T> = items.into_iter().filter(|i| name_of(i) == name).collect();
    match matches.len() {
        0 => Err(CloudStackError::NotFound {
            kind,
            name: name.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(CloudStackError::Ambiguous {
            kind,
            name: name.to_string(),
            count,
        }),
    }
}

/// Pick the first item of a by-id listing or report it missing
pub(crate) fn first_or_not_found<T>(
    kind: &'static str,
    id: &str,
    items: impl IntoIterator<Item = T>,
) -> Result<T> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| CloudStackError::NotFound {
            kind,
            name: id.to_string(),
        })
}
