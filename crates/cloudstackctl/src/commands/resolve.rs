//! Turn user-supplied names into CloudStack ids
//!
//! CloudStack ids are UUIDs. Anything else is treated as a name and looked
//! up with an exact match; no match or several matches is an error.

use cloudstack::services::volumes::ListVolumesRequest;
use cloudstack::{
    CloudStackClient, CloudStackError, DiskOfferingHandler, NetworkHandler,
    ServiceOfferingHandler, TemplateHandler, VirtualMachineHandler, VolumeHandler, ZoneHandler,
};
use tracing::debug;

use crate::error::Result as CliResult;

/// True if `value` has the shape of a UUID
pub fn looks_like_id(value: &str) -> bool {
    value.len() == 36
        && value.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

pub async fn vm(client: &CloudStackClient, value: &str) -> CliResult<String> {
    if looks_like_id(value) {
        return Ok(value.to_string());
    }
    debug!(name = value, "Resolving VM name");
    Ok(VirtualMachineHandler::new(client.clone())
        .get_id(value)
        .await?)
}

pub async fn zone(client: &CloudStackClient, value: &str) -> CliResult<String> {
    if looks_like_id(value) {
        return Ok(value.to_string());
    }
    debug!(name = value, "Resolving zone name");
    Ok(ZoneHandler::new(client.clone()).get_id(value).await?)
}

pub async fn template(
    client: &CloudStackClient,
    value: &str,
    zone_id: Option<&str>,
) -> CliResult<String> {
    if looks_like_id(value) {
        return Ok(value.to_string());
    }
    debug!(name = value, "Resolving template name");
    Ok(TemplateHandler::new(client.clone())
        .get_id(value, zone_id)
        .await?)
}

pub async fn service_offering(client: &CloudStackClient, value: &str) -> CliResult<String> {
    if looks_like_id(value) {
        return Ok(value.to_string());
    }
    debug!(name = value, "Resolving service offering name");
    Ok(ServiceOfferingHandler::new(client.clone())
        .get_id(value)
        .await?)
}

pub async fn disk_offering(client: &CloudStackClient, value: &str) -> CliResult<String> {
    if looks_like_id(value) {
        return Ok(value.to_string());
    }
    debug!(name = value, "Resolving disk offering name");
    Ok(DiskOfferingHandler::new(client.clone())
        .get_id(value)
        .await?)
}

pub async fn network(client: &CloudStackClient, value: &str) -> CliResult<String> {
    if looks_like_id(value) {
        return Ok(value.to_string());
    }
    debug!(name = value, "Resolving network name");
    Ok(NetworkHandler::new(client.clone()).get_id(value).await?)
}

pub async fn volume(client: &CloudStackClient, value: &str) -> CliResult<String> {
    if looks_like_id(value) {
        return Ok(value.to_string());
    }
    debug!(name = value, "Resolving volume name");
    let volumes = VolumeHandler::new(client.clone())
        .list(ListVolumesRequest::new().name(value))
        .await?;
    let mut ids: Vec<String> = volumes
        .into_iter()
        .filter(|v| v.name == value)
        .map(|v| v.id)
        .collect();
    match ids.len() {
        1 => Ok(ids.remove(0)),
        0 => Err(CloudStackError::NotFound {
            kind: "volume",
            name: value.to_string(),
        }
        .into()),
        count => Err(CloudStackError::Ambiguous {
            kind: "volume",
            name: value.to_string(),
            count,
        }
        .into()),
    }
}

/// Zone argument, or the profile's default zone
pub async fn zone_or_default(
    client: &CloudStackClient,
    value: Option<&str>,
    default: Option<String>,
) -> CliResult<Option<String>> {
    match value.map(str::to_string).or(default) {
        Some(zone_ref) => Ok(Some(zone(client, &zone_ref).await?)),
        None => Ok(None),
    }
}
