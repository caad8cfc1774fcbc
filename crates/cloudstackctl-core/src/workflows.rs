//! Multi-step workflows
//!
//! These compose SDK calls with progress tracking. Each step that submits
//! an async command waits for it before the next step starts.

use crate::error::{CoreError, Result};
use crate::progress::{ProgressCallback, ProgressEvent, poll_job, wait_for};
use cloudstack::services::addresses::{AssociateIpAddressRequest, PublicIpAddress};
use cloudstack::services::firewall::{CreatePortForwardingRuleRequest, PortForwardingRule};
use cloudstack::services::snapshots::{CreateSnapshotRequest, Snapshot};
use cloudstack::services::virtual_machines::{
    DeployVirtualMachineRequest, DestroyVirtualMachineRequest, VirtualMachine,
};
use cloudstack::services::volumes::{AttachVolumeRequest, CreateVolumeRequest, Volume};
use cloudstack::{
    AddressHandler, CloudStackClient, FirewallHandler, SnapshotHandler, VirtualMachineHandler,
    VolumeHandler,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Deploy a VM and wait until it is running
///
/// # Arguments
///
/// * `client` - The CloudStack client
/// * `request` - The deployment parameters
/// * `timeout` - Maximum time to wait for the deployment job
/// * `interval` - Delay between job status polls
/// * `on_progress` - Optional callback for progress updates
///
/// # Example
///
/// ```rust,ignore
/// use cloudstack::services::virtual_machines::DeployVirtualMachineRequest;
/// use cloudstackctl_core::workflows::deploy_vm_and_wait;
/// use std::time::Duration;
///
/// let request = DeployVirtualMachineRequest::new(offering_id, template_id, zone_id)
///     .name("web-1");
///
/// let vm = deploy_vm_and_wait(
///     &client,
///     request,
///     Duration::from_secs(600),
///     client.poll_interval(),
///     None,
/// )
/// .await?;
/// println!("{} is {:?}", vm.name, vm.state);
/// ```
pub async fn deploy_vm_and_wait(
    client: &CloudStackClient,
    request: DeployVirtualMachineRequest,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<VirtualMachine> {
    let handler = VirtualMachineHandler::new(client.clone());

    // Step 1: Submit the deployment
    let pending = handler.deploy(request).await?;
    info!(job_id = pending.job_id(), vm_id = ?pending.resource_id(), "Deployment submitted");

    // Step 2: Wait for the VM
    wait_for(pending, timeout, interval, on_progress).await
}

/// Destroy a VM and wait for the job to finish
///
/// With `expunge`, the VM cannot be recovered afterwards.
pub async fn destroy_vm_and_wait(
    client: &CloudStackClient,
    vm_id: &str,
    expunge: bool,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<()> {
    let handler = VirtualMachineHandler::new(client.clone());

    // Step 1: Submit the destroy
    let pending = handler
        .destroy(DestroyVirtualMachineRequest::new(vm_id).expunge(expunge))
        .await?;

    // Step 2: Wait; an expunged VM's job result is not worth decoding
    poll_job(
        client,
        pending.job_id(),
        timeout,
        interval,
        on_progress,
    )
    .await?;

    Ok(())
}

/// Create a data volume and attach it to a VM
///
/// `timeout` applies to each of the two jobs separately.
pub async fn create_volume_and_attach(
    client: &CloudStackClient,
    request: CreateVolumeRequest,
    vm_id: &str,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<Volume> {
    let handler = VolumeHandler::new(client.clone());
    let on_progress = share(on_progress);

    // Step 1: Create the volume
    let pending = handler.create(request).await?;
    let volume: Volume = wait_for(
        pending,
        timeout,
        interval,
        forward(&on_progress),
    )
    .await?;
    info!(volume_id = %volume.id, "Volume created");

    // Step 2: Attach it
    let pending = handler
        .attach(AttachVolumeRequest::new(&volume.id, vm_id))
        .await?;
    wait_for(
        pending,
        timeout,
        interval,
        forward(&on_progress),
    )
    .await
}

/// Take a snapshot of a volume and wait until it is backed up
pub async fn snapshot_volume_and_wait(
    client: &CloudStackClient,
    request: CreateSnapshotRequest,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<Snapshot> {
    let handler = SnapshotHandler::new(client.clone());

    // Step 1: Submit the snapshot
    let pending = handler.create(request).await?;

    // Step 2: Wait for it
    wait_for(pending, timeout, interval, on_progress).await
}

/// Public address plus the rule forwarding one of its ports to a VM
#[derive(Debug, Clone)]
pub struct PortForward {
    pub ip_address: PublicIpAddress,
    pub rule: PortForwardingRule,
}

/// Acquire a public IP on a network and forward a port to a VM
///
/// The firewall is opened for the public port as part of the rule. If the
/// rule cannot be created the acquired address is released again.
#[allow(clippy::too_many_arguments)]
pub async fn acquire_ip_and_forward_port(
    client: &CloudStackClient,
    network_id: &str,
    vm_id: &str,
    protocol: &str,
    public_port: u16,
    private_port: u16,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<PortForward> {
    if public_port == 0 || private_port == 0 {
        return Err(CoreError::Validation("ports must be between 1 and 65535".to_string()));
    }
    let protocol = protocol.to_lowercase();
    if protocol != "tcp" && protocol != "udp" {
        return Err(CoreError::Validation(format!(
            "port forwarding protocol must be tcp or udp, got '{}'",
            protocol
        )));
    }

    let addresses = AddressHandler::new(client.clone());
    let firewall = FirewallHandler::new(client.clone());
    let on_progress = share(on_progress);

    // Step 1: Acquire the address
    let pending = addresses
        .associate(AssociateIpAddressRequest::new().network_id(network_id))
        .await?;
    let ip_address: PublicIpAddress = wait_for(
        pending,
        timeout,
        interval,
        forward(&on_progress),
    )
    .await?;
    info!(ip = %ip_address.ipaddress, "Public IP acquired");

    // Step 2: Forward the port
    let request = CreatePortForwardingRuleRequest::new(
        &ip_address.id,
        protocol,
        i64::from(public_port),
        i64::from(private_port),
        vm_id,
    )
    .open_firewall(true);

    let rule = match firewall.create_port_forwarding(request).await {
        Ok(pending) => {
            wait_for(
                pending,
                timeout,
                interval,
                forward(&on_progress),
            )
            .await
        }
        Err(e) => Err(e.into()),
    };

    // Step 3: Release the address if the rule did not stick
    match rule {
        Ok(rule) => Ok(PortForward { ip_address, rule }),
        Err(e) => {
            warn!(ip_id = %ip_address.id, error = %e, "Port forwarding failed, releasing IP");
            if let Err(release) = release_ip(&addresses, &ip_address.id, timeout, interval).await {
                warn!(ip_id = %ip_address.id, error = %release, "Failed to release IP");
            }
            Err(e)
        }
    }
}

async fn release_ip(
    addresses: &AddressHandler,
    ip_id: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    let pending = addresses.disassociate(ip_id).await?;
    wait_for(pending, timeout, interval, None).await?;
    Ok(())
}

/// Let one callback observe several jobs
fn share(on_progress: Option<ProgressCallback>) -> Option<Arc<ProgressCallback>> {
    on_progress.map(Arc::new)
}

fn forward(shared: &Option<Arc<ProgressCallback>>) -> Option<ProgressCallback> {
    shared
        .clone()
        .map(|cb| Box::new(move |event: ProgressEvent| cb(event)) as ProgressCallback)
}
