//! Read-only catalog commands: zones, templates and offerings

use cloudstack::services::offerings::{
    DiskOffering, ListDiskOfferingsRequest, ListServiceOfferingsRequest, ServiceOffering,
};
use cloudstack::services::templates::{ListTemplatesRequest, Template};
use cloudstack::services::zones::{ListZonesRequest, Zone};
use cloudstack::{DiskOfferingHandler, ServiceOfferingHandler, TemplateHandler, ZoneHandler};
use tabled::Tabled;

use super::CommandContext;
use super::resolve;
use super::utils::{format_gib, format_memory, format_state, or_dash, print_list};
use crate::cli::{OfferingCommands, TemplateCommands, ZoneCommands};
use crate::error::Result as CliResult;

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "NETWORK")]
    network_type: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl ZoneRow {
    fn new(zone: &Zone) -> Self {
        Self {
            name: zone.name.clone(),
            network_type: or_dash(zone.networktype.as_deref()),
            state: format_state(zone.allocationstate.as_deref()),
            id: zone.id.clone(),
        }
    }
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "ZONE")]
    zone: String,
    #[tabled(rename = "SIZE")]
    size: String,
    #[tabled(rename = "READY")]
    ready: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl TemplateRow {
    fn new(template: &Template) -> Self {
        Self {
            name: template.name.clone(),
            os: or_dash(template.ostypename.as_deref()),
            zone: or_dash(template.zonename.as_deref()),
            size: format_gib(template.size),
            ready: if template.isready { "yes" } else { "no" }.to_string(),
            id: template.id.clone(),
        }
    }
}

#[derive(Tabled)]
struct ServiceOfferingRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CPUS")]
    cpus: String,
    #[tabled(rename = "MEMORY")]
    memory: String,
    #[tabled(rename = "STORAGE")]
    storage: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl ServiceOfferingRow {
    fn new(offering: &ServiceOffering) -> Self {
        Self {
            name: offering.name.clone(),
            cpus: match (offering.iscustomized, offering.cpunumber) {
                (true, _) => "custom".to_string(),
                (false, Some(n)) => n.to_string(),
                (false, None) => "-".to_string(),
            },
            memory: if offering.iscustomized {
                "custom".to_string()
            } else {
                format_memory(offering.memory)
            },
            storage: or_dash(offering.storagetype.as_deref()),
            id: offering.id.clone(),
        }
    }
}

#[derive(Tabled)]
struct DiskOfferingRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "SIZE")]
    size: String,
    #[tabled(rename = "STORAGE")]
    storage: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl DiskOfferingRow {
    fn new(offering: &DiskOffering) -> Self {
        Self {
            name: offering.name.clone(),
            size: match (offering.iscustomized, offering.disksize) {
                (true, _) => "custom".to_string(),
                (false, Some(gib)) => format!("{} GiB", gib),
                (false, None) => "-".to_string(),
            },
            storage: or_dash(offering.storagetype.as_deref()),
            id: offering.id.clone(),
        }
    }
}

pub async fn handle_zone_command(
    ctx: &CommandContext<'_>,
    command: &ZoneCommands,
) -> CliResult<()> {
    let client = ctx.client()?;
    match command {
        ZoneCommands::List { available } => {
            let mut request = ListZonesRequest::new();
            if *available {
                request = request.available(true);
            }
            let zones = ZoneHandler::new(client).list(request).await?;
            print_list(&zones.items, ctx.output, ctx.query, "No zones found", ZoneRow::new)
        }
    }
}

pub async fn handle_template_command(
    ctx: &CommandContext<'_>,
    command: &TemplateCommands,
) -> CliResult<()> {
    let client = ctx.client()?;
    match command {
        TemplateCommands::List {
            filter,
            zone,
            keyword,
        } => {
            let mut request = ListTemplatesRequest::new(filter);
            if let Some(zone) = zone {
                request = request.zone_id(resolve::zone(&client, zone).await?);
            }
            if let Some(keyword) = keyword {
                request = request.keyword(keyword);
            }
            let templates = TemplateHandler::new(client).list(request).await?;
            print_list(
                &templates.items,
                ctx.output,
                ctx.query,
                "No templates found",
                TemplateRow::new,
            )
        }
    }
}

pub async fn handle_offering_command(
    ctx: &CommandContext<'_>,
    command: &OfferingCommands,
) -> CliResult<()> {
    let client = ctx.client()?;
    match command {
        OfferingCommands::List { disk: true } => {
            let offerings = DiskOfferingHandler::new(client)
                .list(ListDiskOfferingsRequest::new())
                .await?;
            print_list(
                &offerings.items,
                ctx.output,
                ctx.query,
                "No disk offerings found",
                DiskOfferingRow::new,
            )
        }
        OfferingCommands::List { disk: false } => {
            let offerings = ServiceOfferingHandler::new(client)
                .list(ListServiceOfferingsRequest::new())
                .await?;
            print_list(
                &offerings.items,
                ctx.output,
                ctx.query,
                "No service offerings found",
                ServiceOfferingRow::new,
            )
        }
    }
}
