//! Templates

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{api_request, bool_setters, list_filters, param_setters, tag_filter};
use crate::services::{exactly_one, first_or_not_found};
use crate::types::{Extra, ListResponse, SuccessResponse, Tag, flexible_bool, flexible_i64};
use serde::{Deserialize, Serialize};

/// Filter used when a caller does not care which templates are shown: all
/// templates the caller can deploy from
pub const EXECUTABLE: &str = "executable";

/// A VM template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaytext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ostypeid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ostypename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zonename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templatetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub size: Option<i64>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub isready: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub ispublic: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub isfeatured: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub passwordenabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `listTemplates`
    ListTemplatesRequest => "listTemplates"
);

impl ListTemplatesRequest {
    /// `filter` is one of `featured`, `self`, `selfexecutable`, `sharedexecutable`,
    /// `executable` or `community`
    pub fn new(filter: impl Into<String>) -> Self {
        let mut request = Self::default();
        request.params.set("templatefilter", filter);
        request
    }

    param_setters! {
        id => "id",
        name => "name",
        zone_id => "zoneid",
        hypervisor => "hypervisor",
    }
    list_filters!();
    tag_filter!();
}

api_request!(
    /// Parameters for `deleteTemplate`
    DeleteTemplateRequest => "deleteTemplate"
);

impl DeleteTemplateRequest {
    pub fn new(id: impl Into<String>) -> Self {
        let mut request = Self::default();
        request.params.set("id", id);
        request
    }

    param_setters! {
        /// Delete only the copy in this zone
        zone_id => "zoneid",
    }
    bool_setters! {
        /// Delete even if VMs still use the template
        forced => "forced",
    }
}

/// Handler for templates
pub struct TemplateHandler {
    client: CloudStackClient,
}

impl TemplateHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// List templates
    pub async fn list(&self, request: ListTemplatesRequest) -> Result<ListResponse<Template>> {
        self.client.request_list(&request, "template").await
    }

    /// Get an executable template by id
    pub async fn get(&self, id: &str) -> Result<Template> {
        let templates = self
            .list(ListTemplatesRequest::new(EXECUTABLE).id(id))
            .await?;
        first_or_not_found("template", id, templates)
    }

    /// Resolve an executable template name to its id, optionally within one zone
    pub async fn get_id(&self, name: &str, zone_id: Option<&str>) -> Result<String> {
        let mut request = ListTemplatesRequest::new(EXECUTABLE).name(name);
        if let Some(zone_id) = zone_id {
            request = request.zone_id(zone_id);
        }
        // Cross-zone templates appear once per zone with the same id
        let mut templates = self.list(request).await?.items;
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates.dedup_by(|a, b| a.id == b.id);
        Ok(exactly_one("template", name, templates, |t| t.name.as_str())?.id)
    }

    /// Delete a template
    pub async fn delete(
        &self,
        request: DeleteTemplateRequest,
    ) -> Result<PendingJob<SuccessResponse>> {
        self.client.submit(&request, None).await
    }
}
