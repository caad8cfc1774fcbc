//! Resource tags

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{api_request, list_filters, param_setters};
use crate::types::{ListResponse, SuccessResponse, Tag};
use std::collections::HashMap;

api_request!(
    /// Parameters for `createTags`
    CreateTagsRequest => "createTags"
);

impl CreateTagsRequest {
    /// Tag every resource in `resource_ids`; `resource_type` is e.g. `UserVm`,
    /// `Volume` or `Network`
    pub fn new<I, S>(
        resource_type: impl Into<String>,
        resource_ids: I,
        tags: &HashMap<String, String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::default();
        request
            .params
            .set("resourcetype", resource_type)
            .set_list("resourceids", resource_ids)
            .set_key_value_map("tags", tags);
        request
    }

    param_setters! {
        customer => "customer",
    }
}

api_request!(
    /// Parameters for `deleteTags`
    DeleteTagsRequest => "deleteTags"
);

impl DeleteTagsRequest {
    /// Remove all tags from the resources unless narrowed with [`Self::tags`]
    pub fn new<I, S>(resource_type: impl Into<String>, resource_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::default();
        request
            .params
            .set("resourcetype", resource_type)
            .set_list("resourceids", resource_ids);
        request
    }

    /// Only delete these tags; an empty value matches any value
    #[must_use]
    pub fn tags(mut self, tags: &HashMap<String, String>) -> Self {
        self.params.set_key_value_map("tags", tags);
        self
    }
}

api_request!(
    /// Parameters for `listTags`
    ListTagsRequest => "listTags"
);

impl ListTagsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        key => "key",
        value => "value",
        resource_id => "resourceid",
        resource_type => "resourcetype",
        customer => "customer",
    }
    list_filters!();
}

/// Handler for resource tags
pub struct TagHandler {
    client: CloudStackClient,
}

impl TagHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Add tags to resources
    pub async fn create(&self, request: CreateTagsRequest) -> Result<PendingJob<SuccessResponse>> {
        self.client.submit(&request, None).await
    }

    /// Remove tags from resources
    pub async fn delete(&self, request: DeleteTagsRequest) -> Result<PendingJob<SuccessResponse>> {
        self.client.submit(&request, None).await
    }

    /// List tags
    pub async fn list(&self, request: ListTagsRequest) -> Result<ListResponse<Tag>> {
        self.client.request_list(&request, "tag").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ApiRequest;

    #[test]
    fn test_create_tags_params() {
        let tags = HashMap::from([
            ("env".to_string(), "prod".to_string()),
            ("Team".to_string(), "ops & dev".to_string()),
        ]);
        let request = CreateTagsRequest::new("UserVm", ["a", "b"], &tags);
        let params = request.params();

        assert_eq!(params.get("resourceids"), Some("a,b"));
        assert_eq!(params.get("resourcetype"), Some("UserVm"));
        // Byte order puts uppercase keys first
        assert_eq!(params.get("tags[0].key"), Some("Team"));
        assert_eq!(params.get("tags[1].key"), Some("env"));
    }
}
