//! API constants and endpoint builders for the HubSpot CRM v3 API

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

/// Root for CRM object endpoints
pub const CRM_OBJECTS_ROOT: &str = "/crm/v3/objects";

/// Root for property schema endpoints
pub const CRM_PROPERTIES_ROOT: &str = "/crm/v3/properties";

/// Root for marketing endpoints (forms)
pub const MARKETING_ROOT: &str = "/marketing/v3";

/// HubSpot max items per page for list and search
pub const MAX_PAGE_SIZE: usize = 100;

/// Batch read chunk size
pub const BATCH_READ_LIMIT: usize = 100;

/// Batch write chunk size for contacts
pub const CONTACT_BATCH_LIMIT: usize = 10;

/// Batch write chunk size for every other object type
pub const DEFAULT_BATCH_LIMIT: usize = 100;

/// Property requested when only the search total matters
pub const OBJECT_ID_PROPERTY: &str = "hs_object_id";

/// Pause between search pages; search endpoints have a tighter rate limit
pub const SEARCH_PAGE_DELAY_MS: u64 = 200;

/// Standard headers for HubSpot requests
pub mod headers {
    /// Content type for JSON requests
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Server hint for how long to back off after a 429
    pub const RETRY_AFTER: &str = "Retry-After";

    /// Correlation id attached to every request for log tracing
    pub const X_CORRELATION_ID: &str = "X-Correlation-Id";

    pub const USER_AGENT: &str = "hubspot-crm/0.1";
}

/// Collection endpoint for a resource, e.g. `/crm/v3/objects/contacts`
pub fn collection_endpoint(api_root: &str, resource: &str) -> String {
    format!("{}/{}", api_root, resource)
}

/// Single record endpoint, e.g. `/crm/v3/objects/contacts/123`
pub fn record_endpoint(api_root: &str, resource: &str, id: &str) -> String {
    format!("{}/{}/{}", api_root, resource, urlencoding::encode(id))
}

/// Search endpoint, e.g. `/crm/v3/objects/contacts/search`
pub fn search_endpoint(api_root: &str, resource: &str) -> String {
    format!("{}/{}/search", api_root, resource)
}

/// Batch endpoint for an action, e.g. `/crm/v3/objects/contacts/batch/upsert`
pub fn batch_endpoint(api_root: &str, resource: &str, action: &str) -> String {
    format!("{}/{}/batch/{}", api_root, resource, action)
}

/// Property schema endpoint, e.g. `/crm/v3/properties/contacts`
pub fn properties_endpoint(resource: &str) -> String {
    format!("{}/{}", CRM_PROPERTIES_ROOT, resource)
}

/// Legacy v1 endpoint resolving a contact from a `hubspotutk` tracking cookie
pub fn contact_by_token_endpoint(token: &str) -> String {
    format!("/contacts/v1/contact/utk/{}/profile", urlencoding::encode(token))
}
