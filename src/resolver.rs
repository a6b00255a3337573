// Region and domain resolution, input validation

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::error::{ApiError, Result};

static API_DOMAIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"api[-.]([a-z0-9-]+)\.cresta\.(ai|com)").unwrap());

static VIRTUAL_AGENT_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^customers/([^/]+)/profiles/([^/]+)/virtualAgents/([^/]+)$").unwrap()
});

static REGION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// Regions whose tokens are issued by another region's auth endpoint
const AUTH_REGION_OVERRIDES: &[(&str, &str)] = &[
    ("chat-prod", "us-west-2-prod"),
    ("voice-prod", "us-west-2-prod"),
];

/// Components of `customers/{customer}/profiles/{profile}/virtualAgents/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualAgentName {
    pub customer: String,
    pub profile: String,
    pub virtual_agent_id: String,
}

impl VirtualAgentName {
    /// Parse and validate each path segment
    pub fn parse(name: &str) -> Result<Self> {
        let caps = VIRTUAL_AGENT_NAME_PATTERN.captures(name).ok_or_else(|| {
            ApiError::ValidationError(format!(
                "invalid virtual agent name: {}. Expected format: customers/{{customer}}/profiles/{{profile}}/virtualAgents/{{virtualAgentID}}",
                name
            ))
        })?;

        let parsed = Self {
            customer: caps[1].to_string(),
            profile: caps[2].to_string(),
            virtual_agent_id: caps[3].to_string(),
        };

        validate_path_segment(&parsed.customer, "customer")?;
        validate_path_segment(&parsed.profile, "profile")?;
        validate_path_segment(&parsed.virtual_agent_id, "virtualAgentID")?;

        Ok(parsed)
    }

    /// Resource name as used in API paths
    pub fn resource_name(&self) -> String {
        format!(
            "customers/{}/profiles/{}/virtualAgents/{}",
            self.customer, self.profile, self.virtual_agent_id
        )
    }
}

/// Build the API domain for a region
///
/// - us-west-2-prod → https://api.us-west-2-prod.cresta.com
/// - us-west-2-staging → https://api.us-west-2-staging.cresta.ai
pub fn build_api_domain_from_region(region: &str) -> Result<String> {
    let normalized = region.to_lowercase();
    if !REGION_PATTERN.is_match(&normalized) {
        return Err(ApiError::ValidationError(format!("invalid region: {}", region)));
    }

    if normalized.ends_with("-prod") {
        Ok(format!("https://api.{}.cresta.com", normalized))
    } else {
        Ok(format!("https://api.{}.cresta.ai", normalized))
    }
}

/// Extract the region from an API domain such as https://api.us-west-2-prod.cresta.com
pub fn extract_region_from_domain(api_domain: &str) -> Result<String> {
    API_DOMAIN_PATTERN
        .captures(api_domain)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            ApiError::ValidationError(format!(
                "could not extract region from domain: {}",
                api_domain
            ))
        })
}

/// Map a region to the region hosting its auth endpoint
pub fn get_auth_region(region: &str) -> &str {
    AUTH_REGION_OVERRIDES
        .iter()
        .find(|(from, _)| *from == region)
        .map(|(_, to)| *to)
        .unwrap_or(region)
}

/// Default OAuth domain for a region
pub fn build_auth_domain_from_region(region: &str) -> String {
    format!("https://auth.{}.cresta.ai", get_auth_region(region))
}

/// Prefix `https://` when the domain has no scheme
pub fn normalize_domain(domain: &str) -> String {
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

/// Check that a domain is a bare HTTPS origin
///
/// Plain HTTP is accepted only for loopback hosts (local testing).
pub fn validate_domain(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(ApiError::ValidationError("domain cannot be empty".to_string()));
    }

    let url = Url::parse(domain)
        .map_err(|e| ApiError::ValidationError(format!("invalid domain URL: {}", e)))?;

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ApiError::ValidationError("domain must have a host".to_string()))?;

    let is_loopback = host == "localhost" || host.starts_with("127.");
    if url.scheme() != "https" && !(url.scheme() == "http" && is_loopback) {
        return Err(ApiError::ValidationError(format!(
            "domain must use HTTPS scheme, got: {}",
            url.scheme()
        )));
    }

    if url.path() != "" && url.path() != "/" {
        return Err(ApiError::ValidationError(format!(
            "domain cannot contain path components: {}",
            url.path()
        )));
    }
    if let Some(query) = url.query() {
        return Err(ApiError::ValidationError(format!(
            "domain cannot contain query parameters: {}",
            query
        )));
    }
    if let Some(fragment) = url.fragment() {
        return Err(ApiError::ValidationError(format!(
            "domain cannot contain fragment: {}",
            fragment
        )));
    }
    if host.contains('/') || host.contains("..") {
        return Err(ApiError::ValidationError(
            "domain host contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Reject path segments that could escape the intended API path
pub fn validate_path_segment(segment: &str, name: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(ApiError::ValidationError(format!("{} cannot be empty", name)));
    }
    if segment.contains("..") || segment.contains('/') {
        return Err(ApiError::ValidationError(format!(
            "{} contains invalid characters (path traversal detected): {}",
            name, segment
        )));
    }
    if segment.to_lowercase().contains("%2e%2e") {
        return Err(ApiError::ValidationError(format!(
            "{} contains URL-encoded path traversal: {}",
            name, segment
        )));
    }
    if segment.contains('\0') {
        return Err(ApiError::ValidationError(format!(
            "{} contains null byte",
            name
        )));
    }
    Ok(())
}
