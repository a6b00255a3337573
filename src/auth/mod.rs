// Authentication module
// Token caching, OAuth 2 token fetching and credential loading

mod cache;
mod credentials;
mod fetcher;
mod types;

pub use cache::{TokenCache, EXPIRY_BUFFER_SECS};
pub use credentials::{
    extract_region_from_secret_arn, parse_secret_string, SecretStore, SecretsManagerStore,
};
pub use fetcher::{basic_auth_header, DefaultTokenFetcher, TokenFetcher, TOKEN_PATH};
pub use types::{AuthConfig, OAuthCredentials};
