use std::path::Path;

use google_cloud_auth::credentials::{self, CacheableResource, Credentials, service_account};
use http::{Extensions, HeaderMap};

use super::{DataflowError, Result};

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Produces the authorization headers attached to every API request.
#[derive(Clone, Debug)]
pub enum Authenticator {
    Google(Credentials),
    /// No credentials at all. Only useful against emulators.
    Anonymous,
}

impl Authenticator {
    /// Builds credentials from a service-account key file when `path` is
    /// given, otherwise from Application Default Credentials.
    pub async fn from_environment(path: Option<&Path>) -> Result<Self> {
        let credentials = match path {
            Some(path) => {
                log::debug!("Loading service account key from {}", path.display());
                let raw = tokio::fs::read(path).await.map_err(|e| {
                    DataflowError::Credentials(format!("cannot read {}: {e}", path.display()))
                })?;
                let json: serde_json::Value = serde_json::from_slice(&raw).map_err(|e| {
                    DataflowError::Credentials(format!("{} is not valid JSON: {e}", path.display()))
                })?;
                service_account::Builder::new(json)
                    .with_access_specifier(service_account::AccessSpecifier::from_scopes([
                        CLOUD_PLATFORM_SCOPE,
                    ]))
                    .build()
                    .map_err(|e| DataflowError::Credentials(e.to_string()))?
            }
            None => {
                log::debug!("Using application default credentials");
                credentials::Builder::default()
                    .with_scopes([CLOUD_PLATFORM_SCOPE])
                    .build()
                    .map_err(|e| DataflowError::Credentials(e.to_string()))?
            }
        };
        Ok(Self::Google(credentials))
    }

    pub async fn headers(&self) -> Result<HeaderMap> {
        match self {
            Self::Anonymous => Ok(HeaderMap::new()),
            Self::Google(credentials) => {
                match credentials
                    .headers(Extensions::new())
                    .await
                    .map_err(|e| DataflowError::Credentials(e.to_string()))?
                {
                    CacheableResource::New { data, .. } => Ok(data),
                    // Only returned when the request carried an entity tag.
                    CacheableResource::NotModified => Err(DataflowError::Credentials(
                        "credential provider returned no headers".to_string(),
                    )),
                }
            }
        }
    }
}
