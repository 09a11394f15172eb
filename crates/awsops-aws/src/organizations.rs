//! Billing organization lookup
//!
//! Standalone accounts are not an error: the vendor answers
//! `AWSOrganizationsNotInUseException` (or denies access) and the lookup
//! degrades to `None`. Anything else propagates.

use aws_config::SdkConfig;
use aws_sdk_organizations::error::ProvideErrorMetadata;
use aws_sdk_organizations::Client;

use awsops_core::error::{AwsopsError, Result};

/// Identity of the billing organization, when the account belongs to one
#[derive(Debug, Clone)]
pub struct OrganizationInfo {
    pub id: String,
    pub master_account_email: String,
}

/// Look up the organization the current credentials belong to.
pub async fn organization_info(config: &SdkConfig) -> Result<Option<OrganizationInfo>> {
    let client = Client::new(config);

    match client.describe_organization().send().await {
        Ok(response) => Ok(response.organization().map(|org| OrganizationInfo {
            id: org.id().unwrap_or_default().to_string(),
            master_account_email: org.master_account_email().unwrap_or_default().to_string(),
        })),
        Err(err) => {
            let code = err.as_service_error().and_then(|service| service.meta().code());
            match code {
                Some("AWSOrganizationsNotInUseException") | Some("AccessDeniedException") => {
                    tracing::debug!("no billing organization visible, continuing without one");
                    Ok(None)
                }
                _ => Err(AwsopsError::Transport(Box::new(err))),
            }
        }
    }
}
