//! awsops-aws - AWS SDK implementations of the awsops collaborators
//!
//! Everything in here is thin, sequential glue over the vendor SDKs:
//! - [`billing::CostExplorerBilling`] implements the core `BillingApi`
//!   trait over Cost Explorer
//! - [`compute::Ec2Compute`] wraps the EC2 instance lifecycle operations
//!   behind explicit record types
//! - [`organizations::organization_info`] looks up the billing
//!   organization, degrading gracefully for standalone accounts
//!
//! The decoding step at each boundary is the only place dynamic SDK
//! response shapes are touched; the rest of the workspace sees typed
//! records.

pub mod billing;
pub mod compute;
pub mod organizations;

pub use billing::CostExplorerBilling;
pub use compute::{Ec2Compute, InstanceSummary, KeyPairHandle, LaunchSpec, SecurityGroupSummary, StateChange};
pub use organizations::{organization_info, OrganizationInfo};

use aws_config::{BehaviorVersion, Region};
pub use aws_config::SdkConfig;

/// Load shared AWS configuration, honoring profile and region overrides.
///
/// With neither override set this resolves exactly like the AWS CLI:
/// environment, shared config files, then instance metadata.
pub async fn load_config(profile: Option<&str>, region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}
