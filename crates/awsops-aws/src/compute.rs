//! EC2 instance lifecycle operations
//!
//! Thin, sequential glue over the EC2 SDK: every operation is a single
//! API call (plus the bootstrap describe-or-create dance for key pairs
//! and security groups), decoded into explicit record types so nothing
//! downstream touches SDK response shapes.

use std::time::Duration;

use aws_config::SdkConfig;
use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::{
    BlockDeviceMapping, EbsBlockDevice, Filter, InstanceStateName, InstanceType, IpPermission,
    IpRange, Placement, Tag, VolumeType,
};
use aws_sdk_ec2::Client;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::{sleep, Instant};

use awsops_core::error::{AwsopsError, Result};

const SSH_PORT: i32 = 22;
const ANYWHERE: &str = "0.0.0.0/0";
const TAG_SETTLE_DELAY: Duration = Duration::from_secs(5);
const RUNNING_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Everything needed to launch a batch of instances
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// AMI to launch from
    pub image_id: String,
    /// Key pair name (created on demand if missing)
    pub key_pair: String,
    /// Security group name (created on demand if missing)
    pub security_group: String,
    /// Instance type, e.g. "t2.micro"
    pub instance_type: String,
    /// Number of instances (min == max)
    pub count: i32,
    /// Availability zone; empty lets the vendor pick
    pub zone: String,
    /// EBS device name, e.g. "/dev/sda1"
    pub ebs_device_name: String,
    /// EBS volume size in GB
    pub ebs_volume_size: i32,
    /// EBS volume type, e.g. "gp2"
    pub ebs_volume_type: String,
    /// Delete the volume when the instance terminates
    pub ebs_delete_on_termination: bool,
    /// Provisioned IOPS; only applied to non-gp2 volume types
    pub iops: i32,
}

/// Decoded instance description
#[derive(Debug, Clone, Default)]
pub struct InstanceSummary {
    pub instance_id: String,
    pub image_id: String,
    pub state: String,
    pub state_reason: String,
    pub instance_type: String,
    pub key_name: String,
    pub monitoring: String,
    pub zone: String,
    pub private_dns: String,
    pub private_ip: String,
    pub public_dns: String,
    pub public_ip: String,
    pub subnet_id: String,
    pub vpc_id: String,
    pub tags: Vec<(String, String)>,
    pub core_count: i32,
    pub threads_per_core: i32,
    pub security_groups: Vec<String>,
}

impl InstanceSummary {
    /// Value of the Name tag, if the instance carries one
    pub fn name_tag(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|(key, _)| key == "Name")
            .map(|(_, value)| value.as_str())
    }
}

/// Result of a start/stop/terminate state transition
#[derive(Debug, Clone)]
pub struct StateChange {
    pub instance_id: String,
    pub previous_state: String,
    pub current_state: String,
}

/// Key pair resolution outcome; `material` is present only when a new
/// key pair was created and must be surfaced to the user exactly once
#[derive(Debug, Clone)]
pub struct KeyPairHandle {
    pub name: String,
    pub material: Option<String>,
}

/// Decoded security group description
#[derive(Debug, Clone)]
pub struct SecurityGroupSummary {
    pub name: String,
    pub group_id: String,
    pub description: String,
    /// `(from-port, cidr)` pairs of the ingress permissions
    pub permissions: Vec<(i32, String)>,
}

/// EC2 client wrapper carrying the dry-run flag for every mutating call
pub struct Ec2Compute {
    client: Client,
    dry_run: bool,
}

impl Ec2Compute {
    /// Create a client from shared AWS configuration
    pub fn new(config: &SdkConfig, dry_run: bool) -> Self {
        Self {
            client: Client::new(config),
            dry_run,
        }
    }

    /// Describe every instance visible to the account
    pub async fn list_instances(&self) -> Result<Vec<InstanceSummary>> {
        let response = self
            .client
            .describe_instances()
            .send()
            .await
            .map_err(compute_err)?;
        Ok(decode_reservations(response.reservations()))
    }

    /// Describe a specific set of instances
    pub async fn describe_instances(&self, instance_ids: &[String]) -> Result<Vec<InstanceSummary>> {
        let response = self
            .client
            .describe_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .send()
            .await
            .map_err(compute_err)?;
        Ok(decode_reservations(response.reservations()))
    }

    /// List region names
    pub async fn list_regions(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .describe_regions()
            .send()
            .await
            .map_err(compute_err)?;
        Ok(response
            .regions()
            .iter()
            .filter_map(|region| region.region_name().map(str::to_string))
            .collect())
    }

    /// List availability zone names for the configured region
    pub async fn list_zones(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .describe_availability_zones()
            .send()
            .await
            .map_err(compute_err)?;
        Ok(response
            .availability_zones()
            .iter()
            .filter_map(|zone| zone.zone_name().map(str::to_string))
            .collect())
    }

    /// List public Ubuntu machine images as `(name, image id)` pairs
    pub async fn list_images(&self) -> Result<Vec<(String, String)>> {
        let filters = [
            ("name", "ubuntu*"),
            ("state", "available"),
            ("architecture", "x86_64"),
            ("root-device-type", "ebs"),
            ("virtualization-type", "hvm"),
            ("hypervisor", "xen"),
            ("image-type", "machine"),
            ("is-public", "true"),
        ];

        let mut request = self.client.describe_images();
        for (name, value) in filters {
            request = request.filters(Filter::builder().name(name).values(value).build());
        }

        let response = request.send().await.map_err(compute_err)?;
        Ok(response
            .images()
            .iter()
            .filter_map(|image| {
                Some((
                    image.name()?.to_string(),
                    image.image_id()?.to_string(),
                ))
            })
            .collect())
    }

    /// List key pair names
    pub async fn list_key_pairs(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .describe_key_pairs()
            .send()
            .await
            .map_err(compute_err)?;
        Ok(response
            .key_pairs()
            .iter()
            .filter_map(|pair| pair.key_name().map(str::to_string))
            .collect())
    }

    /// Describe every security group
    pub async fn list_security_groups(&self) -> Result<Vec<SecurityGroupSummary>> {
        let response = self
            .client
            .describe_security_groups()
            .send()
            .await
            .map_err(compute_err)?;
        Ok(response
            .security_groups()
            .iter()
            .map(|group| SecurityGroupSummary {
                name: group.group_name().unwrap_or_default().to_string(),
                group_id: group.group_id().unwrap_or_default().to_string(),
                description: group.description().unwrap_or_default().to_string(),
                permissions: group
                    .ip_permissions()
                    .iter()
                    .flat_map(|permission| {
                        let port = permission.from_port().unwrap_or_default();
                        permission.ip_ranges().iter().filter_map(move |range| {
                            range.cidr_ip().map(|cidr| (port, cidr.to_string()))
                        })
                    })
                    .collect(),
            })
            .collect())
    }

    /// Use an existing key pair, or create one if the name is unknown.
    ///
    /// The created key's private material is returned so the caller can
    /// show it; the vendor never exposes it again.
    pub async fn ensure_key_pair(&self, name: &str) -> Result<KeyPairHandle> {
        let described = self
            .client
            .describe_key_pairs()
            .key_names(name)
            .send()
            .await;

        match described {
            Ok(response) => {
                let existing = response
                    .key_pairs()
                    .first()
                    .and_then(|pair| pair.key_name())
                    .unwrap_or(name)
                    .to_string();
                Ok(KeyPairHandle {
                    name: existing,
                    material: None,
                })
            }
            Err(err) if error_code(&err) == Some("InvalidKeyPair.NotFound") => {
                tracing::info!(key_pair = name, "key pair not found, creating a new one");
                let created = self
                    .client
                    .create_key_pair()
                    .key_name(name)
                    .dry_run(self.dry_run)
                    .send()
                    .await
                    .map_err(compute_err)?;
                Ok(KeyPairHandle {
                    name: created.key_name().unwrap_or(name).to_string(),
                    material: created.key_material().map(str::to_string),
                })
            }
            Err(err) => Err(compute_err(err)),
        }
    }

    /// Use an existing security group, or create an SSH-only group if the
    /// name is unknown (tcp/22 open to the world, matching the bootstrap
    /// behavior users expect from this tool).
    pub async fn ensure_security_group(&self, name: &str) -> Result<String> {
        let described = self
            .client
            .describe_security_groups()
            .group_names(name)
            .send()
            .await;

        match described {
            Ok(response) => Ok(response
                .security_groups()
                .first()
                .and_then(|group| group.group_name())
                .unwrap_or(name)
                .to_string()),
            Err(err) if error_code(&err) == Some("InvalidGroup.NotFound") => {
                tracing::info!(
                    security_group = name,
                    "security group not found, creating a new one"
                );
                self.client
                    .create_security_group()
                    .group_name(name)
                    .description("Security Group for SSH access only")
                    .dry_run(self.dry_run)
                    .send()
                    .await
                    .map_err(compute_err)?;

                tracing::info!(security_group = name, "authorizing SSH ingress");
                self.client
                    .authorize_security_group_ingress()
                    .group_name(name)
                    .ip_permissions(
                        IpPermission::builder()
                            .ip_protocol("tcp")
                            .from_port(SSH_PORT)
                            .to_port(SSH_PORT)
                            .ip_ranges(IpRange::builder().cidr_ip(ANYWHERE).build())
                            .build(),
                    )
                    .dry_run(self.dry_run)
                    .send()
                    .await
                    .map_err(compute_err)?;

                Ok(name.to_string())
            }
            Err(err) => Err(compute_err(err)),
        }
    }

    /// Launch the described batch of instances. Returns the summaries as
    /// reported by the launch call itself (state will still be
    /// "pending"); callers wanting the settled view should wait and
    /// re-describe.
    pub async fn launch(&self, spec: &LaunchSpec) -> Result<Vec<InstanceSummary>> {
        let mut ebs = EbsBlockDevice::builder()
            .volume_size(spec.ebs_volume_size)
            .volume_type(VolumeType::from(spec.ebs_volume_type.as_str()))
            .delete_on_termination(spec.ebs_delete_on_termination);
        // the vendor rejects IOPS on gp2 volumes
        if spec.ebs_volume_type != "gp2" {
            ebs = ebs.iops(spec.iops);
        }

        let mut request = self
            .client
            .run_instances()
            .image_id(spec.image_id.as_str())
            .key_name(spec.key_pair.as_str())
            .instance_type(InstanceType::from(spec.instance_type.as_str()))
            .min_count(spec.count)
            .max_count(spec.count)
            .security_groups(spec.security_group.as_str())
            .block_device_mappings(
                BlockDeviceMapping::builder()
                    .device_name(spec.ebs_device_name.as_str())
                    .ebs(ebs.build())
                    .build(),
            )
            .dry_run(self.dry_run);

        if !spec.zone.is_empty() {
            request = request.placement(
                Placement::builder()
                    .availability_zone(spec.zone.as_str())
                    .build(),
            );
        }

        let response = request.send().await.map_err(compute_err)?;
        Ok(response.instances().iter().map(decode_instance).collect())
    }

    /// Apply a Name tag to each instance; instances beyond the first get
    /// a `-<index>` suffix. A short settle delay avoids tagging instances
    /// the control plane has not registered yet.
    pub async fn tag_instances(&self, instance_ids: &[String], name: &str) -> Result<()> {
        sleep(TAG_SETTLE_DELAY).await;

        for (index, instance_id) in instance_ids.iter().enumerate() {
            let value = if instance_ids.len() == 1 {
                name.to_string()
            } else {
                format!("{name}-{index}")
            };
            self.client
                .create_tags()
                .resources(instance_id.as_str())
                .tags(Tag::builder().key("Name").value(value).build())
                .send()
                .await
                .map_err(compute_err)?;
        }
        Ok(())
    }

    /// Poll until every instance reports the running state, or time out.
    pub async fn wait_until_running(
        &self,
        instance_ids: &[String],
        timeout: Duration,
        show_progress: bool,
    ) -> Result<()> {
        let spinner = show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} [{elapsed_precise}]")
                    .unwrap(),
            );
            pb.set_message("waiting for instances to reach running state");
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        let deadline = Instant::now() + timeout;
        loop {
            let summaries = self.describe_instances(instance_ids).await?;
            let all_running = !summaries.is_empty()
                && summaries
                    .iter()
                    .all(|summary| summary.state == InstanceStateName::Running.as_str());
            if all_running {
                if let Some(pb) = &spinner {
                    pb.finish_with_message("instances running");
                }
                return Ok(());
            }

            if Instant::now() >= deadline {
                if let Some(pb) = &spinner {
                    pb.finish_and_clear();
                }
                return Err(AwsopsError::Compute(
                    format!(
                        "instances did not reach running state within {}s",
                        timeout.as_secs()
                    )
                    .into(),
                ));
            }

            sleep(RUNNING_POLL_INTERVAL).await;
        }
    }

    /// Start the given instances
    pub async fn start_instances(&self, instance_ids: &[String]) -> Result<Vec<StateChange>> {
        let response = self
            .client
            .start_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .dry_run(self.dry_run)
            .send()
            .await
            .map_err(compute_err)?;
        Ok(response
            .starting_instances()
            .iter()
            .map(decode_state_change)
            .collect())
    }

    /// Stop the given instances
    pub async fn stop_instances(&self, instance_ids: &[String]) -> Result<Vec<StateChange>> {
        let response = self
            .client
            .stop_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .dry_run(self.dry_run)
            .send()
            .await
            .map_err(compute_err)?;
        Ok(response
            .stopping_instances()
            .iter()
            .map(decode_state_change)
            .collect())
    }

    /// Terminate the given instances
    pub async fn terminate_instances(&self, instance_ids: &[String]) -> Result<Vec<StateChange>> {
        let response = self
            .client
            .terminate_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .dry_run(self.dry_run)
            .send()
            .await
            .map_err(compute_err)?;
        Ok(response
            .terminating_instances()
            .iter()
            .map(decode_state_change)
            .collect())
    }
}

fn decode_reservations(
    reservations: &[aws_sdk_ec2::types::Reservation],
) -> Vec<InstanceSummary> {
    reservations
        .iter()
        .flat_map(|reservation| reservation.instances().iter().map(decode_instance))
        .collect()
}

fn decode_instance(instance: &aws_sdk_ec2::types::Instance) -> InstanceSummary {
    InstanceSummary {
        instance_id: instance.instance_id().unwrap_or_default().to_string(),
        image_id: instance.image_id().unwrap_or_default().to_string(),
        state: instance
            .state()
            .and_then(|state| state.name())
            .map(|name| name.as_str().to_string())
            .unwrap_or_default(),
        state_reason: instance
            .state_transition_reason()
            .unwrap_or_default()
            .to_string(),
        instance_type: instance
            .instance_type()
            .map(|ty| ty.as_str().to_string())
            .unwrap_or_default(),
        key_name: instance.key_name().unwrap_or_default().to_string(),
        monitoring: instance
            .monitoring()
            .and_then(|monitoring| monitoring.state())
            .map(|state| state.as_str().to_string())
            .unwrap_or_default(),
        zone: instance
            .placement()
            .and_then(|placement| placement.availability_zone())
            .unwrap_or_default()
            .to_string(),
        private_dns: instance.private_dns_name().unwrap_or_default().to_string(),
        private_ip: instance.private_ip_address().unwrap_or_default().to_string(),
        public_dns: instance.public_dns_name().unwrap_or_default().to_string(),
        public_ip: instance.public_ip_address().unwrap_or_default().to_string(),
        subnet_id: instance.subnet_id().unwrap_or_default().to_string(),
        vpc_id: instance.vpc_id().unwrap_or_default().to_string(),
        tags: instance
            .tags()
            .iter()
            .filter_map(|tag| Some((tag.key()?.to_string(), tag.value()?.to_string())))
            .collect(),
        core_count: instance
            .cpu_options()
            .and_then(|options| options.core_count())
            .unwrap_or_default(),
        threads_per_core: instance
            .cpu_options()
            .and_then(|options| options.threads_per_core())
            .unwrap_or_default(),
        security_groups: instance
            .security_groups()
            .iter()
            .filter_map(|group| group.group_name().map(str::to_string))
            .collect(),
    }
}

fn decode_state_change(change: &aws_sdk_ec2::types::InstanceStateChange) -> StateChange {
    StateChange {
        instance_id: change.instance_id().unwrap_or_default().to_string(),
        previous_state: change
            .previous_state()
            .and_then(|state| state.name())
            .map(|name| name.as_str().to_string())
            .unwrap_or_default(),
        current_state: change
            .current_state()
            .and_then(|state| state.name())
            .map(|name| name.as_str().to_string())
            .unwrap_or_default(),
    }
}

fn compute_err<E>(err: E) -> AwsopsError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AwsopsError::Compute(Box::new(err))
}

fn error_code<E, R>(err: &SdkError<E, R>) -> Option<&str>
where
    E: ProvideErrorMetadata,
{
    err.as_service_error().and_then(|service| service.meta().code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_tag_lookup() {
        let summary = InstanceSummary {
            tags: vec![
                ("env".to_string(), "prod".to_string()),
                ("Name".to_string(), "worker-0".to_string()),
            ],
            ..InstanceSummary::default()
        };
        assert_eq!(summary.name_tag(), Some("worker-0"));
        assert_eq!(InstanceSummary::default().name_tag(), None);
    }
}
