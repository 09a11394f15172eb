//! awsops - Manage EC2 instances and AWS usage cost reports

use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use awsops::cli::{self, Cli, Command, LaunchArgs, WindowArgs};
use awsops::email::{self, EmailOptions};
use awsops::output;
use awsops::remote::RemoteExec;
use awsops_aws::compute::{Ec2Compute, LaunchSpec};
use awsops_aws::{load_config, organization_info, CostExplorerBilling, SdkConfig};
use awsops_core::aggregation::{self, CostReport};
use awsops_core::date_range::DateRange;
use awsops_core::error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("awsops=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("awsops=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.profile.as_deref(), cli.region.as_deref()).await;

    match cli.command {
        Command::CreateInstances(args) => {
            create_instances(&config, cli.dry_run, args).await?;
        }

        Command::StartInstances(args) => {
            let compute = Ec2Compute::new(&config, cli.dry_run);
            info!("starting instances {:?}", args.instance_ids);
            let changes = compute.start_instances(&args.instance_ids).await?;
            print!("{}", output::render_state_changes(&changes));
        }

        Command::StopInstances(args) => {
            if args.yes
                || cli::confirm(&format!(
                    "Following instances will be stopped {:?}\n\nAre you sure you want to stop instances?",
                    args.instance_ids
                ))?
            {
                let compute = Ec2Compute::new(&config, cli.dry_run);
                info!("stopping instances {:?}", args.instance_ids);
                let changes = compute.stop_instances(&args.instance_ids).await?;
                print!("{}", output::render_state_changes(&changes));
            }
        }

        Command::TerminateInstances(args) => {
            if args.yes
                || cli::confirm(&format!(
                    "Following instances will be terminated {:?}\n\nAre you sure you want to terminate instances?",
                    args.instance_ids
                ))?
            {
                let compute = Ec2Compute::new(&config, cli.dry_run);
                info!("terminating instances {:?}", args.instance_ids);
                let changes = compute.terminate_instances(&args.instance_ids).await?;
                print!("{}", output::render_state_changes(&changes));
            }
        }

        Command::ListInstances => {
            let compute = Ec2Compute::new(&config, cli.dry_run);
            let instances = compute.list_instances().await?;
            println!("{}", output::instances_table(&instances));
        }

        Command::ListRegions => {
            let compute = Ec2Compute::new(&config, cli.dry_run);
            for region in compute.list_regions().await? {
                println!("{region}");
            }
        }

        Command::ListZones => {
            let compute = Ec2Compute::new(&config, cli.dry_run);
            for zone in compute.list_zones().await? {
                println!("{zone}");
            }
        }

        Command::ListImages => {
            let compute = Ec2Compute::new(&config, cli.dry_run);
            let images = compute.list_images().await?;
            println!("{}", output::images_table(&images));
        }

        Command::ListSecGroups => {
            let compute = Ec2Compute::new(&config, cli.dry_run);
            let groups = compute.list_security_groups().await?;
            println!("{}", output::security_groups_table(&groups));
        }

        Command::ListKeyPairs => {
            let compute = Ec2Compute::new(&config, cli.dry_run);
            for key_pair in compute.list_key_pairs().await? {
                println!("{key_pair}");
            }
        }

        Command::ListCosts(args) => {
            if let Some(org) = organization_info(&config).await? {
                println!(
                    "Organization Id = {}\nOrganization Master Account = {}",
                    org.id, org.master_account_email
                );
            }

            let report = build_report(&config, &args.window).await?;
            if args.json {
                println!("{}", output::render_report_json(&report));
            } else {
                print!("{}", output::render_report(&report));
            }
        }

        Command::EmailCosts(args) => {
            let report = build_report(&config, &args.window).await?;
            let organization = organization_info(&config).await?;

            let options = EmailOptions {
                recipients: args.emails,
                smtp_host: args.smtp_host,
                smtp_port: args.smtp_port,
                sender: args.smtp_from,
                subject: args.subject,
            };
            email::send_report(
                &options,
                &report,
                organization.as_ref(),
                output::render_report(&report),
            )
            .await?;
        }

        Command::InstallDocker(args) => {
            let compute = Ec2Compute::new(&config, cli.dry_run);
            let instances = compute.describe_instances(&args.instance_ids).await?;
            let exec = RemoteExec::new(args.user, Some(args.identity));

            for instance in instances {
                if instance.public_dns.is_empty() {
                    tracing::warn!(
                        instance = %instance.instance_id,
                        "no public DNS name, skipping"
                    );
                    continue;
                }
                info!(
                    "installing docker on {} ({})",
                    instance.instance_id, instance.public_dns
                );
                exec.install_docker(&instance.public_dns).await?;
            }
        }
    }

    Ok(())
}

/// Run the cost pipeline end to end: resolve the window, build the
/// account directory, pull every page, aggregate.
async fn build_report(config: &SdkConfig, window: &WindowArgs) -> Result<CostReport> {
    let range = DateRange::resolve(&window.selector())?;
    info!("cost window {} to {}", range.start_str(), range.end_str());

    let billing = CostExplorerBilling::new(config);
    aggregation::generate_report(&billing, &range, window.grouping(), window.label()).await
}

async fn create_instances(config: &SdkConfig, dry_run: bool, args: LaunchArgs) -> Result<()> {
    args.validate()?;
    let compute = Ec2Compute::new(config, dry_run);

    let key_pair = compute.ensure_key_pair(&args.key_pair).await?;
    if let Some(material) = &key_pair.material {
        println!("Go save the key material below\n\n{material}\n");
    }
    info!("using key pair '{}'", key_pair.name);

    let security_group = compute.ensure_security_group(&args.sec_group).await?;
    info!("using security group '{security_group}'");

    let spec = LaunchSpec {
        image_id: args.ami.clone(),
        key_pair: key_pair.name,
        security_group,
        instance_type: args.instance_type.clone(),
        count: args.count,
        zone: args.zone.clone(),
        ebs_device_name: args.ebs_vol_name.clone(),
        ebs_volume_size: args.ebs_vol_size,
        ebs_volume_type: args.ebs_vol_type.clone(),
        ebs_delete_on_termination: args.ebs_delete,
        iops: args.iops,
    };

    let launched = compute.launch(&spec).await?;
    for instance in &launched {
        println!(
            "instance launched at '{}', {} ({})",
            instance.zone, instance.instance_id, instance.state
        );
    }
    let instance_ids: Vec<String> = launched
        .iter()
        .map(|instance| instance.instance_id.clone())
        .collect();

    if let Some(name) = &args.name {
        info!("tagging instances");
        compute.tag_instances(&instance_ids, name).await?;
    }

    if !args.do_not_wait || args.install_docker {
        let show_progress = is_terminal::is_terminal(std::io::stdout());
        compute
            .wait_until_running(&instance_ids, Duration::from_secs(args.wait), show_progress)
            .await?;
    }

    let instances = compute.describe_instances(&instance_ids).await?;
    for instance in &instances {
        print!("{}", output::instance_details(instance));
    }

    if args.install_docker {
        // validate() has already required both flags
        if let Some((user, identity)) = args.provisioning() {
            let exec = RemoteExec::new(user, Some(identity));
            for instance in &instances {
                info!(
                    "installing docker on {} ({})",
                    instance.instance_id, instance.public_dns
                );
                exec.install_docker(&instance.public_dns).await?;
            }
        }
    }

    info!("instances created");
    Ok(())
}
