//! CLI interface for awsops
//!
//! Defines the command-line surface with clap: one kebab-case subcommand
//! per action plus a handful of global connection flags. The time-window
//! flags translate into the core's immutable [`PeriodSelector`]; nothing
//! here is shared mutable state.
//!
//! # Example
//!
//! ```bash
//! # Current month's costs, broken down per account and service
//! awsops list-costs
//!
//! # Costs for the trailing 30 days, machine readable
//! awsops list-costs --days 30 --json
//!
//! # Launch two tagged instances and wait for them
//! awsops create-instances -c 2 -k mykey -s ssh-only -n worker
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use awsops_core::aggregation::PeriodLabel;
use awsops_core::billing::Grouping;
use awsops_core::date_range::PeriodSelector;
use awsops_core::error::{AwsopsError, Result};

/// Ubuntu Server 16.04 LTS SSD
pub const DEFAULT_AMI: &str = "ami-de8fb135";

/// Manage EC2 instances and AWS usage cost reports
#[derive(Parser, Debug, Clone)]
#[command(name = "awsops")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// AWS profile to use from ~/.aws/config (default: default profile)
    #[arg(long, short = 'p', global = true)]
    pub profile: Option<String>,

    /// Region to operate in (default: profile configuration)
    #[arg(long, short = 'r', global = true)]
    pub region: Option<String>,

    /// Dry run compute operations
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Show debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Launch new instances
    CreateInstances(LaunchArgs),
    /// Start stopped instances
    StartInstances(InstanceIdArgs),
    /// Stop running instances
    StopInstances(InstanceIdArgs),
    /// Terminate instances
    TerminateInstances(InstanceIdArgs),
    /// List all instances
    ListInstances,
    /// List regions
    ListRegions,
    /// List availability zones
    ListZones,
    /// List public Ubuntu machine images
    ListImages,
    /// List security groups
    ListSecGroups,
    /// List key pairs
    ListKeyPairs,
    /// Show usage costs
    ListCosts(CostArgs),
    /// Email usage costs
    EmailCosts(EmailArgs),
    /// Install Docker on running instances over SSH
    InstallDocker(ProvisionArgs),
}

/// Arguments for launching instances
#[derive(Args, Debug, Clone)]
pub struct LaunchArgs {
    /// Number of instances to launch
    #[arg(long, short = 'c', default_value_t = 1)]
    pub count: i32,

    /// Name tag to give the instances
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Type of instances to launch
    #[arg(long, short = 't', default_value = "t2.micro")]
    pub instance_type: String,

    /// Availability zone to launch in (default: vendor-chosen)
    #[arg(long, short = 'z', default_value = "")]
    pub zone: String,

    /// AMI ID to use
    #[arg(long, short = 'a', default_value = DEFAULT_AMI)]
    pub ami: String,

    /// Key pair name to use on instances (created if missing)
    #[arg(long, short = 'k')]
    pub key_pair: String,

    /// Security group name to use (created SSH-only if missing)
    #[arg(long, short = 's')]
    pub sec_group: String,

    /// EBS volume size in GB to attach to each instance
    #[arg(long, short = 'e', default_value_t = 8)]
    pub ebs_vol_size: i32,

    /// EBS volume type to attach
    #[arg(long, default_value = "gp2")]
    pub ebs_vol_type: String,

    /// Delete volumes on termination
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub ebs_delete: bool,

    /// EBS device name
    #[arg(long, default_value = "/dev/sda1")]
    pub ebs_vol_name: String,

    /// Provisioned IOPS (not supported for gp2 volumes)
    #[arg(long, default_value_t = 100)]
    pub iops: i32,

    /// Seconds to wait for instances to reach the running state
    #[arg(long, short = 'w', default_value_t = 120)]
    pub wait: u64,

    /// Do not wait until instances are fully up and running
    #[arg(long)]
    pub do_not_wait: bool,

    /// Install Docker on the launched instances
    #[arg(long)]
    pub install_docker: bool,

    /// SSH private key file for provisioning
    #[arg(long, short = 'i')]
    pub identity: Option<PathBuf>,

    /// SSH user for provisioning
    #[arg(long, short = 'u')]
    pub user: Option<String>,
}

impl LaunchArgs {
    /// Check cross-flag requirements clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.install_docker && self.provisioning().is_none() {
            return Err(AwsopsError::InvalidArgument(
                "--identity and --user must be set in order to SSH and install docker".to_string(),
            ));
        }
        Ok(())
    }

    /// SSH user and identity file, when both were given
    pub fn provisioning(&self) -> Option<(String, PathBuf)> {
        match (&self.user, &self.identity) {
            (Some(user), Some(identity)) => Some((user.clone(), identity.clone())),
            _ => None,
        }
    }
}

/// Instance ids plus confirmation bypass for destructive actions
#[derive(Args, Debug, Clone)]
pub struct InstanceIdArgs {
    /// Instance id to operate on (repeatable)
    #[arg(long = "instance-id", required = true)]
    pub instance_ids: Vec<String>,

    /// Skip the interactive confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Time-window selection shared by the cost commands
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Usage cost charged since this many days ago
    #[arg(long)]
    pub days: Option<u32>,

    /// Months to check costs for; 1 means the current month
    #[arg(long, default_value_t = 1)]
    pub months: u32,

    /// Do not break costs down per service type
    #[arg(long)]
    pub ignore_service_usage: bool,
}

impl WindowArgs {
    /// The immutable selector handed to the date range resolver
    pub fn selector(&self) -> PeriodSelector {
        PeriodSelector {
            days: self.days,
            months: self.months,
        }
    }

    /// Grouping dimensions for the cost query
    pub fn grouping(&self) -> Grouping {
        if self.ignore_service_usage {
            Grouping::ByAccount
        } else {
            Grouping::ByAccountAndService
        }
    }

    /// Period labeling mode: literal dates for day windows, month names
    /// otherwise
    pub fn label(&self) -> PeriodLabel {
        if self.selector().day_mode() {
            PeriodLabel::IsoDate
        } else {
            PeriodLabel::MonthName
        }
    }
}

/// Arguments for the list-costs command
#[derive(Args, Debug, Clone)]
pub struct CostArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the email-costs command
#[derive(Args, Debug, Clone)]
pub struct EmailArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Comma separated email addresses to notify
    #[arg(long = "emails", value_delimiter = ',', required = true)]
    pub emails: Vec<String>,

    /// SMTP host to use for sending emails
    #[arg(long)]
    pub smtp_host: String,

    /// SMTP port to use for sending emails
    #[arg(long, default_value_t = 25)]
    pub smtp_port: u16,

    /// Sender email address
    #[arg(long)]
    pub smtp_from: String,

    /// Override the email subject
    #[arg(long)]
    pub subject: Option<String>,
}

/// Arguments for standalone docker provisioning
#[derive(Args, Debug, Clone)]
pub struct ProvisionArgs {
    /// Instance id to provision (repeatable)
    #[arg(long = "instance-id", required = true)]
    pub instance_ids: Vec<String>,

    /// SSH private key file to connect with
    #[arg(long, short = 'i')]
    pub identity: PathBuf,

    /// SSH user to connect as
    #[arg(long, short = 'u')]
    pub user: String,
}

/// Ask an interactive y/N question on stdin.
pub fn confirm(question: &str) -> io::Result<bool> {
    print!("{question} (y/N): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim() == "y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["awsops", "--profile", "work", "--dry-run", "list-instances"]);
        assert_eq!(cli.profile.as_deref(), Some("work"));
        assert!(cli.dry_run);
        assert!(matches!(cli.command, Command::ListInstances));
    }

    #[test]
    fn test_create_instances_parsing() {
        let cli = Cli::parse_from([
            "awsops",
            "create-instances",
            "-c",
            "3",
            "-k",
            "mykey",
            "-s",
            "ssh-only",
            "-n",
            "worker",
            "--ebs-vol-type",
            "io1",
            "--iops",
            "400",
        ]);
        match cli.command {
            Command::CreateInstances(args) => {
                assert_eq!(args.count, 3);
                assert_eq!(args.key_pair, "mykey");
                assert_eq!(args.sec_group, "ssh-only");
                assert_eq!(args.name.as_deref(), Some("worker"));
                assert_eq!(args.ebs_vol_type, "io1");
                assert_eq!(args.iops, 400);
                assert_eq!(args.ami, DEFAULT_AMI);
                assert!(args.ebs_delete);
                assert!(!args.do_not_wait);
            }
            _ => panic!("Expected CreateInstances command"),
        }
    }

    #[test]
    fn test_key_pair_and_sec_group_required() {
        assert!(Cli::try_parse_from(["awsops", "create-instances", "-k", "mykey"]).is_err());
        assert!(Cli::try_parse_from(["awsops", "create-instances", "-s", "grp"]).is_err());
    }

    #[test]
    fn test_install_docker_requires_ssh_flags() {
        let cli = Cli::parse_from([
            "awsops",
            "create-instances",
            "-k",
            "mykey",
            "-s",
            "grp",
            "--install-docker",
        ]);
        match cli.command {
            Command::CreateInstances(args) => {
                assert!(args.validate().is_err());
            }
            _ => panic!("Expected CreateInstances command"),
        }

        let cli = Cli::parse_from([
            "awsops",
            "create-instances",
            "-k",
            "mykey",
            "-s",
            "grp",
            "--install-docker",
            "-i",
            "key.pem",
            "-u",
            "ubuntu",
        ]);
        match cli.command {
            Command::CreateInstances(args) => {
                assert!(args.validate().is_ok());
                assert!(args.provisioning().is_some());
            }
            _ => panic!("Expected CreateInstances command"),
        }
    }

    #[test]
    fn test_ebs_delete_takes_a_value() {
        let cli = Cli::parse_from([
            "awsops",
            "create-instances",
            "-k",
            "mykey",
            "-s",
            "grp",
            "--ebs-delete",
            "false",
        ]);
        match cli.command {
            Command::CreateInstances(args) => assert!(!args.ebs_delete),
            _ => panic!("Expected CreateInstances command"),
        }
    }

    #[test]
    fn test_instance_ids_repeatable() {
        let cli = Cli::parse_from([
            "awsops",
            "stop-instances",
            "--instance-id",
            "i-aaa",
            "--instance-id",
            "i-bbb",
        ]);
        match cli.command {
            Command::StopInstances(args) => {
                assert_eq!(args.instance_ids, vec!["i-aaa", "i-bbb"]);
                assert!(!args.yes);
            }
            _ => panic!("Expected StopInstances command"),
        }
    }

    #[test]
    fn test_instance_ids_required() {
        assert!(Cli::try_parse_from(["awsops", "terminate-instances"]).is_err());
    }

    #[test]
    fn test_list_costs_defaults() {
        let cli = Cli::parse_from(["awsops", "list-costs"]);
        match cli.command {
            Command::ListCosts(args) => {
                assert_eq!(args.window.months, 1);
                assert_eq!(args.window.days, None);
                assert!(!args.json);
                assert_eq!(args.window.grouping(), Grouping::ByAccountAndService);
                assert_eq!(args.window.label(), PeriodLabel::MonthName);
            }
            _ => panic!("Expected ListCosts command"),
        }
    }

    #[test]
    fn test_day_window_switches_label() {
        let cli = Cli::parse_from(["awsops", "list-costs", "--days", "30"]);
        match cli.command {
            Command::ListCosts(args) => {
                assert_eq!(args.window.label(), PeriodLabel::IsoDate);
            }
            _ => panic!("Expected ListCosts command"),
        }
    }

    #[test]
    fn test_ignore_service_usage_switches_grouping() {
        let cli = Cli::parse_from(["awsops", "list-costs", "--ignore-service-usage"]);
        match cli.command {
            Command::ListCosts(args) => {
                assert_eq!(args.window.grouping(), Grouping::ByAccount);
            }
            _ => panic!("Expected ListCosts command"),
        }
    }

    #[test]
    fn test_emails_split_on_commas() {
        let cli = Cli::parse_from([
            "awsops",
            "email-costs",
            "--emails",
            "a@x.com,b@y.com",
            "--smtp-host",
            "mail.local",
            "--smtp-from",
            "costs@x.com",
        ]);
        match cli.command {
            Command::EmailCosts(args) => {
                assert_eq!(args.emails, vec!["a@x.com", "b@y.com"]);
                assert_eq!(args.smtp_port, 25);
            }
            _ => panic!("Expected EmailCosts command"),
        }
    }
}
