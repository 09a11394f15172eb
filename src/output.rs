//! Output formatting for awsops
//!
//! Cost reports render in two forms: the classic indented console layout
//! (period header, per-account service lines, subtotal) and pretty JSON
//! for machine consumption. Instance, image, and security-group listings
//! use ASCII tables.

use awsops_aws::compute::{InstanceSummary, SecurityGroupSummary, StateChange};
use awsops_core::aggregation::{CostReport, PeriodicCostSummary};
use prettytable::{format, row, Table};

/// Render a cost report in the console layout.
///
/// Per period: a `<label> - <total> USD` header, then for each account a
/// blank line, the account label, one `<amount> <unit>  <service>` line
/// per service entry, a separator, and the account subtotal.
pub fn render_report(report: &CostReport) -> String {
    let mut out = String::new();
    for period in &report.periods {
        render_period(&mut out, period);
    }
    out
}

fn render_period(out: &mut String, summary: &PeriodicCostSummary) {
    out.push_str(&format!("\n{} - {} USD\n", summary.period, summary.total));

    for (account, costs) in &summary.costs_by_account {
        out.push_str(&format!("\n\t{account}\n\n"));
        for cost in costs {
            if let Some(service) = &cost.service {
                out.push_str(&format!("\t\t{} {}\t{service}\n", cost.amount, cost.unit));
            }
        }
        out.push_str("\t\t------------\n");
        if let Some(total) = summary.total_by_account.get(account) {
            out.push_str(&format!("\t\t{total} USD\n"));
        }
    }
}

/// Render a cost report as pretty JSON (same data as the console form).
pub fn render_report_json(report: &CostReport) -> String {
    serde_json::to_string_pretty(report).unwrap()
}

/// One-line-per-instance table for list-instances
pub fn instances_table(instances: &[InstanceSummary]) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row![
        b -> "Instance",
        b -> "Name",
        b -> "State",
        b -> "Type",
        b -> "Zone",
        b -> "Public IP",
        b -> "Private IP",
        b -> "Key"
    ]);

    for instance in instances {
        table.add_row(row![
            instance.instance_id,
            instance.name_tag().unwrap_or(""),
            instance.state,
            instance.instance_type,
            instance.zone,
            instance.public_ip,
            instance.private_ip,
            instance.key_name
        ]);
    }

    table.to_string()
}

/// Full key = value detail block for one instance (printed after launch)
pub fn instance_details(instance: &InstanceSummary) -> String {
    let tags = instance
        .tags
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "instanceId = {}\n\
         imageId = {}\n\
         state = {}\n\
         state-message = {}\n\
         type = {}\n\
         keyname = {}\n\
         monitoring = {}\n\
         azone = {}\n\
         private-dns = {}\n\
         private-ip = {}\n\
         public-dns = {}\n\
         public-ip = {}\n\
         subnet-id = {}\n\
         vpc-id = {}\n\
         tags = {}\n\
         core-count = {}\n\
         thread-per-core = {}\n\
         security-groups = {}\n\n",
        instance.instance_id,
        instance.image_id,
        instance.state,
        instance.state_reason,
        instance.instance_type,
        instance.key_name,
        instance.monitoring,
        instance.zone,
        instance.private_dns,
        instance.private_ip,
        instance.public_dns,
        instance.public_ip,
        instance.subnet_id,
        instance.vpc_id,
        tags,
        instance.core_count,
        instance.threads_per_core,
        instance.security_groups.join(", "),
    )
}

/// `(name, image id)` table for list-images
pub fn images_table(images: &[(String, String)]) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row![b -> "Name", b -> "Image"]);
    for (name, image_id) in images {
        table.add_row(row![name, image_id]);
    }
    table.to_string()
}

/// Security group table for list-sec-groups
pub fn security_groups_table(groups: &[SecurityGroupSummary]) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row![b -> "Name", b -> "Group", b -> "Description", b -> "Ingress"]);
    for group in groups {
        let ingress = group
            .permissions
            .iter()
            .map(|(port, cidr)| format!("{port}<-{cidr}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(row![group.name, group.group_id, group.description, ingress]);
    }
    table.to_string()
}

/// Per-instance state transition lines for start/stop/terminate
pub fn render_state_changes(changes: &[StateChange]) -> String {
    let mut out = String::new();
    for change in changes {
        out.push_str(&format!(
            "\ninstanceId={}\npreviousState={}\ncurrentState={}\n",
            change.instance_id, change.previous_state, change.current_state
        ));
    }
    out
}
