//! Cost report email dispatch over SMTP
//!
//! Renders a fixed HTML document plus a plain-text alternative (the
//! console rendering) and ships them through lettre. The original layout
//! mirrors the console report: one section per period, one table per
//! account.

use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use awsops_aws::organizations::OrganizationInfo;
use awsops_core::aggregation::CostReport;
use awsops_core::error::{AwsopsError, Result};

/// Default email subject
pub const DEFAULT_SUBJECT: &str = "AWS Usage Costs";

/// Delivery parameters for a cost report email
#[derive(Debug, Clone)]
pub struct EmailOptions {
    pub recipients: Vec<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: String,
    pub subject: Option<String>,
}

/// The subject line: explicit override, else the default, suffixed with
/// the organization's master account when one is known.
pub fn subject(options: &EmailOptions, organization: Option<&OrganizationInfo>) -> String {
    match (&options.subject, organization) {
        (Some(subject), _) => subject.clone(),
        (None, Some(org)) => format!("{DEFAULT_SUBJECT} for {}", org.master_account_email),
        (None, None) => DEFAULT_SUBJECT.to_string(),
    }
}

/// Render the HTML body. Fixed markup built in code; this tool does not
/// carry a template engine.
pub fn render_html(report: &CostReport, organization: Option<&OrganizationInfo>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<body style=\"font-family: sans-serif;\">\n<h1>AWS Usage Costs</h1>\n",
    );

    if let Some(org) = organization {
        html.push_str(&format!(
            "<p>Organization {} ({})</p>\n",
            org.id, org.master_account_email
        ));
    }

    for period in &report.periods {
        html.push_str(&format!(
            "<h2>{} - {} USD</h2>\n",
            period.period, period.total
        ));
        for (account, costs) in &period.costs_by_account {
            html.push_str(&format!(
                "<h3>{account}</h3>\n<table border=\"0\" cellpadding=\"4\">\n"
            ));
            for cost in costs {
                if let Some(service) = &cost.service {
                    html.push_str(&format!(
                        "<tr><td>{service}</td><td align=\"right\">{} {}</td></tr>\n",
                        cost.amount, cost.unit
                    ));
                }
            }
            if let Some(total) = period.total_by_account.get(account) {
                html.push_str(&format!(
                    "<tr><td><b>Total</b></td><td align=\"right\"><b>{total} USD</b></td></tr>\n"
                ));
            }
            html.push_str("</table>\n");
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Send the report to every recipient in one message.
pub async fn send_report(
    options: &EmailOptions,
    report: &CostReport,
    organization: Option<&OrganizationInfo>,
    text_body: String,
) -> Result<()> {
    let from: Mailbox = options
        .sender
        .parse()
        .map_err(|e| AwsopsError::Email(format!("invalid sender address: {e}")))?;

    let mut builder = Message::builder()
        .from(from)
        .subject(subject(options, organization));
    for recipient in &options.recipients {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| AwsopsError::Email(format!("invalid recipient address {recipient}: {e}")))?;
        builder = builder.to(to);
    }

    let email = builder
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(render_html(report, organization)),
                ),
        )
        .map_err(|e| AwsopsError::Email(format!("failed to build message: {e}")))?;

    // plain SMTP relay; host-level TLS is the operator's call
    let mailer: AsyncSmtpTransport<Tokio1Executor> =
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(options.smtp_host.as_str())
            .port(options.smtp_port)
            .build();

    mailer
        .send(email)
        .await
        .map_err(|e| AwsopsError::Email(e.to_string()))?;

    tracing::info!(
        recipients = options.recipients.len(),
        "cost report emailed"
    );
    Ok(())
}
