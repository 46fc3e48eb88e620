//! Report dispatch.
//!
//! Renders each non-empty report collection and hands it to the mail
//! gateway. An empty collection suppresses its send entirely. Send
//! failures are recorded and do not abort the remaining reports — by the
//! time dispatch runs, provisioning already happened and the other
//! audiences still need their data.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::html::render_report;
use crate::mailer::{MailGateway, OutboundMessage};
use crate::rows::{ManagerReportRow, ReportBatch};

/// Recipient lists per report audience.
#[derive(Debug, Clone, Default)]
pub struct ReportRecipients {
    /// IT service desk distribution.
    pub it: Vec<String>,

    /// HR distribution.
    pub hr: Vec<String>,

    /// Clinical-systems team distribution (access + training reports).
    pub clinical: Vec<String>,
}

/// Outcome counters for one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Messages handed to the gateway successfully.
    pub sent: usize,

    /// Sends that failed (logged, not fatal).
    pub failed: usize,

    /// Reports suppressed because their collection was empty.
    pub suppressed: usize,
}

/// Dispatches the batch's reports to their audiences.
pub struct ReportDispatcher<'a, G: MailGateway> {
    gateway: &'a G,
    from: String,
    recipients: ReportRecipients,
}

impl<'a, G: MailGateway> ReportDispatcher<'a, G> {
    /// Create a new dispatcher.
    pub fn new(gateway: &'a G, from: impl Into<String>, recipients: ReportRecipients) -> Self {
        Self {
            gateway,
            from: from.into(),
            recipients,
        }
    }

    /// Render and send every non-empty report collection.
    pub async fn dispatch(&self, batch: &ReportBatch) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        self.send_report(
            "New Employee Accounts",
            "Directory accounts provisioned in this run.",
            &batch.user,
            &self.recipients.it,
            &mut summary,
        )
        .await;

        self.send_report(
            "New Employee Processing",
            "New employees processed from the HR change set.",
            &batch.hr,
            &self.recipients.hr,
            &mut summary,
        )
        .await;

        self.send_report(
            "Epic Access Assignments",
            "Access templates, sub-templates, and blueprints resolved per employee.",
            &batch.access,
            &self.recipients.clinical,
            &mut summary,
        )
        .await;

        self.send_report(
            "Required Training Tracks",
            "Training tracks required per new employee.",
            &batch.training,
            &self.recipients.clinical,
            &mut summary,
        )
        .await;

        self.send_manager_reports(&batch.manager, &mut summary).await;

        info!(
            sent = summary.sent,
            failed = summary.failed,
            suppressed = summary.suppressed,
            "Report dispatch complete"
        );

        summary
    }

    /// Send one rendered report to a fixed recipient list.
    async fn send_report<R: crate::rows::HtmlRow>(
        &self,
        name: &str,
        description: &str,
        rows: &[R],
        recipients: &[String],
        summary: &mut DispatchSummary,
    ) {
        if rows.is_empty() {
            info!(report = name, "No rows; send suppressed");
            summary.suppressed += 1;
            return;
        }

        let message = OutboundMessage {
            from: self.from.clone(),
            to: recipients.to_vec(),
            subject: name.to_string(),
            html_body: render_report(name, description, rows),
        };

        match self.gateway.send_html(&message).await {
            Ok(()) => {
                info!(report = name, rows = rows.len(), "Report sent");
                summary.sent += 1;
            }
            Err(e) => {
                warn!(report = name, error = %e, "Report send failed");
                summary.failed += 1;
            }
        }
    }

    /// Send each supervisor only their own people's rows.
    async fn send_manager_reports(
        &self,
        rows: &[ManagerReportRow],
        summary: &mut DispatchSummary,
    ) {
        if rows.is_empty() {
            info!(report = "Direct Report Accounts", "No rows; send suppressed");
            summary.suppressed += 1;
            return;
        }

        // Group rows by supervisor address; deterministic send order
        let mut by_supervisor: BTreeMap<String, Vec<ManagerReportRow>> = BTreeMap::new();
        for row in rows {
            match &row.supervisor_email {
                Some(email) => by_supervisor
                    .entry(email.clone())
                    .or_default()
                    .push(row.clone()),
                None => {
                    warn!(
                        employee_id = %row.employee_id,
                        "No supervisor address resolved; manager notification skipped"
                    );
                    summary.failed += 1;
                }
            }
        }

        for (supervisor, group) in by_supervisor {
            let message = OutboundMessage {
                from: self.from.clone(),
                to: vec![supervisor.clone()],
                subject: "Direct Report Accounts".to_string(),
                html_body: render_report(
                    "Direct Report Accounts",
                    "Accounts created for your new direct reports, with their one-time initial passwords.",
                    &group,
                ),
            };

            match self.gateway.send_html(&message).await {
                Ok(()) => {
                    info!(supervisor = %supervisor, rows = group.len(), "Manager report sent");
                    summary.sent += 1;
                }
                Err(e) => {
                    warn!(supervisor = %supervisor, error = %e, "Manager report send failed");
                    summary.failed += 1;
                }
            }
        }
    }
}
