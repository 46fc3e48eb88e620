//! # Embark Reports
//!
//! Differentiated stakeholder reporting for the provisioning batch.
//!
//! Each report variant is an explicit typed row — no dynamic property
//! bags — collected into a [`rows::ReportBatch`] over the whole run,
//! rendered as a banner + HTML table, and handed to the [`mailer::MailGateway`]
//! boundary. Empty collections never produce a send.

pub mod dispatch;
pub mod html;
pub mod mailer;
pub mod rows;

pub use dispatch::{DispatchSummary, ReportDispatcher, ReportRecipients};
pub use mailer::{LoggingMailGateway, MailError, MailGateway, MailResult, OutboundMessage, SmtpSettings};
pub use rows::{
    EpicAccessRow, HrReportRow, HtmlRow, ManagerReportRow, ReportBatch, TrainingRow,
    UserReportRow, TRAINING_TRACK_SLOTS,
};
