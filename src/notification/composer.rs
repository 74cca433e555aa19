//! Builds notification payloads for fleet events.

use super::{Attachment, InlineImage, NotificationKind, NotificationPayload};
use crate::config::NotificationConfig;
use crate::core::{CarId, VehicleRecord};
use chrono::NaiveDate;

/// A fleet event that may produce a notification.
#[derive(Debug, Clone, Copy)]
pub enum FleetEvent<'a> {
    Registered(&'a VehicleRecord),
    Updated(&'a VehicleRecord),
    Deleted(CarId),
    MaintenanceDue { car_id: CarId, due_date: NaiveDate },
    FleetReport { vehicle_count: usize, report: &'a [u8] },
}

/// Composes notification payloads. Pure: no I/O and no store access.
///
/// Registration notices go to the vehicle owner. Every other notice goes to
/// the configured operator address.
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    operator_address: String,
    inline_image: InlineImage,
    report_filename: String,
}

impl NotificationComposer {
    pub fn new(
        operator_address: impl Into<String>,
        inline_image: InlineImage,
        report_filename: impl Into<String>,
    ) -> Self {
        Self {
            operator_address: operator_address.into(),
            inline_image,
            report_filename: report_filename.into(),
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(
            config.operator_address.clone(),
            InlineImage {
                content_id: config.inline_image_content_id.clone(),
                resource: config.inline_image_resource.clone(),
            },
            config.report_filename.clone(),
        )
    }

    pub fn operator_address(&self) -> &str {
        &self.operator_address
    }

    /// Composes the payload for `event`.
    ///
    /// Returns `None` only for a registration whose vehicle has no
    /// owner email or an empty one.
    pub fn compose(&self, event: FleetEvent<'_>) -> Option<NotificationPayload> {
        match event {
            FleetEvent::Registered(record) => {
                let recipient = record.details.contact_email()?;
                Some(self.with_image(
                    NotificationKind::Registered,
                    recipient.to_string(),
                    "Vehicle Registration Successful",
                    self.registered_body(record),
                ))
            }
            FleetEvent::Updated(record) => Some(self.with_image(
                NotificationKind::Updated,
                self.operator_address.clone(),
                "Vehicle Update Successful",
                self.updated_body(record),
            )),
            FleetEvent::Deleted(car_id) => Some(self.with_image(
                NotificationKind::Deleted,
                self.operator_address.clone(),
                "Vehicle Deletion Successful",
                self.deleted_body(car_id),
            )),
            FleetEvent::MaintenanceDue { car_id, due_date } => Some(self.with_image(
                NotificationKind::MaintenanceDue,
                self.operator_address.clone(),
                "Upcoming Vehicle Maintenance Reminder",
                self.maintenance_body(car_id, due_date),
            )),
            FleetEvent::FleetReport {
                vehicle_count,
                report,
            } => Some(NotificationPayload {
                kind: NotificationKind::FleetReport,
                recipient: self.operator_address.clone(),
                subject: "All Car Details Report".to_string(),
                html_body: wrap_html(
                    "Car Details Report",
                    &format!(
                        "<p>Attached is the report containing details of all {} cars in our system.</p>",
                        vehicle_count
                    ),
                ),
                inline_image: None,
                attachment: Some(Attachment {
                    bytes: report.to_vec(),
                    filename: self.report_filename.clone(),
                }),
            }),
        }
    }

    fn with_image(
        &self,
        kind: NotificationKind,
        recipient: String,
        subject: &str,
        html_body: String,
    ) -> NotificationPayload {
        NotificationPayload {
            kind,
            recipient,
            subject: subject.to_string(),
            html_body,
            inline_image: Some(self.inline_image.clone()),
            attachment: None,
        }
    }

    fn image_tag(&self) -> String {
        format!(
            "<img src='cid:{}' style='width:400px;height:auto;'>",
            escape_html(&self.inline_image.content_id)
        )
    }

    fn registered_body(&self, record: &VehicleRecord) -> String {
        wrap_html(
            "Vehicle Registration Successful",
            &format!(
                "<p>Your vehicle has been added successfully to our system.</p>\
                 <p><strong>Vehicle ID:</strong> {}</p>{}",
                record.car_id,
                self.image_tag()
            ),
        )
    }

    fn updated_body(&self, record: &VehicleRecord) -> String {
        let details = &record.details;
        wrap_html(
            "Vehicle Update Successful",
            &format!(
                "<p>Your vehicle details have been updated successfully.</p>\
                 <p><strong>Updated Details:</strong></p>\
                 <ul>\
                 <li>Vehicle ID: {}</li>\
                 <li>Vehicle Type: {}</li>\
                 <li>Model: {}</li>\
                 <li>Year of Manufacture: {}</li>\
                 <li>Status: {}</li>\
                 </ul>{}",
                record.car_id,
                escape_html(&details.vehicle_type),
                escape_html(&details.model),
                details.year_of_manufacture,
                escape_html(&details.status),
                self.image_tag()
            ),
        )
    }

    fn deleted_body(&self, car_id: CarId) -> String {
        wrap_html(
            "Vehicle Deletion Successful",
            &format!(
                "<p>Your vehicle with ID <strong>{}</strong> has been deleted from our system.</p>{}\
                 <p>If this action was not intended, please contact our support team immediately.</p>",
                car_id,
                self.image_tag()
            ),
        )
    }

    fn maintenance_body(&self, car_id: CarId, due_date: NaiveDate) -> String {
        wrap_html(
            "Maintenance Reminder",
            &format!(
                "<p>This is a reminder that your vehicle with ID <strong>{}</strong> \
                 is due for maintenance on <strong>{}</strong>.</p>\
                 <p>Please schedule your maintenance at the earliest.</p>{}",
                car_id,
                due_date.format("%Y-%m-%d"),
                self.image_tag()
            ),
        )
    }
}

fn wrap_html(heading: &str, content: &str) -> String {
    format!(
        "<html><body><h2>{}</h2><p>Dear User,</p>{}<p>Thank you for using our services!</p></body></html>",
        heading, content
    )
}

/// Escapes the characters that are significant in HTML text and attributes.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
