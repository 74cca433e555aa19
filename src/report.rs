//! Fleet report rendering.

use crate::core::{ReportGenerator, VehicleRecord};
use anyhow::Result;
use serde::Serialize;

/// Renders the fleet as a CSV document, one row per vehicle.
#[derive(Debug, Default, Clone)]
pub struct CsvReportGenerator;

#[derive(Serialize)]
struct ReportRow<'a> {
    car_id: i64,
    vehicle_type: &'a str,
    model: &'a str,
    year_of_manufacture: i32,
    status: &'a str,
    owner_email: &'a str,
    next_maintenance_date: String,
}

impl ReportGenerator for CsvReportGenerator {
    fn generate(&self, vehicles: &[VehicleRecord]) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for vehicle in vehicles {
            let details = &vehicle.details;
            writer.serialize(ReportRow {
                car_id: vehicle.car_id,
                vehicle_type: &details.vehicle_type,
                model: &details.model,
                year_of_manufacture: details.year_of_manufacture,
                status: &details.status,
                owner_email: details.owner_email.as_deref().unwrap_or_default(),
                next_maintenance_date: details
                    .next_maintenance_date
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            })?;
        }
        if vehicles.is_empty() {
            writer.write_record([
                "car_id",
                "vehicle_type",
                "model",
                "year_of_manufacture",
                "status",
                "owner_email",
                "next_maintenance_date",
            ])?;
        }
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush fleet report: {}", e.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VehicleDetails;
    use chrono::NaiveDate;

    #[test]
    fn test_report_has_header_and_rows() {
        let vehicles = vec![
            VehicleRecord::new(
                1,
                VehicleDetails {
                    vehicle_type: "SUV".to_string(),
                    model: "X5".to_string(),
                    year_of_manufacture: 2019,
                    status: "AVAILABLE".to_string(),
                    owner_email: Some("owner@example.com".to_string()),
                    next_maintenance_date: NaiveDate::from_ymd_opt(2025, 4, 10),
                },
            ),
            VehicleRecord::new(
                2,
                VehicleDetails {
                    vehicle_type: "Van".to_string(),
                    model: "Transit".to_string(),
                    year_of_manufacture: 2022,
                    status: "RENTED".to_string(),
                    owner_email: None,
                    next_maintenance_date: None,
                },
            ),
        ];

        let bytes = CsvReportGenerator.generate(&vehicles).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "car_id,vehicle_type,model,year_of_manufacture,status,owner_email,next_maintenance_date\n\
             1,SUV,X5,2019,AVAILABLE,owner@example.com,2025-04-10\n\
             2,Van,Transit,2022,RENTED,,\n"
        );
    }

    #[test]
    fn test_empty_fleet_still_has_header() {
        let bytes = CsvReportGenerator.generate(&[]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "car_id,vehicle_type,model,year_of_manufacture,status,owner_email,next_maintenance_date\n"
        );
    }
}
