//! Projection export to csv, json and excel payloads

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::projection::FinancialProjection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    /// Tab-separated sheet that spreadsheet applications open directly
    Excel,
}

impl ExportFormat {
    pub fn parse(key: &str) -> Result<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "excel" | "xls" => Ok(ExportFormat::Excel),
            _ => Err(EngineError::UnsupportedExportFormat(key.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Excel => "application/vnd.ms-excel",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xls",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        ExportFormat::parse(s)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized projections ready to hand to a download or a file
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_extension: &'static str,
}

const HEADER: [&str; 20] = [
    "plan_id",
    "period",
    "year",
    "month",
    "quarter",
    "revenue",
    "cost_of_goods_sold",
    "operating_expenses",
    "marketing_expenses",
    "rd_expenses",
    "administrative_expenses",
    "other_expenses",
    "cash_flow",
    "cash_balance",
    "employee_count",
    "customer_count",
    "units_sold",
    "growth_rate",
    "notes",
    "assumptions",
];

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn record(p: &FinancialProjection) -> [String; 20] {
    [
        p.plan_id.to_string(),
        p.period.to_string(),
        p.period.year.to_string(),
        cell(p.period.month),
        cell(p.period.quarter),
        cell(p.revenue),
        cell(p.cost_of_goods_sold),
        cell(p.operating_expenses),
        cell(p.marketing_expenses),
        cell(p.rd_expenses),
        cell(p.administrative_expenses),
        cell(p.other_expenses),
        cell(p.cash_flow),
        cell(p.cash_balance),
        cell(p.employee_count),
        cell(p.customer_count),
        cell(p.units_sold),
        cell(p.growth_rate),
        cell(p.notes.as_deref()),
        cell(p.assumptions.as_deref()),
    ]
}

fn delimited(projections: &[FinancialProjection], delimiter: u8) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    wtr.write_record(HEADER)?;
    for p in projections {
        wtr.write_record(record(p))?;
    }
    wtr.into_inner().map_err(|e| EngineError::Io(e.into_error()))
}

/// Serialize a projection sequence in the requested format
pub fn export(projections: &[FinancialProjection], format: ExportFormat) -> Result<ExportPayload> {
    let bytes = match format {
        ExportFormat::Csv => delimited(projections, b',')?,
        ExportFormat::Excel => delimited(projections, b'\t')?,
        ExportFormat::Json => serde_json::to_vec_pretty(projections)?,
    };
    log::debug!("exported {} projections as {}", projections.len(), format);
    Ok(ExportPayload {
        bytes,
        content_type: format.content_type(),
        file_extension: format.file_extension(),
    })
}

/// Look up the format by key, then export
pub fn export_as(projections: &[FinancialProjection], format_key: &str) -> Result<ExportPayload> {
    export(projections, ExportFormat::parse(format_key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodKey;
    use crate::projection::{generate, ScenarioRequest};

    fn rows() -> Vec<FinancialProjection> {
        let request = ScenarioRequest {
            start_year: 2025,
            projection_years: 2,
            initial_revenue: 100_000.0,
            ..Default::default()
        };
        generate(7, &request).unwrap()
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(ExportFormat::parse("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert!(matches!(
            ExportFormat::parse("pdf"),
            Err(EngineError::UnsupportedExportFormat(key)) if key == "pdf"
        ));
    }

    #[test]
    fn test_csv_has_header_and_blank_missing_cells() {
        let mut sparse = FinancialProjection::new(1, PeriodKey::annual(2025));
        sparse.revenue = Some(10.5);
        let payload = export(&[sparse], ExportFormat::Csv).unwrap();
        assert_eq!(payload.content_type, "text/csv");

        let text = String::from_utf8(payload.bytes).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("plan_id,period,year,month,quarter,revenue"));
        assert_eq!(lines.next().unwrap(), "1,2025,2025,,,10.5,,,,,,,,,,,,,,");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_json_round_trips() {
        let rows = rows();
        let payload = export_as(&rows, "json").unwrap();
        let parsed: Vec<FinancialProjection> = serde_json::from_slice(&payload.bytes).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn test_excel_is_tab_separated() {
        let payload = export(&rows(), ExportFormat::Excel).unwrap();
        assert_eq!(payload.content_type, "application/vnd.ms-excel");
        assert_eq!(payload.file_extension, "xls");
        let text = String::from_utf8(payload.bytes).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|line| line.split('\t').count() == HEADER.len()));
    }
}
