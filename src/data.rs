use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::models::Transaction;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("unsupported dataset format '{0}', expected .csv or .json")]
    UnsupportedFormat(String),
    #[error("row {row}: revenue must be non-negative, got {amount}")]
    NegativeRevenue { row: usize, amount: Decimal },
}

/// Bundled dataset for demos and tests. Covers the common channels and
/// campaigns, one row without a channel and one with more orders than leads.
pub const SAMPLE_DATASET: &str = "\
date,channel,campaign,product,revenue,orders,leads
2026-01-05,email,newsletter,starter-kit,1250.50,18,96
2026-01-08,ads,spring-sale,pro-plan,3420.00,12,40
2026-01-12,social,product-launch,starter-kit,640.25,9,85
2026-01-15,email,retargeting,pro-plan,2180.75,7,21
2026-01-19,organic,product-launch,analytics-addon,410.00,5,3
2026-01-22,ads,retargeting,starter-kit,980.40,14,52
2026-01-26,,spring-sale,pro-plan,1575.00,6,18
2026-02-02,email,newsletter,analytics-addon,320.90,4,44
2026-02-06,social,spring-sale,pro-plan,2890.10,11,67
2026-02-09,ads,product-launch,analytics-addon,150.00,2,26
2026-02-13,organic,newsletter,starter-kit,735.60,10,12
2026-02-17,email,spring-sale,starter-kit,1999.99,15,73
";

pub fn load_transactions(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let rows = match extension.as_str() {
        "csv" => {
            let file = File::open(path)
                .with_context(|| format!("failed to open dataset {}", path.display()))?;
            read_csv(file)?
        }
        "json" => {
            let file = File::open(path)
                .with_context(|| format!("failed to open dataset {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse JSON dataset {}", path.display()))?
        }
        other => return Err(DatasetError::UnsupportedFormat(other.to_string()).into()),
    };

    let rows = validate(rows)?;
    debug!("loaded {} transactions from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn sample_transactions() -> anyhow::Result<Vec<Transaction>> {
    let rows = read_csv(SAMPLE_DATASET.as_bytes())?;
    validate(rows).map_err(Into::into)
}

pub fn write_sample(path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, SAMPLE_DATASET)
        .with_context(|| format!("failed to write sample dataset to {}", path.display()))
}

fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<Transaction>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize::<Transaction>() {
        rows.push(result.context("failed to parse CSV row")?);
    }

    Ok(rows)
}

/// Boundary validation: reject negative revenue (counts are unsigned by
/// type) and normalize blank dimension values to "missing" so the
/// aggregation core only ever sees well-formed rows.
fn validate(rows: Vec<Transaction>) -> Result<Vec<Transaction>, DatasetError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, mut row)| {
            if row.revenue.is_sign_negative() {
                return Err(DatasetError::NegativeRevenue {
                    row: index + 1,
                    amount: row.revenue,
                });
            }
            row.channel = normalize(row.channel);
            row.campaign = normalize(row.campaign);
            row.product = normalize(row.product);
            Ok(row)
        })
        .collect()
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn loads_a_csv_dataset() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(
            file,
            "date,channel,campaign,product,revenue,orders,leads\n\
             2026-03-01,email,newsletter,starter-kit,120.50,3,25\n\
             2026-03-02,  ,spring-sale,pro-plan,75.00,1,4\n"
        )
        .unwrap();

        let rows = load_transactions(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(rows[0].revenue, dec!(120.50));
        assert_eq!(rows[0].channel.as_deref(), Some("email"));
        assert_eq!(rows[1].channel, None);
        assert_eq!(rows[1].orders, 1);
    }

    #[test]
    fn loads_a_json_dataset_with_missing_dimensions() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"date":"2026-03-01","campaign":"newsletter","product":"starter-kit","revenue":120.5,"orders":3,"leads":25}}]"#
        )
        .unwrap();

        let rows = load_transactions(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].channel, None);
        assert_eq!(rows[0].campaign.as_deref(), Some("newsletter"));
        assert_eq!(rows[0].revenue, dec!(120.5));
    }

    #[test]
    fn rejects_unknown_extensions_before_touching_the_file() {
        let err = load_transactions(Path::new("dataset.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::UnsupportedFormat(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn rejects_negative_revenue_with_the_row_number() {
        let csv = "date,channel,campaign,product,revenue,orders,leads\n\
                   2026-03-01,email,newsletter,starter-kit,10.00,1,2\n\
                   2026-03-02,ads,spring-sale,pro-plan,-5.00,1,2\n";
        let err = validate(read_csv(csv.as_bytes()).unwrap()).unwrap_err();
        assert!(matches!(err, DatasetError::NegativeRevenue { row: 2, .. }));
    }

    #[test]
    fn rejects_negative_counts_during_parsing() {
        let csv = "date,channel,campaign,product,revenue,orders,leads\n\
                   2026-03-01,email,newsletter,starter-kit,10.00,-1,2\n";
        assert!(read_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn sample_dataset_parses_and_validates() {
        let rows = sample_transactions().unwrap();
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().any(|row| row.channel.is_none()));
        assert!(rows.iter().any(|row| row.orders > row.leads));
        assert!(rows.iter().all(|row| !row.revenue.is_sign_negative()));
    }
}
