use crate::error::AppResult;
use crate::models::PaymentRecord;
use std::io::Write;

const HEADER: [&str; 7] = [
    "doc_number",
    "operation_number",
    "cession_date",
    "issue_date",
    "payment_date",
    "term_days",
    "amount",
];

/// Write matched payment history as CSV, header first
pub fn export_history_csv<W: Write>(records: &[PaymentRecord], writer: W) -> AppResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(HEADER)?;

    for record in records {
        writer.write_record([
            record.doc_number.clone(),
            record.operation_number.clone(),
            record.cession_date.map(|d| d.to_string()).unwrap_or_default(),
            record.issue_date.to_string(),
            record.payment_date.to_string(),
            record.term_days.to_string(),
            record.amount.as_ref().map(|a| a.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
