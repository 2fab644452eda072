//! Maps raw store documents onto the canonical record types.
//!
//! The docs batches, the cartola ledger and the company registry all spell
//! the same concept differently ("Nº DCTO" vs "Nª Doc.", "RUT DEUDOR" vs
//! "Rut Deudor"). Every known spelling of a field is listed once here; the
//! rest of the crate only sees `Invoice`, `Payment` and `Company`.

use crate::models::{Company, Invoice, InvoiceStatus, Payment, PaymentStatus};
use crate::service::normalizer::fold_text;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::str::FromStr;

pub const DEBTOR_ID: &[&str] = &["RUT DEUDOR", "Rut Deudor", "rut_deudor", "debtor_id"];
pub const DEBTOR_NAME: &[&str] = &["DEUDOR", "Deudor", "NOMBRE DEUDOR", "debtor_name"];
pub const DOC_NUMBER: &[&str] = &["Nº DCTO", "N° DCTO", "Nª Doc.", "Nº Doc.", "N° Doc.", "doc_number"];
pub const OPERATION_NUMBER: &[&str] = &["Nº OPE", "N° OPE", "Nº Ope.", "N° Ope.", "Nª Ope.", "operation_number"];
pub const ISSUE_DATE: &[&str] = &["FEC EMISION DIG", "FEC EMISION", "issue_date"];
pub const CESSION_DATE: &[&str] = &["FECHA CES", "cession_date"];
pub const DUE_DATE: &[&str] = &["VCTO NOM", "due_date"];
pub const AMOUNT: &[&str] = &["MONTO DOC", "amount"];
pub const BALANCE: &[&str] = &["SALDO", "balance"];
pub const STATUS: &[&str] = &["ESTADO", "Estado", "status"];
pub const PAYMENT_DATE: &[&str] = &["Fecha Pago", "FECHA PAGO", "payment_date"];
pub const AMOUNT_PAID: &[&str] = &["Mto.Pagado", "Mto. Pagado", "amount_paid"];

pub const COMPANY_RUT: &[&str] = &["rut", "RUT"];
pub const COMPANY_NAME: &[&str] = &["nombre", "Razón social", "name"];
pub const COMPANY_SECTOR: &[&str] = &["rubro", "Rubro económico", "sector"];
pub const COMPANY_BRACKET: &[&str] = &["tramo_ventas", "Tramo según ventas", "revenue_bracket"];

const DATE_FORMATS: [&str; 3] = ["%d-%m-%Y", "%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// First non-null value among the field's spellings. Falls back to an
/// accent/case/spacing-insensitive comparison of the keys.
fn field<'a>(doc: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    let exact = names
        .iter()
        .filter_map(|name| doc.get(*name))
        .find(|v| !v.is_null());
    if exact.is_some() {
        return exact;
    }

    let folded: Vec<String> = names.iter().map(|n| fold_text(n)).collect();
    doc.iter()
        .filter(|(_, v)| !v.is_null())
        .find(|(k, _)| folded.contains(&fold_text(k)))
        .map(|(_, v)| v)
}

/// Identifier-like text. Integral floats lose their fraction
/// (spreadsheets turn `1234` into `1234.0`).
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        _ => None,
    }
}

/// Parse a date in any of the formats the batches use. `None` when the
/// value is missing or unparsable.
pub fn date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s.trim()),
        // mongoexport style {"$date": "..."}
        Value::Object(obj) => obj.get("$date").and_then(date_value),
        _ => None,
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Amounts arrive as JSON numbers or as text such as `$ 1.234.567` or
/// `1.234,50`.
pub fn amount_value(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

pub fn parse_amount(raw: &str) -> Option<BigDecimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let canonical = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if is_thousands_grouped(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };
    BigDecimal::from_str(&canonical).ok()
}

/// `1.234` or `12.345.678`: dot-separated groups of exactly three digits.
fn is_thousands_grouped(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut groups = digits.split('.');
    let Some(head) = groups.next() else {
        return false;
    };
    let tail: Vec<&str> = groups.collect();
    !tail.is_empty()
        && (1..=3).contains(&head.len())
        && head.chars().all(|c| c.is_ascii_digit())
        && tail
            .iter()
            .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

fn text_field(doc: &Map<String, Value>, names: &[&str]) -> Option<String> {
    field(doc, names).and_then(text_value)
}

fn date_field(doc: &Map<String, Value>, names: &[&str]) -> Option<NaiveDate> {
    field(doc, names).and_then(date_value)
}

fn amount_field(doc: &Map<String, Value>, names: &[&str]) -> Option<BigDecimal> {
    field(doc, names).and_then(amount_value)
}

/// `None` when the document is not an object or has no debtor RUT.
pub fn invoice_from_document(doc: &Value) -> Option<Invoice> {
    let obj = doc.as_object()?;
    Some(Invoice {
        debtor_id: text_field(obj, DEBTOR_ID)?,
        debtor_name: text_field(obj, DEBTOR_NAME),
        doc_number: text_field(obj, DOC_NUMBER),
        operation_number: text_field(obj, OPERATION_NUMBER),
        issue_date: date_field(obj, ISSUE_DATE),
        cession_date: date_field(obj, CESSION_DATE),
        due_date: date_field(obj, DUE_DATE),
        amount: amount_field(obj, AMOUNT),
        balance: amount_field(obj, BALANCE),
        status: InvoiceStatus::from_raw(&text_field(obj, STATUS).unwrap_or_default()),
    })
}

/// `None` when the document is not an object or has no debtor RUT.
pub fn payment_from_document(doc: &Value) -> Option<Payment> {
    let obj = doc.as_object()?;
    Some(Payment {
        debtor_id: text_field(obj, DEBTOR_ID)?,
        doc_number: text_field(obj, DOC_NUMBER),
        operation_number: text_field(obj, OPERATION_NUMBER),
        payment_date: date_field(obj, PAYMENT_DATE),
        amount_paid: amount_field(obj, AMOUNT_PAID),
        status: PaymentStatus::from_raw(&text_field(obj, STATUS).unwrap_or_default()),
    })
}

pub fn company_from_document(doc: &Value) -> Option<Company> {
    let obj = doc.as_object()?;
    Some(Company {
        rut: text_field(obj, COMPANY_RUT)?,
        name: text_field(obj, COMPANY_NAME),
        sector: text_field(obj, COMPANY_SECTOR),
        revenue_bracket: text_field(obj, COMPANY_BRACKET),
    })
}
