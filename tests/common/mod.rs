#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use plazos_rust::db::adapter;
use plazos_rust::models::{Company, Invoice, Payment};
use plazos_rust::service::normalizer::rut_key;
use plazos_rust::{AppError, AppResult, RecordStore};
use serde_json::{json, Value};
use std::collections::HashMap;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// In-memory document store holding raw documents, adapted on read the same
/// way the Postgres store does.
#[derive(Default)]
pub struct InMemoryStore {
    docs: Vec<Value>,
    pagos: Vec<Value>,
    empresas: Vec<Value>,
    reference: HashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoice document with the "list docs" sheet headers
    pub fn invoice(mut self, rut: &str, name: &str, doc: &str, ope: &str, issued: NaiveDate) -> Self {
        self.docs.push(json!({
            "RUT DEUDOR": rut,
            "DEUDOR": name,
            "Nº DCTO": doc,
            "Nº OPE": ope,
            "FEC EMISION DIG": issued.format("%d-%m-%Y").to_string(),
            "FECHA CES": issued.format("%Y-%m-%d").to_string(),
            "VCTO NOM": (issued + chrono::Duration::days(30)).format("%d/%m/%Y").to_string(),
            "MONTO DOC": 1000000,
            "SALDO": 0,
            "ESTADO": "VIGENTE"
        }));
        self
    }

    /// Delinquent invoice with an outstanding balance
    pub fn delinquent(mut self, rut: &str, doc: &str, ope: &str, issued: NaiveDate, balance: i64) -> Self {
        self.docs.push(json!({
            "RUT DEUDOR": rut,
            "Nº DCTO": doc,
            "Nº OPE": ope,
            "FEC EMISION DIG": issued.format("%d-%m-%Y").to_string(),
            "VCTO NOM": (issued + chrono::Duration::days(30)).format("%d-%m-%Y").to_string(),
            "MONTO DOC": 500000,
            "SALDO": balance,
            "ESTADO": "MOROSO"
        }));
        self
    }

    pub fn raw_invoice(mut self, doc: Value) -> Self {
        self.docs.push(doc);
        self
    }

    /// Payment document with the cartola headers
    pub fn payment(mut self, rut: &str, doc: &str, ope: &str, paid: NaiveDate, status: &str) -> Self {
        self.pagos.push(json!({
            "Rut Deudor": rut,
            "Nª Doc.": doc,
            "Nº Ope.": ope,
            "Fecha Pago": paid.format("%Y-%m-%d").to_string(),
            "Mto.Pagado": 1000000.0,
            "Estado": status
        }));
        self
    }

    /// Invoice issued `term` days before `paid`, settled on `paid`
    pub fn settled(self, rut: &str, name: &str, doc: &str, paid: NaiveDate, term: i64) -> Self {
        let issued = paid - chrono::Duration::days(term);
        self.invoice(rut, name, doc, "1", issued)
            .payment(rut, doc, "1", paid, "PAGADO")
    }

    pub fn company(mut self, rut: &str, name: &str, sector: &str, bracket: &str) -> Self {
        self.empresas.push(json!({
            "rut": rut,
            "nombre": name,
            "rubro": sector,
            "tramo_ventas": bracket
        }));
        self
    }

    pub fn reference(mut self, rut: &str, category: &str) -> Self {
        self.reference.insert(rut_key(rut), category.to_string());
        self
    }
}

fn keys(ruts: &[String]) -> Vec<String> {
    ruts.iter().map(|r| rut_key(r)).collect()
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn invoices_for_many(&self, ruts: &[String]) -> AppResult<Vec<Invoice>> {
        let keys = keys(ruts);
        Ok(self
            .docs
            .iter()
            .filter_map(adapter::invoice_from_document)
            .filter(|i| keys.contains(&rut_key(&i.debtor_id)))
            .collect())
    }

    async fn payments_for_many(&self, ruts: &[String], paid_only: bool) -> AppResult<Vec<Payment>> {
        let keys = keys(ruts);
        Ok(self
            .pagos
            .iter()
            .filter_map(adapter::payment_from_document)
            .filter(|p| keys.contains(&rut_key(&p.debtor_id)))
            .filter(|p| !paid_only || p.status.is_paid())
            .collect())
    }

    async fn company(&self, rut: &str) -> AppResult<Option<Company>> {
        let key = rut_key(rut);
        Ok(self
            .empresas
            .iter()
            .filter_map(adapter::company_from_document)
            .find(|c| rut_key(&c.rut) == key))
    }

    async fn companies_in_segment(&self, sector: &str, bracket: &str) -> AppResult<Vec<Company>> {
        Ok(self
            .empresas
            .iter()
            .filter_map(adapter::company_from_document)
            .filter(|c| c.segment() == Some((sector, bracket)))
            .collect())
    }

    async fn reference_category(&self, rut: &str) -> AppResult<Option<String>> {
        Ok(self.reference.get(&rut_key(rut)).cloned())
    }
}

/// Store whose reads always time out
pub struct UnreachableStore;

#[async_trait]
impl RecordStore for UnreachableStore {
    async fn invoices_for_many(&self, _ruts: &[String]) -> AppResult<Vec<Invoice>> {
        Err(timeout("fetch_invoices"))
    }

    async fn payments_for_many(&self, _ruts: &[String], _paid_only: bool) -> AppResult<Vec<Payment>> {
        Err(timeout("fetch_payments"))
    }

    async fn company(&self, _rut: &str) -> AppResult<Option<Company>> {
        Err(timeout("fetch_company"))
    }

    async fn companies_in_segment(&self, _sector: &str, _bracket: &str) -> AppResult<Vec<Company>> {
        Err(timeout("fetch_segment"))
    }

    async fn reference_category(&self, _rut: &str) -> AppResult<Option<String>> {
        Err(timeout("fetch_reference_category"))
    }
}

fn timeout(operation: &'static str) -> AppError {
    AppError::StoreTimeout { operation, secs: 30 }
}
