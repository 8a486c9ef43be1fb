//! Plain-text invoice documents written to storage.

use async_trait::async_trait;
use domain::services::{InvoiceDocument, InvoiceRenderer, RenderError};

use super::storage::{FileStorage, StorageError};

pub const OFFICE_NAME: &str = "Translation Office";

pub struct TextInvoiceRenderer {
    storage: FileStorage,
}

impl TextInvoiceRenderer {
    pub fn new(storage: FileStorage) -> Self {
        Self { storage }
    }

    pub fn path_for(number: i64) -> String {
        format!("invoices/invoice_{}.txt", number)
    }
}

pub fn layout(document: &InvoiceDocument) -> String {
    format!(
        "{office}\n\
         Invoice #{number:04}\n\
         Client: {client}\n\
         Job ID: {job}\n\
         Languages: {source} -> {target}\n\
         Word count: {words}\n\
         Unit price: {unit_price} {currency}\n\
         Amount: {amount:.2} {currency}\n\
         Issued: {issued}\n",
        office = OFFICE_NAME,
        number = document.number,
        client = document.client_handle,
        job = document.job_id,
        source = document.source_language,
        target = document.target_language,
        words = document.word_count,
        unit_price = document.unit_price,
        amount = document.amount,
        currency = document.currency,
        issued = document.issued_on.date_naive(),
    )
}

#[async_trait]
impl InvoiceRenderer for TextInvoiceRenderer {
    async fn render(&self, document: &InvoiceDocument) -> Result<String, RenderError> {
        let path = Self::path_for(document.number);
        self.storage
            .write(&path, layout(document).as_bytes())
            .await
            .map_err(|e| match e {
                StorageError::InvalidPath(p) => RenderError::Layout(p),
                other => RenderError::Io(other.to_string()),
            })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn document() -> InvoiceDocument {
        InvoiceDocument {
            invoice_id: Uuid::new_v4(),
            number: 7,
            issued_on: Utc.with_ymd_and_hms(2026, 5, 2, 10, 0, 0).unwrap(),
            client_handle: "acme".into(),
            job_id: Uuid::nil(),
            source_language: "en".into(),
            target_language: "it".into(),
            word_count: 1000,
            unit_price: Decimal::new(10, 2),
            amount: Decimal::new(10000, 2),
            currency: "EUR".into(),
        }
    }

    #[test]
    fn test_layout() {
        let text = layout(&document());
        assert!(text.contains("Invoice #0007"));
        assert!(text.contains("Client: acme"));
        assert!(text.contains("Languages: en -> it"));
        assert!(text.contains("Amount: 100.00 EUR"));
        assert!(text.contains("Issued: 2026-05-02"));
    }

    #[tokio::test]
    async fn test_render_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let renderer = TextInvoiceRenderer::new(storage.clone());

        let path = renderer.render(&document()).await.unwrap();

        assert_eq!(path, "invoices/invoice_7.txt");
        let bytes = storage.read(&path).await.unwrap();
        assert!(String::from_utf8(bytes).unwrap().starts_with(OFFICE_NAME));
    }
}
