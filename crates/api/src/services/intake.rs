//! Intake of new translation requests.

use chrono::Utc;
use domain::models::{
    AuditAction, Capability, NewAuditEntry, NewTranslationRequest, ObjectType, Quote,
    TranslationRequest, User,
};
use domain::services::{
    count_words, extract_with_policy, price, require, ExtractionPolicy, PriceInput, TextExtractor,
};
use persistence::repositories::{AuditLogRepository, QuoteRepository, RateRepository, RequestRepository};
use shared::validation::{file_extension, normalize_language_code};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use super::storage::FileStorage;
use crate::app::AppState;
use crate::error::ApiError;

/// A validated upload.
#[derive(Debug, Clone)]
pub struct SourceUpload {
    pub source_language: String,
    pub target_language: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct IntakeResult {
    pub request: TranslationRequest,
    pub quote: Quote,
}

pub struct IntakeService {
    pool: PgPool,
    storage: FileStorage,
    extractor: Arc<dyn TextExtractor>,
    policy: ExtractionPolicy,
    max_upload_bytes: usize,
}

impl IntakeService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            storage: state.storage.clone(),
            extractor: state.extractor.clone(),
            policy: state.config.intake.on_extraction_failure,
            max_upload_bytes: state.config.intake.max_upload_bytes,
        }
    }

    /// Stores the upload, extracts its text and prices it as a Draft quote.
    ///
    /// The request, its quote and the `request.create` entry commit together.
    pub async fn submit(&self, client: &User, upload: SourceUpload) -> Result<IntakeResult, ApiError> {
        require(client, Capability::SubmitRequest)?;

        if upload.content.len() > self.max_upload_bytes {
            return Err(ApiError::Validation(format!(
                "File exceeds the {} byte upload limit",
                self.max_upload_bytes
            )));
        }
        let extension = file_extension(&upload.file_name)
            .ok_or_else(|| ApiError::Validation("File name has no extension".to_string()))?;

        let extraction = extract_with_policy(
            self.extractor.as_ref(),
            &upload.content,
            &extension,
            self.policy,
        )?;
        if let Some(error) = &extraction.error {
            warn!(file_name = %upload.file_name, error = %error, "Text extraction failed; request flagged for review");
        }
        let word_count = count_words(&extraction.text);
        let source_language = normalize_language_code(&upload.source_language);
        let target_language = normalize_language_code(&upload.target_language);

        let mut tx = self.pool.begin().await?;

        let mut request: TranslationRequest = RequestRepository::create(
            &mut tx,
            &NewTranslationRequest {
                client_id: client.id,
                source_language: source_language.clone(),
                target_language: target_language.clone(),
                original_filename: upload.file_name.clone(),
                word_count,
                source_text: extraction.text,
                extraction_error: extraction.error,
            },
        )
        .await?
        .into();

        let rate = RateRepository::find_for_pair(&mut tx, &source_language, &target_language)
            .await?
            .map(domain::models::Rate::from);
        let quote = price(
            &mut request,
            None,
            rate.as_ref(),
            PriceInput {
                word_count,
                ..PriceInput::default()
            },
            Utc::now(),
        )?;
        let quote: Quote = QuoteRepository::save(&mut tx, &quote).await?.into();

        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::new(client.id, AuditAction::RequestCreate, ObjectType::Request)
                .object(request.id),
        )
        .await?;

        self.storage
            .save_source(request.id, &upload.file_name, &upload.content)
            .await?;

        tx.commit().await?;

        info!(
            request_id = %request.id,
            actor = %client.id,
            word_count,
            total = %quote.total,
            "Translation request received"
        );
        Ok(IntakeResult { request, quote })
    }
}
