//! The document pipeline: parse, fan out, annotate, persist, deliver.

use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::table;
use crate::types::{BatchSummary, Event, Requester, TextPair};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::ParaphraseWorker;

/// A spreadsheet as received from a transport
#[derive(Clone, Debug, Default)]
pub struct UploadedDocument {
    /// File name given by the uploader
    pub file_name: Option<String>,
    /// MIME type reported by the transport
    pub mime_type: Option<String>,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

/// The annotated workbook handed back to the requester
#[derive(Clone, Debug)]
pub struct ProcessedDocument {
    /// Output file name
    pub file_name: String,
    /// `.xlsx` contents
    pub bytes: Vec<u8>,
    /// How many rows succeeded and failed
    pub summary: BatchSummary,
}

/// Keeps the active batch count raised for as long as it lives
struct ActiveBatch<'a>(&'a AtomicUsize);

impl<'a> ActiveBatch<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveBatch<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ParaphraseWorker {
    /// Paraphrase every row of `document` and return the annotated workbook
    ///
    /// Rejections (not registered, wrong format, missing text column) happen
    /// before any request reaches the paraphrasing service. Failed rows do not
    /// fail the call; they are counted in the summary.
    pub async fn process_document(
        &self,
        requester: &Requester,
        document: UploadedDocument,
    ) -> Result<ProcessedDocument> {
        // Counted before the check so shutdown never closes the pool under us
        let _active = ActiveBatch::enter(&self.active_batches);
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }
        let user_id = requester.user_id;

        if self.config.telegram.require_registration
            && !self.db.is_user_registered(user_id).await?
        {
            return Err(Error::NotRegistered { user_id });
        }

        table::check_format(document.mime_type.as_deref(), document.file_name.as_deref())?;

        let table_config = &self.config.table;
        let mut table = table::read_table(&document.bytes)?;
        let items = table.text_items(&table_config.input_column)?;
        let originals: Vec<String> = items.iter().map(|item| item.original.clone()).collect();

        tracing::info!(
            user_id,
            file_name = ?document.file_name,
            rows = items.len(),
            "processing document"
        );
        self.notifier.emit(Event::BatchStarted {
            user_id,
            items: items.len(),
        });

        let coordinator = Coordinator::new(
            self.service_config.clone(),
            Arc::new(self.notifier.for_batch(user_id)),
        );
        let results = coordinator.run(items).await;
        let summary = results.summary();

        table.append_results(
            &table_config.output_column,
            &results,
            table_config.failed_row_policy,
        );
        let bytes = table::write_xlsx(&table)?;

        let pairs: Vec<TextPair> = originals
            .into_iter()
            .zip(&results)
            .map(|(original, result)| TextPair {
                original,
                result: result.text().map(str::to_string),
            })
            .collect();
        if let Err(e) = self.db.save_texts(user_id, &pairs).await {
            tracing::error!(user_id, error = %e, "failed to store processed texts");
        }

        self.notifier.batch_complete(user_id, summary);
        tracing::info!(
            user_id,
            total = summary.total,
            failed = summary.failed,
            "document processed"
        );

        Ok(ProcessedDocument {
            file_name: table_config.output_file_name.clone(),
            bytes,
            summary,
        })
    }
}
