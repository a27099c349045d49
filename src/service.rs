use crate::aggregate::{AggregateSnapshot, HeaderRow, summarize_with};
use crate::error::FeedbackError;
use crate::normalizer::{Row, normalize};
use crate::record::SubmissionRecord;
use crate::schema::FeedbackCategory;
use crate::store::RowStore;
use crate::validation::validate;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on one notification, such as a slow SMTP relay
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Side effect run after a row has been stored, such as a confirmation mail
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn submission_stored(
        &self,
        category: FeedbackCategory,
        record: &SubmissionRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Result of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub category: FeedbackCategory,
    /// Timestamp written to column 0 of the stored row
    pub submitted_at: String,
}

/// The submit / fetch / dashboard operations over one row store
pub struct FeedbackService {
    store: Arc<dyn RowStore>,
    header_row: HeaderRow,
    notifier: Option<Arc<dyn Notifier>>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn RowStore>, header_row: HeaderRow) -> Self {
        FeedbackService {
            store,
            header_row,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Validate, normalize and append one submission
    ///
    /// The row is written with a single append; nothing is stored when validation
    /// fails. The notifier runs in a background task once the row is stored, bounded
    /// by `NOTIFY_TIMEOUT`; its failure is logged and never fails or delays the
    /// submission.
    ///
    /// # Arguments
    /// * `category` - The form the record was submitted on
    /// * `record` - The submitted answers
    ///
    /// # Returns
    /// * `Result<Receipt, FeedbackError>` - The stored timestamp, or the first failure
    ///
    /// # Errors
    /// * `FeedbackError::Validation` with every field error, before any store call
    /// * `FeedbackError::Store` when the append fails
    pub async fn submit(
        &self,
        category: FeedbackCategory,
        record: SubmissionRecord,
    ) -> Result<Receipt, FeedbackError> {
        validate(category, &record)
            .into_result()
            .map_err(FeedbackError::Validation)?;

        let row = normalize(category, &record);
        let submitted_at = row[0].clone();
        self.store.append(category, row).await?;
        log::info!("Stored {category} feedback submitted at {submitted_at}");

        if let Some(notifier) = self.notifier.clone() {
            tokio::spawn(async move {
                let sent =
                    tokio::time::timeout(NOTIFY_TIMEOUT, notifier.submission_stored(category, &record))
                        .await;
                match sent {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => log::warn!("Confirmation for {category} feedback failed: {e}"),
                    Err(_) => log::warn!(
                        "Confirmation for {category} feedback timed out after {}s",
                        NOTIFY_TIMEOUT.as_secs()
                    ),
                }
            });
        }

        Ok(Receipt {
            category,
            submitted_at,
        })
    }

    /// Fetch every stored row of a category
    pub async fn fetch_rows(&self, category: FeedbackCategory) -> Result<Vec<Row>, FeedbackError> {
        Ok(self.store.fetch_all(category).await?)
    }

    /// Recompute the dashboard from the `overall` sheet
    ///
    /// A store failure degrades to the zero snapshot instead of an error.
    pub async fn dashboard(&self) -> AggregateSnapshot {
        match self.store.fetch_all(FeedbackCategory::Overall).await {
            Ok(rows) => summarize_with(&rows, self.header_row),
            Err(e) => {
                log::error!("Dashboard read failed, serving empty snapshot: {e}");
                AggregateSnapshot::default()
            }
        }
    }
}
