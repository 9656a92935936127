//! Form session
//!
//! A `FormSession` ties one form instance together: it loads the three
//! schema resources concurrently, owns the engine behind a lock, and
//! drives the submission pipeline. Nothing renders until the whole schema
//! resolved; answers stay intact when a submission fails so the user can
//! retry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use tenderdesk_forms::{
    AnswerValue, DerivedField, ExamTimer, FormEngine, FormSchema, FormsError, ScoreCard,
};

use crate::geo::{activity_id, GeoLocator};
use crate::provider::{MenuSelector, SchemaProvider};
use crate::sink::{AttachmentsRequest, SubmissionSink, ValuesRequest};
use crate::{ClientError, Result};

/// Per-session options.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Which menu row carries this form's page layout
    pub selector: MenuSelector,
    /// Task/ticket the submission belongs to, if any
    pub task_id: Option<u32>,
    /// Exam mode: run the elapsed-time clock and score on submit
    pub exam_mode: bool,
    /// Budget for the location fix before the submission aborts
    pub location_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            selector: MenuSelector::Index(0),
            task_id: None,
            exam_mode: false,
            location_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of a successful submission.
#[derive(Clone, Debug)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub activity_id: String,
    pub submitted_at: DateTime<Utc>,
    pub draft: bool,
    /// Exam-mode only: correctness tally at submission time
    pub score: Option<ScoreCard>,
    /// Exam-mode only: frozen elapsed time
    pub elapsed: Option<Duration>,
}

/// One loaded form: schema, engine state and collaborator handles.
pub struct FormSession {
    menu_id: u32,
    options: SessionOptions,
    engine: Arc<RwLock<FormEngine>>,
    sink: Arc<dyn SubmissionSink>,
    locator: Arc<dyn GeoLocator>,
    timer: Option<ExamTimer>,
    submitted: bool,
}

impl FormSession {
    /// Fetch page layout, checkpoints and types concurrently and build the
    /// engine. Any failed fetch (or `success: false`) aborts the load;
    /// a partial schema never renders.
    pub async fn load(
        provider: Arc<dyn SchemaProvider>,
        sink: Arc<dyn SubmissionSink>,
        locator: Arc<dyn GeoLocator>,
        options: SessionOptions,
    ) -> Result<Self> {
        tracing::info!(selector = ?options.selector, "loading form schema");
        let (menus, checkpoints, types) = tokio::try_join!(
            provider.fetch_menus(&options.selector),
            provider.fetch_checkpoints(),
            provider.fetch_types(),
        )?;
        let menu = options
            .selector
            .select(&menus)
            .ok_or_else(|| ClientError::SchemaLoad("selected menu not found".into()))?;
        let menu_id = options.selector.menu_id(menu);
        let schema = FormSchema::from_wire(menu, checkpoints, types);
        tracing::info!(
            menu_id,
            pages = schema.pages.len(),
            checkpoints = schema.checkpoints.len(),
            "form schema loaded"
        );

        let timer = options.exam_mode.then(ExamTimer::start);
        Ok(Self {
            menu_id,
            options,
            engine: Arc::new(RwLock::new(FormEngine::new(schema))),
            sink,
            locator,
            timer,
            submitted: false,
        })
    }

    /// Shared handle to the engine state, for rendering layers.
    pub fn engine(&self) -> Arc<RwLock<FormEngine>> {
        Arc::clone(&self.engine)
    }

    /// Store an answer. The whole form is read-only once submitted.
    pub fn set_answer(
        &self,
        id: u32,
        value: impl Into<AnswerValue>,
    ) -> std::result::Result<(), FormsError> {
        if self.submitted {
            return Err(FormsError::ReadOnlyField(id));
        }
        self.engine.write().set_answer(id, value)
    }

    pub fn register_derived(&self, field: DerivedField) {
        self.engine.write().register_derived(field);
    }

    pub fn current_page(&self) -> usize {
        self.engine.read().current_page()
    }

    pub fn next_page(&self) {
        self.engine.write().next_page();
    }

    pub fn previous_page(&self) {
        self.engine.write().previous_page();
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Exam clock reading; `None` outside exam mode.
    pub fn elapsed(&self) -> Option<Duration> {
        self.timer.as_ref().map(ExamTimer::elapsed)
    }

    /// Run the submission pipeline: validate (drafts skip this), acquire a
    /// location fix within the timeout, encode the payload, send values,
    /// then attachments if any. Attachments are never sent when the values
    /// request failed.
    pub async fn submit(&mut self, draft: bool) -> Result<SubmissionReceipt> {
        if !draft {
            let report = self.engine.read().validate_all();
            if !report.is_ok() {
                tracing::warn!(fields = report.errors.len(), "submission blocked by validation");
                self.engine.write().mark_errors(&report.errors);
                return Err(ClientError::Validation {
                    fields: report.errors,
                });
            }
        }
        self.engine.write().clear_errors();

        let coordinates = tokio::time::timeout(self.options.location_timeout, self.locator.locate())
            .await
            .map_err(|_| ClientError::Location("location fix timed out".into()))??;

        let submitted_at = Utc::now();
        let activity = activity_id(submitted_at, &coordinates);
        let payload = self.engine.read().build_submission();
        tracing::info!(
            activity_id = %activity,
            draft,
            values = payload.values.len(),
            attachments = payload.attachments.len(),
            "submitting form"
        );

        let has_attachments = payload.has_attachments();
        let values = ValuesRequest {
            menu_id: self.menu_id,
            activity_id: activity.clone(),
            lat_long: coordinates.to_string(),
            draft: u8::from(draft),
            task_id: self.options.task_id,
            data: payload.values,
        };
        self.sink.submit_values(&values).await?;

        if has_attachments {
            let attachments = AttachmentsRequest {
                menu_id: self.menu_id,
                activity_id: activity.clone(),
                lat_long: coordinates.to_string(),
                data: payload.attachments,
            };
            self.sink.submit_attachments(&attachments).await?;
        }

        let mut score = None;
        let mut elapsed = None;
        if !draft {
            self.submitted = true;
            if let Some(timer) = &mut self.timer {
                timer.stop();
                elapsed = Some(timer.elapsed());
            }
            if self.options.exam_mode {
                score = Some(self.engine.read().score());
            }
        }

        tracing::info!(activity_id = %activity, "form submitted");
        Ok(SubmissionReceipt {
            id: Uuid::new_v4(),
            activity_id: activity,
            submitted_at,
            draft,
            score,
            elapsed,
        })
    }

    /// Exam-mode pass/fail against the schema's pass mark; `None` before
    /// submission or outside exam mode.
    pub fn passed(&self) -> Option<bool> {
        if !self.submitted || !self.options.exam_mode {
            return None;
        }
        let engine = self.engine.read();
        let fraction = engine.schema().pass_fraction;
        Some(engine.score().passed(fraction))
    }
}
