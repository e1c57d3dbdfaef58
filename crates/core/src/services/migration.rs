use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::{ContentApi, MediaUpload, RemoteRecord};
use crate::db::{MigrationSettings, OutcomeRecord, RecordMode, RunRecord};
use crate::error::{MigrationError, MigrationResult, RecordStage};
use crate::icons::{IconLibrary, IconMatcher, UsedIconSet};
use crate::ledger::{Ledger, LedgerRecord};
use crate::model::StagedRecord;
use crate::payload::{build_payload, media_payload};

/// A staged document as read from disk: its name and raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDocument {
    pub source: String,
    pub content: String,
}

impl StagedDocument {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self { source: source.into(), content: content.into() }
    }
}

/// Read every `*.json` file in `dir`, sorted by file name.
pub fn load_staged_documents(dir: &Path) -> MigrationResult<Vec<StagedDocument>> {
    let mut paths = list_files_with_extension(dir, "json")?;
    paths.sort();
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path)?;
        let source =
            path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        documents.push(StagedDocument { source, content });
    }
    Ok(documents)
}

fn list_files_with_extension(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            out.push(path);
        }
    }
    Ok(out)
}

/// Candidate image files for media uploads.
pub struct ImagePool {
    images: Vec<PathBuf>,
    rng: StdRng,
}

impl ImagePool {
    /// Pool over `images`; a seed makes selection reproducible.
    pub fn new(images: Vec<PathBuf>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { images, rng }
    }

    /// Every `*.webp` in `dir`, sorted by file name. A missing directory is an
    /// empty pool.
    pub fn load(dir: &Path, seed: Option<u64>) -> MigrationResult<Self> {
        if !dir.is_dir() {
            warn!(path = %dir.display(), "image directory not found; image pool is empty");
            return Ok(Self::new(Vec::new(), seed));
        }
        let mut images = list_files_with_extension(dir, "webp")?;
        images.sort();
        Ok(Self::new(images, seed))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Draw up to `count` distinct images without replacement.
    ///
    /// Distinctness holds within one call only; later calls draw from the
    /// full pool again.
    pub fn select(&mut self, count: usize) -> Vec<PathBuf> {
        let amount = count.min(self.images.len());
        rand::seq::index::sample(&mut self.rng, self.images.len(), amount)
            .into_iter()
            .map(|i| self.images[i].clone())
            .collect()
    }
}

/// Result of one record's trip through the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub position: usize,
    pub source: String,
    pub origin_id: String,
    pub title: String,
    pub mode: Option<RecordMode>,
    /// `Done` on success, otherwise the stage at which the record stopped.
    pub stage: RecordStage,
    pub success: bool,
    /// Ledger entry written for this record, if any. A failed record can
    /// still carry one when its primary create/update went through.
    pub record: Option<LedgerRecord>,
    pub error: Option<String>,
}

impl MigrationOutcome {
    /// `Done` or `Failed`.
    pub fn terminal(&self) -> RecordStage {
        if self.success {
            RecordStage::Done
        } else {
            RecordStage::Failed
        }
    }

    /// Display label: the title if known, else the document name.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.source
        } else {
            &self.title
        }
    }
}

/// Everything one `run` produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub finished_at: String,
    pub settings: MigrationSettings,
    /// Staged documents available, before test mode cut the list down.
    pub staged_total: usize,
    pub outcomes: Vec<MigrationOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MigrationOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// Rows for the run history database.
    pub fn to_history(&self) -> (RunRecord, Vec<OutcomeRecord>) {
        let run = RunRecord {
            id: None,
            started_at: self.started_at.clone(),
            finished_at: self.finished_at.clone(),
            test_mode: self.settings.test_mode,
            upload_new_images: self.settings.upload_new_images,
            clear_interlinking_metadata: self.settings.clear_interlinking_metadata,
            total: self.outcomes.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
        };
        let outcomes = self
            .outcomes
            .iter()
            .map(|o| OutcomeRecord {
                position: o.position,
                source: o.source.clone(),
                origin_id: o.origin_id.clone(),
                title: o.title.clone(),
                mode: o.mode,
                stage: o.stage,
                success: o.success,
                destination_id: o.record.as_ref().map(|r| r.destination_id.clone()),
                error: o.error.clone(),
            })
            .collect();
        (run, outcomes)
    }
}

/// What is known about a record so far; survives a mid-way failure.
#[derive(Debug, Default)]
struct RecordProgress {
    origin_id: String,
    title: String,
    mode: Option<RecordMode>,
    record: Option<LedgerRecord>,
}

/// Drives staged records one at a time through
/// load → icons → payload → create/update → images → ledger.
///
/// Owns the run-scoped state: the used-icon set, the image pool's RNG, and
/// the in-memory ledger. A record's failure is captured in its outcome and
/// never stops the run.
pub struct MigrationRunner<'a> {
    api: &'a dyn ContentApi,
    settings: MigrationSettings,
    library: IconLibrary,
    matcher: IconMatcher,
    used: UsedIconSet,
    images: ImagePool,
    ledger: Ledger,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(
        api: &'a dyn ContentApi,
        settings: MigrationSettings,
        library: IconLibrary,
        matcher: IconMatcher,
        images: ImagePool,
        ledger: Ledger,
    ) -> Self {
        Self { api, settings, library, matcher, used: UsedIconSet::new(), images, ledger }
    }

    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn used_icons(&self) -> &UsedIconSet {
        &self.used
    }

    /// Migrate `documents` in order (only the first one in test mode).
    ///
    /// Record failures end up in the report. The only error returned is a
    /// failure to write the ledger at the end of the run.
    pub fn run(&mut self, documents: &[StagedDocument]) -> MigrationResult<RunReport> {
        let started_at = Utc::now().to_rfc3339();
        let selected =
            if self.settings.test_mode { &documents[..documents.len().min(1)] } else { documents };
        info!(
            staged = documents.len(),
            selected = selected.len(),
            test_mode = self.settings.test_mode,
            upload_new_images = self.settings.upload_new_images,
            icons = self.library.len(),
            images = self.images.len(),
            ledger_entries = self.ledger.len(),
            "migration run started"
        );

        let mut outcomes = Vec::with_capacity(selected.len());
        for (position, document) in selected.iter().enumerate() {
            let outcome = self.migrate_document(position, document);
            if outcome.record.is_some() && self.settings.flush_ledger_each_record {
                if let Err(err) = self.ledger.save() {
                    warn!(error = %err, "ledger flush failed; will retry at end of run");
                }
            }
            outcomes.push(outcome);
        }

        self.ledger.save()?;
        let report = RunReport {
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            settings: self.settings.clone(),
            staged_total: documents.len(),
            outcomes,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            used_icons = self.used.len(),
            "migration run finished"
        );
        Ok(report)
    }

    /// Run one document through the state machine, converting any error into
    /// a failed outcome.
    pub fn migrate_document(
        &mut self,
        position: usize,
        document: &StagedDocument,
    ) -> MigrationOutcome {
        let mut progress = RecordProgress::default();
        let result = self.process(document, &mut progress);
        let (stage, success, error) = match result {
            Ok(()) => (RecordStage::Done, true, None),
            Err(err) => {
                let stage = match &err {
                    MigrationError::RecordFailed { stage, .. } => *stage,
                    _ => RecordStage::Loaded,
                };
                error!(
                    source = %document.source,
                    origin_id = %progress.origin_id,
                    error = %err,
                    "record failed"
                );
                (stage, false, Some(err.to_string()))
            }
        };
        MigrationOutcome {
            position,
            source: document.source.clone(),
            origin_id: progress.origin_id,
            title: progress.title,
            mode: progress.mode,
            stage,
            success,
            record: progress.record,
            error,
        }
    }

    fn process(
        &mut self,
        document: &StagedDocument,
        progress: &mut RecordProgress,
    ) -> MigrationResult<()> {
        let value: Value =
            serde_json::from_str(&document.content).map_err(|err| MigrationError::MalformedInput {
                document: document.source.clone(),
                reason: err.to_string(),
            })?;
        let mut record = StagedRecord::from_json(&document.source, &value)?;
        progress.origin_id = record.origin_id.clone();
        progress.title = record.title.clone();

        // The ledger lookup is the only create-vs-update gate.
        let existing = self.ledger.get(&record.origin_id).cloned();
        let mode = if existing.is_some() { RecordMode::Update } else { RecordMode::Create };
        progress.mode = Some(mode);
        info!(
            origin_id = %record.origin_id,
            title = %record.title,
            mode = mode.as_str(),
            "processing record"
        );

        let mut services = record.services();
        if !services.is_empty() {
            self.matcher.assign_icons_to_services(
                &mut services,
                self.library.icons(),
                &mut self.used,
            );
            record.apply_services(&services);
        }
        debug!(
            origin_id = %record.origin_id,
            stage = RecordStage::IconsAssigned.as_str(),
            "stage reached"
        );

        let payload = build_payload(&record, &self.settings.payload_options());
        debug!(
            origin_id = %record.origin_id,
            stage = RecordStage::PayloadBuilt.as_str(),
            "stage reached"
        );

        let remote = self.send_primary(&record, existing.as_ref(), &payload)?;

        let carried = existing.as_ref().map(LedgerRecord::existing_media).unwrap_or_default();
        let has_existing_media = !carried.is_empty();
        let should_upload =
            self.settings.upload_new_images || existing.is_none() || !has_existing_media;
        let image_fields = record.image_fields_with_values();
        debug!(
            origin_id = %record.origin_id,
            should_upload,
            has_existing_media,
            image_fields = image_fields.len(),
            "image upload decision"
        );

        let (media, image_result) = if should_upload && !image_fields.is_empty() {
            match self.upload_images(&record, &remote.id, &image_fields) {
                Ok(media) => (media, Ok(())),
                Err(err) => (carried, Err(err)),
            }
        } else {
            if has_existing_media {
                debug!(origin_id = %record.origin_id, "keeping recorded media ids");
            }
            (carried, Ok(()))
        };

        // The primary step succeeded, so the record is tracked even if the
        // image step failed; a later run sees it as an update.
        let entry = LedgerRecord {
            origin_id: record.origin_id.clone(),
            destination_id: remote.id.clone(),
            title: record.title.clone(),
            url: remote.url.clone(),
            media_field_id_by_name: media,
        };
        self.ledger.upsert(entry.clone());
        progress.record = Some(entry);
        debug!(
            origin_id = %record.origin_id,
            stage = RecordStage::LedgerUpdated.as_str(),
            "stage reached"
        );

        image_result
    }

    fn send_primary(
        &self,
        record: &StagedRecord,
        existing: Option<&LedgerRecord>,
        payload: &Value,
    ) -> MigrationResult<RemoteRecord> {
        let (stage, result) = match existing {
            Some(entry) => {
                (RecordStage::Updated, self.api.update_record(&entry.destination_id, payload))
            }
            None => (RecordStage::Created, self.api.create_record(payload)),
        };
        let remote = result.map_err(|err| MigrationError::RecordFailed {
            origin_id: record.origin_id.clone(),
            stage,
            message: err.to_string(),
        })?;
        info!(
            origin_id = %record.origin_id,
            destination_id = %remote.id,
            stage = stage.as_str(),
            "primary request succeeded"
        );
        Ok(remote)
    }

    /// Upload one distinct pool image per field, then attach the new ids to
    /// the destination record with a second update.
    fn upload_images(
        &mut self,
        record: &StagedRecord,
        destination_id: &str,
        fields: &[&'static str],
    ) -> MigrationResult<BTreeMap<String, String>> {
        let failed = |message: String| MigrationError::RecordFailed {
            origin_id: record.origin_id.clone(),
            stage: RecordStage::ImagesHandled,
            message,
        };

        let picks = self.images.select(fields.len());
        if picks.len() < fields.len() {
            warn!(
                origin_id = %record.origin_id,
                needed = fields.len(),
                available = picks.len(),
                "image pool too small; some image fields stay empty"
            );
        }

        let mut media = BTreeMap::new();
        for (field, path) in fields.iter().zip(picks) {
            let upload = MediaUpload::from_path(&path, record.title.clone(), record.title.clone())
                .map_err(|err| failed(format!("Failed to read image {}: {err}", path.display())))?;
            let media_id = self
                .api
                .create_media(&upload)
                .map_err(|err| failed(format!("Failed to upload {}: {err}", upload.filename)))?;
            debug!(origin_id = %record.origin_id, field, media_id = %media_id, "uploaded image");
            media.insert(field.to_string(), media_id);
        }

        if !media.is_empty() {
            self.api
                .update_record(destination_id, &media_payload(&media))
                .map_err(|err| failed(format!("Failed to attach images: {err}")))?;
            info!(origin_id = %record.origin_id, count = media.len(), "images attached");
        }
        Ok(media)
    }
}
