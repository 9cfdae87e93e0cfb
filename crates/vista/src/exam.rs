//! Page-scoped exam context: configuration, session and clipboard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::clipboard::{Clipboard, CopyOutcome, PasteOutcome};
use crate::error::Result;
use crate::instance::{ExamSession, FullDataOutcome, InstanceId, RegenerateOutcome, SaveReport};
use crate::layout::{CopyDirection, PackingConfig};
use crate::persistence::ExamSnapshot;

/// Configuration for an exam session.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamConfig {
    /// Row budget for the full data layout.
    pub packing: PackingConfig,
    /// Pause after parallel loads before buckets are read.
    pub settle_delay: Duration,
    /// Temporary ids count down from here; the first is `temp_id_base - 1`.
    pub temp_id_base: i64,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            packing: PackingConfig::default(),
            settle_delay: Duration::from_millis(100),
            temp_id_base: -1000,
        }
    }
}

impl ExamConfig {
    pub fn with_packing(mut self, packing: PackingConfig) -> Self {
        self.packing = packing;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_temp_id_base(mut self, base: i64) -> Self {
        self.temp_id_base = base;
        self
    }
}

/// Result of [`ExamPage::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(SaveReport),
    /// Another save of this exam is still running; nothing was done.
    AlreadySaving,
}

/// One open exam: its session, the clipboard it was given, and the
/// save-in-flight flag.
pub struct ExamPage {
    session: Mutex<ExamSession>,
    clipboard: Clipboard,
    saving: AtomicBool,
}

struct SavingFlag<'a>(&'a AtomicBool);

impl Drop for SavingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExamPage {
    /// Open a page over a session. Pass a clone of another page's clipboard
    /// to share copy/paste between them.
    pub fn new(session: ExamSession, clipboard: Clipboard) -> Self {
        Self {
            session: Mutex::new(session),
            clipboard,
            saving: AtomicBool::new(false),
        }
    }

    /// Exclusive access to the session.
    pub async fn session(&self) -> MutexGuard<'_, ExamSession> {
        self.session.lock().await
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Save the exam unless a save is already running.
    pub async fn save(&self) -> Result<SaveOutcome> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Save requested while another is in flight");
            return Ok(SaveOutcome::AlreadySaving);
        }
        let _flag = SavingFlag(&self.saving);

        let report = self.session.lock().await.save().await?;
        Ok(SaveOutcome::Saved(report))
    }

    /// Copy a card's data to this page's clipboard.
    pub async fn copy_card(&self, instance: InstanceId, card_id: &str) -> Result<bool> {
        self.session
            .lock()
            .await
            .copy_to_clipboard(instance, card_id, &self.clipboard)
    }

    /// Paste this page's clipboard into a card.
    pub async fn paste_card(&self, instance: InstanceId, card_id: &str) -> Result<PasteOutcome> {
        self.session
            .lock()
            .await
            .paste_from_clipboard(instance, card_id, &self.clipboard)
    }

    pub async fn copy_to_neighbor(
        &self,
        instance: InstanceId,
        card_id: &str,
        direction: CopyDirection,
    ) -> Result<CopyOutcome> {
        self.session
            .lock()
            .await
            .copy_to_neighbor(instance, card_id, direction)
    }

    pub async fn create_full_data(&self) -> Result<FullDataOutcome> {
        self.session.lock().await.create_full_data().await
    }

    pub async fn regenerate_full_data(&self, instance: InstanceId) -> Result<RegenerateOutcome> {
        self.session.lock().await.regenerate_full_data(instance).await
    }

    pub async fn snapshot(&self) -> ExamSnapshot {
        self.session.lock().await.snapshot()
    }

    /// Close the page and take back the session.
    pub fn into_session(self) -> ExamSession {
        self.session.into_inner()
    }
}
