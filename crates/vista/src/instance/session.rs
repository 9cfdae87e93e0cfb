//! The layout instances of one exam and their in-memory data.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate_all_data, build_full_data_bucket, build_full_data_layout};
use crate::bucket::{Bucket, BucketStore, InputBuffer};
use crate::catalog::{ComponentRecord, ComponentType, FieldValue};
use crate::clipboard::{Clipboard, CopyOutcome, PasteOutcome};
use crate::error::{Result, VistaError};
use crate::exam::ExamConfig;
use crate::layout::{card_key, CardKey, CardTabs, CopyDirection, LayoutData};
use crate::mapping::{available_targets, clear_data, copy_data};
use crate::persistence::{ExamSnapshot, InstanceBucket};
use crate::service::{ComponentDataService, LayoutInstanceService, NewInstance};

use super::model::{ExamId, InstanceId, LayoutId, LayoutInstance, LayoutTemplate};

/// Sequence token for one load of one instance.
///
/// Only the newest ticket issued for an instance may write its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    instance: InstanceId,
    seq: u64,
}

impl LoadTicket {
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Result of building the full data instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullDataOutcome {
    Created { instance: InstanceId, cards: usize },
    /// Nothing is recorded anywhere on the exam; no instance was created.
    NoData,
}

/// Result of regenerating the full data instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenerateOutcome {
    Updated { cards: usize, added: usize },
    /// Cards and data are unchanged; nothing was rewritten.
    NothingToUpdate,
    /// Nothing is recorded anywhere on the exam; the instance was left as is.
    NoData,
}

/// What a successful save did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Temporary ids and the persisted ids that replaced them.
    pub remapped: Vec<(InstanceId, InstanceId)>,
    /// Instances whose data was saved, in order.
    pub saved: Vec<InstanceId>,
}

/// Layout instances of one exam, their buckets and pending edits.
pub struct ExamSession {
    config: ExamConfig,
    exam_id: Option<ExamId>,
    instances: Vec<LayoutInstance>,
    active: Option<InstanceId>,
    buckets: BucketStore,
    buffer: InputBuffer,
    tabs: IndexMap<InstanceId, CardTabs>,
    load_seq: HashMap<InstanceId, u64>,
    next_temp_id: i64,
    data_service: Arc<dyn ComponentDataService>,
    instance_service: Arc<dyn LayoutInstanceService>,
}

impl ExamSession {
    /// Session for a new, unsaved exam.
    pub fn new(
        config: ExamConfig,
        data_service: Arc<dyn ComponentDataService>,
        instance_service: Arc<dyn LayoutInstanceService>,
    ) -> Self {
        let next_temp_id = config.temp_id_base;
        Self {
            config,
            exam_id: None,
            instances: Vec::new(),
            active: None,
            buckets: BucketStore::new(),
            buffer: InputBuffer::new(),
            tabs: IndexMap::new(),
            load_seq: HashMap::new(),
            next_temp_id,
            data_service,
            instance_service,
        }
    }

    /// Session for an existing exam and its persisted instances.
    ///
    /// Buckets start unloaded.
    pub fn open(
        config: ExamConfig,
        exam_id: ExamId,
        mut instances: Vec<LayoutInstance>,
        data_service: Arc<dyn ComponentDataService>,
        instance_service: Arc<dyn LayoutInstanceService>,
    ) -> Self {
        instances.sort_by_key(|i| i.order);
        let active = instances
            .iter()
            .find(|i| i.is_active)
            .or_else(|| instances.first())
            .map(|i| i.id);

        let mut session = Self::new(config, data_service, instance_service);
        session.exam_id = Some(exam_id);
        for instance in &instances {
            session.tabs.insert(instance.id, CardTabs::new());
        }
        session.instances = instances;
        session.apply_active(active);
        session
    }

    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    pub fn exam_id(&self) -> Option<ExamId> {
        self.exam_id
    }

    /// Set the exam id once the exam itself has been created.
    pub fn assign_exam(&mut self, exam_id: ExamId) {
        self.exam_id = Some(exam_id);
    }

    /// Instances in display order.
    pub fn instances(&self) -> &[LayoutInstance] {
        &self.instances
    }

    pub fn instance(&self, id: InstanceId) -> Option<&LayoutInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    fn instance_mut(&mut self, id: InstanceId) -> Result<&mut LayoutInstance> {
        self.instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(VistaError::UnknownInstance(id))
    }

    pub fn active(&self) -> Option<InstanceId> {
        self.active
    }

    pub fn active_instance(&self) -> Option<&LayoutInstance> {
        self.active.and_then(|id| self.instance(id))
    }

    /// The first full data (template-less) instance, if any.
    pub fn full_data_instance(&self) -> Option<&LayoutInstance> {
        self.instances.iter().find(|i| i.is_full_data())
    }

    pub fn buckets(&self) -> &BucketStore {
        &self.buckets
    }

    pub fn bucket(&self, id: InstanceId) -> Option<&Bucket> {
        self.buckets.get(id)
    }

    pub fn tabs(&self, id: InstanceId) -> Option<&CardTabs> {
        self.tabs.get(&id)
    }

    /// Number of edits waiting to be flushed.
    pub fn pending_edits(&self) -> usize {
        self.buffer.len()
    }

    /// A record as currently held in the bucket store.
    ///
    /// Buffered edits are not visible until [`flush`](Self::flush).
    pub fn record(&self, id: InstanceId, key: &CardKey) -> Option<&ComponentRecord> {
        self.buckets.get(id).and_then(|b| b.get(key))
    }

    // --- instances -------------------------------------------------------

    /// Bind a layout to this exam.
    ///
    /// On a persisted exam the instance is created remotely straight away;
    /// otherwise it receives a temporary id until the first save. The first
    /// attached instance becomes active.
    pub async fn attach_layout(
        &mut self,
        layout_id: Option<LayoutId>,
        layout_data: LayoutData,
    ) -> Result<InstanceId> {
        self.attach(layout_id, layout_data, false).await
    }

    async fn attach(
        &mut self,
        layout_id: Option<LayoutId>,
        layout_data: LayoutData,
        activate: bool,
    ) -> Result<InstanceId> {
        let order = self
            .instances
            .iter()
            .map(|i| i.order + 1)
            .max()
            .unwrap_or(0);
        let make_active = activate || self.active.is_none();
        let previous = self.active;

        let instance = match self.exam_id {
            Some(exam_id) => {
                self.instance_service
                    .create(NewInstance {
                        exam_id,
                        layout_id,
                        is_active: make_active,
                        order,
                        layout_data,
                    })
                    .await?
            }
            None => {
                self.next_temp_id -= 1;
                LayoutInstance::new(InstanceId(self.next_temp_id), layout_id, layout_data)
                    .with_order(order)
            }
        };

        let id = instance.id;
        self.instances.push(instance);
        self.buckets.insert(id, Bucket::new());
        self.buckets.mark_loaded(id);
        self.tabs.insert(id, CardTabs::new());
        info!(instance = %id, layout = ?layout_id, "Attached layout instance");

        if make_active {
            self.apply_active(Some(id));
            if let Some(previous) = previous.filter(|p| !p.is_temporary()) {
                self.push_instance(previous).await?;
            }
        }
        Ok(id)
    }

    /// Write the in-memory state of a persisted instance to the service.
    async fn push_instance(&mut self, id: InstanceId) -> Result<()> {
        let instance = self
            .instance(id)
            .cloned()
            .ok_or(VistaError::UnknownInstance(id))?;
        self.instance_service.update(&instance).await?;
        Ok(())
    }

    /// Bind a reusable template to this exam.
    pub async fn attach_template(&mut self, template: &LayoutTemplate) -> Result<InstanceId> {
        self.attach_layout(Some(template.id), template.data.clone())
            .await
    }

    /// Remove an instance with its data. Persisted instances are deleted
    /// remotely first.
    pub async fn detach(&mut self, id: InstanceId) -> Result<()> {
        let instance = self.instance(id).ok_or(VistaError::UnknownInstance(id))?;
        if !instance.id.is_temporary() {
            self.instance_service.delete(id).await?;
        }

        self.instances.retain(|i| i.id != id);
        self.buckets.remove(id);
        self.buffer.discard_instance(id);
        self.tabs.shift_remove(&id);
        self.load_seq.remove(&id);

        if self.active == Some(id) {
            let next = self.instances.first().map(|i| i.id);
            self.apply_active(next);
        }

        info!(instance = %id, "Detached layout instance");
        Ok(())
    }

    /// Make `id` the only active instance.
    pub fn set_active(&mut self, id: InstanceId) -> Result<()> {
        if self.instance(id).is_none() {
            return Err(VistaError::UnknownInstance(id));
        }
        self.apply_active(Some(id));
        Ok(())
    }

    fn apply_active(&mut self, id: Option<InstanceId>) {
        self.active = id;
        for instance in &mut self.instances {
            instance.is_active = Some(instance.id) == id;
        }
    }

    // --- loading ---------------------------------------------------------

    /// Issue a load ticket, superseding any earlier ticket for the instance.
    pub fn begin_load(&mut self, id: InstanceId) -> LoadTicket {
        let seq = self.load_seq.entry(id).or_insert(0);
        *seq += 1;
        LoadTicket { instance: id, seq: *seq }
    }

    /// Store loaded data unless a newer load was issued since `ticket`.
    ///
    /// Loaded records go underneath anything already edited in memory.
    /// Returns whether the bucket was written.
    pub fn finish_load(&mut self, ticket: LoadTicket, bucket: Bucket) -> bool {
        let current = self.load_seq.get(&ticket.instance).copied().unwrap_or(0);
        if current != ticket.seq || self.instance(ticket.instance).is_none() {
            debug!(
                instance = %ticket.instance,
                ticket = ticket.seq,
                current,
                "Discarding stale load"
            );
            return false;
        }

        let tabs = self.tabs.entry(ticket.instance).or_default();
        tabs.absorb_bucket(&bucket);
        self.buckets.absorb_loaded(ticket.instance, bucket);
        true
    }

    /// Load one instance's data from the component data service.
    ///
    /// Temporary instances have nothing stored and are skipped.
    pub async fn load_instance(&mut self, id: InstanceId) -> Result<bool> {
        if self.instance(id).is_none() {
            return Err(VistaError::UnknownInstance(id));
        }
        if id.is_temporary() {
            return Ok(false);
        }

        let ticket = self.begin_load(id);
        let bucket = self.data_service.load_all(id).await?;
        Ok(self.finish_load(ticket, bucket))
    }

    /// Load every persisted template instance that is unloaded or empty, in
    /// parallel, then wait for the settle delay.
    ///
    /// Returns how many buckets were written.
    pub async fn ensure_loaded(&mut self) -> Result<usize> {
        let targets: Vec<InstanceId> = self
            .instances
            .iter()
            .filter(|i| !i.is_full_data() && !i.id.is_temporary())
            .filter(|i| !self.buckets.is_loaded(i.id) || !self.buckets.has_data(i.id))
            .map(|i| i.id)
            .collect();

        if targets.is_empty() {
            return Ok(0);
        }

        let mut tasks = JoinSet::new();
        for id in targets {
            let ticket = self.begin_load(id);
            let service = Arc::clone(&self.data_service);
            tasks.spawn(async move { (ticket, service.load_all(id).await) });
        }

        let mut written = 0;
        while let Some(joined) = tasks.join_next().await {
            let (ticket, result) =
                joined.map_err(|e| VistaError::Service(format!("load task failed: {}", e)))?;
            if self.finish_load(ticket, result?) {
                written += 1;
            }
        }

        tokio::time::sleep(self.config.settle_delay).await;
        debug!(instances = written, "Loaded instances before aggregation");
        Ok(written)
    }

    // --- edits -----------------------------------------------------------

    /// Buffer a field edit.
    pub fn edit_field(
        &mut self,
        id: InstanceId,
        key: CardKey,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        if self.instance(id).is_none() {
            return Err(VistaError::UnknownInstance(id));
        }
        self.buffer.push(id, key, field, value);
        Ok(())
    }

    /// Buffer a field edit on a card, addressed through its current tab.
    ///
    /// Returns false when the card has no resolvable key.
    pub fn edit_card_field(
        &mut self,
        id: InstanceId,
        card_id: &str,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Result<bool> {
        let (_, key) = self.resolve_card(id, card_id)?;
        match key {
            Some(key) => {
                self.buffer.push(id, key, field, value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply buffered edits to the bucket store.
    pub fn flush(&mut self) -> usize {
        self.buffer.flush(&mut self.buckets)
    }

    /// Add a tab to a cover-test card and select it.
    pub fn add_tab(&mut self, id: InstanceId, card_id: &str) -> Result<String> {
        let (component, _) = self.resolve_card(id, card_id)?;
        if component != ComponentType::CoverTest {
            return Err(VistaError::UnknownCard(card_id.to_string()));
        }
        Ok(self.tabs.entry(id).or_default().add_tab(card_id))
    }

    /// Select a tab of a card by index.
    pub fn select_tab(&mut self, id: InstanceId, card_id: &str, index: usize) -> Result<bool> {
        self.resolve_card(id, card_id)?;
        Ok(self.tabs.entry(id).or_default().select(card_id, index))
    }

    /// Override a card's width within its row.
    pub fn set_custom_width(
        &mut self,
        id: InstanceId,
        row_id: &str,
        card_id: &str,
        width: f64,
    ) -> Result<()> {
        self.instance_mut(id)?
            .layout_data
            .set_custom_width(row_id, card_id, width)
    }

    fn resolve_card(&self, id: InstanceId, card_id: &str) -> Result<(ComponentType, Option<CardKey>)> {
        let instance = self.instance(id).ok_or(VistaError::UnknownInstance(id))?;
        let card = instance
            .layout_data
            .find_card(card_id)
            .ok_or_else(|| VistaError::UnknownCard(card_id.to_string()))?;

        let empty = CardTabs::new();
        let tabs = self.tabs.get(&id).unwrap_or(&empty);
        Ok((card.component, card_key(card, tabs)))
    }

    fn current_or_blank(&self, id: InstanceId, key: &CardKey) -> ComponentRecord {
        self.record(id, key).cloned().unwrap_or_else(|| {
            let record = ComponentRecord::new().with_instance(id);
            match key.card_id() {
                Some(card_id) => record.with_card(card_id),
                None => record,
            }
        })
    }

    // --- card actions ----------------------------------------------------

    /// Blank every value of a card, keeping the record and its placement.
    ///
    /// Returns false when the card has no key or no record.
    pub fn clear_card(&mut self, id: InstanceId, card_id: &str) -> Result<bool> {
        self.flush();
        let (_, key) = self.resolve_card(id, card_id)?;
        let Some(key) = key else {
            return Ok(false);
        };

        let Some(record) = self.buckets.get_mut(id).and_then(|b| b.get_mut(&key)) else {
            return Ok(false);
        };
        *record = clear_data(record);
        debug!(instance = %id, card = card_id, "Cleared card");
        Ok(true)
    }

    /// Merge a card's data into the nearest compatible card in `direction`.
    pub fn copy_to_neighbor(
        &mut self,
        id: InstanceId,
        card_id: &str,
        direction: CopyDirection,
    ) -> Result<CopyOutcome> {
        self.flush();
        let (source_type, source_key) = self.resolve_card(id, card_id)?;
        let Some(source_key) = source_key else {
            return Ok(CopyOutcome::Skipped);
        };

        let instance = self.instance(id).ok_or(VistaError::UnknownInstance(id))?;
        let layout = &instance.layout_data;
        let targets = available_targets(source_type, layout.component_types());
        let Some(target) = layout
            .neighbours(card_id, direction)
            .into_iter()
            .find(|card| targets.contains(&card.component))
            .cloned()
        else {
            return Ok(CopyOutcome::NoTarget);
        };

        let (_, target_key) = self.resolve_card(id, &target.id)?;
        let Some(target_key) = target_key else {
            return Ok(CopyOutcome::Skipped);
        };

        let source = self.current_or_blank(id, &source_key);
        let current = self.current_or_blank(id, &target_key);
        let merged = copy_data(&source, &current, source_type, target.component);
        self.buckets.bucket_mut(id).insert(target_key, merged);

        debug!(
            instance = %id,
            from = card_id,
            to = %target.id,
            ?direction,
            "Copied card data to neighbour"
        );
        Ok(CopyOutcome::Copied {
            card_id: target.id,
            component: target.component,
        })
    }

    /// Put a card's data on the clipboard.
    ///
    /// Returns false when the card has no resolvable key.
    pub fn copy_to_clipboard(
        &mut self,
        id: InstanceId,
        card_id: &str,
        clipboard: &Clipboard,
    ) -> Result<bool> {
        self.flush();
        let (component, key) = self.resolve_card(id, card_id)?;
        let Some(key) = key else {
            return Ok(false);
        };

        clipboard.copy(component, self.current_or_blank(id, &key));
        Ok(true)
    }

    /// Merge the clipboard entry into a card.
    ///
    /// Soft outcomes (empty clipboard, incompatible types) leave the bucket
    /// untouched.
    pub fn paste_from_clipboard(
        &mut self,
        id: InstanceId,
        card_id: &str,
        clipboard: &Clipboard,
    ) -> Result<PasteOutcome> {
        self.flush();
        let (component, key) = self.resolve_card(id, card_id)?;
        let Some(key) = key else {
            return Ok(PasteOutcome::Skipped);
        };

        let current = self.current_or_blank(id, &key);
        match clipboard.paste_onto(component, &current) {
            Ok(merged) => {
                let from = clipboard.entry().map_or(component, |e| e.component);
                self.buckets.bucket_mut(id).insert(key, merged);
                Ok(PasteOutcome::Pasted { from })
            }
            Err(outcome) => Ok(outcome),
        }
    }

    // --- full data -------------------------------------------------------

    /// Instances in aggregation order: template instances by `order`, then
    /// full data instances.
    pub fn aggregation_order(&self) -> Vec<InstanceId> {
        let mut ordered: Vec<&LayoutInstance> = self.instances.iter().collect();
        ordered.sort_by_key(|i| (i.is_full_data(), i.order));
        ordered.into_iter().map(|i| i.id).collect()
    }

    /// Flush, load anything missing, and merge every bucket.
    pub async fn aggregate(&mut self) -> Result<Bucket> {
        self.flush();
        self.ensure_loaded().await?;

        let order = self.aggregation_order();
        Ok(aggregate_all_data(
            order.iter().filter_map(|id| self.buckets.get(*id)),
        ))
    }

    /// Create a full data instance showing everything recorded on the exam.
    pub async fn create_full_data(&mut self) -> Result<FullDataOutcome> {
        let aggregated = self.aggregate().await?;
        let Some(layout) = build_full_data_layout(&aggregated, None, &self.config.packing) else {
            info!("No recorded data for a full data layout");
            return Ok(FullDataOutcome::NoData);
        };

        let cards = layout.card_count();
        let id = self.attach(None, layout.clone(), true).await?;
        let bucket = build_full_data_bucket(id, &layout, &aggregated);
        self.tabs.insert(id, CardTabs::from_bucket(&bucket));
        self.buckets.insert(id, bucket);

        info!(instance = %id, cards, "Created full data layout");
        Ok(FullDataOutcome::Created { instance: id, cards })
    }

    /// Rebuild a full data instance in place from current data.
    pub async fn regenerate_full_data(&mut self, id: InstanceId) -> Result<RegenerateOutcome> {
        let previous = match self.instance(id) {
            Some(instance) if instance.is_full_data() => instance.layout_data.clone(),
            Some(_) => {
                return Err(VistaError::LayoutData(format!(
                    "instance {} is not a full data layout",
                    id
                )));
            }
            None => return Err(VistaError::UnknownInstance(id)),
        };

        // Record ids and the up-to-date check both need the stored copy.
        if !id.is_temporary() && !self.buckets.is_loaded(id) {
            self.load_instance(id).await?;
        }

        let aggregated = self.aggregate().await?;
        let Some(layout) = build_full_data_layout(&aggregated, Some(&previous), &self.config.packing)
        else {
            return Ok(RegenerateOutcome::NoData);
        };

        let mut bucket = build_full_data_bucket(id, &layout, &aggregated);
        let existing = self.buckets.get(id).cloned().unwrap_or_default();
        for (key, record) in existing.iter() {
            if let Some(fresh) = bucket.get_mut(key) {
                fresh.id = record.id;
            }
        }

        if card_signature(&layout) == card_signature(&previous) && same_data(&bucket, &existing) {
            info!(instance = %id, "Full data layout is up to date");
            return Ok(RegenerateOutcome::NothingToUpdate);
        }

        let added = layout
            .cards()
            .filter(|card| previous.find_card(&card.id).is_none())
            .count();
        let cards = layout.card_count();

        let mut updated = self
            .instance(id)
            .cloned()
            .ok_or(VistaError::UnknownInstance(id))?;
        updated.layout_data = layout;
        if !id.is_temporary() {
            self.instance_service.update(&updated).await?;
        }

        *self.instance_mut(id)? = updated;
        self.tabs.insert(id, CardTabs::from_bucket(&bucket));
        self.buckets.insert(id, bucket);
        self.buckets.mark_loaded(id);

        info!(instance = %id, cards, added, "Regenerated full data layout");
        Ok(RegenerateOutcome::Updated { cards, added })
    }

    // --- saving ----------------------------------------------------------

    /// Persist the exam's instances and their data.
    ///
    /// Temporary instances are created first; their ids are remapped only if
    /// every creation succeeded. Data is then saved instance by instance.
    /// A failed instance save stops the save; earlier saves stay written.
    ///
    /// Unloaded instances holding edits are loaded first so the save carries
    /// their stored records too. Unloaded instances without edits are not
    /// written.
    pub async fn save(&mut self) -> Result<SaveReport> {
        self.flush();
        let exam_id = self.exam_id.ok_or(VistaError::MissingExam)?;

        let partial: Vec<InstanceId> = self
            .instances
            .iter()
            .map(|i| i.id)
            .filter(|id| !id.is_temporary() && !self.buckets.is_loaded(*id))
            .filter(|id| self.buckets.has_data(*id))
            .collect();
        for id in partial {
            self.load_instance(id).await?;
        }

        let remapped = self.persist_temporary(exam_id).await?;
        self.apply_remap(&remapped, exam_id);

        let ids: Vec<InstanceId> = self.instances.iter().map(|i| i.id).collect();
        let mut saved = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.buckets.is_loaded(id) {
                debug!(instance = %id, "Skipping save of unloaded instance");
                continue;
            }
            let bucket = self.buckets.get(id).cloned().unwrap_or_default();
            match self.data_service.save_all(id, &bucket).await {
                Ok(stored) => {
                    self.buckets.insert(id, stored);
                    self.buckets.mark_loaded(id);
                    saved.push(id);
                }
                Err(e) => {
                    warn!(instance = %id, saved = saved.len(), error = %e, "Saving instance data failed");
                    return Err(VistaError::Persistence {
                        instance: id,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(exam = %exam_id, instances = saved.len(), "Saved exam");
        Ok(SaveReport { remapped, saved })
    }

    async fn persist_temporary(&self, exam_id: ExamId) -> Result<Vec<(InstanceId, InstanceId)>> {
        let requests: Vec<(InstanceId, NewInstance)> = self
            .instances
            .iter()
            .filter(|i| i.id.is_temporary())
            .map(|i| (i.id, NewInstance::from_instance(exam_id, i)))
            .collect();

        let mut remapped = Vec::with_capacity(requests.len());
        for (temporary_id, request) in requests {
            match self.instance_service.create(request).await {
                Ok(created) => remapped.push((temporary_id, created.id)),
                Err(e) => {
                    for (_, orphan) in &remapped {
                        warn!(instance = %orphan, "Created instance left orphaned by failed save");
                    }
                    return Err(VistaError::InstanceCreation {
                        temporary_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(remapped)
    }

    fn apply_remap(&mut self, remapped: &[(InstanceId, InstanceId)], exam_id: ExamId) {
        for instance in &mut self.instances {
            instance.exam_id = Some(exam_id);
        }

        for &(from, to) in remapped {
            if let Some(instance) = self.instances.iter_mut().find(|i| i.id == from) {
                instance.id = to;
            }
            if self.active == Some(from) {
                self.active = Some(to);
            }
            self.buckets.rekey(from, to);
            self.buffer.rekey(from, to);
            if let Some(seq) = self.load_seq.remove(&from) {
                self.load_seq.insert(to, seq);
            }
            info!(from = %from, to = %to, "Remapped temporary instance");
        }

        self.tabs = std::mem::take(&mut self.tabs)
            .into_iter()
            .map(|(id, tabs)| {
                let id = remapped
                    .iter()
                    .find(|(from, _)| *from == id)
                    .map_or(id, |(_, to)| *to);
                (id, tabs)
            })
            .collect();
    }

    /// Snapshot of the in-memory state, including unsaved data.
    pub fn snapshot(&self) -> ExamSnapshot {
        let mut snapshot = ExamSnapshot::new(self.exam_id);
        snapshot.instances = self.instances.clone();
        snapshot.buckets = self
            .buckets
            .iter()
            .map(|(instance_id, records)| InstanceBucket {
                instance_id,
                records: records.clone(),
            })
            .collect();
        snapshot
    }
}

fn card_signature(layout: &LayoutData) -> Vec<(ComponentType, &str)> {
    layout
        .cards()
        .map(|card| (card.component, card.id.as_str()))
        .collect()
}

fn same_data(a: &Bucket, b: &Bucket) -> bool {
    a.len() == b.len()
        && a.iter().all(|(key, record)| {
            b.get(key).is_some_and(|other| {
                other.fields == record.fields && other.card_instance_id == record.card_instance_id
            })
        })
}
