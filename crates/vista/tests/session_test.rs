//! Integration tests for ExamSession: attaching, loading, editing and saving.

use std::sync::Arc;
use std::time::Duration;

use vista::catalog::{ComponentRecord, ComponentType, FieldValue};
use vista::layout::{CardKey, CopyDirection, LayoutData};
use vista::{
    Clipboard, CopyOutcome, ExamConfig, ExamId, ExamPage, ExamSession, InstanceId, LayoutId,
    LayoutInstance, MemoryStore, SaveOutcome, VistaError,
};
use vista::bucket::Bucket;

fn config() -> ExamConfig {
    ExamConfig::default().with_settle_delay(Duration::ZERO)
}

fn refraction_layout() -> LayoutData {
    LayoutData::from_json(
        r#"{"rows": [
            {"id": "r1", "cards": [
                {"id": "kera", "type": "keratometer"},
                {"id": "obj", "type": "objective"},
                {"id": "cover", "type": "cover-test"}
            ]},
            {"id": "r2", "cards": [
                {"id": "subj", "type": "subjective"},
                {"id": "n1", "type": "notes"}
            ]}
        ], "customWidths": {}}"#,
    )
    .expect("valid layout")
}

fn key(component: ComponentType) -> CardKey {
    CardKey::singleton(component).expect("singleton type")
}

fn new_session(store: &Arc<MemoryStore>) -> ExamSession {
    ExamSession::new(config(), store.clone(), store.clone())
}

fn persisted(id: i64, order: u32) -> LayoutInstance {
    LayoutInstance::new(InstanceId(id), Some(LayoutId(1)), refraction_layout())
        .with_exam(ExamId(7))
        .with_order(order)
}

fn bucket_with(component: ComponentType, field: &str, value: f64) -> Bucket {
    let mut bucket = Bucket::new();
    bucket.insert(key(component), ComponentRecord::new().with_field(field, value));
    bucket
}

// =============================================================================
// New exam: temporary ids and remapping
// =============================================================================

#[tokio::test]
async fn test_temporary_ids_are_remapped_on_first_save() {
    let store = Arc::new(MemoryStore::new().with_next_instance_id(55));
    let mut session = new_session(&store);

    let first = session.attach_layout(Some(LayoutId(1)), refraction_layout()).await.unwrap();
    let second = session.attach_layout(Some(LayoutId(2)), refraction_layout()).await.unwrap();
    assert_eq!(first, InstanceId(-1001));
    assert_eq!(second, InstanceId(-1002));
    assert_eq!(session.active(), Some(first));
    assert_eq!(store.create_calls(), 0);

    session
        .edit_field(first, key(ComponentType::Objective), "r_sph", 1.0)
        .unwrap();
    session
        .edit_field(second, key(ComponentType::Subjective), "l_sph", -0.5)
        .unwrap();
    let tab = session.add_tab(first, "cover").unwrap();

    session.assign_exam(ExamId(7));
    let report = session.save().await.unwrap();

    assert_eq!(
        report.remapped,
        vec![(InstanceId(-1001), InstanceId(55)), (InstanceId(-1002), InstanceId(56))]
    );
    assert_eq!(report.saved, vec![InstanceId(55), InstanceId(56)]);

    let ids: Vec<_> = session.instances().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![InstanceId(55), InstanceId(56)]);
    assert_eq!(session.active(), Some(InstanceId(55)));
    assert!(session.instances().iter().all(|i| i.exam_id == Some(ExamId(7))));

    assert!(session.buckets().instances().all(|id| !id.is_temporary()));
    assert!(session.bucket(InstanceId(-1001)).is_none());
    assert!(session.tabs(InstanceId(-1001)).is_none());
    assert_eq!(session.tabs(InstanceId(55)).unwrap().active_tab("cover"), Some(tab.as_str()));

    let record = session
        .record(InstanceId(55), &key(ComponentType::Objective))
        .unwrap();
    assert_eq!(record.layout_instance_id, Some(InstanceId(55)));
    assert!(record.id.is_some());

    let stored = store.stored(InstanceId(56)).await.unwrap();
    assert_eq!(
        stored.get(&key(ComponentType::Subjective)).unwrap().get("l_sph"),
        Some(&FieldValue::Number(-0.5))
    );
}

#[tokio::test]
async fn test_failed_creation_leaves_session_untouched() {
    let store = Arc::new(MemoryStore::new().with_next_instance_id(55));
    let mut session = new_session(&store);
    let first = session.attach_layout(Some(LayoutId(1)), refraction_layout()).await.unwrap();
    let second = session.attach_layout(Some(LayoutId(2)), refraction_layout()).await.unwrap();
    session
        .edit_field(second, key(ComponentType::Objective), "r_sph", 2.0)
        .unwrap();
    session.assign_exam(ExamId(7));

    store.fail_creates_after(1).await;
    let err = session.save().await.unwrap_err();
    assert!(matches!(
        err,
        VistaError::InstanceCreation { temporary_id, .. } if temporary_id == second
    ));

    let ids: Vec<_> = session.instances().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(session.active(), Some(first));
    assert!(session.record(second, &key(ComponentType::Objective)).is_some());
    assert_eq!(store.save_calls(), 0);

    // Retry succeeds with fresh ids
    store.clear_failures().await;
    let report = session.save().await.unwrap();
    assert_eq!(report.remapped.len(), 2);
    assert!(session.instances().iter().all(|i| !i.id.is_temporary()));
}

#[tokio::test]
async fn test_save_without_exam_is_an_error() {
    let store = Arc::new(MemoryStore::new());
    let mut session = new_session(&store);
    session.attach_layout(None, refraction_layout()).await.unwrap();

    assert!(matches!(session.save().await, Err(VistaError::MissingExam)));
}

// =============================================================================
// Existing exam: attach, load, save
// =============================================================================

#[tokio::test]
async fn test_attach_on_persisted_exam_creates_remotely() {
    let store = Arc::new(MemoryStore::new().with_next_instance_id(100));
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0)],
        store.clone(),
        store.clone(),
    );

    let id = session.attach_layout(Some(LayoutId(3)), refraction_layout()).await.unwrap();

    assert_eq!(id, InstanceId(100));
    assert_eq!(store.create_calls(), 1);
    assert_eq!(session.active(), Some(InstanceId(10)));
    assert_eq!(session.instance(id).unwrap().order, 1);
}

#[tokio::test]
async fn test_per_instance_save_failure_is_best_effort() {
    let store = Arc::new(MemoryStore::new());
    let instances = vec![persisted(10, 0), persisted(11, 1), persisted(12, 2)];
    let mut session =
        ExamSession::open(config(), ExamId(7), instances, store.clone(), store.clone());

    for id in [10, 11, 12] {
        session
            .edit_field(InstanceId(id), key(ComponentType::Objective), "r_sph", id as f64)
            .unwrap();
    }
    store.fail_saves_for(InstanceId(11)).await;

    let err = session.save().await.unwrap_err();
    assert!(matches!(err, VistaError::Persistence { instance, .. } if instance == InstanceId(11)));

    // The first instance stays written; nothing after the failure was attempted
    assert!(store.stored(InstanceId(10)).await.is_some());
    assert!(store.stored(InstanceId(12)).await.is_none());

    // Edits are still in memory for a retry
    assert!(session
        .record(InstanceId(12), &key(ComponentType::Objective))
        .is_some());
}

#[tokio::test]
async fn test_stale_load_is_discarded() {
    let store = Arc::new(MemoryStore::new());
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0)],
        store.clone(),
        store.clone(),
    );

    let older = session.begin_load(InstanceId(10));
    let newer = session.begin_load(InstanceId(10));
    assert!(newer.seq() > older.seq());

    assert!(session.finish_load(newer, bucket_with(ComponentType::Objective, "r_sph", 2.0)));
    assert!(!session.finish_load(older, bucket_with(ComponentType::Objective, "r_sph", 1.0)));

    let record = session
        .record(InstanceId(10), &key(ComponentType::Objective))
        .unwrap();
    assert_eq!(record.get("r_sph"), Some(&FieldValue::Number(2.0)));
    assert!(session.buckets().is_loaded(InstanceId(10)));
}

#[tokio::test]
async fn test_ensure_loaded_fetches_missing_buckets_once() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed(persisted(10, 0), bucket_with(ComponentType::Objective, "r_sph", 1.0))
        .await;
    store
        .seed(persisted(11, 1), bucket_with(ComponentType::Keratometer, "r_k1", 44.0))
        .await;
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0), persisted(11, 1)],
        store.clone(),
        store.clone(),
    );

    assert_eq!(session.ensure_loaded().await.unwrap(), 2);
    assert_eq!(store.load_calls(), 2);

    let aggregated = session.aggregate().await.unwrap();
    assert_eq!(aggregated.len(), 2);
    assert_eq!(store.load_calls(), 2);
}

#[tokio::test]
async fn test_save_leaves_unloaded_instances_alone() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed(persisted(10, 0), bucket_with(ComponentType::Objective, "r_sph", 1.0))
        .await;
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0)],
        store.clone(),
        store.clone(),
    );

    let report = session.save().await.unwrap();

    assert!(report.saved.is_empty());
    assert_eq!(store.save_calls(), 0);
    let stored = store.stored(InstanceId(10)).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_save_merges_edits_on_unloaded_instance_with_stored_records() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed(persisted(10, 0), bucket_with(ComponentType::Objective, "r_sph", 1.0))
        .await;
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0)],
        store.clone(),
        store.clone(),
    );

    session
        .edit_field(InstanceId(10), key(ComponentType::Keratometer), "r_k1", 44.5)
        .unwrap();
    let report = session.save().await.unwrap();

    assert_eq!(report.saved, vec![InstanceId(10)]);
    let stored = store.stored(InstanceId(10)).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(
        stored.get(&key(ComponentType::Objective)).unwrap().get("r_sph"),
        Some(&FieldValue::Number(1.0))
    );
    assert_eq!(
        stored.get(&key(ComponentType::Keratometer)).unwrap().get("r_k1"),
        Some(&FieldValue::Number(44.5))
    );
}

#[tokio::test]
async fn test_loading_keeps_edits_made_before_the_load() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed(persisted(10, 0), bucket_with(ComponentType::Objective, "r_sph", 1.0))
        .await;
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0)],
        store.clone(),
        store.clone(),
    );

    session
        .edit_field(InstanceId(10), key(ComponentType::Objective), "l_sph", -0.5)
        .unwrap();
    session
        .edit_field(InstanceId(10), key(ComponentType::Keratometer), "r_k1", 44.5)
        .unwrap();
    session.flush();
    assert_eq!(session.ensure_loaded().await.unwrap(), 1);

    let objective = session
        .record(InstanceId(10), &key(ComponentType::Objective))
        .unwrap();
    assert_eq!(objective.get("r_sph"), Some(&FieldValue::Number(1.0)));
    assert_eq!(objective.get("l_sph"), Some(&FieldValue::Number(-0.5)));
    assert!(session
        .record(InstanceId(10), &key(ComponentType::Keratometer))
        .is_some());
}

#[tokio::test]
async fn test_ensure_loaded_propagates_load_failure() {
    let store = Arc::new(MemoryStore::new());
    store.fail_loads_for(InstanceId(10)).await;
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0)],
        store.clone(),
        store.clone(),
    );

    assert!(session.ensure_loaded().await.is_err());
}

#[tokio::test]
async fn test_detach_moves_active_and_deletes_remote() {
    let store = Arc::new(MemoryStore::new());
    store.seed(persisted(10, 0), Bucket::new()).await;
    store.seed(persisted(11, 1), Bucket::new()).await;
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0).with_active(true), persisted(11, 1)],
        store.clone(),
        store.clone(),
    );

    session.detach(InstanceId(10)).await.unwrap();

    assert_eq!(session.active(), Some(InstanceId(11)));
    assert!(session.instance(InstanceId(11)).unwrap().is_active);
    assert!(store.instance(InstanceId(10)).await.is_none());
    assert!(matches!(
        session.detach(InstanceId(10)).await,
        Err(VistaError::UnknownInstance(_))
    ));
}

#[tokio::test]
async fn test_set_active_keeps_exactly_one() {
    let store = Arc::new(MemoryStore::new());
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0), persisted(11, 1).with_active(true)],
        store.clone(),
        store.clone(),
    );
    assert_eq!(session.active(), Some(InstanceId(11)));

    session.set_active(InstanceId(10)).unwrap();
    let active: Vec<_> = session
        .instances()
        .iter()
        .filter(|i| i.is_active)
        .map(|i| i.id)
        .collect();
    assert_eq!(active, vec![InstanceId(10)]);
    assert!(session.set_active(InstanceId(99)).is_err());
}

// =============================================================================
// Card actions
// =============================================================================

#[tokio::test]
async fn test_copy_to_neighbor_uses_field_mapping() {
    let store = Arc::new(MemoryStore::new());
    let mut session = new_session(&store);
    let id = session.attach_layout(None, refraction_layout()).await.unwrap();

    session
        .edit_field(id, key(ComponentType::Keratometer), "r_k1", 44.5)
        .unwrap();
    session
        .edit_field(id, key(ComponentType::Objective), "r_cyl", -0.75)
        .unwrap();

    let outcome = session
        .copy_to_neighbor(id, "kera", CopyDirection::Right)
        .unwrap();
    assert_eq!(
        outcome,
        CopyOutcome::Copied {
            card_id: "obj".to_string(),
            component: ComponentType::Objective,
        }
    );

    let objective = session.record(id, &key(ComponentType::Objective)).unwrap();
    assert_eq!(objective.get("r_sph"), Some(&FieldValue::Number(44.5)));
    assert_eq!(objective.get("r_cyl"), Some(&FieldValue::Number(-0.75)));
}

#[tokio::test]
async fn test_copy_to_neighbor_without_target() {
    let store = Arc::new(MemoryStore::new());
    let mut session = new_session(&store);
    let id = session.attach_layout(None, refraction_layout()).await.unwrap();

    assert_eq!(
        session.copy_to_neighbor(id, "n1", CopyDirection::Left).unwrap(),
        CopyOutcome::NoTarget
    );
    // Cover test without tabs has no key
    assert_eq!(
        session.copy_to_neighbor(id, "cover", CopyDirection::Below).unwrap(),
        CopyOutcome::Skipped
    );
    assert!(matches!(
        session.copy_to_neighbor(id, "missing", CopyDirection::Left),
        Err(VistaError::UnknownCard(_))
    ));
}

#[tokio::test]
async fn test_copy_below_reaches_following_rows() {
    let store = Arc::new(MemoryStore::new());
    let mut session = new_session(&store);
    let id = session.attach_layout(None, refraction_layout()).await.unwrap();
    session
        .edit_field(id, key(ComponentType::Objective), "r_sph", -1.25)
        .unwrap();

    let outcome = session.copy_to_neighbor(id, "obj", CopyDirection::Below).unwrap();
    assert!(matches!(outcome, CopyOutcome::Copied { ref card_id, .. } if card_id == "subj"));

    let subjective = session.record(id, &key(ComponentType::Subjective)).unwrap();
    assert_eq!(subjective.get("r_sph"), Some(&FieldValue::Number(-1.25)));
}

#[tokio::test]
async fn test_clear_card_keeps_identity() {
    let store = Arc::new(MemoryStore::new());
    let mut session = ExamSession::open(
        config(),
        ExamId(7),
        vec![persisted(10, 0)],
        store.clone(),
        store.clone(),
    );
    let mut bucket = Bucket::new();
    bucket.insert(
        key(ComponentType::Objective),
        ComponentRecord::new()
            .with_instance(InstanceId(10))
            .with_field("r_sph", 1.0)
            .with_field("l_sph", -0.5),
    );
    bucket.get_mut(&key(ComponentType::Objective)).unwrap().id = Some(31);
    let ticket = session.begin_load(InstanceId(10));
    session.finish_load(ticket, bucket);

    assert!(session.clear_card(InstanceId(10), "obj").unwrap());
    let record = session
        .record(InstanceId(10), &key(ComponentType::Objective))
        .unwrap();
    assert_eq!(record.id, Some(31));
    assert_eq!(record.layout_instance_id, Some(InstanceId(10)));
    assert!(record.fields.values().all(|v| *v == FieldValue::Null));

    // No record behind the card: nothing to clear
    assert!(!session.clear_card(InstanceId(10), "subj").unwrap());
}

#[tokio::test]
async fn test_cover_test_edits_follow_the_active_tab() {
    let store = Arc::new(MemoryStore::new());
    let mut session = new_session(&store);
    let id = session.attach_layout(None, refraction_layout()).await.unwrap();

    assert!(!session.edit_card_field(id, "cover", "fv_1", "ortho").unwrap());

    let first = session.add_tab(id, "cover").unwrap();
    assert!(session.edit_card_field(id, "cover", "fv_1", "ortho").unwrap());
    let second = session.add_tab(id, "cover").unwrap();
    assert!(session.edit_card_field(id, "cover", "fv_1", "exo").unwrap());
    session.flush();

    let first_record = session.record(id, &CardKey::cover_test("cover", first)).unwrap();
    let second_record = session.record(id, &CardKey::cover_test("cover", second)).unwrap();
    assert_eq!(first_record.get("fv_1"), Some(&FieldValue::from("ortho")));
    assert_eq!(second_record.get("fv_1"), Some(&FieldValue::from("exo")));
    assert_eq!(second_record.card_instance_id.as_deref(), Some("cover"));

    assert!(session.add_tab(id, "obj").is_err());
}

#[tokio::test]
async fn test_custom_width_is_validated() {
    let store = Arc::new(MemoryStore::new());
    let mut session = new_session(&store);
    let id = session.attach_layout(None, refraction_layout()).await.unwrap();

    session.set_custom_width(id, "r1", "obj", 40.0).unwrap();
    assert_eq!(
        session.instance(id).unwrap().layout_data.width_of("r1", "obj"),
        Some(40.0)
    );
    assert!(matches!(
        session.set_custom_width(id, "r1", "obj", 0.0),
        Err(VistaError::InvalidWidth { .. })
    ));
}

// =============================================================================
// ExamPage
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_second_save_while_saving_is_a_no_op() {
    let store = Arc::new(MemoryStore::new().with_delay(Duration::from_millis(50)));
    let mut session = new_session(&store);
    session.attach_layout(None, refraction_layout()).await.unwrap();
    session.assign_exam(ExamId(7));
    let page = ExamPage::new(session, Clipboard::new());

    let (a, b) = tokio::join!(page.save(), page.save());

    assert!(matches!(a.unwrap(), SaveOutcome::Saved(_)));
    assert_eq!(b.unwrap(), SaveOutcome::AlreadySaving);
    assert!(!page.is_saving());
    assert_eq!(store.create_calls(), 1);

    // The flag is released once the save finishes
    assert!(matches!(page.save().await.unwrap(), SaveOutcome::Saved(_)));
}

#[tokio::test]
async fn test_save_flag_is_released_after_failure() {
    let store = Arc::new(MemoryStore::new());
    let mut session = new_session(&store);
    session.attach_layout(None, refraction_layout()).await.unwrap();
    let page = ExamPage::new(session, Clipboard::new());

    assert!(page.save().await.is_err());
    assert!(!page.is_saving());
}
