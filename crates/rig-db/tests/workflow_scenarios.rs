//! End-to-end workflow scenarios against the public store API.
//!
//! - Submission dispositions for equipment and accessory checklists
//! - Reviewer transitions and their log entries
//! - Atomicity of submissions under injected write failures
//! - Best-effort system approval notes
//! - Change feed contents
//! - Persistence across reopen

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::broadcast::error::TryRecvError;

use rig_core::catalog::Catalog;
use rig_core::disposition::{AUTO_APPROVAL_COMMENT, SYSTEM_REVIEWER};
use rig_core::entities::{Answer, ChangeEvent, NewChecklist, NewEquipment};
use rig_core::enums::{ChangeKind, ChangeTable, ChecklistStatus, EquipmentStatus, Role};
use rig_core::identity::Actor;
use rig_db::error::DatabaseError;
use rig_db::repos::checklist::RecordFilter;
use rig_db::service::RigService;

async fn test_service() -> RigService {
    RigService::new_local(":memory:", 1024, Catalog::builtin().unwrap())
        .await
        .unwrap()
}

fn operator() -> Actor {
    Actor::new("Ana Souza", "B-1042", Role::Operator)
}

fn supervisor() -> Actor {
    Actor::new("Bruno Reis", "S-0007", Role::Supervisor)
}

fn admin() -> Actor {
    Actor::new("Elisa Prado", "A-0001", Role::Admin)
}

async fn forklift(svc: &RigService, code: &str) -> String {
    svc.register_equipment(
        &admin(),
        NewEquipment {
            code: code.into(),
            model: "Toyota 8FGU25".into(),
            category: "forklift".into(),
            location: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn submission(category: &str, equipment_id: Option<&str>, fails: &[&str]) -> NewChecklist {
    let catalog = Catalog::builtin().unwrap();
    let answers = catalog
        .category(category)
        .unwrap()
        .items
        .iter()
        .map(|item| {
            if fails.contains(&item.id.as_str()) {
                Answer::fail(item.id.as_str(), "not ok")
            } else {
                Answer::pass(item.id.as_str())
            }
        })
        .collect();
    NewChecklist {
        category: category.into(),
        equipment_id: equipment_id.map(String::from),
        operator: operator().operator_ref(),
        signature: Some("sig://B-1042".into()),
        answers,
    }
}

async fn count(svc: &RigService, table: &str) -> i64 {
    let mut rows = svc
        .db()
        .conn()
        .query(&format!("SELECT COUNT(*) FROM {table}"), ())
        .await
        .unwrap();
    rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<ChangeEvent>) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) => return events,
            Err(other) => panic!("unexpected receive error: {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_a_non_critical_failure_waits_for_review() {
    let svc = test_service().await;
    let equipment_id = forklift(&svc, "EMP-01").await;

    let outcome = svc
        .submit_checklist(&operator(), submission("forklift", Some(&equipment_id), &["fk-16"]))
        .await
        .unwrap();

    assert_eq!(outcome.record.status, ChecklistStatus::Pending);
    assert_eq!(outcome.record.tally.total, 17);
    assert_eq!(outcome.record.tally.non_conforming, 1);
    assert!(outcome.auto_approval.is_none());
    assert_eq!(count(&svc, "approvals").await, 0);

    let equipment = svc.get_equipment(&equipment_id).await.unwrap();
    assert_eq!(equipment.status, EquipmentStatus::Available);
}

#[tokio::test]
async fn scenario_b_clean_forklift_auto_approved() {
    let svc = test_service().await;
    let equipment_id = forklift(&svc, "EMP-02").await;

    let outcome = svc
        .submit_checklist(&operator(), submission("forklift", Some(&equipment_id), &[]))
        .await
        .unwrap();

    assert_eq!(outcome.record.status, ChecklistStatus::Approved);
    let approvals = svc
        .list_approvals(&supervisor(), &outcome.record.id)
        .await
        .unwrap();
    assert_eq!(approvals.len(), 1);
    assert_eq!(approvals[0].reviewer, SYSTEM_REVIEWER);
    assert_eq!(approvals[0].comment.as_deref(), Some(AUTO_APPROVAL_COMMENT));

    let equipment = svc.get_equipment(&equipment_id).await.unwrap();
    assert_eq!(equipment.status, EquipmentStatus::InOperation);
}

#[tokio::test]
async fn scenario_c_sling_failure_rejected_outright() {
    let svc = test_service().await;

    let outcome = svc
        .submit_checklist(&operator(), submission("sling", None, &["sl-05"]))
        .await
        .unwrap();

    assert_eq!(outcome.record.status, ChecklistStatus::Rejected);
    assert_eq!(outcome.record.tally.total, 8);
    assert!(outcome.record.tally.has_critical_issue);
    assert_eq!(outcome.record.equipment_id, None);
    assert_eq!(count(&svc, "approvals").await, 0);
    assert_eq!(count(&svc, "rejections").await, 0);
}

#[tokio::test]
async fn scenario_d_reviewer_approves_with_comment() {
    let svc = test_service().await;
    let equipment_id = forklift(&svc, "EMP-03").await;
    let id = svc
        .submit_checklist(&operator(), submission("forklift", Some(&equipment_id), &["fk-12"]))
        .await
        .unwrap()
        .record
        .id;

    svc.approve_checklist(&supervisor(), &id, Some("ok".into()))
        .await
        .unwrap();

    let detail = svc.get_checklist_detail(&supervisor(), &id).await.unwrap();
    assert_eq!(detail.record.status, ChecklistStatus::Approved);
    assert_eq!(detail.approvals.len(), 1);
    assert_eq!(detail.approvals[0].reviewer, "Bruno Reis");
    assert_eq!(detail.approvals[0].comment.as_deref(), Some("ok"));
    assert!(detail.rejections.is_empty());

    let summaries = svc
        .list_checklists(&supervisor(), &RecordFilter::default())
        .await
        .unwrap();
    assert_eq!(
        summaries[0].latest_approval.as_ref().map(|a| a.reviewer.as_str()),
        Some("Bruno Reis")
    );
}

#[tokio::test]
async fn reject_then_equipment_goes_to_maintenance() {
    let svc = test_service().await;
    let equipment_id = forklift(&svc, "EMP-04").await;
    let id = svc
        .submit_checklist(&operator(), submission("forklift", Some(&equipment_id), &["fk-02"]))
        .await
        .unwrap()
        .record
        .id;

    svc.reject_checklist(&supervisor(), &id, "brakes unreliable")
        .await
        .unwrap();

    assert_eq!(count(&svc, "rejections").await, 1);
    let equipment = svc.get_equipment(&equipment_id).await.unwrap();
    assert_eq!(equipment.status, EquipmentStatus::UnderMaintenance);
}

// ---------------------------------------------------------------------------
// Atomicity and best-effort follow-ups
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_answer_write_leaves_nothing_behind() {
    let svc = test_service().await;
    let equipment_id = forklift(&svc, "EMP-05").await;
    svc.db()
        .conn()
        .execute(
            "CREATE TRIGGER fail_answer BEFORE INSERT ON answers WHEN NEW.item_id = 'fk-09'
             BEGIN SELECT RAISE(ABORT, 'disk full'); END",
            (),
        )
        .await
        .unwrap();
    let mut rx = svc.subscribe();

    let err = svc
        .submit_checklist(&operator(), submission("forklift", Some(&equipment_id), &[]))
        .await
        .unwrap_err();

    match &err {
        DatabaseError::Integrity { stage, reason } => {
            assert_eq!(stage, "answers");
            assert!(reason.contains("disk full"), "reason: {reason}");
        }
        other => panic!("expected integrity fault, got {other:?}"),
    }
    assert!(!err.is_transient());
    assert_eq!(count(&svc, "checklists").await, 0);
    assert_eq!(count(&svc, "answers").await, 0);
    assert!(drain(&mut rx).is_empty());

    // The whole submission can be retried once the fault clears.
    svc.db()
        .conn()
        .execute("DROP TRIGGER fail_answer", ())
        .await
        .unwrap();
    svc.submit_checklist(&operator(), submission("forklift", Some(&equipment_id), &[]))
        .await
        .unwrap();
    assert_eq!(count(&svc, "checklists").await, 1);
    assert_eq!(count(&svc, "answers").await, 17);
}

#[tokio::test]
async fn failed_system_note_keeps_record_approved() {
    let svc = test_service().await;
    let equipment_id = forklift(&svc, "EMP-06").await;
    svc.db()
        .conn()
        .execute(
            &format!(
                "CREATE TRIGGER fail_note BEFORE INSERT ON approvals WHEN NEW.reviewer = '{SYSTEM_REVIEWER}'
                 BEGIN SELECT RAISE(ABORT, 'approval log unavailable'); END"
            ),
            (),
        )
        .await
        .unwrap();

    let outcome = svc
        .submit_checklist(&operator(), submission("forklift", Some(&equipment_id), &[]))
        .await
        .unwrap();

    assert_eq!(outcome.record.status, ChecklistStatus::Approved);
    assert!(outcome.auto_approval.is_none());
    let stored = svc
        .get_checklist(&supervisor(), &outcome.record.id)
        .await
        .unwrap();
    assert_eq!(stored.status, ChecklistStatus::Approved);
    assert_eq!(count(&svc, "approvals").await, 0);

    let equipment = svc.get_equipment(&equipment_id).await.unwrap();
    assert_eq!(equipment.status, EquipmentStatus::InOperation);
}

#[tokio::test]
async fn failed_rejection_append_keeps_record_pending() {
    let svc = test_service().await;
    let equipment_id = forklift(&svc, "EMP-07").await;
    let id = svc
        .submit_checklist(&operator(), submission("forklift", Some(&equipment_id), &["fk-04"]))
        .await
        .unwrap()
        .record
        .id;
    svc.db()
        .conn()
        .execute(
            "CREATE TRIGGER fail_rejection BEFORE INSERT ON rejections
             BEGIN SELECT RAISE(ABORT, 'log unavailable'); END",
            (),
        )
        .await
        .unwrap();

    assert!(svc.reject_checklist(&supervisor(), &id, "leak").await.is_err());

    let record = svc.get_checklist(&supervisor(), &id).await.unwrap();
    assert_eq!(record.status, ChecklistStatus::Pending);
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submission_publishes_one_event_per_row() {
    let svc = test_service().await;
    let mut rx = svc.subscribe();

    let mut sling = submission("sling", None, &["sl-01"]);
    sling.answers[0] = Answer::fail("sl-01", "label missing")
        .with_photo("photo://1")
        .with_photo("photo://2");
    svc.submit_checklist(&operator(), sling).await.unwrap();

    let events = drain(&mut rx);
    let count_of = |table: ChangeTable| events.iter().filter(|e| e.table == table).count();
    assert_eq!(count_of(ChangeTable::Checklists), 1);
    assert_eq!(count_of(ChangeTable::Answers), 8);
    assert_eq!(count_of(ChangeTable::Photos), 2);
    assert_eq!(events.len(), 11);
    assert!(events.iter().all(|e| e.kind == ChangeKind::Insert));
}

#[tokio::test]
async fn review_publishes_status_update_and_log_insert() {
    let svc = test_service().await;
    let equipment_id = forklift(&svc, "EMP-08").await;
    let id = svc
        .submit_checklist(&operator(), submission("forklift", Some(&equipment_id), &["fk-10"]))
        .await
        .unwrap()
        .record
        .id;
    let mut rx = svc.subscribe();

    svc.approve_checklist(&supervisor(), &id, None).await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(
        events[0],
        ChangeEvent::new(ChangeTable::Checklists, ChangeKind::Update, id.as_str())
    );
    assert_eq!(events[1].table, ChangeTable::Approvals);
    assert_eq!(events[2].table, ChangeTable::Equipment);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rigcheck.db");
    let path = path.to_str().unwrap();

    let id = {
        let svc = RigService::new_local(path, 16, Catalog::builtin().unwrap())
            .await
            .unwrap();
        svc.submit_checklist(&operator(), submission("shackle", None, &[]))
            .await
            .unwrap()
            .record
            .id
    };

    let svc = RigService::new_local(path, 16, Catalog::builtin().unwrap())
        .await
        .unwrap();
    let record = svc.get_checklist(&operator(), &id).await.unwrap();
    assert_eq!(record.category, "shackle");
    assert_eq!(record.tally.total, 6);
    assert_eq!(record.status, ChecklistStatus::Approved);
}
