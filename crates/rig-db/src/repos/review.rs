//! Approval and rejection repository.
//!
//! Reviewer transitions move a `pending` record to `approved` or `rejected`
//! and append the matching log entry in the same transaction. The status
//! update is conditional on the record still being pending, so two reviewers
//! racing on one record cannot both succeed.

use std::collections::HashMap;

use chrono::Utc;
use rig_core::disposition::{AUTO_APPROVAL_COMMENT, SYSTEM_REVIEWER};
use rig_core::entities::{Approval, Rejection};
use rig_core::enums::{ChangeKind, ChangeTable, ChecklistStatus};
use rig_core::identity::{Actor, ensure};
use rig_core::ids::{PREFIX_APPROVAL, PREFIX_REJECTION};

use super::checklist::update_status;
use crate::changes::PendingChanges;
use crate::error::DatabaseError;
use crate::helpers::{fmt_ts, get_opt_string, parse_datetime};
use crate::service::RigService;

fn row_to_approval(row: &libsql::Row) -> Result<Approval, DatabaseError> {
    Ok(Approval {
        id: row.get(0)?,
        checklist_id: row.get(1)?,
        reviewer: row.get(2)?,
        comment: get_opt_string(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

fn row_to_rejection(row: &libsql::Row) -> Result<Rejection, DatabaseError> {
    Ok(Rejection {
        id: row.get(0)?,
        checklist_id: row.get(1)?,
        reviewer: row.get(2)?,
        reason: row.get(3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

async fn insert_approval(
    conn: &libsql::Connection,
    approval: &Approval,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO approvals (id, checklist_id, reviewer, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        libsql::params![
            approval.id.as_str(),
            approval.checklist_id.as_str(),
            approval.reviewer.as_str(),
            approval.comment.as_deref(),
            fmt_ts(approval.created_at)
        ],
    )
    .await?;
    Ok(())
}

async fn insert_rejection(
    conn: &libsql::Connection,
    rejection: &Rejection,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO rejections (id, checklist_id, reviewer, reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        libsql::params![
            rejection.id.as_str(),
            rejection.checklist_id.as_str(),
            rejection.reviewer.as_str(),
            rejection.reason.as_str(),
            fmt_ts(rejection.created_at)
        ],
    )
    .await?;
    Ok(())
}

/// Ids bound per `IN` query, well under SQLite's bound-parameter limit.
const IN_LIST_CHUNK: usize = 500;

/// Build `?1, ?2, ...` placeholders and their values for an `IN` clause.
fn in_list(ids: &[String]) -> (String, Vec<libsql::Value>) {
    let placeholders = (1..=ids.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let values = ids.iter().cloned().map(libsql::Value::Text).collect();
    (placeholders, values)
}

impl RigService {
    /// Approve a pending checklist and append an approval entry.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` if the actor may not review.
    /// - `NotFound` if the checklist does not exist.
    /// - `Conflict` if the checklist is no longer pending. Nothing is appended.
    pub async fn approve_checklist(
        &self,
        actor: &Actor,
        checklist_id: &str,
        comment: Option<String>,
    ) -> Result<Approval, DatabaseError> {
        ensure(self.policy().can_review(actor.role), actor, "approve checklists")?;

        let _guard = self.lock().await;
        let approval = Approval {
            id: self.db().generate_id(PREFIX_APPROVAL).await?,
            checklist_id: checklist_id.to_string(),
            reviewer: actor.name.clone(),
            comment: comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            created_at: Utc::now(),
        };

        let tx = self.db().conn().transaction().await?;
        let work = async {
            let equipment_id = update_status(
                &tx,
                checklist_id,
                ChecklistStatus::Pending,
                ChecklistStatus::Approved,
                approval.created_at,
            )
            .await?;
            insert_approval(&tx, &approval).await?;
            Ok::<_, DatabaseError>(equipment_id)
        }
        .await;
        let equipment_id = Self::finish_tx(tx, work).await.inspect_err(|error| {
            tracing::warn!(checklist = %checklist_id, %error, "approval refused");
        })?;

        let mut changes = PendingChanges::default();
        changes.push(ChangeTable::Checklists, ChangeKind::Update, checklist_id);
        changes.push(ChangeTable::Approvals, ChangeKind::Insert, &approval.id);
        self.publish(changes);
        tracing::info!(checklist = %checklist_id, reviewer = %actor.name, "checklist approved");

        if let Some(equipment_id) = equipment_id {
            self.project_best_effort(&equipment_id).await;
        }
        Ok(approval)
    }

    /// Reject a pending checklist and append a rejection entry.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` if the actor may not review.
    /// - `Validation` if `reason` is blank.
    /// - `NotFound` if the checklist does not exist.
    /// - `Conflict` if the checklist is no longer pending. Nothing is appended.
    pub async fn reject_checklist(
        &self,
        actor: &Actor,
        checklist_id: &str,
        reason: &str,
    ) -> Result<Rejection, DatabaseError> {
        ensure(self.policy().can_review(actor.role), actor, "reject checklists")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DatabaseError::Validation(
                "a rejection reason is required".into(),
            ));
        }

        let _guard = self.lock().await;
        let rejection = Rejection {
            id: self.db().generate_id(PREFIX_REJECTION).await?,
            checklist_id: checklist_id.to_string(),
            reviewer: actor.name.clone(),
            reason: reason.to_string(),
            created_at: Utc::now(),
        };

        let tx = self.db().conn().transaction().await?;
        let work = async {
            let equipment_id = update_status(
                &tx,
                checklist_id,
                ChecklistStatus::Pending,
                ChecklistStatus::Rejected,
                rejection.created_at,
            )
            .await?;
            insert_rejection(&tx, &rejection).await?;
            Ok::<_, DatabaseError>(equipment_id)
        }
        .await;
        let equipment_id = Self::finish_tx(tx, work).await.inspect_err(|error| {
            tracing::warn!(checklist = %checklist_id, %error, "rejection refused");
        })?;

        let mut changes = PendingChanges::default();
        changes.push(ChangeTable::Checklists, ChangeKind::Update, checklist_id);
        changes.push(ChangeTable::Rejections, ChangeKind::Insert, &rejection.id);
        self.publish(changes);
        tracing::info!(checklist = %checklist_id, reviewer = %actor.name, "checklist rejected");

        if let Some(equipment_id) = equipment_id {
            self.project_best_effort(&equipment_id).await;
        }
        Ok(rejection)
    }

    /// Append the system approval note to an auto-approved submission.
    pub(crate) async fn append_system_approval(
        &self,
        checklist_id: &str,
    ) -> Result<Approval, DatabaseError> {
        let approval = Approval {
            id: self.db().generate_id(PREFIX_APPROVAL).await?,
            checklist_id: checklist_id.to_string(),
            reviewer: SYSTEM_REVIEWER.to_string(),
            comment: Some(AUTO_APPROVAL_COMMENT.to_string()),
            created_at: Utc::now(),
        };
        insert_approval(self.db().conn(), &approval).await?;

        let mut changes = PendingChanges::default();
        changes.push(ChangeTable::Approvals, ChangeKind::Insert, &approval.id);
        self.publish(changes);
        Ok(approval)
    }

    /// Approval entries of a checklist, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the checklist is not visible to
    /// the actor.
    pub async fn list_approvals(
        &self,
        actor: &Actor,
        checklist_id: &str,
    ) -> Result<Vec<Approval>, DatabaseError> {
        self.get_checklist(actor, checklist_id).await?;
        let _guard = self.lock().await;
        self.load_approvals(checklist_id).await
    }

    /// Rejection entries of a checklist, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the checklist is not visible to
    /// the actor.
    pub async fn list_rejections(
        &self,
        actor: &Actor,
        checklist_id: &str,
    ) -> Result<Vec<Rejection>, DatabaseError> {
        self.get_checklist(actor, checklist_id).await?;
        let _guard = self.lock().await;
        self.load_rejections(checklist_id).await
    }

    pub(crate) async fn load_approvals(
        &self,
        checklist_id: &str,
    ) -> Result<Vec<Approval>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, checklist_id, reviewer, comment, created_at FROM approvals
                 WHERE checklist_id = ?1 ORDER BY created_at, rowid",
                [checklist_id],
            )
            .await?;
        let mut approvals = Vec::new();
        while let Some(row) = rows.next().await? {
            approvals.push(row_to_approval(&row)?);
        }
        Ok(approvals)
    }

    pub(crate) async fn load_rejections(
        &self,
        checklist_id: &str,
    ) -> Result<Vec<Rejection>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, checklist_id, reviewer, reason, created_at FROM rejections
                 WHERE checklist_id = ?1 ORDER BY created_at, rowid",
                [checklist_id],
            )
            .await?;
        let mut rejections = Vec::new();
        while let Some(row) = rows.next().await? {
            rejections.push(row_to_rejection(&row)?);
        }
        Ok(rejections)
    }

    /// Latest approval and latest rejection per checklist id.
    ///
    /// Ids are queried in chunks of `IN_LIST_CHUNK`, so any number of
    /// records can be summarized.
    pub(crate) async fn latest_reviews(
        &self,
        checklist_ids: &[String],
    ) -> Result<(HashMap<String, Approval>, HashMap<String, Rejection>), DatabaseError> {
        let mut approvals = HashMap::new();
        let mut rejections = HashMap::new();

        for chunk in checklist_ids.chunks(IN_LIST_CHUNK) {
            let (placeholders, values) = in_list(chunk);

            // Later rows overwrite earlier ones, leaving the latest entry.
            let mut rows = self
                .db()
                .conn()
                .query(
                    &format!(
                        "SELECT id, checklist_id, reviewer, comment, created_at FROM approvals
                         WHERE checklist_id IN ({placeholders}) ORDER BY created_at, rowid"
                    ),
                    libsql::params_from_iter(values.clone()),
                )
                .await?;
            while let Some(row) = rows.next().await? {
                let approval = row_to_approval(&row)?;
                approvals.insert(approval.checklist_id.clone(), approval);
            }

            let mut rows = self
                .db()
                .conn()
                .query(
                    &format!(
                        "SELECT id, checklist_id, reviewer, reason, created_at FROM rejections
                         WHERE checklist_id IN ({placeholders}) ORDER BY created_at, rowid"
                    ),
                    libsql::params_from_iter(values),
                )
                .await?;
            while let Some(row) = rows.next().await? {
                let rejection = row_to_rejection(&row)?;
                rejections.insert(rejection.checklist_id.clone(), rejection);
            }
        }

        Ok((approvals, rejections))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rig_core::enums::EquipmentStatus;

    use super::*;
    use crate::test_support::helpers::*;

    async fn pending_forklift(svc: &RigService, code: &str) -> (String, String) {
        let forklift = register_forklift(svc, code).await;
        let outcome = svc
            .submit_checklist(&operator(), forklift_submission(&forklift.id, &["fk-17"]))
            .await
            .unwrap();
        assert_eq!(outcome.record.status, ChecklistStatus::Pending);
        (outcome.record.id, forklift.id)
    }

    #[tokio::test]
    async fn approve_pending_record() {
        let svc = test_service().await;
        let (id, equipment_id) = pending_forklift(&svc, "EMP-10").await;

        let approval = svc
            .approve_checklist(&supervisor(), &id, Some("ok".into()))
            .await
            .unwrap();
        assert_eq!(approval.reviewer, supervisor().name);
        assert_eq!(approval.comment.as_deref(), Some("ok"));

        let record = svc.get_checklist(&supervisor(), &id).await.unwrap();
        assert_eq!(record.status, ChecklistStatus::Approved);
        assert_eq!(svc.list_approvals(&supervisor(), &id).await.unwrap().len(), 1);

        let equipment = svc.get_equipment(&equipment_id).await.unwrap();
        assert_eq!(equipment.status, EquipmentStatus::InOperation);
    }

    #[tokio::test]
    async fn reject_pending_record_sends_equipment_to_maintenance() {
        let svc = test_service().await;
        let (id, equipment_id) = pending_forklift(&svc, "EMP-11").await;

        let rejection = svc
            .reject_checklist(&supervisor(), &id, "  fire extinguisher missing ")
            .await
            .unwrap();
        assert_eq!(rejection.reason, "fire extinguisher missing");

        let equipment = svc.get_equipment(&equipment_id).await.unwrap();
        assert_eq!(equipment.status, EquipmentStatus::UnderMaintenance);
    }

    #[tokio::test]
    async fn reject_requires_reason() {
        let svc = test_service().await;
        let (id, _) = pending_forklift(&svc, "EMP-12").await;

        let err = svc.reject_checklist(&supervisor(), &id, "   ").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        let record = svc.get_checklist(&supervisor(), &id).await.unwrap();
        assert_eq!(record.status, ChecklistStatus::Pending);
    }

    #[tokio::test]
    async fn latest_reviews_handles_more_ids_than_one_query_binds() {
        let svc = test_service().await;
        let (approved, _) = pending_forklift(&svc, "EMP-15").await;
        let (rejected, _) = pending_forklift(&svc, "EMP-16").await;
        svc.approve_checklist(&supervisor(), &approved, Some("ok".into()))
            .await
            .unwrap();
        svc.reject_checklist(&supervisor(), &rejected, "brake fluid leak")
            .await
            .unwrap();

        let mut ids: Vec<String> = (0..40_000).map(|i| format!("chk-absent-{i}")).collect();
        ids.push(approved.clone());
        ids.insert(0, rejected.clone());

        let (approvals, rejections) = svc.latest_reviews(&ids).await.unwrap();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[&approved].comment.as_deref(), Some("ok"));
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[&rejected].reason, "brake fluid leak");
    }

    #[tokio::test]
    async fn operator_cannot_review() {
        let svc = test_service().await;
        let (id, _) = pending_forklift(&svc, "EMP-13").await;

        let err = svc.approve_checklist(&operator(), &id, None).await.unwrap_err();
        assert!(matches!(err, DatabaseError::PermissionDenied(_)));
        assert!(svc.list_approvals(&supervisor(), &id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_review_conflicts_and_appends_nothing() {
        let svc = test_service().await;
        let (id, _) = pending_forklift(&svc, "EMP-14").await;

        svc.approve_checklist(&supervisor(), &id, None).await.unwrap();
        let err = svc
            .reject_checklist(&admin(), &id, "changed my mind")
            .await
            .unwrap_err();

        match err {
            DatabaseError::Conflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, "pending");
                assert_eq!(actual, "approved");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert!(svc.list_rejections(&admin(), &id).await.unwrap().is_empty());
        assert_eq!(svc.list_approvals(&admin(), &id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn approve_unknown_record() {
        let svc = test_service().await;
        let err = svc
            .approve_checklist(&supervisor(), "chk-deadbeef", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        assert_eq!(count_rows(&svc, "approvals").await, 0);
    }

    #[tokio::test]
    async fn concurrent_reviewers_only_one_wins() {
        let svc = test_service().await;
        let (id, _) = pending_forklift(&svc, "EMP-15").await;

        let supervisor = supervisor();
        let admin = admin();
        let (approved, rejected) = tokio::join!(
            svc.approve_checklist(&supervisor, &id, None),
            svc.reject_checklist(&admin, &id, "hydraulic leak"),
        );
        assert_ne!(approved.is_ok(), rejected.is_ok());

        let total = count_rows(&svc, "approvals").await + count_rows(&svc, "rejections").await;
        assert_eq!(total, 1);
    }
}
