//! Checklist record repository.
//!
//! A submission writes its header, answers and photos in one transaction.
//! The system approval note and the equipment projection follow as separate
//! writes and never undo a committed submission.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rig_core::aggregate::AnswerTally;
use rig_core::disposition;
use rig_core::entities::{Answer, ChecklistRecord, NewChecklist, OperatorRef};
use rig_core::enums::{ChangeKind, ChangeTable, ChecklistStatus};
use rig_core::errors::CoreError;
use rig_core::identity::{Actor, ensure};
use rig_core::ids::{PREFIX_ANSWER, PREFIX_CHECKLIST, PREFIX_PHOTO};
use rig_core::responses::{ChecklistDetail, RecordSummary, SubmissionOutcome};
use rig_core::validation::validate_submission;

use crate::changes::PendingChanges;
use crate::error::DatabaseError;
use crate::helpers::{fmt_ts, get_bool, get_opt_string, get_u32, parse_datetime, parse_enum};
use crate::service::RigService;

const SELECT_COLS: &str = "c.id, c.equipment_id, c.operator_name, c.operator_badge, c.category, \
     c.category_class, c.signature, c.total_items, c.conforming_items, c.non_conforming_items, \
     c.has_critical_issue, c.status, c.created_at, c.status_changed_at";

/// Filter criteria for record list queries.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub status: Option<ChecklistStatus>,
    pub category: Option<String>,
    pub equipment_id: Option<String>,
    /// Ignored for roles that only see their own records.
    pub operator_badge: Option<String>,
    /// Inclusive lower bound on submission time.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on submission time.
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

fn row_to_record(row: &libsql::Row) -> Result<ChecklistRecord, DatabaseError> {
    Ok(ChecklistRecord {
        id: row.get(0)?,
        equipment_id: get_opt_string(row, 1)?,
        operator: OperatorRef {
            name: row.get(2)?,
            badge_id: row.get(3)?,
        },
        category: row.get(4)?,
        category_class: parse_enum(&row.get::<String>(5)?)?,
        signature: row.get(6)?,
        tally: AnswerTally {
            total: get_u32(row, 7)?,
            conforming: get_u32(row, 8)?,
            non_conforming: get_u32(row, 9)?,
            has_critical_issue: get_bool(row, 10)?,
        },
        status: parse_enum(&row.get::<String>(11)?)?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
        status_changed_at: parse_datetime(&row.get::<String>(13)?)?,
    })
}

/// Compare-and-swap the status of a checklist.
///
/// Succeeds only while the stored status equals `expected`. Returns the
/// record's equipment id so callers can refresh the projection.
///
/// # Errors
///
/// `InvalidState` for a transition the state machine forbids, `NotFound` for
/// an unknown id and `Conflict` when the record has already moved on.
pub(crate) async fn update_status(
    conn: &libsql::Connection,
    id: &str,
    expected: ChecklistStatus,
    next: ChecklistStatus,
    at: DateTime<Utc>,
) -> Result<Option<String>, DatabaseError> {
    if !expected.can_transition_to(next) {
        return Err(CoreError::InvalidTransition {
            entity_type: "checklist".into(),
            id: id.to_string(),
            from: expected.to_string(),
            to: next.to_string(),
        }
        .into());
    }

    let changed = conn
        .execute(
            "UPDATE checklists SET status = ?1, status_changed_at = ?2 WHERE id = ?3 AND status = ?4",
            libsql::params![next.as_str(), fmt_ts(at), id, expected.as_str()],
        )
        .await?;

    let mut rows = conn
        .query(
            "SELECT status, equipment_id FROM checklists WHERE id = ?1",
            [id],
        )
        .await?;
    let row = rows
        .next()
        .await?
        .ok_or_else(|| DatabaseError::not_found("checklist", id))?;

    if changed == 0 {
        return Err(DatabaseError::Conflict {
            id: id.to_string(),
            expected: expected.to_string(),
            actual: row.get::<String>(0)?,
        });
    }
    get_opt_string(&row, 1)
}

async fn insert_header(
    conn: &libsql::Connection,
    record: &ChecklistRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO checklists (id, equipment_id, operator_name, operator_badge, category, category_class,
             signature, total_items, conforming_items, non_conforming_items, has_critical_issue,
             status, created_at, status_changed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        libsql::params![
            record.id.as_str(),
            record.equipment_id.as_deref(),
            record.operator.name.as_str(),
            record.operator.badge_id.as_str(),
            record.category.as_str(),
            record.category_class.as_str(),
            record.signature.as_str(),
            i64::from(record.tally.total),
            i64::from(record.tally.conforming),
            i64::from(record.tally.non_conforming),
            i64::from(record.tally.has_critical_issue),
            record.status.as_str(),
            fmt_ts(record.created_at),
            fmt_ts(record.status_changed_at)
        ],
    )
    .await?;
    Ok(())
}

async fn child_ids(
    conn: &libsql::Connection,
    table: ChangeTable,
    checklist_id: &str,
) -> Result<Vec<String>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT id FROM {} WHERE checklist_id = ?1 ORDER BY id",
                table.as_str()
            ),
            [checklist_id],
        )
        .await?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next().await? {
        ids.push(row.get::<String>(0)?);
    }
    Ok(ids)
}

impl RigService {
    /// Validate, score and persist a checklist submission.
    ///
    /// The record header, answers and photos are written in one transaction.
    /// Equipment submissions with no failures then receive a system approval
    /// note, and decided records refresh their equipment's projected status.
    /// Neither follow-up can undo the submission.
    ///
    /// # Errors
    ///
    /// - `Validation` if the submission fails catalog checks or names
    ///   equipment that is not registered for this category.
    /// - `PermissionDenied` if an operator submits under another badge.
    /// - `Integrity` if any row of the submission fails to write. Nothing is
    ///   kept and the whole submission may be retried.
    pub async fn submit_checklist(
        &self,
        actor: &Actor,
        submission: NewChecklist,
    ) -> Result<SubmissionOutcome, DatabaseError> {
        if submission.operator.badge_id != actor.badge_id {
            ensure(
                self.policy().sees_all_records(actor.role),
                actor,
                "submit checklists for another operator",
            )?;
        }
        let category = validate_submission(self.catalog(), &submission)?;
        let class = category.class;

        let _guard = self.lock().await;

        if let Some(equipment_id) = &submission.equipment_id {
            let equipment = self.load_equipment(equipment_id).await?.ok_or_else(|| {
                DatabaseError::Validation(format!("equipment '{equipment_id}' is not registered"))
            })?;
            if equipment.category != submission.category {
                return Err(DatabaseError::Validation(format!(
                    "equipment '{}' is inspected with the '{}' checklist, not '{}'",
                    equipment.code, equipment.category, submission.category
                )));
            }
        }

        let tally =
            AnswerTally::from_answers(&submission.answers, class, category.critical_item_ids());
        let status = disposition::resolve(&tally, class);
        tracing::debug!(category = %submission.category, %status, ?tally, "disposition resolved");

        let now = Utc::now();
        let record = ChecklistRecord {
            id: self.db().generate_id(PREFIX_CHECKLIST).await?,
            equipment_id: submission.equipment_id,
            operator: submission.operator,
            category: submission.category,
            category_class: class,
            signature: submission.signature.unwrap_or_default(),
            tally,
            status,
            created_at: now,
            status_changed_at: now,
        };

        let tx = self.db().conn().transaction().await?;
        let written = self.write_submission(&tx, &record, &submission.answers).await;
        let changes = Self::finish_tx(tx, written).await.map_err(|e| match e {
            e @ DatabaseError::Integrity { .. } => e,
            other => DatabaseError::integrity("commit", other),
        })?;
        self.publish(changes);
        tracing::info!(
            checklist = %record.id,
            category = %record.category,
            status = %record.status,
            non_conforming = record.tally.non_conforming,
            "submission persisted"
        );

        let auto_approval = if disposition::qualifies_for_auto_approval(status, class) {
            match self.append_system_approval(&record.id).await {
                Ok(approval) => Some(approval),
                Err(error) => {
                    tracing::warn!(
                        checklist = %record.id,
                        %error,
                        "system approval note not written; record remains approved"
                    );
                    None
                }
            }
        } else {
            None
        };

        if status != ChecklistStatus::Pending
            && let Some(equipment_id) = &record.equipment_id
        {
            self.project_best_effort(equipment_id).await;
        }

        Ok(SubmissionOutcome {
            record,
            auto_approval,
        })
    }

    async fn write_submission(
        &self,
        conn: &libsql::Connection,
        record: &ChecklistRecord,
        answers: &[Answer],
    ) -> Result<PendingChanges, DatabaseError> {
        let mut changes = PendingChanges::default();

        insert_header(conn, record)
            .await
            .map_err(|e| DatabaseError::integrity("header", e))?;
        changes.push(ChangeTable::Checklists, ChangeKind::Insert, &record.id);

        for (position, answer) in (0_i64..).zip(answers) {
            let answer_id = self
                .db()
                .generate_id(PREFIX_ANSWER)
                .await
                .map_err(|e| DatabaseError::integrity("answers", e))?;
            conn.execute(
                "INSERT INTO answers (id, checklist_id, position, item_id, value, observation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    answer_id.as_str(),
                    record.id.as_str(),
                    position,
                    answer.item_id.as_str(),
                    answer.value.as_str(),
                    answer.observation.as_deref()
                ],
            )
            .await
            .map_err(|e| DatabaseError::integrity("answers", e))?;
            changes.push(ChangeTable::Answers, ChangeKind::Insert, &answer_id);

            for (photo_position, reference) in (0_i64..).zip(&answer.photos) {
                let photo_id = self
                    .db()
                    .generate_id(PREFIX_PHOTO)
                    .await
                    .map_err(|e| DatabaseError::integrity("photos", e))?;
                conn.execute(
                    "INSERT INTO photos (id, checklist_id, answer_id, position, reference)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    libsql::params![
                        photo_id.as_str(),
                        record.id.as_str(),
                        answer_id.as_str(),
                        photo_position,
                        reference.as_str()
                    ],
                )
                .await
                .map_err(|e| DatabaseError::integrity("photos", e))?;
                changes.push(ChangeTable::Photos, ChangeKind::Insert, &photo_id);
            }
        }

        Ok(changes)
    }

    pub(crate) async fn load_record(
        &self,
        id: &str,
    ) -> Result<Option<ChecklistRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM checklists c WHERE c.id = ?1"),
                [id],
            )
            .await?;
        rows.next()
            .await?
            .map(|row| row_to_record(&row))
            .transpose()
    }

    /// Load a record the actor may see. Records of other operators are
    /// reported as not found to roles without full visibility.
    async fn load_visible_record(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<ChecklistRecord, DatabaseError> {
        self.load_record(id)
            .await?
            .filter(|record| {
                self.policy().sees_all_records(actor.role)
                    || record.operator.badge_id == actor.badge_id
            })
            .ok_or_else(|| DatabaseError::not_found("checklist", id))
    }

    /// Get a checklist record by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the record does not exist or is
    /// not visible to the actor.
    pub async fn get_checklist(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<ChecklistRecord, DatabaseError> {
        let _guard = self.lock().await;
        self.load_visible_record(actor, id).await
    }

    /// Get a record with its answers, photos, equipment and review history.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the record does not exist or is
    /// not visible to the actor.
    pub async fn get_checklist_detail(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<ChecklistDetail, DatabaseError> {
        let _guard = self.lock().await;
        let record = self.load_visible_record(actor, id).await?;
        let equipment = match &record.equipment_id {
            Some(equipment_id) => self.load_equipment(equipment_id).await?,
            None => None,
        };
        let answers = self.load_answers(id).await?;
        let approvals = self.load_approvals(id).await?;
        let rejections = self.load_rejections(id).await?;
        Ok(ChecklistDetail {
            record,
            equipment,
            answers,
            approvals,
            rejections,
        })
    }

    async fn load_answers(&self, checklist_id: &str) -> Result<Vec<Answer>, DatabaseError> {
        let conn = self.db().conn();

        let mut photos: HashMap<String, Vec<String>> = HashMap::new();
        let mut rows = conn
            .query(
                "SELECT answer_id, reference FROM photos WHERE checklist_id = ?1
                 ORDER BY answer_id, position",
                [checklist_id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            photos
                .entry(row.get::<String>(0)?)
                .or_default()
                .push(row.get::<String>(1)?);
        }

        let mut rows = conn
            .query(
                "SELECT id, item_id, value, observation FROM answers WHERE checklist_id = ?1
                 ORDER BY position",
                [checklist_id],
            )
            .await?;
        let mut answers = Vec::new();
        while let Some(row) = rows.next().await? {
            let answer_id = row.get::<String>(0)?;
            answers.push(Answer {
                item_id: row.get(1)?,
                value: parse_enum(&row.get::<String>(2)?)?,
                observation: get_opt_string(&row, 3)?,
                photos: photos.remove(&answer_id).unwrap_or_default(),
            });
        }
        Ok(answers)
    }

    /// List record summaries matching `filter`, newest first.
    ///
    /// Roles without full visibility only ever receive their own records,
    /// whatever `filter.operator_badge` says.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_checklists(
        &self,
        actor: &Actor,
        filter: &RecordFilter,
    ) -> Result<Vec<RecordSummary>, DatabaseError> {
        let _guard = self.lock().await;
        self.load_summaries(actor, filter).await
    }

    pub(crate) async fn load_summaries(
        &self,
        actor: &Actor,
        filter: &RecordFilter,
    ) -> Result<Vec<RecordSummary>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        let operator_badge = if self.policy().sees_all_records(actor.role) {
            filter.operator_badge.clone()
        } else {
            Some(actor.badge_id.clone())
        };

        if let Some(badge) = operator_badge {
            params.push(libsql::Value::Text(badge));
            conditions.push(format!("c.operator_badge = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("c.status = ?{}", params.len()));
        }
        if let Some(ref category) = filter.category {
            params.push(libsql::Value::Text(category.clone()));
            conditions.push(format!("c.category = ?{}", params.len()));
        }
        if let Some(ref equipment_id) = filter.equipment_id {
            params.push(libsql::Value::Text(equipment_id.clone()));
            conditions.push(format!("c.equipment_id = ?{}", params.len()));
        }
        if let Some(since) = filter.since {
            params.push(libsql::Value::Text(fmt_ts(since)));
            conditions.push(format!("c.created_at >= ?{}", params.len()));
        }
        if let Some(until) = filter.until {
            params.push(libsql::Value::Text(fmt_ts(until)));
            conditions.push(format!("c.created_at < ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit_clause = filter
            .limit
            .map(|limit| format!("LIMIT {limit}"))
            .unwrap_or_default();

        let sql = format!(
            "SELECT {SELECT_COLS}, e.code, e.model
             FROM checklists c LEFT JOIN equipment e ON e.id = c.equipment_id
             {where_clause}
             ORDER BY c.created_at DESC, c.id {limit_clause}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await? {
            let record = row_to_record(&row)?;
            summaries.push(RecordSummary {
                id: record.id,
                equipment_id: record.equipment_id,
                equipment_code: get_opt_string(&row, 14)?,
                equipment_model: get_opt_string(&row, 15)?,
                operator: record.operator,
                category: record.category,
                category_class: record.category_class,
                created_at: record.created_at,
                status: record.status,
                status_changed_at: record.status_changed_at,
                tally: record.tally,
                latest_approval: None,
                latest_rejection: None,
            });
        }

        let ids: Vec<String> = summaries.iter().map(|s| s.id.clone()).collect();
        let (mut approvals, mut rejections) = self.latest_reviews(&ids).await?;
        for summary in &mut summaries {
            summary.latest_approval = approvals.remove(&summary.id);
            summary.latest_rejection = rejections.remove(&summary.id);
        }
        Ok(summaries)
    }

    /// Administratively erase a record with its answers, photos, approvals
    /// and rejections.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` unless the actor may erase records and
    /// `NotFound` if the record does not exist.
    pub async fn erase_checklist(&self, actor: &Actor, id: &str) -> Result<(), DatabaseError> {
        ensure(self.policy().can_erase(actor.role), actor, "erase checklists")?;

        let _guard = self.lock().await;
        let record = self
            .load_record(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("checklist", id))?;

        let tx = self.db().conn().transaction().await?;
        let work = async {
            let mut changes = PendingChanges::default();
            for table in [
                ChangeTable::Photos,
                ChangeTable::Answers,
                ChangeTable::Approvals,
                ChangeTable::Rejections,
            ] {
                for child in child_ids(&tx, table, id).await? {
                    changes.push(table, ChangeKind::Delete, &child);
                }
                tx.execute(
                    &format!("DELETE FROM {} WHERE checklist_id = ?1", table.as_str()),
                    [id],
                )
                .await?;
            }
            tx.execute("DELETE FROM checklists WHERE id = ?1", [id])
                .await?;
            changes.push(ChangeTable::Checklists, ChangeKind::Delete, id);
            Ok::<_, DatabaseError>(changes)
        }
        .await;
        let changes = Self::finish_tx(tx, work).await?;
        self.publish(changes);
        tracing::info!(checklist = %id, actor = %actor.name, "checklist erased");

        if let Some(equipment_id) = &record.equipment_id {
            self.project_best_effort(equipment_id).await;
        }
        Ok(())
    }
}
