//! Equipment registry and status projection writes.
//!
//! Equipment status is written from two sides: reviewers may set it directly
//! (a manual write), and every decided checklist re-projects it. The latest
//! manual write is kept in its own columns so each projection can tell
//! whether a newer disposition has superseded it.

use chrono::Utc;
use rig_core::entities::{Equipment, NewEquipment};
use rig_core::enums::{ChangeKind, ChangeTable, ChecklistStatus, EquipmentStatus, StatusSource};
use rig_core::identity::{Actor, ensure};
use rig_core::ids::PREFIX_EQUIPMENT;
use rig_core::projection::{
    self, LatestDisposition, ManualStatus, OperatingSession, manual_prevails,
};

use crate::changes::PendingChanges;
use crate::error::DatabaseError;
use crate::helpers::{fmt_ts, get_opt_string, parse_datetime, parse_enum, parse_optional_datetime};
use crate::service::RigService;

const SELECT_COLS: &str = "id, code, model, category, location, status, status_source, \
     status_note, status_changed_at, created_at";

fn row_to_equipment(row: &libsql::Row) -> Result<Equipment, DatabaseError> {
    Ok(Equipment {
        id: row.get(0)?,
        code: row.get(1)?,
        model: row.get(2)?,
        category: row.get(3)?,
        location: get_opt_string(row, 4)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        status_source: parse_enum(&row.get::<String>(6)?)?,
        status_note: get_opt_string(row, 7)?,
        status_changed_at: parse_datetime(&row.get::<String>(8)?)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl RigService {
    /// Register a new piece of equipment. It starts `available`.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` if the actor may not manage equipment status.
    /// - `Validation` for a blank code or model, a category that is unknown
    ///   or not equipment-bound, or a code that is already registered.
    pub async fn register_equipment(
        &self,
        actor: &Actor,
        new: NewEquipment,
    ) -> Result<Equipment, DatabaseError> {
        ensure(
            self.policy().can_override_equipment_status(actor.role),
            actor,
            "register equipment",
        )?;

        let code = new.code.trim().to_string();
        if code.is_empty() || new.model.trim().is_empty() {
            return Err(DatabaseError::Validation(
                "equipment code and model are required".into(),
            ));
        }
        let category = self
            .catalog()
            .category(&new.category)
            .ok_or_else(|| {
                DatabaseError::Validation(format!("unknown checklist category '{}'", new.category))
            })?;
        if !category.class.is_equipment_bound() {
            return Err(DatabaseError::Validation(format!(
                "category '{}' is an accessory category and is not tracked as equipment",
                category.id
            )));
        }

        let _guard = self.lock().await;
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id FROM equipment WHERE code = ?1", [code.as_str()])
            .await?;
        if rows.next().await?.is_some() {
            return Err(DatabaseError::Validation(format!(
                "equipment code '{code}' is already registered"
            )));
        }

        let now = Utc::now();
        let equipment = Equipment {
            id: self.db().generate_id(PREFIX_EQUIPMENT).await?,
            code,
            model: new.model.trim().to_string(),
            category: new.category,
            location: new.location.filter(|l| !l.trim().is_empty()),
            status: EquipmentStatus::Available,
            status_source: StatusSource::Registered,
            status_note: None,
            status_changed_at: now,
            created_at: now,
        };

        self.db()
            .conn()
            .execute(
                "INSERT INTO equipment (id, code, model, category, location, status, status_source,
                     status_changed_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    equipment.id.as_str(),
                    equipment.code.as_str(),
                    equipment.model.as_str(),
                    equipment.category.as_str(),
                    equipment.location.as_deref(),
                    equipment.status.as_str(),
                    equipment.status_source.as_str(),
                    fmt_ts(equipment.status_changed_at),
                    fmt_ts(equipment.created_at)
                ],
            )
            .await?;

        let mut changes = PendingChanges::default();
        changes.push(ChangeTable::Equipment, ChangeKind::Insert, &equipment.id);
        self.publish(changes);
        tracing::info!(equipment = %equipment.id, code = %equipment.code, "equipment registered");
        Ok(equipment)
    }

    pub(crate) async fn load_equipment(&self, id: &str) -> Result<Option<Equipment>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM equipment WHERE id = ?1"),
                [id],
            )
            .await?;
        rows.next()
            .await?
            .map(|row| row_to_equipment(&row))
            .transpose()
    }

    /// Get equipment by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no equipment has this id.
    pub async fn get_equipment(&self, id: &str) -> Result<Equipment, DatabaseError> {
        let _guard = self.lock().await;
        self.load_equipment(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("equipment", id))
    }

    /// List all registered equipment ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_equipment(&self) -> Result<Vec<Equipment>, DatabaseError> {
        let _guard = self.lock().await;
        self.load_all_equipment().await
    }

    pub(crate) async fn load_all_equipment(&self) -> Result<Vec<Equipment>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM equipment ORDER BY code"),
                (),
            )
            .await?;
        let mut equipment = Vec::new();
        while let Some(row) = rows.next().await? {
            equipment.push(row_to_equipment(&row)?);
        }
        Ok(equipment)
    }

    /// Write an equipment status directly, with an optional observation.
    ///
    /// The write takes precedence over projected status until a checklist
    /// decided after it arrives.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the actor may not override equipment
    /// status and `NotFound` if the equipment does not exist.
    pub async fn set_equipment_status(
        &self,
        actor: &Actor,
        id: &str,
        status: EquipmentStatus,
        note: Option<String>,
    ) -> Result<Equipment, DatabaseError> {
        ensure(
            self.policy().can_override_equipment_status(actor.role),
            actor,
            "override equipment status",
        )?;

        let _guard = self.lock().await;
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let now = fmt_ts(Utc::now());
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE equipment SET status = ?1, status_source = 'manual', status_note = ?2,
                     status_changed_at = ?3, manual_status = ?1, manual_status_at = ?3
                 WHERE id = ?4",
                libsql::params![status.as_str(), note.as_deref(), now, id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("equipment", id));
        }

        let mut changes = PendingChanges::default();
        changes.push(ChangeTable::Equipment, ChangeKind::Update, id);
        self.publish(changes);
        tracing::info!(equipment = %id, %status, actor = %actor.name, "manual equipment status written");

        self.load_equipment(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("equipment", id))
    }

    /// Recompute and persist the projected status of one piece of equipment.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the equipment does not exist.
    pub async fn refresh_projection(
        &self,
        id: &str,
        session: OperatingSession,
    ) -> Result<Equipment, DatabaseError> {
        let _guard = self.lock().await;
        self.project_equipment(id, session).await?;
        self.load_equipment(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("equipment", id))
    }

    /// Project with the default operating session, logging failures.
    pub(crate) async fn project_best_effort(&self, id: &str) {
        if let Err(error) = self.project_equipment(id, OperatingSession::default()).await {
            tracing::warn!(equipment = %id, %error, "equipment projection not written");
        }
    }

    async fn project_equipment(
        &self,
        id: &str,
        session: OperatingSession,
    ) -> Result<EquipmentStatus, DatabaseError> {
        let conn = self.db().conn();

        let mut rows = conn
            .query(
                "SELECT status, status_source, manual_status, manual_status_at
                 FROM equipment WHERE id = ?1",
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("equipment", id))?;
        let current: EquipmentStatus = parse_enum(&row.get::<String>(0)?)?;
        let current_source: StatusSource = parse_enum(&row.get::<String>(1)?)?;
        let manual_status = get_opt_string(&row, 2)?;
        let manual_at = parse_optional_datetime(get_opt_string(&row, 3)?.as_deref())?;
        let manual = match (manual_status, manual_at) {
            (Some(status), Some(written_at)) => Some(ManualStatus {
                status: parse_enum(&status)?,
                written_at,
            }),
            _ => None,
        };

        let mut rows = conn
            .query(
                "SELECT status, status_changed_at FROM checklists
                 WHERE equipment_id = ?1 AND status != ?2
                 ORDER BY status_changed_at DESC, created_at DESC LIMIT 1",
                libsql::params![id, ChecklistStatus::Pending.as_str()],
            )
            .await?;
        let latest = match rows.next().await? {
            Some(row) => Some(LatestDisposition {
                status: parse_enum(&row.get::<String>(0)?)?,
                decided_at: parse_datetime(&row.get::<String>(1)?)?,
            }),
            None => None,
        };

        let status = projection::project(manual, latest, session);
        let source = match manual {
            Some(manual) if manual_prevails(manual, latest) => StatusSource::Manual,
            _ if latest.is_some() => StatusSource::Projected,
            _ => current_source,
        };
        if status == current && source == current_source {
            tracing::debug!(equipment = %id, %status, "projection unchanged");
            return Ok(status);
        }

        conn.execute(
            "UPDATE equipment SET status = ?1, status_source = ?2, status_changed_at = ?3,
                 status_note = CASE WHEN ?2 = 'manual' THEN status_note ELSE NULL END
             WHERE id = ?4",
            libsql::params![status.as_str(), source.as_str(), fmt_ts(Utc::now()), id],
        )
        .await?;

        let mut changes = PendingChanges::default();
        changes.push(ChangeTable::Equipment, ChangeKind::Update, id);
        self.publish(changes);
        tracing::info!(equipment = %id, from = %current, to = %status, %source, "equipment status projected");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::helpers::*;

    #[tokio::test]
    async fn register_and_get() {
        let svc = test_service().await;
        let forklift = register_forklift(&svc, "EMP-20").await;

        let fetched = svc.get_equipment(&forklift.id).await.unwrap();
        assert_eq!(fetched, forklift);
        assert_eq!(fetched.status, EquipmentStatus::Available);
        assert_eq!(fetched.status_source, StatusSource::Registered);
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected() {
        let svc = test_service().await;
        register_forklift(&svc, "EMP-21").await;

        let err = svc
            .register_equipment(&admin(), new_forklift("EMP-21"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(msg) if msg.contains("EMP-21")));
    }

    #[tokio::test]
    async fn accessory_category_cannot_be_registered() {
        let svc = test_service().await;
        let err = svc
            .register_equipment(
                &admin(),
                NewEquipment {
                    category: "sling".into(),
                    ..new_forklift("SL-1")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn list_orders_by_code() {
        let svc = test_service().await;
        register_forklift(&svc, "EMP-32").await;
        register_forklift(&svc, "EMP-31").await;

        let codes: Vec<String> = svc
            .list_equipment()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.code)
            .collect();
        assert_eq!(codes, vec!["EMP-31", "EMP-32"]);
    }

    #[tokio::test]
    async fn manual_override_requires_permission() {
        let svc = test_service().await;
        let forklift = register_forklift(&svc, "EMP-22").await;

        let err = svc
            .set_equipment_status(&operator(), &forklift.id, EquipmentStatus::UnderMaintenance, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::PermissionDenied(_)));

        let updated = svc
            .set_equipment_status(
                &maintenance(),
                &forklift.id,
                EquipmentStatus::UnderMaintenance,
                Some("brake pads replaced, awaiting test".into()),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, EquipmentStatus::UnderMaintenance);
        assert_eq!(updated.status_source, StatusSource::Manual);
        assert_eq!(
            updated.status_note.as_deref(),
            Some("brake pads replaced, awaiting test")
        );
    }

    #[tokio::test]
    async fn manual_override_holds_until_newer_disposition() {
        let svc = test_service().await;
        let forklift = register_forklift(&svc, "EMP-23").await;

        svc.submit_checklist(&operator(), forklift_submission(&forklift.id, &[]))
            .await
            .unwrap();
        svc.set_equipment_status(&supervisor(), &forklift.id, EquipmentStatus::UnderMaintenance, None)
            .await
            .unwrap();

        let refreshed = svc
            .refresh_projection(&forklift.id, OperatingSession::Started)
            .await
            .unwrap();
        assert_eq!(refreshed.status, EquipmentStatus::UnderMaintenance);
        assert_eq!(refreshed.status_source, StatusSource::Manual);

        svc.submit_checklist(&operator(), forklift_submission(&forklift.id, &[]))
            .await
            .unwrap();
        let after = svc.get_equipment(&forklift.id).await.unwrap();
        assert_eq!(after.status, EquipmentStatus::InOperation);
        assert_eq!(after.status_source, StatusSource::Projected);
        assert_eq!(after.status_note, None);
    }

    #[tokio::test]
    async fn approved_without_session_is_available() {
        let svc = test_service().await;
        let forklift = register_forklift(&svc, "EMP-24").await;
        svc.submit_checklist(&operator(), forklift_submission(&forklift.id, &[]))
            .await
            .unwrap();

        let refreshed = svc
            .refresh_projection(&forklift.id, OperatingSession::NotStarted)
            .await
            .unwrap();
        assert_eq!(refreshed.status, EquipmentStatus::Available);
    }

    #[tokio::test]
    async fn unknown_equipment_projection() {
        let svc = test_service().await;
        let err = svc
            .refresh_projection("eqp-00000000", OperatingSession::Started)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
