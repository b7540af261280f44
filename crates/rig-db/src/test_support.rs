//! Shared test utilities for rig-db unit tests.

pub(crate) mod helpers {
    use rig_core::catalog::Catalog;
    use rig_core::entities::{Answer, Equipment, NewChecklist, NewEquipment};
    use rig_core::enums::Role;
    use rig_core::identity::Actor;

    use crate::service::RigService;
    use crate::{DEFAULT_CHANGE_BUFFER, RigDb};

    /// Create an in-memory RigService with the built-in catalog.
    pub async fn test_service() -> RigService {
        let db = RigDb::open_local(":memory:", DEFAULT_CHANGE_BUFFER)
            .await
            .unwrap();
        RigService::from_db(db, Catalog::builtin().unwrap())
    }

    pub fn operator() -> Actor {
        Actor::new("Ana Souza", "B-1042", Role::Operator)
    }

    pub fn other_operator() -> Actor {
        Actor::new("Caio Lima", "B-2077", Role::Operator)
    }

    pub fn supervisor() -> Actor {
        Actor::new("Bruno Reis", "S-0007", Role::Supervisor)
    }

    pub fn maintenance() -> Actor {
        Actor::new("Davi Costa", "M-0311", Role::Maintenance)
    }

    pub fn admin() -> Actor {
        Actor::new("Elisa Prado", "A-0001", Role::Admin)
    }

    pub fn new_forklift(code: &str) -> NewEquipment {
        NewEquipment {
            code: code.to_string(),
            model: "Hyster H50".into(),
            category: "forklift".into(),
            location: Some("Warehouse 2".into()),
        }
    }

    pub async fn register_forklift(svc: &RigService, code: &str) -> Equipment {
        svc.register_equipment(&admin(), new_forklift(code))
            .await
            .unwrap()
    }

    /// Answer every item of `category`, failing the ids in `fails`.
    fn answers_for(category: &str, fails: &[&str]) -> Vec<Answer> {
        let catalog = Catalog::builtin().unwrap();
        catalog
            .category(category)
            .unwrap()
            .items
            .iter()
            .map(|item| {
                if fails.contains(&item.id.as_str()) {
                    Answer::fail(item.id.as_str(), "defect observed")
                } else {
                    Answer::pass(item.id.as_str())
                }
            })
            .collect()
    }

    /// A 17-item forklift submission by `operator()`.
    pub fn forklift_submission(equipment_id: &str, fails: &[&str]) -> NewChecklist {
        NewChecklist {
            category: "forklift".into(),
            equipment_id: Some(equipment_id.to_string()),
            operator: operator().operator_ref(),
            signature: Some("sig://B-1042".into()),
            answers: answers_for("forklift", fails),
        }
    }

    pub fn sling_submission_for(actor: &Actor, fails: &[&str]) -> NewChecklist {
        NewChecklist {
            category: "sling".into(),
            equipment_id: None,
            operator: actor.operator_ref(),
            signature: Some(format!("sig://{}", actor.badge_id)),
            answers: answers_for("sling", fails),
        }
    }

    /// An 8-item sling submission by `operator()`.
    pub fn sling_submission(fails: &[&str]) -> NewChecklist {
        sling_submission_for(&operator(), fails)
    }

    pub async fn count_rows(svc: &RigService, table: &str) -> i64 {
        let mut rows = svc
            .db()
            .conn()
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await
            .unwrap();
        rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
    }
}
