//! Persistence round-trips for the flat-file store.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use patrol_stores::{
    EquipmentStore, FactoryStore, JsonStore, TaskStore, UserStore,
};
use patrol_core::types::{NewTask, Priority, Role, TaskStatus, User};

fn user(user_id: &str, name: &str, role: Role, priorities: &[(&str, u8)]) -> User {
    User {
        user_id: user_id.to_string(),
        name: name.to_string(),
        factory_priority: priorities
            .iter()
            .map(|(factory, rank)| (factory.to_string(), Priority::new(*rank).expect("rank")))
            .collect::<BTreeMap<_, _>>(),
        role,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 3).expect("valid date")
}

#[tokio::test]
async fn reload_preserves_ordered_collections() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let store = JsonStore::open(dir.path()).unwrap();
        store
            .seed_factories(&["北區廠".to_string(), "中區廠".to_string()])
            .await
            .unwrap();
        store.add_factory("南區廠").await.unwrap();

        store
            .add_user(user("U2", "陳大文", Role::Admin, &[]))
            .await
            .unwrap();
        store
            .add_user(user("U1", "王小明", Role::Technician, &[("北區廠", 1)]))
            .await
            .unwrap();

        store.add_equipment("北區廠", "逆變器A", "inverter").await.unwrap();
        store.add_equipment("南區廠", "變壓器B", "").await.unwrap();

        store
            .create_task(NewTask {
                factory: "北區廠".to_string(),
                machine: "逆變器A".to_string(),
                assigned_user_id: "U1".to_string(),
                task_type: "例行巡檢".to_string(),
                date: date(),
            })
            .await
            .unwrap();
    }

    let store = JsonStore::open(dir.path()).unwrap();

    assert_eq!(
        store.list_factories().await.unwrap(),
        vec!["北區廠", "中區廠", "南區廠"]
    );

    let users = store.all_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].user_id, "U2");
    assert_eq!(users[1].user_id, "U1");
    assert_eq!(users[1].role, Role::Technician);
    assert_eq!(users[1].priority_for("北區廠"), Priority::new(1));

    let equipments = store.list_equipments(None).await.unwrap();
    assert_eq!(equipments.len(), 2);
    assert_eq!(equipments[0].id, 1);
    assert_eq!(equipments[0].kind, "inverter");
    assert_eq!(equipments[1].id, 2);

    let tasks = store.list_by_date(date()).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, 1);
    assert_eq!(tasks[0].status, TaskStatus::Pending);
}

#[tokio::test]
async fn equipment_ids_survive_delete_and_reload() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let store = JsonStore::open(dir.path()).unwrap();
        let a = store.add_equipment("北區廠", "A", "").await.unwrap();
        let b = store.add_equipment("北區廠", "B", "").await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        // Deleting the older record must not free id 1.
        assert!(store.remove_equipment(a.id).await.unwrap());
    }

    let store = JsonStore::open(dir.path()).unwrap();
    let c = store.add_equipment("北區廠", "C", "").await.unwrap();
    assert_eq!(c.id, 3);
}

#[tokio::test]
async fn duplicate_user_and_factory_are_rejected_after_reload() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let store = JsonStore::open(dir.path()).unwrap();
        store.add_factory("北區廠").await.unwrap();
        store
            .add_user(user("U1", "王小明", Role::Technician, &[]))
            .await
            .unwrap();
    }

    let store = JsonStore::open(dir.path()).unwrap();
    assert!(!store.add_factory("北區廠").await.unwrap());
    assert_eq!(store.list_factories().await.unwrap().len(), 1);
    assert!(!store
        .add_user(user("U1", "別人", Role::Admin, &[]))
        .await
        .unwrap());
}

#[tokio::test]
async fn merge_priorities_extends_without_shrinking() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonStore::open(dir.path()).unwrap();

    store
        .add_user(user("U1", "王小明", Role::Technician, &[("北區廠", 1)]))
        .await
        .unwrap();

    let merged = store
        .merge_priorities(
            "U1",
            &[
                ("南區廠".to_string(), Priority::new(2).unwrap()),
                ("北區廠".to_string(), Priority::new(3).unwrap()),
            ],
        )
        .await
        .unwrap();
    assert!(merged);

    let user = store.get_user("U1").await.unwrap().unwrap();
    assert_eq!(user.factory_priority.len(), 2);
    assert_eq!(user.priority_for("北區廠"), Priority::new(3));
    assert_eq!(user.priority_for("南區廠"), Priority::new(2));

    assert!(!store.merge_priorities("ghost", &[]).await.unwrap());
}

#[tokio::test]
async fn update_status_persists_across_reload() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let store = JsonStore::open(dir.path()).unwrap();
        let task = store
            .create_task(NewTask {
                factory: "北區廠".to_string(),
                machine: "逆變器A".to_string(),
                assigned_user_id: "U1".to_string(),
                task_type: "例行巡檢".to_string(),
                date: date(),
            })
            .await
            .unwrap();
        assert!(store.update_status(task.id, TaskStatus::Done).await.unwrap());
        assert!(!store.update_status(999, TaskStatus::Done).await.unwrap());
    }

    let store = JsonStore::open(dir.path()).unwrap();
    let task = store.get_task(1).await.unwrap().unwrap();
    assert!(task.is_done());
    assert!(store.exists_for("北區廠", date()).await.unwrap());
    assert!(!store.exists_for("南區廠", date()).await.unwrap());
}
