mod support;

use bcstart::error::Error;
use bcstart::repository::Repository;
use bcstart::service::ServiceOptions;
use bcstart::subarea::SubAreaRegistry;
use bcstart::todo::{Impact, NewTodo, TodoStatus};
use support::{session_for, TestEnv, DESCRIPTION};

#[tokio::test]
async fn completed_at_tracks_done_status() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    let todo = service
        .create_todo(&business.id, NewTodo::new("Measure emissions", Impact::Environment))
        .await
        .unwrap();
    assert!(todo.completed_at.is_none());

    for status in [
        TodoStatus::InProgress,
        TodoStatus::Done,
        TodoStatus::Blocked,
        TodoStatus::Done,
        TodoStatus::Todo,
    ] {
        let updated = service.update_todo_status(&todo.id, status).await.unwrap();
        assert_eq!(updated.status, status);
        assert_eq!(updated.completed_at.is_some(), status == TodoStatus::Done);
    }
}

#[tokio::test]
async fn active_and_binned_lists_partition_the_business() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    let mut ids = Vec::new();
    for title in ["First", "Second", "Third", "Fourth"] {
        let todo = service
            .create_todo(&business.id, NewTodo::new(title, Impact::Workers))
            .await
            .unwrap();
        ids.push(todo.id);
    }
    service.delete_task(&ids[1]).await.unwrap();
    service.delete_task(&ids[3]).await.unwrap();

    let active = service.list_todos(&business.id).await.unwrap();
    let binned = service.list_binned_todos(&business.id).await.unwrap();

    let mut active_ids: Vec<String> = active.iter().map(|t| t.id.clone()).collect();
    let binned_ids: Vec<String> = binned.iter().map(|t| t.id.clone()).collect();
    assert!(active_ids.iter().all(|id| !binned_ids.contains(id)));
    assert_eq!(binned_ids, vec![ids[3].clone(), ids[1].clone()]);

    active_ids.extend(binned_ids);
    active_ids.sort();
    let mut all = ids.clone();
    all.sort();
    assert_eq!(active_ids, all);
}

#[tokio::test]
async fn active_todos_are_listed_newest_first() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    for title in ["Older", "Newer"] {
        service
            .create_todo(&business.id, NewTodo::new(title, Impact::Community))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let titles: Vec<String> = service
        .list_todos(&business.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
}

#[tokio::test]
async fn restore_undoes_delete() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    let original = service
        .create_todo(&business.id, NewTodo::new("Supplier code", Impact::Community))
        .await
        .unwrap();

    let deleted = service.delete_task(&original.id).await.unwrap();
    assert!(deleted.deleted_at.is_some());
    assert!(service.list_todos(&business.id).await.unwrap().is_empty());

    let restored = service.restore_task(&original.id).await.unwrap();
    assert_eq!(restored, original);
    assert_eq!(service.list_todos(&business.id).await.unwrap(), vec![original]);
}

#[tokio::test]
async fn impact_summary_counts_active_canonical_todos() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();

    let mut done = NewTodo::new("Mission", Impact::Governance);
    done.status = TodoStatus::Done;
    service.create_todo(&business.id, done).await.unwrap();
    service
        .create_todo(&business.id, NewTodo::new("Articles", Impact::Governance))
        .await
        .unwrap();
    let mut wage = NewTodo::new("Living wage", Impact::Workers);
    wage.status = TodoStatus::Done;
    service.create_todo(&business.id, wage).await.unwrap();
    service
        .create_todo(&business.id, NewTodo::new("Misc", Impact::Other))
        .await
        .unwrap();
    let binned = service
        .create_todo(&business.id, NewTodo::new("Binned", Impact::Workers))
        .await
        .unwrap();
    service.delete_task(&binned.id).await.unwrap();

    let summaries = service.impact_summary(&business.id).await.unwrap();
    let order: Vec<Impact> = summaries.iter().map(|s| s.impact).collect();
    assert_eq!(order, Impact::CANONICAL.to_vec());

    let governance = &summaries[0];
    assert_eq!((governance.total, governance.done, governance.pct), (2, 1, 50));
    let workers = &summaries[1];
    assert_eq!((workers.total, workers.done, workers.pct), (1, 1, 100));
    for entry in &summaries[2..] {
        assert_eq!((entry.total, entry.done, entry.pct), (0, 0, 0));
    }
}

#[tokio::test]
async fn impact_and_lock_change_together() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    let todo = service
        .create_todo(&business.id, NewTodo::new("Recycling", Impact::Other))
        .await
        .unwrap();

    let updated = service
        .update_task_impact_area(&todo.id, Impact::Environment, Some(true))
        .await
        .unwrap();
    assert_eq!(updated.impact, Impact::Environment);
    assert!(updated.is_impact_locked);

    let unlocked = service.update_task_lock_state(&todo.id, false).await.unwrap();
    assert!(!unlocked.is_impact_locked);
    assert_eq!(unlocked.impact, Impact::Environment);
}

#[tokio::test]
async fn impact_change_clears_a_sub_area_from_another_area() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    let registry = SubAreaRegistry::new(env.repository(), session_for("founder"));
    let workers = registry
        .load_sub_areas_by_impact(&business.id, Impact::Workers)
        .await
        .unwrap();
    let sub_area = workers.first().expect("seeded on create").clone();

    let todo = service
        .create_todo(&business.id, NewTodo::new("Pay review", Impact::Workers))
        .await
        .unwrap();
    let assigned = service
        .assign_task_to_sub_area(&todo.id, Some(&sub_area.id))
        .await
        .unwrap();
    assert_eq!(assigned.sub_area_id.as_deref(), Some(sub_area.id.as_str()));

    let same_area = service
        .update_task_impact_area(&todo.id, Impact::Workers, None)
        .await
        .unwrap();
    assert_eq!(same_area.sub_area_id.as_deref(), Some(sub_area.id.as_str()));

    let moved = service
        .update_task_impact_area(&todo.id, Impact::Community, None)
        .await
        .unwrap();
    assert_eq!(moved.sub_area_id, None);
}

#[tokio::test]
async fn impact_change_keeps_sub_area_when_clearing_is_off() {
    let env = TestEnv::with_options(ServiceOptions {
        clear_sub_area_on_impact_change: false,
        ..ServiceOptions::default()
    });
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    let registry = SubAreaRegistry::new(env.repository(), session_for("founder"));
    let sub_area = registry
        .create_sub_area(&business.id, Impact::Workers, "Apprentices", None)
        .await
        .unwrap();
    let todo = service
        .create_todo(&business.id, NewTodo::new("Mentoring", Impact::Workers))
        .await
        .unwrap();
    service
        .assign_task_to_sub_area(&todo.id, Some(&sub_area.id))
        .await
        .unwrap();

    let moved = service
        .update_task_impact_area(&todo.id, Impact::Customers, None)
        .await
        .unwrap();
    assert_eq!(moved.sub_area_id.as_deref(), Some(sub_area.id.as_str()));
}

#[tokio::test]
async fn evidence_replaces_the_whole_list() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    let todo = service
        .create_todo(&business.id, NewTodo::new("Policy", Impact::Customers))
        .await
        .unwrap();

    service
        .link_evidence(&todo.id, vec!["c1".to_string(), "c2".to_string()])
        .await
        .unwrap();
    let linked = service
        .link_evidence(&todo.id, vec!["c3".to_string()])
        .await
        .unwrap();
    assert_eq!(linked.evidence_chunk_ids, vec!["c3".to_string()]);
}

#[tokio::test]
async fn other_tenants_see_not_found() {
    let env = TestEnv::new();
    let owner = env.service_for("owner");
    let intruder = env.service_for("intruder");
    let business = owner.create_business("Roastery", DESCRIPTION).await.unwrap();
    let todo = owner
        .create_todo(&business.id, NewTodo::new("Private", Impact::Governance))
        .await
        .unwrap();

    let err = intruder.list_todos(&business.id).await.unwrap_err();
    assert!(matches!(err, Error::BusinessNotFound(_)));
    let err = intruder
        .update_todo_status(&todo.id, TodoStatus::Done)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TodoNotFound(_)));
    assert!(err.is_not_found());

    let untouched = owner.todo(&todo.id).await.unwrap();
    assert_eq!(untouched.status, TodoStatus::Todo);
}

#[tokio::test]
async fn operations_require_a_session() {
    let env = TestEnv::new();
    let err = env.anonymous_service().list_businesses().await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationRequired));
    assert_eq!(err.kind(), "authentication_required");
}

#[tokio::test]
async fn legacy_done_rows_report_a_completion_time() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();

    let created_at = chrono::Utc::now() - chrono::Duration::days(30);
    let mut row = NewTodo::new("Publish a supplier code", Impact::Community).into_row(
        "legacy-1".to_string(),
        &business.id,
        "founder",
        created_at,
    );
    row.status = "completed".to_string();
    row.completed_at = None;
    env.repo.insert_todos(vec![row]).await.unwrap();

    let todos = service.list_todos(&business.id).await.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].status, TodoStatus::Done);
    assert_eq!(todos[0].completed_at, Some(created_at));

    let again = service.todo("legacy-1").await.unwrap();
    assert_eq!(again.completed_at, todos[0].completed_at);
}

#[tokio::test]
async fn resets_require_a_session_before_policy_checks() {
    let env = TestEnv::new();
    let anonymous = env.anonymous_service();

    let err = anonymous.reset_test_data("b").await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationRequired));

    let err = anonymous.reset_all_test_data(false).await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationRequired));
}

#[tokio::test]
async fn strict_transitions_reject_skipping_ahead() {
    let env = TestEnv::with_options(ServiceOptions {
        strict_transitions: true,
        ..ServiceOptions::default()
    });
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    let todo = service
        .create_todo(&business.id, NewTodo::new("Survey", Impact::Workers))
        .await
        .unwrap();

    let err = service
        .update_todo_status(&todo.id, TodoStatus::Done)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));

    service
        .update_todo_status(&todo.id, TodoStatus::InProgress)
        .await
        .unwrap();
    let done = service
        .update_todo_status(&todo.id, TodoStatus::Done)
        .await
        .unwrap();
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn create_todo_rejects_a_sub_area_of_another_business() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let first = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    let second = service.create_business("Bakery", "We bake bread.").await.unwrap();
    let registry = SubAreaRegistry::new(env.repository(), session_for("founder"));
    let foreign = registry
        .load_sub_areas_by_impact(&second.id, Impact::Workers)
        .await
        .unwrap()
        .remove(0);

    let mut new = NewTodo::new("Misfiled", Impact::Workers);
    new.sub_area_id = Some(foreign.id);
    let err = service.create_todo(&first.id, new).await.unwrap_err();
    assert!(matches!(err, Error::SubAreaNotFound(_)));
}

#[tokio::test]
async fn generation_skips_titles_already_on_the_roadmap() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();

    let first = service.generate_todos(&business.id).await.unwrap();
    assert!(!first.is_empty());
    assert!(first.iter().all(|t| t.kb_action_id.is_some()));

    let second = service.generate_todos(&business.id).await.unwrap();
    assert!(second.is_empty());
    assert_eq!(service.list_todos(&business.id).await.unwrap().len(), first.len());
}

#[tokio::test]
async fn generation_respects_the_task_limit() {
    let env = TestEnv::with_options(ServiceOptions {
        max_generated_tasks: 3,
        ..ServiceOptions::default()
    });
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();

    let generated = service.generate_todos(&business.id).await.unwrap();
    assert_eq!(generated.len(), 3);
}

#[tokio::test]
async fn reset_is_disabled_by_default() {
    let env = TestEnv::new();
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();

    let err = service.reset_test_data(&business.id).await.unwrap_err();
    assert!(matches!(err, Error::ResetDisabled));
}

#[tokio::test]
async fn reset_regenerates_a_baseline_roadmap() {
    let env = TestEnv::with_options(ServiceOptions {
        allow_reset: true,
        ..ServiceOptions::default()
    });
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", "").await.unwrap();
    let manual = service
        .create_todo(&business.id, NewTodo::new("Manual", Impact::Other))
        .await
        .unwrap();

    let outcome = service.reset_test_data(&business.id).await.unwrap();
    assert!(!outcome.todos.is_empty());
    assert!(outcome
        .todos
        .iter()
        .all(|t| t.business_id == business.id && TodoStatus::ALL.contains(&t.status)));
    assert_eq!(outcome.impact_summaries.len(), 5);

    let err = service.todo(&manual.id).await.unwrap_err();
    assert!(matches!(err, Error::TodoNotFound(_)));
}

#[tokio::test]
async fn reset_all_needs_confirmation_and_spares_other_users() {
    let env = TestEnv::with_options(ServiceOptions {
        allow_reset: true,
        ..ServiceOptions::default()
    });
    let mine = env.service_for("founder");
    let theirs = env.service_for("neighbour");
    for service in [&mine, &theirs] {
        let business = service.create_business("Shop", DESCRIPTION).await.unwrap();
        service
            .create_todo(&business.id, NewTodo::new("Keep", Impact::Customers))
            .await
            .unwrap();
    }

    let err = mine.reset_all_test_data(false).await.unwrap_err();
    assert!(matches!(err, Error::ConfirmationRequired(_)));

    assert_eq!(mine.reset_all_test_data(true).await.unwrap(), 1);
    let neighbour_business = theirs.list_businesses().await.unwrap().remove(0);
    assert_eq!(theirs.list_todos(&neighbour_business.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn seeding_defaults_twice_adds_nothing_the_second_time() {
    let env = TestEnv::with_options(ServiceOptions {
        seed_sub_areas_on_create: false,
        ..ServiceOptions::default()
    });
    let service = env.service_for("founder");
    let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
    assert!(env.repo.list_sub_areas(&business.id).await.unwrap().is_empty());

    let registry = SubAreaRegistry::new(env.repository(), session_for("founder"));
    let first = registry.ensure_defaults(&business.id).await.unwrap();
    assert_eq!(first.len(), Impact::CANONICAL.len());
    let seeded = env.repo.list_sub_areas(&business.id).await.unwrap();
    assert!(!seeded.is_empty());

    let second = registry.ensure_defaults(&business.id).await.unwrap();
    assert!(second.is_empty());
    let after = env.repo.list_sub_areas(&business.id).await.unwrap();
    assert_eq!(after.len(), seeded.len());
}
