use neta_core::db::{CatalogDb, NewTask, TaskFilter, TaskStatus};
use neta_core::services::analysis::AnalysisKind;
use serde_json::json;

fn create(db: &CatalogDb, kind: AnalysisKind, dataset_id: i64) -> i64 {
    db.create_task(&NewTask {
        task_type: kind,
        dataset_id,
        parameters: json!({"dataset_id": dataset_id, "alpha": 0.05}),
    })
    .expect("create task")
}

#[test]
fn new_task_starts_pending_without_results() {
    let db = CatalogDb::open_in_memory().unwrap();
    let id = create(&db, AnalysisKind::DifferentialExpression, 5);

    let task = db.get_task(id).unwrap().expect("task exists");
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.task_type, AnalysisKind::DifferentialExpression);
    assert_eq!(task.dataset_id, 5);
    assert!(task.results.is_none());
    assert!(task.completed_at.is_none());
    assert_eq!(task.parameters_json().unwrap(), json!({"dataset_id": 5, "alpha": 0.05}));
}

#[test]
fn completed_task_has_results_and_ordered_timestamps() {
    let db = CatalogDb::open_in_memory().unwrap();
    let id = create(&db, AnalysisKind::Pca, 1);
    db.mark_task_running(id).unwrap();
    assert_eq!(db.get_task(id).unwrap().unwrap().status, TaskStatus::Running);

    let results = json!({"components": [[0.1, 0.2], [0.3, 0.4]], "variance": [0.7, 0.2]});
    db.complete_task(id, &results).unwrap();

    let task = db.get_task(id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.status.is_terminal());
    assert_eq!(task.results_json().unwrap(), Some(results));
    let completed_at = task.completed_at.expect("completed_at set");
    assert!(completed_at >= task.created_at);
}

#[test]
fn failed_task_records_error_object() {
    let db = CatalogDb::open_in_memory().unwrap();
    let id = create(&db, AnalysisKind::Survival, 2);
    db.mark_task_running(id).unwrap();
    db.fail_task(id, "R script failed: object 'x' not found").unwrap();

    let task = db.get_task(id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(
        task.results_json().unwrap(),
        Some(json!({"error": "R script failed: object 'x' not found"}))
    );
    assert!(task.completed_at.unwrap() >= task.created_at);
}

#[test]
fn list_tasks_filters_and_orders_newest_first() {
    let db = CatalogDb::open_in_memory().unwrap();
    let a = create(&db, AnalysisKind::Pca, 1);
    let b = create(&db, AnalysisKind::Enrichment, 1);
    let c = create(&db, AnalysisKind::Pca, 2);
    db.mark_task_running(a).unwrap();
    db.complete_task(a, &json!({})).unwrap();

    let all = db.list_tasks(&TaskFilter::default()).unwrap();
    assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![c, b, a]);

    let pca = db
        .list_tasks(&TaskFilter { task_type: Some(AnalysisKind::Pca), ..Default::default() })
        .unwrap();
    assert_eq!(pca.iter().map(|t| t.id).collect::<Vec<_>>(), vec![c, a]);

    let completed = db
        .list_tasks(&TaskFilter { status: Some(TaskStatus::Completed), ..Default::default() })
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, a);

    let limited = db
        .list_tasks(&TaskFilter { dataset_id: Some(1), limit: Some(1), ..Default::default() })
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, b);

    assert_eq!(db.count_tasks().unwrap(), 3);
}

#[test]
fn task_status_parses_case_insensitively() {
    assert_eq!("Running".parse::<TaskStatus>().unwrap(), TaskStatus::Running);
    assert!("queued".parse::<TaskStatus>().is_err());
    assert!(!TaskStatus::Pending.is_terminal());
}

#[test]
fn only_completed_and_failed_are_terminal() {
    let terminal: Vec<TaskStatus> =
        TaskStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
    assert_eq!(terminal, vec![TaskStatus::Completed, TaskStatus::Failed]);

    let db = CatalogDb::open_in_memory().unwrap();
    let id = create(&db, AnalysisKind::Pca, 4);
    // Pending tasks may be closed directly; closed tasks stay closed.
    db.fail_task(id, "script missing").unwrap();
    assert!(db.complete_task(id, &json!({})).is_err());
    assert_eq!(db.get_task(id).unwrap().unwrap().status, TaskStatus::Failed);
}
