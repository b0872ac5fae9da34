mod support;

use std::sync::Arc;

use bcstart::error::Error;
use bcstart::files::{FileRecord, FileService, LocalFileService};
use bcstart::mapping::MappingService;
use bcstart::storage::Storage;
use bcstart::todo::{Impact, NewTodo};
use support::{session_for, TestEnv, DESCRIPTION};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    env: TestEnv,
    files: Arc<LocalFileService>,
    business_id: String,
    tasks: Vec<String>,
}

impl Fixture {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(LocalFileService::new(
            Arc::new(Storage::new(dir.path().to_path_buf())),
            1024,
        ));
        let env = TestEnv::new();
        let service = env.service_for("founder");
        let business = service.create_business("Roastery", DESCRIPTION).await.unwrap();
        let mut tasks = Vec::new();
        for title in ["Supplier code", "Privacy policy"] {
            let todo = service
                .create_todo(&business.id, NewTodo::new(title, Impact::Community))
                .await
                .unwrap();
            tasks.push(todo.id);
        }
        Self {
            _dir: dir,
            env,
            files,
            business_id: business.id,
            tasks,
        }
    }

    fn mapping(&self, single_task_per_file: bool) -> MappingService {
        MappingService::new(
            self.env.repository(),
            self.files.clone(),
            session_for("founder"),
            single_task_per_file,
        )
    }

    async fn upload(&self, name: &str) -> FileRecord {
        self.files
            .upload("founder", &self.business_id, name, b"evidence".to_vec())
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn mapping_is_idempotent_and_listed_per_task() {
    let fixture = Fixture::new().await;
    let mapping = fixture.mapping(true);
    let file = fixture.upload("code.pdf").await;

    let first = mapping.map_file(&fixture.tasks[0], &file.id).await.unwrap();
    let again = mapping.map_file(&fixture.tasks[0], &file.id).await.unwrap();
    assert_eq!(first, again);

    let files = mapping.files_for_task(&fixture.tasks[0]).await.unwrap();
    assert_eq!(files, vec![file]);
    assert!(mapping.files_for_task(&fixture.tasks[1]).await.unwrap().is_empty());
}

#[tokio::test]
async fn a_file_backs_one_task_by_default() {
    let fixture = Fixture::new().await;
    let mapping = fixture.mapping(true);
    let file = fixture.upload("shared.pdf").await;
    mapping.map_file(&fixture.tasks[0], &file.id).await.unwrap();

    let err = mapping
        .map_file(&fixture.tasks[1], &file.id)
        .await
        .unwrap_err();
    match err {
        Error::FileAlreadyMapped { file_id, task_id } => {
            assert_eq!(file_id, file.id);
            assert_eq!(task_id, fixture.tasks[0]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let choices = mapping
        .file_choices(&fixture.business_id, &fixture.tasks[1])
        .await
        .unwrap();
    assert_eq!(choices.len(), 1);
    assert!(!choices[0].selectable);
    assert_eq!(choices[0].mapped_to.as_deref(), Some(fixture.tasks[0].as_str()));
}

#[tokio::test]
async fn shared_files_are_allowed_when_configured() {
    let fixture = Fixture::new().await;
    let mapping = fixture.mapping(false);
    let file = fixture.upload("shared.pdf").await;

    mapping.map_file(&fixture.tasks[0], &file.id).await.unwrap();
    mapping.map_file(&fixture.tasks[1], &file.id).await.unwrap();

    for task in &fixture.tasks {
        assert_eq!(mapping.files_for_task(task).await.unwrap().len(), 1);
    }
    let choices = mapping
        .file_choices(&fixture.business_id, &fixture.tasks[1])
        .await
        .unwrap();
    assert!(choices.iter().all(|c| c.selectable));
}

#[tokio::test]
async fn unmap_and_remove_drop_mappings() {
    let fixture = Fixture::new().await;
    let mapping = fixture.mapping(true);
    let kept = fixture.upload("kept.pdf").await;
    let removed = fixture.upload("removed.pdf").await;
    mapping.map_file(&fixture.tasks[0], &kept.id).await.unwrap();
    mapping.map_file(&fixture.tasks[0], &removed.id).await.unwrap();

    assert!(mapping.unmap_file(&fixture.tasks[0], &kept.id).await.unwrap());
    assert!(!mapping.unmap_file(&fixture.tasks[0], &kept.id).await.unwrap());

    mapping.remove_file(&removed.id).await.unwrap();
    assert!(mapping.files_for_task(&fixture.tasks[0]).await.unwrap().is_empty());
    let err = mapping.remove_file(&removed.id).await.unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));

    // The file is free again once its mapping is gone.
    mapping.map_file(&fixture.tasks[1], &kept.id).await.unwrap();
}

#[tokio::test]
async fn files_from_another_business_cannot_be_mapped() {
    let fixture = Fixture::new().await;
    let mapping = fixture.mapping(true);
    let stray = fixture
        .files
        .upload("founder", "other-business", "stray.pdf", b"x".to_vec())
        .await
        .unwrap();

    let err = mapping
        .map_file(&fixture.tasks[0], &stray.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn other_users_cannot_map_onto_foreign_tasks() {
    let fixture = Fixture::new().await;
    let file = fixture.upload("code.pdf").await;
    let intruder = MappingService::new(
        fixture.env.repository(),
        fixture.files.clone(),
        session_for("intruder"),
        true,
    );

    let err = intruder
        .map_file(&fixture.tasks[0], &file.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TodoNotFound(_)));
}
