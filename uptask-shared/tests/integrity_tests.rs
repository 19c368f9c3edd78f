/// Reference sequences and deletion cascades against PostgreSQL
///
/// Skipped when `DATABASE_URL` is not set.

use sqlx::PgPool;
use std::env;
use uptask_shared::{
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    integrity::{self, IntegrityReport},
    models::{
        note::{CreateNote, Note},
        project::{CreateProject, Project},
        task::{CreateTask, Task},
        user::{CreateUser, User},
    },
};
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = env::var("DATABASE_URL").ok()?;
    let pool = create_pool(DatabaseConfig {
        url,
        max_connections: 5,
        ..Default::default()
    })
    .await
    .expect("Failed to create pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    Some(pool)
}

async fn seed_project(pool: &PgPool) -> (User, Project) {
    let user = User::create(
        pool,
        CreateUser {
            name: "Integrity".to_string(),
            email: format!("integrity-{}@example.com", Uuid::new_v4()),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .unwrap();

    let project = Project::create(
        pool,
        CreateProject {
            project_name: "Website".to_string(),
            client_name: "Acme".to_string(),
            description: "Relaunch".to_string(),
            manager: user.id,
        },
    )
    .await
    .unwrap();

    (user, project)
}

async fn seed_task(pool: &PgPool, project_id: Uuid, name: &str) -> Task {
    Task::create(
        pool,
        CreateTask {
            name: name.to_string(),
            description: "Work".to_string(),
            project: project_id,
        },
    )
    .await
    .unwrap()
    .expect("project exists")
}

async fn seed_note(pool: &PgPool, task_id: Uuid, author: Uuid) -> Note {
    Note::create(
        pool,
        CreateNote {
            content: "Noted".to_string(),
            created_by: author,
            task: task_id,
        },
    )
    .await
    .unwrap()
    .expect("task exists")
}

#[tokio::test]
async fn test_creation_appends_references_in_order() {
    let Some(pool) = test_pool().await else { return };
    let (user, project) = seed_project(&pool).await;

    let first = seed_task(&pool, project.id, "First").await;
    let second = seed_task(&pool, project.id, "Second").await;
    let note = seed_note(&pool, first.id, user.id).await;

    let project = Project::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(project.tasks, vec![first.id, second.id]);

    let first = Task::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(first.notes, vec![note.id]);
}

#[tokio::test]
async fn test_attach_and_detach_are_idempotent() {
    let Some(pool) = test_pool().await else { return };
    let (_, project) = seed_project(&pool).await;
    let task = seed_task(&pool, project.id, "Only").await;

    let mut conn = pool.acquire().await.unwrap();
    assert!(!integrity::attach_task(&mut conn, project.id, task.id).await.unwrap());
    assert!(integrity::detach_task(&mut conn, project.id, task.id).await.unwrap());
    assert!(!integrity::detach_task(&mut conn, project.id, task.id).await.unwrap());
    drop(conn);

    let project = Project::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert!(project.tasks.is_empty());
}

#[tokio::test]
async fn test_task_delete_cascades_to_notes() {
    let Some(pool) = test_pool().await else { return };
    let (user, project) = seed_project(&pool).await;
    let kept = seed_task(&pool, project.id, "Kept").await;
    let removed = seed_task(&pool, project.id, "Removed").await;
    let note = seed_note(&pool, removed.id, user.id).await;

    assert!(Task::delete(&pool, removed.id).await.unwrap());
    assert!(!Task::delete(&pool, removed.id).await.unwrap());

    assert!(Note::find_by_id(&pool, note.id).await.unwrap().is_none());
    let project = Project::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(project.tasks, vec![kept.id]);
}

#[tokio::test]
async fn test_note_delete_detaches_from_task() {
    let Some(pool) = test_pool().await else { return };
    let (user, project) = seed_project(&pool).await;
    let task = seed_task(&pool, project.id, "Notes").await;
    let first = seed_note(&pool, task.id, user.id).await;
    let second = seed_note(&pool, task.id, user.id).await;

    assert!(Note::delete(&pool, first.id).await.unwrap());
    assert!(!Note::delete(&pool, first.id).await.unwrap());

    let task = Task::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(task.notes, vec![second.id]);
}

#[tokio::test]
async fn test_project_delete_removes_everything_below() {
    let Some(pool) = test_pool().await else { return };
    let (user, project) = seed_project(&pool).await;
    let first = seed_task(&pool, project.id, "First").await;
    let second = seed_task(&pool, project.id, "Second").await;
    let a = seed_note(&pool, first.id, user.id).await;
    let b = seed_note(&pool, first.id, user.id).await;
    let c = seed_note(&pool, second.id, user.id).await;

    let report = Project::delete(&pool, project.id).await.unwrap();
    assert_eq!(
        report,
        Some(IntegrityReport {
            tasks_removed: 2,
            notes_removed: 3,
        })
    );

    assert!(Project::find_by_id(&pool, project.id).await.unwrap().is_none());
    for task_id in [first.id, second.id] {
        assert!(Task::find_by_id(&pool, task_id).await.unwrap().is_none());
    }
    for note_id in [a.id, b.id, c.id] {
        assert!(Note::find_by_id(&pool, note_id).await.unwrap().is_none());
    }

    assert_eq!(Project::delete(&pool, project.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_raw_parent_delete_is_restricted() {
    let Some(pool) = test_pool().await else { return };
    let (_, project) = seed_project(&pool).await;
    seed_task(&pool, project.id, "Blocker").await;

    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(project.id)
        .execute(&pool)
        .await;
    assert!(result.is_err());

    assert!(Project::find_by_id(&pool, project.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_under_deleted_parent_returns_none() {
    let Some(pool) = test_pool().await else { return };
    let (user, project) = seed_project(&pool).await;
    let task = seed_task(&pool, project.id, "Gone").await;
    Project::delete(&pool, project.id).await.unwrap();

    let created = Task::create(
        &pool,
        CreateTask {
            name: "Late".to_string(),
            description: "Work".to_string(),
            project: project.id,
        },
    )
    .await
    .unwrap();
    assert!(created.is_none());

    let created = Note::create(
        &pool,
        CreateNote {
            content: "Late".to_string(),
            created_by: user.id,
            task: task.id,
        },
    )
    .await
    .unwrap();
    assert!(created.is_none());
}

#[tokio::test]
async fn test_task_create_racing_project_delete() {
    let Some(pool) = test_pool().await else { return };

    for _ in 0..20 {
        let (_, project) = seed_project(&pool).await;

        let create = {
            let pool = pool.clone();
            tokio::spawn(async move {
                Task::create(
                    &pool,
                    CreateTask {
                        name: "Racer".to_string(),
                        description: "Work".to_string(),
                        project: project.id,
                    },
                )
                .await
            })
        };
        let delete = {
            let pool = pool.clone();
            tokio::spawn(async move { Project::delete(&pool, project.id).await })
        };

        let created = create.await.unwrap().expect("create must not hit a raw store error");
        delete.await.unwrap().unwrap();

        // Either the delete won, or it waited and purged the new task
        if let Some(task) = created {
            assert!(Task::find_by_id(&pool, task.id).await.unwrap().is_none());
        }
    }
}

#[tokio::test]
async fn test_note_create_racing_task_delete() {
    let Some(pool) = test_pool().await else { return };
    let (user, project) = seed_project(&pool).await;

    for _ in 0..20 {
        let task = seed_task(&pool, project.id, "Racer").await;

        let create = {
            let pool = pool.clone();
            tokio::spawn(async move {
                Note::create(
                    &pool,
                    CreateNote {
                        content: "Racing".to_string(),
                        created_by: user.id,
                        task: task.id,
                    },
                )
                .await
            })
        };
        let delete = {
            let pool = pool.clone();
            tokio::spawn(async move { Task::delete(&pool, task.id).await })
        };

        let created = create.await.unwrap().expect("create must not hit a raw store error");
        assert!(delete.await.unwrap().unwrap());

        if let Some(note) = created {
            assert!(Note::find_by_id(&pool, note.id).await.unwrap().is_none());
        }
    }

    let project = Project::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert!(project.tasks.is_empty());
}
