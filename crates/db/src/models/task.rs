use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use crate::types::{TaskPriority, TaskStatus};

use crate::{
    entities::task,
    models::ids,
    query::{self, SortOrder, TaskListOptions, TaskListPlan, TaskSortField},
    scoring,
    stats::TaskStatistics,
};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found")]
    TaskNotFound,
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_urgent: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub completion_percentage: i32,
    pub priority_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub is_urgent: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update. Omitted fields keep their current value; `due_date` uses
/// a double `Option` so an explicit `null` clears the date while an omitted
/// field leaves it alone.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub is_urgent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Pagination/sort metadata echoed back with every list response, carrying
/// the effective values after defaulting and clamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListMeta {
    pub page: u64,
    pub limit: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub sort_by: TaskSortField,
    pub sort_order: SortOrder,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub is_urgent: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub meta: TaskListMeta,
}

fn validate_title(title: &str) -> Result<(), TaskError> {
    let len = title.chars().count();
    if len == 0 {
        return Err(TaskError::ValidationError(
            "Title must not be empty".to_string(),
        ));
    }
    if len > MAX_TITLE_LEN {
        return Err(TaskError::ValidationError(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), TaskError> {
    if let Some(description) = description
        && description.chars().count() > MAX_DESCRIPTION_LEN
    {
        return Err(TaskError::ValidationError(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

impl Task {
    fn from_model_for_user(user_id: Uuid, model: task::Model) -> Self {
        Self {
            id: model.uuid,
            user_id,
            title: model.title,
            description: model.description,
            status: model.status,
            priority: model.priority,
            is_urgent: model.is_urgent,
            due_date: model.due_date,
            completion_percentage: model.completion_percentage,
            priority_score: model.priority_score,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let user_uuid = ids::user_uuid_by_id(db, model.user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        Ok(Self::from_model_for_user(user_uuid, model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, TaskError> {
        validate_title(&data.title)?;
        validate_description(data.description.as_deref())?;

        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let status = data.status.unwrap_or_default();
        let priority = data.priority.unwrap_or_default();
        let is_urgent = data.is_urgent.unwrap_or(false);
        let now = Utc::now();
        let derived = scoring::derived_fields(status, priority, is_urgent, data.due_date, now);

        let active = task::ActiveModel {
            uuid: Set(task_id),
            user_id: Set(user_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(status),
            priority: Set(priority),
            is_urgent: Set(is_urgent),
            due_date: Set(data.due_date),
            completion_percentage: Set(derived.completion_percentage),
            priority_score: Set(derived.priority_score),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Ok(Self::from_model_for_user(user_id, model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;

        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Writes the merged field values and re-derives both cached scores so
    /// they stay consistent with whatever changed.
    #[allow(clippy::too_many_arguments)]
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        title: String,
        description: Option<String>,
        status: TaskStatus,
        priority: TaskPriority,
        is_urgent: bool,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, TaskError> {
        validate_title(&title)?;
        validate_description(description.as_deref())?;

        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(TaskError::TaskNotFound)?;

        let user_row_id = record.user_id;
        let now = Utc::now();
        let derived = scoring::derived_fields(status, priority, is_urgent, due_date, now);

        let mut active: task::ActiveModel = record.into();
        active.title = Set(title);
        active.description = Set(description);
        active.status = Set(status);
        active.priority = Set(priority);
        active.is_urgent = Set(is_urgent);
        active.due_date = Set(due_date);
        active.completion_percentage = Set(derived.completion_percentage);
        active.priority_score = Set(derived.priority_score);
        active.updated_at = Set(now);

        let updated = active.update(db).await?;
        let user_uuid = ids::user_uuid_by_id(db, user_row_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        Ok(Self::from_model_for_user(user_uuid, updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// One page of the owner's tasks under the resolved plan, plus the
    /// paired count over the same conditions.
    pub async fn list_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        options: &TaskListOptions,
    ) -> Result<TaskPage, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let plan = TaskListPlan::from_options(options);
        let condition = query::filter_conditions(user_row_id, options);

        let total_count = task::Entity::find()
            .filter(condition.clone())
            .count(db)
            .await?;

        let models = query::apply_plan(task::Entity::find().filter(condition), &plan)
            .all(db)
            .await?;

        let tasks = models
            .into_iter()
            .map(|model| Self::from_model_for_user(user_id, model))
            .collect();

        Ok(TaskPage {
            tasks,
            meta: TaskListMeta {
                page: plan.page,
                limit: plan.limit,
                total_count,
                total_pages: total_count.div_ceil(plan.limit),
                sort_by: plan.sort_by,
                sort_order: plan.sort_order,
                status: options.status,
                priority: options.priority,
                is_urgent: options.is_urgent,
                search: options.search.clone(),
            },
        })
    }

    pub async fn statistics_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<TaskStatistics, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let models = task::Entity::find()
            .filter(task::Column::UserId.eq(user_row_id))
            .all(db)
            .await?;

        let tasks: Vec<Task> = models
            .into_iter()
            .map(|model| Self::from_model_for_user(user_id, model))
            .collect();

        Ok(TaskStatistics::from_tasks(&tasks))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::user::{CreateUser, User};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn setup_user(db: &sea_orm::DatabaseConnection, username: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        User::create(
            db,
            &CreateUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "$argon2id$stub".to_string(),
            },
            user_id,
        )
        .await
        .unwrap();
        user_id
    }

    async fn create_task(
        db: &sea_orm::DatabaseConnection,
        user_id: Uuid,
        data: CreateTask,
    ) -> Task {
        Task::create(db, user_id, &data, Uuid::new_v4()).await.unwrap()
    }

    #[tokio::test]
    async fn create_seeds_derived_fields() {
        let db = setup_db().await;
        let user_id = setup_user(&db, "alice").await;

        let task = create_task(
            &db,
            user_id,
            CreateTask {
                title: "Write report".to_string(),
                status: Some(TaskStatus::InProgress),
                priority: Some(TaskPriority::High),
                is_urgent: Some(true),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(task.completion_percentage, 50);
        // high(40) + urgent flag(20), no due date.
        assert_eq!(task.priority_score, 60);
        assert_eq!(task.user_id, user_id);
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let db = setup_db().await;
        let user_id = setup_user(&db, "alice").await;

        let task = create_task(
            &db,
            user_id,
            CreateTask {
                title: "Defaults".to_string(),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(!task.is_urgent);
        assert_eq!(task.completion_percentage, 0);
        assert_eq!(task.priority_score, 25);
    }

    #[tokio::test]
    async fn create_rejects_invalid_title() {
        let db = setup_db().await;
        let user_id = setup_user(&db, "alice").await;

        let empty = Task::create(
            &db,
            user_id,
            &CreateTask {
                title: String::new(),
                ..Default::default()
            },
            Uuid::new_v4(),
        )
        .await;
        assert!(matches!(empty, Err(TaskError::ValidationError(_))));

        let oversized = Task::create(
            &db,
            user_id,
            &CreateTask {
                title: "x".repeat(MAX_TITLE_LEN + 1),
                ..Default::default()
            },
            Uuid::new_v4(),
        )
        .await;
        assert!(matches!(oversized, Err(TaskError::ValidationError(_))));
    }

    #[tokio::test]
    async fn update_recomputes_derived_fields() {
        let db = setup_db().await;
        let user_id = setup_user(&db, "alice").await;
        let task = create_task(
            &db,
            user_id,
            CreateTask {
                title: "Ship it".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(task.completion_percentage, 0);

        let updated = Task::update(
            &db,
            task.id,
            task.title.clone(),
            task.description.clone(),
            TaskStatus::Completed,
            TaskPriority::Urgent,
            true,
            None,
        )
        .await
        .unwrap();

        assert_eq!(updated.completion_percentage, 100);
        assert_eq!(updated.priority_score, 80);
        assert!(updated.updated_at >= task.updated_at);
    }

    #[tokio::test]
    async fn update_missing_task_reports_not_found() {
        let db = setup_db().await;
        setup_user(&db, "alice").await;

        let result = Task::update(
            &db,
            Uuid::new_v4(),
            "ghost".to_string(),
            None,
            TaskStatus::Todo,
            TaskPriority::Low,
            false,
            None,
        )
        .await;
        assert!(matches!(result, Err(TaskError::TaskNotFound)));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let db = setup_db().await;
        let user_id = setup_user(&db, "alice").await;
        let task = create_task(
            &db,
            user_id,
            CreateTask {
                title: "Temporary".to_string(),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(Task::delete(&db, task.id).await.unwrap(), 1);
        assert!(Task::find_by_id(&db, task.id).await.unwrap().is_none());
        assert_eq!(Task::delete(&db, task.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_search() {
        let db = setup_db().await;
        let user_id = setup_user(&db, "alice").await;

        create_task(
            &db,
            user_id,
            CreateTask {
                title: "Write quarterly report".to_string(),
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .await;
        create_task(
            &db,
            user_id,
            CreateTask {
                title: "Buy groceries".to_string(),
                description: Some("milk and report paper".to_string()),
                ..Default::default()
            },
        )
        .await;
        create_task(
            &db,
            user_id,
            CreateTask {
                title: "Call dentist".to_string(),
                ..Default::default()
            },
        )
        .await;

        let by_status = Task::list_for_user(
            &db,
            user_id,
            &TaskListOptions {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_status.tasks.len(), 1);
        assert_eq!(by_status.tasks[0].title, "Write quarterly report");

        // Search matches title OR description.
        let by_search = Task::list_for_user(
            &db,
            user_id,
            &TaskListOptions {
                search: Some("report".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_search.tasks.len(), 2);
        assert_eq!(by_search.meta.total_count, 2);
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let db = setup_db().await;
        let alice = setup_user(&db, "alice").await;
        let bob = setup_user(&db, "bob").await;

        create_task(
            &db,
            alice,
            CreateTask {
                title: "Alice's task".to_string(),
                ..Default::default()
            },
        )
        .await;

        let page = Task::list_for_user(&db, bob, &TaskListOptions::default())
            .await
            .unwrap();
        assert!(page.tasks.is_empty());
        assert_eq!(page.meta.total_count, 0);
    }

    #[tokio::test]
    async fn list_paginates_and_reports_effective_plan() {
        let db = setup_db().await;
        let user_id = setup_user(&db, "alice").await;

        for i in 0..5 {
            create_task(
                &db,
                user_id,
                CreateTask {
                    title: format!("Task {i}"),
                    ..Default::default()
                },
            )
            .await;
        }

        let page = Task::list_for_user(
            &db,
            user_id,
            &TaskListOptions {
                page: Some(2),
                limit: Some(2),
                sort_by: Some("title".to_string()),
                sort_order: Some("ASC".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(page.tasks.len(), 2);
        assert_eq!(page.tasks[0].title, "Task 2");
        assert_eq!(page.tasks[1].title, "Task 3");
        assert_eq!(page.meta.total_count, 5);
        assert_eq!(page.meta.total_pages, 3);
        assert_eq!(page.meta.sort_by, TaskSortField::Title);
        assert_eq!(page.meta.sort_order, SortOrder::Asc);
    }

    #[tokio::test]
    async fn list_with_bogus_sort_field_falls_back() {
        let db = setup_db().await;
        let user_id = setup_user(&db, "alice").await;
        create_task(
            &db,
            user_id,
            CreateTask {
                title: "Only task".to_string(),
                ..Default::default()
            },
        )
        .await;

        let page = Task::list_for_user(
            &db,
            user_id,
            &TaskListOptions {
                sort_by: Some("malicious_field".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.meta.sort_by, TaskSortField::CreatedAt);
    }

    #[tokio::test]
    async fn list_sorts_by_priority_score() {
        let db = setup_db().await;
        let user_id = setup_user(&db, "alice").await;

        create_task(
            &db,
            user_id,
            CreateTask {
                title: "Low".to_string(),
                priority: Some(TaskPriority::Low),
                ..Default::default()
            },
        )
        .await;
        create_task(
            &db,
            user_id,
            CreateTask {
                title: "Urgent".to_string(),
                priority: Some(TaskPriority::Urgent),
                is_urgent: Some(true),
                due_date: Some(Utc::now() - Duration::days(2)),
                ..Default::default()
            },
        )
        .await;

        let page = Task::list_for_user(
            &db,
            user_id,
            &TaskListOptions {
                sort_by: Some("priority_score".to_string()),
                sort_order: Some("desc".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.tasks[0].title, "Urgent");
        assert_eq!(page.tasks[0].priority_score, 100);
        assert_eq!(page.tasks[1].priority_score, 10);
    }

    #[tokio::test]
    async fn statistics_for_user_aggregates_own_tasks_only() {
        let db = setup_db().await;
        let alice = setup_user(&db, "alice").await;
        let bob = setup_user(&db, "bob").await;

        for status in [
            TaskStatus::Completed,
            TaskStatus::Completed,
            TaskStatus::Todo,
            TaskStatus::InProgress,
        ] {
            create_task(
                &db,
                alice,
                CreateTask {
                    title: "task".to_string(),
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await;
        }
        create_task(
            &db,
            bob,
            CreateTask {
                title: "bob's".to_string(),
                ..Default::default()
            },
        )
        .await;

        let stats = Task::statistics_for_user(&db, alice).await.unwrap();
        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.completion_rate, 50);

        let empty = Task::statistics_for_user(&db, setup_user(&db, "carol").await)
            .await
            .unwrap();
        assert_eq!(empty.total_tasks, 0);
        assert_eq!(empty.completion_rate, 0);
    }
}
