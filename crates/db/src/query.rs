//! Translation of list-endpoint query parameters into a bounded query plan.
//!
//! Sorting is restricted to an allow-list of columns and pagination is
//! clamped, so arbitrary client input can never steer the generated SQL
//! beyond these few shapes. Unrecognized values fall back to defaults
//! instead of erroring; the resolved plan is echoed back to the caller so
//! the response shows what was actually applied.

use sea_orm::{ColumnTrait, Condition, Order, QueryOrder, QuerySelect, Select};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{
    entities::task,
    types::{TaskPriority, TaskStatus},
};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Raw, untrusted options as deserialized from the query string. Owner
/// scoping is deliberately absent: it always comes from the authenticated
/// identity, never from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListOptions {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub is_urgent: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Columns a client may sort by. Anything not named here falls back to
/// `created_at` and never reaches the query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskSortField {
    Title,
    Status,
    Priority,
    DueDate,
    #[default]
    CreatedAt,
    UpdatedAt,
    CompletionPercentage,
    PriorityScore,
}

impl TaskSortField {
    fn column(self) -> task::Column {
        match self {
            TaskSortField::Title => task::Column::Title,
            TaskSortField::Status => task::Column::Status,
            TaskSortField::Priority => task::Column::Priority,
            TaskSortField::DueDate => task::Column::DueDate,
            TaskSortField::CreatedAt => task::Column::CreatedAt,
            TaskSortField::UpdatedAt => task::Column::UpdatedAt,
            TaskSortField::CompletionPercentage => task::Column::CompletionPercentage,
            TaskSortField::PriorityScore => task::Column::PriorityScore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn order(self) -> Order {
        match self {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// The effective plan after defaulting and clamping. Serialized into list
/// responses as pagination/sort metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListPlan {
    pub sort_by: TaskSortField,
    pub sort_order: SortOrder,
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl TaskListPlan {
    pub fn from_options(options: &TaskListOptions) -> Self {
        let sort_by = options
            .sort_by
            .as_deref()
            .and_then(|raw| raw.parse::<TaskSortField>().ok())
            .unwrap_or_default();
        let sort_order = match options.sort_order.as_deref() {
            Some(raw) if raw.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(raw) if raw.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Desc,
        };
        let page = options.page.unwrap_or(1).max(1);
        let limit = options
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        Self {
            sort_by,
            sort_order,
            page,
            limit,
            offset: page.saturating_sub(1).saturating_mul(limit),
        }
    }
}

/// Filter conditions shared by the page query and its paired count query.
pub fn filter_conditions(user_row_id: i64, options: &TaskListOptions) -> Condition {
    let mut condition = Condition::all().add(task::Column::UserId.eq(user_row_id));
    if let Some(status) = options.status {
        condition = condition.add(task::Column::Status.eq(status));
    }
    if let Some(priority) = options.priority {
        condition = condition.add(task::Column::Priority.eq(priority));
    }
    if let Some(is_urgent) = options.is_urgent {
        condition = condition.add(task::Column::IsUrgent.eq(is_urgent));
    }
    if let Some(search) = options.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(task::Column::Title.contains(search))
                .add(task::Column::Description.contains(search)),
        );
    }
    condition
}

/// Applies ordering and the limit/offset window from a resolved plan.
pub fn apply_plan(
    select: Select<task::Entity>,
    plan: &TaskListPlan,
) -> Select<task::Entity> {
    select
        .order_by(plan.sort_by.column(), plan.sort_order.order())
        .limit(plan.limit)
        .offset(plan.offset)
}
