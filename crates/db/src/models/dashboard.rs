//! Dashboards, widgets and widget placements.

use llmscope_core::dashboards::Placement;
use llmscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `dashboards` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dashboard {
    pub id: DbId,
    pub org_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub is_main: bool,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `widgets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Widget {
    pub id: DbId,
    pub org_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub widget_type: String,
    pub config: serde_json::Value,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A placed widget: the widget row plus its grid position.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlacedWidget {
    pub widget_id: DbId,
    pub name: String,
    pub widget_type: String,
    pub config: serde_json::Value,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardDetail {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    pub widgets: Vec<PlacedWidget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDashboard {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_main: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDashboard {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_main: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWidget {
    pub name: String,
    pub description: Option<String>,
    pub widget_type: String,
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWidget {
    pub name: Option<String>,
    pub description: Option<String>,
    pub widget_type: Option<String>,
    pub config: Option<serde_json::Value>,
}

/// Body of `PUT /dashboards/{id}/widgets/{widget_id}`.
pub type PlaceWidget = Placement;
