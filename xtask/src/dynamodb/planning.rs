//! Pure functions for calculating deployment plans (Functional Core).

use super::config::TableConfig;

/// Represents the current state of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub status: TableStatus,
    /// Hash key attribute name.
    pub partition_key: Option<String>,
    /// Range key attribute name.
    pub sort_key: Option<String>,
    pub item_count: Option<i64>,
}

impl TableState {
    /// Key schema as `PK/SK`, `-` marking a missing key.
    pub fn key_schema_display(&self) -> String {
        format!(
            "{}/{}",
            self.partition_key.as_deref().unwrap_or("-"),
            self.sort_key.as_deref().unwrap_or("-")
        )
    }
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
    Other,
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TableStatus::Active => "ACTIVE",
            TableStatus::Creating => "CREATING",
            TableStatus::Updating => "UPDATING",
            TableStatus::Deleting => "DELETING",
            TableStatus::Other => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Planned changes for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { config: TableConfig },
    /// Table exists with the expected keys.
    NoChanges { table_name: String },
    /// Table exists but is keyed differently. Keys cannot be changed in place.
    KeySchemaMismatch {
        table_name: String,
        expected: String,
        actual: String,
    },
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

/// Pure function: Calculate what changes are needed to reach desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            config: desired.clone(),
        };
    };

    let keys_match = state.partition_key.as_deref() == Some(desired.partition_key.name.as_str())
        && state.sort_key.as_deref() == Some(desired.sort_key.name.as_str());

    if keys_match {
        DeployPlan::NoChanges {
            table_name: desired.table_name.clone(),
        }
    } else {
        DeployPlan::KeySchemaMismatch {
            table_name: desired.table_name.clone(),
            expected: format!("{}/{}", desired.partition_key.name, desired.sort_key.name),
            actual: state.key_schema_display(),
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => vec![
            format!("+ Create table: {}", config.table_name),
            format!("  Partition key: {} (S)", config.partition_key.name),
            format!("  Sort key: {} (S)", config.sort_key.name),
            "  Billing: PAY_PER_REQUEST".to_string(),
        ],
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{}' is up to date", table_name)]
        }
        DeployPlan::KeySchemaMismatch {
            table_name,
            expected,
            actual,
        } => vec![format!(
            "! Table '{}' is keyed {} but {} is required (destroy and redeploy)",
            table_name, actual, expected
        )],
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!(
                "- Delete table: {} (ALL DATA WILL BE LOST)",
                table_name
            )]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{}' does not exist", table_name)]
        }
    }
}

/// Pure function: Format a table description for display.
pub fn format_table_state(table_name: &str, state: Option<&TableState>) -> Vec<String> {
    let Some(state) = state else {
        return vec![format!("Table '{}' does not exist", table_name)];
    };

    let mut lines = vec![
        format!("Table: {}", table_name),
        format!("  Status: {}", state.status),
        format!(
            "  Partition key: {}",
            state.partition_key.as_deref().unwrap_or("-")
        ),
        format!("  Sort key: {}", state.sort_key.as_deref().unwrap_or("-")),
    ];
    if let Some(count) = state.item_count {
        lines.push(format!("  Items (approximate): {}", count));
    }
    lines
}
