//! caltrack MCP Server Implementation
//!
//! Exposes the calorie tracker as MCP tools.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};

use crate::storage::SqliteStore;
use crate::tools::ledger;
use crate::tools::status::StatusTracker;
use crate::tracker::CalorieTracker;

type Tracker = CalorieTracker<SqliteStore>;

/// caltrack MCP Service
#[derive(Clone)]
pub struct CaltrackService {
    status_tracker: Arc<StatusTracker>,
    tracker: Arc<Mutex<Tracker>>,
    tool_router: ToolRouter<CaltrackService>,
}

impl CaltrackService {
    pub fn new(database_path: PathBuf, tracker: Tracker) -> Self {
        Self {
            status_tracker: Arc::new(StatusTracker::new(database_path)),
            tracker: Arc::new(Mutex::new(tracker)),
            tool_router: Self::tool_router(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tracker>, McpError> {
        self.tracker
            .lock()
            .map_err(|_| McpError::internal_error("Tracker lock poisoned", None))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Parameter Structs
// ============================================================================

/// Clients send calories either as JSON numbers or as typed text.
/// Integers are tried first so large values reach validation unrounded.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum Amount {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Amount {
    fn as_text(&self) -> String {
        match self {
            Amount::Integer(n) => n.to_string(),
            Amount::Number(n) => n.to_string(),
            Amount::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListEntriesParams {
    /// Only entries whose name starts with this text (case-insensitive)
    pub prefix: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMealParams {
    /// Meal name, e.g. "Breakfast"
    pub name: String,
    /// Calories eaten (whole number, >= 0)
    pub calories: Amount,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddWorkoutParams {
    /// Workout name, e.g. "Basketball"
    pub name: String,
    /// Calories burned (whole number, >= 0)
    pub calories: Amount,
    /// Optional intensity: low, moderate or high
    pub intensity: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveEntryParams {
    /// Entry id from list_entries
    pub id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetLimitParams {
    /// New daily calorie limit (whole number, >= 0)
    pub limit: Amount,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AuditLedgerParams {
    /// Rewrite the stored total when it disagrees with the entries (default false)
    #[serde(default)]
    pub repair: bool,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl CaltrackService {
    // --- Status ---

    #[tool(description = "Get the current status of the caltrack service including build info, database status, and process information")]
    fn caltrack_status(&self) -> Result<CallToolResult, McpError> {
        to_json(&self.status_tracker.get_status())
    }

    #[tool(description = "Get instructions for logging meals and workouts. Call this when starting a session or when unsure how to use the tracker tools.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Ledger ---

    #[tool(description = "Get today's calorie limit, running total, consumed, burned, remaining and progress")]
    fn get_summary(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.lock()?;
        to_json(&ledger::get_summary(&*tracker))
    }

    #[tool(description = "List today's meals and workouts, optionally filtered by name prefix")]
    fn list_entries(&self, Parameters(p): Parameters<ListEntriesParams>) -> Result<CallToolResult, McpError> {
        let tracker = self.lock()?;
        to_json(&ledger::list_entries(&*tracker, p.prefix.as_deref()))
    }

    #[tool(description = "Log a meal (calorie intake). Returns the new entry id and refreshed totals.")]
    fn add_meal(&self, Parameters(p): Parameters<AddMealParams>) -> Result<CallToolResult, McpError> {
        let mut tracker = self.lock()?;
        let result = ledger::add_meal(&mut *tracker, &p.name, &p.calories.as_text())
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Log a workout (calorie expenditure). Returns the new entry id and refreshed totals.")]
    fn add_workout(&self, Parameters(p): Parameters<AddWorkoutParams>) -> Result<CallToolResult, McpError> {
        let mut tracker = self.lock()?;
        let result = ledger::add_workout(
            &mut *tracker,
            &p.name,
            &p.calories.as_text(),
            p.intensity.as_deref(),
        )
        .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove a meal by id. Unknown ids are ignored (removed: false).")]
    fn remove_meal(&self, Parameters(p): Parameters<RemoveEntryParams>) -> Result<CallToolResult, McpError> {
        let mut tracker = self.lock()?;
        let result = ledger::remove_meal(&mut *tracker, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove a workout by id. Unknown ids are ignored (removed: false).")]
    fn remove_workout(&self, Parameters(p): Parameters<RemoveEntryParams>) -> Result<CallToolResult, McpError> {
        let mut tracker = self.lock()?;
        let result = ledger::remove_workout(&mut *tracker, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Set the daily calorie limit")]
    fn set_limit(&self, Parameters(p): Parameters<SetLimitParams>) -> Result<CallToolResult, McpError> {
        let mut tracker = self.lock()?;
        let result = ledger::set_limit(&mut *tracker, &p.limit.as_text())
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Start a new day: remove all meals and workouts and zero the total. The calorie limit is kept.")]
    fn reset_day(&self) -> Result<CallToolResult, McpError> {
        let mut tracker = self.lock()?;
        let result = ledger::reset_day(&mut *tracker).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Check that the stored running total matches the logged entries. With repair=true, rewrite a drifted total.")]
    fn audit_ledger(&self, Parameters(p): Parameters<AuditLedgerParams>) -> Result<CallToolResult, McpError> {
        let mut tracker = self.lock()?;
        let result = ledger::audit_ledger(&mut *tracker, p.repair).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for CaltrackService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "caltrack".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Daily Calorie Tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "caltrack - daily calorie balance (meals in, workouts out, against a daily limit). \
                 Call usage_instructions first. \
                 Summary: get_summary, list_entries. \
                 Logging: add_meal, add_workout, remove_meal, remove_workout. \
                 Day: set_limit, reset_day. \
                 Maintenance: audit_ledger, caltrack_status."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_accepts_numbers_and_text() {
        let p: AddMealParams =
            serde_json::from_str(r#"{"name": "Lunch", "calories": 500}"#).unwrap();
        assert_eq!(p.calories.as_text(), "500");

        let p: AddMealParams =
            serde_json::from_str(r#"{"name": "Lunch", "calories": "450"}"#).unwrap();
        assert_eq!(p.calories.as_text(), "450");

        let p: SetLimitParams = serde_json::from_str(r#"{"limit": 2500.5}"#).unwrap();
        assert_eq!(p.limit.as_text(), "2500.5");
    }

    #[test]
    fn test_large_integers_keep_every_digit() {
        let p: AddMealParams =
            serde_json::from_str(r#"{"name": "Feast", "calories": 9007199254740993}"#).unwrap();
        assert!(matches!(p.calories, Amount::Integer(9_007_199_254_740_993)));
        assert_eq!(p.calories.as_text(), "9007199254740993");

        // u64 beyond i64 falls through to f64 and is rejected by the cap
        let p: AddMealParams =
            serde_json::from_str(r#"{"name": "Feast", "calories": 18446744073709551615}"#)
                .unwrap();
        assert!(matches!(p.calories, Amount::Number(_)));
        assert!(crate::input::parse_meal("Feast", &p.calories.as_text()).is_err());
    }

    #[test]
    fn test_audit_repair_defaults_to_false() {
        let p: AuditLedgerParams = serde_json::from_str("{}").unwrap();
        assert!(!p.repair);
    }
}
