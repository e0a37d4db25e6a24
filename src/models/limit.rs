use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    /// System record whose content mentions a rate or limit.
    SystemLimit,
    /// Tool result text containing "limit reached".
    ToolResultLimit,
}

#[derive(Clone, Debug, Serialize)]
pub struct LimitSignal {
    pub kind: LimitKind,
    pub ts: DateTime<Utc>,
    pub content: String,
    pub reset_at: Option<DateTime<Utc>>,
    /// Only set for [`LimitKind::SystemLimit`].
    pub wait_minutes: Option<u32>,
}
