use serde::{Deserialize, Serialize};

use rollcall_access_events::Pin;

/// Staff member known to the attendance system.
///
/// Employee records are owned by the HR admin subsystem; the core only reads
/// them. The `pin` is the stable key the access-control hardware reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub pin: Pin,
    pub display_name: String,
    /// Organizational unit reference.
    pub department: Option<String>,
    pub is_active: bool,
}
