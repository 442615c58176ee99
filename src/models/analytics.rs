use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl FromStr for DeviceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            "mobile" => Ok(Self::Mobile),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Desktop => write!(f, "desktop"),
            DeviceType::Tablet => write!(f, "tablet"),
            DeviceType::Mobile => write!(f, "mobile"),
        }
    }
}

/// What the browser reports on a route change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub page_path: String,
    #[serde(default)]
    pub page_title: String,
    #[serde(default)]
    pub viewport_width: u32,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub referrer: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewEvent {
    pub visitor_id: String,
    pub session_id: String,
    pub page_path: String,
    pub page_title: String,
    pub device_type: DeviceType,
    pub country: String,
    pub region: String,
    pub traffic_source: String,
    pub is_new_visitor: bool,
    pub timestamp: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: String,
    pub page_views: i64,
    pub unique_visitors: i64,
    pub new_visitors: i64,
    pub device_types: BTreeMap<String, i64>,
    pub countries: BTreeMap<String, i64>,
    pub traffic_sources: BTreeMap<String, i64>,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorSummary {
    pub visitor_id: String,
    pub first_visit: String,
    pub last_visit: String,
    pub device_type: DeviceType,
    pub country: String,
    pub region: String,
    pub total_visits: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub page_path: String,
    pub page_title: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub user_id: i64,
    pub email: String,
    pub first_active: String,
    pub last_active: String,
    pub last_page: String,
    pub activity_count: i64,
    /// Newest first, at most `ACTIVITY_HISTORY_LIMIT` entries.
    pub activities: Vec<ActivityEntry>,
}
