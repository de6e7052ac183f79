use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 条目状态机：pending -> verified -> active，只允许前进
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Verified,
    Active,
}

impl EntryStatus {
    /// 是否允许从当前状态变更到 next（同状态视为合法 no-op）
    pub fn can_transition_to(self, next: EntryStatus) -> bool {
        use EntryStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, Verified)
                | (Verified, Verified)
                | (Verified, Active)
                | (Active, Active)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waitlist {
    pub id: i64,
    pub slug: String,
    pub name: String,
    /// 位置分配序列，始终等于已分配的最大 position
    pub entry_seq: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: i64,
    pub waitlist_id: i64,
    pub email: String,
    pub name: Option<String>,
    pub position: i64,
    pub referral_code: String,
    pub referral_source: Option<String>,
    pub referrals: i64,
    pub status: EntryStatus,
    pub custom_data: Option<serde_json::Value>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistAnalytics {
    pub waitlist_id: i64,
    pub signups: i64,
    pub views: i64,
    pub daily_stats: Option<serde_json::Value>,
    pub utm_data: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}
