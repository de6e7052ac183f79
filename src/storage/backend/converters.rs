use crate::storage::models::{EntryStatus, Waitlist, WaitlistAnalytics, WaitlistEntry};
use migration::entities::{waitlist, waitlist_analytics, waitlist_entry};

/// 将 Sea-ORM Model 转换为 Waitlist
pub fn model_to_waitlist(model: waitlist::Model) -> Waitlist {
    Waitlist {
        id: model.id,
        slug: model.slug,
        name: model.name,
        entry_seq: model.entry_seq.max(0),
        created_at: model.created_at,
    }
}

/// 将 Sea-ORM Model 转换为 WaitlistEntry
///
/// status 列出现未知值时回退为 pending，custom_data 解析失败时丢弃
pub fn model_to_entry(model: waitlist_entry::Model) -> WaitlistEntry {
    WaitlistEntry {
        id: model.id,
        waitlist_id: model.waitlist_id,
        email: model.email,
        name: model.name,
        position: model.position,
        referral_code: model.referral_code,
        referral_source: model.referral_source,
        referrals: model.referrals.max(0),
        status: model
            .status
            .parse::<EntryStatus>()
            .unwrap_or(EntryStatus::Pending),
        custom_data: text_to_json(model.custom_data),
        joined_at: model.joined_at,
    }
}

/// 将 Sea-ORM Model 转换为 WaitlistAnalytics
pub fn model_to_analytics(model: waitlist_analytics::Model) -> WaitlistAnalytics {
    WaitlistAnalytics {
        waitlist_id: model.waitlist_id,
        signups: model.signups.max(0),
        views: model.views.max(0),
        daily_stats: text_to_json(model.daily_stats),
        utm_data: text_to_json(model.utm_data),
        updated_at: model.updated_at,
    }
}

/// JSON 文本列 -> Value（非法 JSON 返回 None）
pub fn text_to_json(text: Option<String>) -> Option<serde_json::Value> {
    text.and_then(|s| serde_json::from_str(&s).ok())
}

/// Value -> JSON 文本列
pub fn json_to_text(value: Option<&serde_json::Value>) -> Option<String> {
    value.map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_entry_model() -> waitlist_entry::Model {
        waitlist_entry::Model {
            id: 7,
            waitlist_id: 1,
            email: "ada@example.com".to_string(),
            name: Some("Ada".to_string()),
            position: 3,
            referral_code: "k3v9pq2m".to_string(),
            referral_source: None,
            referrals: 2,
            status: "verified".to_string(),
            custom_data: Some(r#"{"plan":"pro"}"#.to_string()),
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn test_model_to_entry_basic() {
        let model = create_test_entry_model();
        let entry = model_to_entry(model);

        assert_eq!(entry.email, "ada@example.com");
        assert_eq!(entry.position, 3);
        assert_eq!(entry.status, EntryStatus::Verified);
        assert_eq!(
            entry.custom_data.unwrap()["plan"],
            serde_json::json!("pro")
        );
    }

    #[test]
    fn test_model_to_entry_unknown_status_falls_back() {
        let mut model = create_test_entry_model();
        model.status = "banished".to_string();

        let entry = model_to_entry(model);
        assert_eq!(entry.status, EntryStatus::Pending);
    }

    #[test]
    fn test_model_to_entry_negative_referrals() {
        let mut model = create_test_entry_model();
        model.referrals = -5; // 负数应该被转换为 0

        let entry = model_to_entry(model);
        assert_eq!(entry.referrals, 0);
    }

    #[test]
    fn test_model_to_entry_invalid_json_dropped() {
        let mut model = create_test_entry_model();
        model.custom_data = Some("{not json".to_string());

        let entry = model_to_entry(model);
        assert!(entry.custom_data.is_none());
    }

    #[test]
    fn test_model_to_waitlist() {
        let model = waitlist::Model {
            id: 1,
            slug: "beta-access".to_string(),
            name: "Beta Access".to_string(),
            entry_seq: 12,
            created_at: Utc::now(),
        };

        let wl = model_to_waitlist(model);
        assert_eq!(wl.slug, "beta-access");
        assert_eq!(wl.entry_seq, 12);
    }

    #[test]
    fn test_model_to_analytics_json_fields() {
        let model = waitlist_analytics::Model {
            waitlist_id: 1,
            signups: 10,
            views: 120,
            daily_stats: Some(r#"{"2026-08-20":4}"#.to_string()),
            utm_data: None,
            updated_at: Utc::now(),
        };

        let analytics = model_to_analytics(model);
        assert_eq!(analytics.signups, 10);
        assert!(analytics.daily_stats.is_some());
        assert!(analytics.utm_data.is_none());
    }

    #[test]
    fn test_json_text_roundtrip() {
        let value = serde_json::json!({"source": "twitter"});
        let text = json_to_text(Some(&value));
        let back = text_to_json(text);
        assert_eq!(back, Some(value));
    }
}
