//! Storage backend tests
//!
//! Tests for SeaOrmStorage using temporary SQLite databases.

use std::sync::Once;
use std::time::Duration;

use tempfile::TempDir;

use waitlister::analytics::ViewTracker;
use waitlister::config::init_config;
use waitlister::errors::WaitlisterError;
use waitlister::storage::backend::{connect_sqlite, infer_backend_from_url, run_migrations};
use waitlister::storage::{EntryDraft, EntryStatus, NewSignup, SeaOrmStorage};

// 确保 config 只初始化一次
static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

/// 创建测试用的报名草稿
fn draft(email: &str) -> EntryDraft {
    EntryDraft {
        email: email.to_string(),
        name: Some("Tester".to_string()),
        referral_source: None,
        status: EntryStatus::Pending,
        custom_data: None,
    }
}

/// 创建带引荐来源的报名草稿
fn draft_referred(email: &str, source: &str) -> EntryDraft {
    EntryDraft {
        referral_source: Some(source.to_string()),
        ..draft(email)
    }
}

fn signup(email: &str) -> NewSignup {
    NewSignup {
        email: email.to_string(),
        name: None,
    }
}

/// 创建临时 SQLite 数据库的存储实例
async fn create_temp_storage() -> (SeaOrmStorage, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (storage, temp_dir)
}

// =============================================================================
// URL 推断测试
// =============================================================================

#[cfg(test)]
mod url_inference_tests {
    use super::*;

    #[test]
    fn test_infer_sqlite_variants() {
        assert_eq!(
            infer_backend_from_url("sqlite://data/waitlists.db").unwrap(),
            "sqlite"
        );
        assert_eq!(
            infer_backend_from_url("/var/lib/waitlister/prod.sqlite").unwrap(),
            "sqlite"
        );
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
    }

    #[test]
    fn test_infer_mysql_and_mariadb() {
        assert_eq!(
            infer_backend_from_url("mysql://root:pw@localhost/waitlists").unwrap(),
            "mysql"
        );
        // MariaDB 走 MySQL 协议
        assert_eq!(
            infer_backend_from_url("mariadb://root:pw@localhost/waitlists").unwrap(),
            "mysql"
        );
    }

    #[test]
    fn test_infer_postgres_both_schemes() {
        assert_eq!(
            infer_backend_from_url("postgres://wl@localhost/waitlists").unwrap(),
            "postgres"
        );
        assert_eq!(
            infer_backend_from_url("postgresql://wl@localhost/waitlists").unwrap(),
            "postgres"
        );
    }

    #[test]
    fn test_infer_rejects_unknown_scheme() {
        let err = infer_backend_from_url("redis://localhost").unwrap_err();
        assert!(matches!(err, WaitlisterError::DatabaseConfig(_)));

        assert!(infer_backend_from_url("not-a-url").is_err());
    }
}

// =============================================================================
// 连接和迁移测试
// =============================================================================

#[cfg(test)]
mod connection_tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_sqlite_creates_file() {
        init_test_config();

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("fresh.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let db = connect_sqlite(&db_url).await.expect("connect failed");
        run_migrations(&db).await.expect("migrations failed");

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        init_test_config();

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("twice.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let db = connect_sqlite(&db_url).await.expect("connect failed");
        run_migrations(&db).await.expect("first run failed");
        run_migrations(&db).await.expect("second run failed");
    }

    #[tokio::test]
    async fn test_storage_rejects_empty_url() {
        init_test_config();

        let err = SeaOrmStorage::new("", "sqlite").await.unwrap_err();
        assert!(matches!(err, WaitlisterError::DatabaseConfig(_)));
    }

    #[tokio::test]
    async fn test_storage_reports_backend_name() {
        let (storage, _dir) = create_temp_storage().await;
        assert_eq!(storage.backend_name(), "sqlite");
    }
}

// =============================================================================
// Waitlist CRUD 测试
// =============================================================================

#[cfg(test)]
mod waitlist_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_waitlist() {
        let (storage, _dir) = create_temp_storage().await;

        let created = storage
            .create_waitlist("Product Launch", "product-launch")
            .await
            .unwrap();
        assert!(created.id > 0);
        assert_eq!(created.slug, "product-launch");
        assert_eq!(created.name, "Product Launch");
        assert_eq!(created.entry_seq, 0);

        let by_id = storage.get_waitlist(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.slug, "product-launch");

        let by_slug = storage
            .get_waitlist_by_slug("product-launch")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.id, created.id);
    }

    #[tokio::test]
    async fn test_get_missing_waitlist() {
        let (storage, _dir) = create_temp_storage().await;

        assert!(storage.get_waitlist(424242).await.unwrap().is_none());
        assert!(
            storage
                .get_waitlist_by_slug("no-such-slug")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let (storage, _dir) = create_temp_storage().await;

        storage.create_waitlist("First", "launch").await.unwrap();
        let err = storage.create_waitlist("Second", "launch").await.unwrap_err();
        assert!(matches!(err, WaitlisterError::DuplicateSlug(_)));

        // 失败的创建不留下半行数据
        assert_eq!(storage.count_waitlists().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_waitlist_initializes_analytics() {
        let (storage, _dir) = create_temp_storage().await;

        let waitlist = storage.create_waitlist("Beta", "beta").await.unwrap();
        let analytics = storage.get_analytics(waitlist.id).await.unwrap().unwrap();

        assert_eq!(analytics.waitlist_id, waitlist.id);
        assert_eq!(analytics.signups, 0);
        assert_eq!(analytics.views, 0);
    }
}

// =============================================================================
// 单条插入测试
// =============================================================================

#[cfg(test)]
mod entry_tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_sequential_positions() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Seq", "seq").await.unwrap();

        let (first, total) = storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();
        assert_eq!(first.position, 1);
        assert_eq!(total, 1);
        assert_eq!(first.referral_code.len(), 8);
        assert_eq!(first.status, EntryStatus::Pending);

        let (second, total) = storage
            .insert_entry(waitlist.id, draft("b@example.com"))
            .await
            .unwrap();
        assert_eq!(second.position, 2);
        assert_eq!(total, 2);

        let (third, total) = storage
            .insert_entry(waitlist.id, draft("c@example.com"))
            .await
            .unwrap();
        assert_eq!(third.position, 3);
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_duplicate_email_rolls_back_position() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Dup", "dup").await.unwrap();

        storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();

        let err = storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, WaitlisterError::DuplicateEmail(_)));

        // 失败的尝试不占用序列，下一位还是 2
        let (entry, total) = storage
            .insert_entry(waitlist.id, draft("b@example.com"))
            .await
            .unwrap();
        assert_eq!(entry.position, 2);
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_referral_attribution() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Ref", "ref").await.unwrap();

        let (referrer, _) = storage
            .insert_entry(waitlist.id, draft("ada@example.com"))
            .await
            .unwrap();

        let (referred, _) = storage
            .insert_entry(
                waitlist.id,
                draft_referred("bob@example.com", &referrer.referral_code),
            )
            .await
            .unwrap();
        assert_eq!(
            referred.referral_source.as_deref(),
            Some(referrer.referral_code.as_str())
        );

        let refreshed = storage
            .find_entry_by_email(waitlist.id, "ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.referrals, 1);
    }

    #[tokio::test]
    async fn test_unknown_referral_source_is_kept_verbatim() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Ref2", "ref2").await.unwrap();

        // 不存在的引荐码：来源原样保留，没有人得到归因
        let (entry, _) = storage
            .insert_entry(waitlist.id, draft_referred("solo@example.com", "ZZZZZZZZ"))
            .await
            .unwrap();
        assert_eq!(entry.referral_source.as_deref(), Some("ZZZZZZZZ"));
        assert_eq!(entry.referrals, 0);
    }

    #[tokio::test]
    async fn test_insert_into_missing_waitlist() {
        let (storage, _dir) = create_temp_storage().await;

        let err = storage
            .insert_entry(424242, draft("ghost@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, WaitlisterError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_insert_bumps_signup_analytics() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Stats", "stats").await.unwrap();

        storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();
        storage
            .insert_entry(waitlist.id, draft("b@example.com"))
            .await
            .unwrap();

        let analytics = storage.get_analytics(waitlist.id).await.unwrap().unwrap();
        assert_eq!(analytics.signups, 2);
    }
}

// =============================================================================
// 批量导入测试
// =============================================================================

#[cfg(test)]
mod bulk_tests {
    use super::*;

    #[tokio::test]
    async fn test_bulk_insert_fresh_rows() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Bulk", "bulk").await.unwrap();

        let outcome = storage
            .bulk_insert_entries(
                waitlist.id,
                vec![
                    signup("a@example.com"),
                    signup("b@example.com"),
                    signup("c@example.com"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(outcome.created, 3);
        assert_eq!(outcome.skipped, 0);

        let (entries, total) = storage.load_entries_page(waitlist.id, 1, 10).await.unwrap();
        assert_eq!(total, 3);
        let positions: Vec<i64> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(entries.iter().all(|e| e.status == EntryStatus::Verified));
    }

    #[tokio::test]
    async fn test_bulk_skips_existing_and_in_batch_duplicates() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Skip", "skip").await.unwrap();

        storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();

        // a@ 已在库里，b@ 在文件里出现两次
        let outcome = storage
            .bulk_insert_entries(
                waitlist.id,
                vec![
                    signup("a@example.com"),
                    signup("b@example.com"),
                    signup("b@example.com"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.skipped, 2);

        let fresh = storage
            .find_entry_by_email(waitlist.id, "b@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh.position, 2);
        assert_eq!(storage.count_entries(waitlist.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_bulk_returns_unused_positions() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Seq2", "seq2").await.unwrap();

        storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();
        storage
            .bulk_insert_entries(
                waitlist.id,
                vec![
                    signup("a@example.com"),
                    signup("b@example.com"),
                    signup("b@example.com"),
                ],
            )
            .await
            .unwrap();

        // 两行被跳过，占位的区间要缩回来，下一位必须是 3
        let (entry, _) = storage
            .insert_entry(waitlist.id, draft("c@example.com"))
            .await
            .unwrap();
        assert_eq!(entry.position, 3);
    }

    #[tokio::test]
    async fn test_bulk_reimport_is_idempotent() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Twice", "twice").await.unwrap();

        let rows = vec![
            signup("a@example.com"),
            signup("b@example.com"),
            signup("c@example.com"),
        ];

        let first = storage
            .bulk_insert_entries(waitlist.id, rows.clone())
            .await
            .unwrap();
        assert_eq!(first.created, 3);

        let second = storage.bulk_insert_entries(waitlist.id, rows).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 3);

        assert_eq!(storage.count_entries(waitlist.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_bulk_empty_input() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Empty", "empty").await.unwrap();

        let outcome = storage
            .bulk_insert_entries(waitlist.id, vec![])
            .await
            .unwrap();
        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.skipped, 0);
    }

    #[tokio::test]
    async fn test_bulk_spans_multiple_chunks() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Big", "big").await.unwrap();

        // 超过单批 100 行，验证跨 chunk 的位置连续性
        let rows: Vec<NewSignup> = (0..250)
            .map(|i| signup(&format!("user{}@example.com", i)))
            .collect();

        let outcome = storage.bulk_insert_entries(waitlist.id, rows).await.unwrap();
        assert_eq!(outcome.created, 250);
        assert_eq!(outcome.skipped, 0);

        let chunk = storage.load_entries_chunk(waitlist.id, 200, 10).await.unwrap();
        let positions: Vec<i64> = chunk.iter().map(|e| e.position).collect();
        assert_eq!(positions, (201..=210).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_bulk_bumps_signup_analytics() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Stats2", "stats2").await.unwrap();

        storage
            .bulk_insert_entries(
                waitlist.id,
                vec![
                    signup("a@example.com"),
                    signup("a@example.com"),
                    signup("b@example.com"),
                ],
            )
            .await
            .unwrap();

        // 只有实际落库的行计入 signups
        let analytics = storage.get_analytics(waitlist.id).await.unwrap().unwrap();
        assert_eq!(analytics.signups, 2);
    }
}

// =============================================================================
// 状态迁移测试
// =============================================================================

#[cfg(test)]
mod status_tests {
    use super::*;

    #[tokio::test]
    async fn test_forward_transitions() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Status", "status").await.unwrap();
        let (entry, _) = storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();

        let verified = storage
            .update_entry_status(waitlist.id, entry.id, EntryStatus::Verified)
            .await
            .unwrap();
        assert_eq!(verified.status, EntryStatus::Verified);

        let active = storage
            .update_entry_status(waitlist.id, entry.id, EntryStatus::Active)
            .await
            .unwrap();
        assert_eq!(active.status, EntryStatus::Active);
    }

    #[tokio::test]
    async fn test_same_status_is_noop() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Noop", "noop").await.unwrap();
        let (entry, _) = storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();

        let unchanged = storage
            .update_entry_status(waitlist.id, entry.id, EntryStatus::Pending)
            .await
            .unwrap();
        assert_eq!(unchanged.status, EntryStatus::Pending);
    }

    #[tokio::test]
    async fn test_skipping_a_stage_rejected() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Skip2", "skip2").await.unwrap();
        let (entry, _) = storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();

        // pending -> active 必须经过 verified
        let err = storage
            .update_entry_status(waitlist.id, entry.id, EntryStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitlisterError::Validation(_)));
    }

    #[tokio::test]
    async fn test_backward_transition_rejected() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Back", "back").await.unwrap();
        let (entry, _) = storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();

        storage
            .update_entry_status(waitlist.id, entry.id, EntryStatus::Verified)
            .await
            .unwrap();

        let err = storage
            .update_entry_status(waitlist.id, entry.id, EntryStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitlisterError::Validation(_)));
    }

    #[tokio::test]
    async fn test_status_change_for_missing_entry() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Miss", "miss").await.unwrap();

        let err = storage
            .update_entry_status(waitlist.id, 999, EntryStatus::Verified)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitlisterError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_status_change_scoped_to_waitlist() {
        let (storage, _dir) = create_temp_storage().await;
        let first = storage.create_waitlist("One", "one").await.unwrap();
        let second = storage.create_waitlist("Two", "two").await.unwrap();

        let (entry, _) = storage
            .insert_entry(first.id, draft("a@example.com"))
            .await
            .unwrap();

        // 条目属于另一个 waitlist，按不存在处理
        let err = storage
            .update_entry_status(second.id, entry.id, EntryStatus::Verified)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitlisterError::NotFound(_)));
    }
}

// =============================================================================
// 查询和分页测试
// =============================================================================

#[cfg(test)]
mod query_tests {
    use super::*;

    async fn seed_entries(storage: &SeaOrmStorage, waitlist_id: i64, n: usize) {
        for i in 0..n {
            storage
                .insert_entry(waitlist_id, draft(&format!("user{}@example.com", i)))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_load_entries_page_ordering() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Page", "page").await.unwrap();
        seed_entries(&storage, waitlist.id, 5).await;

        let (entries, total) = storage.load_entries_page(waitlist.id, 2, 2).await.unwrap();
        assert_eq!(total, 5);
        let positions: Vec<i64> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_load_entries_page_beyond_range() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Far", "far").await.unwrap();
        seed_entries(&storage, waitlist.id, 3).await;

        let (entries, total) = storage.load_entries_page(waitlist.id, 99, 10).await.unwrap();
        assert_eq!(total, 3);
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_load_entries_chunk() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Chunk", "chunk").await.unwrap();
        seed_entries(&storage, waitlist.id, 5).await;

        let chunk = storage.load_entries_chunk(waitlist.id, 2, 2).await.unwrap();
        let positions: Vec<i64> = chunk.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![3, 4]);

        let tail = storage.load_entries_chunk(waitlist.id, 100, 10).await.unwrap();
        assert!(tail.is_empty());
    }

    #[tokio::test]
    async fn test_count_entries_grouped_zero_fill() {
        let (storage, _dir) = create_temp_storage().await;
        let busy = storage.create_waitlist("Busy", "busy").await.unwrap();
        let idle = storage.create_waitlist("Idle", "idle").await.unwrap();
        seed_entries(&storage, busy.id, 2).await;

        let counts = storage
            .count_entries_grouped(&[busy.id, idle.id])
            .await
            .unwrap();
        assert_eq!(counts.get(&busy.id), Some(&2));
        // 没有条目的 waitlist 也要有 0 计数
        assert_eq!(counts.get(&idle.id), Some(&0));
    }

    #[tokio::test]
    async fn test_grouped_counts_refresh_after_mutation() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Cache", "cache").await.unwrap();

        let before = storage.count_entries_grouped(&[waitlist.id]).await.unwrap();
        assert_eq!(before.get(&waitlist.id), Some(&0));

        // 第二次命中缓存，结果一致
        let cached = storage.count_entries_grouped(&[waitlist.id]).await.unwrap();
        assert_eq!(cached.get(&waitlist.id), Some(&0));

        // 写入会清缓存，计数立即可见
        storage
            .insert_entry(waitlist.id, draft("a@example.com"))
            .await
            .unwrap();
        let after = storage.count_entries_grouped(&[waitlist.id]).await.unwrap();
        assert_eq!(after.get(&waitlist.id), Some(&1));
    }

    #[tokio::test]
    async fn test_count_waitlists() {
        let (storage, _dir) = create_temp_storage().await;
        assert_eq!(storage.count_waitlists().await.unwrap(), 0);

        storage.create_waitlist("A", "a").await.unwrap();
        storage.create_waitlist("B", "b").await.unwrap();
        assert_eq!(storage.count_waitlists().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_load_waitlists_page_newest_first() {
        let (storage, _dir) = create_temp_storage().await;
        storage.create_waitlist("Older", "older").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        storage.create_waitlist("Newer", "newer").await.unwrap();

        let (waitlists, total) = storage.load_waitlists_page(1, 10).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(waitlists[0].slug, "newer");
        assert_eq!(waitlists[1].slug, "older");
    }

    #[tokio::test]
    async fn test_find_entry_lookups() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Find", "find").await.unwrap();
        let (entry, _) = storage
            .insert_entry(waitlist.id, draft("ada@example.com"))
            .await
            .unwrap();

        let by_id = storage
            .find_entry(waitlist.id, entry.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.email, "ada@example.com");

        let by_email = storage
            .find_entry_by_email(waitlist.id, "ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, entry.id);

        assert!(
            storage
                .find_entry_by_email(waitlist.id, "ghost@example.com")
                .await
                .unwrap()
                .is_none()
        );
        assert!(storage.find_entry(waitlist.id, 9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_analytics_missing_waitlist() {
        let (storage, _dir) = create_temp_storage().await;
        assert!(storage.get_analytics(424242).await.unwrap().is_none());
    }
}

// =============================================================================
// ViewSink 测试
// =============================================================================

#[cfg(test)]
mod view_sink_tests {
    use super::*;

    #[tokio::test]
    async fn test_flush_views_accumulates() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Views", "views").await.unwrap();

        let sink = storage.as_view_sink().expect("sink available");
        sink.flush_views(vec![(waitlist.id, 3)]).await.unwrap();
        sink.flush_views(vec![(waitlist.id, 2)]).await.unwrap();

        let analytics = storage.get_analytics(waitlist.id).await.unwrap().unwrap();
        assert_eq!(analytics.views, 5);
    }

    #[tokio::test]
    async fn test_flush_views_ignores_unknown_waitlist() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Known", "known").await.unwrap();

        let sink = storage.as_view_sink().expect("sink available");
        sink.flush_views(vec![(waitlist.id, 1), (987654, 10)])
            .await
            .unwrap();

        let analytics = storage.get_analytics(waitlist.id).await.unwrap().unwrap();
        assert_eq!(analytics.views, 1);
    }

    #[tokio::test]
    async fn test_view_tracker_flushes_through_sink() {
        let (storage, _dir) = create_temp_storage().await;
        let waitlist = storage.create_waitlist("Tracked", "tracked").await.unwrap();

        // 间隔放到一小时，只验证手动 flush 路径
        let tracker = ViewTracker::new(
            storage.as_view_sink().expect("sink available"),
            Duration::from_secs(3600),
            1_000_000,
        );
        tracker.increment(waitlist.id);
        tracker.increment(waitlist.id);
        tracker.increment(waitlist.id);
        tracker.flush().await;

        let analytics = storage.get_analytics(waitlist.id).await.unwrap().unwrap();
        assert_eq!(analytics.views, 3);
        assert_eq!(tracker.buffer_size(), 0);
    }
}
