//! Waitlist management service
//!
//! Provides unified business logic for waitlist operations, shared between
//! the public signup API and the admin dashboard API.

use std::sync::Arc;

use tracing::info;

use crate::analytics::global::get_view_tracker;
use crate::config::get_config;
use crate::errors::{Result, WaitlisterError};
use crate::services::import_validation::{
    ImportRowError, ImportSignupRaw, validate_import_rows,
};
use crate::storage::{
    EntryDraft, EntryStatus, NewSignup, SeaOrmStorage, Waitlist, WaitlistAnalytics, WaitlistEntry,
};
use crate::utils::email::{normalize_email, validate_email};
use crate::utils::{generate_random_code, is_valid_slug, slugify};

/// 默认分页大小
const DEFAULT_PAGE_SIZE: u64 = 20;
/// 分页大小上限
const MAX_PAGE_SIZE: u64 = 100;
/// slug 冲突时追加随机后缀的尝试次数
const MAX_SLUG_ATTEMPTS: u32 = 5;

// ============ Request/Response DTOs ============

/// Request to create a waitlist
#[derive(Debug, Clone)]
pub struct CreateWaitlistRequest {
    pub name: String,
    /// Slug (optional, derived from name if not provided)
    pub slug: Option<String>,
}

/// Public join request
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub email: String,
    pub name: String,
    /// Referral code of the entry that referred this signup
    pub referral_source: Option<String>,
}

/// Admin subscriber-add request
#[derive(Debug, Clone)]
pub struct AddSubscriberRequest {
    pub email: String,
    pub name: Option<String>,
    pub custom_data: Option<serde_json::Value>,
}

/// Position snapshot returned by join / check_status
#[derive(Debug, Clone)]
pub struct SignupView {
    pub position: i64,
    pub total_count: u64,
    pub referral_link: String,
}

/// Waitlist with its entry count, for the dashboard overview
#[derive(Debug, Clone)]
pub struct WaitlistOverview {
    pub waitlist: Waitlist,
    pub entry_count: u64,
}

/// Waitlist detail view
#[derive(Debug, Clone)]
pub struct WaitlistDetail {
    pub waitlist: Waitlist,
    pub analytics: Option<WaitlistAnalytics>,
    pub entry_count: u64,
}

/// Public landing-page info
#[derive(Debug, Clone)]
pub struct PublicWaitlistView {
    pub name: String,
    pub total_count: u64,
}

/// Failed import row, reported back to the caller
#[derive(Debug, Clone)]
pub struct FailedImportRow {
    pub row_num: Option<usize>,
    pub email: String,
    pub reason: String,
}

impl From<ImportRowError> for FailedImportRow {
    fn from(e: ImportRowError) -> Self {
        FailedImportRow {
            row_num: e.row_num,
            email: e.email,
            reason: e.error.message().to_string(),
        }
    }
}

/// Result of a bulk import
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// 有效行数（= created + skipped）
    pub total_processed: usize,
    pub total_created: usize,
    pub skipped: usize,
    pub failed_rows: Vec<FailedImportRow>,
}

// ============ WaitlistService Implementation ============

/// Service for waitlist operations
///
/// This service encapsulates all business logic for signup-ledger
/// operations, ensuring consistent behavior across the public and
/// admin HTTP interfaces.
pub struct WaitlistService {
    storage: Arc<SeaOrmStorage>,
}

impl WaitlistService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 规范化分页参数：page >= 1，limit 在 1..=100，默认 20
    fn clamp_pagination(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }

    /// 用配置的 base_url 拼出引荐链接
    fn build_referral_link(referral_code: &str) -> String {
        let config = get_config();
        format!(
            "{}/waitlist?ref={}",
            config.app.base_url.trim_end_matches('/'),
            referral_code
        )
    }

    /// 规范化并校验邮箱
    fn normalize_and_validate_email(raw: &str) -> Result<String> {
        let email = normalize_email(raw);
        validate_email(&email)
            .map_err(|e| WaitlisterError::validation(format!("Invalid email: {}", e)))?;
        Ok(email)
    }

    async fn require_waitlist_by_slug(&self, slug: &str) -> Result<Waitlist> {
        self.storage
            .get_waitlist_by_slug(slug)
            .await?
            .ok_or_else(|| WaitlisterError::not_found(format!("waitlist 不存在: {}", slug)))
    }

    pub async fn require_waitlist(&self, id: i64) -> Result<Waitlist> {
        self.storage
            .get_waitlist(id)
            .await?
            .ok_or_else(|| WaitlisterError::not_found(format!("waitlist 不存在: {}", id)))
    }

    // ============ Dashboard Operations ============

    /// Create a new waitlist
    pub async fn create_waitlist(&self, req: CreateWaitlistRequest) -> Result<Waitlist> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(WaitlisterError::validation("名称不能为空"));
        }

        let slug = match req.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(given) => {
                if !is_valid_slug(given) {
                    return Err(WaitlisterError::validation(format!(
                        "非法 slug: '{}'，只允许小写字母、数字和中划线",
                        given
                    )));
                }
                given.to_string()
            }
            None => self.generate_unique_slug(&name).await?,
        };

        let waitlist = self.storage.create_waitlist(&name, &slug).await?;
        info!("WaitlistService: created waitlist '{}' ({})", slug, waitlist.id);
        Ok(waitlist)
    }

    /// 从名称派生 slug，冲突时追加随机后缀
    async fn generate_unique_slug(&self, name: &str) -> Result<String> {
        let base = slugify(name);
        if base.is_empty() {
            return Err(WaitlisterError::validation(format!(
                "无法从名称生成 slug: '{}'",
                name
            )));
        }

        if self.storage.get_waitlist_by_slug(&base).await?.is_none() {
            return Ok(base);
        }

        for _ in 0..MAX_SLUG_ATTEMPTS {
            let candidate = format!("{}-{}", base, generate_random_code(4).to_lowercase());
            if self.storage.get_waitlist_by_slug(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(WaitlisterError::duplicate_slug(format!(
            "slug 冲突无法解决: {}",
            base
        )))
    }

    /// List waitlists with entry counts (counts may be up to 30s stale)
    pub async fn list_waitlists(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<(Vec<WaitlistOverview>, u64, u64, u64)> {
        let (page, limit) = Self::clamp_pagination(page, limit);
        let (waitlists, total) = self.storage.load_waitlists_page(page, limit).await?;

        let ids: Vec<i64> = waitlists.iter().map(|w| w.id).collect();
        let counts = self.storage.count_entries_grouped(&ids).await?;

        let overviews = waitlists
            .into_iter()
            .map(|waitlist| {
                let entry_count = counts.get(&waitlist.id).copied().unwrap_or(0);
                WaitlistOverview {
                    waitlist,
                    entry_count,
                }
            })
            .collect();

        Ok((overviews, total, page, limit))
    }

    /// Waitlist detail with live count and the analytics row
    pub async fn get_waitlist(&self, id: i64) -> Result<WaitlistDetail> {
        let waitlist = self.require_waitlist(id).await?;
        let entry_count = self.storage.count_entries(id).await?;
        let analytics = self.storage.get_analytics(id).await?;

        Ok(WaitlistDetail {
            waitlist,
            analytics,
            entry_count,
        })
    }

    // ============ Public Operations ============

    /// Landing-page bootstrap info; buffers one page view
    pub async fn get_public_waitlist(&self, slug: &str) -> Result<PublicWaitlistView> {
        let waitlist = self.require_waitlist_by_slug(slug).await?;
        let total_count = self.storage.count_entries(waitlist.id).await?;

        // 浏览计数走缓冲，不阻塞也不影响本次请求
        if let Some(tracker) = get_view_tracker() {
            tracker.increment(waitlist.id);
        }

        Ok(PublicWaitlistView {
            name: waitlist.name,
            total_count,
        })
    }

    /// Public join: assign the next position and record the referral
    pub async fn join(&self, slug: &str, req: JoinRequest) -> Result<SignupView> {
        let waitlist = self.require_waitlist_by_slug(slug).await?;

        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(WaitlisterError::validation("姓名不能为空"));
        }
        let email = Self::normalize_and_validate_email(&req.email)?;

        let referral_source = req
            .referral_source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let draft = EntryDraft {
            email,
            name: Some(name),
            referral_source,
            status: EntryStatus::Pending,
            custom_data: None,
        };

        let (entry, total_count) = self.storage.insert_entry(waitlist.id, draft).await?;
        info!(
            "WaitlistService: join '{}' -> position {} (waitlist {})",
            entry.email, entry.position, waitlist.id
        );

        Ok(SignupView {
            position: entry.position,
            total_count,
            referral_link: Self::build_referral_link(&entry.referral_code),
        })
    }

    /// Public status check: the position assigned at creation, never recomputed
    pub async fn check_status(&self, slug: &str, email: &str) -> Result<SignupView> {
        let waitlist = self.require_waitlist_by_slug(slug).await?;

        if email.trim().is_empty() {
            return Err(WaitlisterError::validation("邮箱不能为空"));
        }
        let email = normalize_email(email);

        let entry = self
            .storage
            .find_entry_by_email(waitlist.id, &email)
            .await?
            .ok_or_else(|| WaitlisterError::not_found(format!("该邮箱未报名: {}", email)))?;

        let total_count = self.storage.count_entries(waitlist.id).await?;

        Ok(SignupView {
            position: entry.position,
            total_count,
            referral_link: Self::build_referral_link(&entry.referral_code),
        })
    }

    // ============ Subscriber Operations ============

    /// Admin add: entry lands as verified
    pub async fn add_subscriber(
        &self,
        waitlist_id: i64,
        req: AddSubscriberRequest,
    ) -> Result<WaitlistEntry> {
        self.require_waitlist(waitlist_id).await?;

        let email = Self::normalize_and_validate_email(&req.email)?;
        let name = req
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let draft = EntryDraft {
            email,
            name,
            referral_source: None,
            status: EntryStatus::Verified,
            custom_data: req.custom_data,
        };

        let (entry, _) = self.storage.insert_entry(waitlist_id, draft).await?;
        info!(
            "WaitlistService: added subscriber '{}' at position {} (waitlist {})",
            entry.email, entry.position, waitlist_id
        );
        Ok(entry)
    }

    /// Paginated subscriber list, ordered by position
    pub async fn list_signups(
        &self,
        waitlist_id: i64,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<(Vec<WaitlistEntry>, u64, u64, u64)> {
        self.require_waitlist(waitlist_id).await?;

        let (page, limit) = Self::clamp_pagination(page, limit);
        let (entries, total) = self
            .storage
            .load_entries_page(waitlist_id, page, limit)
            .await?;

        Ok((entries, total, page, limit))
    }

    /// Bulk import of pre-parsed rows; one transaction, all-or-nothing
    pub async fn bulk_import(
        &self,
        waitlist_id: i64,
        rows: Vec<ImportSignupRaw>,
    ) -> Result<ImportSummary> {
        self.require_waitlist(waitlist_id).await?;

        let (valid, row_errors) = validate_import_rows(rows);
        if valid.is_empty() {
            return Err(WaitlisterError::invalid_import(
                "导入文件中没有可用的行",
            ));
        }

        let total_processed = valid.len();
        let signups: Vec<NewSignup> = valid
            .into_iter()
            .map(|item| NewSignup {
                email: item.email,
                name: item.name,
            })
            .collect();

        let outcome = self.storage.bulk_insert_entries(waitlist_id, signups).await?;
        info!(
            "WaitlistService: imported {} rows into waitlist {} ({} skipped, {} failed)",
            outcome.created,
            waitlist_id,
            outcome.skipped,
            row_errors.len()
        );

        Ok(ImportSummary {
            total_processed,
            total_created: outcome.created,
            skipped: outcome.skipped,
            failed_rows: row_errors.into_iter().map(FailedImportRow::from).collect(),
        })
    }

    /// Forward-only status transition
    pub async fn promote_subscriber(
        &self,
        waitlist_id: i64,
        entry_id: i64,
        status: &str,
    ) -> Result<WaitlistEntry> {
        let new_status = status
            .parse::<EntryStatus>()
            .map_err(|_| WaitlisterError::validation(format!("未知状态: '{}'", status)))?;

        let entry = self
            .storage
            .update_entry_status(waitlist_id, entry_id, new_status)
            .await?;
        info!(
            "WaitlistService: entry {} -> {} (waitlist {})",
            entry_id, new_status, waitlist_id
        );
        Ok(entry)
    }

    /// One page of entries for the CSV export stream
    pub async fn export_chunk(
        &self,
        waitlist_id: i64,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<WaitlistEntry>> {
        self.storage.load_entries_chunk(waitlist_id, offset, limit).await
    }
}
