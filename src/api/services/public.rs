//! 公开 API：landing page 信息、报名、状态查询
//!
//! 无鉴权。join 端点按客户端 IP 限流，页面信息端点会缓冲一次浏览计数。

use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError,
};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{Responder, web};
use governor::middleware::NoOpMiddleware;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

use crate::config::get_config;
use crate::errors::WaitlisterError;
use crate::services::{JoinRequest, WaitlistService};

use crate::api::services::admin::{
    ErrorCode, JoinPayload, PublicWaitlistResponse, SignupResponse, StatusPayload,
    error_from_waitlister, error_response, success_response,
};

/// 基于 IP 地址的限流 key 提取器
///
/// 策略：
/// - 默认使用连接 IP（peer_addr），无法被伪造
/// - 如果连接来自配置的可信代理，则使用 X-Forwarded-For
#[derive(Clone, Copy)]
pub struct JoinKeyExtractor;

impl KeyExtractor for JoinKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        let conn_info = req.connection_info();

        // 获取连接 IP（TCP peer address，无法伪造）
        let peer_ip = conn_info
            .peer_addr()
            .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract peer IP"))?;

        // 检查是否启用了可信代理
        let config = get_config();
        let trusted_proxies = &config.app.trusted_proxies;

        if !trusted_proxies.is_empty() && is_trusted_proxy(peer_ip, trusted_proxies) {
            // 来自可信代理，使用 X-Forwarded-For
            let real_ip = conn_info.realip_remote_addr().unwrap_or(peer_ip);
            debug!("Join rate limit key from trusted proxy: {}", real_ip);
            Ok(real_ip.to_string())
        } else {
            // 默认：使用连接 IP
            Ok(peer_ip.to_string())
        }
    }
}

/// 检查 IP 是否在可信代理列表中
fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    let Ok(ip_addr) = ip.parse::<IpAddr>() else {
        return false;
    };

    for proxy in trusted_proxies {
        if proxy.contains('/') {
            // CIDR 格式（如 "192.168.1.0/24"）
            if ip_in_cidr(&ip_addr, proxy) {
                return true;
            }
        } else {
            // 单 IP
            if let Ok(proxy_addr) = proxy.parse::<IpAddr>()
                && ip_addr == proxy_addr
            {
                return true;
            }
        }
    }
    false
}

/// CIDR 检查（简易实现）
fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u32::from_be_bytes(ip.octets());
            let net_bits = u32::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u128::from_be_bytes(ip.octets());
            let net_bits = u128::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        _ => false, // IPv4 vs IPv6 不匹配
    }
}

/// join 限流配置：每秒补充 1 个令牌，突发最多 5 次请求
///
/// 配置是进程级单例，所有 worker 共享同一份限流状态，
/// 避免每个 worker 各算各的配额。
static JOIN_GOVERNOR: Lazy<GovernorConfig<JoinKeyExtractor, NoOpMiddleware>> = Lazy::new(|| {
    GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(JoinKeyExtractor)
        .finish()
        .expect("Invalid rate limit config")
});

/// 创建 join 限流器，超限返回 HTTP 429 Too Many Requests
pub fn join_rate_limiter() -> Governor<JoinKeyExtractor, NoOpMiddleware> {
    Governor::new(&JOIN_GOVERNOR)
}

pub struct PublicService;

impl PublicService {
    /// landing page 信息，调用即缓冲一次浏览计数
    pub async fn waitlist_info(
        path: web::Path<String>,
        service: web::Data<Arc<WaitlistService>>,
    ) -> impl Responder {
        let slug = path.into_inner();
        trace!("Public API: waitlist info request - {}", slug);

        match service.get_public_waitlist(&slug).await {
            Ok(view) => success_response(PublicWaitlistResponse::from(view)),
            Err(e @ WaitlisterError::NotFound(_)) => {
                trace!("Public API: unknown waitlist - {}", slug);
                error_response(
                    StatusCode::NOT_FOUND,
                    ErrorCode::WaitlistNotFound,
                    e.message(),
                )
            }
            Err(e) => {
                error!("Public API: failed to load waitlist {} - {}", slug, e);
                error_from_waitlister(&e)
            }
        }
    }

    /// 公开报名
    pub async fn join_waitlist(
        path: web::Path<String>,
        payload: web::Json<JoinPayload>,
        service: web::Data<Arc<WaitlistService>>,
    ) -> impl Responder {
        let slug = path.into_inner();
        let payload = payload.into_inner();
        info!(
            "Public API: join request - waitlist: {}, email: {}",
            slug, payload.email
        );

        let request = JoinRequest {
            email: payload.email,
            name: payload.name,
            referral_source: payload.referral_source,
        };

        match service.join(&slug, request).await {
            Ok(view) => {
                info!(
                    "Public API: joined at position {} (waitlist {})",
                    view.position, slug
                );
                success_response(SignupResponse::from(view))
            }
            Err(e @ WaitlisterError::DuplicateEmail(_)) => {
                // 公开路径统一按 400 返回，不暴露 409 语义
                info!("Public API: duplicate join attempt on {}", slug);
                error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::EmailAlreadyJoined,
                    e.message(),
                )
            }
            Err(e) => {
                info!("Public API: join rejected on {} - {}", slug, e.message());
                error_from_waitlister(&e)
            }
        }
    }

    /// 按邮箱查询排队状态
    pub async fn check_status(
        path: web::Path<String>,
        payload: web::Json<StatusPayload>,
        service: web::Data<Arc<WaitlistService>>,
    ) -> impl Responder {
        let slug = path.into_inner();
        trace!("Public API: status request - waitlist: {}", slug);

        match service.check_status(&slug, &payload.email).await {
            Ok(view) => success_response(SignupResponse::from(view)),
            Err(e) => {
                trace!("Public API: status lookup failed on {} - {}", slug, e.message());
                error_from_waitlister(&e)
            }
        }
    }
}

/// 公开路由 `/waitlist`
///
/// join 路由包了基于 IP 的限流器。
pub fn public_routes() -> actix_web::Scope {
    web::scope("/waitlist")
        .route(
            "/{slug}/join",
            web::post()
                .to(PublicService::join_waitlist)
                .wrap(join_rate_limiter()),
        )
        .route("/{slug}/status", web::post().to(PublicService::check_status))
        .route("/{slug}", web::get().to(PublicService::waitlist_info))
        .route("/{slug}", web::head().to(PublicService::waitlist_info))
}
