//! 认证端点的请求频率限制
//!
//! 按「端点 + 客户端 IP」计数，窗口内超过上限返回 429。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue, RETRY_AFTER},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode};

// 端点:IP -> 窗口内请求数
static REQUEST_COUNTS: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(60))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    endpoint: &'static str,
    max_requests: u32,
    window_secs: u64,
}

impl RateLimit {
    pub fn per_ip(endpoint: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            endpoint,
            max_requests,
            window_secs,
        }
    }

    /// 登录：5 次/分钟
    pub fn login() -> Self {
        Self::per_ip("login", 5, 60)
    }

    /// 注册：3 次/分钟
    pub fn register() -> Self {
        Self::per_ip("register", 3, 60)
    }

    /// 刷新令牌：10 次/分钟
    pub fn refresh_token() -> Self {
        Self::per_ip("refresh", 10, 60)
    }
}

/// 客户端 IP：连接信息优先，其次 X-Forwarded-For 第一项，再次 X-Real-IP
fn client_ip(req: &ServiceRequest) -> String {
    let from_connection = req
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string);

    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string());

    let real_ip = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string());

    [from_connection.clone(), forwarded, real_ip]
        .into_iter()
        .flatten()
        .find(|ip| is_valid_ip(ip))
        .or(from_connection)
        .unwrap_or_else(|| "unknown".to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    HttpResponse::TooManyRequests()
        .insert_header((RETRY_AFTER, retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let RateLimit {
            endpoint,
            max_requests,
            window_secs,
        } = self.limit.clone();

        Box::pin(async move {
            let key = format!("{}:{}", endpoint, client_ip(&req));
            let current_count = REQUEST_COUNTS.get(&key).await.unwrap_or(0);

            if current_count >= max_requests {
                warn!(
                    "Rate limit exceeded for {} ({}/{})",
                    key, current_count, max_requests
                );
                let response = too_many_requests(window_secs);
                return Ok(req.into_response(response.map_into_right_body()));
            }

            REQUEST_COUNTS.insert(key, current_count + 1).await;
            let remaining = max_requests.saturating_sub(current_count + 1);

            let mut res = srv.call(req).await?;
            let headers = res.headers_mut();
            headers.insert(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(max_requests),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(remaining),
            );
            Ok(res.map_into_left_body())
        })
    }
}
