use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub struct RateLimitLayer {
    limiter: RateLimiter<NotKeyed, InMemoryState, governor::clock::DefaultClock>,
}

impl RateLimitLayer {
    pub fn new(requests: u32, per_seconds: u64) -> Self {
        let quota = Quota::with_period(Duration::from_secs(per_seconds))
            .expect("rate limit period must be non-zero")
            .allow_burst(NonZeroU32::new(requests).expect("rate limit burst must be non-zero"));

        RateLimitLayer {
            limiter: RateLimiter::direct(quota),
        }
    }

    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

/// Rate limiting middleware for the write path. Expects a shared
/// limiter injected through request extensions at router build time.
pub async fn rate_limit_middleware(req: Request, next: Next) -> Result<Response, Response> {
    let Some(limiter) = req.extensions().get::<Arc<RateLimitLayer>>().cloned() else {
        // No limiter configured for this route tree
        return Ok(next.run(req).await);
    };

    if !limiter.check() {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.",
        )
            .into_response());
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_honored_then_limited() {
        let limiter = RateLimitLayer::new(2, 60);
        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());
    }
}
