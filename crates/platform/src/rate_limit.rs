//! Sliding-window rate limiter with per-tenant overrides.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use hivebase_core::config::RateLimitSettings;
use serde::{Deserialize, Serialize};

/// Per-key window counters.
#[derive(Debug, Clone)]
struct WindowEntry {
    second_count: u32,
    second_start: DateTime<Utc>,
    minute_count: u32,
    minute_start: DateTime<Utc>,
}

/// Result of a rate-limit check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    pub limit: u32,
}

/// In-memory limiter: a one-second and a one-minute window per key, with
/// burst headroom on the per-second window.
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    default_settings: RateLimitSettings,
    tenant_settings: DashMap<String, RateLimitSettings>,
}

impl RateLimiter {
    pub fn new(default_settings: RateLimitSettings) -> Self {
        Self {
            entries: DashMap::new(),
            default_settings,
            tenant_settings: DashMap::new(),
        }
    }

    /// Override the limits for one tenant.
    pub fn set_tenant_settings(&self, tenant: &str, settings: RateLimitSettings) {
        self.tenant_settings.insert(tenant.to_string(), settings);
    }

    /// Check and consume one request for `key` (caller identity) under
    /// `tenant`'s limits.
    pub fn check(&self, key: &str, tenant: &str) -> RateLimitDecision {
        let settings = self
            .tenant_settings
            .get(tenant)
            .map(|s| s.value().clone())
            .unwrap_or_else(|| self.default_settings.clone());

        let now = Utc::now();
        let second_limit = settings.requests_per_second + settings.burst_size;
        let mut entry = self.entries.entry(key.to_string()).or_insert(WindowEntry {
            second_count: 0,
            second_start: now,
            minute_count: 0,
            minute_start: now,
        });

        if now - entry.second_start >= Duration::seconds(1) {
            entry.second_count = 0;
            entry.second_start = now;
        }
        if now - entry.minute_start >= Duration::seconds(60) {
            entry.minute_count = 0;
            entry.minute_start = now;
        }

        let second_exceeded = entry.second_count >= second_limit;
        let minute_exceeded = entry.minute_count >= settings.requests_per_minute;

        if second_exceeded || minute_exceeded {
            let reset_at = if minute_exceeded {
                entry.minute_start + Duration::seconds(60)
            } else {
                entry.second_start + Duration::seconds(1)
            };
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at,
                limit: if minute_exceeded {
                    settings.requests_per_minute
                } else {
                    second_limit
                },
            };
        }

        entry.second_count += 1;
        entry.minute_count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: settings
                .requests_per_minute
                .saturating_sub(entry.minute_count),
            reset_at: entry.minute_start + Duration::seconds(60),
            limit: settings.requests_per_minute,
        }
    }

    /// Drop window entries that have been idle for at least `idle_secs`;
    /// returns how many were removed. Without this the per-key map grows
    /// one entry per distinct caller forever.
    pub fn sweep_stale(&self, idle_secs: u64) -> usize {
        let cutoff = Utc::now() - Duration::seconds(idle_secs as i64);
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.minute_start >= cutoff);
        before - self.entries.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(per_second: u32, per_minute: u32, burst: u32) -> RateLimitSettings {
        RateLimitSettings {
            requests_per_second: per_second,
            requests_per_minute: per_minute,
            burst_size: burst,
        }
    }

    #[test]
    fn test_second_window_with_burst() {
        let limiter = RateLimiter::new(settings(2, 1000, 1));
        // 2/sec + burst 1 = 3 allowed.
        assert!(limiter.check("ip-1", "default").allowed);
        assert!(limiter.check("ip-1", "default").allowed);
        assert!(limiter.check("ip-1", "default").allowed);
        let denied = limiter.check("ip-1", "default");
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(settings(1, 1000, 0));
        assert!(limiter.check("ip-1", "default").allowed);
        assert!(limiter.check("ip-2", "default").allowed);
    }

    #[test]
    fn test_minute_window() {
        let limiter = RateLimiter::new(settings(100, 2, 0));
        assert!(limiter.check("ip-1", "default").allowed);
        assert!(limiter.check("ip-1", "default").allowed);
        assert!(!limiter.check("ip-1", "default").allowed);
    }

    #[test]
    fn test_sweep_drops_idle_keys() {
        let limiter = RateLimiter::new(settings(10, 100, 0));
        limiter.check("ip-1", "default");
        limiter.check("ip-2", "default");
        assert_eq!(limiter.tracked_keys(), 2);

        // Nothing has been idle for two minutes yet.
        assert_eq!(limiter.sweep_stale(120), 0);
        assert_eq!(limiter.tracked_keys(), 2);

        // A zero idle threshold treats every entry as stale.
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(limiter.sweep_stale(0), 2);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_tenant_override() {
        let limiter = RateLimiter::new(settings(100, 100, 0));
        limiter.set_tenant_settings("strict", settings(100, 1, 0));

        assert!(limiter.check("ip-1", "strict").allowed);
        assert!(!limiter.check("ip-1", "strict").allowed);
        // Default tenant unaffected.
        assert!(limiter.check("ip-2", "default").allowed);
    }
}
