//! Identity-level abuse-control rules.
//!
//! The login attempt guard and the password-reset throttle share one record
//! shape, keyed by `(tenant, normalized identity)` and a purpose. The rules in
//! this module are pure: stores call `apply_*` inside their atomic upsert and
//! services call `evaluate` on whatever the store returned.

use chrono::{DateTime, TimeDelta, Utc};
use rosterhub_core::{AppError, AppResult, TenantId};

/// What a guard record counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardPurpose {
    /// Failed password logins.
    Login,
    /// Password-reset requests.
    Reset,
}

impl GuardPurpose {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Reset => "reset",
        }
    }

    /// Parses a storage string.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "login" => Ok(Self::Login),
            "reset" => Ok(Self::Reset),
            _ => Err(AppError::Validation(format!(
                "unknown guard purpose '{value}'"
            ))),
        }
    }
}

/// Canonical form of a login identity: trimmed and lower-cased.
///
/// `Test@X.com` and `test@x.com` must hit the same counter, otherwise an
/// attacker gets a fresh budget per casing variant.
#[must_use]
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// Storage key of a guard record: `<tenant_id>:<normalized identity>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuardKey(String);

impl GuardKey {
    /// Builds the key for an identity inside a tenant.
    pub fn new(tenant_id: &TenantId, identity: &str) -> AppResult<Self> {
        let identity = normalize_identity(identity);
        if identity.is_empty() {
            return Err(AppError::Validation(
                "identity must not be empty".to_owned(),
            ));
        }

        Ok(Self(format!("{tenant_id}:{identity}")))
    }

    /// Returns the full key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the tenant part of the key. Safe to log.
    #[must_use]
    pub fn tenant_part(&self) -> &str {
        self.0.split_once(':').map_or("", |(tenant, _)| tenant)
    }
}

/// Persisted counter state for one `(key, purpose)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRecord {
    /// Attempts counted in the current window.
    pub attempts: u32,
    /// Login lock expiry, if a lock has been set.
    pub locked_until: Option<DateTime<Utc>>,
    /// Reset window end, if a window is open.
    pub window_end: Option<DateTime<Utc>>,
    /// First attempt of the current window.
    pub created_at: DateTime<Utc>,
}

/// How long a record without a lock or window is kept after its first attempt.
pub const GUARD_RETENTION_HOURS: i64 = 24;

impl GuardRecord {
    /// Whether a cleanup pass may drop the record at `now`.
    ///
    /// Locked and windowed records go once their deadline passes. Login
    /// failures that never reached a lock go after [`GUARD_RETENTION_HOURS`].
    #[must_use]
    pub fn is_purgeable(&self, now: DateTime<Utc>) -> bool {
        match self.locked_until.or(self.window_end) {
            Some(until) => until <= now,
            None => self.created_at <= now - TimeDelta::hours(GUARD_RETENTION_HOURS),
        }
    }
}

/// Rounds a positive remaining duration up to whole units of `unit_seconds`.
fn ceil_units(remaining: TimeDelta, unit_seconds: i64) -> u64 {
    let millis = remaining.num_milliseconds().max(0);
    let unit_millis = unit_seconds.saturating_mul(1000).max(1);
    u64::try_from((millis + unit_millis - 1) / unit_millis).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Login attempt guard
// ---------------------------------------------------------------------------

/// Lockout policy for failed logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttemptPolicy {
    /// Failures that trigger a lock.
    pub max_attempts: u32,
    /// How long a lock lasts.
    pub lockout: TimeDelta,
}

impl Default for LoginAttemptPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: TimeDelta::minutes(15),
        }
    }
}

/// Where an identity sits in the `Clear → Warned(n) → Locked` machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAttemptState {
    /// No record.
    Clear,
    /// Some failures counted, no lock yet.
    Warned {
        /// Failures counted so far.
        attempts: u32,
    },
    /// Locked until the given instant.
    Locked {
        /// Lock expiry.
        until: DateTime<Utc>,
    },
    /// A lock existed but has passed; the record should be deleted.
    Expired,
}

/// Answer of a login attempt check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttemptStatus {
    /// Whether a password comparison may be attempted.
    pub allowed: bool,
    /// Failures left before a lock.
    pub remaining_attempts: u32,
    /// Seconds until the lock expires; zero when not locked.
    pub locked_for_seconds: u64,
}

impl LoginAttemptPolicy {
    /// Classifies a stored record at `now`.
    #[must_use]
    pub fn evaluate(&self, record: Option<&GuardRecord>, now: DateTime<Utc>) -> LoginAttemptState {
        let Some(record) = record else {
            return LoginAttemptState::Clear;
        };

        match record.locked_until {
            Some(until) if now < until => LoginAttemptState::Locked { until },
            Some(_) => LoginAttemptState::Expired,
            None => LoginAttemptState::Warned {
                attempts: record.attempts,
            },
        }
    }

    /// Converts a state into the status reported to callers.
    #[must_use]
    pub fn status(&self, state: LoginAttemptState, now: DateTime<Utc>) -> LoginAttemptStatus {
        match state {
            LoginAttemptState::Clear | LoginAttemptState::Expired => self.full_budget(),
            LoginAttemptState::Warned { attempts } => {
                let remaining_attempts = self.max_attempts.saturating_sub(attempts);
                LoginAttemptStatus {
                    allowed: remaining_attempts > 0,
                    remaining_attempts,
                    locked_for_seconds: 0,
                }
            }
            LoginAttemptState::Locked { until } => LoginAttemptStatus {
                allowed: false,
                remaining_attempts: 0,
                locked_for_seconds: ceil_units(until - now, 1).max(1),
            },
        }
    }

    /// Status of an identity with no record.
    #[must_use]
    pub fn full_budget(&self) -> LoginAttemptStatus {
        LoginAttemptStatus {
            allowed: true,
            remaining_attempts: self.max_attempts,
            locked_for_seconds: 0,
        }
    }

    /// Computes the record after one more failed login.
    ///
    /// An active lock is left untouched so a locked identity never gets its
    /// lock extended or its counter bumped. An expired lock restarts the count.
    #[must_use]
    pub fn apply_failure(&self, record: Option<&GuardRecord>, now: DateTime<Utc>) -> GuardRecord {
        let (attempts, created_at) = match record {
            Some(existing) => match existing.locked_until {
                Some(until) if now < until => return existing.clone(),
                Some(_) => (1, now),
                None => (existing.attempts.saturating_add(1), existing.created_at),
            },
            None => (1, now),
        };

        GuardRecord {
            attempts,
            locked_until: (attempts >= self.max_attempts).then(|| now + self.lockout),
            window_end: None,
            created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Password-reset throttle
// ---------------------------------------------------------------------------

/// Rolling-window cap on password-reset requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetThrottlePolicy {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length, counted from the first request.
    pub window: TimeDelta,
}

impl Default for ResetThrottlePolicy {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window: TimeDelta::minutes(60),
        }
    }
}

/// Classification of a reset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetThrottleState {
    /// No record.
    Fresh,
    /// Window open with budget left.
    Open {
        /// Requests counted so far.
        attempts: u32,
    },
    /// Window open and budget used up.
    Throttled {
        /// When the window closes.
        window_end: DateTime<Utc>,
    },
    /// Window has closed; the record should be deleted.
    Expired,
}

/// Answer of a reset throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetThrottleStatus {
    /// Whether another reset request may be issued.
    pub allowed: bool,
    /// Requests left in the window.
    pub remaining: u32,
    /// Minutes until the window closes; zero when allowed.
    pub retry_after_minutes: u64,
}

impl ResetThrottlePolicy {
    /// Classifies a stored record at `now`.
    #[must_use]
    pub fn evaluate(&self, record: Option<&GuardRecord>, now: DateTime<Utc>) -> ResetThrottleState {
        let Some(record) = record else {
            return ResetThrottleState::Fresh;
        };

        match record.window_end {
            Some(window_end) if now < window_end => {
                if record.attempts >= self.max_requests {
                    ResetThrottleState::Throttled { window_end }
                } else {
                    ResetThrottleState::Open {
                        attempts: record.attempts,
                    }
                }
            }
            _ => ResetThrottleState::Expired,
        }
    }

    /// Converts a state into the status reported to callers.
    #[must_use]
    pub fn status(&self, state: ResetThrottleState, now: DateTime<Utc>) -> ResetThrottleStatus {
        match state {
            ResetThrottleState::Fresh | ResetThrottleState::Expired => self.full_budget(),
            ResetThrottleState::Open { attempts } => ResetThrottleStatus {
                allowed: true,
                remaining: self.max_requests.saturating_sub(attempts),
                retry_after_minutes: 0,
            },
            ResetThrottleState::Throttled { window_end } => ResetThrottleStatus {
                allowed: false,
                remaining: 0,
                retry_after_minutes: ceil_units(window_end - now, 60).max(1),
            },
        }
    }

    /// Status of an identity with no record.
    #[must_use]
    pub fn full_budget(&self) -> ResetThrottleStatus {
        ResetThrottleStatus {
            allowed: true,
            remaining: self.max_requests,
            retry_after_minutes: 0,
        }
    }

    /// Computes the record after one more reset request.
    #[must_use]
    pub fn apply_request(&self, record: Option<&GuardRecord>, now: DateTime<Utc>) -> GuardRecord {
        match record {
            Some(existing) if existing.window_end.is_some_and(|window_end| now < window_end) => {
                GuardRecord {
                    attempts: existing.attempts.saturating_add(1),
                    ..existing.clone()
                }
            }
            _ => GuardRecord {
                attempts: 1,
                locked_until: None,
                window_end: Some(now + self.window),
                created_at: now,
            },
        }
    }
}
