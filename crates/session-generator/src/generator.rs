//! Main generator for producing session records.

use crate::generators::activity::generate_activity;
use crate::generators::identifiers::{generate_session_id, generate_user_id, generate_uuid_v4, user_id};
use crate::generators::timestamp::generate_trailing_timestamp;
use chrono::{DateTime, Utc};
use hpk_core::{TenantCatalog, TenantProfile, UserSession};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Length of the trailing window session timestamps fall into.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Error type for generator operations.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Tenant not found in catalog
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    /// User number outside the tenant's range
    #[error("User number {user_number} is outside of {tenant}'s range {min}..={max}")]
    UserOutOfRange {
        tenant: String,
        user_number: u32,
        min: u32,
        max: u32,
    },
}

/// Generator that produces synthetic session records.
///
/// Records do not depend on one another; the only state carried between
/// calls is the RNG. Seeding the generator makes a run reproducible for a
/// fixed clock (see [`generate_at`](Self::generate_at)).
pub struct SessionGenerator {
    /// Tenants and their cardinality
    catalog: TenantCatalog,
    /// Random number generator
    rng: StdRng,
    /// Trailing window for timestamps, in days
    window_days: u32,
}

impl SessionGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new(catalog: TenantCatalog) -> Self {
        Self {
            catalog,
            rng: StdRng::from_entropy(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Create a generator with a fixed seed.
    pub fn with_seed(catalog: TenantCatalog, seed: u64) -> Self {
        Self {
            catalog,
            rng: StdRng::seed_from_u64(seed),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Change the timestamp window.
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    /// Get a reference to the catalog.
    pub fn catalog(&self) -> &TenantCatalog {
        &self.catalog
    }

    /// Generate one session stamped relative to the current time.
    pub fn generate(&mut self) -> UserSession {
        self.generate_at(Utc::now())
    }

    /// Generate one session stamped relative to `now`.
    pub fn generate_at(&mut self, now: DateTime<Utc>) -> UserSession {
        let tenant = self.catalog.choose(&mut self.rng).clone();
        let user_id = generate_user_id(&mut self.rng, &tenant);
        self.session_for(&tenant, user_id, now)
    }

    /// Generate `count` sessions lazily.
    pub fn sessions(&mut self, count: u64) -> SessionIterator<'_> {
        SessionIterator {
            generator: self,
            remaining: count,
        }
    }

    /// Generate the full session history of one user.
    ///
    /// Produces `sessions_per_user` records that share the tenant and user
    /// segments, which is what the tenant + user query pattern reads back.
    pub fn user_activity(
        &mut self,
        tenant: &str,
        user_number: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserSession>, GeneratorError> {
        let profile = self
            .catalog
            .get(tenant)
            .ok_or_else(|| GeneratorError::TenantNotFound(tenant.to_string()))?
            .clone();

        if !profile.contains_user(user_number) {
            return Err(GeneratorError::UserOutOfRange {
                tenant: profile.name.clone(),
                user_number,
                min: profile.user_count_min,
                max: profile.user_count_max,
            });
        }

        let sessions = (0..profile.sessions_per_user)
            .map(|_| self.session_for(&profile, user_id(user_number), now))
            .collect();

        Ok(sessions)
    }

    fn session_for(
        &mut self,
        tenant: &TenantProfile,
        user_id: String,
        now: DateTime<Utc>,
    ) -> UserSession {
        let id = generate_uuid_v4(&mut self.rng).to_string();
        let session_id = generate_session_id(&mut self.rng);
        let activity = generate_activity(&mut self.rng).to_string();
        let timestamp = generate_trailing_timestamp(&mut self.rng, now, self.window_days);

        UserSession {
            id,
            tenant_id: tenant.name.clone(),
            user_id,
            session_id,
            activity,
            timestamp,
        }
    }
}

/// Iterator that lazily generates sessions.
pub struct SessionIterator<'a> {
    generator: &'a mut SessionGenerator,
    remaining: u64,
}

impl Iterator for SessionIterator<'_> {
    type Item = UserSession;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;
        Some(self.generator.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SessionIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::identifiers::parse_user_number;
    use chrono::{Duration, TimeZone};
    use hpk_core::{TenantProfile, ACTIVITIES};
    use std::collections::HashSet;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generated_user_in_tenant_range() {
        let mut generator = SessionGenerator::with_seed(TenantCatalog::builtin(), 42);

        for _ in 0..2000 {
            let session = generator.generate_at(fixed_now());
            let tenant = generator.catalog().get(&session.tenant_id).unwrap();
            let n = parse_user_number(&session.user_id).unwrap();
            assert!(
                tenant.contains_user(n),
                "{} outside {}..={} for {}",
                session.user_id,
                tenant.user_count_min,
                tenant.user_count_max,
                tenant.name
            );
        }
    }

    #[test]
    fn test_generated_timestamp_in_window() {
        let mut generator = SessionGenerator::with_seed(TenantCatalog::builtin(), 1);
        let now = fixed_now();

        for _ in 0..2000 {
            let session = generator.generate_at(now);
            assert!(session.timestamp <= now);
            assert!(session.timestamp >= now - Duration::days(30));
        }
    }

    #[test]
    fn test_generate_uses_wall_clock() {
        let mut generator = SessionGenerator::new(TenantCatalog::builtin());
        let before = Utc::now();
        let session = generator.generate();
        let after = Utc::now();

        assert!(session.timestamp <= after);
        assert!(session.timestamp >= before - Duration::days(30));
    }

    #[test]
    fn test_generated_fields_well_formed() {
        let mut generator = SessionGenerator::with_seed(TenantCatalog::builtin(), 3);
        let session = generator.generate_at(fixed_now());

        assert!(uuid::Uuid::parse_str(&session.id).is_ok());
        assert!(ACTIVITIES.contains(&session.activity.as_str()));
        assert!(session.partition_key().unwrap().is_full());
    }

    #[test]
    fn test_deterministic_generation() {
        let mut gen1 = SessionGenerator::with_seed(TenantCatalog::builtin(), 42);
        let mut gen2 = SessionGenerator::with_seed(TenantCatalog::builtin(), 42);

        for _ in 0..10 {
            assert_eq!(gen1.generate_at(fixed_now()), gen2.generate_at(fixed_now()));
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let mut generator = SessionGenerator::with_seed(TenantCatalog::builtin(), 9);
        let ids: HashSet<String> = generator.sessions(500).map(|s| s.id).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_sessions_iterator() {
        let mut generator = SessionGenerator::with_seed(TenantCatalog::builtin(), 42);
        let iter = generator.sessions(10);
        assert_eq!(iter.len(), 10);
        assert_eq!(iter.count(), 10);
    }

    #[test]
    fn test_sessions_size_hint_saturates() {
        let mut generator = SessionGenerator::with_seed(TenantCatalog::builtin(), 42);
        let mut iter = generator.sessions(u64::MAX);
        let expected = usize::try_from(u64::MAX).unwrap_or(usize::MAX);
        assert_eq!(iter.size_hint(), (expected, Some(expected)));

        iter.next();
        let expected = usize::try_from(u64::MAX - 1).unwrap_or(usize::MAX);
        assert_eq!(iter.size_hint(), (expected, Some(expected)));
    }

    #[test]
    fn test_user_activity() {
        let mut generator = SessionGenerator::with_seed(TenantCatalog::builtin(), 42);
        let sessions = generator
            .user_activity("LocalShops-SME", 42, fixed_now())
            .unwrap();

        assert_eq!(sessions.len(), 5);
        for session in &sessions {
            assert_eq!(session.tenant_id, "LocalShops-SME");
            assert_eq!(session.user_id, "user-42");
        }
    }

    #[test]
    fn test_user_activity_errors() {
        let mut generator = SessionGenerator::with_seed(TenantCatalog::builtin(), 42);

        assert!(matches!(
            generator.user_activity("Initech", 1, fixed_now()),
            Err(GeneratorError::TenantNotFound(_))
        ));
        assert!(matches!(
            generator.user_activity("LocalShops-SME", 51, fixed_now()),
            Err(GeneratorError::UserOutOfRange { user_number: 51, .. })
        ));
    }

    #[test]
    fn test_single_tenant_catalog() {
        let catalog = TenantCatalog::new(vec![TenantProfile::new("Acme", 7, 7, 1)]).unwrap();
        let mut generator = SessionGenerator::with_seed(catalog, 42).with_window_days(0);
        let session = generator.generate_at(fixed_now());

        assert_eq!(session.tenant_id, "Acme");
        assert_eq!(session.user_id, "user-7");
        assert_eq!(session.timestamp, fixed_now());
    }
}
