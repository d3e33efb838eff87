//! Payload builders and doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lodge_core::{AggregateId, NotificationId, PaymentId, ReservationId, RestrictionId, UserId};
use lodge_events::types::{
    BlackoutPeriod, CancelReservationPayload, DailyRate, MembershipPeriod, NewPropertyPayload,
    NewReservationPayload, NewRestrictionPayload, NewUserPayload, NewVersionPayload,
    NotificationReadPayload, RestrictionRule, UpdateBalancePayload, UpdateMembershipStatusPayload,
};
use lodge_events::{CacheBackend, CacheError, Consolidator, EventPayload, SqliteEventLog, VersionCache};
use lodge_rollups::{AggregateStore, LoadedAggregate};
use lodge_settings::CacheSettings;

mockall::mock! {
    pub Backend {}
    impl CacheBackend for Backend {
        fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>, CacheError>;
        fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
        fn delete(&self, key: &str) -> Result<(), CacheError>;
    }
}

/// A cache whose backend rejects every call.
pub fn unreachable_cache() -> Arc<VersionCache> {
    let mut backend = MockBackend::new();
    backend
        .expect_get_multi()
        .returning(|_| Err(CacheError::Backend("connection refused".into())));
    backend
        .expect_set()
        .returning(|_, _, _| Err(CacheError::Backend("connection refused".into())));
    backend
        .expect_delete()
        .returning(|_| Err(CacheError::Backend("connection refused".into())));
    Arc::new(VersionCache::new(Arc::new(backend), &CacheSettings::default()))
}

/// In-memory `SQLite` store with the given consolidation policy.
pub fn store_with(consolidator: Consolidator) -> AggregateStore {
    let cache = Arc::new(VersionCache::in_memory());
    let log = SqliteEventLog::in_memory(Arc::clone(&cache)).unwrap();
    AggregateStore::new(Arc::new(log), cache, consolidator)
}

pub fn seed(property_name: &str) -> Vec<EventPayload> {
    vec![
        NewVersionPayload { version: 2 }.into(),
        NewPropertyPayload {
            property_name: property_name.into(),
            member_rate: 100,
            create_date_time: "2026-01-01T00:00:00Z".into(),
            ..Default::default()
        }
        .into(),
    ]
}

/// A fresh aggregate `id` seeded at version 1.
pub fn created(store: &AggregateStore, id: &str) -> LoadedAggregate {
    store
        .create_aggregate(&AggregateId::from(id), &seed("Ridge Lodge"))
        .unwrap()
}

/// Commit one event on top of `agg`.
pub fn apply(store: &AggregateStore, agg: &LoadedAggregate, event: EventPayload) -> LoadedAggregate {
    store.commit(agg.id(), agg.version(), &[event]).unwrap()
}

pub fn new_user(for_version: i64, user: &str) -> EventPayload {
    NewUserPayload {
        for_version,
        user_id: UserId::from(user),
        nickname: user.to_uppercase(),
        email_id: format!("{user}@example.com"),
        ..Default::default()
    }
    .into()
}

pub fn reserve(for_version: i64, reservation: &str, user: &str, nightly: &[i64]) -> EventPayload {
    NewReservationPayload {
        for_version,
        reservation_id: ReservationId::from(reservation),
        reserved_for_user_id: UserId::from(user),
        start_date: "2026-07-01".into(),
        end_date: "2026-07-04".into(),
        member: true,
        rate: nightly
            .iter()
            .enumerate()
            .map(|(i, amount)| DailyRate {
                date: format!("2026-07-{:02}", i + 1),
                amount: *amount,
            })
            .collect(),
        create_date_time: "2026-06-01T00:00:00Z".into(),
        author_user_id: UserId::from(user),
        ..Default::default()
    }
    .into()
}

pub fn cancel(for_version: i64, reservation: &str, user: &str) -> EventPayload {
    CancelReservationPayload {
        for_version,
        reservation_id: ReservationId::from(reservation),
        reserved_for_user_id: UserId::from(user),
        create_date_time: "2026-06-02T00:00:00Z".into(),
        author_user_id: UserId::from(user),
        ..Default::default()
    }
    .into()
}

pub fn balance(for_version: i64, user: &str, amount: i64, increase: bool) -> EventPayload {
    UpdateBalancePayload {
        for_version,
        payment_id: PaymentId::from(format!("pay-{for_version}")),
        update_for_user_id: UserId::from(user),
        amount,
        increase,
        create_date_time: "2026-06-03T00:00:00Z".into(),
        ..Default::default()
    }
    .into()
}

pub fn membership(for_version: i64, restriction: &str, amount: i64) -> EventPayload {
    NewRestrictionPayload {
        for_version,
        restriction_id: RestrictionId::from(restriction),
        rule: RestrictionRule::Membership(MembershipPeriod {
            pre_pay_start_date: "2026-09-01".into(),
            in_date: "2026-11-15".into(),
            out_date: "2027-04-15".into(),
            grace_period_out_date: "2026-12-01".into(),
            amount,
        }),
        description: "Winter".into(),
        create_date_time: "2026-08-01T00:00:00Z".into(),
        author_user_id: UserId::from("admin"),
    }
    .into()
}

pub fn blackout(for_version: i64, restriction: &str) -> EventPayload {
    NewRestrictionPayload {
        for_version,
        restriction_id: RestrictionId::from(restriction),
        rule: RestrictionRule::Blackout(BlackoutPeriod {
            start_date: "2026-12-24".into(),
            end_date: "2026-12-26".into(),
        }),
        description: "Holidays".into(),
        create_date_time: "2026-08-01T00:00:00Z".into(),
        author_user_id: UserId::from("admin"),
    }
    .into()
}

pub fn membership_status(
    for_version: i64,
    restriction: &str,
    user: &str,
    purchase: bool,
) -> EventPayload {
    UpdateMembershipStatusPayload {
        for_version,
        update_for_user_id: UserId::from(user),
        restriction_id: RestrictionId::from(restriction),
        purchase,
        create_date_time: "2026-09-02T00:00:00Z".into(),
        author_user_id: UserId::from(user),
        ..Default::default()
    }
    .into()
}

pub fn read(for_version: i64, notification: &str, user: &str) -> EventPayload {
    NotificationReadPayload {
        for_version,
        notification_id: NotificationId::from(notification),
        create_date_time: "2026-06-05T00:00:00Z".into(),
        author_user_id: UserId::from(user),
    }
    .into()
}
