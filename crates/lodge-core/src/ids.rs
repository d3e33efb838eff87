//! Branded ID newtypes.
//!
//! Aggregates and the entities projected out of them each get a distinct
//! string newtype. Fresh ids are UUID v7 so they sort by creation time;
//! ids arriving from storage or callers are wrapped as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh time-ordered id.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::generate()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id! {
    /// Identifier of an aggregate (a property and its event log).
    AggregateId
}

typed_id! {
    /// One lifetime of an aggregate id, minted on every create. Deleting and
    /// recreating an id yields a new incarnation.
    IncarnationId
}

typed_id! {
    /// Identifier of a user inside one aggregate.
    UserId
}

typed_id! {
    /// Identifier of a reservation.
    ReservationId
}

typed_id! {
    /// Identifier of a blackout or membership restriction.
    RestrictionId
}

typed_id! {
    /// Identifier of a notification.
    NotificationId
}

typed_id! {
    /// Identifier of a balance adjustment.
    PaymentId
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_uuid_v7() {
        let id = AggregateId::generate();
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn wraps_existing_value() {
        let id = ReservationId::from("res-1");
        assert_eq!(id.as_str(), "res-1");
        assert_eq!(format!("{id}"), "res-1");
        let s: String = id.into();
        assert_eq!(s, "res-1");
    }

    #[test]
    fn serializes_transparently() {
        let id = RestrictionId::from("r-9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"r-9\"");
        let back: RestrictionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
