/// Generates `EventType`, `EventPayload`, `ALL_EVENT_TYPES`, wire-format
/// helpers and domain groups from one table, so adding a kind without a
/// wire name or payload type fails to compile.
///
/// # Sections
///
/// - **`events`**: `Variant => "wire.name" => PayloadType`
/// - **`domain_groups`**: named boolean methods over `EventType`
macro_rules! define_events {
    (
        events {
            $(
                $(#[doc = $doc:literal])*
                $variant:ident => $wire:literal => $payload_ty:ty
            ),* $(,)?
        }
        domain_groups {
            $(
                $(#[doc = $gdoc:literal])*
                $method:ident => [$($gv:ident),* $(,)?]
            ),* $(,)?
        }
    ) => {
        // ── EventType ───────────────────────────────────────────────

        /// Discriminator for every persisted event kind.
        ///
        /// Serializes to its dot-separated wire name (e.g. `"user.new"`).
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum EventType {
            $(
                $(#[doc = $doc])*
                #[serde(rename = $wire)]
                $variant,
            )*
        }

        /// All event types in definition order.
        pub const ALL_EVENT_TYPES: [EventType; { [$($wire,)*].len() }] = [
            $(EventType::$variant,)*
        ];

        impl EventType {
            /// Canonical wire name.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)*
                }
            }

            /// Wire-name prefix (e.g. `"reservation"`).
            #[must_use]
            pub fn domain(self) -> &'static str {
                let s = self.as_str();
                s.split_once('.').map_or(s, |(domain, _)| domain)
            }

            $(
                $(#[doc = $gdoc])*
                #[must_use]
                pub fn $method(self) -> bool {
                    matches!(self, $(Self::$gv)|*)
                }
            )*
        }

        impl std::fmt::Display for EventType {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for EventType {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)*
                    _ => Err(format!("unknown event type: {s}")),
                }
            }
        }

        // ── EventPayload ────────────────────────────────────────────

        /// Typed payload of one event.
        ///
        /// Adjacently tagged on the wire (`{"type": "user.new", "data": {..}}`)
        /// so readers can discriminate before decoding the body.
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "data")]
        pub enum EventPayload {
            $(
                $(#[doc = $doc])*
                #[serde(rename = $wire)]
                $variant($payload_ty),
            )*
        }

        impl EventPayload {
            /// Discriminator of this payload.
            #[must_use]
            pub fn event_type(&self) -> EventType {
                match self {
                    $(Self::$variant(_) => EventType::$variant,)*
                }
            }

            /// Version the submitting client last observed, for kinds that
            /// originate from a client request.
            #[must_use]
            pub fn for_version(&self) -> Option<i64> {
                match self {
                    $(Self::$variant(p) => EventData::for_version(p),)*
                }
            }
        }

        $(
            impl From<$payload_ty> for EventPayload {
                fn from(payload: $payload_ty) -> Self {
                    Self::$variant(payload)
                }
            }
        )*
    };
}
