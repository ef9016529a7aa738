// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed identifier newtypes.
//!
//! Every long-lived entity gets a 128-bit random id wrapped in its own type
//! so a `JobId` can never be passed where a `DaemonId` is expected. Ids
//! serialize as hyphenated uuid strings (the wire and storage format).

/// Define a uuid-backed newtype id with generation, parsing, and display.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            /// Generate a new random id.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Parse an id from its string form.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                uuid::Uuid::parse_str(s).map(Self)
            }

            /// Hyphenated string form.
            pub fn as_string(&self) -> String {
                self.0.to_string()
            }

            /// First 8 hex characters, for log lines.
            pub fn short(&self) -> String {
                let mut s = self.0.simple().to_string();
                s.truncate(8);
                s
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(u: uuid::Uuid) -> Self {
                Self(u)
            }
        }
    };
}

crate::define_id! {
    /// Unique identifier for a background job.
    pub struct JobId;
}

crate::define_id! {
    /// Unique identifier for a daemon instance row.
    pub struct DaemonId;
}

crate::define_id! {
    /// Unique identifier for one sync-history row.
    pub struct SyncId;
}

crate::define_id! {
    /// Unique identifier for a runner task handle.
    pub struct TaskId;
}

crate::define_id! {
    /// Unique identifier for an event-bus subscriber connection.
    pub struct SubscriberId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
