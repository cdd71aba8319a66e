//! Identifier types for mobs, reports, and spawn points.
//!
//! Reports get a time-ordered UUID v7 so the store keeps them in submission
//! order. Mobs and spawn points are identified by the short string codes used
//! in the static catalog.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::Rank;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a submitted kill report.
    ReportId
}

/// Catalog code identifying a single mob.
///
/// The second character encodes the rank bucket the mob's status lives in:
/// `2` is S rank, `1` is A rank, and `3` is FATE. Any other code is not a
/// valid tracked mob.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MobId(pub String);

impl MobId {
    /// Wrap a catalog code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Return the raw code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the rank bucket from the second character of the code.
    ///
    /// Returns `None` when the code is too short or the character does not
    /// map to a known bucket.
    pub fn rank(&self) -> Option<Rank> {
        match self.0.chars().nth(1)? {
            '2' => Some(Rank::S),
            '1' => Some(Rank::A),
            '3' => Some(Rank::F),
            _ => None,
        }
    }
}

impl core::fmt::Display for MobId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MobId {
    fn from(code: &str) -> Self {
        Self(code.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_encoded_in_second_character() {
        assert_eq!(MobId::from("62061").rank(), Some(Rank::S));
        assert_eq!(MobId::from("41032").rank(), Some(Rank::A));
        assert_eq!(MobId::from("53007").rank(), Some(Rank::F));
    }

    #[test]
    fn unknown_or_short_codes_have_no_rank() {
        assert_eq!(MobId::from("69999").rank(), None);
        assert_eq!(MobId::from("6").rank(), None);
        assert_eq!(MobId::from("").rank(), None);
    }

    #[test]
    fn mob_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&MobId::from("62061")).ok();
        assert_eq!(json.as_deref(), Some("\"62061\""));
    }

    #[test]
    fn report_id_display_matches_uuid() {
        let id = ReportId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
        assert_ne!(id.into_inner(), Uuid::nil());
    }
}
