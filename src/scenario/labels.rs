//! Categorical labels for the four scenario axes.
//!
//! Each axis is a closed enum; the `unspecified` sentinel is modelled as `None`
//! wherever a label is optional.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rendering of an absent label.
pub const UNSPECIFIED: &str = "unspecified";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {axis} label: {value}")]
pub struct UnknownLabel {
    pub axis: &'static str,
    pub value: String,
}

macro_rules! axis_label {
    (
        $(#[$meta:meta])*
        $name:ident, $axis:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every label in table order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const AXIS: &'static str = $axis;

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let normalized = raw.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|label| label.as_str() == normalized)
                    .ok_or_else(|| UnknownLabel {
                        axis: $axis,
                        value: raw.to_string(),
                    })
            }
        }
    };
}

axis_label! {
    /// Time of day.
    TimeOfDay, "time" {
        Morning => "morning",
        Afternoon => "afternoon",
        Evening => "evening",
        Night => "night",
    }
}

axis_label! {
    Activity, "activity" {
        Working => "working",
        Exercising => "exercising",
        Relaxing => "relaxing",
        Commuting => "commuting",
        Socializing => "socializing",
    }
}

axis_label! {
    Mood, "mood" {
        Happy => "happy",
        Focused => "focused",
        Relaxed => "relaxed",
        Energetic => "energetic",
        Sad => "sad",
    }
}

axis_label! {
    /// Who the listener is with.
    SocialContext, "social" {
        Alone => "alone",
        WithFriends => "with_friends",
        WithFamily => "with_family",
    }
}

/// Renders an optional label, using `unspecified` for `None`.
#[must_use]
pub fn label_or_unspecified<L: fmt::Display>(label: Option<L>) -> String {
    label.map_or_else(|| UNSPECIFIED.to_string(), |label| label.to_string())
}
