//! Hand-authored feature ranges per axis label.

use crate::features::{AudioFeature::*, RangeTable, range};

use super::labels::{Activity, Mood, SocialContext, TimeOfDay};

impl Mood {
    #[must_use]
    pub fn feature_ranges(self) -> RangeTable {
        match self {
            Mood::Happy => const {
                &[
                    (Valence, range(0.7, 0.9)),
                    (Energy, range(0.6, 0.8)),
                    (Danceability, range(0.6, 0.8)),
                ]
            },
            Mood::Focused => const {
                &[
                    (Instrumentalness, range(0.6, 0.9)),
                    (Energy, range(0.4, 0.6)),
                    (Speechiness, range(0.0, 0.3)),
                ]
            },
            Mood::Relaxed => const {
                &[
                    (Energy, range(0.2, 0.4)),
                    (Acousticness, range(0.6, 0.9)),
                    (Instrumentalness, range(0.4, 0.7)),
                ]
            },
            Mood::Energetic => const {
                &[
                    (Energy, range(0.8, 1.0)),
                    (Tempo, range(120.0, 140.0)),
                    (Valence, range(0.6, 0.8)),
                ]
            },
            Mood::Sad => const {
                &[
                    (Valence, range(0.1, 0.3)),
                    (Energy, range(0.2, 0.4)),
                    (Tempo, range(60.0, 90.0)),
                ]
            },
        }
    }
}

impl Activity {
    #[must_use]
    pub fn feature_ranges(self) -> RangeTable {
        match self {
            Activity::Working => const {
                &[
                    (Instrumentalness, range(0.6, 0.9)),
                    (Speechiness, range(0.0, 0.3)),
                    (Energy, range(0.4, 0.6)),
                ]
            },
            Activity::Exercising => const {
                &[
                    (Energy, range(0.8, 1.0)),
                    (Tempo, range(120.0, 140.0)),
                    (Danceability, range(0.6, 0.8)),
                ]
            },
            Activity::Relaxing => const {
                &[
                    (Energy, range(0.2, 0.4)),
                    (Acousticness, range(0.6, 0.9)),
                    (Instrumentalness, range(0.4, 0.7)),
                ]
            },
            Activity::Commuting => const {
                &[
                    (Energy, range(0.5, 0.7)),
                    (Danceability, range(0.5, 0.7)),
                    (Valence, range(0.5, 0.7)),
                ]
            },
            Activity::Socializing => const {
                &[
                    (Danceability, range(0.7, 0.9)),
                    (Energy, range(0.7, 0.9)),
                    (Valence, range(0.7, 0.9)),
                ]
            },
        }
    }
}

impl TimeOfDay {
    #[must_use]
    pub fn feature_ranges(self) -> RangeTable {
        match self {
            TimeOfDay::Morning => const {
                &[
                    (Energy, range(0.5, 0.7)),
                    (Valence, range(0.5, 0.7)),
                    (Tempo, range(90.0, 120.0)),
                ]
            },
            TimeOfDay::Afternoon => const {
                &[
                    (Energy, range(0.6, 0.8)),
                    (Valence, range(0.5, 0.7)),
                    (Tempo, range(100.0, 130.0)),
                ]
            },
            TimeOfDay::Evening => const {
                &[
                    (Energy, range(0.4, 0.6)),
                    (Acousticness, range(0.5, 0.8)),
                    (Tempo, range(80.0, 110.0)),
                ]
            },
            TimeOfDay::Night => const {
                &[
                    (Energy, range(0.3, 0.5)),
                    (Acousticness, range(0.6, 0.9)),
                    (Tempo, range(70.0, 100.0)),
                ]
            },
        }
    }
}

impl SocialContext {
    #[must_use]
    pub fn feature_ranges(self) -> RangeTable {
        match self {
            SocialContext::Alone => const {
                &[
                    (Acousticness, range(0.6, 0.9)),
                    (Instrumentalness, range(0.5, 0.8)),
                    (Energy, range(0.3, 0.5)),
                ]
            },
            SocialContext::WithFriends => const {
                &[
                    (Danceability, range(0.7, 0.9)),
                    (Energy, range(0.7, 0.9)),
                    (Valence, range(0.7, 0.9)),
                ]
            },
            SocialContext::WithFamily => const {
                &[
                    (Acousticness, range(0.5, 0.8)),
                    (Valence, range(0.6, 0.8)),
                    (Energy, range(0.4, 0.6)),
                ]
            },
        }
    }
}
