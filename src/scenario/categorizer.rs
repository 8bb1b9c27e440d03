//! Keyword categorization of free text into the four scenario axes.
//!
//! Matching is plain case-insensitive substring containment: no tokenization
//! and no word boundaries, so "down" fires inside "downtown". For each axis the
//! first label in table order with any hit wins, regardless of where in the text
//! the hit occurs.

use aho_corasick::{AhoCorasick, BuildError};
use serde::Serialize;

use super::labels::{Activity, Mood, SocialContext, TimeOfDay};

pub(crate) const TIME_KEYWORDS: &[(TimeOfDay, &[&str])] = &[
    (TimeOfDay::Morning, &["morning", "dawn", "breakfast", "early"]),
    (TimeOfDay::Afternoon, &["afternoon", "lunch", "midday", "noon"]),
    (TimeOfDay::Evening, &["evening", "sunset", "dinner", "dusk"]),
    (TimeOfDay::Night, &["night", "late", "midnight", "bedtime"]),
];

pub(crate) const ACTIVITY_KEYWORDS: &[(Activity, &[&str])] = &[
    (
        Activity::Working,
        &["working", "studying", "coding", "writing", "reading"],
    ),
    (
        Activity::Exercising,
        &["workout", "exercise", "running", "gym", "training"],
    ),
    (
        Activity::Relaxing,
        &["relaxing", "chilling", "resting", "meditating"],
    ),
    (
        Activity::Commuting,
        &["driving", "commuting", "traveling", "walking"],
    ),
    (
        Activity::Socializing,
        &["party", "gathering", "meeting", "hangout"],
    ),
];

pub(crate) const MOOD_KEYWORDS: &[(Mood, &[&str])] = &[
    (Mood::Happy, &["happy", "joyful", "excited", "cheerful"]),
    (Mood::Focused, &["focused", "concentrated", "productive"]),
    (Mood::Relaxed, &["relaxed", "calm", "peaceful", "mellow"]),
    (Mood::Energetic, &["energetic", "pumped", "motivated"]),
    (Mood::Sad, &["sad", "melancholic", "down", "blue"]),
];

pub(crate) const SOCIAL_KEYWORDS: &[(SocialContext, &[&str])] = &[
    (SocialContext::Alone, &["alone", "solo", "by myself"]),
    (SocialContext::WithFriends, &["friends", "group", "party"]),
    (SocialContext::WithFamily, &["family", "relatives", "home"]),
];

/// Labels detected in a piece of text; `None` means unspecified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioLabels {
    pub time: Option<TimeOfDay>,
    pub activity: Option<Activity>,
    pub mood: Option<Mood>,
    pub social: Option<SocialContext>,
}

impl ScenarioLabels {
    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        self.time.is_none() && self.activity.is_none() && self.mood.is_none() && self.social.is_none()
    }
}

/// One automaton over all keywords of an axis.
///
/// Patterns are inserted in label order, so the rank of a pattern's label is
/// monotonic in its pattern id.
#[derive(Debug)]
struct AxisMatcher<L: Copy + 'static> {
    automaton: AhoCorasick,
    pattern_labels: Vec<(usize, L)>,
}

impl<L: Copy + 'static> AxisMatcher<L> {
    fn new(table: &'static [(L, &'static [&'static str])]) -> Result<Self, BuildError> {
        let mut patterns = Vec::new();
        let mut pattern_labels = Vec::new();
        for (rank, (label, keywords)) in table.iter().enumerate() {
            for keyword in *keywords {
                patterns.push(*keyword);
                pattern_labels.push((rank, *label));
            }
        }
        let automaton = AhoCorasick::new(patterns)?;
        Ok(Self {
            automaton,
            pattern_labels,
        })
    }

    /// `text` must already be lower-cased.
    fn first_label(&self, text: &str) -> Option<L> {
        self.automaton
            .find_overlapping_iter(text)
            .map(|hit| self.pattern_labels[hit.pattern().as_usize()])
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, label)| label)
    }
}

/// Rule-based classifier over the static keyword tables.
#[derive(Debug)]
pub struct TextCategorizer {
    time: AxisMatcher<TimeOfDay>,
    activity: AxisMatcher<Activity>,
    mood: AxisMatcher<Mood>,
    social: AxisMatcher<SocialContext>,
}

impl TextCategorizer {
    /// Compiles the keyword automata.
    ///
    /// # Errors
    /// Returns the automaton build error; the static tables are small, so this
    /// only fails if aho-corasick refuses the pattern set outright.
    pub fn new() -> Result<Self, BuildError> {
        Ok(Self {
            time: AxisMatcher::new(TIME_KEYWORDS)?,
            activity: AxisMatcher::new(ACTIVITY_KEYWORDS)?,
            mood: AxisMatcher::new(MOOD_KEYWORDS)?,
            social: AxisMatcher::new(SOCIAL_KEYWORDS)?,
        })
    }

    #[must_use]
    pub fn classify(&self, text: &str) -> ScenarioLabels {
        let lowered = text.to_lowercase();
        self.classify_lowered(&lowered)
    }

    pub(crate) fn classify_lowered(&self, lowered: &str) -> ScenarioLabels {
        ScenarioLabels {
            time: self.time.first_label(lowered),
            activity: self.activity.first_label(lowered),
            mood: self.mood.first_label(lowered),
            social: self.social.first_label(lowered),
        }
    }
}
