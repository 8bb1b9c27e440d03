//! Scenario understanding: keyword labels, archetypes and range resolution.

pub mod archetype;
pub mod categorizer;
pub mod labels;
pub(crate) mod profiles;
pub mod resolver;

pub use archetype::{ARCHETYPE_COUNT, Archetype, ArchetypeError, ArchetypeKey, ArchetypeTable};
pub use categorizer::{ScenarioLabels, TextCategorizer};
pub use labels::{Activity, Mood, SocialContext, TimeOfDay, UnknownLabel};
pub use resolver::{
    ResolutionTrace, ResolverSettings, ScenarioFeatures, ScenarioResolver, SimilarArchetype,
};
