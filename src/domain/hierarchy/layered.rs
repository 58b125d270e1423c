//! Inherited and local configuration layers

use serde::{Deserialize, Serialize};

use super::objective::ObjectiveRecord;
use super::policy::PolicyRule;

/// Anything ordered by priority within a layer
pub trait Prioritized {
    fn priority(&self) -> i32;
}

impl Prioritized for PolicyRule {
    fn priority(&self) -> i32 {
        PolicyRule::priority(self)
    }
}

/// Objectives carry no priority and keep their fetch order
impl Prioritized for ObjectiveRecord {
    fn priority(&self) -> i32 {
        0
    }
}

/// A record tagged with the layer it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredEntry<T> {
    #[serde(flatten)]
    pub item: T,
    pub is_inherited: bool,
}

impl<T> LayeredEntry<T> {
    pub fn inherited(item: T) -> Self {
        Self {
            item,
            is_inherited: true,
        }
    }

    pub fn local(item: T) -> Self {
        Self {
            item,
            is_inherited: false,
        }
    }
}

/// Two-layer effective configuration for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfig<T> {
    /// Records from every ancestor above the subject's own unit
    pub inherited: Vec<LayeredEntry<T>>,

    /// Records from the subject's own unit, project and (objectives) the subject
    pub local: Vec<LayeredEntry<T>>,
}

impl<T> Default for EffectiveConfig<T> {
    fn default() -> Self {
        Self {
            inherited: Vec::new(),
            local: Vec::new(),
        }
    }
}

impl<T: Prioritized> EffectiveConfig<T> {
    /// Tag both layers and sort each by descending priority, stable on ties
    pub fn from_layers(inherited: Vec<T>, local: Vec<T>) -> Self {
        let mut inherited: Vec<_> = inherited.into_iter().map(LayeredEntry::inherited).collect();
        let mut local: Vec<_> = local.into_iter().map(LayeredEntry::local).collect();

        inherited.sort_by(|a, b| b.item.priority().cmp(&a.item.priority()));
        local.sort_by(|a, b| b.item.priority().cmp(&a.item.priority()));

        Self { inherited, local }
    }

    /// Both layers merged by descending priority, inherited first on ties
    pub fn flatten(&self) -> Vec<&LayeredEntry<T>> {
        let mut merged: Vec<&LayeredEntry<T>> =
            self.inherited.iter().chain(self.local.iter()).collect();
        merged.sort_by(|a, b| compare_entries(a, b));
        merged
    }

    /// Owned variant of [`EffectiveConfig::flatten`]
    pub fn into_flat(self) -> Vec<LayeredEntry<T>> {
        let mut merged: Vec<LayeredEntry<T>> =
            self.inherited.into_iter().chain(self.local).collect();
        merged.sort_by(compare_entries);
        merged
    }
}

impl<T> EffectiveConfig<T> {
    pub fn len(&self) -> usize {
        self.inherited.len() + self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inherited.is_empty() && self.local.is_empty()
    }

    /// Inherited entries followed by local ones, each layer in its own order
    pub fn iter(&self) -> impl Iterator<Item = &LayeredEntry<T>> {
        self.inherited.iter().chain(self.local.iter())
    }
}

fn compare_entries<T: Prioritized>(a: &LayeredEntry<T>, b: &LayeredEntry<T>) -> std::cmp::Ordering {
    b.item
        .priority()
        .cmp(&a.item.priority())
        .then_with(|| b.is_inherited.cmp(&a.is_inherited))
}
