use hashbrown::HashMap;
use itertools::Itertools;

use crate::dictionary::Dictionary;

/// Resolves dictionary ids to dictionaries.
pub trait DictionaryProvider {
    fn lookup(&self, id: i64) -> Option<&Dictionary>;

    /// The ids this provider can resolve, in ascending order.
    fn ids(&self) -> Vec<i64>;
}

/// A [`DictionaryProvider`] backed by a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapDictionaryProvider {
    dictionaries: HashMap<i64, Dictionary>,
}

impl MapDictionaryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dictionary` under its id, returning the dictionary it replaces.
    pub fn put(&mut self, dictionary: Dictionary) -> Option<Dictionary> {
        self.dictionaries.insert(dictionary.id(), dictionary)
    }

    pub fn remove(&mut self, id: i64) -> Option<Dictionary> {
        self.dictionaries.remove(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dictionaries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty()
    }

    /// The dictionaries, in ascending id order.
    pub fn dictionaries(&self) -> impl Iterator<Item = &Dictionary> {
        self.dictionaries
            .values()
            .sorted_by_key(|dictionary| dictionary.id())
    }
}

impl DictionaryProvider for MapDictionaryProvider {
    fn lookup(&self, id: i64) -> Option<&Dictionary> {
        self.dictionaries.get(&id)
    }

    fn ids(&self) -> Vec<i64> {
        self.dictionaries.keys().copied().sorted().collect()
    }
}

impl FromIterator<Dictionary> for MapDictionaryProvider {
    fn from_iter<T: IntoIterator<Item = Dictionary>>(iter: T) -> Self {
        let mut provider = Self::new();
        iter.into_iter().for_each(|dictionary| {
            provider.put(dictionary);
        });
        provider
    }
}
