use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::element::SubmodelElement;
use crate::errors::TwinError;

/// Ordered idShort → element map
///
/// Insertion order is preserved and replacing an element keeps its position.
/// Serialized as a plain array of elements; duplicate idShorts are rejected
/// when deserializing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<SubmodelElement>",
    into = "Vec<SubmodelElement>"
)]
pub struct ElementContainer {
    elements: IndexMap<String, SubmodelElement>,
}

impl ElementContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id_short: &str) -> bool {
        self.elements.contains_key(id_short)
    }

    pub fn get(&self, id_short: &str) -> Option<&SubmodelElement> {
        self.elements.get(id_short)
    }

    pub fn get_mut(&mut self, id_short: &str) -> Option<&mut SubmodelElement> {
        self.elements.get_mut(id_short)
    }

    /// Element at a position (used by list index segments)
    pub fn get_index(&self, index: usize) -> Option<&SubmodelElement> {
        self.elements.get_index(index).map(|(_, e)| e)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut SubmodelElement> {
        self.elements.get_index_mut(index).map(|(_, e)| e)
    }

    /// Insert or replace by idShort, returning the replaced element
    pub fn insert(&mut self, element: SubmodelElement) -> Option<SubmodelElement> {
        self.elements.insert(element.id_short.clone(), element)
    }

    /// Remove by idShort, shifting later elements to keep order
    pub fn remove(&mut self, id_short: &str) -> Option<SubmodelElement> {
        self.elements.shift_remove(id_short)
    }

    /// Remove by position, shifting later elements to keep order
    pub fn remove_index(&mut self, index: usize) -> Option<SubmodelElement> {
        self.elements.shift_remove_index(index).map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubmodelElement> {
        self.elements.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SubmodelElement> {
        self.elements.values_mut()
    }

    pub fn id_shorts(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }
}

impl TryFrom<Vec<SubmodelElement>> for ElementContainer {
    type Error = TwinError;

    fn try_from(elements: Vec<SubmodelElement>) -> Result<Self, Self::Error> {
        let mut container = ElementContainer::new();
        for element in elements {
            if container.contains(&element.id_short) {
                return Err(TwinError::DuplicateIdShort {
                    parent_path: String::new(),
                    id_short: element.id_short,
                });
            }
            container.insert(element);
        }
        Ok(container)
    }
}

impl From<ElementContainer> for Vec<SubmodelElement> {
    fn from(container: ElementContainer) -> Self {
        container.elements.into_values().collect()
    }
}

impl FromIterator<SubmodelElement> for ElementContainer {
    /// Later elements replace earlier ones with the same idShort
    fn from_iter<I: IntoIterator<Item = SubmodelElement>>(iter: I) -> Self {
        let mut container = ElementContainer::new();
        for element in iter {
            container.insert(element);
        }
        container
    }
}

impl<'a> IntoIterator for &'a ElementContainer {
    type Item = &'a SubmodelElement;
    type IntoIter = indexmap::map::Values<'a, String, SubmodelElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.values()
    }
}
