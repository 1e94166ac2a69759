//! Element tree CRUD by idShort path
//!
//! All functions operate on the root container of one entity. Paths address
//! elements by idShort, with `[n]` index segments allowed below a Submodel
//! Element List. The empty path addresses the root container itself.
//!
//! Nodes carry no parent pointer; parent relations are recovered by walking
//! from the root along the path.

use serde_json::Value;

use super::path::{validate_id_short, IdShortPath, PathSegment};
use super::value;
use crate::errors::{Result, TwinError};
use crate::model::{ElementContainer, ElementValue, ModelType, SubmodelElement};

/// What a path resolves to
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// The root container (empty path)
    Root(&'a ElementContainer),
    /// An element somewhere in the tree
    Element(&'a SubmodelElement),
}

impl<'a> Node<'a> {
    /// The element, if this is not the root
    pub fn element(&self) -> Option<&'a SubmodelElement> {
        match self {
            Node::Root(_) => None,
            Node::Element(e) => Some(e),
        }
    }

    /// The children this node can hold, if it is a container
    pub fn container(&self) -> Option<&'a ElementContainer> {
        match self {
            Node::Root(c) => Some(c),
            Node::Element(e) => e.children(),
        }
    }
}

fn not_found(path: &IdShortPath) -> TwinError {
    TwinError::ElementNotFound {
        path: path.to_string(),
    }
}

fn is_list(element: Option<&SubmodelElement>) -> bool {
    matches!(element.map(|e| &e.value), Some(ElementValue::List { .. }))
}

fn lookup<'a>(
    container: &'a ElementContainer,
    segment: &PathSegment,
    in_list: bool,
) -> Option<&'a SubmodelElement> {
    match segment {
        PathSegment::IdShort(id) => container.get(id),
        PathSegment::Index(i) if in_list => container.get_index(*i),
        PathSegment::Index(_) => None,
    }
}

fn lookup_mut<'a>(
    container: &'a mut ElementContainer,
    segment: &PathSegment,
    in_list: bool,
) -> Option<&'a mut SubmodelElement> {
    match segment {
        PathSegment::IdShort(id) => container.get_mut(id),
        PathSegment::Index(i) if in_list => container.get_index_mut(*i),
        PathSegment::Index(_) => None,
    }
}

/// Resolve a path to the root container or an element
///
/// # Errors
/// * `ElementNotFound` - a segment is missing or descends into a non-container
pub fn resolve<'a>(root: &'a ElementContainer, path: &IdShortPath) -> Result<Node<'a>> {
    let mut current: Option<&'a SubmodelElement> = None;
    for segment in path.segments() {
        let container = match current {
            None => root,
            Some(el) => el.children().ok_or_else(|| not_found(path))?,
        };
        let next = lookup(container, segment, is_list(current)).ok_or_else(|| not_found(path))?;
        current = Some(next);
    }

    Ok(match current {
        None => Node::Root(root),
        Some(el) => Node::Element(el),
    })
}

/// Resolve a path that must address an element
///
/// # Errors
/// * `InvalidPath` - the path is empty
/// * `ElementNotFound` - nothing at the path
pub fn resolve_element<'a>(
    root: &'a ElementContainer,
    path: &IdShortPath,
) -> Result<&'a SubmodelElement> {
    match resolve(root, path)? {
        Node::Element(el) => Ok(el),
        Node::Root(_) => Err(root_is_not_an_element()),
    }
}

/// Resolve a path that must address something holding elements
///
/// # Errors
/// * `ElementNotFound` - nothing at the path
/// * `ContainerNotFound` - the element cannot hold children
pub fn resolve_container<'a>(
    root: &'a ElementContainer,
    path: &IdShortPath,
) -> Result<&'a ElementContainer> {
    resolve(root, path)?
        .container()
        .ok_or_else(|| TwinError::ContainerNotFound {
            path: path.to_string(),
        })
}

fn root_is_not_an_element() -> TwinError {
    TwinError::InvalidPath {
        path: String::new(),
        reason: "the empty path addresses the root container, not an element".to_string(),
    }
}

fn element_mut<'a>(
    root: &'a mut ElementContainer,
    path: &IdShortPath,
) -> Result<&'a mut SubmodelElement> {
    let (first, rest) = path
        .segments()
        .split_first()
        .ok_or_else(root_is_not_an_element)?;

    let mut current = lookup_mut(root, first, false).ok_or_else(|| not_found(path))?;
    for segment in rest {
        let in_list = matches!(current.value, ElementValue::List { .. });
        let children = match current.children_mut() {
            Some(children) => children,
            None => return Err(not_found(path)),
        };
        current = lookup_mut(children, segment, in_list).ok_or_else(|| not_found(path))?;
    }
    Ok(current)
}

fn container_mut<'a>(
    root: &'a mut ElementContainer,
    path: &IdShortPath,
) -> Result<&'a mut ElementContainer> {
    if path.is_root() {
        return Ok(root);
    }
    element_mut(root, path)?
        .children_mut()
        .ok_or_else(|| TwinError::ContainerNotFound {
            path: path.to_string(),
        })
}

/// Add a new element under `parent_path`
///
/// # Errors
/// * `InvalidIdShort` - the element's idShort cannot be addressed by a path
/// * `ElementNotFound` / `ContainerNotFound` - the parent does not resolve to a container
/// * `DuplicateIdShort` - a sibling with the same idShort exists
/// * `InvalidValue` - the parent is a List of a different element type
pub fn create_element<'a>(
    root: &'a mut ElementContainer,
    parent_path: &IdShortPath,
    element: SubmodelElement,
) -> Result<&'a SubmodelElement> {
    validate_id_short(&element.id_short)?;

    if let Node::Element(parent) = resolve(root, parent_path)? {
        if let ElementValue::List {
            type_value_list_element,
            ..
        } = &parent.value
        {
            if *type_value_list_element != element.model_type() {
                return Err(TwinError::InvalidValue {
                    path: parent_path.to_string(),
                    reason: format!(
                        "list holds {} elements, got {}",
                        type_value_list_element,
                        element.model_type()
                    ),
                });
            }
        }
    }

    let container = container_mut(root, parent_path)?;
    if container.contains(&element.id_short) {
        return Err(TwinError::DuplicateIdShort {
            parent_path: parent_path.to_string(),
            id_short: element.id_short,
        });
    }

    let id_short = element.id_short.clone();
    container.insert(element);
    container.get(&id_short).ok_or_else(|| TwinError::Internal {
        message: format!("element '{}' vanished after insert", id_short),
    })
}

/// Replace the element at `path` wholesale, keeping its idShort and position
///
/// An empty idShort on the replacement adopts the stored one.
///
/// # Errors
/// * `ElementNotFound` - nothing at the path
/// * `IdentityChange` - the replacement carries a different idShort
pub fn update_element<'a>(
    root: &'a mut ElementContainer,
    path: &IdShortPath,
    mut element: SubmodelElement,
) -> Result<&'a SubmodelElement> {
    let target = element_mut(root, path)?;
    if element.id_short.is_empty() {
        element.id_short = target.id_short.clone();
    } else if element.id_short != target.id_short {
        return Err(TwinError::IdentityChange {
            path: path.to_string(),
            id_short: element.id_short,
        });
    }
    *target = element;
    Ok(target)
}

/// Create the element under `parent_path` if absent, otherwise replace it
///
/// Applying the same element twice leaves the tree as applying it once.
///
/// # Errors
/// Same as [`create_element`] and [`update_element`].
pub fn create_or_update_element<'a>(
    root: &'a mut ElementContainer,
    parent_path: &IdShortPath,
    element: SubmodelElement,
) -> Result<&'a SubmodelElement> {
    let exists = resolve_container(root, parent_path)?.contains(&element.id_short);
    if exists {
        let path = parent_path.child(element.id_short.clone());
        update_element(root, &path, element)
    } else {
        create_element(root, parent_path, element)
    }
}

/// Remove and return the element at `path`
///
/// # Errors
/// * `InvalidPath` - the path is empty
/// * `ElementNotFound` - nothing at the path
pub fn delete_element(root: &mut ElementContainer, path: &IdShortPath) -> Result<SubmodelElement> {
    let (parent_path, last) = path.split_last().ok_or_else(root_is_not_an_element)?;
    let in_list = is_list(resolve(root, &parent_path).map_err(|_| not_found(path))?.element());

    let container = container_mut(root, &parent_path).map_err(|_| not_found(path))?;
    let removed = match last {
        PathSegment::IdShort(id) => container.remove(id),
        PathSegment::Index(i) if in_list => container.remove_index(*i),
        PathSegment::Index(_) => None,
    };
    removed.ok_or_else(|| not_found(path))
}

/// Value-only read of the element at `path`
///
/// # Errors
/// * `ElementNotFound` - nothing at the path
/// * `Unsupported` - the element has no value-only form
pub fn element_value(root: &ElementContainer, path: &IdShortPath) -> Result<Value> {
    let element = resolve_element(root, path)?;
    value::element_value(element, &path.to_string())
}

/// Value-only update of the element at `path`
///
/// # Errors
/// * `ElementNotFound` - nothing at the path
/// * `InvalidValue` / `CoercionFailed` - the value does not fit the element
/// * `Unsupported` - the element has no value-only form
pub fn update_element_value(
    root: &mut ElementContainer,
    path: &IdShortPath,
    new_value: &Value,
) -> Result<()> {
    let element = element_mut(root, path)?;
    value::apply_value(element, new_value, &path.to_string())
}

/// Model type of the element directly holding the element at `path`
///
/// `None` when the element sits in the root container.
///
/// # Errors
/// * `InvalidPath` - the path is empty
/// * `ElementNotFound` - nothing at the path
pub fn parent_model_type(root: &ElementContainer, path: &IdShortPath) -> Result<Option<ModelType>> {
    resolve_element(root, path)?;
    let (parent_path, _) = path.split_last().ok_or_else(root_is_not_an_element)?;
    Ok(resolve(root, &parent_path)?
        .element()
        .map(SubmodelElement::model_type))
}

/// Every element path in pre-order
///
/// A Property whose parent is a Collection is listed with an empty path.
pub fn path_notation(root: &ElementContainer) -> Vec<String> {
    let mut out = Vec::new();
    collect_paths(root, &IdShortPath::root(), None, &mut out);
    out
}

fn collect_paths(
    container: &ElementContainer,
    prefix: &IdShortPath,
    owner: Option<&SubmodelElement>,
    out: &mut Vec<String>,
) {
    let owner_type = owner.map(SubmodelElement::model_type);
    for (i, element) in container.iter().enumerate() {
        let path = match owner_type {
            Some(ModelType::SubmodelElementList) => prefix.index(i),
            _ => prefix.child(element.id_short.clone()),
        };

        if owner_type == Some(ModelType::SubmodelElementCollection)
            && element.model_type() == ModelType::Property
        {
            out.push(String::new());
        } else {
            out.push(path.to_string());
        }

        if let Some(children) = element.children() {
            collect_paths(children, &path, Some(element), out);
        }
    }
}
