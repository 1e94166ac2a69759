//! Field-wise merge of partial entity updates
//!
//! `merge_*` never touch their input: they build the next snapshot from the
//! stored one and the caller-supplied fields. Present fields override, absent
//! fields keep the stored value, elements and carried Submodels are upserted.
//! The entity id is never changed by a merge.

use super::element_ops::create_or_update_element;
use super::path::{validate_id_short, IdShortPath};
use crate::errors::Result;
use crate::model::{AssetAdministrationShell, PartialShell, PartialSubmodel, Submodel};

/// Next Submodel snapshot after applying `partial` over `old`
///
/// # Errors
/// * `InvalidIdShort` - a supplied idShort is not addressable
/// * any error of [`create_or_update_element`] while upserting elements
pub fn merge_submodel(old: &Submodel, partial: PartialSubmodel) -> Result<Submodel> {
    let mut next = old.clone();

    if let Some(id_short) = partial.id_short {
        validate_id_short(&id_short)?;
        next.id_short = id_short;
    }
    if let Some(category) = partial.category {
        next.category = Some(category);
    }
    if let Some(description) = partial.description {
        next.description = description;
    }
    if let Some(administration) = partial.administration {
        next.administration = Some(administration);
    }
    if let Some(kind) = partial.kind {
        next.kind = Some(kind);
    }
    if let Some(semantic_id) = partial.semantic_id {
        next.semantic_id = Some(semantic_id);
    }
    if let Some(qualifiers) = partial.qualifiers {
        next.qualifiers = qualifiers;
    }
    if let Some(elements) = partial.submodel_elements {
        let root = IdShortPath::root();
        for element in elements {
            create_or_update_element(&mut next.submodel_elements, &root, element)?;
        }
    }

    Ok(next)
}

/// Next Shell snapshot after applying `partial` over `old`
///
/// Carried Submodels are upserted by id: a supplied Submodel replaces the
/// carried one with the same id, otherwise it is appended.
///
/// # Errors
/// * `InvalidIdShort` - a supplied idShort is not addressable
pub fn merge_shell(
    old: &AssetAdministrationShell,
    partial: PartialShell,
) -> Result<AssetAdministrationShell> {
    let mut next = old.clone();

    if let Some(id_short) = partial.id_short {
        validate_id_short(&id_short)?;
        next.id_short = id_short;
    }
    if let Some(description) = partial.description {
        next.description = description;
    }
    if let Some(administration) = partial.administration {
        next.administration = Some(administration);
    }
    if let Some(derived_from) = partial.derived_from {
        next.derived_from = Some(derived_from);
    }
    if let Some(asset_information) = partial.asset_information {
        next.asset_information = asset_information;
    }
    if let Some(submodels) = partial.submodels {
        for submodel in submodels {
            match next.submodels.iter_mut().find(|sm| sm.id == submodel.id) {
                Some(slot) => *slot = submodel,
                None => next.submodels.push(submodel),
            }
        }
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TwinError;
    use crate::model::{DataTypeDefXsd, Reference, SubmodelElement};

    fn prop(id: &str, v: &str) -> SubmodelElement {
        SubmodelElement::property(id, DataTypeDefXsd::String, Some(v.to_string()))
    }

    #[test]
    fn test_absent_fields_keep_prior_values() {
        let old = Submodel::new("sm-1", "Nameplate")
            .with_semantic_id(Reference::global("urn:nameplate"))
            .with_element(prop("serial", "A1"));
        let next = merge_submodel(
            &old,
            PartialSubmodel {
                category: Some("CONSTANT".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(next.id, "sm-1");
        assert_eq!(next.id_short, "Nameplate");
        assert_eq!(next.category.as_deref(), Some("CONSTANT"));
        assert_eq!(next.semantic_id, old.semantic_id);
        assert_eq!(next.submodel_elements, old.submodel_elements);
        assert!(old.category.is_none());
    }

    #[test]
    fn test_elements_are_upserted() {
        let old = Submodel::new("sm-1", "S")
            .with_element(prop("a", "1"))
            .with_element(prop("b", "2"));
        let next = merge_submodel(
            &old,
            PartialSubmodel {
                submodel_elements: Some(vec![prop("b", "20"), prop("c", "3")]),
                ..Default::default()
            },
        )
        .unwrap();

        let ids: Vec<_> = next.submodel_elements.id_shorts().collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(next.submodel_elements.get("b").unwrap().as_str(), Some("20"));
    }

    #[test]
    fn test_invalid_id_short_rejected() {
        let old = Submodel::new("sm-1", "S");
        let err = merge_submodel(
            &old,
            PartialSubmodel {
                id_short: Some("1bad".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, TwinError::InvalidIdShort { .. }));
    }

    #[test]
    fn test_shell_submodels_upserted_by_id() {
        let old = AssetAdministrationShell::new("aas-1", "Pump")
            .with_submodel(Submodel::new("sm-1", "A"))
            .with_submodel(Submodel::new("sm-2", "B"));
        let next = merge_shell(
            &old,
            PartialShell {
                submodels: Some(vec![Submodel::new("sm-2", "B2"), Submodel::new("sm-3", "C")]),
                ..Default::default()
            },
        )
        .unwrap();

        let ids: Vec<_> = next.submodels.iter().map(|s| s.id_short.as_str()).collect();
        assert_eq!(ids, vec!["A", "B2", "C"]);
        assert_eq!(next.id_short, "Pump");
    }
}
