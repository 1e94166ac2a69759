#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::prop;
use twinx_core::model::{AssetAdministrationShell, AssetInformation, AssetKind, PartialShell, Submodel};
use twinx_core::ExErrorKind;
use twinx_engine::{ShellServiceProvider, SubmodelServiceProvider};

fn pump_shell() -> AssetAdministrationShell {
    AssetAdministrationShell::new("urn:aas:pump", "Pump")
        .with_global_asset_id("urn:asset:pump-1")
        .with_submodel(Submodel::new("urn:sm:nameplate", "Nameplate").with_element(prop("serial", "A1")))
        .with_submodel(Submodel::new("urn:sm:ops", "Operational"))
}

#[test]
fn test_retrieve_folds_current_submodel_state() {
    let shell = ShellServiceProvider::from_shell(pump_shell()).unwrap();

    shell
        .get_submodel_provider("urn:sm:ops")
        .unwrap()
        .create_element("", prop("mode", "auto"))
        .unwrap();

    let folded = shell.retrieve().unwrap();
    assert_eq!(folded.submodels.len(), 2);
    assert_eq!(folded.submodels[0].id, "urn:sm:nameplate");
    assert!(folded.submodels[1].submodel_elements.contains("mode"));
}

#[test]
fn test_update_merges_and_upserts_submodels() {
    let shell = ShellServiceProvider::from_shell(pump_shell()).unwrap();

    shell
        .update(PartialShell {
            asset_information: Some(AssetInformation {
                asset_kind: AssetKind::Type,
                global_asset_id: None,
            }),
            submodels: Some(vec![
                Submodel::new("urn:sm:nameplate", "Nameplate").with_element(prop("serial", "B2")),
                Submodel::new("urn:sm:docs", "Documentation"),
            ]),
            ..Default::default()
        })
        .unwrap();

    let folded = shell.retrieve().unwrap();
    assert_eq!(folded.id_short, "Pump");
    assert_eq!(folded.asset_information.asset_kind, AssetKind::Type);
    let ids: Vec<_> = folded.submodels.iter().map(|sm| sm.id.as_str()).collect();
    assert_eq!(ids, vec!["urn:sm:nameplate", "urn:sm:ops", "urn:sm:docs"]);
    assert_eq!(
        shell
            .get_submodel_provider("urn:sm:nameplate")
            .unwrap()
            .retrieve_element("serial")
            .unwrap()
            .as_str(),
        Some("B2")
    );
}

#[test]
fn test_update_keeps_live_state_of_unsupplied_submodels() {
    let shell = ShellServiceProvider::from_shell(pump_shell()).unwrap();
    let ops = shell.get_submodel_provider("urn:sm:ops").unwrap();
    ops.create_element("", prop("mode", "auto")).unwrap();

    shell
        .update(PartialShell {
            submodels: Some(vec![Submodel::new("urn:sm:nameplate", "Nameplate")]),
            ..Default::default()
        })
        .unwrap();

    let folded = shell.retrieve().unwrap();
    assert!(folded.submodels[0].submodel_elements.is_empty());
    assert!(folded.submodels[1].submodel_elements.contains("mode"));
    assert!(Arc::ptr_eq(
        &ops,
        &shell.get_submodel_provider("urn:sm:ops").unwrap()
    ));
}

#[test]
fn test_rejected_update_changes_nothing() {
    let shell = ShellServiceProvider::from_shell(pump_shell()).unwrap();
    let before = shell.retrieve().unwrap();

    let err = shell
        .update(PartialShell {
            id_short: Some("Renamed".into()),
            submodels: Some(vec![Submodel::new("", "NoId")]),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(shell.retrieve().unwrap(), before);
}

#[test]
fn test_register_and_unregister_submodel_provider() {
    let shell = ShellServiceProvider::from_shell(pump_shell()).unwrap();
    let extra = Arc::new(
        SubmodelServiceProvider::from_submodel(Submodel::new("urn:sm:extra", "Extra")).unwrap(),
    );

    shell.register_submodel_provider(Arc::clone(&extra)).unwrap();
    let err = shell.register_submodel_provider(extra).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Conflict);
    assert_eq!(shell.retrieve().unwrap().submodels.len(), 3);

    shell.unregister_submodel_provider("urn:sm:nameplate").unwrap();
    let ids: Vec<_> = shell
        .retrieve()
        .unwrap()
        .submodels
        .into_iter()
        .map(|sm| sm.id)
        .collect();
    assert_eq!(ids, vec!["urn:sm:ops", "urn:sm:extra"]);

    let err = shell.unregister_submodel_provider("urn:sm:nameplate").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_retrieve_submodels_pages_by_id() {
    let mut aas = AssetAdministrationShell::new("urn:aas:big", "Big");
    for i in 0..5 {
        aas = aas.with_submodel(Submodel::new(format!("urn:sm:{}", i), format!("Sm{}", i)));
    }
    let shell = ShellServiceProvider::from_shell(aas).unwrap();

    let first = shell.retrieve_submodels(Some(2), "").unwrap();
    let second = shell.retrieve_submodels(Some(2), &first.next_cursor).unwrap();
    let third = shell.retrieve_submodels(Some(2), &second.next_cursor).unwrap();

    let seen: Vec<_> = first
        .items
        .iter()
        .chain(&second.items)
        .chain(&third.items)
        .map(|sm| sm.id.clone())
        .collect();
    assert_eq!(seen, (0..5).map(|i| format!("urn:sm:{}", i)).collect::<Vec<_>>());
    assert!(third.is_last());
}
