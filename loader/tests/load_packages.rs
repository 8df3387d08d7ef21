use loader::catalog::memory::{CatalogWrite, MemoryCatalog};
use loader::error::ErrorKind;
use loader::loader::PackageLoader;
use loader::outcome::{LoadReport, LoadWarning, WriteAction};
use loader::strategy::{ReplaceByExtraField, ReplaceByName, ResourceSeries};
use loader::types::{Group, Package, PackageState, Resource, SynonymTable};
use loader_telemetry::tracing::init_test_tracing;

fn quarterly_release(quarter: &str, department: &str) -> Package {
    Package::new(format!("spending-{quarter}"))
        .with_field("title", "Departmental spending")
        .with_extra("department", department)
        .with_resource(Resource::new(format!("Spending ref:{quarter} csv")))
}

fn spending_series() -> ResourceSeries {
    ResourceSeries::new(
        vec!["title".to_owned(), "department".to_owned()],
        "ref:",
        vec!["title".to_owned()],
        SynonymTable::from([(
            "department".to_owned(),
            vec![vec![
                "Department for Children, Schools and Families".to_owned(),
                "Department for Education".to_owned(),
            ]],
        )]),
    )
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn series_of_releases_end_up_in_one_package() {
    init_test_tracing();

    let catalog = MemoryCatalog::new();
    let loader = PackageLoader::new(catalog.clone(), spending_series());

    let summary = loader
        .load_packages(vec![
            quarterly_release("2010-Q1", "Department for Children, Schools and Families"),
            quarterly_release("2010-Q2", "Department for Education"),
            quarterly_release("2010-Q2", "Department for Education"),
        ])
        .await;

    assert!(summary.is_success());
    assert_eq!(summary.num_loaded, 3);
    assert_eq!(
        summary.package_names,
        vec!["spending-2010-Q1", "spending-2010-Q1", "spending-2010-Q1"]
    );

    let packages = catalog.packages().await;
    assert_eq!(packages.len(), 1);
    let descriptions: Vec<_> = packages[0]
        .resources
        .iter()
        .map(|resource| resource.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        vec!["Spending ref:2010-Q1 csv", "Spending ref:2010-Q2 csv"]
    );

    // The third release repeats the second one, so it is not written again.
    assert_eq!(
        catalog.writes().await,
        vec![
            CatalogWrite::PackageCreated("spending-2010-Q1".to_owned()),
            CatalogWrite::PackageReplaced("spending-2010-Q1".to_owned()),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn ambiguous_matches_fail_only_their_package() {
    init_test_tracing();

    let catalog = MemoryCatalog::new();
    catalog
        .insert_package(Package::new("census-a").with_extra("ref", "CENSUS"))
        .await;
    catalog
        .insert_package(Package::new("census-b").with_extra("ref", "CENSUS"))
        .await;
    let loader = PackageLoader::new(catalog.clone(), ReplaceByExtraField::new("ref").unwrap());

    let summary = loader
        .load_packages(vec![
            Package::new("census").with_extra("ref", "CENSUS"),
            Package::new("schools").with_extra("ref", "SCHOOLS"),
        ])
        .await;

    assert_eq!(summary.num_loaded, 1);
    assert_eq!(summary.num_errors, 1);
    assert_eq!(summary.package_names, vec!["schools"]);
    assert_eq!(summary.failures[0].package, "census");
    assert_eq!(summary.failures[0].error.kind(), ErrorKind::AmbiguousMatch);

    let report = LoadReport::from(&summary);
    assert!(report.failures[0].error.contains("census-a"));
}

#[tokio::test(flavor = "multi_thread")]
async fn deleted_packages_are_not_reused() {
    init_test_tracing();

    let catalog = MemoryCatalog::new();
    catalog
        .insert_package(
            Package::new("census")
                .with_extra("ref", "CENSUS")
                .with_state(PackageState::Inactive("deleted".to_owned())),
        )
        .await;
    let loader = PackageLoader::new(catalog.clone(), ReplaceByExtraField::new("ref").unwrap());

    let outcome = loader
        .load_package(Package::new("census").with_extra("ref", "CENSUS"))
        .await
        .unwrap();

    assert_eq!(outcome.action, WriteAction::Created);
    assert_eq!(outcome.package.name, "census_");
    assert!(matches!(
        outcome.warnings.as_slice(),
        [LoadWarning::Renamed { .. }]
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_search_index_is_bridged_by_name_probe() {
    init_test_tracing();

    let catalog = MemoryCatalog::new();
    catalog
        .insert_package(Package::new("census").with_extra("ref", "CENSUS"))
        .await;
    catalog.hide_from_search("census").await;
    let loader = PackageLoader::new(catalog.clone(), ReplaceByExtraField::new("ref").unwrap());

    let outcome = loader
        .load_package(
            Package::new("census")
                .with_extra("ref", "CENSUS")
                .with_field("notes", "second edition"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.action, WriteAction::Updated);
    assert_eq!(outcome.package.name, "census");
    assert!(matches!(
        outcome.warnings.as_slice(),
        [LoadWarning::SearchFallbackUsed { .. }]
    ));
    assert_eq!(catalog.packages().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn loaded_packages_are_added_to_group() {
    init_test_tracing();

    let catalog = MemoryCatalog::new();
    catalog.insert_group(Group::new("statistics")).await;
    let loader = PackageLoader::new(catalog.clone(), ReplaceByName::new());

    let summary = loader
        .load_packages(vec![Package::new("census"), Package::new("schools")])
        .await;
    let group = loader
        .add_packages_to_group(&summary.package_names, "statistics")
        .await
        .unwrap();

    assert_eq!(
        group.packages,
        Some(vec!["census".to_owned(), "schools".to_owned()])
    );
    assert_eq!(
        catalog.writes().await.last(),
        Some(&CatalogWrite::GroupReplaced("statistics".to_owned()))
    );
}
