//! Reconciliation engine behaviour against an in-memory package manager.

mod support;

use std::collections::BTreeSet;

use stack_core::catalog::CURRENT_TAG;
use stack_core::engine::{ReconcileReport, ReconciliationEngine, candidate_tags};
use stack_core::install::LocalStack;
use stack_core::remote::RemoteCatalog;

use support::{Call, FakeDriver, date};

/// Three weekly releases of lsst_distrib; each pulls in afw at a new version.
fn weekly_remote() -> RemoteCatalog {
    let mut remote = RemoteCatalog::new();
    remote.add_tag("w_2020_01", date(2020, 1, 1));
    remote.add_tag("w_2020_09", date(2020, 3, 1));
    remote.add_tag("w_2020_05", date(2020, 2, 1));
    for (tag, version) in [
        ("w_2020_01", "1.0"),
        ("w_2020_05", "1.5"),
        ("w_2020_09", "1.9"),
    ] {
        remote.insert("lsst_distrib", version, tag);
        remote.insert("afw", version, tag);
    }
    remote
}

fn run(remote: &RemoteCatalog, driver: FakeDriver) -> (FakeDriver, ReconcileReport) {
    run_products(remote, driver, &["lsst_distrib"])
}

fn run_products(
    remote: &RemoteCatalog,
    driver: FakeDriver,
    products: &[&str],
) -> (FakeDriver, ReconcileReport) {
    let mut local = LocalStack::open(driver).unwrap();
    let report = ReconciliationEngine::new(remote, &mut local).reconcile(products);
    (local.into_driver(), report)
}

#[test]
fn installs_every_missing_tag_in_sorted_order() {
    let remote = weekly_remote();
    let driver = FakeDriver::new().with_releases_from(&remote);

    let (driver, report) = run(&remote, driver);

    assert_eq!(driver.installs(), vec!["w_2020_01", "w_2020_05", "w_2020_09"]);
    let product = &report.products[0];
    assert_eq!(product.installed, vec!["w_2020_01", "w_2020_05", "w_2020_09"]);
    assert!(product.is_clean());
    assert_eq!(report.installed_count(), 3);
}

#[test]
fn candidate_tags_are_server_minus_installed() {
    let remote = weekly_remote();
    let driver = FakeDriver::new()
        .with_releases_from(&remote)
        .with_installed("lsst_distrib", "1.0", &["w_2020_01"]);
    let local = LocalStack::open(driver).unwrap();

    assert_eq!(
        candidate_tags(&remote, &local, "lsst_distrib"),
        BTreeSet::from(["w_2020_05".to_string(), "w_2020_09".to_string()])
    );
    assert!(candidate_tags(&remote, &local, "unknown").is_empty());
}

#[test]
fn no_install_when_server_tags_already_present() {
    let remote = weekly_remote();
    let driver = FakeDriver::new()
        .with_releases_from(&remote)
        .with_installed("lsst_distrib", "1.0", &["w_2020_01"])
        .with_installed("lsst_distrib", "1.5", &["w_2020_05"])
        .with_installed("lsst_distrib", "1.9", &["w_2020_09", "extra_local_tag"]);

    let (driver, report) = run(&remote, driver);

    assert!(driver.installs().is_empty());
    assert!(report.products[0].candidates.is_empty());
}

#[test]
fn release_tag_fans_out_to_every_covered_product() {
    let mut remote = RemoteCatalog::new();
    remote.add_tag("T", date(2020, 5, 1));
    remote.insert("X", "1.0", "T");
    remote.insert("Y", "2.0", "T");
    let driver = FakeDriver::new().with_releases_from(&remote);

    let mut local = LocalStack::open(driver).unwrap();
    ReconciliationEngine::new(&remote, &mut local).reconcile(&["X"]);
    let driver = local.into_driver();

    assert_eq!(
        driver.declarations("T"),
        vec![
            ("X".to_string(), "1.0".to_string()),
            ("Y".to_string(), "2.0".to_string()),
        ]
    );
    assert_eq!(
        driver.installed().tags_of("Y"),
        BTreeSet::from(["T".to_string(), CURRENT_TAG.to_string()])
    );
}

#[test]
fn current_follows_latest_publication_date() {
    let remote = weekly_remote();
    let driver = FakeDriver::new().with_releases_from(&remote);

    let (driver, report) = run(&remote, driver);

    assert_eq!(report.products[0].current.as_deref(), Some("w_2020_09"));
    let installed = driver.installed();
    assert_eq!(installed.latest_tagged("lsst_distrib"), Some("1.9".to_string()));
    assert_eq!(installed.latest_tagged("afw"), Some("1.9".to_string()));
}

#[test]
fn current_is_elected_among_already_installed_tags() {
    let mut remote = RemoteCatalog::new();
    remote.add_tag("A", date(2020, 1, 1));
    remote.add_tag("B", date(2020, 3, 1));
    remote.add_tag("C", date(2020, 2, 1));
    remote.insert("P", "a", "A");
    remote.insert("P", "b", "B");
    remote.insert("P", "c", "C");
    let driver = FakeDriver::new()
        .with_installed("P", "a", &["A"])
        .with_installed("P", "b", &["B"])
        .with_installed("P", "c", &["C"]);

    let mut local = LocalStack::open(driver).unwrap();
    let report = ReconciliationEngine::new(&remote, &mut local).reconcile(&["P"]);
    let driver = local.into_driver();

    assert_eq!(report.products[0].current.as_deref(), Some("B"));
    assert_eq!(
        driver.calls,
        vec![Call::Declare {
            product: "P".to_string(),
            version: "b".to_string(),
            tag: CURRENT_TAG.to_string(),
        }]
    );
}

#[test]
fn failed_tag_does_not_stop_the_others() {
    let remote = weekly_remote();
    let driver = FakeDriver::new()
        .with_releases_from(&remote)
        .failing("w_2020_05");

    let (driver, report) = run(&remote, driver);

    assert_eq!(driver.installs(), vec!["w_2020_01", "w_2020_05", "w_2020_09"]);
    let product = &report.products[0];
    assert_eq!(product.installed, vec!["w_2020_01", "w_2020_09"]);
    assert_eq!(product.failed.len(), 1);
    assert_eq!(product.failed[0].tag, "w_2020_05");
    assert!(product.failed[0].error.contains("simulated failure"));
    assert_eq!(product.current.as_deref(), Some("w_2020_09"));
    assert_eq!(report.failure_count(), 1);
}

#[test]
fn failure_of_newest_tag_elects_next_newest() {
    let remote = weekly_remote();
    let driver = FakeDriver::new()
        .with_releases_from(&remote)
        .failing("w_2020_09");

    let (driver, report) = run(&remote, driver);

    assert_eq!(report.products[0].current.as_deref(), Some("w_2020_05"));
    assert_eq!(
        driver.installed().latest_tagged("lsst_distrib"),
        Some("1.5".to_string())
    );
}

#[test]
fn no_current_when_every_install_fails() {
    let remote = weekly_remote();
    let driver = FakeDriver::new()
        .with_releases_from(&remote)
        .failing("w_2020_01")
        .failing("w_2020_05")
        .failing("w_2020_09");

    let (driver, report) = run(&remote, driver);

    assert_eq!(report.products[0].current, None);
    assert!(driver.declarations(CURRENT_TAG).is_empty());
    assert_eq!(report.failure_count(), 3);
}

#[test]
fn unknown_tags_are_registered_once() {
    let remote = weekly_remote();
    let driver = FakeDriver::new()
        .with_releases_from(&remote)
        .with_declared("w_2020_01");

    let (driver, _) = run(&remote, driver);

    let registered: Vec<_> = driver
        .calls
        .iter()
        .filter_map(|call| match call {
            Call::Register(tag) => Some(tag.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(registered, vec!["w_2020_05", "w_2020_09"]);
}

#[test]
fn second_run_issues_no_installs_or_declarations() {
    let remote = weekly_remote();
    let driver = FakeDriver::new().with_releases_from(&remote);

    let (mut driver, _) = run(&remote, driver);
    driver.calls.clear();
    let (driver, report) = run(&remote, driver);

    assert_eq!(driver.mutations(), 0);
    assert!(report.products[0].candidates.is_empty());
    assert_eq!(report.products[0].current.as_deref(), Some("w_2020_09"));
}

#[test]
fn declarations_skip_products_not_installed() {
    let mut remote = RemoteCatalog::new();
    remote.add_tag("T", date(2020, 5, 1));
    remote.insert("X", "1.0", "T");
    remote.insert("Z", "3.0", "T");
    // The release installs X only; Z is listed but never lands locally.
    let mut releases = RemoteCatalog::new();
    releases.add_tag("T", date(2020, 5, 1));
    releases.insert("X", "1.0", "T");
    let driver = FakeDriver::new().with_releases_from(&releases);

    let mut local = LocalStack::open(driver).unwrap();
    let report = ReconciliationEngine::new(&remote, &mut local).reconcile(&["X"]);
    let driver = local.into_driver();

    assert!(report.products[0].is_clean());
    assert_eq!(
        driver.declarations("T"),
        vec![("X".to_string(), "1.0".to_string())]
    );
}

#[test]
fn products_are_processed_independently() {
    let mut remote = weekly_remote();
    remote.add_tag("sims_w_2020_09", date(2020, 3, 2));
    remote.insert("lsst_sims", "2.9", "sims_w_2020_09");
    let driver = FakeDriver::new()
        .with_releases_from(&remote)
        .failing("w_2020_01")
        .failing("w_2020_05")
        .failing("w_2020_09");

    let mut local = LocalStack::open(driver).unwrap();
    let report =
        ReconciliationEngine::new(&remote, &mut local).reconcile(&["lsst_distrib", "lsst_sims"]);

    assert_eq!(report.products.len(), 2);
    assert_eq!(report.products[0].current, None);
    assert_eq!(report.products[1].installed, vec!["sims_w_2020_09"]);
    assert_eq!(report.products[1].current.as_deref(), Some("sims_w_2020_09"));
}

#[test]
fn product_listed_twice_under_one_tag_settles_on_greatest_version() {
    let mut remote = RemoteCatalog::new();
    remote.add_tag("T", date(2020, 5, 1));
    remote.insert("X", "1.0", "T");
    remote.insert("X", "2.0", "T");
    let driver = FakeDriver::new().with_releases_from(&remote);

    let (mut driver, _) = run_products(&remote, driver, &["X"]);
    assert_eq!(
        driver.declarations("T"),
        vec![("X".to_string(), "2.0".to_string())]
    );
    assert_eq!(driver.installed().latest_tagged("X"), Some("2.0".to_string()));

    driver.calls.clear();
    let (driver, report) = run_products(&remote, driver, &["X"]);
    assert_eq!(driver.mutations(), 0);
    assert!(report.products[0].candidates.is_empty());
}
