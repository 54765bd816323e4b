use std::sync::Arc;
use std::time::Duration;

use certpick_commons::{
    CertificateSourceSettings,
    StoreLocation,
};
use rcgen::string::BmpString;
use rcgen::{
    DnType,
    DnValue,
};
use time::OffsetDateTime;

use super::test_utils::{
    mint,
    mint_with_dn,
    mint_with_values,
    ymd,
};
use crate::entry::CertificateEntry;
use crate::error::StoreError;
use crate::memory::{
    HandleCounts,
    MemoryStores,
};
use crate::selector::{
    select_detached,
    CertificateSelector,
    SelectionQuery,
};

const SUBJECT: &str = "CN=example.com";

fn selector_at(stores: &MemoryStores, now: OffsetDateTime) -> CertificateSelector<MemoryStores> {
    CertificateSelector::new(stores.clone()).with_clock(move || now)
}

fn add(stores: &MemoryStores, common_name: &str, not_before: OffsetDateTime, not_after: OffsetDateTime) {
    add_with_trust(stores, common_name, not_before, not_after, true);
}

fn add_with_trust(
    stores: &MemoryStores, common_name: &str, not_before: OffsetDateTime,
    not_after: OffsetDateTime, trusted: bool,
) {
    let der = mint(common_name, not_before, not_after);
    stores
        .add_der("My", StoreLocation::CurrentUser, &der, trusted)
        .unwrap();
}

fn assert_no_leaks(stores: &MemoryStores, held: usize) {
    let counts = stores.handle_counts();
    assert_eq!(counts.open_repositories, 0);
    assert_eq!(counts.live_entries, held);
}

#[test]
fn test_scenario_picks_latest_expiry() {
    let stores = MemoryStores::new();
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2024, 1, 1));
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2025, 6, 1));
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2023, 12, 1));
    let selector = selector_at(&stores, ymd(2023, 6, 1));

    let selected = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .unwrap();

    assert_eq!(selected.not_after(), ymd(2025, 6, 1));
    assert_eq!(
        stores.handle_counts(),
        HandleCounts {
            open_repositories: 0,
            total_opened: 1,
            live_entries: 1,
            released_entries: 2,
        }
    );

    drop(selected);
    assert_no_leaks(&stores, 0);
    assert_eq!(stores.handle_counts().released_entries, 3);
}

#[test]
fn test_no_match_returns_none() {
    let stores = MemoryStores::new();
    add(&stores, "other.example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    add(&stores, "www.example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let selected = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, false)
        .unwrap();

    assert!(selected.is_none());
    assert_no_leaks(&stores, 0);
    assert_eq!(stores.handle_counts().released_entries, 2);
}

#[test]
fn test_empty_store_returns_none() {
    let stores = MemoryStores::new();
    stores
        .create_store("My", StoreLocation::CurrentUser)
        .unwrap();
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let selected = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap();

    assert!(selected.is_none());
    assert_no_leaks(&stores, 0);
}

#[test]
fn test_single_match_among_other_subjects() {
    let stores = MemoryStores::new();
    add(&stores, "a.example.com", ymd(2023, 1, 1), ymd(2026, 1, 1));
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2024, 6, 1));
    add(&stores, "b.example.com", ymd(2023, 1, 1), ymd(2027, 1, 1));
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let selected = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .unwrap();

    assert_eq!(selected.subject(), SUBJECT);
    assert_eq!(selected.not_after(), ymd(2024, 6, 1));
    assert_no_leaks(&stores, 1);
    assert_eq!(stores.handle_counts().released_entries, 2);
}

#[test]
fn test_valid_only_skips_expired() {
    let stores = MemoryStores::new();
    add(&stores, "example.com", ymd(2020, 1, 1), ymd(2021, 1, 1));
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let selected = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap();

    assert!(selected.is_none());
    assert_no_leaks(&stores, 0);
}

#[test]
fn test_valid_only_false_returns_expired() {
    let stores = MemoryStores::new();
    add(&stores, "example.com", ymd(2020, 1, 1), ymd(2021, 1, 1));
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let selected = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, false)
        .unwrap()
        .unwrap();

    assert_eq!(selected.not_after(), ymd(2021, 1, 1));
}

#[test]
fn test_valid_only_ignores_later_expired_or_untrusted() {
    let stores = MemoryStores::new();
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2024, 6, 1));
    add_with_trust(&stores, "example.com", ymd(2023, 1, 1), ymd(2027, 1, 1), false);
    add(&stores, "example.com", ymd(2025, 1, 1), ymd(2028, 1, 1));
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let valid = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .unwrap();
    assert_eq!(valid.not_after(), ymd(2024, 6, 1));
    assert!(valid.is_valid_at(ymd(2024, 1, 1)));
    drop(valid);

    let any = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, false)
        .unwrap()
        .unwrap();
    assert_eq!(any.not_after(), ymd(2028, 1, 1));
}

#[test]
fn test_tie_break_ignores_enumeration_order() {
    let first = mint("example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    let second = mint("example.com", ymd(2023, 2, 1), ymd(2025, 1, 1));
    let expected = crate::metadata::thumbprint(&first).min(crate::metadata::thumbprint(&second));

    for order in [[&first, &second], [&second, &first]] {
        let stores = MemoryStores::new();
        for der in order {
            stores
                .add_der("My", StoreLocation::CurrentUser, der, true)
                .unwrap();
        }
        let selector = selector_at(&stores, ymd(2024, 1, 1));

        let selected = selector
            .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
            .unwrap()
            .unwrap();

        assert_eq!(selected.thumbprint(), expected);
        assert_no_leaks(&stores, 1);
    }
}

#[test]
fn test_duplicate_entries_yield_one_handle() {
    let stores = MemoryStores::new();
    let der = mint("example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    for _ in 0..3 {
        stores
            .add_der("My", StoreLocation::CurrentUser, &der, true)
            .unwrap();
    }
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let selected = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .unwrap();

    assert_eq!(selected.der(), der.as_slice());
    assert_no_leaks(&stores, 1);
    assert_eq!(stores.handle_counts().released_entries, 2);
}

#[test]
fn test_repeated_calls_are_equivalent() {
    let stores = MemoryStores::new();
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2024, 6, 1));
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2025, 6, 1));
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let first = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .unwrap();
    let second = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .unwrap();

    assert_eq!(first.metadata(), second.metadata());
    assert_no_leaks(&stores, 2);
    assert_eq!(stores.handle_counts().total_opened, 2);
}

#[test]
fn test_missing_store_is_unavailable() {
    let stores = MemoryStores::new();
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let err = selector
        .select(SUBJECT, "NoSuchStore", StoreLocation::LocalMachine, true)
        .unwrap_err();

    match err {
        StoreError::RepositoryUnavailable {
            store, location, ..
        } => {
            assert_eq!(store, "NoSuchStore");
            assert_eq!(location, StoreLocation::LocalMachine);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stores.handle_counts(), HandleCounts::default());
}

#[test]
fn test_snapshot_failure_releases_everything() {
    let stores = MemoryStores::new();
    for _ in 0..4 {
        add(&stores, "example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    }
    stores
        .fail_snapshot_after("My", StoreLocation::CurrentUser, 3)
        .unwrap();
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let err = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap_err();

    assert!(matches!(err, StoreError::PlatformQueryFailure(_)));
    assert_no_leaks(&stores, 0);
    assert_eq!(stores.handle_counts().released_entries, 3);
}

#[test]
fn test_failure_after_last_entry_releases_everything() {
    let stores = MemoryStores::new();
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    stores
        .fail_snapshot_after("My", StoreLocation::CurrentUser, 10)
        .unwrap();
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    assert!(selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .is_err());
    assert_no_leaks(&stores, 0);
    assert_eq!(stores.handle_counts().released_entries, 2);
}

#[test]
fn test_empty_subject_is_rejected_before_open() {
    let stores = MemoryStores::new();
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let err = selector
        .select("", "My", StoreLocation::CurrentUser, true)
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidQuery(_)));
    assert_eq!(stores.handle_counts().total_opened, 0);
}

#[test]
fn test_subject_match_is_exact_and_case_sensitive() {
    let stores = MemoryStores::new();
    add(&stores, "Example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    let der = mint_with_dn(
        &[
            (DnType::OrganizationName, "Example Corp"),
            (DnType::CommonName, "example.com"),
        ],
        ymd(2023, 1, 1),
        ymd(2025, 1, 1),
    );
    stores
        .add_der("My", StoreLocation::CurrentUser, &der, true)
        .unwrap();
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    for subject in [SUBJECT, "example.com", "CN=example"] {
        assert!(selector
            .select(subject, "My", StoreLocation::CurrentUser, false)
            .unwrap()
            .is_none());
    }

    let selected = selector
        .select(
            "CN=example.com, O=Example Corp",
            "My",
            StoreLocation::CurrentUser,
            false,
        )
        .unwrap()
        .unwrap();
    assert_eq!(selected.der(), der.as_slice());
}

#[test]
fn test_separator_inside_value_does_not_collide() {
    let stores = MemoryStores::new();
    let structured = mint_with_dn(
        &[
            (DnType::CountryName, "US"),
            (DnType::OrganizationName, "y"),
            (DnType::CommonName, "x"),
        ],
        ymd(2023, 1, 1),
        ymd(2025, 1, 1),
    );
    let embedded = mint_with_dn(
        &[(DnType::CountryName, "US"), (DnType::CommonName, "x, O=y")],
        ymd(2023, 1, 1),
        ymd(2026, 1, 1),
    );
    for der in [&structured, &embedded] {
        stores
            .add_der("My", StoreLocation::CurrentUser, der, true)
            .unwrap();
    }
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let selected = selector
        .select("CN=x, O=y, C=US", "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .unwrap();
    assert_eq!(selected.der(), structured.as_slice());
    drop(selected);

    let selected = selector
        .select("CN=\"x, O=y\", C=US", "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .unwrap();
    assert_eq!(selected.der(), embedded.as_slice());
    drop(selected);

    assert_no_leaks(&stores, 0);
}

#[test]
fn test_bmp_encoded_subject_is_matched() {
    let stores = MemoryStores::new();
    let der = mint_with_values(
        &[(
            DnType::CommonName,
            DnValue::BmpString(BmpString::try_from("example.com").unwrap()),
        )],
        ymd(2023, 1, 1),
        ymd(2025, 1, 1),
    );
    stores
        .add_der("My", StoreLocation::CurrentUser, &der, true)
        .unwrap();
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    assert!(selector
        .select("CN=", "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .is_none());

    let selected = selector
        .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
        .unwrap()
        .unwrap();
    assert_eq!(selected.der(), der.as_slice());
}

#[test]
fn test_select_query_from_settings() {
    let stores = MemoryStores::new();
    let der = mint("example.com", ymd(2023, 1, 1), ymd(2025, 1, 1));
    stores
        .add_der("Root", StoreLocation::LocalMachine, &der, true)
        .unwrap();
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    let settings = CertificateSourceSettings {
        subject: SUBJECT.to_string(),
        store_name: "Root".to_string(),
        store_location: StoreLocation::LocalMachine,
        valid_only: true,
    };
    let query = SelectionQuery::from(&settings);

    let selected = selector.select_query(&query).unwrap().unwrap();

    assert_eq!(selected.certificate_der().to_vec(), der);
    assert!(selected.to_pem().starts_with("-----BEGIN CERTIFICATE-----"));
}

#[test]
fn test_concurrent_selection() {
    let stores = MemoryStores::new();
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2024, 6, 1));
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2025, 6, 1));
    add(&stores, "other.example.com", ymd(2023, 1, 1), ymd(2025, 6, 1));
    let selector = selector_at(&stores, ymd(2024, 1, 1));

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let selected = selector
                    .select(SUBJECT, "My", StoreLocation::CurrentUser, true)
                    .unwrap()
                    .unwrap();
                assert_eq!(selected.not_after(), ymd(2025, 6, 1));
            });
        }
    });

    assert_no_leaks(&stores, 0);
    assert_eq!(stores.handle_counts().total_opened, 8);
    assert_eq!(stores.handle_counts().released_entries, 24);
}

#[tokio::test]
async fn test_select_detached() {
    let stores = MemoryStores::new();
    add(&stores, "example.com", ymd(2023, 1, 1), ymd(2025, 6, 1));
    let selector = Arc::new(selector_at(&stores, ymd(2024, 1, 1)));
    let query = SelectionQuery::new(SUBJECT, "My", StoreLocation::CurrentUser, true);

    let selected = tokio::time::timeout(Duration::from_secs(10), select_detached(selector, query))
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(selected.not_after(), ymd(2025, 6, 1));
    drop(selected);
    assert_no_leaks(&stores, 0);
}

#[tokio::test]
async fn test_select_detached_surfaces_errors() {
    let stores = MemoryStores::new();
    let selector = Arc::new(selector_at(&stores, ymd(2024, 1, 1)));
    let query = SelectionQuery::new(SUBJECT, "Missing", StoreLocation::CurrentUser, true);

    let err = select_detached(selector, query).await.unwrap_err();

    assert!(err.is_unavailable());
}
