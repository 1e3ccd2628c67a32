//! Contract Test: Fail-Fast Pipeline
//!
//! Every stage is a hard gate. These tests verify that a failure at one
//! stage returns the matching error kind and that no later stage runs.

mod common;

use common::*;
use ddns_core::Error;
use std::net::Ipv4Addr;

const CURRENT_IP: Ipv4Addr = Ipv4Addr::new(9, 9, 9, 9);

#[tokio::test]
async fn unreachable_ip_service_aborts_before_provider_calls() {
    let provider = example_provider();
    let config = minimal_config("example.com");

    let err = reconciler(FixedIpSource::unreachable(), &provider, &config)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network(_)), "got {err:?}");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn rejected_credentials_abort_before_zone_lookup() {
    let provider = example_provider().rejecting_auth();
    let config = minimal_config("example.com");

    let err = reconciler(FixedIpSource::new(CURRENT_IP), &provider, &config)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authentication(_)), "got {err:?}");
    assert!(err.to_string().contains("Invalid API Token"));
    assert_eq!(provider.calls(), vec![Call::Verify]);
}

#[tokio::test]
async fn missing_zone_is_not_found() {
    let provider = MockDnsProvider::new(
        Vec::new(),
        vec![a_record("R1", "example.com", "1.2.3.4")],
    );
    let config = minimal_config("example.com");

    let err = reconciler(FixedIpSource::new(CURRENT_IP), &provider, &config)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
    assert_eq!(
        provider.calls(),
        vec![Call::Verify, Call::FindZone("example.com".to_string())]
    );
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let provider = MockDnsProvider::new(vec![zone("Z1", "example.com")], Vec::new());
    let config = minimal_config("example.com");

    let err = reconciler(FixedIpSource::new(CURRENT_IP), &provider, &config)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
    assert!(provider.updated_ids().is_empty());
}

#[tokio::test]
async fn records_are_listed_under_resolved_zone() {
    let provider = example_provider();
    let config = minimal_config("example.com");

    reconciler(FixedIpSource::new(CURRENT_IP), &provider, &config)
        .run()
        .await
        .expect("run succeeds");

    assert!(provider.calls().contains(&Call::ListRecords {
        zone_id: "Z1".to_string(),
        name: "example.com".to_string(),
    }));
}

#[tokio::test]
async fn failed_update_aborts_remaining_records() {
    let provider = MockDnsProvider::new(
        vec![zone("Z1", "example.com")],
        vec![
            a_record("R1", "example.com", "1.2.3.4"),
            a_record("R2", "sub.example.com", "5.6.7.8"),
            a_record("R3", "www.example.com", "5.6.7.8"),
        ],
    )
    .failing_update("R2");
    let config = minimal_config("example.com");

    let err = reconciler(FixedIpSource::new(CURRENT_IP), &provider, &config)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provider { .. }), "got {err:?}");

    // R1 stays updated, R3 is never attempted
    assert_eq!(provider.updated_ids(), vec!["R1", "R2"]);
    assert_eq!(provider.content_of("R1").as_deref(), Some("9.9.9.9"));
    assert_eq!(provider.content_of("R3").as_deref(), Some("5.6.7.8"));
}
