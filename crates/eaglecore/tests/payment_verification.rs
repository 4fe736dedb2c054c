//! "I've paid" verification against payments created by a real registration.

mod common;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{answers, FakeFiles, Harness};
use eaglecore::payment::paystack::GatewayStatus;
use eaglecore::registration::{Event, FinalizeOutcome, RegistrationService, SessionStore};
use eaglecore::storage::directory;
use eaglecore::{CatalogueStore, Directory, PaymentReconciler, PaymentStatus, PaystackClient, PlanTier, VerifyOutcome};

async fn registered(h: &Harness, user_id: i64, plan: PlanTier) -> String {
    h.send_all(user_id, answers(plan)).await;
    match h.send(user_id, Event::Confirm).await.finalized {
        Some((_, FinalizeOutcome::PaymentReady { reference, .. })) => reference,
        other => panic!("expected payment link, got {other:?}"),
    }
}

#[tokio::test]
async fn test_successful_payment_is_recorded_but_not_approved() {
    let h = Harness::new();
    let reference = registered(&h, 30, PlanTier::Verified).await;
    let reconciler = PaymentReconciler::new(h.directory.clone(), h.gateway.clone());

    let outcome = reconciler.verify(&reference).await.unwrap();
    let VerifyOutcome::Verified(payment) = outcome else {
        panic!("expected verified, got {outcome:?}");
    };
    assert_eq!(payment.status, PaymentStatus::Success);
    assert_eq!(payment.amount_minor, 300_000);
    assert!(payment.verified_at.is_some());

    let provider = h.provider(30).await.unwrap();
    assert!(!provider.is_approved);
    assert!(!provider.is_visible());
}

#[tokio::test]
async fn test_second_verify_does_not_query_gateway() {
    let h = Harness::new();
    let reference = registered(&h, 31, PlanTier::Basic).await;
    let reconciler = PaymentReconciler::new(h.directory.clone(), h.gateway.clone());

    reconciler.verify(&reference).await.unwrap();
    *h.gateway.verify_status.lock().unwrap() = GatewayStatus::Failed;
    let again = reconciler.verify(&reference).await.unwrap();

    assert!(matches!(again, VerifyOutcome::AlreadyVerified(ref p) if p.status == PaymentStatus::Success));
    assert_eq!(h.gateway.verify_count(), 1);
}

#[tokio::test]
async fn test_pending_payment_keeps_status_and_can_succeed_later() {
    let h = Harness::new();
    let reference = registered(&h, 32, PlanTier::Basic).await;
    let reconciler = PaymentReconciler::new(h.directory.clone(), h.gateway.clone());

    *h.gateway.verify_status.lock().unwrap() = GatewayStatus::Pending;
    let pending = reconciler.verify(&reference).await.unwrap();
    assert!(matches!(
        pending,
        VerifyOutcome::Pending { ref payment, gateway_error: None } if payment.status == PaymentStatus::Pending
    ));

    *h.gateway.verify_status.lock().unwrap() = GatewayStatus::Success;
    let verified = reconciler.verify(&reference).await.unwrap();
    assert!(matches!(verified, VerifyOutcome::Verified(_)));
    assert_eq!(h.gateway.verify_count(), 2);
}

#[tokio::test]
async fn test_abandoned_payment_is_failed() {
    let h = Harness::new();
    let reference = registered(&h, 33, PlanTier::Premium).await;
    let reconciler = PaymentReconciler::new(h.directory.clone(), h.gateway.clone());

    *h.gateway.verify_status.lock().unwrap() = GatewayStatus::Abandoned;
    let outcome = reconciler.verify(&reference).await.unwrap();

    let VerifyOutcome::Failed(payment) = outcome else {
        panic!("expected failed, got {outcome:?}");
    };
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert!(payment.verified_at.is_none());
}

#[tokio::test]
async fn test_unknown_reference_is_not_found() {
    let h = Harness::new();
    let reconciler = PaymentReconciler::new(h.directory.clone(), h.gateway.clone());

    let outcome = reconciler.verify("EV-000000000000").await.unwrap();
    assert!(matches!(outcome, VerifyOutcome::NotFound));
    assert_eq!(h.gateway.verify_count(), 0);
}

#[tokio::test]
async fn test_registration_and_verify_against_paystack_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .and(header("authorization", "Bearer sk_test_eagles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": "https://checkout.paystack.com/xyz",
                "access_code": "xyz",
                "reference": "ignored"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/transaction/verify/EV-[0-9A-F]{12}$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Verification successful",
            "data": {"status": "success", "amount": 150000, "currency": "NGN"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Directory::open(dir.path().join("eagles.sqlite").to_str().unwrap()).unwrap();
    let paystack = Arc::new(
        PaystackClient::new(
            &server.uri(),
            SecretString::from("sk_test_eagles".to_string()),
            Duration::from_secs(5),
        )
        .unwrap(),
    );
    let service = RegistrationService::new(
        SessionStore::new(Duration::from_secs(600)),
        store.clone(),
        paystack.clone(),
        Arc::new(CatalogueStore::new(dir.path().join("media").to_str().unwrap())),
        Arc::new(FakeFiles { fail: false }),
    )
    .with_currency("NGN");

    for event in answers(PlanTier::Basic) {
        service.handle(40, event).await.unwrap();
    }
    let confirmed = service.handle(40, Event::Confirm).await.unwrap();
    let Some((_, FinalizeOutcome::PaymentReady { reference, authorization_url, .. })) = confirmed.finalized else {
        panic!("expected payment link");
    };
    assert_eq!(authorization_url, "https://checkout.paystack.com/xyz");

    let reconciler = PaymentReconciler::new(store.clone(), paystack);
    assert!(matches!(reconciler.verify(&reference).await.unwrap(), VerifyOutcome::Verified(_)));
    assert!(matches!(
        reconciler.verify(&reference).await.unwrap(),
        VerifyOutcome::AlreadyVerified(_)
    ));

    let stored = {
        let reference = reference.clone();
        store
            .run(move |conn| Ok(directory::get_payment(conn, &reference)?))
            .await
            .unwrap()
            .unwrap()
    };
    assert_eq!(stored.status, PaymentStatus::Success);
    assert!(stored.gateway_response.unwrap().contains("\"success\""));
}
