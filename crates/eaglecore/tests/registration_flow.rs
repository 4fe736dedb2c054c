//! End-to-end registration: wizard events through the service into SQLite.

mod common;

use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;

use common::{answers, pdf, text, FakeFiles, Harness};
use eaglecore::registration::{ButtonAction, CallbackAction, Event, FinalizeOutcome, RegistrationDraft, Step};
use eaglecore::{PaymentStatus, PlanTier};

#[tokio::test]
async fn test_basic_registration_creates_unapproved_provider_and_pending_payment() {
    let h = Harness::new();
    h.send_all(42, answers(PlanTier::Basic)).await;
    let confirmed = h.send(42, Event::Confirm).await;

    let (registration, outcome) = confirmed.finalized.expect("registration finalized");
    assert_eq!(registration.category_name, "Lash");
    let FinalizeOutcome::PaymentReady {
        provider_id,
        reference,
        authorization_url,
        plan,
    } = outcome
    else {
        panic!("expected payment link, got {outcome:?}");
    };
    assert_eq!(plan, PlanTier::Basic);

    let provider = h.provider(42).await.unwrap();
    assert_eq!(provider.id, provider_id);
    assert!(!provider.is_approved);
    assert!(provider.is_active);
    assert_eq!(provider.keywords, vec!["lash", "beauty", "makeup"]);
    assert_eq!(provider.category_name.as_deref(), Some("Lash"));
    assert_eq!(provider.telegram_handle, "@lashbysarah");
    assert_eq!(provider.instagram_handle, "");
    assert_eq!(provider.hall_of_residence, "");
    assert!(provider.catalogue_path.is_none());

    let payments = h.payments(provider_id).await;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].reference, reference);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
    assert_eq!(payments[0].amount_minor, 150_000);
    assert_eq!(payments[0].authorization_url, authorization_url);

    let requests = h.gateway.initialized.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount_minor, 150_000);
    assert_eq!(requests[0].currency, "NGN");
    assert_eq!(requests[0].email, "sarah@example.com");
    assert_eq!(requests[0].metadata["provider_id"], provider_id);

    assert_eq!(
        confirmed.reply.keyboard[0][0].action,
        ButtonAction::Url(authorization_url.clone())
    );
    assert!(confirmed
        .reply
        .callbacks()
        .contains(&&CallbackAction::VerifyPayment(reference.clone())));
    assert!(!h.service.is_active(42).await);
}

#[tokio::test]
async fn test_premium_registration_stores_hall_and_catalogue() {
    let h = Harness::new();
    let mut events = answers(PlanTier::Premium);
    // Replace the catalogue skip with an upload
    let skip_at = events
        .iter()
        .position(|e| *e == Event::Skip(Step::CollectCatalogue))
        .unwrap();
    events[skip_at] = pdf("Prices.PDF");
    h.send_all(7, events).await;
    h.send(7, Event::Confirm).await;

    let provider = h.provider(7).await.unwrap();
    assert_eq!(provider.plan, PlanTier::Premium);
    assert_eq!(provider.hall_of_residence, "Daniel Hall");
    assert_eq!(provider.catalogue_path.as_deref(), Some("catalogues/7_Prices.PDF"));

    let stored = std::fs::read(h.dir.path().join("media/catalogues/7_Prices.PDF")).unwrap();
    assert_eq!(stored, b"%PDF-1.4 file-Prices.PDF".to_vec());

    let payments = h.payments(provider.id).await;
    assert_eq!(payments[0].amount_minor, 500_000);
}

#[tokio::test]
async fn test_catalogue_failure_does_not_abort_registration() {
    let h = Harness::with_files(FakeFiles { fail: true });
    let mut events = answers(PlanTier::Verified);
    let skip_at = events
        .iter()
        .position(|e| *e == Event::Skip(Step::CollectCatalogue))
        .unwrap();
    events[skip_at] = pdf("menu.pdf");
    h.send_all(8, events).await;
    let confirmed = h.send(8, Event::Confirm).await;

    assert!(matches!(
        confirmed.finalized,
        Some((_, FinalizeOutcome::PaymentReady { .. }))
    ));
    let provider = h.provider(8).await.unwrap();
    assert!(provider.catalogue_path.is_none());
}

#[tokio::test]
async fn test_gateway_failure_keeps_provider_without_payment() {
    let h = Harness::new();
    h.gateway.fail_initialize.store(true, Ordering::SeqCst);
    h.send_all(9, answers(PlanTier::Basic)).await;
    let confirmed = h.send(9, Event::Confirm).await;

    let Some((_, FinalizeOutcome::PaymentUnavailable { provider_id, error, .. })) = confirmed.finalized else {
        panic!("expected payment unavailable");
    };
    assert!(error.contains("Invalid key"));
    assert!(confirmed.reply.text.contains("contact the admin"));

    let provider = h.provider(9).await.unwrap();
    assert_eq!(provider.id, provider_id);
    assert!(h.payments(provider_id).await.is_empty());
    assert_eq!(h.count("payments").await, 0);
    assert!(!h.service.is_active(9).await);
}

#[tokio::test]
async fn test_payment_record_failure_ends_registration_with_provider_saved() {
    let h = Harness::new();
    *h.gateway.break_payments.lock().unwrap() = Some(h.directory.clone());
    h.send_all(14, answers(PlanTier::Verified)).await;
    let confirmed = h.send(14, Event::Confirm).await;

    let Some((_, FinalizeOutcome::PaymentUnavailable { provider_id, plan, error })) = confirmed.finalized else {
        panic!("expected payment unavailable");
    };
    assert_eq!(plan, PlanTier::Verified);
    assert_eq!(error, "the payment could not be recorded");
    assert!(confirmed.reply.text.contains("contact the admin"));
    assert!(!confirmed.reply.text.contains("payments_lost"));
    assert_eq!(h.provider(14).await.unwrap().id, provider_id);
    assert!(!h.service.is_active(14).await);

    // No draft is left behind to be confirmed into "already registered"
    let again = h.send(14, Event::Confirm).await;
    assert!(again.finalized.is_none());
    assert!(again.reply.text.contains("expired"));
    assert_eq!(h.count("providers").await, 1);
}

#[tokio::test]
async fn test_failed_provider_save_keeps_draft_and_retry_succeeds() {
    let h = Harness::new();
    h.block_providers().await;
    h.send_all(15, answers(PlanTier::Basic)).await;
    let failed = h.send(15, Event::Confirm).await;

    assert!(failed.finalized.is_none());
    assert!(failed.reply.text.contains("tap Confirm again"));
    assert_eq!(h.count("providers").await, 0);
    assert_eq!(h.count("categories").await, 0);
    assert_eq!(h.gateway.initialize_count(), 0);
    let session = h.service.sessions().get(15).await.unwrap();
    assert_eq!(session.step, Step::Confirm);

    h.allow_providers().await;
    let retried = h.send(15, Event::Confirm).await;

    assert!(matches!(
        retried.finalized,
        Some((_, FinalizeOutcome::PaymentReady { .. }))
    ));
    assert_eq!(h.count("providers").await, 1);
    assert_eq!(h.count("categories").await, 1);
}

#[tokio::test]
async fn test_rejected_second_registration_creates_no_category() {
    let h = Harness::new();
    h.send_all(16, answers(PlanTier::Basic)).await;
    h.send(16, Event::Confirm).await;

    let mut events = answers(PlanTier::Basic);
    events[3] = text("Nails, polish");
    h.send_all(16, events).await;
    let again = h.send(16, Event::Confirm).await;

    assert!(matches!(again.finalized, Some((_, FinalizeOutcome::AlreadyRegistered))));
    assert_eq!(h.count("categories").await, 1);
}

#[tokio::test]
async fn test_second_registration_by_same_user_is_rejected() {
    let h = Harness::new();
    h.send_all(10, answers(PlanTier::Basic)).await;
    h.send(10, Event::Confirm).await;

    h.send_all(10, answers(PlanTier::Premium)).await;
    let again = h.send(10, Event::Confirm).await;

    assert!(matches!(again.finalized, Some((_, FinalizeOutcome::AlreadyRegistered))));
    assert!(again.reply.text.contains("already registered"));
    assert_eq!(h.count("providers").await, 1);
    assert_eq!(h.count("payments").await, 1);
    assert_eq!(h.gateway.initialize_count(), 1);
    assert_eq!(h.provider(10).await.unwrap().plan, PlanTier::Basic);
}

#[tokio::test]
async fn test_concurrent_finalize_creates_one_provider() {
    let h = Harness::new();
    h.send_all(11, answers(PlanTier::Basic)).await;
    let session = h.service.sessions().get(11).await.unwrap();
    let registration = session.draft.complete().unwrap();

    let (first, second) = tokio::join!(
        h.service.finalize(11, &registration),
        h.service.finalize(11, &registration)
    );
    let outcomes = [first.unwrap(), second.unwrap()];

    let already = outcomes
        .iter()
        .filter(|o| **o == FinalizeOutcome::AlreadyRegistered)
        .count();
    assert_eq!(already, 1);
    assert_eq!(h.count("providers").await, 1);
}

#[tokio::test]
async fn test_double_confirm_finalizes_once() {
    let h = Harness::new();
    h.send_all(12, answers(PlanTier::Basic)).await;
    h.send(12, Event::Confirm).await;
    let second = h.send(12, Event::Confirm).await;

    assert!(second.finalized.is_none());
    assert!(second.reply.text.contains("expired"));
    assert_eq!(h.gateway.initialize_count(), 1);
}

#[tokio::test]
async fn test_cancel_discards_draft_and_restart_is_clean() {
    let h = Harness::new();
    h.send_all(
        13,
        vec![
            Event::Start,
            text("Lash by Sarah"),
            text("Professional lash technician"),
            text("lash"),
        ],
    )
    .await;
    let cancelled = h.send(13, Event::Cancel).await;
    assert!(cancelled.reply.text.contains("Registration cancelled"));
    assert!(!h.service.is_active(13).await);
    assert_eq!(h.count("providers").await, 0);

    h.send(13, Event::Start).await;
    let session = h.service.sessions().get(13).await.unwrap();
    assert_eq!(session.step, Step::CollectName);
    assert_eq!(session.draft, RegistrationDraft::default());
}

#[tokio::test]
async fn test_invalid_answer_reasks_same_question() {
    let h = Harness::new();
    h.send(14, Event::Start).await;
    let rejected = h.send(14, text("ab")).await;

    assert!(rejected.reply.text.contains("Name too short"));
    let session = h.service.sessions().get(14).await.unwrap();
    assert_eq!(session.step, Step::CollectName);
    assert!(session.draft.name.is_none());
}

#[tokio::test]
async fn test_event_without_session_asks_to_start_again() {
    let h = Harness::new();
    let handled = h.send(15, text("hello")).await;
    assert!(handled.reply.text.contains("expired"));
    assert_eq!(handled.reply.callbacks(), vec![&CallbackAction::StartRegistration, &CallbackAction::MainMenu]);
}

#[tokio::test]
async fn test_registrations_share_category() {
    let h = Harness::new();
    for user in [20, 21] {
        h.send_all(user, answers(PlanTier::Basic)).await;
        h.send(user, Event::Confirm).await;
    }
    assert_eq!(h.count("categories").await, 1);
    assert_eq!(h.count("providers").await, 2);
}
