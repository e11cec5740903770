//! Unit tests for the phone auth session

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use otp_shared::config::{PhoneAuthSettings, VerificationMechanism};

use crate::domain::{PhoneAuthCredential, VerificationId};
use crate::errors::{AuthError, AuthErrorCode, SessionError};
use crate::services::phone_auth::{
    PendingKind, PhoneAuthSession, PhoneVerificationEvent, SessionOptions, SessionSnapshot,
};

use super::mocks::{
    code_sent, settle, CallLog, FailMode, FakeProvider, FakeVerifier, ManualTicks,
    ACCEPTED_CODE, CRASH_CODE,
};

const PHONE: &str = "+15551234";

struct Harness {
    provider: Arc<FakeProvider>,
    ticks: Arc<ManualTicks>,
    session: PhoneAuthSession,
    log: CallLog,
}

fn harness(mechanism: VerificationMechanism) -> Harness {
    let log = CallLog::default();
    let provider = Arc::new(FakeProvider::new(log.clone()));
    let ticks = Arc::new(ManualTicks::default());
    let settings = PhoneAuthSettings {
        mechanism,
        ..PhoneAuthSettings::default()
    };
    let session = PhoneAuthSession::with_tick_source(provider.clone(), settings, ticks.clone());
    Harness {
        provider,
        ticks,
        session,
        log,
    }
}

/// Options whose callbacks write into the shared call log
fn logged_options(log: &CallLog) -> SessionOptions {
    let on_sent = log.clone();
    let on_success = log.clone();
    let on_failed = log.clone();
    SessionOptions::new(PHONE)
        .on_code_sent(move || on_sent.push("code_sent"))
        .on_login_success(move |result, auto| {
            on_success.push(format!("success:{}:{}", result.user.uid, auto))
        })
        .on_login_failed(move |error| on_failed.push(format!("failed:{}", error.code)))
}

/// Subscribe an observer that records every snapshot
fn record_snapshots(session: &PhoneAuthSession) -> Arc<Mutex<Vec<SessionSnapshot>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    session.subscribe(move |snapshot| {
        sink.lock().unwrap().push(snapshot.clone());
        Ok(())
    });
    seen
}

async fn send_and_deliver_code(h: &Harness, id: &str) {
    h.provider.script(vec![code_sent(id, None)]);
    assert!(h.session.send().await);
    settle().await;
}

#[tokio::test]
async fn test_code_sent_starts_countdown() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();

    send_and_deliver_code(&h, "v1").await;

    assert!(h.session.code_sent());
    assert!(h.session.is_timer_active());
    assert_eq!(h.session.remaining(), Duration::from_secs(60));
    assert_eq!(h.session.verification_id(), Some(VerificationId::new("v1")));
    assert_eq!(h.log.count("code_sent"), 1);
    assert_eq!(h.ticks.tickers_created(), 1);

    let request = h.provider.last_request().unwrap();
    assert_eq!(request.phone_number, PHONE);
    assert_eq!(request.timeout, Duration::from_secs(60));
    assert!(request.resend_token.is_none());

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.pending, Some(PendingKind::Token));
    let sent_at = snapshot.code_sent_at.unwrap();
    assert_eq!(snapshot.expires_at, Some(sent_at + chrono::Duration::seconds(60)));
}

#[tokio::test]
async fn test_tick_decrements_remaining_and_notifies() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    send_and_deliver_code(&h, "v1").await;
    let seen = record_snapshots(&h.session);

    h.ticks.tick_all();
    settle().await;

    assert_eq!(h.session.remaining(), Duration::from_secs(59));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].remaining, Duration::from_secs(59));
    assert!(seen[0].timer_active);
}

#[tokio::test]
async fn test_countdown_stops_at_bound() {
    let h = harness(VerificationMechanism::Token);
    h.session
        .configure(logged_options(&h.log).timeout(Duration::from_secs(3)))
        .unwrap();
    send_and_deliver_code(&h, "v1").await;
    let seen = record_snapshots(&h.session);

    for _ in 0..5 {
        h.ticks.tick_all();
        settle().await;
    }

    assert!(!h.session.is_timer_active());
    assert_eq!(h.session.remaining(), Duration::ZERO);
    // Only ticks up to and including the stopping one notify
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(!seen[2].timer_active);
    assert_eq!(h.ticks.live_tickers(), 0);
}

#[tokio::test]
async fn test_zero_timeout_never_ticks() {
    let h = harness(VerificationMechanism::Token);
    h.session
        .configure(logged_options(&h.log).timeout(Duration::ZERO))
        .unwrap();
    send_and_deliver_code(&h, "v1").await;

    assert!(h.session.code_sent());
    assert!(!h.session.is_timer_active());
    assert_eq!(h.ticks.tickers_created(), 0);
}

#[tokio::test]
async fn test_second_send_leaves_one_active_countdown() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    send_and_deliver_code(&h, "v1").await;

    h.ticks.tick_all();
    settle().await;
    assert_eq!(h.session.remaining(), Duration::from_secs(59));

    send_and_deliver_code(&h, "v2").await;
    assert_eq!(h.ticks.tickers_created(), 2);
    assert_eq!(h.ticks.live_tickers(), 1);
    assert_eq!(h.session.remaining(), Duration::from_secs(60));

    h.ticks.tick_all();
    settle().await;
    assert_eq!(h.session.remaining(), Duration::from_secs(59));
    assert_eq!(h.session.verification_id(), Some(VerificationId::new("v2")));
}

#[tokio::test]
async fn test_send_before_configure_returns_false() {
    let h = harness(VerificationMechanism::Token);

    assert!(!h.session.send().await);
    settle().await;

    assert!(h.log.entries().is_empty());
    assert!(h.provider.last_request().is_none());
}

#[tokio::test]
async fn test_send_notification_is_deferred() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(SessionOptions::new(PHONE)).unwrap();
    h.provider
        .fail_begin(FailMode::Unexpected("gateway unavailable".to_string()));
    let seen = record_snapshots(&h.session);

    assert!(!h.session.send().await);
    assert!(seen.lock().unwrap().is_empty());

    settle().await;
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].code_sent);
}

#[tokio::test]
async fn test_send_structured_failure_reaches_callback() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    h.provider.fail_begin(FailMode::Auth(AuthError::new(
        AuthErrorCode::TooManyRequests,
        "try again later",
    )));

    assert!(!h.session.send().await);

    assert_eq!(h.log.count("failed:too-many-requests"), 1);
    assert_eq!(
        h.session.snapshot().last_error.map(|e| e.code),
        Some(AuthErrorCode::TooManyRequests)
    );
    assert!(!h.session.code_sent());
}

#[tokio::test]
async fn test_send_unexpected_failure_skips_callback() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    h.provider
        .fail_begin(FailMode::Unexpected("dns lookup failed".to_string()));

    assert!(!h.session.send().await);
    settle().await;

    assert_eq!(h.log.entries(), vec!["begin".to_string()]);
    assert!(h.session.snapshot().last_error.is_none());
}

#[tokio::test]
async fn test_failed_event_reaches_callback() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    h.provider
        .script(vec![PhoneVerificationEvent::Failed(AuthError::new(
            AuthErrorCode::QuotaExceeded,
            "sms quota exhausted",
        ))]);

    assert!(h.session.send().await);
    settle().await;

    assert_eq!(h.log.count("failed:quota-exceeded"), 1);
    assert!(!h.session.code_sent());
    assert!(!h.session.is_timer_active());
}

#[tokio::test]
async fn test_auto_verification_logs_in() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    h.provider
        .script(vec![PhoneVerificationEvent::AutoVerified(
            PhoneAuthCredential::Provider {
                provider_id: "phone".to_string(),
                token: "instant".to_string(),
            },
        )]);

    assert!(h.session.send().await);
    settle().await;

    assert_eq!(h.log.count("sign_in"), 1);
    assert_eq!(h.log.count("success:uid-auto:true"), 1);
    assert!(!h.session.code_sent());
}

#[tokio::test]
async fn test_verify_correct_code() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    send_and_deliver_code(&h, "v1").await;

    assert!(h.session.verify(ACCEPTED_CODE).await);

    assert_eq!(h.log.count("success:uid-v1:false"), 1);
    assert_eq!(h.log.count("sign_out"), 0);
}

#[tokio::test]
async fn test_verify_wrong_code_keeps_pending() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    send_and_deliver_code(&h, "v1").await;

    assert!(!h.session.verify("000000").await);

    assert_eq!(h.log.count("failed:invalid-verification-code"), 1);
    assert!(h.session.has_pending_verification());
    assert!(h.session.verify(ACCEPTED_CODE).await);
}

#[tokio::test]
async fn test_verify_unexpected_failure_skips_callback() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    send_and_deliver_code(&h, "v1").await;

    assert!(!h.session.verify(CRASH_CODE).await);

    assert!(h.log.entries().iter().all(|e| !e.starts_with("failed:")));
}

#[tokio::test]
async fn test_verify_without_pending_returns_false() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();

    assert!(!h.session.verify(ACCEPTED_CODE).await);

    assert_eq!(h.log.count("sign_in"), 0);
}

#[tokio::test]
async fn test_sign_out_runs_before_success_callback() {
    let h = harness(VerificationMechanism::Token);
    h.session
        .configure(logged_options(&h.log).sign_out_on_success(true))
        .unwrap();
    send_and_deliver_code(&h, "v1").await;

    assert!(h.session.verify(ACCEPTED_CODE).await);

    let entries = h.log.entries();
    let tail = &entries[entries.len() - 3..];
    assert_eq!(tail, ["sign_in", "sign_out", "success:uid-v1:false"]);
}

#[tokio::test]
async fn test_sign_out_failure_does_not_fail_login() {
    let h = harness(VerificationMechanism::Token);
    h.session
        .configure(logged_options(&h.log).sign_out_on_success(true))
        .unwrap();
    *h.provider.sign_out_failure.lock().unwrap() =
        FailMode::Unexpected("already signed out".to_string());
    send_and_deliver_code(&h, "v1").await;

    assert!(h.session.verify(ACCEPTED_CODE).await);
    assert_eq!(h.log.count("success:uid-v1:false"), 1);
}

#[tokio::test]
async fn test_resend_token_is_forwarded() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    h.provider.script(vec![code_sent("v1", Some("r1"))]);
    assert!(h.session.send().await);
    settle().await;
    assert_eq!(h.session.resend_token().map(|t| t.as_str().to_string()), Some("r1".to_string()));

    h.provider.script(vec![code_sent("v2", Some("r2"))]);
    assert!(h.session.send().await);
    settle().await;

    let requests = h.provider.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].resend_token.as_ref().map(|t| t.as_str()), Some("r1"));
    drop(requests);
    assert_eq!(h.session.resend_token().map(|t| t.as_str().to_string()), Some("r2".to_string()));
}

#[tokio::test]
async fn test_auto_retrieval_timeout_replaces_verification_id() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    send_and_deliver_code(&h, "v1").await;
    let seen = record_snapshots(&h.session);

    h.provider.emit(PhoneVerificationEvent::AutoRetrievalTimeout {
        verification_id: VerificationId::new("v2"),
    });
    settle().await;

    assert_eq!(h.session.verification_id(), Some(VerificationId::new("v2")));
    assert!(seen
        .lock()
        .unwrap()
        .iter()
        .any(|s| s.verification_id == Some(VerificationId::new("v2"))));
    assert!(h.session.verify(ACCEPTED_CODE).await);
    assert_eq!(h.log.count("success:uid-v2:false"), 1);
}

#[tokio::test]
async fn test_events_after_clear_are_ignored() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    assert!(h.session.send().await);
    settle().await;

    h.session.clear();
    h.provider.emit(code_sent("late", None));
    settle().await;

    assert!(!h.session.code_sent());
    assert_eq!(h.log.count("code_sent"), 0);
    assert_eq!(h.ticks.tickers_created(), 0);
}

#[tokio::test]
async fn test_confirmation_mechanism_round_trip() {
    let h = harness(VerificationMechanism::Confirmation);
    let verifier = Arc::new(FakeVerifier::default());
    h.session
        .configure(logged_options(&h.log).verifier(verifier.clone()))
        .unwrap();

    assert!(h.session.send().await);

    assert!(h.session.code_sent());
    assert_eq!(h.log.count("code_sent"), 1);
    assert_eq!(verifier.tokens_issued.load(Ordering::SeqCst), 1);
    assert_eq!(h.session.snapshot().pending, Some(PendingKind::Confirmation));
    assert_eq!(
        h.session.verification_id(),
        Some(VerificationId::new("confirmation-0"))
    );

    assert!(h.session.verify(ACCEPTED_CODE).await);
    assert_eq!(h.log.count("confirm"), 1);
    assert_eq!(h.log.count("sign_in"), 0);
    assert_eq!(h.log.count("success:uid-confirmed:false"), 1);

    h.session.clear();
    assert_eq!(verifier.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_confirmation_verifier_failure() {
    let h = harness(VerificationMechanism::Confirmation);
    let verifier = Arc::new(FakeVerifier::default());
    verifier.fail.store(true, Ordering::SeqCst);
    h.session
        .configure(logged_options(&h.log).verifier(verifier))
        .unwrap();

    assert!(!h.session.send().await);

    assert_eq!(h.log.count("failed:captcha-check-failed"), 1);
    assert!(!h.session.has_pending_verification());
}

#[tokio::test]
async fn test_configure_validation() {
    let h = harness(VerificationMechanism::Token);

    assert_eq!(
        h.session.configure(SessionOptions::new("  ")),
        Err(SessionError::MissingPhoneNumber)
    );
    assert_eq!(
        h.session.configure(SessionOptions::new("5551234")),
        Err(SessionError::InvalidPhoneNumber {
            phone: "5551234".to_string()
        })
    );
    assert_eq!(
        h.session
            .configure(SessionOptions::new(PHONE).timeout(Duration::from_secs(7200))),
        Err(SessionError::TimeoutTooLong {
            seconds: 7200,
            max: 3600
        })
    );

    h.session.configure(SessionOptions::new("+1 (555) 1234")).unwrap();
    assert_eq!(h.session.snapshot().phone_number.as_deref(), Some(PHONE));
}

#[tokio::test]
async fn test_reconfigure_discards_send_cycle() {
    let h = harness(VerificationMechanism::Token);
    let first = Arc::new(FakeVerifier::default());
    h.session
        .configure(logged_options(&h.log).verifier(first.clone()))
        .unwrap();
    send_and_deliver_code(&h, "v1").await;

    h.session
        .configure(SessionOptions::new("+447700900123").timeout(Duration::from_secs(30)))
        .unwrap();
    settle().await;

    assert!(!h.session.code_sent());
    assert!(!h.session.is_timer_active());
    assert!(!h.session.has_pending_verification());
    assert_eq!(h.session.timeout(), Duration::from_secs(30));
    assert_eq!(h.ticks.live_tickers(), 0);
    assert_eq!(first.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_clear_resets_and_is_idempotent() {
    let h = harness(VerificationMechanism::Token);
    let seen = record_snapshots(&h.session);

    h.session.clear();
    assert!(seen.lock().unwrap().is_empty());

    h.session
        .configure(logged_options(&h.log).timeout(Duration::from_secs(30)))
        .unwrap();
    send_and_deliver_code(&h, "v1").await;
    let before = seen.lock().unwrap().len();

    h.session.clear();
    h.session.clear();
    settle().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), before + 1);
    let last = seen.last().unwrap();
    assert!(last.phone_number.is_none());
    assert!(!last.code_sent);
    assert!(!last.timer_active);
    assert!(last.pending.is_none());
    assert_eq!(last.timeout, Duration::from_secs(60));
    assert_eq!(h.ticks.live_tickers(), 0);

    // Ticks delivered to the cancelled countdown change nothing
    drop(seen);
    h.ticks.tick_all();
    settle().await;
    assert_eq!(h.session.remaining(), Duration::from_secs(60));
}

#[tokio::test]
async fn test_subscriptions_survive_clear() {
    let h = harness(VerificationMechanism::Token);
    let seen = record_snapshots(&h.session);
    h.session.configure(SessionOptions::new(PHONE)).unwrap();
    h.session.clear();

    h.session.configure(SessionOptions::new(PHONE)).unwrap();

    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_failing_observers_do_not_stop_countdown() {
    let h = harness(VerificationMechanism::Token);
    h.session.configure(logged_options(&h.log)).unwrap();
    send_and_deliver_code(&h, "v1").await;

    h.session
        .subscribe(|_| Err(anyhow::anyhow!("render target detached")));
    h.session.subscribe(|_| panic!("observer bug"));
    let healthy = Arc::new(AtomicUsize::new(0));
    let counter = healthy.clone();
    h.session.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    h.ticks.tick_all();
    settle().await;
    h.ticks.tick_all();
    settle().await;

    assert_eq!(h.session.remaining(), Duration::from_secs(58));
    assert_eq!(healthy.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_observer_may_read_session_during_notification() {
    let h = harness(VerificationMechanism::Token);
    let reader = h.session.clone();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    h.session.subscribe(move |_| {
        sink.lock().unwrap().push(reader.code_sent());
        Ok(())
    });
    h.session.configure(logged_options(&h.log)).unwrap();

    send_and_deliver_code(&h, "v1").await;

    assert_eq!(observed.lock().unwrap().last(), Some(&true));
}

#[tokio::test]
async fn test_callback_may_clear_session() {
    let h = harness(VerificationMechanism::Token);
    let session = h.session.clone();
    h.session
        .configure(SessionOptions::new(PHONE).on_login_success(move |_, _| session.clear()))
        .unwrap();
    send_and_deliver_code(&h, "v1").await;

    assert!(h.session.verify(ACCEPTED_CODE).await);
    settle().await;

    assert!(!h.session.code_sent());
    assert!(h.session.snapshot().phone_number.is_none());
}

#[tokio::test]
async fn test_code_sent_callback_may_clear_session() {
    let h = harness(VerificationMechanism::Token);
    let session = h.session.clone();
    h.session
        .configure(SessionOptions::new(PHONE).on_code_sent(move || session.clear()))
        .unwrap();

    send_and_deliver_code(&h, "v1").await;

    let snapshot = h.session.snapshot();
    assert!(snapshot.phone_number.is_none());
    assert!(!snapshot.code_sent);
    assert!(snapshot.pending.is_none());
    assert!(!snapshot.timer_active);
    assert_eq!(h.ticks.tickers_created(), 0);
    assert_eq!(h.ticks.live_tickers(), 0);
}

#[tokio::test]
async fn test_code_sent_callback_may_clear_confirmation_session() {
    let h = harness(VerificationMechanism::Confirmation);
    let session = h.session.clone();
    h.session
        .configure(SessionOptions::new(PHONE).on_code_sent(move || session.clear()))
        .unwrap();

    assert!(h.session.send().await);
    settle().await;

    assert!(!h.session.code_sent());
    assert!(!h.session.is_timer_active());
    assert!(!h.session.has_pending_verification());
    assert_eq!(h.ticks.tickers_created(), 0);
}
