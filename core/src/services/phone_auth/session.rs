//! Phone auth session: send, countdown, verify and login dispatch

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use otp_shared::config::{PhoneAuthSettings, VerificationMechanism};
use otp_shared::phone::{mask_phone_number, to_e164};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::{PhoneAuthCredential, ResendToken, VerificationId};
use crate::errors::{AuthError, ProviderError, SessionError, SessionResult};

use super::config::{SessionOptions, MAX_TIMEOUT_SECS};
use super::countdown::{Countdown, IntervalTickSource, TickOutcome};
use super::notifier::{ChangeNotifier, ListenerId};
use super::pending::{Completion, PendingVerification};
use super::traits::{AuthProvider, HumanVerifier, TickSource};
use super::types::{
    Callbacks, PhoneVerificationEvent, PhoneVerificationRequest, SessionSnapshot,
    VerificationEvents,
};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Mutable session fields; every one of them is reset by `clear`
struct SessionState {
    phone_number: Option<String>,
    callbacks: Callbacks,
    sign_out_on_success: bool,
    timeout: Duration,
    verifier: Option<Arc<dyn HumanVerifier>>,
    pending: Option<PendingVerification>,
    resend_token: Option<ResendToken>,
    code_sent: bool,
    code_sent_at: Option<DateTime<Utc>>,
    last_error: Option<AuthError>,
    countdown: Countdown,
    countdown_generation: u64,
    countdown_task: Option<JoinHandle<()>>,
    send_cycle: u64,
    listener_task: Option<JoinHandle<()>>,
}

impl SessionState {
    fn new(timeout: Duration) -> Self {
        Self {
            phone_number: None,
            callbacks: Callbacks::default(),
            sign_out_on_success: false,
            timeout,
            verifier: None,
            pending: None,
            resend_token: None,
            code_sent: false,
            code_sent_at: None,
            last_error: None,
            countdown: Countdown::new(timeout),
            countdown_generation: 0,
            countdown_task: None,
            send_cycle: 0,
            listener_task: None,
        }
    }

    fn is_pristine(&self) -> bool {
        self.phone_number.is_none()
            && self.callbacks.is_empty()
            && self.verifier.is_none()
            && self.pending.is_none()
            && self.resend_token.is_none()
            && !self.code_sent
            && !self.countdown.is_active()
            && self.countdown_task.is_none()
            && self.listener_task.is_none()
    }

    /// Stop the countdown; the caller aborts the returned task outside the lock
    fn cancel_countdown(&mut self) -> Option<JoinHandle<()>> {
        self.countdown.cancel();
        self.countdown_generation += 1;
        self.countdown_task.take()
    }
}

struct SessionInner {
    id: Uuid,
    provider: Arc<dyn AuthProvider>,
    mechanism: VerificationMechanism,
    settings: PhoneAuthSettings,
    tick_source: Arc<dyn TickSource>,
    notifier: ChangeNotifier,
    state: Mutex<SessionState>,
}

/// Stateful controller for one phone OTP login.
///
/// Cloning yields another handle to the same session. Session state is never
/// locked while callbacks, observers or provider calls run, so any of them may
/// call back into the session.
#[derive(Clone)]
pub struct PhoneAuthSession {
    inner: Arc<SessionInner>,
}

impl PhoneAuthSession {
    /// Create a session with default settings and real-time ticking
    pub fn new(provider: Arc<dyn AuthProvider>, mechanism: VerificationMechanism) -> Self {
        let settings = PhoneAuthSettings {
            mechanism,
            ..PhoneAuthSettings::default()
        };
        Self::with_tick_source(provider, settings, Arc::new(IntervalTickSource))
    }

    /// Create a session from process-wide settings
    pub fn from_settings(provider: Arc<dyn AuthProvider>, settings: PhoneAuthSettings) -> Self {
        Self::with_tick_source(provider, settings, Arc::new(IntervalTickSource))
    }

    /// Create a session with an injected tick source
    pub fn with_tick_source(
        provider: Arc<dyn AuthProvider>,
        settings: PhoneAuthSettings,
        tick_source: Arc<dyn TickSource>,
    ) -> Self {
        let timeout = settings.timeout();
        Self {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                provider,
                mechanism: settings.mechanism,
                settings,
                tick_source,
                notifier: ChangeNotifier::new(),
                state: Mutex::new(SessionState::new(timeout)),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn mechanism(&self) -> VerificationMechanism {
        self.inner.mechanism
    }

    /// Store phone number, callbacks and policy for the next send.
    ///
    /// Reconfiguring an active session tears down its current send cycle
    /// (countdown, pending material, in-flight provider listener) first.
    pub fn configure(&self, options: SessionOptions) -> SessionResult<()> {
        if options.phone_number.trim().is_empty() {
            return Err(SessionError::MissingPhoneNumber);
        }
        let phone_number =
            to_e164(&options.phone_number).ok_or_else(|| SessionError::InvalidPhoneNumber {
                phone: options.phone_number.clone(),
            })?;
        let timeout = options.timeout.unwrap_or_else(|| self.inner.settings.timeout());
        if timeout.as_secs() > MAX_TIMEOUT_SECS {
            return Err(SessionError::TimeoutTooLong {
                seconds: timeout.as_secs(),
                max: MAX_TIMEOUT_SECS,
            });
        }

        let (stale_tasks, replaced_verifier) = {
            let mut state = self.state();
            if state.phone_number.is_some() {
                tracing::warn!(
                    session_id = %self.inner.id,
                    phone = %mask_phone_number(&phone_number),
                    event = "session_reconfigured",
                    "Session reconfigured before clear; previous send cycle discarded"
                );
            }

            let countdown_task = state.cancel_countdown();
            let listener_task = state.listener_task.take();
            state.send_cycle += 1;
            state.pending = None;
            state.resend_token = None;
            state.code_sent = false;
            state.code_sent_at = None;
            state.last_error = None;

            let verifier_replaced = match (&state.verifier, &options.verifier) {
                (Some(old), Some(new)) => !Arc::ptr_eq(old, new),
                (Some(_), None) => true,
                (None, _) => false,
            };
            let replaced_verifier = if verifier_replaced {
                state.verifier.take()
            } else {
                None
            };

            state.phone_number = Some(phone_number.clone());
            state.callbacks = options.callbacks;
            state.sign_out_on_success = options
                .sign_out_on_success
                .unwrap_or(self.inner.settings.sign_out_on_success);
            state.timeout = timeout;
            state.countdown = Countdown::new(timeout);
            state.verifier = options.verifier;

            ([countdown_task, listener_task], replaced_verifier)
        };

        abort_all(stale_tasks);
        if let Some(verifier) = replaced_verifier {
            verifier.release();
        }

        tracing::info!(
            session_id = %self.inner.id,
            phone = %mask_phone_number(&phone_number),
            mechanism = %self.inner.mechanism,
            timeout_secs = timeout.as_secs(),
            event = "session_configured",
            "Phone auth session configured"
        );
        self.notify_now();
        Ok(())
    }

    /// Ask the provider to send a verification code.
    ///
    /// Returns true when the provider accepted the request, which is not the
    /// same as a successful login.
    pub async fn send(&self) -> bool {
        let (phone_number, timeout, resend_token, verifier, cycle, stale_tasks) = {
            let mut state = self.state();
            let Some(phone_number) = state.phone_number.clone() else {
                tracing::warn!(
                    session_id = %self.inner.id,
                    event = "send_without_configuration",
                    "Send requested before the session was configured"
                );
                return false;
            };
            state.code_sent = false;
            state.last_error = None;
            state.send_cycle += 1;
            let countdown_task = state.cancel_countdown();
            let listener_task = state.listener_task.take();
            (
                phone_number,
                state.timeout,
                state.resend_token.clone(),
                state.verifier.clone(),
                state.send_cycle,
                [countdown_task, listener_task],
            )
        };
        abort_all(stale_tasks);

        // Observers may call back into the session; let this call settle first.
        self.notify_deferred();

        tracing::info!(
            session_id = %self.inner.id,
            phone = %mask_phone_number(&phone_number),
            mechanism = %self.inner.mechanism,
            resend = resend_token.is_some(),
            event = "otp_send_requested",
            "Requesting verification code"
        );

        match self.inner.mechanism {
            VerificationMechanism::Token => {
                let request = PhoneVerificationRequest {
                    phone_number,
                    timeout,
                    resend_token,
                };
                self.send_with_token(request, cycle).await
            }
            VerificationMechanism::Confirmation => {
                self.send_with_confirmation(&phone_number, verifier, cycle)
                    .await
            }
        }
    }

    async fn send_with_token(&self, request: PhoneVerificationRequest, cycle: u64) -> bool {
        match self
            .inner
            .provider
            .begin_phone_verification(request)
            .await
        {
            Ok(events) => {
                let weak = Arc::downgrade(&self.inner);
                let Some(task) = spawn_task(listen_for_events(weak, cycle, events)) else {
                    tracing::error!(
                        session_id = %self.inner.id,
                        event = "no_runtime",
                        "No async runtime available to receive provider events"
                    );
                    return false;
                };
                let mut state = self.state();
                if state.send_cycle == cycle {
                    state.listener_task = Some(task);
                } else {
                    task.abort();
                }
                true
            }
            Err(error) => {
                self.dispatch_provider_error(error, "send");
                false
            }
        }
    }

    async fn send_with_confirmation(
        &self,
        phone_number: &str,
        verifier: Option<Arc<dyn HumanVerifier>>,
        cycle: u64,
    ) -> bool {
        match self
            .inner
            .provider
            .begin_interactive_verification(phone_number, verifier)
            .await
        {
            Ok(handle) => {
                if self.state().send_cycle != cycle {
                    tracing::debug!(
                        session_id = %self.inner.id,
                        event = "stale_confirmation_dropped",
                        "Confirmation handle arrived for a superseded send"
                    );
                    return true;
                }
                self.record_code_sent(PendingVerification::Confirmation(handle), None, cycle);
                true
            }
            Err(error) => {
                self.dispatch_provider_error(error, "send");
                false
            }
        }
    }

    /// Verify a user-entered code against the pending verification.
    ///
    /// Returns false without contacting the provider when no code has been
    /// requested yet.
    pub async fn verify(&self, code: &str) -> bool {
        let pending = self.state().pending.clone();
        let Some(pending) = pending else {
            tracing::debug!(
                session_id = %self.inner.id,
                event = "verify_without_pending",
                "Verify called with no pending verification"
            );
            return false;
        };

        match pending.complete(self.inner.provider.as_ref(), code).await {
            Ok(completion) => self.finalize_login(completion, false).await,
            Err(error) => {
                self.dispatch_provider_error(error, "verify");
                false
            }
        }
    }

    /// Cancel the countdown, release the verifier and reset every field.
    ///
    /// Observer subscriptions are kept.
    pub fn clear(&self) {
        let (tasks, verifier) = {
            let mut state = self.state();
            if state.is_pristine() {
                return;
            }
            let countdown_task = state.cancel_countdown();
            let listener_task = state.listener_task.take();
            let verifier = state.verifier.take();
            // Counters survive so late events and ticks stay recognisably stale.
            let send_cycle = state.send_cycle + 1;
            let countdown_generation = state.countdown_generation;
            *state = SessionState::new(self.inner.settings.timeout());
            state.send_cycle = send_cycle;
            state.countdown_generation = countdown_generation;
            ([countdown_task, listener_task], verifier)
        };

        abort_all(tasks);
        if let Some(verifier) = verifier {
            verifier.release();
        }

        tracing::info!(
            session_id = %self.inner.id,
            event = "session_cleared",
            "Phone auth session cleared"
        );
        self.notify_now();
    }

    /// Register an observer for state changes
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionSnapshot) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.notifier.unsubscribe(id)
    }

    /// Current state as observers see it
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        let expires_at = state.code_sent_at.and_then(|sent_at| {
            chrono::Duration::from_std(state.timeout)
                .ok()
                .map(|window| sent_at + window)
        });
        SessionSnapshot {
            session_id: self.inner.id,
            phone_number: state.phone_number.clone(),
            code_sent: state.code_sent,
            pending: state.pending.as_ref().map(PendingVerification::kind),
            verification_id: state
                .pending
                .as_ref()
                .and_then(PendingVerification::verification_id),
            has_resend_token: state.resend_token.is_some(),
            timeout: state.timeout,
            remaining: state.countdown.remaining(),
            timer_active: state.countdown.is_active(),
            code_sent_at: state.code_sent_at,
            expires_at,
            last_error: state.last_error.clone(),
        }
    }

    pub fn code_sent(&self) -> bool {
        self.state().code_sent
    }

    pub fn is_timer_active(&self) -> bool {
        self.state().countdown.is_active()
    }

    /// Time left on the display countdown
    pub fn remaining(&self) -> Duration {
        self.state().countdown.remaining()
    }

    pub fn timeout(&self) -> Duration {
        self.state().timeout
    }

    pub fn has_pending_verification(&self) -> bool {
        self.state().pending.is_some()
    }

    pub fn verification_id(&self) -> Option<VerificationId> {
        self.state()
            .pending
            .as_ref()
            .and_then(PendingVerification::verification_id)
    }

    pub fn resend_token(&self) -> Option<ResendToken> {
        self.state().resend_token.clone()
    }

    async fn handle_event(&self, cycle: u64, event: PhoneVerificationEvent) {
        if self.state().send_cycle != cycle {
            tracing::debug!(
                session_id = %self.inner.id,
                event = "stale_provider_event",
                "Ignoring provider event from a superseded send"
            );
            return;
        }

        match event {
            PhoneVerificationEvent::AutoVerified(credential) => {
                tracing::info!(
                    session_id = %self.inner.id,
                    event = "otp_auto_verified",
                    "Provider verified the phone number without a code"
                );
                self.finalize_login(Completion::Credential(credential), true)
                    .await;
            }
            PhoneVerificationEvent::Failed(error) => {
                self.dispatch_provider_error(ProviderError::Auth(error), "send");
            }
            PhoneVerificationEvent::CodeSent {
                verification_id,
                resend_token,
            } => {
                self.record_code_sent(
                    PendingVerification::Token(verification_id),
                    resend_token,
                    cycle,
                );
            }
            PhoneVerificationEvent::AutoRetrievalTimeout { verification_id } => {
                tracing::debug!(
                    session_id = %self.inner.id,
                    event = "auto_retrieval_timeout",
                    "Automatic code retrieval timed out"
                );
                self.state().pending = Some(PendingVerification::Token(verification_id));
                self.notify_now();
            }
        }
    }

    fn record_code_sent(
        &self,
        pending: PendingVerification,
        resend_token: Option<ResendToken>,
        cycle: u64,
    ) {
        let on_code_sent = {
            let mut state = self.state();
            state.pending = Some(pending);
            state.resend_token = resend_token;
            state.code_sent = true;
            state.code_sent_at = Some(Utc::now());
            state.callbacks.on_code_sent.clone()
        };

        tracing::info!(
            session_id = %self.inner.id,
            event = "otp_code_sent",
            "Provider dispatched the verification code"
        );

        if let Some(callback) = on_code_sent {
            callback();
        }
        self.notify_now();
        self.start_countdown(cycle);
    }

    /// Start the display countdown for `cycle`, cancelling any countdown
    /// already running. Does nothing once the cycle is superseded or the
    /// code-sent flag was reset (e.g. by `clear` from a callback).
    fn start_countdown(&self, cycle: u64) {
        let (generation, stale_task) = {
            let mut state = self.state();
            if state.send_cycle != cycle || !state.code_sent {
                return;
            }
            let stale_task = state.cancel_countdown();
            let timeout = state.timeout;
            state.countdown.start(timeout);
            if !state.countdown.is_active() {
                (None, stale_task)
            } else {
                (Some(state.countdown_generation), stale_task)
            }
        };
        abort_all([stale_task]);

        let Some(generation) = generation else {
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let tick_source = Arc::clone(&self.inner.tick_source);
        let Some(task) = spawn_task(run_countdown(weak, generation, tick_source)) else {
            tracing::warn!(
                session_id = %self.inner.id,
                event = "no_runtime",
                "No async runtime available; countdown will not tick"
            );
            return;
        };

        let mut state = self.state();
        if state.countdown_generation == generation {
            state.countdown_task = Some(task);
        } else {
            task.abort();
        }
    }

    /// Returns false when the countdown stopped or was superseded
    fn on_tick(&self, generation: u64) -> bool {
        let outcome = {
            let mut state = self.state();
            if state.countdown_generation != generation {
                return false;
            }
            let outcome = state.countdown.tick();
            if outcome == TickOutcome::Stopped {
                state.countdown_task = None;
            }
            outcome
        };

        if outcome == TickOutcome::Stopped {
            tracing::debug!(
                session_id = %self.inner.id,
                event = "countdown_finished",
                "Verification countdown reached its bound"
            );
        }
        self.notify_now();
        outcome == TickOutcome::Continue
    }

    async fn finalize_login(&self, completion: Completion, auto_verified: bool) -> bool {
        let result = match completion {
            Completion::SignedIn(result) => result,
            Completion::Credential(credential) => match self.sign_in(credential).await {
                Ok(result) => result,
                Err(error) => {
                    self.dispatch_provider_error(error, "sign_in");
                    return false;
                }
            },
        };

        let (sign_out, on_success) = {
            let mut state = self.state();
            state.last_error = None;
            (
                state.sign_out_on_success,
                state.callbacks.on_login_success.clone(),
            )
        };

        if sign_out {
            if let Err(error) = self.inner.provider.sign_out().await {
                tracing::warn!(
                    session_id = %self.inner.id,
                    error = %error,
                    event = "sign_out_failed",
                    "Sign-out after successful login failed"
                );
            }
        }

        tracing::info!(
            session_id = %self.inner.id,
            auto_verified = auto_verified,
            signed_out = sign_out,
            is_new_user = result.is_new_user,
            event = "login_succeeded",
            "Phone login succeeded"
        );

        if let Some(callback) = on_success {
            callback(&result, auto_verified);
        }
        self.notify_now();
        true
    }

    async fn sign_in(
        &self,
        credential: PhoneAuthCredential,
    ) -> Result<crate::domain::LoginResult, ProviderError> {
        self.inner.provider.sign_in_with_credential(credential).await
    }

    /// Structured errors go to the failure callback; anything else only to
    /// the diagnostic log
    fn dispatch_provider_error(&self, error: ProviderError, operation: &'static str) {
        match error {
            ProviderError::Auth(error) => {
                tracing::warn!(
                    session_id = %self.inner.id,
                    operation = operation,
                    code = %error.code,
                    event = "login_failed",
                    "Provider rejected phone login: {}",
                    error.message
                );
                let on_failed = {
                    let mut state = self.state();
                    state.last_error = Some(error.clone());
                    state.callbacks.on_login_failed.clone()
                };
                if let Some(callback) = on_failed {
                    callback(&error);
                }
                self.notify_now();
            }
            ProviderError::Unexpected(error) => {
                tracing::error!(
                    session_id = %self.inner.id,
                    operation = operation,
                    error = ?error,
                    event = "unexpected_provider_error",
                    "Unclassified provider failure"
                );
            }
        }
    }

    fn notify_now(&self) {
        let snapshot = self.snapshot();
        self.inner.notifier.notify(&snapshot);
    }

    fn notify_deferred(&self) {
        let weak = Arc::downgrade(&self.inner);
        let scheduled = spawn_task(async move {
            tokio::task::yield_now().await;
            if let Some(inner) = weak.upgrade() {
                PhoneAuthSession { inner }.notify_now();
            }
        });
        if scheduled.is_none() {
            self.notify_now();
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PhoneAuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneAuthSession")
            .field("id", &self.inner.id)
            .field("mechanism", &self.inner.mechanism)
            .finish_non_exhaustive()
    }
}

async fn listen_for_events(
    session: Weak<SessionInner>,
    cycle: u64,
    mut events: VerificationEvents,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = session.upgrade() else {
            return;
        };
        PhoneAuthSession { inner }.handle_event(cycle, event).await;
    }
}

async fn run_countdown(
    session: Weak<SessionInner>,
    generation: u64,
    tick_source: Arc<dyn TickSource>,
) {
    let mut ticker = tick_source.ticker(TICK_PERIOD);
    loop {
        ticker.tick().await;
        let Some(inner) = session.upgrade() else {
            return;
        };
        if !(PhoneAuthSession { inner }).on_tick(generation) {
            return;
        }
    }
}

fn spawn_task<F>(future: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::runtime::Handle::try_current()
        .ok()
        .map(|handle| handle.spawn(future))
}

fn abort_all<const N: usize>(tasks: [Option<JoinHandle<()>>; N]) {
    for task in tasks.into_iter().flatten() {
        task.abort();
    }
}
