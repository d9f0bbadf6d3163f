use time::OffsetDateTime;
use uuid::Uuid;

use crate::executor::{BackgroundWorker, CallbackQueue, SharedCallback};
use crate::ports::{PushBackend, TimeProvider, TokenProvider};
use crate::store::RegistrationStore;
use crate::types::error::ClientError;
use crate::types::response::{
    MessageOpenedResponse, MessageOpenedResult, RegistrationResponse, RegistrationResult,
    UnregistrationResponse, UnregistrationResult,
};

/// How frequently registrations are refreshed, in milliseconds (10 days).
const REGISTRATION_REFRESH_INTERVAL_MILLIS: i64 = 1000 * 60 * 60 * 24 * 10;

/// The StarFlight registration manager. Every operation runs its network
/// work as one task on the client's dedicated background worker and reports
/// through the callback queue; the calling thread is never blocked on I/O
/// beyond the local store.
#[derive(Clone)]
pub struct StarFlightClient<B, P, C> {
    store: RegistrationStore,
    backend: B,
    tokens: P,
    time: C,
    worker: BackgroundWorker,
    callbacks: CallbackQueue,
}

impl<B, P, C> StarFlightClient<B, P, C>
where
    B: PushBackend,
    P: TokenProvider,
    C: TimeProvider,
{
    /// Must be called from within a tokio runtime: the client spawns its
    /// background worker here.
    pub fn new(
        store: RegistrationStore,
        backend: B,
        tokens: P,
        time: C,
        callbacks: CallbackQueue,
    ) -> Self {
        Self {
            store,
            backend,
            tokens,
            time,
            worker: BackgroundWorker::spawn(),
            callbacks,
        }
    }

    /// Tells if this installation is currently registered for notifications.
    pub fn is_registered(&self) -> bool {
        self.store.registration_token().is_some()
    }

    /// The client UUID of the current registration, if any.
    pub fn client_uuid(&self) -> Option<Uuid> {
        self.store.client_uuid()
    }

    /// Registers for push notifications with the supplied tags. If a
    /// registration already exists, its tags are replaced with the supplied
    /// values; an up-to-date registration is answered from the cache without
    /// a network call.
    pub fn register(
        &self,
        tags: &[String],
        callback: Option<SharedCallback<RegistrationResponse>>,
    ) {
        let tags = normalize_tags(tags);
        match self.store.registration_token() {
            None => {
                let backend = self.backend.clone();
                let tokens = self.tokens.clone();
                let store = self.store.clone();
                let time = self.time.clone();
                let callbacks = self.callbacks.clone();
                self.worker.submit(async move {
                    let token = match tokens.token().await {
                        Ok(token) => token,
                        Err(err) => {
                            call_on_failure(
                                &callbacks,
                                callback,
                                format!("registration failed: {err}"),
                                err,
                            );
                            return;
                        }
                    };
                    run_registration(backend, store, time, callbacks, token, tags, callback).await;
                });
            }
            Some(token) => self.send_registration_if_needed(token, tags, callback),
        }
    }

    /// Refreshes the current registration if needed, re-sending the
    /// previously stored tags. Call this every time the application starts.
    pub fn refresh_registration(&self) -> Result<(), ClientError> {
        if !self.is_registered() {
            return Err(ClientError::InvalidState("not registered"));
        }
        let tags = self.store.registered_tags();
        log::debug!("registered tags to refresh: {tags:?}");
        self.register(&tags, None);
        Ok(())
    }

    /// Stores a rotated platform token. The next register call notices the
    /// difference against the last-sent token and resends.
    pub fn token_refreshed(&self, token: &str) -> std::io::Result<()> {
        self.store.update_token(token)
    }

    /// Removes the supplied tags from an existing registration, or the whole
    /// registration when `tags` is `None`.
    pub fn unregister(
        &self,
        tags: Option<&[String]>,
        callback: Option<SharedCallback<UnregistrationResponse>>,
    ) {
        let Some(token) = self.store.registration_token() else {
            call_on_success(
                &self.callbacks,
                callback,
                UnregistrationResponse {
                    result: UnregistrationResult::NotRegistered,
                },
            );
            return;
        };

        let tags: Vec<String> = tags.map(<[String]>::to_vec).unwrap_or_default();
        let backend = self.backend.clone();
        let tokens = self.tokens.clone();
        let store = self.store.clone();
        let callbacks = self.callbacks.clone();
        self.worker.submit(run_unregistration(
            backend, store, tokens, callbacks, token, tags, callback,
        ));
    }

    /// Records that the message with the supplied UUID was opened by the
    /// user. Repeated calls for the same message answer locally.
    pub fn message_opened(
        &self,
        message_uuid: Uuid,
        callback: Option<SharedCallback<MessageOpenedResponse>>,
    ) {
        if self.store.is_message_opened(message_uuid) {
            call_on_success(
                &self.callbacks,
                callback,
                MessageOpenedResponse {
                    result: MessageOpenedResult::AlreadyOpened,
                },
            );
            return;
        }

        let Some(token) = self.store.registration_token() else {
            call_on_failure(
                &self.callbacks,
                callback,
                "recording message open failed: not registered".to_string(),
                ClientError::InvalidState("not registered"),
            );
            return;
        };

        let backend = self.backend.clone();
        let store = self.store.clone();
        let callbacks = self.callbacks.clone();
        self.worker.submit(async move {
            match backend.message_opened(&token, message_uuid).await {
                Ok(response) => {
                    if let Err(err) = store.record_message_opened(message_uuid) {
                        call_on_failure(
                            &callbacks,
                            callback,
                            format!("failed to record message open: {err}"),
                            ClientError::Storage(err),
                        );
                        return;
                    }
                    call_on_success(&callbacks, callback, response);
                }
                Err(err) => {
                    call_on_failure(
                        &callbacks,
                        callback,
                        format!("recording message open failed: {err}"),
                        err,
                    );
                }
            }
        });
    }

    fn send_registration_if_needed(
        &self,
        token: String,
        tags: Vec<String>,
        callback: Option<SharedCallback<RegistrationResponse>>,
    ) {
        let state = self.store.snapshot();
        let now_millis = unix_millis(self.time.now());
        let joined = tags.join(",");
        let last_sent = state.last_sent_token.unwrap_or_default();
        let registered = state.registered_tags.unwrap_or_default();

        let stale = match state.last_registration_time {
            None => true,
            Some(last) => now_millis - last > REGISTRATION_REFRESH_INTERVAL_MILLIS,
        };
        let should_send = stale || last_sent != token || registered != joined;

        if !should_send && let Some(client_uuid) = state.client_uuid {
            log::info!("already registered and refreshing was not necessary");
            call_on_success(
                &self.callbacks,
                callback,
                RegistrationResponse {
                    client_uuid,
                    result: RegistrationResult::AlreadyRegistered,
                },
            );
            return;
        }

        let backend = self.backend.clone();
        let store = self.store.clone();
        let time = self.time.clone();
        let callbacks = self.callbacks.clone();
        self.worker.submit(run_registration(
            backend, store, time, callbacks, token, tags, callback,
        ));
    }
}

async fn run_registration<B, C>(
    backend: B,
    store: RegistrationStore,
    time: C,
    callbacks: CallbackQueue,
    token: String,
    tags: Vec<String>,
    callback: Option<SharedCallback<RegistrationResponse>>,
) where
    B: PushBackend,
    C: TimeProvider,
{
    match backend.register(&token, &tags).await {
        Ok(response) => {
            let now_millis = unix_millis(time.now());
            if let Err(err) =
                store.store_registration(&token, &tags, response.client_uuid, now_millis)
            {
                call_on_failure(
                    &callbacks,
                    callback,
                    format!("failed to store registration: {err}"),
                    ClientError::Storage(err),
                );
                return;
            }
            log::info!("saved registration token {token}");
            call_on_success(&callbacks, callback, response);
        }
        Err(err) => {
            call_on_failure(
                &callbacks,
                callback,
                format!("failed to send registration to StarFlight: {err}"),
                err,
            );
        }
    }
}

async fn run_unregistration<B, P>(
    backend: B,
    store: RegistrationStore,
    tokens: P,
    callbacks: CallbackQueue,
    token: String,
    tags: Vec<String>,
    callback: Option<SharedCallback<UnregistrationResponse>>,
) where
    B: PushBackend,
    P: TokenProvider,
{
    if !tags.is_empty() {
        // Only the supplied tags are dropped; the registration stays.
        match backend.unregister(&token, &tags).await {
            Ok(response) => {
                if let Err(err) = store.remove_tags(&tags) {
                    call_on_failure(
                        &callbacks,
                        callback,
                        format!("failed to store tag removal: {err}"),
                        ClientError::Storage(err),
                    );
                    return;
                }
                call_on_success(&callbacks, callback, response);
            }
            Err(err) => {
                call_on_failure(
                    &callbacks,
                    callback,
                    format!("unregistration failed: {err}"),
                    err,
                );
            }
        }
        return;
    }

    match backend.unregister(&token, &[]).await {
        Ok(response) => {
            if let Err(err) = store.remove_registration() {
                call_on_failure(
                    &callbacks,
                    callback,
                    format!("failed to clear registration store: {err}"),
                    ClientError::Storage(err),
                );
                return;
            }
            if let Err(err) = tokens.invalidate().await {
                call_on_failure(
                    &callbacks,
                    callback,
                    format!("unregistration failed: {err}"),
                    err,
                );
                return;
            }
            call_on_success(&callbacks, callback, response);
        }
        Err(err) => {
            call_on_failure(
                &callbacks,
                callback,
                format!("unregistration failed: {err}"),
                err,
            );
        }
    }
}

/// A missing tag list and an unsorted one normalize to the same canonical
/// form used both on the wire and in the staleness comparison.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut tags = tags.to_vec();
    tags.sort();
    tags.dedup();
    tags
}

fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

fn call_on_success<T: Send + 'static>(
    callbacks: &CallbackQueue,
    callback: Option<SharedCallback<T>>,
    response: T,
) {
    let Some(callback) = callback else {
        return;
    };
    callbacks.post(move || callback.on_success(response));
}

fn call_on_failure<T: Send + 'static>(
    callbacks: &CallbackQueue,
    callback: Option<SharedCallback<T>>,
    message: String,
    cause: ClientError,
) {
    let Some(callback) = callback else {
        return;
    };
    callbacks.post(move || callback.on_failure(&message, &cause));
}
