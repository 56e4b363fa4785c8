//! The injected store of "who is signed in" that every screen reads from.

use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, PoisonError, RwLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use futures::future::BoxFuture;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};

use crate::{
    auth::{AuthEvent, AuthProvider},
    error::AppResult,
    models::Identity,
    view::Route,
};

type Callback = Arc<dyn Fn(Option<&Identity>) + Send + Sync>;
type SignOutFn = Arc<dyn Fn() -> BoxFuture<'static, AppResult<()>> + Send + Sync>;

#[derive(Default)]
struct Inner {
    identity: RwLock<Option<Identity>>,
    callbacks: Mutex<BTreeMap<u64, Callback>>,
    next_id: AtomicU64,
    redirect: Mutex<Option<Route>>,
}

impl Inner {
    fn apply(&self, event: &AuthEvent) {
        let next = event.identity().cloned();
        {
            let mut identity = self.identity.write().unwrap_or_else(PoisonError::into_inner);
            if identity.is_none() && next.is_none() {
                return;
            }
            *identity = next.clone();
        }
        tracing::debug!(signed_in = next.is_some(), "session changed");

        let ids: Vec<u64> = self.callbacks().keys().copied().collect();
        for id in ids {
            // Re-check each time so a handle dropped mid-dispatch is not called.
            let Some(callback) = self.callbacks().get(&id).cloned() else {
                continue;
            };
            callback(next.as_ref());
        }
    }

    fn callbacks(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Callback>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct SessionStore {
    inner: Arc<Inner>,
    sign_out: Option<SignOutFn>,
    listener: Option<JoinHandle<()>>,
}

impl SessionStore {
    /// Ask the provider for its session once, then follow its auth events.
    /// An unreachable provider leaves the store anonymous.
    pub async fn start<P: AuthProvider>(provider: Arc<P>) -> Self {
        let mut events = provider.on_auth_state_change();
        let identity = match provider.get_session().await {
            Ok(session) => session.map(|session| session.identity),
            Err(err) => {
                tracing::warn!(error = %err, "auth provider unreachable, continuing anonymous");
                None
            }
        };

        let inner = Arc::new(Inner::default());
        *inner.identity.write().unwrap_or_else(PoisonError::into_inner) = identity;

        let listening = Arc::clone(&inner);
        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => listening.apply(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session listener lagged behind auth events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let sign_out: SignOutFn = Arc::new(move || {
            let provider = Arc::clone(&provider);
            Box::pin(async move { provider.sign_out().await })
        });

        Self {
            inner,
            sign_out: Some(sign_out),
            listener: Some(listener),
        }
    }

    /// A store pinned to a known identity with no provider behind it.
    pub fn with_identity(identity: Option<Identity>) -> Self {
        let inner = Inner::default();
        *inner.identity.write().unwrap_or_else(PoisonError::into_inner) = identity;
        Self {
            inner: Arc::new(inner),
            sign_out: None,
            listener: None,
        }
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe<F>(&self, on_change: F) -> SessionSubscription
    where
        F: Fn(Option<&Identity>) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.callbacks().insert(id, Arc::new(on_change));
        SessionSubscription {
            inner: Arc::downgrade(&self.inner),
            id,
            active: true,
        }
    }

    /// Feed an auth event in directly. Sign-out while already anonymous
    /// changes nothing and notifies no one.
    pub fn apply(&self, event: &AuthEvent) {
        self.inner.apply(event);
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        if let Some(sign_out) = &self.sign_out {
            sign_out().await?;
        }
        self.inner.apply(&AuthEvent::SignedOut);
        Ok(())
    }

    /// Remember where an anonymous visitor was headed before being sent to login.
    pub fn remember_redirect(&self, route: Route) {
        *self
            .inner
            .redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(route);
    }

    /// Consume the remembered destination. A second call returns `None`.
    pub fn take_redirect(&self) -> Option<Route> {
        self.inner
            .redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Keeps a callback registered. Unsubscribes on [`unsubscribe`](Self::unsubscribe) or drop.
pub struct SessionSubscription {
    inner: Weak<Inner>,
    id: u64,
    active: bool,
}

impl SessionSubscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(inner) = self.inner.upgrade() {
            inner.callbacks().remove(&self.id);
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.detach();
    }
}
