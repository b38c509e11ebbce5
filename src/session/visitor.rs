//! Server-side visitor contexts.
//!
//! Each signed-in browser is identified by a random cookie value. The cookie
//! only locates the visitor's context on this server; authorization still goes
//! through the backend session held inside that context.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use super::SessionManager;
use crate::admin::Dashboard;
use crate::backend::{Backend, Client};
use crate::lifecycle::Scope;

pub const VISITOR_COOKIE: &str = "ivoke_visitor";

/// A visitor not seen for this long is evicted.
pub const VISITOR_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How often the store looks for idle visitors.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One browser's client context: backend client, session and dashboard.
pub struct Visitor {
    id: Uuid,
    client: Client,
    session: SessionManager,
    scope: Scope,
    dashboard: Mutex<Option<Arc<Dashboard>>>,
    last_seen: std::sync::Mutex<Instant>,
}

impl Visitor {
    /// Create a context and resolve its session.
    pub async fn start(backend: &Backend) -> Arc<Self> {
        let client = Client::new(backend.clone());
        let scope = Scope::new();
        let session = SessionManager::new(client.auth().clone(), scope.child());
        session.init().await;

        Arc::new(Self {
            id: Uuid::new_v4(),
            client,
            session,
            scope,
            dashboard: Mutex::new(None),
            last_seen: std::sync::Mutex::new(Instant::now()),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn last_seen(&self) -> std::sync::MutexGuard<'_, Instant> {
        match self.last_seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn touch(&self) {
        *self.last_seen() = Instant::now();
    }

    /// Time since this visitor's last request.
    pub fn idle_for(&self) -> Duration {
        self.last_seen().elapsed()
    }

    /// The mounted dashboard, mounting (and fetching) it on first use.
    pub async fn dashboard(&self) -> Arc<Dashboard> {
        self.mount_dashboard().await.0
    }

    /// The dashboard for a page view. Every view loads fresh content, as a
    /// mount would.
    pub async fn view_dashboard(&self) -> Arc<Dashboard> {
        let (dashboard, mounted) = self.mount_dashboard().await;
        if !mounted {
            dashboard.fetch_data().await;
        }
        dashboard
    }

    /// Current dashboard, or a freshly mounted and loaded one (`true`).
    async fn mount_dashboard(&self) -> (Arc<Dashboard>, bool) {
        let mut slot = self.dashboard.lock().await;
        if let Some(dashboard) = slot.as_ref() {
            if !dashboard.scope().is_torn_down() {
                return (dashboard.clone(), false);
            }
        }

        let dashboard = Arc::new(Dashboard::new(self.client.clone(), self.scope.child()));
        dashboard.fetch_data().await;
        *slot = Some(dashboard.clone());
        (dashboard, true)
    }

    /// Tear down the dashboard; the next visit mounts a fresh one.
    pub async fn unmount_dashboard(&self) {
        if let Some(dashboard) = self.dashboard.lock().await.take() {
            dashboard.teardown();
        }
    }

    /// Tear down everything this visitor owns.
    pub fn teardown(&self) {
        self.scope.teardown();
    }
}

/// Visitor contexts by cookie id.
#[derive(Clone, Default)]
pub struct VisitorStore {
    visitors: Arc<RwLock<HashMap<Uuid, Arc<Visitor>>>>,
}

impl VisitorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, visitor: Arc<Visitor>) {
        let mut visitors = match self.visitors.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        visitors.insert(visitor.id(), visitor);
    }

    /// Visitor named by the request's cookie, if it is still known. Finding
    /// a visitor counts as activity.
    pub fn find(&self, jar: &CookieJar) -> Option<Arc<Visitor>> {
        let id = visitor_id(jar)?;
        let visitor = {
            let visitors = match self.visitors.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            visitors.get(&id).cloned()
        }?;
        visitor.touch();
        Some(visitor)
    }

    /// Forget a visitor and tear it down.
    pub fn remove(&self, id: Uuid) -> Option<Arc<Visitor>> {
        let removed = {
            let mut visitors = match self.visitors.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            visitors.remove(&id)
        };
        if let Some(visitor) = &removed {
            visitor.teardown();
        }
        removed
    }

    /// Number of live visitor contexts.
    pub fn count(&self) -> usize {
        match self.visitors.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Evict visitors idle for at least `idle` or no longer signed in.
    /// Returns how many were evicted.
    pub fn sweep(&self, idle: Duration) -> usize {
        let stale: Vec<Uuid> = {
            let visitors = match self.visitors.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            visitors
                .values()
                .filter(|v| v.idle_for() >= idle || !v.session().is_logged_in())
                .map(|v| v.id())
                .collect()
        };

        stale
            .into_iter()
            .filter(|id| self.remove(*id).is_some())
            .count()
    }

    /// Run [`VisitorStore::sweep`] every `every` until the runtime stops.
    pub fn spawn_sweeper(&self, every: Duration, idle: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.sweep(idle);
                if evicted > 0 {
                    tracing::info!(evicted, remaining = store.count(), "Evicted stale visitors");
                }
            }
        })
    }
}

/// Visitor id carried by the request's cookies.
pub fn visitor_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(VISITOR_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Cookie binding the browser to `id`.
pub fn visitor_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((VISITOR_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie telling the browser to forget its visitor id.
pub fn expired_visitor_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((VISITOR_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    cookie
}
