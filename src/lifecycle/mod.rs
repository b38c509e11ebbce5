//! Component lifetimes.
//!
//! A [`Scope`] is tied to one component (a page section, the dashboard, a
//! visitor's session). Every backend call the component makes runs through
//! [`Scope::run`]; once the scope is torn down, results of calls still in
//! flight are discarded so no state is updated for a dead component.

use std::future::Future;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Scope {
    token: CancellationToken,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope torn down together with this one, or on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the scope is torn down.
    pub async fn torn_down(&self) {
        self.token.cancelled().await
    }

    /// Drive `fut` to completion unless the scope is torn down first.
    /// `None` means the result must not be applied.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_torn_down() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            output = fut => (!self.is_torn_down()).then_some(output),
        }
    }
}
