//! Linked lifetimes between an editing surface and the remote calls it starts.
//!
//! A surface owns a `SurfaceLifetime`; calls it issues hold a `SurfaceSignal`. Closing the
//! surface (or dropping every handle to its lifetime) resolves every signal, and awaiting code
//! drops the result instead of writing into a surface that is gone.

use std::sync::Arc;
use tokio::sync::watch;

/// Owning side of a surface's lifetime. Clones are handles to the same lifetime, so a
/// caller can close a surface while one of its calls is being awaited.
#[derive(Debug, Clone)]
pub struct SurfaceLifetime {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for SurfaceLifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceLifetime {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn signal(&self) -> SurfaceSignal {
        SurfaceSignal {
            rx: self.tx.subscribe(),
            _keepalive: None,
        }
    }

    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }
}

#[derive(Debug, Clone)]
pub struct SurfaceSignal {
    rx: watch::Receiver<bool>,
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl SurfaceSignal {
    /// A signal that never closes, for callers without a surface (batch jobs, tests).
    pub fn detached() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the owning surface closes or is dropped.
    pub async fn closed(&self) {
        let mut rx = self.rx.clone();
        // Err means the lifetime was dropped, which counts as closed.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
