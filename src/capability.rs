//! Optional hardware units discovered at startup.
//!
//! A [`Capability`] is created once when a node is probed and never
//! re-created per request. It either holds a live driver handle or the
//! reason initialization failed.

use std::fmt;

/// A named optional hardware or backend unit.
pub struct Capability<H> {
    name: &'static str,
    handle: Option<H>,
    failure: Option<String>,
}

impl<H> Capability<H> {
    /// Attempts initialization, recording any failure instead of raising it.
    pub fn initialize<E, F>(name: &'static str, init: F) -> Self
    where
        E: fmt::Display,
        F: FnOnce() -> Result<H, E>,
    {
        match init() {
            Ok(handle) => {
                tracing::info!(capability = name, "Capability initialized");
                Self {
                    name,
                    handle: Some(handle),
                    failure: None,
                }
            }
            Err(e) => {
                tracing::warn!(capability = name, error = %e, "Capability unavailable");
                Self::unavailable(name, e.to_string())
            }
        }
    }

    /// Creates a capability that was never attempted.
    pub fn unavailable(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            handle: None,
            failure: Some(reason.into()),
        }
    }

    /// Returns the capability name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if the driver handle was created at probe time.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns the driver handle, if available.
    #[inline]
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    /// Returns the recorded initialization failure.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

impl<H> fmt::Debug for Capability<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("available", &self.is_available())
            .field("failure", &self.failure)
            .finish()
    }
}
