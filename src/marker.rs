//! Log markers.
//!
//! A marker tags a log line for downstream filtering and routing. With
//! `tracing` it rides along as a field:
//!
//! ```rust
//! use reqctx::marker::AUDIT;
//!
//! tracing::info!(marker = %AUDIT, user = "alice", "password changed");
//! ```

use std::fmt;

/// A named log tag.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Marker(&'static str);

impl Marker {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Needs a human to look at it now.
pub const ALERT: Marker = Marker::new("ALERT");

/// Belongs in the audit trail.
pub const AUDIT: Marker = Marker::new("AUDIT");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_display_their_name() {
        assert_eq!(ALERT.to_string(), "ALERT");
        assert_eq!(AUDIT.name(), "AUDIT");
        assert_ne!(ALERT, AUDIT);
    }
}
