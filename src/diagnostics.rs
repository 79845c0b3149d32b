//! Diagnostics sink for recoverable failures.
//!
//! Every failure the materializer absorbs is handed to a [`Diagnostics`]
//! implementation passed into the parse. Nothing is written to global state.

use std::fmt;

use crate::error::MaterializeError;

/// How serious a reported failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Debug => write!(f, "debug"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One reported failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub cause: Option<MaterializeError>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>, cause: MaterializeError) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Debug,
            message: message.into(),
            cause: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "[{}] {}: {}", self.severity, self.message, cause),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

/// Receiver for diagnostics produced during a parse.
pub trait Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Closure-based implementation of Diagnostics
impl<F> Diagnostics for F
where
    F: FnMut(Diagnostic),
{
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    diagnostics: Vec<Diagnostic>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics at or above the given severity.
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity >= severity)
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl Diagnostics for Collector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        let cause = diagnostic
            .cause
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_default();
        match diagnostic.severity {
            Severity::Debug => tracing::debug!(cause = %cause, "{}", diagnostic.message),
            Severity::Info => tracing::info!(cause = %cause, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(cause = %cause, "{}", diagnostic.message),
            Severity::Error => tracing::error!(cause = %cause, "{}", diagnostic.message),
        }
    }
}
