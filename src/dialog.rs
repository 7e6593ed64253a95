//! Shared dialog/freeze context.
//!
//! One `FormDialog` exists per dialog activation. All consumers of a form (the
//! draft controller, the attempt limiter, action buttons) hold clones of the
//! same handle and observe the same `disabled` flag. Nothing here clears a
//! freeze: a fresh context is created when the dialog is reopened.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
pub struct FormDialog {
    inner: Arc<DialogState>,
}

#[derive(Debug)]
struct DialogState {
    open: AtomicBool,
    disabled: AtomicBool,
}

impl FormDialog {
    /// Open, enabled context
    pub fn new() -> Self {
        Self::with_open(true)
    }

    pub fn with_open(open: bool) -> Self {
        Self {
            inner: Arc::new(DialogState {
                open: AtomicBool::new(open),
                disabled: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst)
    }

    pub fn open_dialog(&self) {
        self.inner.open.store(true, Ordering::SeqCst);
    }

    pub fn close_dialog(&self) {
        self.inner.open.store(false, Ordering::SeqCst);
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.disabled.load(Ordering::SeqCst)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.inner.disabled.store(disabled, Ordering::SeqCst);
    }

    /// True when both handles refer to the same context
    pub fn same_context(&self, other: &FormDialog) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for FormDialog {
    fn default() -> Self {
        Self::new()
    }
}
