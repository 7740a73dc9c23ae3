// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Modal dialog collaborator.
//!
//! `show` resolves once the user dismisses the dialog: `true` for confirm
//! (or OK on an alert), `false` for cancel.

use serde::Serialize;
use std::future::Future;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Props of one modal dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ModalProps {
    pub title: String,
    pub desc: String,
    /// Show confirm/cancel instead of a single OK
    pub is_confirm: bool,
}

impl ModalProps {
    pub fn alert(title: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            desc: desc.into(),
            is_confirm: false,
        }
    }

    pub fn confirm(title: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            desc: desc.into(),
            is_confirm: true,
        }
    }
}

pub trait Dialog: Send + Sync {
    fn show(&self, props: ModalProps) -> impl Future<Output = bool> + Send;
}

/// Headless dialog: logs the message, acknowledges alerts and declines
/// confirmations.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDialog;

impl Dialog for LogDialog {
    async fn show(&self, props: ModalProps) -> bool {
        tracing::info!(
            title = %props.title,
            desc = %props.desc,
            is_confirm = props.is_confirm,
            "Dialog shown"
        );
        !props.is_confirm
    }
}
