// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cross-frame messages posted by an embedded map to its parent page.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Message type tag of a picked location.
pub const LOCATION_MESSAGE_TYPE: &str = "LOCATION";

const SEPARATOR: &str = "||";

/// `{ "type": "LOCATION", "text": "<fx>||<fy>" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl LocationMessage {
    pub fn new(fx: f64, fy: f64) -> Self {
        Self {
            kind: LOCATION_MESSAGE_TYPE.to_string(),
            text: format!("{}{}{}", fx, SEPARATOR, fy),
        }
    }

    /// Normalized location carried by the message.
    pub fn parse(&self) -> Option<(f64, f64)> {
        if self.kind != LOCATION_MESSAGE_TYPE {
            return None;
        }
        let (fx, fy) = self.text.split_once(SEPARATOR)?;
        Some((fx.trim().parse().ok()?, fy.trim().parse().ok()?))
    }
}

/// Channel to the parent frame.
pub trait FrameMessenger: Send + Sync {
    fn post(&self, message: LocationMessage) -> Result<(), AppError>;
}

impl FrameMessenger for UnboundedSender<LocationMessage> {
    fn post(&self, message: LocationMessage) -> Result<(), AppError> {
        self.send(message)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Parent frame is gone")))
    }
}
