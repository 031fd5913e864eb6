// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ImageLabel;

/// Settings shared by both delivery channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `User-Agent` sent on every request.
    pub user_agent: String,
    /// Name of the deferred channel, used in its logs and its User-Agent.
    pub background_identifier: String,
    /// Header label for image messages.
    pub image_label: ImageLabel,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("sirius/{}", env!("CARGO_PKG_VERSION")),
            background_identifier: "sirius".into(),
            image_label: ImageLabel::Jpeg,
        }
    }
}

impl ClientConfig {
    /// Read a JSON config file.  A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write this config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
