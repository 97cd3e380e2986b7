// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward catalog model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Catalog item that can be redeemed for points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    /// Document ID
    pub id: String,
    pub name: String,
    pub description: String,
    /// Cost in points (>= 0)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points_required: i64,
    /// Remaining units; never negative
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: String,
}

/// Fields supplied when adding a catalog item.
#[derive(Debug, Clone, Default)]
pub struct NewReward {
    pub name: String,
    pub description: String,
    pub points_required: i64,
    pub stock: u32,
    pub image_url: Option<String>,
}

impl NewReward {
    pub fn into_reward(self, id: String, now: &str) -> Reward {
        Reward {
            id,
            name: self.name,
            description: self.description,
            points_required: self.points_required,
            stock: self.stock,
            image_url: self.image_url,
            created_at: now.to_string(),
        }
    }
}
