//! Score accumulation and the color unlock shop

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Palette color identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorId {
    White,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Gold,
}

impl ColorId {
    pub fn all() -> &'static [ColorId] {
        &[
            ColorId::White,
            ColorId::Red,
            ColorId::Orange,
            ColorId::Yellow,
            ColorId::Green,
            ColorId::Blue,
            ColorId::Purple,
            ColorId::Pink,
            ColorId::Gold,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorId::White => "White",
            ColorId::Red => "Red",
            ColorId::Orange => "Orange",
            ColorId::Yellow => "Yellow",
            ColorId::Green => "Green",
            ColorId::Blue => "Blue",
            ColorId::Purple => "Purple",
            ColorId::Pink => "Pink",
            ColorId::Gold => "Gold",
        }
    }

    pub fn rgba(&self) -> [u8; 4] {
        match self {
            ColorId::White => [255, 255, 255, 255],
            ColorId::Red => [239, 68, 68, 255],
            ColorId::Orange => [249, 115, 22, 255],
            ColorId::Yellow => [234, 179, 8, 255],
            ColorId::Green => [34, 197, 94, 255],
            ColorId::Blue => [59, 130, 246, 255],
            ColorId::Purple => [168, 85, 247, 255],
            ColorId::Pink => [236, 72, 153, 255],
            ColorId::Gold => [212, 175, 55, 255],
        }
    }

    pub fn hex(&self) -> String {
        let [r, g, b, _] = self.rgba();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// A purchasable palette color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopItem {
    pub name: &'static str,
    pub color: ColorId,
    /// Price in points, always positive
    pub cost: u64,
}

/// Static shop catalog. White is built in and never sold.
pub const CATALOG: &[ShopItem] = &[
    ShopItem { name: "Red", color: ColorId::Red, cost: 50 },
    ShopItem { name: "Orange", color: ColorId::Orange, cost: 75 },
    ShopItem { name: "Yellow", color: ColorId::Yellow, cost: 100 },
    ShopItem { name: "Green", color: ColorId::Green, cost: 150 },
    ShopItem { name: "Blue", color: ColorId::Blue, cost: 200 },
    ShopItem { name: "Purple", color: ColorId::Purple, cost: 300 },
    ShopItem { name: "Pink", color: ColorId::Pink, cost: 400 },
    ShopItem { name: "Gold", color: ColorId::Gold, cost: 1000 },
];

/// Catalog entry for `color`
pub fn shop_item(color: ColorId) -> Option<&'static ShopItem> {
    CATALOG.iter().find(|item| item.color == color)
}

/// Why a purchase was refused. Refusals never touch the score.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("{} is already unlocked", .0.name())]
    AlreadyUnlocked(ColorId),

    #[error("{} costs {cost} points, you have {score}", .color.name())]
    InsufficientScore { color: ColorId, cost: u64, score: u64 },

    #[error("{} is not for sale", .0.name())]
    NotForSale(ColorId),
}

/// Score balance plus unlocked palette
///
/// Invariant: `active` is always a member of `unlocked`, and `unlocked`
/// always contains white.
#[derive(Debug, Clone)]
pub struct Wallet {
    score: u64,
    unlocked: BTreeSet<ColorId>,
    active: ColorId,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Wallet {
    pub fn new() -> Self {
        Self {
            score: 0,
            unlocked: BTreeSet::from([ColorId::White]),
            active: ColorId::White,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Add points; returns the new score
    pub fn reward(&mut self, amount: u64) -> u64 {
        self.score = self.score.saturating_add(amount);
        self.score
    }

    /// Zero the score. Unlocked colors are kept.
    pub fn reset_score(&mut self) {
        self.score = 0;
    }

    /// Buy `color`, deducting its cost. Returns the remaining score.
    pub fn purchase(&mut self, color: ColorId) -> Result<u64, PurchaseError> {
        if self.unlocked.contains(&color) {
            return Err(PurchaseError::AlreadyUnlocked(color));
        }
        let Some(item) = shop_item(color) else {
            return Err(PurchaseError::NotForSale(color));
        };
        if self.score < item.cost {
            return Err(PurchaseError::InsufficientScore {
                color,
                cost: item.cost,
                score: self.score,
            });
        }

        self.score -= item.cost;
        self.unlocked.insert(color);
        Ok(self.score)
    }

    /// Switch the drawing color. Returns false (and changes nothing) when locked.
    pub fn set_active_color(&mut self, color: ColorId) -> bool {
        if !self.unlocked.contains(&color) {
            return false;
        }
        self.active = color;
        true
    }

    pub fn active_color(&self) -> ColorId {
        self.active
    }

    pub fn is_unlocked(&self, color: ColorId) -> bool {
        self.unlocked.contains(&color)
    }

    pub fn can_afford(&self, color: ColorId) -> bool {
        shop_item(color).is_some_and(|item| self.score >= item.cost)
    }

    pub fn unlocked_colors(&self) -> impl Iterator<Item = ColorId> + '_ {
        self.unlocked.iter().copied()
    }
}
