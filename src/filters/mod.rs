// SPDX-License-Identifier: GPL-3.0-only

//! Filter catalog
//!
//! A fixed, ordered table of the looks a user can pick before a capture.
//! Each entry is a chain of [`Adjustment`]s that the rasterizer renders onto
//! the output surface; the live frame itself is never modified.

mod adjust;

pub use adjust::{ColorOp, apply_adjustments, apply_color_op};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a catalog entry
///
/// Serialized by label; deserialization goes through [`FilterId::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FilterId {
    /// No filter applied
    #[default]
    Original,
    #[serde(rename = "90s")]
    Nineties,
    #[serde(rename = "2000s")]
    TwoThousands,
    Noir,
    /// Colour approximation only, no lens distortion
    Fisheye,
    Rainbow,
    Glitch,
    Crosshatch,
    Sepia,
    Vintage,
    Vivid,
    Blur,
    Brightness,
    Contrast,
    Grayscale,
    Invert,
    /// Colour approximation only, no block sampling
    Pixelate,
}

impl FilterId {
    /// All filters in catalog order
    pub const ALL: [FilterId; 17] = [
        FilterId::Original,
        FilterId::Nineties,
        FilterId::TwoThousands,
        FilterId::Noir,
        FilterId::Fisheye,
        FilterId::Rainbow,
        FilterId::Glitch,
        FilterId::Crosshatch,
        FilterId::Sepia,
        FilterId::Vintage,
        FilterId::Vivid,
        FilterId::Blur,
        FilterId::Brightness,
        FilterId::Contrast,
        FilterId::Grayscale,
        FilterId::Invert,
        FilterId::Pixelate,
    ];

    /// Position in the catalog
    pub fn index(self) -> usize {
        // ALL mirrors the declaration order
        self as usize
    }

    /// Catalog entry for this filter
    pub fn descriptor(self) -> &'static FilterDescriptor {
        &CATALOG[self.index()]
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    /// Next filter in catalog order (wraps around)
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous filter in catalog order (wraps around)
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Look up a filter by its label, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.label().eq_ignore_ascii_case(name))
    }

    /// Whether rendering this filter changes pixels
    pub fn is_identity(self) -> bool {
        self.descriptor().adjustments.is_empty()
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for FilterId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown filter '{}'", s))
    }
}

impl TryFrom<String> for FilterId {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

/// A single image adjustment, applied in order
///
/// Amounts follow the CSS filter function conventions: `1.0` is full effect
/// for grayscale/sepia/invert and "unchanged" for the multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    Grayscale(f32),
    Sepia(f32),
    Saturate(f32),
    /// Degrees
    HueRotate(f32),
    Brightness(f32),
    Contrast(f32),
    Invert(f32),
    /// Gaussian standard deviation in output pixels
    Blur(f32),
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Grayscale(a) => write!(f, "grayscale({})", a),
            Adjustment::Sepia(a) => write!(f, "sepia({})", a),
            Adjustment::Saturate(a) => write!(f, "saturate({})", a),
            Adjustment::HueRotate(deg) => write!(f, "hue-rotate({}deg)", deg),
            Adjustment::Brightness(a) => write!(f, "brightness({})", a),
            Adjustment::Contrast(a) => write!(f, "contrast({})", a),
            Adjustment::Invert(a) => write!(f, "invert({})", a),
            Adjustment::Blur(px) => write!(f, "blur({}px)", px),
        }
    }
}

/// Catalog entry
#[derive(Debug)]
pub struct FilterDescriptor {
    pub id: FilterId,
    pub label: &'static str,
    pub adjustments: &'static [Adjustment],
    /// Presentation only
    pub icon: &'static str,
    /// Presentation only: gradient stops for the picker button
    pub accent: (&'static str, &'static str),
}

impl FilterDescriptor {
    /// The chain written as a CSS filter expression ("none" for the identity)
    pub fn expression(&self) -> String {
        if self.adjustments.is_empty() {
            return "none".to_string();
        }
        self.adjustments
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

use Adjustment::*;

static CATALOG: [FilterDescriptor; 17] = [
    FilterDescriptor {
        id: FilterId::Original,
        label: "Original",
        adjustments: &[],
        icon: "🟢",
        accent: ("gray-200", "gray-400"),
    },
    FilterDescriptor {
        id: FilterId::Nineties,
        label: "90s",
        adjustments: &[Sepia(0.8), Saturate(1.4), HueRotate(315.0), Brightness(1.1)],
        icon: "🌅",
        accent: ("amber-400", "orange-500"),
    },
    FilterDescriptor {
        id: FilterId::TwoThousands,
        label: "2000s",
        adjustments: &[Saturate(1.6), Contrast(1.2), Brightness(1.1), HueRotate(10.0)],
        icon: "💫",
        accent: ("blue-400", "purple-500"),
    },
    FilterDescriptor {
        id: FilterId::Noir,
        label: "Noir",
        adjustments: &[Grayscale(1.0), Contrast(1.3), Brightness(0.9)],
        icon: "🎭",
        accent: ("gray-600", "gray-800"),
    },
    FilterDescriptor {
        id: FilterId::Fisheye,
        label: "Fisheye",
        adjustments: &[Contrast(1.2), Saturate(1.3)],
        icon: "🐠",
        accent: ("teal-400", "cyan-500"),
    },
    FilterDescriptor {
        id: FilterId::Rainbow,
        label: "Rainbow",
        adjustments: &[HueRotate(180.0), Saturate(2.0), Brightness(1.2)],
        icon: "🌈",
        accent: ("pink-400", "red-500"),
    },
    FilterDescriptor {
        id: FilterId::Glitch,
        label: "Glitch",
        adjustments: &[HueRotate(90.0), Saturate(2.0), Contrast(1.5)],
        icon: "⚡",
        accent: ("green-400", "emerald-500"),
    },
    FilterDescriptor {
        id: FilterId::Crosshatch,
        label: "Crosshatch",
        adjustments: &[Contrast(1.4), Brightness(0.8), Saturate(0.8)],
        icon: "✨",
        accent: ("indigo-400", "purple-600"),
    },
    FilterDescriptor {
        id: FilterId::Sepia,
        label: "Sepia",
        adjustments: &[Sepia(1.0)],
        icon: "🟤",
        accent: ("yellow-700", "yellow-400"),
    },
    FilterDescriptor {
        id: FilterId::Vintage,
        label: "Vintage",
        adjustments: &[Sepia(0.6), Contrast(1.1), Brightness(0.95)],
        icon: "📻",
        accent: ("yellow-900", "yellow-600"),
    },
    FilterDescriptor {
        id: FilterId::Vivid,
        label: "Vivid",
        adjustments: &[Saturate(2.0), Brightness(1.2)],
        icon: "🌞",
        accent: ("red-400", "yellow-400"),
    },
    FilterDescriptor {
        id: FilterId::Blur,
        label: "Blur",
        adjustments: &[Blur(2.0)],
        icon: "💧",
        accent: ("blue-200", "blue-400"),
    },
    FilterDescriptor {
        id: FilterId::Brightness,
        label: "Brightness",
        adjustments: &[Brightness(1.5)],
        icon: "🔆",
        accent: ("yellow-200", "yellow-400"),
    },
    FilterDescriptor {
        id: FilterId::Contrast,
        label: "Contrast",
        adjustments: &[Contrast(2.0)],
        icon: "⚫",
        accent: ("gray-800", "gray-400"),
    },
    FilterDescriptor {
        id: FilterId::Grayscale,
        label: "Grayscale",
        adjustments: &[Grayscale(1.0)],
        icon: "⚪",
        accent: ("gray-400", "gray-700"),
    },
    FilterDescriptor {
        id: FilterId::Invert,
        label: "Invert",
        adjustments: &[Invert(1.0)],
        icon: "🔄",
        accent: ("black", "white"),
    },
    FilterDescriptor {
        id: FilterId::Pixelate,
        label: "Pixelate",
        adjustments: &[Contrast(1.2), Saturate(1.2)],
        icon: "🟪",
        accent: ("pink-200", "pink-400"),
    },
];
