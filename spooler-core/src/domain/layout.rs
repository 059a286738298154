//! Label layout
//!
//! Physical page settings used when a label is rendered and printed
//! interactively.

use serde::{Deserialize, Serialize};

/// Micrometres per inch, the unit print dialogs use for custom page sizes
pub const MICRONS_PER_INCH: f64 = 25_400.0;

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page setup for a single label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelLayout {
    pub width_in: f64,
    pub height_in: f64,
    pub borderless: bool,
    pub color: bool,
    pub copies: u32,
    pub orientation: Orientation,
}

impl LabelLayout {
    /// The 4in x 6.5in shipping label: borderless, monochrome, one copy, portrait
    pub fn shipping_label() -> Self {
        Self {
            width_in: 4.0,
            height_in: 6.5,
            borderless: true,
            color: false,
            copies: 1,
            orientation: Orientation::Portrait,
        }
    }

    /// Page width in micrometres, truncated
    pub fn width_microns(&self) -> u32 {
        (self.width_in * MICRONS_PER_INCH).floor() as u32
    }

    /// Page height in micrometres, truncated
    pub fn height_microns(&self) -> u32 {
        (self.height_in * MICRONS_PER_INCH).floor() as u32
    }

    /// CUPS custom media name, e.g. `Custom.4x6.5in`
    pub fn media_name(&self) -> String {
        format!("Custom.{}x{}in", self.width_in, self.height_in)
    }
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self::shipping_label()
    }
}
