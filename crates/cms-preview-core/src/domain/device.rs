//! Device catalog domain entity.
//!
//! A device is a named viewport size the preview frame can simulate.  The
//! special [`Dimension::Auto`] value means "fill the available space and do not
//! force fixed frame dimensions".
//!
//! The catalog is ordered (it drives the order of the picker buttons) and its
//! first entry must be an auto device: it is the default when nothing has
//! been persisted yet.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building a [`DeviceCatalog`].
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("device catalog must not be empty")]
    Empty,

    #[error("first catalog entry must be an auto device, found {0:?}")]
    FirstNotAuto(String),

    #[error("duplicate device name in catalog: {0:?}")]
    DuplicateName(String),
}

/// One axis of a device size: a pixel length or `"auto"`.
///
/// Serialized as a JSON number or the literal string `"auto"`, the same shape
/// persisted under the device storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "DimensionRepr")]
pub enum Dimension {
    Auto,
    Px(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Px(u32),
    Keyword(String),
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = String;

    fn try_from(value: DimensionRepr) -> Result<Self, Self::Error> {
        match value {
            DimensionRepr::Px(px) => Ok(Dimension::Px(px)),
            DimensionRepr::Keyword(k) if k == "auto" => Ok(Dimension::Auto),
            DimensionRepr::Keyword(k) => k
                .parse::<u32>()
                .map(Dimension::Px)
                .map_err(|_| format!("expected a pixel size or \"auto\", got {k:?}")),
        }
    }
}

impl From<Dimension> for DimensionRepr {
    fn from(value: Dimension) -> Self {
        match value {
            Dimension::Auto => DimensionRepr::Keyword("auto".to_string()),
            Dimension::Px(px) => DimensionRepr::Px(px),
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Auto => f.pad("auto"),
            Dimension::Px(px) => f.pad(&px.to_string()),
        }
    }
}

/// A named simulated viewport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub width: Dimension,
    pub height: Dimension,
}

impl Device {
    pub fn auto(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: Dimension::Auto,
            height: Dimension::Auto,
        }
    }

    pub fn fixed(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width: Dimension::Px(width),
            height: Dimension::Px(height),
        }
    }

    /// A device is auto-sized when its width is `auto`.
    pub fn is_auto(&self) -> bool {
        self.width == Dimension::Auto
    }

    /// Same device turned 90 degrees: width and height swapped.
    pub fn rotated(&self) -> Device {
        Device {
            name: self.name.clone(),
            width: self.height,
            height: self.width,
        }
    }

    /// Returns `(width, height)` in pixels for fixed-size devices.
    pub fn fixed_size(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Dimension::Px(w), Dimension::Px(h)) => Some((w, h)),
            _ => None,
        }
    }
}

/// The ordered, validated list of devices offered in the picker.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCatalog {
    devices: Vec<Device>,
}

impl DeviceCatalog {
    /// Validates and wraps a device list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Empty`] for an empty list,
    /// [`CatalogError::FirstNotAuto`] when the default entry is not auto-sized
    /// and [`CatalogError::DuplicateName`] when two devices share a name (the
    /// name is what the picker buttons and the persisted state are keyed on).
    pub fn new(devices: Vec<Device>) -> Result<Self, CatalogError> {
        let first = devices.first().ok_or(CatalogError::Empty)?;
        if !first.is_auto() {
            return Err(CatalogError::FirstNotAuto(first.name.clone()));
        }
        for (i, device) in devices.iter().enumerate() {
            if devices[..i].iter().any(|d| d.name == device.name) {
                return Err(CatalogError::DuplicateName(device.name.clone()));
            }
        }
        Ok(Self { devices })
    }

    /// The default device: always the first, auto-sized entry.
    pub fn default_device(&self) -> &Device {
        &self.devices[0]
    }

    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self {
            devices: vec![
                Device::auto("Auto"),
                Device::fixed("iPhone 5", 320, 568),
                Device::fixed("iPhone 7", 375, 667),
                Device::fixed("iPhone 7+", 414, 736),
                Device::fixed("iPad", 768, 1024),
                Device::fixed("iPad Pro", 1024, 1366),
                Device::fixed("Widescreen", 1280, 800),
            ],
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
