use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerId {
    AirQuality,
    Solar,
    Walkability,
    GreenSpaces,
    Transit,
}

impl LayerId {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::AirQuality,
            Self::Solar,
            Self::Walkability,
            Self::GreenSpaces,
            Self::Transit,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::AirQuality => "airQuality",
            Self::Solar => "solar",
            Self::Walkability => "walkability",
            Self::GreenSpaces => "greenSpaces",
            Self::Transit => "transit",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AirQuality => "Air Quality",
            Self::Solar => "Solar Potential",
            Self::Walkability => "Walkability",
            Self::GreenSpaces => "Green Spaces",
            Self::Transit => "Transit Access",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::AirQuality => "Real-time AQI data",
            Self::Solar => "Rooftop solar analysis",
            Self::Walkability => "Walkability score",
            Self::GreenSpaces => "Parks and natural areas",
            Self::Transit => "Public transportation",
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown layer '{0}'")]
pub struct UnknownLayer(pub String);

impl FromStr for LayerId {
    type Err = UnknownLayer;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|layer| layer.key().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnknownLayer(raw.to_string()))
    }
}

/// Which layers are conceptually switched on. Independent of rendering;
/// missing entries read as off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerActivationState {
    flags: BTreeMap<LayerId, bool>,
}

impl LayerActivationState {
    pub fn is_active(&self, layer: LayerId) -> bool {
        self.flags.get(&layer).copied().unwrap_or(false)
    }

    /// Returns the previous flag.
    pub fn set(&mut self, layer: LayerId, active: bool) -> bool {
        self.flags.insert(layer, active).unwrap_or(false)
    }

    pub fn active_layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        LayerId::ordered()
            .into_iter()
            .filter(move |layer| self.is_active(*layer))
    }

    pub fn all_active(&self) -> bool {
        LayerId::ordered().iter().all(|layer| self.is_active(*layer))
    }

    pub fn active_count(&self) -> usize {
        self.active_layers().count()
    }
}

impl FromIterator<LayerId> for LayerActivationState {
    fn from_iter<T: IntoIterator<Item = LayerId>>(iter: T) -> Self {
        let mut state = Self::default();
        for layer in iter {
            state.set(layer, true);
        }
        state
    }
}
