use image::imageops::FilterType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::resample::Kernel;

/// Interpolation used when resampling the source image.
///
/// The set is closed: any name outside it (including the empty string)
/// resolves to [`InterpolationMethod::Lanczos3`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterpolationMethod {
    NearestNeighbor,
    Bilinear,
    Bicubic,
    MitchellNetravali,
    Lanczos2,
    #[default]
    Lanczos3,
}

impl InterpolationMethod {
    pub const ALL: [InterpolationMethod; 6] = [
        Self::NearestNeighbor,
        Self::Bilinear,
        Self::Bicubic,
        Self::MitchellNetravali,
        Self::Lanczos2,
        Self::Lanczos3,
    ];

    /// Total mapping from a wire name to a method
    pub fn from_name(name: &str) -> Self {
        match name {
            "NearestNeighbor" => Self::NearestNeighbor,
            "Bilinear" => Self::Bilinear,
            "Bicubic" => Self::Bicubic,
            "MitchellNetravali" => Self::MitchellNetravali,
            "Lanczos2" => Self::Lanczos2,
            "Lanczos3" => Self::Lanczos3,
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearestNeighbor => "NearestNeighbor",
            Self::Bilinear => "Bilinear",
            Self::Bicubic => "Bicubic",
            Self::MitchellNetravali => "MitchellNetravali",
            Self::Lanczos2 => "Lanczos2",
            Self::Lanczos3 => "Lanczos3",
        }
    }

    /// How this method is carried out: a native `image::imageops` filter or
    /// one of the crate's own kernels
    pub(crate) fn resampler(&self) -> Resampler {
        match self {
            Self::NearestNeighbor => Resampler::Native(FilterType::Nearest),
            Self::Bilinear => Resampler::Native(FilterType::Triangle),
            Self::Bicubic => Resampler::Native(FilterType::CatmullRom),
            Self::Lanczos3 => Resampler::Native(FilterType::Lanczos3),
            Self::MitchellNetravali => Resampler::Custom(Kernel::MITCHELL),
            Self::Lanczos2 => Resampler::Custom(Kernel::LANCZOS2),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) enum Resampler {
    Native(FilterType),
    Custom(Kernel),
}

impl From<&str> for InterpolationMethod {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InterpolationMethod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InterpolationMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // null and unknown names both fall back to the default
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::from_name).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_round_trip_through_as_str() {
        for method in InterpolationMethod::ALL {
            assert_eq!(InterpolationMethod::from_name(method.as_str()), method);
        }
    }

    #[test]
    fn test_unknown_and_empty_default_to_lanczos3() {
        assert_eq!(InterpolationMethod::from("bogus"), InterpolationMethod::Lanczos3);
        assert_eq!(InterpolationMethod::from(""), InterpolationMethod::Lanczos3);
        // names are case-sensitive on the wire
        assert_eq!(InterpolationMethod::from("bilinear"), InterpolationMethod::Lanczos3);
    }

    #[test]
    fn test_deserialize_null_defaults() {
        let method: InterpolationMethod = serde_json::from_str("null").unwrap();
        assert_eq!(method, InterpolationMethod::Lanczos3);

        let method: InterpolationMethod = serde_json::from_str("\"Bicubic\"").unwrap();
        assert_eq!(method, InterpolationMethod::Bicubic);
    }

    #[test]
    fn test_resampler_mapping() {
        assert!(matches!(
            InterpolationMethod::Lanczos3.resampler(),
            Resampler::Native(FilterType::Lanczos3)
        ));
        assert!(matches!(
            InterpolationMethod::Bilinear.resampler(),
            Resampler::Native(FilterType::Triangle)
        ));
        assert!(matches!(InterpolationMethod::MitchellNetravali.resampler(), Resampler::Custom(_)));
        assert!(matches!(InterpolationMethod::Lanczos2.resampler(), Resampler::Custom(_)));
    }
}
