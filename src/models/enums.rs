use serde::{Deserialize, Serialize};

/// Raised when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {field} value: '{value}'")]
pub struct UnknownVariant {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(UnknownVariant {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Upload allow-list. `image/jpg` is non-standard but some pickers report it.
str_enum!(MediaType {
    Png => "image/png",
    Jpeg => "image/jpeg",
    Jpg => "image/jpg",
    Gif => "image/gif",
    Bmp => "image/bmp",
    Webp => "image/webp",
});

impl MediaType {
    /// Parse a declared media type, ignoring case and parameters (`; charset=...`).
    pub fn from_declared(declared: &str) -> Option<Self> {
        let essence = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence.parse().ok()
    }
}

str_enum!(RejectionReason {
    InvalidType => "invalid_type",
    NotGrayscale => "not_grayscale",
    LowContrast => "low_contrast",
    NotRadiograph => "not_radiograph",
    ClassifierError => "classifier_error",
});

impl RejectionReason {
    /// Message shown next to the file picker.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidType => {
                "Please upload a valid image file (.png, .jpg, .jpeg, .gif, .bmp, .webp)"
            }
            Self::NotGrayscale => "Please upload a valid X-ray image.",
            Self::LowContrast => "Image does not appear to be an X-ray (low contrast).",
            Self::NotRadiograph => "The uploaded image is not recognized as an X-ray by the AI.",
            Self::ClassifierError => {
                "Could not verify the image type right now. Please try again in a moment."
            }
        }
    }

    /// Quality rejections are about the image; availability ones are about the service.
    pub fn is_availability_problem(&self) -> bool {
        matches!(self, Self::ClassifierError)
    }
}
