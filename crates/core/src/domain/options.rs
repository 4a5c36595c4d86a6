use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A closed set of selectable options identified by stable string keys.
pub trait OptionKey: Copy + Ord + fmt::Debug + 'static {
    const CATEGORY: &'static str;
    const ALL: &'static [Self];

    fn key(self) -> &'static str;
}

pub fn parse_option_key<T: OptionKey>(raw: &str) -> Result<T, DomainError> {
    let normalized = raw.trim().to_ascii_lowercase();
    T::ALL.iter().copied().find(|option| option.key() == normalized).ok_or_else(|| {
        DomainError::UnknownOption {
            category: T::CATEGORY,
            key: raw.trim().to_string(),
            expected: T::ALL.iter().map(|option| option.key()).collect::<Vec<_>>().join("|"),
        }
    })
}

macro_rules! option_keys {
    (
        $(#[$meta:meta])*
        $name:ident ($category:literal, default = $default:ident) {
            $($variant:ident => $key:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $key)] $variant),+
        }

        impl OptionKey for $name {
            const CATEGORY: &'static str = $category;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn key(self) -> &'static str {
                match self {
                    $(Self::$variant => $key),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                parse_option_key(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

option_keys! {
    /// Pricing region; flat amounts are scaled by the region multiplier unless overridden.
    Region("region", default = Global) {
        Global => "global",
        Co => "co",
        Ar => "ar",
        Es => "es",
    }
}

option_keys! {
    ProjectType("project_type", default = Landing) {
        Landing => "landing",
        Corporate => "corporate",
        Ecommerce => "ecommerce",
        SaasMvp => "saas-mvp",
    }
}

option_keys! {
    /// Design complexity tier (multiplier).
    DesignTier("design", default = Basic) {
        Basic => "basic",
        Pro => "pro",
        Premium => "premium",
    }
}

option_keys! {
    CmsTier("cms", default = None) {
        None => "none",
        Headless => "headless",
        Full => "full",
    }
}

option_keys! {
    CommerceTier("commerce", default = None) {
        None => "none",
        Lite => "lite",
        Pro => "pro",
    }
}

option_keys! {
    SeoTier("seo", default = None) {
        None => "none",
        Basic => "basic",
        Advanced => "advanced",
    }
}

option_keys! {
    CopyTier("copy", default = None) {
        None => "none",
        Basic => "basic",
        Full => "full",
    }
}

option_keys! {
    AnimationTier("animation", default = None) {
        None => "none",
        Subtle => "subtle",
        Advanced => "advanced",
    }
}

option_keys! {
    /// Delivery urgency tier (multiplier).
    UrgencyTier("urgency", default = Normal) {
        Normal => "normal",
        Fast => "fast",
        Express => "express",
    }
}

option_keys! {
    /// Ongoing maintenance plan, billed monthly.
    MaintenanceTier("maintenance", default = None) {
        None => "none",
        Basic => "basic",
        Pro => "pro",
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Design,
    Cms,
    Commerce,
    Seo,
    Copy,
    Animation,
    Urgency,
    Maintenance,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 8] = [
        Self::Design,
        Self::Cms,
        Self::Commerce,
        Self::Seo,
        Self::Copy,
        Self::Animation,
        Self::Urgency,
        Self::Maintenance,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Design => "design",
            Self::Cms => "cms",
            Self::Commerce => "commerce",
            Self::Seo => "seo",
            Self::Copy => "copy",
            Self::Animation => "animation",
            Self::Urgency => "urgency",
            Self::Maintenance => "maintenance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Design => "Design complexity",
            Self::Cms => "CMS",
            Self::Commerce => "E-commerce",
            Self::Seo => "SEO",
            Self::Copy => "Copywriting",
            Self::Animation => "Animations",
            Self::Urgency => "Urgency",
            Self::Maintenance => "Maintenance",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_option_key, CmsTier, OptionKey, ProjectType, Region};
    use crate::errors::DomainError;

    #[test]
    fn keys_parse_case_insensitively_and_trimmed() {
        assert_eq!(" SaaS-MVP ".parse::<ProjectType>(), Ok(ProjectType::SaasMvp));
        assert_eq!("ES".parse::<Region>(), Ok(Region::Es));
    }

    #[test]
    fn unknown_key_lists_accepted_values() {
        let error = parse_option_key::<CmsTier>("wordpress").expect_err("unknown key");
        assert_eq!(
            error,
            DomainError::UnknownOption {
                category: "cms",
                key: "wordpress".to_string(),
                expected: "none|headless|full".to_string(),
            }
        );
    }

    #[test]
    fn serde_uses_the_same_keys_as_display() {
        for project_type in ProjectType::ALL {
            let json = serde_json::to_string(project_type).expect("serialize");
            assert_eq!(json, format!("\"{project_type}\""));
        }
    }
}
