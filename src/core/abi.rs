//! Purpose: ABI version arithmetic and per-category expectations.
//! Exports: `AbiVersion`, `Category`, `is_compatible`.
//! Role: Negotiator consulted by the lifecycle right after required symbols resolve.
//! Invariants: Only the major component gates loading; minor only informs optional symbols.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Plugin-reported version, packed as `major << 16 | minor`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbiVersion(u32);

impl AbiVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self(((major as u32) << 16) | minor as u32)
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u32 {
        self.0 >> 16
    }

    pub const fn minor(self) -> u32 {
        self.0 & 0xffff
    }

    pub const fn is_compatible(self, expected_major: u32) -> bool {
        is_compatible(self.0, expected_major)
    }
}

impl fmt::Display for AbiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

pub const fn is_compatible(reported: u32, expected_major: u32) -> bool {
    (reported >> 16) == expected_major
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Decoder,
    Encoder,
    EffectCompiler,
    ModelIo,
    MotionIo,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Decoder,
        Category::Encoder,
        Category::EffectCompiler,
        Category::ModelIo,
        Category::MotionIo,
    ];

    /// Symbol prefix; every exported function is `<prefix><Name>`.
    pub const fn symbol_prefix(self) -> &'static str {
        match self {
            Category::Decoder => "nanoemApplicationPluginDecoder",
            Category::Encoder => "nanoemApplicationPluginEncoder",
            Category::EffectCompiler => "nanoemApplicationPluginEffectCompiler",
            Category::ModelIo => "nanoemApplicationPluginModelIO",
            Category::MotionIo => "nanoemApplicationPluginMotionIO",
        }
    }

    pub const fn expected_major(self) -> u32 {
        2
    }

    /// Highest minor revision this host knows how to drive.
    pub const fn host_version(self) -> AbiVersion {
        match self {
            Category::ModelIo => AbiVersion::new(2, 1),
            _ => AbiVersion::new(2, 0),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Category::Decoder => "decoder",
            Category::Encoder => "encoder",
            Category::EffectCompiler => "effect compiler",
            Category::ModelIo => "model io",
            Category::MotionIo => "motion io",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::{AbiVersion, Category, is_compatible};

    #[test]
    fn major_gates_and_minor_does_not() {
        assert!(is_compatible(0x0002_0000, 2));
        assert!(is_compatible(0x0002_0007, 2));
        assert!(!is_compatible(0x0001_ffff, 2));
        assert!(!is_compatible(0x0003_0000, 2));
    }

    #[test]
    fn packs_major_and_minor() {
        let version = AbiVersion::new(2, 1);
        assert_eq!(version.raw(), 0x0002_0001);
        assert_eq!(version.major(), 2);
        assert_eq!(version.minor(), 1);
        assert_eq!(version.to_string(), "2.1");
    }

    #[test]
    fn every_category_expects_major_two() {
        for category in Category::ALL {
            assert_eq!(category.expected_major(), 2);
            assert!(category.host_version().is_compatible(2));
        }
        assert_eq!(Category::ModelIo.host_version().minor(), 1);
    }
}
