//! HDR engine command-line dialects.
//!
//! Older engine releases only accept short option spellings; newer ones use
//! long spellings. The dialect is chosen once from the reported version.

use std::fmt;

/// First version that speaks [`FlagDialect::Modern`].
pub const MODERN_SINCE: ToolVersion = ToolVersion {
    major: 2,
    minor: 3,
    patch: 0,
};

/// A `MAJOR.MINOR[.PATCH]` version reported by a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToolVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ToolVersion {
    /// Find the first version-looking token in a tool's `--version` output.
    pub fn parse_from_output(output: &str) -> Option<Self> {
        output
            .split(|c: char| c.is_whitespace() || c == ',' || c == '(' || c == ')')
            .find_map(Self::parse_token)
    }

    fn parse_token(token: &str) -> Option<Self> {
        let token = token.trim_start_matches(['v', 'V']);
        let mut parts = token.split('.');
        let major = parts.next()?.parse().ok()?;
        // Require at least MAJOR.MINOR so bare numbers are not mistaken for versions.
        let minor = leading_number(parts.next()?)?;
        let patch = parts.next().and_then(leading_number).unwrap_or(0);
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Flag spellings understood by a given engine release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagDialect {
    /// Releases before 2.3.0
    Legacy,
    #[default]
    Modern,
}

impl FlagDialect {
    /// Select the dialect for a detected version; unknown versions get the default.
    pub fn for_version(version: Option<ToolVersion>) -> Self {
        match version {
            Some(v) if v < MODERN_SINCE => Self::Legacy,
            _ => Self::Modern,
        }
    }

    pub fn align(self) -> &'static str {
        match self {
            Self::Legacy => "-a",
            Self::Modern => "--align",
        }
    }

    pub fn merge_config(self) -> &'static str {
        match self {
            Self::Legacy => "-c",
            Self::Modern => "--config",
        }
    }

    pub fn ev_list(self) -> &'static str {
        match self {
            Self::Legacy => "-e",
            Self::Modern => "--ev",
        }
    }

    pub fn output(self) -> &'static str {
        match self {
            Self::Legacy => "-o",
            Self::Modern => "--output",
        }
    }

    pub fn load(self) -> &'static str {
        match self {
            Self::Legacy => "-l",
            Self::Modern => "--load",
        }
    }

    pub fn operator(self) -> &'static str {
        match self {
            Self::Legacy => "-t",
            Self::Modern => "--tmo",
        }
    }

    pub fn operator_params(self) -> &'static str {
        match self {
            Self::Legacy => "-p",
            Self::Modern => "--tmoptions",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u32, minor: u32, patch: u32) -> ToolVersion {
        ToolVersion {
            major,
            minor,
            patch,
        }
    }

    #[test]
    fn test_parse_version_from_banner() {
        assert_eq!(
            ToolVersion::parse_from_output("luminance-hdr-cli 2.6.0\n"),
            Some(v(2, 6, 0))
        );
        assert_eq!(
            ToolVersion::parse_from_output("Luminance HDR v2.2.1 (build 2014)"),
            Some(v(2, 2, 1))
        );
        assert_eq!(ToolVersion::parse_from_output("version 2.4"), Some(v(2, 4, 0)));
        assert_eq!(
            ToolVersion::parse_from_output("2.5.1-rc1"),
            Some(v(2, 5, 1))
        );
    }

    #[test]
    fn test_parse_version_ignores_bare_numbers() {
        assert_eq!(ToolVersion::parse_from_output("build 1234"), None);
        assert_eq!(ToolVersion::parse_from_output(""), None);
    }

    #[test]
    fn test_dialect_boundary() {
        assert_eq!(FlagDialect::for_version(Some(v(2, 2, 9))), FlagDialect::Legacy);
        assert_eq!(FlagDialect::for_version(Some(v(1, 9, 0))), FlagDialect::Legacy);
        assert_eq!(FlagDialect::for_version(Some(v(2, 3, 0))), FlagDialect::Modern);
        assert_eq!(FlagDialect::for_version(Some(v(2, 6, 0))), FlagDialect::Modern);
        assert_eq!(FlagDialect::for_version(None), FlagDialect::Modern);
    }

    #[test]
    fn test_flag_spellings() {
        assert_eq!(FlagDialect::Legacy.output(), "-o");
        assert_eq!(FlagDialect::Modern.output(), "--output");
        assert_eq!(FlagDialect::Legacy.operator_params(), "-p");
        assert_eq!(FlagDialect::Modern.operator(), "--tmo");
    }
}
