//! Toolchain records consumed as static configuration.
//!
//! The build cache stores and exposes these records without interpreting
//! them. Only the vendor default flag sets live here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The compiler vendor a toolchain belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    /// Microsoft Visual C++.
    Msvc,
    /// LLVM Clang.
    Clang,
    /// GNU Compiler Collection.
    Gcc,
}

impl ToolchainKind {
    /// Default compiler flags for this vendor.
    pub fn default_compiler_flags(self) -> Vec<String> {
        let flags: &[&str] = match self {
            ToolchainKind::Msvc => &["/EHsc", "/W4", "/WX", "/nologo", "/std:c++latest"],
            ToolchainKind::Clang => &[
                "-Wall",
                "-Werror",
                "-Wextra",
                "-fmodules",
                "-pedantic",
                "-std=c++20",
            ],
            ToolchainKind::Gcc => &["-Wall", "-Werror", "-Wextra", "-pedantic", "-std=c++20"],
        };
        flags.iter().map(|f| f.to_string()).collect()
    }

    /// Default linker flags for this vendor.
    pub fn default_linker_flags(self) -> Vec<String> {
        match self {
            ToolchainKind::Msvc => vec!["/NOLOGO".to_string()],
            ToolchainKind::Clang | ToolchainKind::Gcc => Vec::new(),
        }
    }

    /// Default archiver flags for this vendor.
    pub fn default_archiver_flags(self) -> Vec<String> {
        match self {
            ToolchainKind::Msvc => vec!["/NOLOGO".to_string()],
            ToolchainKind::Clang | ToolchainKind::Gcc => {
                vec!["r".to_string(), "c".to_string(), "s".to_string()]
            }
        }
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolchainKind::Msvc => write!(f, "msvc"),
            ToolchainKind::Clang => write!(f, "clang"),
            ToolchainKind::Gcc => write!(f, "gcc"),
        }
    }
}

/// A compiler/linker/archiver triple with its flag sets.
///
/// Omitted flag lists fall back to the vendor defaults through the
/// `effective_*` accessors; the record itself is stored verbatim.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Toolchain {
    /// The vendor tag.
    pub kind: ToolchainKind,
    /// Path to the compiler executable.
    pub compiler: PathBuf,
    /// Path to the linker executable.
    pub linker: PathBuf,
    /// Path to the archiver executable.
    pub archiver: PathBuf,
    /// Explicit compiler flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_flags: Option<Vec<String>>,
    /// Explicit linker flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linker_flags: Option<Vec<String>>,
    /// Explicit archiver flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archiver_flags: Option<Vec<String>>,
}

impl Toolchain {
    /// Compiler flags, or the vendor defaults when none were configured.
    pub fn effective_compiler_flags(&self) -> Vec<String> {
        self.compiler_flags
            .clone()
            .unwrap_or_else(|| self.kind.default_compiler_flags())
    }

    /// Linker flags, or the vendor defaults when none were configured.
    pub fn effective_linker_flags(&self) -> Vec<String> {
        self.linker_flags
            .clone()
            .unwrap_or_else(|| self.kind.default_linker_flags())
    }

    /// Archiver flags, or the vendor defaults when none were configured.
    pub fn effective_archiver_flags(&self) -> Vec<String> {
        self.archiver_flags
            .clone()
            .unwrap_or_else(|| self.kind.default_archiver_flags())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clang() -> Toolchain {
        Toolchain {
            kind: ToolchainKind::Clang,
            compiler: PathBuf::from("/usr/bin/clang++"),
            linker: PathBuf::from("/usr/bin/clang++"),
            archiver: PathBuf::from("/usr/bin/llvm-ar"),
            compiler_flags: None,
            linker_flags: None,
            archiver_flags: None,
        }
    }

    #[test]
    fn vendor_default_compiler_flags() {
        assert_eq!(
            ToolchainKind::Msvc.default_compiler_flags(),
            vec!["/EHsc", "/W4", "/WX", "/nologo", "/std:c++latest"]
        );
        assert_eq!(
            ToolchainKind::Gcc.default_compiler_flags(),
            vec!["-Wall", "-Werror", "-Wextra", "-pedantic", "-std=c++20"]
        );
        assert!(ToolchainKind::Clang
            .default_compiler_flags()
            .contains(&"-fmodules".to_string()));
    }

    #[test]
    fn explicit_flags_override_defaults() {
        let mut tc = clang();
        assert_eq!(tc.effective_archiver_flags(), vec!["r", "c", "s"]);
        tc.compiler_flags = Some(vec!["-std=c++23".to_string()]);
        assert_eq!(tc.effective_compiler_flags(), vec!["-std=c++23"]);
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&ToolchainKind::Msvc).unwrap();
        assert_eq!(json, "\"msvc\"");
        assert_eq!(ToolchainKind::Gcc.to_string(), "gcc");
    }

    #[test]
    fn serde_roundtrip_omits_unset_flags() {
        let tc = clang();
        let json = serde_json::to_string(&tc).unwrap();
        assert!(!json.contains("compiler_flags"));
        let back: Toolchain = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tc);
    }
}
