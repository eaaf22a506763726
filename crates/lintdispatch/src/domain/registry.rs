//! The closed set of lint domains and their file-selection rules.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

/// A category of files sharing one membership rule and one external checker.
///
/// Variants are declared in registration order; [`Domain::ALL`] is the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Cpp,
    ObjC,
    Python,
    JavaScript,
    Gn,
    Patches,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Cpp,
        Domain::ObjC,
        Domain::Python,
        Domain::JavaScript,
        Domain::Gn,
        Domain::Patches,
    ];

    /// Stable identifier used in logs and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Domain::Cpp => "c++",
            Domain::ObjC => "objc",
            Domain::Python => "python",
            Domain::JavaScript => "javascript",
            Domain::Gn => "gn",
            Domain::Patches => "patches",
        }
    }

    /// Root-relative directories scanned for candidate files.
    pub fn roots(&self) -> &'static [&'static str] {
        match self {
            Domain::Cpp | Domain::ObjC => &["shell"],
            Domain::Python => &["script"],
            Domain::JavaScript => &[
                "build",
                "default_app",
                "lib",
                "npm",
                "script",
                "spec",
                "spec-main",
            ],
            Domain::Gn => &["."],
            Domain::Patches => &["patches"],
        }
    }

    /// Root-relative subtrees whose members are dropped from this domain's selection.
    pub fn exclusion_roots(&self) -> &'static [&'static str] {
        match self {
            Domain::JavaScript => &["spec/node_modules", "spec-main/node_modules"],
            _ => &[],
        }
    }

    /// Membership test over an absolute file path.
    pub fn is_member(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(OsStr::to_str);
        match self {
            Domain::Cpp => match ext {
                Some("cc") => true,
                Some("h") => !is_objc_header(path),
                _ => false,
            },
            Domain::ObjC => ext == Some("mm"),
            Domain::Python => ext == Some("py"),
            Domain::JavaScript => matches!(ext, Some("js" | "ts")),
            Domain::Gn => matches!(ext, Some("gn" | "gni")),
            Domain::Patches => true,
        }
    }

    /// Whether selections are split against the command-line length ceiling.
    ///
    /// The patch checker runs in-process and always sees its whole selection.
    pub fn is_batched(&self) -> bool {
        !matches!(self, Domain::Patches)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Headers under a `mac/` or `cocoa/` directory are Objective-C and belong to no C++ check.
fn is_objc_header(path: &Path) -> bool {
    path.parent().is_some_and(|parent| {
        parent
            .components()
            .any(|c| matches!(c.as_os_str().to_str(), Some("mac" | "cocoa")))
    })
}
