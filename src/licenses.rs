//! Process-wide SPDX identifier tables.
//!
//! Loaded once as immutable statics and shared read-only with the
//! extraction workers. The current list is a curated subset of the SPDX
//! license list; identifiers outside it are either project-local
//! (`LicenseRef-` prefix) or bad.

/// Prefix reserved for free-form, project-local license identifiers.
pub const LICENSE_REF_PREFIX: &str = "LicenseRef-";

/// Current (non-deprecated) SPDX license identifiers.
pub static KNOWN_LICENSES: &[&str] = &[
    "0BSD",
    "AFL-3.0",
    "AGPL-3.0-only",
    "AGPL-3.0-or-later",
    "Apache-1.1",
    "Apache-2.0",
    "Artistic-2.0",
    "BSD-1-Clause",
    "BSD-2-Clause",
    "BSD-2-Clause-Patent",
    "BSD-3-Clause",
    "BSD-3-Clause-Clear",
    "BSD-4-Clause",
    "BSL-1.0",
    "CC-BY-3.0",
    "CC-BY-4.0",
    "CC-BY-NC-4.0",
    "CC-BY-NC-SA-4.0",
    "CC-BY-SA-3.0",
    "CC-BY-SA-4.0",
    "CC-PDDC",
    "CC0-1.0",
    "CDDL-1.0",
    "CECILL-2.1",
    "CECILL-B",
    "CECILL-C",
    "ClArtistic",
    "EPL-1.0",
    "EPL-2.0",
    "EUPL-1.1",
    "EUPL-1.2",
    "FSFAP",
    "GFDL-1.3-only",
    "GFDL-1.3-or-later",
    "GPL-1.0-only",
    "GPL-1.0-or-later",
    "GPL-2.0-only",
    "GPL-2.0-or-later",
    "GPL-3.0-only",
    "GPL-3.0-or-later",
    "HPND",
    "ISC",
    "LGPL-2.0-only",
    "LGPL-2.0-or-later",
    "LGPL-2.1-only",
    "LGPL-2.1-or-later",
    "LGPL-3.0-only",
    "LGPL-3.0-or-later",
    "MIT",
    "MIT-0",
    "MPL-1.1",
    "MPL-2.0",
    "MS-PL",
    "MS-RL",
    "NCSA",
    "ODbL-1.0",
    "OFL-1.1",
    "OpenSSL",
    "OSL-3.0",
    "PHP-3.01",
    "PSF-2.0",
    "Python-2.0",
    "Ruby",
    "SSPL-1.0",
    "Unicode-DFS-2016",
    "Unlicense",
    "UPL-1.0",
    "Vim",
    "W3C",
    "WTFPL",
    "X11",
    "Zlib",
    "ZPL-2.1",
];

/// Identifiers deprecated by SPDX. Still recognized on read; flagged in
/// the compliance report.
pub static DEPRECATED_LICENSES: &[&str] = &[
    "AGPL-1.0",
    "AGPL-3.0",
    "BSD-2-Clause-FreeBSD",
    "BSD-2-Clause-NetBSD",
    "GFDL-1.1",
    "GFDL-1.2",
    "GFDL-1.3",
    "GPL-1.0",
    "GPL-1.0+",
    "GPL-2.0",
    "GPL-2.0+",
    "GPL-3.0",
    "GPL-3.0+",
    "LGPL-2.0",
    "LGPL-2.0+",
    "LGPL-2.1",
    "LGPL-2.1+",
    "LGPL-3.0",
    "LGPL-3.0+",
    "Nunit",
    "StandardML-NJ",
    "bzip2-1.0.5",
    "eCos-2.0",
    "wxWindows",
];

/// Known SPDX license exceptions, valid after `WITH`.
pub static KNOWN_EXCEPTIONS: &[&str] = &[
    "389-exception",
    "Autoconf-exception-2.0",
    "Autoconf-exception-3.0",
    "Bison-exception-2.2",
    "Classpath-exception-2.0",
    "GCC-exception-2.0",
    "GCC-exception-3.1",
    "LLVM-exception",
    "Libtool-exception",
    "Linux-syscall-note",
    "OCaml-LGPL-linking-exception",
    "Qt-GPL-exception-1.0",
    "WxWindows-exception-3.1",
    "mif-exception",
    "openvpn-openssl-exception",
];

/// How a single identifier relates to the known tables.
///
/// Every identifier falls into exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Current SPDX identifier.
    Current,
    /// Identifier deprecated by SPDX.
    Deprecated,
    /// Free-form identifier under the `LicenseRef-` prefix.
    ProjectLocal,
    /// Not recognized at all.
    Bad,
}

/// Classify a license identifier as rendered (a trailing `+` is part of
/// the rendered form; `GPL-2.0+` is its own deprecated identifier, while
/// `Apache-2.0+` classifies through its base).
pub fn classify(id: &str) -> Classification {
    if id.starts_with(LICENSE_REF_PREFIX) {
        return Classification::ProjectLocal;
    }
    if KNOWN_LICENSES.contains(&id) {
        return Classification::Current;
    }
    if DEPRECATED_LICENSES.contains(&id) {
        return Classification::Deprecated;
    }
    if let Some(base) = id.strip_suffix('+') {
        if KNOWN_LICENSES.contains(&base) {
            return Classification::Current;
        }
        if DEPRECATED_LICENSES.contains(&base) {
            return Classification::Deprecated;
        }
    }
    Classification::Bad
}

/// Whether `id` names a known SPDX exception.
pub fn is_known_exception(id: &str) -> bool {
    KNOWN_EXCEPTIONS.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_current_and_deprecated() {
        assert_eq!(classify("MIT"), Classification::Current);
        assert_eq!(classify("GPL-3.0-or-later"), Classification::Current);
        assert_eq!(classify("GPL-3.0"), Classification::Deprecated);
        assert_eq!(classify("GPL-2.0+"), Classification::Deprecated);
    }

    #[test]
    fn test_classify_project_local_and_bad() {
        assert_eq!(classify("LicenseRef-Proprietary"), Classification::ProjectLocal);
        assert_eq!(classify("MyFancyLicense"), Classification::Bad);
    }

    #[test]
    fn test_classify_or_later_through_base() {
        assert_eq!(classify("Apache-2.0+"), Classification::Current);
        assert_eq!(classify("NotALicense+"), Classification::Bad);
    }

    #[test]
    fn test_classification_totality_is_disjoint() {
        // Every identifier in either table classifies into exactly its own class.
        for id in KNOWN_LICENSES {
            assert_eq!(classify(id), Classification::Current, "{id}");
        }
        for id in DEPRECATED_LICENSES {
            assert_eq!(classify(id), Classification::Deprecated, "{id}");
        }
    }
}
