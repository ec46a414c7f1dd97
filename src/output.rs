//! Output rendering for the compliance report and the bill-of-materials.
//!
//! Supports `human` (default) and `json` outputs for `lint`; `bom`
//! renders a tag-value document enumerating every scanned file.

use owo_colors::OwoColorize;
use serde_json::Value as JsonVal;

use crate::models::ProjectIndex;
use crate::report::ComplianceReport;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Print the report in the requested format.
pub fn print_report(report: &ComplianceReport, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_report_json(report)).unwrap()
        ),
        _ => print!("{}", render_human(report, use_colors(output))),
    }
}

/// Compose the report JSON (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &ComplianceReport) -> JsonVal {
    serde_json::to_value(report).unwrap()
}

fn section(out: &mut String, title: &str, color: bool) {
    let heading = format!("# {title}");
    if color {
        out.push_str(&heading.bold().to_string());
    } else {
        out.push_str(&heading);
    }
    out.push_str("\n\n");
}

/// Render the categorized human-readable report.
pub fn render_human(report: &ComplianceReport, color: bool) -> String {
    let mut out = String::new();

    if !report.bad_licenses.is_empty() {
        section(&mut out, "BAD LICENSES", color);
        for (id, files) in &report.bad_licenses {
            out.push_str(&format!("'{id}' found in:\n"));
            for file in files {
                out.push_str(&format!("* {}\n", file.display()));
            }
        }
        out.push('\n');
    }

    if !report.deprecated_licenses.is_empty() {
        section(&mut out, "DEPRECATED LICENSES", color);
        out.push_str("The following licenses are deprecated by SPDX:\n");
        for id in &report.deprecated_licenses {
            out.push_str(&format!("* {id}\n"));
        }
        out.push('\n');
    }

    if !report.licenses_without_extension.is_empty() {
        section(&mut out, "LICENSES WITHOUT FILE EXTENSION", color);
        out.push_str("The following licenses have no file extension:\n");
        for id in &report.licenses_without_extension {
            out.push_str(&format!("* {id}\n"));
        }
        out.push('\n');
    }

    if !report.missing_licenses.is_empty() {
        section(&mut out, "MISSING LICENSES", color);
        for (id, files) in &report.missing_licenses {
            out.push_str(&format!("'{id}' found in:\n"));
            for file in files {
                out.push_str(&format!("* {}\n", file.display()));
            }
        }
        out.push('\n');
    }

    if !report.unused_licenses.is_empty() {
        section(&mut out, "UNUSED LICENSES", color);
        out.push_str("The following licenses are not used:\n");
        for id in &report.unused_licenses {
            out.push_str(&format!("* {id}\n"));
        }
        out.push('\n');
    }

    if !report.read_errors.is_empty() {
        section(&mut out, "READ ERRORS", color);
        out.push_str("Could not read:\n");
        for (file, err) in &report.read_errors {
            out.push_str(&format!("* {}: {err}\n", file.display()));
        }
        out.push('\n');
    }

    let without_both: Vec<_> = report
        .files_without_copyright
        .intersection(&report.files_without_license)
        .collect();
    if !report.files_without_copyright.is_empty() || !report.files_without_license.is_empty() {
        section(&mut out, "MISSING COPYRIGHT AND LICENSING INFORMATION", color);
        if !without_both.is_empty() {
            out.push_str("The following files have no copyright and licensing information:\n");
            for file in &without_both {
                out.push_str(&format!("* {}\n", file.display()));
            }
            out.push('\n');
        }
        for file in &report.files_without_copyright {
            if !without_both.contains(&file) {
                out.push_str(&format!(
                    "* {} has no copyright information\n",
                    file.display()
                ));
            }
        }
        for file in &report.files_without_license {
            if !without_both.contains(&file) {
                out.push_str(&format!(
                    "* {} has no licensing information\n",
                    file.display()
                ));
            }
        }
        out.push('\n');
    }

    section(&mut out, "SUMMARY", color);
    let used: Vec<&str> = report.used_licenses.iter().map(String::as_str).collect();
    out.push_str(&format!("* Bad licenses: {}\n", report.bad_licenses.len()));
    out.push_str(&format!(
        "* Deprecated licenses: {}\n",
        report.deprecated_licenses.len()
    ));
    out.push_str(&format!(
        "* Licenses without file extension: {}\n",
        report.licenses_without_extension.len()
    ));
    out.push_str(&format!(
        "* Missing licenses: {}\n",
        report.missing_licenses.len()
    ));
    out.push_str(&format!(
        "* Unused licenses: {}\n",
        report.unused_licenses.len()
    ));
    out.push_str(&format!("* Used licenses: {}\n", used.join(", ")));
    out.push_str(&format!("* Read errors: {}\n", report.read_errors.len()));
    out.push_str(&format!(
        "* Files with copyright information: {} / {}\n",
        report.summary.files_with_copyright, report.summary.files_total
    ));
    out.push_str(&format!(
        "* Files with license information: {} / {}\n",
        report.summary.files_with_license, report.summary.files_total
    ));
    out.push('\n');

    let verdict = if report.is_compliant() {
        "Compliant: all files carry copyright and licensing information."
    } else {
        "Not compliant: see the categories above."
    };
    if color {
        if report.is_compliant() {
            out.push_str(&verdict.green().bold().to_string());
        } else {
            out.push_str(&verdict.red().bold().to_string());
        }
    } else {
        out.push_str(verdict);
    }
    out.push('\n');
    out
}

/// Render the tag-value bill-of-materials for every scanned file.
pub fn render_bom(index: &ProjectIndex) -> String {
    let mut out = String::new();
    out.push_str("SPDXVersion: SPDX-2.1\n");
    out.push_str("DataLicense: CC0-1.0\n");
    out.push_str("SPDXID: SPDXRef-DOCUMENT\n");
    let name = index
        .root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    out.push_str(&format!("DocumentName: {name}\n"));
    out.push_str(&format!(
        "Creator: Tool: lintel-{}\n",
        env!("CARGO_PKG_VERSION")
    ));

    for (n, meta) in index.files.values().enumerate() {
        out.push('\n');
        out.push_str(&format!("FileName: ./{}\n", meta.path.display()));
        out.push_str(&format!("SPDXID: SPDXRef-{}\n", n + 1));
        if meta.expressions.is_empty() {
            out.push_str("LicenseInfoInFile: NONE\n");
        } else {
            for expr in &meta.expressions {
                out.push_str(&format!("LicenseInfoInFile: {expr}\n"));
            }
        }
        match meta.copyright_lines.len() {
            0 => out.push_str("FileCopyrightText: NONE\n"),
            1 => out.push_str(&format!(
                "FileCopyrightText: {}\n",
                meta.copyright_lines.iter().next().unwrap()
            )),
            _ => {
                out.push_str("FileCopyrightText: <text>\n");
                for line in &meta.copyright_lines {
                    out.push_str(&format!("{line}\n"));
                }
                out.push_str("</text>\n");
            }
        }
    }
    out
}

/// Print the bill-of-materials to stdout.
pub fn print_bom(index: &ProjectIndex) {
    print!("{}", render_bom(index));
}
