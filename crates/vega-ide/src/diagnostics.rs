//! Which fixes claim which diagnostics.

use std::sync::OnceLock;

use lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};
use regex::Regex;
use vega_syntax::ParsedFile;
use vega_types::PackageView;

/// Fixers that repair a diagnostic at its own range.
pub const ANALYZER_FIXES: &[&str] = &[
    "fill_struct",
    "fill_switch",
    "stub_methods",
    "missing_method",
    "undeclared_name",
    "add_embed_import",
];

const SOURCE: &str = "vega";

struct Pattern {
    re: &'static str,
    fix: &'static str,
}

const PATTERNS: &[Pattern] = &[
    Pattern {
        re: r"does not implement \S+ \(missing method \w+\)",
        fix: "stub_methods",
    },
    Pattern {
        re: r"^\S+ undefined \(type .+ has no field or method \w+\)$",
        fix: "missing_method",
    },
    Pattern {
        re: r"^undefined: \w+$",
        fix: "undeclared_name",
    },
    Pattern {
        re: r#"go:embed .*import(?:s)? "embed""#,
        fix: "add_embed_import",
    },
];

fn compiled() -> &'static [(Regex, &'static str)] {
    static RE: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RE.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|p| (Regex::new(p.re).expect("valid regex"), p.fix))
            .collect()
    })
}

/// The analyzer fixer that claims `diagnostic`: the one named by its code,
/// or the one whose message pattern it matches.
pub fn analyzer_fix(diagnostic: &Diagnostic) -> Option<&'static str> {
    if let Some(NumberOrString::String(code)) = &diagnostic.code {
        if let Some(fix) = ANALYZER_FIXES.iter().find(|f| **f == code.as_str()) {
            return Some(fix);
        }
    }
    compiled()
        .iter()
        .find(|(re, _)| re.is_match(&diagnostic.message))
        .map(|(_, fix)| *fix)
}

/// Parse and type errors of `file` as protocol diagnostics.
pub fn file_diagnostics(view: &PackageView<'_>, file: &ParsedFile) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for error in &file.errors {
        if let Ok(range) = file.mapper.range_of(error.range.start(), error.range.end()) {
            out.push(diagnostic(range.into(), error.message.clone()));
        }
    }
    for error in view.type_errors() {
        let (Some(start), Some(end)) = (file.offset(error.pos), file.offset(error.end)) else {
            continue;
        };
        if let Ok(range) = file.mapper.range_of(start, end) {
            out.push(diagnostic(range.into(), error.message.clone()));
        }
    }
    out
}

fn diagnostic(range: lsp_types::Range, message: String) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some(SOURCE.to_string()),
        message,
        ..Diagnostic::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> Diagnostic {
        Diagnostic {
            message: text.to_string(),
            ..Diagnostic::default()
        }
    }

    #[test]
    fn messages_select_fixers() {
        assert_eq!(
            analyzer_fix(&message("myType does not implement Reader (missing method Read)")),
            Some("stub_methods")
        );
        assert_eq!(
            analyzer_fix(&message("t.Run undefined (type *T has no field or method Run)")),
            Some("missing_method")
        );
        assert_eq!(analyzer_fix(&message("undefined: count")), Some("undeclared_name"));
        assert_eq!(analyzer_fix(&message("declared and not used: x")), None);
    }

    #[test]
    fn codes_take_precedence() {
        let diagnostic = Diagnostic {
            code: Some(NumberOrString::String("fill_struct".into())),
            message: "Point literal is missing fields".into(),
            ..Diagnostic::default()
        };
        assert_eq!(analyzer_fix(&diagnostic), Some("fill_struct"));
    }
}
