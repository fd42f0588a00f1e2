//! Version token rewriting
//!
//! Pure line-level substitution of the three recognized token families:
//! - `AssemblyVersion("...")`
//! - `AssemblyFileVersion("...")`
//! - `APP_VERSION "..."`
//!
//! Global invariants enforced:
//! - Only the quoted literal of a recognized token changes
//! - Line terminators (`\n`, `\r\n`, none) are preserved
//! - Works on raw bytes, so non-UTF-8 content outside tokens is untouched

use crate::version::VersionTuple;
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// A recognized version token family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFamily {
    AssemblyVersion,
    AssemblyFileVersion,
    AppVersion,
}

impl TokenFamily {
    /// All families, in the order they are applied to each line
    pub const ALL: [TokenFamily; 3] = [
        TokenFamily::AssemblyVersion,
        TokenFamily::AssemblyFileVersion,
        TokenFamily::AppVersion,
    ];

    pub fn marker(self) -> &'static str {
        match self {
            TokenFamily::AssemblyVersion => "AssemblyVersion",
            TokenFamily::AssemblyFileVersion => "AssemblyFileVersion",
            TokenFamily::AppVersion => "APP_VERSION",
        }
    }

    // Group 1 is always the marker, group 2 (APP_VERSION only) the separator.
    fn pattern(self) -> String {
        match self {
            TokenFamily::AssemblyVersion | TokenFamily::AssemblyFileVersion => format!(
                r#"(?-u)({}(?:Attribute)?)[ \t]*\([ \t]*"[^"\r\n]*""#,
                self.marker()
            ),
            TokenFamily::AppVersion => {
                format!(r#"(?-u)({})([ \t]+)"[^"\r\n]*""#, self.marker())
            }
        }
    }

    fn regex(self) -> &'static Regex {
        static ASSEMBLY_VERSION: OnceLock<Regex> = OnceLock::new();
        static ASSEMBLY_FILE_VERSION: OnceLock<Regex> = OnceLock::new();
        static APP_VERSION: OnceLock<Regex> = OnceLock::new();

        let cell = match self {
            TokenFamily::AssemblyVersion => &ASSEMBLY_VERSION,
            TokenFamily::AssemblyFileVersion => &ASSEMBLY_FILE_VERSION,
            TokenFamily::AppVersion => &APP_VERSION,
        };
        cell.get_or_init(|| Regex::new(&self.pattern()).unwrap())
    }

    fn replacement(self, caps: &Captures<'_>, version: &str) -> Vec<u8> {
        let mut out = caps[1].to_vec();
        match self {
            TokenFamily::AssemblyVersion | TokenFamily::AssemblyFileVersion => {
                out.extend_from_slice(b"(\"");
            }
            TokenFamily::AppVersion => {
                out.extend_from_slice(&caps[2]);
                out.push(b'"');
            }
        }
        out.extend_from_slice(version.as_bytes());
        out.push(b'"');
        out
    }

    fn rewrite<'a>(self, line: &'a [u8], version: &str, count: &mut usize) -> Cow<'a, [u8]> {
        self.regex().replace_all(line, |caps: &Captures<'_>| {
            *count += 1;
            self.replacement(caps, version)
        })
    }
}

/// Result of rewriting a whole buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub bytes: Vec<u8>,
    /// Number of tokens matched across all lines
    pub replacements: usize,
}

/// Rewrite every recognized token on a single line
///
/// A line may carry more than one token; all families are applied in order.
pub fn rewrite_line<'a>(line: &'a [u8], version: &VersionTuple) -> Cow<'a, [u8]> {
    let mut count = 0;
    rewrite_counted(line, &version.to_string(), &mut count)
}

fn rewrite_counted<'a>(line: &'a [u8], version: &str, count: &mut usize) -> Cow<'a, [u8]> {
    let mut current = Cow::Borrowed(line);
    for family in TokenFamily::ALL {
        let replaced = family.rewrite(&current, version, count);
        let next = match replaced {
            Cow::Borrowed(_) => continue,
            Cow::Owned(bytes) => bytes,
        };
        current = Cow::Owned(next);
    }
    current
}

/// Rewrite a full file buffer line by line
pub fn rewrite_content(content: &[u8], version: &VersionTuple) -> Rewritten {
    let version = version.to_string();
    let mut bytes = Vec::with_capacity(content.len());
    let mut replacements = 0;

    for line in content.split_inclusive(|&b| b == b'\n') {
        bytes.extend_from_slice(&rewrite_counted(line, &version, &mut replacements));
    }

    Rewritten {
        bytes,
        replacements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version() -> VersionTuple {
        VersionTuple {
            major: 2,
            minor: 3,
            revision: "24091".to_string(),
            build: "1205".to_string(),
        }
    }

    fn rewrite(line: &str) -> String {
        String::from_utf8(rewrite_line(line.as_bytes(), &version()).into_owned()).unwrap()
    }

    #[test]
    fn test_each_pattern_is_anchored_on_its_marker() {
        let samples = [
            r#"AssemblyVersion("1.0")"#,
            r#"AssemblyFileVersion("1.0")"#,
            r#"APP_VERSION "1.0""#,
        ];
        for (family, sample) in TokenFamily::ALL.into_iter().zip(samples) {
            assert!(family.pattern().contains(&format!("({}", family.marker())));
            assert!(sample.starts_with(family.marker()));
            assert!(family.regex().is_match(sample.as_bytes()));
        }
    }

    #[test]
    fn test_assembly_version_attribute() {
        assert_eq!(
            rewrite(r#"[assembly: AssemblyVersion("1.0.0.0")]"#),
            r#"[assembly: AssemblyVersion("2.3.24091.1205")]"#
        );
    }

    #[test]
    fn test_assembly_file_version_attribute() {
        assert_eq!(
            rewrite(r#"[assembly: AssemblyFileVersion("1.0.*")]"#),
            r#"[assembly: AssemblyFileVersion("2.3.24091.1205")]"#
        );
    }

    #[test]
    fn test_trailing_content_preserved() {
        assert_eq!(
            rewrite(r#"[assembly: AssemblyVersion("1.0.0.0")] // bumped by release"#),
            r#"[assembly: AssemblyVersion("2.3.24091.1205")] // bumped by release"#
        );
    }

    #[test]
    fn test_vb_syntax_and_spacing() {
        assert_eq!(
            rewrite(r#"<Assembly: AssemblyVersion ( "1.0.0.0" )>"#),
            r#"<Assembly: AssemblyVersion("2.3.24091.1205" )>"#
        );
    }

    #[test]
    fn test_attribute_suffix_kept() {
        assert_eq!(
            rewrite(r#"[assembly: AssemblyVersionAttribute("1.0")]"#),
            r#"[assembly: AssemblyVersionAttribute("2.3.24091.1205")]"#
        );
    }

    #[test]
    fn test_app_version_define() {
        assert_eq!(
            rewrite(r#"#define APP_VERSION "1.0.0.0""#),
            r#"#define APP_VERSION "2.3.24091.1205""#
        );
        assert_eq!(
            rewrite("#define APP_VERSION\t\"0.1\" ; comment \"x\""),
            "#define APP_VERSION\t\"2.3.24091.1205\" ; comment \"x\""
        );
    }

    #[test]
    fn test_app_version_reference_untouched() {
        let line = "AppVersion={#APP_VERSION}";
        assert_eq!(rewrite(line), line);
    }

    #[test]
    fn test_marker_without_arguments_untouched() {
        let line = "// AssemblyVersion is stamped at release time";
        assert_eq!(rewrite(line), line);
        assert!(matches!(
            rewrite_line(line.as_bytes(), &version()),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_informational_version_untouched() {
        let line = r#"[assembly: AssemblyInformationalVersion("1.0.0-beta")]"#;
        assert_eq!(rewrite(line), line);
    }

    #[test]
    fn test_multiple_tokens_on_one_line() {
        assert_eq!(
            rewrite(r#"[assembly: AssemblyVersion("1.0.0.0"), AssemblyFileVersion("1.0.0.0")]"#),
            r#"[assembly: AssemblyVersion("2.3.24091.1205"), AssemblyFileVersion("2.3.24091.1205")]"#
        );
    }

    #[test]
    fn test_content_preserves_line_endings() {
        let content = b"using System;\r\n[assembly: AssemblyVersion(\"1.0.0.0\")]\r\n// end";
        let out = rewrite_content(content, &version());
        assert_eq!(
            out.bytes,
            b"using System;\r\n[assembly: AssemblyVersion(\"2.3.24091.1205\")]\r\n// end".to_vec()
        );
        assert_eq!(out.replacements, 1);
    }

    #[test]
    fn test_content_without_tokens_is_identical() {
        let content = b"namespace Foo\n{\n    class Bar {}\n}\n";
        let out = rewrite_content(content, &version());
        assert_eq!(out.bytes, content.to_vec());
        assert_eq!(out.replacements, 0);
    }

    #[test]
    fn test_empty_content() {
        let out = rewrite_content(b"", &version());
        assert!(out.bytes.is_empty());
        assert_eq!(out.replacements, 0);
    }

    #[test]
    fn test_non_utf8_bytes_preserved() {
        // Windows-1252 copyright sign and a UTF-8 BOM around the token
        let content = b"\xEF\xBB\xBF// \xA9 Corp\n[assembly: AssemblyCopyright(\"\xA9\")]\n[assembly: AssemblyFileVersion(\"1.0\")]\n";
        let out = rewrite_content(content, &version());
        assert_eq!(
            out.bytes,
            b"\xEF\xBB\xBF// \xA9 Corp\n[assembly: AssemblyCopyright(\"\xA9\")]\n[assembly: AssemblyFileVersion(\"2.3.24091.1205\")]\n".to_vec()
        );
    }

    #[test]
    fn test_line_count_preserved() {
        let content = b"APP_VERSION \"1\"\nAPP_VERSION \"2\"\n\n";
        let out = rewrite_content(content, &version());
        let lines = |b: &[u8]| b.iter().filter(|&&c| c == b'\n').count();
        assert_eq!(lines(&out.bytes), lines(content));
        assert_eq!(out.replacements, 2);
    }
}
