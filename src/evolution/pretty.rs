use std::fmt;

pub const MAX_WIDTH: usize = 90;
const INDENT: &str = "    ";

/// Width-aware multi-line text used to render programs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrettyString {
    lines: Vec<String>,
}

impl PrettyString {
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_multi_line(&self) -> bool {
        self.lines.len() > 1
    }

    /// Joins `parts` as `prologue part sep part ... epilogue`.
    ///
    /// Stays on one line when every part is single-line and the result fits
    /// `max_width`. Otherwise each part goes on its own lines, indented when a
    /// prologue or epilogue frames them, with `sep` trailing every part but the last.
    /// `prologue`, `sep` and `epilogue` must not contain newlines.
    pub fn combine(
        max_width: usize,
        prologue: &str,
        sep: &str,
        epilogue: &str,
        parts: &[PrettyString],
    ) -> Self {
        if parts.iter().all(|p| p.lines.len() <= 1) {
            let body: Vec<String> = parts.iter().map(ToString::to_string).collect();
            let single = format!("{}{}{}", prologue, body.join(sep), epilogue);
            if single.chars().count() <= max_width {
                return Self::line(single);
            }
        }

        let framed = !prologue.is_empty() || !epilogue.is_empty();
        let mut lines = Vec::with_capacity(parts.iter().map(|p| p.lines.len()).sum::<usize>() + 2);
        if !prologue.is_empty() {
            lines.push(prologue.to_string());
        }
        for (i, part) in parts.iter().enumerate() {
            for line in &part.lines {
                lines.push(if framed {
                    format!("{}{}", INDENT, line)
                } else {
                    line.clone()
                });
            }
            if i + 1 != parts.len() {
                if let Some(last) = lines.last_mut() {
                    last.push_str(sep);
                }
            }
        }
        if !epilogue.is_empty() {
            lines.push(epilogue.to_string());
        }
        Self { lines }
    }

    pub fn wrap(prologue: &str, inner: &PrettyString, epilogue: &str) -> Self {
        Self::combine(MAX_WIDTH, prologue, "", epilogue, std::slice::from_ref(inner))
    }

    pub fn join(prologue: &str, sep: &str, epilogue: &str, parts: &[PrettyString]) -> Self {
        Self::combine(MAX_WIDTH, prologue, sep, epilogue, parts)
    }

    pub fn to_string_with_prefix(&self, prefix: &str) -> String {
        if self.lines.is_empty() {
            return prefix.to_string();
        }
        self.lines
            .iter()
            .map(|l| format!("{}{}", prefix, l))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for PrettyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_on_one_line() {
        let parts = [PrettyString::line("a"), PrettyString::line("b")];
        let s = PrettyString::combine(90, "max(", ", ", ")", &parts);
        assert_eq!(s.to_string(), "max(a, b)");
    }

    #[test]
    fn test_breaks_with_indent_when_too_wide() {
        let parts = [PrettyString::line("aaaa"), PrettyString::line("bbbb")];
        let s = PrettyString::combine(8, "max(", ", ", ")", &parts);
        assert_eq!(s.lines(), ["max(", "    aaaa, ", "    bbbb", ")"]);
    }

    #[test]
    fn test_unframed_break_has_no_indent() {
        let parts = [PrettyString::line("aaaa"), PrettyString::line("bbbb")];
        let s = PrettyString::combine(5, "", " + ", "", &parts);
        assert_eq!(s.lines(), ["aaaa + ", "bbbb"]);
    }

    #[test]
    fn test_multi_line_part_forces_block() {
        let inner = PrettyString::combine(3, "f(", "", ")", &[PrettyString::line("xy")]);
        assert!(inner.is_multi_line());
        let outer = PrettyString::combine(90, "-", "", "", &[inner]);
        assert_eq!(outer.lines(), ["-", "    f(", "        xy", "    )"]);
        assert_eq!(
            outer.to_string_with_prefix("> "),
            "> -\n>     f(\n>         xy\n>     )"
        );
    }
}
