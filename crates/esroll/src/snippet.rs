//! Non-destructive text editing over a shared source buffer
//!
//! A [`Snippet`] is a view over a byte range of a module's source plus a set
//! of non-overlapping edits. Rendering applies the edits; the buffer itself is
//! never touched, so any number of snippets can be cut from one module.

use std::{collections::BTreeMap, fmt, ops::Range, rc::Rc};

use crate::error::BundleError;

#[derive(Debug, Clone)]
struct Edit {
    end: usize,
    content: String,
}

#[derive(Debug, Clone)]
pub struct Snippet {
    source: Rc<str>,
    range: Range<usize>,
    /// Edits keyed by start offset
    edits: BTreeMap<usize, Edit>,
    intro: String,
    outro: String,
    trimmed: bool,
}

impl Snippet {
    pub fn new(source: impl Into<Rc<str>>) -> Self {
        let source = source.into();
        let range = 0..source.len();
        Self {
            source,
            range,
            edits: BTreeMap::new(),
            intro: String::new(),
            outro: String::new(),
            trimmed: false,
        }
    }

    /// An independently editable view of `start..end`
    pub fn snip(&self, start: usize, end: usize) -> Self {
        let edits = self
            .edits
            .range(start..end)
            .filter(|(_, edit)| edit.end <= end)
            .map(|(&at, edit)| (at, edit.clone()))
            .collect();
        Self {
            source: Rc::clone(&self.source),
            range: start..end,
            edits,
            intro: String::new(),
            outro: String::new(),
            trimmed: false,
        }
    }

    /// Replace `start..end` of the original with `content`
    pub fn overwrite(
        &mut self,
        start: usize,
        end: usize,
        content: impl Into<String>,
    ) -> Result<(), BundleError> {
        if start >= end {
            return Err(BundleError::SnippetEdit {
                start,
                end,
                reason: "empty range",
            });
        }
        if start < self.range.start || end > self.range.end {
            return Err(BundleError::SnippetEdit {
                start,
                end,
                reason: "outside of snippet",
            });
        }
        let overlaps_previous = self
            .edits
            .range(..end)
            .next_back()
            .is_some_and(|(_, edit)| edit.end > start);
        if overlaps_previous {
            return Err(BundleError::SnippetEdit {
                start,
                end,
                reason: "overlaps an earlier edit",
            });
        }
        self.edits.insert(
            start,
            Edit {
                end,
                content: content.into(),
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, start: usize, end: usize) -> Result<(), BundleError> {
        self.overwrite(start, end, String::new())
    }

    pub fn prepend(&mut self, content: &str) -> &mut Self {
        self.intro.insert_str(0, content);
        self
    }

    pub fn append(&mut self, content: &str) -> &mut Self {
        self.outro.push_str(content);
        self
    }

    /// Strip leading and trailing whitespace from the rendered text
    pub fn trim(&mut self) -> &mut Self {
        self.trimmed = true;
        self
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(self.range.len() + self.intro.len());
        out.push_str(&self.intro);
        let mut cursor = self.range.start;
        for (&start, edit) in self.edits.range(self.range.clone()) {
            if edit.end > self.range.end {
                break;
            }
            out.push_str(&self.source[cursor..start]);
            out.push_str(&edit.content);
            cursor = edit.end;
        }
        out.push_str(&self.source[cursor..self.range.end]);
        out.push_str(&self.outro);
        if self.trimmed {
            out.trim().to_owned()
        } else {
            out
        }
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Many snippets joined into one output text
#[derive(Debug, Default)]
pub struct SnippetBundle {
    /// Rendered parts, each with the separator emitted before it
    parts: Vec<(String, String)>,
    intro: String,
    outro: String,
    trimmed: bool,
}

impl SnippetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part; `separator` is only emitted between parts
    pub fn add_source(&mut self, snippet: &Snippet, separator: impl Into<String>) {
        self.parts.push((separator.into(), snippet.to_string()));
    }

    pub fn prepend(&mut self, content: &str) -> &mut Self {
        self.intro.insert_str(0, content);
        self
    }

    pub fn append(&mut self, content: &str) -> &mut Self {
        self.outro.push_str(content);
        self
    }

    pub fn trim(&mut self) -> &mut Self {
        self.trimmed = true;
        self
    }

    /// Indentation used by the bundled sources, tabs unless spaces dominate
    pub fn indent_string(&self) -> String {
        let mut tabbed = 0usize;
        let mut spaced = Vec::new();
        for line in self.parts.iter().flat_map(|(_, part)| part.lines()) {
            if line.starts_with('\t') {
                tabbed += 1;
            } else if line.starts_with("  ") {
                spaced.push(line.len() - line.trim_start_matches(' ').len());
            }
        }
        if spaced.is_empty() || tabbed >= spaced.len() {
            return "\t".to_owned();
        }
        let width = spaced.into_iter().min().unwrap_or(2);
        " ".repeat(width)
    }

    fn render(&self) -> String {
        let mut out = self.intro.clone();
        for (index, (separator, part)) in self.parts.iter().enumerate() {
            if index > 0 {
                out.push_str(separator);
            }
            out.push_str(part);
        }
        out.push_str(&self.outro);
        if self.trimmed {
            out.trim().to_owned()
        } else {
            out
        }
    }
}

impl fmt::Display for SnippetBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edits_never_touch_the_source() {
        let whole = Snippet::new("export var answer = 42;");
        let mut view = whole.snip(0, 23);
        view.remove(0, 7).expect("remove");
        view.overwrite(11, 17, "_answer").expect("overwrite");

        assert_eq!(view.to_string(), "var _answer = 42;");
        assert_eq!(whole.to_string(), "export var answer = 42;");
    }

    #[test]
    fn test_snip_keeps_range_and_clone_is_independent() {
        let whole = Snippet::new("a;\n  b + c;\nd;");
        let mut b = whole.snip(3, 11);
        let copy = b.clone();
        b.overwrite(5, 6, "bee").expect("overwrite");

        assert_eq!(b.to_string(), "  bee + c;");
        assert_eq!(copy.to_string(), "  b + c;");
        assert_eq!(b.trim().to_string(), "bee + c;");
    }

    #[test]
    fn test_overlapping_edits_are_rejected() {
        let mut snippet = Snippet::new("abcdef");
        snippet.overwrite(1, 4, "x").expect("first edit");
        assert!(snippet.overwrite(3, 5, "y").is_err());
        assert!(snippet.overwrite(0, 2, "y").is_err());
        assert!(snippet.overwrite(2, 2, "y").is_err());
        snippet.overwrite(4, 6, "z").expect("adjacent edit");
        assert_eq!(snippet.to_string(), "axz");
    }

    #[test]
    fn test_edits_outside_snippet_are_rejected() {
        let whole = Snippet::new("abcdef");
        let mut view = whole.snip(2, 4);
        assert!(view.overwrite(0, 3, "x").is_err());
    }

    #[test]
    fn test_bundle_separators_only_between_parts() {
        let source = Snippet::new("one;two;");
        let mut bundle = SnippetBundle::new();
        bundle.add_source(&source.snip(0, 4), "\n\n");
        bundle.add_source(&source.snip(4, 8), "\n");
        bundle.prepend("// head\n").append("\n");

        assert_eq!(bundle.to_string(), "// head\none;\ntwo;\n");
        assert_eq!(bundle.trim().to_string(), "// head\none;\ntwo;");
    }

    #[test]
    fn test_indent_string_guess() {
        let tabs = Snippet::new("function f() {\n\treturn 1;\n}");
        let spaces = Snippet::new("function f() {\n    if (a) {\n        b();\n    }\n}");
        let mut bundle = SnippetBundle::new();
        assert_eq!(bundle.indent_string(), "\t");
        bundle.add_source(&spaces, "");
        assert_eq!(bundle.indent_string(), "    ");
        bundle.add_source(&tabs, "");
        bundle.add_source(&tabs, "");
        bundle.add_source(&tabs, "");
        assert_eq!(bundle.indent_string(), "\t");
    }
}
