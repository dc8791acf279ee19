//! Parsing of module source into an swc AST
//!
//! Positions handed to swc start at [`START_POS`]; every span leaving this
//! module is converted into a 0-based byte offset into the source text.

use std::{ops::Range, path::Path};

use swc_core::{
    common::{
        BytePos, Span, Spanned,
        comments::{CommentKind, SingleThreadedComments},
    },
    ecma::{
        ast::{EsVersion, Module},
        parser::{Parser, StringInput, Syntax, lexer::Lexer},
    },
};

use crate::error::BundleError;

/// swc reserves `BytePos(0)` for dummy spans, so sources start one byte in.
pub(crate) const START_POS: u32 = 1;

/// A comment found in module source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceComment {
    pub block: bool,
    pub start: usize,
    pub end: usize,
}

/// Result of parsing one module
#[derive(Debug)]
pub struct ParsedModule {
    pub ast: Module,
    /// All comments in source order
    pub comments: Vec<SourceComment>,
}

/// Convert an swc position into a byte offset into the source
#[inline]
pub(crate) fn offset(pos: BytePos) -> usize {
    pos.0.saturating_sub(START_POS) as usize
}

/// Convert an swc span into a byte range into the source
#[inline]
pub(crate) fn range(span: Span) -> Range<usize> {
    offset(span.lo)..offset(span.hi)
}

/// Parse `source` as an ES module
pub fn parse_module(source: &str, path: &Path) -> Result<ParsedModule, BundleError> {
    let comments = SingleThreadedComments::default();
    let end = START_POS + u32::try_from(source.len()).unwrap_or(u32::MAX - START_POS);
    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        EsVersion::Es2020,
        StringInput::new(source, BytePos(START_POS), BytePos(end)),
        Some(&comments),
    );
    let mut parser = Parser::new_from(lexer);

    let ast = parser
        .parse_module()
        .map_err(|err| syntax_error(source, path, err.span(), &err.kind().msg()))?;

    if let Some(err) = parser.take_errors().into_iter().next() {
        return Err(syntax_error(source, path, err.span(), &err.kind().msg()));
    }

    Ok(ParsedModule {
        ast,
        comments: collect_comments(&comments),
    })
}

fn collect_comments(comments: &SingleThreadedComments) -> Vec<SourceComment> {
    let (leading, trailing) = comments.borrow_all();
    let mut collected: Vec<SourceComment> = leading
        .values()
        .chain(trailing.values())
        .flatten()
        .map(|comment| SourceComment {
            block: comment.kind == CommentKind::Block,
            start: offset(comment.span.lo),
            end: offset(comment.span.hi),
        })
        .collect();

    collected.sort_by_key(|comment| comment.start);
    collected.dedup_by_key(|comment| comment.start);
    collected
}

fn syntax_error(source: &str, path: &Path, span: Span, message: &str) -> BundleError {
    let (line, column) = line_column(source, offset(span.lo));
    BundleError::Parse {
        path: path.to_path_buf(),
        line,
        column,
        message: message.to_owned(),
    }
}

/// 1-based line and column of a byte offset
pub(crate) fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |idx| idx + 1);
    (line, offset - line_start + 1)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_offsets_are_zero_based() {
        let parsed = parse_module("var a = 1;\nfoo(a);", Path::new("a.js")).expect("parses");
        let spans: Vec<_> = parsed
            .ast
            .body
            .iter()
            .map(|item| range(item.span()))
            .collect();
        assert_eq!(spans, vec![0..10, 11..18]);
    }

    #[test]
    fn test_comments_are_collected_in_order() {
        let source = "// one\nvar a = 1; /* two */\n/* three */ a();";
        let parsed = parse_module(source, Path::new("a.js")).expect("parses");
        let texts: Vec<_> = parsed
            .comments
            .iter()
            .map(|c| &source[c.start..c.end])
            .collect();
        assert_eq!(texts, vec!["// one", "/* two */", "/* three */"]);
        assert!(!parsed.comments[0].block);
        assert!(parsed.comments[1].block);
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = parse_module("var a = 1;\nvar = 2;", Path::new("broken.js"))
            .expect_err("should fail");
        match err {
            BundleError::Parse {
                path, line, column, ..
            } => {
                assert_eq!(path, PathBuf::from("broken.js"));
                assert_eq!(line, 2);
                assert_eq!(column, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("ab\ncd", 0), (1, 1));
        assert_eq!(line_column("ab\ncd", 4), (2, 2));
    }
}
