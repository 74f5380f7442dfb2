//! Argument list reconstruction.
//!
//! When a fix keeps the number of arguments, every separator with its surrounding trivia is
//! taken over from the original list, so line breaks and comments between arguments stay where
//! they were. When the count changes, the list is rebuilt and the new separators follow the
//! style of the original: a line break after each comma if the original broke lines after the
//! opening parenthesis or after a comma, a single space otherwise.

use crate::host::syntax::{ArgumentList, Span, SyntaxTree};

/// How separators between rebuilt arguments are written
#[derive(Debug, Clone, PartialEq, Eq)]
enum SeparatorStyle {
    Inline,
    Newline { newline: &'static str, indent: String },
}

impl SeparatorStyle {
    fn detect(tree: &SyntaxTree, list: &ArgumentList) -> Self {
        let breaks_after_open = tree.trailing_trivia(list.open).ends_with('\n');
        let breaks_after_comma = list
            .separators
            .iter()
            .any(|separator| tree.trailing_trivia(*separator).ends_with('\n'));
        if !(breaks_after_open || breaks_after_comma) {
            return SeparatorStyle::Inline;
        }
        let indent = match list.args.last() {
            Some(arg) => tree.line_indent(arg.span.start).to_string(),
            None => String::new(),
        };
        SeparatorStyle::Newline {
            newline: tree.newline(),
            indent,
        }
    }
}

/// Render `args` as a replacement for `list`, parentheses included
#[must_use]
pub fn rebuild(tree: &SyntaxTree, list: &ArgumentList, args: &[String]) -> String {
    if args.len() == list.args.len() && !args.is_empty() {
        return reuse_separators(tree, list, args);
    }

    let open = tree.text_of(list.open);
    let close = tree.text_of(list.close);
    match SeparatorStyle::detect(tree, list) {
        SeparatorStyle::Inline => format!("{open}{}{close}", args.join(", ")),
        SeparatorStyle::Newline { newline, indent } => {
            let separator = format!(",{newline}{indent}");
            let lead = if tree.trailing_trivia(list.open).ends_with('\n') {
                format!("{newline}{indent}")
            } else {
                String::new()
            };
            format!("{open}{lead}{}{close}", args.join(&separator))
        }
    }
}

/// The original list text with each argument replaced in place
fn reuse_separators(tree: &SyntaxTree, list: &ArgumentList, args: &[String]) -> String {
    let text = tree.text_of(list.span);
    let mut out = String::with_capacity(text.len());
    let mut cursor = list.span.start;
    for (arg, replacement) in list.args.iter().zip(args) {
        out.push_str(tree.text_of(Span::new(cursor, arg.span.start)));
        out.push_str(replacement);
        cursor = arg.span.end;
    }
    out.push_str(tree.text_of(Span::new(cursor, list.span.end)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::syntax::{ExprKind, MemberDecl};

    fn first_call_args(tree: &SyntaxTree) -> &ArgumentList {
        let ty = tree.root().types()[0];
        let MemberDecl::Field(field) = &ty.members[0] else {
            panic!("expected field");
        };
        let init = field.declarators[0].init.as_ref().unwrap();
        let ExprKind::Invocation { args, .. } = &init.kind else {
            panic!("expected invocation");
        };
        args
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_same_count_keeps_trivia() {
        let tree = SyntaxTree::parse(
            "t.cs",
            "class C {\n    int x = Call( a, // first\n        b);\n}\n",
        )
        .unwrap();
        let list = first_call_args(&tree);
        assert_eq!(
            rebuild(&tree, list, &args(&["b", "a"])),
            "( b, // first\n        a)"
        );
    }

    #[test]
    fn test_inline_style() {
        let tree = SyntaxTree::parse("t.cs", "class C { int x = Call(a,  b, c); }").unwrap();
        let list = first_call_args(&tree);
        assert_eq!(rebuild(&tree, list, &args(&["c", "a"])), "(c, a)");
    }

    #[test]
    fn test_newline_style() {
        let tree = SyntaxTree::parse(
            "t.cs",
            "class C {\n    int x = Call(\n        a,\n        b,\n        c);\n}\n",
        )
        .unwrap();
        let list = first_call_args(&tree);
        assert_eq!(
            rebuild(&tree, list, &args(&["a", "b"])),
            "(\n        a,\n        b)"
        );
    }
}
