// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Tests for the template parser.
//!
//! | Category | Coverage |
//! |----------|----------|
//! | Placeholders | names, options, offsets |
//! | Blocks | `if` / `else` / `/if`, nesting |
//! | Errors | every [`ParseErrorKind`] |
//! | Delimiters | custom open/close pairs |

use super::*;

fn parse_default(template: &str) -> Result<Vec<TemplateNode>, ParseError> {
    parse(template, &Delimiters::default())
}

fn placeholder(node: &TemplateNode) -> &Placeholder {
    match node {
        TemplateNode::Placeholder(p) => p,
        other => panic!("expected placeholder, got {other:?}")
    }
}

#[test]
fn plain_text_is_one_node() {
    let nodes = parse_default("SELECT 1").unwrap();
    assert_eq!(
        nodes,
        vec![TemplateNode::Text {
            text:   "SELECT 1".into(),
            offset: 0
        }]
    );
}

#[test]
fn empty_template_has_no_nodes() {
    assert!(parse_default("").unwrap().is_empty());
}

#[test]
fn placeholder_name_and_options() {
    let nodes = parse_default("SELECT {{columns --exclude a b}} FROM {{table}}").unwrap();
    assert_eq!(nodes.len(), 4);
    let columns = placeholder(&nodes[1]);
    assert_eq!(columns.name, "columns");
    assert_eq!(columns.options, "--exclude a b");
    assert_eq!(columns.offset, 7);
    assert_eq!(columns.source, "{{columns --exclude a b}}");
    assert_eq!(
        &"SELECT {{columns --exclude a b}}"[columns.options_offset..][..9],
        "--exclude"
    );
    let table = placeholder(&nodes[3]);
    assert_eq!(table.name, "table");
    assert!(table.options.is_empty());
}

#[test]
fn whitespace_inside_delimiters_is_ignored() {
    let nodes = parse_default("{{  where   --param p }}").unwrap();
    let p = placeholder(&nodes[0]);
    assert_eq!(p.name, "where");
    assert_eq!(p.options, "--param p");
}

#[test]
fn unknown_names_parse() {
    let nodes = parse_default("{{colums}}").unwrap();
    assert_eq!(placeholder(&nodes[0]).name, "colums");
}

#[test]
fn text_offsets_are_tracked() {
    let nodes = parse_default("a {{b}} c").unwrap();
    assert_eq!(
        nodes[2],
        TemplateNode::Text {
            text:   " c".into(),
            offset: 7
        }
    );
}

#[test]
fn conditional_with_else() {
    let nodes = parse_default("X {{if notnull=email}}A{{else}}B{{/if}} Y").unwrap();
    assert_eq!(nodes.len(), 3);
    let TemplateNode::Conditional(block) = &nodes[1] else {
        panic!("expected conditional");
    };
    assert_eq!(block.kind, "notnull");
    assert_eq!(block.param, "email");
    assert_eq!(block.offset, 2);
    assert_eq!(
        block.body,
        vec![TemplateNode::Text {
            text:   "A".into(),
            offset: 22
        }]
    );
    assert_eq!(block.otherwise.len(), 1);
}

#[test]
fn conditional_without_else() {
    let nodes = parse_default("{{if notempty=name}}{{columns}}{{/if}}").unwrap();
    let TemplateNode::Conditional(block) = &nodes[0] else {
        panic!("expected conditional");
    };
    assert_eq!(block.body.len(), 1);
    assert!(block.otherwise.is_empty());
}

#[test]
fn conditionals_nest() {
    let nodes = parse_default("{{if notnull=a}}{{if null=b}}x{{/if}}{{else}}y{{/if}}").unwrap();
    let TemplateNode::Conditional(outer) = &nodes[0] else {
        panic!("expected conditional");
    };
    assert!(matches!(outer.body[0], TemplateNode::Conditional(_)));
    assert_eq!(outer.otherwise.len(), 1);
}

#[test]
fn unclosed_placeholder_reports_open_position() {
    let err = parse_default("SELECT {{columns FROM t").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Unclosed);
    assert_eq!(err.offset, 7);
    assert_eq!(err.code(), "TPL-UNCLOSED");
}

#[test]
fn empty_placeholder_is_rejected() {
    let err = parse_default("SELECT {{   }}").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Empty);
    assert_eq!(err.text, "{{   }}");
}

#[test]
fn stray_else_and_end() {
    assert_eq!(
        parse_default("{{else}}").unwrap_err().kind,
        ParseErrorKind::StrayElse
    );
    assert_eq!(
        parse_default("a {{/if}}").unwrap_err().kind,
        ParseErrorKind::StrayEndIf
    );
}

#[test]
fn unclosed_if_reports_header() {
    let err = parse_default("a {{if notnull=x}} b").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnclosedIf);
    assert_eq!(err.offset, 2);
}

#[test]
fn malformed_headers() {
    for bad in [
        "{{if}}{{/if}}",
        "{{if notnull}}{{/if}}",
        "{{if =x}}{{/if}}",
        "{{if a= b}}{{/if}}",
        "{{if a=b=c}}{{/if}}",
        "{{if a=b}}{{else}}{{else}}{{/if}}"
    ] {
        assert_eq!(
            parse_default(bad).unwrap_err().kind,
            ParseErrorKind::MalformedIf,
            "{bad}"
        );
    }
}

#[test]
fn custom_delimiters() {
    let delimiters = Delimiters {
        open:  "<%".into(),
        close: "%>".into()
    };
    let nodes = parse("SELECT <%columns%> FROM <%table%> WHERE x = '{{y}}'", &delimiters).unwrap();
    assert_eq!(placeholder(&nodes[1]).name, "columns");
    let TemplateNode::Text {
        text, ..
    } = &nodes[4]
    else {
        panic!("expected text");
    };
    assert!(text.contains("{{y}}"));
}

#[test]
fn leading_keyword_skips_placeholders() {
    let nodes = parse_default("  select {{columns}} from t").unwrap();
    assert_eq!(leading_keyword(&nodes).as_deref(), Some("SELECT"));
    let nodes = parse_default("{{dynamic --param q}}").unwrap();
    assert_eq!(leading_keyword(&nodes), None);
}

#[test]
fn parsing_is_deterministic() {
    let template = "UPDATE {{table}} SET {{set}} WHERE {{by_key}} {{if notnull=x}}AND y{{/if}}";
    assert_eq!(parse_default(template), parse_default(template));
}
