//! Lexer and parser for the template language.
//!
//! Actions are delimited by `{{` and `}}`. The grammar is deliberately
//! small: `define`, `template`, `if`/`else`, `range`, field interpolation,
//! helper application and `{{/* comments */}}`. Everything the parser does
//! not recognize is a hard [`Error::Parse`] with the offending line and
//! column, never a silently emitted literal.

use crate::error::Error;
use crate::template::ast::{FieldPath, Node, Tree};

/// Result of parsing one template text: the top-level body plus every
/// `define` block it contains.
#[derive(Debug)]
pub struct Parsed {
    pub outer: Vec<Node>,
    pub defines: Vec<Tree>,
}

impl Parsed {
    /// Whether the top-level body holds anything besides whitespace.
    pub fn outer_is_blank(&self) -> bool {
        self.outer.iter().all(|node| match node {
            Node::Text(text) => text.trim().is_empty(),
            _ => false,
        })
    }
}

/// Parse `text`, reporting errors against `name`.
pub fn parse(name: &str, text: &str) -> Result<Parsed, Error> {
    let mut parser = Parser {
        name,
        src: text,
        pos: 0,
    };
    let mut outer = Vec::new();
    let mut defines = Vec::new();
    loop {
        match parser.next_item()? {
            Item::Eof => break,
            Item::Text(text) => outer.push(Node::Text(text)),
            Item::Action(Action::Define(dname), at) => {
                let (body, term) = parser.parse_nodes()?;
                if term != Term::End {
                    return Err(
                        parser.error_at(at, format!("`define \"{dname}\"` is never closed"))
                    );
                }
                defines.push(Tree {
                    name: dname,
                    root: body,
                });
            }
            Item::Action(Action::End, at) => {
                return Err(parser.error_at(at, "unexpected `{{end}}`"));
            }
            Item::Action(Action::Else, at) => {
                return Err(parser.error_at(at, "unexpected `{{else}}`"));
            }
            Item::Action(action, at) => outer.push(parser.parse_action(action, at)?),
        }
    }
    Ok(Parsed { outer, defines })
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug)]
enum Item {
    Eof,
    Text(String),
    /// An action plus the byte offset of its opening `{{`.
    Action(Action, usize),
}

#[derive(Debug)]
enum Action {
    Define(String),
    Template(String),
    If(FieldPath),
    Range(FieldPath),
    Else,
    End,
    Field(FieldPath),
    Call { func: String, arg: FieldPath },
}

#[derive(Debug, PartialEq, Eq)]
enum Term {
    End,
    Else,
    Eof,
}

struct Parser<'a> {
    name: &'a str,
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn next_item(&mut self) -> Result<Item, Error> {
        loop {
            if self.pos >= self.src.len() {
                return Ok(Item::Eof);
            }
            let rest = &self.src[self.pos..];
            match rest.find("{{") {
                None => {
                    self.pos = self.src.len();
                    return Ok(Item::Text(rest.to_string()));
                }
                Some(0) => {
                    let at = self.pos;
                    let close = rest
                        .find("}}")
                        .ok_or_else(|| self.error_at(at, "unclosed `{{` action"))?;
                    let content = rest[2..close].trim();
                    self.pos = at + close + 2;
                    if let Some(comment) = content.strip_prefix("/*") {
                        if comment.ends_with("*/") {
                            continue;
                        }
                        return Err(self.error_at(at, "comment is not closed with `*/`"));
                    }
                    let action = self.parse_action_content(content, at)?;
                    return Ok(Item::Action(action, at));
                }
                Some(i) => {
                    let text = rest[..i].to_string();
                    self.pos += i;
                    return Ok(Item::Text(text));
                }
            }
        }
    }

    fn parse_action_content(&self, content: &str, at: usize) -> Result<Action, Error> {
        if content.is_empty() {
            return Err(self.error_at(at, "empty action"));
        }
        let (head, tail) = match content.split_once(char::is_whitespace) {
            Some((head, tail)) => (head, tail.trim()),
            None => (content, ""),
        };
        match head {
            "define" => {
                let (name, rest) = self.parse_quoted(tail, at)?;
                self.expect_empty(rest, "define", at)?;
                Ok(Action::Define(name))
            }
            "template" => {
                let (name, rest) = self.parse_quoted(tail, at)?;
                // templates always receive the current data; an explicit `.`
                // is allowed for familiarity, anything else is rejected
                if !rest.is_empty() && rest != "." {
                    return Err(self.error_at(
                        at,
                        "templates are invoked with the current value; pass `.` or nothing",
                    ));
                }
                Ok(Action::Template(name))
            }
            "if" => Ok(Action::If(self.parse_path(tail, at)?)),
            "range" => Ok(Action::Range(self.parse_path(tail, at)?)),
            "else" => {
                self.expect_empty(tail, "else", at)?;
                Ok(Action::Else)
            }
            "end" => {
                self.expect_empty(tail, "end", at)?;
                Ok(Action::End)
            }
            _ if head.starts_with('.') => {
                self.expect_empty(tail, "field", at)?;
                Ok(Action::Field(self.parse_path(head, at)?))
            }
            _ if is_ident(head) => {
                if tail.is_empty() {
                    return Err(self.error_at(
                        at,
                        format!("helper `{head}` needs an argument; use `{{{{{head} .}}}}`"),
                    ));
                }
                Ok(Action::Call {
                    func: head.to_string(),
                    arg: self.parse_path(tail, at)?,
                })
            }
            _ => Err(self.error_at(at, format!("unrecognized action `{content}`"))),
        }
    }

    fn parse_quoted<'b>(&self, s: &'b str, at: usize) -> Result<(String, &'b str), Error> {
        let s = s.trim_start();
        let Some(inner) = s.strip_prefix('"') else {
            return Err(self.error_at(at, "expected a quoted template name"));
        };
        let Some(end) = inner.find('"') else {
            return Err(self.error_at(at, "template name is missing a closing quote"));
        };
        let name = inner[..end].to_string();
        if name.is_empty() {
            return Err(self.error_at(at, "template name must not be empty"));
        }
        Ok((name, inner[end + 1..].trim()))
    }

    fn parse_path(&self, s: &str, at: usize) -> Result<FieldPath, Error> {
        let s = s.trim();
        if s == "." {
            return Ok(FieldPath::current());
        }
        let Some(rest) = s.strip_prefix('.') else {
            return Err(self.error_at(at, format!("expected a field path, found `{s}`")));
        };
        let mut segments = Vec::new();
        for segment in rest.split('.') {
            if segment.is_empty() || !is_ident(segment) {
                return Err(self.error_at(at, format!("malformed field path `{s}`")));
            }
            segments.push(segment.to_string());
        }
        Ok(FieldPath(segments))
    }

    fn expect_empty(&self, rest: &str, what: &str, at: usize) -> Result<(), Error> {
        if rest.is_empty() {
            Ok(())
        } else {
            Err(self.error_at(at, format!("unexpected argument after `{what}`")))
        }
    }

    // ------------------------------------------------------------------
    // Recursive descent over action bodies
    // ------------------------------------------------------------------

    fn parse_nodes(&mut self) -> Result<(Vec<Node>, Term), Error> {
        let mut nodes = Vec::new();
        loop {
            match self.next_item()? {
                Item::Eof => return Ok((nodes, Term::Eof)),
                Item::Text(text) => nodes.push(Node::Text(text)),
                Item::Action(Action::End, _) => return Ok((nodes, Term::End)),
                Item::Action(Action::Else, _) => return Ok((nodes, Term::Else)),
                Item::Action(action, at) => nodes.push(self.parse_action(action, at)?),
            }
        }
    }

    fn parse_action(&mut self, action: Action, at: usize) -> Result<Node, Error> {
        match action {
            Action::Field(path) => Ok(Node::Field(path)),
            Action::Template(name) => Ok(Node::Invoke(name)),
            Action::Call { func, arg } => Ok(Node::Call { func, arg }),
            Action::If(cond) => {
                let (then, term) = self.parse_nodes()?;
                let otherwise = match term {
                    Term::End => Vec::new(),
                    Term::Else => {
                        let (otherwise, term) = self.parse_nodes()?;
                        if term != Term::End {
                            return Err(self.error_at(at, "`if` action is never closed"));
                        }
                        otherwise
                    }
                    Term::Eof => return Err(self.error_at(at, "`if` action is never closed")),
                };
                Ok(Node::If {
                    cond,
                    then,
                    otherwise,
                })
            }
            Action::Range(over) => {
                let (body, term) = self.parse_nodes()?;
                if term != Term::End {
                    return Err(self.error_at(at, "`range` action is never closed"));
                }
                Ok(Node::Range { over, body })
            }
            Action::Define(_) => {
                Err(self.error_at(at, "`define` is only allowed at the top level"))
            }
            Action::Else | Action::End => Err(self.error_at(at, "unexpected action")),
        }
    }

    fn error_at(&self, at: usize, message: impl Into<String>) -> Error {
        let (line, column) = line_col(self.src, at);
        Error::Parse {
            name: self.name.to_string(),
            line,
            column,
            message: message.into(),
        }
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn line_col(src: &str, at: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut column = 1u32;
    for (i, ch) in src.char_indices() {
        if i >= at {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_field() {
        let parsed = parse("t", "hello {{.name}}!").unwrap();
        assert_eq!(
            parsed.outer,
            vec![
                Node::Text("hello ".into()),
                Node::Field(FieldPath(vec!["name".into()])),
                Node::Text("!".into()),
            ]
        );
        assert!(parsed.defines.is_empty());
    }

    #[test]
    fn test_invocation_with_and_without_dot() {
        let parsed = parse("t", r#"{{template "footer"}}{{template "nav" .}}"#).unwrap();
        assert_eq!(
            parsed.outer,
            vec![Node::Invoke("footer".into()), Node::Invoke("nav".into())]
        );
    }

    #[test]
    fn test_define_blocks() {
        let parsed = parse(
            "t",
            r#"{{define "header"}}<h1>{{.title}}</h1>{{end}}{{define "footer"}}bye{{end}}"#,
        )
        .unwrap();
        assert!(parsed.outer_is_blank());
        assert_eq!(parsed.defines.len(), 2);
        assert_eq!(parsed.defines[0].name, "header");
        assert_eq!(parsed.defines[1].root, vec![Node::Text("bye".into())]);
    }

    #[test]
    fn test_if_else_and_range() {
        let parsed = parse(
            "t",
            "{{if .ok}}yes{{else}}no{{end}}{{range .items}}<li>{{.}}</li>{{end}}",
        )
        .unwrap();
        assert_eq!(parsed.outer.len(), 2);
        let Node::If {
            cond,
            then,
            otherwise,
        } = &parsed.outer[0]
        else {
            panic!("expected if node");
        };
        assert_eq!(cond, &FieldPath(vec!["ok".into()]));
        assert_eq!(then, &vec![Node::Text("yes".into())]);
        assert_eq!(otherwise, &vec![Node::Text("no".into())]);
        let Node::Range { over, body } = &parsed.outer[1] else {
            panic!("expected range node");
        };
        assert_eq!(over, &FieldPath(vec!["items".into()]));
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn test_helper_call() {
        let parsed = parse("t", "{{upper .name}}").unwrap();
        assert_eq!(
            parsed.outer,
            vec![Node::Call {
                func: "upper".into(),
                arg: FieldPath(vec!["name".into()]),
            }]
        );
    }

    #[test]
    fn test_comment_is_dropped() {
        let parsed = parse("t", "a{{/* note to self */}}b").unwrap();
        assert_eq!(
            parsed.outer,
            vec![Node::Text("a".into()), Node::Text("b".into())]
        );
    }

    #[test]
    fn test_error_positions() {
        let err = parse("page", "line one\n  {{bogus!}}").unwrap_err();
        let Error::Parse {
            name,
            line,
            column,
            ..
        } = err
        else {
            panic!("expected parse error");
        };
        assert_eq!(name, "page");
        assert_eq!(line, 2);
        assert_eq!(column, 3);
    }

    #[test]
    fn test_unclosed_action() {
        assert!(parse("t", "{{.name").is_err());
        assert!(parse("t", "{{if .x}}yes").is_err());
        assert!(parse("t", r#"{{define "x"}}body"#).is_err());
    }

    #[test]
    fn test_stray_end_rejected() {
        assert!(parse("t", "{{end}}").is_err());
        assert!(parse("t", "{{else}}").is_err());
    }

    #[test]
    fn test_nested_define_rejected() {
        assert!(parse("t", r#"{{if .x}}{{define "y"}}{{end}}{{end}}"#).is_err());
    }

    #[test]
    fn test_invocation_with_arbitrary_argument_rejected() {
        assert!(parse("t", r#"{{template "x" .some.field}}"#).is_err());
    }
}
