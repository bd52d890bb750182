//! Template expressions embedded in task file strings
//!
//! A string containing `{{` is parsed into text and actions. Actions are
//! evaluated by a small interpreter with a fixed set of functions:
//!
//! - `var "name"` - value of a variable from the scope chain
//! - `path "p"` - `p` if absolute, else `p` joined onto the anchor directory
//! - `env "NAME"` - host environment variable, empty when unset
//!
//! Also supported: string literals (`"..."` with escapes, or raw
//! `` `...` ``), pipelines (`{{ var "dir" | path }}`, the piped value becomes
//! the last argument), parenthesized pipelines as arguments
//! (`{{ path (var "dir") }}`), trim markers (`{{- ` and ` -}}`) and comments
//! (`{{/* ... */}}`).
//!
//! Unknown variables do not stop evaluation. Each failure is recorded, the
//! variable name is substituted as a placeholder, and once the whole template
//! has run every distinct failure is reported together.

use crate::error::{ResolveError, ResolveResult};
use crate::resolve::scope::{ExpansionStack, ScopeChain, ScopeId};
use std::env;
use std::path::{Component, Path, PathBuf};

/// Marker that opens an action
pub const OPEN: &str = "{{";

const CLOSE: &str = "}}";
const TRIM_CLOSE: &str = "-}}";
const COMMENT_OPEN: &str = "/*";
const COMMENT_CLOSE: &str = "*/";

/// Cheap check deciding whether a string needs template evaluation at all
pub fn contains_expression(s: &str) -> bool {
    s.contains(OPEN)
}

/// Resolve a task file string against a scope.
///
/// Strings without `{{` come back unchanged and never fail.
pub fn resolve_string(
    raw: &str,
    chain: &ScopeChain,
    scope: ScopeId,
    anchor_dir: &Path,
) -> ResolveResult<String> {
    if !contains_expression(raw) {
        return Ok(raw.to_string());
    }

    let mut stack = ExpansionStack::new();
    Template::parse(raw)?.render(chain, scope, anchor_dir, &mut stack)
}

/// Functions callable from an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Var,
    Path,
    Env,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "var" => Some(Function::Var),
            "path" => Some(Function::Path),
            "env" => Some(Function::Env),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Var => "var",
            Function::Path => "path",
            Function::Env => "env",
        }
    }
}

/// A string literal or a parenthesized pipeline
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Literal(String),
    Pipeline(Vec<Stage>),
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Value(Operand),
    Call {
        function: Function,
        args: Vec<Operand>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Action(Vec<Stage>),
}

/// A parsed template
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> ResolveResult<Self> {
        let nodes = Parser { source, pos: 0 }.parse()?;
        Ok(Template {
            source: source.to_string(),
            nodes,
        })
    }

    pub(crate) fn render(
        &self,
        chain: &ScopeChain,
        scope: ScopeId,
        anchor_dir: &Path,
        stack: &mut ExpansionStack,
    ) -> ResolveResult<String> {
        let mut eval = Evaluation {
            chain,
            scope,
            anchor_dir,
            stack,
            errors: Vec::new(),
        };

        let mut output = String::with_capacity(self.source.len());
        for node in &self.nodes {
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Action(stages) => output.push_str(&eval.pipeline(stages)),
            }
        }

        if eval.errors.is_empty() {
            Ok(output)
        } else {
            Err(ResolveError::Unresolved(eval.errors))
        }
    }
}

struct Evaluation<'a> {
    chain: &'a ScopeChain,
    scope: ScopeId,
    anchor_dir: &'a Path,
    stack: &'a mut ExpansionStack,
    errors: Vec<ResolveError>,
}

impl Evaluation<'_> {
    fn pipeline(&mut self, stages: &[Stage]) -> String {
        let mut value: Option<String> = None;

        for stage in stages {
            value = Some(match stage {
                Stage::Value(operand) => self.operand(operand),
                Stage::Call { function, args } => {
                    let arg = match args.first() {
                        Some(operand) => self.operand(operand),
                        None => value.take().unwrap_or_default(),
                    };
                    self.call(*function, &arg)
                }
            });
        }

        value.unwrap_or_default()
    }

    fn operand(&mut self, operand: &Operand) -> String {
        match operand {
            Operand::Literal(text) => text.clone(),
            Operand::Pipeline(stages) => self.pipeline(stages),
        }
    }

    fn call(&mut self, function: Function, arg: &str) -> String {
        match function {
            Function::Var => match self.chain.resolve_in(self.scope, arg, self.stack) {
                Ok(value) => {
                    tracing::debug!("Resolved {} = {}", arg, value);
                    value
                }
                Err(e) => {
                    if !self.errors.contains(&e) {
                        self.errors.push(e);
                    }
                    arg.to_string()
                }
            },
            Function::Path => resolve_path(arg, self.anchor_dir),
            Function::Env => env::var(arg).unwrap_or_default(),
        }
    }
}

fn resolve_path(p: &str, anchor_dir: &Path) -> String {
    let path = Path::new(p);
    if path.is_absolute() {
        return p.to_string();
    }
    clean(&anchor_dir.join(path)).to_string_lossy().into_owned()
}

/// Lexically drop `.` and fold `..` into its parent, without touching the
/// filesystem. `..` above the root stays at the root.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse(mut self) -> ResolveResult<Vec<Node>> {
        let source = self.source;
        let mut nodes = Vec::new();
        let mut trim_leading = false;

        loop {
            let rest = &source[self.pos..];
            let text_len = rest.find(OPEN).unwrap_or(rest.len());
            let mut text = &rest[..text_len];
            if trim_leading {
                text = text.trim_start();
            }
            self.pos += text_len;

            if self.pos >= source.len() {
                push_text(&mut nodes, text);
                return Ok(nodes);
            }

            let start = self.pos;
            self.pos += OPEN.len();
            if self.trim_marker() {
                text = text.trim_end();
            }
            push_text(&mut nodes, text);

            let (stages, trim_right) = self.action(start)?;
            if let Some(stages) = stages {
                nodes.push(Node::Action(stages));
            }
            trim_leading = trim_right;
        }
    }

    fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
    }

    /// `{{- ` trims whitespace before the action
    fn trim_marker(&mut self) -> bool {
        let mut chars = self.rest().chars();
        if chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace) {
            self.pos += 1;
            return true;
        }
        false
    }

    /// Consume `}}` or `-}}`, returning whether trailing whitespace is trimmed
    fn close(&mut self) -> Option<bool> {
        if self.rest().starts_with(TRIM_CLOSE) {
            self.pos += TRIM_CLOSE.len();
            Some(true)
        } else if self.rest().starts_with(CLOSE) {
            self.pos += CLOSE.len();
            Some(false)
        } else {
            None
        }
    }

    fn action(&mut self, start: usize) -> ResolveResult<(Option<Vec<Stage>>, bool)> {
        self.skip_whitespace();

        if self.rest().starts_with(COMMENT_OPEN) {
            let end = self
                .rest()
                .find(COMMENT_CLOSE)
                .ok_or_else(|| self.error(start, "unclosed comment"))?;
            self.pos += end + COMMENT_CLOSE.len();
            self.skip_whitespace();
            let trim = self
                .close()
                .ok_or_else(|| self.error(self.pos, "expected }} after comment"))?;
            return Ok((None, trim));
        }

        let stages = self.pipeline(start)?;
        if let Some(trim) = self.close() {
            return Ok((Some(stages), trim));
        }
        Err(match self.peek() {
            None => self.error(start, "unclosed action"),
            Some(c) => self.error(self.pos, format!("unexpected {:?} in action", c)),
        })
    }

    /// Stages separated by `|`, stopping before whatever ends the pipeline
    fn pipeline(&mut self, start: usize) -> ResolveResult<Vec<Stage>> {
        let mut stages = Vec::new();
        loop {
            stages.push(self.stage(stages.is_empty(), start)?);
            self.skip_whitespace();

            if self.peek() != Some('|') {
                return Ok(stages);
            }
            self.pos += 1;
        }
    }

    fn operand(&mut self, start: usize) -> ResolveResult<Operand> {
        if self.peek() != Some('(') {
            return Ok(Operand::Literal(self.string()?));
        }

        let open = self.pos;
        self.pos += 1;
        let stages = self.pipeline(start)?;
        match self.peek() {
            Some(')') => {
                self.pos += 1;
                Ok(Operand::Pipeline(stages))
            }
            None => Err(self.error(open, "unclosed left paren")),
            Some(c) => Err(self.error(self.pos, format!("unexpected {:?} in operand", c))),
        }
    }

    fn stage(&mut self, first: bool, start: usize) -> ResolveResult<Stage> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(self.error(start, "unclosed action")),
            Some('"' | '`' | '(') if first => Ok(Stage::Value(self.operand(start)?)),
            Some('"' | '`' | '(') => Err(self.error(self.pos, "a value cannot follow '|'")),
            Some(c) if c.is_alphabetic() || c == '_' => {
                let name_pos = self.pos;
                let name = self.identifier();
                let function = Function::lookup(name).ok_or_else(|| {
                    self.error(name_pos, format!("function {:?} not defined", name))
                })?;

                let mut args = Vec::new();
                loop {
                    self.skip_whitespace();
                    match self.peek() {
                        Some('"' | '`' | '(') => args.push(self.operand(start)?),
                        _ => break,
                    }
                }

                let given = args.len() + usize::from(!first);
                if given != 1 {
                    return Err(self.error(
                        name_pos,
                        format!(
                            "wrong number of args for {}: want 1 got {}",
                            function.name(),
                            given
                        ),
                    ));
                }

                Ok(Stage::Call { function, args })
            }
            Some(c) => Err(self.error(self.pos, format!("unexpected {:?} in action", c))),
        }
    }

    fn identifier(&mut self) -> &'a str {
        let source = self.source;
        let rest = &source[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn string(&mut self) -> ResolveResult<String> {
        let start = self.pos;
        let source = self.source;
        let mut chars = source[start..].char_indices();
        let quote = match chars.next() {
            Some((_, q)) => q,
            None => return Err(self.error(start, "expected string")),
        };

        let mut value = String::new();
        while let Some((offset, c)) = chars.next() {
            match c {
                c if c == quote => {
                    self.pos += offset + c.len_utf8();
                    return Ok(value);
                }
                '\\' if quote == '"' => match chars.next() {
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, other)) => {
                        return Err(self.error(
                            start + offset,
                            format!("unknown escape sequence \\{}", other),
                        ))
                    }
                    None => break,
                },
                '\n' if quote == '"' => break,
                c => value.push(c),
            }
        }

        Err(self.error(start, "unterminated quoted string"))
    }

    fn error(&self, position: usize, message: impl Into<String>) -> ResolveError {
        ResolveError::Syntax {
            text: self.source.to_string(),
            position,
            message: message.into(),
        }
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        nodes.push(Node::Text(text.to_string()));
    }
}
