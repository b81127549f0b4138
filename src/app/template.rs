//! Status-bar format strings.
//!
//! Supported syntax:
//! - `{name}` substitutes a placeholder; values are inserted literally.
//! - `[ ... ]` is a block, hidden unless it holds a placeholder with a value.
//! - `|` splits a block into alternatives; the first valid one is shown.
//! - `\?if=name`, `\?if=!name`, `\?if=name=value`, `\?color=name` and
//!   `\?show` at the start of a block, separated by `&`, ended by a space.
//! - `\x` escapes `x`.

use crate::app::models::Palette;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unexpected `]` at offset {0}")]
    UnexpectedClose(usize),
    #[error("block opened at offset {0} is never closed")]
    UnclosedBlock(usize),
    #[error("placeholder opened at offset {0} is never closed")]
    UnclosedPlaceholder(usize),
}

/// A run of text sharing one color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub color: Option<String>,
}

/// Rendered output: ordered colored spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composite {
    spans: Vec<Span>,
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let mut composite = Self::new();
        composite.push(text, None);
        composite
    }

    /// Appends text, merging into the last span when the color matches.
    pub fn push(&mut self, text: impl Into<String>, color: Option<&str>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.spans.last_mut() {
            if last.color.as_deref() == color {
                last.text.push_str(&text);
                return;
            }
        }
        self.spans.push(Span {
            text,
            color: color.map(str::to_string),
        });
    }

    /// Appends `other`; its uncolored spans take `color`.
    pub fn append(&mut self, other: &Composite, color: Option<&str>) {
        for span in &other.spans {
            self.push(span.text.as_str(), span.color.as_deref().or(color));
        }
    }

    /// Joins `items` with `separator` between neighbours only. Empty items
    /// still get separators, unlike py3status's `composite_join`, so N items
    /// always carry N-1 separators.
    pub fn join(separator: &Composite, items: &[Composite]) -> Composite {
        let mut joined = Composite::new();
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                joined.append(separator, None);
            }
            joined.append(item, None);
        }
        joined
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for span in &self.spans {
            f.write_str(&span.text)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Text(String),
    Composite(Composite),
}

impl Value {
    fn is_empty(&self) -> bool {
        match self {
            Value::Int(_) => false,
            Value::Text(text) => text.is_empty(),
            Value::Composite(composite) => composite.is_empty(),
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Value::Int(number) => *number != 0,
            _ => !self.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(number) => write!(f, "{number}"),
            Value::Text(text) => f.write_str(text),
            Value::Composite(composite) => write!(f, "{composite}"),
        }
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Int(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Composite> for Value {
    fn from(composite: Composite) -> Self {
        Value::Composite(composite)
    }
}

/// Placeholder values plus the color labels assigned by thresholds.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, Value>,
    colors: HashMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set_color(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.colors.insert(key.into(), label.into());
    }

    pub fn color(&self, key: &str) -> Option<&str> {
        self.colors.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Placeholder(String),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Truthy(String),
    Falsy(String),
    Equals(String, String),
}

impl Condition {
    fn parse(arg: &str) -> Self {
        if let Some(name) = arg.strip_prefix('!') {
            return Condition::Falsy(name.to_string());
        }
        match arg.split_once('=') {
            Some((name, value)) => Condition::Equals(name.to_string(), value.to_string()),
            None => Condition::Truthy(arg.to_string()),
        }
    }

    fn holds(&self, bindings: &Bindings) -> bool {
        match self {
            Condition::Truthy(name) => bindings.get(name).is_some_and(Value::is_truthy),
            Condition::Falsy(name) => !bindings.get(name).is_some_and(Value::is_truthy),
            Condition::Equals(name, expected) => bindings
                .get(name)
                .is_some_and(|value| value.to_string() == *expected),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Block {
    condition: Option<Condition>,
    color: Option<String>,
    show: bool,
    alternatives: Vec<Vec<Node>>,
}

impl Block {
    fn collect_placeholders(&self, names: &mut BTreeSet<String>) {
        for node in self.alternatives.iter().flatten() {
            match node {
                Node::Placeholder(name) => {
                    names.insert(name.clone());
                }
                Node::Block(block) => block.collect_placeholders(names),
                Node::Text(_) => {}
            }
        }
    }
}

/// A parsed format string.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: Block,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, FormatError> {
        let mut parser = Parser { source, pos: 0 };
        let mut root = parser.block(None)?;
        root.show = true;
        Ok(Self { root })
    }

    /// Names of every `{placeholder}`, nested blocks included.
    pub fn placeholders(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.root.collect_placeholders(&mut names);
        names
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.placeholders().contains(placeholder)
    }

    pub fn render(&self, bindings: &Bindings, palette: &Palette) -> Composite {
        let renderer = Renderer { bindings, palette };
        renderer.block(&self.root, None).unwrap_or_default()
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// `opened_at` is the offset of the `[` for nested blocks.
    fn block(&mut self, opened_at: Option<usize>) -> Result<Block, FormatError> {
        let mut block = Block::default();
        self.commands(&mut block);

        let mut nodes = Vec::new();
        let mut text = String::new();
        loop {
            let start = self.pos;
            let Some(c) = self.bump() else {
                if let Some(at) = opened_at {
                    return Err(FormatError::UnclosedBlock(at));
                }
                break;
            };
            match c {
                '\\' => text.push(self.bump().unwrap_or('\\')),
                '{' => {
                    flush_text(&mut text, &mut nodes);
                    let name = self.placeholder(start)?;
                    nodes.push(Node::Placeholder(name));
                }
                '[' => {
                    flush_text(&mut text, &mut nodes);
                    let inner = self.block(Some(start))?;
                    nodes.push(Node::Block(inner));
                }
                ']' => {
                    if opened_at.is_none() {
                        return Err(FormatError::UnexpectedClose(start));
                    }
                    break;
                }
                '|' => {
                    flush_text(&mut text, &mut nodes);
                    block.alternatives.push(std::mem::take(&mut nodes));
                }
                _ => text.push(c),
            }
        }
        flush_text(&mut text, &mut nodes);
        block.alternatives.push(nodes);
        Ok(block)
    }

    fn placeholder(&mut self, start: usize) -> Result<String, FormatError> {
        let rest = self.rest();
        let end = rest
            .find('}')
            .ok_or(FormatError::UnclosedPlaceholder(start))?;
        let name = rest[..end].trim().to_string();
        self.pos += end + 1;
        Ok(name)
    }

    fn commands(&mut self, block: &mut Block) {
        while self.rest().starts_with("\\?") {
            self.pos += 2;
            let rest = self.rest();
            let end = rest.find([' ', ']', '|']).unwrap_or(rest.len());
            let group = rest[..end].to_string();
            let ends_with_space = rest[end..].starts_with(' ');
            self.pos += end + usize::from(ends_with_space);

            for command in group.split('&').filter(|c| !c.is_empty()) {
                match command.split_once('=') {
                    Some(("if", arg)) => block.condition = Some(Condition::parse(arg)),
                    Some(("color", arg)) => block.color = Some(arg.to_string()),
                    None if command == "show" => block.show = true,
                    _ => log::debug!("Ignoring unknown format command `{}`", command),
                }
            }
        }
    }
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}

struct Renderer<'a> {
    bindings: &'a Bindings,
    palette: &'a Palette,
}

impl Renderer<'_> {
    /// Threshold labels win over palette names.
    fn color<'s>(&'s self, name: &'s str) -> Option<&'s str> {
        match self.bindings.color(name) {
            Some(label) => self.palette.resolve(label),
            None => self.palette.resolve(name),
        }
    }

    /// `None` when no alternative of the block is valid. Blocks marked `show`
    /// fall back to their first ungated alternative instead.
    fn block(&self, block: &Block, inherited: Option<&str>) -> Option<Composite> {
        let color = block
            .color
            .as_deref()
            .and_then(|name| self.color(name))
            .or(inherited);

        let mut fallback = None;
        for (index, nodes) in block.alternatives.iter().enumerate() {
            let gated = block
                .condition
                .as_ref()
                .is_some_and(|condition| !condition.holds(self.bindings));
            if index == 0 && gated {
                continue;
            }
            let (rendered, valid) = self.nodes(nodes, color);
            if valid {
                return Some(rendered);
            }
            fallback.get_or_insert(rendered);
        }
        fallback.filter(|_| block.show)
    }

    fn nodes(&self, nodes: &[Node], color: Option<&str>) -> (Composite, bool) {
        let mut out = Composite::new();
        let mut dynamic = false;
        let mut filled = false;

        for node in nodes {
            match node {
                Node::Text(text) => out.push(text.as_str(), color),
                Node::Placeholder(name) => {
                    dynamic = true;
                    match self.bindings.get(name) {
                        Some(Value::Composite(composite)) => {
                            filled |= !composite.is_empty();
                            out.append(composite, color);
                        }
                        Some(value) if !value.is_empty() => {
                            filled = true;
                            out.push(value.to_string(), color);
                        }
                        _ => {}
                    }
                }
                Node::Block(inner) => {
                    dynamic = true;
                    if let Some(rendered) = self.block(inner, color) {
                        filled |= !rendered.is_empty();
                        out.append(&rendered, None);
                    }
                }
            }
        }

        (out, filled || !dynamic)
    }
}
