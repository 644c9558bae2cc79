//! Recipe blocks embedded in server scripts.
//!
//! Scripts register recipes with calls such as
//! `event.shaped('4x ns:item', ['AA', 'AA'], {A: '#c:ingots'})`,
//! `event.shapeless(...)`, and `event.custom({...})`. Each call is located
//! with a regex, its argument list is read with a small parser for the
//! literal subset of the scripting language (objects with bare keys, single
//! quoted strings, trailing commas, `Item.of`), and the arguments are turned
//! into the same JSON document a loose declaration would contain.

use regex::Regex;
use serde_json::{Map, Number, Value, json};
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\s*(shapeless|shaped|custom)\s*\(").expect("recipe call regex is valid")
});

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unterminated {method} call at byte {offset}")]
    Unterminated { method: ScriptMethod, offset: usize },

    #[error("syntax error at byte {offset}: {detail}")]
    Syntax { offset: usize, detail: String },

    #[error("{method} call at byte {offset} has {found} arguments, expected {expected}")]
    Arguments {
        method: ScriptMethod,
        offset: usize,
        expected: usize,
        found: usize,
    },
}

// ===========================================================================
// Blocks
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptMethod {
    Shaped,
    Shapeless,
    Custom,
}

impl ScriptMethod {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "shaped" => Some(Self::Shaped),
            "shapeless" => Some(Self::Shapeless),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::Shaped => 3,
            Self::Shapeless => 2,
            Self::Custom => 1,
        }
    }
}

impl fmt::Display for ScriptMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shaped => "shaped",
            Self::Shapeless => "shapeless",
            Self::Custom => "custom",
        })
    }
}

/// One recipe call found in a script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBlock {
    /// Position among the blocks of its file.
    pub ordinal: u32,
    pub method: ScriptMethod,
    /// Byte offset of the call in the source.
    pub offset: usize,
    /// The equivalent declaration document.
    pub declaration: Result<Value, ScriptError>,
}

/// Find every recipe call in a script source, in source order.
pub fn find_blocks(source: &str) -> Vec<ScriptBlock> {
    let cleaned = strip_comments(source);
    let strings = string_spans(&cleaned);
    let mut blocks = Vec::new();
    let mut resume_at = 0;

    for captures in CALL_RE.captures_iter(&cleaned) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() < resume_at || inside(&strings, whole.start()) {
            continue;
        }
        let Some(method) = ScriptMethod::from_name(name.as_str()) else {
            continue;
        };

        let mut parser = Parser::new(&cleaned, whole.end());
        let declaration = parser
            .arguments(method, whole.start())
            .and_then(|args| to_declaration(method, whole.start(), args));
        resume_at = parser.pos;

        blocks.push(ScriptBlock {
            ordinal: blocks.len() as u32,
            method,
            offset: whole.start(),
            declaration,
        });
    }
    blocks
}

fn to_declaration(method: ScriptMethod, offset: usize, args: Vec<Value>) -> Result<Value, ScriptError> {
    if args.len() < method.arity() {
        return Err(ScriptError::Arguments {
            method,
            offset,
            expected: method.arity(),
            found: args.len(),
        });
    }
    let mut args = args.into_iter();
    let mut next = || args.next().unwrap_or(Value::Null);
    Ok(match method {
        ScriptMethod::Shaped => {
            let (result, pattern, key) = (next(), next(), next());
            json!({
                "type": "minecraft:crafting_shaped",
                "result": result,
                "pattern": pattern,
                "key": key
            })
        }
        ScriptMethod::Shapeless => {
            let (result, ingredients) = (next(), next());
            json!({
                "type": "minecraft:crafting_shapeless",
                "result": result,
                "ingredients": ingredients
            })
        }
        ScriptMethod::Custom => match next() {
            object @ Value::Object(_) => object,
            other => {
                return Err(ScriptError::Syntax {
                    offset,
                    detail: format!("custom recipe must be an object literal, got {other}"),
                });
            }
        },
    })
}

// ===========================================================================
// Comment stripping
// ===========================================================================

/// Replace `//` and `/* */` comments with spaces, keeping byte offsets and
/// newlines. String literals are left untouched.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        let lookahead = chars.peek().copied();
        match (c, lookahead) {
            ('/', Some('/')) => {
                out.push(' ');
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                    blank(&mut out, next);
                }
            }
            ('/', Some('*')) => {
                out.push(' ');
                let mut previous = ' ';
                for next in chars.by_ref() {
                    let closes = previous == '*' && next == '/';
                    blank(&mut out, next);
                    if closes {
                        break;
                    }
                    previous = next;
                }
            }
            ('\'' | '"' | '`', _) => {
                quote = Some(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Byte ranges of the string literals in comment-free source, quotes
/// included. An unterminated literal runs to the end.
fn string_spans(source: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut chars = source.char_indices();
    while let Some((start, c)) = chars.next() {
        if !matches!(c, '\'' | '"' | '`') {
            continue;
        }
        let mut end = source.len();
        while let Some((i, next)) = chars.next() {
            if next == '\\' {
                chars.next();
            } else if next == c {
                end = i + 1;
                break;
            }
        }
        spans.push(start..end);
    }
    spans
}

fn inside(spans: &[Range<usize>], offset: usize) -> bool {
    let idx = spans.partition_point(|span| span.end <= offset);
    spans.get(idx).is_some_and(|span| span.contains(&offset))
}

fn blank(out: &mut String, c: char) {
    if c == '\n' {
        out.push('\n');
    } else {
        out.extend(std::iter::repeat_n(' ', c.len_utf8()));
    }
}

// ===========================================================================
// Literal parser
// ===========================================================================

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, detail: impl Into<String>) -> ScriptError {
        ScriptError::Syntax {
            offset: self.pos,
            detail: detail.into(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ScriptError> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    /// Arguments of a call whose `(` has been consumed.
    fn arguments(&mut self, method: ScriptMethod, offset: usize) -> Result<Vec<Value>, ScriptError> {
        self.list(')').map_err(|e| match e {
            ScriptError::Syntax { .. } if self.peek().is_none() => {
                ScriptError::Unterminated { method, offset }
            }
            other => other,
        })
    }

    /// Comma-separated values up to `close`; trailing commas allowed.
    fn list(&mut self, close: char) -> Result<Vec<Value>, ScriptError> {
        let mut values = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(values);
            }
            values.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => {}
                Some(c) if c == close => return Ok(values),
                Some(c) => return Err(self.error(format!("unexpected '{c}' in list"))),
                None => return Err(self.error("unexpected end of input")),
            }
        }
    }

    fn value(&mut self) -> Result<Value, ScriptError> {
        self.skip_ws();
        let value = match self.peek() {
            Some('\'' | '"' | '`') => Value::String(self.string()?),
            Some('{') => self.object()?,
            Some('[') => {
                self.bump();
                Value::Array(self.list(']')?)
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '.' => self.number()?,
            Some(c) if is_ident_start(c) => self.expression()?,
            Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            None => return Err(self.error("unexpected end of input")),
        };
        self.methods(value)
    }

    fn string(&mut self) -> Result<String, ScriptError> {
        let Some(quote) = self.bump() else {
            return Err(self.error("expected string"));
        };
        let mut out = String::new();
        while let Some(c) = self.bump() {
            match c {
                '\\' => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => break,
                },
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> Result<Value, ScriptError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        if let Ok(n) = text.parse::<u64>() {
            return Ok(Value::Number(n.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("invalid number '{text}'")))
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn object(&mut self) -> Result<Value, ScriptError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            let key = match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                Some('\'' | '"' | '`') => self.string()?,
                Some(c) if is_ident_char(c) => self.identifier().to_string(),
                Some(c) => return Err(self.error(format!("unexpected '{c}' in object key"))),
                None => return Err(self.error("unexpected end of input")),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);
            self.skip_ws();
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(Value::Object(map)),
                Some(c) => return Err(self.error(format!("unexpected '{c}' in object"))),
                None => return Err(self.error("unexpected end of input")),
            }
        }
    }

    /// Keywords, dotted paths, and the item helpers `Item.of` /
    /// `Ingredient.of`. Anything else evaluates to `null`.
    fn expression(&mut self) -> Result<Value, ScriptError> {
        let start = self.pos;
        self.identifier();
        while self.peek() == Some('.')
            && self.src[self.pos + 1..].chars().next().is_some_and(is_ident_start)
        {
            // Stop before a method call so `methods` can apply it.
            let save = self.pos;
            self.bump();
            self.identifier();
            self.skip_ws();
            let is_call = self.peek() == Some('(');
            let path = &self.src[start..self.pos];
            if is_call && !matches!(path.trim_end(), "Item.of" | "Ingredient.of") {
                self.pos = save;
                break;
            }
        }
        let path = self.src[start..self.pos].trim_end().to_string();

        self.skip_ws();
        if self.peek() == Some('(') {
            self.bump();
            let args = self.list(')')?;
            return Ok(call(&path, args));
        }
        Ok(match path.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Null,
        })
    }

    /// Trailing `.method(...)` calls; only `withCount` changes the value.
    fn methods(&mut self, mut value: Value) -> Result<Value, ScriptError> {
        loop {
            let save = self.pos;
            self.skip_ws();
            if self.peek() != Some('.') {
                self.pos = save;
                return Ok(value);
            }
            self.bump();
            self.skip_ws();
            let name = self.identifier();
            self.skip_ws();
            if name.is_empty() || self.peek() != Some('(') {
                self.pos = save;
                return Ok(value);
            }
            self.bump();
            let args = self.list(')')?;
            if name == "withCount" {
                if let Some(count) = args.first().and_then(Value::as_u64) {
                    value = with_count(value, count);
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn call(path: &str, args: Vec<Value>) -> Value {
    match path {
        "Item.of" | "Ingredient.of" => {
            let mut args = args.into_iter();
            let base = args.next().unwrap_or(Value::Null);
            match args.next().as_ref().and_then(Value::as_u64) {
                Some(count) => with_count(base, count),
                None => base,
            }
        }
        _ => Value::Null,
    }
}

/// Attach a stack count to an id string (`"4x ns:item"`).
fn with_count(value: Value, count: u64) -> Value {
    match value {
        Value::String(id) if count != 1 => Value::String(format!("{count}x {id}")),
        other => other,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> Value {
        let blocks = find_blocks(source);
        assert_eq!(blocks.len(), 1, "expected one block in {source}");
        blocks[0].declaration.clone().unwrap()
    }

    // -----------------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------------

    #[test]
    fn shaped_call_becomes_grid_declaration() {
        let decl = single(
            r#"ServerEvents.recipes(event => {
                event.shaped('4x minecraft:torch', [
                    'C',
                    'S',
                ], {
                    C: '#minecraft:coals',
                    S: 'minecraft:stick',
                })
            })"#,
        );
        assert_eq!(decl["type"], "minecraft:crafting_shaped");
        assert_eq!(decl["result"], "4x minecraft:torch");
        assert_eq!(decl["pattern"], json!(["C", "S"]));
        assert_eq!(decl["key"]["C"], "#minecraft:coals");
    }

    #[test]
    fn shapeless_with_item_of() {
        let decl = single(
            r#"event.shapeless(Item.of("minecraft:oak_planks", 4), ["minecraft:oak_log"]);"#,
        );
        assert_eq!(decl["type"], "minecraft:crafting_shapeless");
        assert_eq!(decl["result"], "4x minecraft:oak_planks");
        assert_eq!(decl["ingredients"], json!(["minecraft:oak_log"]));
    }

    #[test]
    fn custom_object_passes_through() {
        let decl = single(
            r#"event.custom({
                type: 'ae2:inscriber',
                mode: "inscribe",
                ingredients: { middle: { item: 'ae2:silicon' }, top: { item: 'ae2:silicon_press' } },
                result: { item: 'ae2:printed_silicon', count: 1 },
            })"#,
        );
        assert_eq!(decl["type"], "ae2:inscriber");
        assert_eq!(decl["ingredients"]["middle"]["item"], "ae2:silicon");
        assert_eq!(decl["result"]["count"], 1);
    }

    #[test]
    fn with_count_and_unknown_calls() {
        let decl = single(
            r#"event.shapeless(Item.of('ae2:cable').withCount(8).strongNBT(), [Ingredient.of('#c:dusts/fluix'), someVar])"#,
        );
        assert_eq!(decl["result"], "8x ae2:cable");
        assert_eq!(decl["ingredients"], json!(["#c:dusts/fluix", null]));
    }

    #[test]
    fn blocks_are_numbered_in_order() {
        let blocks = find_blocks(
            "e.shaped('a:b', ['X'], {X: 'a:c'})\ne.shapeless('a:d', ['a:e'])\ne.custom({type: 'x:y'})",
        );
        let methods: Vec<(u32, ScriptMethod)> = blocks.iter().map(|b| (b.ordinal, b.method)).collect();
        assert_eq!(
            methods,
            [
                (0, ScriptMethod::Shaped),
                (1, ScriptMethod::Shapeless),
                (2, ScriptMethod::Custom)
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Comments and failures
    // -----------------------------------------------------------------------

    #[test]
    fn commented_calls_are_ignored() {
        let source = "// event.shaped('a:b', ['X'], {X: 'a:c'})\n/* event.shapeless('a:d', ['a:e']) */\nevent.shapeless('a:f', ['a:g']) // trailing";
        let blocks = find_blocks(source);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].declaration.as_ref().unwrap()["result"], "a:f");
    }

    #[test]
    fn comment_markers_inside_strings_are_kept() {
        let stripped = strip_comments("x('http://example', /* gone */ 'y')");
        assert_eq!(stripped.len(), "x('http://example', /* gone */ 'y')".len());
        assert!(stripped.contains("'http://example'"));
        assert!(!stripped.contains("gone"));
    }

    #[test]
    fn calls_quoted_in_strings_are_ignored() {
        let source = r#"console.log("use event.shaped(out, grid, keys)")
let hint = 'or e.custom({type: "x:y"})'
event.shapeless('a:f', ['a:g'])"#;
        let blocks = find_blocks(source);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].method, ScriptMethod::Shapeless);
        assert_eq!(blocks[0].ordinal, 0);
        assert_eq!(blocks[0].declaration.as_ref().unwrap()["result"], "a:f");
    }

    #[test]
    fn too_few_arguments() {
        let blocks = find_blocks("event.shaped('a:b', ['X'])");
        assert!(matches!(
            blocks[0].declaration,
            Err(ScriptError::Arguments { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn unterminated_call() {
        let blocks = find_blocks("event.shapeless('a:b', ['a:c'");
        assert!(matches!(blocks[0].declaration, Err(ScriptError::Unterminated { .. })));
    }

    #[test]
    fn syntax_error_is_reported() {
        let blocks = find_blocks("event.custom({type: 'x:y' = 3})");
        assert!(matches!(blocks[0].declaration, Err(ScriptError::Syntax { .. })));
    }
}
