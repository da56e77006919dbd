use crate::{
    ast::{
        Ast, BoolOp, BooleanNode, CompareOp, DateTimeNode, GroupNode, Location, Node,
        OperatorNode, StringNode,
    },
    clock::Clock,
    date::{self, DateContext, RelativeRange},
    error::{ParseError, Result},
};
use tracing::trace;

/// Parses KQL text into the raw, un-normalized node sequence.
///
/// Implicit connectors are not inserted here; see
/// [`normalize_query`](crate::normalize_query).
pub fn parse_query(input: &str, clock: &dyn Clock) -> Result<Ast> {
    Parser::new(input, clock).parse()
}

/// Cursor over the query text. Every node records the byte span it was read
/// from.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
    clock: &'a dyn Clock,
    dates: Option<DateContext>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, clock: &'a dyn Clock) -> Self {
        Self {
            input,
            pos: 0,
            clock,
            dates: None,
        }
    }

    fn parse(mut self) -> Result<Ast> {
        let nodes = self.parse_sequence()?;
        if !self.eof() {
            // only a closing parenthesis ends the top-level sequence early
            return Err(self
                .error_at(self.pos, self.pos + 1, "unexpected closing parenthesis")
                .into());
        }
        Ok(Ast {
            nodes,
            loc: Location::new(0, self.input.len(), Some(self.input.to_string())),
        })
    }

    fn parse_sequence(&mut self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_ws();
            match self.peek_char() {
                None | Some(')') => break,
                Some(_) => self.parse_item(&mut nodes)?,
            }
        }
        Ok(nodes)
    }

    fn parse_item(&mut self, out: &mut Vec<Node>) -> Result<()> {
        let start = self.pos;
        match self.peek_char() {
            Some('(') => {
                let group = self.parse_group(start, String::new())?;
                out.push(group);
                return Ok(());
            }
            Some('"') => {
                let value = self.parse_phrase()?;
                out.push(Node::String(StringNode {
                    key: String::new(),
                    value,
                    loc: self.loc_from(start),
                }));
                return Ok(());
            }
            Some('+') => {
                self.advance_char();
                // `+cat` alone or after another operator only marks the term
                // as required.
                if out.last().is_some_and(|node| node.as_operator().is_none()) {
                    out.push(self.operator(BoolOp::And, start));
                }
                return Ok(());
            }
            Some('-') => {
                self.advance_char();
                out.push(self.operator(BoolOp::Not, start));
                return Ok(());
            }
            _ => {}
        }

        for op in [BoolOp::And, BoolOp::Or, BoolOp::Not] {
            if self.consume_keyword(op.as_str()) {
                out.push(self.operator(op, start));
                return Ok(());
            }
        }

        if self.parse_restriction(out)? {
            return Ok(());
        }
        self.parse_word(out);
        Ok(())
    }

    fn parse_group(&mut self, start: usize, key: String) -> Result<Node> {
        self.advance_char(); // opening paren
        let nodes = self.parse_sequence()?;
        if self.peek_char() != Some(')') {
            return Err(self
                .error_at(start, self.pos, "missing closing parenthesis")
                .into());
        }
        self.advance_char();
        if nodes.is_empty() {
            return Err(self.error_at(start, self.pos, "empty group").into());
        }
        Ok(Node::Group(GroupNode {
            key,
            nodes,
            loc: self.loc_from(start),
        }))
    }

    /// `key op value` or `key:(...)`. Returns `false` with the cursor restored
    /// when the text at the cursor is not a restriction.
    fn parse_restriction(&mut self, out: &mut Vec<Node>) -> Result<bool> {
        let start = self.pos;
        let key_len = self.scan_key();
        if key_len == 0 {
            return Ok(false);
        }
        let key = self.input[start..start + key_len].to_string();
        self.pos = start + key_len;
        self.skip_ws();
        let Some(op) = self.consume_compare_op() else {
            self.pos = start;
            return Ok(false);
        };
        if self.peek_char().is_some_and(is_operator_char) {
            return Err(self
                .error_at(start, self.pos + 1, "malformed property restriction operator")
                .into());
        }
        let op_end = self.pos;
        self.skip_ws();
        let spaced = self.pos > op_end;

        match self.peek_char() {
            Some('(') if op.is_match() => {
                let group = self.parse_group(start, key)?;
                out.push(group);
                return Ok(true);
            }
            None | Some('(') | Some(')') => {
                trace!(key = %key, "restriction without a value read as free text");
                self.pos = start;
                return Ok(false);
            }
            _ => {}
        }
        // `author: tag:x` leaves `author:` dangling instead of swallowing the
        // next restriction.
        if spaced && (self.starts_with_restriction() || self.at_keyword()) {
            trace!(key = %key, "restriction without a value read as free text");
            self.pos = start;
            return Ok(false);
        }

        let value_start = self.pos;
        let (raw, quoted) = if self.peek_char() == Some('"') {
            (self.parse_phrase()?, true)
        } else {
            if let Some(range) = self.consume_spaced_range() {
                out.extend(self.relative_nodes(&key, op, range, start)?);
                return Ok(true);
            }
            (self.scan_bare().to_string(), false)
        };

        match self.restriction_nodes(&key, op, &raw, quoted, start, value_start)? {
            Some(nodes) => {
                out.extend(nodes);
                Ok(true)
            }
            None if quoted => Err(self
                .error_at(value_start, self.pos, format!("'{op}' expects a date value"))
                .into()),
            None => {
                trace!(key = %key, op = op.as_str(), "comparison without a date read as free text");
                self.pos = start;
                Ok(false)
            }
        }
    }

    fn restriction_nodes(
        &mut self,
        key: &str,
        op: CompareOp,
        raw: &str,
        quoted: bool,
        start: usize,
        value_start: usize,
    ) -> Result<Option<Vec<Node>>> {
        let context = self.date_context();
        match date::parse_date_literal(raw, !op.is_match(), &context) {
            Ok(Some(value)) => {
                return Ok(Some(vec![Node::DateTime(DateTimeNode {
                    key: key.to_string(),
                    operator: op,
                    value,
                    loc: self.loc_from(start),
                })]));
            }
            Ok(None) => {}
            Err(message) => return Err(self.error_at(value_start, self.pos, message).into()),
        }
        if let Some(range) = RelativeRange::from_phrase(raw) {
            return self.relative_nodes(key, op, range, start).map(Some);
        }
        if !op.is_match() {
            return Ok(None);
        }

        let loc = self.loc_from(start);
        let node = match (quoted, parse_bool(raw)) {
            (false, Some(value)) => Node::Boolean(BooleanNode {
                key: key.to_string(),
                value,
                loc,
            }),
            _ => Node::String(StringNode {
                key: key.to_string(),
                value: raw.to_string(),
                loc,
            }),
        };
        Ok(Some(vec![node]))
    }

    /// Match operators expand a relative range into a closed interval; the
    /// comparison operators keep a single bound.
    fn relative_nodes(
        &mut self,
        key: &str,
        op: CompareOp,
        range: RelativeRange,
        start: usize,
    ) -> Result<Vec<Node>> {
        let (from, to) = range.resolve(&self.date_context())?;
        let loc = self.loc_from(start);
        let bound = |operator, value| {
            Node::DateTime(DateTimeNode {
                key: key.to_string(),
                operator,
                value,
                loc: loc.clone(),
            })
        };
        let nodes = match op {
            CompareOp::Colon | CompareOp::Equal => vec![
                bound(CompareOp::GreaterOrEqual, from),
                Node::Operator(OperatorNode {
                    value: BoolOp::And,
                    loc: loc.clone(),
                }),
                bound(CompareOp::LessOrEqual, to),
            ],
            CompareOp::Less => vec![bound(CompareOp::Less, from)],
            CompareOp::LessOrEqual => vec![bound(CompareOp::LessOrEqual, to)],
            CompareOp::Greater => vec![bound(CompareOp::Greater, to)],
            CompareOp::GreaterOrEqual => vec![bound(CompareOp::GreaterOrEqual, from)],
        };
        Ok(nodes)
    }

    fn parse_word(&mut self, out: &mut Vec<Node>) {
        let start = self.pos;
        let raw = self.scan_bare();
        let text = raw.trim_matches(':');
        if text.is_empty() {
            return;
        }
        out.push(Node::String(StringNode {
            key: String::new(),
            value: text.to_string(),
            loc: self.loc_from(start),
        }));
    }

    fn parse_phrase(&mut self) -> Result<String> {
        let quote_pos = self.pos;
        self.advance_char(); // opening quote
        let mut result = String::new();
        while let Some(ch) = self.peek_char() {
            self.advance_char();
            if ch == '"' {
                return Ok(result);
            }
            result.push(ch);
        }
        Err(self
            .error_at(quote_pos, self.pos, "missing closing quote")
            .into())
    }

    /// Multi-word relative phrases written without quotes (`Mtime:last week`).
    fn consume_spaced_range(&mut self) -> Option<RelativeRange> {
        let rest = self.remaining();
        for range in RelativeRange::ALL {
            let phrase = range.phrase();
            if !phrase.contains(' ') {
                continue;
            }
            let Some(candidate) = rest.get(..phrase.len()) else {
                continue;
            };
            if !candidate.eq_ignore_ascii_case(phrase) {
                continue;
            }
            let bounded = rest[phrase.len()..]
                .chars()
                .next()
                .is_none_or(|ch| ch.is_whitespace() || ch == ')');
            if bounded {
                self.pos += phrase.len();
                return Some(range);
            }
        }
        None
    }

    fn date_context(&mut self) -> DateContext {
        self.dates
            .get_or_insert_with(|| DateContext::capture(self.clock))
            .clone()
    }

    /// Length in bytes of the property name at the cursor, or 0.
    fn scan_key(&self) -> usize {
        let rest = self.remaining();
        if !rest.chars().next().is_some_and(|ch| ch.is_ascii_alphabetic()) {
            return 0;
        }
        rest.char_indices()
            .find(|&(_, ch)| !is_key_char(ch))
            .map_or(rest.len(), |(idx, _)| idx)
    }

    fn scan_bare(&mut self) -> &'a str {
        let rest = self.remaining();
        let len = rest
            .char_indices()
            .find(|&(_, ch)| is_term_breaker(ch))
            .map_or(rest.len(), |(idx, _)| idx);
        self.pos += len;
        &rest[..len]
    }

    fn consume_compare_op(&mut self) -> Option<CompareOp> {
        const OPERATORS: [(&str, CompareOp); 6] = [
            (">=", CompareOp::GreaterOrEqual),
            ("<=", CompareOp::LessOrEqual),
            (">", CompareOp::Greater),
            ("<", CompareOp::Less),
            ("=", CompareOp::Equal),
            (":", CompareOp::Colon),
        ];
        let rest = self.remaining();
        let (token, op) = OPERATORS
            .into_iter()
            .find(|(token, _)| rest.starts_with(token))?;
        self.pos += token.len();
        Some(op)
    }

    fn starts_with_restriction(&self) -> bool {
        let key_len = self.scan_key();
        if key_len == 0 {
            return false;
        }
        self.remaining()[key_len..]
            .trim_start()
            .starts_with(is_operator_char)
    }

    fn at_keyword(&self) -> bool {
        [BoolOp::And, BoolOp::Or, BoolOp::Not]
            .into_iter()
            .any(|op| self.keyword_len(op.as_str()).is_some())
    }

    fn keyword_len(&self, keyword: &str) -> Option<usize> {
        let rest = self.remaining();
        if !rest.starts_with(keyword) {
            return None;
        }
        match rest[keyword.len()..].chars().next() {
            Some(next) if !is_keyword_boundary_char(next) => None,
            _ => Some(keyword.len()),
        }
    }

    // Keywords are case-sensitive: `and` is a search word.
    fn consume_keyword(&mut self, keyword: &str) -> bool {
        match self.keyword_len(keyword) {
            Some(len) => {
                self.pos += len;
                true
            }
            None => false,
        }
    }

    fn operator(&self, value: BoolOp, start: usize) -> Node {
        Node::Operator(OperatorNode {
            value,
            loc: self.loc_from(start),
        })
    }

    fn loc_from(&self, start: usize) -> Location {
        Location::new(start, self.pos, Some(self.input[start..self.pos].to_string()))
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error_at(&self, start: usize, end: usize, message: impl Into<String>) -> ParseError {
        let end = end.min(self.input.len()).max(start);
        ParseError {
            message: message.into(),
            location: Location::new(start, end, self.input.get(start..end).map(str::to_string)),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.')
}

fn is_operator_char(ch: char) -> bool {
    matches!(ch, ':' | '=' | '<' | '>')
}

fn is_term_breaker(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')')
}

fn is_keyword_boundary_char(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '"')
}
