//! Parser for the brace-list text of decoded metadata streams.
//!
//! Grammar, over 8-bit bytes:
//! ```text
//! value     := container | string | token
//! container := '{' (value (',' value)*)? '}'
//! string    := '"' (any-byte | '""')* '"'
//! token     := run of bytes excluding ',', '}' and bytes <= 0x20
//! ```
//!
//! The parser never fails. Truncated or malformed input yields the
//! best-effort tree built so far:
//! - a container missing its `}` ends at the end of the buffer
//! - a string missing its closing quote ends at the end of the buffer
//! - a byte other than `,` or `}` after a child closes the container,
//!   without being consumed

use super::models::Node;

/// Parse the first value of `text`. Trailing bytes are ignored.
pub fn parse(text: &[u8]) -> Node {
    Parser::new(text).parse_value()
}

/// Single-pass parser over a byte buffer with a forward-only cursor.
pub struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Parse one value starting at the cursor.
    ///
    /// Nesting is kept on a heap stack of open containers rather than the
    /// call stack, so arbitrarily deep input cannot overflow the thread stack.
    pub fn parse_value(&mut self) -> Node {
        // Children collected so far for each container still open, innermost last.
        let mut open: Vec<Vec<Node>> = Vec::new();

        loop {
            self.skip_whitespace();
            let mut node = match self.peek() {
                Some(b'{') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    match self.peek() {
                        None => Node::Container(Vec::new()),
                        Some(b'}') => {
                            self.pos += 1;
                            Node::Container(Vec::new())
                        }
                        Some(_) => {
                            open.push(Vec::new());
                            continue;
                        }
                    }
                }
                Some(b'"') => self.string(),
                _ => self.token(),
            };

            // Hand the finished value to its parent, closing every container
            // that has no further children.
            loop {
                let Some(mut children) = open.pop() else {
                    return node;
                };
                children.push(node);

                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        open.push(children);
                        break;
                    }
                    Some(b'}') => self.pos += 1,
                    _ => {}
                }
                node = Node::Container(children);
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b <= 0x20) {
            self.pos += 1;
        }
    }

    /// Quoted string; `""` stands for one literal quote.
    fn string(&mut self) -> Node {
        self.pos += 1;
        let mut value = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b != b'"' {
                value.push(b);
            } else if self.peek() == Some(b'"') {
                value.push(b'"');
                self.pos += 1;
            } else {
                break;
            }
        }
        Node::Leaf(value)
    }

    /// Bare token such as a number. May be empty.
    fn token(&mut self) -> Node {
        let rest = &self.input[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == b',' || b == b'}' || b <= 0x20)
            .unwrap_or(rest.len());
        self.pos += len;
        Node::Leaf(rest[..len].to_vec())
    }
}
