//! Lexical primitives for statement scanning.
//!
//! Every primitive works on byte offsets into the statement text. All span
//! delimiters are ASCII, so a UTF-8 continuation byte can never be mistaken
//! for one. Unterminated spans end at the end of the text instead of failing.

/// Lexical features a dialect accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syntax {
    /// `#` starts a line comment.
    pub hash_comments: bool,
    /// `` `ident` `` quotes an identifier.
    pub backtick_quotes: bool,
    /// `[ident]` quotes an identifier.
    pub bracket_quotes: bool,
    /// `$tag$ ... $tag$` quotes a string.
    pub dollar_quotes: bool,
    /// A backslash escapes the next byte inside `'...'` and `"..."`.
    pub backslash_escapes: bool,
    /// `E'...'` is a string with backslash escapes.
    pub escape_strings: bool,
}

/// A comment or quoted span starting at some offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Offset just past the span, or the end of the text.
    pub end: usize,
    /// False when the closing delimiter never appears.
    pub closed: bool,
}

/// Returns true for bytes that may appear in a bare word.
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// A cursor-free view over statement text with a fixed lexical syntax.
///
/// Scans never share state: each method takes the offset to start from and
/// returns the offset it stopped at.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    src: &'a [u8],
    syntax: Syntax,
}

impl<'a> Scanner<'a> {
    pub fn new(sql: &'a str, syntax: Syntax) -> Self {
        Self {
            src: sql.as_bytes(),
            syntax,
        }
    }

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        self.src.len()
    }

    /// Returns the byte at `pos`, if any.
    pub fn byte(&self, pos: usize) -> Option<u8> {
        self.src.get(pos).copied()
    }

    fn starts_with(&self, pos: usize, prefix: &[u8]) -> bool {
        self.src
            .get(pos..)
            .is_some_and(|rest| rest.starts_with(prefix))
    }

    /// Skips any run of whitespace and comments starting at `pos`.
    pub fn skip_trivia(&self, mut pos: usize) -> usize {
        while let Some(b) = self.byte(pos) {
            if b.is_ascii_whitespace() {
                pos += 1;
            } else if let Some(end) = self.comment_end(pos) {
                pos = end;
            } else {
                break;
            }
        }
        pos
    }

    /// If a comment opens at `pos`, returns the offset just past it.
    fn comment_end(&self, pos: usize) -> Option<usize> {
        if self.starts_with(pos, b"--") {
            Some(self.skip_line_comment(pos))
        } else if self.syntax.hash_comments && self.byte(pos) == Some(b'#') {
            Some(self.skip_line_comment(pos))
        } else if self.starts_with(pos, b"/*") {
            Some(self.skip_block_comment(pos))
        } else {
            None
        }
    }

    /// Skips a line comment. Stops at the newline, or at the end of the text.
    pub fn skip_line_comment(&self, pos: usize) -> usize {
        self.src[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.len(), |off| pos + off)
    }

    /// Skips a `/* ... */` comment including the closing delimiter.
    pub fn skip_block_comment(&self, pos: usize) -> usize {
        self.block_comment_close(pos).unwrap_or(self.len())
    }

    fn block_comment_close(&self, pos: usize) -> Option<usize> {
        let body = pos + 2;
        self.src
            .get(body..)
            .and_then(|rest| rest.windows(2).position(|w| w == b"*/"))
            .map(|off| body + off + 2)
    }

    /// Skips a span opened by `quote` at `pos`.
    ///
    /// A doubled delimiter is an escaped delimiter. With backslash escapes
    /// enabled, `\` protects the next byte inside single and double quotes.
    pub fn skip_quoted(&self, pos: usize, quote: u8) -> usize {
        let backslash = self.syntax.backslash_escapes && quote != b'`';
        self.quoted_close(pos, quote, backslash).unwrap_or(self.len())
    }

    fn quoted_close(&self, pos: usize, quote: u8, backslash: bool) -> Option<usize> {
        let mut i = pos + 1;
        while let Some(b) = self.byte(i) {
            if backslash && b == b'\\' {
                i += 2;
                continue;
            }
            i += 1;
            if b == quote {
                if self.byte(i) == Some(quote) {
                    i += 1;
                    continue;
                }
                return Some(i);
            }
        }
        None
    }

    /// Skips a `[...]` identifier.
    pub fn skip_bracketed(&self, pos: usize) -> usize {
        self.bracket_close(pos).unwrap_or(self.len())
    }

    fn bracket_close(&self, pos: usize) -> Option<usize> {
        self.src[pos + 1..]
            .iter()
            .position(|&b| b == b']')
            .map(|off| pos + 1 + off + 1)
    }

    /// Parses a dollar-quote tag (`$$` or `$name$`) starting at `pos`.
    ///
    /// Returns the whole tag including both `$`, or `None` when the `$` does
    /// not open a dollar-quoted string.
    pub fn dollar_tag(&self, pos: usize) -> Option<&'a [u8]> {
        if self.byte(pos) != Some(b'$') {
            return None;
        }
        let mut j = pos + 1;
        loop {
            match self.byte(j)? {
                b'$' => return Some(&self.src[pos..=j]),
                b if is_ident_byte(b) => j += 1,
                _ => return None,
            }
        }
    }

    /// Skips a dollar-quoted string whose opening `tag` sits at `pos`.
    pub fn skip_dollar_quoted(&self, pos: usize, tag: &[u8]) -> usize {
        self.dollar_close(pos, tag).unwrap_or(self.len())
    }

    fn dollar_close(&self, pos: usize, tag: &[u8]) -> Option<usize> {
        let body = pos + tag.len();
        self.src[body..]
            .windows(tag.len())
            .position(|w| w == tag)
            .map(|off| body + off + tag.len())
    }

    /// True when the byte before `pos` belongs to a bare word.
    fn follows_word(&self, pos: usize) -> bool {
        pos > 0 && is_ident_byte(self.src[pos - 1])
    }

    /// Recognizes a comment or quoted span opening at `pos`.
    ///
    /// A line comment counts as closed even at the end of the text.
    pub fn opaque_span(&self, pos: usize) -> Option<Span> {
        let span = |close: Option<usize>| Span {
            end: close.unwrap_or(self.len()),
            closed: close.is_some(),
        };

        if self.starts_with(pos, b"/*") {
            return Some(span(self.block_comment_close(pos)));
        }
        if let Some(end) = self.comment_end(pos) {
            return Some(Span { end, closed: true });
        }
        let backslash = self.syntax.backslash_escapes;
        match self.byte(pos)? {
            q @ (b'\'' | b'"') => Some(span(self.quoted_close(pos, q, backslash))),
            b'`' if self.syntax.backtick_quotes => Some(span(self.quoted_close(pos, b'`', false))),
            b'[' if self.syntax.bracket_quotes => Some(span(self.bracket_close(pos))),
            b'$' if self.syntax.dollar_quotes => self
                .dollar_tag(pos)
                .map(|tag| span(self.dollar_close(pos, tag))),
            b'E' | b'e'
                if self.syntax.escape_strings
                    && self.byte(pos + 1) == Some(b'\'')
                    && !self.follows_word(pos) =>
            {
                Some(span(self.quoted_close(pos + 1, b'\'', true)))
            }
            _ => None,
        }
    }

    /// If a comment or quoted span opens at `pos`, returns the offset just
    /// past it. Every returned offset is strictly greater than `pos`.
    pub fn skip_opaque(&self, pos: usize) -> Option<usize> {
        self.opaque_span(pos).map(|span| span.end)
    }

    /// Returns true when the text ends inside a span that was never closed,
    /// such as an unfinished string or `$$` body.
    pub fn ends_in_open_span(&self) -> bool {
        let mut pos = 0;
        while let Some(b) = self.byte(pos) {
            match self.opaque_span(pos) {
                Some(span) if !span.closed => return true,
                Some(span) => pos = span.end,
                None if is_ident_byte(b) => pos = self.word_end(pos),
                None => pos += 1,
            }
        }
        false
    }

    /// Returns the offset just past the bare word starting at `pos`.
    pub fn word_end(&self, pos: usize) -> usize {
        self.src[pos..]
            .iter()
            .position(|&b| !is_ident_byte(b))
            .map_or(self.len(), |off| pos + off)
    }

    /// Returns the bare word in `start..end`. Word bytes are ASCII.
    pub fn word(&self, start: usize, end: usize) -> &'a str {
        std::str::from_utf8(&self.src[start..end]).unwrap_or_default()
    }
}
