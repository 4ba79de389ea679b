//! Hand-written lexer for Htmlaskama templates.
//!
//! Mode-switching state machine:
//! - Text mode: accumulates raw content until `<!--`, `</`, `<`, `{{` or `{%`
//! - Tag mode: tokenizes names, `=`, attribute values and `>` / `/>` inside
//!   an HTML tag; `{%` statements may interleave with attributes
//!
//! Expression interiors, statement conditions and comment bodies are scanned
//! raw up to their closing sequence (`}}`, `%}`, `-->`); the closing sequence
//! itself is never part of the scanned content. At end of input the raw scan
//! stops and the parser reports the unclosed construct.

use crate::token::{Token, TokenType};
use crate::{Location, ParseError};

/// Tokenize a source string into a sequence of tokens.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

#[derive(Debug, PartialEq)]
enum Mode {
    Text,
    Tag,
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    mode: Mode,
    expect_value: bool,
}

impl<'a> Lexer<'a> {
    const COMMENT_OPEN: &'static [u8] = b"<!--";
    const COMMENT_CLOSE: &'static [u8] = b"-->";
    const EXPR_OPEN: &'static [u8] = b"{{";
    const EXPR_CLOSE: &'static [u8] = b"}}";
    const STMT_OPEN: &'static [u8] = b"{%";
    const STMT_CLOSE: &'static [u8] = b"%}";

    fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            mode: Mode::Text,
            expect_value: false,
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        while self.pos < self.source.len() {
            match self.mode {
                Mode::Text => self.tokenize_text(&mut tokens)?,
                Mode::Tag => self.tokenize_tag(&mut tokens)?,
            }
        }

        let eof_loc = self.location();
        tokens.push(Token::new(TokenType::Eof, "", eof_loc));

        Ok(tokens)
    }

    /// Text mode: accumulate content until markup, then dispatch on the opener.
    fn tokenize_text(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let start = self.pos;
        let start_loc = self.location();

        while self.pos < self.source.len()
            && self.source[self.pos] != b'<'
            && !self.looking_at(Self::EXPR_OPEN)
            && !self.looking_at(Self::STMT_OPEN)
        {
            self.advance_one();
        }
        self.flush_text(tokens, start, start_loc);

        if self.pos >= self.source.len() {
            return Ok(());
        }

        if self.looking_at(Self::COMMENT_OPEN) {
            return self.tokenize_comment(tokens);
        }
        if self.looking_at(Self::EXPR_OPEN) {
            return self.tokenize_expression(tokens);
        }
        if self.looking_at(Self::STMT_OPEN) {
            return self.tokenize_statement(tokens);
        }

        let loc = self.location();
        if self.looking_at(b"</") {
            self.advance_n(2);
            tokens.push(Token::new(TokenType::EndTagOpen, "</", loc));
        } else {
            self.advance_one();
            tokens.push(Token::new(TokenType::TagOpen, "<", loc));
        }
        self.mode = Mode::Tag;
        self.expect_value = false;
        Ok(())
    }

    /// Emit a text token for `start..pos`. Whitespace-only runs are grammar
    /// extras and produce no token.
    fn flush_text(&mut self, tokens: &mut Vec<Token>, start: usize, start_loc: Location) {
        if self.pos == start {
            return;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or_default();
        if text.trim().is_empty() {
            return;
        }
        tokens.push(Token::new(TokenType::Text, text, start_loc));
    }

    fn tokenize_comment(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let loc = self.location();
        self.advance_n(Self::COMMENT_OPEN.len());
        let (body, closed) = self.scan_until(Self::COMMENT_CLOSE);
        if !closed {
            return Err(ParseError::UnclosedComment {
                line: loc.line,
                column: loc.column,
            });
        }
        self.advance_n(Self::COMMENT_CLOSE.len());
        tokens.push(Token::new(TokenType::Comment, body, loc));
        Ok(())
    }

    fn tokenize_expression(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let loc = self.location();
        self.advance_n(Self::EXPR_OPEN.len());
        tokens.push(Token::new(TokenType::ExprOpen, "{{", loc));

        let content_loc = self.location();
        let (content, closed) = self.scan_until(Self::EXPR_CLOSE);
        tokens.push(Token::new(TokenType::RawContent, content, content_loc));

        if closed {
            let close_loc = self.location();
            self.advance_n(Self::EXPR_CLOSE.len());
            tokens.push(Token::new(TokenType::ExprClose, "}}", close_loc));
        }
        Ok(())
    }

    /// Tokenize a `{% ... %}` statement. The keyword decides how the rest of
    /// the statement is lexed: `if` / `elif` (and unknown keywords) take a raw
    /// condition scanned to `%}`; the remaining keywords take identifiers and
    /// string literals.
    fn tokenize_statement(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let loc = self.location();
        self.advance_n(Self::STMT_OPEN.len());
        tokens.push(Token::new(TokenType::StmtOpen, "{%", loc));
        self.skip_whitespace();

        let kw_loc = self.location();
        let word = self.scan_word();
        if word.is_empty() {
            return Err(ParseError::SyntaxError {
                message: "expected statement keyword".to_string(),
                line: kw_loc.line,
                column: kw_loc.column,
            });
        }
        let token_type = match word.as_str() {
            "if" => TokenType::KwIf,
            "elif" => TokenType::KwElif,
            "else" => TokenType::KwElse,
            "endif" => TokenType::KwEndif,
            "block" => TokenType::KwBlock,
            "endblock" => TokenType::KwEndblock,
            "include" => TokenType::KwInclude,
            "extends" => TokenType::KwExtends,
            _ => TokenType::Ident,
        };
        let takes_raw_content = matches!(
            token_type,
            TokenType::KwIf | TokenType::KwElif | TokenType::Ident
        );
        tokens.push(Token::new(token_type, word, kw_loc));

        if takes_raw_content {
            let content_loc = self.location();
            let (content, closed) = self.scan_until(Self::STMT_CLOSE);
            tokens.push(Token::new(TokenType::RawContent, content, content_loc));
            if closed {
                let close_loc = self.location();
                self.advance_n(Self::STMT_CLOSE.len());
                tokens.push(Token::new(TokenType::StmtClose, "%}", close_loc));
            }
            return Ok(());
        }

        loop {
            self.skip_whitespace();
            if self.pos >= self.source.len() {
                // The parser reports the unclosed statement at EOF.
                return Ok(());
            }
            if self.looking_at(Self::STMT_CLOSE) {
                let close_loc = self.location();
                self.advance_n(Self::STMT_CLOSE.len());
                tokens.push(Token::new(TokenType::StmtClose, "%}", close_loc));
                return Ok(());
            }

            let item_loc = self.location();
            match self.source[self.pos] {
                b'"' => {
                    let value = self.scan_quoted(b'"', item_loc)?;
                    tokens.push(Token::new(TokenType::Str, value, item_loc));
                }
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' => {
                    let ident = self.scan_word();
                    tokens.push(Token::new(TokenType::Ident, ident, item_loc));
                }
                other => {
                    return Err(ParseError::SyntaxError {
                        message: format!("unexpected character '{}' in statement", other as char),
                        line: item_loc.line,
                        column: item_loc.column,
                    });
                }
            }
        }
    }

    /// Tag mode: one token per call. Whitespace between tokens is a grammar
    /// extra and is skipped.
    fn tokenize_tag(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.pos >= self.source.len() {
            // The parser reports the unterminated tag at EOF.
            return Ok(());
        }

        let loc = self.location();

        if self.expect_value {
            self.expect_value = false;
            return self.tokenize_attribute_value(tokens, loc);
        }

        if self.looking_at(b"/>") {
            self.advance_n(2);
            tokens.push(Token::new(TokenType::SelfClose, "/>", loc));
            self.mode = Mode::Text;
            return Ok(());
        }
        if self.looking_at(Self::STMT_OPEN) {
            return self.tokenize_statement(tokens);
        }

        match self.source[self.pos] {
            b'>' => {
                self.advance_one();
                tokens.push(Token::new(TokenType::TagClose, ">", loc));
                self.mode = Mode::Text;
            }
            b'=' => {
                self.advance_one();
                tokens.push(Token::new(TokenType::Equal, "=", loc));
                self.expect_value = true;
            }
            b'"' | b'\'' | b'/' | b'<' => {
                return Err(ParseError::SyntaxError {
                    message: format!(
                        "unexpected character '{}' in tag",
                        self.source[self.pos] as char
                    ),
                    line: loc.line,
                    column: loc.column,
                });
            }
            _ => {
                let word = self.scan_attr_name();
                if word.is_empty() {
                    return Err(ParseError::SyntaxError {
                        message: "expected attribute name".to_string(),
                        line: loc.line,
                        column: loc.column,
                    });
                }
                tokens.push(Token::new(TokenType::Word, word, loc));
            }
        }
        Ok(())
    }

    fn tokenize_attribute_value(
        &mut self,
        tokens: &mut Vec<Token>,
        loc: Location,
    ) -> Result<(), ParseError> {
        match self.source[self.pos] {
            quote @ (b'"' | b'\'') => {
                let value = self.scan_quoted(quote, loc)?;
                tokens.push(Token::new(TokenType::QuotedValue, value, loc));
            }
            _ => {
                let start = self.pos;
                while self.pos < self.source.len() && !is_value_terminator(self.source[self.pos]) {
                    self.advance_one();
                }
                if self.pos == start {
                    return Err(ParseError::SyntaxError {
                        message: "expected attribute value".to_string(),
                        line: loc.line,
                        column: loc.column,
                    });
                }
                let value = std::str::from_utf8(&self.source[start..self.pos])
                    .unwrap_or_default()
                    .to_string();
                tokens.push(Token::new(TokenType::UnquotedValue, value, loc));
            }
        }
        Ok(())
    }

    /// Scan forward to (but not past) `closer`. Returns the scanned content
    /// and whether the closer was found before end of input.
    fn scan_until(&mut self, closer: &[u8]) -> (String, bool) {
        let start = self.pos;
        while self.pos < self.source.len() && !self.looking_at(closer) {
            self.advance_one();
        }
        let content = std::str::from_utf8(&self.source[start..self.pos])
            .unwrap_or_default()
            .to_string();
        (content, self.looking_at(closer))
    }

    /// Scan a `\w+` run.
    fn scan_word(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.source.len() && is_word_byte(self.source[self.pos]) {
            self.advance_one();
        }
        std::str::from_utf8(&self.source[start..self.pos])
            .unwrap_or_default()
            .to_string()
    }

    /// Scan an attribute or tag name: any run free of `<>"'/=` and whitespace.
    fn scan_attr_name(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.source.len() && !is_name_terminator(self.source[self.pos]) {
            self.advance_one();
        }
        std::str::from_utf8(&self.source[start..self.pos])
            .unwrap_or_default()
            .to_string()
    }

    /// Scan a quoted run. Assumes the current byte is the opening quote.
    fn scan_quoted(&mut self, quote: u8, open_loc: Location) -> Result<String, ParseError> {
        self.advance_one();
        let start = self.pos;
        while self.pos < self.source.len() && self.source[self.pos] != quote {
            self.advance_one();
        }
        if self.pos >= self.source.len() {
            return Err(ParseError::SyntaxError {
                message: "unterminated quoted value".to_string(),
                line: open_loc.line,
                column: open_loc.column,
            });
        }
        let value = std::str::from_utf8(&self.source[start..self.pos])
            .unwrap_or_default()
            .to_string();
        self.advance_one();
        Ok(value)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.source.len() {
            match self.source[self.pos] {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance_one(),
                _ => break,
            }
        }
    }

    /// Check if the source at current position starts with the given bytes.
    fn looking_at(&self, pattern: &[u8]) -> bool {
        self.source[self.pos..].starts_with(pattern)
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.col, self.pos)
    }

    /// Advance position by one byte, updating line/column tracking.
    fn advance_one(&mut self) {
        if self.pos < self.source.len() {
            if self.source[self.pos] == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    /// Advance position by n bytes, updating line/column tracking.
    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance_one();
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
}

fn is_name_terminator(b: u8) -> bool {
    matches!(
        b,
        b'<' | b'>' | b'"' | b'\'' | b'/' | b'=' | b' ' | b'\t' | b'\r' | b'\n'
    )
}

fn is_value_terminator(b: u8) -> bool {
    matches!(
        b,
        b'<' | b'>' | b'"' | b'\'' | b'=' | b' ' | b'\t' | b'\r' | b'\n'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn plain_text() {
        let tokens = tokenize("Hello, World!").unwrap();
        assert_eq!(types(&tokens), vec![TokenType::Text, TokenType::Eof]);
        assert_eq!(tokens[0].value, "Hello, World!");
    }

    #[test]
    fn whitespace_only_text_is_skipped() {
        let tokens = tokenize("  \n\t ").unwrap();
        assert_eq!(types(&tokens), vec![TokenType::Eof]);
    }

    #[test]
    fn start_and_end_tag() {
        let tokens = tokenize("<div></div>").unwrap();
        assert_eq!(
            types(&tokens),
            vec![
                TokenType::TagOpen,
                TokenType::Word,
                TokenType::TagClose,
                TokenType::EndTagOpen,
                TokenType::Word,
                TokenType::TagClose,
                TokenType::Eof,
            ]
        );
        assert_eq!(tokens[1].value, "div");
    }

    #[test]
    fn self_closing_tag_with_attributes() {
        let tokens = tokenize("<input type=text disabled/>").unwrap();
        assert_eq!(
            types(&tokens),
            vec![
                TokenType::TagOpen,
                TokenType::Word,
                TokenType::Word,
                TokenType::Equal,
                TokenType::UnquotedValue,
                TokenType::Word,
                TokenType::SelfClose,
                TokenType::Eof,
            ]
        );
        assert_eq!(tokens[4].value, "text");
    }

    #[test]
    fn quoted_attribute_values() {
        let tokens = tokenize(r#"<a href="x" title='y'>"#).unwrap();
        let quoted: Vec<&str> = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::QuotedValue)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(quoted, vec!["x", "y"]);
    }

    #[test]
    fn expression_content_is_raw() {
        let tokens = tokenize("{{ user.name }}").unwrap();
        assert_eq!(
            types(&tokens),
            vec![
                TokenType::ExprOpen,
                TokenType::RawContent,
                TokenType::ExprClose,
                TokenType::Eof,
            ]
        );
        assert_eq!(tokens[1].value, " user.name ");
    }

    #[test]
    fn unclosed_expression_has_no_close_token() {
        let tokens = tokenize("{{ name").unwrap();
        assert_eq!(
            types(&tokens),
            vec![TokenType::ExprOpen, TokenType::RawContent, TokenType::Eof]
        );
    }

    #[test]
    fn if_condition_is_raw() {
        let tokens = tokenize("{% if user.is_admin %}").unwrap();
        assert_eq!(
            types(&tokens),
            vec![
                TokenType::StmtOpen,
                TokenType::KwIf,
                TokenType::RawContent,
                TokenType::StmtClose,
                TokenType::Eof,
            ]
        );
        assert_eq!(tokens[2].value, " user.is_admin ");
    }

    #[test]
    fn block_statement_tokens() {
        let tokens = tokenize("{% block body %}{% endblock %}").unwrap();
        assert_eq!(
            types(&tokens),
            vec![
                TokenType::StmtOpen,
                TokenType::KwBlock,
                TokenType::Ident,
                TokenType::StmtClose,
                TokenType::StmtOpen,
                TokenType::KwEndblock,
                TokenType::StmtClose,
                TokenType::Eof,
            ]
        );
        assert_eq!(tokens[2].value, "body");
    }

    #[test]
    fn include_path_string() {
        let tokens = tokenize(r#"{% include "partials/nav.html" %}"#).unwrap();
        let path = tokens
            .iter()
            .find(|t| t.token_type == TokenType::Str)
            .unwrap();
        assert_eq!(path.value, "partials/nav.html");
    }

    #[test]
    fn unknown_statement_keyword_becomes_ident() {
        let tokens = tokenize("{% for x in items %}").unwrap();
        assert_eq!(tokens[1].token_type, TokenType::Ident);
        assert_eq!(tokens[1].value, "for");
        assert_eq!(tokens[2].token_type, TokenType::RawContent);
    }

    #[test]
    fn comment_body() {
        let tokens = tokenize("<!-- a - b -- c -->").unwrap();
        assert_eq!(types(&tokens), vec![TokenType::Comment, TokenType::Eof]);
        assert_eq!(tokens[0].value, " a - b -- c ");
    }

    #[test]
    fn unclosed_comment_is_an_error() {
        let result = tokenize("<!-- never closed");
        assert!(matches!(result, Err(ParseError::UnclosedComment { .. })));
    }

    #[test]
    fn statement_inside_tag() {
        let tokens = tokenize(r#"<div {% if x %}class="a"{% endif %}>"#).unwrap();
        assert!(types(&tokens).contains(&TokenType::KwIf));
        assert!(types(&tokens).contains(&TokenType::KwEndif));
        assert!(types(&tokens).contains(&TokenType::QuotedValue));
    }

    #[test]
    fn locations_are_tracked() {
        let tokens = tokenize("ab\n{{ x }}").unwrap();
        let open = tokens
            .iter()
            .find(|t| t.token_type == TokenType::ExprOpen)
            .unwrap();
        assert_eq!(open.location.line, 2);
        assert_eq!(open.location.column, 1);
        assert_eq!(open.location.byte_offset, 3);
    }
}
