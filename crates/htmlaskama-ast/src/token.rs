//! Token types for the Htmlaskama lexer.

use crate::Location;

/// Token types produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Raw text run outside markup.
    Text,
    /// `<!-- ... -->` - value carries the comment body
    Comment,
    /// `<` - start tag opener
    TagOpen,
    /// `</` - end tag opener
    EndTagOpen,
    /// `>` - tag close
    TagClose,
    /// `/>` - self-closing tag close
    SelfClose,
    /// `=` - attribute assignment
    Equal,
    /// Tag or attribute name inside a tag
    Word,
    /// Unquoted attribute value
    UnquotedValue,
    /// `'value'` or `"value"` - value carries the interior
    QuotedValue,
    /// `{{` - expression opener
    ExprOpen,
    /// `}}` - expression close
    ExprClose,
    /// `{%` - statement opener
    StmtOpen,
    /// `%}` - statement close
    StmtClose,
    /// Raw run scanned to a closing sequence (expression or condition body)
    RawContent,
    /// `if`
    KwIf,
    /// `elif`
    KwElif,
    /// `else`
    KwElse,
    /// `endif`
    KwEndif,
    /// `block`
    KwBlock,
    /// `endblock`
    KwEndblock,
    /// `include`
    KwInclude,
    /// `extends`
    KwExtends,
    /// Identifier inside a statement (block name, unknown keyword)
    Ident,
    /// `"path"` string literal - value carries the interior
    Str,
    /// End of file
    Eof,
}

/// A token with its type, value, and location.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub location: Location,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, location: Location) -> Self {
        Self {
            token_type,
            value: value.into(),
            location,
        }
    }
}
