//! Error types for the htmlaskama crate.

use thiserror::Error;

// Re-export Location from htmlaskama-ast
pub use htmlaskama_ast::Location;

/// All errors that can occur in htmlaskama.
#[derive(Error, Debug)]
pub enum HtmlaskamaError {
    #[error("parse error: {0}")]
    Parse(#[from] htmlaskama_ast::ParseError),

    #[error("duplicate block '{name}' at line {}, column {}", location.line, location.column)]
    DuplicateBlock { name: String, location: Location },

    #[error("'extends' must be the first node in a template (line {}, column {})", location.line, location.column)]
    MisplacedExtends { location: Location },

    #[error("template extends more than one parent (line {}, column {})", location.line, location.column)]
    MultipleExtends { location: Location },

    #[error("invalid template path '{path}': {message}")]
    InvalidTemplatePath { path: String, message: String },

    #[error("template error: {message}")]
    TemplateError { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for htmlaskama operations.
pub type Result<T> = std::result::Result<T, HtmlaskamaError>;
