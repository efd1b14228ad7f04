//! Token types of the HogQL lexer.

use enum_iterator::Sequence;

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub offset: usize,
    /// Line number (1-based) at the start of the token.
    pub line: u32,
    /// Column number (1-based) at the start of the token.
    pub column: u32,
}

/// Token discriminant.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Literals ===
    Integer(i64),
    Float(f64),
    /// Single-quoted string, with escapes already applied.
    String(String),

    // === Identifiers ===
    /// Unquoted identifier. May start with `$`.
    Identifier(String),
    /// Backtick- or double-quoted identifier.
    QuotedIdentifier(String),
    Keyword(Keyword),
    /// `{name}`
    Placeholder(String),

    // === Operators ===
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,   // `=`
    EqEq, // `==`
    Ne,   // `!=`
    LtGt, // `<>`
    Lt,
    Le,
    Gt,
    Ge,

    // === Punctuation ===
    Dot,
    Comma,
    Semicolon,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    // === Special ===
    Eof,
    /// A lexing failure, reported by the parser at this token's position.
    Error(String),
}

impl TokenKind {
    /// How the token is shown in error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Integer(i) => format!("number {i}"),
            TokenKind::Float(f) => format!("number {f}"),
            TokenKind::String(s) => format!("string '{s}'"),
            TokenKind::Identifier(s) | TokenKind::QuotedIdentifier(s) => {
                format!("identifier '{s}'")
            }
            TokenKind::Keyword(keyword) => format!("keyword {}", keyword.as_str()),
            TokenKind::Placeholder(name) => format!("placeholder {{{name}}}"),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Percent => "'%'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::EqEq => "'=='".to_string(),
            TokenKind::Ne => "'!='".to_string(),
            TokenKind::LtGt => "'<>'".to_string(),
            TokenKind::Lt => "'<'".to_string(),
            TokenKind::Le => "'<='".to_string(),
            TokenKind::Gt => "'>'".to_string(),
            TokenKind::Ge => "'>='".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::LeftParen => "'('".to_string(),
            TokenKind::RightParen => "')'".to_string(),
            TokenKind::LeftBracket => "'['".to_string(),
            TokenKind::RightBracket => "']'".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Error(message) => message.clone(),
        }
    }
}

/// Reserved words. Matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence)]
pub enum Keyword {
    And,
    As,
    Asc,
    By,
    Cross,
    Desc,
    Distinct,
    False,
    Full,
    From,
    Group,
    Having,
    ILike,
    In,
    Inner,
    Join,
    Left,
    Like,
    Limit,
    Not,
    Null,
    Offset,
    On,
    Or,
    Order,
    Outer,
    Prewhere,
    Right,
    Select,
    True,
    Where,
}

impl Keyword {
    pub fn from_identifier(identifier: &str) -> Option<Keyword> {
        let keyword = match identifier.to_ascii_uppercase().as_str() {
            "AND" => Keyword::And,
            "AS" => Keyword::As,
            "ASC" => Keyword::Asc,
            "BY" => Keyword::By,
            "CROSS" => Keyword::Cross,
            "DESC" => Keyword::Desc,
            "DISTINCT" => Keyword::Distinct,
            "FALSE" => Keyword::False,
            "FULL" => Keyword::Full,
            "FROM" => Keyword::From,
            "GROUP" => Keyword::Group,
            "HAVING" => Keyword::Having,
            "ILIKE" => Keyword::ILike,
            "IN" => Keyword::In,
            "INNER" => Keyword::Inner,
            "JOIN" => Keyword::Join,
            "LEFT" => Keyword::Left,
            "LIKE" => Keyword::Like,
            "LIMIT" => Keyword::Limit,
            "NOT" => Keyword::Not,
            "NULL" => Keyword::Null,
            "OFFSET" => Keyword::Offset,
            "ON" => Keyword::On,
            "OR" => Keyword::Or,
            "ORDER" => Keyword::Order,
            "OUTER" => Keyword::Outer,
            "PREWHERE" => Keyword::Prewhere,
            "RIGHT" => Keyword::Right,
            "SELECT" => Keyword::Select,
            "TRUE" => Keyword::True,
            "WHERE" => Keyword::Where,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::And => "AND",
            Keyword::As => "AS",
            Keyword::Asc => "ASC",
            Keyword::By => "BY",
            Keyword::Cross => "CROSS",
            Keyword::Desc => "DESC",
            Keyword::Distinct => "DISTINCT",
            Keyword::False => "FALSE",
            Keyword::Full => "FULL",
            Keyword::From => "FROM",
            Keyword::Group => "GROUP",
            Keyword::Having => "HAVING",
            Keyword::ILike => "ILIKE",
            Keyword::In => "IN",
            Keyword::Inner => "INNER",
            Keyword::Join => "JOIN",
            Keyword::Left => "LEFT",
            Keyword::Like => "LIKE",
            Keyword::Limit => "LIMIT",
            Keyword::Not => "NOT",
            Keyword::Null => "NULL",
            Keyword::Offset => "OFFSET",
            Keyword::On => "ON",
            Keyword::Or => "OR",
            Keyword::Order => "ORDER",
            Keyword::Outer => "OUTER",
            Keyword::Prewhere => "PREWHERE",
            Keyword::Right => "RIGHT",
            Keyword::Select => "SELECT",
            Keyword::True => "TRUE",
            Keyword::Where => "WHERE",
        }
    }
}
