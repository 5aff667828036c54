//! The closed set of operator tokens attached to binary/unary AST nodes
//! (spec.md section 3, Token kinds). This is a pure enum — no lexing here;
//! the tokenizer that produces these is a named collaborator out of scope
//! (spec.md section 1, Non-goals).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Equals,
    PlusEquals,
    MinusEquals,
    MultiplyEquals,
    DivideEquals,
    RemainderEquals,

    And,
    Or,
    Xor,
    Is,
    IsNot,
    As,
    DotDot,

    Plus,
    Minus,
    Multiply,
    Divide,
    Rem,
    Format,
    Shl,
    Shr,
    Band,
    Bor,
    Bxor,
    Join,
    Split,
    SplitCaseSensitive,

    Ieq,
    Ine,
    Ige,
    Igt,
    Ile,
    Ilt,
    Ceq,
    Cne,
    Cge,
    Cgt,
    Cle,
    Clt,

    Ilike,
    Inotlike,
    Imatch,
    Inotmatch,
    Ireplace,
    Icontains,
    Inotcontains,
    Iin,
    Inotin,
    Clike,
    Cnotlike,
    Cmatch,
    Cnotmatch,
    Creplace,
    Ccontains,
    Cnotcontains,
    Cin,
    Cnotin,

    Not,
    Exclaim,
    Bnot,
    PlusPlusPrefix,
    PlusPlusPostfix,
    MinusMinusPrefix,
    MinusMinusPostfix,
    Dot,
    Ampersand,
}

impl TokenKind {
    /// True for the `i`-prefixed *and* the unprefixed (case-insensitive by
    /// default) comparison/matching operators, as opposed to the `c`-prefixed
    /// case-sensitive family.
    pub fn is_ignore_case(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Ieq | Ine
                | Ige
                | Igt
                | Ile
                | Ilt
                | Ilike
                | Inotlike
                | Imatch
                | Inotmatch
                | Ireplace
                | Icontains
                | Inotcontains
                | Iin
                | Inotin
                | Split
        )
    }

    pub fn is_case_sensitive(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Ceq | Cne
                | Cge
                | Cgt
                | Cle
                | Clt
                | Clike
                | Cnotlike
                | Cmatch
                | Cnotmatch
                | Creplace
                | Ccontains
                | Cnotcontains
                | Cin
                | Cnotin
                | SplitCaseSensitive
        )
    }

    pub fn is_comparison(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Ieq | Ine | Ige | Igt | Ile | Ilt | Ceq | Cne | Cge | Cgt | Cle | Clt
        )
    }

    pub fn is_compound_assignment(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            PlusEquals | MinusEquals | MultiplyEquals | DivideEquals | RemainderEquals
        )
    }

    /// The plain arithmetic operator a compound assignment desugars to
    /// (`x += y` => `x = x + y`, spec.md section 4.6.1).
    pub fn underlying_arithmetic(self) -> Option<TokenKind> {
        use TokenKind::*;
        match self {
            PlusEquals => Some(Plus),
            MinusEquals => Some(Minus),
            MultiplyEquals => Some(Multiply),
            DivideEquals => Some(Divide),
            RemainderEquals => Some(Rem),
            _ => None,
        }
    }

    pub fn is_like(self) -> bool {
        matches!(
            self,
            TokenKind::Ilike | TokenKind::Inotlike | TokenKind::Clike | TokenKind::Cnotlike
        )
    }

    pub fn is_match(self) -> bool {
        matches!(
            self,
            TokenKind::Imatch | TokenKind::Inotmatch | TokenKind::Cmatch | TokenKind::Cnotmatch
        )
    }

    pub fn negates(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Inotlike | Inotmatch | Inotcontains | Inotin | Cnotlike | Cnotmatch | Cnotcontains | Cnotin
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_case_family_excludes_case_sensitive() {
        assert!(TokenKind::Ieq.is_ignore_case());
        assert!(!TokenKind::Ceq.is_ignore_case());
        assert!(TokenKind::Ceq.is_case_sensitive());
    }

    #[test]
    fn compound_assignment_desugars_to_plain_operator() {
        assert_eq!(TokenKind::PlusEquals.underlying_arithmetic(), Some(TokenKind::Plus));
        assert_eq!(TokenKind::Equals.underlying_arithmetic(), None);
    }

    #[test]
    fn notlike_negates() {
        assert!(TokenKind::Inotlike.negates());
        assert!(!TokenKind::Ilike.negates());
    }
}
