use std::fmt;

/// The scalar categories a literal, parameter or variable can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Int,
    Float,
    String,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::String => "string",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A folded compile-time value. The variant is the kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
}

impl Literal {
    pub fn kind(&self) -> Kind {
        match self {
            Literal::Int(_) => Kind::Int,
            Literal::Float(_) => Kind::Float,
            Literal::String(_) => Kind::String,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload with `\n`, `\t`, `\"`, `\\` and `\0` expanded.
    ///
    /// The scanner keeps string lexemes raw, so escapes are resolved by
    /// whoever consumes the literal. Unknown escapes are kept verbatim.
    pub fn unescaped(&self) -> Option<String> {
        let Literal::String(raw) = self else {
            return None;
        };

        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        }
        Some(out)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(n) => {
                // Always show at least one decimal place for floats
                if n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Literal::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_variant() {
        assert_eq!(Literal::Int(3).kind(), Kind::Int);
        assert_eq!(Literal::Float(0.5).kind(), Kind::Float);
        assert_eq!(Literal::String("a".into()).kind(), Kind::String);
    }

    #[test]
    fn floats_always_show_a_fraction() {
        assert_eq!(Literal::Float(2.0).to_string(), "2.0");
        assert_eq!(Literal::Float(12.5).to_string(), "12.5");
    }

    #[test]
    fn unescape_handles_common_sequences() {
        let lit = Literal::String(r#"a\tb\n\\ \q"#.to_string());
        assert_eq!(lit.unescaped().as_deref(), Some("a\tb\n\\ \\q"));
        assert_eq!(Literal::Int(1).unescaped(), None);
    }
}
