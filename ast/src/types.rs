use std::fmt::Display;

/// Fixed integer widths, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    I8,
    I16,
    I32,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::I8 => 8,
            IntWidth::I16 => 16,
            IntWidth::I32 => 32,
        }
    }

    /// truncates `raw` into this width's two's-complement range
    pub fn wrap(self, raw: i64) -> i32 {
        match self {
            IntWidth::I8 => raw as i8 as i32,
            IntWidth::I16 => raw as i16 as i32,
            IntWidth::I32 => raw as i32,
        }
    }

    /// the wider of two widths
    pub fn greater(self, other: IntWidth) -> IntWidth {
        self.max(other)
    }
}

impl Display for IntWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.bits())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int(IntWidth),
    String,
    Bool,
    /// `arity` is the parameter count of the function expression, kept
    /// when partial application shortens `domain`
    Function {
        domain: Vec<Type>,
        image: Box<Type>,
        arity: usize,
    },
    /// parameter type that is not pinned down yet
    Any,
    /// placeholder bound to a name while its own definition is checked
    Recursive(String),
    /// domain marker of a zero-parameter function
    Void,
}

impl Type {
    pub fn function(domain: Vec<Type>, image: Type) -> Self {
        let arity = if domain == [Type::Void] { 0 } else { domain.len() };
        Self::partial(domain, image, arity)
    }

    /// function type left over after applying some of `arity` parameters
    pub fn partial(domain: Vec<Type>, image: Type, arity: usize) -> Self {
        Type::Function {
            domain,
            image: Box::new(image),
            arity,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int(_))
    }

    /// result type of an integer operator: the wider of both operands.
    /// `None` unless both sides are integer types.
    pub fn greater_domain(&self, other: &Type) -> Option<Type> {
        match (self, other) {
            (Type::Int(a), Type::Int(b)) => Some(Type::Int(a.greater(*b))),
            _ => None,
        }
    }

    /// whether a value of type `self` may flow into a slot of type `target`
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        match (self, target) {
            (_, Type::Any) | (Type::Any, _) => true,
            (Type::Recursive(_), Type::Function { .. }) => true,
            (Type::Int(from), Type::Int(to)) => from <= to,
            (a, b) => a == b,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int(width) => write!(f, "{}", width),
            Type::String => write!(f, "string"),
            Type::Bool => write!(f, "bool"),
            Type::Any => write!(f, "any"),
            Type::Recursive(_) => write!(f, "∞"),
            Type::Void => write!(f, "void"),
            Type::Function { domain, image, .. } if domain.len() == 1 => {
                write!(f, "{} => {}", domain[0], image)
            }
            Type::Function { domain, image, .. } => write!(
                f,
                "[{}] => {}",
                domain
                    .iter()
                    .map(|ty| ty.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                image
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IntWidth, Type};

    const WIDTHS: [IntWidth; 3] = [IntWidth::I8, IntWidth::I16, IntWidth::I32];

    #[test]
    fn greater_domain_is_commutative() {
        for a in WIDTHS {
            for b in WIDTHS {
                let (a, b) = (Type::Int(a), Type::Int(b));
                assert_eq!(a.greater_domain(&b), b.greater_domain(&a));
            }
        }
    }

    #[test]
    fn greater_domain_picks_wider() {
        let (i8, i16, i32) = (
            Type::Int(IntWidth::I8),
            Type::Int(IntWidth::I16),
            Type::Int(IntWidth::I32),
        );
        assert_eq!(i8.greater_domain(&i8), Some(i8.clone()));
        assert_eq!(i8.greater_domain(&i16), Some(i16.clone()));
        assert_eq!(i16.greater_domain(&i16), Some(i16.clone()));
        assert_eq!(i16.greater_domain(&i32), Some(i32.clone()));
        assert_eq!(i8.greater_domain(&Type::String), None);
    }

    #[test]
    fn wrap() {
        assert_eq!(IntWidth::I8.wrap(127), 127);
        assert_eq!(IntWidth::I8.wrap(128), -128);
        assert_eq!(IntWidth::I8.wrap(300), 44);
        assert_eq!(IntWidth::I16.wrap(-32769), 32767);
        assert_eq!(IntWidth::I32.wrap(1 << 31), i32::MIN);
    }

    #[test]
    fn assignable() {
        let i8 = Type::Int(IntWidth::I8);
        let i32 = Type::Int(IntWidth::I32);
        assert!(i8.is_assignable_to(&i32));
        assert!(!i32.is_assignable_to(&i8));
        assert!(Type::String.is_assignable_to(&Type::Any));
        assert!(Type::Any.is_assignable_to(&Type::Bool));
        assert!(!Type::Bool.is_assignable_to(&Type::String));
    }

    #[test]
    fn display() {
        let i32 = Type::Int(IntWidth::I32);
        assert_eq!(
            Type::function(vec![Type::Any], i32.clone()).to_string(),
            "any => i32"
        );
        assert_eq!(
            Type::function(vec![Type::Any, Type::String], i32).to_string(),
            "[any, string] => i32"
        );
        assert_eq!(
            Type::function(vec![Type::Void], Type::Bool).to_string(),
            "void => bool"
        );
        assert_eq!(Type::Recursive("f".to_string()).to_string(), "∞");
    }

    #[test]
    fn partial_keeps_arity() {
        let whole = Type::function(vec![Type::Any, Type::Any], Type::Bool);
        let rest = Type::partial(vec![Type::Any], Type::Bool, 2);
        assert!(matches!(whole, Type::Function { arity: 2, .. }));
        assert!(matches!(rest, Type::Function { arity: 2, .. }));
        assert_eq!(rest.to_string(), "any => bool");
        assert!(matches!(
            Type::function(vec![Type::Void], Type::Bool),
            Type::Function { arity: 0, .. }
        ));
    }
}
