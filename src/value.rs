use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

/// Display form of the empty sentinel in distinct-value listings.
pub const EMPTY_DISPLAY: &str = "(empty)";

/// Raw cell produced by a column accessor.
#[derive(Debug, Clone)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn from_json(v: Option<&Value>) -> Self {
        match v {
            None | Some(Value::Null) => CellValue::Null,
            Some(Value::Bool(b)) => CellValue::Bool(*b),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Null),
            },
            Some(Value::String(s)) => CellValue::Text(s.clone()),
            Some(other) => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Int(_) | CellValue::Float(_) => 2,
            CellValue::Text(_) => 3,
        }
    }

    /// Typed ordering: values of different kinds order by kind (null, bool,
    /// number, text); numbers compare numerically across int/float, text
    /// compares case-sensitively. Returns `Equal` only for equal cells: a
    /// numeric tie between an int and a float puts the int first.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => Self::canonical(*a).total_cmp(&Self::canonical(*b)),
            (Int(a), Float(b)) => (*a as f64)
                .total_cmp(&Self::canonical(*b))
                .then(Ordering::Less),
            (Float(a), Int(b)) => Self::canonical(*a)
                .total_cmp(&(*b as f64))
                .then(Ordering::Greater),
            (Text(a), Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn canonical(f: f64) -> f64 {
        f64::from_bits(Self::float_bits(f))
    }

    fn float_bits(f: f64) -> u64 {
        // -0.0 == 0.0 and every NaN collapses to one key
        if f == 0.0 {
            0
        } else if f.is_nan() {
            f64::NAN.to_bits()
        } else {
            f.to_bits()
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        use CellValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => Self::float_bits(*a) == Self::float_bits(*b),
            (Text(a), Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            CellValue::Null => {}
            CellValue::Bool(b) => b.hash(state),
            CellValue::Int(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            CellValue::Float(f) => {
                1u8.hash(state);
                Self::float_bits(*f).hash(state);
            }
            CellValue::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&String> for CellValue {
    fn from(s: &String) -> Self {
        CellValue::Text(s.clone())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<u32> for CellValue {
    fn from(i: u32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(x: f64) -> Self {
        CellValue::Float(x)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

impl From<NormalizedValue> for CellValue {
    fn from(v: NormalizedValue) -> Self {
        match v {
            NormalizedValue::Empty => CellValue::Null,
            NormalizedValue::Value(c) => c,
        }
    }
}

impl From<&NormalizedValue> for CellValue {
    fn from(v: &NormalizedValue) -> Self {
        v.clone().into()
    }
}

/// Index/filter key. Null, missing and whitespace-only cells all map to
/// `Empty`; `Value` never holds a blank cell (see `index::normalizer`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedValue {
    Empty,
    Value(CellValue),
}

impl NormalizedValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizedValue::Empty)
    }

    pub fn display(&self) -> String {
        self.to_string()
    }

    /// Empty first, then typed order of the inner value.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NormalizedValue::Empty, NormalizedValue::Empty) => Ordering::Equal,
            (NormalizedValue::Empty, _) => Ordering::Less,
            (_, NormalizedValue::Empty) => Ordering::Greater,
            (NormalizedValue::Value(a), NormalizedValue::Value(b)) => a.natural_cmp(b),
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Empty => f.write_str(EMPTY_DISPLAY),
            NormalizedValue::Value(v) => v.fmt(f),
        }
    }
}
