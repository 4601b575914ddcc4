// ── Attribute values ──────────────────────────────────────────────────────────

/// A single plan or state attribute as the host hands it over.
///
/// `Null` means the practitioner left the attribute unset. `Unknown` means
/// the attribute depends on another resource's output and the host has not
/// resolved it yet. The two must be treated differently: defaults apply to
/// `Null`, while `Unknown` usually means the operation has to wait for the
/// dependency to apply first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<T> {
    Null,
    Unknown,
    Value(T),
}

pub type ValueString = Value<String>;
pub type ValueInt = Value<i64>;
pub type ValueBool = Value<bool>;

impl<T> Value<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Value::Value(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Value::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Value::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The contained value, or `default` for both `Null` and `Unknown`.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Value::Value(v) => v,
            _ => default,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Value::Value(v) => Value::Value(f(v)),
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
        }
    }
}

impl Value<String> {
    pub fn as_deref(&self) -> Option<&str> {
        self.as_option().map(String::as_str)
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Null
    }
}

impl<T> From<T> for Value<T> {
    fn from(v: T) -> Self {
        Value::Value(v)
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Value::Value(v),
            None => Value::Null,
        }
    }
}
