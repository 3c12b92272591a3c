use std::fmt;

/// Scalar type of a frame column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Column with every value missing.
    Bad,
    Numeric,
    /// Numeric codes indexing into the column's domain.
    Categorical,
    /// Milliseconds since the epoch.
    Time,
    Text,
    Uuid,
}

impl ColumnType {
    /// If values of this column are produced and stored as text.
    pub const fn is_text_like(&self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::Uuid)
    }

    pub const fn value_kind(&self) -> ValueKind {
        if self.is_text_like() {
            ValueKind::Text
        } else {
            ValueKind::Numeric
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Bad => write!(f, "bad"),
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::Categorical => write!(f, "categorical"),
            ColumnType::Time => write!(f, "time"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Uuid => write!(f, "uuid"),
        }
    }
}

/// How cell values of a column are represented in memory.
///
/// Every column type maps to exactly one kind, and the kind decides which
/// accessor is used to read the column during materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Numeric,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Numeric => write!(f, "numeric"),
            ValueKind::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_like_types() {
        assert_eq!(ValueKind::Text, ColumnType::Text.value_kind());
        assert_eq!(ValueKind::Text, ColumnType::Uuid.value_kind());

        assert_eq!(ValueKind::Numeric, ColumnType::Numeric.value_kind());
        assert_eq!(ValueKind::Numeric, ColumnType::Categorical.value_kind());
        assert_eq!(ValueKind::Numeric, ColumnType::Time.value_kind());
        assert_eq!(ValueKind::Numeric, ColumnType::Bad.value_kind());
    }
}
