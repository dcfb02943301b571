use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Clause {
    /// PostgREST operand form, e.g. `eq.PENDING`
    pub fn operand(&self) -> String {
        format!("{}.{}", self.op.as_str(), self.value)
    }

    /// Evaluate the clause against a flat JSON record.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(actual) = record.get(&self.field).map(scalar_text) else {
            return false;
        };

        let ordering = compare(&actual, &self.value);
        match self.op {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// Conjunction of equality/range clauses over one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, field: &str, value: impl fmt::Display) -> Self {
        self.with(field, FilterOp::Eq, value)
    }

    pub fn gte(self, field: &str, value: impl fmt::Display) -> Self {
        self.with(field, FilterOp::Gte, value)
    }

    pub fn lte(self, field: &str, value: impl fmt::Display) -> Self {
        self.with(field, FilterOp::Lte, value)
    }

    fn with(mut self, field: &str, op: FilterOp, value: impl fmt::Display) -> Self {
        self.clauses.push(Clause {
            field: field.to_string(),
            op,
            value: value.to_string(),
        });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.clauses.iter().all(|c| c.matches(record))
    }

    /// Query pairs ready to hand to an HTTP client, which takes care of escaping.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.clauses
            .iter()
            .map(|c| (c.field.clone(), c.operand()))
            .collect()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", clause.field, clause.operand())?;
        }
        Ok(())
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

// Numbers compare numerically, everything else (ids, ISO dates, flags) as text.
fn compare(actual: &str, expected: &str) -> Ordering {
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => actual.cmp(expected),
    }
}
