//! Query clauses: term, match, bool, range, query_string

use super::shorthand::{deserialize_shorthand, one_or_many, opt_scalar_text, scalar_text, Shorthand};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A query object. Input may populate several variants at once; the compiler
/// only ever looks at the one [`Query::clause`] selects.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub term: Option<BTreeMap<String, TermValue>>,

    #[serde(default, rename = "match")]
    pub match_query: Option<BTreeMap<String, MatchValue>>,

    #[serde(default)]
    pub bool: Option<Box<BoolQuery>>,

    #[serde(default)]
    pub range: Option<BTreeMap<String, RangeParams>>,

    /// Decoded but never compiled
    #[serde(default)]
    pub query_string: Option<QueryString>,
}

/// The single variant of a [`Query`] that takes effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clause<'a> {
    Bool(&'a BoolQuery),
    Term(&'a BTreeMap<String, TermValue>),
    Match(&'a BTreeMap<String, MatchValue>),
    Range(&'a BTreeMap<String, RangeParams>),
    /// Nothing compilable was given
    MatchAll,
}

impl Query {
    /// Resolve the effective variant: bool, then term, then match, then range.
    pub fn clause(&self) -> Clause<'_> {
        if let Some(b) = &self.bool {
            Clause::Bool(b)
        } else if let Some(t) = &self.term {
            Clause::Term(t)
        } else if let Some(m) = &self.match_query {
            Clause::Match(m)
        } else if let Some(r) = &self.range {
            Clause::Range(r)
        } else {
            Clause::MatchAll
        }
    }
}

/// `term` field value: `"v"` or `{"value": "v", "boost": 1.0, "case_insensitive": true}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermValue {
    pub value: String,
    pub boost: Option<String>,
    pub case_insensitive: Option<bool>,
}

#[derive(Deserialize)]
struct VerboseTerm {
    #[serde(deserialize_with = "scalar_text")]
    value: String,
    #[serde(default, deserialize_with = "opt_scalar_text")]
    boost: Option<String>,
    #[serde(default)]
    case_insensitive: Option<bool>,
}

impl Shorthand for TermValue {
    const EXPECTING: &'static str = "a term value or a term object";

    fn from_scalar(text: String) -> Self {
        Self {
            value: text,
            ..Self::default()
        }
    }

    fn from_verbose<'de, A: MapAccess<'de>>(map: A) -> Result<Self, A::Error> {
        let v = VerboseTerm::deserialize(de::value::MapAccessDeserializer::new(map))?;
        Ok(Self {
            value: v.value,
            boost: v.boost,
            case_insensitive: v.case_insensitive,
        })
    }
}

impl<'de> Deserialize<'de> for TermValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_shorthand(deserializer)
    }
}

/// `match` field value: `"v"` or `{"query": "v", "fuzziness": "AUTO", "operator": "and"}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchValue {
    pub query: String,
    pub fuzziness: Option<String>,
    pub operator: Option<String>,
}

#[derive(Deserialize)]
struct VerboseMatch {
    #[serde(deserialize_with = "scalar_text")]
    query: String,
    #[serde(default, deserialize_with = "opt_scalar_text")]
    fuzziness: Option<String>,
    #[serde(default)]
    operator: Option<String>,
}

impl Shorthand for MatchValue {
    const EXPECTING: &'static str = "a match value or a match object";

    fn from_scalar(text: String) -> Self {
        Self {
            query: text,
            ..Self::default()
        }
    }

    fn from_verbose<'de, A: MapAccess<'de>>(map: A) -> Result<Self, A::Error> {
        let v = VerboseMatch::deserialize(de::value::MapAccessDeserializer::new(map))?;
        Ok(Self {
            query: v.query,
            fuzziness: v.fuzziness,
            operator: v.operator,
        })
    }
}

impl<'de> Deserialize<'de> for MatchValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_shorthand(deserializer)
    }
}

/// Boolean combination. Only `must` is compiled; `should` and `filter` are
/// kept so they survive decoding.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BoolQuery {
    #[serde(default, deserialize_with = "one_or_many")]
    pub must: Vec<Query>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub should: Vec<Query>,

    #[serde(default)]
    pub filter: Vec<Query>,
}

/// A numeric range bound, kept as its numeral text.
///
/// Accepts a JSON number or a string holding a JSON number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    numeral: String,
    quoted: bool,
}

impl Bound {
    /// A bound given as a string.
    pub fn new(numeral: impl Into<String>) -> Option<Self> {
        Self::parse(numeral.into(), true)
    }

    fn parse(numeral: String, quoted: bool) -> Option<Self> {
        let numeral = numeral.trim();
        serde_json::from_str::<serde_json::Number>(numeral)
            .ok()
            .map(|_| Self {
                numeral: numeral.to_string(),
                quoted,
            })
    }

    fn from_integer(numeral: String) -> Self {
        Self {
            numeral,
            quoted: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.numeral
    }

    /// As a JSON number when the numeral is an integer or was given unquoted.
    ///
    /// A quoted non-integer such as `"1.5"` stays a string, so epoch formats
    /// reject it instead of truncating.
    pub fn to_value(&self) -> Value {
        if let Ok(i) = self.numeral.parse::<i64>() {
            return Value::from(i);
        }
        if self.quoted {
            return Value::String(self.numeral.clone());
        }
        serde_json::from_str::<serde_json::Number>(&self.numeral)
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(self.numeral.clone()))
    }
}

impl<'de> Deserialize<'de> for Bound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BoundVisitor;

        impl<'de> Visitor<'de> for BoundVisitor {
            type Value = Bound;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number or a numeral string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Bound, E> {
                Ok(Bound::from_integer(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Bound, E> {
                Ok(Bound::from_integer(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Bound, E> {
                Bound::parse(v.to_string(), false)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Float(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Bound, E> {
                Bound::new(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(BoundVisitor)
    }
}

/// Comparison operator of one side of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            RangeOp::Gt => ">",
            RangeOp::Gte => ">=",
            RangeOp::Lt => "<",
            RangeOp::Lte => "<=",
        }
    }
}

/// Bounds of a `range` field
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RangeParams {
    #[serde(default)]
    pub gt: Option<Bound>,
    #[serde(default)]
    pub gte: Option<Bound>,
    #[serde(default)]
    pub lt: Option<Bound>,
    #[serde(default)]
    pub lte: Option<Bound>,

    /// Legacy lower bound
    #[serde(default)]
    pub from: Option<Bound>,
    /// Legacy upper bound
    #[serde(default)]
    pub to: Option<Bound>,

    #[serde(default)]
    pub format: Option<String>,

    // Deprecated since 0.90 but still sent by some clients
    #[serde(default)]
    pub include_lower: Option<bool>,
    #[serde(default)]
    pub include_upper: Option<bool>,

    #[serde(default, deserialize_with = "opt_scalar_text")]
    pub boost: Option<String>,
}

impl RangeParams {
    /// Effective lower bound; `gte` is preferred over `gt`, then legacy `from`.
    pub fn lower(&self) -> Option<(RangeOp, &Bound)> {
        if let Some(b) = &self.gte {
            Some((RangeOp::Gte, b))
        } else if let Some(b) = &self.gt {
            Some((RangeOp::Gt, b))
        } else {
            self.from.as_ref().map(|b| match self.include_lower {
                Some(false) => (RangeOp::Gt, b),
                _ => (RangeOp::Gte, b),
            })
        }
    }

    /// Effective upper bound; `lte` is preferred over `lt`, then legacy `to`.
    pub fn upper(&self) -> Option<(RangeOp, &Bound)> {
        if let Some(b) = &self.lte {
            Some((RangeOp::Lte, b))
        } else if let Some(b) = &self.lt {
            Some((RangeOp::Lt, b))
        } else {
            self.to.as_ref().map(|b| match self.include_upper {
                Some(false) => (RangeOp::Lt, b),
                _ => (RangeOp::Lte, b),
            })
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryString {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub default_field: Option<String>,
}
