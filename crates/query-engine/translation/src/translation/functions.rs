//! The functions HogQL exposes, and what they are called in ClickHouse.

use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Information about a single function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionInfo {
    pub clickhouse_name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions.
    pub max_args: Option<usize>,
    pub aggregate: bool,
    /// How many leading arguments are parameters of a parametric aggregate, printed as
    /// `name(params)(args)`.
    pub parameters: usize,
}

impl FunctionInfo {
    const fn scalar(clickhouse_name: &'static str, min_args: usize, max_args: usize) -> Self {
        FunctionInfo {
            clickhouse_name,
            min_args,
            max_args: Some(max_args),
            aggregate: false,
            parameters: 0,
        }
    }

    const fn variadic(clickhouse_name: &'static str, min_args: usize) -> Self {
        FunctionInfo {
            clickhouse_name,
            min_args,
            max_args: None,
            aggregate: false,
            parameters: 0,
        }
    }

    const fn aggregate(clickhouse_name: &'static str, min_args: usize, max_args: usize) -> Self {
        FunctionInfo {
            clickhouse_name,
            min_args,
            max_args: Some(max_args),
            aggregate: true,
            parameters: 0,
        }
    }

    /// Whether `count` arguments are accepted.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && !self.max_args.is_some_and(|max| count > max)
    }

    /// The accepted argument counts, for error messages.
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {max}", self.min_args),
            None => format!("at least {}", self.min_args),
        }
    }
}

const FUNCTIONS: &[(&str, FunctionInfo)] = &[
    // aggregations
    ("count", FunctionInfo::aggregate("count", 0, 1)),
    ("countIf", FunctionInfo::aggregate("countIf", 1, 2)),
    ("min", FunctionInfo::aggregate("min", 1, 1)),
    ("minIf", FunctionInfo::aggregate("minIf", 2, 2)),
    ("max", FunctionInfo::aggregate("max", 1, 1)),
    ("maxIf", FunctionInfo::aggregate("maxIf", 2, 2)),
    ("sum", FunctionInfo::aggregate("sum", 1, 1)),
    ("sumIf", FunctionInfo::aggregate("sumIf", 2, 2)),
    ("avg", FunctionInfo::aggregate("avg", 1, 1)),
    ("avgIf", FunctionInfo::aggregate("avgIf", 2, 2)),
    ("any", FunctionInfo::aggregate("any", 1, 1)),
    ("anyIf", FunctionInfo::aggregate("anyIf", 2, 2)),
    (
        "uniq",
        FunctionInfo {
            max_args: None,
            ..FunctionInfo::aggregate("uniq", 1, 1)
        },
    ),
    (
        "uniqIf",
        FunctionInfo {
            max_args: None,
            ..FunctionInfo::aggregate("uniqIf", 2, 2)
        },
    ),
    ("argMax", FunctionInfo::aggregate("argMax", 2, 2)),
    ("argMin", FunctionInfo::aggregate("argMin", 2, 2)),
    ("groupArray", FunctionInfo::aggregate("groupArray", 1, 1)),
    ("median", FunctionInfo::aggregate("median", 1, 1)),
    (
        "quantile",
        FunctionInfo {
            parameters: 1,
            ..FunctionInfo::aggregate("quantile", 2, 2)
        },
    ),
    // type conversions
    ("toInt", FunctionInfo::scalar("toInt64OrNull", 1, 1)),
    ("toFloat", FunctionInfo::scalar("toFloat64OrNull", 1, 1)),
    ("toString", FunctionInfo::scalar("toString", 1, 1)),
    ("toDate", FunctionInfo::scalar("toDateOrNull", 1, 1)),
    (
        "toDateTime",
        FunctionInfo::scalar("parseDateTimeBestEffortOrNull", 1, 2),
    ),
    ("toUUID", FunctionInfo::scalar("toUUIDOrNull", 1, 1)),
    // dates
    ("now", FunctionInfo::scalar("now", 0, 1)),
    ("today", FunctionInfo::scalar("today", 0, 0)),
    ("toYear", FunctionInfo::scalar("toYear", 1, 1)),
    ("toMonth", FunctionInfo::scalar("toMonth", 1, 1)),
    ("toDayOfWeek", FunctionInfo::scalar("toDayOfWeek", 1, 1)),
    ("toStartOfDay", FunctionInfo::scalar("toStartOfDay", 1, 2)),
    ("toStartOfWeek", FunctionInfo::scalar("toStartOfWeek", 1, 3)),
    ("toStartOfMonth", FunctionInfo::scalar("toStartOfMonth", 1, 2)),
    ("toStartOfHour", FunctionInfo::scalar("toStartOfHour", 1, 2)),
    ("dateDiff", FunctionInfo::scalar("dateDiff", 3, 4)),
    ("dateAdd", FunctionInfo::scalar("dateAdd", 3, 3)),
    ("dateSub", FunctionInfo::scalar("dateSub", 3, 3)),
    ("toUnixTimestamp", FunctionInfo::scalar("toUnixTimestamp", 1, 2)),
    // strings
    ("length", FunctionInfo::scalar("lengthUTF8", 1, 1)),
    ("empty", FunctionInfo::scalar("empty", 1, 1)),
    ("notEmpty", FunctionInfo::scalar("notEmpty", 1, 1)),
    ("lower", FunctionInfo::scalar("lower", 1, 1)),
    ("upper", FunctionInfo::scalar("upper", 1, 1)),
    ("concat", FunctionInfo::variadic("concat", 2)),
    ("substring", FunctionInfo::scalar("substringUTF8", 2, 3)),
    ("trim", FunctionInfo::scalar("trim", 1, 1)),
    ("replaceAll", FunctionInfo::scalar("replaceAll", 3, 3)),
    ("splitByChar", FunctionInfo::scalar("splitByChar", 2, 2)),
    ("match", FunctionInfo::scalar("match", 2, 2)),
    ("position", FunctionInfo::scalar("position", 2, 3)),
    // conditionals
    ("if", FunctionInfo::scalar("if", 3, 3)),
    ("multiIf", FunctionInfo::variadic("multiIf", 3)),
    ("coalesce", FunctionInfo::variadic("coalesce", 1)),
    ("ifNull", FunctionInfo::scalar("ifNull", 2, 2)),
    // math
    ("abs", FunctionInfo::scalar("abs", 1, 1)),
    ("round", FunctionInfo::scalar("round", 1, 2)),
    ("floor", FunctionInfo::scalar("floor", 1, 2)),
    ("ceil", FunctionInfo::scalar("ceil", 1, 2)),
    ("sqrt", FunctionInfo::scalar("sqrt", 1, 1)),
    // arrays
    ("has", FunctionInfo::scalar("has", 2, 2)),
    ("indexOf", FunctionInfo::scalar("indexOf", 2, 2)),
    ("arrayJoin", FunctionInfo::scalar("arrayJoin", 1, 1)),
];

fn functions() -> &'static BTreeMap<&'static str, FunctionInfo> {
    static TABLE: OnceLock<BTreeMap<&'static str, FunctionInfo>> = OnceLock::new();
    TABLE.get_or_init(|| FUNCTIONS.iter().copied().collect())
}

/// Look up a HogQL function by name. An exact match wins, otherwise the lookup ignores case.
pub fn lookup_function(name: &str) -> Option<&'static FunctionInfo> {
    let functions = functions();
    functions.get(name).or_else(|| {
        functions
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, info)| info)
    })
}
