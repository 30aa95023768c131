//! Function registry.
//!
//! A compile-time table of every built-in function with its arity, used by
//! the dispatcher to reject unknown names and bad argument counts before
//! any argument is evaluated. Ids are banded by category so diagnostics
//! and traces can group related functions.

use phf::phf_map;

#[derive(Debug, Clone, Copy)]
pub struct FunctionMetadata {
    pub id: u16,
    pub name: &'static str,
    pub min_args: u8,
    /// `None` means variadic.
    pub max_args: Option<u8>,
}

const fn meta(id: u16, name: &'static str, min_args: u8, max_args: u8) -> FunctionMetadata {
    FunctionMetadata {
        id,
        name,
        min_args,
        max_args: Some(max_args),
    }
}

/// Id bands: 10 existence, 30 filtering, 40 subsetting, 50 combining,
/// 100 string, 200 math, 300 conversion, 400 navigation, 500 utility,
/// 600 aggregate.
pub static FUNCTIONS: phf::Map<&'static str, FunctionMetadata> = phf_map! {
    // Existence
    "empty" => meta(10, "empty", 0, 0),
    "exists" => meta(11, "exists", 0, 1),
    "all" => meta(12, "all", 1, 1),
    "allTrue" => meta(13, "allTrue", 0, 0),
    "anyTrue" => meta(14, "anyTrue", 0, 0),
    "allFalse" => meta(15, "allFalse", 0, 0),
    "anyFalse" => meta(16, "anyFalse", 0, 0),
    "subsetOf" => meta(17, "subsetOf", 1, 1),
    "supersetOf" => meta(18, "supersetOf", 1, 1),
    "count" => meta(19, "count", 0, 0),
    "distinct" => meta(20, "distinct", 0, 0),
    "isDistinct" => meta(21, "isDistinct", 0, 0),

    // Filtering and projection
    "where" => meta(30, "where", 1, 1),
    "select" => meta(31, "select", 1, 1),
    "repeat" => meta(32, "repeat", 1, 1),
    "ofType" => meta(33, "ofType", 1, 1),

    // Subsetting
    "single" => meta(40, "single", 0, 0),
    "first" => meta(41, "first", 0, 0),
    "last" => meta(42, "last", 0, 0),
    "tail" => meta(43, "tail", 0, 0),
    "skip" => meta(44, "skip", 1, 1),
    "take" => meta(45, "take", 1, 1),
    "intersect" => meta(46, "intersect", 1, 1),
    "exclude" => meta(47, "exclude", 1, 1),

    // Combining
    "union" => meta(50, "union", 1, 1),
    "combine" => meta(51, "combine", 1, 1),

    // Strings
    "indexOf" => meta(100, "indexOf", 1, 1),
    "lastIndexOf" => meta(101, "lastIndexOf", 1, 1),
    "substring" => meta(102, "substring", 1, 2),
    "startsWith" => meta(103, "startsWith", 1, 1),
    "endsWith" => meta(104, "endsWith", 1, 1),
    "contains" => meta(105, "contains", 1, 1),
    "upper" => meta(106, "upper", 0, 0),
    "lower" => meta(107, "lower", 0, 0),
    "replace" => meta(108, "replace", 2, 2),
    "matches" => meta(109, "matches", 1, 1),
    "matchesFull" => meta(110, "matchesFull", 1, 1),
    "replaceMatches" => meta(111, "replaceMatches", 2, 2),
    "length" => meta(112, "length", 0, 0),
    "toChars" => meta(113, "toChars", 0, 0),
    "trim" => meta(114, "trim", 0, 0),
    "split" => meta(115, "split", 1, 1),
    "join" => meta(116, "join", 0, 1),
    "encode" => meta(117, "encode", 1, 1),
    "decode" => meta(118, "decode", 1, 1),
    "escape" => meta(119, "escape", 1, 1),
    "unescape" => meta(120, "unescape", 1, 1),

    // Math
    "abs" => meta(200, "abs", 0, 0),
    "ceiling" => meta(201, "ceiling", 0, 0),
    "exp" => meta(202, "exp", 0, 0),
    "floor" => meta(203, "floor", 0, 0),
    "ln" => meta(204, "ln", 0, 0),
    "log" => meta(205, "log", 1, 1),
    "power" => meta(206, "power", 1, 1),
    "round" => meta(207, "round", 0, 1),
    "sqrt" => meta(208, "sqrt", 0, 0),
    "truncate" => meta(209, "truncate", 0, 0),

    // Conversion
    "iif" => meta(300, "iif", 2, 3),
    "toBoolean" => meta(301, "toBoolean", 0, 0),
    "convertsToBoolean" => meta(302, "convertsToBoolean", 0, 0),
    "toInteger" => meta(303, "toInteger", 0, 0),
    "convertsToInteger" => meta(304, "convertsToInteger", 0, 0),
    "toDecimal" => meta(305, "toDecimal", 0, 0),
    "convertsToDecimal" => meta(306, "convertsToDecimal", 0, 0),
    "toString" => meta(307, "toString", 0, 0),
    "convertsToString" => meta(308, "convertsToString", 0, 0),
    "toDate" => meta(309, "toDate", 0, 0),
    "convertsToDate" => meta(310, "convertsToDate", 0, 0),
    "toDateTime" => meta(311, "toDateTime", 0, 0),
    "convertsToDateTime" => meta(312, "convertsToDateTime", 0, 0),
    "toTime" => meta(313, "toTime", 0, 0),
    "convertsToTime" => meta(314, "convertsToTime", 0, 0),
    "toQuantity" => meta(315, "toQuantity", 0, 1),
    "convertsToQuantity" => meta(316, "convertsToQuantity", 0, 1),
    "toLong" => meta(317, "toLong", 0, 0),
    "convertsToLong" => meta(318, "convertsToLong", 0, 0),

    // Tree navigation
    "children" => meta(400, "children", 0, 0),
    "descendants" => meta(401, "descendants", 0, 0),

    // Utility
    "trace" => meta(500, "trace", 1, 2),
    "now" => meta(501, "now", 0, 0),
    "today" => meta(502, "today", 0, 0),
    "timeOfDay" => meta(503, "timeOfDay", 0, 0),
    "type" => meta(504, "type", 0, 0),
    "is" => meta(505, "is", 1, 1),
    "as" => meta(506, "as", 1, 1),
    "not" => meta(507, "not", 0, 0),
    "hasValue" => meta(508, "hasValue", 0, 0),
    "extension" => meta(509, "extension", 1, 1),
    "getValue" => meta(510, "getValue", 0, 0),

    // Aggregates
    "aggregate" => meta(600, "aggregate", 1, 2),
};

pub fn lookup(name: &str) -> Option<&'static FunctionMetadata> {
    FUNCTIONS.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        assert_eq!(lookup("where").unwrap().min_args, 1);
        assert_eq!(lookup("substring").unwrap().max_args, Some(2));
        assert!(lookup("frobnicate").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for (_, meta) in FUNCTIONS.entries() {
            assert!(seen.insert(meta.id), "duplicate id {}", meta.id);
        }
    }
}
