//! Built-in functions and the dispatch table
//!
//! Every function is a plain `fn` registered with its arity bounds and the form
//! its arguments arrive in ([`ArgKind`]). The evaluator prepares arguments from
//! that metadata, so adding a function never touches the evaluator.

pub mod date;
pub mod info;
pub mod logical;
pub mod lookup;
pub mod math;
pub mod reference;
pub mod text;

use ahash::AHashMap;
use sheetcalc_core::ErrorCode;

use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// Function implementation signature
///
/// Functions can consult the evaluation context (date system, current cell,
/// reference resolution) to match Excel semantics.
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// The form arguments are handed to a function in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// References are dereferenced by implicit intersection
    Scalar,
    /// References are read into [`FormulaValue::Array`]s
    Array,
    /// References arrive untouched as [`FormulaValue::Reference`]
    Reference,
}

/// What happens when an argument is an error value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// The first error argument is the result; the function is not called
    Propagate,
    /// The function sees error arguments and decides itself
    Trap,
}

/// Function definition
#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    pub arg_kind: ArgKind,
    pub error_policy: ErrorPolicy,
    /// Is volatile (recalculates every time)
    pub volatile: bool,
    /// Function index in BIFF8 formula records
    pub biff_index: Option<u16>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// A scalar, error-propagating function
    pub fn new(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            arg_kind: ArgKind::Scalar,
            error_policy: ErrorPolicy::Propagate,
            volatile: false,
            biff_index: None,
            implementation,
        }
    }

    /// Receive areas as arrays
    pub fn array(mut self) -> Self {
        self.arg_kind = ArgKind::Array;
        self
    }

    /// Receive references unresolved
    pub fn reference(mut self) -> Self {
        self.arg_kind = ArgKind::Reference;
        self
    }

    /// See error arguments instead of propagating them
    pub fn traps_errors(mut self) -> Self {
        self.error_policy = ErrorPolicy::Trap;
        self
    }

    pub fn volatile(mut self) -> Self {
        self.volatile = true;
        self
    }

    pub fn biff(mut self, index: u16) -> Self {
        self.biff_index = Some(index);
        self
    }

    /// Whether `count` arguments are within the arity bounds
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }
}

/// Function registry
///
/// Builtins and add-in style extensions live in separate tables. Lookups are
/// case-insensitive and ignore the `_xlfn.` prefix newer files write in front
/// of post-2007 functions.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    builtins: AHashMap<String, FunctionDef>,
    extensions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_info_functions();
        registry.register_text_functions();
        registry.register_date_functions();
        registry.register_lookup_functions();
        registry.register_reference_functions();

        registry
    }

    /// A registry with no functions at all
    pub fn empty() -> Self {
        Self {
            builtins: AHashMap::new(),
            extensions: AHashMap::new(),
        }
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        let key = normalize(name);
        self.builtins
            .get(&key)
            .or_else(|| self.extensions.get(&key))
    }

    /// Look up a builtin by its BIFF8 function index
    pub fn get_by_index(&self, index: u16) -> Option<&FunctionDef> {
        self.builtins
            .values()
            .find(|def| def.biff_index == Some(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of functions in both tables
    pub fn len(&self) -> usize {
        self.builtins.len() + self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a builtin, replacing any builtin of the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.builtins.insert(normalize(def.name), def);
    }

    /// Register an add-in function
    ///
    /// Returns false, leaving the registry unchanged, when a builtin already
    /// has the name.
    pub fn register_extension(&mut self, def: FunctionDef) -> bool {
        let key = normalize(def.name);
        if self.builtins.contains_key(&key) {
            return false;
        }
        self.extensions.insert(key, def);
        true
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef::new("COUNT", 1, None, math::fn_count).array().traps_errors().biff(0));
        self.register(FunctionDef::new("SUM", 1, None, math::fn_sum).array().biff(4));
        self.register(FunctionDef::new("AVERAGE", 1, None, math::fn_average).array().biff(5));
        self.register(FunctionDef::new("MIN", 1, None, math::fn_min).array().biff(6));
        self.register(FunctionDef::new("MAX", 1, None, math::fn_max).array().biff(7));
        self.register(
            FunctionDef::new("COUNTA", 1, None, math::fn_counta)
                .array()
                .traps_errors()
                .biff(169),
        );
        self.register(
            FunctionDef::new("COUNTBLANK", 1, Some(1), math::fn_countblank)
                .reference()
                .biff(347),
        );
        self.register(FunctionDef::new("PRODUCT", 1, None, math::fn_product).array().biff(183));

        self.register(FunctionDef::new("PI", 0, Some(0), math::fn_pi).biff(19));
        self.register(FunctionDef::new("SQRT", 1, Some(1), math::fn_sqrt).biff(20));
        self.register(FunctionDef::new("EXP", 1, Some(1), math::fn_exp).biff(21));
        self.register(FunctionDef::new("LN", 1, Some(1), math::fn_ln).biff(22));
        self.register(FunctionDef::new("LOG10", 1, Some(1), math::fn_log10).biff(23));
        self.register(FunctionDef::new("ABS", 1, Some(1), math::fn_abs).biff(24));
        self.register(FunctionDef::new("INT", 1, Some(1), math::fn_int).biff(25));
        self.register(FunctionDef::new("SIGN", 1, Some(1), math::fn_sign).biff(26));
        self.register(FunctionDef::new("ROUND", 2, Some(2), math::fn_round).biff(27));
        self.register(FunctionDef::new("MOD", 2, Some(2), math::fn_mod).biff(39));
        self.register(FunctionDef::new("LOG", 1, Some(2), math::fn_log).biff(109));
        self.register(FunctionDef::new("TRUNC", 1, Some(2), math::fn_trunc).biff(197));
        self.register(FunctionDef::new("ROUNDUP", 2, Some(2), math::fn_roundup).biff(212));
        self.register(FunctionDef::new("ROUNDDOWN", 2, Some(2), math::fn_rounddown).biff(213));
        self.register(FunctionDef::new("POWER", 2, Some(2), math::fn_power).biff(337));

        // RAND and RANDBETWEEN are volatile
        self.register(FunctionDef::new("RAND", 0, Some(0), math::fn_rand).volatile().biff(63));
        self.register(
            FunctionDef::new("RANDBETWEEN", 2, Some(2), math::fn_randbetween).volatile(),
        );
    }

    fn register_logical_functions(&mut self) {
        // IF and CHOOSE only look at the branch they pick
        self.register(
            FunctionDef::new("IF", 2, Some(3), logical::fn_if)
                .traps_errors()
                .biff(1),
        );
        self.register(
            FunctionDef::new("CHOOSE", 2, None, logical::fn_choose)
                .traps_errors()
                .biff(100),
        );
        self.register(FunctionDef::new("TRUE", 0, Some(0), logical::fn_true).biff(34));
        self.register(FunctionDef::new("FALSE", 0, Some(0), logical::fn_false).biff(35));
        self.register(FunctionDef::new("AND", 1, None, logical::fn_and).array().biff(36));
        self.register(FunctionDef::new("OR", 1, None, logical::fn_or).array().biff(37));
        self.register(FunctionDef::new("NOT", 1, Some(1), logical::fn_not).biff(38));
        self.register(FunctionDef::new("XOR", 1, None, logical::fn_xor).array());
        self.register(FunctionDef::new("IFERROR", 2, Some(2), logical::fn_iferror).traps_errors());
        self.register(FunctionDef::new("IFNA", 2, Some(2), logical::fn_ifna).traps_errors());
        self.register(FunctionDef::new("IFS", 2, None, logical::fn_ifs).traps_errors());
    }

    fn register_info_functions(&mut self) {
        self.register(FunctionDef::new("ISNA", 1, Some(1), info::fn_isna).traps_errors().biff(2));
        self.register(
            FunctionDef::new("ISERROR", 1, Some(1), info::fn_iserror)
                .traps_errors()
                .biff(3),
        );
        self.register(FunctionDef::new("NA", 0, Some(0), info::fn_na).biff(10));
        self.register(
            FunctionDef::new("ISREF", 1, Some(1), info::fn_isref)
                .reference()
                .traps_errors()
                .biff(105),
        );
        self.register(FunctionDef::new("ISERR", 1, Some(1), info::fn_iserr).traps_errors().biff(126));
        self.register(
            FunctionDef::new("ISTEXT", 1, Some(1), info::fn_istext)
                .traps_errors()
                .biff(127),
        );
        self.register(
            FunctionDef::new("ISNUMBER", 1, Some(1), info::fn_isnumber)
                .traps_errors()
                .biff(128),
        );
        self.register(
            FunctionDef::new("ISBLANK", 1, Some(1), info::fn_isblank)
                .traps_errors()
                .biff(129),
        );
        self.register(FunctionDef::new("T", 1, Some(1), info::fn_t).biff(130));
        self.register(FunctionDef::new("N", 1, Some(1), info::fn_n).biff(131));
        self.register(
            FunctionDef::new("ISNONTEXT", 1, Some(1), info::fn_isnontext)
                .traps_errors()
                .biff(190),
        );
        self.register(
            FunctionDef::new("ISLOGICAL", 1, Some(1), info::fn_islogical)
                .traps_errors()
                .biff(198),
        );
        self.register(
            FunctionDef::new("ERROR.TYPE", 1, Some(1), info::fn_error_type)
                .traps_errors()
                .biff(261),
        );
        self.register(FunctionDef::new("FORMULATEXT", 1, Some(1), info::fn_formulatext).reference());
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef::new("REPT", 2, Some(2), text::fn_rept).biff(30));
        self.register(FunctionDef::new("MID", 3, Some(3), text::fn_mid).biff(31));
        self.register(FunctionDef::new("LEN", 1, Some(1), text::fn_len).biff(32));
        self.register(FunctionDef::new("VALUE", 1, Some(1), text::fn_value).biff(33));
        self.register(FunctionDef::new("SEARCH", 2, Some(3), text::fn_search).biff(82));
        self.register(FunctionDef::new("CHAR", 1, Some(1), text::fn_char).biff(111));
        self.register(FunctionDef::new("LOWER", 1, Some(1), text::fn_lower).biff(112));
        self.register(FunctionDef::new("UPPER", 1, Some(1), text::fn_upper).biff(113));
        self.register(FunctionDef::new("PROPER", 1, Some(1), text::fn_proper).biff(114));
        self.register(FunctionDef::new("LEFT", 1, Some(2), text::fn_left).biff(115));
        self.register(FunctionDef::new("RIGHT", 1, Some(2), text::fn_right).biff(116));
        self.register(FunctionDef::new("EXACT", 2, Some(2), text::fn_exact).biff(117));
        self.register(FunctionDef::new("TRIM", 1, Some(1), text::fn_trim).biff(118));
        self.register(FunctionDef::new("SUBSTITUTE", 3, Some(4), text::fn_substitute).biff(120));
        self.register(FunctionDef::new("CODE", 1, Some(1), text::fn_code).biff(121));
        self.register(FunctionDef::new("FIND", 2, Some(3), text::fn_find).biff(124));
        self.register(
            FunctionDef::new("CONCATENATE", 1, None, text::fn_concatenate).biff(336),
        );
        self.register(FunctionDef::new("CONCAT", 1, None, text::fn_concat).array());
    }

    fn register_date_functions(&mut self) {
        self.register(FunctionDef::new("DATE", 3, Some(3), date::fn_date).biff(65));
        self.register(FunctionDef::new("DAY", 1, Some(1), date::fn_day).biff(67));
        self.register(FunctionDef::new("MONTH", 1, Some(1), date::fn_month).biff(68));
        self.register(FunctionDef::new("YEAR", 1, Some(1), date::fn_year).biff(69));
        self.register(FunctionDef::new("NOW", 0, Some(0), date::fn_now).volatile().biff(74));
        self.register(FunctionDef::new("TODAY", 0, Some(0), date::fn_today).volatile().biff(221));
    }

    fn register_lookup_functions(&mut self) {
        self.register(FunctionDef::new("INDEX", 2, Some(3), lookup::fn_index).array().biff(29));
        self.register(FunctionDef::new("MATCH", 2, Some(3), lookup::fn_match).array().biff(64));
        self.register(FunctionDef::new("HLOOKUP", 3, Some(4), lookup::fn_hlookup).array().biff(101));
        self.register(FunctionDef::new("VLOOKUP", 3, Some(4), lookup::fn_vlookup).array().biff(102));
    }

    fn register_reference_functions(&mut self) {
        self.register(FunctionDef::new("ROW", 0, Some(1), reference::fn_row).reference().biff(8));
        self.register(
            FunctionDef::new("COLUMN", 0, Some(1), reference::fn_column)
                .reference()
                .biff(9),
        );
        self.register(FunctionDef::new("ROWS", 1, Some(1), reference::fn_rows).reference().biff(76));
        self.register(
            FunctionDef::new("COLUMNS", 1, Some(1), reference::fn_columns)
                .reference()
                .biff(77),
        );
        self.register(
            FunctionDef::new("OFFSET", 3, Some(5), reference::fn_offset)
                .reference()
                .volatile()
                .biff(78),
        );
        self.register(
            FunctionDef::new("INDIRECT", 1, Some(2), reference::fn_indirect)
                .volatile()
                .biff(148),
        );
        self.register(FunctionDef::new("ADDRESS", 2, Some(5), reference::fn_address).biff(219));
    }
}

fn normalize(name: &str) -> String {
    let upper = name.to_uppercase();
    match upper.strip_prefix("_XLFN.") {
        Some(rest) => rest.to_string(),
        None => upper,
    }
}

// === Argument helpers shared by the function families ===

/// Turn an internal result into a function result; error codes become values
pub(crate) fn finish<T: Into<FormulaValue>>(
    result: Result<T, ErrorCode>,
) -> FormulaResult<FormulaValue> {
    Ok(match result {
        Ok(value) => value.into(),
        Err(e) => FormulaValue::Error(e),
    })
}

/// The single value an argument stands for; arrays give their top-left element
pub(crate) fn scalar(value: &FormulaValue) -> &FormulaValue {
    match value {
        FormulaValue::Array(rows) => rows
            .first()
            .and_then(|row| row.first())
            .unwrap_or(&FormulaValue::Empty),
        other => other,
    }
}

/// Argument `index` as a number; a missing argument is `#VALUE!`
pub(crate) fn number_arg(args: &[FormulaValue], index: usize) -> Result<f64, ErrorCode> {
    args.get(index)
        .ok_or(ErrorCode::Value)
        .and_then(|v| scalar(v).to_number())
}

/// Optional numeric argument; missing or omitted gives `default`
pub(crate) fn optional_number(
    args: &[FormulaValue],
    index: usize,
    default: f64,
) -> Result<f64, ErrorCode> {
    match args.get(index) {
        None | Some(FormulaValue::Empty) => Ok(default),
        Some(v) => scalar(v).to_number(),
    }
}

/// Argument `index` as text, using the context's number rendering
pub(crate) fn text_arg(
    args: &[FormulaValue],
    index: usize,
    ctx: &EvaluationContext,
) -> Result<String, ErrorCode> {
    let value = args.get(index).ok_or(ErrorCode::Value)?;
    ctx.to_text(scalar(value))
}

/// Every value of every argument, with arrays flattened row by row
pub(crate) fn flatten(args: &[FormulaValue]) -> impl Iterator<Item = &FormulaValue> + '_ {
    args.iter().flat_map(values_of)
}

fn values_of(value: &FormulaValue) -> Box<dyn Iterator<Item = &FormulaValue> + '_> {
    match value {
        FormulaValue::Array(rows) => Box::new(rows.iter().flatten()),
        other => Box::new(std::iter::once(other)),
    }
}

/// Numbers to aggregate, the way SUM/AVERAGE/MIN/MAX see them
///
/// Arguments typed directly count if they coerce to a number (`SUM("2", TRUE)`
/// is 3). Inside arrays only real numbers count. Any error is returned.
pub(crate) fn collect_numbers(args: &[FormulaValue]) -> Result<Vec<f64>, ErrorCode> {
    let mut numbers = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                for value in rows.iter().flatten() {
                    match value {
                        FormulaValue::Number(n) => numbers.push(*n),
                        FormulaValue::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            FormulaValue::Empty => {}
            other => numbers.push(other.to_number()?),
        }
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert_eq!(registry.get("sum").unwrap().name, "SUM");
        assert_eq!(registry.get("_xlfn.IFNA").unwrap().name, "IFNA");
        assert_eq!(registry.get("error.type").unwrap().name, "ERROR.TYPE");
        assert!(registry.get("NOSUCHFUNCTION").is_none());
    }

    #[test]
    fn test_lookup_by_biff_index() {
        let registry = FunctionRegistry::new();
        assert_eq!(registry.get_by_index(0).unwrap().name, "COUNT");
        assert_eq!(registry.get_by_index(1).unwrap().name, "IF");
        assert_eq!(registry.get_by_index(148).unwrap().name, "INDIRECT");
        assert!(registry.get_by_index(9999).is_none());
    }

    #[test]
    fn test_metadata() {
        let registry = FunctionRegistry::new();
        let row = registry.get("ROW").unwrap();
        assert_eq!(row.arg_kind, ArgKind::Reference);
        assert!(row.accepts(0) && row.accepts(1) && !row.accepts(2));

        let ifna = registry.get("IFNA").unwrap();
        assert_eq!(ifna.error_policy, ErrorPolicy::Trap);
        assert!(!ifna.accepts(1) && !ifna.accepts(3));

        assert!(registry.get("RAND").unwrap().volatile);
        assert!(registry.get("SUM").unwrap().accepts(255));
    }

    #[test]
    fn test_extensions() {
        fn fn_answer(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
            Ok(FormulaValue::Number(42.0))
        }

        let mut registry = FunctionRegistry::new();
        let builtins = registry.len();
        assert!(registry.register_extension(FunctionDef::new("MYADDIN.ANSWER", 0, Some(0), fn_answer)));
        assert!(!registry.register_extension(FunctionDef::new("SUM", 1, None, fn_answer)));
        assert_eq!(registry.len(), builtins + 1);
        assert!(registry.contains("myaddin.answer"));
        assert!(FunctionRegistry::empty().is_empty());
    }
}
