//! Formula evaluator
//!
//! Runs a post-order token sequence on an operand stack. References stay
//! unresolved on the stack until an operator or function asks for their values,
//! which is what lets `ROW(A1:B2)`, `A1:INDIRECT("B5")` and `SUM(A:A)` each see
//! the form they need.

use log::{debug, trace};
use sheetcalc_core::ErrorCode;

use crate::context::{EvalKey, EvaluationContext};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{math, ArgKind, ErrorPolicy};
use crate::parser::{parse, ParsedFormula};
use crate::token::{BinaryOperator, Token, UnaryOperator};
use crate::value::{compare_values, FormulaValue, RefValue};

/// Evaluate a parsed formula to a single value
///
/// A reference left over at the end is dereferenced by implicit intersection
/// against the context's cell, the way a cell formula `=A1:A10` behaves.
///
/// # Example
/// ```rust
/// use sheetcalc_core::Workbook;
/// use sheetcalc_formula::{evaluate, parse, EvaluationContext, EvaluatorConfig, FormulaValue};
///
/// let mut wb = Workbook::new();
/// wb.worksheet_mut(0).unwrap().set_cell_value("A1", 20.0).unwrap();
///
/// let config = EvaluatorConfig::default();
/// let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 0, 1);
/// let formula = parse("=A1*2+1").unwrap();
/// assert_eq!(evaluate(&formula, &ctx).unwrap(), FormulaValue::Number(41.0));
/// ```
pub fn evaluate(formula: &ParsedFormula, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let value = evaluate_tokens(formula.tokens(), ctx)?;
    ctx.deref_scalar(value)
}

/// Evaluate a token sequence, leaving a final reference unresolved
///
/// Fails with [`FormulaError::MalformedTokens`] if the sequence does not reduce
/// to exactly one value.
pub fn evaluate_tokens(tokens: &[Token], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut stack: Vec<FormulaValue> = Vec::with_capacity(tokens.len());

    for token in tokens {
        let value = match token {
            // === Literals ===
            Token::Number(n) => FormulaValue::Number(*n),
            Token::Text(s) => FormulaValue::String(s.clone()),
            Token::Boolean(b) => FormulaValue::Boolean(*b),
            Token::Error(e) => FormulaValue::Error(*e),
            Token::Array(rows) => FormulaValue::Array(rows.clone()),
            Token::Missing => FormulaValue::Empty,

            // === References ===
            Token::Ref(r) | Token::Area(r) => ctx.resolve_reference(r)?,
            Token::Name(name) => evaluate_name(name, ctx)?,

            // === Operators ===
            Token::Unary(op) => {
                let operand = ctx.deref_scalar(pop(&mut stack)?)?;
                evaluate_unary(*op, operand)
            }
            Token::Binary(op) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                evaluate_binary(*op, left, right, ctx)?
            }
            Token::Paren => continue,

            // === Functions ===
            Token::Function { name, arity } => {
                let at = stack.len().checked_sub(*arity).ok_or_else(|| {
                    FormulaError::MalformedTokens(format!(
                        "{} expects {} operands but only {} are available",
                        name,
                        arity,
                        stack.len()
                    ))
                })?;
                let args = stack.split_off(at);
                evaluate_function(name, args, ctx)?
            }
        };
        stack.push(value);
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(value), true) => Ok(value),
        (None, _) => Err(FormulaError::MalformedTokens("no value produced".into())),
        (Some(_), false) => Err(FormulaError::MalformedTokens(format!(
            "{} values left on the stack",
            stack.len() + 1
        ))),
    }
}

fn pop(stack: &mut Vec<FormulaValue>) -> FormulaResult<FormulaValue> {
    stack
        .pop()
        .ok_or_else(|| FormulaError::MalformedTokens("operand stack underflow".into()))
}

/// Evaluate a defined name as seen from the context's sheet
///
/// The name's formula runs in a child context, so a name that reaches itself
/// (directly, through other names or through INDIRECT) is cut off with `#REF!`
/// instead of recursing. The result is returned undereferenced so names can
/// stand for references.
pub(crate) fn evaluate_name(name: &str, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let Some(expression) = ctx.resolver().resolve_name(name, ctx.current_sheet) else {
        debug!("unknown name '{}'", name);
        return Ok(FormulaValue::Error(ErrorCode::Name));
    };

    let key = EvalKey::Name {
        sheet: ctx.current_sheet,
        name: name.to_lowercase(),
    };
    let Some(child) = ctx.enter(key) else {
        return Ok(FormulaValue::Error(ErrorCode::Ref));
    };

    let parsed = match parse(&expression) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!("name '{}' does not parse: {}", name, err);
            return Ok(FormulaValue::Error(ErrorCode::Name));
        }
    };
    evaluate_tokens(parsed.tokens(), &child)
}

/// Evaluate a unary operation; arrays are mapped element by element
fn evaluate_unary(op: UnaryOperator, operand: FormulaValue) -> FormulaValue {
    match operand {
        FormulaValue::Array(rows) => FormulaValue::Array(
            rows.into_iter()
                .map(|row| row.into_iter().map(|v| evaluate_unary(op, v)).collect())
                .collect(),
        ),
        FormulaValue::Error(e) => FormulaValue::Error(e),
        // Unary plus leaves its operand alone, text included
        value if op == UnaryOperator::Plus => value,
        value => match value.to_number() {
            Ok(n) => {
                let result = match op {
                    UnaryOperator::Percent => n / 100.0,
                    _ => -n,
                };
                FormulaValue::Number(result)
            }
            Err(e) => FormulaValue::Error(e),
        },
    }
}

/// Evaluate a binary operation
fn evaluate_binary(
    op: BinaryOperator,
    left: FormulaValue,
    right: FormulaValue,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    match op {
        BinaryOperator::Range => Ok(range(left, right)),
        BinaryOperator::Union => {
            let left = ctx.deref_array(left)?;
            let right = ctx.deref_array(right)?;
            let values: Vec<FormulaValue> = [left, right]
                .into_iter()
                .flat_map(|value| match value {
                    FormulaValue::Array(rows) => rows.into_iter().flatten().collect(),
                    other => vec![other],
                })
                .collect();
            Ok(FormulaValue::Array(vec![values]))
        }
        _ => {
            let left = ctx.deref_scalar(left)?;
            let right = ctx.deref_scalar(right)?;
            Ok(broadcast(&left, &right, |l, r| apply_scalar(op, l, r, ctx)))
        }
    }
}

/// `left:right` over two references: the smallest area covering both
fn range(left: FormulaValue, right: FormulaValue) -> FormulaValue {
    match (left, right) {
        (FormulaValue::Reference(a), FormulaValue::Reference(b)) if a.same_sheets(&b) => {
            FormulaValue::Reference(RefValue {
                range: a.range.union_bounds(&b.range),
                ..a
            })
        }
        (FormulaValue::Error(e), _) | (_, FormulaValue::Error(e)) => FormulaValue::Error(e),
        _ => FormulaValue::Error(ErrorCode::Value),
    }
}

fn dims(value: &FormulaValue) -> (usize, usize) {
    match value {
        FormulaValue::Array(rows) => (rows.len(), rows.first().map_or(0, |r| r.len())),
        _ => (1, 1),
    }
}

/// Element of an operand at a position of the result; a dimension of one stretches
fn element_at(value: &FormulaValue, row: usize, col: usize) -> FormulaValue {
    match value {
        FormulaValue::Array(rows) => {
            let row = if rows.len() == 1 { 0 } else { row };
            let Some(values) = rows.get(row) else {
                return FormulaValue::Error(ErrorCode::Na);
            };
            let col = if values.len() == 1 { 0 } else { col };
            values
                .get(col)
                .cloned()
                .unwrap_or(FormulaValue::Error(ErrorCode::Na))
        }
        other => other.clone(),
    }
}

/// Apply a scalar operation element-wise when either side is an array
///
/// Positions past the end of the smaller array are `#N/A`, as in Excel.
fn broadcast<F>(left: &FormulaValue, right: &FormulaValue, op: F) -> FormulaValue
where
    F: Fn(&FormulaValue, &FormulaValue) -> FormulaValue,
{
    if !matches!(left, FormulaValue::Array(_)) && !matches!(right, FormulaValue::Array(_)) {
        return op(left, right);
    }
    let (left_rows, left_cols) = dims(left);
    let (right_rows, right_cols) = dims(right);
    let rows = left_rows.max(right_rows);
    let cols = left_cols.max(right_cols);

    FormulaValue::Array(
        (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| op(&element_at(left, row, col), &element_at(right, row, col)))
                    .collect()
            })
            .collect(),
    )
}

/// A binary operator on two scalars
fn apply_scalar(
    op: BinaryOperator,
    left: &FormulaValue,
    right: &FormulaValue,
    ctx: &EvaluationContext,
) -> FormulaValue {
    // Left error wins over right error
    if let FormulaValue::Error(e) = left {
        return FormulaValue::Error(*e);
    }
    if let FormulaValue::Error(e) = right {
        return FormulaValue::Error(*e);
    }

    if op == BinaryOperator::Concat {
        return match (ctx.to_text(left), ctx.to_text(right)) {
            (Ok(l), Ok(r)) => FormulaValue::String(l + &r),
            (Err(e), _) | (_, Err(e)) => FormulaValue::Error(e),
        };
    }

    if op.is_comparison() {
        let ordering = compare_values(left, right);
        let result = match op {
            BinaryOperator::Equal => ordering.is_eq(),
            BinaryOperator::NotEqual => ordering.is_ne(),
            BinaryOperator::LessThan => ordering.is_lt(),
            BinaryOperator::LessEqual => ordering.is_le(),
            BinaryOperator::GreaterThan => ordering.is_gt(),
            _ => ordering.is_ge(),
        };
        return FormulaValue::Boolean(result);
    }

    let (l, r) = match (left.to_number(), right.to_number()) {
        (Ok(l), Ok(r)) => (l, r),
        (Err(e), _) | (_, Err(e)) => return FormulaValue::Error(e),
    };
    let result = match op {
        BinaryOperator::Add => Ok(l + r),
        BinaryOperator::Subtract => Ok(l - r),
        BinaryOperator::Multiply => Ok(l * r),
        BinaryOperator::Divide if r == 0.0 => Err(ErrorCode::Div0),
        BinaryOperator::Divide => Ok(l / r),
        BinaryOperator::Power => math::power(l, r),
        _ => Err(ErrorCode::Value),
    };
    match result {
        Ok(n) if n.is_finite() => FormulaValue::Number(n),
        Ok(_) => FormulaValue::Error(ErrorCode::Num),
        Err(e) => FormulaValue::Error(e),
    }
}

/// Evaluate a function call
///
/// Arguments are prepared according to the function's [`ArgKind`]; error
/// arguments short-circuit unless the function traps them.
fn evaluate_function(
    name: &str,
    args: Vec<FormulaValue>,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let Some(func) = ctx.functions().get(name) else {
        debug!("unknown function {}", name);
        return Ok(FormulaValue::Error(ErrorCode::Name));
    };

    // Check argument count
    if !func.accepts(args.len()) {
        debug!("{} does not take {} arguments", func.name, args.len());
        return Ok(FormulaValue::Error(ErrorCode::Value));
    }

    let mut prepared = Vec::with_capacity(args.len());
    for arg in args {
        prepared.push(match func.arg_kind {
            ArgKind::Reference => arg,
            ArgKind::Scalar => ctx.deref_scalar(arg)?,
            ArgKind::Array => ctx.deref_array(arg)?,
        });
    }

    if func.error_policy == ErrorPolicy::Propagate {
        if let Some(e) = prepared.iter().find_map(FormulaValue::get_error) {
            return Ok(FormulaValue::Error(e));
        }
    }

    trace!("calling {} with {} arguments", func.name, prepared.len());
    (func.implementation)(&prepared, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluatorConfig;
    use pretty_assertions::assert_eq;
    use sheetcalc_core::{CellValue, Workbook};

    fn workbook() -> Workbook {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Rates").unwrap();
        let ws = wb.worksheet_mut(0).unwrap();
        ws.set_cell_value("A1", 1.0).unwrap();
        ws.set_cell_value("A2", 2.0).unwrap();
        ws.set_cell_value("A3", 3.0).unwrap();
        ws.set_cell_value("B1", "text").unwrap();
        ws.set_cell_value("B2", ErrorCode::Na).unwrap();
        ws.set_cell_value("C1", true).unwrap();
        ws.set_cell_value_at(
            3,
            0,
            CellValue::formula_with_result("=A3*2", CellValue::Number(6.0)),
        )
        .unwrap();
        wb.worksheet_mut(1)
            .unwrap()
            .set_cell_value("A1", 0.25)
            .unwrap();

        wb.define_name("Total", "=SUM(Sheet1!$A$1:$A$3)").unwrap();
        wb.define_name("Numbers", "=Sheet1!$A$1:$A$3").unwrap();
        wb.define_name("Loop", "=Loop+1").unwrap();
        wb.define_name("Ping", "=Pong").unwrap();
        wb.define_name("Pong", "=Ping*2").unwrap();
        wb.define_name("Broken", "=1+").unwrap();
        wb.define_name_for_sheet("Rate", "=Rates!A1", 0).unwrap();
        wb
    }

    fn eval_with(config: &EvaluatorConfig, formula: &str, row: u32, col: u16) -> FormulaValue {
        let wb = workbook();
        let ctx = EvaluationContext::for_workbook(config, &wb, 0, row, col);
        evaluate(&parse(formula).unwrap(), &ctx).unwrap()
    }

    fn eval_at(formula: &str, row: u32, col: u16) -> FormulaValue {
        eval_with(&EvaluatorConfig::default(), formula, row, col)
    }

    fn eval(formula: &str) -> FormulaValue {
        eval_at(formula, 9, 9)
    }

    fn num(n: f64) -> FormulaValue {
        FormulaValue::Number(n)
    }

    fn err(e: ErrorCode) -> FormulaValue {
        FormulaValue::Error(e)
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("=1+2*3"), num(7.0));
        assert_eq!(eval("=(1+2)*3"), num(9.0));
        assert_eq!(eval("=10-4/2"), num(8.0));
        assert_eq!(eval("=2^3^2"), num(64.0));
        assert_eq!(eval("=-2^2"), num(4.0));
        assert_eq!(eval("=50%*4"), num(2.0));
        assert_eq!(eval("=TRUE+TRUE"), num(2.0));
        assert_eq!(eval("=\"3\"+1"), num(4.0));
        assert_eq!(eval("=Z99+1"), num(1.0));
    }

    #[test]
    fn test_evaluate_arithmetic_errors() {
        assert_eq!(eval("=1/0"), err(ErrorCode::Div0));
        assert_eq!(eval("=0^0"), err(ErrorCode::Num));
        assert_eq!(eval("=\"a\"+1"), err(ErrorCode::Value));
        assert_eq!(eval("=1E300*1E300"), err(ErrorCode::Num));
        assert_eq!(eval("=-\"abc\""), err(ErrorCode::Value));
        assert_eq!(eval("=+\"abc\""), FormulaValue::string("abc"));
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("=1<2"), FormulaValue::Boolean(true));
        assert_eq!(eval("=\"abc\"=\"ABC\""), FormulaValue::Boolean(true));
        assert_eq!(eval("=TRUE>\"zzz\""), FormulaValue::Boolean(true));
        assert_eq!(eval("=\"a\">1000"), FormulaValue::Boolean(true));
        assert_eq!(eval("=2<>2"), FormulaValue::Boolean(false));
        assert_eq!(eval("=3>=3"), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_blank_comparison() {
        assert_eq!(eval("=Z99=0"), FormulaValue::Boolean(true));
        assert_eq!(eval("=Z99=\"\""), FormulaValue::Boolean(true));
        assert_eq!(eval("=Z99=FALSE"), FormulaValue::Boolean(true));
        assert_eq!(eval("=Z99<1"), FormulaValue::Boolean(true));
        assert_eq!(eval("=Z99>-1"), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_evaluate_concatenation() {
        assert_eq!(eval("=\"a\"&1.5&TRUE"), FormulaValue::string("a1.5TRUE"));
        assert_eq!(eval("=1&Z99"), FormulaValue::string("1"));
        assert_eq!(eval("=B1&\"!\""), FormulaValue::string("text!"));

        let config = EvaluatorConfig::default().with_decimal_separator(',');
        assert_eq!(eval_with(&config, "=1.5&\"\"", 0, 0), FormulaValue::string("1,5"));
    }

    #[test]
    fn test_error_propagation_order() {
        assert_eq!(eval("=#N/A+1/0"), err(ErrorCode::Na));
        assert_eq!(eval("=1/0+#N/A"), err(ErrorCode::Div0));
        assert_eq!(eval("=B2+1"), err(ErrorCode::Na));
        assert_eq!(eval("=\"a\"&B2"), err(ErrorCode::Na));
        assert_eq!(eval("=SUM(5/0,1)"), err(ErrorCode::Div0));
        assert_eq!(eval("=SUM(1,#NULL!,5/0)"), err(ErrorCode::Null));
        assert_eq!(eval("=SUM(A1:B2)"), err(ErrorCode::Na));
    }

    #[test]
    fn test_error_trapping_functions() {
        assert_eq!(eval("=IFERROR(1/0,7)"), num(7.0));
        assert_eq!(eval("=IFERROR(3,7)"), num(3.0));
        assert_eq!(eval("=IFNA(B2,\"none\")"), FormulaValue::string("none"));
        assert_eq!(eval("=IFNA(1/0,1)"), err(ErrorCode::Div0));
        assert_eq!(eval("=IFERROR(1/0,)"), num(0.0));
        assert_eq!(eval("=IFNA(B2,)"), num(0.0));
        assert_eq!(eval("=IFERROR(1/0,Z99)"), num(0.0));
        assert_eq!(eval("=ISERROR(B2)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=ISNA(1/0)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=IF(A1>0,\"yes\",1/0)"), FormulaValue::string("yes"));
        assert_eq!(eval("=IF(B2,1,2)"), err(ErrorCode::Na));
        assert_eq!(eval("=IF(FALSE,1,)"), num(0.0));
        assert_eq!(eval("=IF(FALSE,1)"), FormulaValue::Boolean(false));
    }

    #[test]
    fn test_references() {
        assert_eq!(eval("=A1+A2"), num(3.0));
        assert_eq!(eval("=A4"), num(6.0));
        assert_eq!(eval("=SUM(A:A)"), num(12.0));
        assert_eq!(eval("=SUM(A1:A2:A3)"), num(6.0));
        assert_eq!(eval("=SUM((A1,A3))"), num(4.0));
        assert_eq!(eval("=SUM(A1:INDIRECT(\"A3\"))"), num(6.0));
        assert_eq!(eval("=Rates!A1*4"), num(1.0));
        assert_eq!(eval("=Nowhere!A1"), err(ErrorCode::Ref));
        assert_eq!(eval("=SUM(A1:Rates!A1)"), err(ErrorCode::Value));
        assert_eq!(eval("=SUM(A1:Sheet1!A3)"), num(6.0));
        assert_eq!(eval("=SUM(Sheet1!A1:Sheet1!A3)"), num(6.0));
        assert_eq!(eval("=COUNT(Sheet1:Rates!A1)"), num(2.0));
    }

    #[test]
    fn test_implicit_intersection() {
        assert_eq!(eval_at("=A1:A3*10", 1, 3), num(20.0));
        assert_eq!(eval_at("=A1:C1", 5, 1), FormulaValue::string("text"));
        assert_eq!(eval_at("=A1:A3", 9, 9), err(ErrorCode::Value));
        assert_eq!(eval_at("=A1:B3+1", 0, 5), err(ErrorCode::Value));
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            eval("={1,2;3,4}*10"),
            FormulaValue::Array(vec![vec![num(10.0), num(20.0)], vec![num(30.0), num(40.0)]])
        );
        assert_eq!(eval("=SUM({1,2;3,4}*{1;2})"), num(17.0));
        assert_eq!(
            eval("={1,2}+{1,2,3}"),
            FormulaValue::Array(vec![vec![num(2.0), num(4.0), err(ErrorCode::Na)]])
        );
        assert_eq!(
            eval("=-{1,\"x\"}"),
            FormulaValue::Array(vec![vec![num(-1.0), err(ErrorCode::Value)]])
        );
    }

    #[test]
    fn test_function_dispatch() {
        assert_eq!(eval("=NOSUCH(1)"), err(ErrorCode::Name));
        assert_eq!(eval("=ABS()"), err(ErrorCode::Value));
        assert_eq!(eval("=IFNA(1)"), err(ErrorCode::Value));
        assert_eq!(eval("=IFNA(1,2,3)"), err(ErrorCode::Value));
        assert_eq!(eval("=_xlfn.IFNA(#N/A,5)"), num(5.0));
        assert_eq!(eval("=sum(1,2)"), num(3.0));
    }

    #[test]
    fn test_defined_names() {
        assert_eq!(eval("=Total*2"), num(12.0));
        assert_eq!(eval("=SUM(Numbers)"), num(6.0));
        assert_eq!(eval_at("=Numbers", 1, 5), num(2.0));
        assert_eq!(eval("=ROWS(Numbers)"), num(3.0));
        assert_eq!(eval("=rate*100"), num(25.0));
        assert_eq!(eval("=Unknown+1"), err(ErrorCode::Name));
        assert_eq!(eval("=Broken"), err(ErrorCode::Name));
    }

    #[test]
    fn test_name_cycles() {
        assert_eq!(eval("=Loop"), err(ErrorCode::Ref));
        assert_eq!(eval("=Ping"), err(ErrorCode::Ref));
        assert_eq!(eval("=INDIRECT(\"Loop\")"), err(ErrorCode::Ref));
        assert_eq!(eval("=IFERROR(Loop,\"cycle\")"), FormulaValue::string("cycle"));
    }

    #[test]
    fn test_name_depth_bound() {
        let mut wb = Workbook::new();
        for i in 1..100 {
            wb.define_name(&format!("chain_{}", i), &format!("=chain_{}+1", i + 1))
                .unwrap();
        }
        wb.define_name("chain_100", "=1").unwrap();
        let formula = parse("=chain_1").unwrap();

        let shallow = EvaluatorConfig::default().with_max_depth(64);
        let ctx = EvaluationContext::for_workbook(&shallow, &wb, 0, 0, 0);
        assert_eq!(evaluate(&formula, &ctx).unwrap(), err(ErrorCode::Ref));

        let deep = EvaluatorConfig::default().with_max_depth(200);
        let ctx = EvaluationContext::for_workbook(&deep, &wb, 0, 0, 0);
        assert_eq!(evaluate(&formula, &ctx).unwrap(), num(100.0));
    }

    #[test]
    fn test_functions_by_family() {
        assert_eq!(eval("=ROUND(2.345,2)"), num(2.35));
        assert_eq!(eval("=MOD(-3,2)"), num(1.0));
        assert_eq!(eval("=AVERAGE(A1:A3)"), num(2.0));
        assert_eq!(eval("=UPPER(LEFT(B1,2))"), FormulaValue::string("TE"));
        assert_eq!(eval("=LEN(\"héllo\")"), num(5.0));
        assert_eq!(eval("=AND(A1:A3)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=DATE(2024,1,15)"), num(45306.0));
        assert_eq!(eval("=YEAR(DATE(2024,13,1))"), num(2025.0));
        assert_eq!(eval("=VLOOKUP(3,{1,\"a\";3,\"c\"},2,FALSE)"), FormulaValue::string("c"));
        assert_eq!(eval("=INDEX(A1:A3,2)"), num(2.0));
        assert_eq!(eval("=MATCH(2,A1:A3,0)"), num(2.0));
        assert_eq!(eval("=ISREF(A1)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=FORMULATEXT(A4)"), FormulaValue::string("=A3*2"));
    }

    #[test]
    fn test_large_areas() {
        let last = |formula: &str| eval_at(formula, 1_048_575, 16_383);

        assert_eq!(last("=SUM(B1:XFC1048575)"), num(0.0));
        assert_eq!(last("=SUM(A1:A1048575)"), num(12.0));
        assert_eq!(last("=SUM(A1:XFC1048575)"), err(ErrorCode::Na));
        assert_eq!(last("=COUNTBLANK(B1:XFC1048575)"), num(1_048_575.0 * 16_382.0 - 3.0));
        assert_eq!(eval("=COUNTBLANK(F1:F3)"), num(3.0));
        assert_eq!(eval("=COUNTBLANK(B1:B3)"), num(1.0));
        assert_eq!(eval("=COUNTBLANK(Nowhere!A1)"), err(ErrorCode::Ref));
    }

    #[test]
    fn test_cells_reading_themselves() {
        assert_eq!(eval_at("=A1+1", 0, 0), err(ErrorCode::Ref));
        assert_eq!(eval_at("=SUM(A1:A3)", 1, 0), err(ErrorCode::Ref));
        assert_eq!(eval_at("=SUM(A:A)", 6, 0), err(ErrorCode::Ref));
        assert_eq!(eval_at("=IFERROR(B1,\"self\")", 0, 1), FormulaValue::string("self"));
        assert_eq!(eval_at("=INDIRECT(\"E5\")", 4, 4), err(ErrorCode::Ref));
        assert_eq!(eval_at("=ROW(A1:A3)", 1, 0), num(1.0));
    }

    #[test]
    fn test_1904_date_system() {
        let mut wb = Workbook::new();
        wb.settings_mut().date_1904 = true;
        let config = EvaluatorConfig::default();
        let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 0, 0);
        let eval_1904 = |formula: &str| evaluate(&parse(formula).unwrap(), &ctx).unwrap();

        assert_eq!(eval_1904("=DATE(1904,1,1)"), num(0.0));
        assert_eq!(eval_1904("=DATE(1904,1,2)"), num(1.0));
        assert_eq!(eval_1904("=YEAR(0)"), num(1904.0));
        assert_eq!(eval_1904("=YEAR(366)"), num(1905.0));
    }

    #[test]
    fn test_malformed_tokens() {
        let wb = workbook();
        let config = EvaluatorConfig::default();
        let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 0, 0);

        let underflow = evaluate_tokens(&[Token::Binary(BinaryOperator::Add)], &ctx);
        assert!(matches!(underflow, Err(FormulaError::MalformedTokens(_))));

        let leftover = evaluate_tokens(&[Token::Number(1.0), Token::Number(2.0)], &ctx);
        assert!(matches!(leftover, Err(FormulaError::MalformedTokens(_))));

        let short = evaluate_tokens(
            &[Token::Function {
                name: "SUM".into(),
                arity: 2,
            }],
            &ctx,
        );
        assert!(matches!(short, Err(FormulaError::MalformedTokens(_))));

        assert!(matches!(
            evaluate_tokens(&[], &ctx),
            Err(FormulaError::MalformedTokens(_))
        ));
    }
}
