//! Expression evaluation implementation
//!
//! Composite literals and the short-circuit operators. Operators on already
//! evaluated values live in [`ops`](super::ops); calls in the engine.

use crate::interpreter::engine::Evaluator;
use crate::interpreter::errors::RuntimeError;
use crate::memory::environment::Env;
use crate::memory::value::{HashTable, Value};
use crate::parser::ast::*;

impl Evaluator<'_> {
    /// `f"..."`: text segments verbatim, embedded expressions in display form
    pub(crate) fn eval_template(&mut self, parts: &[TemplatePart], env: &Env) -> Result<Value, RuntimeError> {
        let mut text = String::new();
        for part in parts {
            match part {
                TemplatePart::Text(literal) => text.push_str(literal),
                TemplatePart::Expr(expr) => {
                    let value = self.eval_expr(expr, env)?;
                    text.push_str(&value.to_string());
                }
            }
        }
        Ok(Value::string(&text))
    }

    pub(crate) fn eval_array(&mut self, items: &[AstNode], env: &Env) -> Result<Value, RuntimeError> {
        let items = self.eval_args(items, env)?;
        Ok(Value::array(items))
    }

    /// Keys and values evaluate pairwise, left to right; later duplicates win
    pub(crate) fn eval_hash(&mut self, pairs: &[(AstNode, AstNode)], env: &Env) -> Result<Value, RuntimeError> {
        let mut table = HashTable::new();
        for (key_node, value_node) in pairs {
            let key = self.eval_expr(key_node, env)?;
            let key = key.as_hash_key().ok_or(RuntimeError::UnhashableKey {
                type_name: key.type_name(),
                location: key_node.span.start,
            })?;
            let value = self.eval_expr(value_node, env)?;
            table.insert(key, value);
        }
        Ok(Value::hash(table))
    }

    /// `&&` and `||` skip the right operand when the left decides the result
    pub(crate) fn eval_logical(
        &mut self,
        op: LogicalOp,
        left: &AstNode,
        right: &AstNode,
        env: &Env,
    ) -> Result<Value, RuntimeError> {
        let left = self.eval_expr(left, env)?.is_truthy();
        let decided = match op {
            LogicalOp::And => !left,
            LogicalOp::Or => left,
        };
        if decided {
            return Ok(Value::Boolean(left));
        }
        Ok(Value::Boolean(self.eval_expr(right, env)?.is_truthy()))
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::errors::RuntimeError;
    use crate::interpreter::limits::Limits;
    use crate::interpreter::run;
    use crate::snapshot::ConsoleLog;

    fn eval(source: &str) -> Result<String, RuntimeError> {
        let program = match crate::parser::parse(source) {
            Ok(program) => program,
            Err(errors) => panic!("parse errors: {:?}", errors),
        };
        let mut console = ConsoleLog::new();
        run(&program, &mut console, &Limits::default()).map(|v| v.to_string())
    }

    #[test]
    fn test_template_strings() {
        assert_eq!(
            eval("let name = \"Ada\"; let n = 3; f\"{name} has {n * 2} items\";").unwrap(),
            "Ada has 6 items"
        );
        assert_eq!(eval("f\"list: {[1, 2]}\";").unwrap(), "list: [1, 2]");
    }

    #[test]
    fn test_hash_literal() {
        assert_eq!(
            eval("let h = {\"a\": 1, 2: \"b\", true: null}; h;").unwrap(),
            "{\"a\": 1, 2: \"b\", true: null}"
        );
        assert_eq!(eval("let h = {\"a\": 1, \"a\": 2}; h;").unwrap(), "{\"a\": 2}");
    }

    #[test]
    fn test_unhashable_key() {
        assert!(matches!(
            eval("let h = {[1]: 2};"),
            Err(RuntimeError::UnhashableKey {
                type_name: "array",
                ..
            })
        ));
    }

    #[test]
    fn test_logical_short_circuit() {
        // The right side would fail if evaluated
        assert_eq!(eval("false && missing;").unwrap(), "false");
        assert_eq!(eval("true || missing;").unwrap(), "true");
        assert_eq!(eval("1 && \"x\";").unwrap(), "true");
        assert_eq!(eval("0 || \"\";").unwrap(), "false");
        assert!(matches!(
            eval("true && missing;"),
            Err(RuntimeError::UnknownIdentifier { .. })
        ));
    }
}
