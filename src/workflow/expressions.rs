//! Expression evaluation for GitHub Actions-style ${{ }} syntax
//!
//! Supports:
//! - ${{ env.VAR_NAME }}
//! - ${{ secrets.SECRET_NAME }}
//! - ${{ matrix.AXIS }}
//! - ${{ steps.step_id.outputs.output_name }}
//! - ${{ needs.job_id.outputs.output_name }}
//! - ${{ github.event_name }}, ${{ github.run_id }}, ${{ github.workspace }},
//!   ${{ github.event.some.payload.field }}
//!
//! Unknown members of a known context evaluate to the empty string; an
//! unknown context is an error.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::context::ExecutionContext;

static EXPRESSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\{\s*([^}]+?)\s*\}\}").unwrap());

/// Errors that can occur during expression evaluation
#[derive(Debug, thiserror::Error)]
pub enum ExpressionError {
    #[error("Unknown context: {0}")]
    UnknownContext(String),

    #[error("Invalid expression syntax: {0}")]
    InvalidSyntax(String),
}

/// Evaluate all expressions in a string
pub fn evaluate(input: &str, ctx: &ExecutionContext) -> Result<String, ExpressionError> {
    let mut result = input.to_string();

    for cap in EXPRESSION_REGEX.captures_iter(input) {
        let full_match = cap.get(0).unwrap().as_str();
        let expr = cap.get(1).unwrap().as_str().trim();

        let value = evaluate_single(expr, ctx)?;
        result = result.replace(full_match, &value);
    }

    Ok(result)
}

/// Evaluate a single expression (without the ${{ }} wrapper)
fn evaluate_single(expr: &str, ctx: &ExecutionContext) -> Result<String, ExpressionError> {
    if let Some(value) = evaluate_status_function(expr, ctx) {
        return Ok(value.to_string());
    }

    let parts: Vec<&str> = expr.split('.').collect();

    match parts[0] {
        "env" => {
            if parts.len() != 2 {
                return Err(ExpressionError::InvalidSyntax(format!(
                    "env expressions must be env.VAR_NAME, got: {}",
                    expr
                )));
            }
            Ok(ctx.env.get(parts[1]).cloned().unwrap_or_default())
        }

        "secrets" => {
            if parts.len() != 2 {
                return Err(ExpressionError::InvalidSyntax(format!(
                    "secrets expressions must be secrets.SECRET_NAME, got: {}",
                    expr
                )));
            }
            Ok(ctx.secrets.get(parts[1]).cloned().unwrap_or_default())
        }

        "matrix" => {
            if parts.len() != 2 {
                return Err(ExpressionError::InvalidSyntax(format!(
                    "matrix expressions must be matrix.AXIS, got: {}",
                    expr
                )));
            }
            Ok(ctx.matrix.get(parts[1]).cloned().unwrap_or_default())
        }

        "steps" => {
            // steps.step_id.outputs.output_name
            if parts.len() != 4 || parts[2] != "outputs" {
                return Err(ExpressionError::InvalidSyntax(format!(
                    "steps expressions must be steps.STEP_ID.outputs.OUTPUT_NAME, got: {}",
                    expr
                )));
            }
            Ok(ctx.get_output(parts[1], parts[3]).cloned().unwrap_or_default())
        }

        "needs" => {
            // needs.job_id.outputs.output_name
            if parts.len() != 4 || parts[2] != "outputs" {
                return Err(ExpressionError::InvalidSyntax(format!(
                    "needs expressions must be needs.JOB_ID.outputs.OUTPUT_NAME, got: {}",
                    expr
                )));
            }
            Ok(ctx
                .get_needs_output(parts[1], parts[3])
                .cloned()
                .unwrap_or_default())
        }

        "github" => match parts.get(1).copied() {
            Some("event_name") => Ok(ctx.event_name.clone()),
            Some("run_id") => Ok(ctx.run_id.clone()),
            Some("workspace") => Ok(ctx.workspace.clone()),
            Some("event") => Ok(lookup_event_path(ctx, &parts[2..])),
            _ => Ok(String::new()),
        },

        _ => Err(ExpressionError::UnknownContext(expr.to_string())),
    }
}

/// Resolve a dotted path into the event payload, empty when absent
fn lookup_event_path(ctx: &ExecutionContext, path: &[&str]) -> String {
    let Some(payload) = &ctx.event else {
        return String::new();
    };

    let mut current = payload;
    for part in path {
        match current.get(part) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }

    match current {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn evaluate_status_function(expr: &str, ctx: &ExecutionContext) -> Option<bool> {
    match expr {
        "success()" => Some(ctx.is_success()),
        "failure()" => Some(ctx.failed),
        "cancelled()" => Some(ctx.cancelled),
        "always()" => Some(true),
        _ => None,
    }
}

/// Check whether a condition expression evaluates to true
pub fn evaluate_condition(
    condition: &str,
    ctx: &ExecutionContext,
) -> Result<bool, ExpressionError> {
    let condition = strip_wrapper(condition.trim());

    if let Some(value) = evaluate_status_function(condition, ctx) {
        return Ok(value);
    }

    // Equality comparisons evaluate both sides before comparing,
    // e.g. "${{ matrix.os }} == 'linux'".
    if condition.contains("==") {
        let parts: Vec<&str> = condition.split("==").collect();
        if parts.len() == 2 {
            let left =
                evaluate(parts[0].trim(), ctx).unwrap_or_else(|_| parts[0].trim().to_string());
            let right =
                evaluate(parts[1].trim(), ctx).unwrap_or_else(|_| parts[1].trim().to_string());
            return Ok(unquote(&left) == unquote(&right));
        }
    }

    if condition.contains("!=") {
        let parts: Vec<&str> = condition.split("!=").collect();
        if parts.len() == 2 {
            let left =
                evaluate(parts[0].trim(), ctx).unwrap_or_else(|_| parts[0].trim().to_string());
            let right =
                evaluate(parts[1].trim(), ctx).unwrap_or_else(|_| parts[1].trim().to_string());
            return Ok(unquote(&left) != unquote(&right));
        }
    }

    let value = evaluate(condition, ctx)?;
    Ok(is_truthy(&value))
}

/// Unwrap a condition written as a single `${{ ... }}` expression
fn strip_wrapper(condition: &str) -> &str {
    let Some(inner) = condition
        .strip_prefix("${{")
        .and_then(|rest| rest.strip_suffix("}}"))
    else {
        return condition;
    };

    // Only strip when the wrapper spans the whole string.
    if inner.contains("${{") {
        condition
    } else {
        inner.trim()
    }
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"').trim_matches('\'')
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty()
        && value != "false"
        && value != "0"
        && value.to_lowercase() != "null"
}

/// Evaluate all expressions in a map of step/action parameters
pub fn evaluate_params(
    params: &HashMap<String, serde_yaml::Value>,
    ctx: &ExecutionContext,
) -> Result<HashMap<String, String>, ExpressionError> {
    let mut result = HashMap::new();

    for (key, value) in params {
        let string_value = match value {
            serde_yaml::Value::String(s) => evaluate(s, ctx)?,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Null => String::new(),
            _ => serde_yaml::to_string(value).unwrap_or_default(),
        };
        result.insert(key.clone(), string_value);
    }

    Ok(result)
}

/// Evaluate all values in an environment overlay
pub fn evaluate_env(
    env: &HashMap<String, String>,
    ctx: &ExecutionContext,
) -> Result<HashMap<String, String>, ExpressionError> {
    env.iter()
        .map(|(key, value)| Ok((key.clone(), evaluate(value, ctx)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> ExecutionContext {
        let mut ctx = ExecutionContext::default();
        ctx.env
            .insert("TARGET".to_string(), "release".to_string());
        ctx.secrets
            .insert("API_KEY".to_string(), "secret123".to_string());
        ctx.matrix.insert("os".to_string(), "linux".to_string());
        ctx.set_output("build", "artifact", "dist.tar".to_string());
        ctx.needs
            .entry("check".to_string())
            .or_default()
            .insert("status".to_string(), "clean".to_string());
        ctx.event_name = "push".to_string();
        ctx.workspace = "/mnt/c/work/proj".to_string();
        ctx
    }

    #[test]
    fn test_evaluate_env() {
        let ctx = test_context();
        let result = evaluate("build-${{ env.TARGET }}", &ctx).unwrap();
        assert_eq!(result, "build-release");
    }

    #[test]
    fn test_evaluate_secrets() {
        let ctx = test_context();
        let result = evaluate("Bearer ${{ secrets.API_KEY }}", &ctx).unwrap();
        assert_eq!(result, "Bearer secret123");
    }

    #[test]
    fn test_evaluate_matrix() {
        let ctx = test_context();
        let result = evaluate("${{ matrix.os }}", &ctx).unwrap();
        assert_eq!(result, "linux");
    }

    #[test]
    fn test_evaluate_step_and_needs_outputs() {
        let ctx = test_context();
        assert_eq!(
            evaluate("${{ steps.build.outputs.artifact }}", &ctx).unwrap(),
            "dist.tar"
        );
        assert_eq!(
            evaluate("${{ needs.check.outputs.status }}", &ctx).unwrap(),
            "clean"
        );
    }

    #[test]
    fn test_unknown_member_is_empty() {
        let ctx = test_context();
        assert_eq!(evaluate("${{ env.MISSING }}", &ctx).unwrap(), "");
        assert_eq!(
            evaluate("${{ steps.build.outputs.missing }}", &ctx).unwrap(),
            ""
        );
    }

    #[test]
    fn test_unknown_context_is_error() {
        let ctx = test_context();
        assert!(evaluate("${{ nonsense.value }}", &ctx).is_err());
    }

    #[test]
    fn test_github_event_lookup() {
        let mut ctx = test_context();
        ctx.event = Some(serde_json::json!({
            "pull_request": {"base": {"ref": "main"}}
        }));

        assert_eq!(evaluate("${{ github.event_name }}", &ctx).unwrap(), "push");
        assert_eq!(
            evaluate("${{ github.event.pull_request.base.ref }}", &ctx).unwrap(),
            "main"
        );
        assert_eq!(evaluate("${{ github.event.missing.path }}", &ctx).unwrap(), "");
    }

    #[test]
    fn test_condition_equality() {
        let ctx = test_context();
        assert!(evaluate_condition("${{ matrix.os }} == 'linux'", &ctx).unwrap());
        assert!(!evaluate_condition("${{ matrix.os }} == 'windows'", &ctx).unwrap());
        assert!(evaluate_condition("${{ env.MISSING }} != 'set'", &ctx).unwrap());
    }

    #[test]
    fn test_status_functions() {
        let mut ctx = test_context();
        assert!(evaluate_condition("success()", &ctx).unwrap());
        assert!(!evaluate_condition("failure()", &ctx).unwrap());
        assert!(evaluate_condition("always()", &ctx).unwrap());

        ctx.failed = true;
        assert!(!evaluate_condition("success()", &ctx).unwrap());
        assert!(evaluate_condition("failure()", &ctx).unwrap());
        assert!(evaluate_condition("always()", &ctx).unwrap());
        assert!(evaluate_condition("${{ failure() }}", &ctx).unwrap());
    }

    #[test]
    fn test_cancelled_function() {
        let mut ctx = test_context();
        assert!(!evaluate_condition("cancelled()", &ctx).unwrap());
        ctx.cancelled = true;
        assert!(evaluate_condition("cancelled()", &ctx).unwrap());
        assert!(!evaluate_condition("success()", &ctx).unwrap());
    }

    #[test]
    fn test_evaluate_params() {
        let ctx = test_context();
        let mut params = HashMap::new();
        params.insert(
            "path".to_string(),
            serde_yaml::Value::String("${{ env.TARGET }}/out".to_string()),
        );
        params.insert(
            "count".to_string(),
            serde_yaml::Value::Number(serde_yaml::Number::from(3)),
        );

        let evaluated = evaluate_params(&params, &ctx).unwrap();
        assert_eq!(evaluated.get("path"), Some(&"release/out".to_string()));
        assert_eq!(evaluated.get("count"), Some(&"3".to_string()));
    }
}
