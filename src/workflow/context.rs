//! Execution context for a single run
//!
//! Owns the resolved environment, matrix values, step outputs, and dependency
//! outputs visible to one run. Each run's context is built independently and
//! owned exclusively by that run's task; expression evaluation reads from it.

use std::collections::HashMap;

/// Runtime context for expression evaluation within one run
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Environment variables (config, workflow, and job overlays merged)
    pub env: HashMap<String, String>,

    /// Secrets (not logged)
    pub secrets: HashMap<String, String>,

    /// Matrix axis values for this run, stringified
    pub matrix: HashMap<String, String>,

    /// Step outputs (step_id -> output_name -> value)
    pub steps: HashMap<String, HashMap<String, String>>,

    /// Outputs of dependency jobs (job_id -> output_name -> value)
    pub needs: HashMap<String, HashMap<String, String>>,

    /// Name of the triggering event
    pub event_name: String,

    /// Parsed event payload, when one was provided
    pub event: Option<serde_json::Value>,

    /// Plan run ID
    pub run_id: String,

    /// Workspace path as seen from inside the sandbox
    pub workspace: String,

    /// A non-tolerated step has failed in this run
    pub failed: bool,

    /// Cancellation has been observed
    pub cancelled: bool,
}

impl ExecutionContext {
    /// Set a step output
    pub fn set_output(&mut self, step_id: &str, key: &str, value: String) {
        self.steps
            .entry(step_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Get a step output
    pub fn get_output(&self, step_id: &str, key: &str) -> Option<&String> {
        self.steps.get(step_id)?.get(key)
    }

    /// Get an output of a dependency job
    pub fn get_needs_output(&self, job_id: &str, key: &str) -> Option<&String> {
        self.needs.get(job_id)?.get(key)
    }

    /// Merge environment variables from an overlay, overlay wins
    pub fn merge_env(&mut self, env: &HashMap<String, String>) {
        for (key, value) in env {
            self.env.insert(key.clone(), value.clone());
        }
    }

    /// Whether `success()` currently holds for this run
    pub fn is_success(&self) -> bool {
        !self.failed && !self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_outputs() {
        let mut ctx = ExecutionContext::default();
        ctx.set_output("build", "artifact", "dist.tar".to_string());

        assert_eq!(
            ctx.get_output("build", "artifact"),
            Some(&"dist.tar".to_string())
        );
        assert_eq!(ctx.get_output("build", "missing"), None);
        assert_eq!(ctx.get_output("missing", "artifact"), None);
    }

    #[test]
    fn test_needs_outputs() {
        let mut ctx = ExecutionContext::default();
        ctx.needs
            .entry("build".to_string())
            .or_default()
            .insert("version".to_string(), "1.2.3".to_string());

        assert_eq!(
            ctx.get_needs_output("build", "version"),
            Some(&"1.2.3".to_string())
        );
        assert_eq!(ctx.get_needs_output("test", "version"), None);
    }

    #[test]
    fn test_merge_env_overlay_wins() {
        let mut ctx = ExecutionContext::default();
        ctx.env.insert("EXISTING".to_string(), "old".to_string());

        let mut overlay = HashMap::new();
        overlay.insert("EXISTING".to_string(), "new".to_string());
        overlay.insert("ADDED".to_string(), "value".to_string());
        ctx.merge_env(&overlay);

        assert_eq!(ctx.env.get("EXISTING"), Some(&"new".to_string()));
        assert_eq!(ctx.env.get("ADDED"), Some(&"value".to_string()));
    }

    #[test]
    fn test_success_tracking() {
        let mut ctx = ExecutionContext::default();
        assert!(ctx.is_success());

        ctx.failed = true;
        assert!(!ctx.is_success());
    }
}
