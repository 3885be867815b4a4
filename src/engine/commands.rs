//! Workflow commands
//!
//! Steps talk back to the engine through `::command::` lines on stdout:
//!
//! ```text
//! ::set-output name=version::1.2.3
//! ::set-env name=TARGET::release
//! ::add-mask::hunter2
//! ```
//!
//! Unknown commands are ignored so ordinary output can never break a step.

use std::collections::HashMap;

/// A recognized workflow command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowCommand {
    SetOutput { name: String, value: String },
    SetEnv { name: String, value: String },
    AddMask { value: String },
}

/// Extract all workflow commands from captured step output
pub fn parse_commands(stdout: &str) -> Vec<WorkflowCommand> {
    stdout.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<WorkflowCommand> {
    let rest = line.trim().strip_prefix("::")?;
    let (head, value) = rest.split_once("::")?;

    let mut head_parts = head.splitn(2, ' ');
    let command = head_parts.next()?;
    let properties = parse_properties(head_parts.next().unwrap_or(""));

    match command {
        "set-output" => Some(WorkflowCommand::SetOutput {
            name: properties.get("name")?.to_string(),
            value: value.to_string(),
        }),
        "set-env" => Some(WorkflowCommand::SetEnv {
            name: properties.get("name")?.to_string(),
            value: value.to_string(),
        }),
        "add-mask" => Some(WorkflowCommand::AddMask {
            value: value.to_string(),
        }),
        _ => None,
    }
}

fn parse_properties(raw: &str) -> HashMap<&str, &str> {
    raw.split(',')
        .filter_map(|pair| pair.trim().split_once('='))
        .collect()
}

/// Redact masked values from a line before it reaches any log or observer
pub fn mask(text: &str, masks: &[String]) -> String {
    let mut masked = text.to_string();
    for value in masks {
        if !value.is_empty() {
            masked = masked.replace(value, "***");
        }
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_output() {
        let commands = parse_commands("::set-output name=version::1.2.3\n");
        assert_eq!(
            commands,
            vec![WorkflowCommand::SetOutput {
                name: "version".to_string(),
                value: "1.2.3".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_set_env_and_mask() {
        let stdout = "building...\n::set-env name=TARGET::release\n::add-mask::hunter2\ndone\n";
        let commands = parse_commands(stdout);
        assert_eq!(
            commands,
            vec![
                WorkflowCommand::SetEnv {
                    name: "TARGET".to_string(),
                    value: "release".to_string(),
                },
                WorkflowCommand::AddMask {
                    value: "hunter2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_unknown_and_plain_lines_are_ignored() {
        assert!(parse_commands("::group::build logs\nplain output\n").is_empty());
        assert!(parse_commands("::set-output missing-props::x").is_empty());
    }

    #[test]
    fn test_value_can_contain_colons() {
        let commands = parse_commands("::set-output name=url::https://example.com:8443/x\n");
        assert_eq!(
            commands,
            vec![WorkflowCommand::SetOutput {
                name: "url".to_string(),
                value: "https://example.com:8443/x".to_string(),
            }]
        );
    }

    #[test]
    fn test_mask_redacts_all_occurrences() {
        let masks = vec!["hunter2".to_string()];
        assert_eq!(
            mask("token hunter2 again hunter2", &masks),
            "token *** again ***"
        );
        assert_eq!(mask("no secrets here", &masks), "no secrets here");
    }
}
