use aws_sdk_eventbridge::{
    model::{RuleState, Target},
    Client as EventsClient,
};
use aws_sdk_lambda::Client as LambdaClient;

use crate::error::RuntimeError;

const TARGET_ID: &str = "security-logs-event-target";
const RULE_DESCRIPTION: &str = "rule for running security logs shipping";
const EVENTS_PRINCIPAL: &str = "events.amazonaws.com";

/// Outcome of [`ensure_schedule`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleStatus {
    /// A rule already targets the function
    AlreadyInstalled,
    /// A new rule was created and wired to the function
    Installed {
        /// ARN of the new rule
        rule_arn: String,
    },
}

/// Make sure a scheduled EventBridge rule invokes `function_name`.
#[tracing::instrument(skip(events, lambda))]
pub async fn ensure_schedule(
    events: &EventsClient,
    lambda: &LambdaClient,
    function_name: &str,
    schedule_expression: &str,
) -> Result<ScheduleStatus, RuntimeError> {
    let function_arn = lambda
        .get_function()
        .function_name(function_name)
        .send()
        .await
        .map_err(aws_sdk_lambda::Error::from)?
        .configuration
        .and_then(|c| c.function_arn)
        .ok_or_else(|| RuntimeError::MissingFunction(function_name.into()))?;

    let existing = events
        .list_rule_names_by_target()
        .target_arn(&function_arn)
        .send()
        .await
        .map_err(aws_sdk_eventbridge::Error::from)?
        .rule_names
        .unwrap_or_default();

    if !existing.is_empty() {
        tracing::info!(rules = ?existing, "schedule already installed");
        return Ok(ScheduleStatus::AlreadyInstalled);
    }

    let rule_name = format!("{}-rule", function_name);
    tracing::info!(%rule_name, "creating schedule rule");

    let rule_arn = events
        .put_rule()
        .name(&rule_name)
        .schedule_expression(schedule_expression)
        .state(RuleState::Enabled)
        .description(RULE_DESCRIPTION)
        .send()
        .await
        .map_err(aws_sdk_eventbridge::Error::from)?
        .rule_arn
        .ok_or_else(|| RuntimeError::MissingField("RuleArn".into()))?;

    let failed = events
        .put_targets()
        .rule(&rule_name)
        .targets(Target::builder().arn(&function_arn).id(TARGET_ID).build())
        .send()
        .await
        .map_err(aws_sdk_eventbridge::Error::from)?
        .failed_entries
        .unwrap_or_default();

    if let Some(entry) = failed.into_iter().next() {
        return Err(RuntimeError::ScheduleTarget(
            entry.error_message.unwrap_or_else(|| rule_name.clone()),
        ));
    }

    lambda
        .add_permission()
        .function_name(function_name)
        .statement_id(format!("AWS_Event_{}", uuid::Uuid::new_v4()))
        .action("lambda:InvokeFunction")
        .principal(EVENTS_PRINCIPAL)
        .source_arn(&rule_arn)
        .send()
        .await
        .map_err(aws_sdk_lambda::Error::from)?;

    Ok(ScheduleStatus::Installed { rule_arn })
}
