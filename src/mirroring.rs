use aws_sdk_ec2::{
    model::{Filter, TrafficDirection, TrafficMirrorRuleAction},
    Client, Error,
};

use crate::{config::Poll, error::RuntimeError, network::SourceNetwork};

const FILTER_DESCRIPTION: &str = "security traffic mirror filter";
const SESSION_DESCRIPTION: &str = "security traffic mirror session";
const ANY_CIDR: &str = "0.0.0.0/0";
const RULE_NUMBER: i32 = 100;
const TCP: i32 = 6;

/// Message returned once the route to the vendor is in place
pub const INSTALLED: &str = "traffic mirroring integration installed successfully";
/// Message returned while the vendor has not accepted the attachment yet
pub const RETRY_LATER: &str =
    "Wait until your security vendor accepts the transit gateway attachment and then run the lambda again";

/// Outcome of [`ensure_filter`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterState {
    /// The filter was created by an earlier run
    Existing(String),
    /// The filter and its rules were created now
    Created(String),
}

/// How mirror sessions are numbered and described
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionNaming {
    /// Session number 1 with a plain description
    Single,
    /// Session number 10 with a counter in the description
    Counted,
}

impl SessionNaming {
    fn session_number(self) -> i32 {
        match self {
            SessionNaming::Single => 1,
            SessionNaming::Counted => 10,
        }
    }

    fn description(self, position: usize) -> String {
        match self {
            SessionNaming::Single => SESSION_DESCRIPTION.to_string(),
            SessionNaming::Counted => format!("{} {}", SESSION_DESCRIPTION, position),
        }
    }
}

/// Find the accept-all traffic mirror filter, creating it with its rules
/// when it does not exist.
#[tracing::instrument(skip(client, poll))]
pub async fn ensure_filter(client: &Client, poll: Poll) -> Result<FilterState, RuntimeError> {
    let existing = client
        .describe_traffic_mirror_filters()
        .filters(
            Filter::builder()
                .name("description")
                .values(FILTER_DESCRIPTION)
                .build(),
        )
        .send()
        .await
        .map_err(Error::from)?
        .traffic_mirror_filters
        .unwrap_or_default()
        .into_iter()
        .find_map(|f| f.traffic_mirror_filter_id);

    if let Some(filter_id) = existing {
        tracing::info!(%filter_id, "traffic mirror filter already exists");
        return Ok(FilterState::Existing(filter_id));
    }

    let filter_id = client
        .create_traffic_mirror_filter()
        .description(FILTER_DESCRIPTION)
        .send()
        .await
        .map_err(Error::from)?
        .traffic_mirror_filter
        .and_then(|f| f.traffic_mirror_filter_id)
        .ok_or_else(|| RuntimeError::MissingField("TrafficMirrorFilterId".into()))?;
    tracing::info!(%filter_id, "created traffic mirror filter");

    if let Err(err) = create_filter_rules(client, &filter_id, poll).await {
        // a filter left without rules would be reused as Existing by the next run
        remove_filter(client, &filter_id).await;
        return Err(err);
    }

    Ok(FilterState::Created(filter_id))
}

async fn create_filter_rules(
    client: &Client,
    filter_id: &str,
    poll: Poll,
) -> Result<(), RuntimeError> {
    create_filter_rule(client, filter_id, TrafficDirection::Ingress, poll).await?;
    create_filter_rule(client, filter_id, TrafficDirection::Egress, poll).await?;
    Ok(())
}

async fn remove_filter(client: &Client, filter_id: &str) {
    tracing::warn!(%filter_id, "removing traffic mirror filter without rules");

    let res = client
        .delete_traffic_mirror_filter()
        .traffic_mirror_filter_id(filter_id)
        .send()
        .await;

    if let Err(err) = res {
        tracing::warn!(
            %filter_id,
            error = %err,
            "unable to remove traffic mirror filter, delete it before running the lambda again"
        );
    }
}

/// A new filter is not always visible right away, so rule creation is retried.
async fn create_filter_rule(
    client: &Client,
    filter_id: &str,
    direction: TrafficDirection,
    poll: Poll,
) -> Result<String, RuntimeError> {
    for _ in 0..poll.max_attempts {
        let res = client
            .create_traffic_mirror_filter_rule()
            .traffic_mirror_filter_id(filter_id)
            .traffic_direction(direction.clone())
            .rule_number(RULE_NUMBER)
            .rule_action(TrafficMirrorRuleAction::Accept)
            .protocol(TCP)
            .destination_cidr_block(ANY_CIDR)
            .source_cidr_block(ANY_CIDR)
            .send()
            .await;

        match res {
            Ok(output) => {
                return output
                    .traffic_mirror_filter_rule
                    .and_then(|r| r.traffic_mirror_filter_rule_id)
                    .ok_or_else(|| RuntimeError::MissingField("TrafficMirrorFilterRuleId".into()))
            }
            Err(err) => {
                tracing::warn!(direction = direction.as_str(), error = %err, "filter rule not created yet");
                tokio::time::sleep(poll.interval).await;
            }
        }
    }

    Err(RuntimeError::PollExhausted(format!(
        "{} rule of filter {}",
        direction.as_str(),
        filter_id
    )))
}

/// Attach the source VPC to the shared transit gateway.
///
/// Failures are only logged: the attachment usually exists from an earlier run.
#[tracing::instrument(skip(client))]
pub async fn attach_vpc(
    client: &Client,
    transit_gateway_id: &str,
    network: &SourceNetwork,
) -> Option<String> {
    let res = client
        .create_transit_gateway_vpc_attachment()
        .transit_gateway_id(transit_gateway_id)
        .vpc_id(&network.vpc_id)
        .subnet_ids(&network.subnet_id)
        .send()
        .await;

    match res {
        Ok(output) => {
            let attachment = output
                .transit_gateway_vpc_attachment
                .and_then(|a| a.transit_gateway_attachment_id);
            tracing::info!(attachment = ?attachment, "created transit gateway attachment");
            attachment
        }
        Err(err) => {
            tracing::warn!(error = %err, "transit gateway attachment not created");
            None
        }
    }
}

/// Create one mirror session per source interface.
#[tracing::instrument(skip(client))]
pub async fn create_sessions(
    client: &Client,
    mirror_target_id: &str,
    filter_id: &str,
    interface_ids: &[String],
    naming: SessionNaming,
) -> Result<Vec<String>, RuntimeError> {
    let mut sessions = Vec::with_capacity(interface_ids.len());

    for (idx, interface_id) in interface_ids.iter().enumerate() {
        tracing::info!(%interface_id, "creating traffic mirror session");
        let session = client
            .create_traffic_mirror_session()
            .network_interface_id(interface_id)
            .traffic_mirror_target_id(mirror_target_id)
            .traffic_mirror_filter_id(filter_id)
            .session_number(naming.session_number())
            .description(naming.description(idx + 1))
            .send()
            .await
            .map_err(Error::from)?
            .traffic_mirror_session
            .and_then(|s| s.traffic_mirror_session_id)
            .ok_or_else(|| RuntimeError::MissingField("TrafficMirrorSessionId".into()))?;
        sessions.push(session);
    }

    Ok(sessions)
}

/// Route the vendor destination through the transit gateway.
///
/// The call fails until the vendor accepts the attachment, so the outcome is
/// reported as a message instead of an error.
#[tracing::instrument(skip(client))]
pub async fn add_route(
    client: &Client,
    route_table_id: &str,
    destination_cidr: &str,
    transit_gateway_id: &str,
) -> String {
    let res = client
        .create_route()
        .destination_cidr_block(destination_cidr)
        .transit_gateway_id(transit_gateway_id)
        .route_table_id(route_table_id)
        .send()
        .await;

    match res {
        Ok(_) => INSTALLED.to_string(),
        Err(err) => {
            tracing::warn!(error = %err, "route not created");
            RETRY_LATER.to_string()
        }
    }
}
