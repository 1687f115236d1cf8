#![deny(missing_docs)]
//! <fullname>Security monitoring onboarding</fullname>
//!
//! Lambda functions that onboard an account into a security vendor's
//! monitoring: one ships API Gateway execution logs to the vendor's
//! collector, the others mirror network traffic to the vendor through
//! a shared transit gateway.
use aws_sdk_cloudwatchlogs::Client as CwClient;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_eventbridge::Client as EventsClient;
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_ram::Client as RamClient;
use chrono::{DateTime, Duration, Utc};

mod cloudwatch_logs;
use cloudwatch_logs::*;

/// `config` loads the function settings from the environment
pub mod config;
pub use config::{MirrorConfig, Poll, ShipperConfig};

mod error;
pub use error::RuntimeError;

mod event;
pub use event::{LogBatch, LogEntry, LogRow};

/// `insights` groups execution log rows per request
pub mod insights;

/// `mirroring` creates the traffic mirroring resources
pub mod mirroring;
use mirroring::{FilterState, SessionNaming};

/// `network` resolves where the mirrored traffic comes from
pub mod network;
use network::SourceNetwork;

/// `ram` accepts the resources shared by the vendor
pub mod ram;

/// `schedule` keeps the log shipping function on a timer
pub mod schedule;

mod shipper;
pub use shipper::LogShipper;

#[cfg(test)]
mod test_util;

/// Returned when the vendor has not shared anything with the account
pub const NO_SHARED_RESOURCES: &str =
    "Shared resources not found, please contact your security vendor for more information";

/// How far back each scheduled run looks for finished requests
const LOOKBACK_MINUTES: i64 = 13;

/// `ship_api_gateway_logs` is the entry point of the log shipping
/// function. It makes sure the function runs on a schedule, then ships the
/// requests that finished since the previous run.
#[tracing::instrument(skip(logs, events, lambda, shipper, config))]
pub async fn ship_api_gateway_logs(
    logs: &CwClient,
    events: &EventsClient,
    lambda: &LambdaClient,
    shipper: &LogShipper,
    config: &ShipperConfig,
    now: DateTime<Utc>,
) -> Result<String, RuntimeError> {
    let status = schedule::ensure_schedule(
        events,
        lambda,
        &config.function_name,
        &config.schedule_expression,
    )
    .await?;
    tracing::info!(?status, "schedule checked");

    let since = now - Duration::minutes(LOOKBACK_MINUTES);
    let window = QueryWindow::around(since);

    for log_group in list_log_groups(logs, &config.log_group_prefix).await? {
        let rows = run_query(logs, &log_group, window, insights::QUERY, Poll::QUERY).await?;
        let batch = insights::group_rows(&log_group, &rows, since);
        shipper.ship(&batch).await?;
    }

    Ok("success".into())
}

/// `mirror_instance_traffic` is the entry point of the instance variant:
/// it mirrors the primary interface of `instance_id`.
/// A missing route table is reported back to the caller as a message.
#[tracing::instrument(skip(ec2, ram, config))]
pub async fn mirror_instance_traffic(
    ec2: &Ec2Client,
    ram: &RamClient,
    config: &MirrorConfig,
    instance_id: &str,
) -> Result<String, RuntimeError> {
    let interface = network::describe_instance(ec2, instance_id).await?;
    let source = match network::source_network(ec2, &interface).await {
        Ok(source) => source,
        Err(err @ RuntimeError::RouteTableNotFound) => return Ok(err.to_string()),
        Err(err) => return Err(err),
    };

    install_mirroring(
        ec2,
        ram,
        config,
        &source,
        &[interface.network_interface_id],
        SessionNaming::Single,
    )
    .await
}

/// `mirror_interface_traffic` is the entry point of the load balancer
/// variant: it mirrors every interface in `interface_ids`.
/// Lookup failures are reported back to the caller as a message.
#[tracing::instrument(skip(ec2, ram, config))]
pub async fn mirror_interface_traffic(
    ec2: &Ec2Client,
    ram: &RamClient,
    config: &MirrorConfig,
    interface_ids: &[String],
) -> Result<String, RuntimeError> {
    let source = match discover_interfaces(ec2, interface_ids).await {
        Ok(source) => source,
        Err(err @ RuntimeError::InterfaceNotFound) | Err(err @ RuntimeError::RouteTableNotFound) => {
            return Ok(err.to_string())
        }
        Err(err) => return Err(err),
    };

    install_mirroring(ec2, ram, config, &source, interface_ids, SessionNaming::Counted).await
}

async fn discover_interfaces(
    ec2: &Ec2Client,
    interface_ids: &[String],
) -> Result<SourceNetwork, RuntimeError> {
    let interfaces = network::describe_interfaces(ec2, interface_ids).await?;
    // all interfaces sit behind the same load balancer, the first one is representative
    let first = interfaces.first().ok_or(RuntimeError::InterfaceNotFound)?;
    network::source_network(ec2, first).await
}

async fn install_mirroring(
    ec2: &Ec2Client,
    ram: &RamClient,
    config: &MirrorConfig,
    source: &SourceNetwork,
    interface_ids: &[String],
    naming: SessionNaming,
) -> Result<String, RuntimeError> {
    let shares = ram::accept_invitations(ram, &config.trusted_account).await?;
    let shared = match ram::wait_for_shared_resources(ram, &shares, Poll::SHARED_RESOURCES).await? {
        Some(shared) => shared,
        None => return Ok(NO_SHARED_RESOURCES.into()),
    };

    mirroring::attach_vpc(ec2, &shared.transit_gateway_id, source).await;

    match mirroring::ensure_filter(ec2, Poll::FILTER_RULES).await? {
        FilterState::Created(filter_id) => {
            mirroring::create_sessions(
                ec2,
                &shared.mirror_target_id,
                &filter_id,
                interface_ids,
                naming,
            )
            .await?;
        }
        FilterState::Existing(_) => {
            tracing::info!("mirror sessions were created by an earlier run");
        }
    }

    Ok(mirroring::add_route(
        ec2,
        &source.route_table_id,
        &config.route_destination,
        &shared.transit_gateway_id,
    )
    .await)
}
