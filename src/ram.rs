use aws_sdk_ram::{
    model::{Resource, ResourceOwner, ResourceShareInvitationStatus},
    Client, Error,
};

use crate::{config::Poll, error::RuntimeError};

const TRANSIT_GATEWAY_TYPE: &str = "ec2:TransitGateway";
const MIRROR_TARGET_TYPE: &str = "ec2:TrafficMirrorTarget";

/// `SharedResources` holds the identifiers shared by the security vendor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedResources {
    /// Transit gateway to attach the source VPC to
    pub transit_gateway_id: String,
    /// Traffic mirror target that receives the mirrored packets
    pub mirror_target_id: String,
}

/// Accept every pending invitation sent by `trusted_account` and return the
/// resource share ARNs it sent, accepted or not.
#[tracing::instrument(skip(client))]
pub async fn accept_invitations(
    client: &Client,
    trusted_account: &str,
) -> Result<Vec<String>, RuntimeError> {
    let mut shares = Vec::new();
    let mut next_token = None;

    loop {
        let output = client
            .get_resource_share_invitations()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(Error::from)?;

        for invitation in output.resource_share_invitations.unwrap_or_default() {
            if invitation.sender_account_id.as_deref() != Some(trusted_account) {
                continue;
            }

            if invitation.status != Some(ResourceShareInvitationStatus::Accepted) {
                if let Some(arn) = invitation.resource_share_invitation_arn.as_deref() {
                    tracing::info!(invitation = arn, "accepting resource share invitation");
                    client
                        .accept_resource_share_invitation()
                        .resource_share_invitation_arn(arn)
                        .send()
                        .await
                        .map_err(Error::from)?;
                }
            }

            if let Some(share) = invitation.resource_share_arn {
                shares.push(share);
            }
        }

        next_token = output.next_token;
        if next_token.is_none() {
            break;
        }
    }

    Ok(shares)
}

/// Wait until both the transit gateway and the mirror target of the shares
/// are visible in this account.
///
/// Returns `None` when there is nothing shared by the trusted account.
#[tracing::instrument(skip(client, poll))]
pub async fn wait_for_shared_resources(
    client: &Client,
    share_arns: &[String],
    poll: Poll,
) -> Result<Option<SharedResources>, RuntimeError> {
    if share_arns.is_empty() {
        return Ok(None);
    }

    for _ in 0..poll.max_attempts {
        let resources = client
            .list_resources()
            .resource_owner(ResourceOwner::OtherAccounts)
            .set_resource_share_arns(Some(share_arns.to_vec()))
            .send()
            .await
            .map_err(Error::from)?
            .resources
            .unwrap_or_default();

        if let Some(shared) = find_shared(&resources) {
            tracing::info!(
                transit_gateway = %shared.transit_gateway_id,
                mirror_target = %shared.mirror_target_id,
                "shared resources are visible"
            );
            return Ok(Some(shared));
        }

        tokio::time::sleep(poll.interval).await;
    }

    Err(RuntimeError::PollExhausted("shared resources".into()))
}

fn find_shared(resources: &[Resource]) -> Option<SharedResources> {
    let id_of = |kind: &str| {
        resources
            .iter()
            .find(|r| r.r#type.as_deref() == Some(kind))
            .and_then(|r| r.arn.as_deref())
            .and_then(resource_id)
    };

    Some(SharedResources {
        transit_gateway_id: id_of(TRANSIT_GATEWAY_TYPE)?,
        mirror_target_id: id_of(MIRROR_TARGET_TYPE)?,
    })
}

/// `arn:aws:ec2:eu-central-1:123456789012:transit-gateway/tgw-0abc` -> `tgw-0abc`
fn resource_id(arn: &str) -> Option<String> {
    arn.split('/').nth(1).map(String::from)
}
