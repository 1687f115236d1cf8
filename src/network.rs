use aws_sdk_ec2::{model::Filter, Client, Error};

use crate::error::RuntimeError;

/// `SourceInterface` is the network placement of a mirrored interface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceInterface {
    /// Network interface id
    pub network_interface_id: String,
    /// VPC the interface lives in
    pub vpc_id: String,
    /// Subnet the interface lives in
    pub subnet_id: String,
}

/// `SourceNetwork` is everything needed to wire the source VPC to the
/// transit gateway.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceNetwork {
    /// Source VPC
    pub vpc_id: String,
    /// Subnet used for the transit gateway attachment
    pub subnet_id: String,
    /// Primary CIDR block of the VPC
    pub cidr: String,
    /// Route table that receives the route to the vendor
    pub route_table_id: String,
}

/// Find the primary network interface of an EC2 instance.
#[tracing::instrument(skip(client))]
pub async fn describe_instance(
    client: &Client,
    instance_id: &str,
) -> Result<SourceInterface, RuntimeError> {
    let interface = client
        .describe_instances()
        .instance_ids(instance_id)
        .send()
        .await
        .map_err(Error::from)?
        .reservations
        .unwrap_or_default()
        .into_iter()
        .flat_map(|r| r.instances.unwrap_or_default())
        .flat_map(|i| i.network_interfaces.unwrap_or_default())
        .next()
        .ok_or_else(|| RuntimeError::MissingField("NetworkInterfaces".into()))?;

    Ok(SourceInterface {
        network_interface_id: interface
            .network_interface_id
            .ok_or_else(|| RuntimeError::MissingField("NetworkInterfaceId".into()))?,
        vpc_id: interface
            .vpc_id
            .ok_or_else(|| RuntimeError::MissingField("VpcId".into()))?,
        subnet_id: interface
            .subnet_id
            .ok_or_else(|| RuntimeError::MissingField("SubnetId".into()))?,
    })
}

/// Describe the given network interfaces.
///
/// Fails with [`RuntimeError::InterfaceNotFound`] when the ids are unknown.
#[tracing::instrument(skip(client))]
pub async fn describe_interfaces(
    client: &Client,
    interface_ids: &[String],
) -> Result<Vec<SourceInterface>, RuntimeError> {
    let output = match client
        .describe_network_interfaces()
        .set_network_interface_ids(Some(interface_ids.to_vec()))
        .send()
        .await
    {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(error = %err, "unable to describe network interfaces");
            return Err(RuntimeError::InterfaceNotFound);
        }
    };

    let interfaces: Vec<SourceInterface> = output
        .network_interfaces
        .unwrap_or_default()
        .into_iter()
        .filter_map(|i| {
            Some(SourceInterface {
                network_interface_id: i.network_interface_id?,
                vpc_id: i.vpc_id?,
                subnet_id: i.subnet_id?,
            })
        })
        .collect();

    if interfaces.is_empty() {
        return Err(RuntimeError::InterfaceNotFound);
    }

    Ok(interfaces)
}

/// Primary CIDR block of a VPC.
#[tracing::instrument(skip(client))]
pub async fn vpc_cidr(client: &Client, vpc_id: &str) -> Result<String, RuntimeError> {
    client
        .describe_vpcs()
        .vpc_ids(vpc_id)
        .send()
        .await
        .map_err(Error::from)?
        .vpcs
        .unwrap_or_default()
        .into_iter()
        .find_map(|v| v.cidr_block)
        .ok_or_else(|| RuntimeError::MissingField("CidrBlock".into()))
}

/// Route table used by `subnet_id`: the one explicitly associated with the
/// subnet, or else the main route table of the VPC.
#[tracing::instrument(skip(client))]
pub async fn route_table_for(
    client: &Client,
    vpc_id: &str,
    subnet_id: &str,
) -> Result<String, RuntimeError> {
    let associated = client
        .describe_route_tables()
        .filters(
            Filter::builder()
                .name("association.subnet-id")
                .values(subnet_id)
                .build(),
        )
        .send()
        .await
        .map_err(Error::from)?
        .route_tables
        .unwrap_or_default()
        .into_iter()
        .find_map(|t| t.route_table_id);

    if let Some(route_table_id) = associated {
        return Ok(route_table_id);
    }

    tracing::info!("subnet has no explicit route table, looking for the main one");

    client
        .describe_route_tables()
        .filters(Filter::builder().name("vpc-id").values(vpc_id).build())
        .send()
        .await
        .map_err(Error::from)?
        .route_tables
        .unwrap_or_default()
        .into_iter()
        .find(|t| {
            t.associations
                .as_deref()
                .unwrap_or_default()
                .iter()
                .any(|a| a.main.unwrap_or_default())
        })
        .and_then(|t| t.route_table_id)
        .ok_or(RuntimeError::RouteTableNotFound)
}

/// Resolve the network placement shared by the mirrored interfaces.
#[tracing::instrument(skip(client))]
pub async fn source_network(
    client: &Client,
    interface: &SourceInterface,
) -> Result<SourceNetwork, RuntimeError> {
    let cidr = vpc_cidr(client, &interface.vpc_id).await?;
    tracing::info!(%cidr, "source VPC CIDR block");

    let route_table_id = route_table_for(client, &interface.vpc_id, &interface.subnet_id).await?;

    Ok(SourceNetwork {
        vpc_id: interface.vpc_id.clone(),
        subnet_id: interface.subnet_id.clone(),
        cidr,
        route_table_id,
    })
}
