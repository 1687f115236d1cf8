use aws_sdk_ec2::Credentials;
use aws_smithy_client::{erase::DynConnector, test_connection::TestConnection};
use aws_smithy_http::body::SdkBody;
use aws_types::{region::Region, SdkConfig};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

/// Configuration for mocking AWS SDK clients
pub async fn get_mock_config() -> SdkConfig {
    aws_config::from_env()
        .region(Region::new("us-west-1"))
        .credentials_provider(Credentials::new(
            "accesskey",
            "privatekey",
            None,
            None,
            "dummy",
        ))
        .load()
        .await
}

/// Base request builder for the AWS SDK calls
pub fn get_request_builder(service: &str) -> http::request::Builder {
    http::Request::builder().uri(format!("https://{service}.us-west-1.amazonaws.com/"))
}

/// EC2 speaks the query protocol, so tests only replay XML responses
/// and count the requests instead of matching bodies.
pub fn ec2_response(
    status: u16,
    body: &'static str,
) -> (http::Request<SdkBody>, http::Response<SdkBody>) {
    (
        get_request_builder("ec2").body(SdkBody::from("")).unwrap(),
        http::Response::builder()
            .status(status)
            .header("content-type", "text/xml;charset=UTF-8")
            .body(SdkBody::from(body))
            .unwrap(),
    )
}

/// EC2 client replaying `events` in order
pub async fn ec2_client(
    events: Vec<(http::Request<SdkBody>, http::Response<SdkBody>)>,
) -> (aws_sdk_ec2::Client, TestConnection<SdkBody>) {
    let conn = TestConnection::new(events);
    let config = aws_sdk_ec2::Config::new(&get_mock_config().await);
    let client = aws_sdk_ec2::Client::from_conf_conn(config, DynConnector::new(conn.clone()));
    (client, conn)
}

/// Local HTTP collector answering one request per entry of `statuses`.
///
/// Returns the endpoint to post to and a handle yielding the JSON bodies
/// received, in order, once every status was served.
pub async fn collector(statuses: Vec<u16>) -> (String, JoinHandle<Vec<serde_json::Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/collect", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut bodies = Vec::new();
        for status in statuses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let body = read_request_body(&mut socket).await;
            bodies.push(serde_json::from_slice(&body).unwrap());

            let response = format!(
                "HTTP/1.1 {} Collector\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                status
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
        bodies
    });

    (endpoint, handle)
}

async fn read_request_body(socket: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        assert!(read > 0, "connection closed before the body was read");
        buf.extend_from_slice(&chunk[..read]);

        let head_end = match buf.windows(4).position(|w| w == b"\r\n\r\n") {
            Some(pos) => pos + 4,
            None => continue,
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        if buf.len() >= head_end + length {
            return buf[head_end..head_end + length].to_vec();
        }
    }
}

// EC2 query protocol responses replayed by the tests

pub const INSTANCES: &str = r#"<DescribeInstancesResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <reservationSet>
        <item>
            <reservationId>r-0123</reservationId>
            <instancesSet>
                <item>
                    <instanceId>i-0123</instanceId>
                    <networkInterfaceSet>
                        <item>
                            <networkInterfaceId>eni-0123</networkInterfaceId>
                            <subnetId>subnet-0123</subnetId>
                            <vpcId>vpc-0123</vpcId>
                        </item>
                    </networkInterfaceSet>
                </item>
            </instancesSet>
        </item>
    </reservationSet>
</DescribeInstancesResponse>"#;

pub const VPCS: &str = r#"<DescribeVpcsResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <vpcSet>
        <item>
            <vpcId>vpc-0123</vpcId>
            <cidrBlock>10.0.0.0/16</cidrBlock>
        </item>
    </vpcSet>
</DescribeVpcsResponse>"#;

pub const NO_ROUTE_TABLES: &str = r#"<DescribeRouteTablesResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <routeTableSet/>
</DescribeRouteTablesResponse>"#;

pub const SUBNET_ROUTE_TABLE: &str = r#"<DescribeRouteTablesResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <routeTableSet>
        <item>
            <routeTableId>rtb-subnet</routeTableId>
            <vpcId>vpc-0123</vpcId>
        </item>
    </routeTableSet>
</DescribeRouteTablesResponse>"#;

pub const VPC_ROUTE_TABLES: &str = r#"<DescribeRouteTablesResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <routeTableSet>
        <item>
            <routeTableId>rtb-custom</routeTableId>
            <vpcId>vpc-0123</vpcId>
            <associationSet>
                <item>
                    <routeTableAssociationId>rtbassoc-custom</routeTableAssociationId>
                    <routeTableId>rtb-custom</routeTableId>
                    <subnetId>subnet-other</subnetId>
                    <main>false</main>
                </item>
            </associationSet>
        </item>
        <item>
            <routeTableId>rtb-main</routeTableId>
            <vpcId>vpc-0123</vpcId>
            <associationSet>
                <item>
                    <routeTableAssociationId>rtbassoc-main</routeTableAssociationId>
                    <routeTableId>rtb-main</routeTableId>
                    <main>true</main>
                </item>
            </associationSet>
        </item>
    </routeTableSet>
</DescribeRouteTablesResponse>"#;

pub const INTERFACE_NOT_FOUND: &str = r#"<Response>
    <Errors>
        <Error>
            <Code>InvalidNetworkInterfaceID.NotFound</Code>
            <Message>The networkInterface ID 'eni-missing' does not exist</Message>
        </Error>
    </Errors>
    <RequestID>req</RequestID>
</Response>"#;

pub const NO_FILTERS: &str = r#"<DescribeTrafficMirrorFiltersResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <trafficMirrorFilterSet/>
</DescribeTrafficMirrorFiltersResponse>"#;

pub const EXISTING_FILTER: &str = r#"<DescribeTrafficMirrorFiltersResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <trafficMirrorFilterSet>
        <item>
            <trafficMirrorFilterId>tmf-existing</trafficMirrorFilterId>
            <description>security traffic mirror filter</description>
        </item>
    </trafficMirrorFilterSet>
</DescribeTrafficMirrorFiltersResponse>"#;

pub const CREATED_FILTER: &str = r#"<CreateTrafficMirrorFilterResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <trafficMirrorFilter>
        <trafficMirrorFilterId>tmf-new</trafficMirrorFilterId>
        <description>security traffic mirror filter</description>
    </trafficMirrorFilter>
    <clientToken>token</clientToken>
</CreateTrafficMirrorFilterResponse>"#;

pub const CREATED_RULE: &str = r#"<CreateTrafficMirrorFilterRuleResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <trafficMirrorFilterRule>
        <trafficMirrorFilterRuleId>tmfr-0123</trafficMirrorFilterRuleId>
        <trafficMirrorFilterId>tmf-new</trafficMirrorFilterId>
    </trafficMirrorFilterRule>
    <clientToken>token</clientToken>
</CreateTrafficMirrorFilterRuleResponse>"#;

pub const FILTER_NOT_FOUND: &str = r#"<Response>
    <Errors>
        <Error>
            <Code>InvalidTrafficMirrorFilterId.NotFound</Code>
            <Message>The traffic mirror filter 'tmf-new' does not exist.</Message>
        </Error>
    </Errors>
    <RequestID>req</RequestID>
</Response>"#;

pub const ATTACHMENT: &str = r#"<CreateTransitGatewayVpcAttachmentResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <transitGatewayVpcAttachment>
        <transitGatewayAttachmentId>tgw-attach-0123</transitGatewayAttachmentId>
        <transitGatewayId>tgw-0abc</transitGatewayId>
        <vpcId>vpc-0123</vpcId>
        <state>pending</state>
    </transitGatewayVpcAttachment>
</CreateTransitGatewayVpcAttachmentResponse>"#;

pub const DUPLICATE_ATTACHMENT: &str = r#"<Response>
    <Errors>
        <Error>
            <Code>DuplicateTransitGatewayAttachment</Code>
            <Message>tgw-0abc has non-deleted Transit Gateway Attachments with same VPC ID.</Message>
        </Error>
    </Errors>
    <RequestID>req</RequestID>
</Response>"#;

pub const SESSION_ONE: &str = r#"<CreateTrafficMirrorSessionResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <trafficMirrorSession>
        <trafficMirrorSessionId>tms-1</trafficMirrorSessionId>
    </trafficMirrorSession>
    <clientToken>token</clientToken>
</CreateTrafficMirrorSessionResponse>"#;

pub const SESSION_TWO: &str = r#"<CreateTrafficMirrorSessionResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <trafficMirrorSession>
        <trafficMirrorSessionId>tms-2</trafficMirrorSessionId>
    </trafficMirrorSession>
    <clientToken>token</clientToken>
</CreateTrafficMirrorSessionResponse>"#;

pub const ROUTE_CREATED: &str = r#"<CreateRouteResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <return>true</return>
</CreateRouteResponse>"#;

pub const ATTACHMENT_PENDING: &str = r#"<Response>
    <Errors>
        <Error>
            <Code>InvalidTransitGatewayID.NotFound</Code>
            <Message>The transitGateway ID 'tgw-0abc' does not exist.</Message>
        </Error>
    </Errors>
    <RequestID>req</RequestID>
</Response>"#;

pub const INTERFACES: &str = r#"<DescribeNetworkInterfacesResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <networkInterfaceSet>
        <item>
            <networkInterfaceId>eni-1</networkInterfaceId>
            <subnetId>subnet-0123</subnetId>
            <vpcId>vpc-0123</vpcId>
        </item>
    </networkInterfaceSet>
</DescribeNetworkInterfacesResponse>"#;

pub const NO_INTERFACES: &str = r#"<DescribeNetworkInterfacesResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <networkInterfaceSet/>
</DescribeNetworkInterfacesResponse>"#;

pub const FILTER_DELETED: &str = r#"<DeleteTrafficMirrorFilterResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <trafficMirrorFilterId>tmf-new</trafficMirrorFilterId>
</DeleteTrafficMirrorFilterResponse>"#;
