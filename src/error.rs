use thiserror::Error as ThisError;

/// Different errors that the application can raise
#[derive(Debug, ThisError)]
pub enum RuntimeError {
    /// Error returned when a required environment variable is not set
    #[error("missing environment variable {0}")]
    MissingEnv(String),
    /// Error returned when we cannot find the function to schedule
    #[error("unable to find function information for {0}")]
    MissingFunction(String),
    /// Error returned if a provider response is missing an expected field
    #[error("missing response field {0}")]
    MissingField(String),
    /// Error returned if EventBridge refuses to register the function as a target
    #[error("failed to register schedule target: {0}")]
    ScheduleTarget(String),
    /// Error returned when a Logs Insights query does not complete
    #[error("query {query_id} finished with status {status}")]
    QueryFailed {
        /// Insights query id
        query_id: String,
        /// Final query status
        status: String,
    },
    /// Error returned when a polling loop runs out of attempts
    #[error("gave up waiting for {0}")]
    PollExhausted(String),
    /// Error returned when the configured network interfaces cannot be described
    #[error("Couldn't find network interface, please make sure that the network interface ids are correct")]
    InterfaceNotFound,
    /// Error returned when neither a subnet nor a main route table exists
    #[error("There was an error finding your route table id, please contact your security vendor")]
    RouteTableNotFound,
    /// Error returned by the CloudWatch Logs API
    #[error("unexpected cloudwatch logs error")]
    CloudWatchLogs(#[from] aws_sdk_cloudwatchlogs::Error),
    /// Error returned by the EventBridge API
    #[error("unexpected eventbridge error")]
    EventBridge(#[from] aws_sdk_eventbridge::Error),
    /// Error returned by the Lambda API
    #[error("unexpected lambda error")]
    Lambda(#[from] aws_sdk_lambda::Error),
    /// Error returned by the Resource Access Manager API
    #[error("unexpected resource access manager error")]
    Ram(#[from] aws_sdk_ram::Error),
    /// Error returned by the EC2 API
    #[error("unexpected ec2 error")]
    Ec2(#[from] aws_sdk_ec2::Error),
    /// Error returned when shipping logs to the collector endpoint
    #[error("failed to ship logs")]
    Http(#[from] reqwest::Error),
}
