//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from wsp-core.

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use bytes::Bytes;
use wsp_core::{Error, ListingPage, ObjectStore, Result, StoreConfig};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    max_keys: Option<i32>,
}

impl S3Client {
    /// Create a new S3 client from store configuration
    ///
    /// Credentials are taken as configured; empty values are not rejected
    /// here and surface as authorization errors on the first request.
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None, // session token
            None, // expiry
            "wsp-static-credentials",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            validate_endpoint(endpoint)?;
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            region = %config.region,
            "Created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            max_keys: config.max_keys,
        })
    }
}

/// Reject endpoints that are not absolute http(s) URLs
fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| Error::Config(format!("Invalid endpoint '{endpoint}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::Config(format!(
            "Invalid endpoint '{endpoint}': unsupported scheme '{scheme}'"
        ))),
    }
}

/// Build the CopySource header value: bucket and URL-encoded key
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{bucket}/{}", encoded.join("/"))
}

/// Map an SDK error onto the core error taxonomy
fn classify_sdk_error<E>(error: &SdkError<E>, subject: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error {
        SdkError::ServiceError(service_err) => {
            let err = service_err.err();
            classify_service_error(
                err.code(),
                service_err.raw().status().as_u16(),
                err.message().unwrap_or_default(),
                subject,
            )
        }
        SdkError::TimeoutError(_) => Error::Network("Request timeout".to_string()),
        SdkError::DispatchFailure(err) => Error::Network(format!("Network dispatch error: {err:?}")),
        SdkError::ResponseError(err) => Error::General(format!("Malformed response: {err:?}")),
        SdkError::ConstructionFailure(err) => {
            Error::General(format!("Request construction failed: {err:?}"))
        }
        _ => Error::Network(error.to_string()),
    }
}

/// Classify a service error response by S3 error code, then HTTP status
fn classify_service_error(code: Option<&str>, status: u16, message: &str, subject: &str) -> Error {
    let code = code.unwrap_or("Unknown");
    let detail = format!("{code} (status {status}): {message}");

    match code {
        "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken"
        | "InvalidToken" => Error::Auth(detail),
        "NoSuchBucket" | "NoSuchKey" | "NotFound" => Error::NotFound(format!("{subject}: {detail}")),
        _ if status == 401 || status == 403 => Error::Auth(detail),
        _ => Error::Network(format!("Service error: {detail}")),
    }
}

/// Convert a ListObjectsV2 response into a listing page
///
/// Entries without a key are skipped. A missing `IsTruncated` means the
/// listing is complete.
fn listing_page(response: &ListObjectsV2Output) -> ListingPage {
    let keys = response
        .contents()
        .iter()
        .filter_map(|object| object.key())
        .map(str::to_string)
        .collect();

    ListingPage {
        keys,
        truncated: response.is_truncated().unwrap_or(false),
        next_cursor: response.next_continuation_token().map(str::to_string),
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        cursor: Option<String>,
    ) -> Result<ListingPage> {
        let mut request = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(cursor);

        if let Some(max) = self.max_keys {
            request = request.max_keys(max);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, bucket))?;

        Ok(listing_page(&response))
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(copy_source(bucket, source_key))
            .bucket(bucket)
            .key(destination_key)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, source_key))?;

        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        payload: Bytes,
        content_type: Option<String>,
    ) -> Result<()> {
        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(payload))
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, key))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
    use aws_sdk_s3::types::Object;
    use wsp_core::is_retryable_error;

    #[test]
    fn test_copy_source_encodes_segments() {
        assert_eq!(
            copy_source("repl-store", "templates/node/index.js"),
            "repl-store/templates/node/index.js"
        );
        assert_eq!(
            copy_source("repl-store", "templates/my app/a+b.txt"),
            "repl-store/templates/my%20app/a%2Bb.txt"
        );
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("http://localhost:9000").is_ok());
        assert!(validate_endpoint("https://s3.us-west-2.amazonaws.com").is_ok());
        assert!(matches!(
            validate_endpoint("localhost:9000"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            validate_endpoint("not a url"),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_new_rejects_bad_endpoint() {
        let config = StoreConfig {
            endpoint: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            S3Client::new(&config).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_new_with_endpoint_override() {
        let config = StoreConfig {
            bucket: "repl-store".to_string(),
            endpoint: Some("http://127.0.0.1:9000".to_string()),
            access_key: "minio".to_string(),
            secret_key: "minio123".to_string(),
            force_path_style: true,
            max_keys: Some(50),
            ..Default::default()
        };

        let client = S3Client::new(&config).await.unwrap();
        assert_eq!(client.max_keys, Some(50));
        assert!(client.inner.config().region().is_some());
    }

    #[test]
    fn test_listing_page_truncated_with_token() {
        let response = ListObjectsV2Output::builder()
            .contents(Object::builder().key("templates/node/index.js").build())
            .contents(Object::builder().size(0).build())
            .contents(Object::builder().key("templates/node/package.json").build())
            .is_truncated(true)
            .next_continuation_token("1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=")
            .build();

        let page = listing_page(&response);
        assert_eq!(
            page.keys,
            vec![
                "templates/node/index.js".to_string(),
                "templates/node/package.json".to_string(),
            ]
        );
        assert!(page.truncated);
        assert_eq!(
            page.next_cursor.as_deref(),
            Some("1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=")
        );
    }

    #[test]
    fn test_listing_page_without_truncation_flag() {
        let response = ListObjectsV2Output::builder().build();

        let page = listing_page(&response);
        assert!(page.is_empty());
        assert!(!page.truncated);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_classify_service_error_by_code() {
        assert!(matches!(
            classify_service_error(Some("AccessDenied"), 403, "Access Denied", "repl-store"),
            Error::Auth(_)
        ));
        assert!(matches!(
            classify_service_error(Some("SignatureDoesNotMatch"), 400, "", "repl-store"),
            Error::Auth(_)
        ));

        let err = classify_service_error(Some("NoSuchBucket"), 404, "missing", "repl-store");
        match err {
            Error::NotFound(msg) => assert!(msg.starts_with("repl-store: NoSuchBucket")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_service_error_by_status() {
        assert!(matches!(
            classify_service_error(None, 403, "", "repl-store"),
            Error::Auth(_)
        ));

        let throttled = classify_service_error(Some("SlowDown"), 503, "Reduce your rate", "b");
        assert!(matches!(throttled, Error::Network(_)));
        assert!(is_retryable_error(&throttled));

        let unknown = classify_service_error(Some("InvalidArgument"), 400, "bad", "b");
        assert!(matches!(unknown, Error::Network(_)));
        assert!(!is_retryable_error(&unknown));
    }

    #[test]
    fn test_classify_transport_errors() {
        let timeout: SdkError<ListObjectsV2Error> = SdkError::timeout_error("read timed out");
        let err = classify_sdk_error(&timeout, "repl-store");
        assert!(matches!(err, Error::Network(_)));
        assert!(is_retryable_error(&err));

        let construction: SdkError<ListObjectsV2Error> =
            SdkError::construction_failure("missing bucket");
        assert!(matches!(
            classify_sdk_error(&construction, "repl-store"),
            Error::General(_)
        ));
    }
}
