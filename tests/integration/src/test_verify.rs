//! Request verification integration tests.
//!
//! The S3 SDK signs its requests with the scoped variant, so the server
//! verifies real client-built signatures here.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use aws_sdk_s3::presigning::PresigningConfig;

    use crate::{ACCESS_KEY, SECRET_KEY, endpoint_url, http_client, s3_client, test_key};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_verify_sdk_signed_request() {
        let client = s3_client(ACCESS_KEY, SECRET_KEY);

        let resp = client
            .get_object()
            .bucket("signet")
            .key(test_key("verify"))
            .send()
            .await
            .expect("signed request should be accepted");

        let body = resp.body.collect().await.expect("body").into_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["accessKeyId"], ACCESS_KEY);
        assert_eq!(json["variant"], "AWS4-HMAC-SHA256/hex");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_request_signed_with_wrong_secret() {
        let client = s3_client(ACCESS_KEY, "not-the-secret");

        let result = client
            .get_object()
            .bucket("signet")
            .key(test_key("forged"))
            .send()
            .await;

        let err = result.expect_err("forged request should be rejected");
        let status = err.raw_response().map(|r| r.status().as_u16());
        assert_eq!(status, Some(403));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_verify_presigned_url() {
        let client = s3_client(ACCESS_KEY, SECRET_KEY);

        let presigned = client
            .get_object()
            .bucket("signet")
            .key(test_key("presigned"))
            .presigned(PresigningConfig::expires_in(Duration::from_secs(300)).expect("config"))
            .await
            .expect("presign");

        let resp = http_client()
            .get(presigned.uri())
            .send()
            .await
            .expect("presigned request");
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unsigned_request() {
        let resp = http_client()
            .get(format!("{}/signet/anything", endpoint_url()))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 403);

        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["error"], "AccessDenied");
    }
}
