//! Signing endpoint integration tests.

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use signet_auth::{SignatureVariant, SigningRequest, canonicalize_request};

    use crate::{ACCESS_KEY, endpoint_url, http_client, local_engine, scoped_string_to_sign};

    fn sign_url(to_sign: &str) -> String {
        format!(
            "{}/sign_auth?to_sign={}",
            endpoint_url(),
            urlencoding::encode(to_sign)
        )
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_sign_scoped_string_to_sign() {
        let now = Utc::now();
        let to_sign = scoped_string_to_sign(
            now,
            "GET\n/photos/cat.jpg\n\nhost:example\n\nhost\nUNSIGNED-PAYLOAD",
        );

        let resp = http_client()
            .get(sign_url(&to_sign))
            .send()
            .await
            .expect("sign_auth request");
        assert_eq!(resp.status(), 200);

        let token = resp.text().await.expect("body");
        let expected = local_engine()
            .sign(&to_sign, SignatureVariant::ScopedHmacSha256Hex, None, now)
            .expect("local signature");
        assert_eq!(token, expected);
        assert_eq!(token.len(), 64);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_missing_to_sign() {
        let resp = http_client()
            .get(format!("{}/sign_auth", endpoint_url()))
            .send()
            .await
            .expect("sign_auth request");
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_to_sign_stale_scope() {
        let stale = Utc::now() - TimeDelta::days(20);
        let to_sign = scoped_string_to_sign(stale, "GET\n/\n\n\n\n\nUNSIGNED-PAYLOAD");

        let resp = http_client()
            .get(sign_url(&to_sign))
            .send()
            .await
            .expect("sign_auth request");
        assert_eq!(resp.status(), 403);

        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["error"], "AccessDenied");
        assert_eq!(body["message"], "Signature verification failed");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_not_verify_request_signed_through_signing_endpoint() {
        let now = Utc::now();
        let url = reqwest::Url::parse(&format!("{}/bucket/victim", endpoint_url())).expect("url");
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let credential = format!(
            "AWS4-HMAC-SHA256 Credential={ACCESS_KEY}/{}/us-east-1/s3/aws4_request,\
             SignedHeaders=host;x-amz-content-sha256;x-amz-date",
            now.format("%Y%m%d")
        );

        let draft_authorization = format!("{credential},Signature=00");
        let draft = SigningRequest::builder()
            .method("DELETE")
            .path("/bucket/victim")
            .headers(
                [
                    ("host", url.authority()),
                    ("x-amz-content-sha256", "UNSIGNED-PAYLOAD"),
                    ("x-amz-date", amz_date.as_str()),
                    ("authorization", draft_authorization.as_str()),
                ]
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect::<Vec<_>>(),
            )
            .build();
        let to_sign = canonicalize_request(&draft, SignatureVariant::ScopedHmacSha256Hex)
            .expect("string to sign");

        let token = http_client()
            .get(sign_url(&to_sign))
            .send()
            .await
            .expect("sign_auth request")
            .text()
            .await
            .expect("body");

        let resp = http_client()
            .delete(url.clone())
            .header("x-amz-content-sha256", "UNSIGNED-PAYLOAD")
            .header("x-amz-date", &amz_date)
            .header("authorization", format!("{credential},Signature={token}"))
            .send()
            .await
            .expect("replayed request");
        assert_eq!(resp.status(), 403);
    }
}
