//! Server time and health endpoint integration tests.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use crate::{endpoint_url, http_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_server_time_close_to_local_clock() {
        let resp = http_client()
            .get(format!("{}/server_time", endpoint_url()))
            .send()
            .await
            .expect("server_time request");
        assert_eq!(resp.status(), 200);

        let text = resp.text().await.expect("body");
        assert!(text.ends_with(" GMT"), "not an RFC 1123 date: {text}");

        let server_time = DateTime::parse_from_rfc2822(&text)
            .expect("RFC 1123 date")
            .with_timezone(&Utc);
        let offset = (Utc::now() - server_time).num_seconds().abs();
        assert!(offset < 60, "server clock is {offset}s away");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_healthy() {
        let resp = http_client()
            .get(format!("{}/health", endpoint_url()))
            .send()
            .await
            .expect("health request");
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["status"], "running");
    }
}
