#[cfg(test)]
mod tests {
    use crate::config::ConnectOptions;
    use crate::connection::Connection;
    use crate::cursor::Cursor;
    use crate::transport::{HttpRequest, HttpResponse, Transport, TransportFuture};
    use crate::UNKNOWN_ROWCOUNT;
    use pinotdb_core::{ColumnType, PinotError, Value};
    use pinotdb_sql::{params, Params};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    struct ReplayTransport {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ReplayTransport {
        fn with(responses: Vec<HttpResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for ReplayTransport {
        fn post(&self, request: HttpRequest) -> TransportFuture<'_> {
            self.requests.lock().unwrap().push(request);
            let response = self.responses.lock().unwrap().pop_front();
            Box::pin(async move {
                response.ok_or_else(|| PinotError::Transport("no canned response left".into()))
            })
        }
    }

    fn ok(body: serde_json::Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn selection(rows: usize) -> HttpResponse {
        let results: Vec<serde_json::Value> =
            (0..rows).map(|i| json!([i as i64, format!("player-{i}")])).collect();
        ok(json!({
            "selectionResults": {"columns": ["id", "name"], "results": results},
            "numServersQueried": 1,
            "numServersResponded": 1
        }))
    }

    fn open(transport: Arc<ReplayTransport>) -> Connection {
        open_with(ConnectOptions::new("localhost"), transport)
    }

    fn open_with(options: ConnectOptions, transport: Arc<ReplayTransport>) -> Connection {
        Connection::with_transport(options, transport).expect("connect")
    }

    #[tokio::test]
    async fn execute_posts_pql_with_headers() {
        let transport = ReplayTransport::with(vec![selection(1)]);
        let conn = open_with(
            ConnectOptions::new("broker")
                .with_port(8000)
                .with_extra_request_headers("Authorization=Bearer t,X-Tenant=ads"),
            transport.clone(),
        );
        let mut cursor = conn.cursor().expect("cursor");
        cursor
            .execute(
                "SELECT * FROM baseballStats WHERE playerName = %(name)s",
                &params! { "name" => "O'Neil" },
            )
            .await
            .expect("execute");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://broker:8000/query");
        assert_eq!(
            requests[0].headers,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "Bearer t".to_string()),
                ("X-Tenant".to_string(), "ads".to_string()),
            ]
        );
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).expect("json");
        assert_eq!(
            body,
            json!({"pql": "SELECT * FROM baseballStats WHERE playerName = 'O''Neil'"})
        );
    }

    #[tokio::test]
    async fn fetch_many_returns_short_batch_at_end() {
        let conn = open(ReplayTransport::with(vec![selection(5)]));
        let mut cursor = conn.execute("SELECT id, name FROM t", &Params::new()).await.expect("execute");
        assert_eq!(cursor.fetch_many(Some(3)).expect("fetch").len(), 3);
        assert_eq!(cursor.fetch_many(Some(3)).expect("fetch").len(), 2);
        assert!(cursor.fetch_many(Some(3)).expect("fetch").is_empty());
        assert_eq!(cursor.fetch_one().expect("fetch"), None);
    }

    #[tokio::test]
    async fn fetch_many_defaults_to_array_size() {
        let conn = open(ReplayTransport::with(vec![selection(5)]));
        let mut cursor = conn.execute("SELECT id, name FROM t", &Params::new()).await.expect("execute");
        assert_eq!(cursor.array_size(), 1);
        assert_eq!(cursor.fetch_many(None).expect("fetch").len(), 1);
        cursor.set_array_size(3);
        assert_eq!(cursor.fetch_many(None).expect("fetch").len(), 3);
        assert_eq!(cursor.fetch_many(Some(0)).expect("fetch").len(), 1);
    }

    #[tokio::test]
    async fn rows_come_out_in_order() {
        let conn = open(ReplayTransport::with(vec![selection(3)]));
        let mut cursor = conn.execute("SELECT id, name FROM t", &Params::new()).await.expect("execute");
        let first = cursor.fetch_one().expect("fetch").expect("row");
        assert_eq!(first.get("id"), Some(&Value::from(0)));
        let names: Vec<Value> = cursor
            .rows()
            .map(|row| row.expect("row").get("name").cloned().expect("name"))
            .collect();
        assert_eq!(names, vec![Value::from("player-1"), Value::from("player-2")]);
        assert!(cursor.fetch_all().expect("fetch").is_empty());
    }

    #[tokio::test]
    async fn description_is_inferred_and_rowcount_unknown() {
        let conn = open(ReplayTransport::with(vec![selection(2)]));
        let cursor = conn.execute("SELECT id, name FROM t", &Params::new()).await.expect("execute");
        let desc = cursor.description().expect("description");
        assert_eq!(desc[0].name, "id");
        assert_eq!(desc[0].type_code, ColumnType::Number);
        assert_eq!(desc[1].name, "name");
        assert_eq!(desc[1].type_code, ColumnType::Text);
        assert_eq!(cursor.rowcount(), UNKNOWN_ROWCOUNT);
    }

    #[tokio::test]
    async fn grouped_aggregation_through_cursor() {
        let conn = open(ReplayTransport::with(vec![ok(json!({
            "aggregationResults": [
                {"function": "count", "groupByColumns": ["city"],
                 "groupByResult": [{"group": ["NYC"], "value": 5}, {"group": ["SF"], "value": 2}]}
            ],
            "numServersQueried": 2,
            "numServersResponded": 2
        }))]));
        let mut cursor = conn
            .execute("SELECT count(*) FROM t GROUP BY city", &Params::new())
            .await
            .expect("execute");
        let rows = cursor.fetch_all().expect("fetch");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values(), [Value::from("NYC"), Value::from(5)]);
        assert_eq!(rows[1].values(), [Value::from("SF"), Value::from(2)]);
    }

    #[tokio::test]
    async fn empty_response_has_no_rows() {
        let conn = open(ReplayTransport::with(vec![ok(json!({
            "numServersQueried": 1,
            "numServersResponded": 1
        }))]));
        let mut cursor = conn.execute("SELECT * FROM t", &Params::new()).await.expect("execute");
        assert!(cursor.description().is_none());
        assert_eq!(cursor.fetch_one().expect("fetch"), None);
    }

    #[tokio::test]
    async fn re_execute_replaces_results() {
        let conn = open(ReplayTransport::with(vec![selection(4), selection(1)]));
        let mut cursor = conn.cursor().expect("cursor");
        cursor.execute("SELECT * FROM t", &Params::new()).await.expect("execute");
        assert_eq!(cursor.fetch_many(Some(2)).expect("fetch").len(), 2);
        cursor.execute("SELECT * FROM t", &Params::new()).await.expect("execute");
        assert_eq!(cursor.fetch_all().expect("fetch").len(), 1);
    }

    #[tokio::test]
    async fn failed_execute_keeps_previous_results() {
        let partial = ok(json!({"numServersQueried": 3, "numServersResponded": 2}));
        let conn = open(ReplayTransport::with(vec![selection(2), partial]));
        let mut cursor = conn.cursor().expect("cursor");
        cursor.execute("SELECT * FROM t", &Params::new()).await.expect("execute");
        let err = cursor.execute("SELECT * FROM t", &Params::new()).await.unwrap_err();
        assert!(matches!(err, PinotError::Server(ref msg) if msg.contains("only 2 of 3")));
        assert_eq!(cursor.fetch_all().expect("fetch").len(), 2);
    }

    #[tokio::test]
    async fn undecodable_body_is_reported_with_raw_text() {
        let conn = open(ReplayTransport::with(vec![HttpResponse {
            status: 502,
            headers: Vec::new(),
            body: "<html>Bad Gateway</html>".into(),
        }]));
        let err = conn.execute("SELECT * FROM t", &Params::new()).await.unwrap_err();
        match err {
            PinotError::TransportDecode { query, url, body } => {
                assert_eq!(query, "SELECT * FROM t");
                assert_eq!(url, "http://localhost:8099/query");
                assert_eq!(body, "<html>Bad Gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn templating_error_sends_nothing() {
        let transport = ReplayTransport::with(vec![selection(1)]);
        let conn = open(transport.clone());
        let err = conn
            .execute("SELECT * FROM t WHERE a = %(missing)s", &Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PinotError::Templating(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_surfaces() {
        let conn = open(ReplayTransport::with(Vec::new()));
        let err = conn.execute("SELECT * FROM t", &Params::new()).await.unwrap_err();
        assert!(matches!(err, PinotError::Transport(_)));
    }

    #[tokio::test]
    async fn fetch_before_execute_is_a_usage_error() {
        let conn = open(ReplayTransport::with(Vec::new()));
        let mut cursor = conn.cursor().expect("cursor");
        let err = cursor.fetch_one().unwrap_err();
        assert!(matches!(err, PinotError::Usage(ref msg) if msg.contains("before `execute`")));
        assert!(cursor.fetch_many(None).unwrap_err().is_usage());
        assert!(cursor.fetch_all().unwrap_err().is_usage());

        // Missing execute is reported even once the cursor is closed.
        cursor.close();
        let err = cursor.fetch_one().unwrap_err();
        assert!(matches!(err, PinotError::Usage(ref msg) if msg.contains("before `execute`")));
    }

    #[tokio::test]
    async fn closed_cursor_rejects_operations() {
        let conn = open(ReplayTransport::with(vec![selection(3)]));
        let mut cursor = conn.execute("SELECT * FROM t", &Params::new()).await.expect("execute");
        cursor.close();
        assert!(cursor.is_closed());
        assert!(cursor.fetch_one().unwrap_err().is_usage());
        assert!(cursor.fetch_many(Some(2)).unwrap_err().is_usage());
        assert!(cursor.fetch_all().unwrap_err().is_usage());
        assert!(cursor.set_input_sizes(&[1]).unwrap_err().is_usage());
        assert!(cursor.set_output_sizes(&[1]).unwrap_err().is_usage());
        assert!(cursor
            .execute("SELECT * FROM t", &Params::new())
            .await
            .unwrap_err()
            .is_usage());
        let mut rows = cursor.rows();
        assert!(rows.next().expect("error item").is_err());
        assert!(rows.next().is_none());

        // Second close is a no-op.
        cursor.close();
        assert!(cursor.is_closed());
    }

    #[tokio::test]
    async fn execute_many_is_not_supported() {
        let conn = open(ReplayTransport::with(Vec::new()));
        let mut cursor = conn.cursor().expect("cursor");
        let err = cursor.execute_many("SELECT 1", &[Params::new()]).unwrap_err();
        assert!(matches!(err, PinotError::NotSupported(_)));
        assert!(err.is_usage());
        cursor.set_input_sizes(&[]).expect("open cursor accepts sizes");
    }

    #[tokio::test]
    async fn closing_connection_closes_its_cursors() {
        let conn = open(ReplayTransport::with(vec![selection(2)]));
        let mut executed = conn.execute("SELECT * FROM t", &Params::new()).await.expect("execute");
        let mut already_closed = conn.cursor().expect("cursor");
        already_closed.close();
        let fresh = conn.cursor().expect("cursor");

        conn.close().expect("close");
        assert!(conn.is_closed());
        assert!(executed.is_closed());
        assert!(fresh.is_closed());
        assert!(executed.fetch_one().unwrap_err().is_usage());
        already_closed.close();
    }

    #[tokio::test]
    async fn closed_connection_rejects_operations() {
        let conn = open(ReplayTransport::with(Vec::new()));
        conn.commit().expect("commit is a no-op");
        conn.close().expect("close");
        assert!(conn.cursor().unwrap_err().is_usage());
        assert!(conn.commit().unwrap_err().is_usage());
        assert!(conn
            .execute("SELECT * FROM t", &Params::new())
            .await
            .unwrap_err()
            .is_usage());
        assert!(conn.close().unwrap_err().is_usage());
    }

    #[test]
    fn cursors_racing_close_all_end_up_closed() {
        let conn = open(ReplayTransport::with(Vec::new()));
        let handed_out = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| (0..50).filter_map(|_| conn.cursor().ok()).collect::<Vec<_>>()))
                .collect();
            scope.spawn(|| conn.close().expect("close"));
            workers
                .into_iter()
                .flat_map(|worker| worker.join().expect("worker"))
                .collect::<Vec<_>>()
        });
        assert!(conn.is_closed());
        assert!(handed_out.iter().all(Cursor::is_closed));
        assert!(conn.cursor().unwrap_err().is_usage());
    }

    #[test]
    fn bad_extra_headers_fail_connect() {
        for bad in ["broken", "bad name=v", "X-Tenant=a\u{7f}b"] {
            let options = ConnectOptions::new("localhost").with_extra_request_headers(bad);
            let err = Connection::with_transport(options, ReplayTransport::with(Vec::new())).unwrap_err();
            assert!(matches!(err, PinotError::Config(_)), "{bad}: {err:?}");
        }
    }

    #[test]
    fn connect_builds_http_connection() {
        let conn = crate::connect(ConnectOptions::new("localhost").with_debug(true)).expect("connect");
        assert_eq!(conn.options().url(), "http://localhost:8099/query");
        assert!(!conn.is_closed());
    }
}
