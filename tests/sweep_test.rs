//! End-to-end scan and purge runs against a mock Gmail API

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    use mailsweep::google::gmail::GmailClient;
    use mailsweep::sweep::{Filters, SweepEvent, purge_sender, top_senders};

    /// Drain everything the operation sent before it returned
    fn collect_events(rx: &mut UnboundedReceiver<SweepEvent>) -> Vec<SweepEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn logs(events: &[SweepEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                SweepEvent::Log(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    fn progress(events: &[SweepEvent]) -> Vec<(usize, usize)> {
        events
            .iter()
            .filter_map(|e| match e {
                SweepEvent::Progress { current, total } => Some((*current, *total)),
                _ => None,
            })
            .collect()
    }

    fn list_body(ids: &[&str], next_page_token: Option<&str>) -> String {
        let messages = ids
            .iter()
            .map(|id| format!(r#"{{"id": "{id}", "threadId": "t-{id}"}}"#))
            .collect::<Vec<_>>()
            .join(",");
        match next_page_token {
            Some(token) => {
                format!(r#"{{"messages": [{messages}], "nextPageToken": "{token}"}}"#)
            }
            None => format!(r#"{{"messages": [{messages}]}}"#),
        }
    }

    fn batch_part(boundary: &str, status: &str, json: &str) -> String {
        format!(
            "--{boundary}\r\nContent-Type: application/http\r\n\r\nHTTP/1.1 {status}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{json}\r\n"
        )
    }

    fn message_json(id: &str, from: &str) -> String {
        format!(
            r#"{{"id":"{id}","payload":{{"headers":[{{"name":"From","value":"{from}"}}]}}}}"#
        )
    }

    fn batch_body(boundary: &str, froms: &[(&str, &str, &str)]) -> String {
        let mut body = String::new();
        for (id, status, from) in froms {
            let json = if status.starts_with("200") {
                message_json(id, from)
            } else {
                r#"{"error":{"code":404,"message":"Not Found"}}"#.to_string()
            };
            body.push_str(&batch_part(boundary, status, &json));
        }
        body.push_str(&format!("--{boundary}--\r\n"));
        body
    }

    const BOUNDARY: &str = "batch_resp";

    #[tokio::test]
    async fn scan_ranks_top_senders() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Regex(
                "^maxResults=500&labelIds=INBOX$".to_string(),
            ))
            .with_status(200)
            .with_body(list_body(&["m1", "m2", "m3"], None))
            .create_async()
            .await;
        let _batch = server
            .mock("POST", "/batch/gmail/v1")
            .with_status(200)
            .with_header(
                "content-type",
                &format!("multipart/mixed; boundary={BOUNDARY}"),
            )
            .with_body(batch_body(
                BOUNDARY,
                &[
                    ("m1", "200 OK", "Newsletters <news@bulk.com>"),
                    ("m2", "200 OK", "jane@x.com"),
                    ("m3", "200 OK", "Newsletters <news@bulk.com>"),
                ],
            ))
            .create_async()
            .await;

        let client = GmailClient::new(&server.url(), "test_token".to_string());
        let (tx, mut rx) = unbounded_channel();
        let ranked = top_senders(&client, 3000, 10, &tx).await.unwrap();

        assert_eq!(
            ranked,
            vec![
                ("Newsletters <news@bulk.com>".to_string(), 2),
                ("jane@x.com".to_string(), 1),
            ]
        );
        let events = collect_events(&mut rx);
        assert_eq!(progress(&events), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn scan_truncates_to_top_n() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(list_body(&["m1", "m2", "m3"], None))
            .create_async()
            .await;
        let _batch = server
            .mock("POST", "/batch/gmail/v1")
            .with_status(200)
            .with_header(
                "content-type",
                &format!("multipart/mixed; boundary={BOUNDARY}"),
            )
            .with_body(batch_body(
                BOUNDARY,
                &[
                    ("m1", "200 OK", "a@x.com"),
                    ("m2", "200 OK", "b@x.com"),
                    ("m3", "200 OK", "a@x.com"),
                ],
            ))
            .create_async()
            .await;

        let client = GmailClient::new(&server.url(), "test_token".to_string());
        let (tx, _rx) = unbounded_channel();
        let ranked = top_senders(&client, 3000, 1, &tx).await.unwrap();
        assert_eq!(ranked, vec![("a@x.com".to_string(), 2)]);
    }

    #[tokio::test]
    async fn scan_batches_report_progress_with_provider_total_shape() {
        let mut server = mockito::Server::new_async().await;
        let ids: Vec<String> = (0..250).map(|i| format!("m{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(list_body(&id_refs, None))
            .create_async()
            .await;
        let batch = server
            .mock("POST", "/batch/gmail/v1")
            .with_status(200)
            .with_header(
                "content-type",
                &format!("multipart/mixed; boundary={BOUNDARY}"),
            )
            .with_body(batch_body(BOUNDARY, &[("m0", "200 OK", "bulk@x.com")]))
            .expect(3)
            .create_async()
            .await;

        let client = GmailClient::new(&server.url(), "test_token".to_string());
        let (tx, mut rx) = unbounded_channel();
        let ranked = top_senders(&client, 3000, 10, &tx).await.unwrap();

        // 250 identifiers means three batches of at most 100, and the
        // reported total keeps the count/100+1 shape
        batch.assert_async().await;
        let events = collect_events(&mut rx);
        assert_eq!(progress(&events), vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(ranked, vec![("bulk@x.com".to_string(), 3)]);
    }

    #[tokio::test]
    async fn scan_failed_part_drops_one_message_without_aborting() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(list_body(&["m1", "m2", "m3"], None))
            .create_async()
            .await;
        let _batch = server
            .mock("POST", "/batch/gmail/v1")
            .with_status(200)
            .with_header(
                "content-type",
                &format!("multipart/mixed; boundary={BOUNDARY}"),
            )
            .with_body(batch_body(
                BOUNDARY,
                &[
                    ("m1", "200 OK", "a@x.com"),
                    ("m2", "404 Not Found", ""),
                    ("m3", "200 OK", "b@x.com"),
                ],
            ))
            .create_async()
            .await;

        let client = GmailClient::new(&server.url(), "test_token".to_string());
        let (tx, _rx) = unbounded_channel();
        let ranked = top_senders(&client, 3000, 10, &tx).await.unwrap();

        // m2 was from a@x.com in the all-success run; its failure
        // costs that sender exactly one count
        let mut ranked_sorted = ranked.clone();
        ranked_sorted.sort();
        assert_eq!(
            ranked_sorted,
            vec![("a@x.com".to_string(), 1), ("b@x.com".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn scan_empty_inbox_returns_no_senders_and_no_progress() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"resultSizeEstimate": 0}"#)
            .create_async()
            .await;

        let client = GmailClient::new(&server.url(), "test_token".to_string());
        let (tx, mut rx) = unbounded_channel();
        let ranked = top_senders(&client, 3000, 10, &tx).await.unwrap();

        assert!(ranked.is_empty());
        assert!(progress(&collect_events(&mut rx)).is_empty());
    }

    #[tokio::test]
    async fn scan_listing_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"message": "Forbidden"}}"#)
            .create_async()
            .await;

        let client = GmailClient::new(&server.url(), "test_token".to_string());
        let (tx, _rx) = unbounded_channel();
        assert!(top_senders(&client, 3000, 10, &tx).await.is_err());
    }

    #[tokio::test]
    async fn purge_deletes_matching_messages_and_tolerates_failures() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Regex(
                "^maxResults=500&q=from%3Ajane%40x\\.com$".to_string(),
            ))
            .with_status(200)
            .with_body(list_body(&["m1", "m2", "m3"], None))
            .create_async()
            .await;
        let _del_ok_1 = server
            .mock("DELETE", "/gmail/v1/users/me/messages/m1")
            .with_status(204)
            .create_async()
            .await;
        let _del_fail = server
            .mock("DELETE", "/gmail/v1/users/me/messages/m2")
            .with_status(500)
            .with_body("backend error")
            .create_async()
            .await;
        let _del_ok_2 = server
            .mock("DELETE", "/gmail/v1/users/me/messages/m3")
            .with_status(204)
            .create_async()
            .await;

        let client = GmailClient::new(&server.url(), "test_token".to_string());
        let (tx, mut rx) = unbounded_channel();
        let deleted = purge_sender(
            &client,
            "Jane Doe <jane@x.com>",
            &Filters::default(),
            &tx,
        )
        .await
        .unwrap();

        assert_eq!(deleted, 2);
        let events = collect_events(&mut rx);
        let log_lines = logs(&events);
        assert_eq!(log_lines[0], "Using query: from:jane@x.com");
        assert!(
            log_lines
                .iter()
                .any(|l| l.starts_with("Failed to delete message m2"))
        );
        assert!(log_lines.contains(&"Deleted 2 messages from jane@x.com"));
        assert_eq!(progress(&events), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn purge_with_no_candidates_logs_and_returns_zero() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"resultSizeEstimate": 0}"#)
            .create_async()
            .await;

        let client = GmailClient::new(&server.url(), "test_token".to_string());
        let (tx, mut rx) = unbounded_channel();
        let deleted = purge_sender(&client, "jane@x.com", &Filters::default(), &tx)
            .await
            .unwrap();

        assert_eq!(deleted, 0);
        let events = collect_events(&mut rx);
        assert!(progress(&events).is_empty());
        assert!(
            logs(&events)
                .iter()
                .any(|l| l.contains("No messages found for query from jane@x.com"))
        );
    }

    #[tokio::test]
    async fn purge_drains_every_page_of_search_results() {
        let mut server = mockito::Server::new_async().await;
        let _page_one = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Regex(
                "^maxResults=500&q=from%3Ajane%40x\\.com$".to_string(),
            ))
            .with_status(200)
            .with_body(list_body(&["m1", "m2"], Some("tok_2")))
            .create_async()
            .await;
        let _page_two = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Regex("pageToken=tok_2$".to_string()))
            .with_status(200)
            .with_body(list_body(&["m3"], None))
            .create_async()
            .await;
        let mut delete_mocks = Vec::new();
        for id in ["m1", "m2", "m3"] {
            delete_mocks.push(
                server
                    .mock("DELETE", format!("/gmail/v1/users/me/messages/{id}").as_str())
                    .with_status(204)
                    .create_async()
                    .await,
            );
        }

        let client = GmailClient::new(&server.url(), "test_token".to_string());
        let (tx, mut rx) = unbounded_channel();
        let deleted = purge_sender(&client, "jane@x.com", &Filters::default(), &tx)
            .await
            .unwrap();

        // Candidates beyond the first page are deleted too
        assert_eq!(deleted, 3);
        let events = collect_events(&mut rx);
        assert_eq!(progress(&events), vec![(1, 3), (2, 3), (3, 3)]);
        assert!(logs(&events).contains(&"Deleted 3 messages from jane@x.com"));
    }

    #[tokio::test]
    async fn purge_search_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error": {"message": "Unauthorized"}}"#)
            .create_async()
            .await;

        let client = GmailClient::new(&server.url(), "bad_token".to_string());
        let (tx, _rx) = unbounded_channel();
        assert!(
            purge_sender(&client, "jane@x.com", &Filters::default(), &tx)
                .await
                .is_err()
        );
    }
}
