//! Gmail API client for listing inbox messages, batch-fetching sender
//! headers, searching, and deleting messages

use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gmail rejects batch requests with more than 100 parts
pub const BATCH_SIZE: usize = 100;

/// Message and listing structures from the Gmail API documentation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageRef {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub payload: Option<MessagePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    pub headers: Option<Vec<MessageHeader>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// Extract the raw From header from a metadata-projected message
pub fn extract_from(message: &Message) -> Option<&str> {
    message
        .payload
        .as_ref()?
        .headers
        .as_ref()?
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("from"))
        .map(|h| h.value.as_str())
}

/// Authenticated session handle bound to one mailbox account.
///
/// Holds the HTTP client and access token for the process lifetime and
/// is passed by reference into the scan and purge operations. Callers
/// must serialize operations against one handle; the provider's
/// per-account rate limits are the only throttle.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(base_url: &str, access_token: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// List one page of message ids, optionally narrowed by label or
    /// search query
    pub async fn list_messages(
        &self,
        label_id: Option<&str>,
        query: Option<&str>,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse> {
        let mut url = format!(
            "{}/gmail/v1/users/me/messages?maxResults={}",
            self.base_url, max_results
        );
        if let Some(label) = label_id {
            url.push_str(&format!("&labelIds={}", label));
        }
        if let Some(q) = query {
            url.push_str(&format!("&q={}", urlencoding::encode(q)));
        }
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }
        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Message list failed: {} ({})", status, text);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Page through the listing endpoint, accumulating message ids
    /// until `limit` is reached or the provider stops returning a page
    /// token. The returned list never exceeds `limit`.
    pub async fn collect_message_ids(
        &self,
        label_id: Option<&str>,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        let mut ids: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_messages(label_id, query, 500, page_token.as_deref())
                .await?;
            let messages = page.messages.unwrap_or_default();
            let page_len = messages.len();
            ids.extend(messages.into_iter().map(|m| m.id));

            if let Some(limit) = limit
                && ids.len() >= limit
            {
                ids.truncate(limit);
                break;
            }
            page_token = page.next_page_token;
            if page_token.is_none() || page_len == 0 {
                break;
            }
        }
        Ok(ids)
    }

    /// Fetch the From header for up to [`BATCH_SIZE`] messages with a
    /// single multipart batch request.
    ///
    /// Parts that fail inside the batch are dropped from the result;
    /// only a transport-level failure of the batch call itself is an
    /// error.
    pub async fn batch_fetch_from_headers(&self, ids: &[String]) -> Result<Vec<Message>> {
        let boundary = "batch_mailsweep";
        let mut body = String::new();
        for id in ids {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Type: application/http\r\nContent-ID: <{id}>\r\n\r\nGET /gmail/v1/users/me/messages/{id}?format=metadata&metadataHeaders=From\r\n\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        let url = format!("{}/batch/gmail/v1", self.base_url);
        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/mixed; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;
        let status = res.status();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Batch fetch failed: {} ({})", status, text);
        }
        let boundary = response_boundary(&content_type)
            .ok_or_else(|| anyhow!("Batch response missing multipart boundary"))?;
        Ok(parse_batch_response(&text, &boundary))
    }

    /// Permanently delete a message
    pub async fn delete_message(&self, id: &str) -> Result<()> {
        let url = format!("{}/gmail/v1/users/me/messages/{}", self.base_url, id);
        let res = self
            .http
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("Delete failed: {} ({})", status, text);
        }
        Ok(())
    }
}

/// Pull the boundary parameter out of a multipart content type
fn response_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("boundary=")
            .map(|b| b.trim_matches('"').to_string())
    })
}

/// Split a multipart batch response into per-message results.
///
/// Each part wraps a complete HTTP response. Parts with a non-2xx
/// inner status or an unparsable body are skipped; the tally is built
/// from whichever parts survive, in any order.
fn parse_batch_response(body: &str, boundary: &str) -> Vec<Message> {
    let delimiter = format!("--{}", boundary);
    let mut messages = Vec::new();
    for part in body.split(delimiter.as_str()) {
        let part = part.trim_start_matches("\r\n").trim_start_matches('\n');
        if part.is_empty() || part.starts_with("--") {
            continue;
        }
        // Part headers, then the wrapped HTTP response
        let Some(inner) = after_blank_line(part) else {
            continue;
        };
        let Some(status) = inner_status(inner) else {
            continue;
        };
        if !(200..300).contains(&status) {
            tracing::debug!("Skipping batch part with status {}", status);
            continue;
        }
        let Some(json) = after_blank_line(inner) else {
            continue;
        };
        match serde_json::from_str::<Message>(json.trim()) {
            Ok(message) => messages.push(message),
            Err(err) => tracing::debug!("Skipping unparsable batch part: {}", err),
        }
    }
    messages
}

fn after_blank_line(part: &str) -> Option<&str> {
    part.split_once("\r\n\r\n")
        .or_else(|| part.split_once("\n\n"))
        .map(|(_, rest)| rest)
}

fn inner_status(inner: &str) -> Option<u16> {
    let status_line = inner.lines().next()?;
    if !status_line.starts_with("HTTP/") {
        return None;
    }
    status_line.split_whitespace().nth(1)?.parse().ok()
}
