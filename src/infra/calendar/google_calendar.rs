use crate::domain::models::calendar::{BusyInterval, CreatedEvent, EventPatch, NewCalendarEvent};
use crate::domain::ports::CalendarService;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::error;

/// Google-Calendar-style REST adapter: free/busy oracle plus event CRUD.
pub struct GoogleCalendarService {
    client: Client,
    api_url: String,
    api_token: String,
}

impl GoogleCalendarService {
    pub fn new(api_url: String, api_token: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_token,
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_token)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest<'a> {
    time_min: String,
    time_max: String,
    items: Vec<FreeBusyItem<'a>>,
}

#[derive(Serialize)]
struct FreeBusyItem<'a> {
    id: &'a str,
}

#[derive(Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<BusyPeriod>,
}

#[derive(Deserialize)]
struct BusyPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Serialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: EventTime,
    end: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct EventResponse {
    id: String,
    #[serde(rename = "htmlLink")]
    html_link: Option<String>,
}

fn connection_error(e: reqwest::Error) -> AppError {
    let msg = format!("Calendar connection error: {}", e);
    error!("{}", msg);
    AppError::ExternalService(msg)
}

async fn status_error(context: &str, res: reqwest::Response) -> AppError {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    let msg = format!("{} failed. Status: {}, Body: {}", context, status, text);
    error!("{}", msg);
    AppError::ExternalService(msg)
}

#[async_trait]
impl CalendarService for GoogleCalendarService {
    async fn query_busy(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, AppError> {
        let payload = FreeBusyRequest {
            time_min: time_min.to_rfc3339(),
            time_max: time_max.to_rfc3339(),
            items: vec![FreeBusyItem { id: calendar_id }],
        };

        let res = self.client
            .post(format!("{}/freeBusy", self.api_url))
            .header("Authorization", self.bearer())
            .json(&payload)
            .send()
            .await
            .map_err(connection_error)?;

        if !res.status().is_success() {
            return Err(status_error("Free/busy query", res).await);
        }

        let parsed: FreeBusyResponse = res
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid free/busy response: {}", e)))?;

        Ok(parsed
            .calendars
            .get(calendar_id)
            .map(|c| {
                c.busy
                    .iter()
                    .map(|b| BusyInterval { start: b.start, end: b.end })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &NewCalendarEvent,
    ) -> Result<CreatedEvent, AppError> {
        let body = EventBody {
            summary: &event.summary,
            description: &event.description,
            start: EventTime { date_time: event.start.to_rfc3339() },
            end: EventTime { date_time: event.end.to_rfc3339() },
            color_id: event.color_id.as_deref(),
        };

        let res = self.client
            .post(format!("{}/calendars/{}/events", self.api_url, calendar_id))
            .header("Authorization", self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;

        if !res.status().is_success() {
            return Err(status_error("Event creation", res).await);
        }

        let created: EventResponse = res
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid event response: {}", e)))?;

        Ok(CreatedEvent {
            id: created.id,
            html_link: created.html_link,
        })
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<(), AppError> {
        let mut body = serde_json::Map::new();
        if let Some(start) = patch.start {
            body.insert("start".to_string(), json!({ "dateTime": start.to_rfc3339() }));
        }
        if let Some(end) = patch.end {
            body.insert("end".to_string(), json!({ "dateTime": end.to_rfc3339() }));
        }
        if let Some(ref summary) = patch.summary {
            body.insert("summary".to_string(), json!(summary));
        }
        if let Some(ref color_id) = patch.color_id {
            body.insert("colorId".to_string(), json!(color_id));
        }

        let res = self.client
            .patch(format!("{}/calendars/{}/events/{}", self.api_url, calendar_id, event_id))
            .header("Authorization", self.bearer())
            .json(&serde_json::Value::Object(body))
            .send()
            .await
            .map_err(connection_error)?;

        if !res.status().is_success() {
            return Err(status_error("Event update", res).await);
        }
        Ok(())
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), AppError> {
        let res = self.client
            .delete(format!("{}/calendars/{}/events/{}", self.api_url, calendar_id, event_id))
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(connection_error)?;

        // Deleting an already-deleted event is a success to the caller.
        if res.status() == StatusCode::NOT_FOUND || res.status() == StatusCode::GONE {
            return Ok(());
        }
        if !res.status().is_success() {
            return Err(status_error("Event deletion", res).await);
        }
        Ok(())
    }
}
