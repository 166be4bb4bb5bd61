//! Client for the sheet-backed roster store.
//!
//! The store is a single endpoint dispatching on an `action` query
//! parameter. Every response is a `{ success, data?, message?, error? }`
//! envelope and the HTTP status is always 200, so callers branch on
//! `success` only. Writes go out as POST with a JSON body declared
//! `text/plain`: that keeps the request CORS-simple, and the spreadsheet
//! backend cannot answer a preflight.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::error::GatewayError;
use crate::types::{InterviewEntry, PersonRecord, ShiftEntry, Venue};
use crate::{shift_time, util};

/// Response envelope shared by every action.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    message: Option<String>,
    error: Option<String>,
}

fn unwrap_envelope<T: Default>(envelope: Envelope<T>) -> Result<T, GatewayError> {
    if !envelope.success {
        let msg = envelope
            .error
            .or(envelope.message)
            .unwrap_or_else(|| "store reported failure without a message".to_string());
        return Err(GatewayError::Rejected(msg));
    }
    Ok(envelope.data.unwrap_or_default())
}

pub struct RemoteStore {
    client: reqwest::Client,
    endpoint: Url,
}

impl RemoteStore {
    pub fn new(api_url: &str) -> Result<Self, GatewayError> {
        let endpoint = Url::parse(api_url).map_err(|e| GatewayError::BadUrl(e.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    fn action_url(&self, action: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", action);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn get<T: DeserializeOwned + Default>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let resp = self
            .client
            .get(self.action_url(action, params))
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        unwrap_envelope(envelope)
    }

    /// POST an action body. Returns the store's success message (often
    /// shown to the user as a toast).
    async fn post<B: Serialize + ?Sized>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<String, GatewayError> {
        let payload =
            serde_json::to_string(body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let resp = self
            .client
            .post(self.action_url(action, &[]))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let envelope: Envelope<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        if !envelope.success {
            let msg = envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "store reported failure without a message".to_string());
            return Err(GatewayError::Rejected(msg));
        }
        Ok(envelope.message.unwrap_or_default())
    }

    // --- reads ---

    /// Today's shift rows. Times are normalized to canonical `HH:MM` at
    /// this boundary — the sheet may hold serials or timestamps depending
    /// on how the last upload was written back.
    pub async fn fetch_shift_rows(&self) -> Result<Vec<ShiftEntry>, GatewayError> {
        let rows: Vec<serde_json::Value> = self.get("getShiftRows", &[]).await?;
        let mut entries = Vec::with_capacity(rows.len());
        for mut row in rows {
            let time = shift_time::normalize(row.get("time").unwrap_or(&serde_json::Value::Null));
            if let Some(obj) = row.as_object_mut() {
                obj.insert("time".to_string(), json!(time));
            }
            match serde_json::from_value::<ShiftEntry>(row) {
                Ok(mut entry) => {
                    entry.name = util::name_key(&entry.name);
                    entries.push(entry);
                }
                Err(e) => log::warn!("Dropping malformed shift row: {e}"),
            }
        }
        Ok(entries)
    }

    pub async fn fetch_directory(&self) -> Result<Vec<PersonRecord>, GatewayError> {
        let mut people: Vec<PersonRecord> = self.get("getDirectory", &[]).await?;
        for person in &mut people {
            person.normalize();
        }
        Ok(people)
    }

    /// One person's interview history, newest-first as the store keeps it.
    pub async fn fetch_interview_log(
        &self,
        name: &str,
    ) -> Result<Vec<InterviewEntry>, GatewayError> {
        let mut entries: Vec<InterviewEntry> =
            self.get("getInterviewLog", &[("name", name)]).await?;
        for entry in &mut entries {
            entry.name = util::name_key(&entry.name);
        }
        Ok(entries)
    }

    /// Every person's interview history in one round trip.
    pub async fn fetch_all_interview_logs(
        &self,
    ) -> Result<HashMap<String, Vec<InterviewEntry>>, GatewayError> {
        let raw: HashMap<String, Vec<InterviewEntry>> =
            self.get("getAllInterviewLogs", &[]).await?;
        Ok(raw
            .into_iter()
            .map(|(name, mut entries)| {
                for entry in &mut entries {
                    entry.name = util::name_key(&entry.name);
                }
                (util::name_key(&name), entries)
            })
            .collect())
    }

    pub async fn fetch_shift_date(&self) -> Result<Option<NaiveDate>, GatewayError> {
        let raw: String = self.get("getShiftDate", &[]).await?;
        Ok(util::parse_wire_date(&raw))
    }

    // --- writes ---

    /// Replace the persisted shift rows wholesale.
    pub async fn replace_shift_rows(&self, rows: &[ShiftEntry]) -> Result<String, GatewayError> {
        self.post("replaceShiftRows", &json!({ "data": rows })).await
    }

    pub async fn add_person(&self, person: &PersonRecord) -> Result<String, GatewayError> {
        self.post("addPerson", person).await
    }

    pub async fn update_person(&self, person: &PersonRecord) -> Result<String, GatewayError> {
        self.post("updatePerson", person).await
    }

    pub async fn delete_person(&self, name: &str) -> Result<String, GatewayError> {
        self.post("deletePerson", &json!({ "name": name })).await
    }

    pub async fn add_interview(&self, entry: &InterviewEntry) -> Result<String, GatewayError> {
        // rowIndex is store-assigned; the backend ignores it on add.
        self.post("addInterview", entry).await
    }

    pub async fn update_interview(&self, entry: &InterviewEntry) -> Result<String, GatewayError> {
        self.post("updateInterview", entry).await
    }

    pub async fn delete_interview(
        &self,
        row_index: i64,
        name: &str,
    ) -> Result<String, GatewayError> {
        self.post(
            "deleteInterview",
            &json!({ "rowIndex": row_index, "name": name }),
        )
        .await
    }

    pub async fn toggle_sign_off(
        &self,
        name: &str,
        venue: Venue,
        signed_off: bool,
    ) -> Result<String, GatewayError> {
        self.post(
            "toggleSignOff",
            &json!({ "name": name, "venue": venue.wire_id(), "signedOff": signed_off }),
        )
        .await
    }

    pub async fn reset_sign_offs(&self) -> Result<String, GatewayError> {
        self.post("resetSignOffs", &json!({})).await
    }

    pub async fn set_shift_date(&self, date: NaiveDate) -> Result<String, GatewayError> {
        self.post(
            "setShiftDate",
            &json!({ "date": util::format_date_input(date) }),
        )
        .await
    }

    /// Bulk-set `lastWorkDate` for a list of names (the "day closed"
    /// action over today's attendees).
    pub async fn mark_worked(
        &self,
        names: &[String],
        date: NaiveDate,
    ) -> Result<String, GatewayError> {
        self.post(
            "markWorked",
            &json!({ "names": names, "date": util::format_date_input(date) }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_yields_data() {
        let envelope: Envelope<Vec<String>> =
            serde_json::from_str(r#"{"success":true,"data":["x"]}"#).unwrap();
        assert_eq!(unwrap_envelope(envelope).unwrap(), vec!["x".to_string()]);
    }

    #[test]
    fn test_envelope_success_without_data_defaults() {
        let envelope: Envelope<Vec<String>> =
            serde_json::from_str(r#"{"success":true,"message":"ok"}"#).unwrap();
        assert_eq!(unwrap_envelope(envelope).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_envelope_failure_is_rejected_even_with_http_200() {
        let envelope: Envelope<Vec<String>> =
            serde_json::from_str(r#"{"success":false,"error":"row not found"}"#).unwrap();
        let err = unwrap_envelope(envelope).unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(msg) if msg == "row not found"));
    }

    #[test]
    fn test_envelope_missing_success_counts_as_failure() {
        let envelope: Envelope<Vec<String>> = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(unwrap_envelope(envelope).is_err());
    }

    #[test]
    fn test_action_url_carries_dispatch_param() {
        let store = RemoteStore::new("https://sheets.example/exec").unwrap();
        let url = store.action_url("getInterviewLog", &[("name", "あいこ")]);
        assert!(url.as_str().contains("action=getInterviewLog"));
        assert!(url.query().unwrap().contains("name="));
    }
}
