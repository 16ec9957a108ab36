//! services/client/src/adapters/firebase/firestore.rs
//!
//! The `DatabaseService` port on top of the Firestore REST API.
//!
//! Collections: `users/{uid}` holds profiles, `books` and `studyLogs` hold
//! auto-id documents carrying a `userId` field.

use super::{read_json, FirebaseAuth};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crybaby_core::domain::{
    to_iso_millis, Book, NewBook, NewProfile, NewStudyLog, Profile, Role, StudyLogEntry,
};
use crybaby_core::ports::{DatabaseService, PortError, PortResult};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

//=========================================================================================
// Firestore value encoding
//=========================================================================================

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn integer_value(i: i64) -> Value {
    // Firestore sends 64-bit integers as strings.
    json!({ "integerValue": i.to_string() })
}

fn timestamp_value(at: &DateTime<Utc>) -> Value {
    json!({ "timestampValue": to_iso_millis(at) })
}

fn field_str<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    fields.get(name)?.get("stringValue")?.as_str()
}

fn field_int(fields: &Map<String, Value>, name: &str) -> Option<i64> {
    let value = fields.get(name)?;
    if let Some(raw) = value.get("integerValue") {
        return match raw {
            Value::String(s) => s.parse().ok(),
            other => other.as_i64(),
        };
    }
    value.get("doubleValue")?.as_f64().map(|f| f as i64)
}

fn field_time(fields: &Map<String, Value>, name: &str) -> Option<DateTime<Utc>> {
    let raw = fields.get(name)?.get("timestampValue")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The fields map and the trailing id of a document resource.
fn document_parts(doc: &Value) -> PortResult<(String, Map<String, Value>)> {
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| PortError::Malformed("document without a name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    let fields = doc
        .get("fields")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Ok((id, fields))
}

fn book_from_document(doc: &Value) -> PortResult<Book> {
    let (id, fields) = document_parts(doc)?;
    let required = |name: &str| {
        field_str(&fields, name)
            .map(str::to_string)
            .ok_or_else(|| PortError::Malformed(format!("book {} is missing {}", id, name)))
    };
    Ok(Book {
        owner_id: required("userId")?,
        subject: required("subject")?,
        display_name: required("name")?,
        content_location: required("url")?,
        created_at: field_time(&fields, "createdAt").unwrap_or_else(Utc::now),
        id,
    })
}

fn study_log_from_document(doc: &Value) -> PortResult<StudyLogEntry> {
    let (id, fields) = document_parts(doc)?;
    let owner_id = field_str(&fields, "userId")
        .ok_or_else(|| PortError::Malformed(format!("study log {} has no userId", id)))?;
    Ok(StudyLogEntry {
        owner_id: owner_id.to_string(),
        subject: field_str(&fields, "subject").unwrap_or_default().to_string(),
        duration_minutes: field_int(&fields, "duration")
            .and_then(|d| u32::try_from(d).ok())
            .unwrap_or(0),
        date: field_time(&fields, "date").unwrap_or_else(Utc::now),
    })
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct Firestore {
    http: Client,
    auth: Arc<FirebaseAuth>,
    project_id: String,
}

impl Firestore {
    pub fn new(http: Client, auth: Arc<FirebaseAuth>, project_id: impl Into<String>) -> Self {
        Self {
            http,
            auth,
            project_id: project_id.into(),
        }
    }

    /// `projects/{p}/databases/(default)/documents`, the prefix of every document name.
    fn resource_root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/{}{}",
            self.auth.endpoints().firestore,
            self.resource_root(),
            suffix
        )
    }

    async fn authorized(&self, builder: RequestBuilder) -> PortResult<Value> {
        let token = self.auth.id_token().await?;
        let response = builder
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        read_json(response).await
    }

    async fn run_owner_query(&self, collection: &str, owner_id: &str) -> PortResult<Vec<Value>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "userId" },
                        "op": "EQUAL",
                        "value": string_value(owner_id)
                    }
                }
            }
        });
        let value = self
            .authorized(self.http.post(self.url(":runQuery")).json(&body))
            .await?;
        let rows = value
            .as_array()
            .ok_or_else(|| PortError::Malformed("runQuery did not return an array".to_string()))?;
        // Rows without a `document` only carry a read time.
        Ok(rows
            .iter()
            .filter_map(|row| row.get("document").cloned())
            .collect())
    }

    async fn commit(&self, writes: Value) -> PortResult<()> {
        self.authorized(
            self.http
                .post(self.url(":commit"))
                .json(&json!({ "writes": writes })),
        )
        .await?;
        Ok(())
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for Firestore {
    async fn create_profile(&self, uid: &str, profile: &NewProfile) -> PortResult<()> {
        let body = json!({
            "fields": {
                "email": string_value(&profile.email),
                "role": string_value(profile.role.as_str()),
                "createdAt": timestamp_value(&profile.created_at)
            }
        });
        let url = self.url(&format!("/users/{}", urlencoding::encode(uid)));
        self.authorized(self.http.patch(url).json(&body)).await?;
        Ok(())
    }

    async fn get_profile(&self, uid: &str) -> PortResult<Option<Profile>> {
        let url = self.url(&format!("/users/{}", urlencoding::encode(uid)));
        let doc = match self.authorized(self.http.get(url)).await {
            Ok(doc) => doc,
            Err(PortError::NotFound(_)) => {
                debug!("No profile for {}", uid);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let (_, fields) = document_parts(&doc)?;
        Ok(Some(Profile {
            email: field_str(&fields, "email").unwrap_or_default().to_string(),
            role: Role::from_stored(field_str(&fields, "role").unwrap_or_default()),
            created_at: field_time(&fields, "createdAt").unwrap_or_else(Utc::now),
            stars: field_int(&fields, "stars").unwrap_or(0),
        }))
    }

    async fn increment_stars(&self, uid: &str) -> PortResult<()> {
        let writes = json!([{
            "transform": {
                "document": format!("{}/users/{}", self.resource_root(), uid),
                "fieldTransforms": [{
                    "fieldPath": "stars",
                    "increment": integer_value(1)
                }]
            },
            "currentDocument": { "exists": true }
        }]);
        self.commit(writes).await
    }

    async fn add_book(&self, book: &NewBook) -> PortResult<Book> {
        let body = json!({
            "fields": {
                "name": string_value(&book.display_name),
                "subject": string_value(&book.subject),
                "url": string_value(&book.content_location),
                "userId": string_value(&book.owner_id),
                "createdAt": timestamp_value(&book.created_at)
            }
        });
        let doc = self
            .authorized(self.http.post(self.url("/books")).json(&body))
            .await?;
        book_from_document(&doc)
    }

    async fn list_books(&self, owner_id: &str) -> PortResult<Vec<Book>> {
        let docs = self.run_owner_query("books", owner_id).await?;
        docs.iter().map(book_from_document).collect()
    }

    async fn delete_book(&self, book_id: &str) -> PortResult<()> {
        let url = self.url(&format!("/books/{}", urlencoding::encode(book_id)));
        self.authorized(self.http.delete(url)).await?;
        Ok(())
    }

    async fn add_study_log(&self, entry: &NewStudyLog) -> PortResult<()> {
        let name = format!(
            "{}/studyLogs/{}",
            self.resource_root(),
            Uuid::new_v4().simple()
        );
        let writes = json!([{
            "update": {
                "name": name,
                "fields": {
                    "userId": string_value(&entry.owner_id),
                    "subject": string_value(&entry.subject),
                    "duration": integer_value(i64::from(entry.duration_minutes))
                }
            },
            "updateTransforms": [{
                "fieldPath": "date",
                "setToServerValue": "REQUEST_TIME"
            }]
        }]);
        self.commit(writes).await
    }

    async fn list_study_logs(&self, owner_id: &str) -> PortResult<Vec<StudyLogEntry>> {
        let docs = self.run_owner_query("studyLogs", owner_id).await?;
        let mut entries = Vec::with_capacity(docs.len());
        for doc in &docs {
            match study_log_from_document(doc) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping unreadable study log: {}", e),
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_book_documents() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/books/abc123",
            "fields": {
                "name": {"stringValue": "fractions.pdf"},
                "subject": {"stringValue": "math"},
                "url": {"stringValue": "https://files/fractions.pdf"},
                "userId": {"stringValue": "u1"},
                "createdAt": {"timestampValue": "2024-05-01T10:00:00.123456Z"}
            }
        });
        let book = book_from_document(&doc).unwrap();
        assert_eq!(book.id, "abc123");
        assert_eq!(book.owner_id, "u1");
        assert_eq!(book.display_name, "fractions.pdf");
    }

    #[test]
    fn book_without_url_is_malformed() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/books/x",
            "fields": {"name": {"stringValue": "a"}, "subject": {"stringValue": "b"}, "userId": {"stringValue": "u"}}
        });
        assert!(matches!(book_from_document(&doc), Err(PortError::Malformed(_))));
    }

    #[test]
    fn integers_arrive_as_strings() {
        let fields = json!({"stars": {"integerValue": "7"}, "d": {"doubleValue": 2.0}});
        let fields = fields.as_object().unwrap();
        assert_eq!(field_int(fields, "stars"), Some(7));
        assert_eq!(field_int(fields, "d"), Some(2));
        assert_eq!(field_int(fields, "missing"), None);
    }
}
