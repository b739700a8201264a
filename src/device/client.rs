use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::device::DeviceError;
use crate::device::digest::{DigestCredentials, authorization, parse_challenge};
use crate::device::types::*;

/// Device-provisioned users stay valid until this date; matches the horizon
/// the plants were commissioned with.
const VALID_END: &str = "2027-12-31T23:59:59";

const EVENT_PAGE_SIZE: u32 = 500;
const USER_SEARCH_MAX: u32 = 10_000;

/// HTTP client for the access-control device.
///
/// All endpoints take `?format=json&devIndex=...` and authenticate with HTTP
/// digest: the first request draws a 401 challenge, the retry carries the
/// computed Authorization header.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: String,
    dev_index: String,
    creds: DigestCredentials,
}

impl DeviceClient {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.device_base_url,
            &config.device_index,
            DigestCredentials {
                username: config.device_username.clone(),
                password: config.device_password.clone(),
            },
            Duration::from_secs(config.device_timeout_secs),
        )
    }

    pub fn new(
        base_url: &str,
        dev_index: &str,
        creds: DigestCredentials,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build device http client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            dev_index: dev_index.to_string(),
            creds,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}?format=json&devIndex={}",
            path, self.dev_index
        )
    }

    /// One digest-authenticated call. Returns the final response with a
    /// success status; everything else is mapped onto `DeviceError`.
    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path_and_query: &str,
        body: &B,
    ) -> Result<Response, DeviceError> {
        let url = format!("{}{}", self.base_url, path_and_query);

        let first = self
            .http
            .request(method.clone(), &url)
            .json(body)
            .send()
            .await
            .map_err(DeviceError::Unreachable)?;

        let response = if first.status() == StatusCode::UNAUTHORIZED {
            let challenge = first
                .headers()
                .get("WWW-Authenticate")
                .and_then(|h| h.to_str().ok())
                .and_then(parse_challenge)
                .ok_or(DeviceError::Auth)?;

            let cnonce = Uuid::new_v4().simple().to_string();
            let auth = authorization(
                &self.creds,
                &challenge,
                method.as_str(),
                path_and_query,
                &cnonce,
            );

            debug!(path = path_and_query, "Retrying device call with digest auth");

            let second = self
                .http
                .request(method, &url)
                .header("Authorization", auth)
                .json(body)
                .send()
                .await
                .map_err(DeviceError::Unreachable)?;

            if second.status() == StatusCode::UNAUTHORIZED {
                return Err(DeviceError::Auth);
            }
            second
        } else {
            first
        };

        if !response.status().is_success() {
            return Err(DeviceError::Status(response.status().as_u16()));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DeviceError> {
        response
            .json::<T>()
            .await
            .map_err(|e| DeviceError::Malformed(e.to_string()))
    }

    /// Check-in/out events observed in `[start, end]`.
    ///
    /// Events not tied to a provisioned user carry no employeeNoString and
    /// are dropped, same as every other consumer of this endpoint.
    pub async fn fetch_events(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<DeviceEvent>, DeviceError> {
        let body = AcsEventSearch {
            cond: AcsEventCond {
                search_id: Uuid::new_v4().simple().to_string(),
                search_result_position: 0,
                max_results: EVENT_PAGE_SIZE,
                start_time: start.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
                end_time: end.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            },
        };

        let response = self
            .call(
                Method::POST,
                &self.endpoint("/ISAPI/AccessControl/AcsEvent"),
                &body,
            )
            .await?;

        let reply: AcsEventReply = Self::decode(response).await?;

        let rows = reply.acs_event.map(|b| b.info_list).unwrap_or_default();

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let employee_no = match row.employee_no {
                Some(no) if !no.is_empty() => no,
                _ => continue,
            };

            let time = DateTime::parse_from_rfc3339(&row.time).map_err(|e| {
                DeviceError::Malformed(format!("bad event time '{}': {}", row.time, e))
            })?;

            events.push(DeviceEvent { employee_no, time });
        }

        Ok(events)
    }

    pub async fn enroll_user(
        &self,
        employee_no: &str,
        name: &str,
        valid_from: NaiveDate,
    ) -> Result<(), DeviceError> {
        let body = UserInfoRecord {
            user_info: vec![Self::user_info(employee_no, name, valid_from)],
        };

        self.call(
            Method::POST,
            &self.endpoint("/ISAPI/AccessControl/UserInfo/Record"),
            &body,
        )
        .await?;

        Ok(())
    }

    pub async fn update_user(
        &self,
        employee_no: &str,
        name: &str,
        valid_from: NaiveDate,
    ) -> Result<(), DeviceError> {
        let body = UserInfoModify {
            user_info: Self::user_info(employee_no, name, valid_from),
        };

        self.call(
            Method::PUT,
            &self.endpoint("/ISAPI/AccessControl/UserInfo/Modify"),
            &body,
        )
        .await?;

        Ok(())
    }

    pub async fn remove_user(&self, employee_no: &str) -> Result<(), DeviceError> {
        let body = UserInfoDelete {
            detail: UserInfoDeleteDetail {
                mode: "byEmployeeNo".to_string(),
                employee_no_list: vec![EmployeeNoRef {
                    employee_no: employee_no.to_string(),
                }],
            },
        };

        self.call(
            Method::PUT,
            &self.endpoint("/ISAPI/AccessControl/UserInfoDetail/Delete"),
            &body,
        )
        .await?;

        Ok(())
    }

    /// Drop the stored face pictures for one employee code. The nightly
    /// maintenance job calls this for every labour code.
    pub async fn remove_face(&self, employee_no: &str) -> Result<(), DeviceError> {
        let body = FaceDelete {
            cond: FaceDeleteCond {
                employee_no_list: vec![EmployeeNoRef {
                    employee_no: employee_no.to_string(),
                }],
            },
        };

        self.call(
            Method::PUT,
            &self.endpoint("/ISAPI/Intelligent/FDLib/FDSearch/Delete"),
            &body,
        )
        .await?;

        Ok(())
    }

    /// All users currently provisioned on the device.
    pub async fn search_users(&self) -> Result<Vec<DeviceUser>, DeviceError> {
        let body = UserInfoSearch {
            cond: UserInfoSearchCond {
                search_id: Uuid::new_v4().simple().to_string(),
                search_result_position: 0,
                max_results: USER_SEARCH_MAX,
            },
        };

        let response = self
            .call(
                Method::POST,
                &self.endpoint("/ISAPI/AccessControl/UserInfo/Search"),
                &body,
            )
            .await?;

        let reply: UserInfoSearchReply = Self::decode(response).await?;

        let users = reply
            .search
            .map(|b| b.user_info)
            .unwrap_or_default()
            .into_iter()
            .map(|row| DeviceUser {
                employee_no: row.employee_no,
                name: row.name,
            })
            .collect();

        Ok(users)
    }

    fn user_info(employee_no: &str, name: &str, valid_from: NaiveDate) -> UserInfo {
        UserInfo {
            employee_no: employee_no.to_string(),
            name: name.to_string(),
            valid: ValidWindow {
                begin_time: format!("{}T00:00:00", valid_from.format("%Y-%m-%d")),
                end_time: VALID_END.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DeviceClient {
        DeviceClient::new(
            &server.uri(),
            "DEV-1",
            DigestCredentials {
                username: "operator".into(),
                password: "secret".into(),
            },
            Duration::from_secs(5),
        )
    }

    fn ist(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(5 * 3600 + 30 * 60)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
    }

    #[tokio::test]
    async fn answers_digest_challenge_then_decodes_events() {
        let server = MockServer::start().await;

        // First request draws the challenge...
        Mock::given(method("POST"))
            .and(path("/ISAPI/AccessControl/AcsEvent"))
            .respond_with(ResponseTemplate::new(401).insert_header(
                "WWW-Authenticate",
                r#"Digest realm="device", nonce="abc123", qop="auth""#,
            ))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        // ...the authorized retry gets the events.
        Mock::given(method("POST"))
            .and(path("/ISAPI/AccessControl/AcsEvent"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AcsEvent": {
                    "InfoList": [
                        {"employeeNoString": "LAB000042", "time": "2025-03-14T08:15:00+05:30"},
                        {"time": "2025-03-14T08:16:00+05:30"},
                        {"employeeNoString": "LAB000042", "time": "2025-03-14T17:45:00+05:30"}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let events = client
            .fetch_events(ist(2025, 3, 14, 0, 0, 0), ist(2025, 3, 14, 23, 59, 59))
            .await
            .expect("fetch should succeed");

        // The row without an employee code is dropped
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].employee_no, "LAB000042");
        assert_eq!(events[0].time, ist(2025, 3, 14, 8, 15, 0));
    }

    #[tokio::test]
    async fn repeated_401_reports_auth_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).insert_header(
                "WWW-Authenticate",
                r#"Digest realm="device", nonce="abc123", qop="auth""#,
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_events(ist(2025, 3, 14, 0, 0, 0), ist(2025, 3, 14, 23, 59, 59))
            .await
            .unwrap_err();

        assert!(matches!(err, DeviceError::Auth));
    }

    #[tokio::test]
    async fn non_success_status_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.remove_user("LAB000001").await.unwrap_err();

        assert!(matches!(err, DeviceError::Status(500)));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<xml>nope</xml>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_events(ist(2025, 3, 14, 0, 0, 0), ist(2025, 3, 14, 23, 59, 59))
            .await
            .unwrap_err();

        assert!(matches!(err, DeviceError::Malformed(_)));
    }
}
