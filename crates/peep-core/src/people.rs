//! Google People API client and profile presentation.
//!
//! One authenticated read of `people/me` restricted to birthdays and
//! genders, mapped into a `ProfileRecord` that knows how to render itself
//! as the two display lines.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::auth::{self, Account, oauth};
use crate::config::Config;

/// Field mask for the profile read. Only these two fields are ever asked for.
const PERSON_FIELDS: &str = "birthdays,genders";

/// A birthday as the People API models it: any component may be unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Birthday {
    pub year: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// The profile data this app cares about. At most one of each, taken from
/// the first entry of the corresponding People API list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRecord {
    pub birthday: Option<Birthday>,
    pub gender: Option<String>,
}

impl ProfileRecord {
    /// Formats the birthday display line.
    ///
    /// Unset date components render as `0`, the People API convention for
    /// "not shared". No birthday entry at all renders as `None`.
    pub fn birthday_line(&self) -> String {
        match &self.birthday {
            Some(date) => format!(
                "Birthday: {}-{}-{}",
                date.year.unwrap_or(0),
                date.month.unwrap_or(0),
                date.day.unwrap_or(0)
            ),
            None => "Birthday: None".to_string(),
        }
    }

    /// Formats the gender display line. `None` when the profile has no
    /// gender entry or the entry carries no label.
    pub fn gender_line(&self) -> String {
        match &self.gender {
            Some(label) => format!("Gender: {label}"),
            None => "Gender: None".to_string(),
        }
    }

    /// Renders both display lines in fixed order, newline-terminated.
    pub fn render(&self) -> String {
        format!("{}\n{}\n", self.birthday_line(), self.gender_line())
    }
}

/// Result of a full code-to-profile fetch.
#[derive(Debug, Clone)]
pub struct FetchedProfile {
    pub record: ProfileRecord,
    /// Account identity decoded from the id_token, when one came back.
    pub account: Option<Account>,
    /// The access token minted for this fetch; held in memory only, so a
    /// later sign-out can revoke it.
    pub access_token: String,
}

// Wire types for the People API response. Unknown fields are ignored.

#[derive(Debug, Deserialize)]
struct PersonResponse {
    #[serde(default)]
    birthdays: Vec<BirthdayEntry>,
    #[serde(default)]
    genders: Vec<GenderEntry>,
}

#[derive(Debug, Deserialize)]
struct BirthdayEntry {
    date: Option<DateWire>,
}

#[derive(Debug, Deserialize)]
struct DateWire {
    year: Option<u32>,
    month: Option<u32>,
    day: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenderEntry {
    #[serde(rename = "formattedValue")]
    formatted_value: Option<String>,
}

impl PersonResponse {
    /// First birthday entry, first gender entry; the rest are ignored.
    fn into_record(self) -> ProfileRecord {
        let birthday = self
            .birthdays
            .into_iter()
            .next()
            .and_then(|entry| entry.date)
            .map(|date| Birthday {
                year: date.year,
                month: date.month,
                day: date.day,
            });

        let gender = self
            .genders
            .into_iter()
            .next()
            .and_then(|entry| entry.formatted_value)
            .filter(|label| !label.is_empty());

        ProfileRecord {
            birthday,
            gender,
        }
    }
}

/// Reads `people/me` with the given bearer token.
///
/// # Errors
/// Returns an error on transport failure, a non-success status, or a
/// malformed response body.
pub async fn fetch_with_token(config: &Config, access_token: &str) -> Result<ProfileRecord> {
    let client = reqwest::Client::new();
    let url = format!("{}/v1/people/me", config.endpoints.people_base_url);

    let response = client
        .get(&url)
        .query(&[("personFields", PERSON_FIELDS)])
        .bearer_auth(access_token)
        .send()
        .await
        .context("Failed to send People API request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Profile read failed (HTTP {status}): {body}");
    }

    let person: PersonResponse = response
        .json()
        .await
        .context("Failed to parse People API response")?;

    Ok(person.into_record())
}

/// Exchanges a server auth code for a bearer token and reads the profile.
///
/// Server auth codes were minted elsewhere, so the exchange carries no PKCE
/// verifier and an empty redirect target.
///
/// # Errors
/// Returns an error if the exchange or the profile read fails.
pub async fn fetch_profile(config: &Config, server_auth_code: &str) -> Result<FetchedProfile> {
    let tokens = oauth::exchange_code(config, server_auth_code, None, "").await?;
    fetch_with_tokens(config, tokens).await
}

/// Exchanges an interactive-flow code (PKCE verifier + localhost redirect)
/// and reads the profile.
///
/// # Errors
/// Returns an error if the exchange or the profile read fails.
pub async fn fetch_profile_interactive(
    config: &Config,
    code: &str,
    verifier: &str,
    redirect_uri: &str,
) -> Result<FetchedProfile> {
    let tokens = oauth::exchange_code(config, code, Some(verifier), redirect_uri).await?;
    fetch_with_tokens(config, tokens).await
}

async fn fetch_with_tokens(
    config: &Config,
    tokens: oauth::BearerTokens,
) -> Result<FetchedProfile> {
    let record = fetch_with_token(config, &tokens.access).await?;
    let account = tokens.id_token.as_deref().and_then(auth::decode_account);

    tracing::debug!(
        token = %oauth::mask_token(&tokens.access),
        "profile fetched"
    );

    Ok(FetchedProfile {
        record,
        account,
        access_token: tokens.access,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ProfileRecord {
        serde_json::from_str::<PersonResponse>(json)
            .unwrap()
            .into_record()
    }

    /// Test: full record renders both lines exactly.
    #[test]
    fn test_render_full_record() {
        let record = parse(
            r#"{
                "birthdays": [{"date": {"year": 2000, "month": 5, "day": 17}}],
                "genders": [{"formattedValue": "Male"}]
            }"#,
        );
        assert_eq!(record.render(), "Birthday: 2000-5-17\nGender: Male\n");
    }

    /// Test: empty lists render the absent marker on both lines.
    #[test]
    fn test_render_empty_record() {
        let record = parse(r"{}");
        assert_eq!(record.render(), "Birthday: None\nGender: None\n");
    }

    /// Test: only the first entry of each list is used.
    #[test]
    fn test_first_entries_win() {
        let record = parse(
            r#"{
                "birthdays": [
                    {"date": {"year": 1999, "month": 1, "day": 2}},
                    {"date": {"year": 2000, "month": 5, "day": 17}}
                ],
                "genders": [
                    {"formattedValue": "Female"},
                    {"formattedValue": "Male"}
                ]
            }"#,
        );
        assert_eq!(record.birthday_line(), "Birthday: 1999-1-2");
        assert_eq!(record.gender_line(), "Gender: Female");
    }

    /// Test: unset date components render as zero.
    #[test]
    fn test_partial_birthday_renders_zero() {
        let record = parse(r#"{"birthdays": [{"date": {"month": 5, "day": 17}}]}"#);
        assert_eq!(record.birthday_line(), "Birthday: 0-5-17");
    }

    /// Test: a gender entry without a label counts as absent.
    #[test]
    fn test_gender_without_label() {
        let record = parse(r#"{"genders": [{}]}"#);
        assert_eq!(record.gender_line(), "Gender: None");

        let record = parse(r#"{"genders": [{"formattedValue": ""}]}"#);
        assert_eq!(record.gender_line(), "Gender: None");
    }

    /// Test: a birthday entry without a date counts as absent.
    #[test]
    fn test_birthday_without_date() {
        let record = parse(r#"{"birthdays": [{}]}"#);
        assert_eq!(record.birthday_line(), "Birthday: None");
    }
}
