//! Credential loading: share link → direct download → JSON key list.
//!
//! The credential list lives in a hosted JSON document behind a Drive-style
//! share link. The link itself is not directly fetchable; the resource id
//! embedded between `/d/` and the following `/` must be rewritten into the
//! `uc?export=download` form first.
//!
//! The list is refetched on every assessment — credentials are rotated
//! server-side by editing the hosted file, and nothing is cached here.

use crate::error::LessonLensError;
use std::time::Duration;
use tracing::{debug, info};

/// Rewrite a share link into its direct-download URL.
///
/// Fails with [`LessonLensError::BadShareLink`] when no `/d/<id>/` segment
/// is present rather than guessing at the id.
pub fn direct_download_url(share_link: &str) -> Result<String, LessonLensError> {
    let id = share_link
        .split_once("/d/")
        .map(|(_, rest)| rest)
        .and_then(|rest| rest.split(['/', '?']).next())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| LessonLensError::BadShareLink {
            url: share_link.to_string(),
        })?;

    Ok(format!(
        "https://drive.google.com/uc?export=download&id={id}"
    ))
}

/// Parse a fetched body as a non-empty JSON array of key strings.
pub(crate) fn parse_credentials(body: &str) -> Result<Vec<String>, LessonLensError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| LessonLensError::KeyListInvalid {
            detail: format!("not valid JSON ({e})"),
        })?;

    let items = value
        .as_array()
        .ok_or_else(|| LessonLensError::KeyListInvalid {
            detail: "top-level value is not an array".into(),
        })?;

    let keys = items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| LessonLensError::KeyListInvalid {
                    detail: "array element is not a string".into(),
                })
        })
        .collect::<Result<Vec<String>, _>>()?;

    if keys.is_empty() {
        return Err(LessonLensError::KeyListEmpty);
    }
    Ok(keys)
}

/// Fetch the credential list behind a share link.
///
/// One unauthenticated GET to the derived URL. Every failure shape gets its
/// own error variant so the caller can show a precise message; none of them
/// is retried here.
pub async fn load_credentials(
    share_link: &str,
    timeout_secs: u64,
) -> Result<Vec<String>, LessonLensError> {
    let url = direct_download_url(share_link)?;
    debug!("Fetching credential list from {url}");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LessonLensError::KeyFetchFailed {
            reason: e.to_string(),
        })?;

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| LessonLensError::KeyFetchFailed {
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(LessonLensError::KeyFetchStatus {
            status: response.status().as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| LessonLensError::KeyFetchFailed {
            reason: e.to_string(),
        })?;

    let keys = parse_credentials(&body)?;
    info!("Loaded {} credential(s)", keys.len());
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_link_is_rewritten() {
        let url =
            direct_download_url("https://drive.google.com/file/d/1aBcD_ef/view?usp=sharing")
                .unwrap();
        assert_eq!(
            url,
            "https://drive.google.com/uc?export=download&id=1aBcD_ef"
        );
    }

    #[test]
    fn share_link_without_trailing_segment_still_resolves() {
        let url = direct_download_url("https://drive.google.com/file/d/1aBcD_ef").unwrap();
        assert!(url.ends_with("id=1aBcD_ef"));
    }

    #[test]
    fn malformed_share_link_is_rejected() {
        let err = direct_download_url("https://drive.google.com/open?id=123").unwrap_err();
        assert!(matches!(err, LessonLensError::BadShareLink { .. }));

        let err = direct_download_url("https://drive.google.com/file/d//view").unwrap_err();
        assert!(matches!(err, LessonLensError::BadShareLink { .. }));
    }

    #[test]
    fn well_formed_list_parses() {
        let keys = parse_credentials(r#"["AIzaOne", "AIzaTwo"]"#).unwrap();
        assert_eq!(keys, vec!["AIzaOne", "AIzaTwo"]);
    }

    #[test]
    fn non_array_shape_is_rejected() {
        let err = parse_credentials(r#"{"keys": []}"#).unwrap_err();
        assert!(matches!(err, LessonLensError::KeyListInvalid { .. }));
    }

    #[test]
    fn non_string_element_is_rejected() {
        let err = parse_credentials(r#"["AIzaOne", 7]"#).unwrap_err();
        assert!(matches!(err, LessonLensError::KeyListInvalid { .. }));
    }

    #[test]
    fn empty_array_is_its_own_error() {
        let err = parse_credentials("[]").unwrap_err();
        assert!(matches!(err, LessonLensError::KeyListEmpty));
    }

    #[test]
    fn garbage_body_is_rejected() {
        let err = parse_credentials("<html>quota exceeded</html>").unwrap_err();
        assert!(matches!(err, LessonLensError::KeyListInvalid { .. }));
    }
}
