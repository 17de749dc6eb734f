//! Transfer intent and the deep-link query contract

use crate::error::{TrackerError, TrackerResult};

use url::Url;

/// Validated transfer parameters prior to any signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub to: String,
    /// Decimal string; never parsed into a float
    pub value: String,
    pub token: String,
}

impl TransferIntent {
    pub fn new(
        to: impl Into<String>,
        value: impl Into<String>,
        token: impl Into<String>,
    ) -> TrackerResult<Self> {
        let to = to.into();
        let value = value.into();
        let token = token.into();
        if to.trim().is_empty() {
            return Err(TrackerError::InvalidIntent { field: "to" });
        }
        if value.trim().is_empty() {
            return Err(TrackerError::InvalidIntent { field: "value" });
        }
        if token.trim().is_empty() {
            return Err(TrackerError::InvalidIntent { field: "token" });
        }
        Ok(Self { to, value, token })
    }
}

/// A parsed transfer deep link: `?to=&value=&token=` plus an optional
/// resume identifier `id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLink {
    pub intent: TransferIntent,
    pub id: Option<String>,
}

impl TransferLink {
    /// Parse and validate a transfer URL. Absence of any of `to`, `value`,
    /// `token` is a terminal validation error for the navigation.
    pub fn parse(raw: &str) -> TrackerResult<Self> {
        let url = Url::parse(raw).map_err(|_| TrackerError::InvalidIntent { field: "link" })?;

        let mut to = None;
        let mut value = None;
        let mut token = None;
        let mut id = None;
        for (key, val) in url.query_pairs() {
            match key.as_ref() {
                "to" => to = Some(val.into_owned()),
                "value" => value = Some(val.into_owned()),
                "token" => token = Some(val.into_owned()),
                "id" => id = Some(val.into_owned()),
                _ => {}
            }
        }

        let intent = TransferIntent::new(
            to.unwrap_or_default(),
            value.unwrap_or_default(),
            token.unwrap_or_default(),
        )?;

        Ok(Self { intent, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_link() {
        let link = TransferLink::parse(
            "https://tracker.example/transaction?to=0xABC&value=0.5&token=ETH&id=tx-1",
        )
        .expect("valid link");
        assert_eq!(link.intent.to, "0xABC");
        assert_eq!(link.intent.value, "0.5");
        assert_eq!(link.intent.token, "ETH");
        assert_eq!(link.id.as_deref(), Some("tx-1"));
    }

    #[test]
    fn id_is_optional() {
        let link =
            TransferLink::parse("https://tracker.example/transaction?to=0xABC&value=0.5&token=ETH")
                .expect("valid link");
        assert_eq!(link.id, None);
    }

    #[test]
    fn missing_parameters_fail_in_declared_order() {
        let cases = [
            ("https://t.example/tx?value=0.5&token=ETH", "to"),
            ("https://t.example/tx?to=0xABC&token=ETH", "value"),
            ("https://t.example/tx?to=0xABC&value=0.5", "token"),
        ];
        for (raw, expected_field) in cases {
            match TransferLink::parse(raw) {
                Err(TrackerError::InvalidIntent { field }) => assert_eq!(field, expected_field),
                other => panic!("expected InvalidIntent for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let link = TransferLink::parse(
            "https://t.example/tx?to=0xABC&value=1%2E25&token=ETH",
        )
        .expect("valid link");
        assert_eq!(link.intent.value, "1.25");
    }

    #[test]
    fn unparseable_url_is_invalid_intent() {
        assert!(matches!(
            TransferLink::parse("not a url"),
            Err(TrackerError::InvalidIntent { field: "link" })
        ));
    }

    #[test]
    fn blank_values_count_as_missing() {
        assert!(matches!(
            TransferIntent::new("  ", "0.5", "ETH"),
            Err(TrackerError::InvalidIntent { field: "to" })
        ));
    }
}
