//! Wi-Fi credential payloads written to the WifiConnect characteristic.
//!
//! The controller writes `"<ssid>,<password>"` as UTF-8.  The payload is split
//! on the **first** comma, so an SSID cannot contain a comma; anything after
//! the first comma (including further commas) is the password.

use crate::domain::error::BridgeError;

/// Credentials decoded from a WifiConnect write.
#[derive(Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

// Hand-written so the password never ends up in a log line.
impl std::fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl WifiCredentials {
    /// Parses a raw characteristic payload.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedInput`] if the payload is not UTF-8,
    /// has no comma, or has an empty SSID.
    pub fn parse(payload: &[u8]) -> Result<Self, BridgeError> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| BridgeError::MalformedInput("wifi payload is not UTF-8".into()))?;
        let (ssid, password) = text.split_once(',').ok_or_else(|| {
            BridgeError::MalformedInput("wifi payload must be \"<ssid>,<password>\"".into())
        })?;
        if ssid.is_empty() {
            return Err(BridgeError::MalformedInput("wifi ssid is empty".into()));
        }
        Ok(Self {
            ssid: ssid.to_string(),
            password: password.to_string(),
        })
    }

    /// Arguments for `nmcli` that join this network.
    pub fn nmcli_args(&self) -> Vec<String> {
        vec![
            "device".into(),
            "wifi".into(),
            "connect".into(),
            self.ssid.clone(),
            "password".into(),
            self.password.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;

    #[test]
    fn test_parse_splits_ssid_and_password() {
        let creds = WifiCredentials::parse(b"myssid,mypass").unwrap();
        assert_eq!(creds.ssid, "myssid");
        assert_eq!(creds.password, "mypass");
    }

    #[test]
    fn test_parse_splits_on_first_comma_only() {
        let creds = WifiCredentials::parse(b"lab,pa,ss,word").unwrap();
        assert_eq!(creds.ssid, "lab");
        assert_eq!(creds.password, "pa,ss,word");
    }

    #[test]
    fn test_parse_accepts_open_network_with_empty_password() {
        let creds = WifiCredentials::parse(b"guest,").unwrap();
        assert_eq!(creds.ssid, "guest");
        assert!(creds.password.is_empty());
    }

    #[test]
    fn test_parse_without_comma_is_malformed() {
        let err = WifiCredentials::parse(b"no-comma-here").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_parse_empty_ssid_is_malformed() {
        let err = WifiCredentials::parse(b",secret").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_parse_invalid_utf8_is_malformed() {
        let err = WifiCredentials::parse(&[0xff, b',', 0xfe]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_nmcli_args_keep_ssid_with_spaces_as_one_argument() {
        let creds = WifiCredentials::parse(b"Office WiFi,hunter2").unwrap();
        assert_eq!(
            creds.nmcli_args(),
            vec!["device", "wifi", "connect", "Office WiFi", "password", "hunter2"]
        );
    }

    #[test]
    fn test_debug_output_redacts_password() {
        let creds = WifiCredentials::parse(b"net,topsecret").unwrap();
        let printed = format!("{creds:?}");
        assert!(printed.contains("net"));
        assert!(!printed.contains("topsecret"));
    }
}
