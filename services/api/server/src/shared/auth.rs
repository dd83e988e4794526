//! Shared-secret authorization for operators (`api_key`) and devices
//! (`esp_token`).

/// The two secrets configured for the process.
#[derive(Clone, Copy)]
pub struct Secrets<'a> {
    pub api_key: &'a str,
    pub esp_token: &'a str,
}

/// Credentials supplied by a caller. An empty string means "not supplied".
#[derive(Clone, Copy, Default)]
pub struct Credentials<'a> {
    pub api_key: &'a str,
    pub esp_token: &'a str,
}

impl Credentials<'_> {
    /// A supplied `api_key` decides on its own: when it is wrong the request
    /// is denied even if `esp_token` is valid. Only without an `api_key` is
    /// the `esp_token` checked.
    pub fn authorize(&self, secrets: &Secrets<'_>) -> bool {
        if !self.api_key.is_empty() {
            return self.api_key == secrets.api_key;
        }
        self.esp_token == secrets.esp_token
    }
}
