use std::fs::{read_to_string, OpenOptions};
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::OAuthError;

/// Permissions of credential files written on unix.
#[cfg(unix)]
const CREDENTIAL_FILE_MODE: u32 = 0o600;

/// Realm used in the `Authorization` header when the credentials don't name one.
pub const DEFAULT_REALM: &str = "API";

/// The OAuth token tuple issued by Ubuntu SSO for a named token.
///
/// The field names match the JSON returned by the token endpoint, so values of this type can be
/// deserialized straight from its response.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token_key: String,
    pub token_secret: String,
    #[serde(default)]
    pub token_name: String,
    /// Realm to put in the `Authorization` header, `API` if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
}

impl Credentials {
    /// The realm that is sent with signed requests.
    pub fn realm(&self) -> &str {
        match &self.realm {
            Some(realm) if !realm.is_empty() => realm,
            _ => DEFAULT_REALM,
        }
    }

    /// This helper function constructs the path to the default location of the on-disk credential
    /// file.
    pub fn default_path() -> Result<PathBuf, OAuthError> {
        let home = dirs::home_dir().ok_or_else(|| OAuthError::CredentialFileError {
            message: String::from("Unable to determine home directory."),
        })?;
        Ok(home.join(".usso/credentials.json"))
    }

    /// Attempt to read credentials from a JSON file on disk.
    pub fn read_from_disk(path: &Path) -> Result<Credentials, OAuthError> {
        let contents = match read_to_string(path) {
            Ok(string) => string,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(OAuthError::CredentialFileError {
                    message: format!("No credential file found at {}.", path.display()),
                });
            },
            Err(error) => return Err(error.into()),
        };

        let credentials = serde_json::from_str(&contents)?;
        log::debug!("Loaded credentials from {}.", path.display());

        Ok(credentials)
    }

    /// Attempt to write credentials to a JSON file on disk, creating parent directories as needed.
    ///
    /// On unix, the file is only readable and writable by its owner.
    pub fn write_to_disk(&self, path: &Path) -> Result<(), OAuthError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(CREDENTIAL_FILE_MODE);

        let mut file = options.open(path)?;

        // the mode only applies to newly created files
        #[cfg(unix)]
        file.set_permissions(std::fs::Permissions::from_mode(CREDENTIAL_FILE_MODE))?;

        file.write_all(contents.as_bytes())?;
        log::debug!("Stored credentials in {}.", path.display());

        Ok(())
    }
}
