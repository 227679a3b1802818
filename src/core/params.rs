//! Identifying parameters of a shared file

use crate::error::CtError;
use std::fmt;

/// Parameters the direct-link API needs to locate a file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileParameters {
    /// Owner of the share
    pub user_id: String,
    /// File identifier
    pub file_id: String,
    /// Folder identifier (may be empty)
    pub folder_id: String,
    /// Server-side checksum token
    pub file_checksum: String,
    /// `mb` flag
    pub mobile_flag: String,
    /// `app` flag
    pub app_flag: String,
    /// Optional challenge token
    pub verify_code: String,
}

impl FileParameters {
    /// Check that every field the direct-link API requires is present
    pub fn validate(&self) -> Result<(), CtError> {
        let required = [
            ("userid", &self.user_id),
            ("file_id", &self.file_id),
            ("file_chk", &self.file_checksum),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CtError::missing(name));
            }
        }
        Ok(())
    }

    /// Validate and return self
    pub fn validated(self) -> Result<Self, CtError> {
        self.validate()?;
        Ok(self)
    }
}

impl fmt::Display for FileParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uid={} fid={} folder={} chk={} mb={} app={}",
            self.user_id,
            self.file_id,
            self.folder_id,
            self.file_checksum,
            self.mobile_flag,
            self.app_flag
        )
    }
}

/// Positional arguments of the share page's `free_down(...)` call.
///
/// The page is not under our control, so the order is fixed here rather than
/// inferred:
///
/// | index | field           |
/// |-------|-----------------|
/// | 0     | `file_id`       |
/// | 1     | `folder_id`     |
/// | 2     | `file_checksum` |
/// | 3     | `mobile_flag`   |
/// | 4     | `app_flag`      |
/// | 5     | ignored         |
/// | 6     | `verify_code`   |
///
/// `verify_code` is empty unless a seventh token exists.
///
/// Tokens are maximal `[A-Za-z0-9]+` runs, so mixed-case checksums such as
/// `AbC9` stay whole. Quotes, commas and empty string literals produce no token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeDownArgs {
    pub file_id: String,
    pub folder_id: String,
    pub file_checksum: String,
    pub mobile_flag: String,
    pub app_flag: String,
    pub verify_code: String,
}

impl FreeDownArgs {
    /// Number of leading tokens that must be present
    pub const REQUIRED: usize = 5;
    /// Position of the verify code
    pub const VERIFY_CODE_INDEX: usize = 6;

    /// Map tokenized arguments onto the fixed positions
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, CtError> {
        if tokens.len() < Self::REQUIRED {
            return Err(CtError::Resolution(format!(
                "free_down(...) has {} arguments, expected at least {}",
                tokens.len(),
                Self::REQUIRED
            )));
        }

        let at = |i: usize| tokens[i].as_ref().to_string();
        let verify_code = tokens
            .get(Self::VERIFY_CODE_INDEX)
            .map(|t| t.as_ref().to_string())
            .unwrap_or_default();

        Ok(Self {
            file_id: at(0),
            folder_id: at(1),
            file_checksum: at(2),
            mobile_flag: at(3),
            app_flag: at(4),
            verify_code,
        })
    }

    /// Combine with the page's `userid` into full parameters
    pub fn into_parameters(self, user_id: impl Into<String>) -> FileParameters {
        FileParameters {
            user_id: user_id.into(),
            file_id: self.file_id,
            folder_id: self.folder_id,
            file_checksum: self.file_checksum,
            mobile_flag: self.mobile_flag,
            app_flag: self.app_flag,
            verify_code: self.verify_code,
        }
    }
}
