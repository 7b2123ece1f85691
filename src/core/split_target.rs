//! Split targets and the Git refs derived for them.

use std::fmt;

/// Prefix of the local refs the subtree history is extracted into.
pub const SPLIT_REF_PREFIX: &str = "refs/splits/";

/// How CI names the branch it creates for a tag push.
const TAG_ORIGIN_PREFIX: &str = "heads/refs/tags";

/// A subdirectory published to its own remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitTarget {
    /// Path relative to the project root, as declared in composer.json
    pub path: String,

    /// Remote repository URL
    pub remote: String,
}

impl SplitTarget {
    pub fn new(path: impl Into<String>, remote: impl Into<String>) -> Self {
        SplitTarget {
            path: path.into(),
            remote: remote.into(),
        }
    }

    /// Local ref the subtree is extracted into (`refs/splits/<path>`).
    ///
    /// Using a separate ref keeps the checked-out branch untouched.
    pub fn local_ref(&self) -> String {
        format!("{}{}", SPLIT_REF_PREFIX, self.path)
    }

    /// `--prefix` argument for the subtree splitter (`<path>/`).
    pub fn prefix(&self) -> String {
        format!("{}/", self.path.trim_end_matches('/'))
    }

    /// `<local>:<remote>` refspec for `git push`.
    pub fn refspec(&self, target_ref: &TargetRef) -> String {
        format!("{}:{}", self.local_ref(), target_ref)
    }
}

/// The reference pushed to on each remote, derived from the checked-out ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    name: String,
    is_tag: bool,
}

impl TargetRef {
    /// Derive the push target from `git rev-parse --abbrev-ref HEAD` output.
    ///
    /// CI checks tags out as a branch named `heads/refs/tags/<tag>`; those
    /// become `refs/tags/<tag>`. Anything else is pushed as a branch.
    pub fn from_current_ref(current: &str) -> Self {
        let current = current.trim();
        if current.starts_with(TAG_ORIGIN_PREFIX) {
            TargetRef {
                name: current.replacen("heads/", "", 1),
                is_tag: true,
            }
        } else {
            TargetRef {
                name: format!("refs/heads/{}", current),
                is_tag: false,
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn is_tag(&self) -> bool {
        self.is_tag
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Progress of one split target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitState {
    Pending,
    Extracted,
    Pushed,
    Aborted,
}

impl SplitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitState::Pending => "pending",
            SplitState::Extracted => "extracted",
            SplitState::Pushed => "pushed",
            SplitState::Aborted => "aborted",
        }
    }
}

impl fmt::Display for SplitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
