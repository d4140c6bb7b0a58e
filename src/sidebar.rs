//! Sidebar draft: local edits to the profile, key, sources and sort that
//! are held until the user applies them.

use crate::api::{ApiClient, SourceId, UserProfile};
use crate::feed::SortMode;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

// ============================================================================
// Quick Profiles
// ============================================================================

/// A one-press keyword/focus preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickProfile {
    pub label: &'static str,
    pub keywords: &'static str,
    pub focus: &'static str,
}

pub const QUICK_PROFILES: [QuickProfile; 6] = [
    QuickProfile {
        label: "Counter-drone / C-UAS",
        keywords: "counter-UAS, drone defeat, C-UAS, RF detection, UAS",
        focus: "Counter-drone and UAS defeat systems",
    },
    QuickProfile {
        label: "AI / ML for DoD",
        keywords: "artificial intelligence, machine learning, autonomy, AI",
        focus: "AI and ML applications for defense",
    },
    QuickProfile {
        label: "Cybersecurity",
        keywords: "cybersecurity, zero trust, SIEM, vulnerability, network defense",
        focus: "DoD and IC cybersecurity contracts",
    },
    QuickProfile {
        label: "Space / SDA",
        keywords: "space domain awareness, satellite, SDA, launch, space systems",
        focus: "Space systems and domain awareness",
    },
    QuickProfile {
        label: "Hypersonics",
        keywords: "hypersonic, glide vehicle, propulsion, thermal protection",
        focus: "Hypersonic weapons and propulsion R&D",
    },
    QuickProfile {
        label: "ISR / Sensors",
        keywords: "ISR, intelligence surveillance, sensor fusion, EO/IR, radar",
        focus: "ISR platforms and sensor systems",
    },
];

// ============================================================================
// Rows
// ============================================================================

/// Editable text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Focus,
    Keywords,
    ApiKey,
}

/// One selectable line in the sidebar, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarRow {
    Field(DraftField),
    Preset(usize),
    Source(SourceId),
    Sort(SortMode),
    Apply,
}

impl SidebarRow {
    pub fn all() -> Vec<SidebarRow> {
        let mut rows = vec![
            SidebarRow::Field(DraftField::Focus),
            SidebarRow::Field(DraftField::Keywords),
        ];
        rows.extend((0..QUICK_PROFILES.len()).map(SidebarRow::Preset));
        rows.extend(SourceId::ALL.iter().copied().map(SidebarRow::Source));
        rows.extend(SortMode::ALL.iter().copied().map(SidebarRow::Sort));
        rows.push(SidebarRow::Field(DraftField::ApiKey));
        rows.push(SidebarRow::Apply);
        rows
    }
}

// ============================================================================
// Draft
// ============================================================================

/// Last values received from the authoritative state.
struct Synced {
    keywords: String,
    focus: String,
    api_key: SecretString,
    sources: Vec<SourceId>,
    sort: SortMode,
}

pub struct SidebarDraft {
    keywords: String,
    focus: String,
    /// Empty when no key is set.
    api_key: SecretString,
    sources: Vec<SourceId>,
    sort: SortMode,
    dirty: bool,
    applying: bool,
    synced: Synced,
}

impl fmt::Debug for SidebarDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SidebarDraft")
            .field("keywords", &self.keywords)
            .field("focus", &self.focus)
            .field("api_key", &if self.has_api_key() { "[REDACTED]" } else { "" })
            .field("sources", &self.sources)
            .field("sort", &self.sort)
            .field("dirty", &self.dirty)
            .field("applying", &self.applying)
            .finish()
    }
}

fn key_or_empty(key: Option<&SecretString>) -> SecretString {
    SecretString::from(key.map(|k| k.expose_secret()).unwrap_or_default().to_owned())
}

fn same_secret(a: &SecretString, b: &SecretString) -> bool {
    a.expose_secret() == b.expose_secret()
}

impl SidebarDraft {
    pub fn new(
        profile: &UserProfile,
        api_key: Option<&SecretString>,
        sources: &[SourceId],
        sort: SortMode,
    ) -> Self {
        let synced = Synced {
            keywords: profile.keywords.clone(),
            focus: profile.focus.clone(),
            api_key: key_or_empty(api_key),
            sources: sources.to_vec(),
            sort,
        };
        Self {
            keywords: synced.keywords.clone(),
            focus: synced.focus.clone(),
            api_key: key_or_empty(api_key),
            sources: synced.sources.clone(),
            sort,
            dirty: false,
            applying: false,
            synced,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn focus(&self) -> &str {
        &self.focus
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }

    /// Length of the key draft, for masked display.
    pub fn api_key_len(&self) -> usize {
        self.api_key.expose_secret().chars().count()
    }

    /// Text of a plain field. The key is never returned; use
    /// [`api_key_len`](Self::api_key_len) to mask it.
    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::Focus => &self.focus,
            DraftField::Keywords => &self.keywords,
            DraftField::ApiKey => "",
        }
    }

    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    pub fn is_source_selected(&self, id: SourceId) -> bool {
        self.sources.contains(&id)
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_applying(&self) -> bool {
        self.applying
    }

    /// Apply button caption.
    pub fn apply_label(&self) -> &'static str {
        if self.applying {
            "Updating…"
        } else if self.dirty {
            "↻ Apply Changes"
        } else {
            "↻ Refresh Feed"
        }
    }

    pub fn key_hint(&self) -> &'static str {
        if self.has_api_key() {
            "✓ Key set — AI summaries active on next refresh"
        } else {
            "Without a key, keyword scoring is used instead"
        }
    }

    // ========================================================================
    // Sync
    // ========================================================================

    /// Pull authoritative values into the draft.
    ///
    /// Each field is overwritten only when its incoming value differs from
    /// the last one synced, so an unrelated update never clobbers an edit in
    /// progress. `sort` is the sort currently in effect, so a pending sort
    /// change keeps the draft dirty. Returns true if any field was overwritten.
    pub fn sync_from(
        &mut self,
        profile: &UserProfile,
        api_key: Option<&SecretString>,
        sources: &[SourceId],
        sort: SortMode,
    ) -> bool {
        let mut changed = false;

        if profile.keywords != self.synced.keywords || profile.focus != self.synced.focus {
            self.synced.keywords = profile.keywords.clone();
            self.synced.focus = profile.focus.clone();
            self.keywords = profile.keywords.clone();
            self.focus = profile.focus.clone();
            changed = true;
        }

        let key = key_or_empty(api_key);
        if !same_secret(&key, &self.synced.api_key) {
            self.api_key = key_or_empty(api_key);
            self.synced.api_key = key;
            changed = true;
        }

        if sources != self.synced.sources.as_slice() {
            self.synced.sources = sources.to_vec();
            self.sources = sources.to_vec();
            changed = true;
        }

        if sort != self.synced.sort {
            self.synced.sort = sort;
            self.sort = sort;
            changed = true;
        }

        if changed {
            self.dirty = self.differs_from_synced();
            tracing::debug!(dirty = self.dirty, "Sidebar draft synced");
        }
        changed
    }

    fn differs_from_synced(&self) -> bool {
        self.keywords != self.synced.keywords
            || self.focus != self.synced.focus
            || !same_secret(&self.api_key, &self.synced.api_key)
            || self.sources != self.synced.sources
            || self.sort != self.synced.sort
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Run `edit` on a copy of the field text and store the result. The key
    /// is exposed only for the duration of the edit.
    fn edit_field(&mut self, field: DraftField, edit: impl FnOnce(&mut String)) {
        match field {
            DraftField::Focus => edit(&mut self.focus),
            DraftField::Keywords => edit(&mut self.keywords),
            DraftField::ApiKey => {
                let mut key = self.api_key.expose_secret().to_owned();
                edit(&mut key);
                self.api_key = SecretString::from(key);
            }
        }
        self.dirty = true;
    }

    pub fn push_char(&mut self, field: DraftField, c: char) {
        if c.is_control() {
            return;
        }
        self.edit_field(field, |text| text.push(c));
    }

    pub fn pop_char(&mut self, field: DraftField) {
        self.edit_field(field, |text| {
            text.pop();
        });
    }

    pub fn clear_field(&mut self, field: DraftField) {
        self.edit_field(field, String::clear);
    }

    /// Flip a source. The last selected source stays selected.
    pub fn toggle_source(&mut self, id: SourceId) {
        if let Some(pos) = self.sources.iter().position(|s| *s == id) {
            if self.sources.len() > 1 {
                self.sources.remove(pos);
            }
        } else {
            self.sources.push(id);
        }
        self.dirty = true;
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
        self.dirty = true;
    }

    /// Overwrite keywords and focus from a preset. Out-of-range is ignored.
    pub fn apply_preset(&mut self, index: usize) {
        let Some(preset) = QUICK_PROFILES.get(index) else {
            return;
        };
        self.keywords = preset.keywords.to_string();
        self.focus = preset.focus.to_string();
        self.dirty = true;
    }

    // ========================================================================
    // Apply
    // ========================================================================

    /// Snapshot the draft for submission and mark it applying.
    ///
    /// Returns `None` while a previous apply is still outstanding.
    pub fn begin_apply(&mut self) -> Option<ApplyRequest> {
        if self.applying {
            return None;
        }
        self.applying = true;
        Some(ApplyRequest {
            keywords: self.keywords.clone(),
            focus: self.focus.clone(),
            api_key: self.has_api_key().then(|| key_or_empty(Some(&self.api_key))),
            sources: self.sources.clone(),
            sort: self.sort,
        })
    }

    /// Called once the apply round-trip has settled, success or not.
    pub fn finish_apply(&mut self) {
        self.applying = false;
        self.dirty = false;
    }
}

// ============================================================================
// Submission
// ============================================================================

/// Owned copy of the draft at the moment Apply was pressed.
#[derive(Debug)]
pub struct ApplyRequest {
    pub keywords: String,
    pub focus: String,
    pub api_key: Option<SecretString>,
    pub sources: Vec<SourceId>,
    pub sort: SortMode,
}

/// Consolidated settings handed back to the app after Apply.
#[derive(Debug)]
pub struct AppliedSettings {
    pub profile: UserProfile,
    pub api_key: Option<SecretString>,
    pub sources: Vec<SourceId>,
    pub sort: SortMode,
    /// False when the server call failed and `profile` is the local fallback.
    pub confirmed: bool,
}

impl ApplyRequest {
    /// Settings built from the draft alone, used when the server cannot
    /// confirm the profile.
    pub fn fallback(&self) -> AppliedSettings {
        AppliedSettings {
            profile: UserProfile::local(self.keywords.clone(), self.focus.clone()),
            api_key: self.api_key.as_ref().map(|k| key_or_empty(Some(k))),
            sources: self.sources.clone(),
            sort: self.sort,
            confirmed: false,
        }
    }

    /// Push the draft profile to the server. Never fails: on error the
    /// draft keywords and focus become the profile.
    pub async fn resolve(self, client: &ApiClient, user_id: &str) -> AppliedSettings {
        let result = client
            .update_profile_direct(&self.keywords, &self.focus, self.api_key.as_ref(), user_id)
            .await;

        match result {
            Ok(profile) => {
                tracing::info!(keywords = %profile.keywords, "Profile updated on server");
                AppliedSettings {
                    profile,
                    api_key: self.api_key,
                    sources: self.sources,
                    sort: self.sort,
                    confirmed: true,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile update failed, keeping local draft");
                self.fallback()
            }
        }
    }
}
