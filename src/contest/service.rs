use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ContestConfig;

use super::domain::{SubmissionRecord, VoteCategory, VoteTally};
use super::export::{export_rows, ExportError, ExportScope};
use super::ranking;
use super::registration::{RegistrationState, RegistrationWindow};
use super::store::{StoreError, SubmissionStore};

const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_TEAM: &str = "Equipo Rosa";
const DEFAULT_TEAM_SLUG: &str = "EquipoRosa";
const DEFAULT_HASHTAG: &str = "#OctubreRosa";
const TOP_SLOTS: usize = 5;

/// Facade composing the registration window, intake validation, and the
/// durable store.
pub struct ContestService {
    store: Arc<SubmissionStore>,
    contest: ContestConfig,
    window: RegistrationWindow,
}

/// Parsed intake fields plus the original name of the already-stored upload.
/// `origin` is filled in by the transport layer, not the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionRequest {
    #[serde(rename = "equipo", default)]
    pub team: String,
    #[serde(rename = "participantes", default)]
    pub participants: String,
    #[serde(rename = "departamento", default)]
    pub department: String,
    #[serde(default)]
    pub hashtag: String,
    #[serde(rename = "lema", default)]
    pub slogan: String,
    #[serde(rename = "dato", default)]
    pub fact: String,
    #[serde(alias = "poster", default)]
    pub photo: Option<String>,
    #[serde(skip)]
    pub origin: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct VoteReceipt {
    pub filename: String,
    pub votes: VoteTally,
    pub total: u64,
}

/// Record plus derived total, as served to listings.
#[derive(Debug, Serialize)]
pub struct SubmissionView {
    #[serde(rename = "ts")]
    pub submitted_at: String,
    #[serde(rename = "equipo")]
    pub team: String,
    #[serde(rename = "participantes")]
    pub participants: String,
    #[serde(rename = "departamento")]
    pub department: String,
    pub hashtag: String,
    #[serde(rename = "lema")]
    pub slogan: String,
    #[serde(rename = "dato")]
    pub fact: String,
    pub filename: String,
    pub votes: VoteTally,
    pub total: u64,
}

impl From<SubmissionRecord> for SubmissionView {
    fn from(record: SubmissionRecord) -> Self {
        let total = record.total_votes();
        Self {
            submitted_at: record.submitted_at,
            team: record.team,
            participants: record.participants,
            department: record.department,
            hashtag: record.hashtag,
            slogan: record.slogan,
            fact: record.fact,
            filename: record.filename,
            votes: record.votes,
            total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    Recent,
    TopVotes,
}

/// Gallery payload combining the recent listing with the current top five.
#[derive(Debug, Serialize)]
pub struct GalleryView {
    pub items: Vec<SubmissionView>,
    pub top5: Vec<SubmissionView>,
    pub categories: [&'static str; 3],
}

#[derive(Debug, Serialize)]
pub struct ContestMeta {
    pub state: RegistrationState,
    pub open: NaiveDateTime,
    pub close: NaiveDateTime,
    pub event: NaiveDateTime,
    pub max_team: usize,
    pub service_email: String,
    pub service_exts: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Recepción cerrada en este momento. Envía tu foto por email a {contact}.")]
    RegistrationClosed { contact: String },
    #[error("Máx. {max} participantes por equipo.")]
    TooManyParticipants { max: usize },
    #[error("{0}")]
    InvalidFile(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("Categoría desconocida: {0}")]
    InvalidCategory(String),
    #[error("No encontrado")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ContestService {
    pub fn new(store: Arc<SubmissionStore>, contest: ContestConfig) -> Self {
        let window = contest.registration_window();
        Self {
            store,
            contest,
            window,
        }
    }

    /// Accept a submission: gate on the registration window, validate the
    /// fields, derive the unique stored filename, and append the record with
    /// all counters at zero.
    pub fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let now = Local::now().naive_local();
        if !self.window.is_open_at(now) {
            return Err(SubmissionError::RegistrationClosed {
                contact: self.contest.service_email.clone(),
            });
        }

        let team = non_empty_or(&request.team, DEFAULT_TEAM);
        let hashtag = non_empty_or(&request.hashtag, DEFAULT_HASHTAG);
        let participants = request.participants.trim().to_string();

        let members = participants
            .split(',')
            .map(str::trim)
            .filter(|member| !member.is_empty())
            .count();
        if members > self.contest.max_team_members {
            return Err(SubmissionError::TooManyParticipants {
                max: self.contest.max_team_members,
            });
        }

        let photo = request
            .photo
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                SubmissionError::InvalidFile("No se recibió archivo (poster/photo)".to_string())
            })?;
        let extension = file_extension(photo)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                SubmissionError::InvalidFile(
                    "Formato no permitido. Usa PNG/JPG/JPEG/WEBP".to_string(),
                )
            })?;

        let submitted_at = now.format(TIMESTAMP_FORMAT).to_string();
        let filename = format!("{submitted_at}_{}.{extension}", sanitize_team(&team));

        let record = SubmissionRecord {
            submitted_at,
            team,
            participants,
            department: request.department.trim().to_string(),
            hashtag,
            slogan: request.slogan.trim().to_string(),
            fact: request.fact.trim().to_string(),
            filename: filename.clone(),
            origin: non_empty_or(&request.origin, "-"),
            votes: VoteTally::zero(),
        };
        self.store.append(record)?;

        info!(%filename, "submission recorded");
        Ok(SubmissionReceipt { filename })
    }

    /// Cast one vote for `category_label` on the submission stored as
    /// `filename`, returning the updated counters and derived total.
    pub fn vote(&self, filename: &str, category_label: &str) -> Result<VoteReceipt, VoteError> {
        let category = VoteCategory::parse(category_label)
            .ok_or_else(|| VoteError::InvalidCategory(category_label.trim().to_string()))?;

        let record = match self.store.update_vote(filename, category) {
            Ok(record) => record,
            Err(StoreError::NotFound(name)) => return Err(VoteError::NotFound(name)),
            Err(other) => return Err(VoteError::Store(other)),
        };

        info!(
            %filename,
            category = category.label(),
            total = record.total_votes(),
            "vote recorded"
        );
        Ok(VoteReceipt {
            filename: record.filename.clone(),
            votes: record.votes,
            total: record.total_votes(),
        })
    }

    /// Ordered listing with derived totals attached.
    pub fn list(
        &self,
        sort: SortMode,
        limit: Option<usize>,
    ) -> Result<Vec<SubmissionView>, StoreError> {
        let records = self.store.load_all()?;
        let bound = limit.unwrap_or(records.len());
        let ordered = match sort {
            SortMode::Recent => {
                let mut recent = ranking::most_recent(records);
                recent.truncate(bound);
                recent
            }
            SortMode::TopVotes => ranking::top_n(records, bound),
        };
        Ok(ordered.into_iter().map(SubmissionView::from).collect())
    }

    pub fn gallery(&self) -> Result<GalleryView, StoreError> {
        let records = self.store.load_all()?;
        let top5 = ranking::top_n(records.clone(), TOP_SLOTS);
        let items = ranking::most_recent(records);
        Ok(GalleryView {
            items: items.into_iter().map(SubmissionView::from).collect(),
            top5: top5.into_iter().map(SubmissionView::from).collect(),
            categories: VoteCategory::ordered().map(VoteCategory::label),
        })
    }

    pub fn meta(&self) -> ContestMeta {
        let now = Local::now().naive_local();
        ContestMeta {
            state: self.window.state_at(now),
            open: self.contest.registration_opens,
            close: self.contest.registration_closes,
            event: self.contest.event_day,
            max_team: self.contest.max_team_members,
            service_email: self.contest.service_email.clone(),
            service_exts: self.contest.service_extensions.clone(),
        }
    }

    /// Render one of the organizer downloads. `Top` narrows the set to the
    /// current top five before rendering the summary fields.
    pub fn export(&self, scope: ExportScope) -> Result<String, ExportError> {
        let records = self.store.load_all()?;
        let chosen = match scope {
            ExportScope::All => records,
            ExportScope::Top => ranking::top_n(records, TOP_SLOTS),
        };
        let rendered = export_rows(&chosen, scope)?;
        info!(?scope, rows = chosen.len(), "export rendered");
        Ok(rendered)
    }

    pub fn verify_export_pin(&self, pin: &str) -> bool {
        pin == self.contest.export_pin
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Keep alphanumerics plus `-`/`_`, mirroring the filenames the upload layer
/// produces. An unusable team name falls back to the default slug.
fn sanitize_team(team: &str) -> String {
    let cleaned: String = team
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        DEFAULT_TEAM_SLUG.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Lowercased extension after the final dot, when present.
fn file_extension(name: &str) -> Option<String> {
    let (_, extension) = name.rsplit_once('.')?;
    if extension.is_empty() {
        None
    } else {
        Some(extension.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_everything_but_word_characters() {
        assert_eq!(sanitize_team("Equipo Rosa"), "EquipoRosa");
        assert_eq!(sanitize_team("lazo-rosa_2025!"), "lazo-rosa_2025");
        assert_eq!(sanitize_team("___"), "EquipoRosa");
        assert_eq!(sanitize_team("¡¡¡"), "EquipoRosa");
    }

    #[test]
    fn extensions_are_lowercased_and_dot_required() {
        assert_eq!(file_extension("cartel.PNG"), Some("png".to_string()));
        assert_eq!(file_extension("equipo.rosa.jpeg"), Some("jpeg".to_string()));
        assert_eq!(file_extension("sin_extension"), None);
        assert_eq!(file_extension("raro."), None);
    }

    #[test]
    fn blank_fields_fall_back_to_defaults() {
        assert_eq!(non_empty_or("  ", DEFAULT_TEAM), "Equipo Rosa");
        assert_eq!(non_empty_or(" Lazo ", DEFAULT_TEAM), "Lazo");
    }
}
