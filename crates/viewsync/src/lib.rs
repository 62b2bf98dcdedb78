use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use shared::{
    domain::{ActivityName, Email},
    error::ApiErrorBody,
    protocol::{ActivityDetail, SignupResponse, UnregisterResponse},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};
use url::Url;

pub mod error;
pub mod view;

pub use error::{LoadError, MutationError};
pub use view::{
    ActivityCard, CardStore, ListView, ParticipantEntry, ParticipantsSection, SignupForm,
    StatusArea, StatusTone, UnregisterHandler, ViewState, LOAD_FAILURE_NOTICE,
    NO_PARTICIPANTS_PLACEHOLDER,
};

/// How long a status message stays visible before its hide timer fires.
const STATUS_HIDE_DELAY: Duration = Duration::from_secs(5);

const SIGNUP_REJECTED_FALLBACK: &str = "An error occurred";
const SIGNUP_TRANSPORT_FAILURE: &str = "Failed to sign up. Please try again.";
const UNREGISTER_REJECTED_FALLBACK: &str = "Failed to unregister participant";
const UNREGISTER_TRANSPORT_FAILURE: &str = "Failed to unregister participant. Please try again.";

/// Blocking notification surface for unregister failures. Injected at
/// construction; the default implementation logs and drops the message.
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

pub struct DiscardAlerts;

impl AlertSink for DiscardAlerts {
    fn alert(&self, message: &str) {
        warn!(alert = message, "no alert sink installed; message dropped");
    }
}

/// Incremental repaint notifications for an embedding renderer. Emitted
/// after the corresponding view-state change has been applied.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    ActivitiesLoaded { count: usize },
    LoadFailed,
    CardUpdated { activity: ActivityName },
    StatusShown { tone: StatusTone },
    StatusHidden,
}

/// Client-side synchronizer for the activity sign-up service: loads the
/// full collection once, then keeps the per-activity cards consistent with
/// the server across signup/unregister responses without a full reload.
///
/// Mutations on the same activity are not internally sequenced: each is an
/// independent request/response pair, and the last response to arrive
/// determines the card's final rendered state.
pub struct ViewSyncClient {
    http: Client,
    base_url: Url,
    view: Mutex<ViewState>,
    alerts: Arc<dyn AlertSink>,
    events: broadcast::Sender<ViewEvent>,
    status_hide_delay: Duration,
}

impl ViewSyncClient {
    pub fn new(server_url: &str) -> Result<Arc<Self>> {
        Self::new_with_alert_sink(server_url, Arc::new(DiscardAlerts))
    }

    pub fn new_with_alert_sink(
        server_url: &str,
        alerts: Arc<dyn AlertSink>,
    ) -> Result<Arc<Self>> {
        let base_url = Url::parse(server_url)
            .with_context(|| format!("invalid server url: {server_url}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(anyhow!("server url must start with http:// or https://"));
        }
        let (events, _) = broadcast::channel(1024);
        Ok(Arc::new(Self {
            http: Client::new(),
            base_url,
            view: Mutex::new(ViewState::default()),
            alerts,
            events,
            status_hide_delay: STATUS_HIDE_DELAY,
        }))
    }

    /// Snapshot of the current page model.
    pub async fn view_state(&self) -> ViewState {
        self.view.lock().await.clone()
    }

    /// Edit the signup form the way a user typing into it would.
    pub async fn edit_form(&self, edit: impl FnOnce(&mut SignupForm)) {
        let mut view = self.view.lock().await;
        edit(&mut view.form);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    /// One read of the full activity collection, then the initial render:
    /// one card and one select option per entry, in the server's iteration
    /// order. Any failure replaces the container with the static failure
    /// notice; no partial list, no retry.
    pub async fn load_activities(&self) {
        match self.fetch_activities().await {
            Ok(records) => {
                let count = records.len();
                {
                    let mut view = self.view.lock().await;
                    let mut cards = CardStore::default();
                    view.form.options.clear();
                    for (name, detail) in &records {
                        cards.insert(ActivityCard::build(name.clone(), detail));
                        view.form.options.push(name.clone());
                    }
                    view.activities = ListView::Ready(cards);
                }
                info!(count, "listing: loaded");
                self.emit(ViewEvent::ActivitiesLoaded { count });
            }
            Err(err) => {
                error!(error = %err, "listing: load failed");
                {
                    let mut view = self.view.lock().await;
                    view.activities = ListView::Failed(LOAD_FAILURE_NOTICE.to_string());
                }
                self.emit(ViewEvent::LoadFailed);
            }
        }
    }

    async fn fetch_activities(&self) -> std::result::Result<Vec<(ActivityName, ActivityDetail)>, LoadError> {
        let listing: serde_json::Map<String, serde_json::Value> = self
            .http
            .get(self.activities_target())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut records = Vec::with_capacity(listing.len());
        for (name, value) in listing {
            let detail = serde_json::from_value(value).map_err(|source| {
                LoadError::MalformedEntry {
                    activity: name.clone(),
                    source,
                }
            })?;
            records.push((ActivityName(name), detail));
        }
        Ok(records)
    }

    /// Read the form's current inputs and sign up with them, the way a
    /// submit event on the rendered form would.
    pub async fn submit_signup(self: &Arc<Self>) {
        let (activity, email) = {
            let view = self.view.lock().await;
            (
                ActivityName::new(view.form.activity.clone()),
                Email::new(view.form.email.clone()),
            )
        };
        self.sign_up(&activity, &email).await;
    }

    /// Create a signup for `(activity, email)`. Every outcome lands in the
    /// status area (success message, server rejection text, or a generic
    /// transport failure) and schedules the fixed auto-hide; on success the
    /// affected card is reconciled with the response roster when one is
    /// present.
    pub async fn sign_up(self: &Arc<Self>, activity: &ActivityName, email: &Email) {
        match self.request_signup(activity, email).await {
            Ok(response) => {
                info!(activity = activity.as_str(), "signup: accepted");
                self.apply_signup_success(activity, response).await;
            }
            Err(MutationError::Rejected { status, detail }) => {
                info!(
                    activity = activity.as_str(),
                    status = status.as_u16(),
                    "signup: rejected"
                );
                let text = detail.unwrap_or_else(|| SIGNUP_REJECTED_FALLBACK.to_string());
                self.show_status(text, StatusTone::Error).await;
            }
            Err(MutationError::Transport(err)) => {
                error!(activity = activity.as_str(), error = %err, "signup: request failed");
                self.show_status(SIGNUP_TRANSPORT_FAILURE, StatusTone::Error)
                    .await;
            }
        }
    }

    async fn request_signup(
        &self,
        activity: &ActivityName,
        email: &Email,
    ) -> std::result::Result<SignupResponse, MutationError> {
        let response = self
            .http
            .post(self.signup_target(activity, email))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            // An unparsable success body is a transport-class failure, not
            // a rejection: there is no usable server verdict in it.
            return Ok(response.json().await?);
        }
        let body: ApiErrorBody = response.json().await?;
        Err(MutationError::Rejected {
            status,
            detail: body.text().map(str::to_string),
        })
    }

    async fn apply_signup_success(self: &Arc<Self>, activity: &ActivityName, response: SignupResponse) {
        let updated = {
            let mut view = self.view.lock().await;
            view.form.reset();
            let mut updated = false;
            if let Some(participants) = &response.participants {
                if let Some(cards) = view.activities.cards_mut() {
                    // The response may omit the capacity; the card already
                    // knows its own.
                    if let Some(current) = cards.card(activity).map(|card| card.max_participants) {
                        let max_participants = response.max_participants.unwrap_or(current);
                        updated = cards.reconcile(activity, participants, max_participants);
                    }
                }
            }
            updated
        };
        if updated {
            self.emit(ViewEvent::CardUpdated {
                activity: activity.clone(),
            });
        }
        self.show_status(response.message, StatusTone::Success).await;
    }

    /// Delete the registration for `(activity, email)`. On success the
    /// matching entry is removed immediately and the card is then rebuilt
    /// from the authoritative response roster; on any failure the rendered
    /// list is left untouched and the failure is raised as a blocking
    /// alert.
    pub async fn unregister(self: &Arc<Self>, activity: &ActivityName, email: &Email) {
        match self.request_unregister(activity, email).await {
            Ok(response) => {
                info!(activity = activity.as_str(), "unregister: accepted");
                self.apply_unregister_success(activity, email, response).await;
            }
            Err(MutationError::Rejected { status, detail }) => {
                info!(
                    activity = activity.as_str(),
                    status = status.as_u16(),
                    "unregister: rejected"
                );
                let text = detail.unwrap_or_else(|| UNREGISTER_REJECTED_FALLBACK.to_string());
                self.alerts.alert(&text);
            }
            Err(MutationError::Transport(err)) => {
                error!(activity = activity.as_str(), error = %err, "unregister: request failed");
                self.alerts.alert(UNREGISTER_TRANSPORT_FAILURE);
            }
        }
    }

    async fn request_unregister(
        &self,
        activity: &ActivityName,
        email: &Email,
    ) -> std::result::Result<UnregisterResponse, MutationError> {
        let response = self
            .http
            .delete(self.signup_target(activity, email))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            // Rejection bodies are best-effort; an unparsable one still
            // surfaces as a rejection, just with the fallback text.
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            return Err(MutationError::Rejected {
                status,
                detail: body.text().map(str::to_string),
            });
        }
        Ok(response.json().await?)
    }

    async fn apply_unregister_success(
        &self,
        activity: &ActivityName,
        email: &Email,
        response: UnregisterResponse,
    ) {
        let updated = {
            let mut view = self.view.lock().await;
            let Some(cards) = view.activities.cards_mut() else {
                return;
            };
            // Optimistic removal of the clicked entry; the reconcile below
            // rebuilds the section from the server roster and supersedes it.
            if let Some(card) = cards.card_mut(activity) {
                card.remove_entry(email);
            }
            cards.reconcile(activity, &response.participants, response.max_participants)
        };
        if updated {
            self.emit(ViewEvent::CardUpdated {
                activity: activity.clone(),
            });
        }
    }

    async fn show_status(self: &Arc<Self>, text: impl Into<String>, tone: StatusTone) {
        {
            let mut view = self.view.lock().await;
            view.status.show(text, tone);
        }
        self.emit(ViewEvent::StatusShown { tone });
        self.spawn_status_hide();
    }

    /// Every shown message gets its own hide timer; timers are never
    /// cancelled. `hide` is idempotent, so an earlier timer firing under a
    /// newer message simply hides whatever is showing at that moment.
    fn spawn_status_hide(self: &Arc<Self>) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(client.status_hide_delay).await;
            let was_visible = {
                let mut view = client.view.lock().await;
                view.status.hide()
            };
            if was_visible {
                client.emit(ViewEvent::StatusHidden);
            }
        });
    }

    fn activities_target(&self) -> Url {
        let mut url = self.base_url.clone();
        // http(s) urls always have mutable path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("activities");
        }
        url
    }

    fn signup_target(&self, activity: &ActivityName, email: &Email) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["activities", activity.as_str(), "signup"]);
        }
        url.query_pairs_mut().append_pair("email", email.as_str());
        url
    }

    fn emit(&self, event: ViewEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
