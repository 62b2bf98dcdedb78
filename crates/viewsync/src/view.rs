use shared::domain::{ActivityName, Email};
use shared::protocol::ActivityDetail;

pub const NO_PARTICIPANTS_PLACEHOLDER: &str = "No participants yet.";
pub const LOAD_FAILURE_NOTICE: &str = "Failed to load activities. Please try again later.";

/// Unregister context captured when an entry is rendered. Embedders hand
/// this record back instead of re-reading rendered state, so a click cannot
/// mis-target after the list has been rebuilt underneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnregisterHandler {
    pub activity: ActivityName,
    pub email: Email,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantEntry {
    pub email: Email,
    pub unregister: UnregisterHandler,
}

impl ParticipantEntry {
    fn new(activity: &ActivityName, email: &Email) -> Self {
        Self {
            email: email.clone(),
            unregister: UnregisterHandler {
                activity: activity.clone(),
                email: email.clone(),
            },
        }
    }
}

/// The two render states of a card's participants block. Exactly one is
/// attached at a time; transitions swap the whole section, never leaving a
/// stale placeholder next to a list or vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantsSection {
    Empty { placeholder: String },
    Roster { entries: Vec<ParticipantEntry> },
}

impl ParticipantsSection {
    fn render(activity: &ActivityName, participants: &[Email]) -> Self {
        if participants.is_empty() {
            Self::Empty {
                placeholder: NO_PARTICIPANTS_PLACEHOLDER.to_string(),
            }
        } else {
            Self::Roster {
                entries: participants
                    .iter()
                    .map(|email| ParticipantEntry::new(activity, email))
                    .collect(),
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty { .. } => 0,
            Self::Roster { entries } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> &[ParticipantEntry] {
        match self {
            Self::Empty { .. } => &[],
            Self::Roster { entries } => entries,
        }
    }
}

/// One rendered activity card. `spots_left` is signed on purpose: a roster
/// longer than the capacity surfaces as negative availability instead of
/// being clamped away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCard {
    pub name: ActivityName,
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    pub spots_left: i64,
    pub participants: ParticipantsSection,
}

impl ActivityCard {
    pub fn build(name: ActivityName, detail: &ActivityDetail) -> Self {
        let participants = ParticipantsSection::render(&name, &detail.participants);
        Self {
            description: detail.description.clone(),
            schedule: detail.schedule.clone(),
            max_participants: detail.max_participants,
            spots_left: spots_left(detail.max_participants, detail.participants.len()),
            participants,
            name,
        }
    }

    pub fn availability_text(&self) -> String {
        format!("{} spots left", self.spots_left)
    }

    pub fn participants_heading(&self) -> String {
        format!("Participants ({})", self.participants.len())
    }

    /// Rebuild this card's participants section and availability from a
    /// server roster. The previous section is discarded wholesale; entries
    /// and their handler records are constructed fresh.
    fn reconcile(&mut self, participants: &[Email], max_participants: u32) {
        self.max_participants = max_participants;
        self.spots_left = spots_left(max_participants, participants.len());
        self.participants = ParticipantsSection::render(&self.name, participants);
    }

    /// Drop the first rendered entry for `email`, if one exists. May leave
    /// an empty roster attached; the authoritative reconcile that follows
    /// normalizes it.
    pub(crate) fn remove_entry(&mut self, email: &Email) -> bool {
        let ParticipantsSection::Roster { entries } = &mut self.participants else {
            return false;
        };
        let Some(index) = entries.iter().position(|entry| &entry.email == email) else {
            return false;
        };
        entries.remove(index);
        true
    }
}

fn spots_left(max_participants: u32, taken: usize) -> i64 {
    i64::from(max_participants) - taken as i64
}

/// Keyed projection of the activity list. Cards are looked up strictly by
/// activity name, never by position, and at most one card exists per name.
/// Iteration order is the order cards were inserted in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardStore {
    cards: Vec<ActivityCard>,
}

impl CardStore {
    pub fn insert(&mut self, card: ActivityCard) {
        match self.card_mut(&card.name) {
            Some(existing) => *existing = card,
            None => self.cards.push(card),
        }
    }

    pub fn card(&self, name: &ActivityName) -> Option<&ActivityCard> {
        self.cards.iter().find(|card| &card.name == name)
    }

    pub(crate) fn card_mut(&mut self, name: &ActivityName) -> Option<&mut ActivityCard> {
        self.cards.iter_mut().find(|card| &card.name == name)
    }

    pub fn cards(&self) -> &[ActivityCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Apply a server roster to the card for `activity`. Unknown names are
    /// a silent no-op: cards only ever come from the initial build. Safe to
    /// call repeatedly with the same arguments. Returns whether a card was
    /// updated.
    pub fn reconcile(
        &mut self,
        activity: &ActivityName,
        participants: &[Email],
        max_participants: u32,
    ) -> bool {
        match self.card_mut(activity) {
            Some(card) => {
                card.reconcile(participants, max_participants);
                true
            }
            None => false,
        }
    }
}

/// Contents of the activity-list container element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    Ready(CardStore),
    Failed(String),
}

impl ListView {
    pub fn cards(&self) -> Option<&CardStore> {
        match self {
            Self::Ready(cards) => Some(cards),
            _ => None,
        }
    }

    pub(crate) fn cards_mut(&mut self) -> Option<&mut CardStore> {
        match self {
            Self::Ready(cards) => Some(cards),
            _ => None,
        }
    }
}

impl Default for ListView {
    fn default() -> Self {
        Self::Loading
    }
}

/// The signup form: the activity selection control populated by the loader
/// plus the two user-edited inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub options: Vec<ActivityName>,
    pub activity: String,
    pub email: String,
}

impl SignupForm {
    /// Clear the user-edited inputs. The option list stays; it mirrors the
    /// loaded collection, not the user's input.
    pub fn reset(&mut self) {
        self.activity.clear();
        self.email.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Error,
}

/// The transient status message area. Hidden until a mutation outcome is
/// shown; `hide` is idempotent so overlapping hide timers are harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusArea {
    pub text: String,
    pub tone: StatusTone,
    pub hidden: bool,
}

impl Default for StatusArea {
    fn default() -> Self {
        Self {
            text: String::new(),
            tone: StatusTone::Success,
            hidden: true,
        }
    }
}

impl StatusArea {
    pub(crate) fn show(&mut self, text: impl Into<String>, tone: StatusTone) {
        self.text = text.into();
        self.tone = tone;
        self.hidden = false;
    }

    /// Returns whether the area was visible before this call.
    pub(crate) fn hide(&mut self) -> bool {
        let was_visible = !self.hidden;
        self.hidden = true;
        was_visible
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden
    }
}

/// The whole page model: list container, signup form, status area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub activities: ListView,
    pub form: SignupForm,
    pub status: StatusArea,
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
