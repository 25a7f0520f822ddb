//! Works out who the other party of a two-person conversation is when the
//! server does not say so directly.

use crate::models::{FetchResult, Message, Participant};

/// How the other user was determined, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Evidence {
    /// The only non-self user seen anywhere in the batch.
    BatchScan,
    /// Sender/recipient of the first message in the batch.
    FirstMessage,
    /// A conversation participants list, or a recipient picked explicitly.
    Participants,
}

#[derive(Debug, Clone)]
struct Resolved {
    user: Participant,
    evidence: Evidence,
}

#[derive(Debug, Clone)]
pub struct ParticipantResolver {
    current_user_id: String,
    resolved: Option<Resolved>,
}

impl ParticipantResolver {
    pub fn new(current_user_id: impl Into<String>) -> Self {
        Self {
            current_user_id: current_user_id.into(),
            resolved: None,
        }
    }

    /// Starts out already knowing the other user, e.g. a recipient chosen in the composer.
    pub fn seeded(current_user_id: impl Into<String>, other: Participant) -> Self {
        let mut resolver = Self::new(current_user_id);
        if other.id != resolver.current_user_id {
            resolver.resolved = Some(Resolved {
                user: other,
                evidence: Evidence::Participants,
            });
        }
        resolver
    }

    pub fn other_user(&self) -> Option<&Participant> {
        self.resolved.as_ref().map(|r| &r.user)
    }

    pub fn evidence(&self) -> Option<Evidence> {
        self.resolved.as_ref().map(|r| r.evidence)
    }

    /// Re-resolves from a fetch result. Returns true when the other user changed.
    ///
    /// A known user is only replaced by evidence at least as strong as what
    /// produced it; ambiguous or weaker evidence leaves it in place.
    pub fn observe(&mut self, result: &FetchResult) -> bool {
        let Some((candidate, evidence)) = infer(result, &self.current_user_id) else {
            return false;
        };

        if let Some(current) = self.resolved.as_mut() {
            if current.user.id == candidate.id {
                let before = current.user.clone();
                if current.user.username.is_none() {
                    current.user.username = candidate.username;
                }
                if current.user.avatar_url.is_none() {
                    current.user.avatar_url = candidate.avatar_url;
                }
                current.evidence = current.evidence.max(evidence);
                return current.user != before;
            }
            if evidence < current.evidence {
                tracing::debug!(
                    "Ignoring weaker participant evidence {:?} for {} (have {:?} for {})",
                    evidence,
                    candidate.id,
                    current.evidence,
                    current.user.id
                );
                return false;
            }
        }

        self.resolved = Some(Resolved {
            user: candidate,
            evidence,
        });
        true
    }
}

/// The participant whose id is not `current_user_id`.
pub fn other_participant<'a>(
    participants: &'a [Participant],
    current_user_id: &str,
) -> Option<&'a Participant> {
    participants.iter().find(|p| p.id != current_user_id)
}

/// Best candidate for the other user in a fetch result, strongest rule first.
pub fn infer(result: &FetchResult, current_user_id: &str) -> Option<(Participant, Evidence)> {
    if let Some(conversation) = &result.conversation {
        if let Some(other) = other_participant(&conversation.participants, current_user_id) {
            return Some((other.clone(), Evidence::Participants));
        }
    }

    if let Some(first) = result.messages.first() {
        let synthetic: Vec<Participant> = [&first.sender, &first.recipient]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        if let Some(other) = other_participant(&synthetic, current_user_id) {
            return Some((other.clone(), Evidence::FirstMessage));
        }
    }

    sole_other_user(&result.messages, current_user_id).map(|p| (p, Evidence::BatchScan))
}

/// The single distinct non-self user across a batch; `None` if zero or several.
fn sole_other_user(messages: &[Message], current_user_id: &str) -> Option<Participant> {
    let mut found: Option<&Participant> = None;
    for party in messages
        .iter()
        .flat_map(|m| [m.sender.as_ref(), m.recipient.as_ref()])
        .flatten()
        .filter(|p| p.id != current_user_id)
    {
        match found {
            None => found = Some(party),
            Some(existing) if existing.id == party.id => {}
            Some(_) => return None,
        }
    }
    found.cloned()
}
