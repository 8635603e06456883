//! Slug availability checking shared by sign-up and profile editing.
//!
//! [`AvailabilityTracker`] is the synchronous state machine: it sanitises
//! input, validates it locally, short-circuits the user's own slug and tags
//! each remote check with a generation number. Any input change bumps the
//! generation, so a check that resolves after newer input is discarded no
//! matter when its response arrives. [`SlugAvailability`] drives the tracker
//! with a [`Debouncer`] and a [`SlugService`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::{Availability, SlugService};
use crate::debounce::Debouncer;
use crate::errors::ValidationError;
use crate::slug::{sanitize, Slug};
use crate::Result;

const TAKEN_MESSAGE: &str = "This username is already taken";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugStatus {
    Empty,
    /// Valid input waiting for the debounce interval to pass.
    Typing { input: String },
    Invalid { input: String, reason: ValidationError },
    Checking { slug: Slug },
    Available { slug: Slug },
    Taken { slug: Slug, reason: String },
    CheckFailed { slug: Slug, message: String },
    Claiming { slug: Slug },
    Claimed { slug: Slug },
    ClaimFailed { slug: Slug, message: String },
}

impl SlugStatus {
    /// Whether a submit control bound to this status is enabled.
    pub fn is_submittable(&self) -> bool {
        matches!(self, SlugStatus::Available { .. })
    }

    /// Whether the status will still change without further input.
    pub fn is_pending(&self) -> bool {
        matches!(self, SlugStatus::Typing { .. } | SlugStatus::Checking { .. })
    }

    /// Inline message for the slug field, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            SlugStatus::Invalid { reason, .. } => Some(reason.to_string()),
            SlugStatus::Taken { reason, .. } => Some(reason.clone()),
            SlugStatus::CheckFailed { message, .. }
            | SlugStatus::ClaimFailed { message, .. } => Some(message.clone()),
            _ => None,
        }
    }

    fn allows_retry(&self) -> bool {
        matches!(
            self,
            SlugStatus::CheckFailed { .. } | SlugStatus::ClaimFailed { .. }
        )
    }
}

/// What the caller has to do after an input change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputChange {
    /// Same input as before; leave any pending check alone.
    Unchanged,
    /// Status is final without asking the server.
    Settled,
    /// Schedule a remote check for this slug once input settles.
    Pending(Slug),
}

/// Binds a remote check to the exact input state it was issued for.
#[derive(Debug)]
pub struct CheckTicket {
    generation: u64,
    slug: Slug,
}

impl CheckTicket {
    pub fn slug(&self) -> &Slug {
        &self.slug
    }
}

#[derive(Debug)]
pub struct AvailabilityTracker {
    input: String,
    own_slug: Option<Slug>,
    generation: u64,
    status: SlugStatus,
}

impl AvailabilityTracker {
    /// Start from the user's current slug, if they have one.
    pub fn new(own_slug: Option<Slug>) -> Self {
        let mut tracker = Self {
            input: String::new(),
            own_slug: None,
            generation: 0,
            status: SlugStatus::Empty,
        };
        tracker.reset(own_slug);
        tracker
    }

    /// Forget all input and outstanding checks.
    pub fn reset(&mut self, own_slug: Option<Slug>) {
        self.generation += 1;
        self.input = own_slug
            .as_ref()
            .map(|slug| slug.to_string())
            .unwrap_or_default();
        self.status = match &own_slug {
            Some(slug) => SlugStatus::Available { slug: slug.clone() },
            None => SlugStatus::Empty,
        };
        self.own_slug = own_slug;
    }

    pub fn status(&self) -> &SlugStatus {
        &self.status
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn own_slug(&self) -> Option<&Slug> {
        self.own_slug.as_ref()
    }

    pub fn set_input(&mut self, raw: &str) -> InputChange {
        let sanitized = sanitize(raw);
        if sanitized == self.input && !self.status.allows_retry() {
            return InputChange::Unchanged;
        }
        self.input = sanitized;
        self.generation += 1;

        if self.input.is_empty() {
            self.status = SlugStatus::Empty;
            return InputChange::Settled;
        }
        match Slug::parse(&self.input) {
            Err(reason) => {
                self.status = SlugStatus::Invalid {
                    input: self.input.clone(),
                    reason,
                };
                InputChange::Settled
            }
            Ok(slug) if Some(&slug) == self.own_slug.as_ref() => {
                log::debug!("slug/{}: own slug, no check needed", slug);
                self.status = SlugStatus::Available { slug };
                InputChange::Settled
            }
            Ok(slug) => {
                self.status = SlugStatus::Typing {
                    input: self.input.clone(),
                };
                InputChange::Pending(slug)
            }
        }
    }

    /// Called when a debounced value comes out. Returns a ticket only if
    /// the value still matches the current input.
    pub fn begin_check(&mut self, slug: &Slug) -> Option<CheckTicket> {
        let still_current = slug.as_str() == self.input
            && matches!(self.status, SlugStatus::Typing { .. });
        if !still_current {
            log::debug!("slug/{}: input moved on, not checking", slug);
            return None;
        }
        self.generation += 1;
        self.status = SlugStatus::Checking { slug: slug.clone() };
        Some(CheckTicket {
            generation: self.generation,
            slug: slug.clone(),
        })
    }

    /// Apply a check result. Returns `false` when the result is stale and
    /// was dropped.
    pub fn resolve(
        &mut self,
        ticket: CheckTicket,
        outcome: Result<Availability>,
    ) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "slug/{}: discarding stale result (generation {} != {})",
                ticket.slug,
                ticket.generation,
                self.generation
            );
            return false;
        }
        let slug = ticket.slug;
        self.status = match outcome {
            Ok(availability) if availability.available => {
                SlugStatus::Available { slug }
            }
            Ok(availability) => SlugStatus::Taken {
                slug,
                reason: availability
                    .message
                    .unwrap_or_else(|| TAKEN_MESSAGE.to_owned()),
            },
            Err(err) => {
                log::warn!("slug/{}: availability check failed: {}", slug, err);
                SlugStatus::CheckFailed {
                    slug,
                    message: err.user_message(),
                }
            }
        };
        true
    }

    /// Move from `Available` to `Claiming`.
    pub fn begin_claim(&mut self) -> std::result::Result<Slug, ValidationError> {
        match &self.status {
            SlugStatus::Available { slug } => {
                let slug = slug.clone();
                self.generation += 1;
                self.status = SlugStatus::Claiming { slug: slug.clone() };
                Ok(slug)
            }
            _ => Err(ValidationError::NotSubmittable),
        }
    }

    pub fn claim_succeeded(&mut self, slug: Slug) {
        self.own_slug = Some(slug.clone());
        self.status = SlugStatus::Claimed { slug };
    }

    pub fn claim_failed(&mut self, slug: Slug, message: String) {
        self.status = SlugStatus::ClaimFailed { slug, message };
    }

    /// The server accepted the claim but it could not be recorded locally.
    /// The slug now counts as the user's own, so retrying needs no check.
    pub fn claim_unsaved(&mut self, slug: Slug, message: String) {
        self.own_slug = Some(slug.clone());
        self.status = SlugStatus::ClaimFailed { slug, message };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityEvent {
    CheckIssued(Slug),
    Resolved(SlugStatus),
    /// A debounced value or a check result arrived for input that has
    /// since changed.
    Discarded(Slug),
}

type Completion = (CheckTicket, Result<Availability>);

/// Debounced, stale-safe availability checking for one slug field.
pub struct SlugAvailability {
    tracker: AvailabilityTracker,
    debouncer: Debouncer<Slug>,
    service: Arc<dyn SlugService>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl SlugAvailability {
    pub fn new(
        service: Arc<dyn SlugService>,
        own_slug: Option<Slug>,
        debounce: Duration,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            tracker: AvailabilityTracker::new(own_slug),
            debouncer: Debouncer::new(debounce),
            service,
            completions_tx,
            completions_rx,
        }
    }

    pub fn status(&self) -> &SlugStatus {
        self.tracker.status()
    }

    pub fn tracker(&self) -> &AvailabilityTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut AvailabilityTracker {
        &mut self.tracker
    }

    pub fn reset(&mut self, own_slug: Option<Slug>) {
        self.debouncer.cancel();
        self.tracker.reset(own_slug);
    }

    /// Feed a keystroke-level value into the field.
    pub fn input(&mut self, raw: &str) -> &SlugStatus {
        match self.tracker.set_input(raw) {
            InputChange::Pending(slug) => self.debouncer.push(slug),
            InputChange::Settled => self.debouncer.cancel(),
            InputChange::Unchanged => {}
        }
        self.tracker.status()
    }

    /// Wait for the next thing that happens to this field: a check being
    /// issued after the debounce interval, or a check result arriving.
    pub async fn next_event(&mut self) -> Option<AvailabilityEvent> {
        tokio::select! {
            Some(slug) = self.debouncer.recv() => {
                Some(self.issue_check(slug))
            }
            Some((ticket, outcome)) = self.completions_rx.recv() => {
                let slug = ticket.slug().clone();
                if self.tracker.resolve(ticket, outcome) {
                    Some(AvailabilityEvent::Resolved(self.tracker.status().clone()))
                } else {
                    Some(AvailabilityEvent::Discarded(slug))
                }
            }
            else => None,
        }
    }

    /// Process events until the status no longer depends on pending work.
    pub async fn settle(&mut self) -> &SlugStatus {
        while self.tracker.status().is_pending() {
            if self.next_event().await.is_none() {
                break;
            }
        }
        self.tracker.status()
    }

    fn issue_check(&mut self, slug: Slug) -> AvailabilityEvent {
        let Some(ticket) = self.tracker.begin_check(&slug) else {
            return AvailabilityEvent::Discarded(slug);
        };
        log::debug!("slug/{}: checking availability", slug);

        let service = Arc::clone(&self.service);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let outcome = service.check_availability(ticket.slug()).await;
            // The field may be gone by now; then nobody wants the answer.
            let _ = completions.send((ticket, outcome));
        });
        AvailabilityEvent::CheckIssued(slug)
    }
}
