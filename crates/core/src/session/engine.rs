//! The hand/claim engine behind the client's four entry points.
//!
//! Every entry point takes the current [`TurnContext`] by value and hands it
//! back inside a [`Transition`], updated when the transition changed it. The
//! engine itself only owns what is local to this client: the hand, the lifted
//! card and the submission gate.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::{
    claim::{
        validate_pin, ActionGate, ClaimAction, ClaimRequest, PinAttempt, Rejection, SelectedCard,
    },
    config::AppConfig,
    error::EngineError,
    hand::{ArrowVisibility, Hand, HandViewport, LayoutConfig, LayoutOutcome, ReconcileReport},
    models::{
        parse_colors, ActionName, CardColor, CardRef, ClaimPlacement, RouteLookup, SegmentRef,
        TurnContext, ZoneId,
    },
};

/// Message shown when a claim is abandoned without acknowledgment.
pub const TIMEOUT_MESSAGE: &str = "Claim timed out, try again";

/// Why an event was dropped without effect. Never shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardReason {
    /// A claim is awaiting acknowledgment.
    GateBusy,
    /// Not our turn, game over, or another action is in progress.
    NotEligible,
    /// The event belongs to another zone's hand.
    ForeignZone,
    /// A segment was activated with no card lifted.
    NoCardSelected,
}

/// Observable result of an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing happened.
    Ignored(GuardReason),
    /// The hand was reconciled and laid out.
    Synchronized(ReconcileReport),
    /// A card was lifted; the claim now waits for a segment.
    CardLifted(SelectedCard),
    /// The lifted card was put back.
    CardLowered(SelectedCard),
    /// The pin breaks a rule; state did not advance.
    Rejected(Rejection),
    /// The claim must be sent to the authoritative peer.
    Submitted(ClaimRequest),
    /// The peer accepted the claim; draw `coin_color` at `placement`.
    Confirmed {
        /// Where the marker goes.
        placement: ClaimPlacement,
        /// Marker color.
        coin_color: String,
    },
    /// The peer refused the claim.
    PeerRejected {
        /// Reason given by the peer.
        reason: String,
    },
    /// The claim was abandoned after its deadline.
    TimedOut(ClaimRequest),
    /// No in-flight claim was affected.
    Unchanged,
}

impl Outcome {
    /// Message to surface through the notification collaborator, if any.
    pub fn notification(&self) -> Option<String> {
        match self {
            Outcome::Rejected(rejection) => Some(rejection.to_string()),
            Outcome::PeerRejected { reason } => Some(reason.clone()),
            Outcome::TimedOut(_) => Some(TIMEOUT_MESSAGE.to_string()),
            _ => None,
        }
    }
}

/// Context after a transition together with what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Context to use for the next event.
    pub context: TurnContext,
    /// What the transition did.
    pub outcome: Outcome,
}

impl Transition {
    fn new(context: TurnContext, outcome: Outcome) -> Self {
        Self { context, outcome }
    }
}

/// Hand reconciliation, layout and the route-claim state machine for one zone.
#[derive(Debug, Clone)]
pub struct Session {
    hand: Hand,
    claim: ClaimAction,
    gate: ActionGate,
    layout: LayoutConfig,
    viewport: HandViewport,
    last_layout: LayoutOutcome,
    ack_timeout: Duration,
    // Lift still counted by the context after its color left the hand.
    dropped: Option<SelectedCard>,
}

impl Session {
    /// Empty session for `zone`.
    pub fn new(zone: ZoneId, layout: LayoutConfig, ack_timeout: Duration) -> Self {
        let viewport = HandViewport::new(&layout);
        Self {
            hand: Hand::new(zone),
            claim: ClaimAction::default(),
            gate: ActionGate::new(),
            layout,
            viewport,
            last_layout: LayoutOutcome::Empty,
            ack_timeout,
            dropped: None,
        }
    }

    /// Session for the local player's zone using configured geometry and deadline.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ZoneId::default(),
            config.layout.clone(),
            i64::try_from(config.claim.ack_timeout_ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .unwrap_or(Duration::MAX),
        )
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn claim(&self) -> &ClaimAction {
        &self.claim
    }

    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Outcome of the most recent layout pass.
    pub fn last_layout(&self) -> LayoutOutcome {
        self.last_layout
    }

    pub fn viewport(&self) -> &HandViewport {
        &self.viewport
    }

    /// Reconcile the hand against the authoritative list and lay it out.
    pub fn synchronize(&mut self, colors: &[CardColor]) -> ReconcileReport {
        let report = self.hand.reconcile(colors);
        self.follow_selection();
        self.relayout();
        report
    }

    /// [`Session::synchronize`] for raw color tokens.
    pub fn synchronize_tokens<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
    ) -> Result<ReconcileReport, EngineError> {
        let colors = parse_colors(tokens)?;
        Ok(self.synchronize(&colors))
    }

    /// Pointer entered or left a card. Returns whether the highlight changed.
    pub fn card_hovered(
        &mut self,
        ctx: &TurnContext,
        card: &CardRef,
        hovered: bool,
    ) -> Result<bool, EngineError> {
        if &card.zone != self.hand.zone() {
            return Ok(false);
        }
        let highlight = hovered && ctx.can_act();
        let target = self.hand.card_mut(card.index)?;
        if target.is_highlighted() == highlight {
            return Ok(false);
        }
        target.set_highlighted(highlight);
        Ok(true)
    }

    /// Toggle: lift the card when none is lifted, otherwise put the lifted one back.
    pub fn card_activated(
        &mut self,
        mut ctx: TurnContext,
        card: &CardRef,
    ) -> Result<Transition, EngineError> {
        if let Some(reason) = self.guard(&ctx) {
            return Ok(Transition::new(ctx, Outcome::Ignored(reason)));
        }
        if &card.zone != self.hand.zone() {
            debug!(zone = %card.zone, "card event from another zone ignored");
            return Ok(Transition::new(ctx, Outcome::Ignored(GuardReason::ForeignZone)));
        }

        self.hand.card_mut(card.index)?.set_highlighted(false);

        if !ctx.card_lifted() {
            if let Some(stale) = self.lower_selection() {
                warn!(index = stale.index, "context shows no lift; stale selection lowered");
            }
            let target = self.hand.card_mut(card.index)?;
            let color = target.color();
            target.lift(self.layout.lift);
            let selected = SelectedCard {
                index: card.index,
                color,
            };
            ctx.action_name = ActionName::ClaimRoute;
            ctx.action_count += 1;
            self.claim.select(selected);
            info!(index = card.index, color = %color, "card lifted for route claim");
            return Ok(Transition::new(ctx, Outcome::CardLifted(selected)));
        }

        let selected = self
            .lower_selection()
            .ok_or(EngineError::MissingSelection(ctx.action_count))?;
        ctx.action_count -= 1;
        ctx.action_name = if ctx.action_count > 0 {
            ActionName::ClaimRoute
        } else {
            ActionName::Start
        };
        self.relayout();
        info!(index = selected.index, color = %selected.color, "card selection undone");
        Ok(Transition::new(ctx, Outcome::CardLowered(selected)))
    }

    /// Validate a pin with the lifted card and submit it when legal.
    pub fn route_segment_activated(
        &mut self,
        ctx: TurnContext,
        routes: &dyn RouteLookup,
        at: SegmentRef,
    ) -> Result<Transition, EngineError> {
        if let Some(reason) = self.guard(&ctx) {
            return Ok(Transition::new(ctx, Outcome::Ignored(reason)));
        }
        let Some(selected) = self.claim.selected() else {
            return Ok(Transition::new(
                ctx,
                Outcome::Ignored(GuardReason::NoCardSelected),
            ));
        };

        let route = routes.require_route(at.route_index)?;
        let segment = route
            .segment(at.segment_index)
            .ok_or(EngineError::SegmentOutOfRange {
                route: at.route_index,
                segment: at.segment_index,
                len: route.len(),
            })?;
        let attempt = PinAttempt {
            at,
            route,
            segment,
            card: selected.color,
            coins: ctx.me()?.coins,
        };

        if let Err(rejection) = validate_pin(&ctx, self.hand.counter(), &attempt) {
            warn!(
                route = at.route_index,
                segment = at.segment_index,
                card = %selected.color,
                %rejection,
                "route pin rejected"
            );
            return Ok(Transition::new(ctx, Outcome::Rejected(rejection)));
        }

        let draft = ClaimRequest {
            claim_id: 0,
            route_length: route.len(),
            route_index: at.route_index,
            segment_index: at.segment_index,
            selected_card_color: selected.color,
            route_color: route.color(),
        };
        let Some(request) = self.gate.try_submit(draft, Utc::now()) else {
            return Ok(Transition::new(ctx, Outcome::Ignored(GuardReason::GateBusy)));
        };
        info!(
            claim_id = request.claim_id,
            route = request.route_index,
            segment = request.segment_index,
            card = %request.selected_card_color,
            "route claim submitted"
        );
        Ok(Transition::new(ctx, Outcome::Submitted(request)))
    }

    /// The peer confirmed a claim. `ctx` is the context the claim was made
    /// under; `confirmed` is the peer's updated context.
    pub fn claim_confirmed(
        &mut self,
        ctx: TurnContext,
        claim_id: u64,
        confirmed: TurnContext,
    ) -> Result<Transition, EngineError> {
        let Some(request) = self.gate.release(claim_id) else {
            warn!(claim_id, "stale claim confirmation; adopting context only");
            return self.context_changed(&ctx, confirmed);
        };

        let coin_color = ctx.current_player()?.color.clone();
        let placement = confirmed.action_data.unwrap_or(ClaimPlacement {
            route_index: request.route_index,
            segment_index: request.segment_index,
        });

        self.lower_selection();
        self.synchronize(&confirmed.me()?.cards);
        info!(
            claim_id,
            route = placement.route_index,
            segment = placement.segment_index,
            coin = %coin_color,
            "route claim confirmed"
        );
        Ok(Transition::new(
            confirmed,
            Outcome::Confirmed {
                placement,
                coin_color,
            },
        ))
    }

    /// The peer refused a claim. The lifted card stays lifted.
    pub fn claim_rejected(
        &mut self,
        ctx: TurnContext,
        claim_id: u64,
        reason: String,
    ) -> Transition {
        if self.gate.release(claim_id).is_none() {
            warn!(claim_id, "stale claim rejection ignored");
            return Transition::new(ctx, Outcome::Unchanged);
        }
        warn!(claim_id, %reason, "route claim refused by peer");
        Transition::new(ctx, Outcome::PeerRejected { reason })
    }

    /// Release the gate when the in-flight claim is past its deadline.
    pub fn expire_pending(&mut self, now: DateTime<Utc>) -> Outcome {
        if !self.gate.is_expired(now, self.ack_timeout) {
            return Outcome::Unchanged;
        }
        self.abandon_pending()
    }

    /// Release the gate unconditionally, giving up on the in-flight claim.
    pub fn abandon_pending(&mut self) -> Outcome {
        match self.gate.force_release() {
            Some(request) => {
                warn!(claim_id = request.claim_id, "route claim abandoned without acknowledgment");
                Outcome::TimedOut(request)
            }
            None => Outcome::Unchanged,
        }
    }

    /// Adopt a new authoritative context. A turn change or game end drops any
    /// pending selection; the hand is re-synchronized either way.
    pub fn context_changed(
        &mut self,
        previous: &TurnContext,
        next: TurnContext,
    ) -> Result<Transition, EngineError> {
        let turn_changed = previous.current_player_index != next.current_player_index
            || previous.my_turn != next.my_turn
            || next.is_game_over();
        if turn_changed || !next.card_lifted() {
            if let Some(selected) = self.lower_selection() {
                info!(index = selected.index, turn_changed, "card selection dropped");
            }
        }
        let report = self.synchronize(&next.me()?.cards);
        Ok(Transition::new(next, Outcome::Synchronized(report)))
    }

    /// Scroll the hand section.
    pub fn scroll(&mut self, delta: i32) -> ArrowVisibility {
        let content_width = match self.last_layout {
            LayoutOutcome::Rendered { content_width } => content_width,
            LayoutOutcome::Empty => 0,
        };
        self.viewport.scroll(delta, content_width, &self.layout)
    }

    /// Tear down: drop any selection, give up on the in-flight claim and
    /// destroy every card.
    pub fn shutdown(&mut self) -> Option<ClaimRequest> {
        self.lower_selection();
        let abandoned = self.gate.force_release();
        self.hand.clear();
        self.relayout();
        info!(abandoned = abandoned.is_some(), "session shut down");
        abandoned
    }

    fn guard(&self, ctx: &TurnContext) -> Option<GuardReason> {
        if self.gate.is_busy() {
            debug!("event ignored; claim in flight");
            return Some(GuardReason::GateBusy);
        }
        if !ctx.can_act() {
            debug!(my_turn = ctx.my_turn, action = %ctx.action_name, "event ignored; not eligible");
            return Some(GuardReason::NotEligible);
        }
        None
    }

    fn relayout(&mut self) {
        self.last_layout = self.hand.layout(&self.layout);
    }

    // Falls back to a selection lost in a resync so the lift can still be undone.
    fn lower_selection(&mut self) -> Option<SelectedCard> {
        let Some(selected) = self.claim.reset() else {
            return self.dropped.take();
        };
        self.dropped = None;
        if let Ok(card) = self.hand.card_mut(selected.index) {
            card.lower(self.layout.lift);
        }
        Some(selected)
    }

    // Same-colored cards are interchangeable, so a lifted card whose slot was
    // rebuilt moves to any card of its color.
    fn follow_selection(&mut self) {
        let Some(selected) = self.claim.selected() else {
            return;
        };
        let still_there = self
            .hand
            .card(selected.index)
            .map(|card| card.color() == selected.color)
            .unwrap_or(false);
        let index = if still_there {
            Some(selected.index)
        } else {
            self.hand
                .cards()
                .iter()
                .position(|card| card.color() == selected.color)
        };
        match index {
            Some(index) => {
                if let Ok(card) = self.hand.card_mut(index) {
                    card.lift(self.layout.lift);
                }
                self.claim.select(SelectedCard {
                    index,
                    color: selected.color,
                });
            }
            None => {
                warn!(color = %selected.color, "lifted card left the hand; selection dropped");
                self.dropped = self.claim.reset();
            }
        }
    }
}
