//! Async event loop around [`Session`].

use std::{future, pin::Pin, time::Duration};

use tokio::{
    sync::{mpsc, oneshot},
    time::{timeout, Timeout},
};
use tracing::{debug, info, warn};

use super::engine::{Outcome, Session, Transition};
use crate::{
    claim::ClaimRequest,
    error::EngineError,
    models::{Board, CardColor, CardRef, SegmentRef, TurnContext},
};

/// Message shown when the peer drops a claim without answering.
pub const DROPPED_MESSAGE: &str = "Claim was dropped by the server";

/// Input delivered to the driver, processed strictly in arrival order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Authoritative hand changed.
    Synchronize(Vec<CardColor>),
    /// Authoritative turn context changed outside of a claim acknowledgment.
    ContextChanged(TurnContext),
    /// Pointer entered or left a card.
    CardHovered {
        /// Card under the pointer.
        card: CardRef,
        /// Entered (`true`) or left.
        hovered: bool,
    },
    /// A card was clicked.
    CardActivated(CardRef),
    /// A route segment was clicked.
    SegmentActivated(SegmentRef),
}

/// Answer from the authoritative peer to one claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimAck {
    /// The claim was applied; carries the updated context.
    Confirmed {
        /// Claim being answered.
        claim_id: u64,
        /// Context after the claim.
        context: TurnContext,
    },
    /// The claim was refused.
    Rejected {
        /// Claim being answered.
        claim_id: u64,
        /// Message for the player.
        reason: String,
    },
}

impl ClaimAck {
    /// Claim this acknowledgment answers.
    pub fn claim_id(&self) -> u64 {
        match self {
            ClaimAck::Confirmed { claim_id, .. } | ClaimAck::Rejected { claim_id, .. } => {
                *claim_id
            }
        }
    }
}

/// Sends claims to the authoritative peer.
pub trait ClaimPeer {
    /// Submit a claim; the receiver resolves once with the peer's answer.
    fn submit(&mut self, request: ClaimRequest) -> oneshot::Receiver<ClaimAck>;
}

/// Fire-and-forget user-facing messages.
pub trait Notifier {
    /// Show `message` to the player.
    fn notify(&mut self, message: &str);
}

type PendingAck = Pin<Box<Timeout<oneshot::Receiver<ClaimAck>>>>;
type AckResult = Result<Result<ClaimAck, oneshot::error::RecvError>, tokio::time::error::Elapsed>;

/// Owns the session, its context and board snapshot, and talks to the peer.
pub struct SessionDriver<P, N> {
    session: Session,
    context: TurnContext,
    board: Board,
    peer: P,
    notifier: N,
    ack_timeout: Duration,
}

impl<P: ClaimPeer, N: Notifier> SessionDriver<P, N> {
    /// Wire a session to its collaborators.
    pub fn new(
        session: Session,
        context: TurnContext,
        board: Board,
        peer: P,
        notifier: N,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            session,
            context,
            board,
            peer,
            notifier,
            ack_timeout,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn context(&self) -> &TurnContext {
        &self.context
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn peer(&self) -> &P {
        &self.peer
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Process events until the channel closes. At most one acknowledgment is
    /// awaited at a time; queued events are handled before it. A claim still
    /// in flight when the channel closes is awaited (up to its deadline).
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<SessionEvent>,
    ) -> Result<(), EngineError> {
        let mut pending: Option<PendingAck> = None;
        loop {
            tokio::select! {
                biased;
                maybe_event = events.recv() => {
                    let Some(event) = maybe_event else {
                        break;
                    };
                    if let Some(ack) = self.handle_event(event)? {
                        pending = Some(Box::pin(timeout(self.ack_timeout, ack)));
                    }
                }
                result = next_ack(&mut pending) => {
                    pending = None;
                    self.handle_ack(result)?;
                }
            }
        }
        info!("session event channel closed");
        if let Some(ack) = pending.take() {
            let result = ack.await;
            self.handle_ack(result)?;
        }
        Ok(())
    }

    fn handle_event(
        &mut self,
        event: SessionEvent,
    ) -> Result<Option<oneshot::Receiver<ClaimAck>>, EngineError> {
        debug!(?event, "session event");
        let transition = match event {
            SessionEvent::Synchronize(colors) => {
                let report = self.session.synchronize(&colors);
                self.context.me_mut()?.cards = colors;
                Transition {
                    context: self.context.clone(),
                    outcome: Outcome::Synchronized(report),
                }
            }
            SessionEvent::ContextChanged(next) => {
                self.session.context_changed(&self.context, next)?
            }
            SessionEvent::CardHovered { card, hovered } => {
                self.session.card_hovered(&self.context, &card, hovered)?;
                return Ok(None);
            }
            SessionEvent::CardActivated(card) => {
                self.session.card_activated(self.context.clone(), &card)?
            }
            SessionEvent::SegmentActivated(at) => {
                self.session
                    .route_segment_activated(self.context.clone(), &self.board, at)?
            }
        };
        self.apply(transition)
    }

    fn handle_ack(&mut self, result: AckResult) -> Result<(), EngineError> {
        let transition = match result {
            Ok(Ok(ClaimAck::Confirmed { claim_id, context })) => {
                self.session
                    .claim_confirmed(self.context.clone(), claim_id, context)?
            }
            Ok(Ok(ClaimAck::Rejected { claim_id, reason })) => {
                self.session
                    .claim_rejected(self.context.clone(), claim_id, reason)
            }
            Ok(Err(_)) => {
                warn!("claim acknowledgment channel dropped");
                self.session.abandon_pending();
                self.notifier.notify(DROPPED_MESSAGE);
                return Ok(());
            }
            Err(_) => Transition {
                context: self.context.clone(),
                outcome: self.session.abandon_pending(),
            },
        };
        self.apply(transition)?;
        Ok(())
    }

    fn apply(
        &mut self,
        transition: Transition,
    ) -> Result<Option<oneshot::Receiver<ClaimAck>>, EngineError> {
        self.context = transition.context;
        if let Some(message) = transition.outcome.notification() {
            self.notifier.notify(&message);
        }
        match transition.outcome {
            Outcome::Submitted(request) => Ok(Some(self.peer.submit(request))),
            Outcome::Confirmed {
                placement,
                coin_color,
            } => {
                self.board.place_marker(
                    SegmentRef::new(placement.route_index, placement.segment_index),
                    coin_color,
                )?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

async fn next_ack(pending: &mut Option<PendingAck>) -> AckResult {
    match pending.as_mut() {
        Some(ack) => ack.await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hand::LayoutConfig,
        models::{CardColor::*, PlayerState, Route, TrackColor, ZoneId},
        session::{LocalReferee, TIMEOUT_MESSAGE},
    };

    #[derive(Default)]
    struct RecordingNotifier(Vec<String>);

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    /// Counts submissions and never answers.
    #[derive(Default)]
    struct SilentPeer {
        submitted: Vec<ClaimRequest>,
        senders: Vec<oneshot::Sender<ClaimAck>>,
    }

    impl ClaimPeer for SilentPeer {
        fn submit(&mut self, request: ClaimRequest) -> oneshot::Receiver<ClaimAck> {
            self.submitted.push(request);
            let (tx, rx) = oneshot::channel();
            self.senders.push(tx);
            rx
        }
    }

    fn context(cards: &[CardColor]) -> TurnContext {
        TurnContext {
            my_turn: true,
            players: vec![PlayerState {
                name: "Ana".to_string(),
                color: "red".to_string(),
                coins: 45,
                cards: cards.to_vec(),
            }],
            ..TurnContext::default()
        }
    }

    fn board() -> Board {
        Board::new(vec![
            Route::uniform(TrackColor::Fixed(Blue), 2).unwrap(),
            Route::uniform(TrackColor::Gray, 3).unwrap(),
        ])
    }

    fn session() -> Session {
        Session::new(
            ZoneId::default(),
            LayoutConfig::default(),
            chrono::Duration::seconds(10),
        )
    }

    fn card(index: usize) -> CardRef {
        CardRef::new(ZoneId::default(), index)
    }

    async fn drive<P: ClaimPeer, N: Notifier>(
        driver: &mut SessionDriver<P, N>,
        events: Vec<SessionEvent>,
    ) -> Result<(), EngineError> {
        let (tx, rx) = mpsc::channel(16);
        for event in events {
            tx.send(event).await.expect("channel open");
        }
        drop(tx);
        driver.run(rx).await
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_double_pin_submits_once() -> Result<(), EngineError> {
        let hand = [Blue, Blue];
        let mut driver = SessionDriver::new(
            session(),
            context(&hand),
            board(),
            SilentPeer::default(),
            RecordingNotifier::default(),
            Duration::from_secs(10),
        );
        drive(
            &mut driver,
            vec![
                SessionEvent::Synchronize(hand.to_vec()),
                SessionEvent::CardActivated(card(0)),
                SessionEvent::SegmentActivated(SegmentRef::new(0, 0)),
                SessionEvent::SegmentActivated(SegmentRef::new(0, 0)),
            ],
        )
        .await?;

        assert_eq!(driver.peer().submitted.len(), 1);
        // The silent peer never answers, so the only message is the deadline.
        assert_eq!(driver.notifier().0, vec![TIMEOUT_MESSAGE]);
        Ok(())
    }

    #[tokio::test]
    async fn confirmed_claims_place_markers() -> Result<(), EngineError> {
        let hand = [Blue, Blue, Red];
        let start = context(&hand);
        let referee = LocalReferee::new(board(), start.clone());
        let mut driver = SessionDriver::new(
            session(),
            start,
            board(),
            referee,
            RecordingNotifier::default(),
            Duration::from_secs(10),
        );

        let (tx, rx) = mpsc::channel(16);
        tx.send(SessionEvent::Synchronize(hand.to_vec())).await.expect("open");
        tx.send(SessionEvent::CardActivated(card(0))).await.expect("open");
        tx.send(SessionEvent::SegmentActivated(SegmentRef::new(0, 0)))
            .await
            .expect("open");
        drop(tx);
        driver.run(rx).await?;

        let segment = &driver.board().routes()[0].segments()[0];
        assert_eq!(segment.coin_color.as_deref(), Some("red"));
        assert!(!driver.session().gate().is_busy());
        assert_eq!(driver.context().me()?.cards, vec![Blue, Red]);
        assert_eq!(driver.context().selected_route_index, Some(0));
        assert_eq!(driver.session().hand().colors(), vec![Blue, Red]);
        Ok(())
    }

    #[tokio::test]
    async fn rejections_are_notified() -> Result<(), EngineError> {
        let hand = [Red, Red];
        let mut driver = SessionDriver::new(
            session(),
            context(&hand),
            board(),
            SilentPeer::default(),
            RecordingNotifier::default(),
            Duration::from_secs(10),
        );
        drive(
            &mut driver,
            vec![
                SessionEvent::Synchronize(hand.to_vec()),
                SessionEvent::CardActivated(card(0)),
                SessionEvent::SegmentActivated(SegmentRef::new(0, 0)),
            ],
        )
        .await?;

        assert_eq!(driver.notifier().0, vec!["Color mismatch red vs blue"]);
        assert!(driver.peer().submitted.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_claim_times_out() -> Result<(), EngineError> {
        let hand = [Blue, Blue];
        let mut driver = SessionDriver::new(
            session(),
            context(&hand),
            board(),
            SilentPeer::default(),
            RecordingNotifier::default(),
            Duration::from_millis(200),
        );

        let (tx, rx) = mpsc::channel(16);
        tx.send(SessionEvent::Synchronize(hand.to_vec())).await.expect("open");
        tx.send(SessionEvent::CardActivated(card(0))).await.expect("open");
        tx.send(SessionEvent::SegmentActivated(SegmentRef::new(0, 1)))
            .await
            .expect("open");

        let sender = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            drop(tx);
        });
        driver.run(rx).await?;
        sender.await.expect("sender task");

        assert_eq!(driver.notifier().0, vec![TIMEOUT_MESSAGE]);
        assert!(!driver.session().gate().is_busy());
        Ok(())
    }
}
