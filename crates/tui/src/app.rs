use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parking_lot::Mutex;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use railhand_core::{
    claim::ClaimRequest,
    models::{Board, CardColor, CardRef, SegmentRef, TrackColor, TurnContext},
    session::{ClaimAck, Outcome, Session, Transition},
    AppConfig, LocalReferee, RefereeError,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const DRAW_COUNT: usize = 2;
const HELP: &str = "←/→ card  ⏎ lift/undo  ↑/↓ route  1-9 pin segment  d draw  q quit";

#[derive(Debug, Clone)]
struct Theme {
    accent: Color,
    muted: Color,
    success: Color,
    warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    Ack(ClaimAck),
}

/// Terminal client for a local game against the in-process referee.
pub struct RailhandApp {
    session: Session,
    context: TurnContext,
    board: Board,
    referee: Arc<Mutex<LocalReferee>>,
    peer_latency: Duration,
    state: UiState,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl RailhandApp {
    pub fn new(
        config: &AppConfig,
        board: Board,
        referee: Arc<Mutex<LocalReferee>>,
    ) -> Result<Self> {
        let context = referee.lock().context().clone();
        let mut session = Session::from_config(config);
        let report = session.synchronize(&context.me()?.cards);
        info!(cards = report.created, "opening hand dealt");

        let mut app = Self {
            session,
            context,
            board,
            referee,
            peer_latency: Duration::from_millis(config.demo.peer_latency_ms),
            state: UiState::default(),
            event_tx: None,
            theme: Theme::default(),
        };
        app.hover(0, true)?;
        Ok(app)
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        let result = self.event_loop(&mut terminal, &mut event_rx).await;
        if let Some(request) = self.session.shutdown() {
            warn!(claim_id = request.claim_id, "quit with a claim still in flight");
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        events: &mut mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            let Some(event) = events.recv().await else {
                break;
            };
            self.process_app_event(event);
            if self.state.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn process_app_event(&mut self, event: AppEvent) {
        let result = match event {
            AppEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key)
            }
            AppEvent::Input(_) => Ok(()),
            AppEvent::Tick => {
                self.handle_tick();
                Ok(())
            }
            AppEvent::Ack(ack) => self.handle_ack(ack),
        };
        if let Err(err) = result {
            error!("event handling failed: {err:#}");
            self.state.set_status(format!("Error: {err}"));
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Left => self.move_hover(-1)?,
            KeyCode::Right => self.move_hover(1)?,
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_card()?,
            KeyCode::Up => self.move_route(-1),
            KeyCode::Down => self.move_route(1),
            KeyCode::Char(digit @ '1'..='9') => {
                self.activate_segment(digit as usize - '1' as usize)?
            }
            KeyCode::Char('d') => self.draw_cards()?,
            _ => {}
        }
        Ok(())
    }

    fn handle_tick(&mut self) {
        let outcome = self.session.expire_pending(Utc::now());
        if let Some(message) = outcome.notification() {
            self.state.set_status(message);
        }
    }

    fn handle_ack(&mut self, ack: ClaimAck) -> Result<()> {
        let confirmed = matches!(ack, ClaimAck::Confirmed { .. });
        let transition = match ack {
            ClaimAck::Confirmed { claim_id, context } => {
                self.session
                    .claim_confirmed(self.context.clone(), claim_id, context)?
            }
            ClaimAck::Rejected { claim_id, reason } => {
                self.session
                    .claim_rejected(self.context.clone(), claim_id, reason)
            }
        };
        if confirmed && !matches!(transition.outcome, Outcome::Confirmed { .. }) {
            // A late confirmation still moved the authoritative board.
            self.board = self.referee.lock().board().clone();
        }
        self.apply(transition)
    }

    fn apply(&mut self, transition: Transition) -> Result<()> {
        let previous_count = self.context.action_count;
        self.context = transition.context;
        if let Some(message) = transition.outcome.notification() {
            self.state.set_status(message);
        }
        match transition.outcome {
            Outcome::CardLifted(selected) => self.state.set_status(format!(
                "Lifted {}; pick a route with ↑/↓ and a segment with 1-9",
                selected.color
            )),
            Outcome::CardLowered(selected) => {
                self.state.set_status(format!("Put back {}", selected.color))
            }
            Outcome::Submitted(request) => {
                self.state.set_status(format!(
                    "Claiming segment {} of route {}…",
                    request.segment_index + 1,
                    request.route_index + 1
                ));
                self.spawn_peer(request);
            }
            Outcome::Confirmed {
                placement,
                coin_color,
            } => {
                let at = SegmentRef::new(placement.route_index, placement.segment_index);
                self.board.place_marker(at, coin_color)?;
                let message = if self.context.action_count < previous_count {
                    "Route completed; your turn again".to_string()
                } else {
                    format!("Segment {} claimed", placement.segment_index + 1)
                };
                self.state.set_status(message);
            }
            Outcome::Ignored(reason) => debug!(?reason, "input ignored"),
            _ => {}
        }
        self.clamp_hover()
    }

    fn spawn_peer(&mut self, request: ClaimRequest) {
        let Some(sender) = self.event_tx.clone() else {
            warn!(claim_id = request.claim_id, "no event channel; claim left to time out");
            return;
        };
        let referee = Arc::clone(&self.referee);
        let latency = self.peer_latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            let ack = referee.lock().apply(&request);
            if sender.send(AppEvent::Ack(ack)).await.is_err() {
                debug!("app closed before claim acknowledgment");
            }
        });
    }

    fn card_ref(&self, index: usize) -> CardRef {
        CardRef::new(self.session.hand().zone().clone(), index)
    }

    fn hover(&mut self, index: usize, hovered: bool) -> Result<()> {
        if index >= self.session.hand().len() {
            return Ok(());
        }
        let card = self.card_ref(index);
        self.session.card_hovered(&self.context, &card, hovered)?;
        Ok(())
    }

    fn move_hover(&mut self, delta: isize) -> Result<()> {
        let len = self.session.hand().len();
        if len == 0 {
            return Ok(());
        }
        let next = (self.state.hover as isize + delta).clamp(0, len as isize - 1) as usize;
        if next == self.state.hover {
            return Ok(());
        }
        self.hover(self.state.hover, false)?;
        self.state.hover = next;
        self.hover(next, true)?;
        self.scroll_into_view();
        Ok(())
    }

    fn clamp_hover(&mut self) -> Result<()> {
        let len = self.session.hand().len();
        self.state.hover = self.state.hover.min(len.saturating_sub(1));
        self.hover(self.state.hover, true)?;
        self.scroll_into_view();
        Ok(())
    }

    fn scroll_into_view(&mut self) {
        let Some(x) = self
            .session
            .hand()
            .cards()
            .get(self.state.hover)
            .and_then(|card| card.position())
            .map(|position| position.x)
        else {
            return;
        };
        let layout = self.session.layout_config().clone();
        let mut arrows = self.session.scroll(0);
        while arrows.right && self.section_x(x) + layout.card_width > layout.section_width {
            arrows = self.session.scroll(-layout.scroll_step);
        }
        while arrows.left && self.section_x(x) < 0 {
            arrows = self.session.scroll(layout.scroll_step);
        }
    }

    // Card x in hand coordinates to an offset inside the visible section.
    fn section_x(&self, x: i32) -> i32 {
        let left = self.session.layout_config().left;
        x + self.session.viewport().offset() - 2 * left
    }

    fn move_route(&mut self, delta: isize) {
        let count = self.board.routes().len();
        if count == 0 {
            return;
        }
        self.state.route_cursor =
            (self.state.route_cursor as isize + delta).rem_euclid(count as isize) as usize;
    }

    fn activate_card(&mut self) -> Result<()> {
        if self.session.hand().is_empty() {
            self.state.set_status("No cards in hand; press d to draw".to_string());
            return Ok(());
        }
        let card = self.card_ref(self.state.hover);
        let transition = self.session.card_activated(self.context.clone(), &card)?;
        self.apply(transition)
    }

    fn activate_segment(&mut self, segment: usize) -> Result<()> {
        let Some(route) = self.board.routes().get(self.state.route_cursor) else {
            return Ok(());
        };
        if segment >= route.len() {
            self.state
                .set_status(format!("This route has {} segments", route.len()));
            return Ok(());
        }
        let at = SegmentRef::new(self.state.route_cursor, segment);
        let transition =
            self.session
                .route_segment_activated(self.context.clone(), &self.board, at)?;
        self.apply(transition)
    }

    fn draw_cards(&mut self) -> Result<()> {
        if self.session.gate().is_busy() {
            self.state.set_status("Waiting for the server…".to_string());
            return Ok(());
        }
        if self.context.action_count != 0 {
            self.state
                .set_status(RefereeError::ActionInProgress.to_string());
            return Ok(());
        }
        let drawn = self.referee.lock().draw_cards(DRAW_COUNT);
        match drawn {
            Ok(next) => {
                let transition = self.session.context_changed(&self.context, next)?;
                self.apply(transition)?;
                self.state.set_status(format!("Drew {DRAW_COUNT} cards"));
            }
            Err(reason) => self.state.set_status(reason.to_string()),
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(5),
                Constraint::Length(4),
            ])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(rows[0]);

        self.draw_routes(frame, top[0]);
        self.draw_context(frame, top[1]);
        self.draw_hand(frame, rows[1]);
        self.draw_status(frame, rows[2]);
    }

    fn draw_routes(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .board
            .routes()
            .iter()
            .enumerate()
            .map(|(idx, route)| {
                let pinned = self.context.selected_route_index == Some(idx);
                let cursor = if idx == self.state.route_cursor {
                    "▶ "
                } else {
                    "  "
                };
                let mut name_style = Style::default();
                if pinned {
                    name_style = name_style.add_modifier(Modifier::BOLD);
                }
                let mut spans = vec![
                    Span::styled(cursor, Style::default().fg(self.theme.accent)),
                    Span::styled(
                        format!("{:<22}", route.name().unwrap_or("unnamed route")),
                        name_style,
                    ),
                    Span::styled(
                        format!("{:<7}", route.color().as_str()),
                        Style::default().fg(track_color(route.color())),
                    ),
                ];
                for (segment_idx, segment) in route.segments().iter().enumerate() {
                    spans.push(match &segment.coin_color {
                        Some(coin) => Span::styled("● ", Style::default().fg(coin_color(coin))),
                        None => Span::styled(
                            format!("{} ", segment_idx + 1),
                            Style::default().fg(track_color(segment.color)),
                        ),
                    });
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Routes"));
        frame.render_widget(list, area);
    }

    fn draw_context(&self, frame: &mut Frame, area: Rect) {
        let ctx = &self.context;
        let mut lines = Vec::new();
        let turn = if ctx.is_game_over() {
            Span::styled("game over", Style::default().fg(self.theme.warning))
        } else if ctx.my_turn {
            Span::styled("yours", Style::default().fg(self.theme.success))
        } else {
            Span::styled("waiting", Style::default().fg(self.theme.muted))
        };
        lines.push(Line::from(vec![Span::raw("Turn:    "), turn]));
        lines.push(Line::from(format!(
            "Action:  {} ({})",
            ctx.action_name, ctx.action_count
        )));
        if let Ok(me) = ctx.me() {
            lines.push(Line::from(format!("Coins:   {}", me.coins)));
            lines.push(Line::from(format!("Cards:   {}", me.cards.len())));
        }
        let pinned = ctx
            .selected_route_index
            .and_then(|idx| self.board.routes().get(idx))
            .map(|route| route.name().unwrap_or("unnamed route").to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(format!("Pinned:  {pinned}")));
        let locked = ctx
            .gray_route_color
            .map(|color| color.to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(format!("Gray as: {locked}")));
        let claim = match (self.session.gate().in_flight(), self.session.claim().selected()) {
            (Some(request), _) => format!("claim #{} in flight", request.claim_id),
            (None, Some(selected)) => format!("{} lifted", selected.color),
            (None, None) => "idle".to_string(),
        };
        lines.push(Line::from(format!("Claim:   {claim}")));
        lines.push(Line::from(""));
        for (idx, player) in ctx.players.iter().enumerate() {
            let marker = if idx == ctx.current_player_index {
                "▶"
            } else {
                " "
            };
            lines.push(Line::from(vec![
                Span::raw(format!("{marker} ")),
                Span::styled(
                    format!("{:<8}", player.name),
                    Style::default().fg(coin_color(&player.color)),
                ),
                Span::raw(format!("{} coins", player.coins)),
            ]));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Turn"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_hand(&mut self, frame: &mut Frame, area: Rect) {
        let arrows = self.session.scroll(0);
        let title = format!(
            "Hand ({}) {}{}",
            self.session.hand().len(),
            if arrows.left { "◀" } else { " " },
            if arrows.right { "▶" } else { " " },
        );
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let layout = self.session.layout_config();
        let columns = inner.width;
        let card_cols = to_column(layout.card_width, layout.section_width, columns)
            .unwrap_or(1)
            .max(1);
        let blank = (' ', Style::default());
        let mut grid = vec![vec![blank; columns as usize]; 3];

        for (idx, card) in self.session.hand().cards().iter().enumerate() {
            let Some(position) = card.position() else {
                continue;
            };
            let offset = self.section_x(position.x);
            let Some(start) = to_column(offset, layout.section_width, columns) else {
                continue;
            };
            let row = if card.is_lifted() { 0 } else { 1 };
            let mut face = Style::default().bg(card_color(card.color())).fg(Color::Black);
            if card.is_highlighted() {
                face = face.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            }
            let end = (start + card_cols).min(columns);
            for col in start..end {
                let glyph = if col == start {
                    card_letter(card.color())
                } else {
                    ' '
                };
                grid[row][col as usize] = (glyph, face);
            }
            if idx == self.state.hover {
                grid[2][start as usize] = ('▲', Style::default().fg(self.theme.accent));
            }
        }

        let lines: Vec<Line> = grid
            .into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|(glyph, style)| Span::styled(glyph.to_string(), style))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(self.state.status.as_str()),
            Line::from(Span::styled(HELP, Style::default().fg(self.theme.muted))),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Map an offset inside the hand section onto a terminal column.
fn to_column(x: i32, section_width: i32, columns: u16) -> Option<u16> {
    if x < 0 || section_width <= 0 || x >= section_width {
        return None;
    }
    Some((i64::from(x) * i64::from(columns) / i64::from(section_width)) as u16)
}

fn card_letter(color: CardColor) -> char {
    match color {
        CardColor::Black => 'K',
        CardColor::White => 'W',
        CardColor::Red => 'R',
        CardColor::Orange => 'O',
        CardColor::Purple => 'P',
        CardColor::Yellow => 'Y',
        CardColor::Green => 'G',
        CardColor::Blue => 'B',
        CardColor::Rainbow => '*',
    }
}

fn card_color(color: CardColor) -> Color {
    match color {
        CardColor::Black => Color::DarkGray,
        CardColor::White => Color::White,
        CardColor::Red => Color::Red,
        CardColor::Orange => Color::Rgb(255, 165, 0),
        CardColor::Purple => Color::Magenta,
        CardColor::Yellow => Color::Yellow,
        CardColor::Green => Color::Green,
        CardColor::Blue => Color::Blue,
        CardColor::Rainbow => Color::Cyan,
    }
}

fn track_color(color: TrackColor) -> Color {
    match color {
        TrackColor::Gray => Color::Gray,
        TrackColor::Fixed(color) => card_color(color),
    }
}

fn coin_color(name: &str) -> Color {
    name.parse::<CardColor>()
        .map(card_color)
        .unwrap_or(Color::White)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    hover: usize,
    route_cursor: usize,
    status: String,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            hover: 0,
            route_cursor: 0,
            status: "Your turn: lift a card or press d to draw".to_string(),
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, status: String) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_scale_with_terminal_width() {
        assert_eq!(to_column(0, 920, 92), Some(0));
        assert_eq!(to_column(460, 920, 92), Some(46));
        assert_eq!(to_column(919, 920, 92), Some(91));
        assert_eq!(to_column(920, 920, 92), None);
        assert_eq!(to_column(-1, 920, 92), None);
    }

    #[test]
    fn unknown_coin_colors_fall_back_to_white() {
        assert_eq!(coin_color("red"), Color::Red);
        assert_eq!(coin_color("silver"), Color::White);
    }
}
