//! The process-level controller.
//!
//! One `Controller` owns every piece of mutable state: the timer, the
//! blocklist, the ambient settings, and the host facilities they talk to.
//! Handlers take `&mut self`, so there is exactly one writer.
//!
//! Host failures are logged and swallowed here; only validation errors
//! reach the caller.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::ambient::{AmbientCoordinator, AmbientSettings, PlaybackCommand, PlaybackContext};
use crate::blocking::{sync_rules, BlockedUrlEntry, Blocklist, RuleSink};
use crate::error::ValidationError;
use crate::events::Event;
use crate::gatekeeper::{Gatekeeper, PageHost, Verdict};
use crate::messages::{Message, Response};
use crate::notification;
use crate::storage::{self, keys, Config, Store};
use crate::timer::{Mode, TimerEngine, TimerSettings, TimerState};

const EVENT_CAPACITY: usize = 64;

pub struct Controller<S: Store, R: RuleSink, P: PlaybackContext> {
    store: S,
    rules: R,
    playback: P,
    config: Config,
    timer: TimerEngine,
    blocklist: Blocklist,
    ambient: AmbientCoordinator,
    events: broadcast::Sender<Event>,
    rng: StdRng,
}

impl<S: Store, R: RuleSink, P: PlaybackContext> Controller<S, R, P> {
    /// Load persisted state, creating whatever is missing.
    pub fn new(store: S, rules: R, playback: P, config: Config) -> Self {
        let settings = storage::load::<TimerSettings>(&store, keys::TIMER_SETTINGS)
            .unwrap_or_else(|| TimerSettings::from(&config.timer));
        let timer = match storage::load::<TimerState>(&store, keys::TIMER_STATE) {
            Some(state) => TimerEngine::restore(state, settings),
            None => TimerEngine::new(settings),
        };
        let blocklist = Blocklist::load(&store, config.blocking.seed_defaults);
        let ambient = AmbientCoordinator::new(AmbientSettings::load(&store), config.playback.clone());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let controller = Self {
            store,
            rules,
            playback,
            config,
            timer,
            blocklist,
            ambient,
            events,
            rng: StdRng::from_entropy(),
        };
        controller.persist_timer();
        controller
    }

    /// Fix the notification clip choice, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Bring the host in line with persisted state: install the rule set
    /// and restart every enabled ambient sound.
    pub async fn startup(&mut self) -> usize {
        let rules = self.sync_blocking_rules();
        let resumed = self.ambient.resume_enabled(&mut self.playback).await;
        tracing::info!(
            rules,
            resumed,
            active = self.timer.is_active(),
            "controller started"
        );
        rules
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn timer_settings(&self) -> TimerSettings {
        self.timer.settings()
    }

    pub fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }

    pub fn ambient_settings(&self) -> &AmbientSettings {
        self.ambient.settings()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    // ── Messages ─────────────────────────────────────────────────────

    pub async fn handle(&mut self, message: Message) -> Response {
        tracing::debug!(?message, "handling message");
        match message {
            Message::TimerStart => {
                let event = self.timer.start();
                self.commit_timer(event);
                Response::with_state(self.timer.state())
            }
            Message::TimerPause => {
                let event = self.timer.pause();
                self.commit_timer(event);
                Response::with_state(self.timer.state())
            }
            Message::TimerReset => {
                let event = self.timer.reset();
                self.commit_timer(event);
                Response::with_state(self.timer.state())
            }
            Message::TimerGetState => Response::with_state(self.timer.state()),
            Message::TimerUpdateSettings { settings } => {
                let event = self.timer.update_settings(settings);
                storage::persist(&self.store, keys::TIMER_SETTINGS, &self.timer.settings());
                self.commit_timer(event);
                Response::with_state(self.timer.state())
            }
            Message::AmbientStart { sound_key } => {
                let outcome = self
                    .ambient
                    .set_enabled(&mut self.playback, &sound_key, true)
                    .await;
                self.ambient_outcome(outcome)
            }
            Message::AmbientStop { sound_key } => {
                let outcome = self
                    .ambient
                    .set_enabled(&mut self.playback, &sound_key, false)
                    .await;
                self.ambient_outcome(outcome)
            }
            Message::AmbientUpdateVolume { sound_key, volume } => {
                let outcome = self
                    .ambient
                    .set_volume(&mut self.playback, &sound_key, volume)
                    .await;
                self.ambient_outcome(outcome)
            }
            Message::AmbientTest { sound_key } => {
                match self.ambient.test(&mut self.playback, &sound_key).await {
                    Ok(()) => Response::ok(),
                    Err(e) => Response::error(e.to_string()),
                }
            }
            Message::AmbientStopAll => {
                self.ambient.stop_all(&mut self.playback).await;
                self.ambient_outcome(Ok(()))
            }
            Message::AmbientUpdateSettings { settings } => {
                self.ambient
                    .replace_settings(&mut self.playback, settings)
                    .await;
                self.ambient_outcome(Ok(()))
            }
            Message::PlayAudio { context } => {
                self.play_notification(context).await;
                Response::ok()
            }
        }
    }

    fn ambient_outcome(&self, outcome: Result<(), ValidationError>) -> Response {
        match outcome {
            Ok(()) => {
                self.ambient.settings().save(&self.store);
                Response::ok()
            }
            Err(e) => Response::error(e.to_string()),
        }
    }

    // ── Timer loop ───────────────────────────────────────────────────

    /// One second of countdown. Persists and broadcasts after every tick;
    /// a mode switch also plays the notification when audio is on.
    pub async fn tick(&mut self) -> Option<Event> {
        if !self.timer.is_active() {
            return None;
        }
        let event = self.timer.tick();
        self.commit_timer(event.clone());

        if let Some(Event::ModeSwitched { to, .. }) = &event {
            if self.timer.settings().audio_enabled {
                self.play_notification(*to).await;
            }
        }
        event
    }

    /// Tick once per second while the timer is active. Stops when the timer
    /// is paused, after `max_ticks` ticks, or when `shutdown` resolves.
    /// `on_event` sees every event a tick returns, as soon as it happens.
    /// Returns the number of ticks taken.
    pub async fn run<F, G>(&mut self, max_ticks: Option<u64>, shutdown: F, mut on_event: G) -> u64
    where
        F: Future<Output = ()>,
        G: FnMut(&Event),
    {
        let mut interval = time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        tokio::pin!(shutdown);

        let mut ticks = 0u64;
        while self.timer.is_active() && max_ticks.map_or(true, |max| ticks < max) {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!(ticks, "timer loop interrupted");
                    break;
                }
                _ = interval.tick() => {
                    if let Some(event) = self.tick().await {
                        on_event(&event);
                    }
                    ticks += 1;
                }
            }
        }
        ticks
    }

    async fn play_notification(&mut self, entering: Mode) -> bool {
        let clips = notification::sequence(entering, &self.config.playback.asset_base, &mut self.rng);
        self.ambient
            .relay(&mut self.playback, PlaybackCommand::PlayNotification { clips })
            .await
    }

    fn persist_timer(&self) {
        storage::persist(&self.store, keys::TIMER_STATE, &self.timer.state());
    }

    fn commit_timer(&mut self, event: Option<Event>) {
        self.persist_timer();
        if let Some(event) = event {
            self.emit(event);
        }
        let snapshot = self.timer.snapshot();
        self.emit(snapshot);
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            tracing::trace!("no event listeners");
        }
    }

    // ── Blocking ─────────────────────────────────────────────────────

    /// Replace the installed rule set. Failures are logged; returns the
    /// number of rules installed.
    pub fn sync_blocking_rules(&mut self) -> usize {
        let first_id = self.config.blocking.rule_id_offset;
        match sync_rules(&mut self.rules, &self.blocklist, first_id) {
            Ok(rule_count) => {
                let domain_count = if self.blocklist.is_active() {
                    self.blocklist.len()
                } else {
                    0
                };
                self.emit(Event::BlockingRulesApplied {
                    rule_count,
                    domain_count,
                    at: Utc::now(),
                });
                rule_count
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to update blocking rules");
                0
            }
        }
    }

    /// React to keys written by another context.
    pub fn on_storage_changed<'k>(&mut self, changed: impl IntoIterator<Item = &'k str>) {
        let mut resync = false;
        for key in changed {
            if keys::affects_blocking(key) {
                resync = true;
            } else if key == keys::AMBIENT_SETTINGS {
                self.ambient = AmbientCoordinator::new(
                    AmbientSettings::load(&self.store),
                    self.config.playback.clone(),
                );
            }
        }
        if resync {
            self.blocklist = Blocklist::load(&self.store, false);
            self.sync_blocking_rules();
        }
    }

    /// Run `gatekeeper` on `page` against the current blocklist and announce
    /// a block to listeners.
    pub fn check_page(&self, gatekeeper: &mut Gatekeeper, page: &mut impl PageHost) -> Verdict {
        let was_blocked = gatekeeper.is_blocked();
        let verdict = gatekeeper.check(page, &self.blocklist);
        if let Verdict::Blocked { host, domain } = &verdict {
            if !was_blocked {
                self.emit(Event::PageBlocked {
                    host: host.clone(),
                    domain: domain.clone(),
                    at: Utc::now(),
                });
            }
        }
        verdict
    }

    pub fn add_blocked(&mut self, input: &str) -> Result<BlockedUrlEntry, ValidationError> {
        let entry = self.blocklist.add(input)?.clone();
        self.blocklist.save_entries(&self.store);
        tracing::info!(url = %entry.url, "site blocked");
        self.sync_blocking_rules();
        Ok(entry)
    }

    pub fn remove_blocked(&mut self, id_or_domain: &str) -> Result<BlockedUrlEntry, ValidationError> {
        let entry = self.blocklist.remove(id_or_domain)?;
        self.blocklist.save_entries(&self.store);
        tracing::info!(url = %entry.url, "site unblocked");
        self.sync_blocking_rules();
        Ok(entry)
    }

    pub fn clear_blocked(&mut self) -> usize {
        let removed = self.blocklist.len();
        self.blocklist.clear();
        self.blocklist.save_entries(&self.store);
        self.sync_blocking_rules();
        removed
    }

    pub fn set_blocking(&mut self, enabled: bool) {
        self.blocklist.set_enabled(enabled);
        self.blocklist.save_enabled(&self.store);
        self.sync_blocking_rules();
    }

    pub fn toggle_blocking(&mut self) -> bool {
        let enabled = !self.blocklist.is_enabled();
        self.set_blocking(enabled);
        enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ambient::OffscreenPlayer;
    use crate::blocking::MemoryRuleTable;
    use crate::storage::MemoryStore;

    type TestController = Controller<MemoryStore, MemoryRuleTable, OffscreenPlayer>;

    fn controller() -> TestController {
        Controller::new(
            MemoryStore::new(),
            MemoryRuleTable::new(),
            OffscreenPlayer::new(),
            Config::default(),
        )
        .with_seed(3)
    }

    #[test]
    fn first_use_creates_state() {
        let ctl = controller();
        let state: TimerState = storage::load(ctl.store(), keys::TIMER_STATE).unwrap();
        assert_eq!(state.current_time, 1500);
        assert!(!state.is_active);
        assert_eq!(ctl.blocklist().len(), 3);
        assert!(!ctl.blocklist().is_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn full_focus_block_switches_to_break() {
        let mut ctl = controller();
        ctl.handle(Message::TimerStart).await;
        for _ in 0..1500 {
            ctl.tick().await;
        }
        let state = ctl.timer_state();
        assert!(state.is_break);
        assert!(state.is_active);
        assert_eq!(state.current_time, 300);
        assert_eq!(state.session_count, 1);

        let stored: TimerState = storage::load(ctl.store(), keys::TIMER_STATE).unwrap();
        assert_eq!(stored, state);

        let played = ctl.playback().notifications();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0][0], "audio/pomodoro_alarm.m4a");
        assert!(played[0][1].starts_with("audio/break_time_"));
    }

    #[tokio::test(start_paused = true)]
    async fn muted_timer_plays_nothing() {
        let mut ctl = controller();
        let settings = TimerSettings {
            focus_time: 1,
            break_time: 1,
            audio_enabled: false,
        };
        ctl.handle(Message::TimerUpdateSettings { settings }).await;
        ctl.handle(Message::TimerStart).await;
        for _ in 0..60 {
            ctl.tick().await;
        }
        assert!(ctl.timer_state().is_break);
        assert!(ctl.playback().notifications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_ticks_once_per_second() {
        let mut ctl = controller();
        ctl.handle(Message::TimerStart).await;
        let start = time::Instant::now();
        let ticks = ctl.run(Some(10), std::future::pending(), |_| {}).await;
        assert_eq!(ticks, 10);
        assert_eq!(ctl.timer_state().current_time, 1490);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_stops_on_shutdown() {
        let mut ctl = controller();
        ctl.handle(Message::TimerStart).await;
        let ticks = ctl
            .run(None, time::sleep(Duration::from_millis(3500)), |_| {})
            .await;
        assert_eq!(ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_reports_a_switch_on_its_last_tick() {
        let mut ctl = controller();
        let settings = TimerSettings {
            focus_time: 1,
            break_time: 1,
            audio_enabled: false,
        };
        ctl.handle(Message::TimerUpdateSettings { settings }).await;
        ctl.handle(Message::TimerStart).await;

        let mut seen = Vec::new();
        let ticks = ctl
            .run(Some(60), std::future::pending(), |event| seen.push(event.clone()))
            .await;
        assert_eq!(ticks, 60);
        assert_eq!(seen.len(), 1);
        assert!(matches!(
            seen[0],
            Event::ModeSwitched {
                from: Mode::Focus,
                to: Mode::Break,
                session_count: 1,
                ..
            }
        ));
        assert!(ctl.timer_state().is_break);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_does_nothing_while_paused() {
        let mut ctl = controller();
        assert_eq!(ctl.run(Some(5), std::future::pending(), |_| {}).await, 0);
        assert_eq!(ctl.timer_state().current_time, 1500);
    }

    #[tokio::test]
    async fn listeners_receive_snapshots() {
        let mut ctl = controller();
        let mut rx = ctl.subscribe();
        ctl.handle(Message::TimerStart).await;
        assert!(matches!(rx.recv().await.unwrap(), Event::TimerStarted { .. }));
        match rx.recv().await.unwrap() {
            Event::StateSnapshot { state, .. } => assert!(state.is_active),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn settings_update_is_persisted_and_snaps_countdown() {
        let mut ctl = controller();
        let settings = TimerSettings {
            focus_time: 50,
            break_time: 10,
            audio_enabled: true,
        };
        let reply = ctl.handle(Message::TimerUpdateSettings { settings }).await;
        assert_eq!(reply.state.unwrap().current_time, 3000);
        let stored: TimerSettings = storage::load(ctl.store(), keys::TIMER_SETTINGS).unwrap();
        assert_eq!(stored, settings);
    }

    #[tokio::test]
    async fn state_survives_a_restart() {
        let store = std::rc::Rc::new(MemoryStore::new());
        {
            let mut ctl = Controller::new(
                store.clone(),
                MemoryRuleTable::new(),
                OffscreenPlayer::new(),
                Config::default(),
            );
            ctl.handle(Message::TimerStart).await;
            ctl.tick().await;
        }
        let ctl = Controller::new(store, MemoryRuleTable::new(), OffscreenPlayer::new(), Config::default());
        assert_eq!(ctl.timer_state().current_time, 1499);
        assert!(ctl.timer_state().is_active);
    }

    #[test]
    fn enabling_blocking_installs_rules() {
        let mut ctl = controller();
        ctl.clear_blocked();
        ctl.add_blocked("youtube.com").unwrap();
        assert_eq!(ctl.rules().dynamic_rules().unwrap().len(), 0);

        ctl.set_blocking(true);
        let rules = ctl.rules().dynamic_rules().unwrap();
        assert_eq!(rules.len(), 9);
        assert_eq!(rules[0].id, 1000);

        ctl.set_blocking(true);
        assert_eq!(ctl.rules().dynamic_rules().unwrap().len(), 9);

        assert!(!ctl.toggle_blocking());
        assert!(ctl.rules().dynamic_rules().unwrap().is_empty());
    }

    struct StaticPage(String);

    impl PageHost for StaticPage {
        fn current_url(&self) -> String {
            self.0.clone()
        }
        fn stop_loading(&mut self) {}
        fn replace_document(&mut self, _html: String) {}
        fn lock_navigation(&mut self) {}
    }

    #[test]
    fn blocked_page_is_announced_once() {
        let mut ctl = controller();
        ctl.set_blocking(true);
        let mut rx = ctl.subscribe();

        let mut gk = Gatekeeper::new(crate::gatekeeper::MatchMode::Suffix);
        let mut page = StaticPage("https://www.tiktok.com/@someone".into());
        assert!(ctl.check_page(&mut gk, &mut page).is_blocked());
        assert!(ctl.check_page(&mut gk, &mut page).is_blocked());

        match rx.try_recv().unwrap() {
            Event::PageBlocked { host, domain, .. } => {
                assert_eq!(host, "www.tiktok.com");
                assert_eq!(domain, "tiktok.com");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx.try_recv().is_err());

        let mut other = Gatekeeper::new(crate::gatekeeper::MatchMode::Suffix);
        let mut page = StaticPage("https://docs.rs/".into());
        assert_eq!(ctl.check_page(&mut other, &mut page), Verdict::Allowed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn duplicate_domain_is_rejected() {
        let mut ctl = controller();
        let err = ctl.add_blocked("https://www.youtube.com/").unwrap_err();
        assert_eq!(err, ValidationError::DuplicateDomain("youtube.com".into()));
    }

    #[test]
    fn external_writes_trigger_resync() {
        let mut ctl = controller();
        storage::persist(ctl.store(), keys::IS_BLOCKING, &true);
        ctl.on_storage_changed([keys::IS_BLOCKING]);
        assert!(ctl.blocklist().is_enabled());
        assert_eq!(ctl.rules().dynamic_rules().unwrap().len(), 27);
    }

    #[tokio::test(start_paused = true)]
    async fn ambient_messages_persist_settings() {
        let mut ctl = controller();
        let reply = ctl
            .handle(Message::AmbientStart {
                sound_key: "rain".into(),
            })
            .await;
        assert!(reply.success);
        assert!(ctl.playback().track("rain").is_some());

        let saved = AmbientSettings::load(ctl.store());
        assert!(saved.get("rain").unwrap().enabled);

        ctl.handle(Message::AmbientStopAll).await;
        assert!(ctl.playback().tracks().is_empty());
        assert_eq!(AmbientSettings::load(ctl.store()).enabled().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_sound_reports_error() {
        let mut ctl = controller();
        let reply = ctl
            .handle(Message::AmbientTest {
                sound_key: "traffic".into(),
            })
            .await;
        assert!(!reply.success);
        assert!(reply.error.unwrap().contains("traffic"));
    }

    #[tokio::test(start_paused = true)]
    async fn startup_resumes_enabled_sounds() {
        let store = MemoryStore::new();
        let mut settings = AmbientSettings::default();
        settings.get_mut("ocean_waves").unwrap().enabled = true;
        settings.save(&store);

        let mut ctl = Controller::new(store, MemoryRuleTable::new(), OffscreenPlayer::new(), Config::default());
        assert_eq!(ctl.startup().await, 0);
        assert!(ctl.playback().track("ocean_waves").is_some());
    }
}
