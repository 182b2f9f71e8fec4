use std::collections::HashSet;

use crate::auth::{AuthError, Authenticator, SignupForm};
use crate::catalog::{self, CatalogError};
use crate::config::AppConfig;
use crate::db::Store;
use crate::feedback::{self, FeedbackStore};
use crate::filter::{filter_and_sort, FilterCriteria};
use crate::gateway::{GatewayError, RestGateway};
use crate::industry::IndustrySelection;
use crate::models::{AppSettings, Event, UserProfile, UserSession};
use crate::reaction::{
    apply_toggle, DislikeReason, Reaction, ReactionError, ReactionKind, ReconcilePolicy,
};
use crate::regions;

/// Owns the catalog, filters, settings and session. Views read through the
/// accessors and change state only through the command methods.
pub struct App {
    gateway: RestGateway,
    feedback: FeedbackStore,
    auth: Authenticator,
    store: Option<Store>,
    reconcile: ReconcilePolicy,
    events: Vec<Event>,
    criteria: FilterCriteria,
    settings: AppSettings,
    session: Option<UserSession>,
    profile: UserProfile,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self, GatewayError> {
        let store = match Store::open_default() {
            Ok(store) => Some(store),
            Err(err) => {
                tracing::warn!(%err, "local storage unavailable; state will not persist");
                None
            }
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: &AppConfig, store: Option<Store>) -> Result<Self, GatewayError> {
        let gateway = RestGateway::from_config(config)?;
        let session = store.as_ref().and_then(|s| {
            s.load_session().unwrap_or_else(|err| {
                tracing::warn!(%err, "failed to load user session");
                None
            })
        });
        let settings = store
            .as_ref()
            .and_then(|s| {
                s.load_settings().unwrap_or_else(|err| {
                    tracing::warn!(%err, "failed to load settings");
                    None
                })
            })
            .unwrap_or_default();

        Ok(Self {
            feedback: FeedbackStore::new(gateway.clone()),
            auth: Authenticator::new(gateway.clone()),
            gateway,
            store,
            reconcile: config.reconcile,
            events: Vec::new(),
            criteria: FilterCriteria::default(),
            settings,
            profile: UserProfile::for_session(session.as_ref()),
            session,
        })
    }

    /// Replaces the catalog. On failure the feed is left empty.
    pub async fn load_catalog(&mut self) -> Result<usize, CatalogError> {
        let mut events = match catalog::load_catalog(&self.gateway).await {
            Ok(events) => events,
            Err(err) => {
                tracing::error!(%err, "catalog load failed");
                self.events.clear();
                return Err(err);
            }
        };

        match self.feedback.fetch_summary(self.user_id()).await {
            Ok(summary) => feedback::overlay(&mut events, &summary),
            Err(err) => tracing::warn!(%err, "feedback counts unavailable"),
        }

        let saved: HashSet<&str> = self
            .events
            .iter()
            .filter(|e| e.saved)
            .map(|e| e.id.as_str())
            .collect();
        for event in &mut events {
            event.saved = saved.contains(event.id.as_str());
        }

        self.events = events;
        tracing::info!(events = self.events.len(), "catalog loaded");
        Ok(self.events.len())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.criteria
            .clone()
            .with_primary_region(self.settings.primary_region())
    }

    pub fn feed(&self) -> Vec<&Event> {
        filter_and_sort(&self.events, &self.criteria())
    }

    pub fn select_industry(&mut self, industry: IndustrySelection) {
        self.criteria.industry = industry;
    }

    pub fn select_country(&mut self, country: Option<String>) {
        self.criteria.select_country(country);
    }

    pub fn select_city(&mut self, city: Option<String>) {
        self.criteria.select_city(city);
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.criteria.query = query.into();
    }

    pub fn reset_filters(&mut self) {
        self.criteria.reset();
    }

    /// True while any refinement beyond the region ordering is applied.
    pub fn filters_active(&self) -> bool {
        !self.criteria.is_cleared()
    }

    /// Cities offered for the selected country; empty until one is chosen.
    pub fn city_options(&self) -> &'static [&'static str] {
        self.criteria
            .country
            .as_deref()
            .map(regions::cities_for)
            .unwrap_or(&[])
    }

    pub fn region_options(&self) -> Vec<&'static str> {
        regions::region_options(self.settings.primary_region())
    }

    pub async fn toggle_reaction(
        &mut self,
        id: &str,
        kind: ReactionKind,
    ) -> Result<Event, ReactionError> {
        self.react(id, Some(kind), None).await
    }

    /// Dislikes with a reason. An existing dislike is kept, only the reason changes.
    pub async fn dislike_with_reason(
        &mut self,
        id: &str,
        reason: DislikeReason,
    ) -> Result<Event, ReactionError> {
        let current = self
            .event(id)
            .map(|e| e.user_reaction)
            .ok_or_else(|| ReactionError::UnknownEvent(id.to_string()))?;
        let toggle = (current != Reaction::Dislike).then_some(ReactionKind::Dislike);
        self.react(id, toggle, Some(reason)).await
    }

    /// Choices offered by the dislike prompt, in display order.
    pub fn dislike_reasons(&self) -> &'static [DislikeReason] {
        &DislikeReason::ALL
    }

    async fn react(
        &mut self,
        id: &str,
        toggle: Option<ReactionKind>,
        reason: Option<DislikeReason>,
    ) -> Result<Event, ReactionError> {
        let user = self.user_id().ok_or(ReactionError::NotSignedIn)?;
        let index = self
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| ReactionError::UnknownEvent(id.to_string()))?;

        let before = self.events[index].clone();
        if let Some(kind) = toggle {
            apply_toggle(&mut self.events[index], kind);
        }
        let next = self.events[index].user_reaction;

        if let Err(err) = self.feedback.sync(user, id, next, reason).await {
            match self.reconcile {
                ReconcilePolicy::Accept => {
                    tracing::warn!(%err, event = id, "feedback not persisted; keeping local state");
                }
                ReconcilePolicy::Revert => {
                    tracing::warn!(%err, event = id, "feedback not persisted; reverting");
                    self.events[index] = before;
                }
            }
        }
        Ok(self.events[index].clone())
    }

    /// Returns the new saved flag, or `None` for an unknown id.
    pub fn toggle_save(&mut self, id: &str) -> Option<bool> {
        let event = self.events.iter_mut().find(|e| e.id == id)?;
        event.saved = !event.saved;
        Some(event.saved)
    }

    pub fn saved_events(&self) -> Vec<&Event> {
        self.events.iter().filter(|e| e.saved).collect()
    }

    pub fn share_link(&self, id: &str, fallback: &str) -> Option<String> {
        self.event(id).map(|e| e.share_link(fallback))
    }

    pub fn session(&self) -> Option<&UserSession> {
        self.session.as_ref()
    }

    fn user_id(&self) -> Option<i64> {
        self.session.as_ref().map(|s| s.id)
    }

    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<UserSession, AuthError> {
        let session = self.auth.login(username, password).await?;
        self.begin_session(session.clone()).await;
        Ok(session)
    }

    pub async fn signup(&mut self, form: &SignupForm) -> Result<UserSession, AuthError> {
        let session = self.auth.signup(form).await?;
        self.begin_session(session.clone()).await;
        Ok(session)
    }

    async fn begin_session(&mut self, session: UserSession) {
        self.persist(|store| store.save_session(Some(&session)), "session");
        tracing::info!(username = %session.username, "signed in");
        self.profile.name = session.display_name();
        self.session = Some(session);
        self.refresh_reactions().await;
    }

    pub async fn sign_out(&mut self) {
        self.session = None;
        self.profile.name = UserProfile::for_session(None).name;
        self.persist(|store| store.save_session(None), "session");
        self.refresh_reactions().await;
    }

    /// Re-reads feedback so counts and markers belong to the current user.
    /// When the read fails the previous user's markers are still dropped.
    async fn refresh_reactions(&mut self) {
        if self.events.is_empty() {
            return;
        }
        match self.feedback.fetch_summary(self.user_id()).await {
            Ok(summary) => feedback::overlay(&mut self.events, &summary),
            Err(err) => {
                tracing::warn!(%err, "feedback refresh failed");
                for event in &mut self.events {
                    event.user_reaction = Reaction::None;
                }
            }
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn update_settings<F>(&mut self, transform: F) -> &AppSettings
    where
        F: FnOnce(&mut AppSettings),
    {
        transform(&mut self.settings);
        let settings = self.settings.clone();
        self.persist(|store| store.save_settings(&settings), "settings");
        &self.settings
    }

    /// Ignores languages the UI has no strings for.
    pub fn set_language(&mut self, language: &str) -> bool {
        if !regions::is_supported_language(language) {
            tracing::warn!(language, "unsupported language");
            return false;
        }
        self.update_settings(|s| s.language = language.to_string());
        true
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Saves the edited card as a whole, as the profile form does.
    pub fn update_profile(&mut self, profile: UserProfile) -> &UserProfile {
        self.profile = profile;
        &self.profile
    }

    pub fn add_interest(&mut self, tag: &str) -> bool {
        self.profile.add_interest(tag)
    }

    pub fn remove_interest(&mut self, tag: &str) -> bool {
        self.profile.remove_interest(tag)
    }

    fn persist<F>(&self, write: F, what: &str)
    where
        F: FnOnce(&Store) -> rusqlite::Result<()>,
    {
        if let Some(store) = &self.store {
            if let Err(err) = write(store) {
                tracing::warn!(%err, what, "failed to persist");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> UserSession {
        UserSession {
            id: 17,
            username: "kawemv1".into(),
            name: "Ansar".into(),
            surname: "Kairzhan".into(),
        }
    }

    fn signed_in_store() -> Store {
        let store = Store::open_in_memory().expect("store");
        store.save_session(Some(&session())).expect("save session");
        store
    }

    async fn server_with_events() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "title": "Digital Bridge Forum 2024", "country": "Грузия", "industry": "IT/Digital"},
                {"id": 2, "title": "AgroWorld", "country": "Казахстан", "industry": "Агросектор"},
                {"id": 3, "title": "FinTech Revolution Summit", "country": "Казахстан"},
                {"id": 4, "title": "Green Energy Expo", "country": "Армения", "industry": "Энергетика"},
                {"id": 5, "title": "Retail Tech Conference", "country": "Казахстан", "industry": "Retail"}
            ])))
            .mount(&server)
            .await;
        server
    }

    async fn app(server: &MockServer, store: Store, policy: ReconcilePolicy) -> App {
        let config = AppConfig::new(server.uri(), "key").with_reconcile(policy);
        let mut app = App::with_store(&config, Some(store)).expect("app");
        app.load_catalog().await.expect("catalog");
        app
    }

    async fn failing_feedback(server: &MockServer) {
        Mock::given(path("/rest/v1/feedbacks"))
            .respond_with(ResponseTemplate::new(500))
            .mount(server)
            .await;
    }

    async fn feedback_rows(server: &MockServer, rows: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/feedbacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(server)
            .await;
    }

    async fn account(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/auth_users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 4,
                "username": "kawemv1",
                "name": "Ansar",
                "surname": "Kairzhan",
                "password_hash": hash_password("Test123")
            }])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 17}])))
            .mount(server)
            .await;
    }

    fn counts(app: &App, id: &str) -> Option<(u32, u32, Reaction)> {
        app.event(id).map(|e| (e.likes, e.dislikes, e.user_reaction))
    }

    fn ids(events: &[&Event]) -> Vec<String> {
        events.iter().map(|e| e.id.clone()).collect()
    }

    #[tokio::test]
    async fn saving_one_event_lists_only_it() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;
        assert_eq!(app.events().len(), 5);
        assert!(app.saved_events().is_empty());

        assert_eq!(app.toggle_save("3"), Some(true));
        assert_eq!(ids(&app.saved_events()), vec!["3"]);
        assert_eq!(app.toggle_save("99"), None);
    }

    #[tokio::test]
    async fn saved_flags_survive_reload() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;
        app.toggle_save("4");
        app.load_catalog().await.expect("reload");
        assert_eq!(ids(&app.saved_events()), vec!["4"]);
    }

    #[tokio::test]
    async fn feed_puts_primary_region_first_and_filters() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;

        assert_eq!(ids(&app.feed()), vec!["2", "3", "5", "1", "4"]);

        app.update_settings(|s| s.region = "Армения".into());
        assert_eq!(ids(&app.feed()), vec!["4", "1", "2", "3", "5"]);

        app.select_industry(IndustrySelection::from_label("Agrosector"));
        assert_eq!(ids(&app.feed()), vec!["2"]);

        assert!(app.filters_active());
        app.reset_filters();
        assert!(!app.filters_active());
        app.set_query("EXPO");
        assert_eq!(ids(&app.feed()), vec!["4"]);
        assert!(app.filters_active());
    }

    #[tokio::test]
    async fn failed_sync_keeps_optimistic_state_by_default() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;

        let event = app
            .toggle_reaction("1", ReactionKind::Like)
            .await
            .expect("toggle");
        assert_eq!((event.likes, event.user_reaction), (1, Reaction::Like));
        assert_eq!(app.event("1").map(|e| e.likes), Some(1));
    }

    #[tokio::test]
    async fn failed_sync_reverts_under_revert_policy() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Revert).await;

        let event = app
            .toggle_reaction("1", ReactionKind::Like)
            .await
            .expect("toggle");
        assert_eq!((event.likes, event.user_reaction), (0, Reaction::None));
    }

    #[tokio::test]
    async fn loaded_reaction_toggles_off_and_deletes_row() {
        let server = server_with_events().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/feedbacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "user_id": 17, "event_id": 2, "is_positive": true},
                {"id": 2, "user_id": 5, "event_id": 2, "is_positive": false}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/feedbacks"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Revert).await;

        let loaded = app.event("2").cloned().expect("event 2");
        assert_eq!(
            (loaded.likes, loaded.dislikes, loaded.user_reaction),
            (1, 1, Reaction::Like)
        );

        let event = app
            .toggle_reaction("2", ReactionKind::Like)
            .await
            .expect("toggle");
        assert_eq!(
            (event.likes, event.dislikes, event.user_reaction),
            (0, 1, Reaction::None)
        );
    }

    #[tokio::test]
    async fn reacting_requires_a_session() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let store = Store::open_in_memory().expect("store");
        let mut app = app(&server, store, ReconcilePolicy::Accept).await;

        let err = app
            .toggle_reaction("1", ReactionKind::Dislike)
            .await
            .expect_err("no session");
        assert!(matches!(err, ReactionError::NotSignedIn));
        assert_eq!(app.profile().name, "Guest");
    }

    #[tokio::test]
    async fn unknown_event_is_rejected() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;
        let err = app
            .dislike_with_reason("404", DislikeReason::NotB2b)
            .await
            .expect_err("unknown");
        assert!(matches!(err, ReactionError::UnknownEvent(_)));
    }

    #[tokio::test]
    async fn catalog_failure_leaves_feed_empty() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;
        server.reset().await;
        Mock::given(path("/rest/v1/events"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(app.load_catalog().await.is_err());
        assert!(app.events().is_empty());
        assert!(app.feed().is_empty());
    }

    #[tokio::test]
    async fn settings_persist_and_drive_options() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;

        assert!(app.city_options().is_empty());
        app.select_country(Some("Армения".into()));
        assert_eq!(app.city_options(), &["Ереван", "Ванадзор"]);

        assert!(app.set_language("Русский"));
        assert!(!app.set_language("Klingon"));
        app.update_settings(|s| s.region = "Грузия".into());
        assert_eq!(app.region_options()[0], "Грузия");

        let stored = app
            .store
            .as_ref()
            .expect("store")
            .load_settings()
            .expect("load")
            .expect("settings saved");
        assert_eq!(stored.language, "Русский");
        assert_eq!(stored.region, "Грузия");
    }

    #[tokio::test]
    async fn sign_out_clears_stored_session() {
        let server = server_with_events().await;
        feedback_rows(
            &server,
            json!([{"id": 1, "user_id": 17, "event_id": 2, "is_positive": true}]),
        )
        .await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;
        assert_eq!(app.profile().name, "Ansar Kairzhan");
        assert_eq!(counts(&app, "2"), Some((1, 0, Reaction::Like)));

        app.sign_out().await;
        assert!(app.session().is_none());
        assert_eq!(app.profile().name, "Guest");
        assert_eq!(counts(&app, "2"), Some((1, 0, Reaction::None)));
        let stored = app.store.as_ref().expect("store").load_session().expect("load");
        assert_eq!(stored, None);
    }

    #[tokio::test]
    async fn sign_out_drops_markers_when_feedback_is_down() {
        let server = server_with_events().await;
        feedback_rows(
            &server,
            json!([{"id": 1, "user_id": 17, "event_id": 2, "is_positive": true}]),
        )
        .await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;
        server.reset().await;
        failing_feedback(&server).await;

        app.sign_out().await;
        assert_eq!(counts(&app, "2"), Some((1, 0, Reaction::None)));
    }

    #[tokio::test]
    async fn login_picks_up_own_reactions() {
        let server = server_with_events().await;
        feedback_rows(
            &server,
            json!([{"id": 1, "user_id": 17, "event_id": 2, "is_positive": true}]),
        )
        .await;
        account(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/feedbacks"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let guest = Store::open_in_memory().expect("store");
        let mut app = app(&server, guest, ReconcilePolicy::Revert).await;
        assert_eq!(counts(&app, "2"), Some((1, 0, Reaction::None)));

        let session = app.login(" kawemv1 ", "Test123").await.expect("login");
        assert_eq!(session.id, 17);
        assert_eq!(app.profile().name, "Ansar Kairzhan");
        assert_eq!(counts(&app, "2"), Some((1, 0, Reaction::Like)));

        let event = app
            .toggle_reaction("2", ReactionKind::Like)
            .await
            .expect("toggle");
        assert_eq!(
            (event.likes, event.dislikes, event.user_reaction),
            (0, 0, Reaction::None)
        );
    }

    #[tokio::test]
    async fn new_reason_on_existing_dislike_only_patches_reason() {
        let server = server_with_events().await;
        feedback_rows(
            &server,
            json!([{"id": 1, "user_id": 17, "event_id": 2, "is_positive": false, "reason": null}]),
        )
        .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/feedbacks"))
            .and(body_json(json!({"is_positive": false, "reason": "Малый масштаб"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Revert).await;
        assert_eq!(counts(&app, "2"), Some((0, 1, Reaction::Dislike)));
        assert_eq!(app.dislike_reasons().len(), 3);

        let event = app
            .dislike_with_reason("2", DislikeReason::SmallScale)
            .await
            .expect("dislike");
        assert_eq!(
            (event.likes, event.dislikes, event.user_reaction),
            (0, 1, Reaction::Dislike)
        );
        assert_eq!(counts(&app, "2"), Some((0, 1, Reaction::Dislike)));
    }

    #[tokio::test]
    async fn profile_edits_survive_sign_out() {
        let server = server_with_events().await;
        failing_feedback(&server).await;
        let mut app = app(&server, signed_in_store(), ReconcilePolicy::Accept).await;

        assert!(!app.add_interest(""));
        assert!(!app.add_interest("FinTech"));
        assert!(app.add_interest("Agro"));
        assert!(app.remove_interest("SaaS"));
        assert!(!app.remove_interest("SaaS"));

        let mut edited = app.profile().clone();
        edited.title = "Analyst".into();
        app.update_profile(edited);
        assert_eq!(app.profile().title, "Analyst");

        app.sign_out().await;
        let profile = app.profile();
        assert_eq!(profile.name, "Guest");
        assert_eq!(profile.title, "Analyst");
        assert_eq!(profile.interests, vec!["FinTech", "AI", "Investment", "Agro"]);
    }
}
