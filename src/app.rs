//! Application state management for Student Hub
//!
//! This module contains the dashboard state, keyboard handling, data loading
//! through the aggregation layer, and transitions between views.

use chrono::{DateTime, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::info;

use crate::aggregator::{Aggregator, FetchOutcome};
use crate::cache::Clock;
use crate::calendar::{build_month, CalendarMonth};
use crate::cli::{StartupConfig, View};
use crate::data::{Assignment, Course, LmsApi, UserProfile};
use crate::grades::{compute_gpa, AcademicYear, GradeSnapshot};

/// Application state enum representing the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while fetching data
    Loading,
    /// Profile, classes and this month's calendar
    Dashboard,
    /// Every assignment ordered by due date
    Assignments,
    /// Per-class grades and GPA
    Grades,
}

impl From<View> for AppState {
    fn from(view: View) -> Self {
        match view {
            View::Dashboard => AppState::Dashboard,
            View::Assignments => AppState::Assignments,
            View::Grades => AppState::Grades,
        }
    }
}

/// How much cached data a refresh discards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// Drop expired cache entries, then reload
    Soft,
    /// Drop every cache entry, then reload
    Hard,
}

/// Main application struct managing state and data
#[derive(Debug)]
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// View to enter once loading finishes
    pub pending_view: View,
    /// Index of the selected row in the current view
    pub selected_index: usize,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Set by `r`/`R`, consumed by the event loop
    pub refresh_requested: Option<RefreshKind>,
    /// Timestamp of last data refresh
    pub last_refresh: Option<DateTime<Local>>,
    pub profile: UserProfile,
    pub academic_year: Option<AcademicYear>,
    pub courses: Vec<Course>,
    /// All assignments, soonest due first, undated last
    pub assignments: Vec<Assignment>,
    pub calendar: Option<CalendarMonth>,
    pub grades: Vec<GradeSnapshot>,
    pub gpa: Option<f64>,
    /// Failures from the last load, shown in the status bar
    pub errors: Vec<String>,
}

impl App {
    /// Creates a new App instance with default state
    pub fn new() -> Self {
        Self {
            state: AppState::Loading,
            pending_view: View::Dashboard,
            selected_index: 0,
            should_quit: false,
            show_help: false,
            refresh_requested: None,
            last_refresh: None,
            profile: UserProfile::default(),
            academic_year: None,
            courses: Vec::new(),
            assignments: Vec::new(),
            calendar: None,
            grades: Vec::new(),
            gpa: None,
            errors: Vec::new(),
        }
    }

    /// Creates a new App instance with the given startup configuration.
    ///
    /// # Arguments
    /// * `config` - The startup configuration derived from CLI arguments
    pub fn with_startup_config(config: StartupConfig) -> Self {
        Self {
            pending_view: config.initial_view,
            ..Self::new()
        }
    }

    /// Loads everything the views show
    ///
    /// The course list is fetched once, then profile, standing, assignments
    /// and grades are fetched concurrently. Failed lookups leave their
    /// section empty and record the reason. Transitions out of Loading when
    /// complete.
    pub async fn load_all_data<A: LmsApi, C: Clock>(
        &mut self,
        aggregator: &Aggregator<A, C>,
        today: NaiveDate,
    ) {
        // Courses first: the other lookups read them back from the cache
        let courses = aggregator.list_courses().await;
        let (profile, year, assignments, grades) = futures::join!(
            aggregator.profile(),
            aggregator.academic_year(),
            aggregator.list_all_assignments(),
            aggregator.classes_with_grades(),
        );

        self.errors.clear();
        for failure in [courses.failure(), assignments.failure(), grades.failure()]
            .into_iter()
            .flatten()
        {
            if !self.errors.iter().any(|e| e == failure) {
                self.errors.push(failure.to_string());
            }
        }

        self.profile = profile;
        self.academic_year = year.into_option();
        self.courses = courses.into_items();

        let mut assignments = assignments.into_items();
        self.calendar = Some(build_month(today, &assignments));
        assignments.sort_by_key(|a| (a.due_at.is_none(), a.due_at));
        self.assignments = assignments;

        self.grades = match grades {
            FetchOutcome::Found(grades) => grades,
            _ => Vec::new(),
        };
        self.gpa = compute_gpa(self.grades.iter().map(|g| g.percentage));

        info!(
            courses = self.courses.len(),
            assignments = self.assignments.len(),
            errors = self.errors.len(),
            "Dashboard data loaded"
        );

        self.last_refresh = Some(Local::now());
        if self.state == AppState::Loading {
            self.state = self.pending_view.into();
        }
        self.clamp_selection();
    }

    /// Runs a pending refresh, if any
    ///
    /// A soft refresh sweeps expired cache entries so only stale data is
    /// refetched; a hard refresh clears the cache first.
    pub async fn apply_refresh<A: LmsApi, C: Clock>(
        &mut self,
        aggregator: &Aggregator<A, C>,
        today: NaiveDate,
    ) {
        let Some(kind) = self.refresh_requested.take() else {
            return;
        };

        match kind {
            RefreshKind::Soft => {
                let swept = aggregator.cache().sweep_expired();
                info!(swept, "Refreshing");
            }
            RefreshKind::Hard => {
                aggregator.cache().clear();
                info!("Refreshing with empty cache");
            }
        }
        self.load_all_data(aggregator, today).await;
    }

    /// Number of selectable rows in the current view
    pub fn row_count(&self) -> usize {
        match self.state {
            AppState::Loading => 0,
            AppState::Dashboard => self.courses.len(),
            AppState::Assignments => self.assignments.len(),
            AppState::Grades => self.grades.len(),
        }
    }

    /// The highlighted assignment in the assignments view
    pub fn selected_assignment(&self) -> Option<&Assignment> {
        self.assignments.get(self.selected_index)
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Arguments
    /// * `key_event` - The keyboard event to handle
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application
    /// - `1`/`2`/`3`: Dashboard, Assignments, Grades
    /// - `Tab`: Next view
    /// - `Up`/`k`, `Down`/`j`: Move selection
    /// - `r`: Refresh stale data, `R`: refresh everything
    /// - `?`: Toggle help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        if self.state == AppState::Loading {
            // Only quit is allowed during loading
            if key_event.code == KeyCode::Char('q') {
                self.should_quit = true;
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('1') => self.switch_to(AppState::Dashboard),
            KeyCode::Char('2') => self.switch_to(AppState::Assignments),
            KeyCode::Char('3') => self.switch_to(AppState::Grades),
            KeyCode::Tab => {
                let next = match self.state {
                    AppState::Dashboard => AppState::Assignments,
                    AppState::Assignments => AppState::Grades,
                    _ => AppState::Dashboard,
                };
                self.switch_to(next);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection_up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection_down();
            }
            KeyCode::Char('r') => {
                self.refresh_requested = Some(RefreshKind::Soft);
            }
            KeyCode::Char('R') => {
                self.refresh_requested = Some(RefreshKind::Hard);
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn switch_to(&mut self, state: AppState) {
        if self.state != state {
            self.state = state;
            self.selected_index = 0;
        }
    }

    /// Moves the selection up, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    fn clamp_selection(&mut self) {
        let count = self.row_count();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::{populated_lms, FakeLms};
    use crate::cache::ResponseCache;
    use crate::data::EnrollmentGrades;
    use chrono::{TimeZone, Utc};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    /// Helper to create a KeyEvent for testing
    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn aggregator(lms: FakeLms) -> Aggregator<FakeLms> {
        Aggregator::new(lms, Arc::new(ResponseCache::with_default_ttl()))
    }

    fn loaded_app(state: AppState) -> App {
        let mut app = App::new();
        app.state = state;
        app.courses = populated_lms().courses;
        app.assignments = vec![
            crate::aggregator::tests::assignment(1, "A"),
            crate::aggregator::tests::assignment(2, "B"),
        ];
        app
    }

    #[test]
    fn test_initial_state_is_loading() {
        let app = App::new();
        assert_eq!(app.state, AppState::Loading);
        assert_eq!(app.selected_index, 0);
        assert!(!app.should_quit);
        assert!(app.refresh_requested.is_none());
    }

    #[test]
    fn test_keys_ignored_during_loading() {
        let mut app = App::new();

        app.handle_key(key_event(KeyCode::Char('2')));
        app.handle_key(key_event(KeyCode::Char('j')));
        app.handle_key(key_event(KeyCode::Char('r')));

        assert_eq!(app.state, AppState::Loading);
        assert!(app.refresh_requested.is_none());
    }

    #[test]
    fn test_q_quits_during_loading() {
        let mut app = App::new();
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_number_keys_switch_views() {
        let mut app = loaded_app(AppState::Dashboard);

        app.handle_key(key_event(KeyCode::Char('2')));
        assert_eq!(app.state, AppState::Assignments);

        app.handle_key(key_event(KeyCode::Char('3')));
        assert_eq!(app.state, AppState::Grades);

        app.handle_key(key_event(KeyCode::Char('1')));
        assert_eq!(app.state, AppState::Dashboard);
    }

    #[test]
    fn test_tab_cycles_views() {
        let mut app = loaded_app(AppState::Dashboard);

        app.handle_key(key_event(KeyCode::Tab));
        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.state, AppState::Grades);

        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.state, AppState::Dashboard);
    }

    #[test]
    fn test_navigation_wraps_at_bottom_and_top() {
        let mut app = loaded_app(AppState::Dashboard);

        app.handle_key(key_event(KeyCode::Char('k')));
        assert_eq!(app.selected_index, 2);

        app.handle_key(key_event(KeyCode::Char('j')));
        assert_eq!(app.selected_index, 0);

        app.handle_key(key_event(KeyCode::Down));
        assert_eq!(app.selected_index, 1);
    }

    #[test]
    fn test_switching_view_resets_selection() {
        let mut app = loaded_app(AppState::Dashboard);
        app.selected_index = 2;

        app.handle_key(key_event(KeyCode::Char('2')));

        assert_eq!(app.selected_index, 0);
        assert_eq!(app.selected_assignment().map(|a| a.name.as_str()), Some("A"));
    }

    #[test]
    fn test_navigation_in_empty_view_is_noop() {
        let mut app = loaded_app(AppState::Grades);

        app.handle_key(key_event(KeyCode::Char('j')));

        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_refresh_keys_set_kind() {
        let mut app = loaded_app(AppState::Dashboard);

        app.handle_key(key_event(KeyCode::Char('r')));
        assert_eq!(app.refresh_requested, Some(RefreshKind::Soft));

        app.handle_key(key_event(KeyCode::Char('R')));
        assert_eq!(app.refresh_requested, Some(RefreshKind::Hard));
    }

    #[test]
    fn test_help_toggle_intercepts_keys() {
        let mut app = loaded_app(AppState::Dashboard);

        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(app.show_help);

        app.handle_key(key_event(KeyCode::Char('2')));
        assert_eq!(app.state, AppState::Dashboard);

        app.handle_key(key_event(KeyCode::Esc));
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_esc_quits_from_view() {
        let mut app = loaded_app(AppState::Assignments);
        app.handle_key(key_event(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_startup_config_sets_pending_view() {
        let app = App::with_startup_config(StartupConfig {
            initial_view: View::Grades,
        });
        assert_eq!(app.state, AppState::Loading);
        assert_eq!(app.pending_view, View::Grades);
    }

    #[tokio::test]
    async fn test_load_all_data_fills_views() {
        let mut lms = populated_lms();
        lms.assignments.get_mut(&2).unwrap()[0].due_at =
            Some(Utc.with_ymd_and_hms(2026, 10, 21, 12, 0, 0).unwrap());
        lms.assignments.get_mut(&3).unwrap()[1].due_at =
            Some(Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap());
        lms.scores.insert(
            1,
            EnrollmentGrades {
                current_score: Some(95.0),
                ..Default::default()
            },
        );
        let agg = aggregator(lms);
        let mut app = App::with_startup_config(StartupConfig {
            initial_view: View::Assignments,
        });

        app.load_all_data(&agg, today()).await;

        assert_eq!(app.state, AppState::Assignments);
        assert_eq!(app.courses.len(), 3);
        assert_eq!(app.assignments.len(), 6);
        assert_eq!(app.assignments[0].name, "Quiz 3");
        assert_eq!(app.assignments[1].name, "Homework 2");
        assert!(app.assignments[5].due_at.is_none());
        assert_eq!(app.grades.len(), 3);
        assert_eq!(app.gpa, Some(4.0));
        assert_eq!(app.profile.name.as_deref(), Some("Jordan Lee"));
        assert_eq!(app.calendar.as_ref().map(|c| c.title.as_str()), Some("October 2026"));
        assert!(app.errors.is_empty());
        assert!(app.last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_load_with_failing_lms_records_error() {
        let lms = FakeLms {
            fail_courses: true,
            ..populated_lms()
        };
        let agg = aggregator(lms);
        let mut app = App::new();

        app.load_all_data(&agg, today()).await;

        assert_eq!(app.state, AppState::Dashboard);
        assert!(app.courses.is_empty());
        assert_eq!(app.errors.len(), 1);
        assert!(app.errors[0].contains("500"));
    }

    #[tokio::test]
    async fn test_cold_load_fetches_courses_once() {
        let agg = aggregator(FakeLms {
            yield_in_courses: true,
            ..populated_lms()
        });
        let mut app = App::new();

        app.load_all_data(&agg, today()).await;
        assert_eq!(agg.api().course_calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.courses.len(), 3);
        assert_eq!(app.assignments.len(), 6);

        app.refresh_requested = Some(RefreshKind::Hard);
        app.apply_refresh(&agg, today()).await;
        assert_eq!(agg.api().course_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_hard_refresh_refetches_courses() {
        let agg = aggregator(populated_lms());
        let mut app = App::new();
        app.load_all_data(&agg, today()).await;
        let calls = agg.api().course_calls.load(Ordering::SeqCst);

        app.refresh_requested = Some(RefreshKind::Soft);
        app.apply_refresh(&agg, today()).await;
        assert_eq!(agg.api().course_calls.load(Ordering::SeqCst), calls);

        app.refresh_requested = Some(RefreshKind::Hard);
        app.apply_refresh(&agg, today()).await;
        assert!(agg.api().course_calls.load(Ordering::SeqCst) > calls);
        assert!(app.refresh_requested.is_none());
    }
}
