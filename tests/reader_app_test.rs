use std::sync::Arc;

use comikrat::event_source::SimulatedEventSource;
use comikrat::reader::document::LoadError;
use comikrat::run_reader_with_event_source;
use comikrat::test_utils::{
    MockComicsApi, StaticDocumentLoader, TestReader, TestScenarioBuilder, capture_terminal_state,
    create_test_terminal,
};
use crossterm::event::{KeyCode, MouseEventKind};

#[test]
fn keyboard_session_turns_pages_and_quits() {
    let mut reader = TestReader::open(10);
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new()
        .next_pages(4)
        .previous_pages(1)
        .press_key(KeyCode::PageDown)
        .quit()
        .build();

    run_reader_with_event_source(&mut terminal, &mut reader.session, &mut events).unwrap();

    assert_eq!(reader.session.current_page(), 5);
    assert!(reader.session.should_quit());
    assert_eq!(events.remaining(), 0);
}

#[test]
fn toolbar_shows_title_page_and_zoom() {
    let mut reader = TestReader::open(12);
    let mut terminal = create_test_terminal(120, 30);
    let mut events = TestScenarioBuilder::new().next_pages(2).quit().build();

    run_reader_with_event_source(&mut terminal, &mut reader.session, &mut events).unwrap();

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Test Comic"), "{screen}");
    assert!(screen.contains("page 3/12"), "{screen}");
    assert!(screen.contains("zoom 120%"), "{screen}");
    assert!(screen.contains("Page 3 of 12"), "{screen}");
}

#[test]
fn fullscreen_hides_the_toolbar() {
    let mut reader = TestReader::open(4);
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new().press_char('f').quit().build();

    run_reader_with_event_source(&mut terminal, &mut reader.session, &mut events).unwrap();

    let screen = capture_terminal_state(&terminal);
    assert!(!screen.contains("zoom 120%"), "{screen}");
    assert!(screen.contains("Page 1 of 4"), "{screen}");
}

#[test]
fn bookmark_panel_lists_bookmarks() {
    let api = Arc::new(MockComicsApi::new());
    api.seed_bookmark(2, Some("the reveal"));
    let mut reader = TestReader::open_with(api, StaticDocumentLoader::new(6));
    let mut terminal = create_test_terminal(120, 30);
    // `q` quits straight from the panel, so the last frame still shows it
    let mut events = TestScenarioBuilder::new().press_char('m').quit().build();

    run_reader_with_event_source(&mut terminal, &mut reader.session, &mut events).unwrap();

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Bookmarks (1)"), "{screen}");
    assert!(screen.contains("the reveal"), "{screen}");
}

#[test]
fn settings_panel_shows_current_values() {
    let mut reader = TestReader::open(6);
    let mut terminal = create_test_terminal(120, 40);
    let mut events = TestScenarioBuilder::new().press_char('s').quit().build();

    run_reader_with_event_source(&mut terminal, &mut reader.session, &mut events).unwrap();

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Settings"), "{screen}");
    assert!(screen.contains("Swipe to turn pages"), "{screen}");
    assert!(screen.contains("Auto-advance delay"), "{screen}");
}

#[test]
fn load_error_offers_retry_and_fallback() {
    let loader = StaticDocumentLoader::new(6).failing(1, LoadError::Fetch("connection refused".into()));
    let mut reader = TestReader::open_with(Arc::new(MockComicsApi::new()), loader);
    let mut terminal = create_test_terminal(120, 30);
    let mut events = TestScenarioBuilder::new().quit().build();

    run_reader_with_event_source(&mut terminal, &mut reader.session, &mut events).unwrap();

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("connection refused"), "{screen}");
    assert!(screen.contains("retry"), "{screen}");
    assert!(screen.contains("open in external viewer"), "{screen}");
}

#[test]
fn mouse_wheel_and_drag_turn_pages() {
    let mut reader = TestReader::open(6);
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new()
        .event(SimulatedEventSource::scroll(MouseEventKind::ScrollDown))
        .event(SimulatedEventSource::scroll(MouseEventKind::ScrollDown))
        // Drag 40 cells (320px) to the left: a swipe to the next page
        .event(SimulatedEventSource::left_mouse(MouseEventKind::Down, 60, 10))
        .event(SimulatedEventSource::left_mouse(MouseEventKind::Up, 20, 10))
        .quit()
        .build();

    run_reader_with_event_source(&mut terminal, &mut reader.session, &mut events).unwrap();

    assert_eq!(reader.session.current_page(), 4);
}
