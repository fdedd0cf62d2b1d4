mod common;

use common::{
    card, collect_until_finished, init_test_tracing, results_page, settings_in, statuses,
    FakeFetcher, FakePage,
};
use dirscout_scraper::{read_listings, run_scrape, RunEvent, RunOutcome, SearchQuery};
use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn output_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[tokio::test]
async fn plumbers_in_austin_until_results_run_out() {
    init_test_tracing();
    let dir = tempdir().unwrap();
    let (fetcher, log) = FakeFetcher::new(vec![
        results_page(&[
            card(
                Some("Austin Pro Plumbing"),
                Some("500 W 5th St"),
                Some("Austin, TX 78701"),
                Some("(512) 555-0199"),
                Some("https://austinpro.example"),
            ),
            card(
                Some("Capital City Drains"),
                Some("12 Oak Ln"),
                Some("Austin, TX 78704"),
                None,
                Some("https://ccdrains.example"),
            ),
        ]),
        results_page(&[]),
    ]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let query = SearchQuery::new("plumber", "Austin").unwrap();
    let report = run_scrape(
        query,
        Box::new(fetcher),
        settings_in(dir.path()),
        tx,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Exhausted);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.records_written, 2);

    let path = report.output_path.clone().expect("rows were written");
    let rows = read_listings(&path).unwrap();
    assert_eq!(rows, report.records);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].phone, "(512) 555-0199");
    assert_eq!(rows[0].address, "500 W 5th St, Austin, TX 78701");
    assert_eq!(rows[1].business_name, "Capital City Drains");
    assert_eq!(rows[1].phone, "-");

    let log = log.lock().unwrap();
    assert_eq!(log.closed, 1);
    assert_eq!(log.urls.len(), 2);
    assert!(log.urls[0]
        .as_str()
        .ends_with("search_terms=plumber&geo_location_terms=Austin&page=1"));
    assert!(log.urls[1].as_str().ends_with("&page=2"));
    drop(log);

    let events = collect_until_finished(&mut rx).await;
    let lines = statuses(&events);
    assert_eq!(lines.last().map(String::as_str), Some("Scraping finished."));
    let batches: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, RunEvent::BatchSaved { .. }))
        .collect();
    assert_eq!(batches.len(), 1);
    assert!(matches!(
        events.last(),
        Some(RunEvent::Finished(r)) if r.outcome == RunOutcome::Exhausted
    ));
}

#[tokio::test]
async fn empty_first_page_writes_nothing() {
    let dir = tempdir().unwrap();
    let (fetcher, log) = FakeFetcher::new(vec![results_page(&[])]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let report = run_scrape(
        SearchQuery::new("unicorn groomer", "Fargo, ND").unwrap(),
        Box::new(fetcher),
        settings_in(dir.path()),
        tx,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Exhausted);
    assert_eq!(report.records_written, 0);
    assert!(report.output_path.is_none());
    assert!(output_files(dir.path()).is_empty());
    assert_eq!(log.lock().unwrap().closed, 1);

    let events = collect_until_finished(&mut rx).await;
    assert!(!events
        .iter()
        .any(|event| matches!(event, RunEvent::BatchSaved { .. })));
}

#[tokio::test]
async fn header_appears_once_over_several_pages() {
    let dir = tempdir().unwrap();
    let page = |n: usize| {
        results_page(&[card(
            Some(format!("Shop {n}").as_str()),
            None,
            None,
            Some("555"),
            None,
        )])
    };
    let (fetcher, _log) = FakeFetcher::new(vec![page(1), page(2), page(3)]);
    let (tx, _rx) = mpsc::unbounded_channel();

    let report = run_scrape(
        SearchQuery::new("shop", "Dallas").unwrap(),
        Box::new(fetcher),
        settings_in(dir.path()),
        tx,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.pages_fetched, 4);
    let text = std::fs::read_to_string(report.output_path.unwrap()).unwrap();
    assert_eq!(text.matches("Business Name,Address,Phone,Website").count(), 1);
    assert_eq!(text.lines().count(), 4);
    assert!(text.contains("Shop 3,\"-, -\",555,-"));
}

#[tokio::test]
async fn nameless_cards_are_skipped_and_reported() {
    let dir = tempdir().unwrap();
    let (fetcher, _log) = FakeFetcher::new(vec![results_page(&[
        card(None, Some("1 Ghost Rd"), None, Some("000"), None),
        card(Some("Real Business"), None, Some("Waco, TX"), None, None),
    ])]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let report = run_scrape(
        SearchQuery::new("anything", "Waco").unwrap(),
        Box::new(fetcher),
        settings_in(dir.path()),
        tx,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].address, "-, Waco, TX");
    let lines = statuses(&collect_until_finished(&mut rx).await);
    assert!(lines.iter().any(|line| line.starts_with("Skipped a business on page 1")));
}

#[tokio::test]
async fn cancel_keeps_the_page_in_flight_and_stops_there() {
    let dir = tempdir().unwrap();
    let cancel = CancellationToken::new();
    let (fetcher, log) = FakeFetcher::new(vec![
        results_page(&[card(Some("First"), None, None, None, None)]),
        results_page(&[card(Some("Second"), None, None, None, None)]),
        results_page(&[card(Some("Never"), None, None, None, None)]),
    ]);
    let fetcher = fetcher.cancel_during(2, cancel.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let report = run_scrape(
        SearchQuery::new("cafe", "Houston").unwrap(),
        Box::new(fetcher),
        settings_in(dir.path()),
        tx,
        cancel,
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    let names: Vec<_> = read_listings(&report.output_path.unwrap())
        .unwrap()
        .into_iter()
        .map(|r| r.business_name)
        .collect();
    assert_eq!(names, ["First", "Second"]);

    let log = log.lock().unwrap();
    assert_eq!(log.urls.len(), 2);
    assert_eq!(log.closed, 1);
    drop(log);

    let lines = statuses(&collect_until_finished(&mut rx).await);
    assert!(lines.contains(&"Scraping cancelled.".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("Scraping finished."));
}

#[tokio::test]
async fn already_cancelled_run_fetches_nothing() {
    let dir = tempdir().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let (fetcher, log) = FakeFetcher::new(vec![results_page(&[card(
        Some("X"),
        None,
        None,
        None,
        None,
    )])]);
    let (tx, _rx) = mpsc::unbounded_channel();

    let report = run_scrape(
        SearchQuery::new("x", "y").unwrap(),
        Box::new(fetcher),
        settings_in(dir.path()),
        tx,
        cancel,
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(log.lock().unwrap().urls.is_empty());
    assert!(output_files(dir.path()).is_empty());
}

#[tokio::test]
async fn fetch_failure_fails_the_run_but_keeps_earlier_pages() {
    init_test_tracing();
    let dir = tempdir().unwrap();
    let (fetcher, log) = FakeFetcher::new(vec![
        results_page(&[card(Some("Kept"), None, None, None, None)]),
        FakePage::FetchError,
    ]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let report = run_scrape(
        SearchQuery::new("bakery", "Austin").unwrap(),
        Box::new(fetcher),
        settings_in(dir.path()),
        tx,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(report
        .error
        .as_deref()
        .unwrap()
        .contains("failed to load page 2"));
    assert_eq!(read_listings(&report.output_path.unwrap()).unwrap().len(), 1);
    assert_eq!(log.lock().unwrap().closed, 1);

    let lines = statuses(&collect_until_finished(&mut rx).await);
    assert!(lines.iter().any(|line| line.starts_with("Scraping error: ")));
    assert_eq!(lines.last().map(String::as_str), Some("Scraping finished."));
}

#[tokio::test]
async fn save_failure_fails_the_run_but_keeps_saved_rows() {
    init_test_tracing();
    let dir = tempdir().unwrap();
    let out = dir.path().to_path_buf();
    let kept = dir.path().join("kept.csv");
    let moved = kept.clone();
    let (fetcher, log) = FakeFetcher::new(vec![
        results_page(&[card(Some("Early Bird"), None, None, None, None)]),
        results_page(&[card(Some("Never Saved"), None, None, None, None)]),
    ]);
    // A directory now sits at the output path, so page 2 cannot be appended.
    let fetcher = fetcher.on_fetch(2, move || {
        let current = output_files(&out).pop().unwrap();
        std::fs::rename(&current, &moved).unwrap();
        std::fs::create_dir(&current).unwrap();
    });
    let (tx, mut rx) = mpsc::unbounded_channel();

    let report = run_scrape(
        SearchQuery::new("diner", "Austin").unwrap(),
        Box::new(fetcher),
        settings_in(dir.path()),
        tx,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.records_written, 1);
    assert!(report
        .error
        .as_deref()
        .unwrap()
        .starts_with("failed to save results: output I/O failed: "));

    let names: Vec<_> = read_listings(&kept)
        .unwrap()
        .into_iter()
        .map(|r| r.business_name)
        .collect();
    assert_eq!(names, ["Early Bird"]);
    assert_eq!(log.lock().unwrap().closed, 1);

    let lines = statuses(&collect_until_finished(&mut rx).await);
    assert!(lines
        .iter()
        .any(|line| line.starts_with("Scraping error: failed to save results")));
    assert!(!lines.iter().any(|line| line.contains("from page 2")));
    assert_eq!(lines.last().map(String::as_str), Some("Scraping finished."));
}

#[tokio::test]
async fn card_lookup_failure_fails_the_run() {
    let dir = tempdir().unwrap();
    let (fetcher, log) = FakeFetcher::new(vec![FakePage::CardLookupError]);
    let (tx, _rx) = mpsc::unbounded_channel();

    let report = run_scrape(
        SearchQuery::new("gym", "Austin").unwrap(),
        Box::new(fetcher),
        settings_in(dir.path()),
        tx,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(report.output_path.is_none());
    assert!(output_files(dir.path()).is_empty());
    assert_eq!(log.lock().unwrap().closed, 1);
}

#[tokio::test]
async fn unusable_output_directory_fails_before_fetching() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"occupied").unwrap();

    let (fetcher, log) = FakeFetcher::new(vec![results_page(&[card(
        Some("X"),
        None,
        None,
        None,
        None,
    )])]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let report = run_scrape(
        SearchQuery::new("x", "y").unwrap(),
        Box::new(fetcher),
        settings_in(&blocker),
        tx,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(report
        .error
        .as_deref()
        .unwrap()
        .starts_with("output I/O failed: "));
    let log = log.lock().unwrap();
    assert!(log.urls.is_empty());
    assert_eq!(log.closed, 1);
    drop(log);

    let events = collect_until_finished(&mut rx).await;
    assert!(matches!(
        events.last(),
        Some(RunEvent::Finished(r)) if r.outcome == RunOutcome::Failed
    ));
}
