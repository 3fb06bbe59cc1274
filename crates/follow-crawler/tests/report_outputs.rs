mod common;

use common::{ids, ScriptedApi};
use follow_crawler::persistence::{write_outputs, GraphSnapshot, REPORT_FILE, SNAPSHOT_FILE};
use follow_crawler::report::GraphSummary;
use follow_crawler::{GraphCrawler, RetryPolicy};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn crawl_outputs_round_trip_through_the_output_directory() {
    let api = ScriptedApi::new()
        .named(1, "seed", 1000)
        .mutual(1, 2)
        .mutual(1, 3)
        .profile(2, 500)
        .profile(3, 300)
        .into_arc();
    let crawler = GraphCrawler::new(api, RetryPolicy::default(), CancellationToken::new());
    let outcome = crawler.crawl("seed", 3).await.unwrap();
    let summary = GraphSummary::compute(&outcome.graph);

    let dir = std::env::temp_dir().join(format!("follow_crawler_outputs_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir); // Cleanup

    let written = write_outputs(&dir, &outcome, &summary).unwrap();
    assert_eq!(written.len(), 3);
    assert!(written.iter().all(|p| p.exists()));

    let raw = std::fs::read_to_string(dir.join(SNAPSHOT_FILE)).unwrap();
    let snapshot: GraphSnapshot = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot.nodes, ids([1, 2, 3]));
    assert_eq!(snapshot.edges.len(), 2);
    assert_eq!(snapshot.visitation, outcome.visitation);

    let report = std::fs::read_to_string(dir.join(REPORT_FILE)).unwrap();
    assert!(report.starts_with("Node count: = 3\nEdge count: = 2\n"));
    assert!(report.contains("Diameter of graph = 2"));

    let _ = std::fs::remove_dir_all(&dir);
}
