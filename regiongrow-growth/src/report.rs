use regiongrow_grid::GridCoordinate;
use regiongrow_scan::ScanResult;

use crate::decision::{Thresholds, Verdict};

/// Operator-facing scan report, one entry per line.
pub fn scan_report(
    region: GridCoordinate,
    result: &ScanResult,
    thresholds: &Thresholds,
    verdict: Verdict,
) -> Vec<String> {
    vec![
        format!("Region Scan Results for \"{}\":", region),
        format!("         Wood : {}  (Minimum: {})", result.wood, thresholds.min_wood),
        format!("         Coal : {}", result.coal),
        format!("         Iron : {}", result.iron),
        format!("         Gold : {}", result.gold),
        format!("     Redstone : {}", result.redstone),
        format!("      Diamond : {}", result.diamond),
        format!(
            "Player Blocks : {}  (Maximum: {})",
            result.player_blocks,
            thresholds.max_player_blocks()
        ),
        format!(" Resource Score : {}  (Minimum: {})", result.score, thresholds.min_score),
        format!("Summary: {}", verdict.summary()),
    ]
}
