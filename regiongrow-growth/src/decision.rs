use regiongrow_scan::ScanResult;
use serde::Deserialize;

/// Player-placed blocks tolerated per unit of density ratio.
const PLAYER_BLOCKS_PER_DENSITY: f64 = 15000.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_score: u32,
    pub min_wood: u32,
    pub density_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_score: 200,
            min_wood: 200,
            density_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sufficient,
    InsufficientResources,
    Overcrowded,
}

impl Verdict {
    pub fn passed(self) -> bool {
        self == Verdict::Sufficient
    }

    pub fn summary(self) -> &'static str {
        match self {
            Verdict::Sufficient => "Looks good!  This region is suitable for new players.",
            Verdict::InsufficientResources => "Insufficient near-surface resources to support new players.",
            Verdict::Overcrowded => "Region seems overcrowded.",
        }
    }
}

impl Thresholds {
    pub fn max_player_blocks(&self) -> u32 {
        (PLAYER_BLOCKS_PER_DENSITY * self.density_ratio).round() as u32
    }

    /// Resource gates are checked before crowding.
    pub fn judge(&self, result: &ScanResult) -> Verdict {
        if result.score < self.min_score || result.wood < self.min_wood {
            Verdict::InsufficientResources
        } else if result.player_blocks > self.max_player_blocks() {
            Verdict::Overcrowded
        } else {
            Verdict::Sufficient
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u32, wood: u32, player_blocks: u32) -> ScanResult {
        ScanResult {
            score,
            wood,
            player_blocks,
            ..ScanResult::default()
        }
    }

    #[test]
    fn test_gates() {
        let t = Thresholds::default();
        assert_eq!(t.judge(&result(200, 200, 15000)), Verdict::Sufficient);
        assert_eq!(t.judge(&result(199, 500, 0)), Verdict::InsufficientResources);
        assert_eq!(t.judge(&result(500, 199, 0)), Verdict::InsufficientResources);
        assert_eq!(t.judge(&result(500, 500, 15001)), Verdict::Overcrowded);
    }

    #[test]
    fn test_resources_reported_before_crowding() {
        let t = Thresholds::default();
        assert_eq!(t.judge(&result(0, 0, 1_000_000)), Verdict::InsufficientResources);
    }

    #[test]
    fn test_density_ratio_scales_limit() {
        let t = Thresholds {
            density_ratio: 0.5,
            ..Thresholds::default()
        };
        assert_eq!(t.max_player_blocks(), 7500);
        assert_eq!(t.judge(&result(300, 300, 7501)), Verdict::Overcrowded);
        assert!(t.judge(&result(300, 300, 7500)).passed());
    }
}
