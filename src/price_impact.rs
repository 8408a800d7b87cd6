//! Price impact severity
//!
//! Pure classification only; the submit gate in [`crate::session`] decides
//! what each severity demands from the user.

use serde::{Deserialize, Serialize};

use crate::amount::Percent;
use crate::config::PriceImpactThresholds;
use crate::trade::Trade;

/// Ordinal severity. Each band includes its lower bound and excludes its
/// upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Below the low threshold (default < 1%)
    Negligible = 0,
    /// Default 1% to 3%
    Low = 1,
    /// Default 3% to 5%
    Medium = 2,
    /// Default 5% to 10%, needs acknowledgement
    High = 3,
    /// Default 10% and above, needs expert mode
    Severe = 4,
}

impl Severity {
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Whether the user must explicitly acknowledge before submitting
    pub fn requires_acknowledgement(self) -> bool {
        self >= Severity::High
    }

    /// Whether only expert mode may submit
    pub fn requires_expert_mode(self) -> bool {
        self >= Severity::Severe
    }
}

/// Map a price impact onto its severity band
pub fn classify(impact: &Percent, thresholds: &PriceImpactThresholds) -> Severity {
    let [low, medium, high, severe] = thresholds.bounds();
    if *impact >= severe {
        Severity::Severe
    } else if *impact >= high {
        Severity::High
    } else if *impact >= medium {
        Severity::Medium
    } else if *impact >= low {
        Severity::Low
    } else {
        Severity::Negligible
    }
}

/// Fraction of the input paid to LPs along the route: `1 - prod(1 - fee)`
pub fn realized_lp_fee(hop_fees_bips: &[u32]) -> Percent {
    let kept = hop_fees_bips
        .iter()
        .fold(Percent::one(), |acc, fee| acc.multiply(&Percent::from_bips(*fee).complement()));
    kept.complement()
}

/// Fee and impact split of a quoted trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub realized_lp_fee: Percent,
    /// Impact with LP fees taken out, `None` when the quote carried no impact
    pub price_impact_without_fee: Option<Percent>,
    pub severity: Severity,
}

pub fn price_breakdown(trade: &Trade, thresholds: &PriceImpactThresholds) -> PriceBreakdown {
    let realized_lp_fee = realized_lp_fee(&trade.hop_fees());
    let price_impact_without_fee = trade
        .price_impact()
        .map(|impact| impact.saturating_sub(&realized_lp_fee));
    let severity = price_impact_without_fee
        .as_ref()
        .map(|impact| classify(impact, thresholds))
        .unwrap_or(Severity::Negligible);

    PriceBreakdown {
        realized_lp_fee,
        price_impact_without_fee,
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::fixtures::*;
    use crate::trade::TradeType;

    fn severity(bips: u32) -> Severity {
        classify(&Percent::from_bips(bips), &PriceImpactThresholds::default())
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(severity(0), Severity::Negligible);
        assert_eq!(severity(50), Severity::Negligible);
        assert_eq!(severity(99), Severity::Negligible);
        assert_eq!(severity(100), Severity::Low);
        assert_eq!(severity(299), Severity::Low);
        assert_eq!(severity(300), Severity::Medium);
        assert_eq!(severity(500), Severity::High);
        assert_eq!(severity(700), Severity::High);
        assert_eq!(severity(999), Severity::High);
        assert_eq!(severity(1_000), Severity::Severe);
        assert_eq!(severity(9_000), Severity::Severe);
    }

    #[test]
    fn test_override_requirements() {
        assert!(!severity(50).requires_acknowledgement());
        assert!(severity(700).requires_acknowledgement());
        assert!(!severity(700).requires_expert_mode());
        assert!(severity(1_500).requires_expert_mode());
        assert_eq!(severity(1_500).level(), 4);
    }

    #[test]
    fn test_realized_fee_compounds_per_hop() {
        assert!(realized_lp_fee(&[]).is_zero());
        assert_eq!(realized_lp_fee(&[30]), Percent::from_bips(30));
        // 1 - 0.997^2 = 0.005991
        assert_eq!(
            realized_lp_fee(&[30, 30]),
            Percent::from_ratio(5_991, 1_000_000).unwrap()
        );
    }

    #[test]
    fn test_breakdown_removes_fee_from_impact() {
        let trade = swap_trade(
            TradeType::ExactInput,
            amount(usdc(), 1_000),
            amount(weth(), 1),
            530,
        );
        let breakdown = price_breakdown(&trade, &PriceImpactThresholds::default());
        assert_eq!(breakdown.price_impact_without_fee, Some(Percent::from_bips(500)));
        assert_eq!(breakdown.severity, Severity::High);
    }
}
