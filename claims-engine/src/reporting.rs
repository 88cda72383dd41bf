use crate::models::{DecisionRecord, Disposition};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Parameters of a summary over past decisions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryWindow {
    /// Last day of the trend series
    pub as_of: NaiveDate,
    pub trend_days: u32,
    /// Fused score above which a decision counts as fraud-flagged
    pub fraud_flag_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total: u64,
    pub flagged: u64,
    pub rejected: u64,
}

/// Aggregate statistics over persisted decision records
///
/// A pure reduction: the engine is never consulted, and the same records
/// always give the same summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionSummary {
    pub total: u64,
    pub approved: u64,
    pub rejected: u64,
    pub manual_review: u64,
    pub flagged: u64,
    pub approval_rate: f64,
    pub rejection_rate: f64,
    pub fraud_rate: f64,
    pub mean_fused_score: f64,
    pub approved_amount: Decimal,
    pub rejected_amount: Decimal,
    /// One point per day ending at `as_of`, oldest first
    pub trend: Vec<TrendPoint>,
}

impl DecisionSummary {
    pub fn from_records<'a, I>(records: I, window: &SummaryWindow) -> Self
    where
        I: IntoIterator<Item = &'a DecisionRecord>,
    {
        let days = window.trend_days.max(1);
        let start = window
            .as_of
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .unwrap_or(NaiveDate::MIN);
        let mut trend: BTreeMap<NaiveDate, TrendPoint> = start
            .iter_days()
            .take(days as usize)
            .map(|date| {
                (
                    date,
                    TrendPoint {
                        date,
                        total: 0,
                        flagged: 0,
                        rejected: 0,
                    },
                )
            })
            .collect();

        let mut summary = Self {
            total: 0,
            approved: 0,
            rejected: 0,
            manual_review: 0,
            flagged: 0,
            approval_rate: 0.0,
            rejection_rate: 0.0,
            fraud_rate: 0.0,
            mean_fused_score: 0.0,
            approved_amount: Decimal::ZERO,
            rejected_amount: Decimal::ZERO,
            trend: Vec::new(),
        };
        let mut score_sum = 0.0;

        for record in records {
            summary.total += 1;
            score_sum += record.fused_score().value();
            let flagged = record.fused_score().value() > window.fraud_flag_threshold;
            if flagged {
                summary.flagged += 1;
            }
            match record.disposition() {
                Disposition::Approved => {
                    summary.approved += 1;
                    summary.approved_amount += record.claimed_amount();
                }
                Disposition::Rejected => {
                    summary.rejected += 1;
                    summary.rejected_amount += record.claimed_amount();
                }
                Disposition::ManualReview => summary.manual_review += 1,
            }
            if let Some(point) = trend.get_mut(&record.claim_date()) {
                point.total += 1;
                point.flagged += u64::from(flagged);
                point.rejected += u64::from(record.disposition() == Disposition::Rejected);
            }
        }

        if summary.total > 0 {
            let total = summary.total as f64;
            summary.approval_rate = summary.approved as f64 / total;
            summary.rejection_rate = summary.rejected as f64 / total;
            summary.fraud_rate = summary.flagged as f64 / total;
            summary.mean_fused_score = score_sum / total;
        }
        summary.trend = trend.into_values().collect();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClaimRecord, FusedScore, Gender};
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn record(id: &str, date: NaiveDate, disposition: Disposition, score: f64, cost: Decimal) -> DecisionRecord {
        let claim = ClaimRecord {
            claim_id: id.into(),
            patient_id: "P1001".into(),
            age: 40,
            gender: Gender::Female,
            diagnosis_code: "I10".into(),
            procedure_code: "93000".into(),
            treatment_cost: cost,
            insurance_coverage_limit: dec!(5000),
            claim_date: date,
            hospital_id: "H0001".into(),
        };
        DecisionRecord::new(&claim, disposition, FusedScore::new(score), Vec::new(), Vec::new(), "v1".into())
    }

    fn window() -> SummaryWindow {
        SummaryWindow {
            as_of: day(10),
            trend_days: 3,
            fraud_flag_threshold: 0.5,
        }
    }

    #[test]
    fn empty_input_is_all_zero() {
        let none: Vec<DecisionRecord> = Vec::new();
        let summary = DecisionSummary::from_records(&none, &window());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.fraud_rate, 0.0);
        assert_eq!(summary.trend.len(), 3);
        assert!(summary.trend.iter().all(|p| p.total == 0));
    }

    #[test]
    fn counts_rates_and_amounts() {
        let records = vec![
            record("A", day(8), Disposition::Approved, 0.1, dec!(200)),
            record("B", day(9), Disposition::Rejected, 0.9, dec!(15000)),
            record("C", day(10), Disposition::ManualReview, 0.65, dec!(700)),
            record("D", day(10), Disposition::Approved, 0.2, dec!(300)),
        ];
        let summary = DecisionSummary::from_records(&records, &window());
        assert_eq!(summary.total, 4);
        assert_eq!((summary.approved, summary.rejected, summary.manual_review), (2, 1, 1));
        assert_eq!(summary.approval_rate, 0.5);
        assert_eq!(summary.fraud_rate, 0.5);
        assert_eq!(summary.approved_amount, dec!(500));
        assert_eq!(summary.rejected_amount, dec!(15000));
        assert!((summary.mean_fused_score - 0.4625).abs() < 1e-12);
    }

    #[test]
    fn trend_is_zero_filled_and_oldest_first() {
        let records = vec![
            record("A", day(10), Disposition::Rejected, 0.9, dec!(100)),
            record("B", day(10), Disposition::Approved, 0.1, dec!(100)),
            record("C", day(1), Disposition::Approved, 0.1, dec!(100)),
        ];
        let summary = DecisionSummary::from_records(&records, &window());
        let dates: Vec<_> = summary.trend.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(8), day(9), day(10)]);
        assert_eq!(summary.trend[1].total, 0);
        assert_eq!(summary.trend[2].total, 2);
        assert_eq!(summary.trend[2].flagged, 1);
        assert_eq!(summary.trend[2].rejected, 1);
        // outside the trend window but still counted
        assert_eq!(summary.total, 3);
    }
}
