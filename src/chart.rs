//! Builds chart descriptions from aggregate results and hands them to a
//! drawing surface.
//!
//! The surface is a black box: it receives labels, values and a title and
//! draws them however it likes (the CLI ships a plain-text surface; tests
//! record what they are given). The adapter owns the "at most one live chart
//! per slot" rule: re-rendering a slot replaces whatever was there before.

use crate::model::AggregateResult;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fixed visual placeholder. Each slot holds at most one live chart.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSlot {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(ChartSlot);
serde_plain::derive_fromstr_from_deserialize!(ChartSlot);

/// Everything a surface needs to draw one chart. Slice labels are parallel
/// to `labels`/`values`; a slice under the minimum percentage gets an empty
/// on-slice label but keeps its tooltip text.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChartSpec {
    title: String,
    labels: Vec<String>,
    values: Vec<Decimal>,
    slice_labels: Vec<String>,
    tooltips: Vec<String>,
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Decimal] {
        &self.values
    }

    pub fn slice_labels(&self) -> &[String] {
        &self.slice_labels
    }

    pub fn tooltips(&self) -> &[String] {
        &self.tooltips
    }
}

/// Something that can draw a `ChartSpec` into a slot.
pub trait ChartSurface: Send {
    fn draw(&mut self, slot: ChartSlot, spec: &ChartSpec);
}

/// Renders aggregate results onto a `ChartSurface`, keeping at most one live
/// chart per slot.
pub struct ChartAdapter {
    surface: Box<dyn ChartSurface>,
    min_label_percent: Decimal,
    charts: BTreeMap<ChartSlot, ChartSpec>,
}

impl ChartAdapter {
    pub fn new(surface: Box<dyn ChartSurface>, min_label_percent: Decimal) -> Self {
        Self {
            surface,
            min_label_percent,
            charts: BTreeMap::new(),
        }
    }

    /// Draws `result` into `slot`. The previous chart for the slot, if any,
    /// is dropped when the new one takes its place.
    pub fn render(&mut self, slot: ChartSlot, result: &AggregateResult, title_prefix: &str) {
        let spec = self.build_spec(result, title_prefix);
        self.surface.draw(slot, &spec);
        self.charts.insert(slot, spec);
    }

    /// The live chart for a slot, if one has been rendered.
    pub fn chart(&self, slot: ChartSlot) -> Option<&ChartSpec> {
        self.charts.get(&slot)
    }

    fn build_spec(&self, result: &AggregateResult, title_prefix: &str) -> ChartSpec {
        let total = result.total();
        let mut slice_labels = Vec::with_capacity(result.data().len());
        let mut tooltips = Vec::with_capacity(result.data().len());
        for (label, value) in result.entries() {
            slice_labels.push(slice_label(value, total, self.min_label_percent));
            tooltips.push(tooltip(label, value, total));
        }
        ChartSpec {
            title: format!("{title_prefix}: {:.2}", total),
            labels: result.labels().to_vec(),
            values: result.data().to_vec(),
            slice_labels,
            tooltips,
        }
    }
}

/// A slice's share of the chart, in percent. Zero when the total is zero so
/// an all-zero chart never divides by zero.
fn percent(value: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        value * Decimal::ONE_HUNDRED / total
    }
}

fn rounded_percent(value: Decimal, total: Decimal) -> Decimal {
    percent(value, total).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// The text drawn on the slice itself. Slices under `min_percent` stay in
/// the chart but get no on-slice label.
fn slice_label(value: Decimal, total: Decimal, min_percent: Decimal) -> String {
    if percent(value, total) < min_percent {
        return String::new();
    }
    format!("{:.2}\n({}%)", value, rounded_percent(value, total))
}

/// The hover text for a slice, shown regardless of its size.
fn tooltip(label: &str, value: Decimal, total: Decimal) -> String {
    format!("{label}: {:.2} ({}%)", value, rounded_percent(value, total))
}

/// Draws charts as plain text on stdout. This is the CLI's stand-in for the
/// browser's doughnut renderer.
pub struct TextSurface;

impl ChartSurface for TextSurface {
    fn draw(&mut self, _slot: ChartSlot, spec: &ChartSpec) {
        println!("{}", spec.title());
        for tip in spec.tooltips() {
            println!("  {tip}");
        }
        if spec.labels().is_empty() {
            println!("  (no data)");
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{aggregate, Amount, Transaction, TransactionType};
    use crate::test::RecordingSurface;
    use std::str::FromStr;

    const FIVE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_small_slice_has_empty_label() {
        // 4 out of 100 is under the 5% minimum.
        assert_eq!(slice_label(dec("4"), dec("100"), FIVE), "");
    }

    #[test]
    fn test_slice_at_threshold_is_labeled() {
        assert_eq!(slice_label(dec("5"), dec("100"), FIVE), "5.00\n(5%)");
    }

    #[test]
    fn test_large_slice_label_format() {
        assert_eq!(
            slice_label(dec("1000"), dec("1200"), FIVE),
            "1000.00\n(83%)"
        );
    }

    #[test]
    fn test_zero_total_does_not_divide() {
        assert_eq!(percent(dec("0"), dec("0")), Decimal::ZERO);
        assert_eq!(slice_label(dec("0"), dec("0"), FIVE), "");
        assert_eq!(tooltip("food", dec("0"), dec("0")), "food: 0.00 (0%)");
    }

    #[test]
    fn test_tooltip_present_for_small_slice() {
        assert_eq!(tooltip("fees", dec("4"), dec("100")), "fees: 4.00 (4%)");
    }

    #[test]
    fn test_rounded_percents_cover_the_whole() {
        let values = [dec("1000"), dec("200")];
        let total: Decimal = values.iter().sum();
        let sum: Decimal = values.iter().map(|v| rounded_percent(*v, total)).sum();
        // 83 + 17
        assert_eq!(sum, dec("100"));
    }

    fn income(category: &str, amount: &str) -> Transaction {
        Transaction::new(
            "1",
            "Checking",
            category,
            TransactionType::Income,
            Amount::from_str(amount).unwrap(),
        )
    }

    #[test]
    fn test_render_builds_title_and_parallel_slices() {
        let surface = RecordingSurface::new();
        let draws = surface.draws();
        let mut adapter = ChartAdapter::new(Box::new(surface), FIVE);
        let result = aggregate(
            &[income("salary", "1000"), income("present", "200")],
            TransactionType::Income,
        );
        adapter.render(ChartSlot::Income, &result, "Income");

        let drawn = draws.lock().unwrap();
        assert_eq!(drawn.len(), 1);
        let (slot, spec) = &drawn[0];
        assert_eq!(*slot, ChartSlot::Income);
        assert_eq!(spec.title(), "Income: 1200.00");
        assert_eq!(spec.labels(), ["salary", "present"]);
        assert_eq!(spec.slice_labels(), ["1000.00\n(83%)", "200.00\n(17%)"]);
        assert_eq!(
            spec.tooltips(),
            ["salary: 1000.00 (83%)", "present: 200.00 (17%)"]
        );
    }

    #[test]
    fn test_rerender_replaces_the_slot() {
        let surface = RecordingSurface::new();
        let draws = surface.draws();
        let mut adapter = ChartAdapter::new(Box::new(surface), FIVE);

        let first = aggregate(&[income("salary", "1000")], TransactionType::Income);
        adapter.render(ChartSlot::Income, &first, "Income");
        let second = aggregate(&[income("bonus", "50")], TransactionType::Income);
        adapter.render(ChartSlot::Income, &second, "Income");

        // The surface drew twice but only one chart is live in the slot.
        assert_eq!(draws.lock().unwrap().len(), 2);
        let live = adapter.chart(ChartSlot::Income).unwrap();
        assert_eq!(live.labels(), ["bonus"]);
        assert!(adapter.chart(ChartSlot::Expense).is_none());
    }

    #[test]
    fn test_empty_result_renders_empty_chart() {
        let surface = RecordingSurface::new();
        let mut adapter = ChartAdapter::new(Box::new(surface), FIVE);
        adapter.render(ChartSlot::Expense, &AggregateResult::default(), "Expense");
        let live = adapter.chart(ChartSlot::Expense).unwrap();
        assert_eq!(live.title(), "Expense: 0.00");
        assert!(live.labels().is_empty());
    }
}
