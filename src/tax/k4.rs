//! Capital gains on security sales (blankett K4)
//!
//! Cost basis follows the average cost method (genomsnittsmetoden): every
//! purchase is pooled per security, and a sale takes its share of the pool.
//! Listed securities may use the schablon method instead, where the cost is a
//! fixed share of the net proceeds.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::check_amount;
use crate::error::{FinanceError, FinanceResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct K4Parameters {
    /// Schablon cost as percent of net proceeds
    pub schablon_cost_rate: f64,
    /// Capital income tax rate, percent
    pub tax_rate: f64,
    /// Share of a net loss deductible against other capital income, percent
    pub loss_deduction_rate: f64,
}

impl Default for K4Parameters {
    fn default() -> Self {
        Self {
            schablon_cost_rate: 20.0,
            tax_rate: 30.0,
            loss_deduction_rate: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostMethod {
    AverageCost,
    Schablon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySale {
    pub symbol: String,
    pub date: NaiveDate,
    pub quantity: f64,
    /// Sale price after fees
    pub net_proceeds: f64,
    pub method: CostMethod,
}

impl SecuritySale {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, quantity: f64, net_proceeds: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            quantity,
            net_proceeds,
            method: CostMethod::AverageCost,
        }
    }

    pub fn with_schablon(mut self) -> Self {
        self.method = CostMethod::Schablon;
        self
    }
}

/// One row of the K4 form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct K4Line {
    pub symbol: String,
    pub date: NaiveDate,
    pub quantity: f64,
    pub proceeds: f64,
    pub cost_basis: f64,
    pub gain: f64,
    pub loss: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Holding {
    quantity: f64,
    total_cost: f64,
}

/// Per-security pool of quantity and acquisition cost
#[derive(Debug, Clone, Default)]
pub struct AverageCostBook {
    holdings: HashMap<String, Holding>,
}

impl AverageCostBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a purchase; `total_cost` includes fees
    pub fn buy(&mut self, symbol: &str, quantity: f64, total_cost: f64) -> FinanceResult<()> {
        check_amount("quantity", quantity)?;
        check_amount("total cost", total_cost)?;
        if quantity == 0.0 {
            return Err(FinanceError::invalid("quantity must be positive"));
        }

        let holding = self.holdings.entry(symbol.to_string()).or_default();
        holding.quantity += quantity;
        holding.total_cost += total_cost;
        Ok(())
    }

    pub fn quantity(&self, symbol: &str) -> f64 {
        self.holdings.get(symbol).map_or(0.0, |h| h.quantity)
    }

    /// Average cost per unit, if the security is held
    pub fn average_cost(&self, symbol: &str) -> Option<f64> {
        self.holdings
            .get(symbol)
            .filter(|h| h.quantity > 0.0)
            .map(|h| h.total_cost / h.quantity)
    }

    /// Record a sale and produce its K4 line
    pub fn sell(&mut self, sale: &SecuritySale, params: &K4Parameters) -> FinanceResult<K4Line> {
        check_amount("quantity", sale.quantity)?;
        check_amount("net proceeds", sale.net_proceeds)?;

        let holding = self
            .holdings
            .get_mut(&sale.symbol)
            .ok_or_else(|| FinanceError::not_found("Holding", &sale.symbol))?;
        if sale.quantity <= 0.0 || sale.quantity > holding.quantity + 1e-9 {
            return Err(FinanceError::invalid(format!(
                "cannot sell {} {} with {} held",
                sale.quantity, sale.symbol, holding.quantity
            )));
        }

        let pooled_cost = holding.total_cost * (sale.quantity / holding.quantity);
        holding.quantity -= sale.quantity;
        holding.total_cost -= pooled_cost;
        if holding.quantity <= 1e-9 {
            self.holdings.remove(&sale.symbol);
        }

        let cost_basis = match sale.method {
            CostMethod::AverageCost => pooled_cost,
            CostMethod::Schablon => sale.net_proceeds * params.schablon_cost_rate / 100.0,
        };
        let result = sale.net_proceeds - cost_basis;

        Ok(K4Line {
            symbol: sale.symbol.clone(),
            date: sale.date,
            quantity: sale.quantity,
            proceeds: sale.net_proceeds,
            cost_basis,
            gain: result.max(0.0),
            loss: (-result).max(0.0),
        })
    }
}

/// Totals of a K4 form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct K4Summary {
    pub total_gains: f64,
    pub total_losses: f64,
    pub net: f64,
    /// Tax on a net gain
    pub tax: f64,
    /// Reduction of capital income tax from a net loss
    pub tax_reduction: f64,
}

impl K4Summary {
    pub fn from_lines(lines: &[K4Line], params: &K4Parameters) -> Self {
        let total_gains: f64 = lines.iter().map(|l| l.gain).sum();
        let total_losses: f64 = lines.iter().map(|l| l.loss).sum();
        let net = total_gains - total_losses;

        let tax = net.max(0.0) * params.tax_rate / 100.0;
        let tax_reduction =
            (-net).max(0.0) * params.loss_deduction_rate / 100.0 * params.tax_rate / 100.0;

        Self {
            total_gains,
            total_losses,
            net,
            tax,
            tax_reduction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 15).unwrap()
    }

    #[test]
    fn test_average_cost_pools_purchases() {
        let mut book = AverageCostBook::new();
        book.buy("VOLV-B", 100.0, 20_000.0).unwrap();
        book.buy("VOLV-B", 100.0, 30_000.0).unwrap();
        assert_relative_eq!(book.average_cost("VOLV-B").unwrap(), 250.0);

        let params = K4Parameters::default();
        let line = book
            .sell(&SecuritySale::new("VOLV-B", date(), 50.0, 15_000.0), &params)
            .unwrap();

        assert_relative_eq!(line.cost_basis, 12_500.0);
        assert_relative_eq!(line.gain, 2_500.0);
        assert_eq!(line.loss, 0.0);
        assert_relative_eq!(book.quantity("VOLV-B"), 150.0);
        assert_relative_eq!(book.average_cost("VOLV-B").unwrap(), 250.0);
    }

    #[test]
    fn test_schablon_cost_is_fifth_of_proceeds() {
        let mut book = AverageCostBook::new();
        book.buy("ERIC-B", 10.0, 9_000.0).unwrap();

        let params = K4Parameters::default();
        let line = book
            .sell(
                &SecuritySale::new("ERIC-B", date(), 10.0, 1_000.0).with_schablon(),
                &params,
            )
            .unwrap();

        assert_relative_eq!(line.cost_basis, 200.0);
        assert_relative_eq!(line.gain, 800.0);
        assert!(book.average_cost("ERIC-B").is_none());
    }

    #[test]
    fn test_overselling_rejected() {
        let mut book = AverageCostBook::new();
        book.buy("ABB", 5.0, 2_500.0).unwrap();

        let params = K4Parameters::default();
        assert!(book.sell(&SecuritySale::new("ABB", date(), 6.0, 3_000.0), &params).is_err());
        assert!(book.sell(&SecuritySale::new("SAND", date(), 1.0, 100.0), &params).is_err());
        assert_relative_eq!(book.quantity("ABB"), 5.0);
    }

    #[test]
    fn test_summary_nets_gains_and_losses() {
        let mut book = AverageCostBook::new();
        book.buy("A", 10.0, 10_000.0).unwrap();
        book.buy("B", 10.0, 10_000.0).unwrap();

        let params = K4Parameters::default();
        let lines = vec![
            book.sell(&SecuritySale::new("A", date(), 10.0, 4_000.0), &params).unwrap(),
            book.sell(&SecuritySale::new("B", date(), 10.0, 12_000.0), &params).unwrap(),
        ];
        let summary = K4Summary::from_lines(&lines, &params);

        assert_relative_eq!(summary.total_gains, 2_000.0);
        assert_relative_eq!(summary.total_losses, 6_000.0);
        assert_relative_eq!(summary.net, -4_000.0);
        assert_eq!(summary.tax, 0.0);
        // 4 000 × 70 % × 30 %
        assert_relative_eq!(summary.tax_reduction, 840.0, epsilon = 1e-9);
    }
}
