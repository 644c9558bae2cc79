//! Presentation helpers for bills of materials: quantity formatting, sorted
//! raw-material tables, JSON, and production-graph descriptions.

use crate::engine::{Bom, MaterialAmount, ProductionStep};
use crate::id::ItemId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Distance to the nearest integer below which a quantity prints as integral.
pub const INTEGRAL_EPSILON: f64 = 1e-9;

/// Decimal places kept for fractional quantities.
pub const FRACTION_DIGITS: usize = 4;

// ---------------------------------------------------------------------------
// Quantities
// ---------------------------------------------------------------------------

/// Render a quantity for humans.
///
/// Integral values (within [`INTEGRAL_EPSILON`]) print without a decimal
/// point; everything else prints with up to four decimals, trailing zeros
/// trimmed.
///
/// ```
/// use craftcost_core::export::format_quantity;
/// assert_eq!(format_quantity(3.0), "3");
/// assert_eq!(format_quantity(0.25), "0.25");
/// assert_eq!(format_quantity(1.0 / 3.0), "0.3333");
/// ```
pub fn format_quantity(quantity: f64) -> String {
    let rounded = quantity.round();
    if (quantity - rounded).abs() < INTEGRAL_EPSILON {
        // Avoid "-0".
        return format!("{}", rounded + 0.0);
    }
    let fixed = format!("{quantity:.prec$}", prec = FRACTION_DIGITS);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" || trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Raw-material tables
// ---------------------------------------------------------------------------

/// Copy of `amounts` in stable lexicographic order by item id.
pub fn raw_materials_sorted(amounts: &[MaterialAmount]) -> Vec<MaterialAmount> {
    let mut sorted = amounts.to_vec();
    sorted.sort_by(|a, b| a.item.cmp(&b.item));
    sorted
}

/// One `item<TAB>quantity` line per raw material, sorted by item id.
pub fn raw_materials_table(bom: &Bom) -> String {
    let mut out = String::new();
    for amount in raw_materials_sorted(&bom.raw_materials) {
        let _ = writeln!(out, "{}\t{}", amount.item, format_quantity(amount.count));
    }
    out
}

/// Plain-text report for terminals.
pub fn text_report(bom: &Bom) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} x {}",
        format_quantity(bom.quantity),
        bom.target
    );
    out.push_str("\nRaw materials:\n");
    for amount in raw_materials_sorted(&bom.raw_materials) {
        let _ = writeln!(
            out,
            "  {:>10}  {}",
            format_quantity(amount.count),
            amount.item
        );
    }
    if !bom.steps.is_empty() {
        out.push_str("\nSteps:\n");
        for step in &bom.steps {
            let marker = if step.synthetic { " (approximate)" } else { "" };
            let _ = writeln!(
                out,
                "  {} x {} via {}{}",
                format_quantity(step.count),
                step.item,
                step.kind,
                marker
            );
        }
    }
    if !bom.cycles.is_empty() {
        let cut: Vec<&str> = bom.cycles.iter().map(ItemId::as_str).collect();
        let _ = writeln!(out, "\nCycles cut at: {}", cut.join(", "));
    }
    out
}

/// Pretty JSON document for a bill of materials.
pub fn to_json(bom: &Bom) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(bom)
}

// ---------------------------------------------------------------------------
// Graph description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub key: String,
    pub item: ItemId,
}

/// Directed ingredient -> product edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub quantity: f64,
    pub label: String,
}

/// Nodes and edges derived from a step list. Node keys are assigned in
/// first-encounter order (`n0`, `n1`, ...), walking each step's product
/// before its ingredients.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphDescription {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphDescription {
    pub fn from_steps(steps: &[ProductionStep]) -> Self {
        let mut graph = Self::default();
        let mut keys: HashMap<ItemId, String> = HashMap::new();

        for step in steps {
            let product = graph.key_for(&mut keys, &step.item);
            for ingredient in &step.ingredients {
                let from = graph.key_for(&mut keys, &ingredient.item);
                graph.edges.push(GraphEdge {
                    from,
                    to: product.clone(),
                    quantity: ingredient.count,
                    label: format_quantity(ingredient.count),
                });
            }
        }
        graph
    }

    fn key_for(&mut self, keys: &mut HashMap<ItemId, String>, item: &ItemId) -> String {
        if let Some(key) = keys.get(item) {
            return key.clone();
        }
        let key = format!("n{}", self.nodes.len());
        self.nodes.push(GraphNode {
            key: key.clone(),
            item: item.clone(),
        });
        keys.insert(item.clone(), key.clone());
        key
    }

    pub fn node(&self, item: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.item.as_str() == item)
    }

    /// Mermaid `flowchart TD` text.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");
        for node in &self.nodes {
            let _ = writeln!(
                out,
                "    {}[\"{}\"]",
                node.key,
                node.item.as_str().replace('"', "#quot;")
            );
        }
        for edge in &self.edges {
            let _ = writeln!(out, "    {} -->|{}| {}", edge.from, edge.label, edge.to);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    // -----------------------------------------------------------------------
    // format_quantity
    // -----------------------------------------------------------------------

    #[test]
    fn integral_values_have_no_decimal_point() {
        assert_eq!(format_quantity(0.0), "0");
        assert_eq!(format_quantity(64.0), "64");
        assert_eq!(format_quantity(3.000_000_000_1), "3");
        assert_eq!(format_quantity(-0.0), "0");
    }

    #[test]
    fn fractions_use_four_trimmed_decimals() {
        assert_eq!(format_quantity(0.25), "0.25");
        assert_eq!(format_quantity(0.5), "0.5");
        assert_eq!(format_quantity(2.0 / 3.0), "0.6667");
        assert_eq!(format_quantity(1.125), "1.125");
    }

    #[test]
    fn tiny_fractions_collapse_to_zero() {
        assert_eq!(format_quantity(0.000_01), "0");
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    #[test]
    fn raw_materials_sorted_orders_by_item() {
        let amounts = vec![
            MaterialAmount { item: ItemId::new("minecraft:stone"), count: 1.0 },
            MaterialAmount { item: ItemId::new("ae2:silicon"), count: 2.0 },
            MaterialAmount { item: ItemId::new("minecraft:iron_ingot"), count: 0.5 },
        ];
        let items: Vec<String> = raw_materials_sorted(&amounts)
            .into_iter()
            .map(|a| a.item.to_string())
            .collect();
        assert_eq!(items, ["ae2:silicon", "minecraft:iron_ingot", "minecraft:stone"]);
    }

    #[test]
    fn table_formats_quantities() {
        let bom = catalog_from(pickaxe_chain()).analyze("pickaxe", 1.0).unwrap();
        assert_eq!(raw_materials_table(&bom), "cobblestone\t3\nlog\t0.25\n");
    }

    #[test]
    fn text_report_lists_steps() {
        let bom = catalog_from(stick_chain()).analyze("stick", 2.0).unwrap();
        let report = text_report(&bom);
        assert!(report.starts_with("2 x stick\n"));
        assert!(report.contains("0.25  log"));
        assert!(report.contains("1 x plank via minecraft:crafting_shaped"));
    }

    // -----------------------------------------------------------------------
    // Graph description
    // -----------------------------------------------------------------------

    #[test]
    fn stick_graph_has_three_nodes_two_edges() {
        let bom = catalog_from(stick_chain()).analyze("stick", 2.0).unwrap();
        let graph = GraphDescription::from_steps(&bom.steps);

        let nodes: Vec<(&str, &str)> = graph
            .nodes
            .iter()
            .map(|n| (n.key.as_str(), n.item.as_str()))
            .collect();
        assert_eq!(nodes, [("n0", "stick"), ("n1", "plank"), ("n2", "log")]);

        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[0].from, "n1");
        assert_eq!(graph.edges[0].to, "n0");
        assert_eq!(graph.edges[0].label, "1");
        assert_eq!(graph.edges[1].from, "n2");
        assert_eq!(graph.edges[1].to, "n1");
        assert_eq!(graph.edges[1].label, "0.25");
    }

    #[test]
    fn mermaid_output() {
        let bom = catalog_from(stick_chain()).analyze("stick", 2.0).unwrap();
        let mermaid = GraphDescription::from_steps(&bom.steps).to_mermaid();
        let expected = "flowchart TD\n    n0[\"stick\"]\n    n1[\"plank\"]\n    n2[\"log\"]\n    n1 -->|1| n0\n    n2 -->|0.25| n1\n";
        assert_eq!(mermaid, expected);
    }

    #[test]
    fn empty_steps_give_empty_graph() {
        let graph = GraphDescription::from_steps(&[]);
        assert!(graph.nodes.is_empty());
        assert_eq!(graph.to_mermaid(), "flowchart TD\n");
    }

    #[test]
    fn json_document_is_pretty() {
        let bom = catalog_from(stick_chain()).analyze("stick", 2.0).unwrap();
        let json = to_json(&bom).unwrap();
        assert!(json.contains("\n  \"rawMaterials\": ["));
    }
}
